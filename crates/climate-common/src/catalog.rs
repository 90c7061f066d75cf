//! Built-in catalogue of the NEX-GDDP variables, models and scenarios.
//!
//! Used when `/metadata` is unreachable and to validate chat state patches.

use chrono::{Datelike, NaiveDate};

use crate::error::{ViewerError, ViewerResult};

pub const VARIABLES: &[&str] = &[
    "tas", "tasmax", "tasmin", "pr", "hurs", "huss", "rsds", "rlds", "sfcWind",
];

pub const MODELS: &[&str] = &[
    "ACCESS-CM2",
    "CanESM5",
    "CESM2",
    "CMCC-CM2-SR5",
    "EC-Earth3",
    "GFDL-ESM4",
    "INM-CM5-0",
    "IPSL-CM6A-LR",
    "MIROC6",
    "MPI-ESM1-2-HR",
    "MRI-ESM2-0",
];

/// Scenario id and the years it covers (inclusive).
pub const SCENARIOS: &[(&str, i32, i32)] = &[
    ("historical", 1950, 2014),
    ("ssp245", 2015, 2100),
    ("ssp370", 2015, 2100),
    ("ssp585", 2015, 2100),
];

/// Palette names selectable from the UI and via chat.
pub const PALETTES: &[&str] = &["viridis", "thermal", "magma", "cividis", "diverging", "grayscale"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Human-readable name of a variable.
pub fn variable_name(variable: &str) -> Option<&'static str> {
    let name = match variable {
        "tas" => "Near-Surface Air Temperature",
        "tasmax" => "Daily Maximum Near-Surface Air Temperature",
        "tasmin" => "Daily Minimum Near-Surface Air Temperature",
        "pr" => "Precipitation",
        "hurs" => "Near-Surface Relative Humidity",
        "huss" => "Near-Surface Specific Humidity",
        "rsds" => "Surface Downwelling Shortwave Radiation",
        "rlds" => "Surface Downwelling Longwave Radiation",
        "sfcWind" => "Daily-Mean Near-Surface Wind Speed",
        _ => return None,
    };
    Some(name)
}

pub fn is_variable(variable: &str) -> bool {
    VARIABLES.contains(&variable)
}

pub fn is_palette(name: &str) -> bool {
    PALETTES.contains(&name)
}

pub fn is_model(model: &str) -> bool {
    MODELS.contains(&model)
}

/// Year span of a scenario; the id is matched case-insensitively.
pub fn scenario_years(scenario: &str) -> Option<(i32, i32)> {
    let scenario = scenario.to_ascii_lowercase();
    SCENARIOS
        .iter()
        .find(|(id, _, _)| *id == scenario)
        .map(|(_, start, end)| (*start, *end))
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> ViewerResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| ViewerError::InvalidConfig(format!("invalid date '{}': {}", s, e)))
}

/// Check that a date falls inside the scenario's period.
pub fn validate_scenario_date(scenario: &str, date: NaiveDate) -> ViewerResult<()> {
    let (start, end) = scenario_years(scenario)
        .ok_or_else(|| ViewerError::InvalidConfig(format!("unknown scenario '{}'", scenario)))?;
    if !(start..=end).contains(&date.year()) {
        return Err(ViewerError::InvalidConfig(format!(
            "date {} is outside the {} period ({}-{})",
            date, scenario, start, end
        )));
    }
    Ok(())
}

/// Scenario a date naturally belongs to when none is chosen.
pub fn default_scenario_for(date: NaiveDate) -> &'static str {
    if date.year() <= 2014 {
        "historical"
    } else {
        "ssp245"
    }
}
