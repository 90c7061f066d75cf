//! Common fixtures: catalogue metadata, chat replies and base-map data.

use serde_json::{json, Value};

/// Grid shapes used across the suite.
pub mod grid {
    /// NEX-GDDP native grid (0.25 degree)
    pub const NEX_GDDP: (usize, usize) = (600, 1440);

    /// 1 degree global grid
    pub const ONE_DEGREE: (usize, usize) = (180, 360);

    /// The 2x2 grid of the palette mapping scenario
    pub const TWO_BY_TWO: (usize, usize) = (2, 2);
}

/// Viewports in CSS pixels.
pub mod viewport {
    pub const SMALL: (u32, u32) = (360, 180);
    pub const DESKTOP: (u32, u32) = (1280, 640);
}

/// Body of `GET /metadata`.
pub fn metadata_json() -> Value {
    json!({
        "variables": ["tas", "tasmax", "tasmin", "pr", "hurs", "huss", "rsds", "rlds", "sfcWind"],
        "models": ["ACCESS-CM2", "CanESM5", "CESM2", "MIROC6"],
        "scenarios": ["historical", "ssp245", "ssp370", "ssp585"],
        "resolutions": ["low", "medium", "high"],
        "variable_metadata": {
            "tas": {"name": "Near-Surface Air Temperature", "unit": "K", "description": "Daily mean"},
            "pr": {"name": "Precipitation", "unit": "kg m-2 s-1", "description": "Daily total"}
        },
        "scenario_metadata": {
            "historical": {"period": "1950-2014", "type": "historical", "description": "Observed forcing"},
            "ssp245": {"period": "2015-2100", "type": "projection", "description": "Middle of the road"}
        },
        "time_range": {
            "start": "1950-01-01",
            "end": "2100-12-31",
            "historical_end": "2014-12-31",
            "projection_start": "2015-01-01"
        }
    })
}

/// Chat reply that switches the view to precipitation with a new palette.
pub fn chat_variable_reply() -> Value {
    json!({
        "message": "Switched to precipitation.",
        "success": true,
        "new_state": {"variable": "pr", "selectedUnit": "g m-2 s-1", "colorPalette": "cividis"}
    })
}

/// Chat reply that switches to a model comparison.
pub fn chat_compare_reply() -> Value {
    json!({
        "message": "Comparing two models.",
        "success": true,
        "new_state": {
            "canvasView": "map",
            "mode": "Compare",
            "compareMode": "Models",
            "model1": "ACCESS-CM2",
            "model2": "MIROC6",
            "selectedDate": "2050-07-01"
        }
    })
}

/// Chat reply asking for the chart view, which the map engine does not host.
pub fn chat_chart_reply() -> Value {
    json!({
        "message": "Here is a chart.",
        "success": true,
        "new_state": {
            "canvasView": "Chart",
            "chartMode": "single",
            "location": "Global",
            "models": ["CESM2"],
            "scenarios": ["ssp245"],
            "chartDate": "2050-01-01",
            "date": null,
            "scenario": null,
            "model": null,
            "mode": null
        }
    })
}

/// Coarse border set: a meridian segment and a line crossing the antimeridian.
pub fn coarse_borders_json() -> Value {
    json!([
        [[0.0, 10.0], [0.0, -10.0]],
        [[170.0, 0.0], [179.0, 0.0], [-179.0, 0.0], [-170.0, 0.0]]
    ])
}

/// Fine border set: a small closed square around Europe.
pub fn fine_borders_json() -> Value {
    json!([
        [[0.0, 40.0], [20.0, 40.0], [20.0, 55.0], [0.0, 55.0], [0.0, 40.0]]
    ])
}

/// Label list with overlapping neighbours and zoom-gated entries.
pub fn labels_json() -> Value {
    json!([
        {"name": "Paris", "lon": 2.35, "lat": 48.86, "min_zoom": 0.5, "priority": 1},
        {"name": "Versailles", "lon": 2.13, "lat": 48.80, "min_zoom": 0.5, "priority": 5},
        {"name": "Tokyo", "lon": 139.69, "lat": 35.69, "min_zoom": 0.5, "priority": 2},
        {"name": "Lyon", "lon": 4.84, "lat": 45.76, "min_zoom": 4.0, "priority": 3},
        {"name": "Fiji", "lon": 178.0, "lat": -17.7, "min_zoom": 0.5, "priority": 4}
    ])
}
