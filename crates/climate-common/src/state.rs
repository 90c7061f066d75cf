//! View state and the typed patches that mutate it.
//!
//! The chat endpoint returns a loosely typed `new_state` object. It is parsed
//! into [`StatePatch`] values here, rejecting unknown keys, and only then
//! applied to the [`ViewState`].

use chrono::{Datelike, NaiveDate};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::catalog;
use crate::payload::{DataRequest, Resolution};
use crate::units;

/// Errors raised while parsing or applying a state patch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    #[error("new_state must be a JSON object")]
    NotAnObject,

    #[error("Unknown state field: {0}")]
    UnknownField(String),

    #[error("Unsupported state field: {0}")]
    Unsupported(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Missing value for {0}")]
    Missing(String),
}

impl PatchError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PatchError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Structural kind of a view mode. Switching kinds resets the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Explore,
    Compare,
    Ensemble,
}

/// The two sides of a compare view; rendered as `a - b`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareSelection {
    Models {
        a: String,
        b: String,
        scenario: String,
        date: NaiveDate,
    },
    Scenarios {
        a: String,
        b: String,
        model: String,
        date: NaiveDate,
    },
    Dates {
        a: NaiveDate,
        b: NaiveDate,
        model: String,
        scenario: String,
    },
}

impl CompareSelection {
    pub fn label(&self) -> &'static str {
        match self {
            CompareSelection::Models { .. } => "Models",
            CompareSelection::Scenarios { .. } => "Scenarios",
            CompareSelection::Dates { .. } => "Dates",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewMode {
    Explore {
        model: String,
        scenario: String,
        date: NaiveDate,
    },
    Compare(CompareSelection),
    Ensemble {
        models: Vec<String>,
        scenarios: Vec<String>,
        date: NaiveDate,
    },
}

impl ViewMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            ViewMode::Explore { .. } => ModeKind::Explore,
            ViewMode::Compare(_) => ModeKind::Compare,
            ViewMode::Ensemble { .. } => ModeKind::Ensemble,
        }
    }

    /// Model used to fill patches that leave it out.
    pub fn current_model(&self) -> Option<&str> {
        match self {
            ViewMode::Explore { model, .. } => Some(model),
            ViewMode::Compare(CompareSelection::Models { a, .. }) => Some(a),
            ViewMode::Compare(CompareSelection::Scenarios { model, .. })
            | ViewMode::Compare(CompareSelection::Dates { model, .. }) => Some(model),
            ViewMode::Ensemble { models, .. } => models.first().map(String::as_str),
        }
    }

    pub fn current_scenario(&self) -> Option<&str> {
        match self {
            ViewMode::Explore { scenario, .. } => Some(scenario),
            ViewMode::Compare(CompareSelection::Models { scenario, .. })
            | ViewMode::Compare(CompareSelection::Dates { scenario, .. }) => Some(scenario),
            ViewMode::Compare(CompareSelection::Scenarios { a, .. }) => Some(a),
            ViewMode::Ensemble { scenarios, .. } => scenarios.first().map(String::as_str),
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        match self {
            ViewMode::Explore { date, .. }
            | ViewMode::Ensemble { date, .. }
            | ViewMode::Compare(CompareSelection::Models { date, .. })
            | ViewMode::Compare(CompareSelection::Scenarios { date, .. }) => *date,
            ViewMode::Compare(CompareSelection::Dates { a, .. }) => *a,
        }
    }
}

/// Everything that determines what the map shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub variable: String,
    /// Display unit; `None` shows native units
    pub unit: Option<String>,
    pub palette: String,
    pub resolution: Resolution,
    pub mode: ViewMode,
}

/// Compare-mode fields of a patch. Missing sides are filled from the
/// current view when applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparePatch {
    pub compare_mode: String,
    pub model1: Option<String>,
    pub model2: Option<String>,
    pub scenario1: Option<String>,
    pub scenario2: Option<String>,
    pub date1: Option<NaiveDate>,
    pub date2: Option<NaiveDate>,
    pub date: Option<NaiveDate>,
}

/// One validated mutation of the view state.
#[derive(Debug, Clone, PartialEq)]
pub enum StatePatch {
    Variable {
        variable: String,
        unit: Option<String>,
    },
    Unit(String),
    Palette(String),
    /// Move the active mode's date (time slider)
    Date(NaiveDate),
    Explore {
        model: Option<String>,
        scenario: Option<String>,
        date: Option<NaiveDate>,
    },
    Compare(ComparePatch),
    Ensemble {
        models: Option<Vec<String>>,
        scenarios: Option<Vec<String>>,
        date: Option<NaiveDate>,
    },
}

/// What the host must do after applying patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchEffect {
    /// New raster data is needed
    pub refetch: bool,
    /// The cached bitmap must be rebuilt from the current grid
    pub rerender: bool,
    /// The structural mode changed; pan and zoom go back to identity
    pub reset_transform: bool,
}

impl PatchEffect {
    pub fn merge(self, other: PatchEffect) -> PatchEffect {
        PatchEffect {
            refetch: self.refetch || other.refetch,
            rerender: self.rerender || other.rerender,
            reset_transform: self.reset_transform || other.reset_transform,
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.refetch && !self.rerender && !self.reset_transform
    }
}

const UNSUPPORTED_FIELDS: &[&str] = &[
    "masks",
    "chartMode",
    "location",
    "chartDate",
    "startDate",
    "endDate",
    "models",
    "scenarios",
];

const IGNORED_FIELDS: &[&str] = &["date", "scenario", "model"];

const KNOWN_FIELDS: &[&str] = &[
    "variable",
    "selectedUnit",
    "colorPalette",
    "canvasView",
    "mode",
    "selectedModel",
    "selectedScenario",
    "selectedDate",
    "compareMode",
    "scenario1",
    "scenario2",
    "model1",
    "model2",
    "date1",
    "date2",
    "selectedScenarios",
    "selectedModels",
];

/// A field value with JSON null and the strings "None"/"null" treated as absent.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() || s == "None" || s == "null" => None,
        v => Some(v),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, PatchError> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(PatchError::invalid(key, "expected a string")),
    }
}

fn list_field(fields: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>, PatchError> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| PatchError::invalid(key, "expected a list of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(PatchError::invalid(key, "expected a list of strings")),
    }
}

fn date_field(fields: &Map<String, Value>, key: &str) -> Result<Option<NaiveDate>, PatchError> {
    string_field(fields, key)?
        .map(|s| parse_date(key, &s))
        .transpose()
}

fn parse_date(field: &str, s: &str) -> Result<NaiveDate, PatchError> {
    catalog::parse_date(s).map_err(|_| PatchError::invalid(field, format!("'{}' is not YYYY-MM-DD", s)))
}

fn check_model(field: &str, model: &str) -> Result<(), PatchError> {
    if catalog::is_model(model) {
        Ok(())
    } else {
        Err(PatchError::invalid(field, format!("unknown model '{}'", model)))
    }
}

fn check_scenario(field: &str, scenario: &str) -> Result<String, PatchError> {
    let scenario = scenario.to_ascii_lowercase();
    if catalog::scenario_years(&scenario).is_some() {
        Ok(scenario)
    } else {
        Err(PatchError::invalid(field, format!("unknown scenario '{}'", scenario)))
    }
}

fn check_date_in(field: &str, scenario: &str, date: NaiveDate) -> Result<(), PatchError> {
    catalog::validate_scenario_date(scenario, date).map_err(|e| PatchError::invalid(field, e.to_string()))
}

impl StatePatch {
    /// Parse a chat `new_state` object into patches, in application order.
    pub fn parse_all(new_state: &Value) -> Result<Vec<StatePatch>, PatchError> {
        let fields = new_state.as_object().ok_or(PatchError::NotAnObject)?;

        for (key, value) in fields {
            if UNSUPPORTED_FIELDS.contains(&key.as_str()) {
                return Err(PatchError::Unsupported(key.clone()));
            }
            if key == "canvasView" && !matches!(value.as_str(), Some(v) if v.eq_ignore_ascii_case("map")) {
                return Err(PatchError::Unsupported(format!("canvasView={}", value)));
            }
            if !KNOWN_FIELDS.contains(&key.as_str()) && !IGNORED_FIELDS.contains(&key.as_str()) {
                return Err(PatchError::UnknownField(key.clone()));
            }
        }

        let mut patches = Vec::new();

        let unit = string_field(fields, "selectedUnit")?;
        match string_field(fields, "variable")? {
            Some(variable) => {
                if !catalog::is_variable(&variable) {
                    return Err(PatchError::invalid("variable", format!("unknown variable '{}'", variable)));
                }
                patches.push(StatePatch::Variable { variable, unit });
            }
            None => {
                if let Some(unit) = unit {
                    patches.push(StatePatch::Unit(unit));
                }
            }
        }

        if let Some(palette) = string_field(fields, "colorPalette")? {
            if !catalog::is_palette(&palette) {
                return Err(PatchError::invalid("colorPalette", format!("unknown palette '{}'", palette)));
            }
            patches.push(StatePatch::Palette(palette));
        }

        // A null mode is how the chart view clears the map selection.
        let mode = match fields.get("mode") {
            None => None,
            Some(Value::Null) => return Err(PatchError::Unsupported("mode=null".to_string())),
            Some(_) => match present(fields, "mode") {
                None => None,
                Some(Value::String(mode)) => Some(mode.as_str()),
                Some(_) => return Err(PatchError::invalid("mode", "expected a string")),
            },
        };

        let model = string_field(fields, "selectedModel")?;
        let scenario = string_field(fields, "selectedScenario")?;
        let date = date_field(fields, "selectedDate")?;

        match mode {
            Some("Explore") => patches.push(Self::explore(model, scenario, date)?),
            Some("Compare") => patches.push(Self::compare(fields, date)?),
            Some("Ensemble") => {
                let models = list_field(fields, "selectedModels")?;
                if let Some(models) = &models {
                    for m in models {
                        check_model("selectedModels", m)?;
                    }
                }
                let scenarios = list_field(fields, "selectedScenarios")?
                    .map(|list| {
                        list.iter()
                            .map(|s| check_scenario("selectedScenarios", s))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .transpose()?;
                patches.push(StatePatch::Ensemble {
                    models,
                    scenarios,
                    date,
                });
            }
            Some(other) => return Err(PatchError::invalid("mode", format!("unknown mode '{}'", other))),
            None => {
                if model.is_some() || scenario.is_some() {
                    patches.push(Self::explore(model, scenario, date)?);
                } else if let Some(date) = date {
                    patches.push(StatePatch::Date(date));
                }
            }
        }

        Ok(patches)
    }

    fn explore(
        model: Option<String>,
        scenario: Option<String>,
        date: Option<NaiveDate>,
    ) -> Result<StatePatch, PatchError> {
        if let Some(model) = &model {
            check_model("selectedModel", model)?;
        }
        let scenario = scenario
            .map(|s| check_scenario("selectedScenario", &s))
            .transpose()?;
        Ok(StatePatch::Explore {
            model,
            scenario,
            date,
        })
    }

    fn compare(fields: &Map<String, Value>, date: Option<NaiveDate>) -> Result<StatePatch, PatchError> {
        let compare_mode = string_field(fields, "compareMode")?
            .ok_or_else(|| PatchError::Missing("compareMode".to_string()))?;
        if !matches!(compare_mode.as_str(), "Models" | "Scenarios" | "Dates") {
            return Err(PatchError::invalid(
                "compareMode",
                format!("'{}' is not one of Models, Scenarios, Dates", compare_mode),
            ));
        }

        let model1 = string_field(fields, "model1")?;
        let model2 = string_field(fields, "model2")?;
        for (field, model) in [("model1", &model1), ("model2", &model2)] {
            if let Some(model) = model {
                check_model(field, model)?;
            }
        }
        let scenario1 = string_field(fields, "scenario1")?
            .map(|s| check_scenario("scenario1", &s))
            .transpose()?;
        let scenario2 = string_field(fields, "scenario2")?
            .map(|s| check_scenario("scenario2", &s))
            .transpose()?;

        Ok(StatePatch::Compare(ComparePatch {
            compare_mode,
            model1,
            model2,
            scenario1,
            scenario2,
            date1: date_field(fields, "date1")?,
            date2: date_field(fields, "date2")?,
            date,
        }))
    }
}

impl ViewState {
    pub fn new(variable: &str, model: &str, scenario: &str, date: NaiveDate) -> Self {
        Self {
            variable: variable.to_string(),
            unit: None,
            palette: "viridis".to_string(),
            resolution: Resolution::default(),
            mode: ViewMode::Explore {
                model: model.to_string(),
                scenario: scenario.to_ascii_lowercase(),
                date,
            },
        }
    }

    pub fn with_palette(mut self, palette: &str) -> Self {
        self.palette = palette.to_string();
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Whether the rendered field is a difference of two rasters.
    pub fn is_difference(&self) -> bool {
        matches!(self.mode, ViewMode::Compare(_))
    }

    /// Apply patches in order. The state is left untouched if any patch fails.
    pub fn apply_all(&mut self, patches: &[StatePatch]) -> Result<PatchEffect, PatchError> {
        let mut next = self.clone();
        let mut effect = PatchEffect::default();
        for patch in patches {
            effect = effect.merge(next.apply(patch)?);
        }
        *self = next;
        Ok(effect)
    }

    /// Apply a single patch.
    pub fn apply(&mut self, patch: &StatePatch) -> Result<PatchEffect, PatchError> {
        let mut effect = PatchEffect::default();
        match patch {
            StatePatch::Variable { variable, unit } => {
                let offered = units::display_units(variable);
                let unit = match unit {
                    Some(u) if offered.contains(&u.as_str()) => Some(u.clone()),
                    _ => offered.first().map(|u| u.to_string()),
                };
                if *variable != self.variable {
                    self.variable = variable.clone();
                    effect.refetch = true;
                }
                self.unit = unit;
            }
            StatePatch::Unit(unit) => {
                if !units::display_units(&self.variable).contains(&unit.as_str()) {
                    return Err(PatchError::invalid(
                        "selectedUnit",
                        format!("'{}' is not offered for {}", unit, self.variable),
                    ));
                }
                self.unit = Some(unit.clone());
            }
            StatePatch::Palette(palette) => {
                if *palette != self.palette {
                    self.palette = palette.clone();
                    effect.rerender = true;
                }
            }
            StatePatch::Date(date) => {
                let mut mode = self.mode.clone();
                match &mut mode {
                    ViewMode::Explore {
                        scenario,
                        date: current,
                        ..
                    } => {
                        check_date_in("selectedDate", scenario, *date)?;
                        *current = *date;
                    }
                    ViewMode::Compare(CompareSelection::Models {
                        scenario,
                        date: current,
                        ..
                    }) => {
                        check_date_in("selectedDate", scenario, *date)?;
                        *current = *date;
                    }
                    ViewMode::Compare(CompareSelection::Scenarios {
                        a, date: current, ..
                    }) => {
                        check_date_in("selectedDate", a, *date)?;
                        *current = *date;
                    }
                    ViewMode::Compare(CompareSelection::Dates { a, .. }) => *a = *date,
                    ViewMode::Ensemble {
                        scenarios,
                        date: current,
                        ..
                    } => {
                        *scenarios = ensemble_scenarios(scenarios.clone(), *date);
                        *current = *date;
                    }
                }
                effect.refetch = mode != self.mode;
                self.mode = mode;
            }
            StatePatch::Explore {
                model,
                scenario,
                date,
            } => {
                let model = model
                    .clone()
                    .or_else(|| self.mode.current_model().map(str::to_string))
                    .ok_or_else(|| PatchError::Missing("selectedModel".to_string()))?;
                let scenario = scenario
                    .clone()
                    .or_else(|| self.mode.current_scenario().map(str::to_string))
                    .ok_or_else(|| PatchError::Missing("selectedScenario".to_string()))?;
                let date = date.unwrap_or_else(|| self.mode.current_date());
                check_date_in("selectedDate", &scenario, date)?;
                effect = effect.merge(self.switch_mode(ViewMode::Explore {
                    model,
                    scenario,
                    date,
                }));
            }
            StatePatch::Compare(compare) => {
                let selection = self.resolve_compare(compare)?;
                effect = effect.merge(self.switch_mode(ViewMode::Compare(selection)));
            }
            StatePatch::Ensemble {
                models,
                scenarios,
                date,
            } => {
                let date = date.unwrap_or_else(|| self.mode.current_date());
                let models = match models {
                    Some(models) if !models.is_empty() => models.clone(),
                    _ => self.fill_models(),
                };
                if models.is_empty() {
                    return Err(PatchError::Missing("selectedModels".to_string()));
                }
                let scenarios = match scenarios {
                    Some(scenarios) if !scenarios.is_empty() => scenarios.clone(),
                    _ => self.fill_scenarios(),
                };
                if scenarios.is_empty() {
                    return Err(PatchError::Missing("selectedScenarios".to_string()));
                }
                let scenarios = ensemble_scenarios(scenarios, date);
                for scenario in &scenarios {
                    check_date_in("selectedDate", scenario, date)?;
                }
                effect = effect.merge(self.switch_mode(ViewMode::Ensemble {
                    models,
                    scenarios,
                    date,
                }));
            }
        }
        Ok(effect)
    }

    fn switch_mode(&mut self, mode: ViewMode) -> PatchEffect {
        let effect = PatchEffect {
            refetch: mode != self.mode,
            rerender: false,
            reset_transform: mode.kind() != self.mode.kind(),
        };
        self.mode = mode;
        effect
    }

    fn fill_models(&self) -> Vec<String> {
        match &self.mode {
            ViewMode::Ensemble { models, .. } => models.clone(),
            ViewMode::Compare(CompareSelection::Models { a, b, .. }) => vec![a.clone(), b.clone()],
            mode => mode.current_model().map(str::to_string).into_iter().collect(),
        }
    }

    fn fill_scenarios(&self) -> Vec<String> {
        match &self.mode {
            ViewMode::Ensemble { scenarios, .. } => scenarios.clone(),
            ViewMode::Compare(CompareSelection::Scenarios { a, b, .. }) => vec![a.clone(), b.clone()],
            mode => mode.current_scenario().map(str::to_string).into_iter().collect(),
        }
    }

    fn resolve_compare(&self, patch: &ComparePatch) -> Result<CompareSelection, PatchError> {
        let current_model = self.mode.current_model().map(str::to_string);
        let current_scenario = self.mode.current_scenario().map(str::to_string);
        let date = patch.date.unwrap_or_else(|| self.mode.current_date());

        let selection = match patch.compare_mode.as_str() {
            "Models" => {
                let a = patch
                    .model1
                    .clone()
                    .or(current_model)
                    .ok_or_else(|| PatchError::Missing("model1".to_string()))?;
                let b = patch
                    .model2
                    .clone()
                    .ok_or_else(|| PatchError::Missing("model2".to_string()))?;
                let scenario = current_scenario
                    .filter(|s| catalog::validate_scenario_date(s, date).is_ok())
                    .unwrap_or_else(|| catalog::default_scenario_for(date).to_string());
                CompareSelection::Models { a, b, scenario, date }
            }
            "Scenarios" => {
                let a = patch
                    .scenario1
                    .clone()
                    .or(current_scenario)
                    .ok_or_else(|| PatchError::Missing("scenario1".to_string()))?;
                let b = patch
                    .scenario2
                    .clone()
                    .ok_or_else(|| PatchError::Missing("scenario2".to_string()))?;
                check_date_in("selectedDate", &a, date)?;
                let model = current_model.ok_or_else(|| PatchError::Missing("selectedModel".to_string()))?;
                CompareSelection::Scenarios { a, b, model, date }
            }
            "Dates" => {
                let a = patch
                    .date1
                    .ok_or_else(|| PatchError::Missing("date1".to_string()))?;
                let b = patch
                    .date2
                    .ok_or_else(|| PatchError::Missing("date2".to_string()))?;
                for (field, d) in [("date1", a), ("date2", b)] {
                    check_date_in(field, catalog::default_scenario_for(d), d)?;
                }
                let model = current_model.ok_or_else(|| PatchError::Missing("selectedModel".to_string()))?;
                let scenario = current_scenario
                    .filter(|s| *s != "historical")
                    .unwrap_or_else(|| "ssp245".to_string());
                CompareSelection::Dates { a, b, model, scenario }
            }
            other => {
                return Err(PatchError::invalid(
                    "compareMode",
                    format!("'{}' is not one of Models, Scenarios, Dates", other),
                ))
            }
        };
        Ok(selection)
    }

    /// Data requests needed to render the current view.
    ///
    /// Compare views yield exactly two requests, `a` first. Ensemble views
    /// yield one request per (model, scenario) pair.
    pub fn requests(&self) -> Vec<DataRequest> {
        let request = |model: &str, scenario: &str, date: NaiveDate| {
            DataRequest::new(&self.variable, &date.to_string(), model, Some(scenario))
                .with_resolution(self.resolution)
        };
        match &self.mode {
            ViewMode::Explore {
                model,
                scenario,
                date,
            } => vec![request(model, scenario, *date)],
            ViewMode::Compare(CompareSelection::Models { a, b, scenario, date }) => {
                vec![request(a, scenario, *date), request(b, scenario, *date)]
            }
            ViewMode::Compare(CompareSelection::Scenarios { a, b, model, date }) => {
                vec![request(model, a, *date), request(model, b, *date)]
            }
            ViewMode::Compare(CompareSelection::Dates { a, b, model, scenario }) => {
                let scenario_for = |d: NaiveDate| {
                    if catalog::validate_scenario_date(scenario, d).is_ok() {
                        scenario.as_str()
                    } else {
                        catalog::default_scenario_for(d)
                    }
                };
                vec![
                    request(model, scenario_for(*a), *a),
                    request(model, scenario_for(*b), *b),
                ]
            }
            ViewMode::Ensemble {
                models,
                scenarios,
                date,
            } => models
                .iter()
                .flat_map(|m| scenarios.iter().map(move |s| (m, s)))
                .map(|(m, s)| request(m, s, *date))
                .collect(),
        }
    }

    /// The state as the chat endpoint expects it in `context`.
    pub fn to_context(&self) -> Value {
        let mut context = json!({
            "variable": self.variable,
            "selectedUnit": self.unit,
            "colorPalette": self.palette,
            "canvasView": "map",
        });
        let extra = match &self.mode {
            ViewMode::Explore {
                model,
                scenario,
                date,
            } => json!({
                "mode": "Explore",
                "selectedModel": model,
                "selectedScenario": scenario,
                "selectedDate": date.to_string(),
            }),
            ViewMode::Compare(selection) => {
                let mut value = json!({
                    "mode": "Compare",
                    "compareMode": selection.label(),
                });
                let sides = match selection {
                    CompareSelection::Models { a, b, scenario, date } => json!({
                        "model1": a, "model2": b,
                        "selectedScenario": scenario, "selectedDate": date.to_string(),
                    }),
                    CompareSelection::Scenarios { a, b, model, date } => json!({
                        "scenario1": a, "scenario2": b,
                        "selectedModel": model, "selectedDate": date.to_string(),
                    }),
                    CompareSelection::Dates { a, b, model, scenario } => json!({
                        "date1": a.to_string(), "date2": b.to_string(),
                        "selectedModel": model, "selectedScenario": scenario,
                    }),
                };
                merge_objects(&mut value, sides);
                value
            }
            ViewMode::Ensemble {
                models,
                scenarios,
                date,
            } => json!({
                "mode": "Ensemble",
                "selectedModels": models,
                "selectedScenarios": scenarios,
                "selectedDate": date.to_string(),
            }),
        };
        merge_objects(&mut context, extra);
        context
    }
}

fn merge_objects(target: &mut Value, source: Value) {
    if let (Value::Object(target), Value::Object(source)) = (target, source) {
        target.extend(source);
    }
}

/// Historical dates use only the historical run; projection dates drop it.
fn ensemble_scenarios(scenarios: Vec<String>, date: NaiveDate) -> Vec<String> {
    if date.year() < 2015 {
        return vec!["historical".to_string()];
    }
    let projections: Vec<String> = scenarios.into_iter().filter(|s| s != "historical").collect();
    if projections.is_empty() {
        vec![catalog::default_scenario_for(date).to_string()]
    } else {
        projections
    }
}
