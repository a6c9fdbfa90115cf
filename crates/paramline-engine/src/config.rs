use std::fs;
use std::path::Path;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::units::Unit;

/// Describes one automatable parameter: its unit, an optional narrowing of
/// the unit's range, and the value the timeline starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Initial value. `None` defers to the sink's observed value.
    #[serde(default)]
    pub default: Option<f64>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, unit: Unit) -> Self {
        Self {
            name: name.into(),
            unit,
            min: None,
            max: None,
            default: Some(unit.default_value()),
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn without_default(mut self) -> Self {
        self.default = None;
        self
    }

    pub fn min_value(&self) -> f64 {
        let (min, _) = self.unit.range();
        self.min.map_or(min, |narrowed| narrowed.max(min))
    }

    pub fn max_value(&self) -> f64 {
        let (_, max) = self.unit.range();
        self.max.map_or(max, |narrowed| narrowed.min(max))
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_value(), self.max_value())
    }

    /// Accepts an already converted value if it lies within bounds.
    pub fn check(&self, value: f64) -> Result<f64, TimelineError> {
        if value < self.min_value() {
            Err(TimelineError::invalid(value, "below the parameter minimum"))
        } else if value > self.max_value() {
            Err(TimelineError::invalid(value, "above the parameter maximum"))
        } else {
            Ok(value)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.name.is_empty(), "parameter name must not be empty");
        ensure!(
            self.min_value() <= self.max_value(),
            "parameter '{}' has min {} above max {}",
            self.name,
            self.min_value(),
            self.max_value()
        );
        if let Some(default) = self.default {
            ensure!(
                self.check(default).is_ok(),
                "parameter '{}' default {default} is outside [{}, {}]",
                self.name,
                self.min_value(),
                self.max_value()
            );
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let spec: ParamSpec =
            serde_json::from_str(json).context("failed to parse parameter spec")?;
        spec.validate()?;
        Ok(spec)
    }
}

/// Loads a JSON array of parameter specs from disk.
pub fn load_specs(path: impl AsRef<Path>) -> anyhow::Result<Vec<ParamSpec>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter specs from {}", path.display()))?;
    let specs: Vec<ParamSpec> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse parameter specs in {}", path.display()))?;
    for spec in &specs {
        spec.validate()
            .with_context(|| format!("invalid parameter spec in {}", path.display()))?;
    }
    tracing::debug!(count = specs.len(), path = %path.display(), "loaded parameter specs");
    Ok(specs)
}
