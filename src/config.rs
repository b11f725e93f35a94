//! Planner configuration.
//!
//! Every knob has a default (first improvement, full recomputation), so an empty
//! JSON object is a valid configuration file:
//!
//! ```json
//! {
//!   "two_opt": { "strategy": "best-improvement", "evaluation": "delta", "parallel": true },
//!   "exact": { "cost_model": "trapezoidal", "max_targets": 9 }
//! }
//! ```

use crate::error::Result;
use crate::exact::ExactConfig;
use crate::heuristics::local_search::TwoOptConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub two_opt: TwoOptConfig,
    pub exact: ExactConfig,
}

impl PlannerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PlannerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.two_opt.validate()
    }
}
