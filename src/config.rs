//! Dashboard configuration.
//!
//! Stored as a JSON object on disk; every field is optional:
//! ```json
//! {
//!   "streets": ["Dundas", "Queen", "Adelaide", "Richmond", "Wellington", "Front"],
//!   "directions": { "EB": "Eastbound", "WB": "Westbound" },
//!   "threshold": 1.0
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_STREETS: [&str; 6] = [
    "Dundas",
    "Queen",
    "Adelaide",
    "Richmond",
    "Wellington",
    "Front",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Streets shown in the table, in display order.
    pub streets: Vec<String>,
    /// Direction codes mapped to their display labels.
    pub directions: BTreeMap<String, String>,
    /// Minutes of change before a cell is marked better or worse.
    pub threshold: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            streets: DEFAULT_STREETS.map(String::from).to_vec(),
            directions: BTreeMap::from([
                ("EB".to_string(), "Eastbound".to_string()),
                ("WB".to_string(), "Westbound".to_string()),
            ]),
            threshold: 1.0,
        }
    }
}

impl DashboardConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid dashboard config {path}"))
    }

    /// Loads `path` if given, otherwise falls back to the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Display label for a direction code, or the code itself if unknown.
    pub fn direction_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.directions
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }
}
