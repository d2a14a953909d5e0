//! The settings record accepted from the external CLI collaborator (§6).
//! CLI argument parsing itself lives in `wirebom-cli`, out of scope here.

use std::path::PathBuf;

use crate::tables::GaugeTables;

#[derive(Debug, Clone)]
pub struct Settings {
    pub input_path: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub permissive: bool,
    pub system_voltage: f64,
    pub max_voltage_drop_fraction: f64,
    pub slack_inches: f64,
    pub label_distance_threshold_mm: f64,
    pub gauge_tables: GaugeTables,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_dir: None,
            permissive: false,
            system_voltage: 14.0,
            max_voltage_drop_fraction: 0.05,
            slack_inches: 24.0,
            label_distance_threshold_mm: 10.0,
            gauge_tables: GaugeTables::default(),
        }
    }
}

impl Settings {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Default::default()
        }
    }
}
