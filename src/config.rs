use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::SheetSpec;
use crate::data::model::Column;

/// Optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Where the report lives and how much of each ranking to show.
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub input_path: PathBuf,
    pub sheet_name: String,
    /// Zero-based index of the header row.
    pub header_row: usize,
    /// Rows shown in the two campaign rankings.
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("3.3 Lab Reporting CM - Conversions.xlsx"),
            sheet_name: "Data".to_string(),
            header_row: 13,
            top_n: 10,
        }
    }
}

impl DashboardConfig {
    /// Read the config from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Sheet layout for the loader; the column names are always the report's.
    pub fn sheet_spec(&self) -> SheetSpec {
        SheetSpec {
            sheet_name: self.sheet_name.clone(),
            header_row: self.header_row,
            column_names: Column::names(),
        }
    }

    /// The effective settings in the same shape as the config file.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("serializing config")
    }
}
