//! Which rows an export covers.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// The subset of processed rows an export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportScope {
    /// Every filtered, sorted row, ignoring pagination.
    #[default]
    All,
    /// Only the rows of the current page.
    CurrentPage,
    /// Only rows whose id is selected.
    Selected,
}

impl ExportScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportScope::All => "all",
            ExportScope::CurrentPage => "current-page",
            ExportScope::Selected => "selected",
        }
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ExportScope::All),
            "current-page" | "page" => Ok(ExportScope::CurrentPage),
            "selected" => Ok(ExportScope::Selected),
            other => Err(format!("unknown export scope '{}'", other)),
        }
    }
}
