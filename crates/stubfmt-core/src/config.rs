//! Formatting parameters
//!
//! Passed explicitly into every operation; nothing here is process-wide.
//! Every field has a default, so a partial JSON document is a valid config.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Spaces per nesting level
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// The no-op marker standing in for an omitted implementation
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Cap on emitted blank-line runs (0 or 1)
    #[serde(default = "default_max_blank_lines")]
    pub max_blank_lines: usize,

    /// Fold eligible stubs onto their header line
    #[serde(default = "default_collapse_stubs")]
    pub collapse_stubs: bool,

    /// Skip the stability and equivalence check after formatting
    #[serde(default)]
    pub fast: bool,
}

fn default_indent_width() -> usize {
    4
}
fn default_placeholder() -> String {
    "...".to_string()
}
fn default_max_blank_lines() -> usize {
    1
}
fn default_collapse_stubs() -> bool {
    true
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            indent_width: 4,
            placeholder: "...".to_string(),
            max_blank_lines: 1,
            collapse_stubs: true,
            fast: false,
        }
    }
}

impl FormatConfig {
    /// Parse a JSON config document and validate it
    pub fn from_json(text: &str) -> Result<Self> {
        let config: FormatConfig = serde_json::from_str(text)
            .map_err(|e| Error::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=16).contains(&self.indent_width) {
            return Err(Error::Config(format!(
                "indent_width must be between 1 and 16, got {}",
                self.indent_width
            )));
        }
        if self.max_blank_lines > 1 {
            return Err(Error::Config(format!(
                "max_blank_lines must be 0 or 1, got {}",
                self.max_blank_lines
            )));
        }
        let marker = self.placeholder.trim();
        if marker.is_empty() || marker != self.placeholder || marker.contains('\n') {
            return Err(Error::Config(format!(
                "placeholder must be a single non-blank token, got {:?}",
                self.placeholder
            )));
        }
        Ok(())
    }

    /// Indentation prefix for a nesting depth
    pub fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.indent_width)
    }
}
