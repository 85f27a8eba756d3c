//! Input and output format tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input formats accepted by the convertor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Shapr,
}

impl InputFormat {
    /// File extension for this input format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Shapr => "shapr",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output formats a conversion can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Step,
    Stl,
    Obj,
}

impl OutputFormat {
    /// All supported output formats.
    pub const ALL: [OutputFormat; 3] = [Self::Step, Self::Stl, Self::Obj];

    /// File extension for this output format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Stl => "stl",
            Self::Obj => "obj",
        }
    }

    /// Human-readable description of the format.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Step => "STEP-File",
            Self::Stl => "Standard Triangle Language",
            Self::Obj => "3D Model Format",
        }
    }

    /// Parses a format from its extension tag.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.extension() == ext)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
