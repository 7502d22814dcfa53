//! Output formatters
//!
//! Renders a `searchTrails` response for the terminal. Geographic markup
//! lives in [`crate::export`].

pub mod json;
pub mod text;

use crate::error::Result;
use crate::tool::ToolResponse;
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format a tool response, success or failure
    fn format(&self, response: &ToolResponse) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    let formatters: [Box<dyn OutputFormatter>; 2] = [Box::new(json::JsonFormatter), Box::new(text::TextFormatter)];
    formatters
        .iter()
        .map(|f| FormatInfo {
            name: f.name().to_string(),
            description: f.description().to_string(),
        })
        .collect()
}
