//! JSON output formatter

use crate::error::Result;
use crate::format::OutputFormatter;
use crate::tool::ToolResponse;

/// JSON formatter - outputs the tool payload as pretty-printed JSON
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Tool payload as JSON"
    }

    fn format(&self, response: &ToolResponse) -> Result<String> {
        Ok(serde_json::to_string_pretty(response)?)
    }
}
