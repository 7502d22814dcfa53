//! Geographic markup exporters
//!
//! Serializes trails into documents common map viewers can open. Every
//! exporter refuses an empty trail list with [`Error::EmptyExport`] rather
//! than writing a document with nothing in it.

pub mod gpx;
pub mod kml;

use crate::error::{Error, Result};
use crate::trail::Trail;
use serde::{Deserialize, Serialize};

/// Information about an export format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportInfo {
    pub name: String,
    pub description: String,
    pub content_type: String,
}

/// Trait for markup exporters
pub trait TrailExporter: Send + Sync {
    /// Format name, also used as file extension
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// MIME type of the produced document
    fn content_type(&self) -> &str;

    /// Render `trails` into a document
    ///
    /// One geometry entity per trail, in the given order.
    fn export(&self, trails: &[Trail]) -> Result<Vec<u8>>;
}

/// Get an exporter by name
pub fn get_exporter(name: &str) -> Option<Box<dyn TrailExporter>> {
    match name.to_lowercase().as_str() {
        "kml" => Some(Box::new(kml::KmlExporter)),
        "gpx" => Some(Box::new(gpx::GpxExporter)),
        _ => None,
    }
}

/// List all available exporters
pub fn available_exporters() -> Vec<ExportInfo> {
    let exporters: [Box<dyn TrailExporter>; 2] = [Box::new(kml::KmlExporter), Box::new(gpx::GpxExporter)];
    exporters
        .iter()
        .map(|e| ExportInfo {
            name: e.name().to_string(),
            description: e.description().to_string(),
            content_type: e.content_type().to_string(),
        })
        .collect()
}

pub(crate) fn ensure_not_empty(trails: &[Trail]) -> Result<()> {
    if trails.is_empty() {
        return Err(Error::EmptyExport);
    }
    Ok(())
}

/// Escape text for use in XML content and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Document-unique identifier for a trail, safe as an XML id
pub(crate) fn element_id(trail: &Trail) -> String {
    let id: String = trail
        .external_id()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("trail-{}", id)
}
