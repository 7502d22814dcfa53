//! KML exporter

use crate::error::Result;
use crate::export::{element_id, ensure_not_empty, escape_xml, TrailExporter};
use crate::trail::Trail;

/// KML exporter - one Placemark with a LineString per trail
pub struct KmlExporter;

impl TrailExporter for KmlExporter {
    fn name(&self) -> &str {
        "kml"
    }

    fn description(&self) -> &str {
        "KML document, one placemark per trail"
    }

    fn content_type(&self) -> &str {
        "application/vnd.google-earth.kml+xml"
    }

    fn export(&self, trails: &[Trail]) -> Result<Vec<u8>> {
        ensure_not_empty(trails)?;

        let mut kml = String::new();
        kml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        kml.push('\n');
        kml.push_str(r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#);
        kml.push('\n');
        kml.push_str("  <Document>\n");
        kml.push_str("    <name>trail-scout</name>\n");

        for trail in trails {
            push_placemark(&mut kml, trail);
        }

        kml.push_str("  </Document>\n");
        kml.push_str("</kml>\n");
        Ok(kml.into_bytes())
    }
}

fn push_placemark(kml: &mut String, trail: &Trail) {
    let summary = &trail.summary;

    kml.push_str(&format!("    <Placemark id=\"{}\">\n", element_id(trail)));
    kml.push_str(&format!("      <name>{}</name>\n", escape_xml(&summary.title)));
    if let Some(description) = &summary.description {
        kml.push_str(&format!(
            "      <description>{}</description>\n",
            escape_xml(description)
        ));
    }

    kml.push_str("      <ExtendedData>\n");
    push_data(kml, "externalId", &summary.external_id);
    push_data(kml, "lengthKm", &format!("{:.2}", trail.length_km));
    push_data(kml, "url", &summary.detail_reference);
    if let Some(difficulty) = trail.stats.as_ref().and_then(|s| s.difficulty) {
        push_data(kml, "difficulty", &difficulty.to_string());
    }
    kml.push_str("      </ExtendedData>\n");

    let with_elevation = trail.has_elevation();
    kml.push_str("      <LineString>\n");
    kml.push_str("        <tessellate>1</tessellate>\n");
    kml.push_str(&format!(
        "        <altitudeMode>{}</altitudeMode>\n",
        if with_elevation { "absolute" } else { "clampToGround" }
    ));
    kml.push_str("        <coordinates>\n");
    for point in &trail.path {
        if with_elevation {
            kml.push_str(&format!(
                "          {},{},{}\n",
                point.lng,
                point.lat,
                point.elevation_m.unwrap_or(0.0)
            ));
        } else {
            kml.push_str(&format!("          {},{}\n", point.lng, point.lat));
        }
    }
    kml.push_str("        </coordinates>\n");
    kml.push_str("      </LineString>\n");
    kml.push_str("    </Placemark>\n");
}

fn push_data(kml: &mut String, name: &str, value: &str) {
    kml.push_str(&format!(
        "        <Data name=\"{}\"><value>{}</value></Data>\n",
        name,
        escape_xml(value)
    ));
}
