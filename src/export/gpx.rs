//! GPX exporter

use crate::error::Result;
use crate::export::{ensure_not_empty, escape_xml, TrailExporter};
use crate::trail::Trail;
use chrono::{SecondsFormat, Utc};

/// GPX exporter - one track per trail
pub struct GpxExporter;

impl TrailExporter for GpxExporter {
    fn name(&self) -> &str {
        "gpx"
    }

    fn description(&self) -> &str {
        "GPX 1.1 file, one track per trail"
    }

    fn content_type(&self) -> &str {
        "application/gpx+xml"
    }

    fn export(&self, trails: &[Trail]) -> Result<Vec<u8>> {
        ensure_not_empty(trails)?;

        let mut gpx = String::new();

        // XML header
        gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        gpx.push('\n');
        gpx.push_str(r#"<gpx version="1.1" creator="trail-scout" xmlns="http://www.topografix.com/GPX/1/1">"#);
        gpx.push('\n');

        gpx.push_str("  <metadata>\n");
        gpx.push_str(&format!(
            "    <time>{}</time>\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        gpx.push_str("  </metadata>\n");

        for trail in trails {
            let summary = &trail.summary;
            gpx.push_str("  <trk>\n");
            gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(&summary.title)));
            if let Some(description) = &summary.description {
                gpx.push_str(&format!("    <desc>{}</desc>\n", escape_xml(description)));
            }
            gpx.push_str(&format!(
                "    <link href=\"{}\"/>\n",
                escape_xml(&summary.detail_reference)
            ));
            gpx.push_str("    <trkseg>\n");
            for point in &trail.path {
                match point.elevation_m {
                    Some(ele) => {
                        gpx.push_str(&format!(
                            "      <trkpt lat=\"{}\" lon=\"{}\"><ele>{}</ele></trkpt>\n",
                            point.lat, point.lng, ele
                        ));
                    }
                    None => {
                        gpx.push_str(&format!(
                            "      <trkpt lat=\"{}\" lon=\"{}\"/>\n",
                            point.lat, point.lng
                        ));
                    }
                }
            }
            gpx.push_str("    </trkseg>\n");
            gpx.push_str("  </trk>\n");
        }

        gpx.push_str("</gpx>\n");
        Ok(gpx.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::trail::fixtures::{summary, trail_at};

    #[test]
    fn test_gpx_structure() {
        let path = vec![
            GeoPoint::with_elevation(41.6, 1.8, 700.0),
            GeoPoint::new(41.61, 1.81),
        ];
        let trail = Trail::new(summary("5", "Canal & Migdia"), path).unwrap();
        let gpx = String::from_utf8(GpxExporter.export(&[trail]).unwrap()).unwrap();

        assert!(gpx.contains(r#"<gpx version="1.1""#));
        assert_eq!(gpx.matches("<trk>").count(), 1);
        assert_eq!(gpx.matches("<trkpt").count(), 2);
        assert!(gpx.contains("<name>Canal &amp; Migdia</name>"));
        assert!(gpx.contains(r#"<trkpt lat="41.6" lon="1.8"><ele>700</ele></trkpt>"#));
        assert!(gpx.contains(r#"<trkpt lat="41.61" lon="1.81"/>"#));
        assert!(gpx.trim_end().ends_with("</gpx>"));
    }

    #[test]
    fn test_one_track_per_trail() {
        let trails = [trail_at("1", 41.0, 1.0), trail_at("2", 41.5, 1.5)];
        let gpx = String::from_utf8(GpxExporter.export(&trails).unwrap()).unwrap();
        assert_eq!(gpx.matches("<trk>").count(), 2);
    }

    #[test]
    fn test_gpx_exporter_info() {
        assert_eq!(GpxExporter.name(), "gpx");
        assert_eq!(GpxExporter.content_type(), "application/gpx+xml");
        assert!(!GpxExporter.description().is_empty());
    }
}
