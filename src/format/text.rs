//! Human-readable text output formatter

use crate::error::Result;
use crate::format::OutputFormatter;
use crate::tool::{ToolResponse, TrailRecord};

/// Text formatter - outputs a human-readable trail list
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable trail list"
    }

    fn format(&self, response: &ToolResponse) -> Result<String> {
        let mut output = String::new();

        let success = match response {
            ToolResponse::Ok(success) => success,
            ToolResponse::Error(failure) => {
                output.push_str(&format!("Search failed ({}): {}\n", failure.kind, failure.message));
                if failure.retryable {
                    output.push_str("The service may recover; try again later.\n");
                }
                return Ok(output);
            }
        };

        if success.trails.is_empty() {
            output.push_str(&format!("No trails found (query {})\n", success.query_id));
        } else {
            output.push_str(&format!(
                "Found {} trail(s) (query {})\n",
                success.count, success.query_id
            ));
        }

        for (i, trail) in success.trails.iter().enumerate() {
            output.push('\n');
            push_trail(&mut output, i + 1, trail);
        }

        if !success.warnings.is_empty() {
            output.push_str("\nWarnings:\n");
            for warning in &success.warnings {
                output.push_str(&format!(
                    "  - [{}] {}{}\n",
                    warning.stage,
                    warning
                        .external_id
                        .as_deref()
                        .map(|id| format!("{}: ", id))
                        .unwrap_or_default(),
                    warning.message
                ));
            }
        }

        Ok(output)
    }
}

fn push_trail(output: &mut String, rank: usize, trail: &TrailRecord) {
    output.push_str(&format!("{}. {}\n", rank, trail.title));
    output.push_str(&format!("   {}\n", trail.url));

    let mut length = format!("{:.2} km", trail.length_km);
    if let Some(listed) = trail.approx_distance_km {
        length.push_str(&format!(" (listed {:.1} km)", listed));
    }
    output.push_str(&format!("   Length: {}, {} points\n", length, trail.point_count));

    if let Some(minutes) = trail.approx_duration_min {
        output.push_str(&format!("   Duration: {}h {:02}min\n", minutes / 60, minutes % 60));
    }
    if let Some(difficulty) = trail.difficulty {
        output.push_str(&format!("   Difficulty: {}\n", difficulty));
    }
    match trail.distance_from_center_km {
        Some(km) => output.push_str(&format!(
            "   Centroid: ({:.5}, {:.5}), {:.1} km from center\n",
            trail.centroid.lat, trail.centroid.lng, km
        )),
        None => output.push_str(&format!(
            "   Centroid: ({:.5}, {:.5})\n",
            trail.centroid.lat, trail.centroid.lng
        )),
    }
    if let Some(description) = &trail.description {
        output.push_str(&format!("   {}\n", description));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::fetch::{FetchWarning, WarningStage};
    use crate::geo::Coordinates;
    use crate::tool::ToolSuccess;
    use crate::trail::Difficulty;
    use uuid::Uuid;

    fn record() -> TrailRecord {
        TrailRecord {
            id: "1408223".to_string(),
            title: "Montserrat - Sant Jeroni".to_string(),
            url: "https://es.wikiloc.com/rutas/1408223".to_string(),
            description: Some("Subida clásica".to_string()),
            length_km: 10.4213,
            approx_distance_km: Some(10.5),
            approx_duration_min: Some(200),
            point_count: 412,
            centroid: Coordinates::new(41.6, 1.81),
            distance_from_center_km: Some(2.34),
            difficulty: Some(Difficulty::Moderate),
            geometry: None,
        }
    }

    #[test]
    fn test_text_format() {
        let response = ToolResponse::Ok(ToolSuccess {
            query_id: Uuid::nil(),
            count: 1,
            trails: vec![record()],
            warnings: vec![FetchWarning {
                stage: WarningStage::Geometry,
                external_id: Some("99".to_string()),
                kind: ErrorKind::MalformedGeometry,
                message: "bad bytes".to_string(),
            }],
        });

        let output = TextFormatter.format(&response).unwrap();

        assert!(output.contains("Found 1 trail(s)"));
        assert!(output.contains("1. Montserrat - Sant Jeroni"));
        assert!(output.contains("Length: 10.42 km (listed 10.5 km), 412 points"));
        assert!(output.contains("Duration: 3h 20min"));
        assert!(output.contains("Difficulty: Moderate"));
        assert!(output.contains("2.3 km from center"));
        assert!(output.contains("[geometry] 99: bad bytes"));
    }

    #[test]
    fn test_text_format_empty_and_error() {
        let empty = ToolResponse::Ok(ToolSuccess {
            query_id: Uuid::nil(),
            count: 0,
            trails: vec![],
            warnings: vec![],
        });
        assert!(TextFormatter.format(&empty).unwrap().starts_with("No trails found"));

        let failed = ToolResponse::from_error(&Error::upstream("timed out"));
        let output = TextFormatter.format(&failed).unwrap();
        assert!(output.contains("Search failed (upstream_unavailable)"));
        assert!(output.contains("try again later"));
    }

    #[test]
    fn test_text_formatter_info() {
        assert_eq!(TextFormatter.name(), "text");
        assert!(!TextFormatter.description().is_empty());
    }
}
