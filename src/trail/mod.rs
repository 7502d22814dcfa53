//! Trail records
//!
//! A `TrailSummary` is what a results page tells us about a trail; a
//! `Trail` is a summary joined with its decoded path.

use crate::error::{Error, Result};
use crate::geo::{centroid, path_length_km, Coordinates, GeoPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate trail as listed on a results page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailSummary {
    /// Service-side identifier, unique within the service
    pub external_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Absolute URL of the trail's detail page
    pub detail_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx_duration_min: Option<u32>,
}

/// Technical difficulty as graded by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    VeryHard,
    ExpertsOnly,
}

impl Difficulty {
    /// Translate the service's (Spanish) difficulty label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Fácil" => Some(Self::Easy),
            "Moderado" => Some(Self::Moderate),
            "Difícil" => Some(Self::Hard),
            "Muy Difícil" | "Muy difícil" => Some(Self::VeryHard),
            "Solo expertos" => Some(Self::ExpertsOnly),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "Easy"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Hard => write!(f, "Hard"),
            Self::VeryHard => write!(f, "Very Hard"),
            Self::ExpertsOnly => write!(f, "Experts Only"),
        }
    }
}

/// Statistics scraped from a trail's detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrailStats {
    /// Raw label → value pairs as shown on the page
    pub entries: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl TrailStats {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }
}

/// A resolved trail: summary plus geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub summary: TrailSummary,
    pub path: Vec<GeoPoint>,
    /// Haversine length of `path`
    pub length_km: f64,
    /// Mean of `path` vertices
    pub centroid: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TrailStats>,
}

impl Trail {
    /// Join a summary with its decoded path
    ///
    /// A trail needs at least two points.
    pub fn new(summary: TrailSummary, path: Vec<GeoPoint>) -> Result<Self> {
        if path.len() < 2 {
            return Err(Error::MalformedGeometry(format!(
                "trail {} has {} point(s), need at least 2",
                summary.external_id,
                path.len()
            )));
        }
        let length_km = path_length_km(&path);
        let centroid = centroid(&path).ok_or_else(|| {
            Error::MalformedGeometry(format!("trail {} has an empty path", summary.external_id))
        })?;

        Ok(Self {
            summary,
            path,
            length_km,
            centroid,
            stats: None,
        })
    }

    /// Attach detail-page statistics
    pub fn with_stats(mut self, stats: TrailStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn external_id(&self) -> &str {
        &self.summary.external_id
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }

    pub fn has_elevation(&self) -> bool {
        self.path.iter().any(|p| p.elevation_m.is_some())
    }
}

/// Ranked trails for one query; order is the user-visible ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub trails: Vec<Trail>,
}

impl SearchResult {
    pub fn new(trails: Vec<Trail>) -> Self {
        Self { trails }
    }

    pub fn len(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::summary;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trail_derives_length_and_centroid() {
        let path = vec![
            GeoPoint::new(41.0, 1.0),
            GeoPoint::new(41.0, 1.01),
            GeoPoint::new(41.02, 1.01),
        ];
        let trail = Trail::new(summary("1", "Loop"), path).unwrap();

        assert!(trail.length_km > 2.9 && trail.length_km < 3.1);
        assert_relative_eq!(trail.centroid.lat, 41.02 / 3.0 + 82.0 / 3.0, epsilon = 1e-9);
        assert_eq!(trail.path.first().map(|p| p.lng), Some(1.0));
        assert_eq!(trail.path.last().map(|p| p.lat), Some(41.02));
        assert!(!trail.has_elevation());
    }

    #[test]
    fn test_trail_requires_two_points() {
        let err = Trail::new(summary("9", "Stub"), vec![GeoPoint::new(41.0, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::MalformedGeometry(_)));
        assert!(Trail::new(summary("9", "Stub"), vec![]).is_err());
    }

    #[test]
    fn test_difficulty_from_label() {
        assert_eq!(Difficulty::from_label("Moderado"), Some(Difficulty::Moderate));
        assert_eq!(Difficulty::from_label(" Solo expertos "), Some(Difficulty::ExpertsOnly));
        assert_eq!(Difficulty::from_label("Unknown"), None);
        assert_eq!(Difficulty::VeryHard.to_string(), "Very Hard");
    }
}
