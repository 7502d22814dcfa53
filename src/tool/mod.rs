//! Tool dispatch
//!
//! The `searchTrails` command as exposed to callers: loosely typed
//! arguments in, a structured payload out. Failures are part of the
//! payload, so "zero trails found" and "search failed" stay distinct.

use crate::error::{Error, ErrorKind, Result};
use crate::fetch::{FetchWarning, SearchOutcome, TrailFetcher};
use crate::filter::distance_from;
use crate::geo::Coordinates;
use crate::query::SearchQuery;
use crate::trail::{Difficulty, Trail};
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Name the search command is registered under
pub const SEARCH_TRAILS: &str = "searchTrails";

/// Arguments of `searchTrails`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchTrailsArgs {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub radius_km: Option<f64>,
    /// Falls back to the configured default
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub page: Option<u32>,
    /// Include each trail's path in the response
    #[serde(default)]
    pub include_geometry: bool,
}

impl SearchTrailsArgs {
    /// Turn the arguments into a query
    pub fn to_query(&self, default_max_results: usize) -> Result<SearchQuery> {
        let center = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            (None, None) => None,
            _ => {
                return Err(Error::InvalidQuery(
                    "latitude and longitude must be given together".to_string(),
                ))
            }
        };

        Ok(SearchQuery {
            text: self.text.clone(),
            center,
            radius_km: self.radius_km,
            max_results: self.max_results.unwrap_or(default_max_results),
            page: self.page.unwrap_or(1),
        })
    }
}

/// One trail as returned to tool callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Computed from the decoded path
    pub length_km: f64,
    /// As listed by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx_duration_min: Option<u32>,
    pub point_count: usize,
    pub centroid: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_center_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// `[lng, lat]` or `[lng, lat, ele]` per point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Vec<f64>>>,
}

impl TrailRecord {
    pub fn from_trail(trail: &Trail, center: Option<Coordinates>, include_geometry: bool) -> Self {
        let summary = &trail.summary;
        let geometry = include_geometry.then(|| {
            trail
                .path
                .iter()
                .map(|p| match p.elevation_m {
                    Some(ele) => vec![p.lng, p.lat, ele],
                    None => vec![p.lng, p.lat],
                })
                .collect()
        });

        Self {
            id: summary.external_id.clone(),
            title: summary.title.clone(),
            url: summary.detail_reference.clone(),
            description: summary.description.clone(),
            length_km: trail.length_km,
            approx_distance_km: summary.approx_distance_km,
            approx_duration_min: summary.approx_duration_min,
            point_count: trail.path.len(),
            centroid: trail.centroid,
            distance_from_center_km: center.map(|c| distance_from(c, trail)),
            difficulty: trail.stats.as_ref().and_then(|s| s.difficulty),
            geometry,
        }
    }
}

/// Successful `searchTrails` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSuccess {
    pub query_id: Uuid,
    pub count: usize,
    pub trails: Vec<TrailRecord>,
    pub warnings: Vec<FetchWarning>,
}

/// Failed `searchTrails` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Whether trying again later may succeed
    pub retryable: bool,
}

impl From<&Error> for ToolFailure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// `searchTrails` result, tagged by `status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    Ok(ToolSuccess),
    Error(ToolFailure),
}

impl ToolResponse {
    pub fn from_outcome(outcome: &SearchOutcome, include_geometry: bool) -> Self {
        let trails: Vec<TrailRecord> = outcome
            .result
            .trails
            .iter()
            .map(|t| TrailRecord::from_trail(t, outcome.query.center, include_geometry))
            .collect();

        Self::Ok(ToolSuccess {
            query_id: outcome.id,
            count: outcome.result.len(),
            trails,
            warnings: outcome.warnings.clone(),
        })
    }

    pub fn from_error(err: &Error) -> Self {
        Self::Error(ToolFailure::from(err))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Error kind of a failed response
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Ok(_) => None,
            Self::Error(failure) => Some(failure.kind),
        }
    }
}

/// Run a search for tool arguments and keep the full outcome
pub async fn run_search<T: HttpTransport>(
    fetcher: &TrailFetcher<T>,
    args: &SearchTrailsArgs,
) -> Result<SearchOutcome> {
    let query = args.to_query(fetcher.builder().default_max_results())?;
    fetcher.search(&query).await
}

/// `searchTrails`
pub async fn search_trails<T: HttpTransport>(
    fetcher: &TrailFetcher<T>,
    args: &SearchTrailsArgs,
) -> ToolResponse {
    match run_search(fetcher, args).await {
        Ok(outcome) => ToolResponse::from_outcome(&outcome, args.include_geometry),
        Err(err) => ToolResponse::from_error(&err),
    }
}

/// Invoke a tool by name with JSON arguments
pub async fn dispatch<T: HttpTransport>(
    fetcher: &TrailFetcher<T>,
    tool: &str,
    args: serde_json::Value,
) -> ToolResponse {
    debug!(tool, "dispatching tool call");
    match tool {
        SEARCH_TRAILS => match serde_json::from_value::<SearchTrailsArgs>(args) {
            Ok(args) => search_trails(fetcher, &args).await,
            Err(e) => ToolResponse::from_error(&Error::InvalidQuery(format!(
                "bad {} arguments: {}",
                SEARCH_TRAILS, e
            ))),
        },
        other => ToolResponse::from_error(&Error::InvalidQuery(format!("unknown tool: {}", other))),
    }
}
