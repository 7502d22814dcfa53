//! Geographic post-filter
//!
//! The service's own area search is a coarse bounding box, so trails are
//! re-checked against the true great-circle distance from the query
//! center and re-ranked by it.

use crate::geo::{haversine_km, Coordinates};
use crate::trail::Trail;

/// Distance from `center` to the trail's centroid in km
pub fn distance_from(center: Coordinates, trail: &Trail) -> f64 {
    haversine_km(center, trail.centroid)
}

/// Drop trails outside `radius_km` of `center` and sort the rest by distance
///
/// Without a center the input order is kept. Sorting is stable, so trails
/// at equal distance keep their original relative order.
pub fn filter(trails: Vec<Trail>, center: Option<Coordinates>, radius_km: Option<f64>) -> Vec<Trail> {
    let Some(center) = center else {
        return trails;
    };

    let mut ranked: Vec<(f64, Trail)> = trails
        .into_iter()
        .map(|trail| (distance_from(center, &trail), trail))
        .filter(|(distance, _)| radius_km.map_or(true, |r| *distance <= r))
        .collect();

    ranked.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    ranked.into_iter().map(|(_, trail)| trail).collect()
}
