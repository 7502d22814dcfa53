//! Great-circle distances and path measures

use crate::constants::geo::{EARTH_RADIUS_KM, KM_PER_DEGREE_LAT};
use crate::geo::{Coordinates, GeoPoint};
use std::f64::consts::PI;

/// Calculate the distance between two points in kilometers (Haversine formula)
pub fn haversine_km(p1: Coordinates, p2: Coordinates) -> f64 {
    let lat1 = p1.lat * PI / 180.0;
    let lat2 = p2.lat * PI / 180.0;
    let delta_lat = (p2.lat - p1.lat) * PI / 180.0;
    let delta_lng = (p2.lng - p1.lng) * PI / 180.0;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sum of segment lengths along a path, ignoring elevation
pub fn path_length_km(path: &[GeoPoint]) -> f64 {
    path.windows(2)
        .map(|w| haversine_km(w[0].coords(), w[1].coords()))
        .sum()
}

/// Wrap a longitude into [-180, 180]
pub fn normalize_lng(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Mean of the path's vertices
///
/// Longitudes are unwrapped relative to the previous vertex before
/// averaging, so a path crossing the antimeridian stays on its own side of
/// the globe. Returns None for an empty path.
pub fn centroid(path: &[GeoPoint]) -> Option<Coordinates> {
    let first = path.first()?;
    let n = path.len() as f64;

    let mut prev = first.lng;
    let mut lat_sum = 0.0;
    let mut lng_sum = 0.0;
    for p in path {
        let delta = (p.lng - prev + 180.0).rem_euclid(360.0) - 180.0;
        let unwrapped = prev + delta;
        lat_sum += p.lat;
        lng_sum += unwrapped;
        prev = unwrapped;
    }

    Some(Coordinates::new(lat_sum / n, normalize_lng(lng_sum / n)))
}

/// South-west / north-east corners of a search box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

/// Square box of half-size `radius_km` around `center`
///
/// Latitudes clamp at the poles. Longitudes wrap, so a box straddling the
/// antimeridian has `south_west.lng > north_east.lng`. When the span covers
/// the whole parallel (near the poles) the full range is used.
pub fn bounding_box(center: Coordinates, radius_km: f64) -> BoundingBox {
    let delta_lat = radius_km / KM_PER_DEGREE_LAT;
    let km_per_deg_lng = KM_PER_DEGREE_LAT * (center.lat * PI / 180.0).cos();
    let delta_lng = if km_per_deg_lng > f64::EPSILON {
        radius_km / km_per_deg_lng
    } else {
        180.0
    };

    let (west, east) = if delta_lng >= 180.0 {
        (-180.0, 180.0)
    } else {
        (normalize_lng(center.lng - delta_lng), normalize_lng(center.lng + delta_lng))
    };

    BoundingBox {
        south_west: Coordinates::new((center.lat - delta_lat).max(-90.0), west),
        north_east: Coordinates::new((center.lat + delta_lat).min(90.0), east),
    }
}
