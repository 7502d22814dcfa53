//! Centralized constants for the trail-scout crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in kilometers (WGS84 approximation)
    pub const EARTH_RADIUS_KM: f64 = 6_371.0;

    /// Kilometers per degree of latitude (approximate, varies slightly with latitude)
    pub const KM_PER_DEGREE_LAT: f64 = 111.32;
}

/// Remote trail service
pub mod api {
    /// Default base URL of the trail-sharing service
    pub const DEFAULT_BASE_URL: &str = "https://es.wikiloc.com";

    /// Search endpoint (returns an HTML results page)
    pub const SEARCH_PATH: &str = "/wikiloc/find.do";

    /// Geometry endpoint (returns WKB for one trail)
    pub const GEOMETRY_PATH: &str = "/wikiloc/geometry.do";

    /// Fallback detail page when a result card carries no link
    pub const VIEW_PATH: &str = "/wikiloc/view.do";
}

/// Hard limits imposed by the remote service
pub mod limits {
    /// Largest page size the search endpoint honours
    pub const MAX_PAGE_SIZE: u32 = 50;

    /// Bytes of an unrecognized page kept for diagnostics
    pub const RESPONSE_SAMPLE_LEN: usize = 240;
}
