//! trail-scout: trail discovery and geometry normalization
//!
//! A library and CLI tool that searches a trail-sharing service by text
//! and/or location, decodes each result's geometry into a normalized path,
//! re-ranks trails geographically and exports them as KML or GPX.
//!
//! ## Features
//!
//! - Deterministic search request building
//! - Tolerant results-page parsing against frozen fixtures
//! - WKB LineString/MultiLineString decoding (2D and Z)
//! - Bounded concurrent geometry fetching with per-candidate isolation
//! - Haversine post-filtering around a center
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trail_scout::{Config, ReqwestTransport, SearchQuery, TrailFetcher};
//! use trail_scout::export::get_exporter;
//! use trail_scout::geo::Coordinates;
//!
//! # async fn demo() -> trail_scout::Result<()> {
//! let config = Config::default();
//! let fetcher = TrailFetcher::new(ReqwestTransport::from_config(&config)?, &config);
//!
//! let query = SearchQuery::near(Coordinates::new(41.59, 1.83), 5.0).with_text("Montserrat");
//! let outcome = fetcher.search(&query).await?;
//! for trail in &outcome.result.trails {
//!     println!("{} ({:.1} km)", trail.title(), trail.length_km);
//! }
//!
//! if let Some(kml) = get_exporter("kml") {
//!     let document = kml.export(&outcome.result.trails)?;
//!     std::fs::write("trails.kml", document)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod format;
pub mod geo;
pub mod geometry;
pub mod parse;
pub mod query;
pub mod server;
pub mod tool;
pub mod trail;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use fetch::{SearchOutcome, TrailFetcher};
pub use geo::{Coordinates, GeoPoint};
pub use query::SearchQuery;
pub use trail::{SearchResult, Trail, TrailSummary};
pub use transport::{HttpTransport, ReqwestTransport};
