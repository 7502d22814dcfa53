//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default search locale sent to the service
pub const DEFAULT_LOCALE: &str = "es";

/// Default User-Agent for outbound requests
pub const DEFAULT_USER_AGENT: &str = "trail-scout/0.1.0";

/// Default number of results requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Default result ordering requested from the service
pub const DEFAULT_SORT: &str = "trailrank";

/// Default number of trails returned per query
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Upper bound on trails per query
pub const DEFAULT_MAX_RESULTS_CAP: usize = 50;

/// Search box half-size when a center is given without a radius
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Largest accepted search radius
pub const DEFAULT_MAX_RADIUS_KM: f64 = 100.0;

/// Result pages requested per query at most
pub const DEFAULT_MAX_PAGES: u32 = 3;

/// Concurrent per-candidate fetches
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Retries after the first attempt for transport errors and 5xx
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Fixed pause between retries
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7879;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "trail-scout";
