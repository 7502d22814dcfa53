//! Server shared state
//!
//! Holds configuration and the fetcher shared by all requests.

use crate::config::Config;
use crate::fetch::TrailFetcher;
use crate::transport::HttpTransport;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Shared state for the HTTP server
pub struct AppState<T> {
    /// Configuration the server was started with
    pub config: Config,

    /// Fetcher used by every search
    pub fetcher: TrailFetcher<T>,

    started_at: Instant,

    /// Wakes in-flight searches on shutdown
    shutdown: Notify,
}

impl<T: HttpTransport> AppState<T> {
    /// Create new application state
    pub fn new(config: Config, transport: T) -> Self {
        let fetcher = TrailFetcher::new(transport, &config);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: TrailFetcher<T>) -> Self {
        Self {
            config,
            fetcher,
            started_at: Instant::now(),
            shutdown: Notify::new(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Completes when the server starts shutting down
    pub fn cancelled(&self) -> impl Future<Output = ()> + '_ {
        self.shutdown.notified()
    }

    /// Cancel every search currently waiting on [`cancelled`](Self::cancelled)
    pub fn cancel_all(&self) {
        self.shutdown.notify_waiters();
    }
}
