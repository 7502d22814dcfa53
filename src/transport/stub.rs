//! Scripted transport for tests and offline runs
//!
//! Replies are registered per full request URL. A route answers with its
//! scripted replies in order and keeps repeating the last one; unknown
//! URLs get a 404.

use crate::query::RequestSpec;
use crate::transport::{HttpResponse, HttpTransport, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Outcome = std::result::Result<HttpResponse, TransportError>;

#[derive(Debug, Clone)]
struct Scripted {
    delay: Duration,
    outcome: Outcome,
}

#[derive(Debug, Default)]
struct Inner {
    routes: HashMap<String, VecDeque<Scripted>>,
    calls: HashMap<String, usize>,
}

/// Transport that serves canned responses
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    inner: Arc<Mutex<Inner>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `response`
    pub fn respond(&self, url: impl Into<String>, response: HttpResponse) -> &Self {
        self.push(url.into(), Duration::ZERO, Ok(response))
    }

    /// Answer `url` with `response` after `delay`
    pub fn respond_after(
        &self,
        url: impl Into<String>,
        delay: Duration,
        response: HttpResponse,
    ) -> &Self {
        self.push(url.into(), delay, Ok(response))
    }

    /// Fail `url` below the HTTP layer
    pub fn fail(&self, url: impl Into<String>, error: TransportError) -> &Self {
        self.push(url.into(), Duration::ZERO, Err(error))
    }

    /// HTML page with status 200
    pub fn html(&self, url: impl Into<String>, body: &str) -> &Self {
        self.respond(
            url,
            HttpResponse::new(200, body).with_content_type("text/html; charset=utf-8"),
        )
    }

    /// Binary payload with status 200
    pub fn bytes(&self, url: impl Into<String>, body: Vec<u8>) -> &Self {
        self.respond(
            url,
            HttpResponse::new(200, body).with_content_type("application/octet-stream"),
        )
    }

    /// Number of requests seen for `url`
    pub fn calls(&self, url: &str) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.calls.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total number of requests seen
    pub fn total_calls(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.calls.values().sum())
            .unwrap_or(0)
    }

    /// Highest number of requests that were in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn push(&self, url: String, delay: Duration, outcome: Outcome) -> &Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner
                .routes
                .entry(url)
                .or_default()
                .push_back(Scripted { delay, outcome });
        }
        self
    }

    fn next(&self, url: &str) -> std::result::Result<Option<Scripted>, TransportError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| TransportError::Other("stub state poisoned".to_string()))?;
        *inner.calls.entry(url.to_string()).or_default() += 1;

        let Some(queue) = inner.routes.get_mut(url) else {
            return Ok(None);
        };
        let scripted = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(scripted)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl HttpTransport for StubTransport {
    async fn get(&self, request: &RequestSpec) -> Outcome {
        let url = request.url();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.next(&url)? {
            Some(scripted) => {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.outcome
            }
            None => Ok(HttpResponse::new(404, format!("no stub for {}", url))),
        }
    }
}
