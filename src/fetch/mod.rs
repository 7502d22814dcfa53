//! Search orchestration
//!
//! Runs a query end to end: search request, result parsing, per-candidate
//! geometry fetch and decode, geographic filtering. Candidates are
//! resolved concurrently with a bounded fan-out; one candidate failing
//! never fails its siblings.

pub mod retry;
pub mod state;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::filter::filter;
use crate::geometry::decode;
use crate::parse::details::extract_trail_stats;
use crate::parse::{parse_results, SkipReason, SkippedEntry};
use crate::query::{QueryBuilder, SearchQuery};
use crate::trail::{SearchResult, Trail, TrailSummary};
use crate::transport::HttpTransport;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use retry::{send_with_retry, RetryPolicy};
use serde::{Deserialize, Serialize};
use state::{FetchState, QueryRun};
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Pipeline stage a warning was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningStage {
    /// A result card was malformed
    Parse,
    /// A candidate's geometry could not be fetched or decoded
    Geometry,
    /// A candidate's detail page could not be fetched or read
    Details,
}

impl std::fmt::Display for WarningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Geometry => write!(f, "geometry"),
            Self::Details => write!(f, "details"),
        }
    }
}

/// Non-fatal problem encountered while answering a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchWarning {
    pub stage: WarningStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchWarning {
    fn from_error(stage: WarningStage, external_id: &str, err: &Error) -> Self {
        Self {
            stage,
            external_id: Some(external_id.to_string()),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    fn from_skipped(entry: &SkippedEntry) -> Self {
        Self {
            stage: WarningStage::Parse,
            external_id: entry.external_id.clone(),
            kind: ErrorKind::UnparsableResponse,
            message: entry.to_string(),
        }
    }
}

/// Everything produced by one successful query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Correlates with log lines for this query
    pub id: Uuid,
    pub query: SearchQuery,
    pub result: SearchResult,
    pub warnings: Vec<FetchWarning>,
    /// Candidates whose geometry was attempted
    pub candidates: usize,
    pub completed_at: DateTime<Utc>,
}

/// Result of resolving one candidate
#[derive(Debug)]
enum CandidateOutcome {
    Resolved {
        trail: Trail,
        warning: Option<FetchWarning>,
    },
    Dropped(FetchWarning),
}

/// Query orchestrator over an HTTP transport
#[derive(Debug, Clone)]
pub struct TrailFetcher<T> {
    transport: T,
    builder: QueryBuilder,
    policy: RetryPolicy,
    concurrency: usize,
    max_pages: u32,
    fetch_details: bool,
}

impl<T: HttpTransport> TrailFetcher<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            builder: QueryBuilder::from_config(config),
            policy: RetryPolicy::from_config(&config.fetch),
            concurrency: config.fetch.concurrency.max(1),
            max_pages: config.search.max_pages.max(1),
            fetch_details: config.search.fetch_details,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Answer a query
    ///
    /// Zero matches is a success with an empty result. Fails when the query
    /// is invalid, the search itself fails, the page is unrecognizable, or
    /// every candidate fails.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchOutcome> {
        let run = QueryRun::new();
        let span = tracing::info_span!("search", query_id = %run.id());
        self.run(query, run).instrument(span).await
    }

    /// Like [`search`](Self::search), abandoned as soon as `cancel` completes
    ///
    /// All in-flight requests are dropped and nothing partial is returned.
    pub async fn search_cancellable<C>(&self, query: &SearchQuery, cancel: C) -> Result<SearchOutcome>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            outcome = self.search(query) => outcome,
            _ = cancel => {
                info!("search cancelled by caller");
                Err(Error::Cancelled)
            }
        }
    }

    async fn run(&self, query: &SearchQuery, mut run: QueryRun) -> Result<SearchOutcome> {
        self.builder.validate(query).map_err(|e| run.fail(e))?;

        let (summaries, mut warnings) = self.collect_candidates(query, &mut run).await?;

        if summaries.is_empty() {
            run.advance(FetchState::NoResults);
            info!(warnings = warnings.len(), "no trails found");
            return Ok(self.outcome(&run, query, Vec::new(), warnings, 0));
        }

        run.advance(FetchState::FetchingDetails);
        let outcomes: Vec<CandidateOutcome> = stream::iter(summaries)
            .map(|summary| self.resolve(summary))
            .buffered(self.concurrency)
            .collect()
            .await;

        run.advance(FetchState::Decoding);
        let attempted = outcomes.len();
        let mut trails = Vec::with_capacity(attempted);
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                CandidateOutcome::Resolved { trail, warning } => {
                    trails.push(trail);
                    warnings.extend(warning);
                }
                CandidateOutcome::Dropped(warning) => {
                    warn!(
                        trail = warning.external_id.as_deref().unwrap_or("?"),
                        "dropping candidate: {}",
                        warning.message
                    );
                    failures.push(warning.kind);
                    warnings.push(warning);
                }
            }
        }

        if trails.is_empty() {
            return Err(run.fail(all_failed(attempted, &failures)));
        }

        run.advance(FetchState::Filtering);
        let resolved = trails.len();
        let trails = filter(trails, query.center, query.radius_km);

        run.advance(FetchState::Done);
        info!(
            candidates = attempted,
            resolved,
            returned = trails.len(),
            warnings = warnings.len(),
            "search complete"
        );
        Ok(self.outcome(&run, query, trails, warnings, attempted))
    }

    /// Fetch result pages until enough unique candidates are collected
    async fn collect_candidates(
        &self,
        query: &SearchQuery,
        run: &mut QueryRun,
    ) -> Result<(Vec<TrailSummary>, Vec<FetchWarning>)> {
        let mut summaries: Vec<TrailSummary> = Vec::new();
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        let last_page = query.page.saturating_add(self.max_pages - 1);
        let mut page_no = query.page;

        loop {
            let first = page_no == query.page;
            match self.fetch_page(query, page_no, run).await {
                Ok((page_summaries, skipped)) => {
                    let listed = page_summaries.len() + skipped.len();
                    warnings.extend(
                        skipped
                            .iter()
                            .filter(|s| s.reason != SkipReason::Duplicate)
                            .map(FetchWarning::from_skipped),
                    );
                    for summary in page_summaries {
                        if seen.insert(summary.external_id.clone()) {
                            summaries.push(summary);
                        } else {
                            debug!(trail = %summary.external_id, page = page_no, "duplicate across pages");
                        }
                    }

                    let full_page = listed >= self.builder.page_size() as usize;
                    if summaries.len() >= query.max_results || !full_page || page_no >= last_page {
                        break;
                    }
                }
                Err(err) if first => return Err(run.fail(err)),
                Err(err) => {
                    warn!(page = page_no, "stopping pagination: {}", err);
                    warnings.push(FetchWarning {
                        stage: WarningStage::Parse,
                        external_id: None,
                        kind: err.kind(),
                        message: format!("page {}: {}", page_no, err),
                    });
                    break;
                }
            }
            page_no += 1;
        }

        summaries.truncate(query.max_results);
        Ok((summaries, warnings))
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page_no: u32,
        run: &mut QueryRun,
    ) -> Result<(Vec<TrailSummary>, Vec<SkippedEntry>)> {
        let request = self.builder.build_page(query, page_no)?;

        run.advance(FetchState::Searching);
        debug!(url = %request.url(), "requesting results page");
        let response = send_with_retry(&self.transport, &request, &self.policy).await?;

        run.advance(FetchState::ParsingResults);
        let page = parse_results(&response.text(), self.builder.base_url()).inspect_err(|err| {
            if let Error::UnparsableResponse { message, sample } = err {
                warn!(page = page_no, sample = %sample, "unrecognized results page: {}", message);
            }
        })?;

        Ok((page.summaries, page.skipped))
    }

    /// Fetch, decode and optionally enrich one candidate
    async fn resolve(&self, summary: TrailSummary) -> CandidateOutcome {
        let id = summary.external_id.clone();
        let request = self.builder.geometry_request(&id);

        let response = match send_with_retry(&self.transport, &request, &self.policy).await {
            Ok(response) => response,
            Err(err) => {
                return CandidateOutcome::Dropped(FetchWarning::from_error(
                    WarningStage::Geometry,
                    &id,
                    &err,
                ))
            }
        };

        let trail = match decode(&response.body).and_then(|path| Trail::new(summary, path)) {
            Ok(trail) => trail,
            Err(err) => {
                return CandidateOutcome::Dropped(FetchWarning::from_error(
                    WarningStage::Geometry,
                    &id,
                    &err,
                ))
            }
        };
        debug!(trail = %id, points = trail.path.len(), "geometry decoded");

        if !self.fetch_details {
            return CandidateOutcome::Resolved {
                trail,
                warning: None,
            };
        }

        let summary = &trail.summary;
        let request = self
            .builder
            .detail_request(&summary.external_id, &summary.detail_reference);
        let stats = match send_with_retry(&self.transport, &request, &self.policy).await {
            Ok(response) => extract_trail_stats(&response.text()),
            Err(err) => Err(err),
        };

        match stats {
            Ok(stats) => CandidateOutcome::Resolved {
                trail: trail.with_stats(stats),
                warning: None,
            },
            Err(err) => {
                warn!(trail = %id, "detail page unavailable: {}", err);
                CandidateOutcome::Resolved {
                    trail,
                    warning: Some(FetchWarning::from_error(WarningStage::Details, &id, &err)),
                }
            }
        }
    }

    fn outcome(
        &self,
        run: &QueryRun,
        query: &SearchQuery,
        trails: Vec<Trail>,
        warnings: Vec<FetchWarning>,
        candidates: usize,
    ) -> SearchOutcome {
        debug_assert!(run.state().is_terminal(), "outcome built in state {}", run.state());
        SearchOutcome {
            id: run.id(),
            query: query.clone(),
            result: SearchResult::new(trails),
            warnings,
            candidates,
            completed_at: Utc::now(),
        }
    }
}

/// Error for a query whose every candidate failed
///
/// When the service answered every geometry request with something that
/// would not decode, the service's format is the problem; otherwise it is
/// treated as unavailable.
fn all_failed(attempted: usize, failures: &[ErrorKind]) -> Error {
    let message = format!("all {} candidate(s) failed to resolve", attempted);
    if !failures.is_empty() && failures.iter().all(|k| *k == ErrorKind::MalformedGeometry) {
        Error::UnparsableResponse {
            message,
            sample: String::new(),
        }
    } else {
        Error::upstream(message)
    }
}
