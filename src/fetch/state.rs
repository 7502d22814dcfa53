//! Per-query progress tracking

use crate::error::Error;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Stage a query is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Building,
    Searching,
    ParsingResults,
    NoResults,
    FetchingDetails,
    Decoding,
    Filtering,
    Done,
    Failed,
}

impl FetchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::NoResults | Self::Done | Self::Failed)
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Building => "building",
            Self::Searching => "searching",
            Self::ParsingResults => "parsing_results",
            Self::NoResults => "no_results",
            Self::FetchingDetails => "fetching_details",
            Self::Decoding => "decoding",
            Self::Filtering => "filtering",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// One execution of a query
#[derive(Debug)]
pub struct QueryRun {
    id: Uuid,
    state: FetchState,
}

impl QueryRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: FetchState::Building,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Move to `next`
    pub fn advance(&mut self, next: FetchState) {
        debug!(from = %self.state, to = %next, "query state");
        self.state = next;
    }

    /// Enter `Failed` and hand the error back
    pub fn fail(&mut self, err: Error) -> Error {
        warn!(from = %self.state, kind = %err.kind(), "query failed: {}", err);
        self.state = FetchState::Failed;
        err
    }
}

impl Default for QueryRun {
    fn default() -> Self {
        Self::new()
    }
}
