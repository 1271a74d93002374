//! Refresh session - the record lookup state machine
//!
//! RefreshSession decides on every tick whether a records lookup is
//! warranted, tracks which results may still be shown, and produces the
//! display state. It performs no I/O itself and is driven by
//! `overlay::refresh::RefreshLoop`.

use tracing::{debug, warn};

use super::display::DisplayState;
use super::traits::RecordsSource;
use super::types::{GameState, RecordPair, RecordsQuery};

// =============================================================================
// TYPES
// =============================================================================

/// Lookup state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No snapshot yet, or the snapshot does not warrant a lookup
    Idle,
    /// A lookup for the latest cycle is in flight
    Fetching,
}

/// A lookup to run for one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: RecordsQuery,
}

/// Result of a cycle's two lookups
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub seq: u64,
    pub wrs: RecordPair,
    pub pbs: RecordPair,
}

/// What the driver has to do after a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// No snapshot received yet
    Skip,
    /// Lookup not warranted; render right away without records
    Render,
    /// Run the lookup, then hand the outcome to [`RefreshSession::complete`]
    Fetch(FetchTicket),
}

// =============================================================================
// REFRESH SESSION
// =============================================================================

/// Record lookup state machine for the refresh loop
///
/// Every cycle gets a sequence number. A completed lookup is only applied if
/// no newer cycle has been applied already, so a slow response for an old map
/// can never overwrite the records of the current one.
pub struct RefreshSession {
    state: RefreshState,
    /// Sequence number of the most recent cycle
    latest_seq: u64,
    /// Sequence number of the most recently applied cycle
    applied_seq: u64,
    wrs: RecordPair,
    pbs: RecordPair,
}

impl RefreshSession {
    pub fn new() -> Self {
        Self {
            state: RefreshState::Idle,
            latest_seq: 0,
            applied_seq: 0,
            wrs: RecordPair::none(),
            pbs: RecordPair::none(),
        }
    }

    /// Informational only; ticks never wait on an in-flight lookup
    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Records currently shown (world records, personal bests)
    pub fn records(&self) -> (&RecordPair, &RecordPair) {
        (&self.wrs, &self.pbs)
    }

    /// Evaluate a refresh tick against the current snapshot
    pub fn tick(&mut self, snapshot: Option<&GameState>) -> TickAction {
        let Some(snapshot) = snapshot else {
            self.state = RefreshState::Idle;
            return TickAction::Skip;
        };

        self.latest_seq += 1;
        let seq = self.latest_seq;

        match snapshot.records_query() {
            Some(query) => {
                debug!(seq, map = %query.map_name, mode = %query.mode, "[REFRESH] Fetching records");
                self.state = RefreshState::Fetching;
                TickAction::Fetch(FetchTicket { seq, query })
            }
            None => {
                debug!(seq, "[REFRESH] Lookup not warranted, clearing records");
                self.state = RefreshState::Idle;
                self.applied_seq = seq;
                self.wrs = RecordPair::none();
                self.pbs = RecordPair::none();
                TickAction::Render
            }
        }
    }

    /// Apply a completed lookup.
    ///
    /// Returns false when the outcome is older than what is already shown,
    /// in which case it is dropped.
    pub fn complete(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.seq == self.latest_seq {
            self.state = RefreshState::Idle;
        }

        if outcome.seq <= self.applied_seq {
            debug!(
                seq = outcome.seq,
                applied = self.applied_seq,
                "[REFRESH] Dropping stale lookup"
            );
            return false;
        }

        self.applied_seq = outcome.seq;
        self.wrs = outcome.wrs;
        self.pbs = outcome.pbs;
        true
    }

    /// Display for the given snapshot and the records currently held
    pub fn display(&self, snapshot: Option<&GameState>) -> DisplayState {
        DisplayState::reconcile(snapshot, &self.wrs, &self.pbs)
    }
}

impl Default for RefreshSession {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// FETCHING
// =============================================================================

/// Run both lookups of a cycle concurrently and wait for both.
///
/// A failed lookup is logged and counts as "no record" for that cycle.
pub fn fetch_records<S: RecordsSource + ?Sized>(source: &S, ticket: &FetchTicket) -> FetchOutcome {
    let query = &ticket.query;

    let (wrs, pbs) = std::thread::scope(|scope| {
        let wrs = scope.spawn(|| source.world_records(query));
        let pbs = source.personal_bests(query);
        (wrs.join(), pbs)
    });

    let wrs = match wrs {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            warn!(error = %e, map = %query.map_name, "[RECORDS] World record lookup failed");
            RecordPair::none()
        }
        Err(_) => {
            warn!(map = %query.map_name, "[RECORDS] World record lookup panicked");
            RecordPair::none()
        }
    };

    let pbs = pbs.unwrap_or_else(|e| {
        warn!(error = %e, map = %query.map_name, "[RECORDS] Personal best lookup failed");
        RecordPair::none()
    });

    FetchOutcome {
        seq: ticket.seq,
        wrs,
        pbs,
    }
}
