//! Core traits - abstractions over the records service and the display
//!
//! The HTTP client and the file/console sinks live in the `overlay` module.
//! For testing, mock implementations are provided.

use super::display::DisplayState;
use super::error::{FetchError, SinkError};
use super::types::{RecordPair, RecordsQuery};

// =============================================================================
// RECORDS SOURCE
// =============================================================================

/// Look up world records and personal bests for a map/mode
///
/// Implementations are shared with fetch worker threads, so they must be
/// thread-safe.
pub trait RecordsSource: Send + Sync {
    /// World records (TP and pro) for the query's map and mode
    fn world_records(&self, query: &RecordsQuery) -> Result<RecordPair, FetchError>;

    /// The queried player's personal bests (TP and pro)
    fn personal_bests(&self, query: &RecordsQuery) -> Result<RecordPair, FetchError>;
}

// =============================================================================
// DISPLAY SINK
// =============================================================================

/// Destination for the overlay text regions
pub trait DisplaySink {
    /// Apply a complete display state
    ///
    /// Called with the full state every time, never with a partial update.
    fn commit(&mut self, display: &DisplayState) -> Result<(), SinkError>;
}

// =============================================================================
// TEST MOCKS
// =============================================================================

#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;

    /// Canned response of a mock lookup
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Records(RecordPair),
        Status(u16),
    }

    impl MockResponse {
        fn to_result(&self) -> Result<RecordPair, FetchError> {
            match self {
                MockResponse::Records(pair) => Ok(pair.clone()),
                MockResponse::Status(code) => Err(FetchError::Status(*code)),
            }
        }
    }

    /// Mock RecordsSource for testing
    pub struct MockRecordsSource {
        pub wrs: Mutex<MockResponse>,
        pub pbs: Mutex<MockResponse>,
        pub wr_queries: Mutex<Vec<RecordsQuery>>,
        pub pb_queries: Mutex<Vec<RecordsQuery>>,
    }

    impl MockRecordsSource {
        pub fn new(wrs: RecordPair, pbs: RecordPair) -> Self {
            Self {
                wrs: Mutex::new(MockResponse::Records(wrs)),
                pbs: Mutex::new(MockResponse::Records(pbs)),
                wr_queries: Mutex::new(Vec::new()),
                pb_queries: Mutex::new(Vec::new()),
            }
        }

        /// A records service that fails every request
        pub fn failing(status: u16) -> Self {
            let mock = Self::new(RecordPair::none(), RecordPair::none());
            mock.set_wrs(MockResponse::Status(status));
            mock.set_pbs(MockResponse::Status(status));
            mock
        }

        pub fn set_wrs(&self, response: MockResponse) {
            *self.wrs.lock() = response;
        }

        pub fn set_pbs(&self, response: MockResponse) {
            *self.pbs.lock() = response;
        }

        pub fn call_count(&self) -> usize {
            self.wr_queries.lock().len() + self.pb_queries.lock().len()
        }
    }

    impl RecordsSource for MockRecordsSource {
        fn world_records(&self, query: &RecordsQuery) -> Result<RecordPair, FetchError> {
            self.wr_queries.lock().push(query.clone());
            self.wrs.lock().to_result()
        }

        fn personal_bests(&self, query: &RecordsQuery) -> Result<RecordPair, FetchError> {
            self.pb_queries.lock().push(query.clone());
            self.pbs.lock().to_result()
        }
    }

    /// Sink that keeps every committed state
    #[derive(Default)]
    pub struct RecordingSink {
        pub commits: Vec<DisplayState>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn last(&self) -> Option<&DisplayState> {
            self.commits.last()
        }
    }

    impl DisplaySink for RecordingSink {
        fn commit(&mut self, display: &DisplayState) -> Result<(), SinkError> {
            self.commits.push(display.clone());
            Ok(())
        }
    }
}
