//! Refresh loop - drives the RefreshSession on a fixed cadence
//!
//! The loop thread owns the display sink and is the only thread that writes
//! to it. Lookups run on short-lived worker threads and report back through
//! a channel, so a slow records service never delays the next tick. At most
//! [`MAX_IN_FLIGHT_FETCHES`] lookups run at once; ticks beyond that are
//! skipped until a worker reports back.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::core::session::{fetch_records, FetchOutcome, FetchTicket, RefreshSession, TickAction};
use crate::core::{DisplaySink, GameStateChannel, RecordPair, RecordsSource};

/// Upper bound on concurrently running lookup workers
pub const MAX_IN_FLIGHT_FETCHES: usize = 4;

pub struct RefreshLoop {
    session: RefreshSession,
    channel: GameStateChannel,
    source: Arc<dyn RecordsSource>,
    sink: Box<dyn DisplaySink + Send>,
    interval: Duration,
    in_flight: usize,
    outcome_tx: Sender<FetchOutcome>,
    outcome_rx: Receiver<FetchOutcome>,
}

impl RefreshLoop {
    pub fn new(
        channel: GameStateChannel,
        source: Arc<dyn RecordsSource>,
        sink: Box<dyn DisplaySink + Send>,
        interval: Duration,
    ) -> Self {
        let (outcome_tx, outcome_rx) = unbounded();
        Self {
            session: RefreshSession::new(),
            channel,
            source,
            sink,
            interval,
            in_flight: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Run until `shutdown` receives a message or its sender is dropped.
    pub fn run(mut self, shutdown: Receiver<()>) {
        let outcome_rx = self.outcome_rx.clone();
        let feed_rx = self.channel.subscribe();
        let ticker = tick(self.interval);

        info!(interval_ms = self.interval.as_millis() as u64, "[REFRESH] Started");

        loop {
            select! {
                recv(ticker) -> _ => self.on_tick(),
                recv(feed_rx) -> msg => {
                    if msg.is_ok() {
                        self.redraw();
                    }
                }
                recv(outcome_rx) -> msg => {
                    if let Ok(outcome) = msg {
                        self.on_outcome(outcome);
                    }
                }
                recv(shutdown) -> _ => break,
            }
        }

        info!("[REFRESH] Stopped");
    }

    fn on_tick(&mut self) {
        if self.in_flight >= MAX_IN_FLIGHT_FETCHES {
            warn!(in_flight = self.in_flight, "[REFRESH] Records service not answering, skipping tick");
            return;
        }

        let snapshot = self.channel.current();
        match self.session.tick(snapshot.as_deref()) {
            TickAction::Skip => {}
            TickAction::Render => self.redraw(),
            TickAction::Fetch(ticket) => self.spawn_fetch(ticket),
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let outcome_tx = self.outcome_tx.clone();
        let seq = ticket.seq;

        let spawned = thread::Builder::new()
            .name(format!("records-fetch-{}", seq))
            .spawn(move || {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    fetch_records(source.as_ref(), &ticket)
                }));
                let outcome = result.unwrap_or_else(|_| {
                    error!(seq, "[REFRESH] Fetch worker panicked");
                    FetchOutcome {
                        seq,
                        wrs: RecordPair::none(),
                        pbs: RecordPair::none(),
                    }
                });
                // The loop may already be gone during shutdown
                let _ = outcome_tx.send(outcome);
            });

        match spawned {
            Ok(_) => self.in_flight += 1,
            Err(e) => warn!(error = %e, seq, "[REFRESH] Failed to spawn fetch worker"),
        }
    }

    fn on_outcome(&mut self, outcome: FetchOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.session.complete(outcome) {
            self.redraw();
        }
    }

    /// Recompute and commit the whole display from the freshest snapshot
    fn redraw(&mut self) {
        let Some(snapshot) = self.channel.current() else {
            return;
        };
        let shown = self.session.display(Some(snapshot.as_ref()));
        if let Err(e) = shown.commit(self.sink.as_mut()) {
            warn!(error = %e, "[REFRESH] Failed to commit display");
        } else {
            debug!(map = %shown.map_label, "[REFRESH] Display committed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::display::NO_WR;
    use crate::core::traits::mocks::MockRecordsSource;
    use crate::core::{DisplayState, FetchError, Record, RecordsQuery, SinkError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct ChannelSink(Sender<DisplayState>);

    impl DisplaySink for ChannelSink {
        fn commit(&mut self, display: &DisplayState) -> Result<(), SinkError> {
            let _ = self.0.send(display.clone());
            Ok(())
        }
    }

    struct Harness {
        displays: Receiver<DisplayState>,
        shutdown: Sender<()>,
        handle: thread::JoinHandle<()>,
    }

    impl Harness {
        fn start(channel: &GameStateChannel, source: Arc<dyn RecordsSource>) -> Self {
            let (display_tx, displays) = unbounded();
            let (shutdown, shutdown_rx) = unbounded();
            let refresh = RefreshLoop::new(
                channel.clone(),
                source,
                Box::new(ChannelSink(display_tx)),
                Duration::from_millis(20),
            );
            let handle = thread::spawn(move || refresh.run(shutdown_rx));
            Self {
                displays,
                shutdown,
                handle,
            }
        }

        /// Wait for a committed display matching `pred`
        fn wait_for(&self, pred: impl Fn(&DisplayState) -> bool) -> Option<DisplayState> {
            let deadline = Instant::now() + Duration::from_secs(5);
            while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
                match self.displays.recv_timeout(remaining) {
                    Ok(display) if pred(&display) => return Some(display),
                    Ok(_) => continue,
                    Err(_) => return None,
                }
            }
            None
        }

        fn stop(self) {
            let _ = self.shutdown.send(());
            self.handle.join().unwrap();
        }
    }

    const ALICE_ON_GOLDBHOP: &str = r#"{
        "player_name": "Alice",
        "steam_id": 123,
        "map_name": "kz_bkz_goldbhop",
        "map_tier": 5,
        "mode": "kz_timer"
    }"#;

    #[test]
    fn test_loop_end_to_end() {
        let channel = GameStateChannel::new();
        let source = Arc::new(MockRecordsSource::new(
            RecordPair::new(Some(Record::new(100.0, "Bob")), None),
            RecordPair::new(Some(Record::new(110.0, "Alice")), None),
        ));
        let harness = Harness::start(&channel, source.clone());

        channel.ingest_json(ALICE_ON_GOLDBHOP);

        let display = harness
            .wait_for(|d| d.tp_wr != NO_WR)
            .expect("records should be displayed");
        assert_eq!(display.map_label, "[KZT] kz_bkz_goldbhop (T5)");
        assert_eq!(display.tp_wr, "01:40.000 by Bob");
        assert_eq!(display.tp_pb, "(+00:10.000)");
        assert_eq!(display.pro_wr, NO_WR);

        harness.stop();
        assert!(source.call_count() >= 2);
    }

    #[test]
    fn test_loop_label_updates_without_lookup() {
        let channel = GameStateChannel::new();
        let source = Arc::new(MockRecordsSource::new(
            RecordPair::new(Some(Record::new(100.0, "Bob")), None),
            RecordPair::none(),
        ));
        let harness = Harness::start(&channel, source.clone());

        channel.ingest_json(r#"{"steam_id": 123, "map_name": "surf_map", "mode": "kz_simple"}"#);

        let display = harness
            .wait_for(|d| d.map_label == "[SKZ] surf_map (not global)")
            .expect("label should update");
        assert_eq!(display.tp_wr, NO_WR);

        // Let a few ticks pass; the gate keeps failing
        thread::sleep(Duration::from_millis(100));
        harness.stop();
        assert_eq!(source.call_count(), 0);
    }

    #[test]
    fn test_loop_survives_failing_service() {
        let channel = GameStateChannel::new();
        let source = Arc::new(MockRecordsSource::failing(502));
        let harness = Harness::start(&channel, source.clone());

        channel.ingest_json(ALICE_ON_GOLDBHOP);

        // Several cycles complete and keep rendering "no WR"
        thread::sleep(Duration::from_millis(150));
        let display = harness
            .wait_for(|d| d.map_label == "[KZT] kz_bkz_goldbhop (T5)")
            .expect("loop should keep rendering");
        assert_eq!(display.tp_wr, NO_WR);

        harness.stop();
        assert!(source.call_count() >= 4);
    }

    /// Records service that accepts lookups and never answers until released
    struct StalledSource {
        calls: AtomicUsize,
        release: Receiver<()>,
    }

    impl StalledSource {
        fn wait(&self) -> Result<RecordPair, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.release.recv();
            Ok(RecordPair::none())
        }
    }

    impl RecordsSource for StalledSource {
        fn world_records(&self, _query: &RecordsQuery) -> Result<RecordPair, FetchError> {
            self.wait()
        }

        fn personal_bests(&self, _query: &RecordsQuery) -> Result<RecordPair, FetchError> {
            self.wait()
        }
    }

    #[test]
    fn test_loop_caps_in_flight_fetches() {
        let channel = GameStateChannel::new();
        let (release_tx, release) = unbounded::<()>();
        let source = Arc::new(StalledSource {
            calls: AtomicUsize::new(0),
            release,
        });
        let harness = Harness::start(&channel, source.clone());

        channel.ingest_json(ALICE_ON_GOLDBHOP);

        // Far more ticks than the cap elapse while nothing answers
        thread::sleep(Duration::from_millis(400));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2 * MAX_IN_FLIGHT_FETCHES);

        // Once the service answers, lookups resume
        drop(release_tx);
        let deadline = Instant::now() + Duration::from_secs(5);
        while source.calls.load(Ordering::SeqCst) <= 2 * MAX_IN_FLIGHT_FETCHES {
            assert!(Instant::now() < deadline, "lookups did not resume");
            thread::sleep(Duration::from_millis(10));
        }

        harness.stop();
    }
}
