//! Background probe execution for the TUI event loop.
//!
//! Bounds probes are network round-trips; running them on the UI thread
//! would freeze input exactly when the user is navigating. `ProbeWorker`
//! owns a background thread that executes probe requests serially and
//! reports outcomes over a channel the event loop drains each frame, so
//! the TUI side never blocks on them.
//!
//! There is no cancellation. A superseded probe still completes; the
//! session drops its outcome on delivery because the page tag no longer
//! matches.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::shelf::BookId;
use crate::viewer::{DocumentBackend, ProbeOutcome, ProbeRequest};

struct ProbeJob {
    book: BookId,
    request: ProbeRequest,
}

/// Handle to the background probe thread.
///
/// Outcomes carry the book they were probed against: a late result from a
/// session over another book must never be mistaken for the current one.
pub struct ProbeWorker {
    tx: mpsc::Sender<ProbeJob>,
    rx: mpsc::Receiver<(BookId, ProbeOutcome)>,
}

impl ProbeWorker {
    /// Spawn the worker thread against a backend handle.
    pub fn spawn(backend: Arc<dyn DocumentBackend>) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<ProbeJob>();
        let (out_tx, out_rx) = mpsc::channel::<(BookId, ProbeOutcome)>();

        thread::Builder::new()
            .name("probe-worker".into())
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let previous_exists = job
                        .request
                        .previous_target()
                        .map(|page| backend.page_exists(job.book, page))
                        .unwrap_or(false);
                    let next_exists = backend.page_exists(job.book, job.request.next_target());
                    let outcome = ProbeOutcome {
                        page: job.request.page,
                        previous_exists,
                        next_exists,
                    };
                    if out_tx.send((job.book, outcome)).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            tx: job_tx,
            rx: out_rx,
        })
    }

    /// Queue a probe (non-blocking).
    pub fn submit(&self, book: BookId, request: ProbeRequest) {
        let _ = self.tx.send(ProbeJob { book, request });
    }

    /// Poll for the next completed probe (non-blocking).
    pub fn try_recv(&self) -> Option<(BookId, ProbeOutcome)> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::ChapterSummary;
    use crate::viewer::BackendError;
    use std::time::Duration;

    /// Backend where exactly pages `0..total` exist.
    struct RangeBackend {
        total: i64,
    }

    impl DocumentBackend for RangeBackend {
        fn fetch_chapters(&self, _book: BookId) -> Result<Vec<ChapterSummary>, BackendError> {
            Ok(Vec::new())
        }

        fn page_exists(&self, _book: BookId, raw_page: i64) -> bool {
            (0..self.total).contains(&raw_page)
        }

        fn persist_alignment_offset(&self, _book: BookId, _offset: i64) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn recv(worker: &ProbeWorker) -> ProbeOutcome {
        let (book, outcome) = worker
            .rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker reports within the timeout");
        assert_eq!(book, BookId(1));
        outcome
    }

    #[test]
    fn worker_probes_both_neighbours() {
        let worker = ProbeWorker::spawn(Arc::new(RangeBackend { total: 10 })).unwrap();
        worker.submit(BookId(1), ProbeRequest { page: 5 });
        let outcome = recv(&worker);
        assert_eq!(outcome.page, 5);
        assert!(outcome.previous_exists);
        assert!(outcome.next_exists);
    }

    #[test]
    fn worker_reports_edges() {
        let worker = ProbeWorker::spawn(Arc::new(RangeBackend { total: 10 })).unwrap();
        // Page 0: no predecessor to probe at all.
        worker.submit(BookId(1), ProbeRequest { page: 0 });
        let outcome = recv(&worker);
        assert!(!outcome.previous_exists);
        assert!(outcome.next_exists);

        // Last page: successor does not exist.
        worker.submit(BookId(1), ProbeRequest { page: 9 });
        let outcome = recv(&worker);
        assert!(outcome.previous_exists);
        assert!(!outcome.next_exists);
    }

    #[test]
    fn outcomes_preserve_submission_order() {
        let worker = ProbeWorker::spawn(Arc::new(RangeBackend { total: 10 })).unwrap();
        worker.submit(BookId(1), ProbeRequest { page: 2 });
        worker.submit(BookId(1), ProbeRequest { page: 7 });
        assert_eq!(recv(&worker).page, 2);
        assert_eq!(recv(&worker).page, 7);
    }
}
