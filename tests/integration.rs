//! End-to-end tests for viewer sessions against an in-memory backend.
//!
//! These exercise the full open → navigate → confirm → persist flow,
//! including the failure paths that must leave the session open and the
//! stored offset untouched.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pageturn::shelf::{BookId, BookRecord, ChapterSummary};
use pageturn::viewer::{
    BackendError, DocumentBackend, ProbeOutcome, ProbeRequest, SessionMode, ViewerError,
    ViewerSession,
};

const BOOK: BookId = BookId(1);

/// Scriptable in-memory stand-in for the reader backend.
struct FakeBackend {
    /// What `fetch_chapters` returns; `Err` simulates a transport failure.
    chapters: Mutex<Result<Vec<ChapterSummary>, String>>,
    /// Raw pages that exist, as a half-open range.
    pages: Mutex<std::ops::Range<i64>>,
    /// What `persist_alignment_offset` returns.
    persist_result: Mutex<Result<(), String>>,
    /// Successful persists, in order.
    persisted: Mutex<Vec<(BookId, i64)>>,
    chapter_fetches: AtomicUsize,
}

impl FakeBackend {
    fn new(chapters: Vec<ChapterSummary>) -> Arc<Self> {
        Arc::new(Self {
            chapters: Mutex::new(Ok(chapters)),
            pages: Mutex::new(0..1000),
            persist_result: Mutex::new(Ok(())),
            persisted: Mutex::new(Vec::new()),
            chapter_fetches: AtomicUsize::new(0),
        })
    }

    fn set_chapters(&self, chapters: Result<Vec<ChapterSummary>, &str>) {
        *self.chapters.lock().unwrap() = chapters.map_err(String::from);
    }

    fn fail_persist(&self, message: &str) {
        *self.persist_result.lock().unwrap() = Err(message.into());
    }

    fn persisted(&self) -> Vec<(BookId, i64)> {
        self.persisted.lock().unwrap().clone()
    }

    fn chapter_fetches(&self) -> usize {
        self.chapter_fetches.load(Ordering::SeqCst)
    }
}

impl DocumentBackend for FakeBackend {
    fn fetch_chapters(&self, _book: BookId) -> Result<Vec<ChapterSummary>, BackendError> {
        self.chapter_fetches.fetch_add(1, Ordering::SeqCst);
        self.chapters
            .lock()
            .unwrap()
            .clone()
            .map_err(BackendError::new)
    }

    fn page_exists(&self, _book: BookId, raw_page: i64) -> bool {
        self.pages.lock().unwrap().contains(&raw_page)
    }

    fn persist_alignment_offset(&self, book: BookId, offset: i64) -> Result<(), BackendError> {
        self.persist_result
            .lock()
            .unwrap()
            .clone()
            .map_err(BackendError::new)?;
        self.persisted.lock().unwrap().push((book, offset));
        Ok(())
    }
}

fn chapter(start: i64) -> ChapterSummary {
    ChapterSummary {
        chapter_id: None,
        title: format!("Chapter at {start}"),
        start_page_number: start,
        end_page_number: None,
        index: None,
    }
}

fn book_with_offset(offset: i64) -> BookRecord {
    let json = format!(r#"{{"book_id": 1, "alignment_offset": {offset}}}"#);
    serde_json::from_str(&json).unwrap()
}

/// Execute a probe request against the backend and deliver the outcome,
/// the way the TUI's worker thread does.
fn pump(session: &mut ViewerSession, backend: &FakeBackend, request: ProbeRequest) {
    let previous_exists = request
        .previous_target()
        .map(|page| backend.page_exists(BOOK, page))
        .unwrap_or(false);
    let next_exists = backend.page_exists(BOOK, request.next_target());
    session.complete_probe(ProbeOutcome {
        page: request.page,
        previous_exists,
        next_exists,
    });
}

#[test]
fn alignment_open_starts_at_chapter_start_plus_offset() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let book = book_with_offset(10);

    let (session, probe) = ViewerSession::open_for_visual_alignment(backend.clone(), &book);
    assert_eq!(session.current_page(), 30);
    assert_eq!(probe.page, 30);
    assert_eq!(session.mode(), SessionMode::VisualAlignment);
    assert!(session.awaiting_confirmation());
}

#[test]
fn plain_open_starts_at_caller_page() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let (session, probe) = ViewerSession::open(backend, BOOK, 42);
    assert_eq!(session.current_page(), 42);
    assert_eq!(probe.page, 42);
    assert_eq!(session.mode(), SessionMode::View);
    assert!(!session.awaiting_confirmation());
}

#[test]
fn empty_chapter_list_opens_at_zero() {
    // A successful fetch with no chapters: assume the offset is already
    // correct and start from the top.
    let backend = FakeBackend::new(Vec::new());
    let book = book_with_offset(17);
    let (session, _) = ViewerSession::open_for_visual_alignment(backend, &book);
    assert_eq!(session.current_page(), 0);
}

#[test]
fn failed_chapter_fetch_opens_at_stored_offset() {
    // A failed fetch is not "no chapters": the stored offset is the
    // best-known anchor.
    let backend = FakeBackend::new(Vec::new());
    backend.set_chapters(Err("connection refused"));
    let book = book_with_offset(17);
    let (session, _) = ViewerSession::open_for_visual_alignment(backend, &book);
    assert_eq!(session.current_page(), 17);
}

#[test]
fn confirm_persists_the_difference_and_closes() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let book = book_with_offset(10);

    let (mut session, probe) = ViewerSession::open_for_visual_alignment(backend.clone(), &book);
    pump(&mut session, &backend, probe);
    assert_eq!(session.current_page(), 30);

    // Manual navigation lands on 33 before confirming.
    let probe = session.jump_forward(3).unwrap();
    pump(&mut session, &backend, probe);
    assert_eq!(session.current_page(), 33);

    let offset = session.confirm().unwrap();
    assert_eq!(offset, 13);
    assert_eq!(backend.persisted(), vec![(BOOK, 13)]);
    assert!(!session.awaiting_confirmation());
    assert!(!session.is_open());
}

#[test]
fn confirm_refetches_chapters_instead_of_reusing_the_snapshot() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let book = book_with_offset(0);

    let (mut session, probe) = ViewerSession::open_for_visual_alignment(backend.clone(), &book);
    pump(&mut session, &backend, probe);
    assert_eq!(backend.chapter_fetches(), 1);

    // Chapters are re-extracted while the session is open.
    backend.set_chapters(Ok(vec![chapter(25)]));

    let offset = session.confirm().unwrap();
    // 20 (current page, unchanged) − 25 (fresh chapter start).
    assert_eq!(offset, -5);
    assert_eq!(backend.chapter_fetches(), 2);
}

#[test]
fn chapter_fetch_failure_during_confirm_keeps_session_open() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let book = book_with_offset(0);

    let (mut session, probe) = ViewerSession::open_for_visual_alignment(backend.clone(), &book);
    pump(&mut session, &backend, probe);

    backend.set_chapters(Err("backend down"));

    let err = session.confirm().unwrap_err();
    assert!(matches!(err, ViewerError::ChapterLookupFailed { .. }));
    assert!(session.is_open());
    assert!(session.awaiting_confirmation());
    assert!(backend.persisted().is_empty());

    // The failure is retryable: restore the backend and confirm again.
    backend.set_chapters(Ok(vec![chapter(20)]));
    assert_eq!(session.confirm().unwrap(), 0);
    assert_eq!(backend.persisted(), vec![(BOOK, 0)]);
}

#[test]
fn persist_failure_keeps_the_confirmed_page() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let book = book_with_offset(10);

    let (mut session, probe) = ViewerSession::open_for_visual_alignment(backend.clone(), &book);
    pump(&mut session, &backend, probe);
    backend.fail_persist("write timed out");

    let err = session.confirm().unwrap_err();
    assert!(matches!(err, ViewerError::PersistFailed { offset: 10, .. }));
    assert!(session.is_open());
    assert!(session.awaiting_confirmation());
    assert_eq!(session.current_page(), 30);
    assert!(backend.persisted().is_empty());
}

#[test]
fn empty_chapters_at_confirm_is_its_own_failure() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let book = book_with_offset(0);

    let (mut session, probe) = ViewerSession::open_for_visual_alignment(backend.clone(), &book);
    pump(&mut session, &backend, probe);

    backend.set_chapters(Ok(Vec::new()));
    let err = session.confirm().unwrap_err();
    assert!(matches!(err, ViewerError::NoChapters));
    assert!(session.is_open());
    assert!(session.awaiting_confirmation());
    assert!(backend.persisted().is_empty());
}

#[test]
fn confirm_outside_alignment_mode_is_rejected() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let (mut session, _) = ViewerSession::open(backend.clone(), BOOK, 5);
    let err = session.confirm().unwrap_err();
    assert!(matches!(err, ViewerError::NotAlignmentMode));
    assert!(backend.persisted().is_empty());
}

#[test]
fn close_is_idempotent_and_ends_confirmation() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let book = book_with_offset(0);

    let (mut session, _) = ViewerSession::open_for_visual_alignment(backend, &book);
    session.close();
    assert!(!session.is_open());
    assert!(!session.awaiting_confirmation());
    session.close(); // second close is a no-op

    let err = session.confirm().unwrap_err();
    assert!(matches!(err, ViewerError::SessionClosed));
}

#[test]
fn probe_results_after_close_are_dropped() {
    let backend = FakeBackend::new(vec![chapter(20)]);
    let (mut session, probe) = ViewerSession::open(backend, BOOK, 5);
    session.close();

    let applied = session.complete_probe(ProbeOutcome {
        page: probe.page,
        previous_exists: true,
        next_exists: true,
    });
    assert!(!applied);
    assert!(!session.bounds().can_go_previous);
    assert!(!session.bounds().can_go_next);
}
