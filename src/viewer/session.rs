//! Viewer sessions: one open book, one position, one optional confirmation.
//!
//! A session is an explicit handle returned to the caller. There is no
//! process-wide "current viewer" slot, so two sessions can coexist (e.g. a
//! future split-screen compare) and a host that wants exactly one simply
//! holds one.

use std::sync::Arc;

use crate::shelf::{BookId, BookRecord};

use super::align;
use super::error::{ViewerError, ViewerResult};
use super::nav::{NavBounds, NavController, NavState, ProbeOutcome, ProbeRequest};
use super::DocumentBackend;

/// How the session was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Plain reading; no confirmation step.
    View,
    /// The user is picking the page where chapter 1 starts.
    VisualAlignment,
}

/// An open viewer over one book.
///
/// The session operates purely in logical page numbers; the single
/// logical→raw conversion happens in [`ViewerSession::raw_page`] when a
/// render or probe request is built, never inside navigation.
pub struct ViewerSession {
    backend: Arc<dyn DocumentBackend>,
    book: BookId,
    mode: SessionMode,
    awaiting_confirmation: bool,
    nav: NavController,
}

impl ViewerSession {
    /// Open a plain viewing session at a caller-supplied logical page.
    pub fn open(
        backend: Arc<dyn DocumentBackend>,
        book: BookId,
        start_page: i64,
    ) -> (Self, ProbeRequest) {
        Self::with_mode(backend, book, start_page, SessionMode::View)
    }

    /// Open in visual-alignment mode.
    ///
    /// The starting page is the first chapter's start shifted by the stored
    /// offset. Two degraded cases are deliberately distinct: a successful
    /// fetch returning *no* chapters opens at page 0, while a *failed*
    /// fetch opens at the stored offset, the best-known anchor.
    pub fn open_for_visual_alignment(
        backend: Arc<dyn DocumentBackend>,
        book: &BookRecord,
    ) -> (Self, ProbeRequest) {
        let start = match backend.fetch_chapters(book.id) {
            Ok(chapters) => align::initial_page(book.offset(), &chapters),
            Err(err) => {
                tracing::warn!(
                    book = %book.id,
                    error = %err,
                    "chapter lookup failed, opening at stored offset"
                );
                book.offset()
            }
        };
        Self::with_mode(backend, book.id, start, SessionMode::VisualAlignment)
    }

    fn with_mode(
        backend: Arc<dyn DocumentBackend>,
        book: BookId,
        start_page: i64,
        mode: SessionMode,
    ) -> (Self, ProbeRequest) {
        let mut nav = NavController::new();
        let probe = nav
            .open(start_page)
            .expect("a fresh controller accepts open");
        let session = Self {
            backend,
            book,
            mode,
            awaiting_confirmation: mode == SessionMode::VisualAlignment,
            nav,
        };
        (session, probe)
    }

    // -- navigation passthrough --

    pub fn previous_page(&mut self) -> Option<ProbeRequest> {
        self.nav.previous_page()
    }

    pub fn next_page(&mut self) -> Option<ProbeRequest> {
        self.nav.next_page()
    }

    pub fn jump_back(&mut self, n: i64) -> Option<ProbeRequest> {
        self.nav.jump_back(n)
    }

    pub fn jump_forward(&mut self, n: i64) -> Option<ProbeRequest> {
        self.nav.jump_forward(n)
    }

    pub fn set_page(&mut self, page: i64) -> Option<ProbeRequest> {
        self.nav.set_page(page)
    }

    /// Deliver a completed probe. Stale and post-close results are dropped.
    pub fn complete_probe(&mut self, outcome: ProbeOutcome) -> bool {
        self.nav.complete_probe(outcome)
    }

    // -- confirmation --

    /// Confirm that chapter 1 starts on the current page.
    ///
    /// Re-fetches the chapter list (it is externally mutable; the open-time
    /// snapshot may be stale), derives the offset, and persists it. Only
    /// after the write settles is the confirmation consumed and the session
    /// closed. On any failure the session stays open, still awaiting
    /// confirmation, and the stored offset is untouched.
    pub fn confirm(&mut self) -> ViewerResult<i64> {
        if !self.is_open() {
            return Err(ViewerError::SessionClosed);
        }
        if self.mode != SessionMode::VisualAlignment || !self.awaiting_confirmation {
            return Err(ViewerError::NotAlignmentMode);
        }

        let chapters = self
            .backend
            .fetch_chapters(self.book)
            .map_err(|source| ViewerError::ChapterLookupFailed { source })?;
        let first = chapters.first().ok_or(ViewerError::NoChapters)?;

        let offset =
            align::offset_from_confirmation(self.nav.current_page(), first.start_page_number);
        self.backend
            .persist_alignment_offset(self.book, offset)
            .map_err(|source| ViewerError::PersistFailed { offset, source })?;

        tracing::info!(book = %self.book, offset, "alignment offset persisted");
        self.awaiting_confirmation = false;
        self.close();
        Ok(offset)
    }

    /// Close the session. Always legal, idempotent; in-flight probe results
    /// arriving afterwards are dropped, not applied.
    pub fn close(&mut self) {
        self.awaiting_confirmation = false;
        self.nav.close();
    }

    // -- accessors --

    pub fn book(&self) -> BookId {
        self.book
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.nav.state(), NavState::Closed)
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    /// Current logical page. May be transiently out of range after a jump;
    /// clamp via [`ViewerSession::raw_page`] before rendering.
    pub fn current_page(&self) -> i64 {
        self.nav.current_page()
    }

    /// Raw page index for render and probe requests.
    pub fn raw_page(&self) -> i64 {
        align::raw_page_index(self.nav.current_page())
    }

    pub fn bounds(&self) -> NavBounds {
        self.nav.bounds()
    }
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("book", &self.book)
            .field("mode", &self.mode)
            .field("awaiting_confirmation", &self.awaiting_confirmation)
            .field("nav", &self.nav)
            .finish_non_exhaustive()
    }
}
