//! Diagnostic error types for viewer sessions.

use miette::Diagnostic;
use thiserror::Error;

/// Opaque failure from a backend collaborator call.
///
/// The viewer core never inspects transport detail; implementations of
/// [`crate::viewer::DocumentBackend`] flatten whatever went wrong into a
/// message before it reaches the core.
#[derive(Debug, Error, Diagnostic)]
#[error("backend call failed: {message}")]
#[diagnostic(
    code(pageturn::viewer::backend),
    help("Is the reader backend running and reachable at the configured URL?")
)]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from viewer session operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ViewerError {
    #[error("chapter lookup failed: {source}")]
    #[diagnostic(
        code(pageturn::viewer::chapter_lookup),
        help(
            "The backend could not list the book's chapters, so no offset was \
             derived and the stored offset is untouched. The session stays \
             open — confirm again to retry."
        )
    )]
    ChapterLookupFailed {
        #[source]
        source: BackendError,
    },

    #[error("book has no extracted chapters")]
    #[diagnostic(
        code(pageturn::viewer::no_chapters),
        help(
            "Alignment needs a chapter-1 start page to anchor against. \
             Run `pageturn toc refresh <book>` first, then confirm again."
        )
    )]
    NoChapters,

    #[error("failed to persist alignment offset {offset}: {source}")]
    #[diagnostic(
        code(pageturn::viewer::persist),
        help(
            "The offset was computed but not durably stored; nothing was \
             changed. The session stays open on the confirmed page — confirm \
             again to retry the write."
        )
    )]
    PersistFailed {
        offset: i64,
        #[source]
        source: BackendError,
    },

    #[error("session is closed")]
    #[diagnostic(
        code(pageturn::viewer::closed),
        help("Open a new session with `open()` or `open_for_visual_alignment()`.")
    )]
    SessionClosed,

    #[error("confirmation is only valid in visual-alignment mode")]
    #[diagnostic(
        code(pageturn::viewer::not_alignment),
        help("Open the session with `open_for_visual_alignment()` to confirm a chapter start.")
    )]
    NotAlignmentMode,
}

/// Convenience alias for viewer operation results.
pub type ViewerResult<T> = std::result::Result<T, ViewerError>;
