//! Viewer sessions over a remote document backend.
//!
//! Books carry two page numbering schemes: the raw zero-based index the
//! backend stores and renders, and the chapter-relative "logical" number
//! the reader sees, related by a per-book signed offset. This module owns
//! everything that juggles the two:
//!
//! - `align`: pure offset arithmetic,
//! - `nav`: the per-session navigation state machine with probed bounds,
//! - `session`: the composed [`ViewerSession`] handle.
//!
//! The core performs no I/O of its own. Its three outbound needs are
//! expressed by [`DocumentBackend`]; `ReaderClient` implements them over
//! HTTP and tests implement them in memory.

pub mod align;
pub mod error;
pub mod nav;
pub mod session;

pub use error::{BackendError, ViewerError, ViewerResult};
pub use nav::{NavBounds, NavController, NavState, ProbeOutcome, ProbeRequest, JUMP_STRIDE};
pub use session::{SessionMode, ViewerSession};

use crate::shelf::{BookId, ChapterSummary};

/// External operations the viewer core needs from the document backend.
pub trait DocumentBackend: Send + Sync {
    /// Chapters for a book, in reading order. Failures surface as errors so
    /// callers can distinguish "no chapters" from "lookup failed"; the two
    /// have different fallback behavior.
    fn fetch_chapters(&self, book: BookId) -> Result<Vec<ChapterSummary>, BackendError>;

    /// Whether the backend can produce content for this raw page index.
    /// Implementations map any failure to `false`; the core never learns
    /// why a page was unreachable.
    fn page_exists(&self, book: BookId, raw_page: i64) -> bool;

    /// Durably store a new alignment offset for the book.
    fn persist_alignment_offset(&self, book: BookId, offset: i64) -> Result<(), BackendError>;
}
