//! Data model for the remote shelf: books, chapters, and sections.
//!
//! All of this state is owned by the reader backend; these types are the
//! client-side view of it, serde-mapped to the backend's wire field names.
//! Nothing here is persisted locally.

pub mod model;

pub use model::{BookId, BookPatch, BookRecord, ChapterSummary, SectionSummary};
