//! Wire-level types for books and their extracted structure.
//!
//! Field renames follow the backend's JSON (`book_name`, `start_page_number`,
//! …) so records round-trip without a translation layer. Page numbers are
//! `i64` throughout: raw indexes from the backend are non-negative, but
//! logical pages may transiently go below zero during navigation and the
//! alignment offset itself is signed.

use serde::{Deserialize, Serialize};

/// Backend-assigned book identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i64);

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One book as listed by the shelf endpoint.
///
/// Most metadata fields are optional: a freshly uploaded book may not have
/// finished info extraction yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(rename = "book_id")]
    pub id: BookId,
    #[serde(rename = "book_name", default)]
    pub title: Option<String>,
    #[serde(rename = "book_author", default)]
    pub author: Option<String>,
    #[serde(rename = "book_keywords", default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub total_pages: Option<i64>,
    #[serde(rename = "book_summary", default)]
    pub summary: Option<String>,
    #[serde(rename = "book_file_name", default)]
    pub file_name: Option<String>,
    /// Signed correction mapping chapter-relative page numbers to raw PDF
    /// page indexes. Absent means never aligned.
    #[serde(default)]
    pub alignment_offset: Option<i64>,
    /// Whether the backend has extracted a table of contents.
    #[serde(default)]
    pub toc_exists: bool,
}

impl BookRecord {
    /// The stored alignment offset, defaulting to 0 for unaligned books.
    pub fn offset(&self) -> i64 {
        self.alignment_offset.unwrap_or(0)
    }

    /// Title for display, falling back to the uploaded file name.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.file_name.as_deref())
            .unwrap_or("(untitled)")
    }
}

/// A chapter entry from the extracted table of contents, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterSummary {
    #[serde(default)]
    pub chapter_id: Option<i64>,
    pub title: String,
    /// Raw page index where the chapter begins.
    pub start_page_number: i64,
    #[serde(default)]
    pub end_page_number: Option<i64>,
    /// Index label as printed in the book ("3", "IV", "A.2", …).
    #[serde(rename = "book_index_string", default)]
    pub index: Option<String>,
}

/// A section within a chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    #[serde(default)]
    pub section_id: Option<i64>,
    pub title: String,
    pub start_page_number: i64,
    #[serde(default)]
    pub end_page_number: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub chapter_id: Option<i64>,
    #[serde(rename = "book_index_string", default)]
    pub index: Option<String>,
}

/// Partial book-metadata update for `PUT /books/{id}`.
///
/// `None` fields are omitted from the request body and left untouched by the
/// backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookPatch {
    #[serde(rename = "book_name", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "book_author", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "book_keywords", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_offset: Option<i64>,
}

impl BookPatch {
    /// Patch that only writes a new alignment offset.
    pub fn alignment_offset(offset: i64) -> Self {
        Self {
            alignment_offset: Some(offset),
            ..Self::default()
        }
    }

    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.keywords.is_none()
            && self.alignment_offset.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_record_parses_backend_listing() {
        let json = r#"{
            "book_id": 7,
            "book_name": "Linear Algebra Done Right",
            "book_author": "Axler",
            "total_pages": 340,
            "book_keywords": "linear algebra, vector spaces",
            "book_summary": null,
            "book_file_name": "8f3a2c",
            "book_toc_end_page": 9,
            "alignment_offset": 12,
            "toc_exists": true
        }"#;
        let book: BookRecord = serde_json::from_str(json).unwrap();
        assert_eq!(book.id, BookId(7));
        assert_eq!(book.display_title(), "Linear Algebra Done Right");
        assert_eq!(book.offset(), 12);
        assert!(book.toc_exists);
    }

    #[test]
    fn sparse_record_defaults() {
        let json = r#"{"book_id": 3}"#;
        let book: BookRecord = serde_json::from_str(json).unwrap();
        assert_eq!(book.offset(), 0);
        assert_eq!(book.display_title(), "(untitled)");
        assert!(!book.toc_exists);
    }

    #[test]
    fn patch_omits_unset_fields() {
        let patch = BookPatch::alignment_offset(-3);
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"alignment_offset":-3}"#);
    }

    #[test]
    fn chapter_summary_maps_index_string() {
        let json = r#"{
            "chapter_id": 1,
            "title": "Vector Spaces",
            "start_page_number": 20,
            "end_page_number": 44,
            "book_index_string": "1"
        }"#;
        let chapter: ChapterSummary = serde_json::from_str(json).unwrap();
        assert_eq!(chapter.start_page_number, 20);
        assert_eq!(chapter.index.as_deref(), Some("1"));
    }
}
