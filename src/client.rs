//! HTTP client for the reader backend.
//!
//! `ReaderClient` wraps the backend's REST API: shelf listing, chapter and
//! section lookups, page text/images, uploads, and metadata updates. It also
//! implements [`DocumentBackend`], which is the only surface the viewer core
//! sees; transport detail stops here.

use std::io::Read;
use std::path::Path;

use miette::Diagnostic;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;
use crate::shelf::{BookId, BookPatch, BookRecord, ChapterSummary, SectionSummary};
use crate::viewer::{BackendError, DocumentBackend};

// ---------------------------------------------------------------------------
// Client error
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error("request failed: {message}")]
    #[diagnostic(
        code(pageturn::client::request),
        help("Is the reader backend running at the configured URL?")
    )]
    Request { message: String },

    #[error("unexpected response from backend: {message}")]
    #[diagnostic(
        code(pageturn::client::response),
        help("Backend version mismatch? Check that pageturn and the backend agree on the API.")
    )]
    Response { message: String },

    #[error("failed to read {path}")]
    #[diagnostic(
        code(pageturn::client::io),
        help("Check that the file exists and you have read permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

// ---------------------------------------------------------------------------
// ReaderClient
// ---------------------------------------------------------------------------

/// Synchronous HTTP client for one backend instance.
pub struct ReaderClient {
    base_url: String,
    http: ureq::Agent,
}

impl ReaderClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            http: ureq::AgentBuilder::new().timeout(config.timeout()).build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- helpers --

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let resp = self
            .http
            .get(&self.url(path))
            .call()
            .map_err(|e| ClientError::Request {
                message: e.to_string(),
            })?;
        resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let resp = self
            .http
            .post(&self.url(path))
            .send_json(body)
            .map_err(|e| ClientError::Request {
                message: e.to_string(),
            })?;
        resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })
    }

    fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let resp = self
            .http
            .put(&self.url(path))
            .send_json(body)
            .map_err(|e| ClientError::Request {
                message: e.to_string(),
            })?;
        resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })
    }

    fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let resp = self
            .http
            .delete(&self.url(path))
            .call()
            .map_err(|e| ClientError::Request {
                message: e.to_string(),
            })?;
        resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })
    }

    // -----------------------------------------------------------------------
    // Shelf
    // -----------------------------------------------------------------------

    /// List all books on the shelf.
    pub fn list_books(&self) -> ClientResult<Vec<BookRecord>> {
        #[derive(Deserialize)]
        struct Resp {
            books: Vec<BookRecord>,
        }
        let resp: Resp = self.get_json("/books")?;
        Ok(resp.books)
    }

    /// Fetch a single book. The backend only exposes the full listing, so
    /// this filters client-side.
    pub fn book(&self, id: BookId) -> ClientResult<BookRecord> {
        self.list_books()?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| ClientError::Response {
                message: format!("book not found: {id}"),
            })
    }

    /// Apply a partial metadata update. An empty patch is a no-op.
    pub fn update_book(&self, id: BookId, patch: &BookPatch) -> ClientResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let _: serde_json::Value = self.put_json(&format!("/books/{id}"), patch)?;
        Ok(())
    }

    /// Upload a PDF; the backend registers it and extracts basic metadata.
    pub fn upload_book(&self, file: &Path) -> ClientResult<BookId> {
        let bytes = std::fs::read(file).map_err(|source| ClientError::Io {
            path: file.display().to_string(),
            source,
        })?;
        let filename = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.pdf");

        // ureq has no multipart helper; one file field is simple enough to
        // assemble by hand.
        let boundary = multipart_boundary();
        let body = multipart_pdf_body(&boundary, filename, &bytes);

        let resp = self
            .http
            .post(&self.url("/upload-book"))
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body)
            .map_err(|e| ClientError::Request {
                message: e.to_string(),
            })?;

        #[derive(Deserialize)]
        struct Resp {
            book_id: BookId,
        }
        let resp: Resp = resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })?;
        Ok(resp.book_id)
    }

    /// Delete a book and its stored PDF.
    pub fn delete_book(&self, id: BookId) -> ClientResult<()> {
        let _: serde_json::Value = self.delete_json(&format!("/delete-book?book_id={id}"))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// Chapters for a book, ordered by start page.
    pub fn chapters(&self, book: BookId) -> ClientResult<Vec<ChapterSummary>> {
        #[derive(Deserialize)]
        struct Resp {
            chapters: Vec<ChapterSummary>,
        }
        let resp: Resp = self.get_json(&format!("/chapters?book_id={book}"))?;
        Ok(resp.chapters)
    }

    /// Sections for a book, optionally restricted to one chapter.
    pub fn sections(
        &self,
        book: BookId,
        chapter: Option<i64>,
    ) -> ClientResult<Vec<SectionSummary>> {
        #[derive(Deserialize)]
        struct Resp {
            sections: Vec<SectionSummary>,
        }
        let path = match chapter {
            Some(ch) => format!("/sections?book_id={book}&chapter_id={ch}"),
            None => format!("/sections?book_id={book}"),
        };
        let resp: Resp = self.get_json(&path)?;
        Ok(resp.sections)
    }

    /// Whether the backend has a table of contents for the book.
    pub fn toc_exists(&self, book: BookId) -> ClientResult<bool> {
        #[derive(Deserialize)]
        struct Resp {
            toc_exists: bool,
        }
        let resp: Resp = self.get_json(&format!("/check-toc-exists?book_id={book}"))?;
        Ok(resp.toc_exists)
    }

    /// Trigger TOC extraction on the backend. Slow: the backend reads and
    /// classifies front-matter pages.
    pub fn refresh_toc(&self, book: BookId, overwrite: bool) -> ClientResult<()> {
        #[derive(Serialize)]
        struct Req {
            book_id: BookId,
            caching: bool,
            overwrite: bool,
        }
        let _: serde_json::Value = self.post_json(
            "/update-toc",
            &Req {
                book_id: book,
                caching: true,
                overwrite,
            },
        )?;
        Ok(())
    }

    /// Trigger metadata re-extraction on the backend.
    pub fn refresh_book_info(&self, book: BookId) -> ClientResult<()> {
        #[derive(Serialize)]
        struct Req {
            book_id: BookId,
        }
        let _: serde_json::Value = self.post_json("/update-book-info", &Req { book_id: book })?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------------

    /// Text content of one raw page.
    pub fn page_text(&self, book: BookId, raw_page: i64) -> ClientResult<String> {
        #[derive(Serialize)]
        struct Req {
            book_id: BookId,
            page_number: i64,
        }
        #[derive(Deserialize)]
        struct Resp {
            text: String,
        }
        let resp: Resp = self.post_json(
            "/page-text",
            &Req {
                book_id: book,
                page_number: raw_page,
            },
        )?;
        Ok(resp.text)
    }

    /// Rendered page image as PNG bytes.
    pub fn page_image(&self, book: BookId, raw_page: i64, dpi: u32) -> ClientResult<Vec<u8>> {
        let path = format!("/page-image-binary?book_id={book}&page_number={raw_page}&dpi={dpi}");
        let resp = self
            .http
            .get(&self.url(&path))
            .call()
            .map_err(|e| ClientError::Request {
                message: e.to_string(),
            })?;
        let mut bytes = Vec::new();
        resp.into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| ClientError::Response {
                message: format!("failed to read image body: {e}"),
            })?;
        Ok(bytes)
    }

    /// Total page count of the stored PDF.
    pub fn total_pages(&self, book: BookId) -> ClientResult<i64> {
        #[derive(Serialize)]
        struct Req {
            book_id: BookId,
        }
        #[derive(Deserialize)]
        struct Resp {
            total_pages: i64,
        }
        let resp: Resp = self.post_json("/total-pages", &Req { book_id: book })?;
        Ok(resp.total_pages)
    }
}

// ---------------------------------------------------------------------------
// DocumentBackend: the viewer core's view of this client
// ---------------------------------------------------------------------------

impl DocumentBackend for ReaderClient {
    fn fetch_chapters(&self, book: BookId) -> Result<Vec<ChapterSummary>, BackendError> {
        self.chapters(book).map_err(|e| BackendError::new(e.to_string()))
    }

    fn page_exists(&self, book: BookId, raw_page: i64) -> bool {
        // Existence is probed by attempting to fetch content: success means
        // the page is renderable, any failure (including out-of-range)
        // means it is not.
        match self.page_text(book, raw_page) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(book = %book, raw_page, error = %e, "page probe failed");
                false
            }
        }
    }

    fn persist_alignment_offset(&self, book: BookId, offset: i64) -> Result<(), BackendError> {
        self.update_book(book, &BookPatch::alignment_offset(offset))
            .map_err(|e| BackendError::new(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Multipart assembly
// ---------------------------------------------------------------------------

fn multipart_boundary() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("----pageturn-{:x}-{nanos:x}", std::process::id())
}

fn multipart_pdf_body(boundary: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
