//! # pageturn
//!
//! Terminal front end for a remote document-processing backend. The backend
//! owns PDF storage, table-of-contents extraction, page rendering, and book
//! metadata; pageturn browses it: shelf listing, TOC drill-down, page
//! viewing, and visual alignment of chapter numbering.
//!
//! ## Architecture
//!
//! - **Viewer core** (`viewer`): alignment arithmetic, the page-navigation
//!   state machine with probed bounds, and the composed session handle.
//!   Pure logic behind the `DocumentBackend` trait, no I/O.
//! - **REST client** (`client`): synchronous HTTP client for the backend
//!   API; implements `DocumentBackend`.
//! - **Shelf model** (`shelf`): client-side view of backend-owned books,
//!   chapters, and sections.
//! - **TUI** (`tui`): crossterm event loop, screens, and the background
//!   probe worker.
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use pageturn::client::ReaderClient;
//! use pageturn::config::AppConfig;
//! use pageturn::shelf::BookId;
//! use pageturn::viewer::{DocumentBackend, ViewerSession};
//!
//! let client = Arc::new(ReaderClient::new(&AppConfig::default()));
//! let backend: Arc<dyn DocumentBackend> = client;
//! let (session, probe) = ViewerSession::open(backend, BookId(1), 0);
//! assert_eq!(probe.page, session.current_page());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod notice;
pub mod shelf;
pub mod tui;
pub mod viewer;
