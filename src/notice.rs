//! Structured user-facing notices.
//!
//! `Notice` replaces raw `println!()` calls with typed messages that can be
//! rendered by different sinks: the terminal (CLI flows), the TUI status
//! line, or collected in memory for tests. Probe failures never become
//! notices (they are absorbed into the navigation bounds), but integrity
//! failures (chapter lookup during confirmation, offset persistence) always
//! do.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::shelf::BookId;

/// A user-visible message emitted by the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// Informational status.
    Info { text: String },
    /// An alignment offset was derived and durably stored.
    AlignmentSaved { book: BookId, offset: i64 },
    /// Chapter lookup failed mid-confirmation; the session is still open
    /// and the user may retry.
    ChapterLookupFailed { book: BookId, detail: String },
    /// The offset write did not settle; nothing was stored.
    PersistFailed { book: BookId, detail: String },
    /// Any other surfaced error.
    Error { code: String, message: String },
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self::Info { text: text.into() }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether this notice reports a failure the user should act on.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ChapterLookupFailed { .. } | Self::PersistFailed { .. } | Self::Error { .. }
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info { text } => f.write_str(text),
            Self::AlignmentSaved { book, offset } => {
                write!(f, "alignment offset {offset} saved for book {book}")
            }
            Self::ChapterLookupFailed { book, detail } => {
                write!(
                    f,
                    "could not look up chapters for book {book}: {detail} — offset unchanged, retry to confirm"
                )
            }
            Self::PersistFailed { book, detail } => {
                write!(
                    f,
                    "could not save alignment offset for book {book}: {detail} — retry to confirm"
                )
            }
            Self::Error { code, message } => write!(f, "[{code}] {message}"),
        }
    }
}

/// A destination for notices.
pub trait NoticeSink {
    fn emit(&self, notice: &Notice);
}

/// Renders notices to the terminal; failures go to stderr.
pub struct StdoutSink;

impl NoticeSink for StdoutSink {
    fn emit(&self, notice: &Notice) {
        if notice.is_failure() {
            eprintln!("{notice}");
        } else {
            println!("{notice}");
        }
    }
}

/// Collects notices in memory for tests.
pub struct VecSink {
    notices: Mutex<Vec<Notice>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VecSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeSink for VecSink {
    fn emit(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
