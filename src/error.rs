//! Top-level diagnostic error type.
//!
//! Each subsystem defines its own error enum with miette `#[diagnostic]`
//! derives (error codes, help text, source chains); this type wraps them
//! transparently so diagnostics survive to the terminal unchanged.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for pageturn.
#[derive(Debug, Error, Diagnostic)]
pub enum PageturnError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Viewer(#[from] crate::viewer::ViewerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] crate::client::ClientError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Convenience alias for functions returning pageturn results.
pub type PageturnResult<T> = std::result::Result<T, PageturnError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::ViewerError;

    #[test]
    fn viewer_error_converts_to_top_level() {
        let err = ViewerError::NoChapters;
        let top: PageturnError = err.into();
        assert!(matches!(top, PageturnError::Viewer(ViewerError::NoChapters)));
    }

    #[test]
    fn display_messages_are_descriptive() {
        let err = ViewerError::PersistFailed {
            offset: 13,
            source: crate::viewer::BackendError::new("connection refused"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("13"));
        assert!(msg.contains("connection refused"));
    }
}
