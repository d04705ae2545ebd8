//! Backend-to-UI events and error modeling for the desktop controller.

use std::path::PathBuf;

use shared::domain::{ImageFile, ImageSlot, LoadId, PredefinedStyle, RequestId, StyleFetchId};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Error(UiError),
    ImageLoaded {
        slot: ImageSlot,
        load_id: LoadId,
        file: ImageFile,
    },
    ImageLoadFailed {
        slot: ImageSlot,
        load_id: LoadId,
        error: UiError,
    },
    PredefinedStyleLoaded {
        fetch_id: StyleFetchId,
        style: PredefinedStyle,
        file: ImageFile,
    },
    PredefinedStyleFailed {
        fetch_id: StyleFetchId,
        style: PredefinedStyle,
        reason: String,
    },
    StyleThumbnailLoaded {
        url: String,
        file: ImageFile,
    },
    StyleThumbnailFailed {
        url: String,
        reason: String,
    },
    TransferCompleted {
        request_id: RequestId,
        outcome: Result<ImageFile, String>,
    },
    ResultSaved(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Io,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadImage,
    PredefinedStyle,
    Transfer,
    SaveResult,
    Clipboard,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Io => "File",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("timed out")
            || message_lower.contains("timeout")
            || message_lower.contains("connect")
            || message_lower.contains("dns")
            || message_lower.contains("responded with status")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("permission denied")
            || message_lower.contains("no such file")
            || message_lower.contains("not found")
            || message_lower.contains("failed to read")
            || message_lower.contains("failed to write")
        {
            UiErrorCategory::Io
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_line(&self) -> String {
        format!("{} error: {}", err_label(self.category), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_refused_connection_as_transport() {
        let err = UiError::from_message(
            UiErrorContext::Transfer,
            "request to http://127.0.0.1:8000/style-transfer failed: error sending request: connection refused",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.context(), UiErrorContext::Transfer);
    }

    #[test]
    fn classifies_reset_connection_and_connect_failures_as_transport() {
        for message in [
            "error sending request: connection reset by peer",
            "tcp connect error: Network is unreachable",
        ] {
            let err = UiError::from_message(UiErrorContext::PredefinedStyle, message);
            assert_eq!(err.category(), UiErrorCategory::Transport, "{message}");
        }
    }

    #[test]
    fn classifies_missing_file_as_io() {
        let err = UiError::from_message(
            UiErrorContext::LoadImage,
            "failed to read '/tmp/x.png': No such file or directory (os error 2)",
        );
        assert_eq!(err.category(), UiErrorCategory::Io);
        assert!(err.status_line().starts_with("File error:"));
    }

    #[test]
    fn classifies_empty_payload_as_validation() {
        let err = UiError::from_message(
            UiErrorContext::Transfer,
            "http://svc/style-transfer returned an empty image payload",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
    }

    #[test]
    fn unknown_messages_fall_through() {
        let err = UiError::from_message(UiErrorContext::Clipboard, "something odd");
        assert_eq!(err.category(), UiErrorCategory::Unknown);
        assert_eq!(err.message(), "something odd");
    }
}
