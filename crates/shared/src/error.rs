use thiserror::Error;

/// Failures the user is told about. The display text is what the alert shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Please upload both content and style images.")]
    MissingImages,
    #[error("Something went wrong during style transfer.")]
    TransferFailed,
    #[error("Could not load the predefined style.")]
    PredefinedStyleUnavailable,
}

impl FlowError {
    pub fn title(self) -> &'static str {
        match self {
            Self::MissingImages => "Missing images",
            Self::TransferFailed => "Style transfer failed",
            Self::PredefinedStyleUnavailable => "Style unavailable",
        }
    }
}
