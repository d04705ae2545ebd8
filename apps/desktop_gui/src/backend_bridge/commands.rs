//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

use shared::domain::{ImageFile, ImageSlot, LoadId, PredefinedStyle, RequestId, StyleFetchId};

#[derive(Debug)]
pub enum BackendCommand {
    LoadLocalImage {
        slot: ImageSlot,
        load_id: LoadId,
        path: PathBuf,
    },
    FetchPredefinedStyle {
        fetch_id: StyleFetchId,
        style: PredefinedStyle,
    },
    FetchStyleThumbnail {
        style: PredefinedStyle,
    },
    RunTransfer {
        request_id: RequestId,
        content: ImageFile,
        style: ImageFile,
    },
    SaveResult {
        path: PathBuf,
        file: ImageFile,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadLocalImage { .. } => "load_local_image",
            Self::FetchPredefinedStyle { .. } => "fetch_predefined_style",
            Self::FetchStyleThumbnail { .. } => "fetch_style_thumbnail",
            Self::RunTransfer { .. } => "run_transfer",
            Self::SaveResult { .. } => "save_result",
        }
    }
}
