use super::*;

use std::{path::PathBuf, sync::Mutex};

use async_trait::async_trait;
use shared::{
    domain::{
        default_predefined_styles, ImageSlot, LoadId, PredefinedStyle, RequestId, StyleFetchId,
    },
    error::FlowError,
    protocol::RESULT_FILENAME,
};
use transfer_client::ClientError;

use crate::controller::reducer::{update, AppState, Effect, Msg, RequestState, StyleThumbnail};

#[derive(Debug, Clone)]
struct RecordedTransfer {
    content: ImageFile,
    style: ImageFile,
}

struct FakeService {
    result: Option<Vec<u8>>,
    transfers: Mutex<Vec<RecordedTransfer>>,
    style_fetches: Mutex<Vec<String>>,
}

impl FakeService {
    fn answering(result: Vec<u8>) -> Self {
        Self {
            result: Some(result),
            transfers: Mutex::new(Vec::new()),
            style_fetches: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            result: None,
            transfers: Mutex::new(Vec::new()),
            style_fetches: Mutex::new(Vec::new()),
        }
    }

    fn transfer_count(&self) -> usize {
        self.transfers.lock().expect("lock").len()
    }
}

fn failure(url: &str) -> ClientError {
    ClientError::EmptyBody {
        url: url.to_string(),
    }
}

#[async_trait]
impl StyleTransferService for FakeService {
    async fn transfer(
        &self,
        content: &ImageFile,
        style: &ImageFile,
    ) -> Result<ImageFile, ClientError> {
        self.transfers.lock().expect("lock").push(RecordedTransfer {
            content: content.clone(),
            style: style.clone(),
        });
        match &self.result {
            Some(bytes) => Ok(ImageFile::new(
                RESULT_FILENAME,
                Some("image/jpeg".into()),
                bytes.clone(),
            )),
            None => Err(failure("http://svc/style-transfer")),
        }
    }

    async fn fetch_predefined_style(
        &self,
        style: &PredefinedStyle,
    ) -> Result<ImageFile, ClientError> {
        self.style_fetches
            .lock()
            .expect("lock")
            .push(style.url.clone());
        match &self.result {
            Some(_) => Ok(style.to_image_file(
                Some("image/jpeg".into()),
                format!("bytes-of:{}", style.name).into_bytes(),
            )),
            None => Err(failure(&style.url)),
        }
    }
}

/// Feeds every effect through the backend handler and back into the reducer.
async fn drive(state: &mut AppState, service: &FakeService, msg: Msg) {
    let mut pending: Vec<Effect> = update(state, msg);
    while let Some(effect) = pending.pop() {
        let event = handle_command(service, BackendCommand::from(effect)).await;
        pending.extend(update(state, Msg::Backend(event)));
    }
}

fn write_temp_file(dir: &tempfile::TempDir, name: &str, len: usize) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, vec![3u8; len]).expect("write temp file");
    path
}

#[tokio::test]
async fn loads_local_image_with_guessed_media_type() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_temp_file(&dir, "content.png", 500);
    let service = FakeService::answering(Vec::new());

    let event = handle_command(
        &service,
        BackendCommand::LoadLocalImage {
            slot: ImageSlot::Content,
            load_id: LoadId(5),
            path,
        },
    )
    .await;

    match event {
        UiEvent::ImageLoaded {
            slot,
            load_id,
            file,
        } => {
            assert_eq!(slot, ImageSlot::Content);
            assert_eq!(load_id, LoadId(5));
            assert_eq!(file.filename, "content.png");
            assert_eq!(file.media_type, "image/png");
            assert_eq!(file.len(), 500);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn missing_local_file_reports_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = FakeService::answering(Vec::new());

    let event = handle_command(
        &service,
        BackendCommand::LoadLocalImage {
            slot: ImageSlot::Style,
            load_id: LoadId(2),
            path: dir.path().join("absent.png"),
        },
    )
    .await;

    match event {
        UiEvent::ImageLoadFailed {
            slot,
            load_id,
            error,
        } => {
            assert_eq!(slot, ImageSlot::Style);
            assert_eq!(load_id, LoadId(2));
            assert_eq!(error.context(), UiErrorContext::LoadImage);
            assert!(error.message().contains("absent.png"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn run_transfer_echoes_request_id() {
    let service = FakeService::answering(vec![8u8; 16]);
    let content = ImageFile::new("c.png", None, vec![1u8]);
    let style = ImageFile::new("s.png", None, vec![2u8]);

    let event = handle_command(
        &service,
        BackendCommand::RunTransfer {
            request_id: RequestId(41),
            content,
            style,
        },
    )
    .await;

    match event {
        UiEvent::TransferCompleted {
            request_id,
            outcome,
        } => {
            assert_eq!(request_id, RequestId(41));
            assert_eq!(outcome.expect("ok").len(), 16);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(service.transfer_count(), 1);
}

#[tokio::test]
async fn failed_style_fetch_keeps_fetch_id() {
    let service = FakeService::failing();
    let style = PredefinedStyle::new("Gone", "http://img/gone.jpg");

    let event = handle_command(
        &service,
        BackendCommand::FetchPredefinedStyle {
            fetch_id: StyleFetchId(3),
            style,
        },
    )
    .await;

    match event {
        UiEvent::PredefinedStyleFailed {
            fetch_id, reason, ..
        } => {
            assert_eq!(fetch_id, StyleFetchId(3));
            assert!(reason.contains("gone.jpg"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn save_result_writes_identical_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RESULT_FILENAME);
    let payload: Vec<u8> = (0..=255u8).collect();
    let service = FakeService::answering(Vec::new());

    let event = handle_command(
        &service,
        BackendCommand::SaveResult {
            path: path.clone(),
            file: ImageFile::new(RESULT_FILENAME, None, payload.clone()),
        },
    )
    .await;

    assert!(matches!(event, UiEvent::ResultSaved(ref saved) if saved == &path));
    assert_eq!(std::fs::read(&path).expect("read back"), payload);
}

#[tokio::test]
async fn upload_then_transfer_renders_downloadable_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let content_path = write_temp_file(&dir, "content.png", 500);
    let style_path = write_temp_file(&dir, "style.png", 300);
    let result_bytes: Vec<u8> = (0..800u32).map(|i| (i % 7) as u8).collect();
    let service = FakeService::answering(result_bytes.clone());
    let mut state = AppState::new(default_predefined_styles());

    drive(
        &mut state,
        &service,
        Msg::FilePicked {
            slot: ImageSlot::Content,
            path: content_path,
        },
    )
    .await;
    drive(
        &mut state,
        &service,
        Msg::FilePicked {
            slot: ImageSlot::Style,
            path: style_path,
        },
    )
    .await;
    drive(&mut state, &service, Msg::SubmitClicked).await;

    assert_eq!(service.transfer_count(), 1);
    let sent = service.transfers.lock().expect("lock")[0].clone();
    assert_eq!(sent.content.len(), 500);
    assert_eq!(sent.style.len(), 300);

    assert_eq!(state.request(), RequestState::Idle);
    assert!(!state.is_loading());
    let result = state.result().expect("result");
    let link = result.download_link();
    assert_eq!(link.filename, "stylized_result.jpg");
    let blob = state.blobs().resolve(&link.href).expect("live url");
    assert_eq!(&blob.bytes[..], &result_bytes[..]);
}

#[tokio::test]
async fn submit_without_images_never_reaches_the_service() {
    let service = FakeService::answering(vec![1u8]);
    let mut state = AppState::new(default_predefined_styles());

    drive(&mut state, &service, Msg::SubmitClicked).await;

    assert_eq!(service.transfer_count(), 0);
    assert_eq!(state.alert(), Some(FlowError::MissingImages));
}

#[tokio::test]
async fn service_failure_alerts_and_leaves_no_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = FakeService::failing();
    let mut state = AppState::new(default_predefined_styles());
    for (slot, name) in [(ImageSlot::Content, "c.png"), (ImageSlot::Style, "s.png")] {
        let path = write_temp_file(&dir, name, 10);
        drive(&mut state, &service, Msg::FilePicked { slot, path }).await;
    }

    drive(&mut state, &service, Msg::SubmitClicked).await;

    assert_eq!(service.transfer_count(), 1);
    assert_eq!(state.alert(), Some(FlowError::TransferFailed));
    assert!(!state.is_loading());
    assert!(state.result().is_none());
}

#[tokio::test]
async fn starry_night_preset_becomes_the_style_image() {
    let service = FakeService::answering(Vec::new());
    let mut state = AppState::new(default_predefined_styles());
    let starry = state.styles()[0].clone();

    drive(&mut state, &service, Msg::PredefinedStyleChosen(starry.clone())).await;

    assert_eq!(
        service.style_fetches.lock().expect("lock").as_slice(),
        &[starry.url.clone()]
    );
    let style = state.image(ImageSlot::Style).expect("style");
    assert_eq!(style.file.filename, "Starry Night.jpg");
    assert_eq!(&style.file.bytes[..], b"bytes-of:Starry Night");
    assert_eq!(style.preview.key(), starry.url);
}

#[tokio::test]
async fn startup_thumbnails_fill_the_gallery() {
    let service = FakeService::answering(Vec::new());
    let mut state = AppState::new(default_predefined_styles());

    drive(&mut state, &service, Msg::Started).await;

    assert_eq!(service.style_fetches.lock().expect("lock").len(), 3);
    let starry = state.styles()[0].clone();
    match state.thumbnail(&starry.url) {
        Some(StyleThumbnail::Ready(bytes)) => assert_eq!(&bytes[..], b"bytes-of:Starry Night"),
        other => panic!("unexpected thumbnail: {other:?}"),
    }
    assert!(state.image(ImageSlot::Style).is_none());
}

#[tokio::test]
async fn unreachable_thumbnails_raise_no_alert() {
    let service = FakeService::failing();
    let mut state = AppState::new(default_predefined_styles());

    drive(&mut state, &service, Msg::Started).await;

    assert!(state.alert().is_none());
    for style in default_predefined_styles() {
        assert!(matches!(
            state.thumbnail(&style.url),
            Some(StyleThumbnail::Unavailable)
        ));
    }
}
