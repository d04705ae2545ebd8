//! Single state record for the upload-and-transform screen and the one
//! function allowed to change it.
//!
//! The UI turns user input into [`Msg`]s, backend results arrive as
//! [`UiEvent`]s wrapped in [`Msg::Backend`], and [`update`] answers with the
//! [`Effect`]s the backend worker has to run. Nothing else mutates [`AppState`].

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use shared::{
    domain::{ImageFile, ImageSlot, LoadId, PredefinedStyle, RequestId, StyleFetchId},
    error::FlowError,
};
use tracing::{debug, error, info, warn};

use crate::{
    controller::events::{UiError, UiErrorContext, UiEvent},
    media::{Blob, BlobStore, BlobUrl, DownloadLink, Preview},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    InFlight { request_id: RequestId },
}

/// The most recent choice made for a slot that has not arrived yet. Only the
/// result belonging to it is applied; older loads and fetches are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingChoice {
    LocalFile(LoadId),
    Preset(StyleFetchId),
}

/// Gallery picture of a predefined style, keyed by the style's url.
#[derive(Debug, Clone)]
pub enum StyleThumbnail {
    Loading,
    Ready(Arc<[u8]>),
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub file: ImageFile,
    pub preview: Preview,
}

#[derive(Debug, Clone)]
pub struct TransferResult {
    pub file: ImageFile,
    pub url: BlobUrl,
}

impl TransferResult {
    pub fn download_link(&self) -> DownloadLink {
        DownloadLink::for_result(self.url.clone())
    }
}

#[derive(Debug)]
pub enum Msg {
    Started,
    FilePicked { slot: ImageSlot, path: PathBuf },
    PredefinedStyleChosen(PredefinedStyle),
    SubmitClicked,
    SaveResultTo(PathBuf),
    ResultCopied(Result<(), String>),
    AlertDismissed,
    Backend(UiEvent),
    Shutdown,
}

#[derive(Debug)]
pub enum Effect {
    ReadLocalFile {
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

#[derive(Debug)]
pub struct AppState {
    content: Option<SelectedImage>,
    style: Option<SelectedImage>,
    result: Option<TransferResult>,
    request: RequestState,
    alert: Option<FlowError>,
    status: String,
    styles: Vec<PredefinedStyle>,
    thumbnails: HashMap<String, StyleThumbnail>,
    pending_content: Option<PendingChoice>,
    pending_style: Option<PendingChoice>,
    last_request_id: RequestId,
    last_style_fetch_id: StyleFetchId,
    last_load_id: LoadId,
    blobs: BlobStore,
}

impl AppState {
    pub fn new(styles: Vec<PredefinedStyle>) -> Self {
        Self {
            content: None,
            style: None,
            result: None,
            request: RequestState::Idle,
            alert: None,
            status: "Ready".to_string(),
            styles,
            thumbnails: HashMap::new(),
            pending_content: None,
            pending_style: None,
            last_request_id: RequestId(0),
            last_style_fetch_id: StyleFetchId(0),
            last_load_id: LoadId(0),
            blobs: BlobStore::default(),
        }
    }

    pub fn image(&self, slot: ImageSlot) -> Option<&SelectedImage> {
        match slot {
            ImageSlot::Content => self.content.as_ref(),
            ImageSlot::Style => self.style.as_ref(),
        }
    }

    pub fn result(&self) -> Option<&TransferResult> {
        self.result.as_ref()
    }

    pub fn request(&self) -> RequestState {
        self.request
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.request, RequestState::InFlight { .. })
    }

    pub fn alert(&self) -> Option<FlowError> {
        self.alert
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn styles(&self) -> &[PredefinedStyle] {
        &self.styles
    }

    pub fn is_fetching_style(&self) -> bool {
        matches!(self.pending_style, Some(PendingChoice::Preset(_)))
    }

    pub fn thumbnail(&self, url: &str) -> Option<&StyleThumbnail> {
        self.thumbnails.get(url)
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    fn pending_mut(&mut self, slot: ImageSlot) -> &mut Option<PendingChoice> {
        match slot {
            ImageSlot::Content => &mut self.pending_content,
            ImageSlot::Style => &mut self.pending_style,
        }
    }

    /// Clears the pending choice for `slot` if it is `choice`; reports whether it was.
    fn settle(&mut self, slot: ImageSlot, choice: PendingChoice) -> bool {
        let pending = self.pending_mut(slot);
        if *pending != Some(choice) {
            return false;
        }
        *pending = None;
        true
    }

    fn slot_mut(&mut self, slot: ImageSlot) -> &mut Option<SelectedImage> {
        match slot {
            ImageSlot::Content => &mut self.content,
            ImageSlot::Style => &mut self.style,
        }
    }

    /// Stores `image` in `slot`, revoking the blob URL of whatever it replaces.
    fn replace_image(&mut self, slot: ImageSlot, image: SelectedImage) {
        let previous = self.slot_mut(slot).replace(image);
        if let Some(SelectedImage {
            preview: Preview::Blob(url),
            ..
        }) = previous
        {
            self.blobs.revoke(&url);
        }
    }

    fn replace_result(&mut self, file: ImageFile) {
        let url = self.blobs.create_url(Blob::from(&file));
        let previous = self.result.replace(TransferResult { file, url });
        if let Some(previous) = previous {
            self.blobs.revoke(&previous.url);
        }
    }

    fn raise(&mut self, alert: FlowError) {
        self.status = alert.to_string();
        self.alert = Some(alert);
    }
}

pub fn update(state: &mut AppState, msg: Msg) -> Vec<Effect> {
    match msg {
        Msg::Started => {
            let mut effects = Vec::new();
            for style in &state.styles {
                if state.thumbnails.contains_key(&style.url) {
                    continue;
                }
                state
                    .thumbnails
                    .insert(style.url.clone(), StyleThumbnail::Loading);
                effects.push(Effect::FetchStyleThumbnail {
                    style: style.clone(),
                });
            }
            effects
        }
        Msg::FilePicked { slot, path } => {
            let load_id = state.last_load_id.next();
            state.last_load_id = load_id;
            *state.pending_mut(slot) = Some(PendingChoice::LocalFile(load_id));
            state.status = format!("Loading {}...", path.display());
            vec![Effect::ReadLocalFile {
                slot,
                load_id,
                path,
            }]
        }
        Msg::PredefinedStyleChosen(style) => {
            let fetch_id = state.last_style_fetch_id.next();
            state.last_style_fetch_id = fetch_id;
            state.pending_style = Some(PendingChoice::Preset(fetch_id));
            state.status = format!("Fetching style '{}'...", style.name);
            vec![Effect::FetchPredefinedStyle { fetch_id, style }]
        }
        Msg::SubmitClicked => submit(state),
        Msg::SaveResultTo(path) => match &state.result {
            Some(result) => vec![Effect::SaveResult {
                path,
                file: result.file.clone(),
            }],
            None => {
                debug!("save requested without a result; ignoring");
                Vec::new()
            }
        },
        Msg::ResultCopied(outcome) => {
            match outcome {
                Ok(()) => state.status = "Copied result to clipboard".to_string(),
                Err(err) => {
                    let err = UiError::from_message(UiErrorContext::Clipboard, err);
                    warn!("clipboard copy failed: {}", err.message());
                    state.status = err.status_line();
                }
            }
            Vec::new()
        }
        Msg::AlertDismissed => {
            state.alert = None;
            Vec::new()
        }
        Msg::Backend(event) => {
            apply_backend_event(state, event);
            Vec::new()
        }
        Msg::Shutdown => {
            let released = state.blobs.live_count();
            state.blobs.revoke_all();
            debug!(released, "released blob urls on shutdown");
            Vec::new()
        }
    }
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if let RequestState::InFlight { request_id } = state.request {
        debug!(request_id = request_id.0, "submit ignored while a transfer is in flight");
        return Vec::new();
    }
    let selected = state
        .content
        .as_ref()
        .zip(state.style.as_ref())
        .map(|(content, style)| (content.file.clone(), style.file.clone()));
    let Some((content, style)) = selected else {
        state.raise(FlowError::MissingImages);
        return Vec::new();
    };

    let request_id = state.last_request_id.next();
    state.last_request_id = request_id;
    state.request = RequestState::InFlight { request_id };
    state.status = "Transferring style...".to_string();
    info!(
        request_id = request_id.0,
        content = %content.filename,
        style = %style.filename,
        "submitting style transfer"
    );
    vec![Effect::RunTransfer {
        request_id,
        content,
        style,
    }]
}

fn apply_backend_event(state: &mut AppState, event: UiEvent) {
    match event {
        UiEvent::Info(message) => state.status = message,
        UiEvent::Error(err) => {
            error!(context = ?err.context(), "{}", err.message());
            state.status = err.status_line();
        }
        UiEvent::ImageLoaded {
            slot,
            load_id,
            file,
        } => {
            if !state.settle(slot, PendingChoice::LocalFile(load_id)) {
                debug!(slot = ?slot, load_id = load_id.0, "dropping superseded local image");
                return;
            }
            let url = state.blobs.create_url(Blob::from(&file));
            state.status = format!("{} set to {}", slot.label(), file.filename);
            state.replace_image(
                slot,
                SelectedImage {
                    file,
                    preview: Preview::Blob(url),
                },
            );
        }
        UiEvent::ImageLoadFailed {
            slot,
            load_id,
            error,
        } => {
            if !state.settle(slot, PendingChoice::LocalFile(load_id)) {
                debug!(slot = ?slot, load_id = load_id.0, "dropping superseded load failure");
                return;
            }
            warn!(slot = ?slot, "failed to load image: {}", error.message());
            state.status = error.status_line();
        }
        UiEvent::PredefinedStyleLoaded {
            fetch_id,
            style,
            file,
        } => {
            if !state.settle(ImageSlot::Style, PendingChoice::Preset(fetch_id)) {
                debug!(fetch_id = fetch_id.0, name = %style.name, "dropping superseded style fetch");
                return;
            }
            state.status = format!("Style Image set to {}", style.name);
            state.replace_image(
                ImageSlot::Style,
                SelectedImage {
                    file,
                    preview: Preview::Remote(style.url),
                },
            );
        }
        UiEvent::PredefinedStyleFailed {
            fetch_id,
            style,
            reason,
        } => {
            if !state.settle(ImageSlot::Style, PendingChoice::Preset(fetch_id)) {
                debug!(fetch_id = fetch_id.0, name = %style.name, "dropping superseded style failure");
                return;
            }
            let err = UiError::from_message(UiErrorContext::PredefinedStyle, reason);
            error!(
                name = %style.name,
                url = %style.url,
                category = ?err.category(),
                "predefined style fetch failed: {}",
                err.message()
            );
            state.raise(FlowError::PredefinedStyleUnavailable);
        }
        UiEvent::StyleThumbnailLoaded { url, file } => {
            debug!(url = %url, bytes = file.len(), "style thumbnail loaded");
            state
                .thumbnails
                .insert(url, StyleThumbnail::Ready(file.bytes));
        }
        // The gallery falls back to a text button; picking the style still works.
        UiEvent::StyleThumbnailFailed { url, reason } => {
            warn!(url = %url, "style thumbnail unavailable: {reason}");
            state.thumbnails.insert(url, StyleThumbnail::Unavailable);
        }
        UiEvent::TransferCompleted {
            request_id,
            outcome,
        } => {
            if state.request != (RequestState::InFlight { request_id }) {
                warn!(request_id = request_id.0, "dropping response for a stale transfer request");
                return;
            }
            state.request = RequestState::Idle;
            match outcome {
                Ok(file) => {
                    info!(request_id = request_id.0, bytes = file.len(), "style transfer finished");
                    state.status = format!("Stylized result ready ({} bytes)", file.len());
                    state.replace_result(file);
                }
                Err(reason) => {
                    let err = UiError::from_message(UiErrorContext::Transfer, reason);
                    error!(
                        request_id = request_id.0,
                        category = ?err.category(),
                        "style transfer failed: {}",
                        err.message()
                    );
                    state.raise(FlowError::TransferFailed);
                }
            }
        }
        UiEvent::ResultSaved(path) => {
            state.status = format!("Saved image to {}", path.display());
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
