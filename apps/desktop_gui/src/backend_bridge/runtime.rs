//! Runtime bridge between the UI command queue and the async backend worker.

use std::{path::Path, sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use shared::domain::ImageFile;
use transfer_client::StyleTransferService;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorContext, UiEvent},
};

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    service: Arc<dyn StyleTransferService>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            tracing::info!("backend worker ready");
            let _ = ui_tx.try_send(UiEvent::Info("Ready".to_string()));
            while let Ok(cmd) = cmd_rx.recv() {
                let service = Arc::clone(&service);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let cmd_name = cmd.name();
                    let event = handle_command(service.as_ref(), cmd).await;
                    if ui_tx.send(event).is_err() {
                        tracing::warn!(command = cmd_name, "ui event queue closed; dropping result");
                    }
                });
            }
            tracing::info!("backend worker stopping: command queue closed");
        });
    });
}

/// Runs one command to completion and describes the outcome for the UI.
pub async fn handle_command(service: &dyn StyleTransferService, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::LoadLocalImage {
            slot,
            load_id,
            path,
        } => match read_image_file(&path).await {
            Ok(file) => UiEvent::ImageLoaded {
                slot,
                load_id,
                file,
            },
            Err(message) => UiEvent::ImageLoadFailed {
                slot,
                load_id,
                error: UiError::from_message(UiErrorContext::LoadImage, message),
            },
        },
        BackendCommand::FetchPredefinedStyle { fetch_id, style } => {
            match service.fetch_predefined_style(&style).await {
                Ok(file) => UiEvent::PredefinedStyleLoaded {
                    fetch_id,
                    style,
                    file,
                },
                Err(err) => UiEvent::PredefinedStyleFailed {
                    fetch_id,
                    style,
                    reason: err.to_string(),
                },
            }
        }
        BackendCommand::FetchStyleThumbnail { style } => {
            match service.fetch_predefined_style(&style).await {
                Ok(file) => UiEvent::StyleThumbnailLoaded {
                    url: style.url,
                    file,
                },
                Err(err) => UiEvent::StyleThumbnailFailed {
                    url: style.url,
                    reason: err.to_string(),
                },
            }
        }
        BackendCommand::RunTransfer {
            request_id,
            content,
            style,
        } => UiEvent::TransferCompleted {
            request_id,
            outcome: service
                .transfer(&content, &style)
                .await
                .map_err(|err| err.to_string()),
        },
        BackendCommand::SaveResult { path, file } => {
            match tokio::fs::write(&path, &file.bytes[..]).await {
                Ok(()) => UiEvent::ResultSaved(path),
                Err(err) => UiEvent::Error(UiError::from_message(
                    UiErrorContext::SaveResult,
                    format!("failed to write '{}': {err}", path.display()),
                )),
            }
        }
    }
}

async fn read_image_file(path: &Path) -> Result<ImageFile, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| format!("failed to read '{}': {err}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let media_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(ImageFile::new(filename, media_type, bytes))
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
