//! Command orchestration from reducer effects to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::{backend_bridge::commands::BackendCommand, controller::reducer::Effect};

impl From<Effect> for BackendCommand {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::ReadLocalFile {
                slot,
                load_id,
                path,
            } => Self::LoadLocalImage {
                slot,
                load_id,
                path,
            },
            Effect::FetchPredefinedStyle { fetch_id, style } => {
                Self::FetchPredefinedStyle { fetch_id, style }
            }
            Effect::FetchStyleThumbnail { style } => Self::FetchStyleThumbnail { style },
            Effect::RunTransfer {
                request_id,
                content,
                style,
            } => Self::RunTransfer {
                request_id,
                content,
                style,
            },
            Effect::SaveResult { path, file } => Self::SaveResult { path, file },
        }
    }
}

/// Queues `cmd`; on failure explains why in `status` and returns the command.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> Result<(), BackendCommand> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(cmd)) => {
            *status = "UI command queue is full; please retry".to_string();
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
            Err(cmd)
        }
        Err(TrySendError::Disconnected(cmd)) => {
            *status =
                "Backend worker disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            tracing::error!(command = cmd_name, "ui->backend command queue disconnected");
            Err(cmd)
        }
    }
}
