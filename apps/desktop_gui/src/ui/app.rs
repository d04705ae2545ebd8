use std::{
    collections::{HashMap, HashSet, VecDeque},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::{
    domain::ImageSlot,
    protocol::{IMAGE_EXTENSIONS, RESULT_FILENAME},
};
use transfer_client::Settings;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::{UiError, UiErrorContext, UiEvent},
        orchestration::dispatch_backend_command,
        reducer::{update, AppState, Msg, StyleThumbnail},
    },
    media::{copy_image_to_clipboard, decode_preview_image, human_readable_bytes, Preview},
};

const CARD_PREVIEW_MAX: egui::Vec2 = egui::vec2(280.0, 220.0);
const RESULT_PREVIEW_MAX_WIDTH: f32 = 640.0;
const THUMBNAIL_MAX: egui::Vec2 = egui::vec2(160.0, 120.0);
const SOURCE_REPOSITORY_URL: &str = "https://github.com/developerclubiitj/imaginet";

enum CachedTexture {
    Ready(TextureHandle),
    Failed(String),
}

/// Decoded textures keyed by preview url. Entries for urls that are no longer
/// shown are dropped every frame.
#[derive(Default)]
struct TextureCache {
    entries: HashMap<String, CachedTexture>,
}

impl TextureCache {
    fn get_or_load(&mut self, ctx: &egui::Context, key: &str, bytes: &[u8]) -> &CachedTexture {
        self.entries.entry(key.to_string()).or_insert_with(|| {
            match decode_preview_image(bytes) {
                Ok(image) => {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    CachedTexture::Ready(ctx.load_texture(
                        format!("preview:{key}"),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ))
                }
                Err(reason) => {
                    tracing::warn!(key, "failed to decode preview: {reason}");
                    CachedTexture::Failed(reason)
                }
            }
        })
    }

    fn retain_keys(&mut self, live: &HashSet<String>) {
        self.entries.retain(|key, _| live.contains(key));
    }
}

pub struct ImagiNetApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    state: AppState,
    textures: TextureCache,
    endpoint: String,
}

impl ImagiNetApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: Settings,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            state: AppState::new(settings.styles),
            textures: TextureCache::default(),
            endpoint: settings.endpoint,
        };
        app.dispatch(vec![Msg::Started]);
        app
    }

    fn process_ui_events(&mut self) {
        let mut msgs = Vec::new();
        while let Ok(event) = self.ui_rx.try_recv() {
            msgs.push(Msg::Backend(event));
        }
        self.dispatch(msgs);
    }

    /// Runs messages through the reducer and queues the resulting commands.
    /// A command the queue refuses is turned back into a failure message so
    /// the state never waits on work that was not started.
    fn dispatch(&mut self, msgs: Vec<Msg>) {
        let mut queue = VecDeque::from(msgs);
        while let Some(msg) = queue.pop_front() {
            for effect in update(&mut self.state, msg) {
                let mut status = String::new();
                if let Err(rejected) =
                    dispatch_backend_command(&self.cmd_tx, BackendCommand::from(effect), &mut status)
                {
                    queue.push_back(Msg::Backend(rejection_event(rejected, status)));
                }
            }
        }
    }

    fn live_preview_keys(&self) -> HashSet<String> {
        let mut keys: HashSet<String> = [ImageSlot::Content, ImageSlot::Style]
            .into_iter()
            .filter_map(|slot| self.state.image(slot))
            .map(|image| image.preview.key().to_string())
            .collect();
        if let Some(result) = self.state.result() {
            keys.insert(result.url.to_string());
        }
        for style in self.state.styles() {
            if let Some(StyleThumbnail::Ready(_)) = self.state.thumbnail(&style.url) {
                keys.insert(thumbnail_key(&style.url));
            }
        }
        keys
    }

    fn show_image_card(&mut self, ui: &mut egui::Ui, slot: ImageSlot, msgs: &mut Vec<Msg>) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(slot.label()).strong().size(18.0));
                if ui.button("Choose image…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", IMAGE_EXTENSIONS)
                        .pick_file()
                    {
                        msgs.push(Msg::FilePicked { slot, path });
                    }
                }

                let Some(image) = self.state.image(slot) else {
                    ui.weak("No image selected");
                    return;
                };
                ui.small(format!(
                    "{} · {}",
                    image.file.filename,
                    human_readable_bytes(image.file.len() as u64)
                ));

                // A remote preview is shown from the bytes fetched for it.
                let bytes = match &image.preview {
                    Preview::Blob(url) => self.state.blobs().resolve(url).map(|b| &b.bytes[..]),
                    Preview::Remote(_) => Some(&image.file.bytes[..]),
                };
                let Some(bytes) = bytes else {
                    return;
                };
                match self
                    .textures
                    .get_or_load(ui.ctx(), image.preview.key(), bytes)
                {
                    CachedTexture::Ready(texture) => {
                        let mut size = texture.size_vec2();
                        let scale = (CARD_PREVIEW_MAX.x / size.x)
                            .min(CARD_PREVIEW_MAX.y / size.y)
                            .min(1.0);
                        size *= scale;
                        ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                    }
                    CachedTexture::Failed(reason) => {
                        ui.colored_label(
                            ui.visuals().error_fg_color,
                            format!("Couldn't preview image: {reason}"),
                        );
                    }
                }
            });
        });
    }

    fn show_predefined_styles(&mut self, ui: &mut egui::Ui, msgs: &mut Vec<Msg>) {
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("Or choose a predefined style").size(16.0));
        });
        ui.horizontal_wrapped(|ui| {
            for style in self.state.styles() {
                let clicked = ui
                    .vertical(|ui| {
                        let texture = match self.state.thumbnail(&style.url) {
                            Some(StyleThumbnail::Ready(bytes)) => match self.textures.get_or_load(
                                ui.ctx(),
                                &thumbnail_key(&style.url),
                                bytes,
                            ) {
                                CachedTexture::Ready(texture) => Some(texture),
                                CachedTexture::Failed(_) => None,
                            },
                            _ => None,
                        };
                        let response = match texture {
                            Some(texture) => {
                                let mut size = texture.size_vec2();
                                size *= (THUMBNAIL_MAX.x / size.x)
                                    .min(THUMBNAIL_MAX.y / size.y)
                                    .min(1.0);
                                ui.add(egui::Button::image(
                                    egui::Image::new(texture).fit_to_exact_size(size),
                                ))
                            }
                            None => ui.add_sized(
                                THUMBNAIL_MAX,
                                egui::Button::new(style.name.as_str()),
                            ),
                        };
                        ui.small(style.name.as_str());
                        response.on_hover_text(style.url.as_str()).clicked()
                    })
                    .inner;
                if clicked {
                    msgs.push(Msg::PredefinedStyleChosen(style.clone()));
                }
            }
            if self.state.is_fetching_style() {
                ui.spinner();
            }
        });
    }

    fn show_action(&self, ui: &mut egui::Ui, msgs: &mut Vec<Msg>) {
        let loading = self.state.is_loading();
        ui.vertical_centered(|ui| {
            let label = if loading {
                "Transferring Style..."
            } else {
                "Create Stylized Art"
            };
            let button = egui::Button::new(egui::RichText::new(label).size(18.0));
            if ui.add_enabled(!loading, button).clicked() {
                msgs.push(Msg::SubmitClicked);
            }
            if loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Applying artistic magic... ✨");
                });
            }
        });
    }

    fn show_result(&mut self, ui: &mut egui::Ui, msgs: &mut Vec<Msg>) {
        let Some(result) = self.state.result() else {
            return;
        };
        let link = result.download_link();
        let Some(blob) = self.state.blobs().resolve(&link.href) else {
            return;
        };

        ui.separator();
        ui.vertical_centered(|ui| {
            ui.heading("🌟 Stylized Result");
            match self.textures.get_or_load(ui.ctx(), link.href.as_str(), &blob.bytes) {
                CachedTexture::Ready(texture) => {
                    let mut size = texture.size_vec2();
                    let width = ui.available_width().min(RESULT_PREVIEW_MAX_WIDTH);
                    if size.x > width {
                        size *= width / size.x;
                    }
                    ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                }
                CachedTexture::Failed(reason) => {
                    ui.colored_label(
                        ui.visuals().error_fg_color,
                        format!("The service returned an image that can't be shown: {reason}"),
                    );
                }
            }
            ui.horizontal(|ui| {
                if ui.button("Download Image").clicked() {
                    let mut dialog = rfd::FileDialog::new().set_file_name(link.filename);
                    if let Some(dir) = dirs::download_dir() {
                        dialog = dialog.set_directory(dir);
                    }
                    if let Some(path) = dialog.save_file() {
                        msgs.push(Msg::SaveResultTo(path));
                    }
                }
                if ui.button("Copy to clipboard").clicked() {
                    msgs.push(Msg::ResultCopied(copy_image_to_clipboard(&blob.bytes)));
                }
            });
            ui.small(format!(
                "{RESULT_FILENAME} · {} · {}",
                blob.media_type,
                human_readable_bytes(blob.bytes.len() as u64)
            ));
        });
    }

    fn show_alert(&self, ctx: &egui::Context, msgs: &mut Vec<Msg>) {
        let Some(alert) = self.state.alert() else {
            return;
        };
        egui::Window::new(alert.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(alert.to_string());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    msgs.push(Msg::AlertDismissed);
                }
            });
    }
}

fn thumbnail_key(url: &str) -> String {
    format!("thumbnail:{url}")
}

fn rejection_event(rejected: BackendCommand, status: String) -> UiEvent {
    match rejected {
        BackendCommand::RunTransfer { request_id, .. } => UiEvent::TransferCompleted {
            request_id,
            outcome: Err(status),
        },
        BackendCommand::FetchPredefinedStyle { fetch_id, style } => {
            UiEvent::PredefinedStyleFailed {
                fetch_id,
                style,
                reason: status,
            }
        }
        BackendCommand::FetchStyleThumbnail { style } => UiEvent::StyleThumbnailFailed {
            url: style.url,
            reason: status,
        },
        BackendCommand::LoadLocalImage { slot, load_id, .. } => UiEvent::ImageLoadFailed {
            slot,
            load_id,
            error: UiError::from_message(UiErrorContext::LoadImage, status),
        },
        BackendCommand::SaveResult { .. } => {
            UiEvent::Error(UiError::from_message(UiErrorContext::SaveResult, status))
        }
    }
}

impl eframe::App for ImagiNetApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let mut msgs = Vec::new();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.state.status());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(format!("Service: {}", self.endpoint));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(egui::RichText::new("ImagiNet 🎨").size(36.0).strong());
                    ui.label(
                        "Upload a photo, pick a painting style, and let ImagiNet turn it into art.",
                    );
                });
                ui.add_space(16.0);

                ui.columns(2, |columns| {
                    self.show_image_card(&mut columns[0], ImageSlot::Content, &mut msgs);
                    self.show_image_card(&mut columns[1], ImageSlot::Style, &mut msgs);
                });
                ui.add_space(12.0);

                self.show_predefined_styles(ui, &mut msgs);
                ui.add_space(16.0);

                self.show_action(ui, &mut msgs);
                self.show_result(ui, &mut msgs);

                ui.add_space(24.0);
                ui.vertical_centered(|ui| {
                    ui.weak("© 2025 ImagiNet · style transfer client");
                    ui.hyperlink_to("View Source on GitHub", SOURCE_REPOSITORY_URL);
                });
            });
        });

        self.show_alert(ctx, &mut msgs);

        self.dispatch(msgs);
        let live = self.live_preview_keys();
        self.textures.retain_keys(&live);

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for ImagiNetApp {
    fn drop(&mut self) {
        self.dispatch(vec![Msg::Shutdown]);
    }
}
