//! In-memory blobs addressed by revocable URLs, plus image decoding for previews
//! and the clipboard.

use std::{collections::HashMap, fmt, sync::Arc};

use arboard::{Clipboard, ImageData};
use shared::{domain::ImageFile, protocol::RESULT_FILENAME};

const BLOB_URL_PREFIX: &str = "blob:imaginet/";
const PREVIEW_MAX_DIMENSION: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Blob {
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl From<&ImageFile> for Blob {
    fn from(file: &ImageFile) -> Self {
        Self {
            media_type: file.media_type.clone(),
            bytes: Arc::clone(&file.bytes),
        }
    }
}

/// Owns every live blob URL. A URL resolves until it is revoked.
#[derive(Debug, Default)]
pub struct BlobStore {
    next_id: u64,
    live: HashMap<BlobUrl, Blob>,
}

impl BlobStore {
    pub fn create_url(&mut self, blob: Blob) -> BlobUrl {
        self.next_id += 1;
        let url = BlobUrl(format!("{BLOB_URL_PREFIX}{}", self.next_id));
        self.live.insert(url.clone(), blob);
        url
    }

    pub fn resolve(&self, url: &BlobUrl) -> Option<&Blob> {
        self.live.get(url)
    }

    pub fn revoke(&mut self, url: &BlobUrl) -> bool {
        self.live.remove(url).is_some()
    }

    #[cfg(test)]
    pub fn is_live(&self, url: &BlobUrl) -> bool {
        self.live.contains_key(url)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn revoke_all(&mut self) {
        self.live.clear();
    }
}

/// What an image card shows: a local blob, or a remote source used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Blob(BlobUrl),
    Remote(String),
}

impl Preview {
    pub fn key(&self) -> &str {
        match self {
            Self::Blob(url) => url.as_str(),
            Self::Remote(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: BlobUrl,
    pub filename: &'static str,
}

impl DownloadLink {
    pub fn for_result(href: BlobUrl) -> Self {
        Self {
            href,
            filename: RESULT_FILENAME,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = if dynamic.width() > PREVIEW_MAX_DIMENSION
        || dynamic.height() > PREVIEW_MAX_DIMENSION
    {
        dynamic.thumbnail(PREVIEW_MAX_DIMENSION, PREVIEW_MAX_DIMENSION)
    } else {
        dynamic
    }
    .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

pub fn copy_image_to_clipboard(bytes: &[u8]) -> Result<(), String> {
    let decoded = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let rgba = decoded.to_rgba8();
    let mut clipboard = Clipboard::new().map_err(|err| err.to_string())?;
    clipboard
        .set_image(ImageData {
            width: rgba.width() as usize,
            height: rgba.height() as usize,
            bytes: std::borrow::Cow::Owned(rgba.into_raw()),
        })
        .map_err(|err| err.to_string())
}

pub fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}
