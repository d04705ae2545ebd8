use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::protocol::FALLBACK_MEDIA_TYPE;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub fn next(self) -> Self {
                Self(self.0.wrapping_add(1))
            }
        }
    };
}

id_newtype!(RequestId);
id_newtype!(StyleFetchId);
id_newtype!(LoadId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Content,
    Style,
}

impl ImageSlot {
    pub fn label(self) -> &'static str {
        match self {
            Self::Content => "Content Image",
            Self::Style => "Style Image",
        }
    }
}

/// An image file held in memory: the payload plus the name and media type it
/// is uploaded with.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(
        filename: impl Into<String>,
        media_type: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string()),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A curated, server-hosted style image offered as a one-click choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedStyle {
    pub name: String,
    pub url: String,
}

impl PredefinedStyle {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Name of the file synthesized from the fetched style image.
    pub fn synthetic_filename(&self) -> String {
        format!("{}.jpg", self.name)
    }

    /// Wraps fetched bytes as the style image this preset stands for.
    pub fn to_image_file(
        &self,
        media_type: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> ImageFile {
        ImageFile::new(self.synthetic_filename(), media_type, bytes)
    }
}

pub fn default_predefined_styles() -> Vec<PredefinedStyle> {
    vec![
        PredefinedStyle::new(
            "Starry Night",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/e/ea/Van_Gogh_-_Starry_Night_-_Google_Art_Project.jpg/800px-Van_Gogh_-_Starry_Night_-_Google_Art_Project.jpg",
        ),
        PredefinedStyle::new(
            "The Scream",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/f/f4/The_Scream.jpg/800px-The_Scream.jpg",
        ),
        PredefinedStyle::new(
            "Monet - Water Lilies",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/9/92/Claude_Monet_-_Water_Lilies_-_Google_Art_Project.jpg/800px-Claude_Monet_-_Water_Lilies_-_Google_Art_Project.jpg",
        ),
    ]
}
