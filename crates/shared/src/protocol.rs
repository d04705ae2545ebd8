//! Wire-level names shared by the clients and any test doubles of the service.

/// Path segment appended to the configured endpoint base URL.
pub const STYLE_TRANSFER_ROUTE: &str = "style-transfer";

pub const CONTENT_IMAGE_FIELD: &str = "content_image";
pub const STYLE_IMAGE_FIELD: &str = "style_image";

/// Suggested file name for the downloaded result.
pub const RESULT_FILENAME: &str = "stylized_result.jpg";

pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Extensions offered by the image file picker.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
