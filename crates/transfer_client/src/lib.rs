use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{ImageFile, PredefinedStyle},
    protocol::{CONTENT_IMAGE_FIELD, RESULT_FILENAME, STYLE_IMAGE_FIELD, STYLE_TRANSFER_ROUTE},
};
use tracing::{info, warn};
use url::Url;

pub mod config;
pub mod error;

pub use config::{load_settings, Settings, SettingsError, SettingsOverrides};
pub use error::ClientError;

const ERROR_BODY_PREVIEW_LEN: usize = 512;

/// Sent with every request; image hosts such as Wikimedia refuse anonymous clients.
pub const USER_AGENT: &str = concat!("imaginet/", env!("CARGO_PKG_VERSION"));

/// Remote operations the front-ends need: one style transfer and the download
/// of a predefined style image.
#[async_trait]
pub trait StyleTransferService: Send + Sync {
    async fn transfer(
        &self,
        content: &ImageFile,
        style: &ImageFile,
    ) -> Result<ImageFile, ClientError>;
    async fn fetch_predefined_style(
        &self,
        style: &PredefinedStyle,
    ) -> Result<ImageFile, ClientError>;
}

/// Resolves `<base>/style-transfer`, keeping any path prefix of the base url.
pub fn style_transfer_url(endpoint: &str) -> Result<Url, ClientError> {
    let invalid = |source| ClientError::InvalidEndpoint {
        url: endpoint.to_string(),
        source,
    };
    let mut base = Url::parse(endpoint.trim()).map_err(invalid)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(STYLE_TRANSFER_ROUTE).map_err(invalid)
}

pub struct HttpStyleTransferClient {
    http: Client,
    transfer_url: Url,
}

impl HttpStyleTransferClient {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        Self::with_timeout(endpoint, None)
    }

    pub fn with_timeout(endpoint: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build().map_err(ClientError::Build)?,
            transfer_url: style_transfer_url(endpoint)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::with_timeout(&settings.endpoint, settings.timeout)
    }

    pub fn transfer_url(&self) -> &Url {
        &self.transfer_url
    }
}

#[async_trait]
impl StyleTransferService for HttpStyleTransferClient {
    async fn transfer(
        &self,
        content: &ImageFile,
        style: &ImageFile,
    ) -> Result<ImageFile, ClientError> {
        let url = self.transfer_url.as_str();
        info!(
            url,
            content_bytes = content.len(),
            style_bytes = style.len(),
            "style transfer: posting images"
        );
        let form = Form::new()
            .part(CONTENT_IMAGE_FIELD, image_part(content))
            .part(STYLE_IMAGE_FIELD, image_part(style));

        let response = self
            .http
            .post(self.transfer_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| ClientError::transport(url, err))?;
        let (media_type, bytes) = read_image_body(url, response).await?;
        if bytes.is_empty() {
            return Err(ClientError::EmptyBody {
                url: url.to_string(),
            });
        }

        info!(url, result_bytes = bytes.len(), "style transfer: result received");
        Ok(ImageFile::new(RESULT_FILENAME, media_type, bytes))
    }

    async fn fetch_predefined_style(
        &self,
        style: &PredefinedStyle,
    ) -> Result<ImageFile, ClientError> {
        info!(name = %style.name, url = %style.url, "predefined style: fetching");
        let response = self
            .http
            .get(&style.url)
            .send()
            .await
            .map_err(|err| ClientError::transport(&style.url, err))?;
        let (media_type, bytes) = read_image_body(&style.url, response).await?;
        info!(
            name = %style.name,
            bytes = bytes.len(),
            "predefined style: fetched"
        );
        Ok(style.to_image_file(media_type, bytes))
    }
}

fn image_part(file: &ImageFile) -> Part {
    let part = || Part::bytes(file.bytes.to_vec()).file_name(file.filename.clone());
    match part().mime_str(&file.media_type) {
        Ok(part) => part,
        Err(err) => {
            warn!(
                filename = %file.filename,
                media_type = %file.media_type,
                "unusable media type, uploading without one: {err}"
            );
            part()
        }
    }
}

async fn read_image_body(
    url: &str,
    response: Response,
) -> Result<(Option<String>, Vec<u8>), ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            url: url.to_string(),
            status,
            body: truncate_text(&body, ERROR_BODY_PREVIEW_LEN),
        });
    }

    let media_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ClientError::transport(url, err))?;
    Ok((media_type, bytes.to_vec()))
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
