use reqwest::multipart::{Form, Part};

use super::{ApiClient, ApiError};
use crate::models::UploadResponse;

impl ApiClient {
    /// Upload an image through the proxy.
    ///
    /// The proxy enforces the 5MB cap and the JPEG/PNG/GIF/WebP
    /// allowlist before anything reaches the upstream, so oversized or
    /// odd files fail fast with a readable `detail` message.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let url = self.url("/api/upload/image");
        Self::handle(self.http.post(url).multipart(form).send().await?).await
    }
}
