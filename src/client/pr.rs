use super::{ApiClient, ApiError};
use crate::models::{PrBubble, PrBubbleCreate, PrBubbleUpdate, PrListResponse, PrStats, PrStatus};

/// Filters for [`ApiClient::list_pr`]. Unset fields are left off the
/// query string so the upstream applies its own defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrListParams {
    pub status: Option<PrStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PrListParams {
    fn to_query(self) -> Option<String> {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(status) = self.status {
            serializer.append_pair("status", status.as_str());
        }
        if let Some(page) = self.page {
            serializer.append_pair("page", &page.to_string());
        }
        if let Some(limit) = self.limit {
            serializer.append_pair("limit", &limit.to_string());
        }
        let encoded = serializer.finish();
        (!encoded.is_empty()).then_some(encoded)
    }
}

impl ApiClient {
    pub async fn list_pr(&self, params: PrListParams) -> Result<PrListResponse, ApiError> {
        let mut url = self.url("/api/pr");
        if let Some(query) = params.to_query() {
            url = format!("{}?{}", url, query);
        }
        Self::handle(self.http.get(url).send().await?).await
    }

    pub async fn get_pr(&self, id: &str) -> Result<PrBubble, ApiError> {
        let url = self.url(&format!("/api/pr/{}", id));
        Self::handle(self.http.get(url).send().await?).await
    }

    pub async fn create_pr(&self, data: &PrBubbleCreate) -> Result<PrBubble, ApiError> {
        let url = self.url("/api/pr");
        Self::handle(self.http.post(url).json(data).send().await?).await
    }

    pub async fn update_pr(&self, id: &str, data: &PrBubbleUpdate) -> Result<PrBubble, ApiError> {
        let url = self.url(&format!("/api/pr/{}", id));
        Self::handle(self.http.put(url).json(data).send().await?).await
    }

    /// Delete a bubble. Resolves to unit, the proxy answers 204.
    pub async fn delete_pr(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/pr/{}", id));
        let response = self.http.delete(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(Self::api_error(status, &body));
        }
        Ok(())
    }

    /// Clone an existing bubble into a fresh draft.
    pub async fn duplicate_pr(&self, id: &str) -> Result<PrBubble, ApiError> {
        let url = self.url(&format!("/api/pr/{}/duplicate", id));
        Self::handle(self.http.post(url).send().await?).await
    }

    pub async fn pr_stats(&self, id: &str) -> Result<PrStats, ApiError> {
        let url = self.url(&format!("/api/pr/{}/stats", id));
        Self::handle(self.http.get(url).send().await?).await
    }
}
