//! HTTP client for the Movieflix API, used by players to persist progress.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{AuthResponse, HistoryEntry, HistoryUpdate},
    services::playback::{resume_point, HistorySink},
};

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::InvalidInput(format!("Invalid base URL: {}", e)))?;

        Ok(Self {
            http_client: HttpClient::new(),
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Logs in and keeps the issued token for later calls
    pub async fn login(&mut self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let request = self
            .http_client
            .post(self.url(&["api", "auth", "login"])?)
            .json(&json!({ "email": email, "password": password }));

        let auth: AuthResponse = self.send(request).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    pub async fn watch_history(&self) -> AppResult<Vec<HistoryEntry>> {
        let request = self.http_client.get(self.url(&["api", "users", "history"])?);
        self.send(request).await
    }

    pub async fn record_history(&self, update: &HistoryUpdate) -> AppResult<Vec<HistoryEntry>> {
        let request = self
            .http_client
            .post(self.url(&["api", "users", "history"])?)
            .json(update);
        self.send(request).await
    }

    pub async fn remove_from_history(&self, content_id: &str) -> AppResult<Vec<HistoryEntry>> {
        let request = self
            .http_client
            .delete(self.url(&["api", "users", "history", content_id])?);
        self.send(request).await
    }

    /// Position to resume `content_id` from, if the history has a usable one
    pub async fn resume_position(&self, content_id: &str) -> AppResult<Option<f64>> {
        let history = self.watch_history().await?;
        Ok(history
            .iter()
            .find(|entry| entry.id == content_id)
            .and_then(resume_point))
    }

    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());

        tracing::debug!(status = %status, message = %message, "API call failed");

        Err(match status {
            StatusCode::BAD_REQUEST => AppError::InvalidInput(message),
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::ExternalApi(message),
        })
    }
}

#[async_trait]
impl HistorySink for ApiClient {
    async fn record(&self, update: HistoryUpdate) -> AppResult<()> {
        self.record_history(&update).await.map(|_| ())
    }

    async fn remove(&self, content_id: &str) -> AppResult<()> {
        self.remove_from_history(content_id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = ApiClient::new("http://localhost:5001").unwrap();
        let url = client.url(&["api", "users", "history", "tt 01"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/users/history/tt%2001");
    }

    #[test]
    fn test_url_building_with_prefix() {
        let client = ApiClient::new("http://example.com/movieflix/").unwrap();
        let url = client.url(&["api", "comments", "550"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/movieflix/api/comments/550");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(AppError::InvalidInput(_))
        ));
    }
}
