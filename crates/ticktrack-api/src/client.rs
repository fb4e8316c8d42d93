use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{ApiError, Resource};

/// A configured connection to the tracking backend.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its pool.
/// Endpoint methods live in [`crate::tasks`] and [`crate::users`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    pub(crate) http: Client,
}

impl ApiClient {
    pub(crate) fn new(base: Url, http: Client) -> Self {
        Self { base, http }
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Build `<base>/<segments...>`, percent-encoding every segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send `request` and decode a JSON body.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        resource: Resource,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(resource, request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send `request` and discard the body.
    pub(crate) async fn execute_empty(
        &self,
        resource: Resource,
        request: RequestBuilder,
    ) -> Result<(), ApiError> {
        self.dispatch(resource, request).await?;
        Ok(())
    }

    async fn dispatch(
        &self,
        resource: Resource,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request did not reach the backend");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(resource, status.as_u16(), &body);
        warn!(
            status = status.as_u16(),
            url = %url,
            body = %body,
            error = %err,
            "backend returned an error"
        );
        Err(err)
    }
}
