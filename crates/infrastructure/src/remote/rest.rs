use std::time::Duration;

use domain::DomainError;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Per-request timeout used by the collaborator clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin JSON client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct RestClient {
    service: &'static str,
    base: Url,
    client: reqwest::Client,
}

impl RestClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let base = Url::parse(base_url).map_err(|e| {
            DomainError::invalid_argument(format!("{service}: invalid base url {base_url}: {e}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(DomainError::invalid_argument(format!(
                "{service}: {base_url} cannot be used as a base url"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::Internal(format!("{service}: cannot build http client: {e}"))
            })?;
        Ok(Self {
            service,
            base,
            client,
        })
    }

    /// Base URL joined with percent-encoded path segments.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.url(segments))
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, DomainError> {
        let response = self.send(self.request(Method::GET, segments)).await?;
        self.decode(response).await
    }

    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T, DomainError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::POST, segments).json(body))
            .await?;
        self.decode(response).await
    }

    /// POST whose response body is ignored.
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), DomainError> {
        self.send(self.request(Method::POST, segments).json(body))
            .await
            .map(|_| ())
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), DomainError> {
        self.send(self.request(Method::PUT, segments).json(body))
            .await
            .map(|_| ())
    }

    pub async fn patch<B, T>(&self, segments: &[&str], body: &B) -> Result<T, DomainError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::PATCH, segments).json(body))
            .await?;
        self.decode(response).await
    }

    /// Idempotent delete: a missing entity counts as deleted.
    pub async fn delete(&self, segments: &[&str]) -> Result<(), DomainError> {
        match self.send(self.request(Method::DELETE, segments)).await {
            Ok(_) => Ok(()),
            Err(DomainError::NotFound(msg)) => {
                debug!(service = self.service, %msg, "Delete of missing entity treated as success");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DomainError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(self.status_error(status, body))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, DomainError> {
        response.json::<T>().await.map_err(|e| {
            DomainError::Internal(format!("{}: cannot decode response: {e}", self.service))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> DomainError {
        warn!(service = self.service, error = %e, "Collaborator request failed");
        if e.is_builder() {
            DomainError::Internal(format!("{}: {e}", self.service))
        } else {
            DomainError::unavailable(format!("{}: {e}", self.service))
        }
    }

    fn status_error(&self, status: StatusCode, body: String) -> DomainError {
        let message = if body.is_empty() {
            format!("{}: {status}", self.service)
        } else {
            format!("{}: {body}", self.service)
        };
        match status {
            StatusCode::BAD_REQUEST => DomainError::InvalidArgument(message),
            StatusCode::UNAUTHORIZED => DomainError::Unauthenticated(message),
            StatusCode::FORBIDDEN => DomainError::PermissionDenied(message),
            StatusCode::NOT_FOUND => DomainError::NotFound(message),
            StatusCode::PRECONDITION_FAILED => DomainError::FailedPrecondition(message),
            StatusCode::NOT_IMPLEMENTED => DomainError::Unimplemented(message),
            s if s.is_server_error() => DomainError::Unavailable(message),
            _ => DomainError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ErrorKind;

    #[test]
    fn test_url_segments_are_encoded() {
        let client =
            RestClient::new("catalog", "http://catalog:6020/api/", DEFAULT_TIMEOUT).unwrap();
        let url = client.url(&["organizations", "org 1", "device-groups", "a/b"]);
        assert_eq!(
            url.as_str(),
            "http://catalog:6020/api/organizations/org%201/device-groups/a%2Fb"
        );
    }

    #[test]
    fn test_status_mapping() {
        let client = RestClient::new("authx", "http://authx:8810", DEFAULT_TIMEOUT).unwrap();
        let cases = [
            (StatusCode::BAD_REQUEST, ErrorKind::InvalidArgument),
            (StatusCode::UNAUTHORIZED, ErrorKind::Unauthenticated),
            (StatusCode::FORBIDDEN, ErrorKind::PermissionDenied),
            (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (StatusCode::PRECONDITION_FAILED, ErrorKind::FailedPrecondition),
            (StatusCode::NOT_IMPLEMENTED, ErrorKind::Unimplemented),
            (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Unavailable),
            (StatusCode::BAD_GATEWAY, ErrorKind::Unavailable),
            (StatusCode::CONFLICT, ErrorKind::Internal),
        ];
        for (status, expected) in cases {
            let err = client.status_error(status, "nope".to_string());
            assert_eq!(err.kind(), expected, "{status}");
            assert!(err.to_string().contains("authx: nope"));
        }
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(RestClient::new("authx", "not a url", DEFAULT_TIMEOUT).is_err());
        assert!(RestClient::new("authx", "mailto:ops@example.com", DEFAULT_TIMEOUT).is_err());
    }
}
