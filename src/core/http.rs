//! HTTP client for the polyclinic backend
//!
//! Every request goes through [`ApiClient`], which attaches the stored bearer
//! credential, unwraps the `{ success, data, message, errorCode }` envelope
//! and normalizes failures into [`ApiError`].

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::error::{ApiError, PolyclinicError, Result};
use crate::storage::credentials::CredentialStore;
use crate::types::{Config, Envelope};

/// Longest raw body echoed back in an error message
const MAX_RAW_MESSAGE: usize = 200;

/// Shared backend client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    base_url: String,
    http: Client,
    credentials: CredentialStore,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: CredentialStore, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(ApiClientInner {
                base_url: base_url.trim_end_matches('/').to_string(),
                http,
                credentials,
            }),
        })
    }

    pub fn from_config(config: &Config, credentials: CredentialStore) -> Result<Self> {
        if config.api_url.is_empty() {
            return Err(PolyclinicError::InvalidConfig("api_url is empty".into()));
        }
        Self::new(
            &config.api_url,
            credentials,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// GET returning the envelope's `data`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let data = self.execute::<T, ()>(Method::GET, path, None, true).await?;
        require_data(data, path)
    }

    /// POST returning the envelope's `data`
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let data = self.execute::<T, B>(Method::POST, path, Some(body), true).await?;
        require_data(data, path)
    }

    /// POST without the stored credential, for the endpoint that issues one.
    /// A 401 here is an ordinary rejection and leaves the stored token alone.
    pub async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let data = self.execute::<T, B>(Method::POST, path, Some(body), false).await?;
        require_data(data, path)
    }

    /// POST whose response carries no meaningful data
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute::<IgnoredAny, B>(Method::POST, path, Some(body), true).await?;
        Ok(())
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute::<IgnoredAny, B>(Method::PUT, path, Some(body), true).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute::<IgnoredAny, ()>(Method::DELETE, path, None, true).await?;
        Ok(())
    }

    async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self.inner.http.request(method, &url);
        if authenticated {
            if let Some(token) = self.inner.credentials.load().await? {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PolyclinicError::Network(format!("{}: {}", url, e)))?;
        let status = response.status();

        if authenticated && status == StatusCode::UNAUTHORIZED {
            warn!("{} answered 401, clearing stored credential", url);
            self.inner.credentials.clear().await?;
            return Err(PolyclinicError::Unauthorized);
        }

        let text = response.text().await?;

        if !status.is_success() {
            let err = normalize_error(status.as_u16(), &text);
            warn!("{} failed: {} ({:?})", url, err.message, err.code);
            return Err(err.into());
        }

        // 204 or an empty 200
        if text.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            ApiError::new(format!("Unexpected response from {}: {}", path, e))
                .with_status(status.as_u16())
        })?;
        Ok(unwrap_envelope(envelope)?)
    }
}

fn require_data<T>(data: Option<T>, path: &str) -> Result<T> {
    data.ok_or_else(|| ApiError::new(format!("Empty response from {}", path)).into())
}

/// `data` of a successful envelope, or the envelope's error
pub fn unwrap_envelope<T>(envelope: Envelope<T>) -> std::result::Result<Option<T>, ApiError> {
    if envelope.success {
        return Ok(envelope.data);
    }
    Err(ApiError::new(
        envelope
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Request failed".into()),
    )
    .with_code(envelope.error_code))
}

/// Build the single error shape from any non-2xx body.
///
/// Message lookup order: `message`, `errorMessage`, `error`, then the raw
/// body. Code lookup: `errorCode`, then `code`.
pub fn normalize_error(status: u16, body: &str) -> ApiError {
    let json: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let field = |names: &[&str]| -> Option<String> {
        let object = json.as_ref()?.as_object()?;
        names.iter().find_map(|name| match object.get(*name)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    let message = field(&["message", "errorMessage", "error"]).unwrap_or_else(|| {
        let raw = body.trim();
        if raw.is_empty() {
            format!("HTTP {}", status)
        } else {
            raw.chars().take(MAX_RAW_MESSAGE).collect()
        }
    });

    ApiError::new(message)
        .with_status(status)
        .with_code(field(&["errorCode", "code"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Patient;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_with_token(server: &MockServer, token: Option<&str>) -> (ApiClient, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token"));
        if let Some(token) = token {
            store.save(token).await.unwrap();
        }
        let client = ApiClient::new(&server.uri(), store, Duration::from_secs(5)).unwrap();
        (client, dir)
    }

    fn patient_json() -> serde_json::Value {
        json!({
            "id": 1,
            "firstName": "Ana",
            "lastName": "Pérez",
            "identification": "0912345678",
            "birthDate": "1990-04-12"
        })
    }

    #[tokio::test]
    async fn test_success_envelope_yields_data_and_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/1"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": patient_json(),
                "message": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _dir) = client_with_token(&server, Some("abc123")).await;
        let patient: Patient = client.get("/patients/1").await.unwrap();
        assert_eq!(patient.first_name, "Ana");
    }

    #[tokio::test]
    async fn test_failed_envelope_raises_message_and_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/warehouse-requests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "data": null,
                "message": "Stock insuficiente",
                "errorCode": "INSUFFICIENT_STOCK"
            })))
            .mount(&server)
            .await;

        let (client, _dir) = client_with_token(&server, None).await;
        let err = client
            .post::<_, serde_json::Value>("/warehouse-requests", &json!({}))
            .await
            .unwrap_err();
        match err {
            PolyclinicError::Api(api) => {
                assert_eq!(api.message, "Stock insuficiente");
                assert_eq!(api.code.as_deref(), Some("INSUFFICIENT_STOCK"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_clears_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (client, _dir) = client_with_token(&server, Some("expired")).await;
        let err = client.get::<Vec<Patient>>("/patients").await.unwrap_err();
        assert!(matches!(err, PolyclinicError::Unauthorized));
        assert_eq!(client.credentials().load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_status_uses_error_message_field() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/patients/9"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "errorMessage": "El paciente tiene consultas"
            })))
            .mount(&server)
            .await;

        let (client, _dir) = client_with_token(&server, None).await;
        let err = client.delete("/patients/9").await.unwrap_err();
        let PolyclinicError::Api(api) = err else {
            panic!("expected api error");
        };
        assert_eq!(api.status, Some(409));
        assert_eq!(api.message, "El paciente tiene consultas");
    }

    #[tokio::test]
    async fn test_empty_body_is_fine_for_unit_calls() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/patients/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (client, _dir) = client_with_token(&server, None).await;
        client.put("/patients/1", &patient_json()).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_without_data_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let (client, _dir) = client_with_token(&server, None).await;
        assert!(client.get::<Patient>("/patients/2").await.is_err());
    }

    #[test]
    fn test_normalize_error_fallbacks() {
        let err = normalize_error(500, r#"{"error":"boom","code":42}"#);
        assert_eq!(err.message, "boom");
        assert_eq!(err.code.as_deref(), Some("42"));

        let err = normalize_error(502, "<html>Bad Gateway</html>");
        assert_eq!(err.message, "<html>Bad Gateway</html>");
        assert_eq!(err.code, None);

        let err = normalize_error(503, "");
        assert_eq!(err.message, "HTTP 503");
        assert_eq!(err.status, Some(503));
    }

    #[test]
    fn test_unwrap_envelope_default_message() {
        let envelope: Envelope<()> = Envelope {
            success: false,
            data: None,
            message: Some(String::new()),
            error_code: None,
        };
        assert_eq!(unwrap_envelope(envelope).unwrap_err().message, "Request failed");
    }
}
