//! Login, logout and the current user's permissions

use std::collections::HashSet;

use log::info;
use serde::{Deserialize, Serialize};

use super::http::ApiClient;
use crate::error::{PolyclinicError, Result};
use crate::types::Staff;

/// Actions the menu gates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewPatients,
    ManageDerivations,
    ViewStock,
    RequestStock,
    ApproveRequests,
}

impl Permission {
    /// Name the backend uses in the `permissions` list
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ViewPatients => "patients:read",
            Self::ManageDerivations => "derivations:write",
            Self::ViewStock => "stock:read",
            Self::RequestStock => "warehouse:request",
            Self::ApproveRequests => "warehouse:approve",
        }
    }
}

/// Opaque check consumed by screens; the policy lives server-side
pub trait PermissionCheck {
    fn allows(&self, permission: Permission) -> bool;
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user: Staff,
    permissions: HashSet<String>,
}

impl Session {
    pub fn new(user: Staff, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            user,
            permissions: permissions.into_iter().collect(),
        }
    }
}

impl PermissionCheck for Session {
    fn allows(&self, permission: Permission) -> bool {
        self.permissions.contains(permission.as_str())
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginData {
    token: String,
    user: Staff,
}

#[derive(Deserialize)]
struct MeData {
    user: Staff,
    #[serde(default)]
    permissions: Vec<String>,
}

/// Exchange credentials for a token and store it
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<Staff> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(PolyclinicError::validation("Username and password are required"));
    }

    let data: LoginData = client
        .post_anonymous(
            "auth/login",
            &Credentials {
                username: username.trim(),
                password,
            },
        )
        .await
        .map_err(|e| match e {
            PolyclinicError::Api(api) if api.status == Some(401) => {
                PolyclinicError::validation("Invalid username or password")
            }
            other => other,
        })?;
    client.credentials().save(&data.token).await?;
    info!("logged in as {}", data.user.username);
    Ok(data.user)
}

pub async fn logout(client: &ApiClient) -> Result<()> {
    client.credentials().clear().await?;
    info!("logged out");
    Ok(())
}

/// Current user and permissions. Fails with `Unauthorized` when the stored
/// token is missing or expired.
pub async fn current(client: &ApiClient) -> Result<Session> {
    if client.credentials().load().await?.is_none() {
        return Err(PolyclinicError::Unauthorized);
    }
    let me: MeData = client.get("auth/me").await?;
    Ok(Session::new(me.user, me.permissions))
}

/// Session fetched once per login.
///
/// The stored token is checked on every call: any 401 in the client clears
/// it, and the cached session is dropped with it.
#[derive(Debug, Default)]
pub struct SessionCache {
    session: Option<Session>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&mut self, client: &ApiClient) -> Result<Session> {
        if client.credentials().load().await?.is_none() {
            self.session = None;
            return Err(PolyclinicError::Unauthorized);
        }
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let session = current(client).await?;
        self.session = Some(session.clone());
        Ok(session)
    }

    pub fn forget(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::Resource;
    use crate::selector::{FetchPhase, PointerHub, RemoteSelector};
    use crate::storage::credentials::CredentialStore;
    use crate::types::Medication;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user() -> serde_json::Value {
        json!({
            "id": 4,
            "name": "Dra. Salazar",
            "username": "msalazar",
            "role": "DEPARTMENT_HEAD",
            "departmentId": 2
        })
    }

    #[tokio::test]
    async fn test_login_stores_token_and_me_uses_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "token": "tok-1", "user": user() }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "user": user(), "permissions": ["warehouse:approve", "stock:read"] }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token"));
        let client = ApiClient::new(&server.uri(), store, Duration::from_secs(5)).unwrap();

        let staff = login(&client, "msalazar", "secret").await.unwrap();
        assert_eq!(staff.department_id, Some(2));

        let session = current(&client).await.unwrap();
        assert!(session.allows(Permission::ApproveRequests));
        assert!(!session.allows(Permission::RequestStock));

        logout(&client).await.unwrap();
        assert!(matches!(current(&client).await, Err(PolyclinicError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_rejected_login_is_a_validation_error_and_keeps_old_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Bad credentials"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token"));
        store.save("previous-user").await.unwrap();
        let client = ApiClient::new(&server.uri(), store, Duration::from_secs(5)).unwrap();

        let err = login(&client, "msalazar", "wrong").await.unwrap_err();
        assert!(err.is_client_side());
        assert_eq!(err.to_string(), "Invalid username or password");
        assert_eq!(
            client.credentials().load().await.unwrap().as_deref(),
            Some("previous-user")
        );
    }

    #[tokio::test]
    async fn test_cached_session_is_dropped_after_a_401_elsewhere() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "user": user(), "permissions": ["stock:read"] }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/medications"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token"));
        store.save("tok-1").await.unwrap();
        let client = ApiClient::new(&server.uri(), store, Duration::from_secs(5)).unwrap();

        let mut cache = SessionCache::new();
        assert!(cache.get(&client).await.unwrap().allows(Permission::ViewStock));
        // Served from the cache: /auth/me is expected exactly once
        assert!(cache.get(&client).await.is_ok());

        // The selector swallows the failed fetch
        let hub = PointerHub::new();
        let mut selector: RemoteSelector<Medication> = RemoteSelector::new("Medication", |_: Option<&Medication>| {});
        let ticket = selector.mount(&hub);
        let medications = Resource::<Medication>::new(client.clone());
        assert!(selector.fetch_pending(ticket, &medications).await);
        assert_eq!(selector.phase(), FetchPhase::Failed);

        assert!(matches!(cache.get(&client).await, Err(PolyclinicError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token"));
        let client = ApiClient::new("http://127.0.0.1:9", store, Duration::from_secs(1)).unwrap();
        let err = login(&client, " ", "x").await.unwrap_err();
        assert!(err.is_client_side());
    }
}
