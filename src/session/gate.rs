//! Session resolution and permission checks for handlers.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use serde_json::json;
use thiserror::Error;

use crate::http::request::{Method, NormalizedRequest};
use crate::http::response::{NormalizedResponse, ResponseBuilder};
use crate::observability::metrics;
use crate::permissions::{PermissionName, PermissionSet};
use crate::routing::names;

/// Body field (and cookie name) carrying the session identifier.
pub const SESSION_ID_FIELD: &str = "sessionId";

/// External session storage.
///
/// Implementations must return `None` when the session was issued to a
/// different client address than the one presenting it.
pub trait SessionStore: Send + Sync {
    /// Username owning `session_id`, if the session is live for `client`.
    fn check_session<'a>(&'a self, session_id: &'a str, client: IpAddr) -> BoxFuture<'a, Option<String>>;

    /// Stored permissions of `username`. `None` means the default set.
    fn permissions<'a>(&'a self, username: &'a str) -> BoxFuture<'a, Option<PermissionSet>>;
}

/// Resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    username: Option<String>,
    client: IpAddr,
}

impl SessionContext {
    pub fn anonymous(client: IpAddr) -> Self {
        Self { username: None, client }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn client(&self) -> IpAddr {
        self.client
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }
}

/// Why a caller was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("login required")]
    Anonymous,

    #[error("{username} lacks permission {permission}")]
    Forbidden {
        username: String,
        permission: PermissionName,
    },
}

impl Denial {
    /// Render through the normal response channel: read-style callers are
    /// sent to the login page, write-style callers get an error body.
    pub fn into_response(self, method: Method) -> NormalizedResponse {
        let status = match self {
            Denial::Anonymous => StatusCode::UNAUTHORIZED,
            Denial::Forbidden { .. } => StatusCode::FORBIDDEN,
        };
        match method {
            Method::Read => ResponseBuilder::new()
                .redirect(format!("/{}", names::LOGIN))
                .build(),
            Method::Write => ResponseBuilder::new()
                .status(status)
                .json(&json!({
                    "errorCode": status.as_u16(),
                    "error": self.to_string(),
                }))
                .build(),
        }
    }
}

/// Capability handed to handlers for identity and permission lookups.
#[derive(Clone)]
pub struct SessionGate {
    store: Arc<dyn SessionStore>,
}

impl SessionGate {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Resolve a session id presented by `client`. A missing id is anonymous.
    pub async fn resolve(&self, session_id: Option<&str>, client: IpAddr) -> SessionContext {
        let Some(session_id) = session_id.filter(|id| !id.is_empty()) else {
            metrics::record_session_lookup("absent");
            return SessionContext::anonymous(client);
        };

        match self.store.check_session(session_id, client).await {
            Some(username) => {
                metrics::record_session_lookup("resolved");
                SessionContext {
                    username: Some(username),
                    client,
                }
            }
            None => {
                tracing::debug!(client = %client, "Session not resolved, treating caller as anonymous");
                metrics::record_session_lookup("rejected");
                SessionContext::anonymous(client)
            }
        }
    }

    /// Resolve the caller of `request`. The session id is read from the
    /// body, falling back to the cookie of the same name.
    pub async fn resolve_request(&self, request: &NormalizedRequest) -> SessionContext {
        let session_id = request
            .body()
            .raw(SESSION_ID_FIELD)
            .or_else(|| request.cookie(SESSION_ID_FIELD));
        self.resolve(session_id, request.client()).await
    }

    /// Permission set of a resolved caller.
    pub async fn permissions(&self, session: &SessionContext) -> Option<PermissionSet> {
        let username = session.username()?;
        Some(self.store.permissions(username).await.unwrap_or_default())
    }

    /// Require an identified caller holding `permission`.
    pub async fn authorize(
        &self,
        request: &NormalizedRequest,
        permission: PermissionName,
    ) -> Result<SessionContext, Denial> {
        let session = self.resolve_request(request).await;
        let Some(permissions) = self.permissions(&session).await else {
            return Err(Denial::Anonymous);
        };

        if permissions.has(permission) {
            Ok(session)
        } else {
            let username = session.username().unwrap_or_default().to_string();
            tracing::info!(username = %username, permission = %permission, "Permission denied");
            Err(Denial::Forbidden { username, permission })
        }
    }
}
