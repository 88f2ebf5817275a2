//! Identity service endpoints: probe, login, logout
//!
//! The gateway only reports raw identities. Roles are always derived locally.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::Identity,
};

use super::{failure_reason, remote_message, session_cookie_from, ApiClient};

/// Acknowledgment the backend sends for a successful login
pub const LOGGED_IN: &str = "Logged In";

/// What the identity probe learned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The service confirmed a logged-in identity
    Identified(Identity),
    /// The service confirmed nobody is logged in
    Guest,
    /// The probe was rejected or inconclusive
    Unknown,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Ask who the transport-level session belongs to. Never fails.
    async fn probe_current_identity(&self) -> ProbeOutcome;

    /// Submit credentials; succeeds only on an explicit acknowledgment
    async fn login(&self, identity: &str, secret: &str) -> AppResult<Identity>;

    /// Invalidate the session server-side; the local token is dropped regardless
    async fn logout(&self) -> AppResult<()>;

    /// Drop the local transport-level session token without calling the server
    fn forget_session(&self);
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    usr: &'a str,
    pwd: &'a str,
}

#[derive(Deserialize)]
struct ProbeResponse {
    #[serde(alias = "message")]
    identity: Option<String>,
}

/// Identity service over HTTP
#[derive(Clone)]
pub struct HttpAuthGateway {
    client: ApiClient,
}

impl HttpAuthGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn probe_current_identity(&self) -> ProbeOutcome {
        let request = match self.client.session_request(Method::GET, super::IDENTITY_PROBE) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Identity probe could not be built: {}", e);
                return ProbeOutcome::Unknown;
            }
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Identity probe failed: {}", e);
                return ProbeOutcome::Unknown;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Identity probe rejected with status {}", status);
            return ProbeOutcome::Unknown;
        }

        match response.json::<ProbeResponse>().await {
            Ok(ProbeResponse { identity: Some(name) }) if !name.trim().is_empty() => {
                let identity = Identity::new(name.trim());
                if identity.is_guest() {
                    ProbeOutcome::Guest
                } else {
                    ProbeOutcome::Identified(identity)
                }
            }
            Ok(_) => {
                tracing::warn!("Identity probe returned no identity");
                ProbeOutcome::Unknown
            }
            Err(e) => {
                tracing::warn!("Identity probe returned an unreadable body: {}", e);
                ProbeOutcome::Unknown
            }
        }
    }

    async fn login(&self, identity: &str, secret: &str) -> AppResult<Identity> {
        let response = self
            .client
            .session_request(Method::POST, super::LOGIN)?
            .json(&LoginRequest {
                usr: identity,
                pwd: secret,
            })
            .send()
            .await?;

        let status = response.status();
        let sid = session_cookie_from(response.headers());
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        let acknowledged = body.get("message").and_then(Value::as_str) == Some(LOGGED_IN);

        if !(status.is_success() && acknowledged) {
            let reason = remote_message(&body)
                .unwrap_or_else(|| format!("unexpected login response ({})", status));
            tracing::info!("Login for {} rejected: {}", identity, reason);
            return Err(AppError::Authentication(reason));
        }

        match sid {
            Some(sid) => self.client.set_session_cookie(sid),
            None => tracing::debug!("Login acknowledged without a session cookie"),
        }

        let display_name = body
            .get("full_name")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(Identity::new(identity).with_display_name(display_name))
    }

    async fn logout(&self) -> AppResult<()> {
        // Taken before sending, so a sid set by a login meanwhile survives
        let sid = self.client.take_session_cookie();
        let response = self
            .client
            .request_with_cookie(Method::POST, super::LOGOUT, sid.as_deref())?
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Authentication(failure_reason(response).await))
        }
    }

    fn forget_session(&self) {
        self.client.clear_session();
    }
}
