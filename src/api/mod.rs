//! HTTP transport to the library backend
//!
//! [`ApiClient`] owns the base URL, the API token and the transport-level
//! session cookie (`sid`). The submodules wrap the endpoints behind traits so
//! services can be exercised without a network.

pub mod auth;
pub mod catalog;
pub mod loans;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{
    header::{HeaderMap, AUTHORIZATION, COOKIE, SET_COOKIE},
    Method, RequestBuilder, Response, StatusCode, Url,
};
use serde_json::Value;

use crate::{
    config::ApiConfig,
    error::{AppError, AppResult},
};

pub const IDENTITY_PROBE: &[&str] = &["method", "get-current-identity"];
pub const LOGIN: &[&str] = &["method", "login"];
pub const LOGOUT: &[&str] = &["method", "logout"];
pub const CREATE_LOAN: &[&str] = &["method", "create-loan-transaction"];
pub const CREATE_RESERVATION: &[&str] = &["method", "create-reservation-transaction"];
pub const BOOK_RESOURCE: &str = "Book";
pub const MEMBER_RESOURCE: &str = "Member";

const SESSION_COOKIE: &str = "sid";

/// Shared HTTP client; clones share the session cookie
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    session: Arc<Mutex<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("Invalid API base URL {}: {}", config.base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            token: config.token(),
            session: Arc::new(Mutex::new(None)),
        })
    }

    /// Build an endpoint URL from path segments below the base URL
    pub fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("{} cannot be used as a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Request carrying only the session cookie (identity service calls)
    pub fn session_request(&self, method: Method, segments: &[&str]) -> AppResult<RequestBuilder> {
        let sid = self.session_cookie();
        self.request_with_cookie(method, segments, sid.as_deref())
    }

    /// Request carrying an explicit `sid`, independent of the one held now
    pub fn request_with_cookie(
        &self,
        method: Method,
        segments: &[&str],
        sid: Option<&str>,
    ) -> AppResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        tracing::debug!("{} {}", method, url);
        let request = self.http.request(method, url);
        Ok(match sid {
            Some(sid) => request.header(COOKIE, format!("{}={}", SESSION_COOKIE, sid)),
            None => request,
        })
    }

    /// Request carrying the session cookie and the API token when configured
    pub fn authorized_request(&self, method: Method, segments: &[&str]) -> AppResult<RequestBuilder> {
        let request = self.session_request(method, segments)?;
        Ok(match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("token {}", token)),
            None => request,
        })
    }

    pub fn session_cookie(&self) -> Option<String> {
        self.lock_session().clone()
    }

    /// Remove and return the held `sid`; a cookie set afterwards is kept
    pub fn take_session_cookie(&self) -> Option<String> {
        self.lock_session().take()
    }

    pub fn set_session_cookie(&self, sid: String) {
        *self.lock_session() = Some(sid);
    }

    pub fn clear_session(&self) {
        *self.lock_session() = None;
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<String>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Extract the `sid` value from `Set-Cookie` headers, ignoring the guest cookie
pub fn session_cookie_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("guest"))
}

/// Best human-readable reason found in a backend error body
pub fn remote_message(body: &Value) -> Option<String> {
    if let Some(exception) = body.get("exception").and_then(Value::as_str) {
        // "frappe.exceptions.ValidationError: Book is not available"
        let reason = exception
            .split_once(": ")
            .map(|(_, reason)| reason)
            .unwrap_or(exception);
        return Some(reason.trim().to_string());
    }

    if let Some(raw) = body.get("_server_messages").and_then(Value::as_str) {
        let messages: Vec<String> = serde_json::from_str::<Vec<String>>(raw)
            .unwrap_or_default()
            .iter()
            .map(|entry| {
                serde_json::from_str::<Value>(entry)
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                    .unwrap_or_else(|| entry.clone())
            })
            .collect();
        if !messages.is_empty() {
            return Some(messages.join("; "));
        }
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(String::from)
}

/// Reason for a non-success response, consuming it
pub async fn failure_reason(response: Response) -> String {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => remote_message(&body).unwrap_or_else(|| format!("server answered {}", status)),
        Err(_) => format!("server answered {}", status),
    }
}

/// Map a rejected catalog/transaction call to an error.
///
/// 401/403 mean the server does not accept the session, which calls for a new
/// login; local role denials never get this far.
pub async fn rejection(response: Response) -> AppError {
    let status = response.status();
    let reason = failure_reason(response).await;
    rejection_for(status, reason)
}

fn rejection_for(status: StatusCode, reason: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Authentication(format!("{}, please log in again", reason))
        }
        _ => AppError::Transaction(reason),
    }
}
