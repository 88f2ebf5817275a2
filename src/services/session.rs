//! Process-wide session state machine
//!
//! ```text
//! Uninitialized ──bootstrap──▶ Resolving ──▶ Authenticated | Anonymous
//! Anonymous ──login──▶ Authenticated ──logout──▶ Anonymous
//! ```
//!
//! [`SessionStore`] is the only writer of the [`Session`]. Readers either take
//! a snapshot with [`SessionStore::current`] or follow changes through
//! [`SessionStore::subscribe`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::{
    api::auth::{AuthGateway, ProbeOutcome},
    error::{AppError, AppResult},
    models::{Identity, Session, SessionStatus, SessionTrust},
};

use super::{
    hints::{HintStore, PersistedHint},
    roles::RoleResolver,
};

pub struct SessionStore {
    gateway: Arc<dyn AuthGateway>,
    hints: Arc<dyn HintStore>,
    resolver: RoleResolver,
    state: watch::Sender<Session>,
    /// Held by bootstrap, login and logout; a login fails fast instead of waiting
    transition: Mutex<()>,
    /// Advanced on every logout so late responses cannot resurrect a session
    epoch: AtomicU64,
}

impl SessionStore {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        hints: Arc<dyn HintStore>,
        resolver: RoleResolver,
    ) -> Self {
        let (state, _) = watch::channel(Session::uninitialized());
        Self {
            gateway,
            hints,
            resolver,
            state,
            transition: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Snapshot of the live session
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    /// Receiver notified on every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Resolve the session at startup.
    ///
    /// Only the first call probes; later or concurrent calls wait for the
    /// session to settle and return it.
    pub async fn bootstrap(&self) -> Session {
        let started = self.state.send_if_modified(|session| {
            if session.status() == SessionStatus::Uninitialized {
                *session = Session::resolving();
                true
            } else {
                false
            }
        });
        if !started {
            return self.wait_settled().await;
        }

        let _guard = self.transition.lock().await;
        let epoch = self.epoch.load(Ordering::SeqCst);
        tracing::info!("Resolving session");

        let session = match self.gateway.probe_current_identity().await {
            ProbeOutcome::Identified(identity) => {
                let roles = self.resolver.resolve(&identity);
                Session::authenticated(identity, roles, SessionTrust::ServerConfirmed)
            }
            ProbeOutcome::Guest => {
                self.discard_hint().await;
                Session::anonymous()
            }
            ProbeOutcome::Unknown => self.reconstruct_from_hint().await,
        };

        if self.commit(epoch, session.clone()) {
            tracing::info!("Session resolved: {}", session.describe());
            session
        } else {
            tracing::info!("Session ended while it was being resolved");
            self.current()
        }
    }

    /// Log in and make the confirmed identity the current session
    pub async fn login(&self, identity: &str, secret: &str) -> AppResult<Session> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }
        if secret.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        let _guard = match self.transition.try_lock() {
            Ok(guard) => guard,
            Err(_) if self.status() == SessionStatus::Resolving => {
                return Err(AppError::Authentication(
                    "Session is still being resolved, try again shortly".to_string(),
                ));
            }
            Err(_) => {
                tracing::warn!("Rejecting login for '{}': another login is in progress", identity);
                return Err(AppError::LoginInProgress);
            }
        };

        let epoch = self.epoch.load(Ordering::SeqCst);
        let confirmed = self.gateway.login(identity, secret).await?;

        let roles = self.resolver.resolve(&confirmed);
        let session = Session::authenticated(confirmed, roles, SessionTrust::ServerConfirmed);
        if !self.commit(epoch, session.clone()) {
            tracing::warn!("Discarding login for '{}': session ended while it was in flight", identity);
            self.gateway.forget_session();
            return Err(AppError::Authentication(
                "Session ended while the login was in flight".to_string(),
            ));
        }

        if let Err(e) = self.hints.save(&PersistedHint::new(identity)).await {
            tracing::error!("Failed to persist identity hint: {}", e);
        }
        // A logout may have cleared the hint while we were writing it
        if self.epoch.load(Ordering::SeqCst) != epoch {
            self.discard_hint().await;
        }

        tracing::info!("Logged in as {}", session.describe());
        Ok(session)
    }

    /// End the session. The local session and hint are cleared even when the
    /// server-side logout fails; the failure is still reported.
    ///
    /// The session ends at once, then the transition lock is held until the
    /// server call and hint removal finish, so a login cannot interleave.
    pub async fn logout(&self) -> AppResult<()> {
        let previous = self.end_session();
        let _guard = self.transition.lock().await;
        let result = self.gateway.logout().await;
        self.discard_hint().await;

        let who = previous
            .identity()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "anonymous session".to_string());
        match &result {
            Ok(()) => tracing::info!("Logged out {}", who),
            Err(e) => tracing::warn!("Server-side logout of {} failed, local session cleared: {}", who, e),
        }
        result
    }

    /// Write `session` unless a logout happened since `epoch` was read
    fn commit(&self, epoch: u64, session: Session) -> bool {
        self.state.send_if_modified(|current| {
            if self.epoch.load(Ordering::SeqCst) == epoch {
                *current = session;
                true
            } else {
                false
            }
        })
    }

    fn end_session(&self) -> Session {
        let mut previous = Session::anonymous();
        self.state.send_modify(|current| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            previous = std::mem::replace(current, Session::anonymous());
        });
        previous
    }

    async fn reconstruct_from_hint(&self) -> Session {
        match self.hints.load().await {
            Ok(Some(hint)) => {
                tracing::warn!(
                    "Identity probe inconclusive, restoring unconfirmed session for '{}' from hint saved at {}",
                    hint.identity,
                    hint.saved_at
                );
                let identity = Identity::new(hint.identity);
                let roles = self.resolver.resolve(&identity);
                Session::authenticated(identity, roles, SessionTrust::HintReconstructed)
            }
            Ok(None) => {
                tracing::info!("Identity probe inconclusive and no hint available");
                self.discard_hint().await;
                Session::anonymous()
            }
            Err(e) => {
                tracing::error!("Failed to read identity hint: {}", e);
                self.discard_hint().await;
                Session::anonymous()
            }
        }
    }

    async fn discard_hint(&self) {
        if let Err(e) = self.hints.clear().await {
            tracing::error!("Failed to clear identity hint: {}", e);
        }
    }

    async fn wait_settled(&self) -> Session {
        let mut rx = self.state.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if current.is_settled() || rx.changed().await.is_err() {
                return current;
            }
        }
    }
}
