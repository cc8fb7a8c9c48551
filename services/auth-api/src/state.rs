//! Application state

use std::sync::Arc;

use keyward_auth_core::{AuthConfig, AuthService, RsaKeyPair, TokenHandoff};
use keyward_db::pg::Repositories;
use keyward_db::{
    HandoffRepository, MemoryHandoffRepository, MemoryPrincipalRepository,
    MemorySessionRepository, PrincipalRepository, SessionRepository,
};

use crate::identity::{ExternalIdentityVerifier, RejectingVerifier};
use crate::notifier::{LogNotifier, ResetNotifier};

/// Auth service over whichever store the process was started with
pub type DynAuthService = AuthService<dyn PrincipalRepository, dyn SessionRepository>;

/// Token handoff over whichever store the process was started with
pub type DynTokenHandoff = TokenHandoff<dyn HandoffRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service for tokens, sessions, and passwords
    pub auth: Arc<DynAuthService>,
    /// Issued pairs waiting for their app to collect them
    pub handoff: Arc<DynTokenHandoff>,
    /// Receiver of password reset tokens
    pub notifier: Arc<dyn ResetNotifier>,
    /// Checks credentials from external identity providers
    pub verifier: Arc<dyn ExternalIdentityVerifier>,
}

impl AppState {
    /// Create new application state with the default notifier and verifier
    pub fn new(auth: DynAuthService, handoff: DynTokenHandoff) -> Self {
        Self {
            auth: Arc::new(auth),
            handoff: Arc::new(handoff),
            notifier: Arc::new(LogNotifier),
            verifier: Arc::new(RejectingVerifier),
        }
    }

    /// State backed by Postgres repositories
    pub fn postgres(config: AuthConfig, keys: RsaKeyPair, repos: Repositories) -> Self {
        let principals: Arc<dyn PrincipalRepository> = Arc::new(repos.principals);
        let sessions: Arc<dyn SessionRepository> = Arc::new(repos.sessions);
        let handoffs: Arc<dyn HandoffRepository> = Arc::new(repos.handoffs);
        Self::new(
            AuthService::new(config.clone(), keys, principals, sessions),
            TokenHandoff::new(&config, handoffs),
        )
    }

    /// State backed by process-local stores; nothing survives a restart
    pub fn in_memory(config: AuthConfig, keys: RsaKeyPair) -> Self {
        let principal_repo = MemoryPrincipalRepository::new();
        let sessions: Arc<dyn SessionRepository> =
            Arc::new(MemorySessionRepository::new(principal_repo.clone()));
        let principals: Arc<dyn PrincipalRepository> = Arc::new(principal_repo);
        let handoffs: Arc<dyn HandoffRepository> = Arc::new(MemoryHandoffRepository::new());
        Self::new(
            AuthService::new(config.clone(), keys, principals, sessions),
            TokenHandoff::new(&config, handoffs),
        )
    }

    /// Replace the reset notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn ResetNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the external identity verifier
    pub fn with_verifier(mut self, verifier: Arc<dyn ExternalIdentityVerifier>) -> Self {
        self.verifier = verifier;
        self
    }
}
