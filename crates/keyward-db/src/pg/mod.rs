//! PostgreSQL repository implementations

mod handoff;
mod principal;
mod session;

pub use handoff::PgHandoffRepository;
pub use principal::PgPrincipalRepository;
pub use session::PgSessionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub principals: PgPrincipalRepository,
    pub sessions: PgSessionRepository,
    pub handoffs: PgHandoffRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            principals: PgPrincipalRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            handoffs: PgHandoffRepository::new(pool),
        }
    }
}
