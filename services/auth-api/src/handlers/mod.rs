//! HTTP handlers

mod auth;
mod handoff;
mod health;
mod keys;
mod password;

pub use auth::{login, login_external, logout, me, refresh, sessions, signup};
pub use handoff::collect_tokens;
pub use health::{health, ready};
pub use keys::public_key;
pub use password::{change_password, forgot_password, reset_password};
