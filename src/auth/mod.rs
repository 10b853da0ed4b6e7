//! Password hashing, sessions and the per-request auth context.

pub mod context;
pub mod hasher;
pub mod session;

pub use context::RequestContext;
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use session::{InMemorySessionStore, SESSION_KEY_USER_ID, Session, SessionId, SessionStore};
