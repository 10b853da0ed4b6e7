//! Server-side sessions
//!
//! A [`Session`] is loaded by the session middleware, mutated by views through
//! the request context and written back once the response is ready. Only the
//! session id travels in the cookie.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub type SessionId = String;

/// Session key under which the authenticated user's id is stored
pub const SESSION_KEY_USER_ID: &str = "_auth_user_id";

/// Session data plus the bookkeeping the middleware needs to persist it
///
/// # Examples
///
/// ```
/// use recipe_box::auth::Session;
/// use serde_json::json;
///
/// let mut session = Session::new();
/// assert!(session.is_empty());
///
/// session.set("theme", json!("dark"));
/// assert!(session.is_modified());
/// assert_eq!(session.get("theme"), Some(&json!("dark")));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
	pub data: HashMap<String, serde_json::Value>,
	#[serde(skip)]
	id: Option<SessionId>,
	#[serde(skip)]
	modified: bool,
	#[serde(skip)]
	stale_id: Option<SessionId>,
	#[serde(skip)]
	flushed: bool,
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	/// A session previously persisted under `id`
	pub fn with_id(id: impl Into<SessionId>, data: HashMap<String, serde_json::Value>) -> Self {
		Self {
			data,
			id: Some(id.into()),
			..Self::default()
		}
	}

	/// The id this session is stored under, `None` until first saved
	pub fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}

	pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
		self.data.insert(key.into(), value);
		self.modified = true;
	}

	pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
		self.data.get(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
		let value = self.data.remove(key);
		if value.is_some() {
			self.modified = true;
		}
		value
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn is_modified(&self) -> bool {
		self.modified
	}

	/// Whether [`flush`](Self::flush) was called during this request
	pub fn is_flushed(&self) -> bool {
		self.flushed
	}

	/// Keep the data but move it to a fresh id on save.
	///
	/// Called on login so a pre-authentication session id cannot be reused.
	pub fn cycle_key(&mut self) {
		if let Some(old) = self.id.take() {
			self.stale_id.get_or_insert(old);
		}
		self.modified = true;
	}

	/// Drop all data and the id. The stored session is deleted on save.
	pub fn flush(&mut self) {
		if let Some(old) = self.id.take() {
			self.stale_id.get_or_insert(old);
		}
		self.data.clear();
		self.modified = false;
		self.flushed = true;
	}

	/// The id that must be removed from the store, if the key was cycled or flushed
	pub fn take_stale_id(&mut self) -> Option<SessionId> {
		self.stale_id.take()
	}

	pub(crate) fn assign_id(&mut self, id: SessionId) {
		self.id = Some(id);
	}

	/// Id of the logged-in user, if any
	pub fn user_id(&self) -> Option<i64> {
		self.get(SESSION_KEY_USER_ID).and_then(|v| v.as_i64())
	}

	pub fn set_user_id(&mut self, user_id: i64) {
		self.set(SESSION_KEY_USER_ID, serde_json::Value::from(user_id));
	}
}

/// Session store trait for different backends
#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Load session data by id. Expired sessions are not returned.
	async fn load(&self, session_id: &str) -> Option<Session>;

	async fn save(&self, session_id: &str, session: &Session);

	async fn delete(&self, session_id: &str);

	fn create_session_id(&self) -> SessionId {
		Uuid::new_v4().simple().to_string()
	}
}

struct StoredSession {
	data: HashMap<String, serde_json::Value>,
	expires_at: Instant,
}

/// In-memory session store
///
/// A session expires `ttl` after it was last saved. The session middleware
/// only saves modified sessions, so for a logged-in user that is usually
/// the login itself. Expired entries are dropped when loaded or by
/// [`cleanup`](Self::cleanup); [`spawn_cleanup`](Self::spawn_cleanup) runs the
/// latter on an interval.
///
/// # Examples
///
/// ```
/// use recipe_box::auth::{InMemorySessionStore, SessionStore};
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemorySessionStore::new(Duration::from_secs(60));
/// let id = store.create_session_id();
/// assert!(store.load(&id).await.is_none());
/// # });
/// ```
#[derive(Clone)]
pub struct InMemorySessionStore {
	sessions: Arc<Mutex<HashMap<SessionId, StoredSession>>>,
	ttl: Duration,
}

impl InMemorySessionStore {
	pub fn new(ttl: Duration) -> Self {
		Self {
			sessions: Arc::new(Mutex::new(HashMap::new())),
			ttl,
		}
	}

	/// Remove every expired session, returning how many were dropped
	pub async fn cleanup(&self) -> usize {
		let now = Instant::now();
		let mut sessions = self.sessions.lock().await;
		let before = sessions.len();
		sessions.retain(|_, stored| stored.expires_at > now);
		before - sessions.len()
	}

	/// Run [`cleanup`](Self::cleanup) every `every` on the current runtime.
	///
	/// The task holds a weak reference and stops once the store is dropped.
	pub fn spawn_cleanup(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
		let store = Arc::downgrade(self);
		let every = every.max(Duration::from_millis(1));
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(every);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			// The first tick completes immediately
			ticker.tick().await;
			loop {
				ticker.tick().await;
				let Some(store) = store.upgrade() else {
					break;
				};
				let removed = store.cleanup().await;
				if removed > 0 {
					let remaining = store.len().await;
					tracing::debug!(removed, remaining, "expired sessions removed");
				}
			}
		})
	}

	pub async fn len(&self) -> usize {
		self.sessions.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.sessions.lock().await.is_empty()
	}
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
	async fn load(&self, session_id: &str) -> Option<Session> {
		let mut sessions = self.sessions.lock().await;
		let stored = sessions.get(session_id)?;
		if stored.expires_at <= Instant::now() {
			sessions.remove(session_id);
			return None;
		}
		Some(Session::with_id(session_id, stored.data.clone()))
	}

	async fn save(&self, session_id: &str, session: &Session) {
		let mut sessions = self.sessions.lock().await;
		sessions.insert(
			session_id.to_string(),
			StoredSession {
				data: session.data.clone(),
				expires_at: Instant::now() + self.ttl,
			},
		);
	}

	async fn delete(&self, session_id: &str) {
		let mut sessions = self.sessions.lock().await;
		sessions.remove(session_id);
	}
}
