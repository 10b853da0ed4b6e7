use crate::auth::Session;
use crate::models::User;

/// Per-request authentication state handed to every view
///
/// Holds the session loaded by the session middleware and the user it
/// points at, if any. Views mutate it; the dispatcher writes the session
/// back afterwards.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
	pub session: Session,
	pub user: Option<User>,
}

impl RequestContext {
	pub fn new(session: Session, user: Option<User>) -> Self {
		Self { session, user }
	}

	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn is_authenticated(&self) -> bool {
		self.user.is_some()
	}

	pub fn user_id(&self) -> Option<i64> {
		self.user.as_ref().map(|user| user.id)
	}

	/// Attach `user` to the session under a fresh session id
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::auth::{RequestContext, Session};
	/// use recipe_box::models::User;
	/// use chrono::Utc;
	///
	/// let mut ctx = RequestContext::new(Session::with_id("pre-login", Default::default()), None);
	/// ctx.login(User {
	///     id: 3,
	///     username: "alice".into(),
	///     password_hash: String::new(),
	///     date_joined: Utc::now(),
	///     last_login: None,
	/// });
	///
	/// assert!(ctx.is_authenticated());
	/// assert_eq!(ctx.session.user_id(), Some(3));
	/// assert_eq!(ctx.session.id(), None);
	/// ```
	pub fn login(&mut self, user: User) {
		self.session.cycle_key();
		self.session.set_user_id(user.id);
		self.user = Some(user);
	}

	/// Forget the user and discard the session
	pub fn logout(&mut self) {
		self.session.flush();
		self.user = None;
	}

	pub fn into_session(self) -> Session {
		self.session
	}
}
