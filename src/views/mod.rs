//! Request handlers.
//!
//! Every view has the same shape: it receives the shared [`AppState`], the
//! request and the per-request [`RequestContext`], and returns a response.
//! GET renders a page; POST validates a form and either redirects or
//! re-renders the page with errors.
//!
//! [`AppState`]: crate::app::AppState
//! [`RequestContext`]: crate::auth::RequestContext

pub mod auth;
pub mod media;
pub mod profile;
pub mod recipes;
