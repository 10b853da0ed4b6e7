//! # Recipe Box
//!
//! A recipe-sharing web application: users register and sign in, browse and
//! search recipes, create and edit them with an optional attachment, leave
//! comments, and keep a profile.
//!
//! ## Layout
//!
//! - [`http`]: request/response types, form parsing and the [`Handler`]/[`Middleware`] traits
//! - [`server`]: the hyper HTTP/1.1 server
//! - [`middleware`]: request logging and cookie sessions
//! - [`app`]: shared state and the route dispatcher
//! - [`urls`]: named routes
//! - [`views`]: request handlers
//! - [`forms`]: typed form validation
//! - [`db`]: store traits with in-memory and SQLite backends
//! - [`storage`]: attachment files under the media root
//! - [`conf`]: layered settings
//!
//! ## Quick Start
//!
//! ```no_run
//! use recipe_box::app::{AppState, build_handler};
//! use recipe_box::conf::Settings;
//! use recipe_box::server::HttpServer;
//! use std::sync::Arc;
//!
//! # async fn run() -> recipe_box::Result<()> {
//! let settings = Settings::default();
//! let addr = settings.bind_addr().parse().expect("valid address");
//! let state = Arc::new(AppState::from_settings(settings).await?);
//! HttpServer::new(build_handler(state)).listen(addr).await
//! # }
//! ```
//!
//! [`Handler`]: http::Handler
//! [`Middleware`]: http::Middleware

pub mod app;
pub mod auth;
pub mod conf;
pub mod db;
pub mod error;
pub mod forms;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod server;
pub mod shortcuts;
pub mod storage;
pub mod templates;
pub mod urls;
pub mod views;

pub use error::{Error, Result};
