//! Shared fixtures for the integration tests.
//!
//! [`TestClient`] drives the full middleware stack in-process, keeping the
//! session cookie between requests the way a browser would.

#![allow(dead_code)]

use hyper::Method;
use hyper::header::{COOKIE, SET_COOKIE};
use rstest::fixture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use recipe_box::app::{AppState, build_handler};
use recipe_box::conf::Settings;
use recipe_box::db::{Database, InMemoryDatabase};
use recipe_box::http::{Handler, MiddlewareChain, Request, Response};
use recipe_box::models::RecipeData;

const BOUNDARY: &str = "----recipe-box-test-boundary";

/// A file part for [`TestClient::post_multipart`]
pub struct FilePart<'a> {
	pub field: &'a str,
	pub file_name: &'a str,
	pub content_type: &'a str,
	pub content: &'a [u8],
}

pub struct TestClient {
	pub state: Arc<AppState>,
	handler: MiddlewareChain,
	cookies: Mutex<HashMap<String, String>>,
	_media: TempDir,
}

impl TestClient {
	pub fn new() -> Self {
		Self::with_settings(Settings::default())
	}

	pub fn with_settings(settings: Settings) -> Self {
		Self::with_database(settings, Arc::new(InMemoryDatabase::new()))
	}

	pub fn with_database(mut settings: Settings, db: Arc<dyn Database>) -> Self {
		let media = TempDir::new().expect("Failed to create media dir");
		settings.media_root = media.path().to_path_buf();
		let state = Arc::new(AppState::new(settings, db).expect("Failed to build app state"));
		Self {
			handler: build_handler(state.clone()),
			state,
			cookies: Mutex::new(HashMap::new()),
			_media: media,
		}
	}

	pub fn cookie(&self, name: &str) -> Option<String> {
		self.cookies.lock().unwrap().get(name).cloned()
	}

	/// Forget every cookie, as a fresh browser would
	pub fn clear_cookies(&self) {
		self.cookies.lock().unwrap().clear();
	}

	pub fn session_cookie(&self) -> Option<String> {
		self.cookie(&self.state.settings.session_cookie_name)
	}

	fn cookie_header(&self) -> Option<String> {
		let cookies = self.cookies.lock().unwrap();
		if cookies.is_empty() {
			return None;
		}
		Some(
			cookies
				.iter()
				.map(|(name, value)| format!("{}={}", name, value))
				.collect::<Vec<_>>()
				.join("; "),
		)
	}

	fn store_cookies(&self, response: &Response) {
		let mut cookies = self.cookies.lock().unwrap();
		for header in response.headers.get_all(SET_COOKIE) {
			let header = header.to_str().unwrap();
			let pair = header.split(';').next().unwrap();
			let (name, value) = pair.split_once('=').unwrap();
			if header.contains("Max-Age=0") || value.is_empty() {
				cookies.remove(name);
			} else {
				cookies.insert(name.to_string(), value.to_string());
			}
		}
	}

	pub async fn send(
		&self,
		method: Method,
		uri: &str,
		content_type: Option<&str>,
		body: Vec<u8>,
	) -> Response {
		let mut builder = Request::builder().method(method).uri(uri).body(body);
		if let Some(content_type) = content_type {
			builder = builder.header("content-type", content_type);
		}
		if let Some(cookie) = self.cookie_header() {
			builder = builder.header(COOKIE.as_str(), &cookie);
		}
		let request = builder.build().expect("Failed to build request");
		let response = self.handler.handle(request).await.expect("Handler failed");
		self.store_cookies(&response);
		response
	}

	pub async fn get(&self, uri: &str) -> Response {
		self.send(Method::GET, uri, None, Vec::new()).await
	}

	pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response {
		let body = serde_urlencoded::to_string(fields).unwrap();
		self.send(
			Method::POST,
			uri,
			Some("application/x-www-form-urlencoded"),
			body.into_bytes(),
		)
		.await
	}

	pub async fn post_multipart(
		&self,
		uri: &str,
		fields: &[(&str, &str)],
		files: &[FilePart<'_>],
	) -> Response {
		let mut body = Vec::new();
		for (name, value) in fields {
			body.extend_from_slice(
				format!(
					"--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
					BOUNDARY, name, value
				)
				.as_bytes(),
			);
		}
		for file in files {
			body.extend_from_slice(
				format!(
					"--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
					BOUNDARY, file.field, file.file_name, file.content_type
				)
				.as_bytes(),
			);
			body.extend_from_slice(file.content);
			body.extend_from_slice(b"\r\n");
		}
		body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

		let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
		self.send(Method::POST, uri, Some(&content_type), body).await
	}

	/// Register `username` and log in, leaving the session cookie in the jar
	pub async fn login_as(&self, username: &str, password: &str) {
		let response = self
			.post_form(
				"/register/",
				&[
					("username", username),
					("password1", password),
					("password2", password),
				],
			)
			.await;
		assert_eq!(response.location(), Some("/login/"), "{}", response.text());

		let response = self
			.post_form("/login/", &[("username", username), ("password", password)])
			.await;
		assert_eq!(response.location(), Some("/"), "{}", response.text());
	}

	/// Insert a recipe straight into the store
	pub async fn seed_recipe(&self, title: &str) -> i64 {
		self.state
			.db
			.create_recipe(RecipeData {
				title: title.to_string(),
				ingredients: "things".to_string(),
				instructions: "do it".to_string(),
				..Default::default()
			})
			.await
			.unwrap()
			.id
	}
}

#[fixture]
pub fn client() -> TestClient {
	TestClient::new()
}
