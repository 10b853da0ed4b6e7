//! Type-safe extensions for Request
//!
//! Middleware uses this to hand values (such as the loaded session) to the
//! dispatcher and to read them back once the view has run.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Type-safe extension storage
///
/// Cloning an `Extensions` yields a handle to the same map.
#[derive(Clone, Default)]
pub struct Extensions {
	map: Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl Extensions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a value, replacing any previous value of the same type
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::http::Extensions;
	///
	/// let extensions = Extensions::new();
	/// extensions.insert(42u32);
	/// assert_eq!(extensions.get::<u32>(), Some(42));
	/// ```
	pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.insert(TypeId::of::<T>(), Box::new(value));
	}

	/// Get a cloned value from extensions
	pub fn get<T>(&self) -> Option<T>
	where
		T: Clone + Send + Sync + 'static,
	{
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.get(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast_ref::<T>())
			.cloned()
	}

	/// Remove and return a value
	pub fn remove<T: Send + Sync + 'static>(&self) -> Option<T> {
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.remove(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast::<T>().ok())
			.map(|boxed| *boxed)
	}

	pub fn contains<T: 'static>(&self) -> bool {
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.contains_key(&TypeId::of::<T>())
	}
}
