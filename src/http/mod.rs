//! HTTP primitives shared by the server, middleware and views.

pub mod extensions;
pub mod form_data;
pub mod middleware;
pub mod request;
pub mod response;
pub mod upload;

pub use extensions::Extensions;
pub use form_data::FormData;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use upload::{FileUploadError, UploadedFile};
