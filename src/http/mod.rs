//! HTTP/1.1 request-side primitives: [`Headers`] and [`Request`].

pub mod headers;
pub mod request;

pub use headers::Headers;
pub use request::{Request, RequestError};
