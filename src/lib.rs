//! # fragcache
//!
//! Language-keyed render cache for pre-rendered page fragments. The header
//! (signed-in and anonymous) and the footer are rendered once per interface
//! language through an external render server and reused for the lifetime
//! of the cache.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fragcache::{Context, FragmentCache, FragmentProcessors, RemoteRenderer, Request, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_path("fragcache.json")?;
//!     let processors = FragmentProcessors::new(
//!         Arc::new(FragmentCache::new()),
//!         Arc::new(RemoteRenderer::new(settings.renderer.clone())),
//!         Arc::new(settings),
//!     );
//!
//!     let request = Request::new("GET", "/texts").with_header("Cookie", "interfaceLang=hebrew");
//!     let vars = processors.fragments(&Context::new(request)).await?;
//!     println!("{}", vars["footer"]);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod http;
pub mod processors;
pub mod render;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{FragmentCache, FragmentKey, FragmentKind, Language, Variant};
pub use config::{ConfigError, RendererConfig, Settings};
pub use context::Context;
pub use http::{Headers, Request, RequestError};
pub use processors::{FragmentProcessors, RouteScope, TemplateVars};
pub use render::{RemoteRenderer, RenderError, RenderProps, Rendered, Renderer, renderer_fn};
