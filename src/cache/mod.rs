//! Render fragment cache — lazily rendered, language-keyed header and footer
//! markup kept for the lifetime of the cache.
//!
//! A slot is either absent (never rendered, or the last render failed) or
//! present. Present slots are never invalidated; dropping the cache is the
//! only reset. A render that comes back [`Rendered::Loading`] is stored as
//! `""` and stays that way.
//!
//! ## Concurrency
//!
//! The map lock is released while rendering. Two requests that miss the
//! same slot at the same time both render and the later write wins; renders
//! are expected to be idempotent, so no coalescing is done.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::render::Rendered;

pub mod key;

pub use key::{FragmentKey, FragmentKind, Language, Variant};

/// Shared store of pre-rendered fragments.
///
/// Construct one at startup and share it between request handlers behind an
/// [`Arc`](std::sync::Arc).
///
/// # Examples
///
/// ```
/// use fragcache::cache::{FragmentCache, FragmentKey, Language, Variant};
/// use fragcache::render::Rendered;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = FragmentCache::new();
/// let key = FragmentKey::header(Variant::LoggedOut, Language::ENGLISH);
///
/// let first = cache
///     .get_fragment(&key, || async { Ok::<_, std::convert::Infallible>(Rendered::Ready("<div>Header</div>".into())) })
///     .await
///     .unwrap();
/// let second = cache
///     .get_fragment(&key, || async { Ok::<_, std::convert::Infallible>(Rendered::Ready("ignored".into())) })
///     .await
///     .unwrap();
///
/// assert_eq!(first, "<div>Header</div>");
/// assert_eq!(second, "<div>Header</div>");
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FragmentCache {
    slots: RwLock<HashMap<FragmentKey, String>>,
}

impl FragmentCache {
    /// Creates a cache with every slot absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached markup for `key`, rendering it with `render` on a miss.
    ///
    /// A stored value, including `""`, is returned without calling `render`.
    /// On a miss the render outcome is stored: markup verbatim,
    /// [`Rendered::Loading`] as `""`.
    ///
    /// # Errors
    ///
    /// Any error from `render` is returned unchanged and nothing is stored,
    /// so the next call for `key` renders again.
    pub async fn get_fragment<F, Fut, E>(&self, key: &FragmentKey, render: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Rendered, E>>,
    {
        if let Some(markup) = self.peek(key).await {
            debug!(fragment = %key, "fragment cache hit");
            return Ok(markup);
        }

        debug!(fragment = %key, "rendering fragment");
        let rendered = match render().await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(fragment = %key, "fragment render failed; slot left empty");
                return Err(e);
            }
        };

        if rendered.is_loading() {
            warn!(fragment = %key, "renderer returned a loading placeholder; caching empty markup");
        }
        let markup = rendered.into_markup();

        self.slots.write().await.insert(key.clone(), markup.clone());
        Ok(markup)
    }

    /// Returns the stored value for `key` without rendering.
    pub async fn peek(&self, key: &FragmentKey) -> Option<String> {
        self.slots.read().await.get(key).cloned()
    }

    /// Returns `true` if `key` has been rendered (even if it rendered empty).
    pub async fn contains(&self, key: &FragmentKey) -> bool {
        self.slots.read().await.contains_key(key)
    }

    /// Number of populated slots.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Returns `true` if no slot has been rendered yet.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}
