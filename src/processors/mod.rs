//! Fragment processors — request-time assemblers that produce the header and
//! footer template variables for a page.
//!
//! | Processor                         | Variables                                | Scope                            |
//! |-----------------------------------|------------------------------------------|----------------------------------|
//! | [`header_html`](FragmentProcessors::header_html) | `logged_in_header`, `logged_out_header` | [`RouteScope::UserVisible`]      |
//! | [`footer_html`](FragmentProcessors::footer_html) | `footer`                                | [`RouteScope::UserVisible`]      |
//!
//! A processor outside its scope returns an empty [`TemplateVars`].

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cache::{FragmentCache, FragmentKey, Variant};
use crate::config::Settings;
use crate::context::Context;
use crate::render::{FOOTER_COMPONENT, HEADER_COMPONENT, RenderError, RenderProps, Renderer};

pub mod scope;

pub use scope::RouteScope;

/// Template variables contributed by a processor.
pub type TemplateVars = serde_json::Map<String, Value>;

pub const LOGGED_IN_HEADER: &str = "logged_in_header";
pub const LOGGED_OUT_HEADER: &str = "logged_out_header";
pub const FOOTER: &str = "footer";

/// Header and footer processors sharing one [`FragmentCache`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fragcache::cache::FragmentCache;
/// use fragcache::config::Settings;
/// use fragcache::context::Context;
/// use fragcache::processors::FragmentProcessors;
/// use fragcache::render::{Rendered, renderer_fn};
/// use fragcache::Request;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let settings = Settings { use_node: true, ..Settings::default() };
/// let processors = FragmentProcessors::new(
///     Arc::new(FragmentCache::new()),
///     Arc::new(renderer_fn(|component, _| Ok(Rendered::Ready(format!("<{component}/>"))))),
///     Arc::new(settings),
/// );
///
/// let ctx = Context::new(Request::new("GET", "/texts"));
/// let vars = processors.footer_html(&ctx).await.unwrap();
/// assert_eq!(vars["footer"], "<Footer/>");
/// # }
/// ```
#[derive(Clone)]
pub struct FragmentProcessors {
    cache: Arc<FragmentCache>,
    renderer: Arc<dyn Renderer>,
    settings: Arc<Settings>,
}

impl FragmentProcessors {
    pub fn new(cache: Arc<FragmentCache>, renderer: Arc<dyn Renderer>, settings: Arc<Settings>) -> Self {
        Self {
            cache,
            renderer,
            settings,
        }
    }

    pub fn cache(&self) -> &FragmentCache {
        &self.cache
    }

    /// Pre-rendered logged-in and logged-out headers for the request's
    /// interface language.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's [`RenderError`] on a cache miss. The two
    /// variants are cached independently: if the logged-in render fails, a
    /// logged-out header rendered just before it stays cached.
    pub async fn header_html(&self, ctx: &Context) -> Result<TemplateVars, RenderError> {
        if !Self::wants_chrome(ctx) {
            return Ok(TemplateVars::new());
        }

        let (logged_out, logged_in) = if self.settings.use_node {
            (
                self.header(ctx, Variant::LoggedOut).await?,
                self.header(ctx, Variant::LoggedIn).await?,
            )
        } else {
            (String::new(), String::new())
        };

        let mut vars = TemplateVars::new();
        vars.insert(LOGGED_IN_HEADER.to_owned(), Value::String(logged_in));
        vars.insert(LOGGED_OUT_HEADER.to_owned(), Value::String(logged_out));
        Ok(vars)
    }

    /// Pre-rendered footer for the request's interface language.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's [`RenderError`] on a cache miss.
    pub async fn footer_html(&self, ctx: &Context) -> Result<TemplateVars, RenderError> {
        if !Self::wants_chrome(ctx) {
            return Ok(TemplateVars::new());
        }

        let footer = if self.settings.use_node {
            let key = FragmentKey::footer(ctx.language().clone());
            let props = RenderProps::footer(ctx.language().clone(), self.settings.site_settings.clone());
            self.cache
                .get_fragment(&key, || self.renderer.render(FOOTER_COMPONENT, &props))
                .await?
        } else {
            String::new()
        };

        let mut vars = TemplateVars::new();
        vars.insert(FOOTER.to_owned(), Value::String(footer));
        Ok(vars)
    }

    /// Header and footer variables merged into one map.
    ///
    /// # Errors
    ///
    /// Returns the first [`RenderError`] encountered; the header is rendered first.
    pub async fn fragments(&self, ctx: &Context) -> Result<TemplateVars, RenderError> {
        let mut vars = self.header_html(ctx).await?;
        vars.extend(self.footer_html(ctx).await?);
        debug!(path = %ctx.path(), language = %ctx.language(), keys = vars.len(), "fragment variables assembled");
        Ok(vars)
    }

    async fn header(&self, ctx: &Context, variant: Variant) -> Result<String, RenderError> {
        let language = ctx.language().clone();
        let key = FragmentKey::header(variant, language.clone());
        let props = RenderProps::header(variant, language, self.settings.site_settings.clone());
        self.cache
            .get_fragment(&key, || self.renderer.render(HEADER_COMPONENT, &props))
            .await
    }

    fn wants_chrome(ctx: &Context) -> bool {
        RouteScope::UserVisible.applies(ctx.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;

    use crate::Request;
    use crate::cache::Language;
    use crate::render::{Rendered, renderer_fn};

    type Calls = Arc<Mutex<Vec<(String, Value)>>>;

    // Renderer that records every call and answers `<Component lang>`.
    fn recording_renderer(calls: Calls) -> Arc<dyn Renderer> {
        Arc::new(renderer_fn(move |component, props| {
            let value = serde_json::to_value(props)?;
            calls.lock().unwrap().push((component.to_owned(), value));
            Ok(Rendered::Ready(format!("<{component} {}>", props.interface_lang)))
        }))
    }

    fn processors(use_node: bool, renderer: Arc<dyn Renderer>) -> FragmentProcessors {
        let settings = Settings {
            use_node,
            site_settings: json!({"SITE_NAME": "Sefaria"}),
            ..Settings::default()
        };
        FragmentProcessors::new(Arc::new(FragmentCache::new()), renderer, Arc::new(settings))
    }

    fn ctx(path: &str, language: Language) -> Context {
        Context::with_language(Request::new("GET", path), language)
    }

    #[tokio::test]
    async fn header_renders_both_variants_once() {
        let calls = Calls::default();
        let p = processors(true, recording_renderer(Arc::clone(&calls)));

        let vars = p.header_html(&ctx("/texts", Language::ENGLISH)).await.unwrap();
        assert_eq!(vars[LOGGED_IN_HEADER], "<ReaderApp english>");
        assert_eq!(vars[LOGGED_OUT_HEADER], "<ReaderApp english>");

        p.header_html(&ctx("/topics", Language::ENGLISH)).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, HEADER_COMPONENT);
        assert!(calls[0].1["_uid"].is_null());
        assert_eq!(calls[1].1["_uid"], true);
        assert_eq!(calls[1].1["_siteSettings"], json!({"SITE_NAME": "Sefaria"}));
    }

    #[tokio::test]
    async fn footer_is_cached_per_language() {
        let calls = Calls::default();
        let p = processors(true, recording_renderer(Arc::clone(&calls)));

        let en = p.footer_html(&ctx("/", Language::ENGLISH)).await.unwrap();
        let he = p.footer_html(&ctx("/", Language::HEBREW)).await.unwrap();
        p.footer_html(&ctx("/", Language::HEBREW)).await.unwrap();

        assert_eq!(en[FOOTER], "<Footer english>");
        assert_eq!(he[FOOTER], "<Footer hebrew>");
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn gated_paths_get_no_variables() {
        let calls = Calls::default();
        let p = processors(true, recording_renderer(Arc::clone(&calls)));

        for path in ["/data.js", "/linker.js", "/api/texts/Genesis"] {
            assert!(p.fragments(&ctx(path, Language::ENGLISH)).await.unwrap().is_empty());
        }
        assert!(calls.lock().unwrap().is_empty());
        assert!(p.cache().is_empty().await);
    }

    #[tokio::test]
    async fn without_node_fragments_are_empty_and_uncached() {
        let calls = Calls::default();
        let p = processors(false, recording_renderer(Arc::clone(&calls)));

        let vars = p.fragments(&ctx("/texts", Language::HEBREW)).await.unwrap();
        assert_eq!(vars[LOGGED_IN_HEADER], "");
        assert_eq!(vars[LOGGED_OUT_HEADER], "");
        assert_eq!(vars[FOOTER], "");
        assert!(calls.lock().unwrap().is_empty());
        assert!(p.cache().is_empty().await);
    }

    #[tokio::test]
    async fn loading_footer_renders_empty() {
        let renderer: Arc<dyn Renderer> =
            Arc::new(renderer_fn(|_, _| Ok(Rendered::from_markup("<div id=\"appLoading\"></div>"))));
        let p = processors(true, renderer);

        let vars = p.footer_html(&ctx("/", Language::HEBREW)).await.unwrap();
        assert_eq!(vars[FOOTER], "");
        assert_eq!(
            p.cache().peek(&FragmentKey::footer(Language::HEBREW)).await.as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn render_failure_surfaces_to_caller() {
        let renderer: Arc<dyn Renderer> =
            Arc::new(renderer_fn(|_, _| Err(RenderError::Rejected("render server unavailable".into()))));
        let p = processors(true, renderer);

        let err = p.fragments(&ctx("/", Language::ENGLISH)).await.unwrap_err();
        assert!(matches!(err, RenderError::Rejected(_)));
        assert!(p.cache().is_empty().await);
    }

    #[tokio::test]
    async fn failed_logged_in_header_keeps_logged_out_slot() {
        let calls = Calls::default();
        let recorded = Arc::clone(&calls);
        let renderer: Arc<dyn Renderer> = Arc::new(renderer_fn(move |_, props| {
            let logged_in = props.header.as_ref().is_some_and(|h| h.uid == Some(true));
            let mut calls = recorded.lock().unwrap();
            calls.push((String::new(), Value::Bool(logged_in)));
            if logged_in && calls.len() < 3 {
                return Err(RenderError::Rejected("logged-in render failed".into()));
            }
            Ok(Rendered::Ready(if logged_in { "in" } else { "out" }.to_owned()))
        }));
        let p = processors(true, renderer);
        let en = || ctx("/", Language::ENGLISH);

        assert!(p.header_html(&en()).await.is_err());
        let logged_out = FragmentKey::header(Variant::LoggedOut, Language::ENGLISH);
        let logged_in = FragmentKey::header(Variant::LoggedIn, Language::ENGLISH);
        assert_eq!(p.cache().peek(&logged_out).await.as_deref(), Some("out"));
        assert!(!p.cache().contains(&logged_in).await);

        let vars = p.header_html(&en()).await.unwrap();
        assert_eq!(vars[LOGGED_OUT_HEADER], "out");
        assert_eq!(vars[LOGGED_IN_HEADER], "in");
        // Only the logged-in variant was rendered again.
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn fragments_merges_all_keys() {
        let p = processors(true, recording_renderer(Calls::default()));
        let vars = p.fragments(&ctx("/sheets/7", Language::ENGLISH)).await.unwrap();
        let mut keys: Vec<_> = vars.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![FOOTER, LOGGED_IN_HEADER, LOGGED_OUT_HEADER]);
    }
}
