//! Rendering collaborator — the seam between the fragment cache and whatever
//! actually produces markup.
//!
//! ## Core types
//!
//! - [`Rendered`] — typed render outcome: final markup or a loading placeholder.
//! - [`RenderProps`] — the props object handed to the render server.
//! - [`Renderer`] — async trait implemented by every rendering backend.
//! - [`renderer_fn`] — adapts a plain closure into a [`Renderer`].
//! - [`RemoteRenderer`] — posts props to an out-of-process render server.

use std::{future::Future, pin::Pin, time::Duration};

use serde::Serialize;
use thiserror::Error;

use crate::cache::{Language, Variant};

pub mod remote;

pub use remote::RemoteRenderer;

/// Substring a render server emits in its placeholder markup while the
/// application bundle is still loading.
pub const LOADING_SENTINEL: &str = "appLoading";

/// Component that renders the site header when `headerMode` is set.
pub const HEADER_COMPONENT: &str = "ReaderApp";

/// Component that renders the site footer.
pub const FOOTER_COMPONENT: &str = "Footer";

/// The outcome of a successful render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Final markup, safe to reuse.
    Ready(String),
    /// The renderer answered with a placeholder instead of real markup.
    Loading,
}

impl Rendered {
    /// Classifies raw renderer output: anything containing
    /// [`LOADING_SENTINEL`] is a placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcache::render::Rendered;
    ///
    /// assert_eq!(Rendered::from_markup("<div>Header</div>"), Rendered::Ready("<div>Header</div>".into()));
    /// assert_eq!(Rendered::from_markup("<div id=\"appLoading\"></div>"), Rendered::Loading);
    /// ```
    pub fn from_markup(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        if markup.contains(LOADING_SENTINEL) {
            Self::Loading
        } else {
            Self::Ready(markup)
        }
    }

    /// The string a template should receive: the markup, or `""` for a placeholder.
    pub fn into_markup(self) -> String {
        match self {
            Self::Ready(markup) => markup,
            Self::Loading => String::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Errors a renderer may report. None of them are cached.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to connect to render server at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to render server: {0}")]
    Io(#[from] std::io::Error),

    #[error("render of {component} timed out after {after:?}")]
    Timeout { component: String, after: Duration },

    #[error("render server answered {status} for {component}")]
    Status { component: String, status: u16 },

    #[error("malformed render server response: {0}")]
    Malformed(#[from] httparse::Error),

    #[error("render server closed the connection before a complete response")]
    Incomplete,

    #[error("render server sent an invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("render server response exceeds maximum allowed size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },

    #[error("unsupported transfer encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("render server returned non UTF-8 markup: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to encode render props: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("render rejected: {0}")]
    Rejected(String),
}

/// Signed-in visitor fields for the logged-in header. The cached header is
/// shared by every visitor, so these are always neutral placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewerProps {
    #[serde(rename = "notificationCount")]
    pub notification_count: u32,
    pub profile_pic_url: String,
    pub full_name: String,
}

/// Header-only props.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderProps {
    #[serde(rename = "headerMode")]
    pub header_mode: bool,
    /// `null` for the anonymous header, `true` for the signed-in one.
    #[serde(rename = "_uid")]
    pub uid: Option<bool>,
    #[serde(flatten)]
    pub viewer: Option<ViewerProps>,
}

/// The configuration object passed to the render server, serialized with
/// the field names the front-end components read.
///
/// # Examples
///
/// ```
/// use fragcache::cache::{Language, Variant};
/// use fragcache::render::RenderProps;
///
/// let props = RenderProps::header(Variant::LoggedOut, Language::ENGLISH, serde_json::json!({}));
/// let json = serde_json::to_value(&props).unwrap();
/// assert_eq!(json["headerMode"], true);
/// assert!(json["_uid"].is_null());
/// assert_eq!(json["interfaceLang"], "english");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderProps {
    #[serde(rename = "interfaceLang")]
    pub interface_lang: Language,
    #[serde(rename = "_siteSettings")]
    pub site_settings: serde_json::Value,
    #[serde(flatten)]
    pub header: Option<HeaderProps>,
}

impl RenderProps {
    /// Props for the header in the given variant.
    pub fn header(
        variant: Variant,
        language: Language,
        site_settings: serde_json::Value,
    ) -> Self {
        let header = match variant {
            Variant::LoggedOut => HeaderProps {
                header_mode: true,
                uid: None,
                viewer: None,
            },
            Variant::LoggedIn => HeaderProps {
                header_mode: true,
                uid: Some(true),
                viewer: Some(ViewerProps::default()),
            },
        };
        Self {
            interface_lang: language,
            site_settings,
            header: Some(header),
        }
    }

    /// Props for the footer.
    pub fn footer(language: Language, site_settings: serde_json::Value) -> Self {
        Self {
            interface_lang: language,
            site_settings,
            header: None,
        }
    }
}

/// Boxed future returned by [`Renderer::render`].
pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = Result<Rendered, RenderError>> + Send + 'a>>;

/// A rendering backend.
///
/// The call is opaque to the cache: it may block on network or subprocess
/// work, and the cache neither bounds nor retries it.
pub trait Renderer: Send + Sync {
    /// Render `component` with `props`.
    fn render<'a>(&'a self, component: &'a str, props: &'a RenderProps) -> RenderFuture<'a>;
}

/// A [`Renderer`] backed by a synchronous closure. Built with [`renderer_fn`].
pub struct FnRenderer<F> {
    f: F,
}

/// Wraps a closure as a [`Renderer`].
///
/// # Examples
///
/// ```
/// use fragcache::render::{Rendered, renderer_fn};
///
/// let renderer = renderer_fn(|component, _props| Ok(Rendered::Ready(format!("<{component}/>"))));
/// ```
pub fn renderer_fn<F>(f: F) -> FnRenderer<F>
where
    F: Fn(&str, &RenderProps) -> Result<Rendered, RenderError> + Send + Sync,
{
    FnRenderer { f }
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&str, &RenderProps) -> Result<Rendered, RenderError> + Send + Sync,
{
    fn render<'a>(&'a self, component: &'a str, props: &'a RenderProps) -> RenderFuture<'a> {
        let result = (self.f)(component, props);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_anywhere_means_loading() {
        assert!(Rendered::from_markup("...appLoading...").is_loading());
        assert!(!Rendered::from_markup("<footer></footer>").is_loading());
        assert_eq!(Rendered::Loading.into_markup(), "");
    }

    #[test]
    fn logged_in_header_props() {
        let props = RenderProps::header(Variant::LoggedIn, Language::HEBREW, json!({"TORAH_SPECIFIC": true}));
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(
            value,
            json!({
                "interfaceLang": "hebrew",
                "_siteSettings": {"TORAH_SPECIFIC": true},
                "headerMode": true,
                "_uid": true,
                "notificationCount": 0,
                "profile_pic_url": "",
                "full_name": "",
            })
        );
    }

    #[test]
    fn logged_out_header_props_have_null_uid_and_no_viewer() {
        let props = RenderProps::header(Variant::LoggedOut, Language::ENGLISH, json!({}));
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(
            value,
            json!({
                "interfaceLang": "english",
                "_siteSettings": {},
                "headerMode": true,
                "_uid": null,
            })
        );
    }

    #[test]
    fn footer_props_are_language_and_settings_only() {
        let props = RenderProps::footer(Language::ENGLISH, json!({"x": 1}));
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value, json!({"interfaceLang": "english", "_siteSettings": {"x": 1}}));
    }

    #[tokio::test]
    async fn closure_renderer_sees_component_and_props() {
        let renderer = renderer_fn(|component, props| {
            Ok(Rendered::Ready(format!("{component}:{}", props.interface_lang)))
        });
        let props = RenderProps::footer(Language::HEBREW, json!({}));
        let out = renderer.render(FOOTER_COMPONENT, &props).await.unwrap();
        assert_eq!(out, Rendered::Ready("Footer:hebrew".into()));
    }
}
