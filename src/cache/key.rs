//! Cache keys: which fragment, which header variant, which interface language.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::http::Request;

/// The page region a fragment renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Header,
    Footer,
}

impl FragmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header rendering mode: signed-in visitors and anonymous visitors get
/// different markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    LoggedIn,
    LoggedOut,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoggedIn => "logged_in",
            Self::LoggedOut => "logged_out",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interface language code such as `"english"` or `"hebrew"`.
///
/// The cache never validates a language: any code gets its own slot.
/// Use [`is_supported`](Self::is_supported) where validation matters.
///
/// # Examples
///
/// ```
/// use fragcache::cache::Language;
///
/// assert_eq!(Language::HEBREW.as_str(), "hebrew");
/// assert!(Language::ENGLISH.is_supported());
/// assert!(!Language::new("klingon").is_supported());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Language(Cow<'static, str>);

impl Language {
    pub const ENGLISH: Language = Language(Cow::Borrowed("english"));
    pub const HEBREW: Language = Language(Cow::Borrowed("hebrew"));

    /// Name of the cookie carrying the visitor's interface language.
    pub const COOKIE: &'static str = "interfaceLang";

    const SUPPORTED: [Language; 2] = [Self::ENGLISH, Self::HEBREW];

    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }

    /// Resolves the interface language for `request` from its
    /// `interfaceLang` cookie. Missing or unsupported values fall back to
    /// English.
    pub fn from_request(request: &Request) -> Self {
        request
            .headers()
            .cookie(Self::COOKIE)
            .map(|code| Self::new(code.to_owned()))
            .filter(Self::is_supported)
            .unwrap_or(Self::ENGLISH)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::ENGLISH
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one cache slot.
///
/// Only headers carry a [`Variant`]; the footer has a single rendering per
/// language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FragmentKey {
    Header(Variant, Language),
    Footer(Language),
}

impl FragmentKey {
    pub fn header(variant: Variant, language: Language) -> Self {
        Self::Header(variant, language)
    }

    pub fn footer(language: Language) -> Self {
        Self::Footer(language)
    }

    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::Header(..) => FragmentKind::Header,
            Self::Footer(_) => FragmentKind::Footer,
        }
    }

    pub fn variant(&self) -> Option<Variant> {
        match self {
            Self::Header(variant, _) => Some(*variant),
            Self::Footer(_) => None,
        }
    }

    pub fn language(&self) -> &Language {
        match self {
            Self::Header(_, language) | Self::Footer(language) => language,
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(variant, language) => write!(f, "header/{variant}/{language}"),
            Self::Footer(language) => write!(f, "footer/{language}"),
        }
    }
}
