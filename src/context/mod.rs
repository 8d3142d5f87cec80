//! Per-request context handed to fragment processors.
//!
//! Carries the request head together with the interface language the
//! surrounding pipeline resolved for it.

use crate::Request;
use crate::cache::Language;

/// A request plus its resolved interface language.
#[derive(Debug, Clone)]
pub struct Context {
    request: Request,
    language: Language,
}

impl Context {
    /// Create a context, resolving the language from the request's
    /// `interfaceLang` cookie.
    pub fn new(request: Request) -> Self {
        let language = Language::from_request(&request);
        Self { request, language }
    }

    /// Create a context with an already resolved language.
    pub fn with_language(request: Request, language: Language) -> Self {
        Self { request, language }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }
}
