//! Route gates: which request paths a processor runs for.

/// The set of request paths a processor applies to. Outside its scope a
/// processor contributes no template variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteScope {
    /// Pages a person looks at. Excludes the data and linker scripts and
    /// everything under `/api/`.
    UserVisible,
    /// Requests that build the client data script, plus source sheets
    /// which still embed it. The fragment processors never use this; it is
    /// for callers gating their own data-script processors.
    DataOnly,
}

const NON_PAGE_SCRIPTS: [&str; 2] = ["/data.js", "/linker.js"];
const DATA_SCRIPTS: [&str; 2] = ["/data.js", "/sefaria.js"];

impl RouteScope {
    /// Returns `true` if a processor with this scope should run for `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcache::processors::RouteScope;
    ///
    /// assert!(RouteScope::UserVisible.applies("/texts"));
    /// assert!(!RouteScope::UserVisible.applies("/api/texts/Genesis"));
    /// assert!(RouteScope::DataOnly.applies("/sheets/42"));
    /// ```
    pub fn applies(self, path: &str) -> bool {
        match self {
            Self::UserVisible => !NON_PAGE_SCRIPTS.contains(&path) && !path.starts_with("/api/"),
            Self::DataOnly => DATA_SCRIPTS.contains(&path) || path.starts_with("/sheets/"),
        }
    }
}
