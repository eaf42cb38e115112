//! Name-filter model and the encoding the remote side understands.
//!
//! A filter is a display name plus an ordered list of rules. The remote
//! `nameFilters` property wants one flattened string per filter, shaped
//! `"<name> (<tok1> <tok2> ...)"`, so the codec tokenizes each rule,
//! resolves MIME types to globs through the manager, and joins the result.

/// Resolves a MIME type to the glob patterns that match it. `None` means
/// the resolution itself failed; the codec then falls back to the raw MIME
/// string.
pub trait MimeGlobResolver {
    fn glob_patterns(&self, mime: &str) -> Option<Vec<String>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterRule {
    /// A glob pattern such as `*.txt`.
    Pattern(String),
    /// A MIME type such as `text/plain`, resolved to globs at encode time.
    MimeType(String),
    /// A rule kind the remote side cannot express; skipped by the codec.
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub rules: Vec<FilterRule>,
}

impl FileFilter {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn pattern(mut self, glob: impl Into<String>) -> Self {
        self.rules.push(FilterRule::Pattern(glob.into()));
        self
    }

    #[must_use]
    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.rules.push(FilterRule::MimeType(mime.into()));
        self
    }
}

/// Flatten one filter into the remote display string.
///
/// Returns `None` when no rule produced a concrete match token; such a
/// filter is meaningless to the remote side and must not be published.
pub fn encode(filter: &FileFilter, resolver: &dyn MimeGlobResolver) -> Option<String> {
    let mut tokens: Vec<String> = Vec::new();
    for rule in &filter.rules {
        match rule {
            FilterRule::Pattern(glob) => {
                // Literal parentheses would corrupt the trailing group.
                let sanitized = glob.replace(['(', ')'], " ");
                tokens.extend(sanitized.split_whitespace().map(str::to_owned));
            }
            FilterRule::MimeType(mime) => match resolver.glob_patterns(mime) {
                Some(globs) if !globs.is_empty() => tokens.extend(globs),
                _ => tokens.push(mime.clone()),
            },
            FilterRule::Other => {}
        }
    }
    if tokens.is_empty() {
        return None;
    }
    Some(format!("{} ({})", filter.name, tokens.join(" ")))
}

/// Encode a whole filter list, dropping filters that encode to `None`.
pub fn encode_filters(filters: &[FileFilter], resolver: &dyn MimeGlobResolver) -> Vec<String> {
    filters
        .iter()
        .filter_map(|filter| encode(filter, resolver))
        .collect()
}

/// Index of the first filter whose encoding equals `encoded`, if any.
pub(crate) fn matching_filter(
    filters: &[FileFilter],
    encoded: &str,
    resolver: &dyn MimeGlobResolver,
) -> Option<usize> {
    filters
        .iter()
        .position(|filter| encode(filter, resolver).as_deref() == Some(encoded))
}
