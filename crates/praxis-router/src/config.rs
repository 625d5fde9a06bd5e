//! Dispatcher configuration.

use std::time::Duration;

/// Tunable dispatcher behavior.
///
/// # Example
///
/// ```
/// use praxis_router::DispatcherConfig;
///
/// let config = DispatcherConfig::new()
///     .default_output_format("xml")
///     .default_page_size(50);
/// assert_eq!(config.default_output_format, "xml");
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// The output format extension used when neither the path extension
    /// nor the Accept header selects a codec.
    pub default_output_format: String,
    /// The input format extension used when no content type matches.
    pub default_input_format: String,
    /// The page size applied when a search names none.
    pub default_page_size: u32,
    /// Lifetime of action cache entries; `None` keeps them until a
    /// mutation of the same type invalidates them.
    pub cache_ttl: Option<Duration>,
    /// Whether to pretty-print output for codecs that support it.
    pub pretty: bool,
}

impl DispatcherConfig {
    /// Creates the default configuration: JSON out, form-encoded in,
    /// twenty items per page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_output_format: "json".to_string(),
            default_input_format: "form".to_string(),
            default_page_size: 20,
            cache_ttl: None,
            pretty: false,
        }
    }

    /// Sets the default output format extension.
    #[must_use]
    pub fn default_output_format(mut self, extension: impl Into<String>) -> Self {
        self.default_output_format = extension.into();
        self
    }

    /// Sets the default input format extension.
    #[must_use]
    pub fn default_input_format(mut self, extension: impl Into<String>) -> Self {
        self.default_input_format = extension.into();
        self
    }

    /// Sets the default page size.
    #[must_use]
    pub fn default_page_size(mut self, limit: u32) -> Self {
        self.default_page_size = limit;
        self
    }

    /// Bounds the lifetime of action cache entries.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Enables pretty-printed output.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}
