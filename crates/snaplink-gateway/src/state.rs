use snaplink_core::Shortener;
use std::sync::Arc;

/// Shared handler state: the shortener facade plus the public base URL
/// used to render short links in responses.
#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    base_url: String,
}

impl AppState {
    pub fn new(shortener: Arc<dyn Shortener>, public_base_url: impl Into<String>) -> Self {
        Self {
            shortener,
            base_url: public_base_url.into(),
        }
    }

    pub fn shortener(&self) -> &Arc<dyn Shortener> {
        &self.shortener
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
