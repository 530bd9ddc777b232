//! GS1 GPC API configuration
//!
//! Endpoints of the public API behind <https://gpc-browser.gs1.org/>. The
//! download endpoint has a secondary "dynamic" variant that serves
//! publications not (yet) stored as blobs; it is tried only when the primary
//! answers 404.

use crate::FileFormat;

/// Production API host
pub const GS1_API_BASE_URL: &str = "https://gpc-api.gs1.org";

/// Referer the API expects on every request
pub const GS1_BROWSER_REFERER: &str = "https://gpc-browser.gs1.org/";

/// Endpoint layout of the GPC API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gs1ApiConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Value of the `Referer` header
    pub referer: String,
    /// Language listing path
    pub languages_endpoint: &'static str,
    /// Publication listing path
    pub publications_endpoint: &'static str,
    /// Primary download path prefix
    pub download_endpoint: &'static str,
    /// Fallback download path prefix, used after a 404
    pub dynamic_download_endpoint: &'static str,
}

impl Default for Gs1ApiConfig {
    fn default() -> Self {
        Self {
            base_url: GS1_API_BASE_URL.to_string(),
            referer: GS1_BROWSER_REFERER.to_string(),
            languages_endpoint: "/api/browser/language/all",
            publications_endpoint: "/api/browser/publication",
            download_endpoint: "/api/blob/download/publication",
            dynamic_download_endpoint: "/api/blob/dynamic/download/publication",
        }
    }
}

impl Gs1ApiConfig {
    /// Point the client at another host (mirror, local test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL listing all languages
    pub fn languages_url(&self) -> String {
        format!("{}{}", self.base_url, self.languages_endpoint)
    }

    /// URL listing publications of a language
    pub fn publications_url(&self, language_id: u32) -> String {
        format!(
            "{}{}?languageId={}",
            self.base_url, self.publications_endpoint, language_id
        )
    }

    /// Primary download URL
    pub fn download_url(&self, publication_id: u32, format: FileFormat) -> String {
        format!(
            "{}{}/{}/{}",
            self.base_url, self.download_endpoint, publication_id, format
        )
    }

    /// Fallback download URL
    pub fn dynamic_download_url(&self, publication_id: u32, format: FileFormat) -> String {
        format!(
            "{}{}/{}/{}",
            self.base_url, self.dynamic_download_endpoint, publication_id, format
        )
    }
}
