use thiserror::Error;
use url::Url;

/// Errors from link validation before opening a story in the browser.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    Invalid(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validate a story link before handing it to the system browser.
///
/// API responses are untrusted input; restricting to http/https keeps
/// `file://`, `javascript:` and friends from ever reaching `open`.
pub fn browser_url(raw: &str) -> Result<Url, LinkError> {
    let url = Url::parse(raw)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(LinkError::UnsupportedScheme(scheme.to_owned())),
    }
}
