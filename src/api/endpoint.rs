/*!
 * Locator resolution for DCOR resources
 *
 * Accepted locators:
 * - `caab96f6-df12-4299-aa2e-089e390aafd5` (bare resource identifier)
 * - `dcor.mpl.mpg.de/api/3/action/dcserv?id=caab96f6-...` (host-relative)
 * - `https://dcor.mpl.mpg.de/api/3/action/dcserv?id=caab96f6-...` (full URL)
 *
 * The scheme is always taken from the `use_ssl` flag; a scheme present in the
 * locator is discarded.
 */

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

use crate::error::{DcorError, Result};

/// API path prepended to bare resource identifiers
pub const API_PATH: &str = "api/3/action/dcserv?id=";

/// Resolved network location of one remote dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Resolve a locator against the scheme flag and default host
    pub fn resolve(locator: &str, use_ssl: bool, host: &str) -> Result<Self> {
        let malformed = |reason: &str| DcorError::MalformedLocator {
            locator: locator.to_string(),
            reason: reason.to_string(),
        };

        let locator_trimmed = locator.trim();
        if locator_trimmed.is_empty() {
            return Err(malformed("empty locator"));
        }

        let scheme = if use_ssl { "https" } else { "http" };
        let base = match locator_trimmed.split_once("://") {
            Some((_, rest)) => rest,
            None => locator_trimmed,
        };

        let (host, api) = match base.split_once('/') {
            Some((host, api)) => (host, api.to_string()),
            None => (host, format!("{}{}", API_PATH, base)),
        };
        if host.is_empty() {
            return Err(malformed("no host given"));
        }

        let url = Url::parse(&format!("{}://{}/{}", scheme, host, api))
            .map_err(|e| malformed(&e.to_string()))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(malformed("no host given"));
        }

        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Stable hash distinguishing one remote dataset from another
    pub fn identity_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.url.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
