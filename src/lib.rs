/*!
 * dcor - lazy access to RT-DC datasets on a DCOR server
 *
 * - Locator resolution (bare identifier, `host/path` or full URL)
 * - Write-once caching of dataset-wide queries
 * - Scalar features downloaded once per dataset, everything else event-wise
 * - Dataset configuration and event filters
 */

pub mod api;
pub mod config;
pub mod dataset;
pub mod definitions;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use api::{Endpoint, HttpTransport, MockTransport, Transport};
pub use config::ClientConfig;
pub use dataset::{EventArray, EventSource, FeatureValue, RemoteDataset};
pub use error::{DcorError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
