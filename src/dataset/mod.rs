/*!
 * Remote datasets
 *
 * A [`RemoteDataset`] presents a dataset on a DCOR server as if it were
 * stored locally. Dataset-wide properties (configuration, size, feature
 * availability) are fetched once at construction; event data is fetched on
 * demand through the feature directory.
 */

pub mod config;
pub mod events;
pub mod features;
pub mod filter;
pub mod parse;

use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::api::{Endpoint, HttpTransport, QueryCache, Transport};
use crate::config::ClientConfig;
use crate::error::Result;

pub use config::Configuration;
pub use events::{EventArray, EventFeature, EventIter, EventSource, EventTrace, TraceDirectory};
pub use features::{FeatureDirectory, FeatureValue};
pub use filter::Filter;

/// Dataset on a DCOR server
pub struct RemoteDataset {
    api: Arc<QueryCache>,
    config: Configuration,
    size: usize,
    events: FeatureDirectory,
    title: String,
    filter: Filter,
    hash: OnceLock<String>,
}

impl RemoteDataset {
    /// Open a dataset over HTTP
    ///
    /// `locator` is a bare resource identifier, a `host/path` string or a
    /// full URL. Host and scheme defaults come from `client`.
    pub fn open(locator: &str, client: &ClientConfig) -> Result<Self> {
        let endpoint = Endpoint::resolve(locator, client.use_ssl, &client.host)?;
        debug!(endpoint = %endpoint, "Resolved endpoint");
        let transport = HttpTransport::new(endpoint, client)?;
        Self::from_transport(Box::new(transport))
    }

    /// Build a dataset on top of any transport
    pub fn from_transport(transport: Box<dyn Transport>) -> Result<Self> {
        let api = Arc::new(QueryCache::new(transport));

        let config = Configuration::new(&api.metadata()?)?;
        let size = api.size()?;
        let events = FeatureDirectory::new(Arc::clone(&api))?;
        let title = config.title()?;

        info!(
            endpoint = %api.endpoint(),
            title = %title,
            events = size,
            features = events.len(),
            "Opened remote dataset"
        );

        Ok(Self {
            api,
            config,
            size,
            events,
            title,
            filter: Filter::new(size),
            hash: OnceLock::new(),
        })
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Identity hash of the dataset (SHA-256 of the endpoint URL)
    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| self.api.endpoint().identity_hash())
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.api.endpoint()
    }

    /// Endpoint URL as text
    pub fn path(&self) -> &str {
        self.api.endpoint().as_str()
    }

    pub fn features(&self) -> &FeatureDirectory {
        &self.events
    }

    /// Shorthand for `features().get(name)`
    pub fn get(&self, name: &str) -> Result<FeatureValue<'_>> {
        self.events.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events.contains(name)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }

    /// Recompute the filters from the `filtering` configuration section
    pub fn apply_filter(&mut self) -> Result<()> {
        self.filter.update(&self.config, &self.events)
    }
}

impl std::fmt::Debug for RemoteDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDataset")
            .field("endpoint", &self.path())
            .field("title", &self.title)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
