use crate::config::SourceConfig;
use crate::contract::Fetcher;
use crate::error::FetchError;
use crate::geojson::FeatureCollection;
use reqwest::Client;
use tracing::{error, info};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fetches the feed with a single GET per call.
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| FetchError::Network {
                url: config.url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<FeatureCollection, FetchError> {
        info!(url = %self.url, "Fetching GeoJSON feed");

        let network = |source| FetchError::Network {
            url: self.url.clone(),
            source,
        };

        let response = match self.client.get(&self.url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!(error = ?e, url = %self.url, "Failed to send feed request");
                return Err(network(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %self.url, "Feed returned error status");
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            error!(error = ?e, url = %self.url, "Failed to read feed body");
            network(e)
        })?;
        info!(bytes = body.len(), "Feed downloaded");

        let collection: FeatureCollection = body.parse().map_err(|e| {
            error!(error = ?e, "Failed to decode feed as a feature collection");
            FetchError::Parse(e)
        })?;
        info!(features = collection.features.len(), "Feed decoded");
        Ok(collection)
    }
}
