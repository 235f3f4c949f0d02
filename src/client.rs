use std::future::Future;

use tracing::{debug, instrument};

use crate::error::{MtbError, Result};
use crate::harvest;
use crate::model::{EventDetails, RaceInfo, RaceResult};
use crate::scraper::pairing::PairingPolicy;

/// Default site all relative links are resolved against.
pub const BASE_URL: &str = "https://www.ucimtbworldseries.com";

/// Source of raw page markup.
///
/// Extraction never fetches anything itself; how markup is obtained (plain HTTP, a
/// controlled browser, files on disk) is up to the implementation.
pub trait DocumentFetcher {
    /// Fetch `url` with `params` appended as query parameters and return the body text.
    fn fetch(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP [`DocumentFetcher`] for the UCI MTB World Series site.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> mtb_scraper::Result<()> {
/// use mtb_scraper::MtbClient;
///
/// let client = MtbClient::new();
/// let events = client.get_events(2024).await?;
/// println!("Found {} events", events.len());
/// # Ok(())
/// # }
/// ```
pub struct MtbClient {
    http: reqwest::Client,
    base_url: String,
}

impl MtbClient {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a new client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure timeouts, proxies, headers, etc.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            http: client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Resolve relative links against `base_url` instead of the public site.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the events calendar of `year`. Cards that fail validation are logged and left out.
    #[instrument(skip(self))]
    pub async fn get_events(&self, year: i32) -> Result<Vec<EventDetails>> {
        let (events, _) = harvest::fetch_events(self, &self.base_url, year).await?;
        Ok(events)
    }

    /// Fetch the races listed on an event's results page. Races that fail validation are
    /// logged and left out.
    #[instrument(skip(self))]
    pub async fn get_races(
        &self,
        results_url: &str,
        policy: PairingPolicy,
    ) -> Result<Vec<RaceInfo>> {
        let (races, _) = harvest::fetch_races(self, &self.base_url, results_url, policy).await?;
        Ok(races)
    }

    /// Fetch the results of a single race.
    #[instrument(skip(self))]
    pub async fn get_results(&self, race_url: &str) -> Result<Vec<RaceResult>> {
        harvest::fetch_results(self, &self.base_url, race_url).await
    }
}

impl Default for MtbClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFetcher for MtbClient {
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut url = reqwest::Url::parse(url).map_err(|e| MtbError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        debug!(%url, "fetching page");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MtbError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MtbError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|e| MtbError::ResponseBody {
            url: url.to_string(),
            source: e,
        })
    }
}
