use crate::BotError;
use anyhow::anyhow;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

pub mod models;

use models::Tournament;

/// Describes the API that the bot uses to read the Clash schedule.
///
/// Implemented against the Riot API in production; tests can substitute a
/// canned implementation to drive the check pipeline without the network.
#[allow(async_fn_in_trait)]
pub trait ClashApi {
    /// The error type that the API can return. You can usually just use BotError.
    type Error;

    /// Creates a new instance of the API with the given token and region.
    fn new(token: &str, region: &str) -> Self;

    /// Retrieves every Clash tournament currently published for the region,
    /// including its per-day schedule.
    async fn fetch_tournaments(&self) -> Result<ApiResult<Vec<Tournament>>, Self::Error>;
}

/// Wrapper for the result of an API call.
pub enum ApiResult<M> {
    Ok(M),
    NotFound,
    RateLimited,
    Maintenance,
}

impl<M> ApiResult<M>
where
    M: DeserializeOwned,
{
    /// Create an API result from a response.
    ///
    /// If the response code is 200, an Ok variant will be returned containing the json data.
    ///
    /// Errors if the response code is something that is either not covered by the API
    /// documentation or is not something that can be appropriately dealt with by the bot.
    pub async fn from_response(response: Response) -> Result<Self, BotError> {
        match response.status() {
            StatusCode::OK => Ok(ApiResult::Ok(response.json().await?)),
            StatusCode::NOT_FOUND => Ok(ApiResult::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Ok(ApiResult::RateLimited),
            StatusCode::SERVICE_UNAVAILABLE => Ok(ApiResult::Maintenance),
            _ => Err(anyhow!(
                "Request failed with status code: {}\n\nResponse details: {:#?}",
                response.status(),
                response
            )),
        }
    }
}

/// The API endpoint to retrieve resources from.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    fn new(url: String) -> Self {
        Self { url }
    }

    /// Append a path to retrieve a specific resource from the endpoint.
    fn append_path(&self, path: &str) -> String {
        let mut full_url = self.url.clone();

        full_url.push_str(path);

        full_url
    }
}

/// The Riot Clash API.
#[derive(Debug, Clone)]
pub struct RiotApi {
    /// The API token used to authenticate with the Riot API. You can get your own from the [Riot developer portal](https://developer.riotgames.com/).
    token: String,
    /// The reqwest client used to make HTTP requests to the Riot API.
    client: Client,
    /// The API endpoint to request resources from.
    endpoint: Endpoint,
}

impl ClashApi for RiotApi {
    type Error = BotError;

    /// Create a new API client for the given platform region (e.g. `na1`, `euw1`).
    fn new(token: &str, region: &str) -> Self {
        Self {
            token: token.to_string(),
            client: Client::new(),
            endpoint: Endpoint::new(format!("https://{}.api.riotgames.com/lol/", region)),
        }
    }

    /// Get the full list of published Clash tournaments for the region.
    async fn fetch_tournaments(&self) -> Result<ApiResult<Vec<Tournament>>, Self::Error> {
        let response = self
            .client
            .get(&self.endpoint.append_path("clash/v1/tournaments"))
            .header("X-Riot-Token", &self.token)
            .send()
            .await?;

        ApiResult::from_response(response).await
    }
}
