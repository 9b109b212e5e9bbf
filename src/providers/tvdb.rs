use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{
    FetchRequest, MediaType, Metadata, MetadataProvider, ProviderError, ProviderId,
    ProviderOptions, TemplateVariable, vars,
};

const BASE_URL: &str = "https://api4.thetvdb.com/v4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    tvdb_id: Option<String>,
    name: Option<String>,
    year: Option<String>,
    network: Option<String>,
}

/// TVDB v4 client. The API key is exchanged for a bearer token on first use.
pub struct TvdbProvider {
    client: reqwest::Client,
    base_url: String,
    options: ProviderOptions,
    token: Mutex<Option<String>>,
    cache: Mutex<HashMap<String, Metadata>>,
}

impl TvdbProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
            options: ProviderOptions::default(),
            token: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn token(&self) -> Result<String, ProviderError> {
        if let Some(token) = self.token.lock().ok().and_then(|t| t.clone()) {
            return Ok(token);
        }

        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&json!({ "apikey": self.options.api_key }))
            .send()
            .await?;

        check_status(response.status())?;
        let login: LoginResponse = serde_json::from_str(&response.text().await?)?;

        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(login.data.token.clone());
        }
        Ok(login.data.token)
    }
}

impl Default for TvdbProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Auth(ProviderId::Tvdb)),
        status if !status.is_success() => Err(ProviderError::Status {
            provider: ProviderId::Tvdb,
            status: status.as_u16(),
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl MetadataProvider for TvdbProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Tvdb
    }

    fn configure(&mut self, options: ProviderOptions) -> Result<(), ProviderError> {
        if options.api_key != self.options.api_key {
            if let Ok(mut token) = self.token.lock() {
                *token = None;
            }
        }
        if !options.cache_enabled {
            if let Ok(mut cache) = self.cache.lock() {
                cache.clear();
            }
        }
        self.options = options;
        Ok(())
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Metadata, ProviderError> {
        if self.options.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(ProviderId::Tvdb));
        }

        let cache_key = format!("{:?}|{}|{:?}", request.media_type, request.name.to_lowercase(), request.year);
        if self.options.cache_enabled {
            if let Some(hit) = self.cache.lock().ok().and_then(|c| c.get(&cache_key).cloned()) {
                return Ok(hit);
            }
        }

        let token = self.token().await?;
        let kind = match request.media_type {
            MediaType::Movie => "movie",
            _ => "series",
        };

        let mut query: Vec<(&str, String)> = vec![("query", request.name.clone()), ("type", kind.to_string())];
        if let Some(year) = request.year {
            query.push(("year", year.to_string()));
        }

        tracing::debug!(name = %request.name, kind, "TVDB search");
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        check_status(response.status())?;
        let body: SearchResponse = serde_json::from_str(&response.text().await?)?;
        let hit = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(request.name.clone()))?;

        let metadata = to_metadata(request.media_type, hit);
        if self.options.cache_enabled {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(cache_key, metadata.clone());
            }
        }
        Ok(metadata)
    }

    fn supported_variables(&self, media_type: MediaType) -> Vec<TemplateVariable> {
        match media_type {
            MediaType::Show => vars(&[
                ("tvdb_id", "TVDB series id", "81189"),
                ("network", "Original network", "AMC"),
            ]),
            MediaType::Season => vars(&[("season_name", "Season name", "Season 1")]),
            MediaType::Episode => vars(&[
                ("episode_title", "Episode title", "Pilot"),
                ("air_date", "Original air date", "2008-01-20"),
                ("absolute_episode", "Absolute episode number", "1"),
            ]),
            MediaType::Movie => vars(&[("tvdb_id", "TVDB movie id", "169")]),
        }
    }
}

fn to_metadata(media_type: MediaType, hit: SearchHit) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(id) = hit.tvdb_id {
        metadata.insert("tvdb_id", id);
    }
    if let Some(name) = hit.name {
        let key = if media_type == MediaType::Movie { "title" } else { "show" };
        metadata.insert(key, name);
    }
    if let Some(year) = hit.year {
        metadata.insert("year", year);
    }
    if let Some(network) = hit.network {
        metadata.insert("network", network);
    }
    metadata
}
