use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{
    FetchRequest, MediaType, Metadata, MetadataProvider, ProviderError, ProviderId,
    ProviderOptions, TemplateVariable, vars,
};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    original_title: Option<String>,
    original_name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

pub struct TmdbProvider {
    client: reqwest::Client,
    base_url: String,
    options: ProviderOptions,
    cache: Mutex<HashMap<String, Metadata>>,
}

impl TmdbProvider {
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
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(request: &FetchRequest) -> String {
        format!("{:?}|{}|{:?}", request.media_type, request.name.to_lowercase(), request.year)
    }

    fn cached(&self, key: &str) -> Option<Metadata> {
        if !self.options.cache_enabled {
            return None;
        }
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: String, metadata: &Metadata) {
        if !self.options.cache_enabled {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, metadata.clone());
        }
    }
}

impl Default for TmdbProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Tmdb
    }

    fn configure(&mut self, options: ProviderOptions) -> Result<(), ProviderError> {
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
            return Err(ProviderError::NotConfigured(ProviderId::Tmdb));
        }

        let key = Self::cache_key(request);
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let (endpoint, year_param) = match request.media_type {
            MediaType::Movie => ("search/movie", "year"),
            MediaType::Show | MediaType::Season | MediaType::Episode => ("search/tv", "first_air_date_year"),
        };

        let mut query: Vec<(&str, String)> = vec![
            ("api_key", self.options.api_key.clone()),
            ("query", request.name.clone()),
        ];
        if let Some(year) = request.year {
            query.push((year_param, year.to_string()));
        }
        if let Some(language) = &self.options.language {
            query.push(("language", language.clone()));
        }

        tracing::debug!(name = %request.name, endpoint, "TMDB search");
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(&query)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ProviderError::Auth(ProviderId::Tmdb)),
            status if !status.is_success() => {
                return Err(ProviderError::Status {
                    provider: ProviderId::Tmdb,
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let body: SearchResponse = serde_json::from_str(&response.text().await?)?;
        let first = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(request.name.clone()))?;

        let metadata = to_metadata(request.media_type, first);
        self.remember(key, &metadata);
        Ok(metadata)
    }

    fn supported_variables(&self, media_type: MediaType) -> Vec<TemplateVariable> {
        match media_type {
            MediaType::Show => vars(&[
                ("tmdb_id", "TMDB series id", "1396"),
                ("original_title", "Title in the original language", "Breaking Bad"),
            ]),
            MediaType::Season => vars(&[("season_name", "Season name", "Season 1")]),
            MediaType::Episode => vars(&[
                ("episode_title", "Episode title", "Pilot"),
                ("air_date", "Original air date", "2008-01-20"),
                ("tmdb_id", "TMDB episode id", "62085"),
            ]),
            MediaType::Movie => vars(&[
                ("tmdb_id", "TMDB movie id", "603"),
                ("original_title", "Title in the original language", "The Matrix"),
            ]),
        }
    }
}

fn to_metadata(media_type: MediaType, result: SearchResult) -> Metadata {
    let mut metadata = Metadata::new().with("tmdb_id", result.id);

    let (title, original, date) = match media_type {
        MediaType::Movie => (result.title, result.original_title, result.release_date),
        _ => (result.name, result.original_name, result.first_air_date),
    };

    if let Some(title) = title {
        let key = if media_type == MediaType::Movie { "title" } else { "show" };
        metadata.insert(key, title);
    }
    if let Some(original) = original {
        metadata.insert("original_title", original);
    }
    if let Some(year) = date.as_deref().and_then(|d| d.get(..4)).filter(|y| y.chars().all(|c| c.is_ascii_digit())) {
        metadata.insert("year", year);
    }

    metadata
}
