//! Metadata providers and the contract the editor consumes them through.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub mod ffprobe;
pub mod local;
pub mod registry;
pub mod tmdb;
pub mod tvdb;

pub use registry::ProviderRegistry;

/// Every provider the editor knows how to rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    Local,
    Tmdb,
    Tvdb,
    FFProbe,
    Other(&'static str),
}

impl ProviderId {
    /// Sort band for template variables. Lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            ProviderId::Local => 0,
            ProviderId::Tmdb => 1,
            ProviderId::Tvdb => 2,
            ProviderId::FFProbe => 3,
            ProviderId::Other(_) => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProviderId::Local => "Local",
            ProviderId::Tmdb => "TMDB",
            ProviderId::Tvdb => "TVDB",
            ProviderId::FFProbe => "FFProbe",
            ProviderId::Other(name) => name,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The API-backed providers, each with its own enable flag and credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiProvider {
    Tmdb,
    Tvdb,
}

impl ApiProvider {
    pub const ALL: [ApiProvider; 2] = [ApiProvider::Tmdb, ApiProvider::Tvdb];

    pub fn supports_language(self) -> bool {
        matches!(self, ApiProvider::Tmdb)
    }

    pub fn id(self) -> ProviderId {
        match self {
            ApiProvider::Tmdb => ProviderId::Tmdb,
            ApiProvider::Tvdb => ProviderId::Tvdb,
        }
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaType {
    Show,
    Season,
    Episode,
    Movie,
}

impl MediaType {
    pub const ALL: [MediaType; 4] = [
        MediaType::Show,
        MediaType::Season,
        MediaType::Episode,
        MediaType::Movie,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    pub name: String,
    pub description: String,
    pub example: String,
}

impl TemplateVariable {
    pub fn new(name: &str, description: &str, example: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            example: example.to_string(),
        }
    }

    /// The `{name}` form as it appears in templates.
    pub fn token(&self) -> String {
        format!("{{{}}}", self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOptions {
    pub api_key: String,
    pub language: Option<String>,
    pub cache_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub media_type: MediaType,
    pub name: String,
    pub year: Option<u32>,
    /// Needed only by providers that inspect the file itself.
    pub path: Option<PathBuf>,
}

impl FetchRequest {
    pub fn new(media_type: MediaType, name: impl Into<String>, year: Option<u32>) -> Self {
        Self {
            media_type,
            name: name.into(),
            year,
            path: None,
        }
    }
}

/// Variable values keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    values: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl ToString) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("authentication rejected by {0}")]
    Auth(ProviderId),

    #[error("no match for '{0}'")]
    NotFound(String),

    #[error("{0} has no API key configured")]
    NotConfigured(ProviderId),

    #[error("{0} cannot serve this request")]
    Unsupported(ProviderId),

    #[error("{provider} returned HTTP {status}")]
    Status { provider: ProviderId, status: u16 },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("probe failed: {0}")]
    Probe(String),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ProviderError::Auth(_))
    }
}

/// Capability contract for a metadata source.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn configure(&mut self, options: ProviderOptions) -> Result<(), ProviderError>;

    async fn fetch(&self, request: &FetchRequest) -> Result<Metadata, ProviderError>;

    fn supported_variables(&self, media_type: MediaType) -> Vec<TemplateVariable>;
}

/// Build a fresh, unconfigured client for an API-backed provider.
pub fn new_api_provider(provider: ApiProvider) -> Box<dyn MetadataProvider> {
    match provider {
        ApiProvider::Tmdb => Box::new(tmdb::TmdbProvider::new()),
        ApiProvider::Tvdb => Box::new(tvdb::TvdbProvider::new()),
    }
}

/// Shorthand used by provider variable tables.
pub(crate) fn vars(entries: &[(&str, &str, &str)]) -> Vec<TemplateVariable> {
    entries
        .iter()
        .map(|(name, description, example)| TemplateVariable::new(name, description, example))
        .collect()
}
