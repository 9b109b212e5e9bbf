use crate::config::{Config, LoggingConfig, RenameConfig, ServiceConfig};
use crate::providers::registry::ProviderStatus;
use crate::providers::{ApiProvider, MediaType, ProviderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ShowFolderTemplate,
    SeasonFolderTemplate,
    EpisodeTemplate,
    MovieTemplate,
    RenameBehavior,
    Logging,
    Providers,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::ShowFolderTemplate,
        Section::SeasonFolderTemplate,
        Section::EpisodeTemplate,
        Section::MovieTemplate,
        Section::RenameBehavior,
        Section::Logging,
        Section::Providers,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::ShowFolderTemplate => "Show Folder",
            Section::SeasonFolderTemplate => "Season Folder",
            Section::EpisodeTemplate => "Episode File",
            Section::MovieTemplate => "Movie File",
            Section::RenameBehavior => "Rename Behavior",
            Section::Logging => "Logging",
            Section::Providers => "Providers",
        }
    }

    /// Media type a template section names, if it is one.
    pub fn media_type(self) -> Option<MediaType> {
        match self {
            Section::ShowFolderTemplate => Some(MediaType::Show),
            Section::SeasonFolderTemplate => Some(MediaType::Season),
            Section::EpisodeTemplate => Some(MediaType::Episode),
            Section::MovieTemplate => Some(MediaType::Movie),
            _ => None,
        }
    }

    pub fn is_template(self) -> bool {
        self.media_type().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderField {
    WorkerCount,
    FFProbeToggle,
    Toggle(ApiProvider),
    ApiKey(ApiProvider),
    Language(ApiProvider),
}

impl ProviderField {
    pub fn provider(self) -> Option<ApiProvider> {
        match self {
            ProviderField::Toggle(p) | ProviderField::ApiKey(p) | ProviderField::Language(p) => Some(p),
            ProviderField::WorkerCount | ProviderField::FFProbeToggle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingField {
    #[default]
    Enabled,
    RetentionDays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameBehaviorField {
    #[default]
    IncludeSubtitles,
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationStatus {
    #[default]
    Unknown,
    Validating,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationState {
    pub status: ValidationStatus,
    pub last_validated_key: String,
    /// Terminal outcome of the round-trip for `last_validated_key`.
    pub(crate) last_outcome: Option<ValidationStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderServiceState {
    pub enabled: bool,
    pub api_key: TextInput,
    pub language: Option<TextInput>,
    pub validation: ValidationState,
}

impl ProviderServiceState {
    pub fn from_config(provider: ApiProvider, config: &ServiceConfig) -> Self {
        let language = provider
            .supports_language()
            .then(|| TextInput::new(config.language.as_deref().unwrap_or_default()));
        Self {
            enabled: config.enabled,
            api_key: TextInput::new(&config.api_key),
            language,
            validation: ValidationState::default(),
        }
    }

    pub fn to_config(&self) -> ServiceConfig {
        ServiceConfig {
            enabled: self.enabled,
            api_key: self.api_key.as_str().to_string(),
            language: self.language.as_ref().map(|l| l.as_str().to_string()),
        }
    }

    pub fn key(&self) -> &str {
        self.api_key.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidersState {
    pub worker_count: TextInput,
    pub focus: ProviderField,
    pub ffprobe_enabled: bool,
    pub tmdb: ProviderServiceState,
    pub tvdb: ProviderServiceState,
}

impl ProvidersState {
    pub fn from_config(config: &Config) -> Self {
        let providers = &config.providers;
        Self {
            worker_count: TextInput::new(&providers.workers.to_string()),
            focus: ProviderField::WorkerCount,
            ffprobe_enabled: providers.ffprobe_enabled,
            tmdb: ProviderServiceState::from_config(ApiProvider::Tmdb, &providers.tmdb),
            tvdb: ProviderServiceState::from_config(ApiProvider::Tvdb, &providers.tvdb),
        }
    }

    pub fn service(&self, provider: ApiProvider) -> &ProviderServiceState {
        match provider {
            ApiProvider::Tmdb => &self.tmdb,
            ApiProvider::Tvdb => &self.tvdb,
        }
    }

    pub fn service_mut(&mut self, provider: ApiProvider) -> &mut ProviderServiceState {
        match provider {
            ApiProvider::Tmdb => &mut self.tmdb,
            ApiProvider::Tvdb => &mut self.tvdb,
        }
    }
}

impl ProviderStatus for ProvidersState {
    fn is_enabled(&self, provider: ProviderId) -> bool {
        match provider {
            ProviderId::Local => true,
            ProviderId::FFProbe => self.ffprobe_enabled,
            ProviderId::Tmdb => self.tmdb.enabled,
            ProviderId::Tvdb => self.tvdb.enabled,
            ProviderId::Other(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingState {
    pub enabled: bool,
    pub retention_days: TextInput,
    pub focus: LoggingField,
}

impl LoggingState {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            retention_days: TextInput::new(&config.retention_days.to_string()),
            focus: LoggingField::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameBehaviorState {
    pub include_subtitles: bool,
    pub dry_run: bool,
    pub focus: RenameBehaviorField,
}

impl RenameBehaviorState {
    pub fn from_config(config: &RenameConfig) -> Self {
        Self {
            include_subtitles: config.include_subtitles,
            dry_run: config.dry_run,
            focus: RenameBehaviorField::default(),
        }
    }
}

/// Which characters a text field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Digits,
    Language,
    Template,
    Secret,
}

impl InputKind {
    pub fn accepts(self, c: char) -> bool {
        match self {
            InputKind::Digits => c.is_ascii_digit(),
            InputKind::Language => c.is_ascii_alphabetic() || c == '-',
            InputKind::Template => !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'),
            InputKind::Secret => c.is_ascii_graphic(),
        }
    }
}

/// Single-line text with a cursor counted in chars.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set(&mut self, text: &str) {
        *self = Self::new(text);
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Returns whether anything was removed.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.text.chars().count() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}
