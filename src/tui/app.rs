use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::{Config, ConfigStore, LoggingConfig, ProvidersConfig, RenameConfig, TemplatesConfig};
use crate::error::ConfigError;
use crate::providers::{ApiProvider, ProviderRegistry, TemplateVariable};

use super::focus::{self, Direction};
use super::models::{
    InputKind, LoggingField, LoggingState, ProviderField, ProviderServiceState, ProvidersState,
    RenameBehaviorField, RenameBehaviorState, Section, TextInput,
};
use super::preview;
use super::validation::{self, DEBOUNCE, Effect};

const STATUS_TTL: Duration = Duration::from_secs(3);
pub const SAVED_MESSAGE: &str = "Configuration saved";
pub const RESET_MESSAGE: &str = "Reset to saved values";

/// Everything that can change the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Key(KeyEvent),
    Tick,
    DebounceElapsed {
        provider: ApiProvider,
        key: String,
    },
    ValidationFinished {
        provider: ApiProvider,
        key: String,
        valid: bool,
    },
    Save,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub show_folder: TextInput,
    pub season_folder: TextInput,
    pub episode: TextInput,
    pub movie: TextInput,
}

impl Templates {
    fn from_config(config: &TemplatesConfig) -> Self {
        Self {
            show_folder: TextInput::new(&config.show_folder),
            season_folder: TextInput::new(&config.season_folder),
            episode: TextInput::new(&config.episode),
            movie: TextInput::new(&config.movie),
        }
    }

    fn to_config(&self) -> TemplatesConfig {
        TemplatesConfig {
            show_folder: self.show_folder.as_str().to_string(),
            season_folder: self.season_folder.as_str().to_string(),
            episode: self.episode.as_str().to_string(),
            movie: self.movie.as_str().to_string(),
        }
    }

    pub fn get(&self, section: Section) -> Option<&TextInput> {
        match section {
            Section::ShowFolderTemplate => Some(&self.show_folder),
            Section::SeasonFolderTemplate => Some(&self.season_folder),
            Section::EpisodeTemplate => Some(&self.episode),
            Section::MovieTemplate => Some(&self.movie),
            _ => None,
        }
    }

    fn get_mut(&mut self, section: Section) -> Option<&mut TextInput> {
        match section {
            Section::ShowFolderTemplate => Some(&mut self.show_folder),
            Section::SeasonFolderTemplate => Some(&mut self.season_folder),
            Section::EpisodeTemplate => Some(&mut self.episode),
            Section::MovieTemplate => Some(&mut self.movie),
            _ => None,
        }
    }
}

/// The configuration model. `update` is the only way to change it.
pub struct App {
    section: Section,
    templates: Templates,
    rename: RenameBehaviorState,
    logging: LoggingState,
    providers: ProvidersState,
    previews: Vec<(Section, String)>,
    preview_scroll: u16,
    status_message: Option<String>,
    status_message_time: Option<Instant>,
    saved: Config,
    store: Box<dyn ConfigStore>,
    registry: Option<ProviderRegistry>,
    debounce: Duration,
}

impl App {
    /// Load the persisted configuration. A load failure is fatal.
    pub fn load(store: Box<dyn ConfigStore>) -> Result<Self, ConfigError> {
        let config = store.load()?;
        Ok(Self::with_config(config, store))
    }

    pub fn with_config(config: Config, store: Box<dyn ConfigStore>) -> Self {
        let mut app = Self {
            section: Section::ALL[0],
            templates: Templates::from_config(&config.templates),
            rename: RenameBehaviorState::from_config(&config.rename),
            logging: LoggingState::from_config(&config.logging),
            providers: ProvidersState::from_config(&config),
            previews: Vec::new(),
            preview_scroll: 0,
            status_message: None,
            status_message_time: None,
            saved: config,
            store,
            registry: Some(ProviderRegistry::with_builtin_providers()),
            debounce: DEBOUNCE,
        };
        app.refresh_previews();
        app
    }

    pub fn with_registry(mut self, registry: Option<ProviderRegistry>) -> Self {
        self.registry = registry;
        self.refresh_previews();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn rename(&self) -> &RenameBehaviorState {
        &self.rename
    }

    pub fn logging(&self) -> &LoggingState {
        &self.logging
    }

    pub fn providers(&self) -> &ProvidersState {
        &self.providers
    }

    pub fn saved(&self) -> &Config {
        &self.saved
    }

    pub fn preview_scroll(&self) -> u16 {
        self.preview_scroll
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn preview(&self, section: Section) -> Option<&str> {
        self.previews
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, p)| p.as_str())
    }

    /// Variables offered for the active section.
    pub fn variables(&self) -> Vec<TemplateVariable> {
        self.variables_for(self.section)
    }

    pub fn variables_for(&self, section: Section) -> Vec<TemplateVariable> {
        preview::variables_for(section, self.registry.as_ref(), &self.providers)
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Tick => {
                self.clear_status_message_if_expired();
                Vec::new()
            }
            Message::DebounceElapsed { provider, key } => {
                validation::on_debounce_elapsed(provider, self.providers.service_mut(provider), &key)
                    .into_iter()
                    .collect()
            }
            Message::ValidationFinished { provider, key, valid } => {
                let applied = validation::on_validation_finished(self.providers.service_mut(provider), &key, valid);
                tracing::debug!(%provider, valid, applied, "Validation finished");
                Vec::new()
            }
            Message::Save => {
                self.save();
                Vec::new()
            }
            Message::Reset => self.reset(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => return self.update(Message::Save),
            KeyCode::Char('r') if ctrl => return self.update(Message::Reset),
            KeyCode::Char(_) if ctrl => return Vec::new(),
            KeyCode::Tab => return self.advance_section(Direction::Next),
            KeyCode::BackTab => return self.advance_section(Direction::Prev),
            _ => {}
        }

        match self.section {
            Section::RenameBehavior => {
                self.handle_rename_key(key.code);
                Vec::new()
            }
            Section::Logging => {
                self.handle_logging_key(key.code);
                Vec::new()
            }
            Section::Providers => self.handle_providers_key(key.code),
            template => {
                self.handle_template_key(template, key.code);
                Vec::new()
            }
        }
    }

    /// Move to the next or previous section. Entering Providers re-checks
    /// every enabled provider's key.
    pub fn advance_section(&mut self, direction: Direction) -> Vec<Effect> {
        let old = self.section;
        self.reset_sub_focus(old);
        self.section = old.advance(direction);
        self.reset_sub_focus(self.section);
        self.preview_scroll = 0;

        if self.section != Section::Providers {
            return Vec::new();
        }

        ApiProvider::ALL
            .into_iter()
            .filter_map(|provider| validation::checkpoint(provider, self.providers.service_mut(provider)))
            .collect()
    }

    fn reset_sub_focus(&mut self, section: Section) {
        match section {
            Section::RenameBehavior => self.rename.focus = RenameBehaviorField::default(),
            Section::Logging => self.logging.focus = LoggingField::default(),
            Section::Providers => self.providers.focus = ProviderField::WorkerCount,
            _ => {}
        }
    }

    fn handle_template_key(&mut self, section: Section, code: KeyCode) {
        match code {
            KeyCode::Up => self.preview_scroll = self.preview_scroll.saturating_sub(1),
            KeyCode::Down => self.preview_scroll = self.preview_scroll.saturating_add(1),
            _ => {
                let Some(input) = self.templates.get_mut(section) else {
                    return;
                };
                if edit_text(input, code, InputKind::Template) {
                    self.refresh_previews();
                }
            }
        }
    }

    fn handle_rename_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.rename.focus = self.rename.focus.advance(Direction::Prev),
            KeyCode::Down => self.rename.focus = self.rename.focus.advance(Direction::Next),
            KeyCode::Char(' ') | KeyCode::Enter => match self.rename.focus {
                RenameBehaviorField::IncludeSubtitles => self.rename.include_subtitles = !self.rename.include_subtitles,
                RenameBehaviorField::DryRun => self.rename.dry_run = !self.rename.dry_run,
            },
            _ => {}
        }
    }

    fn handle_logging_key(&mut self, code: KeyCode) {
        match (self.logging.focus, code) {
            (_, KeyCode::Up) => self.logging.focus = self.logging.focus.advance(Direction::Prev),
            (_, KeyCode::Down) => self.logging.focus = self.logging.focus.advance(Direction::Next),
            (LoggingField::Enabled, KeyCode::Char(' ') | KeyCode::Enter) => {
                self.logging.enabled = !self.logging.enabled;
            }
            (LoggingField::RetentionDays, code) => {
                edit_text(&mut self.logging.retention_days, code, InputKind::Digits);
            }
            _ => {}
        }
    }

    fn handle_providers_key(&mut self, code: KeyCode) -> Vec<Effect> {
        match code {
            KeyCode::Up => {
                self.providers.focus = focus::move_provider_focus(&self.providers, Direction::Prev);
                return Vec::new();
            }
            KeyCode::Down => {
                self.providers.focus = focus::move_provider_focus(&self.providers, Direction::Next);
                return Vec::new();
            }
            _ => {}
        }

        let toggle = matches!(code, KeyCode::Char(' ') | KeyCode::Enter);
        match self.providers.focus {
            ProviderField::WorkerCount => {
                edit_text(&mut self.providers.worker_count, code, InputKind::Digits);
                Vec::new()
            }
            ProviderField::FFProbeToggle if toggle => {
                self.providers.ffprobe_enabled = !self.providers.ffprobe_enabled;
                self.refresh_previews();
                Vec::new()
            }
            ProviderField::Toggle(provider) if toggle => self.toggle_provider(provider),
            ProviderField::ApiKey(provider) => {
                let debounce = self.debounce;
                let service = self.providers.service_mut(provider);
                if !service.enabled {
                    return Vec::new();
                }
                if edit_text(&mut service.api_key, code, InputKind::Secret) {
                    vec![validation::on_credential_edited(provider, service, debounce)]
                } else {
                    Vec::new()
                }
            }
            ProviderField::Language(provider) => {
                let service = self.providers.service_mut(provider);
                if let (true, Some(language)) = (service.enabled, service.language.as_mut()) {
                    edit_text(language, code, InputKind::Language);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn toggle_provider(&mut self, provider: ApiProvider) -> Vec<Effect> {
        let service = self.providers.service_mut(provider);
        let effects = if service.enabled {
            validation::on_disabled(service);
            Vec::new()
        } else {
            service.enabled = true;
            validation::checkpoint(provider, service).into_iter().collect()
        };

        self.providers.focus = focus::reachable_focus(&self.providers, self.providers.focus);
        self.refresh_previews();
        tracing::debug!(%provider, enabled = self.providers.service(provider).enabled, "Toggled provider");
        effects
    }

    fn refresh_previews(&mut self) {
        let registry = self.registry.as_ref();
        self.previews = Section::ALL
            .into_iter()
            .filter_map(|section| {
                let template = self.templates.get(section)?;
                preview::render(section, template.as_str(), &self.providers, registry).map(|p| (section, p))
            })
            .collect();
    }

    fn to_config(&self) -> Result<Config, ConfigError> {
        let workers: usize = self
            .providers
            .worker_count
            .as_str()
            .parse()
            .map_err(|_| ConfigError::invalid("workers", "must be a number"))?;
        if workers == 0 {
            return Err(ConfigError::invalid("workers", "must be at least 1"));
        }

        let retention_days: u32 = self
            .logging
            .retention_days
            .as_str()
            .parse()
            .map_err(|_| ConfigError::invalid("retention_days", "must be a number"))?;

        Ok(Config {
            templates: self.templates.to_config(),
            rename: RenameConfig {
                include_subtitles: self.rename.include_subtitles,
                dry_run: self.rename.dry_run,
            },
            logging: LoggingConfig {
                enabled: self.logging.enabled,
                retention_days,
            },
            providers: ProvidersConfig {
                workers,
                ffprobe_enabled: self.providers.ffprobe_enabled,
                tmdb: self.providers.tmdb.to_config(),
                tvdb: self.providers.tvdb.to_config(),
            },
        })
    }

    /// Persist the live values. The saved snapshot only advances when the
    /// store accepts them.
    fn save(&mut self) {
        let result = self.to_config().and_then(|config| {
            self.store.save(&config)?;
            Ok(config)
        });

        match result {
            Ok(config) => {
                self.saved = config;
                tracing::info!("Configuration saved");
                self.set_status_message(SAVED_MESSAGE.to_string());
            }
            Err(err) => {
                tracing::warn!("Save failed: {}", err);
                self.set_status_message(format!("Save failed: {err}"));
            }
        }
    }

    /// Restore every field from the saved snapshot.
    fn reset(&mut self) -> Vec<Effect> {
        let saved = self.saved.clone();
        self.templates = Templates::from_config(&saved.templates);
        self.rename = RenameBehaviorState {
            focus: self.rename.focus,
            ..RenameBehaviorState::from_config(&saved.rename)
        };
        self.logging = LoggingState {
            focus: self.logging.focus,
            ..LoggingState::from_config(&saved.logging)
        };
        self.providers.worker_count = TextInput::new(&saved.providers.workers.to_string());
        self.providers.ffprobe_enabled = saved.providers.ffprobe_enabled;

        let mut effects = Vec::new();
        for provider in ApiProvider::ALL {
            let config = match provider {
                ApiProvider::Tmdb => &saved.providers.tmdb,
                ApiProvider::Tvdb => &saved.providers.tvdb,
            };
            let service = self.providers.service_mut(provider);
            let mut restored = ProviderServiceState::from_config(provider, config);
            if restored.enabled && service.enabled {
                restored.validation = service.validation.clone();
                if restored.key() != service.key() {
                    restored.validation.status = Default::default();
                }
            }
            *service = restored;
            effects.extend(validation::checkpoint(provider, service));
        }

        self.providers.focus = focus::reachable_focus(&self.providers, self.providers.focus);
        self.refresh_previews();
        tracing::info!("Reset to saved configuration");
        self.set_status_message(RESET_MESSAGE.to_string());
        effects
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_message_time = Some(Instant::now());
    }

    pub fn clear_status_message_if_expired(&mut self) {
        if let (Some(_), Some(time)) = (&self.status_message, self.status_message_time) {
            if time.elapsed() > STATUS_TTL {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

/// Apply an editing key to `input`. Returns whether the text changed.
fn edit_text(input: &mut TextInput, code: KeyCode, kind: InputKind) -> bool {
    match code {
        KeyCode::Char(c) if kind.accepts(c) => {
            input.insert(c);
            true
        }
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => {
            input.left();
            false
        }
        KeyCode::Right => {
            input.right();
            false
        }
        KeyCode::Home => {
            input.home();
            false
        }
        KeyCode::End => {
            input.end();
            false
        }
        _ => false,
    }
}
