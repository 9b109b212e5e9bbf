// Integration tests for the configuration model and its async effects

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;
use tokio::sync::mpsc;

use media_rename::config::{Config, ConfigStore, FileConfigStore, MemoryConfigStore};
use media_rename::providers::{
    ApiProvider, FetchRequest, MediaType, Metadata, MetadataProvider, ProviderError, ProviderId, ProviderOptions,
    TemplateVariable,
};
use media_rename::tui::events::{EffectRunner, dispatch};
use media_rename::tui::focus::Direction;
use media_rename::tui::models::{ProviderField, Section, ValidationStatus};
use media_rename::tui::validation::{Effect, ProviderFactory};
use media_rename::tui::{App, Message};

const GOOD_KEY: &str = "good-key";

#[derive(Default)]
struct FakeProvider {
    options: ProviderOptions,
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Tmdb
    }

    fn configure(&mut self, options: ProviderOptions) -> Result<(), ProviderError> {
        self.options = options;
        Ok(())
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Metadata, ProviderError> {
        if self.options.api_key != GOOD_KEY {
            return Err(ProviderError::Auth(ProviderId::Tmdb));
        }
        Ok(Metadata::new().with("title", &request.name))
    }

    fn supported_variables(&self, _media_type: MediaType) -> Vec<TemplateVariable> {
        Vec::new()
    }
}

fn fake_factory() -> ProviderFactory {
    Arc::new(|_| Box::new(FakeProvider::default()) as Box<dyn MetadataProvider>)
}

fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn ctrl(c: char) -> Message {
    Message::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

fn tmdb_enabled() -> Config {
    let mut config = Config::default();
    config.providers.tmdb.enabled = true;
    config
}

struct Harness {
    app: App,
    runner: EffectRunner,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Harness {
    fn new(config: Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::with_config(config, Box::new(MemoryConfigStore::default()))
            .with_debounce(Duration::from_millis(20));
        Self {
            app,
            runner: EffectRunner::new(tx, fake_factory()),
            rx,
        }
    }

    fn send(&mut self, message: Message) {
        dispatch(&mut self.app, &self.runner, message);
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.send(key(KeyCode::Char(c)));
        }
    }

    fn go_to(&mut self, section: Section) {
        while self.app.section() != section {
            self.send(key(KeyCode::Tab));
        }
    }

    fn focus(&mut self, field: ProviderField) {
        for _ in 0..10 {
            if self.app.providers().focus == field {
                return;
            }
            self.send(key(KeyCode::Down));
        }
        panic!("{field:?} is not reachable");
    }

    fn status(&self) -> ValidationStatus {
        self.app.providers().tmdb.validation.status
    }

    /// Deliver messages until TMDB reaches a terminal status.
    async fn settle(&mut self) -> ValidationStatus {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !matches!(self.status(), ValidationStatus::Valid | ValidationStatus::Invalid) {
            let message = tokio::time::timeout_at(deadline, self.rx.recv())
                .await
                .expect("validation did not finish in time")
                .expect("channel closed");
            self.send(message);
        }
        self.status()
    }
}

#[tokio::test]
async fn test_invalid_key_reaches_terminal_invalid() {
    let mut h = Harness::new(tmdb_enabled());
    h.go_to(Section::Providers);
    h.focus(ProviderField::ApiKey(ApiProvider::Tmdb));

    h.type_text("invalid123");
    assert_eq!(h.status(), ValidationStatus::Unknown);

    assert_eq!(h.settle().await, ValidationStatus::Invalid);
    assert_eq!(h.app.providers().tmdb.validation.last_validated_key, "invalid123");
}

#[tokio::test]
async fn test_good_key_is_not_rechecked_on_section_entry() {
    let mut h = Harness::new(tmdb_enabled());
    h.go_to(Section::Providers);
    h.focus(ProviderField::ApiKey(ApiProvider::Tmdb));
    h.type_text(GOOD_KEY);
    assert_eq!(h.settle().await, ValidationStatus::Valid);

    h.send(key(KeyCode::Tab));
    let effects = h.app.advance_section(Direction::Prev);

    assert_eq!(h.app.section(), Section::Providers);
    assert!(effects.is_empty());
    assert_eq!(h.status(), ValidationStatus::Valid);
}

#[tokio::test]
async fn test_disabling_after_validation_resets_record() {
    let mut h = Harness::new(tmdb_enabled());
    h.go_to(Section::Providers);
    h.focus(ProviderField::ApiKey(ApiProvider::Tmdb));
    h.type_text("nope");
    h.settle().await;

    h.send(key(KeyCode::Up));
    assert_eq!(h.app.providers().focus, ProviderField::Toggle(ApiProvider::Tmdb));
    h.send(key(KeyCode::Char(' ')));

    let tmdb = &h.app.providers().tmdb;
    assert!(!tmdb.enabled);
    assert_eq!(tmdb.validation.status, ValidationStatus::Unknown);
    assert_eq!(tmdb.validation.last_validated_key, "");
}

#[test]
fn test_superseded_results_are_dropped() {
    let mut app = App::with_config(tmdb_enabled(), Box::new(MemoryConfigStore::default()));
    while app.section() != Section::Providers {
        app.update(key(KeyCode::Tab));
    }
    while app.providers().focus != ProviderField::ApiKey(ApiProvider::Tmdb) {
        app.update(key(KeyCode::Down));
    }

    for c in "abc".chars() {
        app.update(key(KeyCode::Char(c)));
    }

    let stale = app.update(Message::DebounceElapsed {
        provider: ApiProvider::Tmdb,
        key: "ab".to_string(),
    });
    assert!(stale.is_empty());

    let live = app.update(Message::DebounceElapsed {
        provider: ApiProvider::Tmdb,
        key: "abc".to_string(),
    });
    assert!(matches!(live.as_slice(), [Effect::Validate(request)] if request.key == "abc"));
    assert_eq!(app.providers().tmdb.validation.status, ValidationStatus::Validating);

    app.update(key(KeyCode::Char('d')));
    app.update(Message::ValidationFinished {
        provider: ApiProvider::Tmdb,
        key: "abc".to_string(),
        valid: true,
    });

    let validation = &app.providers().tmdb.validation;
    assert_eq!(validation.status, ValidationStatus::Unknown);
    assert_eq!(validation.last_validated_key, "");
}

#[test]
fn test_save_then_reset_restores_saved_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let mut app = App::load(Box::new(FileConfigStore::new(&path))).unwrap();

    app.update(key(KeyCode::Home));
    for _ in 0..app.templates().show_folder.as_str().chars().count() {
        app.update(key(KeyCode::Delete));
    }
    for c in "Alpha".chars() {
        app.update(key(KeyCode::Char(c)));
    }
    app.update(ctrl('s'));
    assert_eq!(app.status_message(), Some("Configuration saved"));

    for _ in 0..5 {
        app.update(key(KeyCode::Backspace));
    }
    for c in "Beta".chars() {
        app.update(key(KeyCode::Char(c)));
    }
    assert_eq!(app.preview(Section::ShowFolderTemplate), Some("Beta"));

    app.update(ctrl('r'));
    assert_eq!(app.templates().show_folder.as_str(), "Alpha");
    assert_eq!(app.preview(Section::ShowFolderTemplate), Some("Alpha"));
    assert_eq!(app.status_message(), Some("Reset to saved values"));

    let reloaded = FileConfigStore::new(&path).load().unwrap();
    assert_eq!(reloaded.templates.show_folder, "Alpha");
}

#[test]
fn test_unparsable_config_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[providers\nworkers = ").unwrap();

    assert!(App::load(Box::new(FileConfigStore::new(&path))).is_err());
}

#[test]
fn test_enabling_provider_changes_preview() {
    let mut app = App::with_config(Config::default(), Box::new(MemoryConfigStore::default()));
    app.update(key(KeyCode::End));
    for c in " [{tvdb_id}]".chars() {
        app.update(key(KeyCode::Char(c)));
    }
    assert_eq!(
        app.preview(Section::ShowFolderTemplate),
        Some("Breaking Bad (2008) [{tvdb_id}]")
    );

    while app.section() != Section::Providers {
        app.update(key(KeyCode::Tab));
    }
    while app.providers().focus != ProviderField::Toggle(ApiProvider::Tvdb) {
        app.update(key(KeyCode::Down));
    }
    app.update(key(KeyCode::Enter));

    assert_eq!(app.preview(Section::ShowFolderTemplate), Some("Breaking Bad (2008) [81189]"));
}

fn validate_key(effects: &[Effect]) -> Option<&str> {
    match effects {
        [Effect::Validate(request)] => Some(request.key.as_str()),
        _ => None,
    }
}

#[tokio::test]
async fn test_reenabling_provider_revalidates_unedited_key() {
    let mut h = Harness::new(tmdb_enabled());
    h.go_to(Section::Providers);
    h.focus(ProviderField::ApiKey(ApiProvider::Tmdb));
    h.type_text(GOOD_KEY);
    assert_eq!(h.settle().await, ValidationStatus::Valid);

    h.send(key(KeyCode::Up));
    assert_eq!(h.app.providers().focus, ProviderField::Toggle(ApiProvider::Tmdb));

    let off = h.app.update(key(KeyCode::Char(' ')));
    assert!(off.is_empty());
    assert_eq!(h.app.providers().tmdb.key(), GOOD_KEY);

    let on = h.app.update(key(KeyCode::Char(' ')));
    assert_eq!(validate_key(&on), Some(GOOD_KEY));
    assert_eq!(h.status(), ValidationStatus::Validating);

    h.runner.run(on);
    assert_eq!(h.settle().await, ValidationStatus::Valid);
    assert_eq!(h.app.providers().tmdb.validation.last_validated_key, GOOD_KEY);
}

fn saved_key_config() -> Config {
    let mut config = tmdb_enabled();
    config.providers.tmdb.api_key = "saved-key".to_string();
    config
}

fn app_on_tmdb_key(config: Config) -> App {
    let mut app = App::with_config(config, Box::new(MemoryConfigStore::default()));
    while app.section() != Section::Providers {
        app.update(key(KeyCode::Tab));
    }
    while app.providers().focus != ProviderField::ApiKey(ApiProvider::Tmdb) {
        app.update(key(KeyCode::Down));
    }
    app
}

#[test]
fn test_reset_to_previously_checked_key_restores_outcome() {
    let mut app = app_on_tmdb_key(saved_key_config());
    app.update(Message::ValidationFinished {
        provider: ApiProvider::Tmdb,
        key: "saved-key".to_string(),
        valid: true,
    });
    app.update(key(KeyCode::Char('x')));
    assert_eq!(app.providers().tmdb.key(), "saved-keyx");

    let effects = app.update(ctrl('r'));

    assert_eq!(app.providers().tmdb.key(), "saved-key");
    assert_eq!(validate_key(&effects), None);
    assert_eq!(app.providers().tmdb.validation.status, ValidationStatus::Valid);
}

#[test]
fn test_reset_to_unchecked_saved_key_validates_it() {
    let mut app = app_on_tmdb_key(saved_key_config());
    app.update(key(KeyCode::Char('x')));
    app.update(Message::DebounceElapsed {
        provider: ApiProvider::Tmdb,
        key: "saved-keyx".to_string(),
    });
    app.update(Message::ValidationFinished {
        provider: ApiProvider::Tmdb,
        key: "saved-keyx".to_string(),
        valid: false,
    });
    assert_eq!(app.providers().tmdb.validation.status, ValidationStatus::Invalid);

    let effects = app.update(ctrl('r'));

    assert_eq!(validate_key(&effects), Some("saved-key"));
    assert_eq!(app.providers().tmdb.validation.status, ValidationStatus::Validating);
}

#[test]
fn test_reset_with_same_key_keeps_outcome() {
    let mut app = app_on_tmdb_key(saved_key_config());
    app.update(Message::ValidationFinished {
        provider: ApiProvider::Tmdb,
        key: "saved-key".to_string(),
        valid: true,
    });

    let effects = app.update(ctrl('r'));

    assert!(effects.is_empty());
    assert_eq!(app.providers().tmdb.validation.status, ValidationStatus::Valid);
    assert_eq!(app.providers().tmdb.validation.last_validated_key, "saved-key");
}

#[test]
fn test_reset_reenables_provider_disabled_since_save() {
    let mut app = app_on_tmdb_key(saved_key_config());
    app.update(Message::ValidationFinished {
        provider: ApiProvider::Tmdb,
        key: "saved-key".to_string(),
        valid: true,
    });
    app.update(key(KeyCode::Up));
    app.update(key(KeyCode::Enter));
    assert!(!app.providers().tmdb.enabled);

    let effects = app.update(ctrl('r'));

    assert!(app.providers().tmdb.enabled);
    assert_eq!(validate_key(&effects), Some("saved-key"));
    assert_eq!(app.providers().tmdb.validation.status, ValidationStatus::Validating);
}
