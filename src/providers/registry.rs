//! Template variables merged from every registered provider.

use std::collections::{BTreeMap, BTreeSet};

use super::ffprobe::FfprobeProvider;
use super::local::LocalProvider;
use super::tmdb::TmdbProvider;
use super::tvdb::TvdbProvider;
use super::{MediaType, MetadataProvider, ProviderId, TemplateVariable, vars};

/// Answers whether a provider is currently switched on.
pub trait ProviderStatus {
    fn is_enabled(&self, provider: ProviderId) -> bool;
}

#[derive(Debug, Clone)]
struct Entry {
    variable: TemplateVariable,
    owners: BTreeSet<ProviderId>,
    /// Declared by the local provider, so never gated.
    unowned: bool,
}

impl Entry {
    fn is_available(&self, status: &dyn ProviderStatus) -> bool {
        self.unowned || self.owners.iter().any(|owner| status.is_enabled(*owner))
    }

    fn priority(&self) -> u8 {
        if self.unowned {
            return ProviderId::Local.priority();
        }
        self.owners
            .iter()
            .map(|owner| owner.priority())
            .min()
            .unwrap_or(ProviderId::Other("").priority())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: BTreeMap<MediaType, Vec<Entry>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry over the local, TMDB, TVDB and ffprobe providers.
    pub fn with_builtin_providers() -> Self {
        let mut registry = Self::new();
        registry.register(&LocalProvider::new());
        registry.register(&TmdbProvider::new());
        registry.register(&TvdbProvider::new());
        registry.register(&FfprobeProvider::new());
        registry
    }

    pub fn register(&mut self, provider: &dyn MetadataProvider) {
        let id = provider.id();
        let owner = (id != ProviderId::Local).then_some(id);

        for media_type in MediaType::ALL {
            let entries = self.entries.entry(media_type).or_default();
            for variable in provider.supported_variables(media_type) {
                match entries.iter_mut().find(|e| e.variable.name == variable.name) {
                    Some(existing) => match owner {
                        Some(owner) => {
                            existing.owners.insert(owner);
                        }
                        None => existing.unowned = true,
                    },
                    None => entries.push(Entry {
                        variable,
                        owners: owner.into_iter().collect(),
                        unowned: owner.is_none(),
                    }),
                }
            }
        }

        tracing::debug!(provider = %id, "Registered template variables");
    }

    pub fn has_variables(&self, media_type: MediaType) -> bool {
        self.entries.get(&media_type).is_some_and(|e| !e.is_empty())
    }

    /// Available variables for a media type, ordered by provider priority
    /// then by `{name}` token.
    pub fn variables_for(&self, media_type: MediaType, status: &dyn ProviderStatus) -> Vec<TemplateVariable> {
        let Some(entries) = self.entries.get(&media_type) else {
            return Vec::new();
        };

        let mut available: Vec<&Entry> = entries.iter().filter(|e| e.is_available(status)).collect();
        available.sort_by_cached_key(|e| (e.priority(), e.variable.token()));
        available.into_iter().map(|e| e.variable.clone()).collect()
    }

    /// True when any declaration of `name` is unowned or has an enabled owner.
    pub fn is_variable_available(&self, name: &str, status: &dyn ProviderStatus) -> bool {
        self.entries
            .values()
            .flatten()
            .filter(|e| e.variable.name == name)
            .any(|e| e.is_available(status))
    }
}

/// Built-in list shown when the registry has nothing for a media type.
pub fn fallback_variables(media_type: MediaType) -> Vec<TemplateVariable> {
    match media_type {
        MediaType::Show => vars(&[
            ("show", "Series name", "Breaking Bad"),
            ("year", "First air year", "2008"),
        ]),
        MediaType::Season => vars(&[
            ("season", "Season number", "1"),
            ("season_padded", "Season number, two digits", "01"),
        ]),
        MediaType::Episode => vars(&[
            ("show", "Series name", "Breaking Bad"),
            ("season_padded", "Season number, two digits", "01"),
            ("episode_padded", "Episode number, two digits", "01"),
            ("episode_title", "Episode title", "Pilot"),
        ]),
        MediaType::Movie => vars(&[
            ("title", "Movie title", "The Matrix"),
            ("year", "Release year", "1999"),
        ]),
    }
}
