//! Live rename preview against fixed sample metadata.

use crate::providers::registry::fallback_variables;
use crate::providers::{MediaType, Metadata, ProviderRegistry, TemplateVariable};
use crate::rename_engine::{resolve_template, sanitize_filename, substitute_basic};

use super::models::{ProvidersState, Section};

pub const EPISODE_EXTENSION: &str = ".mkv";

pub fn sample_metadata(media_type: MediaType) -> Metadata {
    let show = Metadata::new()
        .with("show", "Breaking Bad")
        .with("year", 2008)
        .with("original_title", "Breaking Bad")
        .with("network", "AMC");

    match media_type {
        MediaType::Show => show.with("tmdb_id", 1396).with("tvdb_id", 81189),
        MediaType::Season => show
            .with("season", 1)
            .with("season_padded", "01")
            .with("season_name", "Season 1"),
        MediaType::Episode => show
            .with("season", 1)
            .with("season_padded", "01")
            .with("episode", 1)
            .with("episode_padded", "01")
            .with("episode_title", "Pilot")
            .with("air_date", "2008-01-20")
            .with("absolute_episode", 1)
            .with("tmdb_id", 62085)
            .with("resolution", "1080p")
            .with("video_codec", "h264")
            .with("audio_codec", "aac")
            .with("hdr", "SDR"),
        MediaType::Movie => Metadata::new()
            .with("title", "The Matrix")
            .with("year", 1999)
            .with("original_title", "The Matrix")
            .with("tmdb_id", 603)
            .with("tvdb_id", 169)
            .with("resolution", "2160p")
            .with("video_codec", "hevc")
            .with("audio_codec", "truehd")
            .with("hdr", "HDR10"),
    }
}

/// Variables to offer in a template section, falling back to the built-in
/// list when the registry has none.
pub fn variables_for(section: Section, registry: Option<&ProviderRegistry>, providers: &ProvidersState) -> Vec<TemplateVariable> {
    let Some(media_type) = section.media_type() else {
        return Vec::new();
    };

    match registry {
        Some(registry) if registry.has_variables(media_type) => registry.variables_for(media_type, providers),
        _ => fallback_variables(media_type),
    }
}

/// Resolve `template` the way a real rename would. `None` outside template
/// sections.
pub fn render(
    section: Section,
    template: &str,
    providers: &ProvidersState,
    registry: Option<&ProviderRegistry>,
) -> Option<String> {
    let media_type = section.media_type()?;
    let sample = sample_metadata(media_type);

    let resolved = match registry {
        Some(registry) if registry.has_variables(media_type) => {
            let available = registry.variables_for(media_type, providers);
            resolve_template(template, &sample, |name| available.iter().any(|v| v.name == name))
        }
        _ => substitute_basic(template, &sample),
    };

    let mut preview = sanitize_filename(&resolved);
    if media_type == MediaType::Episode {
        preview.push_str(EPISODE_EXTENSION);
    }
    Some(preview)
}
