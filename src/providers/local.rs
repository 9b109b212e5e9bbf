use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{
    FetchRequest, MediaType, Metadata, MetadataProvider, ProviderError, ProviderId,
    ProviderOptions, TemplateVariable, vars,
};

static STANDARD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[\s._-]*S(?P<season>\d{1,2})E(?P<episode>\d{1,3})")
        .expect("standard episode pattern")
});

static FLEXIBLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[\s._-]*\b(?P<season>\d{1,2})x(?P<episode>\d{2,3})\b")
        .expect("flexible episode pattern")
});

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year pattern"));

static RELEASE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(2160p|1080p|720p|480p|bluray|blu-ray|web-dl|webrip|hdtv|x264|x265|hevc|h\.?264|h\.?265)\b.*$")
        .expect("release noise pattern")
});

/// Reads everything it can from the file name. Needs no configuration and
/// is never disabled.
#[derive(Debug, Default)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataProvider for LocalProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Local
    }

    fn configure(&mut self, _options: ProviderOptions) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Metadata, ProviderError> {
        let metadata = parse_name(request);
        if metadata.is_empty() {
            return Err(ProviderError::NotFound(request.name.clone()));
        }
        Ok(metadata)
    }

    fn supported_variables(&self, media_type: MediaType) -> Vec<TemplateVariable> {
        match media_type {
            MediaType::Show => vars(&[
                ("show", "Series name", "Breaking Bad"),
                ("year", "First air year", "2008"),
            ]),
            MediaType::Season => vars(&[
                ("show", "Series name", "Breaking Bad"),
                ("season", "Season number", "1"),
                ("season_padded", "Season number, two digits", "01"),
            ]),
            MediaType::Episode => vars(&[
                ("show", "Series name", "Breaking Bad"),
                ("year", "First air year", "2008"),
                ("season", "Season number", "1"),
                ("season_padded", "Season number, two digits", "01"),
                ("episode", "Episode number", "1"),
                ("episode_padded", "Episode number, two digits", "01"),
            ]),
            MediaType::Movie => vars(&[
                ("title", "Movie title", "The Matrix"),
                ("year", "Release year", "1999"),
            ]),
        }
    }
}

fn parse_name(request: &FetchRequest) -> Metadata {
    let mut metadata = Metadata::new();
    let name = strip_extension(&request.name);

    let year = request.year.or_else(|| extract_year(name));

    match request.media_type {
        MediaType::Movie => {
            let title_part = match year.and_then(|y| name.find(&y.to_string())) {
                Some(pos) => &name[..pos],
                None => name,
            };
            let title = clean_title(title_part);
            if !title.is_empty() {
                metadata.insert("title", title);
            }
        }
        MediaType::Show | MediaType::Season | MediaType::Episode => {
            if let Some((title, season, episode)) = extract_episode(name) {
                if !title.is_empty() {
                    metadata.insert("show", title);
                }
                metadata.insert("season", season);
                metadata.insert("season_padded", format!("{season:02}"));
                metadata.insert("episode", episode);
                metadata.insert("episode_padded", format!("{episode:02}"));
            } else {
                let title = clean_title(name);
                if !title.is_empty() {
                    metadata.insert("show", title);
                }
                if let Some(season) = extract_season_from_directory(name) {
                    metadata.insert("season", season);
                    metadata.insert("season_padded", format!("{season:02}"));
                }
            }
        }
    }

    if let Some(year) = year {
        metadata.insert("year", year);
    }

    metadata
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if (2..=4).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()) => stem,
        _ => name,
    }
}

fn extract_year(name: &str) -> Option<u32> {
    YEAR_PATTERN
        .find_iter(name)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

/// Title, season and episode from `Show.S01E02...` or `Show 1x02...`.
pub fn extract_episode(name: &str) -> Option<(String, u32, u32)> {
    let captures = STANDARD_PATTERN
        .captures(name)
        .or_else(|| FLEXIBLE_PATTERN.captures(name))?;

    let season = captures.name("season")?.as_str().parse().ok()?;
    let episode = captures.name("episode")?.as_str().parse().ok()?;
    let title = captures.name("title").map(|m| clean_title(m.as_str())).unwrap_or_default();

    Some((title, season, episode))
}

pub fn extract_season_from_directory(dir_name: &str) -> Option<u32> {
    static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        [
            r"\bs(?:eason\s*)?(\d+)\b",
            r"(\d+)(?:st|nd|rd|th)\s*season",
            r"series\s*(\d+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    });

    let lower = dir_name.to_lowercase();
    PATTERNS
        .iter()
        .filter_map(|re| re.captures(&lower))
        .find_map(|captures| captures.get(1)?.as_str().parse().ok())
}

/// Turn a dotted release name into a readable title.
pub fn clean_title(raw: &str) -> String {
    let without_noise = RELEASE_NOISE.replace(raw, "");
    let without_groups: String = {
        let mut depth = 0usize;
        without_noise
            .chars()
            .filter_map(|c| match c {
                '[' | '(' => {
                    depth += 1;
                    None
                }
                ']' | ')' => {
                    depth = depth.saturating_sub(1);
                    None
                }
                _ if depth > 0 => None,
                '.' | '_' | '+' => Some(' '),
                _ => Some(c),
            })
            .collect()
    };

    without_groups
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ' ')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_episode_standard() {
        assert_eq!(
            extract_episode("Breaking.Bad.S01E02.720p.mkv"),
            Some(("Breaking Bad".to_string(), 1, 2))
        );
    }

    #[test]
    fn test_extract_episode_flexible() {
        assert_eq!(
            extract_episode("The Office 2x05 Halloween"),
            Some(("The Office".to_string(), 2, 5))
        );
    }

    #[test]
    fn test_extract_season_from_directory() {
        assert_eq!(extract_season_from_directory("Show.S01"), Some(1));
        assert_eq!(extract_season_from_directory("Season 3"), Some(3));
        assert_eq!(extract_season_from_directory("Random.Folder"), None);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("The.Matrix.[YTS].1080p.BluRay"), "The Matrix");
        assert_eq!(clean_title("  Some_Show - "), "Some Show");
    }

    #[tokio::test]
    async fn test_fetch_movie_from_release_name() {
        let provider = LocalProvider::new();
        let request = FetchRequest::new(MediaType::Movie, "The.Matrix.1999.1080p.BluRay.x264.mkv", None);
        let metadata = provider.fetch(&request).await.unwrap();
        assert_eq!(metadata.get("title"), Some("The Matrix"));
        assert_eq!(metadata.get("year"), Some("1999"));
    }

    #[tokio::test]
    async fn test_fetch_episode_pads_numbers() {
        let provider = LocalProvider::new();
        let request = FetchRequest::new(MediaType::Episode, "Breaking.Bad.S01E07.mkv", Some(2008));
        let metadata = provider.fetch(&request).await.unwrap();
        assert_eq!(metadata.get("show"), Some("Breaking Bad"));
        assert_eq!(metadata.get("season_padded"), Some("01"));
        assert_eq!(metadata.get("episode_padded"), Some("07"));
        assert_eq!(metadata.get("year"), Some("2008"));
    }
}
