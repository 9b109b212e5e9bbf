//! Template resolution shared by live previews and real renames.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::providers::Metadata;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());
static EMPTY_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*\)|\[\s*\]").unwrap());
static ILLEGAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Variables the direct-substitution path understands.
pub const BASIC_VARIABLES: [&str; 6] = ["show", "title", "year", "season_padded", "episode_padded", "episode_title"];

/// Resolve `{name}` tokens against `metadata`.
///
/// An available variable resolves to its value, or to nothing when the
/// metadata has no value for it. Tokens for unavailable or unknown
/// variables pass through unchanged.
pub fn resolve_template(template: &str, metadata: &Metadata, is_available: impl Fn(&str) -> bool) -> String {
    let resolved = TOKEN.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        if is_available(name) {
            metadata.get(name).unwrap_or_default().to_string()
        } else {
            caps[0].to_string()
        }
    });
    tidy(&resolved)
}

/// Plain string replacement of the basic variables only.
pub fn substitute_basic(template: &str, metadata: &Metadata) -> String {
    let mut result = template.to_string();
    for name in BASIC_VARIABLES {
        let token = format!("{{{name}}}");
        if result.contains(&token) {
            result = result.replace(&token, metadata.get(name).unwrap_or_default());
        }
    }
    tidy(&result)
}

/// Drop groups and separators left dangling by empty values.
fn tidy(name: &str) -> String {
    let without_groups = EMPTY_GROUP.replace_all(name, "");
    let collapsed = without_groups.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut cleaned = collapsed.replace(" - -", " -");
    while cleaned.contains("- -") {
        cleaned = cleaned.replace("- -", "-");
    }
    cleaned
        .trim_matches(|c: char| c == ' ' || c == '-' || c == '.')
        .to_string()
}

/// Replace characters that are not allowed in file names.
pub fn sanitize_filename(filename: &str) -> String {
    ILLEGAL.replace_all(filename, "_").to_string()
}
