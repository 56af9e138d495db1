use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical comparison key for a skill / interest / day tag.
///
/// Trims, collapses inner whitespace and lowercases, so `" First  Aid "`
/// and `"first aid"` compare equal.
pub fn tag_key(tag: &str) -> String {
    RE_WHITESPACE
        .replace_all(tag.trim(), " ")
        .to_lowercase()
}

/// Clean a tag list for storage: trims entries, drops empties and removes
/// case-insensitive duplicates while keeping the first spelling.
pub fn clean_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut cleaned = Vec::new();

    for tag in tags {
        let trimmed = RE_WHITESPACE.replace_all(tag.as_ref().trim(), " ").into_owned();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            cleaned.push(trimmed);
        }
    }

    cleaned
}

/// Split a comma separated form value (`"cooking, teaching,"`) into tags.
pub fn split_tag_list(raw: &str) -> Vec<String> {
    clean_tags(raw.split(','))
}

/// Trim an optional free-text field, mapping blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_key_ignores_case_and_spacing() {
        assert_eq!(tag_key("  First   Aid "), "first aid");
        assert_eq!(tag_key("Teaching"), tag_key("teaching"));
    }

    #[test]
    fn clean_tags_drops_blanks_and_duplicates() {
        let cleaned = clean_tags(["Cooking", " cooking ", "", "  ", "Teaching"]);
        assert_eq!(cleaned, vec!["Cooking".to_string(), "Teaching".to_string()]);
    }

    #[test]
    fn split_tag_list_handles_trailing_commas() {
        assert_eq!(
            split_tag_list("environment, animals,,"),
            vec!["environment".to_string(), "animals".to_string()]
        );
        assert!(split_tag_list("").is_empty());
    }

    #[test]
    fn non_blank_maps_whitespace_to_none() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" Pune ".into())), Some("Pune".into()));
        assert_eq!(non_blank(None), None);
    }
}
