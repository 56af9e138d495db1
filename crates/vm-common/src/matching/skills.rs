use std::collections::HashSet;

use crate::normalize::tag_key;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOverlap {
    /// Event-side tags the volunteer also lists, in event order.
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl TagOverlap {
    pub fn count(&self) -> usize {
        self.matched.len()
    }

    pub fn requested(&self) -> usize {
        self.matched.len() + self.missing.len()
    }
}

/// Which of the event's tags does the volunteer hold?
///
/// Comparison uses [`tag_key`]; duplicate event tags count once.
pub fn tag_overlap(event_tags: &[String], volunteer_tags: &[String]) -> TagOverlap {
    let held: HashSet<String> = volunteer_tags.iter().map(|t| tag_key(t)).collect();
    let mut seen = HashSet::new();
    let mut overlap = TagOverlap::default();

    for tag in event_tags {
        let key = tag_key(tag);
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        if held.contains(&key) {
            overlap.matched.push(tag.trim().to_string());
        } else {
            overlap.missing.push(tag.trim().to_string());
        }
    }

    overlap
}

/// Number of past events whose title equals `title`.
pub fn count_same_titles(past_titles: &[String], title: &str, cap: usize) -> usize {
    let wanted = tag_key(title);
    if wanted.is_empty() {
        return 0;
    }
    past_titles
        .iter()
        .take(cap)
        .filter(|past| tag_key(past) == wanted)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn counts_case_insensitive_overlap() {
        let overlap = tag_overlap(
            &tags(&["First Aid", "Cooking", "Driving"]),
            &tags(&["cooking", "first aid"]),
        );
        assert_eq!(overlap.count(), 2);
        assert_eq!(overlap.missing, tags(&["Driving"]));
        assert_eq!(overlap.requested(), 3);
    }

    #[test]
    fn duplicate_event_tags_count_once() {
        let overlap = tag_overlap(&tags(&["Teaching", "teaching "]), &tags(&["Teaching"]));
        assert_eq!(overlap.count(), 1);
        assert_eq!(overlap.requested(), 1);
    }

    #[test]
    fn same_title_history_respects_cap() {
        let past = tags(&["Beach Cleanup", "beach cleanup", "Food Drive"]);
        assert_eq!(count_same_titles(&past, "Beach Cleanup", 10), 2);
        assert_eq!(count_same_titles(&past, "Beach Cleanup", 1), 1);
        assert_eq!(count_same_titles(&past, "", 10), 0);
    }
}
