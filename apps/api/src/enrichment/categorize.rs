/// Fallback category when no keyword matches.
pub const GENERAL: &str = "general";

/// Life-event categories and the substrings that trigger them, in output order.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "education",
        &["graduation", "degree", "school", "university", "college"],
    ),
    (
        "celebration",
        &["birthday", "celebration", "party", "anniversary"],
    ),
    (
        "career",
        &["job", "work", "career", "promotion", "interview"],
    ),
    ("travel", &["travel", "trip", "vacation", "flight", "hotel"]),
    (
        "relationship",
        &["wedding", "marriage", "engagement", "divorce"],
    ),
    ("family", &["baby", "child", "family", "parent", "sibling"]),
    (
        "health",
        &["health", "medical", "doctor", "hospital", "illness"],
    ),
];

/// Maps extracted key phrases onto life-event categories.
///
/// A category is included when any phrase contains any of its keywords,
/// case-insensitively. Never returns an empty list.
pub fn categorize_key_phrases<S: AsRef<str>>(key_phrases: &[S]) -> Vec<String> {
    let lower: Vec<String> = key_phrases
        .iter()
        .map(|p| p.as_ref().to_lowercase())
        .collect();

    let mut categories: Vec<String> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| {
            lower
                .iter()
                .any(|phrase| keywords.iter().any(|k| phrase.contains(k)))
        })
        .map(|(category, _)| category.to_string())
        .collect();

    if categories.is_empty() {
        categories.push(GENERAL.to_string());
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graduation_is_education() {
        assert_eq!(
            categorize_key_phrases(&["my graduation ceremony"]),
            vec!["education"]
        );
    }

    #[test]
    fn test_multiple_categories_keep_fixed_order() {
        let cats = categorize_key_phrases(&["hospital visit", "Birthday party", "new job"]);
        assert_eq!(cats, vec!["celebration", "career", "health"]);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(categorize_key_phrases(&["WEDDING day"]), vec!["relationship"]);
    }

    #[test]
    fn test_substring_match_inside_longer_words() {
        // "homework" contains "work"
        assert_eq!(categorize_key_phrases(&["homework"]), vec!["career"]);
    }

    #[test]
    fn test_no_match_is_general() {
        assert_eq!(categorize_key_phrases(&["quiet afternoon"]), vec![GENERAL]);
    }

    #[test]
    fn test_no_phrases_is_general() {
        let empty: [&str; 0] = [];
        assert_eq!(categorize_key_phrases(&empty), vec![GENERAL]);
    }

    #[test]
    fn test_category_listed_once() {
        let cats = categorize_key_phrases(&["family trip", "family baby shower"]);
        assert_eq!(cats, vec!["travel", "family"]);
    }
}
