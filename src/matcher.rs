// src/matcher.rs

//! Corridor matching policy.
//!
//! An incident is in the watch corridor when its location text contains any
//! configured keyword, compared case-insensitively. This is plain substring
//! containment, not word-boundary matching: "ORANGE" also hits
//! "ORANGE CITY BLVD". The over-match is an accepted tradeoff of the simple
//! model, not something to special-case away.

/// Check whether a location falls inside the configured corridor.
///
/// A missing location never matches, and an empty keyword list matches
/// nothing.
pub fn location_matches(location: Option<&str>, keywords: &[String]) -> bool {
    let Some(location) = location else {
        return false;
    };
    let folded = location.to_uppercase();
    keywords
        .iter()
        .any(|keyword| folded.contains(&keyword.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn matches_ignoring_case() {
        assert!(location_matches(
            Some("orange ave & mills ave"),
            &keywords(&["ORANGE"])
        ));
        assert!(location_matches(
            Some("MILLS AVE & MAGNOLIA"),
            &keywords(&["mills"])
        ));
    }

    #[test]
    fn substring_over_match_is_policy() {
        // "ORANGE" is a corridor keyword, so "ORANGE CITY BLVD" matches even
        // though it is a different road.
        assert!(location_matches(
            Some("ORANGE CITY BLVD"),
            &keywords(&["ORANGE"])
        ));
        assert!(location_matches(
            Some("THE ORANGE GROVES"),
            &keywords(&["ORANGE"])
        ));
    }

    #[test]
    fn non_matching_location() {
        assert!(!location_matches(
            Some("COLONIAL DR & BUMBY AVE"),
            &keywords(&["MILLS", "ORANGE"])
        ));
    }

    #[test]
    fn empty_keyword_list_matches_nothing() {
        assert!(!location_matches(Some("MILLS AVE"), &[]));
    }

    #[test]
    fn missing_location_never_matches() {
        assert!(!location_matches(None, &keywords(&["MILLS"])));
    }
}
