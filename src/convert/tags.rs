// src/convert/tags.rs

//! Keyword to tag normalization.

use crate::models::Tag;

/// Map remote keywords to tags, keeping first occurrences only.
///
/// With `split` set, each keyword is split on `separator` and every piece
/// is sanitized with [`sanitize`].
pub fn keywords_to_tags(keywords: &[String], split: bool, separator: char) -> Vec<Tag> {
    let mut tags: Vec<Tag> = Vec::new();
    let mut push = |name: String| {
        if !name.is_empty() && !tags.iter().any(|t| t.name == name) {
            tags.push(Tag::new(name));
        }
    };

    for keyword in keywords {
        if split {
            keyword.split(separator).map(sanitize).for_each(&mut push);
        } else {
            push(keyword.trim().to_string());
        }
    }
    tags
}

/// Make a keyword safe to use as a tag name.
///
/// `&` becomes `and`; anything other than letters, digits, space, `_`,
/// `.` or `-` becomes `-`.
///
/// # Examples
/// ```
/// use harvester::convert::tags::sanitize;
///
/// assert_eq!(sanitize(" Parks & Recreation "), "Parks and Recreation");
/// assert_eq!(sanitize("311/Requests"), "311-Requests");
/// ```
pub fn sanitize(keyword: &str) -> String {
    keyword
        .trim()
        .replace('&', "and")
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c.is_ascii_digit() || matches!(c, ' ' | '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn plain_keywords_map_one_to_one() {
        let keywords = vec!["parks".to_string(), "trees; streets".to_string()];
        let tags = keywords_to_tags(&keywords, false, ';');
        assert_eq!(names(&tags), vec!["parks", "trees; streets"]);
    }

    #[test]
    fn semicolon_keywords_are_split_and_sanitized() {
        let keywords = vec!["Parks & Rec;Open Space; ;Trees/Shrubs".to_string()];
        let tags = keywords_to_tags(&keywords, true, ';');
        assert_eq!(names(&tags), vec!["Parks and Rec", "Open Space", "Trees-Shrubs"]);
    }

    #[test]
    fn accented_letters_survive() {
        assert_eq!(sanitize("Café Données"), "Café Données");
    }

    #[test]
    fn duplicates_are_dropped() {
        let keywords = vec!["a;b".to_string(), "b;c".to_string()];
        let tags = keywords_to_tags(&keywords, true, ';');
        assert_eq!(names(&tags), vec!["a", "b", "c"]);
    }

    #[test]
    fn custom_separator() {
        let keywords = vec!["roads,bridges".to_string()];
        let tags = keywords_to_tags(&keywords, true, ',');
        assert_eq!(names(&tags), vec!["roads", "bridges"]);
    }
}
