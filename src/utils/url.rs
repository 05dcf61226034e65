// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Whether a locator points at a remote resource rather than a local path.
///
/// # Examples
/// ```
/// use harvester::utils::url::is_remote;
///
/// assert!(is_remote("HTTPS://example.com/data.json"));
/// assert!(!is_remote("/var/data/catalog.json"));
/// ```
pub fn is_remote(locator: &str) -> bool {
    locator
        .get(..4)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http"))
}

/// Locator of page `page` of a remote catalog.
///
/// Pages after the first carry a `page` query parameter, replacing any the
/// catalog URL already has. Other query pairs and the fragment are kept.
///
/// # Examples
/// ```
/// use harvester::utils::url::page_url;
///
/// let first = page_url("http://example.com/data.json", 1).unwrap();
/// assert_eq!(first.as_str(), "http://example.com/data.json");
///
/// let third = page_url("http://example.com/data.json?q=x", 3).unwrap();
/// assert_eq!(third.as_str(), "http://example.com/data.json?q=x&page=3");
/// ```
pub fn page_url(url: &str, page: u32) -> Result<Url, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    if page <= 1 {
        return Ok(parsed);
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    Ok(parsed)
}

/// Lowercase, hyphen-separated name suitable for a record URL.
///
/// # Examples
/// ```
/// use harvester::utils::url::slugify;
///
/// assert_eq!(slugify("Street Trees (2024)", 100), "street-trees-2024");
/// ```
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if slug.len() > max_len {
        slug.truncate(max_len);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}
