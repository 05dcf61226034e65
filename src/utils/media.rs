// src/utils/media.rs

//! Media type and file extension lookups.

use std::path::Path;

/// Known media types and the format token they map to.
const MEDIA_FORMATS: &[(&str, &str)] = &[
    ("text/csv", "CSV"),
    ("application/csv", "CSV"),
    ("application/json", "JSON"),
    ("application/geo+json", "GeoJSON"),
    ("application/vnd.geo+json", "GeoJSON"),
    ("application/ld+json", "JSON-LD"),
    ("application/zip", "ZIP"),
    ("application/x-zip-compressed", "ZIP"),
    ("application/vnd.google-earth.kml+xml", "KML"),
    ("application/vnd.google-earth.kmz", "KMZ"),
    ("text/html", "HTML"),
    ("application/xhtml+xml", "HTML"),
    ("application/pdf", "PDF"),
    ("application/xml", "XML"),
    ("text/xml", "XML"),
    ("application/rdf+xml", "RDF"),
    ("text/turtle", "TTL"),
    ("text/plain", "TXT"),
    ("application/vnd.ms-excel", "XLS"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "XLSX",
    ),
    ("application/vnd.oasis.opendocument.spreadsheet", "ODS"),
    ("application/x-shapefile", "SHP"),
    ("application/vnd.shp", "SHP"),
    ("application/gpx+xml", "GPX"),
    ("application/x-parquet", "Parquet"),
    ("application/vnd.apache.parquet", "Parquet"),
];

/// File extensions and the content type assumed for local sources.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("json", "application/json"),
    ("jsonld", "application/ld+json"),
    ("rdf", "application/rdf+xml"),
    ("xml", "application/rdf+xml"),
    ("owl", "application/rdf+xml"),
    ("ttl", "text/turtle"),
    ("n3", "text/n3"),
    ("nt", "application/n-triples"),
    ("trig", "application/trig"),
];

/// Strip parameters (`; charset=...`) and normalize case.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// Guess a resource format token from its media type.
///
/// # Examples
/// ```
/// use harvester::utils::media::format_for_media_type;
///
/// assert_eq!(format_for_media_type("text/csv; charset=utf-8"), Some("CSV"));
/// assert_eq!(format_for_media_type("application/x-unknown"), None);
/// ```
pub fn format_for_media_type(media_type: &str) -> Option<&'static str> {
    let wanted = essence(media_type);
    MEDIA_FORMATS
        .iter()
        .find(|(mime, _)| *mime == wanted)
        .map(|(_, format)| *format)
}

/// Guess a content type from a local file's extension.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSION_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essence() {
        assert_eq!(essence("Application/JSON; charset=UTF-8"), "application/json");
        assert_eq!(essence("text/csv"), "text/csv");
    }

    #[test]
    fn test_format_for_media_type() {
        assert_eq!(format_for_media_type("application/vnd.geo+json"), Some("GeoJSON"));
        assert_eq!(format_for_media_type("APPLICATION/ZIP"), Some("ZIP"));
        assert_eq!(format_for_media_type(""), None);
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(
            content_type_for_path(Path::new("data/catalog.json")),
            Some("application/json")
        );
        assert_eq!(content_type_for_path(Path::new("catalog.TTL")), Some("text/turtle"));
        assert_eq!(content_type_for_path(Path::new("catalog")), None);
        assert_eq!(content_type_for_path(Path::new("catalog.bin")), None);
    }
}
