// src/convert/resources.rs

use crate::models::{Distribution, Resource};
use crate::utils::media::format_for_media_type;

/// Map one distribution to a resource.
///
/// The format is the published token, else a guess from the media type.
pub fn distribution_to_resource(dist: &Distribution) -> Resource {
    let format = dist
        .format
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .or_else(|| {
            dist.media_type
                .as_deref()
                .and_then(format_for_media_type)
                .map(str::to_string)
        });

    Resource {
        id: None,
        name: dist.title.clone(),
        description: dist.description.clone(),
        url: dist.url().unwrap_or_default().to_string(),
        format,
        size: dist.byte_size,
    }
}

pub fn resource_to_distribution(resource: &Resource) -> Distribution {
    Distribution {
        title: resource.name.clone(),
        description: resource.description.clone(),
        format: resource.format.clone(),
        media_type: None,
        download_url: None,
        access_url: Some(resource.url.clone()).filter(|u| !u.is_empty()),
        byte_size: resource.size,
    }
}

/// Float resources with a preferred format to the front.
///
/// Preferred formats come first in `order`'s order; within a format, and
/// among everything else, the original order is kept.
pub fn reorder_by_format(resources: &mut [Resource], order: &[String]) {
    if order.is_empty() {
        return;
    }
    resources.sort_by_key(|r| {
        r.format
            .as_deref()
            .and_then(|f| order.iter().position(|o| o.eq_ignore_ascii_case(f)))
            .unwrap_or(order.len())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resource(url: &str, format: Option<&str>) -> Resource {
        Resource {
            url: url.to_string(),
            format: format.map(str::to_string),
            ..Resource::default()
        }
    }

    #[test]
    fn format_token_wins_over_media_type() {
        let dist = Distribution {
            format: Some("Esri REST".into()),
            media_type: Some("application/json".into()),
            access_url: Some("http://example.com/rest".into()),
            ..Distribution::default()
        };
        let res = distribution_to_resource(&dist);
        assert_eq!(res.format.as_deref(), Some("Esri REST"));
        assert_eq!(res.url, "http://example.com/rest");
    }

    #[test]
    fn media_type_guess_when_format_missing() {
        let dist = Distribution {
            format: Some("  ".into()),
            media_type: Some("text/csv; charset=utf-8".into()),
            download_url: Some("http://example.com/a.csv".into()),
            byte_size: Some(120),
            ..Distribution::default()
        };
        let res = distribution_to_resource(&dist);
        assert_eq!(res.format.as_deref(), Some("CSV"));
        assert_eq!(res.size, Some(120));
    }

    #[test]
    fn unknown_media_type_leaves_format_empty() {
        let dist = Distribution {
            media_type: Some("application/x-custom".into()),
            ..Distribution::default()
        };
        assert_eq!(distribution_to_resource(&dist).format, None);
    }

    #[test]
    fn resource_url_becomes_access_url() {
        let dist = resource_to_distribution(&Resource {
            size: Some(9),
            ..resource("http://example.com/a.csv", Some("CSV"))
        });
        assert_eq!(dist.access_url.as_deref(), Some("http://example.com/a.csv"));
        assert_eq!(dist.download_url, None);
        assert_eq!(dist.format.as_deref(), Some("CSV"));
        assert_eq!(dist.byte_size, Some(9));
    }

    #[test]
    fn reorder_is_stable() {
        let mut resources = vec![
            resource("1", Some("Web page")),
            resource("2", Some("CSV")),
            resource("3", Some("GeoJSON")),
            resource("4", None),
            resource("5", Some("CSV")),
            resource("6", Some("PDF")),
        ];
        let order = vec!["GeoJSON".to_string(), "CSV".to_string()];
        reorder_by_format(&mut resources, &order);
        let urls: Vec<_> = resources.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["3", "2", "5", "1", "4", "6"]);
    }
}
