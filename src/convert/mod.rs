// src/convert/mod.rs

//! Conversion between remote DCAT datasets and local catalog records.
//!
//! Both directions are total: a field that cannot be mapped is dropped and
//! reported as a [`ConversionWarning`], and the record always proceeds.
//!
//! | Remote                   | Local                                          |
//! |--------------------------|------------------------------------------------|
//! | `title` / `description`  | `title` / `notes` (+ translations)             |
//! | `landingPage`            | `url`                                          |
//! | `keyword[]`              | `tags`                                         |
//! | `spatial` (bbox)         | extra `spatial` (GeoJSON polygon)              |
//! | `issued` / `modified`    | extras `dcat_issued` / `dcat_modified`, or `released` / `modified` |
//! | `publisher`              | extras `dcat_publisher_name` / `dcat_publisher_email` |
//! | `contactPoint`           | `contact_point` / `contact_point_email`        |
//! | `language[]`             | extra `language`                               |
//! | `identifier`             | extra `guid`                                   |
//! | `distribution[]`         | `resources`                                    |

pub mod dates;
pub mod resources;
pub mod spatial;
pub mod tags;

use std::fmt;

use crate::models::{
    ContactPoint, ConverterProfile, DateConvention, Extra, LocalDataset, Publisher,
    RemoteDataset, extra_keys,
};

/// A field that was dropped during conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionWarning {
    pub field: &'static str,
    pub message: String,
}

impl ConversionWarning {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A converted record plus whatever was lost on the way.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub record: LocalDataset,
    pub warnings: Vec<ConversionWarning>,
}

/// Map a remote dataset to the local record shape.
pub fn remote_to_local(remote: &RemoteDataset, profile: &ConverterProfile) -> Conversion {
    let mut record = LocalDataset {
        title: remote.title.clone(),
        notes: remote.description.clone(),
        url: remote.landing_page.clone(),
        classification: profile.classification.clone(),
        ..LocalDataset::default()
    };
    let mut warnings = Vec::new();

    if let Some(locale) = &profile.locale {
        if let Some(title) = &remote.title {
            record.title_translated.insert(locale.clone(), title.clone());
        }
        if let Some(notes) = &remote.description {
            record.notes_translated.insert(locale.clone(), notes.clone());
        }
    }

    record.tags =
        tags::keywords_to_tags(&remote.keyword, profile.split_keywords, profile.keyword_separator);

    if let Some(bbox) = remote.spatial.as_deref().filter(|s| !s.trim().is_empty()) {
        match spatial::bbox_to_polygon(bbox) {
            Ok(polygon) => record.extras.push(Extra::new(extra_keys::SPATIAL, polygon)),
            Err(reason) => warnings.push(ConversionWarning::new("spatial", reason)),
        }
    }

    let timestamps = [
        ("issued", extra_keys::ISSUED, remote.issued.as_deref()),
        ("modified", extra_keys::MODIFIED, remote.modified.as_deref()),
    ];
    for (field, extra_key, value) in timestamps {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        match profile.date_convention {
            DateConvention::Extras => record.extras.push(Extra::new(extra_key, value)),
            DateConvention::TopLevel => match dates::to_date_only(value) {
                Some(date) if field == "issued" => record.released = Some(date),
                Some(date) => record.modified = Some(date),
                None => warnings.push(ConversionWarning::new(
                    field,
                    format!("unparseable timestamp {value:?}"),
                )),
            },
        }
    }

    if let Some(name) = &remote.publisher.name {
        record.extras.push(Extra::new(extra_keys::PUBLISHER_NAME, name));
    }
    if let Some(mbox) = &remote.publisher.mbox {
        record.extras.push(Extra::new(extra_keys::PUBLISHER_EMAIL, mbox));
    }

    if let Some(contact) = &remote.contact_point {
        record.contact_point = contact.display_name.clone();
        record.contact_point_email = contact.email();
        if contact.has_email.is_some() && record.contact_point_email.is_none() {
            warnings.push(ConversionWarning::new("contactPoint", "empty email address"));
        }
    }

    if !remote.language.is_empty() {
        record
            .extras
            .push(Extra::new(extra_keys::LANGUAGE, remote.language.join(",")));
    }
    if let Some(identifier) = &remote.identifier {
        record.extras.push(Extra::new(extra_keys::GUID, identifier));
    }

    for dist in &remote.distribution {
        let resource = resources::distribution_to_resource(dist);
        if resource.url.is_empty() {
            warnings.push(ConversionWarning::new(
                "distribution",
                format!(
                    "{} has no downloadURL or accessURL",
                    dist.title.as_deref().unwrap_or("untitled distribution")
                ),
            ));
        }
        record.resources.push(resource);
    }
    resources::reorder_by_format(&mut record.resources, &profile.format_order);

    Conversion { record, warnings }
}

/// Map a local record back to a remote dataset.
pub fn local_to_remote(local: &LocalDataset) -> RemoteDataset {
    let mut remote = RemoteDataset {
        title: local.display_title().map(str::to_string),
        description: local
            .notes
            .clone()
            .or_else(|| local.notes_translated.values().next().cloned()),
        landing_page: local.url.clone(),
        keyword: local.tags.iter().map(|t| t.name.clone()).collect(),
        ..RemoteDataset::default()
    };

    let mut publisher = Publisher::default();
    for extra in &local.extras {
        let value = extra.value.clone();
        match extra.key.as_str() {
            extra_keys::ISSUED => remote.issued = Some(value),
            extra_keys::MODIFIED => remote.modified = Some(value),
            extra_keys::PUBLISHER_NAME => publisher.name = Some(value),
            extra_keys::PUBLISHER_EMAIL => publisher.mbox = Some(value),
            extra_keys::GUID => remote.identifier = Some(value),
            extra_keys::LANGUAGE => {
                remote.language = value
                    .split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            extra_keys::SPATIAL => remote.spatial = spatial::polygon_to_bbox(&value),
            _ => {}
        }
    }

    if remote.issued.is_none() {
        remote.issued = local.released.clone();
    }
    if remote.modified.is_none() {
        remote.modified = local.modified.clone();
    }

    if publisher.name.is_none() {
        if let Some(maintainer) = &local.maintainer {
            publisher.name = Some(maintainer.clone());
            publisher.mbox = local.maintainer_email.clone();
        }
    }
    remote.publisher = publisher;

    if local.contact_point.is_some() || local.contact_point_email.is_some() {
        remote.contact_point = Some(ContactPoint {
            display_name: local.contact_point.clone(),
            has_email: local
                .contact_point_email
                .as_ref()
                .map(|email| format!("mailto:{email}")),
        });
    }

    remote.distribution = local
        .resources
        .iter()
        .map(resources::resource_to_distribution)
        .collect();

    remote
}
