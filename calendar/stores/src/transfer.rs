//! Export and import of a snapshot as a single JSON document.

use calendar::asset::SourceType;
use calendar::snapshot::AppStateSnapshot;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::directory::to_pretty_json;

pub const REDACTED_URL: &str = "[redacted]";

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Replace the urls of uploaded images, for exports made without the image data.
    pub redact_uploads: bool,
    pub pretty: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(flatten)]
    pub snapshot: AppStateSnapshot,
    pub exported_at: DateTime<Utc>,
}

pub fn export(snapshot: &AppStateSnapshot, options: &ExportOptions) -> Result<String, serde_json::Error> {
    let mut snapshot = snapshot.clone();
    if options.redact_uploads {
        redact_uploads(&mut snapshot);
    }

    let document = ExportDocument {
        snapshot,
        exported_at: Utc::now(),
    };

    let content = match options.pretty {
        true => {
            let content = to_pretty_json(&document)?;
            String::from_utf8_lossy(&content).into_owned()
        }
        false => serde_json::to_string(&document)?,
    };

    info!(
        "Exported snapshot. projects: {}, assets: {}, redacted: {}",
        document.snapshot.projects.len(),
        document.snapshot.assets.len(),
        options.redact_uploads
    );
    Ok(content)
}

fn redact_uploads(snapshot: &mut AppStateSnapshot) {
    for asset in snapshot
        .assets
        .iter_mut()
        .filter(|asset| asset.source_type == SourceType::Upload)
    {
        asset.url = REDACTED_URL.to_string();
        if asset.thumbnail_url.is_some() {
            asset.thumbnail_url = Some(REDACTED_URL.to_string());
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON. cause: {0}")]
    Syntax(serde_json::Error),
    #[error("Document is not a JSON object")]
    NotAnObject,
    #[error("Document has no 'projects'")]
    MissingProjects,
    #[error("Document 'projects' is not an array")]
    ProjectsNotAnArray,
    #[error("Invalid document content. cause: {0}")]
    Invalid(serde_json::Error),
}

/// Parse an exported document.
///
/// The document must be an object with a `projects` array, the content is then decoded in full, so malformed
/// nested values are rejected here rather than surfacing later.
pub fn import(content: &str) -> Result<AppStateSnapshot, ImportError> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(ImportError::Syntax)?;

    let object = value
        .as_object()
        .ok_or(ImportError::NotAnObject)?;
    match object.get("projects") {
        None => return Err(ImportError::MissingProjects),
        Some(projects) if !projects.is_array() => return Err(ImportError::ProjectsNotAnArray),
        Some(_) => {}
    }

    let snapshot: AppStateSnapshot = serde_json::from_value(value).map_err(ImportError::Invalid)?;

    info!(
        "Imported snapshot. projects: {}, assets: {}, groups: {}",
        snapshot.projects.len(),
        snapshot.assets.len(),
        snapshot.groups.len()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use calendar::asset::NewAsset;
    use calendar::ids::AssetId;
    use calendar::project::{CalendarType, Format, Orientation};
    use calendar::store::CalendarStore;
    use indoc::indoc;
    use rstest::rstest;

    use super::*;

    fn snapshot() -> AppStateSnapshot {
        let mut store = CalendarStore::new();
        store.create_project("Family".to_string(), CalendarType::Wall, Format::A4, Orientation::Landscape);
        for (id, source_type) in [("a1", SourceType::Upload), ("a2", SourceType::Url)] {
            store.add_asset(
                NewAsset {
                    name: id.to_string(),
                    source_type,
                    url: format!("https://example.com/{}.jpg", id),
                    thumbnail_url: None,
                    original_width: 640,
                    original_height: 480,
                },
                Some(AssetId::from(id)),
            );
        }
        store.snapshot()
    }

    #[rstest]
    #[case::compact(false)]
    #[case::pretty(true)]
    fn export_then_import_restores_the_snapshot(#[case] pretty: bool) {
        // given
        let snapshot = snapshot();
        let options = ExportOptions {
            redact_uploads: false,
            pretty,
        };

        // when
        let content = export(&snapshot, &options).unwrap();
        let imported = import(&content).unwrap();

        // then
        assert!(content.contains("\"exportedAt\""));
        assert_eq!(imported, snapshot);
    }

    #[test]
    fn redaction_only_touches_uploads() {
        // given
        let options = ExportOptions {
            redact_uploads: true,
            pretty: false,
        };

        // when
        let imported = import(&export(&snapshot(), &options).unwrap()).unwrap();

        // then
        assert_eq!(imported.assets[0].url, REDACTED_URL);
        assert_eq!(imported.assets[1].url, "https://example.com/a2.jpg");
    }

    #[rstest]
    #[case::syntax("{ \"projects\": [", "Invalid JSON")]
    #[case::not_an_object("[]", "not a JSON object")]
    #[case::missing_projects("{ \"assets\": [] }", "no 'projects'")]
    #[case::projects_not_an_array("{ \"projects\": {} }", "not an array")]
    fn invalid_documents_are_rejected(#[case] content: &str, #[case] expected: &str) {
        // when
        let error = import(content).unwrap_err();

        // then
        assert!(error.to_string().contains(expected), "{}", error);
    }

    #[test]
    fn malformed_nested_values_are_rejected_at_import() {
        // given
        let content = indoc! {r#"
            {
                "projects": [
                    { "id": "p1", "title": 42 }
                ]
            }
        "#};

        // expect
        assert!(matches!(import(content), Err(ImportError::Invalid(_))));
    }

    #[test]
    fn minimal_document_is_accepted() {
        // when
        let snapshot = import(r#"{ "projects": [] }"#).unwrap();

        // then
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.active_project_id, None);
    }
}
