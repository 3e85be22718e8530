use chrono::{DateTime, Utc};

use crate::asset::ImageAsset;
use crate::group::ImageGroup;
use crate::ids::ProjectId;
use crate::project::CalendarProject;

pub const SNAPSHOT_VERSION: u32 = 1;

fn snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

/// The full persisted state, the unit of persistence and of import/export.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSnapshot {
    #[serde(default = "snapshot_version")]
    pub version: u32,
    pub projects: Vec<CalendarProject>,
    #[serde(default)]
    pub assets: Vec<ImageAsset>,
    #[serde(default)]
    pub groups: Vec<ImageGroup>,
    #[serde(default)]
    pub active_project_id: Option<ProjectId>,
    #[serde(default)]
    pub active_page_index: usize,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl AppStateSnapshot {
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            projects: vec![],
            assets: vec![],
            groups: vec![],
            active_project_id: None,
            active_page_index: 0,
            last_updated: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.assets.is_empty() && self.groups.is_empty()
    }
}
