use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::ids::{AssetId, GroupId};

/// A named, colored collection of assets.
///
/// `image_ids` is maintained by [`crate::relation::Relation`] only.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub image_ids: Vec<AssetId>,
}

impl ImageGroup {
    pub fn contains(&self, asset_id: &AssetId) -> bool {
        self.image_ids.contains(asset_id)
    }
}

/// A partial update of a group, membership is changed through [`crate::relation::Relation`] only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
}

/// Drop groups that repeat the id or the name of an earlier group.
///
/// The persistence backend cannot enforce unique names, so duplicates can appear after concurrent saves.
/// The first occurrence wins, the order of the remaining groups is preserved.
pub fn dedupe_groups(groups: Vec<ImageGroup>) -> Vec<ImageGroup> {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();

    groups
        .into_iter()
        .filter(|group| {
            let is_unique = !seen_ids.contains(&group.id) && !seen_names.contains(&group.name);
            if is_unique {
                seen_ids.insert(group.id.clone());
                seen_names.insert(group.name.clone());
            } else {
                warn!("Dropping duplicate group. id: {}, name: '{}'", group.id, group.name);
            }
            is_unique
        })
        .collect()
}
