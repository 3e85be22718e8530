use chrono::{DateTime, Utc};

use crate::ids::{AssetId, GroupId};

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Upload,
    Url,
}

/// A user supplied image, independent of any project.
///
/// `group_ids` mirrors the `image_ids` of the groups, it is maintained by [`crate::relation::Relation`] only.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub id: AssetId,
    pub name: String,
    pub source_type: SourceType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub original_width: u32,
    pub original_height: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
}

impl ImageAsset {
    /// Width divided by height, `None` when the dimensions are unknown.
    pub fn aspect_ratio(&self) -> Option<f64> {
        match self.original_height {
            0 => None,
            height => Some(self.original_width as f64 / height as f64),
        }
    }

    pub fn is_in_group(&self, group_id: &GroupId) -> bool {
        self.group_ids.contains(group_id)
    }
}

/// The caller supplied part of a new asset.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub name: String,
    pub source_type: SourceType,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub original_width: u32,
    pub original_height: u32,
}

/// A shallow update of an asset, `None` fields are left unchanged.
///
/// Group membership is not part of the update, see [`crate::relation::Relation`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<Option<String>>,
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
    pub tags: Option<Vec<String>>,
}

impl ImageAsset {
    pub fn new(id: AssetId, asset: NewAsset, created_at: DateTime<Utc>) -> Self {
        let NewAsset {
            name,
            source_type,
            url,
            thumbnail_url,
            original_width,
            original_height,
        } = asset;

        Self {
            id,
            name,
            source_type,
            url,
            thumbnail_url,
            original_width,
            original_height,
            created_at,
            tags: vec![],
            group_ids: vec![],
        }
    }

    pub fn merge(&mut self, update: AssetUpdate) {
        let AssetUpdate {
            name,
            url,
            thumbnail_url,
            original_width,
            original_height,
            tags,
        } = update;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(thumbnail_url) = thumbnail_url {
            self.thumbnail_url = thumbnail_url;
        }
        if let Some(original_width) = original_width {
            self.original_width = original_width;
        }
        if let Some(original_height) = original_height {
            self.original_height = original_height;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
    }
}
