//! The asset/group membership relation.
//!
//! Membership is stored twice, in `ImageGroup::image_ids` and in `ImageAsset::group_ids`.  All changes go through
//! [`Relation`], which always updates both sides, so that for every asset `a` and group `g`:
//! `a.group_ids.contains(g.id) == g.image_ids.contains(a.id)`.

use thiserror::Error;
use tracing::{debug, trace};

use crate::asset::ImageAsset;
use crate::group::ImageGroup;
use crate::ids::{AssetId, GroupId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelationError {
    #[error("Asset lists group, but group does not list asset. asset: {asset}, group: {group}")]
    MissingInGroup { asset: AssetId, group: GroupId },
    #[error("Group lists asset, but asset does not list group. asset: {asset}, group: {group}")]
    MissingInAsset { asset: AssetId, group: GroupId },
}

pub struct Relation<'a> {
    assets: &'a mut Vec<ImageAsset>,
    groups: &'a mut Vec<ImageGroup>,
}

impl<'a> Relation<'a> {
    pub fn new(assets: &'a mut Vec<ImageAsset>, groups: &'a mut Vec<ImageGroup>) -> Self {
        Self {
            assets,
            groups,
        }
    }

    /// Add the assets to the group.
    ///
    /// Unknown asset ids and existing members are skipped.  Returns the number of assets added, or `None` if the
    /// group does not exist.
    pub fn link(&mut self, group_id: &GroupId, asset_ids: &[AssetId]) -> Option<usize> {
        let group = self
            .groups
            .iter_mut()
            .find(|group| &group.id == group_id)?;

        let mut added = 0;
        for asset_id in asset_ids {
            let Some(asset) = self
                .assets
                .iter_mut()
                .find(|asset| &asset.id == asset_id)
            else {
                debug!("Skipping unknown asset. group: {}, asset: {}", group_id, asset_id);
                continue;
            };

            let group_changed = push_unique(&mut group.image_ids, asset_id);
            let asset_changed = push_unique(&mut asset.group_ids, group_id);
            if group_changed || asset_changed {
                added += 1;
            }
        }

        trace!("Linked assets. group: {}, added: {}", group_id, added);
        Some(added)
    }

    /// Remove the assets from the group.
    ///
    /// Returns the number of assets removed, or `None` if the group does not exist.
    pub fn unlink(&mut self, group_id: &GroupId, asset_ids: &[AssetId]) -> Option<usize> {
        let group = self
            .groups
            .iter_mut()
            .find(|group| &group.id == group_id)?;

        let before = group.image_ids.len();
        group
            .image_ids
            .retain(|id| !asset_ids.contains(id));
        let removed = before - group.image_ids.len();

        for asset in self
            .assets
            .iter_mut()
            .filter(|asset| asset_ids.contains(&asset.id))
        {
            asset
                .group_ids
                .retain(|id| id != group_id);
        }

        trace!("Unlinked assets. group: {}, removed: {}", group_id, removed);
        Some(removed)
    }

    /// Remove the asset from every group it belongs to, the asset record itself is kept.
    pub fn detach_asset(&mut self, asset_id: &AssetId) {
        for group in self.groups.iter_mut() {
            group
                .image_ids
                .retain(|id| id != asset_id);
        }

        if let Some(asset) = self
            .assets
            .iter_mut()
            .find(|asset| &asset.id == asset_id)
        {
            asset.group_ids.clear();
        }
    }

    /// Remove the group, and strip it from every asset.
    pub fn detach_group(&mut self, group_id: &GroupId) -> Option<ImageGroup> {
        let index = self
            .groups
            .iter()
            .position(|group| &group.id == group_id)?;

        for asset in self.assets.iter_mut() {
            asset
                .group_ids
                .retain(|id| id != group_id);
        }

        Some(self.groups.remove(index))
    }

    /// Make both sides agree.
    ///
    /// A membership listed on either side is kept when both the asset and the group exist, memberships referring
    /// to missing records are dropped.  Used when loading data that was not written through this type.
    pub fn repair(&mut self) {
        let memberships = self
            .groups
            .iter()
            .flat_map(|group| {
                group
                    .image_ids
                    .iter()
                    .map(move |asset_id| (group.id.clone(), asset_id.clone()))
            })
            .chain(self.assets.iter().flat_map(|asset| {
                asset
                    .group_ids
                    .iter()
                    .map(move |group_id| (group_id.clone(), asset.id.clone()))
            }))
            .collect::<Vec<_>>();

        for group in self.groups.iter_mut() {
            group.image_ids.clear();
        }
        for asset in self.assets.iter_mut() {
            asset.group_ids.clear();
        }

        for (group_id, asset_id) in memberships {
            self.link(&group_id, std::slice::from_ref(&asset_id));
        }
    }

    pub fn verify(&self) -> Result<(), RelationError> {
        verify(self.assets, self.groups)
    }
}

/// Check that both sides of the relation agree.
pub fn verify(assets: &[ImageAsset], groups: &[ImageGroup]) -> Result<(), RelationError> {
    for asset in assets {
        for group_id in &asset.group_ids {
            let listed = groups
                .iter()
                .any(|group| &group.id == group_id && group.contains(&asset.id));
            if !listed {
                return Err(RelationError::MissingInGroup {
                    asset: asset.id.clone(),
                    group: group_id.clone(),
                });
            }
        }
    }

    for group in groups {
        for asset_id in &group.image_ids {
            let listed = assets
                .iter()
                .any(|asset| &asset.id == asset_id && asset.is_in_group(&group.id));
            if !listed {
                return Err(RelationError::MissingInAsset {
                    asset: asset_id.clone(),
                    group: group.id.clone(),
                });
            }
        }
    }

    Ok(())
}

fn push_unique<T: PartialEq + Clone>(items: &mut Vec<T>, item: &T) -> bool {
    if items.contains(item) {
        return false;
    }
    items.push(item.clone());
    true
}
