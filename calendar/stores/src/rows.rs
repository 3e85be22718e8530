//! The row schema of the remote backend.
//!
//! One row per project, asset and group.  Group membership is stored twice: in the `image_ids` of the group row and
//! as rows of a junction table keyed by `(asset_id, group_id)`.  The `format` and `months` columns of a project row
//! hold JSON text.

use std::fmt::Display;

use calendar::asset::{ImageAsset, SourceType};
use calendar::group::ImageGroup;
use calendar::ids::{AssetId, GroupId, ProjectId};
use calendar::page::MonthPage;
use calendar::project::{CalendarProject, CalendarType, Format, ImageFit, MonthsPerPage, Orientation};
use calendar::snapshot::AppStateSnapshot;
use chrono::{DateTime, Utc};
use serde_with::json::JsonString;
use serde_with::serde_as;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Projects,
    Assets,
    Groups,
    Memberships,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Projects, Table::Assets, Table::Groups, Table::Memberships];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Projects => "projects",
            Table::Assets => "assets",
            Table::Groups => "groups",
            Table::Memberships => "asset_groups",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[serde_as]
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub title: String,
    pub calendar_type: CalendarType,
    #[serde_as(as = "JsonString")]
    pub format: Format,
    pub orientation: Orientation,
    pub bleed: f64,
    pub margin: f64,
    #[serde(default = "calendar::project::current_year")]
    pub year: i32,
    #[serde_as(as = "JsonString")]
    pub months: Vec<MonthPage>,
    pub months_per_page: MonthsPerPage,
    #[serde(default)]
    pub selected_group_id: Option<GroupId>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub cover_image_fit: Option<ImageFit>,
    #[serde(default)]
    pub months_image_fit: Option<ImageFit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CalendarProject> for ProjectRow {
    fn from(project: &CalendarProject) -> Self {
        Self {
            id: project.id.clone(),
            title: project.title.clone(),
            calendar_type: project.calendar_type,
            format: project.format,
            orientation: project.orientation,
            bleed: project.bleed,
            margin: project.margin,
            year: project.year,
            months: project.months.clone(),
            months_per_page: project.months_per_page,
            selected_group_id: project.selected_group_id.clone(),
            font_family: project.font_family.clone(),
            cover_image_fit: project.cover_image_fit,
            months_image_fit: project.months_image_fit,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

impl From<ProjectRow> for CalendarProject {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            calendar_type: row.calendar_type,
            format: row.format,
            orientation: row.orientation,
            bleed: row.bleed,
            margin: row.margin,
            year: row.year,
            months: row.months,
            months_per_page: row.months_per_page,
            selected_group_id: row.selected_group_id,
            font_family: row.font_family,
            cover_image_fit: row.cover_image_fit,
            months_image_fit: row.months_image_fit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Group membership is not part of the asset row, see [`MembershipRow`].
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct AssetRow {
    pub id: AssetId,
    pub name: String,
    pub source_type: SourceType,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub original_width: u32,
    pub original_height: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ImageAsset> for AssetRow {
    fn from(asset: &ImageAsset) -> Self {
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            source_type: asset.source_type,
            url: asset.url.clone(),
            thumbnail_url: asset.thumbnail_url.clone(),
            original_width: asset.original_width,
            original_height: asset.original_height,
            tags: asset.tags.clone(),
            created_at: asset.created_at,
        }
    }
}

impl AssetRow {
    pub fn into_asset(self, group_ids: Vec<GroupId>) -> ImageAsset {
        ImageAsset {
            id: self.id,
            name: self.name,
            source_type: self.source_type,
            url: self.url,
            thumbnail_url: self.thumbnail_url,
            original_width: self.original_width,
            original_height: self.original_height,
            created_at: self.created_at,
            tags: self.tags,
            group_ids,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct GroupRow {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image_ids: Vec<AssetId>,
    pub created_at: DateTime<Utc>,
}

impl From<&ImageGroup> for GroupRow {
    fn from(group: &ImageGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            color: group.color.clone(),
            image_ids: group.image_ids.clone(),
            created_at: group.created_at,
        }
    }
}

impl From<GroupRow> for ImageGroup {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            color: row.color,
            created_at: row.created_at,
            image_ids: row.image_ids,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct MembershipRow {
    pub asset_id: AssetId,
    pub group_id: GroupId,
    pub created_at: DateTime<Utc>,
}

impl MembershipRow {
    pub fn key(&self) -> String {
        membership_key(&self.asset_id, &self.group_id)
    }
}

pub fn membership_key(asset_id: &AssetId, group_id: &GroupId) -> String {
    format!("{}:{}", asset_id, group_id)
}

/// A row of any table.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Project(ProjectRow),
    Asset(AssetRow),
    Group(GroupRow),
    Membership(MembershipRow),
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Row::Project(_) => Table::Projects,
            Row::Asset(_) => Table::Assets,
            Row::Group(_) => Table::Groups,
            Row::Membership(_) => Table::Memberships,
        }
    }

    /// The primary key, unique within the table.
    pub fn key(&self) -> String {
        match self {
            Row::Project(row) => row.id.to_string(),
            Row::Asset(row) => row.id.to_string(),
            Row::Group(row) => row.id.to_string(),
            Row::Membership(row) => row.key(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Row::Project(row) => row.created_at,
            Row::Asset(row) => row.created_at,
            Row::Group(row) => row.created_at,
            Row::Membership(row) => row.created_at,
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Row::Project(row) => serde_json::to_value(row),
            Row::Asset(row) => serde_json::to_value(row),
            Row::Group(row) => serde_json::to_value(row),
            Row::Membership(row) => serde_json::to_value(row),
        }
    }

    pub fn from_value(table: Table, value: serde_json::Value) -> Result<Row, serde_json::Error> {
        match table {
            Table::Projects => serde_json::from_value(value).map(Row::Project),
            Table::Assets => serde_json::from_value(value).map(Row::Asset),
            Table::Groups => serde_json::from_value(value).map(Row::Group),
            Table::Memberships => serde_json::from_value(value).map(Row::Membership),
        }
    }
}

/// The rows of every table, as written for, or read from, a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotRows {
    pub projects: Vec<ProjectRow>,
    pub assets: Vec<AssetRow>,
    pub groups: Vec<GroupRow>,
    pub memberships: Vec<MembershipRow>,
}

impl SnapshotRows {
    pub fn from_snapshot(snapshot: &AppStateSnapshot, now: DateTime<Utc>) -> Self {
        let memberships = snapshot
            .assets
            .iter()
            .flat_map(|asset| {
                asset
                    .group_ids
                    .iter()
                    .map(move |group_id| MembershipRow {
                        asset_id: asset.id.clone(),
                        group_id: group_id.clone(),
                        created_at: now,
                    })
            })
            .collect();

        Self {
            projects: snapshot
                .projects
                .iter()
                .map(ProjectRow::from)
                .collect(),
            assets: snapshot
                .assets
                .iter()
                .map(AssetRow::from)
                .collect(),
            groups: snapshot
                .groups
                .iter()
                .map(GroupRow::from)
                .collect(),
            memberships,
        }
    }

    /// Sort scanned rows into their tables.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut result = Self::default();
        for row in rows {
            match row {
                Row::Project(row) => result.projects.push(row),
                Row::Asset(row) => result.assets.push(row),
                Row::Group(row) => result.groups.push(row),
                Row::Membership(row) => result.memberships.push(row),
            }
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.assets.is_empty() && self.groups.is_empty()
    }

    /// All rows, in write order: projects, assets, groups and finally memberships.
    pub fn into_rows(self) -> impl Iterator<Item = Row> {
        self.projects
            .into_iter()
            .map(Row::Project)
            .chain(self.assets.into_iter().map(Row::Asset))
            .chain(self.groups.into_iter().map(Row::Group))
            .chain(
                self.memberships
                    .into_iter()
                    .map(Row::Membership),
            )
    }

    /// Build the documents, asset `group_ids` come from the junction rows.
    ///
    /// The asset and group sides are not reconciled here, see `CalendarStore::from_snapshot`.
    pub fn into_snapshot(self) -> AppStateSnapshot {
        let SnapshotRows {
            projects,
            assets,
            groups,
            memberships,
        } = self;

        let assets = assets
            .into_iter()
            .map(|row| {
                let group_ids = memberships
                    .iter()
                    .filter(|membership| membership.asset_id == row.id)
                    .map(|membership| membership.group_id.clone())
                    .collect();
                row.into_asset(group_ids)
            })
            .collect();

        AppStateSnapshot {
            projects: projects
                .into_iter()
                .map(CalendarProject::from)
                .collect(),
            assets,
            groups: groups
                .into_iter()
                .map(ImageGroup::from)
                .collect(),
            ..AppStateSnapshot::empty()
        }
    }
}

/// Identifies the row of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Project(ProjectId),
    Asset(AssetId),
    Group(GroupId),
    Membership { asset_id: AssetId, group_id: GroupId },
}

impl EntityRef {
    pub fn table(&self) -> Table {
        match self {
            EntityRef::Project(_) => Table::Projects,
            EntityRef::Asset(_) => Table::Assets,
            EntityRef::Group(_) => Table::Groups,
            EntityRef::Membership { .. } => Table::Memberships,
        }
    }

    pub fn key(&self) -> String {
        match self {
            EntityRef::Project(id) => id.to_string(),
            EntityRef::Asset(id) => id.to_string(),
            EntityRef::Group(id) => id.to_string(),
            EntityRef::Membership {
                asset_id,
                group_id,
            } => membership_key(asset_id, group_id),
        }
    }
}

impl From<&Row> for EntityRef {
    fn from(row: &Row) -> Self {
        match row {
            Row::Project(row) => EntityRef::Project(row.id.clone()),
            Row::Asset(row) => EntityRef::Asset(row.id.clone()),
            Row::Group(row) => EntityRef::Group(row.id.clone()),
            Row::Membership(row) => EntityRef::Membership {
                asset_id: row.asset_id.clone(),
                group_id: row.group_id.clone(),
            },
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.table(), self.key())
    }
}

#[cfg(test)]
mod tests {
    use calendar::asset::NewAsset;
    use calendar::geometry::{Frame, FrameType};
    use calendar::store::CalendarStore;

    use super::*;

    fn store() -> CalendarStore {
        let mut store = CalendarStore::new();
        store.create_project("Family".to_string(), CalendarType::Wall, Format::A4, Orientation::Portrait);
        store.add_asset(
            NewAsset {
                name: "beach".to_string(),
                source_type: SourceType::Url,
                url: "https://example.com/beach.jpg".to_string(),
                thumbnail_url: None,
                original_width: 640,
                original_height: 480,
            },
            Some("a1".into()),
        );
        let group_id = store.create_group("Nature".to_string(), None);
        store
            .add_images_to_group(&group_id, &["a1".into()])
            .unwrap();
        store
            .update_page_layout(1, FrameType::Image, Frame::new(0.1, 0.2, 0.3, 0.4))
            .unwrap();
        store
    }

    #[test]
    fn project_row_stores_format_and_months_as_json_text() {
        // given
        let snapshot = store().snapshot();
        let rows = SnapshotRows::from_snapshot(&snapshot, Utc::now());

        // when
        let value = Row::Project(rows.projects[0].clone())
            .to_value()
            .unwrap();

        // then
        assert!(value["format"].is_string());
        assert!(value["months"].is_string());
        assert_eq!(value["months_per_page"], serde_json::json!(2));
        assert_eq!(value["calendar_type"], serde_json::json!("wall"));
    }

    #[test]
    fn memberships_are_junction_rows() {
        // given
        let snapshot = store().snapshot();

        // when
        let rows = SnapshotRows::from_snapshot(&snapshot, Utc::now());

        // then
        assert_eq!(rows.memberships.len(), 1);
        assert_eq!(rows.memberships[0].asset_id, AssetId::from("a1"));
        assert_eq!(rows.memberships[0].group_id, snapshot.groups[0].id);
    }

    #[test]
    fn rows_convert_back_to_the_documents() {
        // given
        let snapshot = store().snapshot();
        let rows = SnapshotRows::from_snapshot(&snapshot, Utc::now());

        // when
        let decoded = rows
            .into_rows()
            .map(|row| {
                let table = row.table();
                Row::from_value(table, row.to_value().unwrap()).unwrap()
            })
            .collect::<Vec<_>>();
        let restored = SnapshotRows::from_rows(decoded).into_snapshot();

        // then
        assert_eq!(restored.projects, snapshot.projects);
        assert_eq!(restored.assets, snapshot.assets);
        assert_eq!(restored.groups, snapshot.groups);
    }
}
