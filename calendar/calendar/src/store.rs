//! The mutation engine.
//!
//! [`CalendarStore`] owns the document state, every change goes through one of its operations, or through
//! [`CalendarStore::dispatch`] with an [`Event`].  Collections are held in `Arc`s, an operation that changes a
//! collection replaces it (copy-on-write) so readers holding a previous `Arc` keep a consistent view.
//!
//! Page operations apply to the active project.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::asset::{AssetUpdate, ImageAsset, NewAsset};
use crate::generator::generate_pages;
use crate::geometry::{Frame, FrameType, ImageTransform, PageMargins, DEFAULT_IMAGE_TRANSFORM};
use crate::group::{dedupe_groups, GroupUpdate, ImageGroup};
use crate::history::{History, HistoryChange, HistoryEntry};
use crate::ids::{AssetId, GroupId, ProjectId};
use crate::page::{CoverTextPosition, MonthPage, MonthSlot};
use crate::project::{CalendarProject, CalendarType, Format, MonthsPerPage, Orientation, ProjectUpdate};
use crate::reconcile::{clamp_page_index, matches_layout, needs_reconciliation, reconcile_pages};
use crate::relation::Relation;
use crate::selection::Selection;
use crate::snapshot::{AppStateSnapshot, SNAPSHOT_VERSION};

pub const DEFAULT_BLEED: f64 = 3.0;
pub const DEFAULT_MARGIN: f64 = 10.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Project not found. id: {0}")]
    ProjectNotFound(ProjectId),
    #[error("No active project")]
    NoActiveProject,
    #[error("Page not found. project: {project}, index: {index}")]
    PageNotFound { project: ProjectId, index: usize },
    #[error("Asset not found. id: {0}")]
    AssetNotFound(AssetId),
    #[error("Group not found. id: {0}")]
    GroupNotFound(GroupId),
    #[error("Page is not the cover page. index: {0}")]
    NotACoverPage(usize),
    #[error("Duplicate group name. name: '{0}'")]
    DuplicateGroupName(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ProjectNotFound(_)
                | StoreError::PageNotFound { .. }
                | StoreError::AssetNotFound(_)
                | StoreError::GroupNotFound(_)
        )
    }
}

/// Every mutation of the store, as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateProject {
        title: String,
        calendar_type: CalendarType,
        format: Format,
        orientation: Orientation,
    },
    UpdateProject {
        id: ProjectId,
        update: ProjectUpdate,
    },
    DeleteProject {
        id: ProjectId,
    },
    SetActiveProject {
        id: Option<ProjectId>,
    },
    SetActivePage {
        index: usize,
    },
    UpdatePageLayout {
        page_index: usize,
        frame_type: FrameType,
        frame: Frame,
    },
    UpdateImageTransform {
        page_index: usize,
        transform: ImageTransform,
    },
    AssignImageToPage {
        page_index: usize,
        image_id: Option<AssetId>,
    },
    ToggleGrid {
        page_index: usize,
    },
    UpdateCoverText {
        page_index: usize,
        position: CoverTextPosition,
        text: Option<String>,
    },
    UpdatePageMargins {
        page_index: usize,
        margins: PageMargins,
        apply_to_all_months: bool,
    },
    AddAsset {
        asset: NewAsset,
        /// Supplied when the caller has already correlated an upload with the id.
        id: Option<AssetId>,
    },
    UpdateAsset {
        id: AssetId,
        update: AssetUpdate,
    },
    DeleteAsset {
        id: AssetId,
    },
    SelectAsset {
        id: AssetId,
        multi: bool,
    },
    SelectAssetRange {
        start: AssetId,
        end: AssetId,
        /// Defaults to the order of the assets in the store.
        ordering: Option<Vec<AssetId>>,
    },
    SelectAllAssets {
        ids: Vec<AssetId>,
    },
    ClearSelection,
    CreateGroup {
        name: String,
        color: Option<String>,
    },
    UpdateGroup {
        id: GroupId,
        update: GroupUpdate,
    },
    AddImagesToGroup {
        group_id: GroupId,
        image_ids: Vec<AssetId>,
    },
    RemoveImagesFromGroup {
        group_id: GroupId,
        image_ids: Vec<AssetId>,
    },
    DeleteGroup {
        id: GroupId,
    },
    Undo,
    Redo,
}

/// The result of a dispatched [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Done,
    ProjectCreated(ProjectId),
    AssetAdded(AssetId),
    GroupCreated(GroupId),
    /// `false` when there was nothing to undo/redo.
    History(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Undo,
    Redo,
}

impl Step {
    fn pick<T>(self, before: T, after: T) -> T {
        match self {
            Step::Undo => before,
            Step::Redo => after,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalendarStore {
    projects: Arc<Vec<CalendarProject>>,
    assets: Arc<Vec<ImageAsset>>,
    groups: Arc<Vec<ImageGroup>>,
    active_project_id: Option<ProjectId>,
    active_page_index: usize,
    selection: Selection,
    history: History,
    revision: u64,
}

impl CalendarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted state, restoring the invariants the persisted data might violate.
    ///
    /// Groups are deduplicated, page lists that do not match their months-per-page setting are reconciled and
    /// the asset/group relation is rebuilt from both sides.  An active project that does not exist is cleared.
    pub fn from_snapshot(snapshot: AppStateSnapshot) -> Self {
        let AppStateSnapshot {
            version,
            mut projects,
            mut assets,
            groups,
            active_project_id,
            active_page_index,
            ..
        } = snapshot;

        if version != SNAPSHOT_VERSION {
            warn!("Unexpected snapshot version. version: {}, expected: {}", version, SNAPSHOT_VERSION);
        }

        for project in projects.iter_mut() {
            if !matches_layout(&project.months, project.months_per_page) {
                warn!("Repairing page list. project: {}, pages: {}", project.id, project.months.len());
                project.months = reconcile_pages(&project.months, project.months_per_page);
            }
        }

        let mut groups = dedupe_groups(groups);
        Relation::new(&mut assets, &mut groups).repair();

        let active_project = active_project_id.and_then(|id| projects.iter().find(|project| project.id == id));
        let (active_project_id, active_page_index) = match active_project {
            Some(project) => (
                Some(project.id.clone()),
                clamp_page_index(active_page_index, project.months.len()),
            ),
            None => (None, 0),
        };

        info!(
            "Loaded snapshot. projects: {}, assets: {}, groups: {}",
            projects.len(),
            assets.len(),
            groups.len()
        );

        Self {
            projects: Arc::new(projects),
            assets: Arc::new(assets),
            groups: Arc::new(groups),
            active_project_id,
            active_page_index,
            selection: Selection::default(),
            history: History::default(),
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> AppStateSnapshot {
        AppStateSnapshot {
            version: SNAPSHOT_VERSION,
            projects: self.projects.as_ref().clone(),
            assets: self.assets.as_ref().clone(),
            groups: self.groups.as_ref().clone(),
            active_project_id: self.active_project_id.clone(),
            active_page_index: self.active_page_index,
            last_updated: Utc::now(),
        }
    }

    pub fn dispatch(&mut self, event: Event) -> Result<Dispatched, StoreError> {
        debug!("Dispatching event. event: {:?}", event);

        match event {
            Event::CreateProject {
                title,
                calendar_type,
                format,
                orientation,
            } => Ok(Dispatched::ProjectCreated(self.create_project(
                title,
                calendar_type,
                format,
                orientation,
            ))),
            Event::UpdateProject {
                id,
                update,
            } => self
                .update_project(&id, update)
                .map(|_| Dispatched::Done),
            Event::DeleteProject {
                id,
            } => self
                .delete_project(&id)
                .map(|_| Dispatched::Done),
            Event::SetActiveProject {
                id,
            } => {
                self.set_active_project(id);
                Ok(Dispatched::Done)
            }
            Event::SetActivePage {
                index,
            } => {
                self.set_active_page(index);
                Ok(Dispatched::Done)
            }
            Event::UpdatePageLayout {
                page_index,
                frame_type,
                frame,
            } => self
                .update_page_layout(page_index, frame_type, frame)
                .map(|_| Dispatched::Done),
            Event::UpdateImageTransform {
                page_index,
                transform,
            } => self
                .update_image_transform(page_index, transform)
                .map(|_| Dispatched::Done),
            Event::AssignImageToPage {
                page_index,
                image_id,
            } => self
                .assign_image_to_page(page_index, image_id)
                .map(|_| Dispatched::Done),
            Event::ToggleGrid {
                page_index,
            } => self
                .toggle_grid(page_index)
                .map(|_| Dispatched::Done),
            Event::UpdateCoverText {
                page_index,
                position,
                text,
            } => self
                .update_cover_text(page_index, position, text)
                .map(|_| Dispatched::Done),
            Event::UpdatePageMargins {
                page_index,
                margins,
                apply_to_all_months,
            } => self
                .update_page_margins(page_index, margins, apply_to_all_months)
                .map(|_| Dispatched::Done),
            Event::AddAsset {
                asset,
                id,
            } => Ok(Dispatched::AssetAdded(self.add_asset(asset, id))),
            Event::UpdateAsset {
                id,
                update,
            } => self
                .update_asset(&id, update)
                .map(|_| Dispatched::Done),
            Event::DeleteAsset {
                id,
            } => self
                .delete_asset(&id)
                .map(|_| Dispatched::Done),
            Event::SelectAsset {
                id,
                multi,
            } => self
                .select_asset(id, multi)
                .map(|_| Dispatched::Done),
            Event::SelectAssetRange {
                start,
                end,
                ordering,
            } => {
                self.select_asset_range(&start, &end, ordering.as_deref());
                Ok(Dispatched::Done)
            }
            Event::SelectAllAssets {
                ids,
            } => {
                self.select_all_assets(ids);
                Ok(Dispatched::Done)
            }
            Event::ClearSelection => {
                self.clear_selection();
                Ok(Dispatched::Done)
            }
            Event::CreateGroup {
                name,
                color,
            } => Ok(Dispatched::GroupCreated(self.create_group(name, color))),
            Event::UpdateGroup {
                id,
                update,
            } => self
                .update_group(&id, update)
                .map(|_| Dispatched::Done),
            Event::AddImagesToGroup {
                group_id,
                image_ids,
            } => self
                .add_images_to_group(&group_id, &image_ids)
                .map(|_| Dispatched::Done),
            Event::RemoveImagesFromGroup {
                group_id,
                image_ids,
            } => self
                .remove_images_from_group(&group_id, &image_ids)
                .map(|_| Dispatched::Done),
            Event::DeleteGroup {
                id,
            } => self
                .delete_group(&id)
                .map(|_| Dispatched::Done),
            Event::Undo => self.undo().map(Dispatched::History),
            Event::Redo => self.redo().map(Dispatched::History),
        }
    }

    //
    // projects
    //

    pub fn create_project(
        &mut self,
        title: String,
        calendar_type: CalendarType,
        format: Format,
        orientation: Orientation,
    ) -> ProjectId {
        let id = ProjectId::new_random();
        let now = Utc::now();
        let months_per_page = MonthsPerPage::Two;

        let project = CalendarProject {
            id: id.clone(),
            title,
            calendar_type,
            format,
            orientation,
            bleed: DEFAULT_BLEED,
            margin: DEFAULT_MARGIN,
            year: crate::project::current_year(),
            months: generate_pages(months_per_page),
            months_per_page,
            selected_group_id: None,
            font_family: None,
            cover_image_fit: None,
            months_image_fit: None,
            created_at: now,
            updated_at: now,
        };

        info!("Created project. id: {}, title: '{}'", id, project.title);

        Arc::make_mut(&mut self.projects).push(project);
        self.active_project_id = Some(id.clone());
        self.active_page_index = 0;
        self.revision += 1;

        id
    }

    /// Merge the update, then restore the page list invariant.
    ///
    /// The page list is reconciled when the months-per-page setting changes, or when the resulting page list
    /// does not match the setting.
    pub fn update_project(&mut self, id: &ProjectId, update: ProjectUpdate) -> Result<(), StoreError> {
        let index = self.project_index(id)?;
        let explicit_change = update
            .months_per_page
            .is_some_and(|months_per_page| months_per_page != self.projects[index].months_per_page);

        let project = &mut Arc::make_mut(&mut self.projects)[index];
        project.merge(update);

        if needs_reconciliation(&project.months, project.months_per_page, explicit_change) {
            project.months = reconcile_pages(&project.months, project.months_per_page);
        }
        project.updated_at = Utc::now();
        let page_count = project.months.len();

        if self.active_project_id.as_ref() == Some(id) {
            self.active_page_index = clamp_page_index(self.active_page_index, page_count);
        }
        self.revision += 1;

        info!("Updated project. id: {}, pages: {}", id, page_count);
        Ok(())
    }

    /// Assets are not deleted with the project.
    pub fn delete_project(&mut self, id: &ProjectId) -> Result<CalendarProject, StoreError> {
        let index = self.project_index(id)?;

        let project = Arc::make_mut(&mut self.projects).remove(index);
        if self.active_project_id.as_ref() == Some(id) {
            self.active_project_id = None;
            self.active_page_index = 0;
        }
        self.revision += 1;

        info!("Deleted project. id: {}", id);
        Ok(project)
    }

    /// Unknown ids are accepted, there is then no active project.
    pub fn set_active_project(&mut self, id: Option<ProjectId>) {
        debug!("Active project. id: {:?}", id);
        self.active_project_id = id;
        self.active_page_index = 0;
        self.revision += 1;
    }

    /// Not bounds checked, an out of range index results in no current page.
    pub fn set_active_page(&mut self, index: usize) {
        self.active_page_index = index;
        self.revision += 1;
    }

    //
    // pages of the active project
    //

    /// Commit a frame, clamped to the page.
    pub fn update_page_layout(
        &mut self,
        page_index: usize,
        frame_type: FrameType,
        frame: Frame,
    ) -> Result<(), StoreError> {
        let project_id = self.require_active_project()?;
        let after = frame.clamped();

        let (before, slot) = self.mutate_page(&project_id, page_index, |page| {
            (std::mem::replace(page.layout.frame_mut(frame_type), after), page.month)
        })?;

        info!(
            "Updated page layout. page: {}, frame_type: {}, frame: {}",
            page_index, frame_type, after
        );
        self.history
            .record(HistoryEntry::new(project_id, page_index, slot, HistoryChange::Frame {
                frame_type,
                before,
                after,
            }));
        Ok(())
    }

    pub fn update_image_transform(&mut self, page_index: usize, transform: ImageTransform) -> Result<(), StoreError> {
        let project_id = self.require_active_project()?;
        let after = transform.normalized();

        let (before, slot) = self.mutate_page(&project_id, page_index, |page| {
            (std::mem::replace(&mut page.image_transform, after), page.month)
        })?;

        info!(
            "Updated image transform. page: {}, scale: {}, rotation: {}",
            page_index, after.scale, after.rotation
        );
        self.history
            .record(HistoryEntry::new(project_id, page_index, slot, HistoryChange::Transform {
                before,
                after,
            }));
        Ok(())
    }

    /// Assign an image, or clear the assignment with `None`.  The image transform is always reset.
    pub fn assign_image_to_page(&mut self, page_index: usize, image_id: Option<AssetId>) -> Result<(), StoreError> {
        let project_id = self.require_active_project()?;
        if let Some(image_id) = &image_id {
            self.asset_index(image_id)?;
        }

        let after = image_id.clone();
        let (before, before_transform, slot) = self.mutate_page(&project_id, page_index, |page| {
            (
                std::mem::replace(&mut page.assigned_image_id, after),
                std::mem::replace(&mut page.image_transform, DEFAULT_IMAGE_TRANSFORM),
                page.month,
            )
        })?;

        info!("Assigned image to page. page: {}, image: {:?}", page_index, image_id);
        self.history
            .record(HistoryEntry::new(project_id, page_index, slot, HistoryChange::Assign {
                before,
                before_transform,
                after: image_id,
                after_transform: DEFAULT_IMAGE_TRANSFORM,
            }));
        Ok(())
    }

    /// Returns the new value.  Not recorded in the history.
    pub fn toggle_grid(&mut self, page_index: usize) -> Result<bool, StoreError> {
        let project_id = self.require_active_project()?;

        let show_grid = self.mutate_page(&project_id, page_index, |page| {
            page.show_grid = !page.show_grid;
            page.show_grid
        })?;

        info!("Toggled grid. page: {}, show_grid: {}", page_index, show_grid);
        Ok(show_grid)
    }

    /// Set or clear (`None` or empty text) a cover text.  Pages other than the cover are left unchanged.
    pub fn update_cover_text(
        &mut self,
        page_index: usize,
        position: CoverTextPosition,
        text: Option<String>,
    ) -> Result<(), StoreError> {
        let project_id = self.require_active_project()?;
        if !self
            .page(&project_id, page_index)?
            .is_cover()
        {
            return Err(StoreError::NotACoverPage(page_index));
        }

        let text = text.filter(|text| !text.is_empty());
        self.mutate_page(&project_id, page_index, |page| {
            *page.cover_text_mut(position) = text;
        })?;

        info!("Updated cover text. position: {:?}", position);
        Ok(())
    }

    /// With `apply_to_all_months`, and a page that is not the cover, the margins are set on every page except
    /// the cover.  Margins are stored as given, see [`PageMargins::clamped`].
    pub fn update_page_margins(
        &mut self,
        page_index: usize,
        margins: PageMargins,
        apply_to_all_months: bool,
    ) -> Result<(), StoreError> {
        let project_id = self.require_active_project()?;
        let is_cover = self
            .page(&project_id, page_index)?
            .is_cover();
        let index = self.project_index(&project_id)?;

        let project = &mut Arc::make_mut(&mut self.projects)[index];
        if apply_to_all_months && !is_cover {
            for page in project
                .months
                .iter_mut()
                .filter(|page| !page.is_cover())
            {
                page.margins = Some(margins);
            }
        } else {
            project.months[page_index].margins = Some(margins);
        }
        project.updated_at = Utc::now();
        self.revision += 1;

        info!(
            "Updated page margins. page: {}, apply_to_all_months: {}",
            page_index,
            apply_to_all_months && !is_cover
        );
        Ok(())
    }

    //
    // assets
    //

    /// Add an asset, allocating an id unless one is supplied.
    ///
    /// Adding with the id of an existing asset replaces its data, keeping its creation time and groups.
    pub fn add_asset(&mut self, asset: NewAsset, id: Option<AssetId>) -> AssetId {
        let id = id.unwrap_or_else(AssetId::new_random);
        let assets = Arc::make_mut(&mut self.assets);

        match assets
            .iter_mut()
            .find(|existing| existing.id == id)
        {
            Some(existing) => {
                let replacement = ImageAsset {
                    created_at: existing.created_at,
                    group_ids: std::mem::take(&mut existing.group_ids),
                    tags: std::mem::take(&mut existing.tags),
                    ..ImageAsset::new(id.clone(), asset, existing.created_at)
                };
                *existing = replacement;
                info!("Replaced asset. id: {}", id);
            }
            None => {
                info!("Added asset. id: {}, name: '{}'", id, asset.name);
                assets.push(ImageAsset::new(id.clone(), asset, Utc::now()));
            }
        }
        self.revision += 1;

        id
    }

    pub fn update_asset(&mut self, id: &AssetId, update: AssetUpdate) -> Result<(), StoreError> {
        let index = self.asset_index(id)?;

        Arc::make_mut(&mut self.assets)[index].merge(update);
        self.revision += 1;

        info!("Updated asset. id: {}", id);
        Ok(())
    }

    /// Remove the asset from every group, then from every page of every project, then the asset record and
    /// finally from the selection.
    pub fn delete_asset(&mut self, id: &AssetId) -> Result<ImageAsset, StoreError> {
        let index = self.asset_index(id)?;

        Relation::new(Arc::make_mut(&mut self.assets), Arc::make_mut(&mut self.groups)).detach_asset(id);

        let is_assigned = |page: &MonthPage| page.assigned_image_id.as_ref() == Some(id);
        if self
            .projects
            .iter()
            .any(|project| project.months.iter().any(is_assigned))
        {
            let now = Utc::now();
            for project in Arc::make_mut(&mut self.projects)
                .iter_mut()
                .filter(|project| project.months.iter().any(is_assigned))
            {
                for page in project
                    .months
                    .iter_mut()
                    .filter(|page| page.assigned_image_id.as_ref() == Some(id))
                {
                    page.assigned_image_id = None;
                }
                project.updated_at = now;
                debug!("Unassigned asset from project. project: {}, asset: {}", project.id, id);
            }
        }

        let asset = Arc::make_mut(&mut self.assets).remove(index);
        self.selection.remove(id);
        self.revision += 1;

        info!("Deleted asset. id: {}", id);
        Ok(asset)
    }

    //
    // selection
    //

    pub fn select_asset(&mut self, id: AssetId, multi: bool) -> Result<(), StoreError> {
        self.asset_index(&id)?;

        self.selection.select(id, multi);
        self.revision += 1;
        Ok(())
    }

    /// Add the range to the selection, `ordering` defaults to the order of the assets in the store.
    ///
    /// Returns `false` when either id is not in the ordering, the selection is then unchanged.
    pub fn select_asset_range(&mut self, start: &AssetId, end: &AssetId, ordering: Option<&[AssetId]>) -> bool {
        let applied = match ordering {
            Some(ordering) => self
                .selection
                .select_range(start, end, ordering),
            None => {
                let ordering = self
                    .assets
                    .iter()
                    .map(|asset| asset.id.clone())
                    .collect::<Vec<_>>();
                self.selection
                    .select_range(start, end, &ordering)
            }
        };

        if applied {
            self.revision += 1;
        } else {
            debug!("Ignoring range selection. start: {}, end: {}", start, end);
        }
        applied
    }

    pub fn select_all_assets(&mut self, ids: impl IntoIterator<Item = AssetId>) {
        self.selection.replace(ids);
        self.revision += 1;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.revision += 1;
    }

    //
    // groups
    //

    /// Group names are unique, creating a group with the name of an existing group returns the existing group.
    pub fn create_group(&mut self, name: String, color: Option<String>) -> GroupId {
        if let Some(existing) = self
            .groups
            .iter()
            .find(|group| group.name == name)
        {
            debug!("Group already exists. id: {}, name: '{}'", existing.id, name);
            return existing.id.clone();
        }

        let id = GroupId::new_random();
        info!("Created group. id: {}, name: '{}'", id, name);

        Arc::make_mut(&mut self.groups).push(ImageGroup {
            id: id.clone(),
            name,
            color,
            created_at: Utc::now(),
            image_ids: vec![],
        });
        self.revision += 1;

        id
    }

    pub fn update_group(&mut self, id: &GroupId, update: GroupUpdate) -> Result<(), StoreError> {
        let index = self.group_index(id)?;
        if let Some(name) = &update.name {
            if self
                .groups
                .iter()
                .any(|group| &group.name == name && &group.id != id)
            {
                return Err(StoreError::DuplicateGroupName(name.clone()));
            }
        }

        let GroupUpdate {
            name,
            color,
        } = update;
        let group = &mut Arc::make_mut(&mut self.groups)[index];
        if let Some(name) = name {
            group.name = name;
        }
        if let Some(color) = color {
            group.color = color;
        }
        self.revision += 1;

        info!("Updated group. id: {}, name: '{}'", id, self.groups[index].name);
        Ok(())
    }

    /// Returns the number of assets added, unknown asset ids are skipped.
    pub fn add_images_to_group(&mut self, group_id: &GroupId, image_ids: &[AssetId]) -> Result<usize, StoreError> {
        self.group_index(group_id)?;

        let added = Relation::new(Arc::make_mut(&mut self.assets), Arc::make_mut(&mut self.groups))
            .link(group_id, image_ids)
            .ok_or_else(|| StoreError::GroupNotFound(group_id.clone()))?;
        self.revision += 1;

        info!("Added images to group. group: {}, added: {}", group_id, added);
        Ok(added)
    }

    /// Returns the number of assets removed.
    pub fn remove_images_from_group(&mut self, group_id: &GroupId, image_ids: &[AssetId]) -> Result<usize, StoreError> {
        self.group_index(group_id)?;

        let removed = Relation::new(Arc::make_mut(&mut self.assets), Arc::make_mut(&mut self.groups))
            .unlink(group_id, image_ids)
            .ok_or_else(|| StoreError::GroupNotFound(group_id.clone()))?;
        self.revision += 1;

        info!("Removed images from group. group: {}, removed: {}", group_id, removed);
        Ok(removed)
    }

    /// Page assignments are kept, projects that had the group selected no longer do.
    pub fn delete_group(&mut self, id: &GroupId) -> Result<ImageGroup, StoreError> {
        self.group_index(id)?;

        let group = Relation::new(Arc::make_mut(&mut self.assets), Arc::make_mut(&mut self.groups))
            .detach_group(id)
            .ok_or_else(|| StoreError::GroupNotFound(id.clone()))?;

        if self
            .projects
            .iter()
            .any(|project| project.selected_group_id.as_ref() == Some(id))
        {
            for project in Arc::make_mut(&mut self.projects)
                .iter_mut()
                .filter(|project| project.selected_group_id.as_ref() == Some(id))
            {
                project.selected_group_id = None;
            }
        }
        self.revision += 1;

        info!("Deleted group. id: {}, name: '{}'", id, group.name);
        Ok(group)
    }

    //
    // history
    //

    /// Restore the values from before the most recent edit.  Returns `false` when there is nothing to undo.
    ///
    /// An entry whose project or page no longer exists is stepped over and reported as an error.
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        let Some(entry) = self.history.undo().cloned() else {
            return Ok(false);
        };
        self.apply_history(&entry, Step::Undo)?;

        info!("Undo. kind: {}, page: {}", entry.change.kind(), entry.page_index);
        Ok(true)
    }

    /// Re-apply the most recently undone edit.  Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        let Some(entry) = self.history.redo().cloned() else {
            return Ok(false);
        };
        self.apply_history(&entry, Step::Redo)?;

        info!("Redo. kind: {}, page: {}", entry.change.kind(), entry.page_index);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn apply_history(&mut self, entry: &HistoryEntry, step: Step) -> Result<(), StoreError> {
        let mut change = entry.change.clone();
        if let HistoryChange::Assign {
            before,
            after,
            ..
        } = &mut change
        {
            // assets deleted since the edit are not restored
            for image in [before, after] {
                if image
                    .as_ref()
                    .is_some_and(|id| self.asset_index(id).is_err())
                {
                    *image = None;
                }
            }
        }

        let page_index = self
            .slot_index(&entry.project_id, entry.slot, entry.page_index)
            .inspect_err(|error| warn!("Unable to apply history entry. entry: {}, error: {}", entry.id, error))?;

        self.mutate_page(&entry.project_id, page_index, |page| match change {
            HistoryChange::Frame {
                frame_type,
                before,
                after,
            } => *page.layout.frame_mut(frame_type) = step.pick(before, after),
            HistoryChange::Transform {
                before,
                after,
            } => page.image_transform = step.pick(before, after),
            HistoryChange::Assign {
                before,
                before_transform,
                after,
                after_transform,
            } => {
                let (image, transform) = step.pick((before, before_transform), (after, after_transform));
                page.assigned_image_id = image;
                page.image_transform = transform;
            }
        })
    }

    /// Current index of the page with the given slot, `recorded_index` is only used in the error.
    fn slot_index(&self, project_id: &ProjectId, slot: MonthSlot, recorded_index: usize) -> Result<usize, StoreError> {
        let index = self.project_index(project_id)?;
        self.projects[index]
            .months
            .iter()
            .position(|page| page.month == slot)
            .ok_or_else(|| StoreError::PageNotFound {
                project: project_id.clone(),
                index: recorded_index,
            })
    }

    //
    // queries
    //

    pub fn projects(&self) -> &[CalendarProject] {
        &self.projects
    }

    pub fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    pub fn groups(&self) -> &[ImageGroup] {
        &self.groups
    }

    /// A shared handle to the current project list, unaffected by later mutations.
    pub fn shared_projects(&self) -> Arc<Vec<CalendarProject>> {
        self.projects.clone()
    }

    pub fn get_project_by_id(&self, id: &ProjectId) -> Option<&CalendarProject> {
        self.projects
            .iter()
            .find(|project| &project.id == id)
    }

    pub fn get_asset_by_id(&self, id: &AssetId) -> Option<&ImageAsset> {
        self.assets
            .iter()
            .find(|asset| &asset.id == id)
    }

    pub fn get_group_by_id(&self, id: &GroupId) -> Option<&ImageGroup> {
        self.groups
            .iter()
            .find(|group| &group.id == id)
    }

    pub fn active_project_id(&self) -> Option<&ProjectId> {
        self.active_project_id.as_ref()
    }

    pub fn active_project(&self) -> Option<&CalendarProject> {
        self.active_project_id
            .as_ref()
            .and_then(|id| self.get_project_by_id(id))
    }

    pub fn active_page_index(&self) -> usize {
        self.active_page_index
    }

    pub fn current_page(&self) -> Option<&MonthPage> {
        self.active_project()?
            .page(self.active_page_index)
    }

    /// The assets of a group, in group order.
    pub fn assets_in_group(&self, group_id: &GroupId) -> Vec<&ImageAsset> {
        let Some(group) = self.get_group_by_id(group_id) else {
            return vec![];
        };

        group
            .image_ids
            .iter()
            .filter_map(|id| self.get_asset_by_id(id))
            .collect()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Incremented by every change, used to decide whether the state needs to be persisted.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    //
    // helpers
    //

    fn require_active_project(&self) -> Result<ProjectId, StoreError> {
        self.active_project_id
            .clone()
            .ok_or(StoreError::NoActiveProject)
    }

    fn project_index(&self, id: &ProjectId) -> Result<usize, StoreError> {
        self.projects
            .iter()
            .position(|project| &project.id == id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.clone()))
    }

    fn asset_index(&self, id: &AssetId) -> Result<usize, StoreError> {
        self.assets
            .iter()
            .position(|asset| &asset.id == id)
            .ok_or_else(|| StoreError::AssetNotFound(id.clone()))
    }

    fn group_index(&self, id: &GroupId) -> Result<usize, StoreError> {
        self.groups
            .iter()
            .position(|group| &group.id == id)
            .ok_or_else(|| StoreError::GroupNotFound(id.clone()))
    }

    fn page(&self, project_id: &ProjectId, page_index: usize) -> Result<&MonthPage, StoreError> {
        let index = self.project_index(project_id)?;
        self.projects[index]
            .page(page_index)
            .ok_or_else(|| StoreError::PageNotFound {
                project: project_id.clone(),
                index: page_index,
            })
    }

    /// Apply `f` to a page, only after checking the page exists, so a failed lookup changes nothing.
    fn mutate_page<T>(
        &mut self,
        project_id: &ProjectId,
        page_index: usize,
        f: impl FnOnce(&mut MonthPage) -> T,
    ) -> Result<T, StoreError> {
        self.page(project_id, page_index)?;
        let index = self.project_index(project_id)?;

        let project = &mut Arc::make_mut(&mut self.projects)[index];
        let result = f(&mut project.months[page_index]);
        project.updated_at = Utc::now();
        self.revision += 1;

        Ok(result)
    }
}
