#![deny(missing_docs)]

use std::path::PathBuf;

use calendar::asset::{AssetUpdate, NewAsset};
use calendar::geometry::{Frame, ImageTransform, PageMargins};
use calendar::group::GroupUpdate;
use calendar::ids::{AssetId, GroupId, ProjectId};
use calendar::project::{Format, LengthUnit, ProjectUpdate};
use calendar::store::Event;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use cli::args::{
    CalendarTypeArg, CoverTextPositionArg, FormatArg, FrameTypeArg, ImageFitArg, MonthsPerPageArg, OrientationArg,
    SortOrderArg, SourceTypeArg,
};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "calendar_cli")]
#[command(bin_name = "calendar_cli")]
#[command(version, about, long_about = None)]
pub(crate) struct Opts {
    #[command(subcommand)]
    pub(crate) command: ModeCommand,

    /// Workspace path
    #[arg(long, global = true, default_value = ".")]
    pub(crate) path: PathBuf,

    /// Trace log file
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "trace.log")]
    pub(crate) trace: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) verbose: Verbosity<InfoLevel>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ModeCommand {
    /// Project mode
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Page mode, pages of the active project
    #[command(subcommand)]
    Page(PageCommand),

    /// Asset mode
    #[command(subcommand)]
    Asset(AssetCommand),

    /// Group mode
    #[command(subcommand)]
    Group(GroupCommand),

    /// Print the resolved page layout of the active project as JSON
    Layout {
        /// Page index, all pages when omitted
        #[arg(long)]
        page: Option<usize>,

        /// Include the raster size of a page at this resolution
        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Export the workspace as a JSON document
    Export {
        /// Output file, stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,

        /// Replace the urls of uploaded images
        #[arg(long)]
        redact_uploads: bool,

        /// Pretty print the document
        #[arg(long)]
        pretty: bool,
    },

    /// Replace the workspace content with an exported document
    Import {
        /// Input file
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum ProjectCommand {
    /// Create a project and make it the active project
    Create {
        /// Title, e.g. 'Family 2026'
        #[arg(long)]
        title: String,

        /// Calendar type
        #[arg(long = "type", value_name = "TYPE", default_value = "wall")]
        calendar_type: CalendarTypeArg,

        /// Paper format
        #[arg(long, default_value = "A4")]
        format: FormatArg,

        /// Orientation
        #[arg(long, default_value = "portrait")]
        orientation: OrientationArg,
    },
    /// Update a project
    Update {
        /// Project id
        #[arg(long, value_parser = clap::value_parser!(ProjectId), value_name = "PROJECT_ID")]
        project: ProjectId,

        #[command(flatten)]
        args: ProjectUpdateArgs,
    },
    /// Delete a project, assets and groups are kept
    Delete {
        /// Project id
        #[arg(long, value_parser = clap::value_parser!(ProjectId), value_name = "PROJECT_ID")]
        project: ProjectId,
    },
    /// Make a project the active project
    Activate {
        /// Project id
        #[arg(long, value_parser = clap::value_parser!(ProjectId), value_name = "PROJECT_ID")]
        project: ProjectId,
    },
    /// List projects
    List,
}

/// Fields of a project to update, fields that are not given are left unchanged.
#[derive(Debug, Args)]
pub(crate) struct ProjectUpdateArgs {
    /// Title
    #[arg(long)]
    title: Option<String>,

    /// Calendar type
    #[arg(long = "type", value_name = "TYPE")]
    calendar_type: Option<CalendarTypeArg>,

    /// Paper format
    #[arg(long, conflicts_with_all = ["width", "height"])]
    format: Option<FormatArg>,

    /// Custom page width, in millimeters
    #[arg(long, requires = "height")]
    width: Option<f64>,

    /// Custom page height, in millimeters
    #[arg(long, requires = "width")]
    height: Option<f64>,

    /// Orientation
    #[arg(long)]
    orientation: Option<OrientationArg>,

    /// Bleed, in millimeters
    #[arg(long)]
    bleed: Option<f64>,

    /// Default page margin, in millimeters
    #[arg(long)]
    margin: Option<f64>,

    /// Calendar year
    #[arg(long)]
    year: Option<i32>,

    /// Months per page
    #[arg(long)]
    months_per_page: Option<MonthsPerPageArg>,

    /// Font family
    #[arg(long)]
    font_family: Option<String>,

    /// Image fit on the cover page
    #[arg(long)]
    cover_image_fit: Option<ImageFitArg>,

    /// Image fit on the month pages
    #[arg(long)]
    months_image_fit: Option<ImageFitArg>,

    /// The group images are picked from
    #[arg(long, value_parser = clap::value_parser!(GroupId), value_name = "GROUP_ID", conflicts_with = "clear_group")]
    group: Option<GroupId>,

    /// Clear the group images are picked from
    #[arg(long)]
    clear_group: bool,
}

impl ProjectUpdateArgs {
    fn into_update(self) -> ProjectUpdate {
        let format = match (self.format, self.width, self.height) {
            (Some(format), _, _) => Some(Format::from(format)),
            (None, Some(width), Some(height)) => Some(Format {
                width,
                height,
                unit: LengthUnit::Mm,
            }),
            _ => None,
        };

        let selected_group_id = match (self.group, self.clear_group) {
            (Some(group), _) => Some(Some(group)),
            (None, true) => Some(None),
            (None, false) => None,
        };

        ProjectUpdate {
            title: self.title,
            calendar_type: self.calendar_type.map(Into::into),
            format,
            orientation: self.orientation.map(Into::into),
            bleed: self.bleed,
            margin: self.margin,
            year: self.year,
            months: None,
            months_per_page: self.months_per_page.map(Into::into),
            selected_group_id,
            font_family: self.font_family.map(Some),
            cover_image_fit: self.cover_image_fit.map(|fit| Some(fit.into())),
            months_image_fit: self.months_image_fit.map(|fit| Some(fit.into())),
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum PageCommand {
    /// Make a page the active page
    Select {
        /// Page index, 0 is the cover
        #[arg(long)]
        page: usize,
    },
    /// Assign an image to a page, or clear the assignment
    Assign {
        /// Page index, 0 is the cover
        #[arg(long)]
        page: usize,

        /// Asset id, the assignment is cleared when omitted
        #[arg(long, value_parser = clap::value_parser!(AssetId), value_name = "ASSET_ID")]
        image: Option<AssetId>,
    },
    /// Show or hide the month grid of a page
    ToggleGrid {
        /// Page index, 0 is the cover
        #[arg(long)]
        page: usize,
    },
    /// Set or clear a cover text
    CoverText {
        /// Page index of the cover
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Text position
        #[arg(long)]
        position: CoverTextPositionArg,

        /// Text, the text is cleared when omitted
        #[arg(long)]
        text: Option<String>,
    },
    /// Set the margins of a page, in millimeters
    Margins {
        /// Page index, 0 is the cover
        #[arg(long)]
        page: usize,

        /// Top margin, negative values become zero
        #[arg(long, allow_negative_numbers = true)]
        top: f64,

        /// Right margin, negative values become zero
        #[arg(long, allow_negative_numbers = true)]
        right: f64,

        /// Bottom margin, negative values become zero
        #[arg(long, allow_negative_numbers = true)]
        bottom: f64,

        /// Left margin, negative values become zero
        #[arg(long, allow_negative_numbers = true)]
        left: f64,

        /// Apply to every month page instead, the cover is not changed
        #[arg(long)]
        all_months: bool,
    },
    /// Move or resize the image or grid frame of a page, in page fractions
    Frame {
        /// Page index, 0 is the cover
        #[arg(long)]
        page: usize,

        /// Frame
        #[arg(long = "type", value_name = "TYPE")]
        frame_type: FrameTypeArg,

        /// Left edge
        #[arg(long, allow_negative_numbers = true)]
        x: f64,

        /// Top edge
        #[arg(long, allow_negative_numbers = true)]
        y: f64,

        /// Width
        #[arg(long)]
        width: f64,

        /// Height
        #[arg(long)]
        height: f64,

        /// Keep the aspect ratio while resizing
        #[arg(long)]
        lock_aspect: bool,
    },
    /// Pan, zoom and rotate the image of a page
    Transform {
        /// Page index, 0 is the cover
        #[arg(long)]
        page: usize,

        /// Horizontal offset
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,

        /// Vertical offset
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,

        /// Scale
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        /// Rotation, in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rotation: f64,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum AssetCommand {
    /// Add an image asset, prints the asset id
    Add {
        /// Name
        #[arg(long)]
        name: String,

        /// Image url
        #[arg(long)]
        url: String,

        /// Source
        #[arg(long, default_value = "url")]
        source_type: SourceTypeArg,

        /// Thumbnail url
        #[arg(long)]
        thumbnail_url: Option<String>,

        /// Image width, in pixels
        #[arg(long)]
        width: u32,

        /// Image height, in pixels
        #[arg(long)]
        height: u32,

        /// Asset id, allocated when omitted
        #[arg(long, value_parser = clap::value_parser!(AssetId), value_name = "ASSET_ID")]
        id: Option<AssetId>,
    },
    /// Update an image asset
    Update {
        /// Asset id
        #[arg(long, value_parser = clap::value_parser!(AssetId), value_name = "ASSET_ID")]
        id: AssetId,

        /// Name
        #[arg(long)]
        name: Option<String>,

        /// Image url
        #[arg(long)]
        url: Option<String>,

        /// Tags, e.g. 'beach,summer'
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Delete an image asset, it is removed from groups and pages
    Delete {
        /// Asset id
        #[arg(long, value_parser = clap::value_parser!(AssetId), value_name = "ASSET_ID")]
        id: AssetId,
    },
    /// List image assets by creation time
    List {
        /// Sort order
        #[arg(long, default_value = "ASC")]
        sort: SortOrderArg,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum GroupCommand {
    /// Create a group, prints the group id
    Create {
        /// Name, unique
        #[arg(long)]
        name: String,

        /// Color, e.g. '#3b82f6'
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename or recolor a group
    Update {
        /// Group id
        #[arg(long, value_parser = clap::value_parser!(GroupId), value_name = "GROUP_ID")]
        id: GroupId,

        /// Name, unique
        #[arg(long)]
        name: Option<String>,

        /// Color, e.g. '#3b82f6'
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a group, images are kept
    Delete {
        /// Group id
        #[arg(long, value_parser = clap::value_parser!(GroupId), value_name = "GROUP_ID")]
        id: GroupId,
    },
    /// Add images to a group
    Add {
        /// Group id
        #[arg(long, value_parser = clap::value_parser!(GroupId), value_name = "GROUP_ID")]
        id: GroupId,

        /// Asset ids, e.g. 'a1,a2'
        #[arg(long, required = true, num_args = 1.., value_delimiter = ',', value_parser = clap::value_parser!(AssetId))]
        images: Vec<AssetId>,
    },
    /// Remove images from a group
    Remove {
        /// Group id
        #[arg(long, value_parser = clap::value_parser!(GroupId), value_name = "GROUP_ID")]
        id: GroupId,

        /// Asset ids, e.g. 'a1,a2'
        #[arg(long, required = true, num_args = 1.., value_delimiter = ',', value_parser = clap::value_parser!(AssetId))]
        images: Vec<AssetId>,
    },
    /// List groups
    List,
}

/// What a command line asks for.
#[derive(Debug)]
pub(crate) enum Request {
    /// A change to the workspace
    Event(Event),
    /// Print the projects
    ListProjects,
    /// Print the assets
    ListAssets {
        /// Sort order
        sort: SortOrderArg,
    },
    /// Print the groups
    ListGroups,
    /// Print the layout
    Layout {
        /// Page index
        page: Option<usize>,
        /// Raster resolution
        dpi: Option<u32>,
    },
    /// Export the workspace
    Export {
        /// Output file
        output: Option<PathBuf>,
        /// Redact upload urls
        redact_uploads: bool,
        /// Pretty print
        pretty: bool,
    },
    /// Import a document
    Import {
        /// Input file
        input: PathBuf,
    },
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Nothing to update")]
    NothingToUpdate,
}

impl TryFrom<ModeCommand> for Request {
    type Error = EventError;

    fn try_from(command: ModeCommand) -> Result<Self, Self::Error> {
        let event = match command {
            ModeCommand::Project(command) => match command {
                ProjectCommand::Create {
                    title,
                    calendar_type,
                    format,
                    orientation,
                } => Event::CreateProject {
                    title,
                    calendar_type: calendar_type.into(),
                    format: format.into(),
                    orientation: orientation.into(),
                },
                ProjectCommand::Update {
                    project,
                    args,
                } => {
                    let update = args.into_update();
                    if update.is_empty() {
                        return Err(EventError::NothingToUpdate);
                    }
                    Event::UpdateProject {
                        id: project,
                        update,
                    }
                }
                ProjectCommand::Delete {
                    project,
                } => Event::DeleteProject {
                    id: project,
                },
                ProjectCommand::Activate {
                    project,
                } => Event::SetActiveProject {
                    id: Some(project),
                },
                ProjectCommand::List => return Ok(Request::ListProjects),
            },
            ModeCommand::Page(command) => match command {
                PageCommand::Select {
                    page,
                } => Event::SetActivePage {
                    index: page,
                },
                PageCommand::Assign {
                    page,
                    image,
                } => Event::AssignImageToPage {
                    page_index: page,
                    image_id: image,
                },
                PageCommand::ToggleGrid {
                    page,
                } => Event::ToggleGrid {
                    page_index: page,
                },
                PageCommand::CoverText {
                    page,
                    position,
                    text,
                } => Event::UpdateCoverText {
                    page_index: page,
                    position: position.into(),
                    text,
                },
                PageCommand::Margins {
                    page,
                    top,
                    right,
                    bottom,
                    left,
                    all_months,
                } => Event::UpdatePageMargins {
                    page_index: page,
                    margins: PageMargins {
                        top,
                        right,
                        bottom,
                        left,
                    }
                    .clamped(),
                    apply_to_all_months: all_months,
                },
                PageCommand::Frame {
                    page,
                    frame_type,
                    x,
                    y,
                    width,
                    height,
                    lock_aspect,
                } => Event::UpdatePageLayout {
                    page_index: page,
                    frame_type: frame_type.into(),
                    frame: Frame::new(x, y, width, height).with_lock_aspect(lock_aspect),
                },
                PageCommand::Transform {
                    page,
                    x,
                    y,
                    scale,
                    rotation,
                } => Event::UpdateImageTransform {
                    page_index: page,
                    transform: ImageTransform {
                        x,
                        y,
                        scale,
                        rotation,
                        ..ImageTransform::default()
                    },
                },
            },
            ModeCommand::Asset(command) => match command {
                AssetCommand::Add {
                    name,
                    url,
                    source_type,
                    thumbnail_url,
                    width,
                    height,
                    id,
                } => Event::AddAsset {
                    asset: NewAsset {
                        name,
                        source_type: source_type.into(),
                        url,
                        thumbnail_url,
                        original_width: width,
                        original_height: height,
                    },
                    id,
                },
                AssetCommand::Update {
                    id,
                    name,
                    url,
                    tags,
                } => {
                    let update = AssetUpdate {
                        name,
                        url,
                        tags,
                        ..AssetUpdate::default()
                    };
                    if update == AssetUpdate::default() {
                        return Err(EventError::NothingToUpdate);
                    }
                    Event::UpdateAsset {
                        id,
                        update,
                    }
                }
                AssetCommand::Delete {
                    id,
                } => Event::DeleteAsset {
                    id,
                },
                AssetCommand::List {
                    sort,
                } => {
                    return Ok(Request::ListAssets {
                        sort,
                    })
                }
            },
            ModeCommand::Group(command) => match command {
                GroupCommand::Create {
                    name,
                    color,
                } => Event::CreateGroup {
                    name,
                    color,
                },
                GroupCommand::Update {
                    id,
                    name,
                    color,
                } => {
                    let update = GroupUpdate {
                        name,
                        color: color.map(Some),
                    };
                    if update == GroupUpdate::default() {
                        return Err(EventError::NothingToUpdate);
                    }
                    Event::UpdateGroup {
                        id,
                        update,
                    }
                }
                GroupCommand::Delete {
                    id,
                } => Event::DeleteGroup {
                    id,
                },
                GroupCommand::Add {
                    id,
                    images,
                } => Event::AddImagesToGroup {
                    group_id: id,
                    image_ids: images,
                },
                GroupCommand::Remove {
                    id,
                    images,
                } => Event::RemoveImagesFromGroup {
                    group_id: id,
                    image_ids: images,
                },
                GroupCommand::List => return Ok(Request::ListGroups),
            },
            ModeCommand::Layout {
                page,
                dpi,
            } => {
                return Ok(Request::Layout {
                    page,
                    dpi,
                })
            }
            ModeCommand::Export {
                output,
                redact_uploads,
                pretty,
            } => {
                return Ok(Request::Export {
                    output,
                    redact_uploads,
                    pretty,
                })
            }
            ModeCommand::Import {
                input,
            } => {
                return Ok(Request::Import {
                    input,
                })
            }
        };

        Ok(Request::Event(event))
    }
}

#[cfg(test)]
mod tests {
    use calendar::project::MonthsPerPage;

    use super::*;

    fn request(args: &[&str]) -> Result<Request, EventError> {
        let opts = Opts::parse_from(std::iter::once("calendar_cli").chain(args.iter().copied()));
        Request::try_from(opts.command)
    }

    #[test]
    fn negative_margins_become_zero() {
        // when
        let request = request(&["page", "margins", "--page", "1", "--top", "-5", "--right", "-5", "--bottom", "5", "--left", "5"]).unwrap();

        // then
        let Request::Event(Event::UpdatePageMargins { margins, .. }) = request else {
            panic!("unexpected request: {:?}", request);
        };
        assert_eq!(margins, PageMargins {
            top: 0.0,
            right: 0.0,
            bottom: 5.0,
            left: 5.0,
        });
    }

    #[test]
    fn project_update_builds_a_partial_update() {
        // when
        let request = request(&["project", "update", "--project", "p1", "--months-per-page", "1", "--width", "100", "--height", "150"]).unwrap();

        // then
        let Request::Event(Event::UpdateProject { id, update }) = request else {
            panic!("unexpected request: {:?}", request);
        };
        assert_eq!(id, ProjectId::from("p1"));
        assert_eq!(update, ProjectUpdate {
            months_per_page: Some(MonthsPerPage::One),
            format: Some(Format {
                width: 100.0,
                height: 150.0,
                unit: LengthUnit::Mm,
            }),
            ..ProjectUpdate::default()
        });
    }

    #[test]
    fn empty_update_is_rejected() {
        // expect
        assert!(matches!(
            request(&["group", "update", "--id", "g1"]),
            Err(EventError::NothingToUpdate)
        ));
    }

    #[test]
    fn negative_frame_positions_are_accepted() {
        // when
        let request = request(&["page", "frame", "--page", "1", "--type", "image", "--x", "-0.2", "--y", "0.9", "--width", "0.5", "--height", "0.4"]).unwrap();

        // then
        assert!(matches!(
            request,
            Request::Event(Event::UpdatePageLayout { page_index: 1, frame, .. }) if frame == Frame::new(-0.2, 0.9, 0.5, 0.4)
        ));
    }
}
