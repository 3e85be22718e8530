//! Page layout resolution.
//!
//! Turns the normalized frames of a page into physical rectangles (millimeters) for a renderer or exporter.
//!
//! Coordinates have their origin at the top-left of the trimmed page.  The bleed extends outside the trimmed page on
//! every side.  Frames are relative to the content box, i.e. the trimmed page minus the page margins.

use crate::asset::ImageAsset;
use crate::geometry::{Frame, ImageTransform, PageMargins};
use crate::grid::{covered_months, month_grid, MonthGrid};
use crate::ids::AssetId;
use crate::page::{GridStyle, MonthPage, MonthSlot};
use crate::project::{CalendarProject, ImageFit, Orientation};

const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SizeMm {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RectMm {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectMm {
    /// Map a frame, normalized to this rectangle, to millimeters.
    pub fn place(&self, frame: &Frame) -> RectMm {
        RectMm {
            x: self.x + frame.x * self.width,
            y: self.y + frame.y * self.height,
            width: frame.w * self.width,
            height: frame.h * self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolvedImage {
    pub asset_id: AssetId,
    /// `None` when the asset is not known, e.g. it was deleted elsewhere.
    pub url: Option<String>,
    pub rect: RectMm,
    pub transform: ImageTransform,
    pub fit: ImageFit,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolvedGrid {
    pub rect: RectMm,
    pub style: GridStyle,
    pub months: Vec<MonthGrid>,
}

/// Everything a renderer needs to draw one page.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolvedPage {
    pub index: usize,
    pub month: MonthSlot,
    pub trim: SizeMm,
    pub bleed: f64,
    pub margins: PageMargins,
    pub content: RectMm,
    pub image: Option<ResolvedImage>,
    pub grid: Option<ResolvedGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_text_top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_text_bottom: Option<String>,
}

/// Pixel size of a rasterized page, including the bleed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RasterTarget {
    pub width: u32,
    pub height: u32,
}

/// The trimmed page size, landscape swaps the format so that the long side is horizontal.
pub fn trim_size(project: &CalendarProject) -> SizeMm {
    let (width, height) = project.format.size_mm();
    let (short, long) = (width.min(height), width.max(height));

    match project.orientation {
        Orientation::Portrait => SizeMm {
            width: short,
            height: long,
        },
        Orientation::Landscape => SizeMm {
            width: long,
            height: short,
        },
    }
}

/// Margins of a page, pages without their own margins use the project margin on every side.
pub fn page_margins(project: &CalendarProject, page: &MonthPage) -> PageMargins {
    page.margins_or(PageMargins::uniform(project.margin))
        .clamped()
}

/// The area inside the margins, empty when the margins are larger than the page.
pub fn content_box(trim: SizeMm, margins: &PageMargins) -> RectMm {
    RectMm {
        x: margins.left,
        y: margins.top,
        width: (trim.width - margins.left - margins.right).max(0.0),
        height: (trim.height - margins.top - margins.bottom).max(0.0),
    }
}

pub fn resolve_page(project: &CalendarProject, assets: &[ImageAsset], index: usize) -> Option<ResolvedPage> {
    let page = project.page(index)?;

    let trim = trim_size(project);
    let margins = page_margins(project, page);
    let content = content_box(trim, &margins);

    let image = page
        .assigned_image_id
        .as_ref()
        .map(|asset_id| {
            let url = assets
                .iter()
                .find(|asset| &asset.id == asset_id)
                .map(|asset| asset.url.clone());
            let fit = match page.month {
                MonthSlot::Cover => project.cover_image_fit,
                MonthSlot::Month(_) => project.months_image_fit,
            }
            .unwrap_or(ImageFit::Cover);

            ResolvedImage {
                asset_id: asset_id.clone(),
                url,
                rect: content.place(&page.layout.image_frame),
                transform: page.image_transform,
                fit,
            }
        });

    let grid = match page.show_grid {
        true => Some(ResolvedGrid {
            rect: content.place(&page.layout.calendar_grid_frame),
            style: page.grid_style.clone(),
            months: covered_months(page.month, project.months_per_page)
                .into_iter()
                .filter_map(|month| month_grid(project.year, month, &page.grid_style))
                .collect(),
        }),
        false => None,
    };

    let (cover_text_top, cover_text_bottom) = match page.is_cover() {
        true => (page.cover_text_top.clone(), page.cover_text_bottom.clone()),
        false => (None, None),
    };

    Some(ResolvedPage {
        index,
        month: page.month,
        trim,
        bleed: project.bleed.max(0.0),
        margins,
        content,
        image,
        grid,
        cover_text_top,
        cover_text_bottom,
    })
}

/// All pages of the project, in page order, as walked by an exporter.
pub fn resolve_pages(project: &CalendarProject, assets: &[ImageAsset]) -> Vec<ResolvedPage> {
    (0..project.months.len())
        .filter_map(|index| resolve_page(project, assets, index))
        .collect()
}

/// The raster size of every page of the project at the given resolution.
pub fn raster_target(project: &CalendarProject, dpi: f64) -> RasterTarget {
    let trim = trim_size(project);
    let bleed = project.bleed.max(0.0);
    let to_px = |mm: f64| ((mm / MM_PER_INCH) * dpi).round().max(1.0) as u32;

    RasterTarget {
        width: to_px(trim.width + 2.0 * bleed),
        height: to_px(trim.height + 2.0 * bleed),
    }
}
