//! Builds the page list of a project from its months-per-page setting.

use crate::geometry::{Frame, DEFAULT_IMAGE_TRANSFORM, DEFAULT_MARGINS};
use crate::page::{GridStyle, MonthPage, MonthSlot, PageLayout};
use crate::project::MonthsPerPage;

pub const COVER_IMAGE_FRAME: Frame = Frame::new(0.05, 0.05, 0.9, 0.7);
pub const COVER_GRID_FRAME: Frame = Frame::new(0.05, 0.78, 0.9, 0.17);

pub const MONTH_IMAGE_FRAME: Frame = Frame::new(0.05, 0.05, 0.9, 0.55);
pub const MONTH_GRID_FRAME: Frame = Frame::new(0.05, 0.62, 0.9, 0.33);

/// The cover followed by one page per month (`1..=12`) or per month pair (`1, 3, .., 11`).
pub fn generate_pages(months_per_page: MonthsPerPage) -> Vec<MonthPage> {
    std::iter::once(default_cover_page())
        .chain(first_months(months_per_page).map(default_month_page))
        .collect()
}

/// The month numbers of the non-cover pages, in page order.
pub fn first_months(months_per_page: MonthsPerPage) -> impl Iterator<Item = u8> {
    (1..=12).step_by(months_per_page.months() as usize)
}

pub fn default_cover_page() -> MonthPage {
    MonthPage {
        month: MonthSlot::Cover,
        layout: PageLayout {
            image_frame: COVER_IMAGE_FRAME,
            calendar_grid_frame: COVER_GRID_FRAME,
        },
        assigned_image_id: None,
        image_transform: DEFAULT_IMAGE_TRANSFORM,
        show_grid: false,
        grid_style: GridStyle::default(),
        cover_text_top: None,
        cover_text_bottom: None,
        margins: Some(DEFAULT_MARGINS),
    }
}

pub fn default_month_page(month: u8) -> MonthPage {
    MonthPage {
        month: MonthSlot::Month(month),
        layout: PageLayout {
            image_frame: MONTH_IMAGE_FRAME,
            calendar_grid_frame: MONTH_GRID_FRAME,
        },
        assigned_image_id: None,
        image_transform: DEFAULT_IMAGE_TRANSFORM,
        show_grid: true,
        grid_style: GridStyle::default(),
        cover_text_top: None,
        cover_text_bottom: None,
        margins: Some(DEFAULT_MARGINS),
    }
}
