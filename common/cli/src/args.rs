use calendar::asset::SourceType;
use calendar::geometry::FrameType;
use calendar::page::CoverTextPosition;
use calendar::project::{CalendarType, Format, ImageFit, MonthsPerPage, Orientation};
use clap::ValueEnum;
use util::sorting::SortOrder;

/// Args decouple of CLI arg handling requirements from the internal data structures

#[derive(Debug, Clone)]
#[derive(ValueEnum)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrderArg {
    Asc,
    Desc,
}

impl SortOrderArg {
    pub fn to_sort_order(&self) -> SortOrder {
        match self {
            SortOrderArg::Asc => SortOrder::Asc,
            SortOrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "lower")]
pub enum CalendarTypeArg {
    Wall,
    Desk,
}

impl From<CalendarTypeArg> for CalendarType {
    fn from(value: CalendarTypeArg) -> Self {
        match value {
            CalendarTypeArg::Wall => Self::Wall,
            CalendarTypeArg::Desk => Self::Desk,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "lower")]
pub enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

/// Paper formats, custom sizes are given in millimeters instead.
#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatArg {
    A4,
    A5,
}

impl From<FormatArg> for Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::A4 => Format::A4,
            FormatArg::A5 => Format::A5,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MonthsPerPageArg {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
}

impl From<MonthsPerPageArg> for MonthsPerPage {
    fn from(value: MonthsPerPageArg) -> Self {
        match value {
            MonthsPerPageArg::One => Self::One,
            MonthsPerPageArg::Two => Self::Two,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "lower")]
pub enum ImageFitArg {
    Cover,
    Contain,
}

impl From<ImageFitArg> for ImageFit {
    fn from(value: ImageFitArg) -> Self {
        match value {
            ImageFitArg::Cover => Self::Cover,
            ImageFitArg::Contain => Self::Contain,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "lower")]
pub enum FrameTypeArg {
    Image,
    Grid,
}

impl From<FrameTypeArg> for FrameType {
    fn from(value: FrameTypeArg) -> Self {
        match value {
            FrameTypeArg::Image => Self::Image,
            FrameTypeArg::Grid => Self::Grid,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "lower")]
pub enum CoverTextPositionArg {
    Top,
    Bottom,
}

impl From<CoverTextPositionArg> for CoverTextPosition {
    fn from(value: CoverTextPositionArg) -> Self {
        match value {
            CoverTextPositionArg::Top => Self::Top,
            CoverTextPositionArg::Bottom => Self::Bottom,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "lower")]
pub enum SourceTypeArg {
    Upload,
    Url,
}

impl From<SourceTypeArg> for SourceType {
    fn from(value: SourceTypeArg) -> Self {
        match value {
            SourceTypeArg::Upload => Self::Upload,
            SourceTypeArg::Url => Self::Url,
        }
    }
}
