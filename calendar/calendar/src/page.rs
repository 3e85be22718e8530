use std::fmt::{Display, Formatter};

use chrono::Weekday;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::geometry::{Frame, FrameType, ImageTransform, PageMargins, DEFAULT_MARGINS};
use crate::ids::AssetId;

const COVER_TAG: &str = "cover";

/// The slot a page occupies in the calendar.
///
/// Serialized as `"cover"` or as the month number.  With two months per page, the month is the first month of
/// the pair, e.g. `1` is January and February.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonthSlot {
    Cover,
    Month(u8),
}

impl MonthSlot {
    pub fn is_cover(&self) -> bool {
        matches!(self, MonthSlot::Cover)
    }

    pub fn month(&self) -> Option<u8> {
        match self {
            MonthSlot::Cover => None,
            MonthSlot::Month(month) => Some(*month),
        }
    }
}

impl Display for MonthSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MonthSlot::Cover => f.write_str(COVER_TAG),
            MonthSlot::Month(month) => write!(f, "{}", month),
        }
    }
}

impl Serialize for MonthSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MonthSlot::Cover => serializer.serialize_str(COVER_TAG),
            MonthSlot::Month(month) => serializer.serialize_u8(*month),
        }
    }
}

struct MonthSlotVisitor;

impl<'de> Visitor<'de> for MonthSlotVisitor {
    type Value = MonthSlot;

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("\"cover\" or a month number in 1..=12")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        match value {
            COVER_TAG => Ok(MonthSlot::Cover),
            _ => Err(E::invalid_value(Unexpected::Str(value), &self)),
        }
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        match u8::try_from(value) {
            Ok(month) if (1..=12).contains(&month) => Ok(MonthSlot::Month(month)),
            _ => Err(E::invalid_value(Unexpected::Unsigned(value), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        match u64::try_from(value) {
            Ok(value) => self.visit_u64(value),
            Err(_) => Err(E::invalid_value(Unexpected::Signed(value), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for MonthSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MonthSlotVisitor)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid weekday start, expected 0 (sunday) or 1 (monday). value: {0}")]
pub struct InvalidWeekdayStart(u8);

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum WeekdayStart {
    Sunday,
    #[default]
    Monday,
}

impl WeekdayStart {
    pub fn weekday(&self) -> Weekday {
        match self {
            WeekdayStart::Sunday => Weekday::Sun,
            WeekdayStart::Monday => Weekday::Mon,
        }
    }
}

impl TryFrom<u8> for WeekdayStart {
    type Error = InvalidWeekdayStart;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WeekdayStart::Sunday),
            1 => Ok(WeekdayStart::Monday),
            _ => Err(InvalidWeekdayStart(value)),
        }
    }
}

impl From<WeekdayStart> for u8 {
    fn from(value: WeekdayStart) -> Self {
        match value {
            WeekdayStart::Sunday => 0,
            WeekdayStart::Monday => 1,
        }
    }
}

/// Presentation settings for the calendar grid of a page.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridStyle {
    pub typography_scale: f64,
    pub weekday_start: WeekdayStart,
    pub language: String,
    pub show_week_numbers: bool,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            typography_scale: 1.0,
            weekday_start: WeekdayStart::Monday,
            language: "en".to_string(),
            show_week_numbers: false,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub image_frame: Frame,
    pub calendar_grid_frame: Frame,
}

impl PageLayout {
    pub fn frame(&self, frame_type: FrameType) -> Frame {
        match frame_type {
            FrameType::Image => self.image_frame,
            FrameType::Grid => self.calendar_grid_frame,
        }
    }

    pub fn frame_mut(&mut self, frame_type: FrameType) -> &mut Frame {
        match frame_type {
            FrameType::Image => &mut self.image_frame,
            FrameType::Grid => &mut self.calendar_grid_frame,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CoverTextPosition {
    Top,
    Bottom,
}

/// One page of a calendar, either the cover or a month (or month pair).
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthPage {
    pub month: MonthSlot,
    pub layout: PageLayout,
    #[serde(default)]
    pub assigned_image_id: Option<AssetId>,
    #[serde(default)]
    pub image_transform: ImageTransform,
    #[serde(default = "default_show_grid")]
    pub show_grid: bool,
    #[serde(default)]
    pub grid_style: GridStyle,

    /// Only meaningful on the cover page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_text_top: Option<String>,
    /// Only meaningful on the cover page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_text_bottom: Option<String>,

    /// `None` means the project default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<PageMargins>,
}

fn default_show_grid() -> bool {
    true
}

impl MonthPage {
    pub fn is_cover(&self) -> bool {
        self.month.is_cover()
    }

    pub fn cover_text(&self, position: CoverTextPosition) -> Option<&str> {
        match position {
            CoverTextPosition::Top => self.cover_text_top.as_deref(),
            CoverTextPosition::Bottom => self.cover_text_bottom.as_deref(),
        }
    }

    pub fn cover_text_mut(&mut self, position: CoverTextPosition) -> &mut Option<String> {
        match position {
            CoverTextPosition::Top => &mut self.cover_text_top,
            CoverTextPosition::Bottom => &mut self.cover_text_bottom,
        }
    }

    pub fn margins_or(&self, default: PageMargins) -> PageMargins {
        self.margins.unwrap_or(default)
    }

    pub fn margins_or_default(&self) -> PageMargins {
        self.margins_or(DEFAULT_MARGINS)
    }
}
