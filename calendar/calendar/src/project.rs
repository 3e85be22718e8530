use std::fmt::Display;

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;

use crate::ids::{GroupId, ProjectId};
use crate::page::MonthPage;

/// Millimeters per CSS pixel, used when a format is specified in pixels.
pub const MM_PER_PX: f64 = 0.264583;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CalendarType {
    Wall,
    Desk,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Mm,
    Px,
}

impl LengthUnit {
    pub fn to_mm(&self, value: f64) -> f64 {
        match self {
            LengthUnit::Mm => value,
            LengthUnit::Px => value * MM_PER_PX,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq)]
pub struct Format {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: LengthUnit,
}

impl Format {
    pub const A4: Format = Format {
        width: 210.0,
        height: 297.0,
        unit: LengthUnit::Mm,
    };

    pub const A5: Format = Format {
        width: 148.0,
        height: 210.0,
        unit: LengthUnit::Mm,
    };

    /// Width and height, in millimeters.
    pub fn size_mm(&self) -> (f64, f64) {
        (self.unit.to_mm(self.width), self.unit.to_mm(self.height))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid months per page, expected 1 or 2. value: {0}")]
pub struct InvalidMonthsPerPage(pub u8);

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum MonthsPerPage {
    One,
    #[default]
    Two,
}

impl MonthsPerPage {
    pub fn months(&self) -> u8 {
        match self {
            MonthsPerPage::One => 1,
            MonthsPerPage::Two => 2,
        }
    }

    /// The cover plus one page per month, or per month pair.
    pub fn expected_page_count(&self) -> usize {
        match self {
            MonthsPerPage::One => 13,
            MonthsPerPage::Two => 7,
        }
    }
}

impl TryFrom<u8> for MonthsPerPage {
    type Error = InvalidMonthsPerPage;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MonthsPerPage::One),
            2 => Ok(MonthsPerPage::Two),
            _ => Err(InvalidMonthsPerPage(value)),
        }
    }
}

impl From<MonthsPerPage> for u8 {
    fn from(value: MonthsPerPage) -> Self {
        value.months()
    }
}

impl Display for MonthsPerPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.months())
    }
}

/// How an image fills its frame.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    Cover,
    Contain,
}

/// One calendar document.
///
/// Invariant: `months.len() == months_per_page.expected_page_count()` with exactly one cover page, restored by
/// the store after every update, see [`crate::reconcile`].
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarProject {
    pub id: ProjectId,
    pub title: String,
    pub calendar_type: CalendarType,
    pub format: Format,
    pub orientation: Orientation,
    /// Millimeters, added outside the trim size on every side.
    #[serde(default)]
    pub bleed: f64,
    /// Millimeters, used for pages without their own margins.
    #[serde(default)]
    pub margin: f64,
    #[serde(default = "current_year")]
    pub year: i32,
    pub months: Vec<MonthPage>,
    #[serde(default)]
    pub months_per_page: MonthsPerPage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_fit: Option<ImageFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months_image_fit: Option<ImageFit>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

impl CalendarProject {
    pub fn page(&self, index: usize) -> Option<&MonthPage> {
        self.months.get(index)
    }

    pub fn cover_page(&self) -> Option<&MonthPage> {
        self.months
            .iter()
            .find(|page| page.is_cover())
    }

    /// Merge the fields present in the update.
    ///
    /// Does not reconcile the pages or touch `updated_at`, the store does both.
    pub fn merge(&mut self, update: ProjectUpdate) {
        let ProjectUpdate {
            title,
            calendar_type,
            format,
            orientation,
            bleed,
            margin,
            year,
            months,
            months_per_page,
            selected_group_id,
            font_family,
            cover_image_fit,
            months_image_fit,
        } = update;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(calendar_type) = calendar_type {
            self.calendar_type = calendar_type;
        }
        if let Some(format) = format {
            self.format = format;
        }
        if let Some(orientation) = orientation {
            self.orientation = orientation;
        }
        if let Some(bleed) = bleed {
            self.bleed = bleed;
        }
        if let Some(margin) = margin {
            self.margin = margin;
        }
        if let Some(year) = year {
            self.year = year;
        }
        if let Some(months) = months {
            self.months = months;
        }
        if let Some(months_per_page) = months_per_page {
            self.months_per_page = months_per_page;
        }
        if let Some(selected_group_id) = selected_group_id {
            self.selected_group_id = selected_group_id;
        }
        if let Some(font_family) = font_family {
            self.font_family = font_family;
        }
        if let Some(cover_image_fit) = cover_image_fit {
            self.cover_image_fit = cover_image_fit;
        }
        if let Some(months_image_fit) = months_image_fit {
            self.months_image_fit = months_image_fit;
        }
    }
}

/// A partial update of a project, `None` fields are left unchanged.
///
/// Optional project fields use `Option<Option<_>>`, `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub calendar_type: Option<CalendarType>,
    pub format: Option<Format>,
    pub orientation: Option<Orientation>,
    pub bleed: Option<f64>,
    pub margin: Option<f64>,
    pub year: Option<i32>,
    pub months: Option<Vec<MonthPage>>,
    pub months_per_page: Option<MonthsPerPage>,
    pub selected_group_id: Option<Option<GroupId>>,
    pub font_family: Option<Option<String>>,
    pub cover_image_fit: Option<Option<ImageFit>>,
    pub months_image_fit: Option<Option<ImageFit>>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProjectUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_formats_convert_to_mm() {
        let format = Format {
            width: 1000.0,
            height: 500.0,
            unit: LengthUnit::Px,
        };

        let (width, height) = format.size_mm();

        assert!((width - 264.583).abs() < 1e-9);
        assert!((height - 132.2915).abs() < 1e-9);
    }

    #[test]
    fn months_per_page_is_a_number() {
        assert_eq!(serde_json::to_string(&MonthsPerPage::One).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<MonthsPerPage>("2").unwrap(),
            MonthsPerPage::Two
        );
        assert!(serde_json::from_str::<MonthsPerPage>("3").is_err());
    }

    #[test]
    fn expected_page_counts() {
        assert_eq!(MonthsPerPage::One.expected_page_count(), 13);
        assert_eq!(MonthsPerPage::Two.expected_page_count(), 7);
    }
}
