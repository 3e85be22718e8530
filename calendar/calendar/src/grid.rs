//! Calendar grid data for a page, the days of each month arranged in weeks.

use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::page::{GridStyle, MonthSlot, WeekdayStart};
use crate::project::MonthsPerPage;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GridWeek {
    /// ISO week number, only present when week numbers are shown.
    pub week_number: Option<u32>,
    /// Day of the month for each column, `None` for cells outside the month.
    pub days: [Option<u32>; 7],
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u8,
    pub weekdays: [Weekday; 7],
    pub weeks: Vec<GridWeek>,
}

/// The column order of the weekdays.
pub fn weekday_order(start: WeekdayStart) -> [Weekday; 7] {
    let mut day = start.weekday();
    std::array::from_fn(|_| {
        let current = day;
        day = day.succ();
        current
    })
}

/// Build the grid for a month, `None` if the year/month is out of range.
pub fn month_grid(year: i32, month: u8, style: &GridStyle) -> Option<MonthGrid> {
    let first = NaiveDate::from_ymd_opt(year, month as u32, 1)?;
    let last = first
        .checked_add_months(Months::new(1))?
        .pred_opt()?;

    let offset = match style.weekday_start {
        WeekdayStart::Sunday => first.weekday().num_days_from_sunday(),
        WeekdayStart::Monday => first.weekday().num_days_from_monday(),
    } as usize;

    let cells = (0..offset)
        .map(|_| None)
        .chain((1..=last.day()).map(Some))
        .collect::<Vec<_>>();

    let weeks = cells
        .chunks(7)
        .map(|chunk| {
            let mut days = [None; 7];
            days[..chunk.len()].copy_from_slice(chunk);

            // with a sunday start, the last day of the row is in the same ISO week as most of the row.
            let week_number = match style.show_week_numbers {
                true => days
                    .iter()
                    .rev()
                    .flatten()
                    .next()
                    .and_then(|day| NaiveDate::from_ymd_opt(year, month as u32, *day))
                    .map(|date| date.iso_week().week()),
                false => None,
            };

            GridWeek {
                week_number,
                days,
            }
        })
        .collect();

    Some(MonthGrid {
        year,
        month,
        weekdays: weekday_order(style.weekday_start),
        weeks,
    })
}

/// The months shown on a page, the cover shows the whole year.
pub fn covered_months(slot: MonthSlot, months_per_page: MonthsPerPage) -> Vec<u8> {
    match slot {
        MonthSlot::Cover => (1..=12).collect(),
        MonthSlot::Month(first) => (first..first.saturating_add(months_per_page.months()))
            .filter(|month| *month <= 12)
            .collect(),
    }
}
