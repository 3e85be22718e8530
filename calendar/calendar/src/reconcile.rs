//! Page list reconciliation.
//!
//! When the months-per-page setting changes (or the page list no longer matches it) the page list is regenerated.
//! Pages of the previous list are carried over when their month still starts a page in the new list, so image
//! assignments, transforms and margins survive a round trip through a compatible pairing.  Months that stop
//! starting a page (e.g. February when switching to pairs) lose their page.

use tracing::debug;

use crate::generator::{default_cover_page, first_months, generate_pages};
use crate::page::{MonthPage, MonthSlot};
use crate::project::MonthsPerPage;

/// `true` when the pages already have the exact structure `generate_pages(target)` would produce: the cover first,
/// followed by the expected months in order.
pub fn matches_layout(pages: &[MonthPage], target: MonthsPerPage) -> bool {
    if pages.len() != target.expected_page_count() {
        return false;
    }

    let slots = pages.iter().map(|page| page.month);
    let expected = std::iter::once(MonthSlot::Cover).chain(first_months(target).map(MonthSlot::Month));

    slots.eq(expected)
}

pub fn needs_reconciliation(pages: &[MonthPage], target: MonthsPerPage, explicit_change: bool) -> bool {
    explicit_change || !matches_layout(pages, target)
}

/// Build the page list for `target`, keeping the existing cover and every existing page whose month matches a
/// generated page.
pub fn reconcile_pages(existing: &[MonthPage], target: MonthsPerPage) -> Vec<MonthPage> {
    let cover = existing
        .iter()
        .find(|page| page.is_cover())
        .cloned()
        .unwrap_or_else(default_cover_page);

    let mut kept = 0;
    let pages = std::iter::once(cover)
        .chain(
            generate_pages(target)
                .into_iter()
                .filter(|page| !page.is_cover())
                .map(|generated| {
                    match existing
                        .iter()
                        .find(|page| page.month == generated.month)
                    {
                        Some(page) => {
                            kept += 1;
                            page.clone()
                        }
                        None => generated,
                    }
                }),
        )
        .collect::<Vec<_>>();

    debug!(
        "Reconciled pages. months_per_page: {}, pages: {}, kept: {}",
        target,
        pages.len(),
        kept
    );

    pages
}

/// Clamp a page index to a page list of the given length.
pub fn clamp_page_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
