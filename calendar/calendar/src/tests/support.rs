use crate::asset::{NewAsset, SourceType};
use crate::ids::{AssetId, ProjectId};
use crate::page::MonthSlot;
use crate::project::{CalendarProject, CalendarType, Format, Orientation};
use crate::store::CalendarStore;

pub fn new_asset(name: &str) -> NewAsset {
    NewAsset {
        name: name.to_string(),
        source_type: SourceType::Url,
        url: format!("https://example.com/{}.jpg", name),
        thumbnail_url: None,
        original_width: 1200,
        original_height: 800,
    }
}

/// A store with one active project and the given assets, added with their names as ids.
pub fn store_with_project(asset_names: &[&str]) -> (CalendarStore, ProjectId) {
    let mut store = CalendarStore::new();
    let project_id = store.create_project("Family".to_string(), CalendarType::Wall, Format::A4, Orientation::Portrait);

    for name in asset_names {
        store.add_asset(new_asset(name), Some(AssetId::from(*name)));
    }

    (store, project_id)
}

pub fn project<'a>(store: &'a CalendarStore, id: &ProjectId) -> &'a CalendarProject {
    store.get_project_by_id(id).unwrap()
}

pub fn assert_page_invariants(project: &CalendarProject) {
    assert_eq!(project.months.len(), project.months_per_page.expected_page_count());
    assert_eq!(
        project
            .months
            .iter()
            .filter(|page| page.month == MonthSlot::Cover)
            .count(),
        1
    );
}
