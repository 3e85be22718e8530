use rstest::rstest;

use crate::generator::generate_pages;
use crate::ids::{AssetId, ProjectId};
use crate::page::{CoverTextPosition, MonthSlot};
use crate::project::{MonthsPerPage, ProjectUpdate};
use crate::snapshot::AppStateSnapshot;
use crate::store::{CalendarStore, StoreError};
use crate::tests::support::{assert_page_invariants, project, store_with_project};

#[test]
fn create_project_generates_pages_and_activates_it() {
    // when
    let (store, project_id) = store_with_project(&[]);

    // then
    let project = project(&store, &project_id);
    assert_eq!(project.months_per_page, MonthsPerPage::Two);
    assert_eq!(project.months.len(), 7);
    assert_eq!(store.active_project_id(), Some(&project_id));
    assert_eq!(store.active_page_index(), 0);
    assert!(store.current_page().unwrap().is_cover());
}

#[test]
fn switching_to_one_month_per_page_keeps_the_cover() {
    // given
    let (mut store, project_id) = store_with_project(&["a1"]);
    store.assign_image_to_page(0, Some("a1".into())).unwrap();
    store
        .update_cover_text(0, CoverTextPosition::Top, Some("Our year".to_string()))
        .unwrap();
    let cover_before = project(&store, &project_id).months[0].clone();

    // when
    store
        .update_project(&project_id, ProjectUpdate {
            months_per_page: Some(MonthsPerPage::One),
            ..ProjectUpdate::default()
        })
        .unwrap();

    // then
    let project = project(&store, &project_id);
    assert_eq!(project.months.len(), 13);
    assert_eq!(project.months[0], cover_before);
}

#[test]
fn assignments_survive_a_round_trip_through_month_pairs() {
    // given
    let (mut store, project_id) = store_with_project(&["x"]);
    store
        .update_project(&project_id, ProjectUpdate {
            months_per_page: Some(MonthsPerPage::One),
            ..ProjectUpdate::default()
        })
        .unwrap();
    // month 5 is at index 5 with one month per page
    store.assign_image_to_page(5, Some("x".into())).unwrap();

    // when
    for months_per_page in [MonthsPerPage::Two, MonthsPerPage::One] {
        store
            .update_project(&project_id, ProjectUpdate {
                months_per_page: Some(months_per_page),
                ..ProjectUpdate::default()
            })
            .unwrap();
    }

    // then
    let project = project(&store, &project_id);
    assert_eq!(project.months[5].month, MonthSlot::Month(5));
    assert_eq!(project.months[5].assigned_image_id, Some(AssetId::from("x")));
}

#[rstest]
#[case::pairs_to_singles(vec![MonthsPerPage::One])]
#[case::singles_and_back(vec![MonthsPerPage::One, MonthsPerPage::Two])]
#[case::unchanged(vec![MonthsPerPage::Two, MonthsPerPage::Two])]
#[case::many(vec![MonthsPerPage::One, MonthsPerPage::One, MonthsPerPage::Two, MonthsPerPage::One])]
fn page_count_invariant_holds_after_updates(#[case] sequence: Vec<MonthsPerPage>) {
    // given
    let (mut store, project_id) = store_with_project(&[]);

    for months_per_page in sequence {
        // when
        store
            .update_project(&project_id, ProjectUpdate {
                months_per_page: Some(months_per_page),
                title: Some(format!("Calendar {}", months_per_page)),
                ..ProjectUpdate::default()
            })
            .unwrap();

        // then
        assert_page_invariants(project(&store, &project_id));
    }
}

#[test]
fn explicit_page_list_with_wrong_count_is_reconciled() {
    // given
    let (mut store, project_id) = store_with_project(&[]);
    let mut months = generate_pages(MonthsPerPage::One);
    months.truncate(4);

    // when
    store
        .update_project(&project_id, ProjectUpdate {
            months: Some(months),
            ..ProjectUpdate::default()
        })
        .unwrap();

    // then
    let project = project(&store, &project_id);
    assert_page_invariants(project);
    assert_eq!(project.months_per_page, MonthsPerPage::Two);
}

#[test]
fn active_page_is_clamped_when_pages_are_removed() {
    // given
    let (mut store, project_id) = store_with_project(&[]);
    store
        .update_project(&project_id, ProjectUpdate {
            months_per_page: Some(MonthsPerPage::One),
            ..ProjectUpdate::default()
        })
        .unwrap();
    store.set_active_page(12);

    // when
    store
        .update_project(&project_id, ProjectUpdate {
            months_per_page: Some(MonthsPerPage::Two),
            ..ProjectUpdate::default()
        })
        .unwrap();

    // then
    assert_eq!(store.active_page_index(), 6);
}

#[test]
fn update_of_unknown_project_is_reported() {
    // given
    let (mut store, _project_id) = store_with_project(&[]);
    let revision = store.revision();

    // when
    let result = store.update_project(&ProjectId::from("missing"), ProjectUpdate::default());

    // then
    let error = result.unwrap_err();
    assert_eq!(error, StoreError::ProjectNotFound("missing".into()));
    assert!(error.is_not_found());
    assert_eq!(store.revision(), revision);
}

#[test]
fn deleting_the_active_project_clears_it_but_keeps_assets() {
    // given
    let (mut store, project_id) = store_with_project(&["a1"]);

    // when
    store.delete_project(&project_id).unwrap();

    // then
    assert!(store.projects().is_empty());
    assert_eq!(store.active_project_id(), None);
    assert_eq!(store.assets().len(), 1);
}

#[test]
fn unknown_active_project_means_no_current_page() {
    // given
    let (mut store, _project_id) = store_with_project(&[]);

    // when
    store.set_active_project(Some("missing".into()));

    // then
    assert!(store.active_project().is_none());
    assert!(store.current_page().is_none());
}

#[test]
fn out_of_range_active_page_means_no_current_page() {
    let (mut store, _project_id) = store_with_project(&[]);

    store.set_active_page(42);

    assert!(store.current_page().is_none());
}

#[test]
fn loading_a_snapshot_restores_invariants() {
    // given
    let (store, project_id) = store_with_project(&[]);
    let mut snapshot = store.snapshot();
    snapshot.projects[0].months.remove(3);
    let cover = snapshot.projects[0].months[0].clone();
    snapshot.projects[0].months.push(cover);
    snapshot.active_page_index = 99;

    // when
    let loaded = CalendarStore::from_snapshot(snapshot);

    // then
    assert_page_invariants(project(&loaded, &project_id));
    assert_eq!(loaded.active_project_id(), Some(&project_id));
    assert_eq!(loaded.active_page_index(), 6);
}

#[test]
fn snapshot_of_loaded_store_is_unchanged() {
    // given
    let (mut store, _project_id) = store_with_project(&["a1", "a2"]);
    let group_id = store.create_group("Nature".to_string(), Some("#00ff00".to_string()));
    store
        .add_images_to_group(&group_id, &["a1".into()])
        .unwrap();
    let snapshot = store.snapshot();

    // when
    let reloaded = CalendarStore::from_snapshot(snapshot.clone()).snapshot();

    // then
    assert_eq!(AppStateSnapshot {
        last_updated: snapshot.last_updated,
        ..reloaded
    }, snapshot);
}
