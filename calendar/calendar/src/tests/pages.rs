use rstest::rstest;

use crate::geometry::{CropRect, Frame, FrameType, ImageTransform, PageMargins, DEFAULT_IMAGE_TRANSFORM, DEFAULT_MARGINS};
use crate::ids::AssetId;
use crate::page::CoverTextPosition;
use crate::store::{CalendarStore, StoreError};
use crate::tests::support::{project, store_with_project};

#[test]
fn frames_are_clamped_on_commit() {
    // given
    let (mut store, project_id) = store_with_project(&[]);

    // when
    store
        .update_page_layout(1, FrameType::Image, Frame::new(-0.2, 0.9, 0.5, 0.4))
        .unwrap();

    // then
    let frame = project(&store, &project_id).months[1]
        .layout
        .image_frame;
    assert_eq!(frame, Frame::new(0.0, 0.6, 0.5, 0.4));
    assert_eq!(store.history().len(), 1);
}

#[test]
fn transforms_are_normalized_on_commit() {
    // given
    let (mut store, project_id) = store_with_project(&[]);

    // when
    store
        .update_image_transform(2, ImageTransform {
            x: 0.1,
            y: -0.1,
            scale: 0.2,
            rotation: 270.0,
            crop: CropRect::FULL,
        })
        .unwrap();

    // then
    let transform = project(&store, &project_id).months[2].image_transform;
    assert_eq!(transform.scale, 0.5);
    assert_eq!(transform.rotation, -90.0);
}

#[rstest]
#[case::new_image(Some("a2"))]
#[case::cleared(None)]
fn assign_resets_the_transform(#[case] image: Option<&str>) {
    // given
    let (mut store, project_id) = store_with_project(&["a1", "a2"]);
    store.assign_image_to_page(1, Some("a1".into())).unwrap();
    store
        .update_image_transform(1, ImageTransform {
            scale: 2.0,
            rotation: 15.0,
            ..DEFAULT_IMAGE_TRANSFORM
        })
        .unwrap();

    // when
    store
        .assign_image_to_page(1, image.map(AssetId::from))
        .unwrap();

    // then
    let page = &project(&store, &project_id).months[1];
    assert_eq!(page.image_transform, DEFAULT_IMAGE_TRANSFORM);
    assert_eq!(page.assigned_image_id, image.map(AssetId::from));
}

#[test]
fn assigning_an_unknown_asset_is_reported() {
    // given
    let (mut store, project_id) = store_with_project(&[]);

    // when
    let result = store.assign_image_to_page(1, Some("missing".into()));

    // then
    assert_eq!(result, Err(StoreError::AssetNotFound("missing".into())));
    assert_eq!(project(&store, &project_id).months[1].assigned_image_id, None);
    assert!(store.history().is_empty());
}

#[test]
fn cover_text_on_a_month_page_leaves_it_unchanged() {
    // given
    let (mut store, project_id) = store_with_project(&[]);
    let before = project(&store, &project_id).months[1].clone();

    // when
    let result = store.update_cover_text(1, CoverTextPosition::Top, Some("x".to_string()));

    // then
    assert_eq!(result, Err(StoreError::NotACoverPage(1)));
    assert_eq!(project(&store, &project_id).months[1], before);
}

#[test]
fn cover_text_is_set_and_cleared() {
    // given
    let (mut store, project_id) = store_with_project(&[]);

    // when
    store
        .update_cover_text(0, CoverTextPosition::Bottom, Some("2025".to_string()))
        .unwrap();

    // then
    assert_eq!(
        project(&store, &project_id).months[0].cover_text(CoverTextPosition::Bottom),
        Some("2025")
    );

    // when
    store
        .update_cover_text(0, CoverTextPosition::Bottom, Some(String::new()))
        .unwrap();

    // then
    assert_eq!(project(&store, &project_id).months[0].cover_text_bottom, None);
}

#[test]
fn toggle_grid_flips_without_history() {
    // given
    let (mut store, project_id) = store_with_project(&[]);

    // expect
    assert_eq!(store.toggle_grid(3), Ok(false));
    assert!(!project(&store, &project_id).months[3].show_grid);
    assert_eq!(store.toggle_grid(3), Ok(true));
    assert!(store.history().is_empty());
}

#[test]
fn margins_for_all_months_skip_the_cover() {
    // given
    let (mut store, project_id) = store_with_project(&[]);
    let margins = PageMargins::uniform(4.0);

    // when
    store
        .update_page_margins(2, margins, true)
        .unwrap();

    // then
    let project = project(&store, &project_id);
    assert_eq!(project.months[0].margins, Some(DEFAULT_MARGINS));
    assert!(project
        .months
        .iter()
        .skip(1)
        .all(|page| page.margins == Some(margins)));
}

#[test]
fn margins_for_all_months_from_the_cover_only_change_the_cover() {
    // given
    let (mut store, project_id) = store_with_project(&[]);
    let margins = PageMargins::uniform(0.0);

    // when
    store
        .update_page_margins(0, margins, true)
        .unwrap();

    // then
    let project = project(&store, &project_id);
    assert_eq!(project.months[0].margins, Some(margins));
    assert_eq!(project.months[1].margins, Some(DEFAULT_MARGINS));
}

#[test]
fn page_operations_need_an_existing_page_and_project() {
    // given
    let mut store = CalendarStore::new();

    // expect
    assert_eq!(store.toggle_grid(0), Err(StoreError::NoActiveProject));

    // given
    let (mut store, project_id) = store_with_project(&[]);

    // expect
    assert_eq!(store.toggle_grid(7), Err(StoreError::PageNotFound {
        project: project_id,
        index: 7
    }));
}

#[test]
fn readers_keep_their_view_while_the_store_changes() {
    // given
    let (mut store, _project_id) = store_with_project(&[]);
    let view = store.shared_projects();

    // when
    store.toggle_grid(1).unwrap();

    // then
    assert!(view[0].months[1].show_grid);
    assert!(!store.projects()[0].months[1].show_grid);
}
