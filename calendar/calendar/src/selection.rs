use indexmap::IndexSet;

use crate::ids::AssetId;

/// The selected assets, in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: IndexSet<AssetId>,
}

impl Selection {
    /// Without `multi` the selection is replaced, with `multi` the membership of the asset is toggled.
    pub fn select(&mut self, id: AssetId, multi: bool) {
        if !multi {
            self.ids.clear();
            self.ids.insert(id);
            return;
        }

        if !self.ids.shift_remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Add the inclusive range between `start` and `end` of `ordering` to the selection.
    ///
    /// `start` may come after `end`.  Returns `false`, leaving the selection unchanged, when either id is not
    /// in the ordering.
    pub fn select_range(&mut self, start: &AssetId, end: &AssetId, ordering: &[AssetId]) -> bool {
        let (Some(start), Some(end)) = (
            ordering
                .iter()
                .position(|id| id == start),
            ordering
                .iter()
                .position(|id| id == end),
        ) else {
            return false;
        };

        let (low, high) = (start.min(end), start.max(end));
        self.ids
            .extend(ordering[low..=high].iter().cloned());
        true
    }

    pub fn replace(&mut self, ids: impl IntoIterator<Item = AssetId>) {
        self.ids.clear();
        self.ids.extend(ids);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn remove(&mut self, id: &AssetId) -> bool {
        self.ids.shift_remove(id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<AssetId> {
        values
            .iter()
            .map(|value| AssetId::from(*value))
            .collect()
    }

    fn selected(selection: &Selection) -> Vec<&str> {
        selection
            .iter()
            .map(AssetId::as_str)
            .collect()
    }

    #[test]
    fn single_select_replaces() {
        let mut selection = Selection::default();
        selection.select("a".into(), false);
        selection.select("b".into(), false);

        assert_eq!(selected(&selection), vec!["b"]);
    }

    #[test]
    fn multi_select_toggles() {
        let mut selection = Selection::default();
        selection.select("a".into(), true);
        selection.select("b".into(), true);
        selection.select("a".into(), true);

        assert_eq!(selected(&selection), vec!["b"]);
    }

    #[test]
    fn reversed_range_from_empty_selection() {
        // given
        let mut selection = Selection::default();
        let ordering = ids(&["id1", "id2", "id3", "id4"]);

        // when
        let applied = selection.select_range(&"id3".into(), &"id1".into(), &ordering);

        // then
        assert!(applied);
        let mut result = selected(&selection);
        result.sort();
        assert_eq!(result, vec!["id1", "id2", "id3"]);
    }

    #[test]
    fn range_is_unioned_with_existing_selection() {
        // given
        let mut selection = Selection::default();
        selection.select("id4".into(), false);
        let ordering = ids(&["id1", "id2", "id3", "id4"]);

        // when
        selection.select_range(&"id1".into(), &"id2".into(), &ordering);

        // then
        assert_eq!(selection.len(), 3);
        assert!(selection.contains(&"id4".into()));
    }

    #[test]
    fn range_with_unknown_id_is_ignored() {
        // given
        let mut selection = Selection::default();
        let ordering = ids(&["id1", "id2"]);

        // when
        let applied = selection.select_range(&"id1".into(), &"other".into(), &ordering);

        // then
        assert!(!applied);
        assert!(selection.is_empty());
    }
}
