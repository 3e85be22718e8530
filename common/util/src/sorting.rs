use std::cmp::Ordering;
use std::fmt::Display;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Apply the sort order to an ordering that was computed in ascending order.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Sort the items by the key, in this order.
    ///
    /// The sort is stable, items with equal keys keep their relative order.
    pub fn sort_by_key<T, K: Ord>(&self, items: &mut [T], mut key: impl FnMut(&T) -> K) {
        items.sort_by(|a, b| self.apply(key(a).cmp(&key(b))));
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(SortOrder::Asc, vec![1, 2, 3])]
    #[case(SortOrder::Desc, vec![3, 2, 1])]
    fn sort_by_key(#[case] order: SortOrder, #[case] expected: Vec<u32>) {
        // given
        let mut items = vec![2, 3, 1];

        // when
        order.sort_by_key(&mut items, |item| *item);

        // then
        assert_eq!(items, expected);
    }

    #[test]
    fn desc_is_stable_for_equal_keys() {
        // given
        let mut items = vec![(1, "a"), (2, "b"), (1, "c")];

        // when
        SortOrder::Desc.sort_by_key(&mut items, |(key, _)| *key);

        // then
        assert_eq!(items, vec![(2, "b"), (1, "a"), (1, "c")]);
    }
}
