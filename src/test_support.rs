//! Shared helpers for tests.

pub mod prelude {
    pub(crate) use super::proptest as proptest_support;
    pub(crate) use proptest::prelude::*;
}

pub mod proptest {
    use proptest::prelude::*;
    use proptest::strategy::Strategy;

    use crate::directory::{IdPair, IdentifierMapping};
    use crate::engine;
    use crate::protected::DEFAULT_PROTECTED_PREFIX;

    #[derive(Debug, Clone)]
    pub enum Fragment {
        Filler(String),
        Bare(usize),
        Protected(usize),
    }

    // Old ids are `P` + four digits: none is a substring of another and none
    // can overlap itself. New ids start with `N`, so a replacement can never
    // form a new old id with its surroundings.
    pub fn old_id() -> impl Strategy<Value = String> {
        "P[0-9]{4}"
    }

    pub fn new_id() -> impl Strategy<Value = String> {
        "N[0-9]{1,6}"
    }

    pub fn filler() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => "[a-z <>=\"/.:-]{0,12}",
            1 => Just(" product-id=\"".to_string()),
            1 => Just(DEFAULT_PROTECTED_PREFIX.to_string()),
        ]
    }

    pub fn fragment(num_ids: usize) -> impl Strategy<Value = Fragment> {
        prop_oneof![
            2 => filler().prop_map(Fragment::Filler),
            2 => (0..num_ids).prop_map(Fragment::Bare),
            1 => (0..num_ids).prop_map(Fragment::Protected),
        ]
    }

    pub fn strategy() -> impl Strategy<Value = engine::Strategy> {
        proptest::sample::select(engine::Strategy::ALL.to_vec())
    }

    /// A mapping of distinct, non-nested old ids and a document built from
    /// filler text, bare occurrences and protected occurrences of those ids.
    pub fn mapping_and_document() -> impl Strategy<Value = (IdentifierMapping, String)> {
        proptest::collection::btree_set(old_id(), 1..16)
            .prop_flat_map(|old_ids| {
                let num_ids = old_ids.len();
                (
                    Just(old_ids.into_iter().collect::<Vec<_>>()),
                    proptest::collection::vec(new_id(), num_ids),
                    proptest::collection::vec(fragment(num_ids), 0..48),
                )
            })
            .prop_map(|(old_ids, new_ids, fragments)| {
                let mut document = String::new();
                for fragment in fragments {
                    match fragment {
                        Fragment::Filler(text) => document.push_str(&text),
                        Fragment::Bare(i) => document.push_str(&old_ids[i]),
                        Fragment::Protected(i) => {
                            document.push_str(DEFAULT_PROTECTED_PREFIX);
                            document.push_str(&old_ids[i]);
                        }
                    }
                }

                let mapping = old_ids
                    .into_iter()
                    .zip(new_ids)
                    .enumerate()
                    .map(|(i, (old_id, new_id))| IdPair::new(old_id, new_id, i as u64 + 2))
                    .collect();

                (mapping, document)
            })
    }
}
