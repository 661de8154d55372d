use expr_subst::{BinaryOp, DataType, Expr, SlotId, SmapOptions, SubstitutionMap};
use proptest::prelude::*;

fn arb_leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (0u32..16).prop_map(|id| Expr::slot_ref(SlotId(id), "t", format!("c{id}"), DataType::Int)),
        (-100i64..100).prop_map(Expr::literal),
    ]
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    arb_leaf().prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            inner
                .clone()
                .prop_map(|arg| Expr::function("abs", vec![arg]).mark_analyzed(DataType::Int)),
            (inner.clone(), inner).prop_map(|(l, r)| {
                Expr::binary(BinaryOp::Add, l, r).mark_analyzed(DataType::Int)
            }),
        ]
    })
}

// Unresolved children under a root the caller marked analyzed.
fn arb_root_marked_expr() -> impl Strategy<Value = Expr> {
    prop::collection::vec("[a-z]{1,4}", 1..4).prop_map(|columns| {
        let args = columns
            .into_iter()
            .map(|column| Expr::qualified("t", column))
            .collect();
        Expr::function("coalesce", args).mark_analyzed(DataType::Varchar)
    })
}

fn arb_smap() -> impl Strategy<Value = SubstitutionMap> {
    prop::collection::vec((arb_expr(), arb_expr()), 0..8).prop_map(|pairs| {
        let mut map = SubstitutionMap::new();
        for (lhs, rhs) in pairs {
            map.put(lhs, rhs).unwrap();
        }
        map
    })
}

proptest! {
    #[test]
    fn prop_compose_with_empty_is_identity(f in arb_smap()) {
        let empty = SubstitutionMap::new();
        let right = SubstitutionMap::compose(Some(&f), Some(&empty)).unwrap();
        prop_assert_eq!(right.entries(), f.entries());
        // g's pairs are appended only for keys f lacks, so duplicate keys in
        // f collapse when f is on the right.
        let left = SubstitutionMap::compose(Some(&empty), Some(&f)).unwrap();
        let distinct = f
            .lhs()
            .enumerate()
            .filter(|(i, key)| !f.lhs().take(*i).any(|prev| prev == *key))
            .count();
        prop_assert_eq!(left.len(), distinct);
    }

    #[test]
    fn prop_verifying_compose_with_empty_keeps_root_marked_values(
        pairs in prop::collection::vec((arb_leaf(), arb_root_marked_expr()), 0..6)
    ) {
        let mut f = SubstitutionMap::with_options(SmapOptions::default().verify(true));
        for (lhs, rhs) in pairs {
            f.put(lhs, rhs).unwrap();
        }
        let empty = SubstitutionMap::new();
        let composed = SubstitutionMap::compose(Some(&f), Some(&empty)).unwrap();
        prop_assert_eq!(composed.entries(), f.entries());
        prop_assert!(composed.rhs().all(Expr::is_analyzed));
    }

    #[test]
    fn prop_combine_size_is_additive(f in arb_smap(), g in arb_smap()) {
        let combined = SubstitutionMap::combine(Some(&f), Some(&g)).unwrap();
        prop_assert_eq!(combined.len(), f.len() + g.len());
        let lhs: Vec<&Expr> = f.lhs().chain(g.lhs()).collect();
        prop_assert!(combined.lhs().eq(lhs.into_iter()));
    }

    #[test]
    fn prop_clone_mutation_leaves_original(f in arb_smap()) {
        let before = f.debug_string();
        let mut copy = f.clone();
        copy.clear();
        prop_assert!(copy.is_empty());
        prop_assert_eq!(f.debug_string(), before);
    }

    #[test]
    fn prop_get_after_put_returns_first_value(f in arb_smap(), lhs in arb_expr(), rhs in arb_expr()) {
        let mut map = f.clone();
        let existing = f.get(&lhs).cloned();
        map.put(lhs.clone(), rhs.clone()).unwrap();
        let expected = existing.unwrap_or(rhs);
        prop_assert_eq!(map.get(&lhs), Some(&expected));
    }

    #[test]
    fn prop_substitute_with_empty_map_is_noop(e in arb_expr()) {
        let empty = SubstitutionMap::new();
        prop_assert_eq!(e.substitute(&empty), e);
    }
}
