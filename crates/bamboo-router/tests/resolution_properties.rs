//! Property tests for route resolution.

use bamboo_router::{split_path, RouteTable};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,8}"
}

proptest! {
    #[test]
    fn resolve_is_idempotent(segs in prop::collection::vec(segment(), 1..5), probe in prop::collection::vec(segment(), 1..5)) {
        let mut table = RouteTable::new();
        let literal = format!("/{}", segs.join("/"));
        table.register(&literal, "literal").unwrap();
        table.register("/{a}", "one").unwrap();
        table.register("/{a}/{rest:path}", "rest").unwrap();

        let path = format!("/{}", probe.join("/"));
        let first = table.resolve(&path).map(|m| (*m.value, m.bindings.clone()));
        let second = table.resolve(&path).map(|m| (*m.value, m.bindings.clone()));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn literal_wins_over_any_param(segs in prop::collection::vec(segment(), 1..5)) {
        let mut table = RouteTable::new();
        let params: Vec<String> = (0..segs.len()).map(|i| format!("{{p{i}}}")).collect();
        table.register(&format!("/{}", params.join("/")), "params").unwrap();
        table.register("/{rest:path}", "rest").unwrap();
        table.register(&format!("/{}", segs.join("/")), "literal").unwrap();

        let m = table.resolve(&format!("/{}/", segs.join("/"))).unwrap();
        prop_assert_eq!(*m.value, "literal");
    }

    #[test]
    fn int_param_rejects_non_integers(text in "[a-zA-Z][a-zA-Z0-9]{0,6}") {
        let mut table = RouteTable::new();
        table.register("/n/{v:int}", ()).unwrap();
        let path = format!("/n/{text}");
        prop_assert!(table.resolve(&path).is_none());
    }

    #[test]
    fn int_param_binds_any_i64(v in any::<i64>()) {
        let mut table = RouteTable::new();
        table.register("/n/{v:int}", ()).unwrap();
        let m = table.resolve(&format!("/n/{v}")).unwrap();
        prop_assert_eq!(m.bindings.get_int("v"), Some(v));
    }

    #[test]
    fn remainder_rejoins_segments(segs in prop::collection::vec(segment(), 1..6)) {
        let mut table = RouteTable::new();
        table.register("/static/{rest:path}", ()).unwrap();
        let joined = segs.join("/");
        let m = table.resolve(&format!("/static/{joined}")).unwrap();
        prop_assert_eq!(m.bindings.get_str("rest"), Some(joined.as_str()));
    }

    #[test]
    fn split_ignores_trailing_separators(segs in prop::collection::vec(segment(), 1..5), trailing in 0usize..3) {
        let base = format!("/{}", segs.join("/"));
        let padded = format!("{base}{}", "/".repeat(trailing));
        prop_assert_eq!(split_path(&base), split_path(&padded));
    }
}

#[test]
fn registration_order_breaks_ties() {
    let mut table = RouteTable::new();
    table.register("/{a}/x", "first").unwrap();
    table.register("/{b:int}/x", "second").unwrap();

    assert_eq!(*table.resolve("/7/x").unwrap().value, "first");
}

#[test]
fn float_param_accepts_integers_and_decimals() {
    let mut table = RouteTable::new();
    table.register("/scale/{f:float}", ()).unwrap();

    assert_eq!(
        table.resolve("/scale/2").unwrap().bindings.get_float("f"),
        Some(2.0)
    );
    assert_eq!(
        table.resolve("/scale/-0.5").unwrap().bindings.get_float("f"),
        Some(-0.5)
    );
    assert!(table.resolve("/scale/two").is_none());
}
