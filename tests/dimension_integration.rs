//! Integration tests for the dimensional aggregation engine
//!
//! These tests validate the complete pipeline across component boundaries:
//! - Cross-dimension filter propagation via selection notifications
//! - Incremental reclassification vs full-replay equivalence
//! - Post-processing (sorting, snapshots, custom hooks)
//! - Snapshot serialization

use std::cell::RefCell;
use std::rc::Rc;

use crossdim::{Dimension, DimensionConfig, DimensionFilter, GroupKey};

// ============================================================================
// Helper Functions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Order {
    region: &'static str,
    product: &'static str,
    qty: i64,
    amount: f64,
}

fn orders() -> Vec<Order> {
    vec![
        Order { region: "east", product: "widget", qty: 2, amount: 20.0 },
        Order { region: "east", product: "gadget", qty: 1, amount: 15.0 },
        Order { region: "west", product: "widget", qty: 5, amount: 50.0 },
        Order { region: "west", product: "gizmo", qty: 3, amount: 9.0 },
        Order { region: "north", product: "widget", qty: 1, amount: 10.0 },
        Order { region: "east", product: "widget", qty: 4, amount: 40.0 },
    ]
}

/// Revenue per product, one data point per region.
fn product_dimension(id: &str) -> Dimension<Order, f64> {
    Dimension::new(
        DimensionConfig::new(id)
            .group_series(|o: &Order| GroupKey::from(o.product))
            .group_data(|o: &Order| GroupKey::from(o.region))
            .reduce_init(|_o: &Order| 0.0)
            .reduce_add(|sum, o| *sum += o.amount)
            .reduce_remove(|sum, o| *sum -= o.amount),
    )
    .expect("valid configuration")
}

/// Revenue per region, one data point per product.
fn region_dimension(id: &str) -> Dimension<Order, f64> {
    Dimension::new(
        DimensionConfig::new(id)
            .group_series(|o: &Order| GroupKey::from(o.region))
            .group_data(|o: &Order| GroupKey::from(o.product))
            .reduce_init(|_o: &Order| 0.0)
            .reduce_add(|sum, o| *sum += o.amount)
            .reduce_remove(|sum, o| *sum -= o.amount),
    )
    .expect("valid configuration")
}

fn series_sum(dim: &Dimension<Order, f64>, key: &str) -> f64 {
    dim.find_series(&GroupKey::from(key))
        .map(|s| s.data_points.iter().map(|p| p.value).sum())
        .unwrap_or(0.0)
}

// ============================================================================
// Cross-Dimension Propagation
// ============================================================================

#[test]
fn test_selection_propagates_to_sibling_dimension() {
    let regions = Rc::new(RefCell::new(region_dimension("regions")));
    let products = Rc::new(RefCell::new(product_dimension("products")));

    regions.borrow_mut().add_many(orders());
    products.borrow_mut().add_many(orders());

    // Wire the regions dimension's exported filter into the products
    // dimension, the way a coordinator would.
    {
        let target = Rc::clone(&products);
        regions.borrow_mut().on_selection(move |filter| {
            target.borrow_mut().replace_filter(filter.clone());
        });
    }

    // Selecting "east" narrows the products view to east orders only,
    // synchronously, before select() returns.
    regions.borrow_mut().select(["east"]);
    assert_eq!(series_sum(&products.borrow(), "widget"), 60.0);
    assert_eq!(series_sum(&products.borrow(), "gadget"), 15.0);
    assert_eq!(series_sum(&products.borrow(), "gizmo"), 0.0);

    // The selecting dimension never filters itself.
    assert_eq!(series_sum(&regions.borrow(), "west"), 59.0);

    // Widening the selection reclassifies incrementally.
    regions.borrow_mut().select(["east", "west"]);
    assert_eq!(series_sum(&products.borrow(), "widget"), 110.0);
    assert_eq!(series_sum(&products.borrow(), "gizmo"), 9.0);

    // Clearing the selection exports a predicate-less filter, which the
    // sibling treats as removal; everything comes back.
    regions.borrow_mut().clear_selection();
    assert_eq!(series_sum(&products.borrow(), "widget"), 120.0);
    assert!(!products
        .borrow()
        .has_filter(&DimensionFilter::<Order>::empty("regions")));
}

#[test]
fn test_two_way_cross_filtering() {
    let regions = Rc::new(RefCell::new(region_dimension("regions")));
    let products = Rc::new(RefCell::new(product_dimension("products")));

    regions.borrow_mut().add_many(orders());
    products.borrow_mut().add_many(orders());

    {
        let target = Rc::clone(&products);
        regions.borrow_mut().on_selection(move |filter| {
            target.borrow_mut().replace_filter(filter.clone());
        });
    }
    {
        let target = Rc::clone(&regions);
        products.borrow_mut().on_selection(move |filter| {
            target.borrow_mut().replace_filter(filter.clone());
        });
    }

    regions.borrow_mut().select(["east"]);
    products.borrow_mut().select(["widget"]);

    // regions sees only widget revenue; products sees only east revenue.
    assert_eq!(series_sum(&regions.borrow(), "east"), 60.0);
    assert_eq!(series_sum(&regions.borrow(), "west"), 50.0);
    assert_eq!(series_sum(&products.borrow(), "widget"), 60.0);
    assert_eq!(series_sum(&products.borrow(), "gadget"), 15.0);

    // Dropping one side's selection restores only that constraint.
    products.borrow_mut().clear_selection();
    assert_eq!(series_sum(&regions.borrow(), "east"), 75.0);
    assert_eq!(series_sum(&products.borrow(), "gadget"), 15.0);
}

#[test]
fn test_change_notifications_fire_during_propagation() {
    let regions = Rc::new(RefCell::new(region_dimension("regions")));
    let products = Rc::new(RefCell::new(product_dimension("products")));
    regions.borrow_mut().add_many(orders());
    products.borrow_mut().add_many(orders());

    let product_changes = Rc::new(RefCell::new(0usize));
    {
        let counter = Rc::clone(&product_changes);
        products.borrow_mut().on_change(move || *counter.borrow_mut() += 1);
    }
    {
        let target = Rc::clone(&products);
        regions.borrow_mut().on_selection(move |filter| {
            target.borrow_mut().replace_filter(filter.clone());
        });
    }

    regions.borrow_mut().select(["east"]);
    assert_eq!(*product_changes.borrow(), 1);

    // A no-op selection does not ripple anywhere.
    regions.borrow_mut().select(["east"]);
    assert_eq!(*product_changes.borrow(), 1);
}

// ============================================================================
// Incremental vs Full Replay
// ============================================================================

#[test]
fn test_filter_churn_matches_full_replay() {
    let mut incremental = product_dimension("incremental");
    let mut replayed = Dimension::new(
        DimensionConfig::new("replayed")
            .group_series(|o: &Order| GroupKey::from(o.product))
            .group_data(|o: &Order| GroupKey::from(o.region))
            .reduce_init(|_o: &Order| 0.0)
            .reduce_add(|sum, o| *sum += o.amount)
            .reprocess_all_on_filter(true),
    )
    .expect("valid configuration");

    incremental.add_many(orders());
    replayed.add_many(orders());

    let churn: Vec<DimensionFilter<Order>> = vec![
        DimensionFilter::new("qty", |o: &Order| o.qty >= 2),
        DimensionFilter::new("amount", |o: &Order| o.amount < 45.0),
        DimensionFilter::new("qty", |o: &Order| o.qty >= 1),
    ];
    for dim in [&mut incremental, &mut replayed] {
        dim.add_filter(churn[0].clone());
        dim.add_filter(churn[1].clone());
        dim.replace_filter(churn[2].clone());
        dim.remove_filter(&churn[1]);
    }

    // Every series surviving the replay must match the incrementally
    // maintained aggregates exactly.
    for series in replayed.data() {
        let other = incremental
            .find_series(&series.key)
            .expect("series present in incremental dimension");
        assert_eq!(series.count, other.count);
        for point in &series.data_points {
            let other_point = other.point(&point.key).expect("point present");
            assert_eq!(point.count, other_point.count);
            assert_eq!(point.value, other_point.value);
        }
    }
}

#[test]
fn test_add_after_filtering_classifies_against_chain() {
    let mut dim = product_dimension("products");
    dim.add_many(orders());
    dim.add_filter(DimensionFilter::new("east-only", |o: &Order| {
        o.region == "east"
    }));

    // New records are classified against the active chain on arrival.
    dim.add_one(Order { region: "west", product: "widget", qty: 9, amount: 90.0 });
    dim.add_one(Order { region: "east", product: "widget", qty: 1, amount: 1.0 });

    assert_eq!(series_sum(&dim, "widget"), 61.0);

    // Removing the filter surfaces the excluded newcomer too.
    dim.remove_filter(&DimensionFilter::<Order>::empty("east-only"));
    assert_eq!(series_sum(&dim, "widget"), 211.0);
}

// ============================================================================
// Post-Processing
// ============================================================================

#[test]
fn test_post_process_summary_hook() {
    // A richer accumulator plus a hook that fixes the series order for
    // display, the kind of final adjustment the hook exists for.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Acc {
        sum: f64,
        max_qty: i64,
    }

    let mut dim = Dimension::new(
        DimensionConfig::new("products")
            .group_series(|o: &Order| GroupKey::from(o.product))
            .group_data(|o: &Order| GroupKey::from(o.region))
            .reduce_init(|_o: &Order| Acc { sum: 0.0, max_qty: 0 })
            .reduce_add(|a, o| {
                a.sum += o.amount;
                a.max_qty = a.max_qty.max(o.qty);
            })
            .reduce_remove(|a, o| a.sum -= o.amount)
            .sort_key(|p| p.key.clone())
            .post_process(|data| {
                data.sort_by(|a, b| a.name.cmp(&b.name));
            }),
    )
    .expect("valid configuration");

    dim.add_many(orders());

    let names: Vec<&str> = dim.data().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["gadget", "gizmo", "widget"]);

    let widget = dim.find_series(&GroupKey::from("widget")).unwrap();
    let regions: Vec<String> = widget
        .data_points
        .iter()
        .map(|p| p.key.to_string())
        .collect();
    assert_eq!(regions, ["east", "north", "west"]);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let mut dim = product_dimension("products");
    dim.add_many(orders());

    let json = serde_json::to_value(dim.data()).expect("snapshot serializes");
    let series = json.as_array().unwrap();
    assert_eq!(series.len(), 3);

    let widget = series
        .iter()
        .find(|s| s["name"] == "widget")
        .expect("widget series present");
    assert_eq!(widget["count"], 4);
    assert!(widget["data_points"].as_array().unwrap().len() >= 2);
}
