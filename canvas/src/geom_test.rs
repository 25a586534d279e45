#![allow(clippy::float_cmp)]

use super::*;

fn bounds() -> Bounds {
    Bounds::new(300.0, 300.0, 40.0)
}

// =============================================================
// Point / Rect
// =============================================================

#[test]
fn point_sub_and_distance() {
    let a = Point::new(10.0, 10.0);
    let b = Point::new(7.0, 6.0);
    assert_eq!(a.sub(b), Point::new(3.0, 4.0));
    assert_eq!(a.distance(b), 5.0);
}

#[test]
fn rect_contains_is_inclusive() {
    let r = Rect::new(10.0, 20.0, 100.0, 50.0);
    assert!(r.contains(Point::new(10.0, 20.0)));
    assert!(r.contains(Point::new(110.0, 70.0)));
    assert!(!r.contains(Point::new(110.1, 70.0)));
    assert!(!r.contains(Point::new(9.9, 30.0)));
}

#[test]
fn rect_rejects_nan() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(!r.contains(Point::new(f64::NAN, 1.0)));
}

#[test]
fn rect_to_local_subtracts_origin() {
    let r = Rect::new(100.0, 50.0, 300.0, 300.0);
    assert_eq!(r.to_local(Point::new(150.0, 60.0)), Point::new(50.0, 10.0));
}

// =============================================================
// Bounds::clamp
// =============================================================

#[test]
fn clamp_negative_to_origin() {
    assert_eq!(bounds().clamp(Point::new(-10.0, -10.0)), ItemPos::new(0, 0));
}

#[test]
fn clamp_overflow_to_max_origin() {
    assert_eq!(bounds().clamp(Point::new(999.0, 1e9)), ItemPos::new(260, 260));
}

#[test]
fn clamp_rounds_fractional() {
    assert_eq!(bounds().clamp(Point::new(50.4, 50.6)), ItemPos::new(50, 51));
}

#[test]
fn clamp_non_finite_to_zero() {
    let p = bounds().clamp(Point::new(f64::INFINITY, f64::NAN));
    assert_eq!(p, ItemPos::new(0, 0));
}

#[test]
fn clamp_canvas_smaller_than_item() {
    let b = Bounds::new(20.0, 20.0, 40.0);
    assert_eq!(b.clamp(Point::new(15.0, 15.0)), ItemPos::new(0, 0));
}

#[test]
fn clamp_fractional_canvas_never_exceeds_bound() {
    let b = Bounds::new(300.5, 300.5, 40.0);
    let p = b.clamp(Point::new(300.0, 300.0));
    assert_eq!(p, ItemPos::new(260, 260));
    assert!(f64::from(p.x) <= 300.5 - 40.0);
}

#[test]
fn clamp_property_over_grid() {
    let b = bounds();
    let mut v = -500.0;
    while v < 800.0 {
        let p = b.clamp(Point::new(v, -v));
        assert!(p.x >= 0 && p.x <= 260, "x out of bounds for {v}: {p:?}");
        assert!(p.y >= 0 && p.y <= 260, "y out of bounds for {v}: {p:?}");
        v += 37.3;
    }
}

#[test]
fn holds_detects_out_of_bounds() {
    let b = bounds();
    assert!(b.holds(ItemPos::new(0, 260)));
    assert!(!b.holds(ItemPos::new(-1, 0)));
    assert!(!b.holds(ItemPos::new(0, 261)));
}

#[test]
fn rect_covers_is_half_open() {
    let r = Rect::new(0.0, 0.0, 40.0, 40.0);
    assert!(r.covers(Point::new(0.0, 0.0)));
    assert!(r.covers(Point::new(39.9, 39.9)));
    assert!(!r.covers(Point::new(40.0, 10.0)));
    assert!(!r.covers(Point::new(10.0, 40.0)));
    assert!(!r.covers(Point::new(f64::NAN, 1.0)));
}
