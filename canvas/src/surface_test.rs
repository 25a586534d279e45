use super::*;

#[test]
fn records_calls_in_order() {
    let mut list = DisplayList::new();
    list.save();
    list.set_fill_color("#fff");
    list.fill_rect(0.0, 0.0, 10.0, 10.0);
    list.restore();
    assert_eq!(
        list.ops(),
        &[
            DrawOp::Save,
            DrawOp::FillColor { color: "#fff".into() },
            DrawOp::FillRect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 },
            DrawOp::Restore,
        ]
    );
}

#[test]
fn text_and_image_helpers_filter_ops() {
    let mut list = DisplayList::new();
    list.fill_text("🌹", 1.0, 2.0).unwrap();
    list.draw_image(&ImageRef("props/Well.png".into()), 0.0, 0.0, 40.0, 40.0).unwrap();
    list.begin_path();
    assert_eq!(list.texts(), ["🌹"]);
    assert_eq!(list.images(), ["props/Well.png"]);
    assert_eq!(list.len(), 3);
}

#[test]
fn gradient_stops_are_kept() {
    let mut list = DisplayList::new();
    list.set_fill_linear_gradient(Point::new(0.0, 0.0), Point::new(300.0, 0.0), &[(0.0, "red"), (1.0, "blue")])
        .unwrap();
    let DrawOp::FillGradient { stops, .. } = &list.ops()[0] else {
        panic!("expected gradient, got {:?}", list.ops());
    };
    assert_eq!(stops, &[(0.0, "red".to_string()), (1.0, "blue".to_string())]);
}

#[test]
fn serializes_with_op_tag() {
    let mut list = DisplayList::new();
    list.close_path();
    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(json["ops"][0]["op"], "close_path");
}
