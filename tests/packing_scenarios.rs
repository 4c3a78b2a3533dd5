use serde_json::json;
use shipment_packer::input::{LineItemInput, parse_line_items};
use shipment_packer::{BoxType, InvalidInputError, Item, UnpackedReason, pack};

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

#[test]
fn single_item_lands_in_single_box() {
    let item = Item::new("mug", (20.0, 10.0, 5.0), 8.0).unwrap();
    let box_type = BoxType::new("small", (30.0, 20.0, 10.0), 4.0).unwrap();

    let result = pack(vec![item.clone()], vec![box_type.clone()]).unwrap();

    assert_eq!(result.packed.len(), 1);
    assert_eq!(result.packed[0].box_type(), &box_type);
    assert_eq!(result.packed[0].products(), &[item]);
    assert!(result.unpacked.is_empty());
}

#[test]
fn same_box_type_is_opened_again_when_full() {
    let items = vec![
        Item::new("cube-1", (15.0, 15.0, 15.0), 10.0).unwrap(),
        Item::new("cube-2", (15.0, 15.0, 15.0), 10.0).unwrap(),
    ];
    let box_type = BoxType::new("cube-box", (16.0, 16.0, 16.0), 3.0).unwrap();

    let result = pack(items, vec![box_type]).unwrap();

    assert_eq!(result.packed.len(), 2);
    for packed in &result.packed {
        assert_eq!(packed.box_type().id, "cube-box");
        assert_eq!(packed.products().len(), 1);
    }
    assert!(result.is_complete());
}

#[test]
fn ship_alone_item_gets_own_box() {
    let items = vec![
        Item::new("regular-1", (10.0, 10.0, 10.0), 5.0).unwrap(),
        Item::new("fragile", (10.0, 10.0, 10.0), 5.0)
            .unwrap()
            .shipped_alone(),
        Item::new("regular-2", (10.0, 10.0, 10.0), 5.0).unwrap(),
    ];
    let box_type = BoxType::new("big", (40.0, 40.0, 40.0), 10.0).unwrap();

    let result = pack(items, vec![box_type]).unwrap();

    assert_eq!(result.packed.len(), 2);
    assert_eq!(ids(result.packed[0].products()), vec!["fragile"]);
    assert_eq!(
        ids(result.packed[1].products()),
        vec!["regular-1", "regular-2"]
    );
}

#[test]
fn oversized_item_is_reported_unpacked() {
    let items = vec![
        Item::new("sofa", (200.0, 90.0, 80.0), 900.0).unwrap(),
        Item::new("book", (20.0, 15.0, 3.0), 12.0).unwrap(),
    ];
    let box_types = vec![
        BoxType::new("small", (30.0, 20.0, 10.0), 4.0).unwrap(),
        BoxType::new("large", (60.0, 40.0, 40.0), 12.0).unwrap(),
    ];

    let result = pack(items, box_types).unwrap();

    assert_eq!(result.packed.len(), 1);
    assert_eq!(result.packed[0].box_type().id, "small");
    assert_eq!(result.unpacked.len(), 1);
    assert_eq!(result.unpacked[0].item.id, "sofa");
    assert_eq!(result.unpacked[0].reason, UnpackedReason::ExceedsBoxVolume);
}

#[test]
fn weight_limit_pushes_item_into_sturdier_box() {
    let heavy = Item::new("anvil", (10.0, 10.0, 10.0), 20.0).unwrap();
    let flimsy = BoxType::new("flimsy", (30.0, 20.0, 10.0), 4.0)
        .unwrap()
        .with_max_weight(10.0)
        .unwrap();
    let sturdy = BoxType::new("sturdy", (40.0, 40.0, 40.0), 12.0).unwrap();

    let result = pack(vec![heavy.clone()], vec![flimsy.clone(), sturdy]).unwrap();
    assert_eq!(result.packed.len(), 1);
    assert_eq!(result.packed[0].box_type().id, "sturdy");

    let result = pack(vec![heavy], vec![flimsy]).unwrap();
    assert!(result.packed.is_empty());
    assert_eq!(result.unpacked[0].reason, UnpackedReason::TooHeavyForBox);
}

#[test]
fn non_numeric_weight_is_rejected_at_the_boundary() {
    let lines: Vec<LineItemInput> = serde_json::from_value(json!([
        { "id": "mug", "length_cm": 20, "width_cm": 10, "height_cm": 5, "weight_oz": "heavy" }
    ]))
    .unwrap();
    let err = parse_line_items(lines).unwrap_err();
    assert!(matches!(err, InvalidInputError::NotNumeric { field: "weight_oz", .. }));

    let lines: Vec<LineItemInput> = serde_json::from_value(json!([
        { "id": "mug", "length_cm": 20, "width_cm": 10, "height_cm": 5 }
    ]))
    .unwrap();
    let err = parse_line_items(lines).unwrap_err();
    assert!(matches!(err, InvalidInputError::MissingField { field: "weight_oz", .. }));
}

#[test]
fn negative_measurement_is_rejected_by_the_engine() {
    let item = Item {
        id: "bad".into(),
        length_cm: 1.0,
        width_cm: 1.0,
        height_cm: 1.0,
        weight_oz: -3.0,
        ship_alone: false,
    };
    let box_type = BoxType::new("small", (10.0, 10.0, 10.0), 1.0).unwrap();

    let err = pack(vec![item], vec![box_type]).unwrap_err();
    assert_eq!(err.code(), "negative_value");
}
