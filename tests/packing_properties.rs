use shipment_packer::packer::{ItemOrder, PackingConfig};
use shipment_packer::{BoxType, Item, PackingResult, UnpackedReason, pack, pack_with_config};

const EPS: f64 = 1e-6;

fn catalog() -> Vec<BoxType> {
    vec![
        BoxType::new("large", (50.0, 40.0, 30.0), 16.0)
            .unwrap()
            .with_max_weight(400.0)
            .unwrap(),
        BoxType::new("small", (20.0, 15.0, 10.0), 3.0)
            .unwrap()
            .with_max_weight(60.0)
            .unwrap(),
        BoxType::new("medium", (30.0, 25.0, 20.0), 8.0)
            .unwrap()
            .with_max_weight(200.0)
            .unwrap(),
    ]
}

fn cart() -> Vec<Item> {
    let mut items = Vec::new();
    for k in 0..12 {
        let side = 4.0 + (k % 5) as f64 * 3.0;
        let weight = 5.0 + (k % 4) as f64 * 9.5;
        let item = Item::new(format!("sku-{}", k), (side, side + 1.0, side / 2.0), weight).unwrap();
        items.push(if k % 6 == 0 { item.shipped_alone() } else { item });
    }
    items.push(Item::new("crate", (60.0, 60.0, 60.0), 10.0).unwrap());
    items.push(Item::new("lead", (5.0, 5.0, 5.0), 500.0).unwrap());
    items.push(Item::new("sticker", (0.0, 10.0, 10.0), 0.0).unwrap());
    items
}

fn all_ids(result: &PackingResult) -> Vec<String> {
    let mut ids: Vec<String> = result
        .packed
        .iter()
        .flat_map(|packed| packed.products().iter().map(|item| item.id.clone()))
        .chain(result.unpacked_items().map(|item| item.id.clone()))
        .collect();
    ids.sort();
    ids
}

#[test]
fn every_item_appears_exactly_once() {
    let items = cart();
    let mut expected: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
    expected.sort();

    let result = pack(items, catalog()).unwrap();
    assert_eq!(all_ids(&result), expected);
}

#[test]
fn boxes_respect_volume_and_weight_capacity() {
    let result = pack(cart(), catalog()).unwrap();
    for packed in &result.packed {
        let box_type = packed.box_type();
        let box_volume = box_type.length_cm * box_type.width_cm * box_type.height_cm;
        let contents_volume: f64 = packed
            .products()
            .iter()
            .map(|item| item.length_cm * item.width_cm * item.height_cm)
            .sum();
        assert!(contents_volume <= box_volume + EPS);

        if let Some(max) = box_type.max_weight_oz {
            let contents_weight: f64 = packed.products().iter().map(|item| item.weight_oz).sum();
            assert!(contents_weight + box_type.weight_oz <= max + EPS);
        }
    }
}

#[test]
fn ship_alone_items_never_share() {
    let result = pack(cart(), catalog()).unwrap();
    for packed in &result.packed {
        if packed.products().iter().any(|item| item.ship_alone) {
            assert_eq!(packed.products().len(), 1);
        }
    }
}

#[test]
fn no_empty_boxes_are_emitted() {
    let result = pack(cart(), catalog()).unwrap();
    assert!(result.packed.iter().all(|packed| !packed.is_empty()));
}

#[test]
fn unpacked_items_fit_no_box_type() {
    let result = pack(cart(), catalog()).unwrap();
    let unpacked: Vec<&str> = result.unpacked_items().map(|item| item.id.as_str()).collect();
    assert_eq!(unpacked, vec!["crate", "lead"]);
}

#[test]
fn packing_is_deterministic() {
    let first = pack(cart(), catalog()).unwrap();
    let second = pack(cart(), catalog()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn input_order_conserves_items_too() {
    let config = PackingConfig::builder().item_order(ItemOrder::Input).build();
    let items = cart();
    let count = items.len();

    let result = pack_with_config(items, catalog(), config).unwrap();
    assert_eq!(result.packed_item_count() + result.unpacked_count(), count);
}

#[test]
fn empty_catalog_leaves_every_item_unpacked_in_input_order() {
    let items = cart();
    let expected: Vec<String> = items.iter().map(|item| item.id.clone()).collect();

    let result = pack(items, Vec::new()).unwrap();

    assert!(result.packed.is_empty());
    let unpacked: Vec<String> = result.unpacked_items().map(|item| item.id.clone()).collect();
    assert_eq!(unpacked, expected);
    assert!(
        result
            .unpacked
            .iter()
            .all(|entry| entry.reason == UnpackedReason::NoBoxTypes)
    );
}

#[test]
fn empty_inputs_produce_empty_results() {
    let result = pack(Vec::new(), catalog()).unwrap();
    assert!(result.packed.is_empty());
    assert!(result.is_complete());

    let result = pack(Vec::new(), Vec::new()).unwrap();
    assert!(result.packed.is_empty());
    assert!(result.unpacked.is_empty());
}
