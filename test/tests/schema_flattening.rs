/// Flattening: deterministic order, exclusion with re-declaration, and
/// schema fingerprints.
use proptest::prelude::*;

use propnet_shared::{PropertyDescriptor, PropertyKind, PropertyTable, Protocol};
use propnet_test::{
    protocol,
    test_protocol::{base_entity_table, player_table, weapon_table},
    BaseEntity, Player,
};

fn player_names(protocol: &Protocol) -> Vec<String> {
    protocol
        .class_of::<Player>()
        .unwrap()
        .schema()
        .iter()
        .map(|property| property.name().to_string())
        .collect()
}

#[test]
fn player_layout_is_base_to_derived_with_nested_inline() {
    let protocol = protocol();
    assert_eq!(
        player_names(&protocol),
        vec!["origin", "owner", "health", "eyeYaw", "name", "weapon.ammo", "weapon.heat"]
    );
}

#[test]
fn flattening_is_deterministic() {
    let first = protocol();
    let second = protocol();

    assert_eq!(player_names(&first), player_names(&second));
    assert_eq!(first.fingerprint(), second.fingerprint());
    for (a, b) in first.classes().zip(second.classes()) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.name(), b.name());
    }
}

#[test]
fn excluded_property_appears_once_with_derived_encoding() {
    let protocol = protocol();
    let schema = protocol.class_of::<Player>().unwrap().schema();

    let healths: Vec<_> = schema
        .iter()
        .filter(|property| property.name() == "health")
        .collect();
    assert_eq!(healths.len(), 1);

    let health = healths[0];
    assert_eq!(health.declared_in(), "Player");
    assert_eq!(health.descriptor().kind(), PropertyKind::Int);
    assert_eq!(health.descriptor().int_range(), Some((-100, 100)));
    assert!(health.descriptor().is_signed());

    // the base class keeps its own encoding
    let base = protocol.class_of::<BaseEntity>().unwrap().schema();
    let base_health = base.property(base.index_of("health").unwrap()).unwrap();
    assert_eq!(base_health.descriptor().int_range(), Some((0, 255)));
}

#[test]
fn changes_often_flag_survives_flattening() {
    let protocol = protocol();
    let schema = protocol.class_of::<Player>().unwrap().schema();
    let eye_yaw = schema.property(schema.index_of("eyeYaw").unwrap()).unwrap();
    assert!(eye_yaw.descriptor().changes_often_flag());
    let name = schema.property(schema.index_of("name").unwrap()).unwrap();
    assert!(!name.descriptor().changes_often_flag());
}

#[test]
fn fingerprint_changes_with_the_layout() {
    let narrower = Protocol::builder()
        .add_class::<BaseEntity>(base_entity_table())
        .add_table(weapon_table())
        .add_class::<Player>(player_table().add(
            PropertyDescriptor::bool("crouched").bind::<Player, bool>(|_| false, |_, _| {}),
        ))
        .build()
        .unwrap();

    assert_ne!(narrower.fingerprint(), protocol().fingerprint());
}

#[derive(Default)]
struct Slots {
    values: Vec<i64>,
}

// fn pointers can't capture, so each generated slot gets its own accessor
macro_rules! slot_accessors {
    ($($index:expr),*) => {
        [$((
            (|slots: &Slots| slots.values.get($index).copied().unwrap_or_default()) as fn(&Slots) -> i64,
            (|slots: &mut Slots, value: i64| {
                if let Some(slot) = slots.values.get_mut($index) {
                    *slot = value;
                }
            }) as fn(&mut Slots, i64),
        )),*]
    };
}

fn build_slots(widths: &[u8]) -> Protocol {
    let accessors = slot_accessors!(0, 1, 2, 3, 4, 5, 6, 7);
    let mut table = PropertyTable::new("Slots");
    for (position, bits) in widths.iter().enumerate() {
        let (get, set) = accessors[position];
        table = table.add(PropertyDescriptor::int(&format!("slot{}", position), *bits).bind(get, set));
    }
    Protocol::builder()
        .add_class::<Slots>(table)
        .build()
        .unwrap()
}

proptest! {
    /// Same declarations, same indices and fingerprint, however many times built
    #[test]
    fn prop_flattening_is_deterministic(widths in prop::collection::vec(1u8..=32, 1..8)) {
        let first = build_slots(&widths);
        let second = build_slots(&widths);

        prop_assert_eq!(first.fingerprint(), second.fingerprint());
        let schema_a = first.class_of::<Slots>().unwrap().schema();
        let schema_b = second.class_of::<Slots>().unwrap().schema();
        prop_assert_eq!(schema_a.len(), widths.len());
        for (a, b) in schema_a.iter().zip(schema_b.iter()) {
            prop_assert_eq!(a.index(), b.index());
            prop_assert_eq!(a.name(), b.name());
            prop_assert_eq!(a.descriptor().bit_count(), b.descriptor().bit_count());
        }
    }
}
