/// Quantization bounds for the Player's origin and eye yaw, plus the angle
/// wrap-around behavior.
use proptest::prelude::*;

use propnet_shared::{
    codec::{
        dequantize, dequantize_angle, dequantize_float, quantize, quantize_angle, quantize_float,
        same_on_wire,
    },
    EntitySlots, PropertyValue,
};
use propnet_test::{
    assert_vector_within, assert_within,
    helpers::assertions::angle_distance,
    protocol,
    test_protocol::{EYE_YAW_BITS, ORIGIN_BITS, ORIGIN_HIGH, ORIGIN_LOW},
    Player,
};

fn origin_step() -> f32 {
    (ORIGIN_HIGH - ORIGIN_LOW) / ((1u32 << ORIGIN_BITS) - 1) as f32
}

fn angle_step() -> f32 {
    360.0 / (1u32 << EYE_YAW_BITS) as f32
}

#[test]
fn origin_round_trips_within_one_step() {
    let protocol = protocol();
    let schema = protocol.class_of::<Player>().unwrap().schema();
    let origin = schema.property(schema.index_of("origin").unwrap()).unwrap().descriptor();
    let slots = EntitySlots::new(protocol.entity_index_bits());

    let sent = [1000.3, 2000.7, 8191.9];
    let wire = quantize(&PropertyValue::Vector(sent), origin).unwrap();
    let PropertyValue::Vector(received) = dequantize(&wire, origin, &slots).unwrap() else {
        panic!("origin should decode as a vector");
    };
    assert_vector_within!(received, sent, 2.0);
}

#[test]
fn out_of_range_floats_clamp_to_the_bounds() {
    let low = dequantize_float(quantize_float(-50.0, 0.0, 8192.0, 12), 0.0, 8192.0, 12);
    let high = dequantize_float(quantize_float(9000.0, 0.0, 8192.0, 12), 0.0, 8192.0, 12);
    assert_eq!(low, 0.0);
    assert_eq!(high, 8192.0);
}

#[test]
fn eye_yaw_error_is_under_a_fifth_of_a_degree() {
    assert!(angle_step() < 0.18);
    for degrees in [0.0f32, 45.5, 123.45, 271.0, 359.99] {
        let decoded = dequantize_angle(quantize_angle(degrees, EYE_YAW_BITS), EYE_YAW_BITS);
        assert!(angle_distance(decoded, degrees) < 0.18);
    }
}

#[test]
fn angles_wrap_around_zero() {
    let just_below = dequantize_angle(quantize_angle(359.9, EYE_YAW_BITS), EYE_YAW_BITS);
    let just_above = dequantize_angle(quantize_angle(0.1, EYE_YAW_BITS), EYE_YAW_BITS);
    assert!(angle_distance(just_below, just_above) < 2.0 * angle_step());

    // a full turn is the same bucket
    assert_eq!(quantize_angle(360.0, EYE_YAW_BITS), quantize_angle(0.0, EYE_YAW_BITS));
    assert_eq!(quantize_angle(-90.0, EYE_YAW_BITS), quantize_angle(270.0, EYE_YAW_BITS));
}

#[test]
fn values_within_a_bucket_are_the_same_on_the_wire() {
    let protocol = protocol();
    let schema = protocol.class_of::<Player>().unwrap().schema();
    let eye_yaw = schema.property(schema.index_of("eyeYaw").unwrap()).unwrap().descriptor();

    let base = 90.0;
    let nudge = angle_step() / 8.0;
    assert!(same_on_wire(
        &PropertyValue::Float(base),
        &PropertyValue::Float(base + nudge),
        eye_yaw
    ));
    assert!(!same_on_wire(
        &PropertyValue::Float(base),
        &PropertyValue::Float(base + 2.0 * angle_step()),
        eye_yaw
    ));
}

#[test]
fn signed_health_keeps_its_sign() {
    let protocol = protocol();
    let schema = protocol.class_of::<Player>().unwrap().schema();
    let health = schema.property(schema.index_of("health").unwrap()).unwrap().descriptor();
    let slots = EntitySlots::new(protocol.entity_index_bits());

    for value in [-100, -1, 0, 42, 100] {
        let wire = quantize(&PropertyValue::Int(value), health).unwrap();
        assert_eq!(dequantize(&wire, health, &slots), Ok(PropertyValue::Int(value)));
    }
    // clamped, with a warning, never a panic
    let wire = quantize(&PropertyValue::Int(150), health).unwrap();
    assert_eq!(dequantize(&wire, health, &slots), Ok(PropertyValue::Int(100)));
}

proptest! {
    #[test]
    fn prop_float_round_trip_is_bounded(value in ORIGIN_LOW..=ORIGIN_HIGH) {
        let decoded = dequantize_float(
            quantize_float(value, ORIGIN_LOW, ORIGIN_HIGH, ORIGIN_BITS),
            ORIGIN_LOW,
            ORIGIN_HIGH,
            ORIGIN_BITS,
        );
        prop_assert!((decoded - value).abs() <= origin_step());
    }

    #[test]
    fn prop_angle_round_trip_is_bounded(degrees in -1080.0f32..1080.0, bits in 4u8..=16) {
        let step = 360.0 / (1u32 << bits) as f32;
        let decoded = dequantize_angle(quantize_angle(degrees, bits), bits);
        prop_assert!((0.0..360.0).contains(&decoded));
        // float slack for the wrap of large inputs
        prop_assert!(angle_distance(decoded, degrees) < step + 1e-3);
    }
}

#[test]
fn assert_within_accepts_the_boundary() {
    assert_within!(2.0f32, 0.0f32, 2.0);
}
