// Fixed-point mappings between floats and wire buckets. Widths are validated
// at schema build (1..=32 bits), so bucket counts always fit in a u64 and
// bucket indices in an f64 mantissa.

fn max_bucket(bits: u8) -> u64 {
    (1u64 << bits) - 1
}

/// Maps `value` linearly from `[low, high]` onto `0..=2^bits-1`, rounding
/// to the nearest bucket. Out-of-range values clamp to the nearest end;
/// NaN maps to `low`.
pub fn quantize_float(value: f32, low: f32, high: f32, bits: u8) -> u64 {
    let max = max_bucket(bits);
    if value.is_nan() {
        return 0;
    }
    let low = f64::from(low);
    let high = f64::from(high);
    let normalized = (f64::from(value).clamp(low, high) - low) / (high - low);
    ((normalized * max as f64).round() as u64).min(max)
}

pub fn dequantize_float(bucket: u64, low: f32, high: f32, bits: u8) -> f32 {
    let max = max_bucket(bits);
    let low = f64::from(low);
    let high = f64::from(high);
    let fraction = bucket.min(max) as f64 / max as f64;
    (low + fraction * (high - low)) as f32
}

/// Wraps degrees into `[0, 360)`.
pub fn wrap_degrees(degrees: f32) -> f64 {
    let wrapped = f64::from(degrees).rem_euclid(360.0);
    // rem_euclid of a tiny negative can round up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Splits the circle into `2^bits` equal buckets and returns the nearest
/// one. Rounding up past the last bucket wraps to bucket 0.
pub fn quantize_angle(degrees: f32, bits: u8) -> u64 {
    if !degrees.is_finite() {
        return 0;
    }
    let buckets = 1u64 << bits;
    let bucket = (wrap_degrees(degrees) * buckets as f64 / 360.0).round() as u64;
    bucket % buckets
}

pub fn dequantize_angle(bucket: u64, bits: u8) -> f32 {
    let buckets = 1u64 << bits;
    ((bucket % buckets) as f64 * 360.0 / buckets as f64) as f32
}
