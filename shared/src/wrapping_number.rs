use thiserror::Error;

use crate::types::Tick;

/// Errors that can occur during wrapping number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrappingNumberError {
    /// The two ticks are exactly half the sequence space apart, so neither is
    /// unambiguously ahead of the other.
    #[error("ticks {a} and {b} are too far apart to order")]
    Ambiguous { a: Tick, b: Tick },
}

const HALF: u16 = u16::MAX / 2 + 1;

/// Returns whether or not a wrapping tick is ahead of another
/// sequence_greater_than(2,1) will return true
/// sequence_greater_than(1,2) will return false
/// sequence_greater_than(1,1) will return false
pub fn sequence_greater_than(s1: Tick, s2: Tick) -> bool {
    ((s1 > s2) && (s1 - s2 <= HALF)) || ((s1 < s2) && (s2 - s1 > HALF))
}

/// Returns whether or not a wrapping tick is behind another
/// sequence_less_than(1,2) will return true
/// sequence_less_than(2,1) will return false
/// sequence_less_than(1,1) will return false
pub fn sequence_less_than(s1: Tick, s2: Tick) -> bool {
    sequence_greater_than(s2, s1)
}

/// Signed number of ticks from `a` forward to `b`.
///
/// # Examples
/// ```
/// # use propnet_shared::try_wrapping_diff;
/// assert_eq!(try_wrapping_diff(1, 2).unwrap(), 1);
/// assert_eq!(try_wrapping_diff(2, 1).unwrap(), -1);
/// assert_eq!(try_wrapping_diff(65535, 0).unwrap(), 1);
/// assert!(try_wrapping_diff(0, 32768).is_err());
/// ```
pub fn try_wrapping_diff(a: Tick, b: Tick) -> Result<i16, WrappingNumberError> {
    let forward = b.wrapping_sub(a);
    if forward == HALF {
        return Err(WrappingNumberError::Ambiguous { a, b });
    }
    // two's complement reinterpretation gives the shortest signed distance
    Ok(forward as i16)
}

/// Signed number of ticks from `a` forward to `b`.
///
/// # Panics
///
/// Panics if the ticks are exactly half the sequence space apart.
/// Consider using `try_wrapping_diff` for non-panicking error handling.
///
/// # Examples
/// ```
/// # use propnet_shared::wrapping_diff;
/// assert_eq!(wrapping_diff(65535, 1), 2);
/// assert_eq!(wrapping_diff(1, 65535), -2);
/// ```
pub fn wrapping_diff(a: Tick, b: Tick) -> i16 {
    match try_wrapping_diff(a, b) {
        Ok(diff) => diff,
        Err(error) => panic!("{}", error),
    }
}
