use thiserror::Error;

/// The reader ran past the end of its buffer, or read bits that do not form
/// a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Serde error: attempted to read past the end of the buffer, or data was malformed")]
pub struct SerdeErr;

/// Errors that can occur when building a fixed-width integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegerError {
    /// Width must be between 1 and 64 bits
    #[error("Integer width of {bits} bits is not supported (must be 1..=64)")]
    UnsupportedWidth { bits: u8 },

    /// A negative value was given to an unsigned integer
    #[error("Can't encode negative value {value} with an unsigned integer")]
    NegativeUnsigned { value: i64 },

    /// The value does not fit in the declared width
    #[error("Value {value} does not fit in {bits} bits")]
    OutOfRange { value: i64, bits: u8 },
}
