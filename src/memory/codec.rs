//! Conversion between typed scan values and their in-memory byte encoding
//!
//! All functions here are pure and may be called from any number of scan
//! workers at once.

use crate::core::types::{DataType, MemoryError, MemoryResult, ScanValue};

/// Default absolute tolerance for float equality between scan rounds
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 0.1;

/// Encoder/decoder plus the per-type equality rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueCodec {
    float_tolerance: f64,
}

impl ValueCodec {
    /// Create a codec with a custom float tolerance
    pub fn new(float_tolerance: f64) -> Self {
        ValueCodec { float_tolerance }
    }

    /// Absolute tolerance used for `Float32` comparisons
    pub fn float_tolerance(&self) -> f64 {
        self.float_tolerance
    }

    /// Serialize a value to its little-endian fixed-width representation
    pub fn encode(value: &ScanValue) -> Vec<u8> {
        match value {
            ScanValue::Int32(v) => v.to_le_bytes().to_vec(),
            ScanValue::Float32(v) => v.to_bits().to_le_bytes().to_vec(),
        }
    }

    /// Decode the first `width(data_type)` bytes of `bytes`
    pub fn decode(bytes: &[u8], data_type: DataType) -> MemoryResult<ScanValue> {
        let width = data_type.width();
        let window: [u8; 4] = bytes
            .get(..width)
            .and_then(|w| w.try_into().ok())
            .ok_or(MemoryError::Decode {
                expected: width,
                actual: bytes.len(),
            })?;

        Ok(match data_type {
            DataType::Int32 => ScanValue::Int32(i32::from_le_bytes(window)),
            DataType::Float32 => ScanValue::Float32(f32::from_bits(u32::from_le_bytes(window))),
        })
    }

    /// Test a decoded value against the target under the type's equality rule
    pub fn matches(&self, decoded: &ScanValue, target: &ScanValue) -> bool {
        match (decoded, target) {
            (ScanValue::Int32(a), ScanValue::Int32(b)) => a == b,
            (ScanValue::Float32(a), ScanValue::Float32(b)) => {
                (f64::from(*a) - f64::from(*b)).abs() <= self.float_tolerance
            }
            _ => false,
        }
    }

    /// Decode a window and test it, treating short windows as a miss
    pub fn decode_match(&self, bytes: &[u8], target: &ScanValue) -> Option<ScanValue> {
        let decoded = Self::decode(bytes, target.data_type()).ok()?;
        self.matches(&decoded, target).then_some(decoded)
    }
}

impl Default for ValueCodec {
    fn default() -> Self {
        ValueCodec::new(DEFAULT_FLOAT_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_int() {
        assert_eq!(
            ValueCodec::encode(&ScanValue::Int32(0x12345678)),
            vec![0x78, 0x56, 0x34, 0x12]
        );
        assert_eq!(
            ValueCodec::encode(&ScanValue::Int32(-1)),
            vec![0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_encode_float() {
        assert_eq!(
            ValueCodec::encode(&ScanValue::Float32(1.0)),
            vec![0x00, 0x00, 0x80, 0x3F]
        );
    }

    #[test]
    fn test_decode_signed() {
        let value = ValueCodec::decode(&[0xFE, 0xFF, 0xFF, 0xFF], DataType::Int32).unwrap();
        assert_eq!(value, ScanValue::Int32(-2));
    }

    #[test]
    fn test_decode_uses_leading_window() {
        let value = ValueCodec::decode(&[42, 0, 0, 0, 9, 9], DataType::Int32).unwrap();
        assert_eq!(value, ScanValue::Int32(42));
    }

    #[test]
    fn test_decode_truncated() {
        let err = ValueCodec::decode(&[1, 2, 3], DataType::Float32).unwrap_err();
        match err {
            MemoryError::Decode { expected, actual } => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            _ => panic!("Expected Decode error"),
        }
        assert!(ValueCodec::decode(&[], DataType::Int32).is_err());
    }

    #[test]
    fn test_int_matching_is_exact() {
        let codec = ValueCodec::default();
        assert!(codec.matches(&ScanValue::Int32(42), &ScanValue::Int32(42)));
        assert!(!codec.matches(&ScanValue::Int32(43), &ScanValue::Int32(42)));
    }

    #[test]
    fn test_float_matching_uses_tolerance() {
        let codec = ValueCodec::default();
        assert!(codec.matches(&ScanValue::Float32(100.05), &ScanValue::Float32(100.0)));
        assert!(codec.matches(&ScanValue::Float32(99.95), &ScanValue::Float32(100.0)));
        assert!(!codec.matches(&ScanValue::Float32(100.2), &ScanValue::Float32(100.0)));
        assert!(!codec.matches(&ScanValue::Float32(f32::NAN), &ScanValue::Float32(100.0)));

        let strict = ValueCodec::new(0.0);
        assert!(!strict.matches(&ScanValue::Float32(100.05), &ScanValue::Float32(100.0)));
    }

    #[test]
    fn test_mixed_types_never_match() {
        let codec = ValueCodec::default();
        assert!(!codec.matches(&ScanValue::Int32(1), &ScanValue::Float32(1.0)));
        assert!(!codec.matches(&ScanValue::Float32(1.0), &ScanValue::Int32(1)));
    }

    #[test]
    fn test_decode_match() {
        let codec = ValueCodec::default();
        let bytes = ValueCodec::encode(&ScanValue::Int32(7));
        assert_eq!(
            codec.decode_match(&bytes, &ScanValue::Int32(7)),
            Some(ScanValue::Int32(7))
        );
        assert_eq!(codec.decode_match(&bytes, &ScanValue::Int32(8)), None);
        assert_eq!(codec.decode_match(&bytes[..2], &ScanValue::Int32(7)), None);
    }
}
