//! Read-only snapshots of target memory and aligned value matching

use super::codec::ValueCodec;
use crate::core::types::{Address, Candidate, ScanValue};
use rayon::prelude::*;

/// A snapshot of one contiguous range of the target's address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    base: Address,
    bytes: Vec<u8>,
}

impl MemoryRegion {
    /// Wrap bytes that were read starting at `base`
    pub fn new(base: Address, bytes: Vec<u8>) -> Self {
        MemoryRegion { base, bytes }
    }

    /// Find every window that matches `target`.
    ///
    /// Windows start at offsets that are multiples of the data width from
    /// `base`, so a value stored at an unaligned offset is never reported.
    /// A trailing window shorter than the width is ignored. Results are in
    /// ascending address order.
    pub fn find_matches(&self, target: &ScanValue, codec: &ValueCodec) -> Vec<Candidate> {
        let width = target.data_type().width();

        self.bytes
            .par_chunks_exact(width)
            .enumerate()
            .filter_map(|(index, window)| {
                let decoded = codec.decode_match(window, target)?;
                let address = self.base.checked_add(index * width)?;
                Some(Candidate::new(address, decoded))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_with(base: usize, size: usize, values: &[(usize, ScanValue)]) -> MemoryRegion {
        let mut bytes = vec![0u8; size];
        for (offset, value) in values {
            let encoded = ValueCodec::encode(value);
            bytes[*offset..*offset + encoded.len()].copy_from_slice(&encoded);
        }
        MemoryRegion::new(Address::new(base), bytes)
    }

    #[test]
    fn test_finds_aligned_values() {
        let region = region_with(
            0x1000,
            64,
            &[(16, ScanValue::Int32(42)), (48, ScanValue::Int32(42))],
        );
        let found = region.find_matches(&ScanValue::Int32(42), &ValueCodec::default());

        let addresses: Vec<_> = found.iter().map(|c| c.address).collect();
        assert_eq!(addresses, vec![Address::new(0x1010), Address::new(0x1030)]);
        assert!(found
            .iter()
            .all(|c| c.last_seen_value == ScanValue::Int32(42)));
    }

    #[test]
    fn test_skips_unaligned_values() {
        let region = region_with(0x1000, 32, &[(6, ScanValue::Int32(1234))]);
        let found = region.find_matches(&ScanValue::Int32(1234), &ValueCodec::default());
        assert!(found.is_empty());
    }

    #[test]
    fn test_ignores_trailing_partial_window() {
        // 42 encoded at offset 8 but the snapshot is cut to 10 bytes
        let mut bytes = vec![0u8; 12];
        bytes[8] = 42;
        bytes.truncate(10);
        let region = MemoryRegion::new(Address::new(0x2000), bytes);
        let found = region.find_matches(&ScanValue::Int32(42), &ValueCodec::default());
        assert!(found.is_empty());
    }

    #[test]
    fn test_float_matches_within_tolerance() {
        let region = region_with(
            0,
            16,
            &[(0, ScanValue::Float32(99.96)), (8, ScanValue::Float32(101.0))],
        );
        let found = region.find_matches(&ScanValue::Float32(100.0), &ValueCodec::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address, Address::new(0));
        assert_eq!(found[0].last_seen_value, ScanValue::Float32(99.96));
    }

    #[test]
    fn test_empty_region() {
        let region = MemoryRegion::new(Address::new(0x1000), Vec::new());
        assert!(region
            .find_matches(&ScanValue::Int32(0), &ValueCodec::default())
            .is_empty());
    }
}
