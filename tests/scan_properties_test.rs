//! Property tests for the codec and for narrowing

use memedit::memory::{ScanOptions, ScanSession, ValueCodec};
use memedit::process::SimulatedProcess;
use memedit::{Address, DataType, ProcessInfo, ScanValue};
use proptest::prelude::*;
use std::collections::HashSet;

const BASE: Address = Address::new(0x10000);

fn small_ints() -> impl Strategy<Value = Vec<i32>> {
    // Narrow value range so scans actually hit
    prop::collection::vec(0i32..4, 1..64)
}

fn image(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

proptest! {
    #[test]
    fn prop_int_round_trip(value in any::<i32>()) {
        let bytes = ValueCodec::encode(&ScanValue::Int32(value));
        prop_assert_eq!(ValueCodec::decode(&bytes, DataType::Int32).unwrap(), ScanValue::Int32(value));
    }

    #[test]
    fn prop_float_round_trip_matches(value in -1.0e6f32..1.0e6f32) {
        let codec = ValueCodec::default();
        let target = ScanValue::Float32(value);
        let decoded = ValueCodec::decode(&ValueCodec::encode(&target), DataType::Float32).unwrap();
        prop_assert!(codec.matches(&decoded, &target));
    }

    #[test]
    fn prop_short_input_never_decodes(bytes in prop::collection::vec(any::<u8>(), 0..4)) {
        prop_assert!(ValueCodec::decode(&bytes, DataType::Int32).is_err());
        prop_assert!(ValueCodec::decode(&bytes, DataType::Float32).is_err());
    }

    #[test]
    fn prop_first_scan_finds_exactly_the_matching_slots(values in small_ints(), target in 0i32..4) {
        let sim = SimulatedProcess::new(1).with_module("main", BASE, image(&values));
        let mut session = ScanSession::attach(
            &sim,
            ProcessInfo::new(1, "main"),
            DataType::Int32,
            ScanOptions { chunk_size: 16, ..ScanOptions::default() },
        ).unwrap();

        session.first_scan(ScanValue::Int32(target)).unwrap();
        let found: Vec<Address> = session.candidates().iter().map(|c| c.address).collect();
        let expected: Vec<Address> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == target)
            .map(|(i, _)| Address::new(BASE.as_usize() + i * 4))
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_narrowing_is_monotonic_and_idempotent(
        values in small_ints(),
        changes in prop::collection::vec((0usize..64, 0i32..4), 0..16),
        target in 0i32..4,
    ) {
        let sim = SimulatedProcess::new(1).with_module("main", BASE, image(&values));
        let mut session = ScanSession::attach(
            &sim,
            ProcessInfo::new(1, "main"),
            DataType::Int32,
            ScanOptions::default(),
        ).unwrap();
        session.first_scan(ScanValue::Int32(target)).unwrap();
        let before: HashSet<Address> = session.candidates().iter().map(|c| c.address).collect();

        for (slot, value) in changes {
            let slot = slot % values.len();
            sim.poke(Address::new(BASE.as_usize() + slot * 4), &value.to_le_bytes()).unwrap();
        }

        session.next_scan(ScanValue::Int32(target)).unwrap();
        let after = session.candidates().to_vec();
        prop_assert!(after.iter().all(|c| before.contains(&c.address)));
        prop_assert!(after.windows(2).all(|w| w[0].address < w[1].address));

        session.next_scan(ScanValue::Int32(target)).unwrap();
        prop_assert_eq!(session.candidates(), after.as_slice());
    }
}
