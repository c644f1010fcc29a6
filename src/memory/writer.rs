//! Verified writes of a single scalar into the target process

use super::codec::ValueCodec;
use crate::core::types::{Address, MemoryError, MemoryResult, ScanValue, VerifiedValue};
use crate::process::ProcessMemory;
use tracing::{error, info, warn};

/// Writes one value and reads it back to prove the write landed
pub struct MemoryWriter<'a, H: ProcessMemory> {
    handle: &'a mut H,
    codec: ValueCodec,
}

impl<'a, H: ProcessMemory> MemoryWriter<'a, H> {
    /// Create a writer; `codec` supplies the equality rule for verification
    pub fn new(handle: &'a mut H, codec: ValueCodec) -> Self {
        MemoryWriter { handle, codec }
    }

    /// Write `value` at `address` and verify it.
    ///
    /// Returns the value read back on success. A read-back that differs from
    /// `value` (beyond the float tolerance) or cannot be read at all yields
    /// `VerifyMismatch`, even though the write call itself reported success.
    pub fn modify(&mut self, address: Address, value: ScanValue) -> MemoryResult<VerifiedValue> {
        let data_type = value.data_type();
        let bytes = ValueCodec::encode(&value);

        self.handle
            .write_scalar(address, &bytes)
            .map_err(|e| match e {
                MemoryError::WriteFailed { .. } => e,
                other => MemoryError::write_failed(address, other.to_string()),
            })?;

        let read_back = self
            .handle
            .read_bytes(address, data_type.width())
            .map_err(|e| MemoryError::verify_mismatch(address, value, format!("nothing ({})", e)))?;

        let actual = ValueCodec::decode(&read_back, data_type).map_err(|e| {
            error!(
                %address,
                bytes = %hex::encode(&read_back),
                error = %e,
                "adapter returned a truncated read"
            );
            MemoryError::verify_mismatch(address, value, e)
        })?;

        if !self.codec.matches(&actual, &value) {
            warn!(%address, expected = %value, actual = %actual, "write did not stick");
            return Err(MemoryError::verify_mismatch(address, value, actual));
        }

        info!(%address, value = %actual, "value modified");
        Ok(VerifiedValue {
            address,
            value: actual,
        })
    }
}
