//! Module `marker` implement the fixed-size presence block persisted
//! by the host store.
//!
//! The marker only says "this index exists and was built once"; the
//! bitmap structures are never persisted and are rebuilt from the row
//! source on first access.
//!
//! **Block format**, little endian:
//!
//! ```text
//! *----------------* 0
//! |     magic      |
//! *----------------* 4
//! |    version     |
//! *----------------* 8
//! | root, reserved |
//! *----------------* 12
//! |     n_rows     |
//! *----------------* 16
//! ```

use lazy_static::lazy_static;

use std::convert::TryInto;

use crate::Result;

/// Magic constant at the head of the marker block, spells "BISC".
pub const MARKER_MAGIC: u32 = 0x4249_5343;
/// Marker block version.
pub const MARKER_VERSION: u32 = 1;
/// Encoded length of the marker block, in bytes.
pub const MARKER_LEN: usize = 16;

lazy_static! {
    pub static ref MARKER_PREFIX: Vec<u8> = {
        let mut prefix = Vec::with_capacity(8);
        prefix.extend_from_slice(&MARKER_MAGIC.to_le_bytes());
        prefix.extend_from_slice(&MARKER_VERSION.to_le_bytes());
        prefix
    };
}

/// Presence marker, all the state that survives a restart. `n_rows`
/// is the allocated row count at last seal; the root pointer is
/// reserved and always zero in version 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub n_rows: u32,
}

impl Marker {
    pub fn new(n_rows: u32) -> Marker {
        Marker { n_rows }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = MARKER_PREFIX.clone();
        buf.extend_from_slice(&0_u32.to_le_bytes());
        buf.extend_from_slice(&self.n_rows.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Marker> {
        if buf.len() < MARKER_LEN {
            return err_at!(DecodeFail, msg: "marker block {}/{} bytes", buf.len(), MARKER_LEN);
        }
        let magic = u32::from_le_bytes(err_at!(FailConvert, buf[0..4].try_into())?);
        if magic != MARKER_MAGIC {
            return err_at!(DecodeFail, msg: "bad marker magic {:x}", magic);
        }
        let version = u32::from_le_bytes(err_at!(FailConvert, buf[4..8].try_into())?);
        if version != MARKER_VERSION {
            return err_at!(DecodeFail, msg: "marker version {} unsupported", version);
        }
        let root = u32::from_le_bytes(err_at!(FailConvert, buf[8..12].try_into())?);
        if root != 0 {
            return err_at!(DecodeFail, msg: "reserved root pointer {:x}", root);
        }
        let n_rows = u32::from_le_bytes(err_at!(FailConvert, buf[12..16].try_into())?);
        Ok(Marker { n_rows })
    }
}

#[cfg(test)]
#[path = "marker_test.rs"]
mod marker_test;
