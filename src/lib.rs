//! Biscuit implement an in-memory secondary index for SQL wildcard
//! matching, `LIKE` and `ILIKE` with `%` and `_`, over rows of a
//! tabular store.
//!
//! The index keeps, for every indexed column, bitmaps of row-ids keyed
//! by `(byte-value, character-position)`, in a case-sensitive and a
//! case-insensitive half, along with exact-length and length-at-least
//! bitmaps. Wildcard patterns are answered by intersecting those
//! bitmaps; only the `%pattern%` substring shape falls back to
//! verifying candidate rows against their cached bytes.
//!
//! Position arithmetic is in *characters*, never bytes. Multi-byte
//! utf8 characters contribute every one of their bytes at the same
//! character position, and matching a multi-byte literal intersects
//! all of its per-byte bitmaps at that position. Malformed utf8 is
//! tolerated, unclassifiable bytes count as one-character bytes.
//!
//! Nothing but a small presence [Marker] is persisted. On the first
//! operation after startup the [Registry] rebuilds the whole index by
//! replaying the row source.

use std::result;

/// Short form to compose Error values.
///
/// Here are few possible ways:
///
/// ```ignore
/// use crate::Error;
/// err_at!(Fatal, msg: "fatal message")
/// ```
///
/// ```ignore
/// use crate::Error;
/// err_at!(DecodeFail, std::io::read(buf))
/// ```
///
/// ```ignore
/// use crate::Error;
/// err_at!(FailConvert, std::io::read(buf), "with remarks")
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err($crate::Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

pub mod bitmaps;
mod charpos;
mod collect;
mod column;
pub mod db;
mod error;
mod index;
mod marker;
mod matcher;
mod pattern;
pub mod plan;
mod registry;
pub mod utf8;

pub use crate::db::{Operator, Predicate, QueryOpts, Tid};
pub use crate::error::Error;
pub use crate::index::{Index, Stats};
pub use crate::marker::{Marker, MARKER_LEN, MARKER_MAGIC, MARKER_VERSION};
pub use crate::registry::Registry;

/// Type alias for Result return type, used across this package.
pub type Result<T> = result::Result<T, Error>;

/// Tombstone cardinality at which the tombstones bitmap is reset to
/// empty. Every delete batch settles its own bitmap debt eagerly, the
/// reset only drops the mask queries apply.
pub const TOMBSTONE_RESET_THRESHOLD: usize = 1000;

/// Result size above which tid ordering switches from comparison sort
/// to counting/radix sort on block number.
pub const RADIX_SORT_THRESHOLD: usize = 5000;

/// Result size at which materialization fans out to a small worker
/// pool, 2 workers below 100_000 rows and 4 above.
pub const PARALLEL_MATERIALIZE_MIN: usize = 10_000;

/// Bitmap backend selected by the `croaring` feature.
#[cfg(feature = "croaring")]
pub type DefaultBitmap = bitmaps::CRoaring;
/// Bitmap backend selected by the `croaring` feature.
#[cfg(not(feature = "croaring"))]
pub type DefaultBitmap = bitmaps::DenseBitmap;
