//! Module implement adaptors for the two bitmap backends.

#[cfg(feature = "croaring")]
mod croaring;
mod dense;

#[cfg(feature = "croaring")]
pub use self::croaring::CRoaring;
pub use dense::DenseBitmap;
