//! Constant-time equality.
//!
//! Every comparison touching keys, tags, measurements or report bytes goes
//! through [`ct_eq`]. Slice `==` short-circuits on the first differing byte
//! and must not be used for those.

use subtle::ConstantTimeEq;

/// Compare two byte strings in time independent of their contents.
///
/// Lengths are not secret: slices of different length compare unequal
/// immediately.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
