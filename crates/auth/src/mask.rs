use serde::{Deserialize, Serialize};

/// Bitmask of capabilities a user holds on one file.
///
/// Wire values are fixed: Read=1, Write=2, Delete=4, Share=8, and 15 means
/// full control. A mask of zero is never stored; the ledger deletes the row
/// instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMask(u8);

impl PermissionMask {
    pub const READ: Self = Self(1);
    pub const WRITE: Self = Self(2);
    pub const DELETE: Self = Self(4);
    pub const SHARE: Self = Self(8);
    pub const FULL_CONTROL: Self = Self(15);

    /// Parse a wire value. Rejects zero and any bit outside the four defined
    /// ones.
    pub fn from_bits(bits: u8) -> Option<Self> {
        if bits == 0 || bits & !Self::FULL_CONTROL.0 != 0 {
            return None;
        }
        Some(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Superset rule: every requested bit must be held. A multi-bit request
    /// is satisfied only by holding all requested bits, not by overlapping.
    pub fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Bitwise OR, used when grants accumulate.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bitwise AND-NOT, used when grants are revoked.
    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// An empty mask means the ledger entry must be deleted, not kept.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for PermissionMask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (bit, name) in [
            (Self::READ, "read"),
            (Self::WRITE, "write"),
            (Self::DELETE, "delete"),
            (Self::SHARE, "share"),
        ] {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wire_values_are_fixed() {
        assert_eq!(PermissionMask::READ.bits(), 1);
        assert_eq!(PermissionMask::WRITE.bits(), 2);
        assert_eq!(PermissionMask::DELETE.bits(), 4);
        assert_eq!(PermissionMask::SHARE.bits(), 8);
        assert_eq!(PermissionMask::FULL_CONTROL.bits(), 15);
    }

    #[test]
    fn from_bits_rejects_zero_and_unknown_bits() {
        assert!(PermissionMask::from_bits(0).is_none());
        assert!(PermissionMask::from_bits(16).is_none());
        assert!(PermissionMask::from_bits(0b1_0001).is_none());
        assert_eq!(PermissionMask::from_bits(3), Some(PermissionMask(3)));
    }

    #[test]
    fn multi_bit_request_needs_every_bit() {
        let held = PermissionMask::READ.union(PermissionMask::WRITE);
        assert!(held.contains(PermissionMask::READ));
        assert!(held.contains(PermissionMask::READ.union(PermissionMask::WRITE)));
        // Overlap is not enough.
        assert!(!held.contains(PermissionMask::READ.union(PermissionMask::DELETE)));
    }

    proptest! {
        #[test]
        fn union_accumulates(a in 1u8..=15, b in 1u8..=15) {
            let a = PermissionMask::from_bits(a).unwrap();
            let b = PermissionMask::from_bits(b).unwrap();
            let merged = a.union(b);
            prop_assert!(merged.contains(a));
            prop_assert!(merged.contains(b));
        }

        #[test]
        fn without_removes_exactly_the_requested_bits(a in 1u8..=15, b in 1u8..=15) {
            let a = PermissionMask::from_bits(a).unwrap();
            let b = PermissionMask::from_bits(b).unwrap();
            let left = a.without(b);
            prop_assert_eq!(left.bits() & b.bits(), 0);
            prop_assert_eq!(left.bits() | (a.bits() & b.bits()), a.bits());
        }

        #[test]
        fn revoking_everything_empties_the_mask(a in 1u8..=15) {
            let a = PermissionMask::from_bits(a).unwrap();
            prop_assert!(a.without(a).is_empty());
        }
    }
}
