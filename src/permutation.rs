//! Doubled 256-entry permutation tables for lattice hashing.
//!
//! The table holds a permutation of `0..=255` followed by an exact copy of
//! itself, so a lookup of `p[i] + j` with `i, j <= 255` (and the `+ 1`
//! neighbour) never needs a wrap-around mask.

use std::ops::Index;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Number of distinct entries in a permutation.
pub const PERMUTATION_SIZE: usize = 256;

/// Ken Perlin's published reference permutation.
pub static REFERENCE_PERMUTATION: [u8; PERMUTATION_SIZE] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

/// A permutation of `0..=255`, stored twice back to back (512 bytes).
///
/// Tables are immutable once built. Reseeding a generator replaces its
/// table wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermutationTable {
    values: [u8; PERMUTATION_SIZE * 2],
}

impl PermutationTable {
    /// The reference table, identical for every caller.
    pub fn from_reference() -> Self {
        Self::doubled(REFERENCE_PERMUTATION)
    }

    /// Shuffle the identity permutation with a generator seeded from `seed`.
    ///
    /// The same seed always yields the same table for a given build of this
    /// crate. Tables are not expected to match other Perlin implementations
    /// that use a different shuffle engine.
    pub fn from_seed(seed: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        let mut base: [u8; PERMUTATION_SIZE] = std::array::from_fn(|i| i as u8);
        base.shuffle(&mut rng);
        Self::doubled(base)
    }

    fn doubled(base: [u8; PERMUTATION_SIZE]) -> Self {
        let mut values = [0u8; PERMUTATION_SIZE * 2];
        values[..PERMUTATION_SIZE].copy_from_slice(&base);
        values[PERMUTATION_SIZE..].copy_from_slice(&base);
        let table = Self { values };
        debug_assert!(table.is_valid());
        table
    }

    /// All 512 entries.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    /// Always 512.
    #[inline]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Never true; present for API symmetry with [`len`](Self::len).
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Check that the first half is a permutation of `0..=255` and the second
    /// half mirrors it.
    pub fn is_valid(&self) -> bool {
        let (head, tail) = self.values.split_at(PERMUTATION_SIZE);
        if head != tail {
            return false;
        }
        let mut seen = [false; PERMUTATION_SIZE];
        for &v in head {
            if seen[v as usize] {
                return false;
            }
            seen[v as usize] = true;
        }
        true
    }
}

impl Default for PermutationTable {
    fn default() -> Self {
        Self::from_reference()
    }
}

impl Index<usize> for PermutationTable {
    type Output = u8;

    #[inline]
    fn index(&self, index: usize) -> &u8 {
        &self.values[index]
    }
}
