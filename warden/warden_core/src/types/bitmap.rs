//! A set of small non-negative integers.
//!
//! Privileges and roles are stored as bitmaps. Only three operations
//! matter to the rest of the system: membership test, union and deep
//! copy (`Clone`). Everything else is convenience.

use serde::{Deserialize, Serialize};
use std::fmt;

const WORD_BITS: u32 = 64;

/// A growable bitset over `u32` members.
///
/// The word vector never carries trailing zero words, so two bitmaps with
/// the same members compare equal.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct Bitmap {
    words: Vec<u64>,
}

impl Bitmap {
    /// Create an empty bitmap.
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Add a member. Returns `true` if it was not already present.
    pub fn insert(&mut self, bit: u32) -> bool {
        let (word, mask) = Self::locate(bit);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_set = self.words[word] & mask != 0;
        self.words[word] |= mask;
        !was_set
    }

    /// Remove a member. Returns `true` if it was present.
    pub fn remove(&mut self, bit: u32) -> bool {
        let (word, mask) = Self::locate(bit);
        match self.words.get_mut(word) {
            Some(w) if *w & mask != 0 => {
                *w &= !mask;
                self.trim();
                true
            }
            _ => false,
        }
    }

    /// Membership test.
    pub fn contains(&self, bit: u32) -> bool {
        let (word, mask) = Self::locate(bit);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Add every member of `other` to this bitmap.
    pub fn union_with(&mut self, other: &Bitmap) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            *mine |= theirs;
        }
    }

    /// The union of two bitmaps as a new bitmap.
    pub fn union(&self, other: &Bitmap) -> Bitmap {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the bitmap has no members.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..WORD_BITS)
                .filter(move |b| word & (1u64 << b) != 0)
                .map(move |b| i as u32 * WORD_BITS + b)
        })
    }

    fn locate(bit: u32) -> (usize, u64) {
        ((bit / WORD_BITS) as usize, 1u64 << (bit % WORD_BITS))
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl FromIterator<u32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut bitmap = Bitmap::new();
        for bit in iter {
            bitmap.insert(bit);
        }
        bitmap
    }
}

impl From<Vec<u32>> for Bitmap {
    fn from(bits: Vec<u32>) -> Self {
        bits.into_iter().collect()
    }
}

impl From<Bitmap> for Vec<u32> {
    fn from(bitmap: Bitmap) -> Self {
        bitmap.iter().collect()
    }
}

impl<const N: usize> From<[u32; N]> for Bitmap {
    fn from(bits: [u32; N]) -> Self {
        bits.into_iter().collect()
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for bit in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", bit)?;
            first = false;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let mut bitmap = Bitmap::new();
        assert!(bitmap.is_empty());
        assert!(bitmap.insert(5));
        assert!(!bitmap.insert(5));
        assert!(bitmap.insert(130));

        assert!(bitmap.contains(5));
        assert!(bitmap.contains(130));
        assert!(!bitmap.contains(6));
        assert!(!bitmap.contains(100_000));
        assert_eq!(bitmap.len(), 2);
    }

    #[test]
    fn test_union() {
        let a = Bitmap::from([1, 2, 3]);
        let b = Bitmap::from([3, 200]);
        let c = a.union(&b);

        assert_eq!(c.iter().collect::<Vec<_>>(), vec![1, 2, 3, 200]);
        // Operands are untouched
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_remove_normalizes() {
        let mut a = Bitmap::from([1, 300]);
        assert!(a.remove(300));
        assert!(!a.remove(300));
        assert_eq!(a, Bitmap::from([1]));

        a.remove(1);
        assert!(a.is_empty());
        assert_eq!(a, Bitmap::new());
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Bitmap::from([7]);
        let mut copy = original.clone();
        copy.insert(8);

        assert!(!original.contains(8));
        assert!(copy.contains(7));
    }

    #[test]
    fn test_serialization() {
        let bitmap = Bitmap::from([9, 1, 64]);
        let json = serde_json::to_string(&bitmap).unwrap();
        assert_eq!(json, "[1,9,64]");

        let parsed: Bitmap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bitmap);
        assert_eq!(bitmap.to_string(), "{1,9,64}");
    }
}
