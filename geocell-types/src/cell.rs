use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Hierarchical cell address: four Hilbert digits plus a depth.
///
/// Digit `i` is the Hilbert-curve position (0..=255) inside the 16×16 grid
/// of level `i + 1`. Only the first `depth` digits are significant and the
/// rest are always zero, so a cell of depth `d < 4` is the ancestor of every
/// leaf whose leading `d` digits match.
///
/// Cells order by their big-endian digit code first and depth second, which
/// places an ancestor immediately before its first descendant.
///
/// # Examples
///
/// ```
/// use geocell_types::cell::SpatialCell;
///
/// let leaf = SpatialCell::from_code(0x6ca5f92a);
/// let parent = leaf.with_depth(2).unwrap();
/// assert_eq!(parent.code(), 0x6ca50000);
/// assert!(parent.contains(&leaf));
/// assert!(parent < leaf);
/// assert_eq!(leaf.to_string(), "6ca5f92a04");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialCell {
    digits: [u8; 4],
    depth: u8,
}

impl SpatialCell {
    /// Number of digits, and the depth of a leaf.
    pub const SIZE: u8 = 4;

    /// Build a cell, zeroing digits past `depth`. `None` if depth is not 1..=4.
    pub fn new(digits: [u8; 4], depth: u8) -> Option<Self> {
        if !(1..=Self::SIZE).contains(&depth) {
            return None;
        }
        let mut cell = Self { digits, depth };
        for d in cell.digits.iter_mut().skip(depth as usize) {
            *d = 0;
        }
        Some(cell)
    }

    /// Leaf cell with the given 32-bit code.
    pub const fn from_code(code: u32) -> Self {
        Self {
            digits: code.to_be_bytes(),
            depth: Self::SIZE,
        }
    }

    /// Smallest leaf.
    pub const fn min() -> Self {
        Self::from_code(0)
    }

    /// Largest leaf.
    pub const fn max() -> Self {
        Self::from_code(u32::MAX)
    }

    pub fn code(&self) -> u32 {
        u32::from_be_bytes(self.digits)
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.depth == Self::SIZE
    }

    pub fn digit(&self, i: usize) -> u8 {
        self.digits[i]
    }

    pub fn digits(&self) -> [u8; 4] {
        self.digits
    }

    /// Same leading digits at another depth, trailing digits zeroed.
    pub fn with_depth(&self, depth: u8) -> Option<Self> {
        Self::new(self.digits, depth)
    }

    /// Enclosing cell one level up, `None` at depth 1.
    pub fn parent(&self) -> Option<Self> {
        if self.depth > 1 {
            self.with_depth(self.depth - 1)
        } else {
            None
        }
    }

    /// Number of leaves under a cell of the given depth.
    pub const fn leaf_span(depth: u8) -> u64 {
        1u64 << (8 * (Self::SIZE - depth) as u32)
    }

    /// First leaf covered by this cell.
    pub fn lower(&self) -> SpatialCell {
        Self::from_code(self.code())
    }

    /// Last leaf covered by this cell.
    pub fn upper(&self) -> SpatialCell {
        let last = self.code() as u64 + Self::leaf_span(self.depth) - 1;
        Self::from_code(last as u32)
    }

    /// True when the leading digits agree up to the smaller depth.
    pub fn intersects(&self, other: &SpatialCell) -> bool {
        let d = self.depth.min(other.depth) as usize;
        self.digits[..d] == other.digits[..d]
    }

    /// True when `other` lies inside this cell.
    pub fn contains(&self, other: &SpatialCell) -> bool {
        self.depth <= other.depth && self.intersects(other)
    }

    /// Parse the 10-hex-digit form produced by `Display`: 4 digit bytes then depth.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != 10 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 5];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).ok()?;
        }
        let cell = Self::new([bytes[0], bytes[1], bytes[2], bytes[3]], bytes[4])?;
        if cell.digits != [bytes[0], bytes[1], bytes[2], bytes[3]] {
            return None;
        }
        Some(cell)
    }
}

impl Default for SpatialCell {
    fn default() -> Self {
        Self::min()
    }
}

impl Ord for SpatialCell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digits
            .cmp(&other.digits)
            .then(self.depth.cmp(&other.depth))
    }
}

impl PartialOrd for SpatialCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SpatialCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.digits {
            write!(f, "{:02x}", d)?;
        }
        write!(f, "{:02x}", self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_tail() {
        let cell = SpatialCell::new([1, 2, 3, 4], 2).unwrap();
        assert_eq!(cell.digits(), [1, 2, 0, 0]);
        assert_eq!(cell.code(), 0x0102_0000);
        assert!(SpatialCell::new([1, 2, 3, 4], 0).is_none());
        assert!(SpatialCell::new([1, 2, 3, 4], 5).is_none());
    }

    #[test]
    fn test_ordering_by_code_then_depth() {
        let a = SpatialCell::new([0, 0, 0, 0], 1).unwrap();
        let b = SpatialCell::min();
        assert_ne!(a, b);
        assert!(a < b);
        assert!(SpatialCell::from_code(1) < SpatialCell::from_code(2));
        assert!(SpatialCell::from_code(0x0100_0000) > SpatialCell::new([0, 255, 0, 0], 2).unwrap());
        assert!(SpatialCell::min() < SpatialCell::max());
    }

    #[test]
    fn test_parse_hex() {
        let cell = SpatialCell::parse_hex("6ca5f92a04").unwrap();
        assert_eq!(cell.digits(), [108, 165, 249, 42]);
        assert_eq!(cell.depth(), 4);
        assert_eq!(cell.to_string(), "6ca5f92a04");

        assert!(SpatialCell::parse_hex("6ca5f92a").is_none());
        assert!(SpatialCell::parse_hex("6ca5f92a05").is_none());
        assert!(SpatialCell::parse_hex("6ca5f92a02").is_none());
        assert!(SpatialCell::parse_hex("6ca5000002").is_some());
    }

    #[test]
    fn test_lower_upper() {
        let cell = SpatialCell::new([7, 9, 0, 0], 2).unwrap();
        assert_eq!(cell.lower().code(), 0x0709_0000);
        assert_eq!(cell.upper().code(), 0x0709_ffff);
        assert_eq!(SpatialCell::leaf_span(1), 1 << 24);
        assert_eq!(SpatialCell::leaf_span(4), 1);
        let top = SpatialCell::new([255, 0, 0, 0], 1).unwrap();
        assert_eq!(top.upper(), SpatialCell::max());
    }

    #[test]
    fn test_intersects_and_contains() {
        let leaf = SpatialCell::from_code(0x0102_0304);
        let parent = leaf.parent().unwrap();
        assert_eq!(parent.depth(), 3);
        assert!(parent.intersects(&leaf));
        assert!(leaf.intersects(&parent));
        assert!(parent.contains(&leaf));
        assert!(!leaf.contains(&parent));
        assert!(!SpatialCell::from_code(0x0102_0305).intersects(&leaf));
        assert!(SpatialCell::new([1, 0, 0, 0], 1).unwrap().parent().is_none());
    }
}
