//! Parameter address table
//!
//! Every addressable byte of a Reface DX voice, in the order the bytes are
//! stored in a [`PatchImage`](super::PatchImage). Addresses follow the
//! Reface DX MIDI reference: voice common data lives at `30 00 xx`, the four
//! operators at `31 0n xx`.

use std::fmt;
use std::ops::Range;

/// Length of the voice name block
pub const NAME_LEN: usize = 10;

/// Number of voice common parameters after the name
pub const COMMON_LEN: usize = 23;

/// Parameters per operator
pub const OPERATOR_LEN: usize = 25;

/// Number of FM operators
pub const OPERATOR_COUNT: usize = 4;

/// Bytes in one voice
pub const PATCH_SIZE: usize = NAME_LEN + COMMON_LEN + OPERATOR_COUNT * OPERATOR_LEN;

/// Table indices of the name block
pub const NAME_RANGE: Range<usize> = 0..NAME_LEN;

/// Table indices of the voice common block
pub const COMMON_RANGE: Range<usize> = NAME_LEN..NAME_LEN + COMMON_LEN;

const COMMON_GROUP: u8 = 0x30;
const OPERATOR_GROUP: u8 = 0x31;
// 0x0A and 0x0B are reserved in the common block
const COMMON_FIRST_OFFSET: u8 = 0x0C;

/// Device-side location of one parameter byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterAddress {
    pub group: u8,
    pub sub: u8,
    pub offset: u8,
}

impl ParameterAddress {
    pub const fn new(group: u8, sub: u8, offset: u8) -> Self {
        Self { group, sub, offset }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.group, self.sub, self.offset]
    }
}

impl fmt::Display for ParameterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X} {:02X}", self.group, self.sub, self.offset)
    }
}

/// Which block of the voice a table entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterBlock {
    Name,
    Common,
    /// Operator number, 1-4
    Operator(u8),
}

impl fmt::Display for ParameterBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterBlock::Name => write!(f, "Name"),
            ParameterBlock::Common => write!(f, "Common"),
            ParameterBlock::Operator(n) => write!(f, "Operator {}", n),
        }
    }
}

/// Table indices of operator `n` (1-4)
///
/// # Panics
/// If `n` is not in `1..=4`.
pub fn operator_range(n: usize) -> Range<usize> {
    assert!(
        (1..=OPERATOR_COUNT).contains(&n),
        "operator number out of range: {}",
        n
    );
    let start = COMMON_RANGE.end + (n - 1) * OPERATOR_LEN;
    start..start + OPERATOR_LEN
}

const fn build_table() -> [ParameterAddress; PATCH_SIZE] {
    let mut table = [ParameterAddress::new(0, 0, 0); PATCH_SIZE];
    let mut i = 0;

    while i < NAME_LEN {
        table[i] = ParameterAddress::new(COMMON_GROUP, 0x00, i as u8);
        i += 1;
    }

    let mut k = 0;
    while k < COMMON_LEN {
        table[i] = ParameterAddress::new(COMMON_GROUP, 0x00, COMMON_FIRST_OFFSET + k as u8);
        i += 1;
        k += 1;
    }

    let mut op = 0;
    while op < OPERATOR_COUNT {
        let mut k = 0;
        while k < OPERATOR_LEN {
            table[i] = ParameterAddress::new(OPERATOR_GROUP, op as u8, k as u8);
            i += 1;
            k += 1;
        }
        op += 1;
    }

    table
}

static ADDRESSES: [ParameterAddress; PATCH_SIZE] = build_table();

/// The ordered parameter table
///
/// Zero-sized handle onto a table computed at compile time; index `i`
/// always addresses byte `i` of a patch image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterTable;

impl ParameterTable {
    pub fn new() -> Self {
        ParameterTable
    }

    pub fn len(&self) -> usize {
        PATCH_SIZE
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<ParameterAddress> {
        ADDRESSES.get(index).copied()
    }

    pub fn as_slice(&self) -> &'static [ParameterAddress] {
        &ADDRESSES
    }

    /// Entries of a sub-range, paired with their table index
    pub fn entries(
        &self,
        range: Range<usize>,
    ) -> impl Iterator<Item = (usize, ParameterAddress)> + 'static {
        let start = range.start;
        ADDRESSES[range]
            .iter()
            .copied()
            .enumerate()
            .map(move |(i, addr)| (start + i, addr))
    }

    /// Block a table index belongs to
    pub fn block_of(&self, index: usize) -> Option<ParameterBlock> {
        if NAME_RANGE.contains(&index) {
            Some(ParameterBlock::Name)
        } else if COMMON_RANGE.contains(&index) {
            Some(ParameterBlock::Common)
        } else if index < PATCH_SIZE {
            let op = (index - COMMON_RANGE.end) / OPERATOR_LEN + 1;
            Some(ParameterBlock::Operator(op as u8))
        } else {
            None
        }
    }

    /// All blocks with their index ranges, in table order
    pub fn blocks(&self) -> Vec<(ParameterBlock, Range<usize>)> {
        let mut blocks = vec![
            (ParameterBlock::Name, NAME_RANGE),
            (ParameterBlock::Common, COMMON_RANGE),
        ];
        for n in 1..=OPERATOR_COUNT {
            blocks.push((ParameterBlock::Operator(n as u8), operator_range(n)));
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_table_length() {
        assert_eq!(PATCH_SIZE, 133);
        assert_eq!(ParameterTable::new().len(), 133);
        assert_eq!(ParameterTable::new().as_slice().len(), 133);
    }

    #[test_case(1, 33..58)]
    #[test_case(2, 58..83)]
    #[test_case(3, 83..108)]
    #[test_case(4, 108..133)]
    fn test_operator_ranges(n: usize, expected: Range<usize>) {
        assert_eq!(operator_range(n), expected);
    }

    #[test]
    #[should_panic]
    fn test_operator_zero_panics() {
        operator_range(0);
    }

    #[test]
    fn test_block_boundaries() {
        let table = ParameterTable::new();
        assert_eq!(table.get(0), Some(ParameterAddress::new(0x30, 0x00, 0x00)));
        assert_eq!(table.get(9), Some(ParameterAddress::new(0x30, 0x00, 0x09)));
        assert_eq!(table.get(10), Some(ParameterAddress::new(0x30, 0x00, 0x0C)));
        assert_eq!(table.get(32), Some(ParameterAddress::new(0x30, 0x00, 0x22)));
        assert_eq!(table.get(33), Some(ParameterAddress::new(0x31, 0x00, 0x00)));
        assert_eq!(table.get(57), Some(ParameterAddress::new(0x31, 0x00, 0x18)));
        assert_eq!(table.get(58), Some(ParameterAddress::new(0x31, 0x01, 0x00)));
        assert_eq!(table.get(108), Some(ParameterAddress::new(0x31, 0x03, 0x00)));
        assert_eq!(table.get(132), Some(ParameterAddress::new(0x31, 0x03, 0x18)));
        assert_eq!(table.get(133), None);
    }

    #[test_case(0, ParameterBlock::Name)]
    #[test_case(9, ParameterBlock::Name)]
    #[test_case(10, ParameterBlock::Common)]
    #[test_case(32, ParameterBlock::Common)]
    #[test_case(33, ParameterBlock::Operator(1))]
    #[test_case(82, ParameterBlock::Operator(2))]
    #[test_case(83, ParameterBlock::Operator(3))]
    #[test_case(132, ParameterBlock::Operator(4))]
    fn test_block_of(index: usize, expected: ParameterBlock) {
        assert_eq!(ParameterTable::new().block_of(index), Some(expected));
    }

    #[test]
    fn test_addresses_unique() {
        let table = ParameterTable::new();
        let unique: std::collections::HashSet<_> = table.as_slice().iter().collect();
        assert_eq!(unique.len(), PATCH_SIZE);
    }

    #[test]
    fn test_entries_carry_table_index() {
        let table = ParameterTable::new();
        let entries: Vec<_> = table.entries(operator_range(2)).collect();
        assert_eq!(entries.len(), OPERATOR_LEN);
        assert_eq!(entries[0], (58, ParameterAddress::new(0x31, 0x01, 0x00)));
    }

    #[test]
    fn test_blocks_cover_table() {
        let total: usize = ParameterTable::new()
            .blocks()
            .iter()
            .map(|(_, r)| r.len())
            .sum();
        assert_eq!(total, PATCH_SIZE);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(ParameterAddress::new(0x31, 0x02, 0x0A).to_string(), "31 02 0A");
    }
}
