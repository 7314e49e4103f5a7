//! Huffman tree construction and code assignment (C4).
//!
//! The container never persists the tree itself, only the per-symbol
//! frequency table, so encode and decode must rebuild an identical tree from
//! that table. [`build_tree`] is the single source of truth both sides call;
//! any divergence here would make decode silently produce wrong bytes.

use crate::bitshift::shift_to_msb;

/// Codes are stored as a fixed-width big-endian bit pattern long enough for
/// the degenerate case of 256 equally-weighted symbols (a balanced tree of
/// depth 255 bits, rounded up to whole bytes).
pub const MAX_KEY_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub enum Node {
    Leaf(u8),
    Internal(Box<Node>, Box<Node>),
}

/// A symbol's assigned bit pattern, packed MSB-first into `bytes`. Only the
/// top `used_bits` bits of `bytes` are significant.
#[derive(Debug, Clone, Copy)]
pub struct BinKey {
    pub bytes: [u8; MAX_KEY_BYTES],
    pub used_bits: u32,
}

impl BinKey {
    fn empty() -> Self {
        Self {
            bytes: [0u8; MAX_KEY_BYTES],
            used_bits: 0,
        }
    }

    fn push_bit(&mut self, bit: u8) {
        shift_to_msb(&mut self.bytes, 1);
        if bit != 0 {
            self.bytes[MAX_KEY_BYTES - 1] |= 1;
        }
        self.used_bits += 1;
    }
}

struct Entry {
    weight: u64,
    seq: u32,
    node: Node,
}

/// Finds the index of the lowest `(weight, seq)` entry, breaking ties by the
/// lower sequence number (earlier-created node wins).
fn smallest_index(entries: &[Entry]) -> usize {
    let mut best = 0;
    for (i, e) in entries.iter().enumerate().skip(1) {
        let b = &entries[best];
        if (e.weight, e.seq) < (b.weight, b.seq) {
            best = i;
        }
    }
    best
}

/// Builds the Huffman tree for a frequency table, repeatedly merging the two
/// lowest-weight nodes. Ties resolve by creation order (symbol index for
/// leaves, then allocation order for internal nodes), which is what makes the
/// result identical on every call for the same table.
pub fn build_tree(freq: &[u32; 256]) -> Option<Node> {
    let mut entries: Vec<Entry> = freq
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(symbol, &count)| Entry {
            weight: count as u64,
            seq: symbol as u32,
            node: Node::Leaf(symbol as u8),
        })
        .collect();

    if entries.is_empty() {
        return None;
    }
    if entries.len() == 1 {
        return Some(entries.pop().unwrap().node);
    }

    let mut next_seq = 256u32;
    while entries.len() > 1 {
        let first = smallest_index(&entries);
        let a = entries.remove(first);
        let second = smallest_index(&entries);
        let b = entries.remove(second);

        entries.push(Entry {
            weight: a.weight + b.weight,
            seq: next_seq,
            node: Node::Internal(Box::new(a.node), Box::new(b.node)),
        });
        next_seq += 1;
    }

    Some(entries.pop().unwrap().node)
}

/// Walks the tree assigning a `BinKey` to every leaf. The sole-symbol case is
/// special-cased to a single `1`-bit code: a tree with one leaf has no
/// internal node to walk, so without this the symbol would get a degenerate
/// zero-bit code that can't be told apart from "nothing left to decode".
pub fn assign_codes(root: &Node) -> [Option<BinKey>; 256] {
    let mut codes: [Option<BinKey>; 256] = [None; 256];

    if let Node::Leaf(symbol) = root {
        let mut key = BinKey::empty();
        key.push_bit(0);
        codes[*symbol as usize] = Some(key);
        return codes;
    }

    fn walk(node: &Node, prefix: BinKey, codes: &mut [Option<BinKey>; 256]) {
        match node {
            Node::Leaf(symbol) => codes[*symbol as usize] = Some(prefix),
            Node::Internal(left, right) => {
                let mut left_key = prefix;
                left_key.push_bit(0);
                walk(left, left_key, codes);

                let mut right_key = prefix;
                right_key.push_bit(1);
                walk(right, right_key, codes);
            }
        }
    }

    walk(root, BinKey::empty(), &mut codes);
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq_from(counts: &[(u8, u32)]) -> [u32; 256] {
        let mut freq = [0u32; 256];
        for &(symbol, count) in counts {
            freq[symbol as usize] = count;
        }
        freq
    }

    #[test]
    fn empty_table_has_no_tree() {
        let freq = [0u32; 256];
        assert!(build_tree(&freq).is_none());
    }

    #[test]
    fn single_symbol_gets_one_bit_code() {
        let freq = freq_from(&[(b'A', 7)]);
        let tree = build_tree(&freq).unwrap();
        let codes = assign_codes(&tree);
        let key = codes[b'A' as usize].unwrap();
        assert_eq!(key.used_bits, 1);
    }

    #[test]
    fn more_frequent_symbol_gets_shorter_or_equal_code() {
        let freq = freq_from(&[(b'A', 100), (b'B', 1), (b'C', 1), (b'D', 1)]);
        let tree = build_tree(&freq).unwrap();
        let codes = assign_codes(&tree);
        let a_bits = codes[b'A' as usize].unwrap().used_bits;
        let b_bits = codes[b'B' as usize].unwrap().used_bits;
        assert!(a_bits <= b_bits);
    }

    #[test]
    fn tree_construction_is_deterministic() {
        let freq = freq_from(&[(b'A', 5), (b'B', 5), (b'C', 2), (b'D', 2), (b'E', 1)]);
        let tree_a = build_tree(&freq).unwrap();
        let tree_b = build_tree(&freq).unwrap();
        let codes_a = assign_codes(&tree_a);
        let codes_b = assign_codes(&tree_b);
        for symbol in 0..256 {
            match (codes_a[symbol], codes_b[symbol]) {
                (Some(ka), Some(kb)) => assert_eq!(ka.bytes, kb.bytes),
                (None, None) => {}
                _ => panic!("code presence mismatch for symbol {symbol}"),
            }
        }
    }

    #[test]
    fn every_frequent_symbol_gets_a_distinct_code() {
        let freq = freq_from(&[(b'A', 5), (b'B', 5), (b'C', 2), (b'D', 2), (b'E', 1)]);
        let tree = build_tree(&freq).unwrap();
        let codes = assign_codes(&tree);
        let mut seen = Vec::new();
        for code in codes.iter().flatten() {
            let key = (code.bytes, code.used_bits);
            assert!(!seen.contains(&key), "duplicate code {key:?}");
            seen.push(key);
        }
    }
}
