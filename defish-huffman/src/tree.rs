//! Huffman tree construction over an indexed node arena.
//!
//! Nodes live in a flat `Vec` and reference children by index; the tree
//! shape never leaks into any serialized format (the wire carries explicit
//! per-symbol codes instead). Construction repeatedly merges the two
//! lowest-weight roots from a priority queue keyed `(weight, seq)`, where
//! `seq` is the insertion counter: equal weights merge in insertion
//! order, which makes code assignment fully deterministic.

use crate::block::Code;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Arena node: a leaf carries a symbol, an internal node two child indices.
#[derive(Debug, Clone, Copy)]
struct Node {
    symbol: Option<u8>,
    children: Option<(usize, usize)>,
}

/// Derive the symbol→code table for one block.
///
/// `weights` holds `(symbol, frequency)` pairs in first-occurrence order;
/// that order seeds the tie-break sequence, so identical blocks always get
/// identical codes. Codes follow root-to-leaf paths with left=0, right=1.
/// A single-symbol alphabet has no internal branch, so its lone symbol is
/// forced to the one-bit code `0` by convention.
///
/// Returns an empty table for an empty block.
pub fn build_codes(weights: &[(u8, u64)]) -> Vec<(u8, Code)> {
    if weights.is_empty() {
        return Vec::new();
    }

    let mut arena: Vec<Node> = Vec::with_capacity(weights.len() * 2);
    let mut heap: BinaryHeap<Reverse<(u64, u64, usize)>> = BinaryHeap::new();
    let mut seq = 0u64;

    for &(symbol, weight) in weights {
        arena.push(Node {
            symbol: Some(symbol),
            children: None,
        });
        heap.push(Reverse((weight, seq, arena.len() - 1)));
        seq += 1;
    }

    while heap.len() > 1 {
        let (Some(Reverse((weight_a, _, a))), Some(Reverse((weight_b, _, b)))) =
            (heap.pop(), heap.pop())
        else {
            break;
        };
        arena.push(Node {
            symbol: None,
            children: Some((a, b)),
        });
        heap.push(Reverse((weight_a + weight_b, seq, arena.len() - 1)));
        seq += 1;
    }

    let root = match heap.pop() {
        Some(Reverse((_, _, index))) => index,
        None => return Vec::new(),
    };

    let mut table = Vec::with_capacity(weights.len());
    let mut path = Code::new();
    collect(&arena, root, &mut path, &mut table);
    table
}

/// Depth-first walk assigning codes in left-before-right order.
fn collect(arena: &[Node], index: usize, path: &mut Code, table: &mut Vec<(u8, Code)>) {
    let node = arena[index];
    if let Some(symbol) = node.symbol {
        let code = if path.is_empty() {
            // Single-symbol alphabet: force a one-bit code.
            let mut code = Code::new();
            code.push(false);
            code
        } else {
            path.clone()
        };
        table.push((symbol, code));
        return;
    }
    if let Some((left, right)) = node.children {
        path.push(false);
        collect(arena, left, path, table);
        path.pop();
        path.push(true);
        collect(arena, right, path, table);
        path.pop();
    }
}
