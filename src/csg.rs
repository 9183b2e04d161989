//! Connected-subgraph (CSG) enumeration over a join graph's adjacency (§4.5).
//!
//! Grounded directly on `query_slicer.cpp`'s `emit_CSG_queries`: a queue of
//! `(S, X)` pairs, one descending seed per source index, subsets of the
//! candidate extension enumerated via [`least_subset`]/[`next_subset`].

use crate::adjacency::{least_subset, next_subset, AdjacencyMatrix, Subproblem};
use std::collections::VecDeque;

/// Iterator over every connected induced subgraph of an [`AdjacencyMatrix`],
/// each emitted exactly once, in the deterministic order fixed by §4.5:
/// descending seed index, queue (BFS) order, then Gosper subset order.
pub struct CsgEnumerator<'m> {
    matrix: &'m AdjacencyMatrix,
    next_seed: i64,
    queue: VecDeque<(Subproblem, Subproblem)>,
}

impl<'m> CsgEnumerator<'m> {
    pub fn new(matrix: &'m AdjacencyMatrix) -> Self {
        let next_seed = matrix.len() as i64 - 1;
        let mut enumerator = Self {
            matrix,
            next_seed,
            queue: VecDeque::new(),
        };
        enumerator.seed_next();
        enumerator
    }

    fn seed_next(&mut self) {
        if self.next_seed < 0 {
            return;
        }
        let i = self.next_seed as u32;
        self.next_seed -= 1;
        let s0 = Subproblem::singleton(i);
        let x0 = s0.singleton_to_lo_mask();
        self.queue.push_back((s0, x0));
    }
}

impl Iterator for CsgEnumerator<'_> {
    type Item = Subproblem;

    fn next(&mut self) -> Option<Subproblem> {
        while self.queue.is_empty() {
            if self.next_seed < 0 {
                return None;
            }
            self.seed_next();
        }
        let (s, x) = self.queue.pop_front().unwrap();

        let extension = self.matrix.neighbors(s) - x - s;
        if !extension.is_empty() {
            let new_x = x | extension;
            let mut n = least_subset(extension);
            while !n.is_empty() {
                self.queue.push_back((s | n, new_x));
                n = next_subset(n, extension);
            }
        }
        tracing::trace!(bits = s.bits(), extension = extension.bits(), queued = self.queue.len(), "emitted subproblem");

        if self.queue.is_empty() {
            self.seed_next();
        }
        Some(s)
    }
}
