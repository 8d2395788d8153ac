#![forbid(unsafe_code)]

//! Deterministic ordering of scheduling units.
//!
//! Produces one topological order of the condensed graph, selected by a
//! fixed rule rather than an arbitrary valid order: a depth-first
//! reverse-postorder with entry points taken in reverse declaration order
//! and successors iterated in reverse insertion order. Reversing the
//! postorder lists independent roots in declaration order and exhausts a
//! join's entire build-side chain before its probe-side chain, instead of
//! interleaving the two breadth-first.

use crate::schedule::condense::CondensedGraph;

/// Returns unit indices in schedule order. Pure function of the condensed
/// graph; panics if the graph is cyclic (a condensation bug upstream).
pub(crate) fn sequence(condensed: &CondensedGraph) -> Vec<usize> {
    let n = condensed.len();
    let mut visited = vec![false; n];
    let mut postorder = Vec::with_capacity(n);
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for entry in (0..n).rev() {
        if visited[entry] {
            continue;
        }
        visited[entry] = true;
        frames.push((entry, 0));
        while let Some(frame) = frames.last_mut() {
            let unit = frame.0;
            let child = frame.1;
            frame.1 += 1;

            let successors = condensed.out(unit);
            if child == successors.len() {
                frames.pop();
                postorder.push(unit);
                continue;
            }
            // Reverse insertion order; undone by the final reversal.
            let succ = successors[successors.len() - 1 - child];
            if !visited[succ] {
                visited[succ] = true;
                frames.push((succ, 0));
            }
        }
    }

    postorder.reverse();

    // Reverse postorder of a DAG is a topological order; a violated edge
    // here means the condensed graph still contained a cycle.
    let mut position = vec![0; n];
    for (pos, &unit) in postorder.iter().enumerate() {
        position[unit] = pos;
    }
    for unit in 0..n {
        for &succ in condensed.out(unit) {
            assert!(
                position[unit] < position[succ],
                "condensed dependency graph must be acyclic"
            );
        }
    }

    postorder
}
