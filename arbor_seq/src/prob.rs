// Exact reach-probability propagation.
//
// Given the 28 edge weights (probability of the down branch at each
// branching node), computes the probability that each of the 36 nodes is
// visited during one pass. This is a pure function of the current weights,
// recomputed every tick; there is no incremental state to invalidate.
//
// The root is always visited. A node in row r receives probability mass
// from up to two parents in row r-1: its down-parent routes into it with
// the parent's weight, its up-parent with the weight's complement. Edge
// nodes of a row only have one parent. Since every parent splits its whole
// mass between its two children, each row sums to 1.

use crate::graph::{BRANCH_NODES, NODES, ROW_START, ROWS};

/// Compute the reach probability of every node from the edge weights.
///
/// `out[0]` is always 1. Weights at exactly 0 or 1 propagate exact zeros
/// into the unreachable sibling subtree; no epsilon is involved anywhere.
pub fn reach_probabilities(weights: &[f32; BRANCH_NODES]) -> [f32; NODES] {
    let mut out = [0.0f32; NODES];
    out[0] = 1.0;
    for r in 1..ROWS {
        for i in 0..=r {
            let mut p = 0.0;
            if i > 0 {
                // Down-parent: position i-1 in the previous row.
                let parent = ROW_START[r - 1] + i - 1;
                p += out[parent] * weights[parent];
            }
            if i < r {
                // Up-parent: position i in the previous row.
                let parent = ROW_START[r - 1] + i;
                p += out[parent] * (1.0 - weights[parent]);
            }
            out[ROW_START[r] + i] = p;
        }
    }
    out
}
