// Walk state: where the sequencer is in the tree and how it got there.
//
// The walk tracks the current row (`step`), the current node, the node it
// departed last (`last_node`; the edge weight consumed by the next hop
// belongs to the node being left behind), and the per-row path history that
// makes stepping back possible. The caller owns row arithmetic: it bumps
// `step` first, then asks for one hop into that row.
//
// Stepping back restores the recorded node for the revisited row exactly,
// but the random stream is never rewound; re-advancing from a revisited row
// draws fresh values. Each pass is fresh; only the recorded path is
// authoritative for rows already visited.

use arbor_prng::TreeRng;
use serde::{Deserialize, Serialize};

use crate::graph::{self, BRANCH_NODES, NODES, ROWS};

/// Forced branch direction for the up/down step commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Up,
    Down,
}

/// Path history at the start of a pass: the root visited, nothing else.
pub const START_PATH: [i32; ROWS] = [0, -1, -1, -1, -1, -1, -1, -1];

/// Position and history of the walk through the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walk {
    /// Current row, 0-based.
    pub step: usize,
    /// Current node index.
    pub node: usize,
    /// The node departed by the most recent hop; selects the edge weight
    /// for the next one.
    pub last_node: usize,
    /// Node visited at each row this pass, -1 where the row has not been
    /// reached.
    pub path: [i32; ROWS],
}

impl Default for Walk {
    fn default() -> Self {
        Walk {
            step: 0,
            node: 0,
            last_node: 0,
            path: START_PATH,
        }
    }
}

impl Walk {
    /// Return to the root with an empty history.
    pub fn reset(&mut self) {
        *self = Walk::default();
    }

    /// One hop into the row `self.step` currently points at.
    ///
    /// At row 0 the walk (re)enters the root. Otherwise the branch taken
    /// from the departed node is decided by one PRNG draw against that
    /// node's edge weight (a draw below the weight goes down), unless a
    /// forced direction bypasses the draw. The arrival node is recorded in
    /// the path and becomes the next hop's departure point.
    pub fn advance(
        &mut self,
        weights: &[f32; BRANCH_NODES],
        rng: &mut TreeRng,
        forced: Option<Branch>,
    ) {
        if self.step == 0 {
            self.node = 0;
        } else if let Some(branch) = forced {
            self.node = self.forced_destination(branch);
        } else {
            let weight = weights
                .get(self.last_node)
                .copied()
                .unwrap_or(0.5)
                .clamp(0.0, 1.0);
            self.node = if rng.uniform() < weight {
                graph::down_child(self.node, self.step - 1)
            } else {
                graph::up_child(self.node, self.step - 1)
            };
        }
        self.node = self.node.min(NODES - 1);
        self.path[self.step.min(ROWS - 1)] = self.node as i32;
        self.last_node = self.node;
    }

    // A forced hop into row 1 goes to a fixed destination: the child
    // formula is only valid once the walk has re-entered the root, which a
    // forced step taken right after a wrap may precede.
    fn forced_destination(&self, branch: Branch) -> usize {
        if self.step == 1 {
            match branch {
                Branch::Up => 1,
                Branch::Down => 2,
            }
        } else {
            match branch {
                Branch::Up => graph::up_child(self.node, self.step - 1),
                Branch::Down => graph::down_child(self.node, self.step - 1),
            }
        }
    }

    /// Retreat one row, restoring the node recorded there and invalidating
    /// the history beyond it. No-op at the root.
    pub fn step_back(&mut self) {
        if self.step == 0 {
            return;
        }
        if self.step < ROWS {
            self.path[self.step] = -1;
        }
        self.step -= 1;
        let recorded = self.path[self.step];
        self.node = if recorded >= 0 { recorded as usize } else { 0 };
        self.last_node = self.node;
    }
}
