// Bulk edits: whole-vector rewrites with undo snapshots.
//
// Randomize-all and reset-all rewrite every node value or every edge
// weight in one call, atomically within the tick that invokes them. Each
// returns the full before/after vectors so an external undo/redo can
// restore either side verbatim (`Engine::set_values` / `set_weights`)
// without re-deriving anything.
//
// Random draws come from the engine's auxiliary stream, never from the
// branch stream, so a randomize between steps does not change where the
// walk goes next.

use crate::engine::{DEFAULT_VALUE, DEFAULT_WEIGHT, Engine};
use crate::graph::{BRANCH_NODES, NODES};

/// Before/after snapshot of one bulk edit, the unit of undo/redo.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkEdit<const N: usize> {
    pub before: [f32; N],
    pub after: [f32; N],
}

/// Rewrite every node value with a uniform draw in [0, 10).
pub fn randomize_values(engine: &mut Engine) -> BulkEdit<NODES> {
    let before = engine.values;
    for v in engine.values.iter_mut() {
        *v = engine.aux_rng.uniform() * 10.0;
    }
    BulkEdit {
        before,
        after: engine.values,
    }
}

/// Return every node value to the default.
pub fn reset_values(engine: &mut Engine) -> BulkEdit<NODES> {
    let before = engine.values;
    engine.values = [DEFAULT_VALUE; NODES];
    BulkEdit {
        before,
        after: engine.values,
    }
}

/// Rewrite every edge weight with a uniform draw in [0, 1).
pub fn randomize_weights(engine: &mut Engine) -> BulkEdit<BRANCH_NODES> {
    let before = engine.weights;
    for w in engine.weights.iter_mut() {
        *w = engine.aux_rng.uniform();
    }
    BulkEdit {
        before,
        after: engine.weights,
    }
}

/// Return every edge weight to the even default.
pub fn reset_weights(engine: &mut Engine) -> BulkEdit<BRANCH_NODES> {
    let before = engine.weights;
    engine.weights = [DEFAULT_WEIGHT; BRANCH_NODES];
    BulkEdit {
        before,
        after: engine.weights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TickInputs;

    #[test]
    fn randomize_values_stays_in_range() {
        let mut engine = Engine::new(1);
        let edit = randomize_values(&mut engine);
        for &v in &edit.after {
            assert!((0.0..10.0).contains(&v));
        }
        assert_eq!(edit.before, [DEFAULT_VALUE; NODES]);
        assert_ne!(edit.after, edit.before);
    }

    #[test]
    fn randomize_weights_stays_in_range() {
        let mut engine = Engine::new(2);
        let edit = randomize_weights(&mut engine);
        for &w in &edit.after {
            assert!((0.0..1.0).contains(&w));
        }
        assert_eq!(edit.before, [DEFAULT_WEIGHT; BRANCH_NODES]);
    }

    #[test]
    fn undo_restores_the_before_vector() {
        let mut engine = Engine::new(3);
        engine.set_value(7, 1.25);
        let edit = randomize_values(&mut engine);
        engine.set_values(&edit.before);
        assert_eq!(engine.value(7), 1.25);
        // And redo restores the after vector.
        engine.set_values(&edit.after);
        assert_eq!(engine.value(7), edit.after[7]);
    }

    #[test]
    fn reset_weights_returns_to_even_routing() {
        let mut engine = Engine::new(4);
        randomize_weights(&mut engine);
        let edit = reset_weights(&mut engine);
        assert_eq!(edit.after, [DEFAULT_WEIGHT; BRANCH_NODES]);
        assert_eq!(engine.weight(0), DEFAULT_WEIGHT);
    }

    #[test]
    fn value_randomization_leaves_the_walk_alone() {
        // The auxiliary stream feeds bulk edits; the branch stream must
        // not notice. Identical engines, one randomizing its values
        // mid-pass, walk the same path.
        let step = TickInputs {
            dt: 1e-3,
            forward: true,
            ..TickInputs::default()
        };
        let mut a = Engine::new(5);
        let mut b = Engine::new(5);
        for i in 0..16 {
            a.tick(&step);
            b.tick(&step);
            if i == 4 {
                randomize_values(&mut b);
            }
            assert_eq!(a.node(), b.node());
        }
    }
}
