// Arbor: a stochastic binary-tree step sequencer engine.
//
// A walker over a fixed 36-node triangular graph: one node per position in
// 8 rows, where every internal node carries the probability of taking the
// "down" branch towards the next row. Each clock tick the engine consumes a
// step command, recomputes the exact reach-probability of every node from
// the live edge weights, advances the walk (randomly or forced), and maps
// the arrival node's raw value to a scaled, optionally quantized, slewed
// output voltage with per-node gates.
//
// Architecture:
// - graph.rs: the fixed triangular tree shape (row starts, child indices)
// - prob.rs: exact reach-probability propagation from the 28 edge weights
// - quantizer.rs: scale/key masks, nearest-note snapping, degree stepping
// - traversal.rs: walk state (step, node, path history) and hop logic
// - output.rs: voltage windowing, range modes, slide (portamento)
// - edit.rs: atomic bulk randomize/reset with undo snapshots
// - engine.rs: the owned aggregate and the per-tick pipeline
//
// The engine is deterministic given a seed, supporting reproducible output.
// There is no ambient state: everything lives in `engine::Engine`.

pub mod edit;
pub mod engine;
pub mod graph;
pub mod output;
pub mod prob;
pub mod quantizer;
pub mod traversal;
