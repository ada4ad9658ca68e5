// The sequencer engine: one owned aggregate, one pipeline per tick.
//
// Everything lives here: walk state, edge weights, node values, the RNG
// streams, gates, the slew stage and the output config. There is no
// ambient state; callers construct an `Engine`, feed it `TickInputs` once
// per clock tick, and read the outputs back.
//
// Tick order mirrors the sequencer's contract: refresh the reach
// probabilities from the live weights, consume step commands (randomly or
// forced branching, stepping back over recorded history, wrapping at the
// end of the enabled row range), then shape gates and the output voltage.
//
// A reset opens a short settle window during which step commands are
// deferred, not dropped; this avoids racing a reset against a
// simultaneous step trigger.

use arbor_prng::TreeRng;
use serde::{Deserialize, Serialize};

use crate::graph::{BRANCH_NODES, NODES, ROWS};
use crate::output::{self, OutputConfig, Slew};
use crate::prob;
use crate::traversal::{Branch, START_PATH, Walk};

/// Settle time after a reset, in seconds of accumulated tick time.
pub const RESET_SETTLE: f32 = 0.001;

/// Voltage of an active self-timed gate.
pub const GATE_VOLTAGE: f32 = 10.0;

/// Default node value, mid-range.
pub const DEFAULT_VALUE: f32 = 5.0;

/// Default edge weight, even routing.
pub const DEFAULT_WEIGHT: f32 = 0.5;

/// When the branch stream is reseeded from the seed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedMode {
    /// Once per pass, entering row 1.
    FirstNode,
    /// Before every hop, when an external seed source is connected.
    EveryNode,
}

/// Everything the engine consumes on one clock tick. Trigger fields are
/// edge-detected booleans: true on the tick the trigger fired.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInputs {
    /// Seconds elapsed since the previous tick.
    pub dt: f32,
    pub run_toggle: bool,
    pub reset: bool,
    /// Clocked step, honored only while running.
    pub forward: bool,
    /// Manual step, honored even while paused.
    pub manual_forward: bool,
    pub back: bool,
    pub up: bool,
    pub down: bool,
    /// External seed source; `None` = unconnected.
    pub seed: Option<f32>,
    /// External step input voltage; when connected, gates mirror it.
    pub step_voltage: Option<f32>,
}

/// Step commands held back during the reset settle window.
#[derive(Debug, Clone, Copy, Default)]
struct PendingSteps {
    forward: bool,
    manual_forward: bool,
    back: bool,
    up: bool,
    down: bool,
}

impl PendingSteps {
    fn absorb(&mut self, inputs: &TickInputs) {
        self.forward |= inputs.forward;
        self.manual_forward |= inputs.manual_forward;
        self.back |= inputs.back;
        self.up |= inputs.up;
        self.down |= inputs.down;
    }
}

/// The persisted slice of engine state: enough to resume mid-sequence
/// exactly. Missing fields default, out-of-range fields clamp on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    #[serde(default)]
    pub step: i64,
    #[serde(default)]
    pub node: i64,
    #[serde(default)]
    pub last_node: i64,
    #[serde(default)]
    pub last_gate: i64,
    #[serde(default = "start_path")]
    pub path_traveled: [i32; ROWS],
}

fn start_path() -> [i32; ROWS] {
    START_PATH
}

pub struct Engine {
    // Parameters.
    pub(crate) values: [f32; NODES],
    pub(crate) weights: [f32; BRANCH_NODES],
    pub config: OutputConfig,
    pub seed_mode: SeedMode,
    step_first: usize,
    step_last: usize,
    running: bool,

    // Live state.
    walk: Walk,
    probabilities: [f32; NODES],
    random_seed: f32,
    rng: TreeRng,
    seed_rng: TreeRng,
    pub(crate) aux_rng: TreeRng,
    gates: [f32; NODES],
    last_gate: usize,
    slew: Slew,
    output: f32,
    reset_hold: f32,
    pending: PendingSteps,
}

impl Engine {
    /// Build an engine from a master seed. The seed splits into three
    /// independent streams: branch decisions, internal seed refreshes,
    /// and auxiliary draws (bulk randomization), so neither auxiliary
    /// consumer disturbs the branch sequence.
    pub fn new(seed: u64) -> Self {
        let weights = [DEFAULT_WEIGHT; BRANCH_NODES];
        Engine {
            values: [DEFAULT_VALUE; NODES],
            weights,
            config: OutputConfig::default(),
            seed_mode: SeedMode::FirstNode,
            step_first: 1,
            step_last: ROWS,
            running: true,
            walk: Walk::default(),
            probabilities: prob::reach_probabilities(&weights),
            random_seed: 0.0,
            rng: TreeRng::new(seed, 0),
            seed_rng: TreeRng::new(seed, 1),
            aux_rng: TreeRng::new(seed, 2),
            gates: [0.0; NODES],
            last_gate: 0,
            slew: Slew::default(),
            output: 0.0,
            reset_hold: 0.0,
            pending: PendingSteps::default(),
        }
    }

    /// Run the whole pipeline for one clock tick.
    pub fn tick(&mut self, inputs: &TickInputs) {
        if inputs.run_toggle {
            self.running = !self.running;
        }

        // Reach probabilities follow the live weights every tick, before
        // the walk consumes them.
        self.probabilities = prob::reach_probabilities(&self.weights);

        if inputs.reset {
            self.apply_reset();
        }

        if self.reset_hold > 0.0 {
            // Settle window: hold on to step commands, process them once
            // the window closes.
            self.pending.absorb(inputs);
            self.reset_hold -= inputs.dt.max(0.0);
            self.process_output(inputs);
            return;
        }

        let mut steps = std::mem::take(&mut self.pending);
        steps.absorb(inputs);

        let prev_node = self.walk.node;

        if (steps.forward && self.running) || steps.manual_forward {
            self.step_forward(inputs);
        }
        if steps.back {
            self.walk.step_back();
        }
        if steps.up {
            self.step_branch(Branch::Up, inputs);
        }
        if steps.down {
            self.step_branch(Branch::Down, inputs);
        }

        self.process_gates(prev_node, inputs);
        self.process_output(inputs);
    }

    fn step_forward(&mut self, inputs: &TickInputs) {
        self.walk.step += 1;
        if self.out_of_range() {
            self.restart_pass(inputs);
        } else {
            self.hop(inputs, None);
        }
    }

    fn step_branch(&mut self, branch: Branch, inputs: &TickInputs) {
        self.walk.step += 1;
        if self.out_of_range() {
            self.restart_pass(inputs);
        } else {
            self.hop(inputs, Some(branch));
        }
    }

    fn out_of_range(&self) -> bool {
        self.walk.step >= self.step_last || self.walk.step + 1 < self.step_first
    }

    /// Sequence end: snap to the root, then deterministically replay
    /// forward until the walk sits at the first enabled row, consuming
    /// PRNG draws and probability refreshes exactly as normal advances.
    fn restart_pass(&mut self, inputs: &TickInputs) {
        self.walk.reset();
        self.walk.advance(&self.weights, &mut self.rng, None);
        while self.walk.step + 1 < self.step_first {
            self.walk.step += 1;
            self.hop(inputs, None);
        }
    }

    /// One hop into the row `walk.step` points at, with the seed refresh
    /// policy applied first.
    fn hop(&mut self, inputs: &TickInputs, forced: Option<Branch>) {
        let entering_pass = self.walk.step == 1;
        let reseed_every = self.seed_mode == SeedMode::EveryNode && inputs.seed.is_some();
        if entering_pass || reseed_every {
            self.refresh_seed(inputs);
        }
        self.probabilities = prob::reach_probabilities(&self.weights);
        self.walk.advance(&self.weights, &mut self.rng, forced);
    }

    /// A connected, nonzero external seed wins; otherwise draw from the
    /// internal seed stream. The branch stream restarts from the fresh
    /// seed either way.
    fn refresh_seed(&mut self, inputs: &TickInputs) {
        self.random_seed = match inputs.seed {
            Some(v) if v != 0.0 => v,
            _ => self.seed_rng.uniform() * 10.0,
        };
        let bits = u64::from(self.random_seed.to_bits());
        self.rng.reset(bits, bits);
    }

    fn apply_reset(&mut self) {
        self.walk.reset();
        self.gates = [0.0; NODES];
        self.last_gate = 0;
        self.reset_hold = RESET_SETTLE;
    }

    fn process_gates(&mut self, prev_node: usize, inputs: &TickInputs) {
        if let Some(v) = inputs.step_voltage {
            // Externally clocked: the active gate mirrors the input
            // voltage instead of self-timing.
            self.gates[self.walk.node] = v;
        } else {
            self.gates[prev_node] = 0.0;
            self.gates[self.walk.node] = GATE_VOLTAGE;
        }
        self.last_gate = prev_node;
    }

    fn process_output(&mut self, inputs: &TickInputs) {
        let target = output::target_voltage(self.values[self.walk.node], &self.config);
        if target != self.slew.target() {
            self.slew
                .set_target(target, output::slide_duration(self.config.slide));
        }
        self.output = self.slew.tick(inputs.dt.max(0.0));
    }

    // --- Parameter surface. All setters clamp; none can fail. ---

    pub fn value(&self, node: usize) -> f32 {
        self.values.get(node).copied().unwrap_or(0.0)
    }

    pub fn set_value(&mut self, node: usize, value: f32) {
        if let Some(v) = self.values.get_mut(node) {
            *v = value.clamp(0.0, 10.0);
        }
    }

    pub fn set_values(&mut self, values: &[f32; NODES]) {
        for (dst, &src) in self.values.iter_mut().zip(values) {
            *dst = src.clamp(0.0, 10.0);
        }
    }

    pub fn weight(&self, node: usize) -> f32 {
        self.weights.get(node).copied().unwrap_or(0.5)
    }

    pub fn set_weight(&mut self, node: usize, weight: f32) {
        if let Some(w) = self.weights.get_mut(node) {
            *w = weight.clamp(0.0, 1.0);
        }
    }

    pub fn set_weights(&mut self, weights: &[f32; BRANCH_NODES]) {
        for (dst, &src) in self.weights.iter_mut().zip(weights) {
            *dst = src.clamp(0.0, 1.0);
        }
    }

    /// Set the enabled row range, 1-based and inclusive. Bounds clamp to
    /// [1, 8] and `first` never exceeds `last`.
    pub fn set_step_range(&mut self, first: usize, last: usize) {
        let last = last.clamp(1, ROWS);
        self.step_first = first.clamp(1, ROWS).min(last);
        self.step_last = last;
    }

    pub fn step_range(&self) -> (usize, usize) {
        (self.step_first, self.step_last)
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn running(&self) -> bool {
        self.running
    }

    // --- Per-tick outputs. ---

    pub fn node(&self) -> usize {
        self.walk.node
    }

    pub fn step(&self) -> usize {
        self.walk.step
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn gates(&self) -> &[f32; NODES] {
        &self.gates
    }

    pub fn probabilities(&self) -> &[f32; NODES] {
        &self.probabilities
    }

    pub fn path_traveled(&self) -> &[i32; ROWS] {
        &self.walk.path
    }

    pub fn random_seed(&self) -> f32 {
        self.random_seed
    }

    // --- Persistence. ---

    pub fn save(&self) -> SavedState {
        SavedState {
            step: self.walk.step as i64,
            node: self.walk.node as i64,
            last_node: self.walk.last_node as i64,
            last_gate: self.last_gate as i64,
            path_traveled: self.walk.path,
        }
    }

    /// Restore a persisted snapshot, clamping every field into range.
    pub fn restore(&mut self, state: &SavedState) {
        self.walk.step = state.step.clamp(0, ROWS as i64 - 1) as usize;
        self.walk.node = state.node.clamp(0, NODES as i64 - 1) as usize;
        self.walk.last_node = state.last_node.clamp(0, NODES as i64 - 1) as usize;
        self.last_gate = state.last_gate.clamp(0, NODES as i64 - 1) as usize;
        let mut path = state.path_traveled;
        for entry in &mut path {
            *entry = (*entry).clamp(-1, NODES as i32 - 1);
        }
        path[0] = 0;
        self.walk.path = path;
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(0)
    }
}
