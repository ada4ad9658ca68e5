// Output mapping: node value to voltage, gates aside.
//
// A node's raw value lives in [0, 10]. The mapper rescales it linearly
// into the configured [min, max] window, shifted by the range-mode offset
// (bipolar drops the window by 5 V; quantized output biases it by 4 or 5 V
// toward a useful note range), optionally snaps it to the configured
// scale, and slews toward it when a slide time is set. Gate timing lives
// in the engine; this module is pure voltage shaping.

use serde::{Deserialize, Serialize};

use crate::quantizer::{self, Scale};

/// Output voltage range convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeMode {
    /// Window used as configured, 0-10 V territory.
    Unipolar,
    /// Window dropped by 5 V, centered around 0 V.
    Bipolar,
}

/// Everything the output stage needs to shape a voltage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub range_mode: RangeMode,
    pub quantize: bool,
    pub scale: Scale,
    pub key: usize,
    /// Window bounds, both in [0, 10]. Swapped transparently if min > max.
    pub min: f32,
    pub max: f32,
    /// Slide knob in [0, 10]; 0 disables slide.
    pub slide: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            range_mode: RangeMode::Unipolar,
            quantize: false,
            scale: Scale::NaturalMinor,
            key: 0,
            min: 3.0,
            max: 5.0,
            slide: 0.0,
        }
    }
}

impl OutputConfig {
    /// The effective output window in volts, ordered and offset.
    pub fn window(&self) -> (f32, f32) {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let offset = match (self.quantize, self.range_mode) {
            (false, RangeMode::Unipolar) => 0.0,
            (false, RangeMode::Bipolar) => -5.0,
            (true, RangeMode::Unipolar) => -4.0,
            (true, RangeMode::Bipolar) => -5.0,
        };
        (lo + offset, hi + offset)
    }
}

/// Map a raw node value in [0, 10] to the target output voltage.
///
/// Quantized values that snap just past the window bounds wrap to the
/// quantized opposite bound, mirroring degree-step wrap semantics.
pub fn target_voltage(raw: f32, cfg: &OutputConfig) -> f32 {
    let raw = raw.clamp(0.0, 10.0);
    let (lo, hi) = cfg.window();
    let v = lo + raw / 10.0 * (hi - lo);
    if !cfg.quantize {
        return v;
    }
    let mask = quantizer::valid_notes(cfg.scale, cfg.key);
    let q = quantizer::quantize(v, &mask);
    if q > hi {
        quantizer::quantize(lo, &mask)
    } else if q < lo {
        quantizer::quantize(hi, &mask)
    } else {
        q
    }
}

/// Slide knob position to portamento duration in seconds.
///
/// Log-scale over four decades: the bottom of the usable knob range is
/// 1 ms, the top 10 s. A knob at exactly 0 disables slide.
pub fn slide_duration(knob: f32) -> f32 {
    let knob = knob.clamp(0.0, 10.0);
    if knob <= 0.0 {
        0.0
    } else {
        0.001 * 10f32.powf(0.4 * knob)
    }
}

/// Linear slew toward a target voltage.
///
/// `set_target` fixes the crossing rate so the output reaches the target
/// in exactly the requested duration; `tick` moves along it and clamps at
/// arrival.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slew {
    current: f32,
    target: f32,
    rate: f32,
}

impl Slew {
    /// Jump to a voltage immediately, cancelling any crossing.
    pub fn snap_to(&mut self, v: f32) {
        self.current = v;
        self.target = v;
        self.rate = 0.0;
    }

    /// Begin a linear crossing from the present value to `target` over
    /// `duration` seconds. Zero duration snaps.
    pub fn set_target(&mut self, target: f32, duration: f32) {
        self.target = target;
        if duration <= 0.0 || (target - self.current).abs() == 0.0 {
            self.current = target;
            self.rate = 0.0;
        } else {
            self.rate = (target - self.current) / duration;
        }
    }

    /// Advance by `dt` seconds and return the present output value.
    pub fn tick(&mut self, dt: f32) -> f32 {
        if self.rate != 0.0 {
            self.current += self.rate * dt;
            let arrived = (self.rate > 0.0 && self.current >= self.target)
                || (self.rate < 0.0 && self.current <= self.target);
            if arrived {
                self.current = self.target;
                self.rate = 0.0;
            }
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}
