// Scale quantization for the output voltage.
//
// Works in the 1V-per-octave convention: one volt per octave, 1/12 V per
// semitone. A scale transposed to a key yields a 12-entry boolean mask over
// pitch classes (0 = C); quantization snaps a continuous voltage to the
// nearest allowed semitone, and degree stepping moves along the allowed
// notes one scale position at a time. All functions are total: an empty
// mask passes values through unchanged.

use serde::{Deserialize, Serialize};

/// Pitch classes per octave.
pub const SEMITONES: usize = 12;

/// The selectable scales, each defined by its semitone intervals from the
/// tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Chromatic,
    Major,
    NaturalMinor,
    MelodicMinor,
    HarmonicMinor,
    PentatonicMajor,
    PentatonicMinor,
    WholeTone,
    Blues,
    Dorian,
    Phrygian,
    Mixolydian,
}

impl Scale {
    pub const ALL: [Scale; 12] = [
        Scale::Chromatic,
        Scale::Major,
        Scale::NaturalMinor,
        Scale::MelodicMinor,
        Scale::HarmonicMinor,
        Scale::PentatonicMajor,
        Scale::PentatonicMinor,
        Scale::WholeTone,
        Scale::Blues,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::Mixolydian,
    ];

    /// Semitone intervals from the tonic.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Scale::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Scale::PentatonicMajor => &[0, 2, 4, 7, 9],
            Scale::PentatonicMinor => &[0, 3, 5, 7, 10],
            Scale::WholeTone => &[0, 2, 4, 6, 8, 10],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Scale::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
        }
    }

    /// Lowercase name, used by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Scale::Chromatic => "chromatic",
            Scale::Major => "major",
            Scale::NaturalMinor => "minor",
            Scale::MelodicMinor => "melodic-minor",
            Scale::HarmonicMinor => "harmonic-minor",
            Scale::PentatonicMajor => "pentatonic-major",
            Scale::PentatonicMinor => "pentatonic-minor",
            Scale::WholeTone => "whole-tone",
            Scale::Blues => "blues",
            Scale::Dorian => "dorian",
            Scale::Phrygian => "phrygian",
            Scale::Mixolydian => "mixolydian",
        }
    }
}

/// The pitch classes of `scale` transposed to `key` (0 = C, 11 = B), as a
/// boolean mask indexed by pitch class.
pub fn valid_notes(scale: Scale, key: usize) -> [bool; SEMITONES] {
    let mut mask = [false; SEMITONES];
    for &interval in scale.intervals() {
        mask[(interval as usize + key) % SEMITONES] = true;
    }
    mask
}

/// True if the mask allows the pitch class of semitone `k` (any octave,
/// negative semitones included).
fn allowed(mask: &[bool; SEMITONES], k: i32) -> bool {
    mask[k.rem_euclid(SEMITONES as i32) as usize]
}

/// The allowed semitone nearest to a continuous voltage, or `None` for an
/// empty mask. Ties resolve to the lower note.
fn nearest_semitone(volts: f32, mask: &[bool; SEMITONES]) -> Option<i32> {
    if !mask.iter().any(|&m| m) {
        return None;
    }
    let target = volts * SEMITONES as f32;
    let center = target.round() as i32;
    let mut best: Option<(f32, i32)> = None;
    // The nearest allowed note is at most one octave away even for a
    // single-note mask, so +/- 12 semitones always suffices.
    for k in center - SEMITONES as i32..=center + SEMITONES as i32 {
        if !allowed(mask, k) {
            continue;
        }
        let dist = (k as f32 - target).abs();
        if best.is_none_or(|(d, _)| dist < d) {
            best = Some((dist, k));
        }
    }
    best.map(|(_, k)| k)
}

/// Snap a voltage to the nearest note allowed by the mask. Idempotent.
pub fn quantize(volts: f32, mask: &[bool; SEMITONES]) -> f32 {
    match nearest_semitone(volts, mask) {
        Some(k) => k as f32 / SEMITONES as f32,
        None => volts,
    }
}

/// Snap to the nearest allowed note, then move `direction` scale-degree
/// positions (positive = up). Unbounded; callers wrap against their own
/// min/max window.
pub fn quantize_step(volts: f32, mask: &[bool; SEMITONES], direction: i32) -> f32 {
    let Some(mut k) = nearest_semitone(volts, mask) else {
        return volts;
    };
    let sign = direction.signum();
    for _ in 0..direction.abs() {
        k += sign;
        while !allowed(mask, k) {
            k += sign;
        }
    }
    k as f32 / SEMITONES as f32
}

/// Degree stepping bounded to `[min, max]` volts: a step past the top
/// re-enters at the quantized minimum, and a step below the bottom at the
/// quantized maximum. The wrap applies per degree.
pub fn quantize_step_wrapped(
    volts: f32,
    mask: &[bool; SEMITONES],
    direction: i32,
    min: f32,
    max: f32,
) -> f32 {
    if !mask.iter().any(|&m| m) {
        return volts;
    }
    let sign = direction.signum();
    let mut v = volts;
    for _ in 0..direction.abs() {
        v = quantize_step(v, mask, sign);
        if v > max {
            v = quantize(min, mask);
        } else if v < min {
            v = quantize(max, mask);
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_major_mask() {
        let mask = valid_notes(Scale::Major, 0);
        let expected = [
            true, false, true, false, true, true, false, true, false, true, false, true,
        ];
        assert_eq!(mask, expected);
    }

    #[test]
    fn key_transposes_the_mask() {
        // D major contains F# (pc 6) and C# (pc 1), not C or F.
        let mask = valid_notes(Scale::Major, 2);
        assert!(mask[6]);
        assert!(mask[1]);
        assert!(!mask[0]);
        assert!(!mask[5]);
    }

    #[test]
    fn mask_sizes_match_interval_counts() {
        for scale in Scale::ALL {
            let mask = valid_notes(scale, 0);
            let count = mask.iter().filter(|&&m| m).count();
            assert_eq!(count, scale.intervals().len());
        }
    }

    #[test]
    fn quantize_snaps_to_nearest() {
        let mask = valid_notes(Scale::Major, 0);
        // 0.1 V is 1.2 semitones: nearest C-major note is D (2 semis).
        assert_eq!(quantize(0.1, &mask), 2.0 / 12.0);
        // 0.01 V is 0.12 semitones: stays on C.
        assert_eq!(quantize(0.01, &mask), 0.0);
        // Negative voltages land on notes below 0 V.
        assert_eq!(quantize(-0.1, &mask), -1.0 / 12.0);
    }

    #[test]
    fn quantize_is_idempotent() {
        for scale in Scale::ALL {
            for key in 0..SEMITONES {
                let mask = valid_notes(scale, key);
                let mut v = -2.0;
                while v < 8.0 {
                    let once = quantize(v, &mask);
                    assert_eq!(
                        quantize(once, &mask),
                        once,
                        "not idempotent at {v} for {scale:?}/{key}"
                    );
                    v += 0.037;
                }
            }
        }
    }

    #[test]
    fn quantize_passes_through_on_empty_mask() {
        let mask = [false; SEMITONES];
        assert_eq!(quantize(1.234, &mask), 1.234);
    }

    #[test]
    fn degree_step_walks_the_scale() {
        let mask = valid_notes(Scale::Major, 0);
        // From C, one degree up is D, two is E; one down is B below.
        assert_eq!(quantize_step(0.0, &mask, 1), 2.0 / 12.0);
        assert_eq!(quantize_step(0.0, &mask, 2), 4.0 / 12.0);
        assert_eq!(quantize_step(0.0, &mask, -1), -1.0 / 12.0);
    }

    #[test]
    fn degree_step_on_single_note_mask_moves_by_octaves() {
        let mut mask = [false; SEMITONES];
        mask[0] = true;
        assert_eq!(quantize_step(0.0, &mask, 1), 1.0);
        assert_eq!(quantize_step(0.0, &mask, -2), -2.0);
    }

    #[test]
    fn wrapped_step_reenters_at_the_other_bound() {
        let mask = valid_notes(Scale::Major, 0);
        // Stepping up from the top of a [0, 1] V window wraps to the
        // quantized minimum.
        let top = quantize(1.0, &mask);
        assert_eq!(quantize_step_wrapped(top, &mask, 1, 0.0, 1.0), 0.0);
        // And stepping down from the bottom wraps to the quantized max.
        assert_eq!(
            quantize_step_wrapped(0.0, &mask, -1, 0.0, 1.0),
            quantize(1.0, &mask)
        );
    }
}
