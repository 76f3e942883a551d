//! Difficulty curves
//!
//! Speed, spacing and gap width ramp on separate curves so each can be
//! tuned without disturbing the others:
//! - [`DifficultyCurve`]: four-phase speed progress (also drives spacing,
//!   moving-gap chance and danger intensity)
//! - [`GapShrinkCurve`]: time-based gap narrowing
//! - [`ResponseCurve`]: piecewise-linear remap used for danger visuals

use serde::{Deserialize, Serialize};

use crate::clamp01;

/// Progress reached at the end of the safe, tense and intense phases
pub const PHASE_ANCHORS: [f32; 4] = [0.0, 0.22, 0.5, 0.85];

/// Ramp phase for a given elapsed run time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyPhase {
    Safe,
    Tense,
    Intense,
    /// Unbounded tail approaching full speed
    Overtime,
}

impl DifficultyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPhase::Safe => "safe",
            DifficultyPhase::Tense => "tense",
            DifficultyPhase::Intense => "intense",
            DifficultyPhase::Overtime => "overtime",
        }
    }

    /// Speed tier index (0 = safe)
    pub fn tier(&self) -> u32 {
        *self as u32
    }
}

/// Four-phase speed progress curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyCurve {
    pub safe_phase_seconds: f32,
    pub tense_phase_seconds: f32,
    pub intense_phase_seconds: f32,
    /// Per-phase exponents; decreasing values front-load each later ramp less
    pub safe_exponent: f32,
    pub tense_exponent: f32,
    pub intense_exponent: f32,
    /// Rate of the exponential approach to 1.0 in overtime
    pub overtime_rate: f32,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self {
            safe_phase_seconds: 12.0,
            tense_phase_seconds: 24.0,
            intense_phase_seconds: 36.0,
            safe_exponent: 1.6,
            tense_exponent: 1.25,
            intense_exponent: 1.0,
            overtime_rate: 0.035,
        }
    }
}

impl DifficultyCurve {
    /// Clamp every knob into a usable range
    pub fn sanitized(mut self) -> Self {
        self.safe_phase_seconds = non_negative(self.safe_phase_seconds);
        self.tense_phase_seconds = non_negative(self.tense_phase_seconds);
        self.intense_phase_seconds = non_negative(self.intense_phase_seconds);
        self.safe_exponent = positive_or(self.safe_exponent, 1.0);
        self.tense_exponent = positive_or(self.tense_exponent, 1.0);
        self.intense_exponent = positive_or(self.intense_exponent, 1.0);
        self.overtime_rate = positive_or(self.overtime_rate, 0.035);
        self
    }

    fn phases(&self) -> [(f32, f32); 3] {
        [
            (self.safe_phase_seconds, self.safe_exponent),
            (self.tense_phase_seconds, self.tense_exponent),
            (self.intense_phase_seconds, self.intense_exponent),
        ]
    }

    /// Seconds at which overtime starts
    pub fn overtime_start(&self) -> f32 {
        self.phases().iter().map(|(duration, _)| duration.max(0.0)).sum()
    }

    pub fn phase_at(&self, elapsed: f32) -> DifficultyPhase {
        let elapsed = elapsed.max(0.0);
        let mut phase_end = 0.0;
        for (i, (duration, _)) in self.phases().iter().enumerate() {
            phase_end += duration.max(0.0);
            if elapsed < phase_end {
                return match i {
                    0 => DifficultyPhase::Safe,
                    1 => DifficultyPhase::Tense,
                    _ => DifficultyPhase::Intense,
                };
            }
        }
        DifficultyPhase::Overtime
    }

    /// Speed progress in [0, 1], non-decreasing in `elapsed`
    pub fn evaluate_speed_progress(&self, elapsed: f32) -> f32 {
        if !(elapsed > 0.0) {
            return PHASE_ANCHORS[0];
        }

        let mut phase_start = 0.0;
        for (i, (duration, exponent)) in self.phases().iter().enumerate() {
            let duration = duration.max(0.0);
            let local = elapsed - phase_start;
            if duration > 0.0 && local < duration {
                let t = clamp01(local / duration).powf(exponent.max(f32::EPSILON));
                return PHASE_ANCHORS[i] + (PHASE_ANCHORS[i + 1] - PHASE_ANCHORS[i]) * t;
            }
            phase_start += duration;
        }

        let overtime = elapsed - phase_start;
        let tail = 1.0 - (-self.overtime_rate.max(0.0) * overtime).exp();
        let last = PHASE_ANCHORS[3];
        clamp01(last + (1.0 - last) * tail)
    }
}

/// Time-based gap narrowing, independent of the speed curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapShrinkCurve {
    pub duration_seconds: f32,
    pub exponent: f32,
}

impl Default for GapShrinkCurve {
    fn default() -> Self {
        Self {
            duration_seconds: 90.0,
            exponent: 1.35,
        }
    }
}

impl GapShrinkCurve {
    pub fn sanitized(mut self) -> Self {
        self.duration_seconds = non_negative(self.duration_seconds);
        self.exponent = positive_or(self.exponent, 1.0);
        self
    }

    /// Shrink progress in [0, 1]
    pub fn evaluate(&self, elapsed: f32) -> f32 {
        if self.duration_seconds <= 0.0 {
            return 1.0;
        }
        clamp01(elapsed / self.duration_seconds).powf(self.exponent.max(f32::EPSILON))
    }
}

/// Piecewise-linear curve over `(input, output)` keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(f32, f32)>", into = "Vec<(f32, f32)>")]
pub struct ResponseCurve {
    keys: Vec<(f32, f32)>,
}

impl From<Vec<(f32, f32)>> for ResponseCurve {
    fn from(keys: Vec<(f32, f32)>) -> Self {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<(f32, f32)> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl ResponseCurve {
    /// Keys are sorted by input; non-finite keys are dropped
    pub fn new(keys: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut keys: Vec<_> = keys
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn linear() -> Self {
        Self::new([(0.0, 0.0), (1.0, 1.0)])
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Evaluate at `x`, holding the end values outside the key range.
    /// An empty curve is the identity clamped to [0, 1].
    pub fn evaluate(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return clamp01(x);
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        for pair in self.keys.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                let span = x1 - x0;
                if span <= f32::EPSILON {
                    return y1;
                }
                return y0 + (y1 - y0) * ((x - x0) / span);
            }
        }
        last.1
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if crate::is_finite_positive(value) {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_hits_anchors_at_phase_boundaries() {
        let curve = DifficultyCurve::default();
        assert_eq!(curve.evaluate_speed_progress(0.0), 0.0);

        let safe_end = curve.safe_phase_seconds;
        assert!((curve.evaluate_speed_progress(safe_end) - 0.22).abs() < 1e-5);

        let tense_end = safe_end + curve.tense_phase_seconds;
        assert!((curve.evaluate_speed_progress(tense_end) - 0.5).abs() < 1e-5);

        let intense_end = curve.overtime_start();
        assert!((curve.evaluate_speed_progress(intense_end) - 0.85).abs() < 1e-5);
    }

    #[test]
    fn test_overtime_approaches_one() {
        let curve = DifficultyCurve::default();
        let start = curve.overtime_start();
        let late = curve.evaluate_speed_progress(start + 10_000.0);
        assert!(late > 0.999 && late <= 1.0);
        assert!(curve.evaluate_speed_progress(start + 10.0) < late);
    }

    #[test]
    fn test_progress_monotonic_across_run() {
        let curve = DifficultyCurve::default();
        let mut previous = 0.0;
        for step in 0..20_000 {
            let t = step as f32 * 0.01;
            let p = curve.evaluate_speed_progress(t);
            assert!(p >= previous - 1e-6, "dropped at t={t}: {previous} -> {p}");
            previous = p;
        }
    }

    #[test]
    fn test_phase_at() {
        let curve = DifficultyCurve::default();
        assert_eq!(curve.phase_at(0.0), DifficultyPhase::Safe);
        assert_eq!(curve.phase_at(12.5), DifficultyPhase::Tense);
        assert_eq!(curve.phase_at(40.0), DifficultyPhase::Intense);
        assert_eq!(curve.phase_at(500.0), DifficultyPhase::Overtime);
    }

    #[test]
    fn test_zero_length_phases_are_skipped() {
        let curve = DifficultyCurve {
            safe_phase_seconds: 0.0,
            tense_phase_seconds: 0.0,
            ..Default::default()
        };
        assert_eq!(curve.phase_at(0.0), DifficultyPhase::Intense);
        let p = curve.evaluate_speed_progress(0.001);
        assert!(p >= 0.5 && p < 0.85);
    }

    #[test]
    fn test_gap_shrink_curve() {
        let curve = GapShrinkCurve::default();
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(curve.duration_seconds * 2.0), 1.0);
        let instant = GapShrinkCurve {
            duration_seconds: 0.0,
            exponent: 1.0,
        };
        assert_eq!(instant.evaluate(0.0), 1.0);
    }

    #[test]
    fn test_response_curve() {
        let curve = ResponseCurve::new([(1.0, 1.0), (0.0, 0.2), (0.5, 0.4)]);
        assert_eq!(curve.evaluate(-1.0), 0.2);
        assert!((curve.evaluate(0.25) - 0.3).abs() < 1e-6);
        assert!((curve.evaluate(0.75) - 0.7).abs() < 1e-6);
        assert_eq!(curve.evaluate(2.0), 1.0);

        let empty = ResponseCurve::new([]);
        assert_eq!(empty.evaluate(0.3), 0.3);
    }

    #[test]
    fn test_sanitized_rejects_bad_values() {
        let curve = DifficultyCurve {
            safe_phase_seconds: f32::NAN,
            tense_exponent: -2.0,
            overtime_rate: 0.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(curve.safe_phase_seconds, 0.0);
        assert_eq!(curve.tense_exponent, 1.0);
        assert!(curve.overtime_rate > 0.0);
    }
}
