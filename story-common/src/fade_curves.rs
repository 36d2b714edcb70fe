//! Opacity curves for the slot crossfade
//!
//! During a crossfade the incoming slot's opacity follows the fade-in curve
//! while the outgoing slot follows the matching fade-out curve. Both take a
//! normalized progress through the crossfade window (0.0 to 1.0) and return an
//! opacity in 0.0 to 1.0.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Fade curve types for the crossfade handoff
///
/// - Linear: constant rate of change (plain CSS opacity transition)
/// - Exponential: incoming slot appears late, outgoing slot holds longer
/// - Logarithmic: incoming slot appears early
/// - SCurve: eased in and out
/// - EqualPower: both slots stay close to opaque through the middle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    Linear,

    /// v(t) = t²
    Exponential,

    /// v(t) = √t (fade-in), (1-t)² (fade-out)
    Logarithmic,

    /// v(t) = 0.5 × (1 - cos(π × t))
    #[serde(alias = "cosine", alias = "s-curve")]
    SCurve,

    /// v(t) = sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Opacity of the incoming slot at `position` through the crossfade
    ///
    /// # Arguments
    /// * `position` - Normalized position through the crossfade (0.0 to 1.0)
    ///
    /// # Returns
    /// Opacity (0.0 = hidden, 1.0 = fully visible)
    pub fn fade_in_opacity(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            FadeCurve::Logarithmic => t.sqrt(),
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Opacity of the outgoing slot at `position` through the crossfade
    ///
    /// Returns 1.0 at the start of the crossfade and 0.0 at its end.
    pub fn fade_out_opacity(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential | FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 + (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }

    /// Parse a curve name as written in configuration files
    ///
    /// Accepts the canonical names plus the `cosine` / `s-curve` / `scurve`
    /// aliases for [`FadeCurve::SCurve`]. Case insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "exponential" => Some(FadeCurve::Exponential),
            "logarithmic" => Some(FadeCurve::Logarithmic),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Some(FadeCurve::SCurve),
            "equal_power" | "equalpower" => Some(FadeCurve::EqualPower),
            _ => None,
        }
    }

    /// Canonical configuration name
    pub fn as_config_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
            FadeCurve::Logarithmic => "logarithmic",
            FadeCurve::SCurve => "s_curve",
            FadeCurve::EqualPower => "equal_power",
        }
    }

    /// Get all available fade curve variants
    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl Default for FadeCurve {
    /// Linear matches a plain opacity transition
    fn default() -> Self {
        FadeCurve::Linear
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_config_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_in_bounds() {
        for curve in FadeCurve::all_variants() {
            let start_val = curve.fade_in_opacity(0.0);
            let end_val = curve.fade_in_opacity(1.0);
            assert!(
                start_val.abs() < 0.01,
                "{:?} fade-in at 0.0 should be ~0.0, got {}",
                curve,
                start_val
            );
            assert!(
                (end_val - 1.0).abs() < 0.01,
                "{:?} fade-in at 1.0 should be ~1.0, got {}",
                curve,
                end_val
            );
        }
    }

    #[test]
    fn test_fade_out_bounds() {
        for curve in FadeCurve::all_variants() {
            let start_val = curve.fade_out_opacity(0.0);
            let end_val = curve.fade_out_opacity(1.0);
            assert!((start_val - 1.0).abs() < 0.01, "{:?} start {}", curve, start_val);
            assert!(end_val.abs() < 0.01, "{:?} end {}", curve, end_val);
        }
    }

    #[test]
    fn test_out_of_range_position_is_clamped() {
        for curve in FadeCurve::all_variants() {
            assert_eq!(curve.fade_in_opacity(-3.0), curve.fade_in_opacity(0.0));
            assert_eq!(curve.fade_in_opacity(7.0), curve.fade_in_opacity(1.0));
        }
    }

    #[test]
    fn test_linear_midpoint() {
        assert!((FadeCurve::Linear.fade_in_opacity(0.5) - 0.5).abs() < f32::EPSILON);
        assert!((FadeCurve::Linear.fade_out_opacity(0.5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(FadeCurve::parse("cosine"), Some(FadeCurve::SCurve));
        assert_eq!(FadeCurve::parse("S-Curve"), Some(FadeCurve::SCurve));
        assert_eq!(FadeCurve::parse("equalpower"), Some(FadeCurve::EqualPower));
        assert_eq!(FadeCurve::parse("EXPONENTIAL"), Some(FadeCurve::Exponential));
        assert_eq!(FadeCurve::parse("bouncy"), None);
    }

    #[test]
    fn test_config_names_parse_back() {
        for curve in FadeCurve::all_variants() {
            assert_eq!(FadeCurve::parse(curve.as_config_str()), Some(*curve));
        }
    }

    #[test]
    fn test_default() {
        assert_eq!(FadeCurve::default(), FadeCurve::Linear);
    }
}
