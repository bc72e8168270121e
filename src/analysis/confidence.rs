//! Heuristic confidence scoring
//!
//! A score starts at a fixed base and gains a fixed increment for each kind
//! of signal found in an analysis. Each signal counts once, so adding more
//! signals can only raise the score, and the total never exceeds
//! [`CONFIDENCE_CEILING`].

use serde::{Deserialize, Serialize};

/// Score with no signals at all
pub const CONFIDENCE_BASE: f32 = 0.30;

/// Hard upper bound for heuristic scores
pub const CONFIDENCE_CEILING: f32 = 0.95;

/// Kinds of evidence that raise confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Category,
    Colors,
    Fabrics,
    Brand,
    Patterns,
    Styles,
    Embellishments,
}

impl Signal {
    pub const ALL: [Signal; 7] = [
        Signal::Category,
        Signal::Colors,
        Signal::Fabrics,
        Signal::Brand,
        Signal::Patterns,
        Signal::Styles,
        Signal::Embellishments,
    ];

    pub fn increment(&self) -> f32 {
        match self {
            Signal::Category => 0.20,
            Signal::Colors => 0.15,
            Signal::Fabrics => 0.10,
            Signal::Brand => 0.10,
            Signal::Patterns => 0.05,
            Signal::Styles => 0.05,
            Signal::Embellishments => 0.05,
        }
    }
}

/// Accumulated confidence for one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    signals: Vec<Signal>,
}

impl ConfidenceScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signal if `present`; repeated signals count once
    pub fn observe(&mut self, signal: Signal, present: bool) -> &mut Self {
        if present && !self.signals.contains(&signal) {
            self.signals.push(signal);
        }
        self
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn value(&self) -> f32 {
        let total: f32 = CONFIDENCE_BASE + self.signals.iter().map(Signal::increment).sum::<f32>();
        total.min(CONFIDENCE_CEILING)
    }
}

/// Combine the heuristic with a model's self-reported confidence
///
/// The model's number is treated as one more opinion: the result is the
/// mean of both, still capped at the ceiling. Without a model value the
/// heuristic stands alone.
pub fn blend_with_model(heuristic: f32, model: Option<f32>) -> f32 {
    match model {
        Some(m) if m.is_finite() => ((heuristic + m.clamp(0.0, 1.0)) / 2.0).min(CONFIDENCE_CEILING),
        _ => heuristic,
    }
}

/// Mean of `values`, `None` for an empty slice
pub fn mean_confidence(values: &[f32]) -> Option<f32> {
    let finite: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f32>() / finite.len() as f32)
}
