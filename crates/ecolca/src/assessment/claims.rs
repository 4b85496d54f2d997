use std::fmt;

use super::domain::{normalize_label, ClaimVerdict};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsError {
    #[error("nothing to analyze")]
    EmptyText,
    #[error("claims backend failed: {0}")]
    Backend(String),
}

/// Classifies whether a free-text process description makes an environmental claim.
pub trait ClaimsAnalyzer: Send + Sync + fmt::Debug {
    fn analyze(&self, text: &str) -> Result<ClaimVerdict, ClaimsError>;
}

const DEFAULT_LEXICON: &[(&str, f64)] = &[
    ("carbon neutral", 0.6),
    ("net zero", 0.6),
    ("low carbon", 0.45),
    ("eco-friendly", 0.45),
    ("closed-loop", 0.35),
    ("renewable", 0.35),
    ("sustainab", 0.35),
    ("recycled", 0.3),
    ("circular", 0.3),
    ("emission", 0.3),
    ("footprint", 0.3),
    ("environment", 0.3),
    ("green", 0.25),
    ("reduc", 0.15),
];

/// Weighted cue-phrase scorer. Matched weights combine as a noisy-or over the whole text.
#[derive(Debug, Clone)]
pub struct LexiconClaimsAnalyzer {
    cues: Vec<(String, f64)>,
}

impl Default for LexiconClaimsAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_LEXICON.iter().map(|(cue, weight)| (*cue, *weight)))
    }
}

impl LexiconClaimsAnalyzer {
    pub fn new<I, S>(cues: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            cues: cues
                .into_iter()
                .map(|(cue, weight)| (cue.into(), weight.clamp(0.0, 1.0)))
                .collect(),
        }
    }

    fn claim_probability(&self, text: &str) -> f64 {
        let text = normalize_label(text);
        let miss = self
            .cues
            .iter()
            .filter(|(cue, _)| text.contains(cue.as_str()))
            .fold(1.0, |miss, (_, weight)| miss * (1.0 - weight));
        1.0 - miss
    }
}

impl ClaimsAnalyzer for LexiconClaimsAnalyzer {
    fn analyze(&self, text: &str) -> Result<ClaimVerdict, ClaimsError> {
        if text.trim().is_empty() {
            return Err(ClaimsError::EmptyText);
        }

        let probability = self.claim_probability(text);
        let verdict = if probability > 0.5 {
            ClaimVerdict {
                label: "yes".to_string(),
                score: probability,
            }
        } else {
            ClaimVerdict {
                label: "no".to_string(),
                score: 1.0 - probability,
            }
        };
        Ok(verdict)
    }
}
