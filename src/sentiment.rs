//! # Sentiment
//! Valence-aware lexicon scorer with a domain overlay for crypto/quant jargon.
//!
//! The base lexicon (`sentiment_lexicon.json`, valences on a -4..=4 scale) is
//! embedded at compile time. `SentimentAnalyzer::with_domain_terms()` copies it
//! once and overlays [`DOMAIN_TERMS`]; overlay weights replace base weights.
//! Build one analyzer per run and reuse it for every title.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

static BASE_LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid sentiment lexicon")
});

/// Domain terms with hand-assigned intensities.
pub const DOMAIN_TERMS: &[(&str, f64)] = &[
    ("moon", 2.0),
    ("rigged", -1.5),
    ("scam", -2.0),
    ("gem", 1.5),
    ("rug", -3.0),
    ("bullish", 1.0),
    ("bearish", -1.0),
    ("fud", -1.0),
    ("hodl", 0.8),
    ("airdrop", 0.5),
];

const BOOSTER_INCR: f64 = 0.293;
const NEGATION_SCALAR: f64 = -0.74;
const CAPS_INCR: f64 = 0.733;
const EXCLAMATION_INCR: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Output of one scoring pass. `compound` is the only value persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PolarityScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: HashMap<String, f64>,
}

impl SentimentAnalyzer {
    /// General-purpose lexicon only, no domain overlay.
    pub fn base() -> Self {
        Self {
            lexicon: BASE_LEXICON.clone(),
        }
    }

    /// Base lexicon with [`DOMAIN_TERMS`] applied on top.
    pub fn with_domain_terms() -> Self {
        Self::base().with_overlay(DOMAIN_TERMS.iter().copied())
    }

    /// Insert or replace terms. Keys are matched lower-case.
    pub fn with_overlay<'a, I>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        for (term, weight) in terms {
            self.lexicon.insert(term.to_lowercase(), weight);
        }
        self
    }

    pub fn valence(&self, term: &str) -> Option<f64> {
        self.lexicon.get(&term.to_lowercase()).copied()
    }

    /// Compound score in [-1.0, 1.0]; 0.0 for empty or unscoreable text.
    pub fn compound(&self, text: &str) -> f64 {
        self.polarity_scores(text).compound
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let words: Vec<&str> = text
            .split_whitespace()
            .map(trim_punctuation)
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return PolarityScores::default();
        }

        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let caps_differential = is_caps_differential(&words);

        let mut valences = Vec::with_capacity(words.len());
        for i in 0..words.len() {
            let w = lowered[i].as_str();
            if booster_sign(w).is_some() {
                valences.push(0.0);
                continue;
            }
            let Some(mut v) = self.lexicon.get(w).copied() else {
                valences.push(0.0);
                continue;
            };

            if caps_differential && is_all_caps(words[i]) {
                v += CAPS_INCR * v.signum();
            }

            // Boosters/dampeners up to three tokens back, fading with distance.
            for (k, decay) in [(1usize, 1.0f64), (2, 0.95), (3, 0.9)] {
                if i >= k {
                    if let Some(sign) = booster_sign(lowered[i - k].as_str()) {
                        let mut incr = BOOSTER_INCR * sign;
                        if caps_differential && is_all_caps(words[i - k]) {
                            incr += CAPS_INCR * sign;
                        }
                        v += incr * v.signum() * decay;
                    }
                }
            }

            let negated = (1..=3).any(|k| i >= k && is_negator(lowered[i - k].as_str()));
            if negated {
                v *= NEGATION_SCALAR;
            }

            valences.push(v);
        }

        // Contrastive "but": what follows outweighs what came before.
        if let Some(pivot) = lowered.iter().position(|w| w == "but") {
            for (i, v) in valences.iter_mut().enumerate() {
                if i < pivot {
                    *v *= 0.5;
                } else if i > pivot {
                    *v *= 1.5;
                }
            }
        }

        let emphasis = exclamation_emphasis(text);
        let mut sum: f64 = valences.iter().sum();
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }
        let compound = normalize(sum);

        let (mut pos_sum, mut neg_sum, mut neu_count) = (0.0f64, 0.0f64, 0usize);
        for &v in &valences {
            if v > 0.0 {
                pos_sum += v + 1.0;
            } else if v < 0.0 {
                neg_sum += v - 1.0;
            } else {
                neu_count += 1;
            }
        }
        if pos_sum > neg_sum.abs() {
            pos_sum += emphasis;
        } else if pos_sum < neg_sum.abs() {
            neg_sum -= emphasis;
        }
        let total = pos_sum + neg_sum.abs() + neu_count as f64;
        if total <= 0.0 {
            return PolarityScores::default();
        }

        PolarityScores {
            neg: round3((neg_sum / total).abs()),
            neu: round3(neu_count as f64 / total),
            pos: round3((pos_sum / total).abs()),
            compound,
        }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::with_domain_terms()
    }
}

fn normalize(sum: f64) -> f64 {
    if sum == 0.0 || !sum.is_finite() {
        return 0.0;
    }
    (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn trim_punctuation(w: &str) -> &str {
    w.trim_matches(|c: char| !c.is_alphanumeric())
}

fn exclamation_emphasis(text: &str) -> f64 {
    let n = text.chars().filter(|&c| c == '!').count().min(MAX_EXCLAMATIONS);
    n as f64 * EXCLAMATION_INCR
}

fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
        && word
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}

/// True when some, but not all, words are shouted.
fn is_caps_differential(words: &[&str]) -> bool {
    let caps = words.iter().filter(|w| is_all_caps(w)).count();
    caps > 0 && caps < words.len()
}

/// +1.0 for intensifiers, -1.0 for dampeners.
fn booster_sign(tok: &str) -> Option<f64> {
    match tok {
        "absolutely" | "amazingly" | "completely" | "deeply" | "extremely" | "hugely"
        | "incredibly" | "insanely" | "massively" | "most" | "so" | "super" | "totally"
        | "really" | "very" | "utterly" | "highly" => Some(1.0),
        "barely" | "hardly" | "kinda" | "marginally" | "partly" | "scarcely" | "slightly"
        | "somewhat" | "sorta" => Some(-1.0),
        _ => None,
    }
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "nothing"
            | "nobody"
            | "none"
            | "nor"
            | "neither"
            | "cannot"
            | "without"
            | "aint"
            | "dont"
            | "isnt"
            | "wont"
            | "cant"
    ) || tok.ends_with("n't")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_lexicon_loads_and_excludes_domain_jargon() {
        let base = SentimentAnalyzer::base();
        assert!(base.valence("good").unwrap_or(0.0) > 0.0);
        assert!(base.valence("rug").is_none());
        assert!(base.valence("moon").is_none());
    }

    #[test]
    fn overlay_replaces_base_weight() {
        let base = SentimentAnalyzer::base();
        let tuned = SentimentAnalyzer::with_domain_terms();
        assert!(base.valence("scam").is_some());
        assert_eq!(tuned.valence("scam"), Some(-2.0));
        assert_eq!(tuned.valence("RUG"), Some(-3.0));
    }

    #[test]
    fn negation_flips_direction() {
        let a = SentimentAnalyzer::with_domain_terms();
        assert!(a.compound("bullish") > 0.0);
        assert!(a.compound("not bullish") < 0.0);
        assert!(a.compound("this isn't good") < 0.0);
    }

    #[test]
    fn boosters_and_exclamations_intensify() {
        let a = SentimentAnalyzer::with_domain_terms();
        let plain = a.compound("good");
        assert!(a.compound("very good") > plain);
        assert!(a.compound("good!!!") > plain);
        assert!(a.compound("slightly good") < plain);
    }

    #[test]
    fn but_shifts_weight_to_second_clause() {
        let a = SentimentAnalyzer::with_domain_terms();
        assert!(a.compound("great team but total scam") < 0.0);
    }

    #[test]
    fn shouted_word_in_mixed_text_is_stronger() {
        let a = SentimentAnalyzer::with_domain_terms();
        assert!(a.compound("this is GREAT") > a.compound("this is great"));
    }

    #[test]
    fn proportions_sum_to_about_one() {
        let a = SentimentAnalyzer::with_domain_terms();
        let s = a.polarity_scores("good news and bad news for the market");
        let total = s.pos + s.neg + s.neu;
        assert!((total - 1.0).abs() < 0.01, "total = {total}");
    }
}
