//! Final difficulty resolution. Exactly one signal decides each word's
//! score; the `Signal` enum fixes the precedence order so it cannot drift
//! with code layout.

use crate::corpus::{CefrLevel, Corpus, WordEntry};
use crate::reference::ReferenceData;
use crate::scoring::{char_code_hash, frequency_estimate, spelling_complexity};

/// MOE ranks below this belong to the elementary band.
pub const MOE_ELEMENTARY_CUTOFF: usize = 400;

/// Which reference signal decided a word's difficulty, in precedence order.
/// `Heuristic` means no signal matched and the fallback formula applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Moe { rank: usize },
    Exam { sat: bool, gre: bool },
    Cefr(CefrLevel),
    Heuristic,
}

/// First-match-wins classification of a word against the reference data.
pub fn classify(entry: &WordEntry, refs: &ReferenceData) -> Signal {
    let word = entry.word.to_lowercase();

    if let Some(&rank) = refs.moe_rank.get(&word) {
        return Signal::Moe { rank };
    }

    let sat = refs.is_sat(&word);
    let gre = refs.is_gre(&word);
    if sat || gre {
        return Signal::Exam { sat, gre };
    }

    // The explicit reference map outranks a level already on the entry.
    if let Some(&level) = refs.cefr_map.get(&word) {
        return Signal::Cefr(level);
    }
    if let Some(level) = entry.cefr_level.as_deref().and_then(CefrLevel::parse) {
        return Signal::Cefr(level);
    }

    Signal::Heuristic
}

/// Compute the final difficulty for one entry. Deterministic: the same word
/// and reference sets always produce the same score.
pub fn resolve(entry: &WordEntry, refs: &ReferenceData) -> (f64, Signal) {
    let word = entry.word.to_lowercase();
    let signal = classify(entry, refs);

    let difficulty = match signal {
        Signal::Moe { rank } => moe_difficulty(&word, rank, refs.moe_total),
        // A word carrying both flags keeps the larger of the two scores.
        Signal::Exam {
            sat: true,
            gre: true,
        } => gre_difficulty(&word).max(sat_difficulty(&word)),
        Signal::Exam { gre: true, .. } => gre_difficulty(&word),
        Signal::Exam { .. } => sat_difficulty(&word),
        Signal::Cefr(level) => cefr_difficulty(&word, level),
        Signal::Heuristic => fallback_difficulty(&word),
    };

    (difficulty, signal)
}

fn moe_difficulty(word: &str, rank: usize, moe_total: usize) -> f64 {
    let spelling = spelling_complexity(word);
    if rank < MOE_ELEMENTARY_CUTOFF {
        // Elementary band stops at 24 so no score lands on the 25 boundary.
        let base = (rank as f64 / MOE_ELEMENTARY_CUTOFF as f64) * 24.0;
        let variation = (spelling / 10.0) * 3.0;
        (base + variation).clamp(0.0, 24.0)
    } else {
        let position = (rank - MOE_ELEMENTARY_CUTOFF) as f64;
        let total = moe_total.saturating_sub(MOE_ELEMENTARY_CUTOFF).max(1) as f64;
        let base = 25.0 + (position / total) * 14.0;
        let variation = (spelling / 10.0) * 2.0;
        (base + variation).clamp(25.0, 39.0)
    }
}

fn sat_difficulty(word: &str) -> f64 {
    exam_difficulty(word, 80.0, 89.0)
}

fn gre_difficulty(word: &str) -> f64 {
    exam_difficulty(word, 90.0, 100.0)
}

fn exam_difficulty(word: &str, range_min: f64, range_max: f64) -> f64 {
    let combined = spelling_complexity(word) + frequency_estimate(word);
    let mut difficulty = range_min + (combined / 20.0) * 10.0;

    let len = word.chars().count() as f64;
    difficulty += (len / 15.0).min(1.0) * 2.0;
    difficulty += micro_jitter(word);

    difficulty.clamp(range_min, range_max)
}

fn cefr_difficulty(word: &str, level: CefrLevel) -> f64 {
    let (range_min, range_max) = level.difficulty_range();
    let combined = (spelling_complexity(word) + frequency_estimate(word)) / 20.0;
    // Stop one point short of the top so nothing sits on a level boundary.
    let range_size = range_max - range_min - 1.0;
    let difficulty = range_min + combined * range_size + micro_jitter(word);
    difficulty.clamp(range_min, range_max - 1.0)
}

fn fallback_difficulty(word: &str) -> f64 {
    let combined = spelling_complexity(word) + frequency_estimate(word);

    let (base_min, base_max) = if combined <= 6.0 {
        (40.0, 55.0)
    } else if combined <= 12.0 {
        (45.0, 70.0)
    } else {
        (55.0, 79.0)
    };

    let position = (combined % 7.0) / 7.0;
    let difficulty = base_min + position * (base_max - base_min) + wide_jitter(word);
    difficulty.clamp(40.0, 79.0)
}

/// How many words each signal decided during a full re-scoring pass.
/// `heuristic` is the no-signal count worth watching for calibration.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalCounts {
    pub moe: usize,
    pub exam: usize,
    pub cefr: usize,
    pub heuristic: usize,
}

impl SignalCounts {
    fn record(&mut self, signal: Signal) {
        match signal {
            Signal::Moe { .. } => self.moe += 1,
            Signal::Exam { .. } => self.exam += 1,
            Signal::Cefr(_) => self.cefr += 1,
            Signal::Heuristic => self.heuristic += 1,
        }
    }
}

/// Re-score every entry in the corpus in place.
pub fn rescore(corpus: &mut Corpus, refs: &ReferenceData) -> SignalCounts {
    let mut counts = SignalCounts::default();
    for entry in corpus.entries_mut() {
        let (difficulty, signal) = resolve(entry, refs);
        entry.difficulty = Some(difficulty);
        counts.record(signal);
    }
    counts
}

/// Deterministic jitter in [-1, +1].
fn micro_jitter(word: &str) -> f64 {
    (char_code_hash(word) as f64 / 100.0) * 2.0 - 1.0
}

/// Deterministic jitter in [-2, +2].
fn wide_jitter(word: &str) -> f64 {
    (char_code_hash(word) as f64 / 100.0) * 4.0 - 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn refs() -> ReferenceData {
        ReferenceData {
            moe_rank: HashMap::new(),
            moe_total: 0,
            moe_rejected: 0,
            cefr_map: HashMap::new(),
            sat_set: HashSet::new(),
            gre_set: HashSet::new(),
        }
    }

    fn refs_with_moe(words: &[&str]) -> ReferenceData {
        let mut r = refs();
        for (i, w) in words.iter().enumerate() {
            r.moe_rank.insert(w.to_string(), i);
        }
        r.moe_total = words.len();
        r
    }

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {}, got {}", b, a);
    }

    #[test]
    fn moe_elementary_band_interpolates_by_rank() {
        let mut r = refs();
        r.moe_rank.insert("cat".to_string(), 50);
        r.moe_total = 1200;
        // spelling_complexity("cat") is 0, so the score is the pure base.
        let (d, signal) = resolve(&WordEntry::new("cat"), &r);
        approx(d, 3.0);
        assert_eq!(signal, Signal::Moe { rank: 50 });
    }

    #[test]
    fn moe_middle_band_starts_at_25() {
        let mut r = refs();
        r.moe_rank.insert("cat".to_string(), 800);
        r.moe_total = 1200;
        // 25 + (400/800)*14 = 32, no spelling variation for "cat".
        let (d, _) = resolve(&WordEntry::new("cat"), &r);
        approx(d, 32.0);
    }

    #[test]
    fn moe_middle_band_clamps_to_39() {
        let mut r = refs();
        r.moe_rank.insert("neighbourhood".to_string(), 1199);
        r.moe_total = 1200;
        let (d, _) = resolve(&WordEntry::new("neighbourhood"), &r);
        assert!((25.0..=39.0).contains(&d));
    }

    #[test]
    fn moe_outranks_exam_and_cefr() {
        let mut r = refs_with_moe(&["apple"]);
        r.gre_set.insert("apple".to_string());
        r.sat_set.insert("apple".to_string());
        r.cefr_map.insert("apple".to_string(), CefrLevel::C2);
        let (d, signal) = resolve(&WordEntry::new("apple"), &r);
        assert!(matches!(signal, Signal::Moe { rank: 0 }));
        assert!(d < 25.0, "MOE word must never score in exam range, got {}", d);
    }

    #[test]
    fn gre_formula_matches_hand_computation() {
        let mut r = refs();
        r.gre_set.insert("vex".to_string());
        // spelling 0, frequency 5: 90 + 2.5 + 0.4 (length) - 0.22 (jitter 39).
        let (d, signal) = resolve(&WordEntry::new("vex"), &r);
        approx(d, 92.68);
        assert_eq!(
            signal,
            Signal::Exam {
                sat: false,
                gre: true
            }
        );
    }

    #[test]
    fn sat_formula_matches_hand_computation() {
        let mut r = refs();
        r.sat_set.insert("vex".to_string());
        let (d, _) = resolve(&WordEntry::new("vex"), &r);
        approx(d, 82.68);
    }

    #[test]
    fn dual_exam_flags_keep_the_maximum() {
        let mut r = refs();
        r.sat_set.insert("vex".to_string());
        r.gre_set.insert("vex".to_string());
        let (d, signal) = resolve(&WordEntry::new("vex"), &r);
        approx(d, 92.68);
        assert_eq!(
            signal,
            Signal::Exam {
                sat: true,
                gre: true
            }
        );
    }

    #[test]
    fn exam_scores_stay_in_their_clamp_ranges() {
        let mut r = refs();
        for w in ["a", "incomprehensibilities", "rhythm", "zzz"] {
            r.sat_set.insert(w.to_string());
        }
        for w in ["a", "incomprehensibilities", "rhythm", "zzz"] {
            let (d, _) = resolve(&WordEntry::new(w), &r);
            assert!((80.0..=89.0).contains(&d), "{} scored {}", w, d);
        }
    }

    #[test]
    fn cefr_formula_matches_hand_computation() {
        let mut r = refs();
        r.cefr_map.insert("knight".to_string(), CefrLevel::B1);
        // combined = (3 + 5) / 20 = 0.4; 25 + 0.4*14 = 30.6; jitter 45 -> -0.1.
        let (d, signal) = resolve(&WordEntry::new("knight"), &r);
        approx(d, 30.5);
        assert_eq!(signal, Signal::Cefr(CefrLevel::B1));
    }

    #[test]
    fn cefr_level_on_entry_is_used_when_map_is_silent() {
        let mut entry = WordEntry::new("knight");
        entry.cefr_level = Some("B1".to_string());
        let (d, signal) = resolve(&entry, &refs());
        approx(d, 30.5);
        assert_eq!(signal, Signal::Cefr(CefrLevel::B1));
    }

    #[test]
    fn cefr_map_outranks_entry_level() {
        let mut entry = WordEntry::new("knight");
        entry.cefr_level = Some("C2".to_string());
        let mut r = refs();
        r.cefr_map.insert("knight".to_string(), CefrLevel::B1);
        let (_, signal) = resolve(&entry, &r);
        assert_eq!(signal, Signal::Cefr(CefrLevel::B1));
    }

    #[test]
    fn cefr_score_never_reaches_range_top() {
        let mut r = refs();
        for level in CefrLevel::ALL {
            r.cefr_map.insert("xylophone".to_string(), level);
            let (d, _) = resolve(&WordEntry::new("xylophone"), &r);
            let (min, max) = level.difficulty_range();
            assert!(d >= min && d <= max - 1.0, "{:?} scored {}", level, d);
            r.cefr_map.clear();
        }
    }

    #[test]
    fn fallback_matches_hand_computation() {
        // "dog": combined = 5, low band 40..55, position 5/7, jitter 14 -> -1.44.
        let (d, signal) = resolve(&WordEntry::new("dog"), &refs());
        approx(d, 40.0 + (5.0 / 7.0) * 15.0 - 1.44);
        assert_eq!(signal, Signal::Heuristic);
    }

    #[test]
    fn fallback_stays_in_40_to_79() {
        for w in ["dog", "a", "extraordinarily", "pseudochronographology", ""] {
            let (d, _) = resolve(&WordEntry::new(w), &refs());
            assert!((40.0..=79.0).contains(&d), "{:?} scored {}", w, d);
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        let mut r = refs();
        r.gre_set.insert("ephemeral".to_string());
        let e = WordEntry::new("ephemeral");
        let (a, _) = resolve(&e, &r);
        let (b, _) = resolve(&e, &r);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn rescore_sets_every_difficulty_and_counts_signals() {
        use crate::corpus::{Corpus, Tier};

        let mut r = refs_with_moe(&["sun"]);
        r.moe_total = 1200;
        r.gre_set.insert("ephemeral".to_string());
        r.cefr_map.insert("knight".to_string(), CefrLevel::B1);

        let mut corpus = Corpus::new();
        corpus.merge_tier(
            vec![
                WordEntry::new("sun"),
                WordEntry::new("ephemeral"),
                WordEntry::new("knight"),
                WordEntry::new("dog"),
            ],
            Tier::Middle,
        );

        let counts = rescore(&mut corpus, &r);
        assert_eq!(counts.moe, 1);
        assert_eq!(counts.exam, 1);
        assert_eq!(counts.cefr, 1);
        assert_eq!(counts.heuristic, 1);
        for w in ["sun", "ephemeral", "knight", "dog"] {
            assert!(corpus.get(w).unwrap().difficulty.is_some());
        }
    }

    #[test]
    fn tiny_moe_list_does_not_divide_by_zero() {
        let mut r = refs();
        r.moe_rank.insert("go".to_string(), 0);
        r.moe_total = 1;
        let (d, _) = resolve(&WordEntry::new("go"), &r);
        assert!((0.0..=24.0).contains(&d));
    }
}
