//! Lexical difficulty heuristics. Both scoring functions are pure and total:
//! any string input yields a score in [0, 10] with no I/O and no failure.

/// Silent letters and clusters that are hard to hear out.
const SILENT_PATTERNS: [&str; 9] = ["ght", "kn", "wr", "mb", "mn", "ps", "pn", "gn", "rh"];

/// Unusual multi-letter combinations.
const UNUSUAL_CLUSTERS: [&str; 12] = [
    "eau", "ough", "ious", "eous", "uous", "cie", "cei", "xc", "cqu", "rrh", "phth", "sch",
];

/// Suffixes that are commonly misspelled. Scored once, first match wins.
const TRICKY_ENDINGS: [&str; 7] = ["ible", "able", "ence", "ance", "ous", "ious", "eous"];

const ACADEMIC_PREFIXES: [&str; 17] = [
    "anti", "circum", "contra", "inter", "intra", "mal", "meta", "multi", "neo", "omni", "peri",
    "pseudo", "quasi", "retro", "semi", "trans", "ultra",
];

const ACADEMIC_SUFFIXES: [&str; 9] = [
    "ology", "istic", "ation", "ification", "aceous", "escent", "itious", "uous", "acious",
];

const GREEK_LATIN_ROOTS: [&str; 10] = [
    "phil", "phob", "path", "graph", "morph", "chron", "theo", "anthropo", "cosm", "psych",
];

/// Spelling complexity in [0, 10]. Higher means harder to spell.
pub fn spelling_complexity(word: &str) -> f64 {
    let lower = word.to_lowercase();
    let len = lower.chars().count();
    let mut score: f64 = 0.0;

    if len > 10 {
        score += 2.0;
    } else if len > 7 {
        score += 1.0;
    }

    // Additive: a word may contain several silent patterns.
    for pattern in SILENT_PATTERNS {
        if lower.contains(pattern) {
            score += 1.5;
        }
    }

    if has_doubled_letter(&lower) {
        score += 0.5;
    }

    for cluster in UNUSUAL_CLUSTERS {
        if lower.contains(cluster) {
            score += 1.5;
        }
    }

    // Tricky endings overlap ("ious" ends with "ous"); count at most one.
    if TRICKY_ENDINGS.iter().any(|e| lower.ends_with(e)) {
        score += 0.5;
    }

    if lower.contains("ie") || lower.contains("ei") {
        score += 0.5;
    }

    score.min(10.0)
}

/// Estimated rarity in [0, 10]. Higher means less frequent.
pub fn frequency_estimate(word: &str) -> f64 {
    let lower = word.to_lowercase();
    let len = lower.chars().count();
    let mut score: f64 = 5.0;

    if ACADEMIC_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        score += 1.0;
    }

    if ACADEMIC_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        score += 1.0;
    }

    if len > 12 {
        score += 2.0;
    } else if len > 9 {
        score += 1.0;
    }

    if GREEK_LATIN_ROOTS.iter().any(|r| lower.contains(r)) {
        score += 1.0;
    }

    score.clamp(0.0, 10.0)
}

/// Deterministic tie-spreader in [0, 100): the sum of the lowercased word's
/// Unicode scalar values mod 100. Callers scale it into their jitter band.
/// Reproducibility across runs is required, so this is not a real RNG.
pub fn char_code_hash(word: &str) -> u32 {
    let sum: u32 = word
        .to_lowercase()
        .chars()
        .map(|c| c as u32)
        .fold(0u32, |acc, v| acc.wrapping_add(v));
    sum % 100
}

fn has_doubled_letter(lower: &str) -> bool {
    let mut chars = lower.chars();
    let Some(mut prev) = chars.next() else {
        return false;
    };
    for c in chars {
        if c == prev {
            return true;
        }
        prev = c;
    }
    false
}
