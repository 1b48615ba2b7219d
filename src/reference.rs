use crate::corpus::{CefrLevel, WordEntry};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Citation-form check for MOE lines: lowercase letters with optional
/// apostrophes/hyphens after the first character.
fn citation_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z'-]*$").unwrap())
}

/// All read-only reference data the pipeline consumes.
pub struct ReferenceData {
    /// Word -> zero-based rank in the MOE list (first occurrence wins).
    pub moe_rank: HashMap<String, usize>,
    /// Total line count of the MOE list, duplicates included.
    pub moe_total: usize,
    /// Lines in the MOE file that failed the citation-form check.
    pub moe_rejected: usize,
    /// Word -> lowest CEFR level it appears under.
    pub cefr_map: HashMap<String, CefrLevel>,
    pub sat_set: HashSet<String>,
    pub gre_set: HashSet<String>,
}

impl ReferenceData {
    pub fn is_sat(&self, word: &str) -> bool {
        self.sat_set.contains(word)
    }

    pub fn is_gre(&self, word: &str) -> bool {
        self.gre_set.contains(word)
    }
}

/// Paths to the four reference inputs. All are required; a missing file is a
/// configuration error for the whole run.
pub struct ReferencePaths {
    pub moe: PathBuf,
    pub cefr: PathBuf,
    pub sat: PathBuf,
    pub gre: PathBuf,
}

/// Load every reference source. The parsed SAT/GRE entries are returned
/// alongside so the caller can merge them into the corpus.
pub fn load_references(
    paths: &ReferencePaths,
) -> Result<(ReferenceData, Vec<WordEntry>, Vec<WordEntry>)> {
    let moe_file = File::open(&paths.moe)
        .with_context(|| format!("Failed to open MOE word list: {}", paths.moe.display()))?;
    let (moe_rank, moe_total, moe_rejected) = read_moe_list(BufReader::new(moe_file))?;

    let cefr_file = File::open(&paths.cefr)
        .with_context(|| format!("Failed to open CEFR reference: {}", paths.cefr.display()))?;
    let cefr_map = read_cefr_reference(BufReader::new(cefr_file))
        .with_context(|| format!("Failed to parse CEFR reference: {}", paths.cefr.display()))?;

    let sat_entries = read_exam_list(&paths.sat)?;
    let gre_entries = read_exam_list(&paths.gre)?;

    let sat_set = sat_entries.iter().map(|e| e.word.to_lowercase()).collect();
    let gre_set = gre_entries.iter().map(|e| e.word.to_lowercase()).collect();

    let data = ReferenceData {
        moe_rank,
        moe_total,
        moe_rejected,
        cefr_map,
        sat_set,
        gre_set,
    };
    Ok((data, sat_entries, gre_entries))
}

/// Parse the newline-delimited MOE list. Rank is the order of surviving
/// lines; duplicate words keep their first rank but still count toward the
/// total, matching how the rank interpolation divides the list.
pub fn read_moe_list<R: BufRead>(reader: R) -> Result<(HashMap<String, usize>, usize, usize)> {
    let mut ranks = HashMap::new();
    let mut total = 0usize;
    let mut rejected = 0usize;
    for line in reader.lines() {
        let line = line.context("Failed to read MOE word list")?;
        let word = line.trim().to_lowercase();
        if word.is_empty() {
            continue;
        }
        if !citation_form().is_match(&word) {
            rejected += 1;
            continue;
        }
        ranks.entry(word).or_insert(total);
        total += 1;
    }
    Ok((ranks, total, rejected))
}

/// Parse the CEFR reference: a JSON object mapping level name to a word
/// list. A word listed under several levels keeps the lowest one.
pub fn read_cefr_reference<R: Read>(reader: R) -> Result<HashMap<String, CefrLevel>> {
    let raw: HashMap<String, Vec<String>> =
        serde_json::from_reader(reader).context("CEFR reference is not a level->words object")?;

    let mut map: HashMap<String, CefrLevel> = HashMap::new();
    for (name, words) in &raw {
        // Unknown level names carry no ordinal and are skipped.
        let Some(level) = CefrLevel::parse(name) else {
            continue;
        };
        for word in words {
            let word = word.to_lowercase();
            match map.get(&word).copied() {
                Some(existing) if existing <= level => {}
                _ => {
                    map.insert(word, level);
                }
            }
        }
    }
    Ok(map)
}

fn read_exam_list(path: &Path) -> Result<Vec<WordEntry>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open exam vocabulary: {}", path.display()))?;
    let entries: Vec<WordEntry> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse exam vocabulary: {}", path.display()))?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn moe_rank_follows_line_order() {
        let input = "the\nof\n\n  and  \nto\n";
        let (ranks, total, rejected) = read_moe_list(Cursor::new(input)).unwrap();
        assert_eq!(total, 4);
        assert_eq!(rejected, 0);
        assert_eq!(ranks["the"], 0);
        assert_eq!(ranks["and"], 2);
        assert_eq!(ranks["to"], 3);
    }

    #[test]
    fn moe_duplicates_keep_first_rank_but_count() {
        let input = "alpha\nbeta\nalpha\ngamma\n";
        let (ranks, total, _) = read_moe_list(Cursor::new(input)).unwrap();
        assert_eq!(total, 4);
        assert_eq!(ranks["alpha"], 0);
        assert_eq!(ranks["gamma"], 3);
    }

    #[test]
    fn moe_rejects_non_citation_forms() {
        let input = "apple\n3rd\nwon't\nNew York\n";
        let (ranks, total, rejected) = read_moe_list(Cursor::new(input)).unwrap();
        // "New York" lowercases to "new york", which has a space.
        assert_eq!(rejected, 2);
        assert_eq!(total, 2);
        assert!(ranks.contains_key("won't"));
    }

    #[test]
    fn cefr_lowest_level_wins_regardless_of_order() {
        let json = r#"{"B2": ["house", "ascend"], "A1": ["house"], "X9": ["junk"]}"#;
        let map = read_cefr_reference(Cursor::new(json)).unwrap();
        assert_eq!(map["house"], CefrLevel::A1);
        assert_eq!(map["ascend"], CefrLevel::B2);
        assert!(!map.contains_key("junk"));
    }

    #[test]
    fn cefr_words_are_lowercased() {
        let json = r#"{"A2": ["Window"]}"#;
        let map = read_cefr_reference(Cursor::new(json)).unwrap();
        assert_eq!(map["window"], CefrLevel::A2);
    }
}
