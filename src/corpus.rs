use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// CEFR proficiency levels, ordered easiest (A1) to hardest (C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn parse(s: &str) -> Option<CefrLevel> {
        match s {
            "A1" => Some(CefrLevel::A1),
            "A2" => Some(CefrLevel::A2),
            "B1" => Some(CefrLevel::B1),
            "B2" => Some(CefrLevel::B2),
            "C1" => Some(CefrLevel::C1),
            "C2" => Some(CefrLevel::C2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }

    /// Difficulty range assigned to this level, half-open [min, max).
    pub fn difficulty_range(&self) -> (f64, f64) {
        match self {
            CefrLevel::A1 => (0.0, 12.0),
            CefrLevel::A2 => (12.0, 25.0),
            CefrLevel::B1 => (25.0, 40.0),
            CefrLevel::B2 => (40.0, 55.0),
            CefrLevel::C1 => (55.0, 70.0),
            CefrLevel::C2 => (70.0, 80.0),
        }
    }
}

/// The five output difficulty partitions, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Elementary,
    Middle,
    High,
    University,
    Expert,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Elementary,
        Tier::Middle,
        Tier::High,
        Tier::University,
        Tier::Expert,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Tier::Elementary => "elementary.json",
            Tier::Middle => "middle.json",
            Tier::High => "high.json",
            Tier::University => "university.json",
            Tier::Expert => "expert.json",
        }
    }

    pub fn stem(&self) -> &'static str {
        match self {
            Tier::Elementary => "elementary",
            Tier::Middle => "middle",
            Tier::High => "high",
            Tier::University => "university",
            Tier::Expert => "expert",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Elementary => "小學",
            Tier::Middle => "中學",
            Tier::High => "高中",
            Tier::University => "大學",
            Tier::Expert => "英文高手",
        }
    }

    /// Difficulty interval for this tier. Half-open except Expert, which is
    /// closed at 120.
    pub fn difficulty_range(&self) -> (f64, f64) {
        match self {
            Tier::Elementary => (0.0, 25.0),
            Tier::Middle => (25.0, 40.0),
            Tier::High => (40.0, 55.0),
            Tier::University => (55.0, 80.0),
            Tier::Expert => (80.0, 120.0),
        }
    }

    /// Tier whose interval contains the given difficulty.
    pub fn for_difficulty(difficulty: f64) -> Tier {
        if difficulty < 25.0 {
            Tier::Elementary
        } else if difficulty < 40.0 {
            Tier::Middle
        } else if difficulty < 55.0 {
            Tier::High
        } else if difficulty < 80.0 {
            Tier::University
        } else {
            Tier::Expert
        }
    }

    pub fn contains(&self, difficulty: f64) -> bool {
        let (min, max) = self.difficulty_range();
        if matches!(self, Tier::Expert) {
            difficulty >= min && difficulty <= max
        } else {
            difficulty >= min && difficulty < max
        }
    }
}

/// Taiwan school-stage labels attached to MOE-indexed words.
pub const STAGE_ELEMENTARY: &str = "小學";
pub const STAGE_MIDDLE: &str = "中學";

/// One vocabulary item. Display fields are opaque to the pipeline; any field
/// not listed here survives round-trip through `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(
        rename = "partOfSpeech",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cefr_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taiwan_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WordEntry {
    pub fn new(word: &str) -> Self {
        WordEntry {
            word: word.to_lowercase(),
            definition: None,
            sentence: None,
            part_of_speech: None,
            difficulty: None,
            cefr_level: None,
            taiwan_stage: None,
            source: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Append a provenance tag unless it is already recorded. A missing
    /// source falls back to `default_origin` (the tier the entry came from).
    pub fn add_source_tag(&mut self, tag: &str, default_origin: &str) {
        let current = self
            .source
            .take()
            .unwrap_or_else(|| default_origin.to_string());
        if current.contains(tag) {
            self.source = Some(current);
        } else if current.is_empty() {
            self.source = Some(tag.to_string());
        } else {
            self.source = Some(format!("{}+{}", current, tag));
        }
    }
}

/// Exam vocabularies merged into the corpus before re-scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamTag {
    Sat,
    Gre,
}

impl ExamTag {
    pub fn tag(&self) -> &'static str {
        match self {
            ExamTag::Sat => "SAT",
            ExamTag::Gre => "GRE",
        }
    }

    /// Default CEFR level assumed for entries introduced by this exam list.
    pub fn default_cefr(&self) -> CefrLevel {
        match self {
            ExamTag::Sat => CefrLevel::C1,
            ExamTag::Gre => CefrLevel::C2,
        }
    }
}

struct Slot {
    entry: WordEntry,
    origin: String,
}

/// Counts reported after merging one exam vocabulary.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeStats {
    pub new_words: usize,
    pub updated_words: usize,
}

/// The whole corpus merged by lowercase word. The first-seen entry for a
/// word is canonical; later sources update fields but never add a duplicate.
pub struct Corpus {
    entries: HashMap<String, Slot>,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus {
            entries: HashMap::new(),
        }
    }

    /// Load and merge the five tier files found under `dir`. A missing tier
    /// file contributes nothing; a present but malformed one is an error.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut corpus = Corpus::new();
        for tier in Tier::ALL {
            let path = dir.as_ref().join(tier.file_name());
            if !path.exists() {
                continue;
            }
            let entries = load_entries(&path)?;
            corpus.merge_tier(entries, tier);
        }
        Ok(corpus)
    }

    pub fn merge_tier(&mut self, entries: Vec<WordEntry>, tier: Tier) {
        for mut entry in entries {
            entry.word = entry.word.to_lowercase();
            let key = entry.word.clone();
            self.entries.entry(key).or_insert(Slot {
                entry,
                origin: tier.stem().to_string(),
            });
        }
    }

    /// Merge an exam vocabulary: new words are inserted with the exam's
    /// provenance tag and default CEFR level, already-known words gain the
    /// tag on their existing entry. Difficulty is left for the resolver.
    pub fn merge_exam_list(&mut self, entries: Vec<WordEntry>, exam: ExamTag) -> MergeStats {
        let mut stats = MergeStats::default();
        for mut entry in entries {
            entry.word = entry.word.to_lowercase();
            let key = entry.word.clone();
            match self.entries.get_mut(&key) {
                Some(slot) => {
                    let origin = slot.origin.clone();
                    slot.entry.add_source_tag(exam.tag(), &origin);
                    stats.updated_words += 1;
                }
                None => {
                    // SAT entries are stamped C1 outright; GRE only fills a
                    // missing level.
                    match exam {
                        ExamTag::Sat => {
                            entry.cefr_level =
                                Some(exam.default_cefr().as_str().to_string());
                        }
                        ExamTag::Gre => {
                            if entry.cefr_level.is_none() {
                                entry.cefr_level =
                                    Some(exam.default_cefr().as_str().to_string());
                            }
                        }
                    }
                    entry.source = Some(exam.tag().to_string());
                    self.entries.insert(
                        key,
                        Slot {
                            entry,
                            origin: exam.tag().to_lowercase(),
                        },
                    );
                    stats.new_words += 1;
                }
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(word).map(|slot| &slot.entry)
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut WordEntry> {
        self.entries.values_mut().map(|slot| &mut slot.entry)
    }

    pub fn into_entries(self) -> Vec<WordEntry> {
        self.entries.into_values().map(|slot| slot.entry).collect()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Corpus::new()
    }
}

/// Read one JSON array of word entries.
pub fn load_entries(path: &Path) -> Result<Vec<WordEntry>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open word list: {}", path.display()))?;
    let reader = BufReader::new(file);
    let entries: Vec<WordEntry> = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse word list JSON: {}", path.display()))?;
    Ok(entries)
}
