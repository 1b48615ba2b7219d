use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use vocab_leveler::corpus::{load_entries, Tier, WordEntry, STAGE_ELEMENTARY, STAGE_MIDDLE};
use vocab_leveler::reference::read_moe_list;
use vocab_leveler::resolver::MOE_ELEMENTARY_CUTOFF;

struct AuditStats {
    total_words: usize,
    moe_words: usize,
    tier_counts: Vec<(Tier, usize)>,
    violations: Vec<String>,
}

fn main() -> Result<()> {
    println!("Corpus Check - Verifying tier files on disk");

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let moe_path = data_dir.join("taiwan_moe_1200.txt");
    let moe_file = File::open(&moe_path)
        .with_context(|| format!("Failed to open MOE word list: {}", moe_path.display()))?;
    let (moe_rank, moe_total, _) = read_moe_list(BufReader::new(moe_file))?;
    println!("Loaded MOE list: {} words", moe_total);

    let stats = audit(&data_dir, &moe_rank)?;

    println!("\nAudit Complete!");
    println!("Statistics:");
    println!("  Total words: {}", stats.total_words);
    println!("  MOE-indexed words: {}", stats.moe_words);
    for (tier, count) in &stats.tier_counts {
        println!("  {} ({}): {} words", tier.file_name(), tier.label(), count);
    }

    if !stats.violations.is_empty() {
        println!("\nViolations found:");
        for v in &stats.violations {
            println!("  - {}", v);
        }
        bail!("{} invariant violation(s) in corpus", stats.violations.len());
    }

    println!("\nAll tier invariants hold.");
    Ok(())
}

fn audit(dir: &Path, moe_rank: &HashMap<String, usize>) -> Result<AuditStats> {
    let mut seen: HashMap<String, Tier> = HashMap::new();
    let mut violations = Vec::new();
    let mut tier_counts = Vec::new();
    let mut moe_words = 0usize;

    for tier in Tier::ALL {
        let path = dir.join(tier.file_name());
        let entries = if path.exists() {
            load_entries(&path)?
        } else {
            println!("  {} missing, treated as empty", tier.file_name());
            Vec::new()
        };

        for entry in &entries {
            let word = entry.word.to_lowercase();
            if let Some(previous) = seen.insert(word.clone(), tier) {
                violations.push(format!(
                    "'{}' appears in both {} and {}",
                    word,
                    previous.file_name(),
                    tier.file_name()
                ));
            }
            check_entry(tier, entry, &word, moe_rank, &mut violations);
            if moe_rank.contains_key(&word) {
                moe_words += 1;
            }
        }
        tier_counts.push((tier, entries.len()));
    }

    Ok(AuditStats {
        total_words: seen.len(),
        moe_words,
        tier_counts,
        violations,
    })
}

fn check_entry(
    tier: Tier,
    entry: &WordEntry,
    word: &str,
    moe_rank: &HashMap<String, usize>,
    violations: &mut Vec<String>,
) {
    let rank = moe_rank.get(word).copied();

    match tier {
        // Elementary is reserved for low-rank MOE words.
        Tier::Elementary => match rank {
            Some(r) if r < MOE_ELEMENTARY_CUTOFF => {
                if entry.taiwan_stage.as_deref() != Some(STAGE_ELEMENTARY) {
                    violations.push(format!("'{}' in elementary without 小學 stage", word));
                }
            }
            Some(r) => violations.push(format!(
                "'{}' (MOE rank {}) belongs in middle, found in elementary",
                word, r
            )),
            None => violations.push(format!("non-MOE word '{}' found in elementary", word)),
        },
        Tier::Middle => match rank {
            Some(r) if r >= MOE_ELEMENTARY_CUTOFF => {
                if entry.taiwan_stage.as_deref() != Some(STAGE_MIDDLE) {
                    violations.push(format!("'{}' in middle without 中學 stage", word));
                }
            }
            Some(r) => violations.push(format!(
                "'{}' (MOE rank {}) belongs in elementary, found in middle",
                word, r
            )),
            None => check_non_moe(tier, entry, word, violations),
        },
        _ => match rank {
            Some(r) => violations.push(format!(
                "MOE word '{}' (rank {}) found in {}",
                word,
                r,
                tier.file_name()
            )),
            None => check_non_moe(tier, entry, word, violations),
        },
    }
}

fn check_non_moe(tier: Tier, entry: &WordEntry, word: &str, violations: &mut Vec<String>) {
    if entry.taiwan_stage.is_some() {
        violations.push(format!("non-MOE word '{}' carries a taiwan_stage", word));
    }
    match entry.difficulty {
        Some(d) if tier.contains(d) => {}
        Some(d) => violations.push(format!(
            "'{}' has difficulty {} outside {} range {:?}",
            word,
            d,
            tier.file_name(),
            tier.difficulty_range()
        )),
        None => violations.push(format!("'{}' has no difficulty score", word)),
    }
}
