//! Tier redistribution: route every re-scored entry into exactly one of the
//! five output tiers and enforce the corpus-wide invariants before anything
//! is written back to disk.

use crate::corpus::{Tier, WordEntry, STAGE_ELEMENTARY, STAGE_MIDDLE};
use crate::reference::ReferenceData;
use crate::resolver::MOE_ELEMENTARY_CUTOFF;
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Difficulty assumed when an entry somehow reaches redistribution unscored.
const DEFAULT_DIFFICULTY: f64 = 50.0;

/// The five output partitions, each sorted by (difficulty, word).
#[derive(Debug)]
pub struct TierSet {
    tiers: [Vec<WordEntry>; 5],
}

impl TierSet {
    pub fn get(&self, tier: Tier) -> &[WordEntry] {
        &self.tiers[tier as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &[WordEntry])> + '_ {
        Tier::ALL.iter().map(move |&t| (t, self.get(t)))
    }

    pub fn total_len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }
}

/// Assign every entry to a tier, apply the MOE exclusivity override, sort,
/// and verify the partition invariants. Fails without producing a `TierSet`
/// on any integrity violation so callers cannot write partial output.
pub fn redistribute(entries: Vec<WordEntry>, refs: &ReferenceData) -> Result<TierSet> {
    let input_count = entries.len();
    let mut tiers: [Vec<WordEntry>; 5] = Default::default();

    for mut entry in entries {
        let word = entry.word.to_lowercase();
        let tier = match refs.moe_rank.get(&word) {
            // The elementary tier is reserved for low-rank MOE words; rank
            // decides placement here, not the numeric score.
            Some(&rank) if rank < MOE_ELEMENTARY_CUTOFF => {
                entry.taiwan_stage = Some(STAGE_ELEMENTARY.to_string());
                Tier::Elementary
            }
            Some(_) => {
                entry.taiwan_stage = Some(STAGE_MIDDLE.to_string());
                Tier::Middle
            }
            None => {
                entry.taiwan_stage = None;
                let difficulty = entry.difficulty.unwrap_or(DEFAULT_DIFFICULTY);
                if difficulty < 25.0 {
                    // Non-MOE words may not enter elementary: lift the score
                    // into the middle band and place there.
                    let rescaled = (25.0 + (difficulty / 25.0) * 15.0).clamp(25.0, 40.0);
                    entry.difficulty = Some(rescaled);
                    Tier::Middle
                } else {
                    Tier::for_difficulty(difficulty)
                }
            }
        };
        tiers[tier as usize].push(entry);
    }

    for bucket in tiers.iter_mut() {
        bucket.sort_by(|a, b| {
            let da = a.difficulty.unwrap_or(0.0);
            let db = b.difficulty.unwrap_or(0.0);
            da.total_cmp(&db).then_with(|| a.word.cmp(&b.word))
        });
    }

    let set = TierSet { tiers };
    verify_partition(&set, input_count)?;
    Ok(set)
}

/// Partition invariants: every input word ends up in exactly one tier.
fn verify_partition(set: &TierSet, input_count: usize) -> Result<()> {
    let total = set.total_len();
    if total != input_count {
        bail!(
            "integrity violation: {} words in, {} words out after redistribution",
            input_count,
            total
        );
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(total);
    for (tier, entries) in set.iter() {
        for entry in entries {
            if !seen.insert(entry.word.as_str()) {
                bail!(
                    "integrity violation: word '{}' appears in more than one tier ({} among them)",
                    entry.word,
                    tier.stem()
                );
            }
        }
    }
    Ok(())
}
