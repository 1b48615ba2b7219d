use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use vocab_leveler::{
    load_references, redistribute, rescore, Corpus, ExamTag, ReferencePaths, Tier, TierSet,
};

fn main() -> Result<()> {
    let matches = Command::new("vocab-leveler")
        .version("1.0.0")
        .about("Re-score word difficulty and redistribute the vocabulary corpus across tiers")
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .default_value(".")
                .help("Directory containing the tier JSON files and reference lists"),
        )
        .arg(
            Arg::new("moe")
                .long("moe")
                .value_name("FILE")
                .default_value("taiwan_moe_1200.txt")
                .help("MOE word list (newline-delimited, rank = line order)"),
        )
        .arg(
            Arg::new("cefr")
                .long("cefr")
                .value_name("FILE")
                .default_value("cefr_reference_lists.json")
                .help("CEFR reference JSON (level -> word list)"),
        )
        .arg(
            Arg::new("sat")
                .long("sat")
                .value_name("FILE")
                .default_value("sat_vocabulary.json")
                .help("SAT vocabulary JSON"),
        )
        .arg(
            Arg::new("gre")
                .long("gre")
                .value_name("FILE")
                .default_value("gregmat_vocab.json")
                .help("GRE/GMAT vocabulary JSON"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Compute and verify everything but write no files")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    run(&matches)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let data_dir = PathBuf::from(matches.get_one::<String>("data-dir").unwrap());
    let dry_run = matches.get_flag("dry-run");

    println!("Vocabulary Difficulty Update");
    println!("============================");

    // Reference data. A missing file here is fatal for the whole run.
    println!("\nLoading reference data...");
    let paths = ReferencePaths {
        moe: data_dir.join(matches.get_one::<String>("moe").unwrap()),
        cefr: data_dir.join(matches.get_one::<String>("cefr").unwrap()),
        sat: data_dir.join(matches.get_one::<String>("sat").unwrap()),
        gre: data_dir.join(matches.get_one::<String>("gre").unwrap()),
    };
    let (refs, sat_entries, gre_entries) = load_references(&paths)?;
    println!("  MOE words: {}", refs.moe_total);
    if refs.moe_rejected > 0 {
        println!("  MOE lines skipped (not citation form): {}", refs.moe_rejected);
    }
    println!("  CEFR reference: {} words", refs.cefr_map.len());
    println!("  SAT vocabulary: {} entries", sat_entries.len());
    println!("  GRE vocabulary: {} entries", gre_entries.len());

    // Existing corpus, merged by lowercase word across the five tier files.
    println!("\nLoading dictionaries from {}...", data_dir.display());
    let mut corpus = Corpus::load_dir(&data_dir)?;
    println!("  Unique words loaded: {}", corpus.len());

    let sat_stats = corpus.merge_exam_list(sat_entries, ExamTag::Sat);
    println!(
        "  SAT merge: {} new, {} existing words tagged",
        sat_stats.new_words, sat_stats.updated_words
    );
    let gre_stats = corpus.merge_exam_list(gre_entries, ExamTag::Gre);
    println!(
        "  GRE merge: {} new, {} existing words tagged",
        gre_stats.new_words, gre_stats.updated_words
    );

    // Re-score everything with fresh signals.
    println!("\nRecalculating difficulty scores...");
    let counts = rescore(&mut corpus, &refs);
    println!("  MOE-ranked: {}", counts.moe);
    println!("  Exam-tagged: {}", counts.exam);
    println!("  CEFR-mapped: {}", counts.cefr);
    println!("  Heuristic fallback (no signal): {}", counts.heuristic);

    // Redistribute. This verifies the partition invariants and fails before
    // anything is written if they do not hold.
    println!("\nRedistributing words across tiers...");
    let total_words = corpus.len();
    let set = redistribute(corpus.into_entries(), &refs)?;

    println!("\nFinal word counts by tier:");
    for (tier, entries) in set.iter() {
        match difficulty_span(entries) {
            Some((lo, hi)) => println!(
                "  {} ({}): {} words, difficulty {:.1}-{:.1}",
                tier.file_name(),
                tier.label(),
                entries.len(),
                lo,
                hi
            ),
            None => println!("  {} ({}): 0 words", tier.file_name(), tier.label()),
        }
    }
    println!("\nTotal words in dictionary: {}", total_words);

    if dry_run {
        println!("\nDry run: no files written.");
        return Ok(());
    }

    println!();
    write_tiers(&data_dir, &set)?;
    Ok(())
}

fn difficulty_span(entries: &[vocab_leveler::WordEntry]) -> Option<(f64, f64)> {
    let mut diffs = entries.iter().filter_map(|e| e.difficulty);
    let first = diffs.next()?;
    let (lo, hi) = diffs.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some((lo, hi))
}

fn write_tiers(dir: &Path, set: &TierSet) -> Result<()> {
    for tier in Tier::ALL {
        let path = dir.join(tier.file_name());
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, set.get(tier))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved {} words to {}", set.get(tier).len(), tier.file_name());
    }
    Ok(())
}
