use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use walkdir::WalkDir;

use spl_sections::{parse_batch, parse_bytes, Document, ParserPolicy};

#[derive(Parser)]
#[command(name = "spl_sections", about = "Split SPL drug labels into numbered sections")]
struct Cli {
    /// Parser policy file (TOML); SPL_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one label and print the document as JSON
    Parse {
        file: PathBuf,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Section outline of one label
    Sections {
        file: PathBuf,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Parse every .xml label under a directory
    Batch {
        dir: PathBuf,
        /// Write one <name>.json per label here
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Max files to parse (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let policy = ParserPolicy::load(cli.config.as_deref())?;
    info!(policy = ?policy, "loaded parser policy");

    let result = match cli.command {
        Commands::Parse { file, pretty } => {
            let doc = parse_file(&file, &policy)?;
            let json = if pretty {
                serde_json::to_string_pretty(&doc)?
            } else {
                serde_json::to_string(&doc)?
            };
            println!("{}", json);
            Ok(())
        }
        Commands::Sections { file, limit } => {
            let doc = parse_file(&file, &policy)?;
            println!("{}", doc.metadata.title);
            println!(
                "{} v{} | {} | {}",
                doc.metadata.document_id,
                doc.metadata.revision_number,
                doc.metadata
                    .effective_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".into()),
                doc.metadata.issuer
            );
            if doc.sections.is_empty() {
                println!("No sections.");
                return Ok(());
            }

            println!(
                "\n{:<8} | {:<44} | {:<8} | {:<14} | {:>5} | {:<5}",
                "Path", "Title", "Import.", "Category", "Words", "Flags"
            );
            println!("{}", "-".repeat(98));
            for s in doc.sections.iter().take(limit) {
                let indent = "  ".repeat(s.level - 1);
                let title = truncate(&format!("{}{}", indent, s.title), 44);
                let mut flags = String::new();
                if s.has_table {
                    flags.push('T');
                }
                if s.has_list {
                    flags.push('L');
                }
                if !s.structured_findings.is_empty() {
                    flags.push('F');
                }
                println!(
                    "{:<8} | {:<44} | {:<8} | {:<14} | {:>5} | {:<5}",
                    s.path, title, s.importance, s.category, s.word_count, flags
                );
            }
            println!("\n{} sections", doc.sections.len());
            Ok(())
        }
        Commands::Batch { dir, out_dir, limit } => {
            let files = collect_labels(&dir, limit)?;
            if files.is_empty() {
                println!("No .xml files under {}.", dir.display());
                return Ok(());
            }
            if let Some(out) = &out_dir {
                fs::create_dir_all(out)
                    .with_context(|| format!("Failed to create {}", out.display()))?;
            }
            println!("Parsing {} labels...", files.len());
            let counts = parse_files(&files, out_dir.as_deref(), &policy)?;
            counts.print();
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn parse_file(file: &Path, policy: &ParserPolicy) -> Result<Document> {
    let raw = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    parse_bytes(&raw, policy).with_context(|| format!("Failed to parse {}", file.display()))
}

fn collect_labels(dir: &Path, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    if let Some(n) = limit {
        files.truncate(n);
    }
    Ok(files)
}

#[derive(Default)]
struct BatchCounts {
    labels: usize,
    empty: usize,
    failed: usize,
    sections: usize,
}

impl BatchCounts {
    fn print(&self) {
        println!(
            "Parsed {} labels ({} without sections, {} failed), {} sections.",
            self.labels, self.empty, self.failed, self.sections,
        );
    }
}

fn parse_files(files: &[PathBuf], out_dir: Option<&Path>, policy: &ParserPolicy) -> Result<BatchCounts> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = BatchCounts::default();

    for chunk in files.chunks(200) {
        let raws: Vec<String> = chunk
            .iter()
            .map(|path| match fs::read(path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "unreadable label");
                    String::new()
                }
            })
            .collect();

        for (path, result) in chunk.iter().zip(parse_batch(&raws, policy)) {
            match result {
                Ok(doc) => {
                    counts.labels += 1;
                    counts.sections += doc.sections.len();
                    if doc.sections.is_empty() {
                        counts.empty += 1;
                    }
                    if let Some(out) = out_dir {
                        write_json(out, path, &doc)?;
                    }
                }
                Err(e) => {
                    counts.failed += 1;
                    warn!(file = %path.display(), error = %e, "skipping label");
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn write_json(out_dir: &Path, source: &Path, doc: &Document) -> Result<()> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| doc.metadata.document_id.clone());
    let target = out_dir.join(format!("{}.json", stem));
    let json = serde_json::to_string_pretty(doc)?;
    fs::write(&target, json).with_context(|| format!("Failed to write {}", target.display()))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──
