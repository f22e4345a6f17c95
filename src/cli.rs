use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::{anyhow, Result};
use tracing::info;

use crossport::core::{Category, Engine, JsonDirectorySink, ScanRequest, ScanResult};

#[derive(Parser)]
#[command(name = "crossport")]
#[command(about = "Find the iOS-only parts of a React Native app and plan the Android port")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a project and report porting findings
    Scan {
        /// Project root to scan
        path: PathBuf,

        /// Additional directory name to skip (repeatable)
        #[arg(long = "exclude", value_name = "DIR")]
        exclude: Vec<String>,

        /// Additional gitignore-style pattern to skip (repeatable)
        #[arg(long = "exclude-glob", value_name = "GLOB")]
        exclude_glob: Vec<String>,

        /// Do not honour the project's .gitignore
        #[arg(long)]
        no_gitignore: bool,

        /// Number of worker tasks
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Directory to write report tables into
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full scan result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the loaded detection rules
    Rules {
        /// Only show rules of this category (e.g. ui_pattern)
        #[arg(long)]
        category: Option<String>,
    },

    /// Write a default crossport.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Scan {
                path,
                exclude,
                exclude_glob,
                no_gitignore,
                jobs,
                output,
                json,
            } => {
                let request = ScanRequest {
                    root: path,
                    exclude_dirs: exclude,
                    exclude_globs: exclude_glob,
                    respect_gitignore: no_gitignore.then_some(false),
                    jobs,
                };
                let result = engine.scan(request).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    print_summary(&result);
                }

                if let Some(dir) = output.or_else(|| engine.config().output.dir.clone()) {
                    let report = engine.assemble(&result);
                    let sink = JsonDirectorySink::new(dir);
                    engine.persist(&report, &sink).await?;
                }
                Ok(())
            }
            Commands::Rules { category } => {
                let filter = category
                    .map(|name| {
                        Category::parse(&name).ok_or_else(|| anyhow!("unknown category '{}'", name))
                    })
                    .transpose()?;

                for (category, rules) in engine.library().by_category() {
                    if filter.is_some_and(|wanted| wanted != category) {
                        continue;
                    }
                    println!("{}", category);
                    for rule in rules {
                        println!("  {:<45} {:?}", rule.id, rule.scope);
                    }
                }
                Ok(())
            }
            Commands::Init { path, force } => {
                let dir = path.unwrap_or_else(|| PathBuf::from("."));
                let written = Engine::init(&dir, force)?;
                info!("Edit {} to tune exclusions, heuristics and rules", written.display());
                Ok(())
            }
        }
    }
}

fn print_summary(result: &ScanResult) {
    let summary = &result.summary;
    println!("Scanned {} ({} files, {} skipped)", result.root.display(), summary.files_scanned, summary.files_skipped);
    for (category, count) in &summary.counts {
        if *count > 0 {
            println!("  {:<22} {}", category, count);
        }
    }
    println!(
        "  {:<22} {} ({} duplicates collapsed)",
        "total", summary.total_findings, summary.duplicates_collapsed
    );
    for skipped in &result.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}
