use anyhow::{Context, Result};
use bundle_patcher::config::detect_bundle_version;
use bundle_patcher::{
    write_if_changed, ModAggregator, PatchError, Pipeline, PipelineError, PipelineOutput,
    WriteOutcome,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "BUNDLE_PATCHER_LOG";

#[derive(Parser)]
#[command(name = "bundle-patcher")]
#[command(about = "Inject mods into minified JavaScript game bundles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply every mod to a bundle
    Apply {
        /// Bundle file to patch
        #[arg(short, long)]
        bundle: PathBuf,

        /// Directory containing one subdirectory per mod
        #[arg(short, long)]
        mods: PathBuf,

        /// Bundle version for mod gating (read from the bundle header if omitted)
        #[arg(long = "version", value_name = "VERSION")]
        game_version: Option<String>,

        /// Output file; `-` writes to stdout. Defaults to patching in place
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List discovered mods and their patches
    List {
        /// Directory containing one subdirectory per mod
        #[arg(short, long)]
        mods: PathBuf,

        /// Bundle version to check mod ranges against
        #[arg(long = "version", value_name = "VERSION")]
        game_version: Option<String>,
    },

    /// Run every mod against a bundle without writing anything
    Check {
        /// Bundle file to patch
        #[arg(short, long)]
        bundle: PathBuf,

        /// Directory containing one subdirectory per mod
        #[arg(short, long)]
        mods: PathBuf,

        /// Bundle version for mod gating (read from the bundle header if omitted)
        #[arg(long = "version", value_name = "VERSION")]
        game_version: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if run(cli.command)? {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether the command failed in a way that should exit non-zero.
fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Apply {
            bundle,
            mods,
            game_version,
            out,
            diff,
        } => cmd_apply(&bundle, &mods, game_version, out, diff),
        Commands::List { mods, game_version } => cmd_list(&mods, game_version.as_deref()),
        Commands::Check {
            bundle,
            mods,
            game_version,
        } => cmd_check(&bundle, &mods, game_version),
    }
}

fn load_mods(dir: &Path) -> Result<ModAggregator> {
    let mut aggregator = ModAggregator::new();
    let count = aggregator
        .discover(dir)
        .with_context(|| format!("failed to load mods from {}", dir.display()))?;
    if count == 0 {
        eprintln!(
            "{}",
            format!("Warning: no mods found in {}", dir.display()).yellow()
        );
    }
    Ok(aggregator)
}

/// Read the bundle, resolve its version and run all applicable mods.
fn run_pipeline(
    bundle: &Path,
    mods: &Path,
    game_version: Option<String>,
) -> Result<(String, std::result::Result<PipelineOutput, PipelineError>)> {
    let source = fs::read_to_string(bundle)
        .with_context(|| format!("failed to read bundle {}", bundle.display()))?;
    let version = game_version.or_else(|| detect_bundle_version(&source));

    println!("Bundle: {}", bundle.display());
    match &version {
        Some(version) => println!("Version: {version}"),
        None => println!(
            "Version: {}",
            "unknown (all mods apply; pass --version to gate)".yellow()
        ),
    }

    let aggregator = load_mods(mods)?;
    let patches = aggregator.patches_for(bundle, version.as_deref())?;
    println!("Patches: {}", patches.len());
    println!();

    let result = Pipeline::new().apply(&source, &patches);
    Ok((source, result))
}

fn report(result: &std::result::Result<PipelineOutput, PipelineError>) -> bool {
    match result {
        Ok(output) => {
            for outcome in &output.outcomes {
                let mark = if outcome.changed {
                    "✓".green()
                } else {
                    "⊙".yellow()
                };
                println!("{mark} {outcome}");
            }
            false
        }
        Err(err) => {
            let PipelineError::Failed { id, source, .. } = err;
            eprintln!("{} {}: {}", "✗".red(), id, source);
            match source {
                PatchError::MatchCountMismatch { .. } => {
                    eprintln!("  {}", "CONFLICT: match count differs from the manifest".red());
                    eprintln!("  Possible causes:");
                    eprintln!("    - The bundle is a different build than the mod targets");
                    eprintln!("    - An earlier patch already rewrote this code");
                }
                PatchError::FragmentParse { .. } => {
                    eprintln!("  Check the `code` of this patch's actions");
                }
                PatchError::SourceParse { .. } => {
                    eprintln!("  An earlier text patch may have produced invalid JavaScript");
                }
                _ => {}
            }
            true
        }
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for group in diff.grouped_ops(3) {
        for op in group {
            for change in diff.iter_changes(&op) {
                let line = match change.tag() {
                    ChangeTag::Delete => format!("-{change}").red(),
                    ChangeTag::Insert => format!("+{change}").green(),
                    ChangeTag::Equal => format!(" {change}").normal(),
                };
                print!("{line}");
                if change.missing_newline() {
                    println!();
                }
            }
        }
    }
}

fn cmd_apply(
    bundle: &Path,
    mods: &Path,
    game_version: Option<String>,
    out: Option<PathBuf>,
    show_diff: bool,
) -> Result<bool> {
    let (source, result) = run_pipeline(bundle, mods, game_version)?;
    if report(&result) {
        return Ok(true);
    }
    let Ok(output) = result else {
        return Ok(true);
    };

    if show_diff && output.source != source {
        display_diff(bundle, &source, &output.source);
    }

    let target = out.unwrap_or_else(|| bundle.to_path_buf());
    if target.as_os_str() == "-" {
        print!("{}", output.source);
        return Ok(false);
    }
    match write_if_changed(&target, &output.source)? {
        WriteOutcome::Written => println!("\n{} {}", "Wrote".green(), target.display()),
        WriteOutcome::Unchanged => println!("\n{} {}", "Unchanged".yellow(), target.display()),
    }
    Ok(false)
}

fn cmd_check(bundle: &Path, mods: &Path, game_version: Option<String>) -> Result<bool> {
    let (_, result) = run_pipeline(bundle, mods, game_version)?;
    let failed = report(&result);

    println!();
    println!("{}", "Summary:".bold());
    if failed {
        println!("  {}", "check failed".red());
    } else {
        println!("  {}", "all patches apply".green());
    }
    Ok(failed)
}

fn cmd_list(mods: &Path, game_version: Option<&str>) -> Result<bool> {
    let aggregator = load_mods(mods)?;

    for loaded in aggregator.mods() {
        let status = match loaded.applies_to(game_version) {
            Ok(true) => "applies".green(),
            Ok(false) => "skipped".cyan(),
            Err(e) => format!("error: {e}").red(),
        };
        let range = loaded.version_range.as_deref().unwrap_or("any version");
        println!("{} ({}) [{}]", loaded.name.bold(), range.dimmed(), status);
        for patch in &loaded.patches {
            let file = patch.file.as_deref().unwrap_or("*");
            println!(
                "  - {} ({}, {})",
                patch.patch.id,
                patch.patch.descriptor.kind(),
                file.dimmed()
            );
        }
    }
    Ok(false)
}
