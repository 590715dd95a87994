use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use hexpatch::compiler::{compile_rule, normalize_hex};
use hexpatch::config::{load_from_path, PatchConfig, DEFAULT_CONFIG_PATH};
use hexpatch::engine::{EngineOptions, ScanMode};
use hexpatch::pipeline::{self, PatchOutcome};
use hexpatch::report::{changed_spans, format_hex, RuleOutcome};
use hexpatch::rule::RuleResult;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hexpatch")]
#[command(about = "Binary hex patcher driven by equal-length substitution rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply replacement rules and write the patched file (default)
    Apply(ApplyArgs),

    /// Validate rules and count matches in the input without writing
    Check {
        /// Config file (JSON, or TOML with a .toml extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the configured rules with normalized hex
    List {
        /// Config file (JSON, or TOML with a .toml extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
struct ApplyArgs {
    /// Config file (JSON, or TOML with a .toml extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dry run - patch in memory and report without writing the output
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show every changed byte span
    #[arg(short, long)]
    diff: bool,

    /// Where scanning resumes after a replacement: restart | continue
    #[arg(long, default_value_t = ScanMode::Restart)]
    mode: ScanMode,

    /// Stop a rule after this many replacements
    #[arg(long)]
    max_replacements: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();

    match cli.command {
        Some(Commands::Apply(args)) => cmd_apply(args),
        Some(Commands::Check { config }) => cmd_check(config),
        Some(Commands::List { config }) => cmd_list(config),
        None => cmd_apply(ApplyArgs::default()),
    }
}

fn print_banner() {
    let rule = "═".repeat(46);
    println!("{}", format!("╔{rule}╗").cyan());
    println!(
        "{}{}{}",
        "║".cyan(),
        format!("{:^46}", format!("HexPatch v{}", env!("CARGO_PKG_VERSION"))).bold(),
        "║".cyan()
    );
    println!(
        "{}{}{}",
        "║".cyan(),
        format!("{:^46}", "Binary Hex Patcher"),
        "║".cyan()
    );
    println!("{}", format!("╚{rule}╝").cyan());
    println!();
}

/// Helper: Load the config from the given path or the default location
fn load_config(config: Option<PathBuf>) -> Result<(PathBuf, PatchConfig)> {
    let path = config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    debug!("loading config from {}", path.display());
    let config = load_from_path(&path)?;
    Ok((path, config))
}

/// Helper: Warn about rules known to loop forever in restart mode once they match
fn warn_self_matching(config: &PatchConfig, options: EngineOptions) {
    if options.mode != ScanMode::Restart || options.max_replacements.is_some() {
        return;
    }

    for (idx, rule) in config.replacements.iter().enumerate() {
        if let Ok(compiled) = compile_rule(rule) {
            if compiled.is_self_matching() {
                warn!("rule #{} replacement contains its own pattern", idx + 1);
                eprintln!(
                    "{}",
                    format!(
                        "Warning: rule #{} replacement contains its own pattern and loops forever \
                         in restart mode if it matches (use --mode continue or --max-replacements)",
                        idx + 1
                    )
                    .yellow()
                );
            }
        }
    }
}

/// Helper: One status line per rule outcome
fn print_outcome(outcome: &RuleOutcome) {
    match outcome.result {
        RuleResult::Applied(_) => {
            println!("{} Applied rule #{}", "✓".green(), outcome_tail(outcome));
        }
        RuleResult::LimitReached(_) => {
            println!("{} Limited rule #{}", "✗".red(), outcome_tail(outcome));
        }
        _ => {
            println!(
                "{} Rule #{} skipped: {}",
                "⚠".yellow(),
                outcome.index,
                outcome.result
            );
        }
    }
}

fn outcome_tail(outcome: &RuleOutcome) -> String {
    format!(
        "{}: {} → {} ({})",
        outcome.index, outcome.old_hex, outcome.new_hex, outcome.result
    )
}

/// Helper: Show changed byte spans between original and patched buffers
fn display_diff(file: &Path, outcome: &PatchOutcome) {
    let spans = changed_spans(&outcome.original, &outcome.patched);

    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    if spans.is_empty() {
        println!("{}", "  (no bytes changed)".dimmed());
        return;
    }

    for span in spans {
        println!(
            "  {:#010x}: {} {} {}",
            span.offset,
            format_hex(span.before).red(),
            "->".dimmed(),
            format_hex(span.after).green()
        );
    }
}

fn cmd_apply(args: ApplyArgs) -> Result<()> {
    print_banner();

    // 1. Load config
    let (config_path, config) = load_config(args.config)?;
    println!(
        "{} Config loaded: {} replacement rules",
        "✓".green(),
        config.replacements.len()
    );
    info!("config {}", config_path.display());

    let options = EngineOptions {
        mode: args.mode,
        max_replacements: args.max_replacements,
    };
    warn_self_matching(&config, options);

    // 2. Patch (in memory only for a dry run)
    let outcome = if args.dry_run {
        pipeline::plan(&config, options)
    } else {
        pipeline::run(&config, options)
    }
    .with_context(|| format!("patching {} failed", config.input_file))?;

    println!(
        "{} Input file read: {} ({} bytes)",
        "↓".cyan(),
        config.input_file,
        outcome.report.input_len
    );
    if args.dry_run {
        println!("{}", "  [DRY RUN - output will not be written]".cyan());
    }
    println!();

    // 3. Report each rule
    for rule_outcome in &outcome.report.outcomes {
        print_outcome(rule_outcome);
    }

    if args.diff {
        display_diff(&config.input_path(), &outcome);
    }

    // 4. Summary
    let report = &outcome.report;
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} rules applied", format!("{}", report.applied_rules()).green());
    println!("  {} rules skipped", format!("{}", report.skipped_rules()).yellow());
    println!("  {} rules limited", format!("{}", report.limited_rules()).red());
    println!(
        "  {} replacements",
        format!("{}", report.total_replacements()).cyan()
    );
    println!();

    if args.dry_run {
        println!("{} Dry run completed!", "✓".green());
    } else {
        println!("{} Operation completed!", "✓".green());
    }
    println!("Input: {}", config.input_file);
    println!("Output: {}", config.output_file);
    println!("Bytes: {} → {}", report.input_len, report.output_len);

    if report.limited_rules() > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(config: Option<PathBuf>) -> Result<()> {
    let (_, config) = load_config(config)?;

    println!("{}", "Rule Check Report".bold());
    println!("Input: {}", config.input_file);
    println!();

    let checks = pipeline::check(&config)?;
    let mut invalid = 0;

    for check in &checks {
        match &check.compiled {
            Ok(compiled) => {
                let note = if compiled.is_self_matching() {
                    " [replacement contains pattern]".yellow().to_string()
                } else {
                    String::new()
                };
                println!(
                    "{} Rule #{}: {} → {} ({} occurrences in input){}",
                    "✓".green(),
                    check.index,
                    check.rule.old_hex,
                    check.rule.new_hex,
                    check.occurrences,
                    note
                );
            }
            Err(reason) => {
                eprintln!("{} Rule #{}: {}", "✗".red(), check.index, reason);
                invalid += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} valid",
        format!("{}", checks.len() - invalid).green()
    );
    println!("  {} invalid", format!("{}", invalid).red());

    if invalid > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list(config: Option<PathBuf>) -> Result<()> {
    let (path, config) = load_config(config)?;

    println!("Rules in {}:", path.display());
    if config.replacements.is_empty() {
        println!("{}", "  No replacement rules found".yellow());
        return Ok(());
    }

    for (idx, rule) in config.replacements.iter().enumerate() {
        let (old, new) = match compile_rule(rule) {
            Ok(compiled) => (
                format_hex(compiled.old_bytes()),
                format_hex(compiled.new_bytes()),
            ),
            Err(_) => (normalize_hex(&rule.old_hex), normalize_hex(&rule.new_hex)),
        };
        println!("  #{:<3} {} → {}", idx + 1, old, new);
    }

    Ok(())
}
