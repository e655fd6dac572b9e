use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;
use walkdir::WalkDir;

use stubfmt_core::FormatConfig;

/// stubfmt: blank-line and stub-collapse formatter for .pyi declaration files
///
/// Collapses placeholder-bodied declarations onto one line and normalizes
/// the blank lines between statements. Use `-` to read stdin.
#[derive(Parser)]
#[command(name = "stubfmt", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (JSON); defaults to stubfmt.json or .stubfmt.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Format files in place
    Fmt {
        /// Files or directories (walked for *.pyi)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Skip the stability and equivalence check
        #[arg(long)]
        fast: bool,
        /// Print formatted output instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Report files that would be reformatted
    Check {
        /// Files or directories (walked for *.pyi)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a unified diff of pending changes
    Diff {
        /// Files or directories (walked for *.pyi)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Compute the SHA-256 fingerprint of the formatted file
    Hash {
        /// Path to .pyi file
        file: PathBuf,
    },

    /// Print the parsed statement tree as JSON
    Tree {
        /// Path to .pyi file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

// ── Sources ───────────────────────────────────────────────

enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    fn name(&self) -> String {
        match self {
            Source::Stdin => "-".to_string(),
            Source::File(path) => path.display().to_string(),
        }
    }

    fn read(&self) -> Result<String, String> {
        match self {
            Source::Stdin => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .map_err(|e| format!("cannot read stdin: {}", e))?;
                Ok(text)
            }
            Source::File(path) => fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e)),
        }
    }
}

fn collect_sources(paths: &[PathBuf]) -> Result<Vec<Source>, String> {
    let mut sources = Vec::new();
    for path in paths {
        if path.as_os_str() == "-" {
            sources.push(Source::Stdin);
        } else if path.is_dir() {
            sources.extend(find_stub_files(path)?.into_iter().map(Source::File));
        } else {
            sources.push(Source::File(path.clone()));
        }
    }
    Ok(sources)
}

/// All `*.pyi` files below `dir`, in sorted path order. Symlinks are not
/// followed.
fn find_stub_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| format!("cannot read directory {}: {}", dir.display(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().map_or(false, |ext| ext == "pyi") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

// ── Setup ─────────────────────────────────────────────────

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("STUBFMT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "debug",
                _ => "trace",
            }
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<FormatConfig, String> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => ["stubfmt.json", ".stubfmt.json"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file()),
    };

    let Some(path) = path else {
        return Ok(FormatConfig::default());
    };
    tracing::debug!(path = %path.display(), "loading config");
    let text = fs::read_to_string(&path)
        .map_err(|e| format!("cannot read config {}: {}", path.display(), e))?;
    FormatConfig::from_json(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn report_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

// ── Commands ──────────────────────────────────────────────

fn cmd_fmt(sources: &[Source], config: &FormatConfig, to_stdout: bool, quiet: bool) -> i32 {
    let mut reformatted = 0;
    let mut unchanged = 0;
    let mut failed = 0;

    for source in sources {
        let name = source.name();
        let result = source
            .read()
            .and_then(|text| {
                stubfmt_core::format_file_contents(&text, config)
                    .map(|formatted| (text, formatted))
                    .map_err(|e| format!("cannot format {}: {}", name, e))
            });

        let (text, formatted) = match result {
            Ok(pair) => pair,
            Err(message) => {
                report_error(&message);
                failed += 1;
                continue;
            }
        };

        let print = to_stdout || matches!(source, Source::Stdin);
        match formatted {
            Some(formatted) => {
                reformatted += 1;
                if print {
                    print!("{}", formatted);
                } else if let Source::File(path) = source {
                    if let Err(e) = fs::write(path, &formatted) {
                        report_error(&format!("cannot write {}: {}", name, e));
                        failed += 1;
                        continue;
                    }
                    if !quiet {
                        eprintln!("{} {}", "reformatted".bold(), name);
                    }
                }
            }
            None => {
                unchanged += 1;
                if print {
                    print!("{}", text);
                }
            }
        }
    }

    if !quiet {
        eprintln!(
            "{} reformatted, {} left unchanged, {} failed",
            plural(reformatted),
            plural(unchanged),
            plural(failed)
        );
    }
    if failed > 0 {
        2
    } else {
        0
    }
}

fn cmd_check(sources: &[Source], config: &FormatConfig, json: bool, quiet: bool) -> i32 {
    let mut changed = 0;
    let mut failed = 0;
    let mut entries = Vec::new();

    for source in sources {
        let name = source.name();
        let result = source.read().and_then(|text| {
            stubfmt_core::format_file_contents(&text, config).map_err(|e| e.to_string())
        });

        let entry = match result {
            Ok(Some(_)) => {
                changed += 1;
                if !json && !quiet {
                    println!("would reformat {}", name);
                }
                serde_json::json!({ "path": name, "status": "would_reformat" })
            }
            Ok(None) => serde_json::json!({ "path": name, "status": "unchanged" }),
            Err(message) => {
                failed += 1;
                if !json {
                    report_error(&format!("cannot check {}: {}", name, message));
                }
                serde_json::json!({ "path": name, "status": "error", "error": message })
            }
        };
        entries.push(entry);
    }

    if json {
        let report = serde_json::json!({
            "files": entries,
            "would_reformat": changed,
            "errors": failed,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
        );
    } else if !quiet {
        eprintln!(
            "{} would be reformatted, {} would be left unchanged, {} failed",
            plural(changed),
            plural(sources.len() - changed - failed),
            plural(failed)
        );
    }

    exit_code(changed, failed)
}

fn cmd_diff(sources: &[Source], config: &FormatConfig) -> i32 {
    let mut changed = 0;
    let mut failed = 0;

    for source in sources {
        let name = source.name();
        let result = source.read().and_then(|text| {
            stubfmt_core::format_file_contents(&text, config)
                .map(|formatted| (text, formatted))
                .map_err(|e| e.to_string())
        });

        match result {
            Ok((text, Some(formatted))) => {
                changed += 1;
                print_diff(&name, &text, &formatted);
            }
            Ok((_, None)) => {}
            Err(message) => {
                failed += 1;
                report_error(&format!("cannot diff {}: {}", name, message));
            }
        }
    }

    exit_code(changed, failed)
}

fn print_diff(name: &str, original: &str, formatted: &str) {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, formatted);

    println!("{}", format!("--- {}\t(original)", name).bold());
    println!("{}", format!("+++ {}\t(formatted)", name).bold());
    for group in diff.grouped_ops(3) {
        let (first, last) = match (group.first(), group.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => continue,
        };
        let old = first.old_range().start..last.old_range().end;
        let new = first.new_range().start..last.new_range().end;
        println!(
            "{}",
            format!(
                "@@ -{},{} +{},{} @@",
                old.start + 1,
                old.len(),
                new.start + 1,
                new.len()
            )
            .cyan()
        );

        for op in &group {
            for change in diff.iter_changes(op) {
                let line = change.value().trim_end_matches('\n');
                match change.tag() {
                    ChangeTag::Equal => println!(" {}", line),
                    ChangeTag::Delete => println!("{}", format!("-{}", line).red()),
                    ChangeTag::Insert => println!("{}", format!("+{}", line).green()),
                }
            }
        }
    }
}

fn cmd_hash(file: &Path, config: &FormatConfig) -> i32 {
    let source = source_for(file);
    let result = source
        .read()
        .and_then(|text| stubfmt_core::fingerprint(&text, config).map_err(|e| e.to_string()));
    match result {
        Ok(hash) => {
            println!("{}", hash);
            0
        }
        Err(message) => {
            report_error(&message);
            2
        }
    }
}

fn cmd_tree(file: &Path) -> i32 {
    let source = source_for(file);
    let result = source.read().and_then(|text| {
        let tree = stubfmt_core::parse(&text).map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&tree).map_err(|e| format!("cannot serialize tree: {}", e))
    });
    match result {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(message) => {
            report_error(&message);
            2
        }
    }
}

fn source_for(file: &Path) -> Source {
    if file.as_os_str() == "-" {
        Source::Stdin
    } else {
        Source::File(file.to_path_buf())
    }
}

fn exit_code(changed: usize, failed: usize) -> i32 {
    if failed > 0 {
        2
    } else if changed > 0 {
        1
    } else {
        0
    }
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", count)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Commands::Version = cli.command {
        println!(
            "stubfmt {} (stubfmt-core {})",
            env!("CARGO_PKG_VERSION"),
            stubfmt_core::VERSION
        );
        process::exit(0);
    }

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            report_error(&message);
            process::exit(2);
        }
    };

    let exit_code = match cli.command {
        Commands::Fmt {
            files,
            fast,
            stdout,
        } => {
            config.fast |= fast;
            match collect_sources(&files) {
                Ok(sources) => cmd_fmt(&sources, &config, stdout, cli.quiet),
                Err(message) => {
                    report_error(&message);
                    2
                }
            }
        }
        Commands::Check { files, json } => match collect_sources(&files) {
            Ok(sources) => cmd_check(&sources, &config, json, cli.quiet),
            Err(message) => {
                report_error(&message);
                2
            }
        },
        Commands::Diff { files } => match collect_sources(&files) {
            Ok(sources) => cmd_diff(&sources, &config),
            Err(message) => {
                report_error(&message);
                2
            }
        },
        Commands::Hash { file } => cmd_hash(&file, &config),
        Commands::Tree { file } => cmd_tree(&file),
        Commands::Version => 0,
    };

    process::exit(exit_code);
}
