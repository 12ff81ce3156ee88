use anyhow::{Context, Result};
use clap::Parser;
use oas_compat::compat::{CheckConfig, CheckResult, Level};
use oas_compat::diff::{DiffConfig, Pattern};
use oas_compat::spec::{Compatibility, Spec};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oas-compat")]
#[command(about = "Diff OpenAPI contracts and detect breaking changes")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    #[command(about = "Compare two contracts for compatibility")]
    Compare {
        #[arg(help = "Path to the base contract")]
        base: PathBuf,
        #[arg(help = "Path to the revision contract")]
        revision: PathBuf,
        #[arg(long, help = "Treat both paths as directories of fragments")]
        composed: bool,
        #[arg(long, help = "Show detailed breaking change analysis")]
        detailed: bool,
    },
    #[command(about = "Print the structural diff between two contracts")]
    Diff {
        #[arg(help = "Path to the base contract")]
        base: PathBuf,
        #[arg(help = "Path to the revision contract")]
        revision: PathBuf,
        #[arg(long, help = "Treat both paths as directories of fragments")]
        composed: bool,
        #[arg(long, help = "Print added/deleted/modified counts only")]
        summary: bool,
        #[arg(long, help = "Output format", value_enum, default_value = "yaml")]
        format: DiffFormat,
        #[arg(long, help = "Ignore summary and description changes")]
        exclude_description: bool,
        #[arg(long, help = "Exit with status 1 when the contracts differ")]
        fail_on_diff: bool,
        #[command(flatten)]
        paths: PathArgs,
    },
    #[command(about = "Check for breaking changes")]
    Breaking {
        #[arg(help = "Path to the base contract")]
        base: PathBuf,
        #[arg(help = "Path to the revision contract")]
        revision: PathBuf,
        #[arg(long, help = "Treat both paths as directories of fragments")]
        composed: bool,
        #[arg(long, help = "Output format", value_enum, default_value = "text")]
        format: OutputFormat,
        #[arg(long, help = "YAML config file with a `breaking:` section")]
        config: Option<PathBuf>,
        #[arg(long, help = "Rules to use (comma-separated)")]
        use_rules: Option<String>,
        #[arg(long, help = "Categories to use (comma-separated)")]
        use_categories: Option<String>,
        #[arg(long, help = "Rules to exclude (comma-separated)")]
        except_rules: Option<String>,
        #[arg(long, help = "Only report WARN and ERR findings")]
        breaking_only: bool,
        #[arg(
            long,
            help = "Lowest level that fails the run",
            value_enum,
            ignore_case = true,
            default_value = "err"
        )]
        fail_on: FailOn,
        #[command(flatten)]
        paths: PathArgs,
    },
    #[command(about = "Generate semantic fingerprint for a contract")]
    Fingerprint {
        #[arg(help = "Path to the contract")]
        path: PathBuf,
        #[arg(long, help = "Treat the path as a directory of fragments")]
        composed: bool,
    },
}

/// Options selecting and renaming the paths that take part in a diff.
#[derive(clap::Args, Debug)]
struct PathArgs {
    #[arg(long, help = "Only compare paths matching this regular expression")]
    filter: Option<Pattern>,
    #[arg(long, help = "Skip operations with an extension name matching this regex")]
    filter_extension: Option<Pattern>,
    #[arg(long, default_value = "", help = "Prefix added to every base path")]
    prefix_base: String,
    #[arg(long, default_value = "", help = "Prefix added to every revision path")]
    prefix_revision: String,
    #[arg(long, default_value = "", help = "Prefix removed from every base path")]
    strip_prefix_base: String,
    #[arg(long, default_value = "", help = "Prefix removed from every revision path")]
    strip_prefix_revision: String,
    #[arg(long, help = "Do not compare paths and operations")]
    exclude_endpoints: bool,
}

impl PathArgs {
    fn into_diff_config(self) -> DiffConfig {
        DiffConfig {
            exclude_endpoints: self.exclude_endpoints,
            path_filter: self.filter,
            filter_extension: self.filter_extension,
            path_prefix_base: self.prefix_base,
            path_prefix_revision: self.prefix_revision,
            path_strip_prefix_base: self.strip_prefix_base,
            path_strip_prefix_revision: self.strip_prefix_revision,
            ..DiffConfig::new()
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DiffFormat {
    Yaml,
    Json,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FailOn {
    Err,
    Warn,
}

impl From<FailOn> for Level {
    fn from(fail_on: FailOn) -> Self {
        match fail_on {
            FailOn::Err => Level::Err,
            FailOn::Warn => Level::Warn,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Compare {
            base,
            revision,
            composed,
            detailed,
        } => {
            let base_spec = load_spec(&base, composed)?;
            let revision_spec = load_spec(&revision, composed)?;

            let compatibility = base_spec.compare_with(&revision_spec);
            match compatibility {
                Compatibility::Green => println!("Green: Contracts are semantically identical"),
                Compatibility::Yellow => {
                    println!("Yellow: Revision is backward-compatible with base")
                }
                Compatibility::Red => println!("Red: Breaking change detected"),
            }
            if detailed && compatibility != Compatibility::Green {
                let result = base_spec.check_breaking_changes(&revision_spec);
                println!(
                    "Detailed analysis: {} rules executed, {} findings",
                    result.executed_rules.len(),
                    result.changes.len()
                );
                for change in &result.changes {
                    println!("  - {} {}: {}", change.level, change.id, change.text);
                }
            }
            if compatibility == Compatibility::Red {
                std::process::exit(1);
            }
        }
        Commands::Diff {
            base,
            revision,
            composed,
            summary,
            format,
            exclude_description,
            fail_on_diff,
            paths,
        } => {
            let base_spec = load_spec(&base, composed)?;
            let revision_spec = load_spec(&revision, composed)?;

            let mut diff_config =
                CheckConfig::default().extend_diff_config(paths.into_diff_config());
            diff_config.exclude_description = exclude_description;
            let (diff, _) = base_spec.diff_with(&revision_spec, &diff_config);

            let output = match (summary, format) {
                (true, DiffFormat::Yaml) => serde_yaml::to_string(&diff.summary())?,
                (true, DiffFormat::Json) => serde_json::to_string_pretty(&diff.summary())?,
                (false, DiffFormat::Yaml) => serde_yaml::to_string(&diff)?,
                (false, DiffFormat::Json) => serde_json::to_string_pretty(&diff)?,
            };
            println!("{}", output.trim_end());

            if fail_on_diff && !diff.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Breaking {
            base,
            revision,
            composed,
            format,
            config,
            use_rules,
            use_categories,
            except_rules,
            breaking_only,
            fail_on,
            paths,
        } => {
            let base_spec = load_spec(&base, composed)?;
            let revision_spec = load_spec(&revision, composed)?;

            let mut config = match config {
                Some(path) => CheckConfig::from_yaml_file(&path)
                    .with_context(|| format!("Failed to load config '{}'", path.display()))?,
                None => CheckConfig::default(),
            };
            if let Some(rules) = use_rules {
                config.use_rules = split_list(&rules);
            }
            if let Some(categories) = use_categories {
                config.use_categories = split_list(&categories);
                config.validate()?;
            }
            if let Some(except) = except_rules {
                config.except_rules = split_list(&except);
            }
            config.breaking_only |= breaking_only;

            let result = base_spec.check_breaking_changes_filtered(
                &revision_spec,
                &config,
                paths.into_diff_config(),
            );

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&result)?.trim_end()),
                OutputFormat::Text => print_text(&result),
            }

            if result.count_at_least(fail_on.into()) > 0 {
                std::process::exit(1);
            }
        }
        Commands::Fingerprint { path, composed } => {
            let spec = load_spec(&path, composed)?;
            println!("{}", spec.fingerprint);
        }
    }

    Ok(())
}

fn load_spec(path: &Path, composed: bool) -> Result<Spec> {
    if composed {
        Spec::from_dir(path)
    } else {
        Spec::from_file(path)
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn print_text(result: &CheckResult) {
    if result.changes.is_empty() {
        println!("No breaking changes detected.");
        println!("Rules executed: {}", result.executed_rules.len());
        return;
    }

    println!("{} changes detected:", result.changes.len());
    for change in &result.changes {
        println!("  {} [{}] {} {}", change.level, change.id, change.operation, change.path);
        println!("    {}", change.text);
        if !change.source.is_empty() {
            println!("    Source: {}", change.source);
        }
        println!();
    }
    println!("Summary:");
    for (level, count) in &result.summary {
        println!("  {level}: {count}");
    }
    println!("  Rules executed: {}", result.executed_rules.len());
}
