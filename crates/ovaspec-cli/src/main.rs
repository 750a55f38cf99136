//! ovaspec CLI - Generate import specifications for OVF/OVA packages.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ovaspec_core::{is_remote, read_envelope, read_spec, Envelope, Options, ReaderConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the default log filter.
const LOG_ENV: &str = "OVASPEC_LOG";

/// Log filter used when neither --log-level nor OVASPEC_LOG is set.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Build editable import specifications from OVF/OVA packages.
#[derive(Parser)]
#[command(name = "ovaspec")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. "debug" or "ovaspec_core=trace" (default: $OVASPEC_LOG or "warn").
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the import specification for a package.
    Spec {
        /// Path or http(s) URL of the .ovf or .ova package. Without it the
        /// default specification is printed.
        path: Option<String>,

        /// Include every legal choice and the full property definitions.
        #[arg(short, long)]
        verbose: bool,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "json")]
        format: FormatArg,

        #[command(flatten)]
        reader: ReaderArgs,

        /// Suppress the progress spinner.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Display information about a package.
    Info {
        /// Path or http(s) URL of the .ovf or .ova package.
        path: String,

        #[command(flatten)]
        reader: ReaderArgs,
    },
}

/// Archive reader settings shared by all subcommands.
#[derive(clap::Args)]
struct ReaderArgs {
    /// Timeout in seconds for fetching remote packages.
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Verify the descriptor against the OVA manifest, if one is present.
    #[arg(long)]
    verify_manifest: bool,
}

impl From<&ReaderArgs> for ReaderConfig {
    fn from(args: &ReaderArgs) -> Self {
        ReaderConfig::new(Duration::from_secs(args.timeout), args.verify_manifest)
    }
}

/// Output format argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Indented JSON.
    Json,
    /// Single-line JSON.
    Compact,
    /// Rust debug representation.
    Dump,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Spec {
            path,
            verbose,
            format,
            reader,
            quiet,
        } => {
            run_spec(path.as_deref(), verbose, format, &(&reader).into(), quiet)?;
        }
        Commands::Info { path, reader } => {
            show_info(&path, &(&reader).into())?;
        }
    }

    Ok(())
}

/// Install a stderr subscriber so stdout carries only command output.
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = log_filter(level, std::env::var(LOG_ENV).ok())?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// Build the log filter from --log-level, then OVASPEC_LOG, then the default.
fn log_filter(level: Option<&str>, env: Option<String>) -> Result<EnvFilter> {
    let Some(directives) = level.map(str::to_string).or(env) else {
        return Ok(EnvFilter::new(DEFAULT_LOG_LEVEL));
    };
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter '{directives}'"))
}

fn run_spec(
    path: Option<&str>,
    verbose: bool,
    format: FormatArg,
    config: &ReaderConfig,
    quiet: bool,
) -> Result<()> {
    tracing::debug!(?path, verbose, ?format, "generating specification");

    let options = with_spinner(path, quiet, || read_spec(path, config, verbose))?;

    println!("{}", render(&options, format)?);
    Ok(())
}

/// Encode the specification in the requested format.
fn render(options: &Options, format: FormatArg) -> Result<String> {
    let output = match format {
        FormatArg::Json => {
            options
                .to_json_pretty()
                .context("failed to encode specification")?
        }
        FormatArg::Compact => {
            serde_json::to_string(options).context("failed to encode specification")?
        }
        FormatArg::Dump => format!("{options:#?}"),
    };
    Ok(output)
}

/// Run `read`, showing a spinner while a remote package is fetched.
fn with_spinner<T>(
    path: Option<&str>,
    quiet: bool,
    read: impl FnOnce() -> ovaspec_core::Result<T>,
) -> Result<T> {
    let spinner = match path {
        Some(path) if is_remote(path) && !quiet => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
            pb.set_message(format!("Fetching {path}"));
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        }
        _ => None,
    };

    let result = read();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match path {
        Some(path) => result.with_context(|| format!("failed to read package '{path}'")),
        None => Ok(result?),
    }
}

fn show_info(path: &str, config: &ReaderConfig) -> Result<()> {
    let envelope: Envelope = with_spinner(Some(path), true, || read_envelope(path, config))?;

    println!("Package Information");
    println!("===================");
    println!();
    println!("Source:    {}", path);

    match &envelope.virtual_system {
        Some(system) => {
            println!("Name:      {}", system.name.as_deref().unwrap_or(&system.id));
            println!("ID:        {}", system.id);
            if !system.info.is_empty() {
                println!("Info:      {}", system.info);
            }
        }
        None => println!("Name:      (no virtual system)"),
    }
    println!();

    let products = envelope.products();
    if products.is_empty() {
        println!("Products:  None");
    } else {
        println!("Products:");
        for (i, product) in products.iter().enumerate() {
            let configurable = product
                .property
                .iter()
                .filter(|p| p.is_user_configurable())
                .count();
            println!(
                "  {}. {} - {} properties ({} configurable)",
                i + 1,
                describe_product(product),
                product.property.len(),
                configurable
            );
        }
    }
    println!();

    let networks = envelope.networks();
    if networks.is_empty() {
        println!("Networks:  None");
    } else {
        println!("Networks:");
        for network in networks {
            match &network.description {
                Some(description) => println!("  - {} ({})", network.name, description),
                None => println!("  - {}", network.name),
            }
        }
    }
    println!();

    let configurations = envelope.configurations();
    if configurations.is_empty() {
        println!("Deployment options: None");
    } else {
        println!("Deployment options:");
        for config in configurations {
            let label = config.label.as_deref().unwrap_or(&config.id);
            let marker = if config.is_default() { " [default]" } else { "" };
            println!("  - {} ({}){}", config.id, label, marker);
        }
    }

    Ok(())
}

/// One-line product summary: name, version and vendor where declared.
fn describe_product(product: &ovaspec_core::ovf::ProductSection) -> String {
    let mut description = product
        .product
        .clone()
        .unwrap_or_else(|| "Unnamed product".to_string());
    if let Some(version) = &product.version {
        description.push(' ');
        description.push_str(version);
    }
    if let Some(vendor) = &product.vendor {
        description.push_str(&format!(" ({})", vendor));
    }
    if let Some(class) = &product.class {
        description.push_str(&format!(" [class {}]", class));
    }
    description
}
