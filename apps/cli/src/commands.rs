//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use jobowners_core::pipeline::{ProgressReporter, ScanConfig, ScanResult};
use jobowners_shared::{AppConfig, JobNode, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// jobowners: find known owners in Jenkins job configurations.
#[derive(Parser)]
#[command(
    name = "jobowners",
    version,
    about = "Crawl Jenkins jobs and report which known owners each job's config mentions.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./jobowners.toml, then ~/.jobowners/jobowners.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `scan` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check every job and write the owner report.
    Scan(ScanArgs),

    /// Print the job tree without fetching configurations.
    Jobs(ConnectArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Connection flags shared by commands that talk to Jenkins.
#[derive(clap::Args, Default)]
pub(crate) struct ConnectArgs {
    /// Credentials file: URL, username and API token on three lines.
    /// Falls back to JENKINS_URL / JENKINS_USERNAME / JENKINS_API_KEY.
    #[arg(long)]
    pub api_key_file: Option<PathBuf>,

    /// Folder levels expanded when listing jobs.
    #[arg(long)]
    pub folder_depth: Option<u32>,
}

#[derive(clap::Args, Default)]
pub(crate) struct ScanArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Owner list, one identifier per line.
    #[arg(long)]
    pub owners_file: Option<PathBuf>,

    /// Report destination.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "jobowners=info",
        1 => "jobowners=debug",
        _ => "jobowners=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or_else(|| Command::Scan(ScanArgs::default())) {
        Command::Scan(args) => cmd_scan(&config, args).await,
        Command::Jobs(args) => cmd_jobs(&config, args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Merge config file values with CLI overrides.
fn scan_config(config: &AppConfig, connect: ConnectArgs) -> ScanConfig {
    let mut scan = ScanConfig::from(config);
    if let Some(path) = connect.api_key_file {
        scan.api_key_file = path;
    }
    if let Some(depth) = connect.folder_depth {
        scan.client.folder_depth = depth;
    }
    scan
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scan(config: &AppConfig, args: ScanArgs) -> Result<()> {
    let mut scan = scan_config(config, args.connect);
    if let Some(path) = args.owners_file {
        scan.owners_file = path;
    }
    if let Some(path) = args.out {
        scan.report_file = path;
    }

    info!(
        api_key_file = %scan.api_key_file.display(),
        owners_file = %scan.owners_file.display(),
        report = %scan.report_file.display(),
        "scanning jobs"
    );

    let reporter = CliProgress::new();
    let result = jobowners_core::pipeline::scan(&scan, &reporter).await?;

    println!();
    println!("  Scan complete");
    println!("  Jobs:         {}", result.jobs_checked());
    println!("  With owners:  {}", result.jobs_with_owners());
    println!("  Fetch errors: {}", result.fetch_errors.len());
    for (path, error) in &result.fetch_errors {
        println!("    {path}: {error}");
    }
    println!("  Report:       {}", result.report_path.display());
    println!("  Time:         {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_jobs(config: &AppConfig, args: ConnectArgs) -> Result<()> {
    let scan = scan_config(config, args);
    let roots = jobowners_core::pipeline::list_job_tree(&scan).await?;

    let total: usize = roots.iter().map(JobNode::leaf_count).sum();
    print!("{}", render_tree(&roots));
    println!("{total} jobs");

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

/// Indented outline of the job tree; folders end with `/`.
fn render_tree(roots: &[JobNode]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&JobNode, usize)> = roots.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        if node.is_folder() {
            out.push_str(&format!("{indent}{}/\n", node.name()));
            stack.extend(node.children().iter().rev().map(|n| (n, depth + 1)));
        } else {
            out.push_str(&format!("{indent}{}\n", node.name()));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn job_checked(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Checking [{current}/{total}] {name}"));
    }

    fn done(&self, _result: &ScanResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_scan() {
        let cli = Cli::try_parse_from(["jobowners"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "jobowners",
            "scan",
            "--folder-depth",
            "2",
            "--out",
            "/tmp/owners.csv",
        ])
        .unwrap();
        let Some(Command::Scan(args)) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.out, Some(PathBuf::from("/tmp/owners.csv")));

        let scan = scan_config(&AppConfig::default(), args.connect);
        assert_eq!(scan.client.folder_depth, 2);
        assert_eq!(scan.api_key_file, PathBuf::from(".api_key"));
    }

    #[test]
    fn tree_rendering_indents_folders() {
        let roots = vec![
            JobNode::folder(
                "team",
                "u",
                vec![JobNode::job("build", "u"), JobNode::job("deploy", "u")],
            ),
            JobNode::job("nightly", "u"),
        ];
        assert_eq!(render_tree(&roots), "team/\n  build\n  deploy\nnightly\n");
    }
}
