// crates/riskprobe-cli/src/main.rs
// ============================================================================
// Module: riskprobe CLI Entry Point
// Description: Command dispatcher for harness runs, benchmarks, and the mock.
// Purpose: Select cases by tag and map the run verdict onto the exit code.
// Dependencies: clap, riskprobe-config, riskprobe-load, riskprobe-mock, riskprobe-suites, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! `riskprobe run` executes the selected catalog cases and exits 0 only when
//! every one passed. `riskprobe list` prints the selection without running
//! it, `riskprobe bench` runs one ad-hoc benchmark, and `riskprobe mock`
//! serves the deterministic stub. Logging goes to stderr through
//! `tracing-subscriber`; results go to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use riskprobe_cli::bind_policy::enforce_local_only;
use riskprobe_cli::bind_policy::resolve_allow_non_loopback;
use riskprobe_cli::render;
use riskprobe_config::HarnessConfig;
use riskprobe_config::ProcessEnv;
use riskprobe_core::Tag;
use riskprobe_core::scenarios::canonical_request;
use riskprobe_load::Workload;
use riskprobe_load::assert_sla;
use riskprobe_load::run_benchmark;
use riskprobe_mock::MockBehavior;
use riskprobe_mock::MockMode;
use riskprobe_suites::HarnessSession;
use riskprobe_suites::run_selected;
use riskprobe_suites::select;
use riskprobe_suites::write_report;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default directory for `report.json`.
const DEFAULT_REPORT_DIR: &str = "reports";

/// Default bind address for the standalone mock.
const DEFAULT_MOCK_BIND: &str = "127.0.0.1:8000";

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Black-box contract and load testing for the cardiac risk inference API.
#[derive(Parser, Debug)]
#[command(name = "riskprobe", version, about)]
struct Cli {
    /// Enable debug logging (overrides `RUST_LOG`).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the selected test cases and write a report.
    Run(RunCommand),
    /// List the selected test cases without running them.
    List(ListCommand),
    /// Run one benchmark and check it against the SLA.
    Bench(BenchCommand),
    /// Serve the deterministic mock inference API.
    Mock(MockCommand),
}

/// Configuration source shared by commands that reach the model.
#[derive(Args, Debug)]
struct TargetArgs {
    /// TOML configuration file layered under environment overrides.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Call the configured `MODEL_URL` instead of the in-process mock.
    #[arg(long)]
    no_mock: bool,
}

/// Arguments for `riskprobe run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Tags to select (`p0`, `p1`, `p2`, `performance`, `load`); repeatable.
    #[arg(long = "tag", value_name = "TAG", value_parser = parse_tag)]
    tags: Vec<Tag>,
    /// Model target.
    #[command(flatten)]
    target: TargetArgs,
    /// Directory receiving `report.json`.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_REPORT_DIR)]
    report_dir: PathBuf,
}

/// Arguments for `riskprobe list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Tags to select; repeatable.
    #[arg(long = "tag", value_name = "TAG", value_parser = parse_tag)]
    tags: Vec<Tag>,
    /// TOML configuration file (sizes the performance cases).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Arguments for `riskprobe bench`.
#[derive(Args, Debug)]
struct BenchCommand {
    /// Calls to issue (defaults to the configured load size).
    #[arg(long, value_name = "N")]
    requests: Option<usize>,
    /// Concurrent workers (defaults to the configured load concurrency).
    #[arg(long, value_name = "C")]
    concurrency: Option<usize>,
    /// Vary patient id, age, and sex per call instead of repeating one body.
    #[arg(long)]
    varied: bool,
    /// Model target.
    #[command(flatten)]
    target: TargetArgs,
}

/// Arguments for `riskprobe mock`.
#[derive(Args, Debug)]
struct MockCommand {
    /// Socket address to listen on.
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_MOCK_BIND)]
    bind: String,
    /// Allow binding beyond loopback.
    #[arg(long)]
    allow_non_loopback: bool,
    /// Contract behavior to serve.
    #[arg(long, value_enum, default_value_t = MockModeArg::Compliant)]
    mode: MockModeArg,
    /// Delay before every reply, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 0)]
    delay_ms: u64,
    /// Answer every Nth request with HTTP 503 (0 disables).
    #[arg(long, value_name = "N", default_value_t = 0)]
    fail_every: u64,
    /// Inference route.
    #[arg(long, value_name = "PATH", default_value = "/v1/model/infer")]
    infer_path: String,
}

/// Mock contract modes accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum MockModeArg {
    /// Honor every contract rule.
    Compliant,
    /// Echo the chief complaint into warnings.
    EchoComplaint,
    /// Report a label outside the whitelist.
    OffContractLabel,
}

impl From<MockModeArg> for MockMode {
    fn from(value: MockModeArg) -> Self {
        match value {
            MockModeArg::Compliant => Self::Compliant,
            MockModeArg::EchoComplaint => Self::EchoComplaint,
            MockModeArg::OffContractLabel => Self::OffContractLabel,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Message written to stderr.
    message: String,
}

impl CliError {
    /// Creates a CLI error.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::List(command) => command_list(&command),
        Commands::Bench(command) => command_bench(command).await,
        Commands::Mock(command) => command_mock(command).await,
    }
}

/// Installs the stderr log subscriber.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the selected cases and writes the report.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.target.config.as_deref(), command.target.no_mock)?;
    let session = HarnessSession::start(&config)
        .map_err(|err| CliError::new(format!("failed to start session: {err}")))?;
    let report = run_selected(&session, &command.tags).await;
    for outcome in &report.outcomes {
        print_line(&render::outcome_line(outcome))?;
    }
    if let Some(summary) = &report.latency_summary {
        print_line("latency summary:")?;
        for line in render::stats_lines(summary) {
            print_line(&line)?;
        }
    }
    print_line(&render::summary_line(&report))?;
    let path = write_report(&report, &command.report_dir)
        .map_err(|err| CliError::new(format!("failed to write report: {err}")))?;
    print_line(&format!("report: {}", path.display()))?;
    Ok(if report.all_passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Prints the selected cases.
fn command_list(command: &ListCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref(), false)?;
    let cases = select(&config.performance, &command.tags);
    for case in &cases {
        print_line(&render::case_line(case))?;
    }
    print_line(&format!("{} cases selected", cases.len()))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs one benchmark and prints its statistics and SLA verdict.
async fn command_bench(command: BenchCommand) -> CliResult<ExitCode> {
    let config = load_config(command.target.config.as_deref(), command.target.no_mock)?;
    let requests = command.requests.unwrap_or(config.performance.load_requests);
    let concurrency = command.concurrency.unwrap_or(config.performance.load_concurrency);
    let session = HarnessSession::start(&config)
        .map_err(|err| CliError::new(format!("failed to start session: {err}")))?;
    let workload = if command.varied {
        Workload::varied(requests)
    } else {
        Workload::single(&canonical_request())
    };
    let stats = run_benchmark(session.client(), &workload, requests, concurrency)
        .await
        .map_err(|err| CliError::new(format!("benchmark failed: {err}")))?;
    for line in render::stats_lines(&stats) {
        print_line(&line)?;
    }
    let verdict = assert_sla(&stats, &config.performance.sla);
    print_line(&render::sla_verdict(&verdict))?;
    Ok(if verdict.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Serves the mock until Ctrl-C.
async fn command_mock(command: MockCommand) -> CliResult<ExitCode> {
    let allow = resolve_allow_non_loopback(command.allow_non_loopback, &ProcessEnv)
        .map_err(|err| CliError::new(err.to_string()))?;
    let outcome =
        enforce_local_only(&command.bind, allow).map_err(|err| CliError::new(err.to_string()))?;
    if outcome.network_exposed {
        tracing::warn!(addr = %outcome.addr, "mock is reachable beyond loopback");
    }
    let behavior = MockBehavior::default()
        .with_mode(command.mode.into())
        .with_delay(Duration::from_millis(command.delay_ms))
        .with_fail_every(command.fail_every)
        .with_infer_path(command.infer_path);
    riskprobe_mock::serve(outcome.addr, behavior)
        .await
        .map_err(|err| CliError::new(format!("mock server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses one `--tag` value.
fn parse_tag(raw: &str) -> Result<Tag, String> {
    Tag::parse(raw).ok_or_else(|| {
        format!("unknown tag '{raw}' (expected p0, p1, p2, performance, or load)")
    })
}

/// Loads configuration once for the run, honoring `--no-mock`.
fn load_config(path: Option<&Path>, no_mock: bool) -> CliResult<HarnessConfig> {
    let mut config = HarnessConfig::load(path)
        .map_err(|err| CliError::new(format!("invalid configuration: {err}")))?;
    if no_mock {
        config.use_mock = false;
    }
    Ok(config)
}

/// Writes a line to stdout, mapping I/O failures.
fn print_line(message: &str) -> CliResult<()> {
    write_stdout_line(message)
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
