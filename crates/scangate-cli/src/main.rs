mod logging;
mod settings;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use scangate_core::prelude::*;
use settings::Overrides;
use std::ffi::OsString;
use std::path::PathBuf;

fn cli() -> Command {
    let checkout_args = [
        Arg::new("workdir")
            .long("workdir")
            .value_parser(value_parser!(PathBuf))
            .help("Directory holding (or receiving) the source tree"),
        Arg::new("ref")
            .long("ref")
            .help("Reference that triggered the run"),
        Arg::new("repository")
            .long("repository")
            .help("Remote to clone when the workdir is not a checkout"),
    ];

    Command::new("scangate")
        .version(scangate_core::VERSION)
        .about("Credential-gated static analysis runner")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./scangate.toml when present)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output the report as JSON"),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Step-output file for should-run (default: $GITHUB_OUTPUT)"),
        )
        .arg(
            Arg::new("trigger")
                .long("trigger")
                .global(true)
                .default_value("manual")
                .value_parser(["manual", "workflow_dispatch", "schedule"])
                .help("What started this run"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log level or filter directive"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only log warnings and errors"),
        )
        .subcommand(Command::new("check").about("Run the gate check only"))
        .subcommand(
            Command::new("run")
                .about("Run the gate check and, when cleared, the analysis")
                .args(checkout_args.clone()),
        )
        .subcommand(
            Command::new("plan")
                .about("Print the commands the analysis would run, without running them")
                .args(checkout_args),
        )
}

/// Global value, looked up on the subcommand first.
fn global_one<'a, T>(matches: &'a ArgMatches, sub: &'a ArgMatches, id: &str) -> Option<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    sub.get_one::<T>(id).or_else(|| matches.get_one::<T>(id))
}

fn load_config(matches: &ArgMatches, sub: &ArgMatches) -> anyhow::Result<ScanGateConfig> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let explicit = global_one::<PathBuf>(matches, sub, "config");
    let mut config = ScanGateConfig::discover(explicit.map(PathBuf::as_path), &cwd)?;
    Overrides::from_matches(matches, Some(sub)).apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Read the credential at the process boundary; the core only ever sees the value passed in.
fn read_credential<E>(env: &E, name: &str) -> Option<Credential>
where
    E: Fn(&str) -> Option<OsString>,
{
    env(name).map(|v| Credential::new(v.to_string_lossy().into_owned()))
}

fn print_report(report: &PipelineReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Trigger: {}", report.trigger);
    println!("Decision: {:?} ({})", report.decision.decision(), report.decision.reason());
    println!("Gate: {:?}", report.gate);
    println!("Analysis: {:?}", report.runner);
    if let Some(runner) = &report.runner_report {
        for step in &runner.steps {
            println!("  ✓ {} ({}ms)", step.kind, step.duration_ms);
        }
    }
    if let Some(step) = report.failed_step {
        println!("  ✗ {step}");
    }
    if let Some(error) = &report.error {
        println!("Error: {error}");
    }
    println!("Outcome: {:?}", report.outcome);
    Ok(())
}

fn print_plan(plan: &RunPlan, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }
    for step in plan.steps() {
        println!("{}:", step.kind);
        for command in &step.commands {
            println!("  {command}");
        }
    }
    Ok(())
}

/// Run one subcommand against a resolved config. `env` stands in for the process environment.
async fn run_command<E>(
    name: &str,
    matches: &ArgMatches,
    sub: &ArgMatches,
    config: ScanGateConfig,
    env: E,
) -> anyhow::Result<ExitStatus>
where
    E: Fn(&str) -> Option<OsString>,
{
    let json = matches.get_flag("json") || sub.get_flag("json");
    let trigger = global_one::<String>(matches, sub, "trigger")
        .map_or(Ok(TriggerKind::Manual), |s| s.parse::<TriggerKind>())
        .map_err(anyhow::Error::msg)?
        .into_trigger(&config.schedule.cron);
    let output_file = global_one::<PathBuf>(matches, sub, "output-file")
        .cloned()
        .or_else(|| env("GITHUB_OUTPUT").map(PathBuf::from));

    tracing::info!(command = name, trigger = %trigger, "starting scangate");
    let credential = read_credential(&env, &config.gate.credential_env);
    let outputs: Arc<dyn OutputSink> = Arc::new(WorkflowOutputs::new(output_file));

    let pipeline = Pipeline::new(config, trigger, outputs);

    match name {
        "check" => {
            let report = pipeline.check(credential);
            print_report(&report, json)?;
            Ok(report.exit_status())
        }
        "run" => {
            let report = pipeline.execute(credential).await;
            print_report(&report, json)?;
            Ok(report.exit_status())
        }
        "plan" => {
            print_plan(&pipeline.plan(), json)?;
            Ok(ExitStatus::Success)
        }
        other => anyhow::bail!("unknown subcommand `{other}`"),
    }
}

async fn dispatch(matches: ArgMatches) -> anyhow::Result<ExitStatus> {
    let (name, sub) = matches
        .subcommand()
        .context("a subcommand is required")?;
    let config = load_config(&matches, sub)?;
    logging::init(&config.logging);
    tracing::debug!(?config, "configuration resolved");

    run_command(name, &matches, sub, config, |key: &str| std::env::var_os(key)).await
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let status = match dispatch(matches).await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitStatus::Usage
        }
    };

    std::process::exit(status.code());
}
