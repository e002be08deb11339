mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use venvkit_core::config::ProvisionConfig;
use venvkit_core::observability;
use venvkit_provision::{ProvisionError, ProvisionOptions, Provisioner, Step, SystemRunner};

fn main() {
    observability::init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match failed_step(&err) {
            Some(step) => tracing::error!(step = %step, "provisioning stopped"),
            None => tracing::debug!(error = ?err, "venvkit failed"),
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = ProvisionConfig::from_env().with_cli_overrides(cli.overrides());
    let options = ProvisionOptions::from_config(&cfg)?.with_check_dependencies(cli.check);
    let runner = SystemRunner::new().with_stdout_to_stderr(cli.json);
    let provisioner = Provisioner::new(options, runner);

    if cli.dry_run {
        let plan = provisioner.plan()?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            for line in plan.summary_lines() {
                println!("{}", line);
            }
        }
        return Ok(());
    }

    let report = provisioner.run()?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report.summary_lines() {
            println!("{}", line);
        }
    }
    Ok(())
}

fn failed_step(err: &anyhow::Error) -> Option<Step> {
    err.downcast_ref::<ProvisionError>()
        .and_then(ProvisionError::step)
}

/// Provisioning errors carry their own exit status; anything else is 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ProvisionError>()
        .map(ProvisionError::exit_code)
        .unwrap_or(1)
}
