use super::{
    colorize_status, json_pretty, spin_fail, spin_ok, spinner, TerminalPrompt, EXIT_SUCCESS,
};
use std::path::Path;
use tracing::debug;
use wpdev_core::{Orchestrator, StartOptions, StartReport, StartState, ThreadSleeper};
use wpdev_runtime::{ComposeCli, ComposeInstaller};
use wpdev_store::FileCacheProvider;

#[derive(Debug, Clone, Copy, Default)]
pub struct StartFlags {
    pub update: bool,
    pub debug: bool,
    pub port: Option<u16>,
}

pub fn run(project_root: &Path, home: &Path, flags: StartFlags, json: bool) -> Result<u8, String> {
    let mut options = StartOptions::new(project_root, home);
    options.update = flags.update;
    options.debug = flags.debug;
    options.port_override = flags.port;
    debug!(
        "starting {} (tool home {})",
        project_root.display(),
        home.display()
    );

    // Container output would tear through the spinner.
    let pb = if json || flags.debug {
        None
    } else {
        Some(spinner("starting environment..."))
    };

    let lifecycle = ComposeCli::new(flags.debug);
    let installer = ComposeInstaller::new(flags.debug);
    let prompt = TerminalPrompt::new(pb.clone());
    let sleeper = ThreadSleeper;
    let progress = |state: StartState| {
        if let Some(ref pb) = pb {
            pb.set_message(format!("{}...", state.description()));
        }
    };

    let orchestrator = Orchestrator::new(
        &lifecycle,
        &installer,
        &FileCacheProvider,
        &prompt,
        &sleeper,
    )
    .on_state(&progress);

    let report = match orchestrator.start(&options) {
        Ok(report) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "environment running");
            }
            report
        }
        Err(failure) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, &format!("start failed while {}", failure.state));
            }
            return Err(format!("{} (while {})", failure.source, failure.state));
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(EXIT_SUCCESS)
}

fn site_address(report: &StartReport) -> String {
    report
        .site_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", report.port))
}

fn print_report(report: &StartReport) {
    let status = if report.reconfigured {
        "reconfigured"
    } else {
        "running"
    };
    println!("status:   {}", colorize_status(status));
    println!("site:     {}", site_address(report));
    println!("database: 127.0.0.1:{}", report.database_port);
    println!("work dir: {}", report.work_directory.display());
    for warning in &report.warnings {
        eprintln!("{}: {warning}", colorize_status("warning"));
    }
}
