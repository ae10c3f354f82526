mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_RUNTIME_ERROR};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use wpdev_core::install_signal_handler;

#[derive(Debug, Parser)]
#[command(
    name = "wpdev",
    version,
    about = "Local WordPress development environments on docker compose"
)]
struct Cli {
    /// Directory holding per-project work directories.
    #[arg(long, env = "WPDEV_HOME", default_value = "~/.wpdev", global = true)]
    home: String,

    /// WordPress project root.
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the development environment, reconfiguring it if wpdev.toml changed.
    Start {
        /// Reconfigure even if the configuration is unchanged.
        #[arg(long, default_value_t = false)]
        update: bool,
        /// Show container engine output.
        #[arg(long, default_value_t = false)]
        debug: bool,
        /// Override the development port.
        #[arg(long, env = "WPDEV_PORT")]
        port: Option<u16>,
    },
    /// Stop and remove the environment's containers.
    Stop {
        /// Show container engine output.
        #[arg(long, default_value_t = false)]
        debug: bool,
    },
    /// Print the generated compose document without touching containers.
    Topology {
        /// Override the development port.
        #[arg(long, env = "WPDEV_PORT")]
        port: Option<u16>,
    },
    /// Run diagnostic checks on the host and the project configuration.
    Doctor,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("WPDEV_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let home = expand_tilde(&cli.home);
    let json_output = cli.json;

    let result = resolve_project_root(&cli.project).and_then(|project_root| match cli.command {
        Commands::Start {
            update,
            debug,
            port,
        } => {
            if std::env::var("WPDEV_SKIP_PREREQS").as_deref() != Ok("1") {
                let missing = wpdev_runtime::check_compose_prereqs();
                if !missing.is_empty() {
                    return Err(wpdev_runtime::format_missing(&missing));
                }
            }
            commands::start::run(
                &project_root,
                &home,
                commands::start::StartFlags {
                    update,
                    debug,
                    port,
                },
                json_output,
            )
        }
        Commands::Stop { debug } => commands::stop::run(&project_root, &home, debug, json_output),
        Commands::Topology { port } => {
            commands::topology::run(&project_root, &home, port, json_output)
        }
        Commands::Doctor => commands::doctor::run(&project_root, &home, json_output),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("runtime error:") {
                EXIT_RUNTIME_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}

/// The work directory is keyed on the project root, so it must be absolute
/// and free of `.` segments.
fn resolve_project_root(path: &Path) -> Result<PathBuf, String> {
    std::fs::canonicalize(path)
        .map_err(|e| format!("cannot open project directory {}: {e}", path.display()))
}
