use super::{load_config, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::Path;
use wpdev_runtime::rewrite_rules_exist;
use wpdev_schema::{config_checksum, ProjectConfig, CONFIG_FILE_NAME};
use wpdev_store::{ChangeCache, FileCacheProvider, CONFIG_CACHE_KEY};

pub fn run(project_root: &Path, home: &Path, json_output: bool) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    check_prereqs(&mut checks, &mut all_pass);

    match load_config(project_root, home, None, false) {
        Ok(config) => {
            if config.detected_local_config {
                checks.push(Check::pass("config", &format!("{CONFIG_FILE_NAME} is valid")));
            } else {
                checks.push(Check::info(
                    "config",
                    &format!("No {CONFIG_FILE_NAME} found (defaults will be used)"),
                ));
            }
            check_project(&config, &mut checks);
            check_cache(&config, &mut checks);
        }
        Err(e) => {
            all_pass = false;
            checks.push(Check::fail("config", &e));
        }
    }

    print_results(&checks, all_pass, json_output)
}

fn check_prereqs(checks: &mut Vec<Check>, all_pass: &mut bool) {
    let missing = wpdev_runtime::check_compose_prereqs();
    if missing.is_empty() {
        checks.push(Check::pass(
            "runtime_prereqs",
            "Container engine and compose plugin available",
        ));
    } else {
        *all_pass = false;
        checks.push(Check::fail(
            "runtime_prereqs",
            &format!(
                "Missing prerequisites: {}",
                wpdev_runtime::format_missing(&missing)
            ),
        ));
    }
}

fn check_project(config: &ProjectConfig, checks: &mut Vec<Check>) {
    let env = config.development();
    checks.push(Check::info(
        "environments",
        &format!(
            "Environments: {} (development on port {})",
            config.environments.names().join(", "),
            env.port
        ),
    ));

    if env.public_directory.is_dir() {
        checks.push(Check::pass(
            "public_directory",
            &format!("Public directory {}", env.public_directory.display()),
        ));
    } else {
        checks.push(Check::warn(
            "public_directory",
            &format!(
                "Public directory {} does not exist yet",
                env.public_directory.display()
            ),
        ));
    }

    if rewrite_rules_exist(&env.public_directory) {
        checks.push(Check::pass("rewrite_rules", "Rewrite rules present"));
    } else {
        checks.push(Check::info(
            "rewrite_rules",
            "Rewrite rules missing (will be written on start)",
        ));
    }
}

fn check_cache(config: &ProjectConfig, checks: &mut Vec<Check>) {
    // Opening the cache creates the work directory; don't do that here.
    if !config.work_directory_path.is_dir() {
        checks.push(Check::info(
            "provisioned",
            "Environment not provisioned yet (first start will configure it)",
        ));
        return;
    }

    let changed = config_checksum(config)
        .map_err(|e| e.to_string())
        .and_then(|sum| {
            let cache = ChangeCache::open(&FileCacheProvider, &config.work_directory_path)
                .map_err(|e| e.to_string())?;
            cache
                .has_changed(CONFIG_CACHE_KEY, sum.as_str())
                .map_err(|e| e.to_string())
        });
    match changed {
        Ok(false) => checks.push(Check::pass(
            "provisioned",
            "Environment matches the current configuration",
        )),
        Ok(true) => checks.push(Check::info(
            "provisioned",
            "Configuration changed since the last start (next start reconfigures)",
        )),
        Err(e) => checks.push(Check::warn(
            "provisioned",
            &format!("Cannot read the change cache: {e}"),
        )),
    }
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        println!("wpdev doctor\n");
        for check in checks {
            let icon = match check.status.as_str() {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: String,
    status: String,
    message: String,
}

impl Check {
    fn pass(name: &str, message: &str) -> Self {
        Self::with_status(name, "pass", message)
    }

    fn fail(name: &str, message: &str) -> Self {
        Self::with_status(name, "fail", message)
    }

    fn warn(name: &str, message: &str) -> Self {
        Self::with_status(name, "warn", message)
    }

    fn info(name: &str, message: &str) -> Self {
        Self::with_status(name, "info", message)
    }

    fn with_status(name: &str, status: &str, message: &str) -> Self {
        Self {
            name: name.to_owned(),
            status: status.to_owned(),
            message: message.to_owned(),
        }
    }
}
