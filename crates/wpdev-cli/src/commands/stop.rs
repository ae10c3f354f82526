use super::{colorize_status, json_pretty, load_config, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use std::path::Path;
use wpdev_core::write_compose_project;
use wpdev_runtime::{ComposeCli, ServiceLifecycle};

pub fn run(project_root: &Path, home: &Path, debug: bool, json: bool) -> Result<u8, String> {
    let config = load_config(project_root, home, None, debug)?;
    let project = write_compose_project(&config).map_err(|e| e.to_string())?;

    let pb = if json || debug {
        None
    } else {
        Some(spinner("stopping environment..."))
    };
    if let Err(e) = ComposeCli::new(debug).stop_all(&project) {
        if let Some(ref pb) = pb {
            spin_fail(pb, "stop failed");
        }
        return Err(format!("runtime error: {e}"));
    }
    if let Some(ref pb) = pb {
        spin_ok(pb, "environment stopped");
    }

    if json {
        let payload = serde_json::json!({
            "status": "stopped",
            "work_directory": config.work_directory_path,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("status:   {}", colorize_status("stopped"));
    }
    Ok(EXIT_SUCCESS)
}
