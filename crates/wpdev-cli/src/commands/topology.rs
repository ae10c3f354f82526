use super::{json_pretty, load_config, EXIT_SUCCESS};
use std::path::Path;
use wpdev_runtime::{build_topology, ComposeProject};
use wpdev_store::WorkLayout;

/// Print the compose document `start` would write. Nothing is written and no
/// containers are touched.
pub fn run(project_root: &Path, home: &Path, port: Option<u16>, json: bool) -> Result<u8, String> {
    let config = load_config(project_root, home, port, false)?;
    let project = ComposeProject::new(
        &WorkLayout::new(&config.work_directory_path),
        build_topology(&config),
    );
    if json {
        println!("{}", json_pretty(&project.topology)?);
    } else {
        let yaml = project
            .render()
            .map_err(|e| format!("runtime error: {e}"))?;
        print!("{yaml}");
    }
    Ok(EXIT_SUCCESS)
}
