use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Exit status after a second Ctrl-C (128 + SIGINT).
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Let the start cycle halt before its next state.
    StopAfterStep,
    ExitNow,
}

fn escalate(requested: &AtomicBool) -> InterruptAction {
    if requested.swap(true, Ordering::SeqCst) {
        InterruptAction::ExitNow
    } else {
        InterruptAction::StopAfterStep
    }
}

/// Route Ctrl-C into [`shutdown_requested`]. The first press asks the running
/// start cycle to stop between states; a second one exits immediately.
///
/// Returns false, with a warning, if the handler could not be installed. The
/// process then keeps the default Ctrl-C behavior.
pub fn install_signal_handler() -> bool {
    let installed = ctrlc::set_handler(|| match escalate(&SHUTDOWN_REQUESTED) {
        InterruptAction::StopAfterStep => {
            eprintln!("\ninterrupt received, stopping after the current step...");
        }
        InterruptAction::ExitNow => std::process::exit(FORCED_EXIT_CODE),
    });
    match installed {
        Ok(()) => true,
        Err(e) => {
            warn!("could not install Ctrl-C handler, interrupts will not stop cleanly: {e}");
            false
        }
    }
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
