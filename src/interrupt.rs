//! Ctrl-C handling for the whole driver.
//!
//! Outside a child process an interrupt cancels the run with status 0. While
//! docker runs it shares our process group and gets the same SIGINT, so the
//! interrupt is only recorded and reported once the child has exited.

use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static CHILD_RUNNING: AtomicBool = AtomicBool::new(false);
static HANDLER: Once = Once::new();

pub fn install() {
    HANDLER.call_once(|| {
        let result = ctrlc::set_handler(|| {
            if CHILD_RUNNING.load(Ordering::SeqCst) {
                INTERRUPTED.store(true, Ordering::SeqCst);
            } else {
                println!("\n\nBuild cancelled by user");
                std::process::exit(0);
            }
        });
        if let Err(err) = result {
            debug!("Failed to install Ctrl+C handler: {err}");
        }
    });
}

/// Runs `child` with interrupts deferred. Returns its result and whether Ctrl-C arrived meanwhile.
pub fn while_child_runs<T>(child: impl FnOnce() -> T) -> (T, bool) {
    install();
    INTERRUPTED.store(false, Ordering::SeqCst);
    CHILD_RUNNING.store(true, Ordering::SeqCst);
    let result = child();
    CHILD_RUNNING.store(false, Ordering::SeqCst);
    (result, INTERRUPTED.swap(false, Ordering::SeqCst))
}
