//! Ctrl-C handling for remote traversals.
//!
//! The process-wide handler is installed once. Each traversal arms a fresh
//! [`CancelFlag`]; the first Ctrl-C cancels it and the walk gives up on the
//! request in flight. A second Ctrl-C, or one while nothing is armed, exits
//! with status 130.

use anyhow::{Context, Result};
use flatkit::CancelFlag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

const EXIT_INTERRUPTED: i32 = 130;

static INSTALLED: AtomicBool = AtomicBool::new(false);
static ARMED: Mutex<Option<CancelFlag>> = Mutex::new(None);

/// Cancellation flag wired to Ctrl-C until dropped
pub struct Armed {
    flag: CancelFlag,
}

impl Armed {
    pub fn flag(&self) -> &CancelFlag {
        &self.flag
    }
}

impl Drop for Armed {
    fn drop(&mut self) {
        let mut armed = ARMED.lock().unwrap_or_else(PoisonError::into_inner);
        if armed
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&self.flag))
        {
            *armed = None;
        }
    }
}

/// Arm a fresh cancellation flag for one traversal
pub fn arm() -> Result<Armed> {
    install()?;
    let flag = CancelFlag::new();
    *ARMED.lock().unwrap_or_else(PoisonError::into_inner) = Some(flag.clone());
    Ok(Armed { flag })
}

fn install() -> Result<()> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    ctrlc::set_handler(on_interrupt).context("Could not install the Ctrl-C handler")
}

fn on_interrupt() {
    let armed = ARMED.lock().unwrap_or_else(PoisonError::into_inner);
    match armed.as_ref() {
        Some(flag) if !flag.is_cancelled() => {
            flag.cancel();
            eprintln!("\nCancelling (Ctrl-C again to quit)");
        }
        _ => std::process::exit(EXIT_INTERRUPTED),
    }
}
