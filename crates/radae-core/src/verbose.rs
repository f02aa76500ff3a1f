//! Logging macros for consistent output across the transceiver pipelines.
//!
//! # Macros
//!
//! - `verbose!()` - per-iteration pipeline detail, only shown when verbose mode enabled
//! - `info!()` - state transitions (open/start/stop/close)
//! - `warn!()` - transient I/O (overflow, underrun, sync loss)
//! - `error!()` - fatal open-time failures
//!
//! # Usage
//!
//! ```ignore
//! use radae_core::{verbose, info, warn, error};
//!
//! verbose!("feat_count={}", feat_count);  // Only if set_verbose(true)
//! info!("RX pipeline opened on {}", device);
//! warn!("capture overflow, re-syncing");
//! error!("failed to open device: {}", err);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable verbose logging
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::SeqCst);
}

/// Check if verbose logging is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a formatted message if verbose mode is enabled
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!("[verbose] {}", format!($($arg)*));
        }
    };
}

/// Log an info message (always printed)
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        eprintln!("[info] {}", format!($($arg)*));
    };
}

/// Log a warning message (always printed)
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        eprintln!("[warn] {}", format!($($arg)*));
    };
}

/// Log an error message (always printed)
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        eprintln!("[error] {}", format!($($arg)*));
    };
}
