//! Interrupt bookkeeping.
//!
//! The SIGINT handler only sets a flag. The session polls it between cycles
//! and reports the interrupt; a child being waited on gets the terminal's
//! interrupt itself, since exec resets handled signals to their default.

#[cfg(unix)]
#[allow(unsafe_code)]
mod imp {
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
    use std::ffi::c_int;
    use std::sync::atomic::{AtomicBool, Ordering};

    static INTERRUPTED: AtomicBool = AtomicBool::new(false);

    extern "C" fn on_sigint(_: c_int) {
        INTERRUPTED.store(true, Ordering::SeqCst);
    }

    /// Installs the SIGINT handler for the rest of the process.
    pub fn install() -> nix::Result<()> {
        let action = SigAction::new(
            SigHandler::Handler(on_sigint),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
        unsafe {
            signal::sigaction(Signal::SIGINT, &action)?;
        }
        Ok(())
    }

    /// Whether SIGINT arrived since the last call.
    pub fn take_interrupt() -> bool {
        INTERRUPTED.swap(false, Ordering::SeqCst)
    }
}

#[cfg(not(unix))]
mod imp {
    pub fn install() -> std::io::Result<()> {
        Ok(())
    }

    pub fn take_interrupt() -> bool {
        false
    }
}

pub use imp::{install, take_interrupt};
