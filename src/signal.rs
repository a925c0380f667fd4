//! Signal dispositions of the interpreter and its children.
//!
//! The SIGCHLD handler only raises a flag; the job table is reaped later from
//! the control flow. Mutations of the job table hold a [`DeferChildSignals`]
//! guard so a notification is never delivered halfway through one.
//!
//! The interpreter ignores keyboard signals so that Ctrl-C during a
//! foreground command only reaches the command. Children restore the default
//! dispositions before exec, since ignored signals survive it.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use tracing::warn;

static CHILD_EXITED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_child_exit(_: libc::c_int) {
    CHILD_EXITED.store(true, Ordering::SeqCst);
}

/// Signals the interpreter ignores while its children keep the default.
const KEYBOARD_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// Registers the SIGCHLD handler and ignores keyboard signals in the
/// interpreter process.
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_child_exit),
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );
    // SAFETY: the handler only touches an atomic.
    unsafe { signal::sigaction(Signal::SIGCHLD, &action) }?;
    for sig in KEYBOARD_SIGNALS {
        // SAFETY: no handler function is installed.
        unsafe { signal::signal(sig, SigHandler::SigIgn) }?;
    }
    Ok(())
}

/// Puts every signal the interpreter changed back to its default
/// disposition and unblocks SIGCHLD. Called in a forked child before exec.
pub fn reset_for_child() -> nix::Result<()> {
    for sig in KEYBOARD_SIGNALS
        .into_iter()
        .chain([Signal::SIGPIPE, Signal::SIGCHLD])
    {
        // SAFETY: no handler function is installed.
        unsafe { signal::signal(sig, SigHandler::SigDfl) }?;
    }
    let mut chld = SigSet::empty();
    chld.add(Signal::SIGCHLD);
    signal::pthread_sigmask(SigmaskHow::SIG_UNBLOCK, Some(&chld), None)
}

/// Returns whether a child exited since the last call, clearing the flag.
pub fn take_notification() -> bool {
    CHILD_EXITED.swap(false, Ordering::SeqCst)
}

/// Blocks SIGCHLD for the calling thread until dropped.
pub struct DeferChildSignals {
    previous: Option<SigSet>,
}

impl DeferChildSignals {
    pub fn new() -> Self {
        let mut blocked = SigSet::empty();
        blocked.add(Signal::SIGCHLD);
        let mut previous = SigSet::empty();
        match signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&blocked), Some(&mut previous)) {
            Ok(()) => Self {
                previous: Some(previous),
            },
            Err(e) => {
                warn!(error = %e, "could not block SIGCHLD");
                Self { previous: None }
            }
        }
    }
}

impl Default for DeferChildSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferChildSignals {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take()
            && let Err(e) = signal::pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&previous), None)
        {
            warn!(error = %e, "could not restore signal mask");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_signals_blocked() -> bool {
        SigSet::thread_get_mask().unwrap().contains(Signal::SIGCHLD)
    }

    #[test]
    fn defer_blocks_until_dropped() {
        assert!(!child_signals_blocked());
        {
            let _defer = DeferChildSignals::new();
            assert!(child_signals_blocked());
            {
                let _nested = DeferChildSignals::new();
                assert!(child_signals_blocked());
            }
            // the inner guard restores the mask it found
            assert!(child_signals_blocked());
        }
        assert!(!child_signals_blocked());
    }
}
