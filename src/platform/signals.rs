//! SIGINT/SIGTERM handling.
//!
//! The first signal sets the shared interrupt flag; every session polls it and
//! closes gracefully. A second signal exits the process immediately.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag observed independently by every session.
pub type InterruptSignal = Arc<AtomicBool>;

/// Exit status used when a second signal arrives before sessions finish.
pub const SECOND_SIGNAL_EXIT_CODE: i32 = 130;

pub fn interrupt_signal() -> InterruptSignal {
    Arc::new(AtomicBool::new(false))
}

pub fn is_interrupted(signal: &InterruptSignal) -> bool {
    signal.load(Ordering::SeqCst)
}

/// Keeps the signal listener thread alive; dropping it unregisters the handlers.
#[cfg(unix)]
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(unix)]
pub fn install_interrupt_handlers(signal: InterruptSignal) -> io::Result<SignalHookGuard> {
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM])?;
    let handle = signals.handle();

    let thread = std::thread::spawn(move || {
        for received in signals.forever() {
            if signal.swap(true, Ordering::SeqCst) {
                tracing::warn!(signal = received, "second interrupt, exiting");
                std::process::exit(SECOND_SIGNAL_EXIT_CODE);
            }
            tracing::info!(signal = received, "interrupt received, closing sessions");
        }
    });

    Ok(SignalHookGuard {
        handle,
        thread: Some(thread),
    })
}

#[cfg(not(unix))]
pub struct SignalHookGuard;

/// No signal integration off unix; the flag can still be set programmatically.
#[cfg(not(unix))]
pub fn install_interrupt_handlers(_signal: InterruptSignal) -> io::Result<SignalHookGuard> {
    Ok(SignalHookGuard)
}
