//! Process-level integrations.

pub mod signals;

pub use signals::{
    install_interrupt_handlers, interrupt_signal, is_interrupted, InterruptSignal,
    SignalHookGuard, SECOND_SIGNAL_EXIT_CODE,
};
