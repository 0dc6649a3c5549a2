//! Signal dispositions and the alternate handler stack.

use std::ffi::c_int;
use std::io;

/// Process-fatal signals converted into an `Excp` outcome.
pub(crate) const FAULT_SIGNALS: [c_int; 5] = [
    libc::SIGILL,
    libc::SIGSEGV,
    libc::SIGBUS,
    libc::SIGFPE,
    libc::SIGSYS,
];

/// Symbolic name of a signal this engine knows about.
#[must_use]
pub fn signal_name(signum: c_int) -> &'static str {
    match signum {
        libc::SIGILL => "SIGILL",
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGBUS => "SIGBUS",
        libc::SIGFPE => "SIGFPE",
        libc::SIGSYS => "SIGSYS",
        libc::SIGALRM => "SIGALRM",
        libc::SIGABRT => "SIGABRT",
        _ => "unknown signal",
    }
}

pub(crate) type Handler = unsafe extern "C" fn(c_int);

/// Previous dispositions, restored after the phase.
pub(crate) struct SavedActions {
    saved: Vec<(c_int, libc::sigaction)>,
}

/// Install `handler` for every signal in `signums`, on the alternate
/// stack. On failure the dispositions already changed are rolled back.
pub(crate) fn install(signums: &[c_int], handler: Handler) -> io::Result<SavedActions> {
    let mut saved = Vec::with_capacity(signums.len());
    for &signum in signums {
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = handler as usize;
        action.sa_flags = libc::SA_ONSTACK;
        unsafe { libc::sigemptyset(&mut action.sa_mask) };
        let mut old: libc::sigaction = unsafe { std::mem::zeroed() };
        if unsafe { libc::sigaction(signum, &action, &mut old) } != 0 {
            let err = io::Error::last_os_error();
            restore(SavedActions { saved });
            return Err(err);
        }
        saved.push((signum, old));
    }
    Ok(SavedActions { saved })
}

/// Put the previous dispositions back; best effort.
pub(crate) fn restore(actions: SavedActions) {
    for (signum, old) in actions.saved {
        unsafe { libc::sigaction(signum, &old, std::ptr::null_mut()) };
    }
}

/// Memory for handlers to run on while the main stack may be trashed.
const ALT_STACK_SIZE: usize = 64 * 1024;

pub(crate) struct AltStack {
    _mem: Box<[u8]>,
    old: libc::stack_t,
}

impl AltStack {
    pub(crate) fn install() -> io::Result<Self> {
        let mut mem = vec![0u8; ALT_STACK_SIZE].into_boxed_slice();
        let stack = libc::stack_t {
            ss_sp: mem.as_mut_ptr().cast::<libc::c_void>(),
            ss_flags: 0,
            ss_size: ALT_STACK_SIZE,
        };
        let mut old: libc::stack_t = unsafe { std::mem::zeroed() };
        if unsafe { libc::sigaltstack(&stack, &mut old) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(AltStack { _mem: mem, old })
    }
}

impl Drop for AltStack {
    fn drop(&mut self) {
        // Re-point the process at whatever stack was in effect before;
        // the buffer must stay alive until after this call.
        unsafe { libc::sigaltstack(&self.old, std::ptr::null_mut()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_signal_names() {
        assert_eq!(signal_name(libc::SIGSEGV), "SIGSEGV");
        assert_eq!(signal_name(libc::SIGALRM), "SIGALRM");
        assert_eq!(signal_name(12345), "unknown signal");
    }

    #[test]
    fn altstack_install_and_restore() {
        let stack = AltStack::install().unwrap();
        let mut current: libc::stack_t = unsafe { std::mem::zeroed() };
        assert_eq!(
            unsafe { libc::sigaltstack(std::ptr::null(), &mut current) },
            0
        );
        assert_eq!(current.ss_size, ALT_STACK_SIZE);
        drop(stack);
    }

    unsafe extern "C" fn noop_handler(_signum: c_int) {}

    fn disposition(signum: c_int) -> usize {
        let mut current: libc::sigaction = unsafe { std::mem::zeroed() };
        assert_eq!(
            unsafe { libc::sigaction(signum, std::ptr::null(), &mut current) },
            0
        );
        current.sa_sigaction
    }

    #[test]
    fn install_changes_disposition_and_restore_reverts_it() {
        // SIGWINCH is harmless and unused by the engine.
        let before = disposition(libc::SIGWINCH);
        let saved = install(&[libc::SIGWINCH], noop_handler).unwrap();
        assert_eq!(disposition(libc::SIGWINCH), noop_handler as usize);
        restore(saved);
        assert_eq!(disposition(libc::SIGWINCH), before);
    }
}
