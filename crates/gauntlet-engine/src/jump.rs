//! Non-local jump across the containment recovery point.
//!
//! Thin FFI over the platform's save/restore-context primitives. The
//! save call MUST be issued directly from the frame that outlives the
//! protected code: wrapping `sigsetjmp` in a helper function would leave
//! the restored context pointing into a dead frame. `contain` is the
//! only caller.

use std::ffi::c_int;

/// Words reserved for the platform jump buffer; comfortably larger than
/// glibc's `__jmp_buf_tag` on every supported architecture.
const JUMP_BUF_WORDS: usize = 128;

/// Opaque execution-context snapshot.
#[repr(C, align(16))]
pub(crate) struct JumpBuf {
    _ctx: [u64; JUMP_BUF_WORDS],
}

impl JumpBuf {
    #[must_use]
    pub(crate) const fn new() -> Self {
        JumpBuf {
            _ctx: [0; JUMP_BUF_WORDS],
        }
    }
}

unsafe extern "C" {
    // glibc exposes sigsetjmp only under its internal entry point; the
    // public name is a header macro, not a symbol.
    #[link_name = "__sigsetjmp"]
    pub(crate) fn sigsetjmp_raw(env: *mut JumpBuf, savemask: c_int) -> c_int;

    fn siglongjmp(env: *mut JumpBuf, val: c_int) -> !;
}

/// Restore the context saved in `env`; `sigsetjmp_raw` appears to return
/// `val` (1 when `val` is 0, matching the POSIX contract).
///
/// # Safety
///
/// `env` must have been filled by a `sigsetjmp_raw` call whose frame is
/// still live on the current thread's stack. No destructors run for the
/// frames skipped over.
pub(crate) unsafe fn long_jump(env: *mut JumpBuf, val: c_int) -> ! {
    let val = if val == 0 { 1 } else { val };
    unsafe { siglongjmp(env, val) }
}
