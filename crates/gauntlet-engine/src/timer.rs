//! Per-phase real-time alarm.

use std::io;
use std::time::Duration;

const ZERO: libc::timeval = libc::timeval {
    tv_sec: 0,
    tv_usec: 0,
};

/// Arm the process interval timer to fire SIGALRM once after `timeout`.
pub(crate) fn arm(timeout: Duration) -> io::Result<()> {
    debug_assert!(!timeout.is_zero());
    let timer = libc::itimerval {
        it_interval: ZERO,
        it_value: libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        },
    };
    if unsafe { libc::setitimer(libc::ITIMER_REAL, &timer, std::ptr::null_mut()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Cancel any pending alarm; best effort, a still-pending expiry after
/// natural phase completion is ignored by the handler anyway.
pub(crate) fn disarm() {
    let timer = libc::itimerval {
        it_interval: ZERO,
        it_value: ZERO,
    };
    unsafe { libc::setitimer(libc::ITIMER_REAL, &timer, std::ptr::null_mut()) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_then_disarm_leaves_no_pending_timer() {
        arm(Duration::from_secs(60)).unwrap();
        disarm();
        let mut current: libc::itimerval = unsafe { std::mem::zeroed() };
        assert_eq!(
            unsafe { libc::getitimer(libc::ITIMER_REAL, &mut current) },
            0
        );
        assert_eq!(current.it_value.tv_sec, 0);
        assert_eq!(current.it_value.tv_usec, 0);
    }
}
