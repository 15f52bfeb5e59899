//! Interrupt forwarding
//!
//! Children run in their own process group, so a terminal Ctrl-C only reaches
//! this process. The handler relays the signal to the whole group of the
//! active child and records it so the pipeline stops after the child exits.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static INSTALLED: AtomicBool = AtomicBool::new(false);
static ACTIVE_GROUP: AtomicI32 = AtomicI32::new(0);
static RECEIVED: AtomicI32 = AtomicI32::new(0);
// Group the handler last forwarded to
static DELIVERED: AtomicI32 = AtomicI32::new(0);

const FORWARDED: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP];

// Only async-signal-safe calls in here: atomics and kill(2).
extern "C" fn forward(signal: libc::c_int) {
    RECEIVED.store(signal, Ordering::SeqCst);
    let pgid = ACTIVE_GROUP.load(Ordering::SeqCst);
    if pgid > 0 {
        unsafe {
            libc::kill(-pgid, signal);
        }
        DELIVERED.store(pgid, Ordering::SeqCst);
    }
}

/// Install the forwarding handler for SIGINT, SIGTERM and SIGHUP. Idempotent.
pub(crate) fn install() -> io::Result<()> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    for signal in FORWARDED {
        let handler: extern "C" fn(libc::c_int) = forward;
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = handler as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        let rc = unsafe {
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signal, &action, std::ptr::null_mut())
        };
        if rc != 0 {
            INSTALLED.store(false, Ordering::SeqCst);
            return Err(io::Error::last_os_error());
        }
    }

    tracing::debug!("Installed interrupt forwarding for SIGINT, SIGTERM, SIGHUP");
    Ok(())
}

/// First forwarded signal received so far, if any
pub(crate) fn received() -> Option<i32> {
    match RECEIVED.load(Ordering::SeqCst) {
        0 => None,
        signal => Some(signal),
    }
}

/// Send `signal` to every process in group `pgid`
pub(crate) fn signal_group(pgid: u32, signal: i32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pgid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "process group id out of range"))?;
    if unsafe { libc::kill(-pgid, signal) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Registers a child's process group as the forwarding target while alive.
#[must_use = "the group is only forwarded to while the guard is alive"]
pub(crate) struct ActiveGroup {
    pgid: u32,
}

impl ActiveGroup {
    pub(crate) fn register(pgid: u32) -> Self {
        ACTIVE_GROUP.store(pgid as i32, Ordering::SeqCst);

        if let Some(signal) =
            pending_relay(received(), DELIVERED.load(Ordering::SeqCst), pgid as i32)
        {
            tracing::debug!("Relaying pending signal {signal} to group {pgid}");
            let _ = signal_group(pgid, signal);
        }

        Self { pgid }
    }

    pub(crate) fn pgid(&self) -> u32 {
        self.pgid
    }
}

/// A signal received before `pgid` was registered still has to reach it,
/// unless the handler already forwarded it there.
fn pending_relay(received: Option<i32>, delivered: i32, pgid: i32) -> Option<i32> {
    received.filter(|_| delivered != pgid)
}

impl Drop for ActiveGroup {
    fn drop(&mut self) {
        let _ = ACTIVE_GROUP.compare_exchange(
            self.pgid as i32,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}
