//! Memory protection for seed material
//!
//! Two best-effort hardening measures:
//!
//! 1. **Core dump prevention**: `setrlimit(RLIMIT_CORE, 0)` so a crash never
//!    writes a seed to disk.
//! 2. **Memory locking**: [`LockedBytes`] keeps its pages out of swap with
//!    `mlock()` and wipes them before unlocking.
//!
//! Failures are logged and otherwise ignored; containers and unprivileged
//! users frequently cannot lock memory.

use std::sync::atomic::{AtomicBool, Ordering};

use zeroize::Zeroize;

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Call once, early in `main`. Returns `true` if core dumps are now off
/// (including when a previous call already turned them off). A failed
/// attempt is not remembered, so a later call tries again.
///
/// # Example
/// ```
/// bee_core::memory::disable_core_dumps();
/// ```
pub fn disable_core_dumps() -> bool {
    disable_once(&CORE_DUMPS_DISABLED, || {
        #[cfg(unix)]
        {
            unix::disable_core_dumps_impl()
        }

        #[cfg(not(unix))]
        {
            log::warn!("core dump prevention not supported on this platform");
            false
        }
    })
}

/// Run `apply` unless `flag` records an earlier success; set `flag` only
/// when `apply` succeeds.
fn disable_once(flag: &AtomicBool, apply: impl FnOnce() -> bool) -> bool {
    if flag.load(Ordering::SeqCst) {
        return true;
    }
    let disabled = apply();
    if disabled {
        flag.store(true, Ordering::SeqCst);
    }
    disabled
}

/// Lock `len` bytes at `ptr` into RAM.
///
/// # Safety
///
/// `ptr` must point to a live allocation of at least `len` bytes that stays
/// valid until the matching [`munlock`].
pub unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::mlock_impl(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = ptr;
        log::warn!("mlock not supported on this platform ({} bytes left swappable)", len);
        false
    }
}

/// Unlock a region previously passed to [`mlock`].
///
/// # Safety
///
/// `ptr` and `len` must match an earlier `mlock` call.
pub unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::munlock_impl(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}

/// A heap-pinned, mlock-ed array of `N` secret bytes.
///
/// The bytes live in a `Box` so their address never moves while locked.
/// [`LockedBytes::wipe`] overwrites them with zeros; drop wipes and unlocks.
pub struct LockedBytes<const N: usize> {
    data: Box<[u8; N]>,
    locked: bool,
}

impl<const N: usize> LockedBytes<N> {
    /// Move `bytes` into a locked allocation and zero the caller's copy.
    pub fn new(bytes: &mut [u8; N]) -> Self {
        let mut data = Box::new([0u8; N]);
        let locked = unsafe { mlock(data.as_ptr(), N) };
        if !locked {
            log::warn!("failed to mlock {} bytes, secret may be swappable", N);
        }
        data.copy_from_slice(&bytes[..]);
        bytes.zeroize();
        Self { data, locked }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.data
    }

    /// Overwrite the contents with zeros. The allocation stays locked.
    pub fn wipe(&mut self) {
        self.data.zeroize();
    }

    pub fn is_zeroed(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}

impl<const N: usize> Drop for LockedBytes<N> {
    fn drop(&mut self) {
        self.data.zeroize();
        if self.locked {
            unsafe {
                munlock(self.data.as_ptr(), N);
            }
        }
    }
}

#[cfg(unix)]
mod unix {
    pub fn disable_core_dumps_impl() -> bool {
        // SAFETY: setrlimit with RLIMIT_CORE=0 is a standard POSIX operation
        unsafe {
            let rlim = libc::rlimit {
                rlim_cur: 0,
                rlim_max: 0,
            };
            if libc::setrlimit(libc::RLIMIT_CORE, &rlim) != 0 {
                log::warn!(
                    "failed to disable core dumps: {}",
                    std::io::Error::last_os_error()
                );
                return false;
            }
        }
        true
    }

    pub unsafe fn mlock_impl(ptr: *const u8, len: usize) -> bool {
        if libc::mlock(ptr as *const libc::c_void, len) != 0 {
            log::debug!(
                "mlock failed for {} bytes: {}",
                len,
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub unsafe fn munlock_impl(ptr: *const u8, len: usize) -> bool {
        libc::munlock(ptr as *const libc::c_void, len) == 0
    }
}
