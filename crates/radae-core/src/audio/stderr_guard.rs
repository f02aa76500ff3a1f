//! Temporary stderr suppression around noisy native audio backends.
//!
//! ALSA's default host probing writes diagnostic chatter
//! ("Unknown PCM cards.pcm...") straight to the process's stderr fd, below
//! anything Rust's own logging can intercept. Grounded on the teacher's own
//! `StderrGuard` (used around its native transcription library's startup
//! noise): redirect fd 2 to `/dev/null` for the duration of a host probe,
//! then restore it.

#[cfg(target_os = "linux")]
mod imp {
    use std::os::unix::io::AsRawFd;

    pub struct StderrGuard {
        saved_fd: i32,
        stderr_fd: i32,
    }

    impl Drop for StderrGuard {
        fn drop(&mut self) {
            unsafe {
                libc::dup2(self.saved_fd, self.stderr_fd);
                libc::close(self.saved_fd);
            }
        }
    }

    /// Redirect stderr to `/dev/null` for as long as the returned guard is
    /// alive. Returns `None` (suppressing nothing) if the redirect fails.
    pub fn suppress() -> Option<StderrGuard> {
        let stderr_fd = std::io::stderr().as_raw_fd();
        let saved_fd = unsafe { libc::dup(stderr_fd) };
        if saved_fd == -1 {
            return None;
        }

        let devnull = std::fs::File::open("/dev/null").ok()?;
        let result = unsafe { libc::dup2(devnull.as_raw_fd(), stderr_fd) };
        if result == -1 {
            unsafe { libc::close(saved_fd) };
            return None;
        }

        Some(StderrGuard {
            saved_fd,
            stderr_fd,
        })
    }
}

#[cfg(not(target_os = "linux"))]
mod imp {
    pub struct StderrGuard;

    /// No-op on platforms where ALSA isn't the backend.
    pub fn suppress() -> Option<StderrGuard> {
        None
    }
}

pub use imp::suppress;
