//! Best-effort process naming (`<app>:master`, `<app>:worker-<id>`).
//!
//! On Linux this sets the comm name of the *calling thread* (`PR_SET_NAME`).
//! `ps -o comm` and `top` show the main thread's comm as the process name, so
//! the title only renames the process when init runs on the main thread, as it
//! does under `#[tokio::main(flavor = "current_thread")]`. On a multi-thread
//! runtime only the worker thread that ran init is renamed. The kernel
//! truncates the name to 15 bytes. Failures are logged and ignored.

use std::path::Path;

/// Title for the master process.
pub fn master_title(app: &str) -> String {
    format!("{app}:master")
}

/// Title for worker `id`.
pub fn worker_title(app: &str, id: u8) -> String {
    format!("{app}:worker-{id}")
}

/// Application name derived from the executable path.
pub fn app_name_from(program: &Path) -> String {
    program
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("procvisor")
        .to_string()
}

/// Renames the calling thread (see the module docs); never fails.
pub fn set_process_title(title: &str) {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        let Ok(name) = std::ffi::CString::new(title) else {
            tracing::debug!(title, "process title contains a NUL byte");
            return;
        };
        if let Err(e) = nix::sys::prctl::set_name(&name) {
            tracing::debug!(title, error = %e, "failed to set process title");
        }
    }
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        tracing::trace!(title, "process titles unsupported on this platform");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles() {
        assert_eq!(master_title("api"), "api:master");
        assert_eq!(worker_title("api", 7), "api:worker-7");
        assert_eq!(app_name_from(Path::new("/usr/local/bin/api-server")), "api-server");
        assert_eq!(app_name_from(Path::new("")), "procvisor");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn title_renames_calling_thread_only() {
        let before = std::fs::read_to_string("/proc/thread-self/comm").unwrap();
        let renamed = std::thread::spawn(|| {
            set_process_title(&worker_title("pv", 3));
            std::fs::read_to_string("/proc/thread-self/comm").unwrap()
        })
        .join()
        .unwrap();

        assert_eq!(renamed.trim_end(), "pv:worker-3");
        let after = std::fs::read_to_string("/proc/thread-self/comm").unwrap();
        assert_eq!(before, after);
    }
}
