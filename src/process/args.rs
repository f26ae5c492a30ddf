//! # Self re-exec protocol.
//!
//! One binary, two roles. A worker is the same executable relaunched with a
//! reserved three-token tag appended to its arguments:
//!
//! ```text
//! <exe> <original args without any tag> --cluster-worker <id> <port>
//! ```
//!
//! plus the [`WORKER_ENV`] marker in its environment.
//!
//! ## Rules
//! - [`detect_role`] scans arguments after `argv[0]` for the first tag.
//! - [`ReexecArgs::worker_command`] strips every existing tag triple before
//!   appending the new one, so nested re-execs never accumulate tags.
//! - The child inherits the parent environment; [`WorkerCommand::env`] only
//!   lists the overlay.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::error::{ClusterError, SpawnError};

/// Tag token that marks a worker invocation.
pub const WORKER_FLAG: &str = "--cluster-worker";

/// Environment variable set to `1` in every worker.
pub const WORKER_ENV: &str = "PROCVISOR_WORKER";

/// Role encoded in a process's arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// No worker tag: this process supervises.
    Master,
    /// Tagged worker with its slot id and shared port.
    Worker { id: u8, port: u16 },
}

/// Parses the worker tag out of a full argument vector (including `argv[0]`).
///
/// A tag that is not followed by a decimal id (`0..=255`) and a decimal port is
/// rejected rather than silently treated as a master.
pub fn detect_role<S: AsRef<OsStr>>(args: &[S]) -> Result<Invocation, ClusterError> {
    let Some(pos) = args
        .iter()
        .skip(1)
        .position(|a| a.as_ref() == OsStr::new(WORKER_FLAG))
    else {
        return Ok(Invocation::Master);
    };
    let tail = &args[pos + 2..];
    let (Some(id), Some(port)) = (tail.first(), tail.get(1)) else {
        return Err(ClusterError::InvalidWorkerTag {
            detail: format!("{WORKER_FLAG} expects <id> <port>"),
        });
    };
    let id = parse_token::<u8>(id.as_ref(), "id")?;
    let port = parse_token::<u16>(port.as_ref(), "port")?;
    Ok(Invocation::Worker { id, port })
}

fn parse_token<T: std::str::FromStr>(raw: &OsStr, what: &str) -> Result<T, ClusterError> {
    raw.to_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ClusterError::InvalidWorkerTag {
            detail: format!("bad {what}: {raw:?}"),
        })
}

/// Everything needed to launch one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerCommand {
    /// Slot being launched.
    pub worker_id: u8,
    /// Shared listening port.
    pub port: u16,
    /// Executable to run (the current binary).
    pub program: PathBuf,
    /// Arguments after the program, ending with the worker tag.
    pub args: Vec<OsString>,
    /// Variables added on top of the inherited environment.
    pub env: Vec<(OsString, OsString)>,
}

/// Invocation captured once at startup and reused for every re-exec.
#[derive(Clone, Debug)]
pub struct ReexecArgs {
    program: PathBuf,
    argv: Vec<OsString>,
}

impl ReexecArgs {
    /// Captures `argv` and resolves the current executable (falls back to `argv[0]`).
    pub fn capture(argv: Vec<OsString>) -> Self {
        let program = std::env::current_exe()
            .ok()
            .or_else(|| argv.first().map(PathBuf::from))
            .unwrap_or_default();
        Self { program, argv }
    }

    /// Uses an explicit executable path.
    pub fn new(program: impl Into<PathBuf>, argv: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            argv,
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Builds the command that relaunches this binary as worker `id`.
    pub fn worker_command(&self, id: u8, port: u16) -> Result<WorkerCommand, SpawnError> {
        if self.argv.is_empty() {
            return Err(SpawnError::ArgsNotCaptured);
        }
        let mut args = strip_worker_tags(&self.argv[1..]);
        args.reserve(3);
        args.push(OsString::from(WORKER_FLAG));
        args.push(OsString::from(id.to_string()));
        args.push(OsString::from(port.to_string()));

        Ok(WorkerCommand {
            worker_id: id,
            port,
            program: self.program.clone(),
            args,
            env: vec![(OsString::from(WORKER_ENV), OsString::from("1"))],
        })
    }
}

/// Removes every `WORKER_FLAG <id> <port>` triple from `args`.
pub fn strip_worker_tags(args: &[OsString]) -> Vec<OsString> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == WORKER_FLAG {
            iter.next();
            iter.next();
            continue;
        }
        out.push(arg.clone());
    }
    out
}

/// Returns true when the environment marks this process as a worker.
pub fn is_worker_env() -> bool {
    std::env::var_os(WORKER_ENV).is_some_and(|v| v == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    fn tag_count(args: &[OsString]) -> usize {
        args.iter().filter(|a| *a == WORKER_FLAG).count()
    }

    #[test]
    fn plain_invocation_is_master() {
        let role = detect_role(&argv(&["app", "--verbose"])).unwrap();
        assert_eq!(role, Invocation::Master);
    }

    #[test]
    fn tagged_invocation_is_worker() {
        let role = detect_role(&argv(&["app", "-v", WORKER_FLAG, "3", "8080"])).unwrap();
        assert_eq!(role, Invocation::Worker { id: 3, port: 8080 });
    }

    #[test]
    fn tag_in_argv0_is_ignored() {
        let role = detect_role(&argv(&[WORKER_FLAG, "1", "2"])).unwrap();
        assert_eq!(role, Invocation::Master);
    }

    #[test]
    fn truncated_or_garbled_tag_is_rejected() {
        let err = detect_role(&argv(&["app", WORKER_FLAG, "1"])).unwrap_err();
        assert_eq!(err.as_label(), "cluster_invalid_worker_tag");

        let err = detect_role(&argv(&["app", WORKER_FLAG, "999", "80"])).unwrap_err();
        assert!(err.to_string().contains("bad id"));

        let err = detect_role(&argv(&["app", WORKER_FLAG, "1", "http"])).unwrap_err();
        assert!(err.to_string().contains("bad port"));
    }

    #[test]
    fn builds_tagged_command() {
        let reexec = ReexecArgs::new("/usr/bin/app", argv(&["app", "--flag", "x"]));
        let cmd = reexec.worker_command(2, 3000).unwrap();

        assert_eq!(cmd.program, PathBuf::from("/usr/bin/app"));
        assert_eq!(cmd.args, argv(&["--flag", "x", WORKER_FLAG, "2", "3000"]));
        assert_eq!(cmd.env, vec![(OsString::from(WORKER_ENV), OsString::from("1"))]);
        assert_eq!(cmd.worker_id, 2);
        assert_eq!(cmd.port, 3000);
    }

    #[test]
    fn rebuilding_from_worker_args_keeps_one_tag() {
        let reexec = ReexecArgs::new(
            "/usr/bin/app",
            argv(&["app", "--flag", WORKER_FLAG, "0", "3000", "tail"]),
        );
        let cmd = reexec.worker_command(5, 3000).unwrap();
        assert_eq!(tag_count(&cmd.args), 1);
        assert_eq!(cmd.args, argv(&["--flag", "tail", WORKER_FLAG, "5", "3000"]));

        let nested = ReexecArgs::new("/usr/bin/app", {
            let mut v = argv(&["app"]);
            v.extend(cmd.args.clone());
            v
        });
        let again = nested.worker_command(5, 3000).unwrap();
        assert_eq!(again.args, cmd.args);
    }

    #[test]
    fn empty_capture_fails() {
        let reexec = ReexecArgs::new("/usr/bin/app", Vec::new());
        assert!(matches!(
            reexec.worker_command(0, 80),
            Err(SpawnError::ArgsNotCaptured)
        ));
    }
}
