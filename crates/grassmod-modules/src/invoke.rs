//! Running module executables.

use crate::{Invocation, PathSource};
use grassmod_interface::InterfaceError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error type for module invocation.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    #[error("failed to start {command}: {message}")]
    Spawn {
        command: String,
        args: Vec<String>,
        message: String,
    },
    #[error("{command} exited with code {code}: {}", .stderr.trim())]
    Failed {
        command: String,
        args: Vec<String>,
        code: i32,
        stderr: String,
    },
    #[error("cannot read interface of {command}: {source}")]
    Interface {
        command: String,
        #[source]
        source: InterfaceError,
    },
    #[error("unexpected output from {command}: {message}")]
    Output { command: String, message: String },
}

impl InvocationError {
    fn spawn(invocation: &Invocation, err: std::io::Error) -> Self {
        Self::Spawn {
            command: invocation.name.clone(),
            args: invocation.args(),
            message: err.to_string(),
        }
    }

    pub fn output(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Output {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Name of the command the error refers to.
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. }
            | Self::Failed { command, .. }
            | Self::Interface { command, .. }
            | Self::Output { command, .. } => command,
        }
    }

    /// Exit code of the module, when it ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Captured result of a successful module run.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutput {
    pub command: String,
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Runs an [`Invocation`].
pub trait Invoker: Send + Sync {
    fn invoke(&self, invocation: &Invocation) -> Result<ModuleOutput, InvocationError>;
}

/// Spawns module executables as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    search_dirs: Vec<PathBuf>,
}

impl ProcessInvoker {
    /// Invoker that finds executables through `PATH` only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look in `dirs` before `PATH`.
    pub fn with_search_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_dirs.extend(dirs);
        self
    }

    /// Search the same directories discovery scans.
    pub fn for_source(source: &PathSource) -> Self {
        Self::new().with_search_dirs(source.search_dirs())
    }

    /// Path of the executable for `name`. Falls back to the bare name so the
    /// spawn error names the missing command.
    pub fn locate(&self, name: &str) -> PathBuf {
        if !self.search_dirs.is_empty() {
            if let (Ok(paths), Ok(cwd)) = (
                std::env::join_paths(&self.search_dirs),
                std::env::current_dir(),
            ) {
                if let Ok(path) = which::which_in(name, Some(paths), cwd) {
                    return path;
                }
            }
        }
        which::which(name).unwrap_or_else(|_| PathBuf::from(name))
    }
}

impl Invoker for ProcessInvoker {
    fn invoke(&self, invocation: &Invocation) -> Result<ModuleOutput, InvocationError> {
        let program = self.locate(&invocation.name);
        let args = invocation.args();
        tracing::debug!(command = %invocation.name, program = %program.display(), ?args, "invoking module");

        let start = Instant::now();
        let mut child = Command::new(&program)
            .args(&args)
            .envs(&invocation.env)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| InvocationError::spawn(invocation, e))?;

        // Feed stdin from a thread; the module may fill stdout before reading it.
        let writer = match (invocation.stdin.clone(), child.stdin.take()) {
            (Some(text), Some(mut pipe)) => {
                Some(std::thread::spawn(move || pipe.write_all(text.as_bytes())))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| InvocationError::spawn(invocation, e))?;
        let elapsed = start.elapsed();

        match stdin_problem(writer.map(|w| w.join())) {
            Some(StdinProblem::Unconsumed(e)) => {
                tracing::debug!(command = %invocation.name, error = %e, "stdin not fully consumed")
            }
            Some(StdinProblem::Panicked) => {
                tracing::warn!(command = %invocation.name, "stdin writer panicked")
            }
            None => {}
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        // Killed by a signal: no exit code
        let code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            return Err(InvocationError::Failed {
                command: invocation.name.clone(),
                args,
                code,
                stderr,
            });
        }

        Ok(ModuleOutput {
            command: invocation.name.clone(),
            code,
            stdout,
            stderr,
            elapsed,
        })
    }
}

#[derive(Debug)]
enum StdinProblem {
    Unconsumed(std::io::Error),
    Panicked,
}

fn stdin_problem(
    joined: Option<std::thread::Result<std::io::Result<()>>>,
) -> Option<StdinProblem> {
    match joined? {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(StdinProblem::Unconsumed(e)),
        Err(_) => Some(StdinProblem::Panicked),
    }
}

/// Adds environment variables to every invocation it forwards.
///
/// Variables the invocation sets itself take precedence. Used to run a whole
/// group of modules under one `WIND_OVERRIDE` region.
#[derive(Clone)]
pub struct EnvInvoker {
    inner: Arc<dyn Invoker>,
    env: BTreeMap<String, String>,
}

impl EnvInvoker {
    pub fn new(inner: Arc<dyn Invoker>) -> Self {
        Self {
            inner,
            env: BTreeMap::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl Invoker for EnvInvoker {
    fn invoke(&self, invocation: &Invocation) -> Result<ModuleOutput, InvocationError> {
        let mut invocation = invocation.clone();
        for (key, value) in &self.env {
            invocation
                .env
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self.inner.invoke(&invocation)
    }
}

impl std::fmt::Debug for EnvInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvInvoker").field("env", &self.env).finish_non_exhaustive()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::Value;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_captures_stdout() {
        let mut invocation = Invocation::new("echo");
        invocation.options.insert("input".to_string(), Value::from("elevation"));
        let output = ProcessInvoker::new().invoke(&invocation).unwrap();
        assert_eq!(output.stdout, "input=elevation\n");
        assert_eq!(output.code, 0);
    }

    #[test]
    fn test_non_zero_exit_is_failure() {
        let err = ProcessInvoker::new()
            .invoke(&Invocation::new("false"))
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.command(), "false");
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let err = ProcessInvoker::new()
            .invoke(&Invocation::new("r.surely.not.installed"))
            .unwrap_err();
        assert!(matches!(err, InvocationError::Spawn { .. }));
    }

    #[test]
    fn test_stdin_and_env() {
        let invocation = Invocation {
            stdin: Some("north: 15\n".to_string()),
            ..Invocation::new("cat")
        };
        let output = ProcessInvoker::new().invoke(&invocation).unwrap();
        assert_eq!(output.stdout, "north: 15\n");

        let invocation = Invocation {
            extra: vec!["-c".to_string(), "printf %s \"$WIND_OVERRIDE\"".to_string()],
            env: [("WIND_OVERRIDE".to_string(), "tmp_region".to_string())].into(),
            ..Invocation::new("sh")
        };
        let output = ProcessInvoker::new().invoke(&invocation).unwrap();
        assert_eq!(output.stdout, "tmp_region");
    }

    #[test]
    fn test_search_dirs_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("g.version");
        std::fs::write(&script, "#!/bin/sh\necho addon\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let invoker = ProcessInvoker::new().with_search_dirs([dir.path().to_path_buf()]);
        let output = invoker.invoke(&Invocation::new("g.version")).unwrap();
        assert_eq!(output.stdout, "addon\n");
    }
}
