//! Subprocess execution
//!
//! Vendor CLIs (`op`, `replicated`) are driven through a [`CommandRunner`]:
//! an argument vector plus environment bindings in, captured stdout out.
//! Secret bindings only ever reach the child's environment, never its argv.

use crate::SecureSecret;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Error from running a subprocess
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The argument vector was empty
    #[error("no command given")]
    EmptyCommand,

    /// The program could not be started
    #[error("failed to execute '{program}': {source}")]
    Spawn {
        /// Program that was started
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully
    #[error("'{program}' failed ({}): {stderr}", exit_label(.code))]
    Failed {
        /// Program that failed
        program: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// First non-empty line of stderr
        stderr: String,
    },

    /// A non-process backend (a container engine) could not run the program
    #[error("'{program}' failed in {backend}: {message}")]
    Backend {
        /// Program that was run
        program: String,
        /// Backend that ran it
        backend: &'static str,
        /// Backend error message
        message: String,
    },

    /// The program wrote non-UTF-8 output
    #[error("'{program}' produced non-UTF-8 output")]
    NonUtf8 {
        /// Program that produced the output
        program: String,
    },
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "killed".to_string(), |c| format!("exit code {c}"))
}

/// Value bound to an environment variable
#[derive(Debug, Clone)]
pub enum EnvValue {
    /// Non-sensitive value; may appear in argv and logs
    Plain(String),
    /// Sensitive value; only ever placed in a process environment
    Secret(SecureSecret),
}

impl EnvValue {
    /// Expose the value for handing to a child process.
    #[must_use]
    pub fn expose(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Secret(secret) => secret.expose(),
        }
    }

    /// Whether the value must be kept out of argv and logs
    #[must_use]
    pub const fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

/// Ordered environment bindings for a subprocess
#[derive(Debug, Clone, Default)]
pub struct EnvBindings {
    vars: Vec<(String, EnvValue)>,
}

impl EnvBindings {
    /// Create an empty set of bindings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a plain variable
    #[must_use]
    pub fn plain(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, EnvValue::Plain(value.into()));
        self
    }

    /// Bind a secret variable
    #[must_use]
    pub fn secret(mut self, name: impl Into<String>, value: SecureSecret) -> Self {
        self.set(name, EnvValue::Secret(value));
        self
    }

    /// Bind a variable, replacing any earlier binding of the same name
    pub fn set(&mut self, name: impl Into<String>, value: EnvValue) {
        let name = name.into();
        if let Some(existing) = self.vars.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.vars.push((name, value));
        }
    }

    /// Look up a binding by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EnvValue> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate over bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnvValue)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether there are no bindings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Runs an argument vector with environment bindings and captures stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` (program first) and return its stdout.
    async fn run(&self, argv: &[String], env: &EnvBindings) -> Result<String, ExecError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    async fn run(&self, argv: &[String], env: &EnvBindings) -> Result<String, ExecError> {
        (**self).run(argv, env).await
    }
}

/// Runs commands as local child processes.
///
/// The child inherits the parent environment plus the given bindings, and is
/// killed if the returned future is dropped before it exits.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String], env: &EnvBindings) -> Result<String, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (name, value) in env.iter() {
            command.env(name, value.expose());
        }

        tracing::debug!(
            program = %program,
            args = args.len(),
            env = ?env.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            "Running command"
        );

        let output = command.output().await.map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Only the first line; the rest can contain local paths.
            let stderr = stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("unknown error")
                .to_string();
            return Err(ExecError::Failed {
                program: program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ExecError::NonUtf8 {
            program: program.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let runner = ProcessRunner::new();
        let out = runner
            .run(&sh("echo test_value"), &EnvBindings::new())
            .await
            .unwrap();
        assert_eq!(out.trim(), "test_value");
    }

    #[tokio::test]
    async fn test_run_passes_env_bindings() {
        let runner = ProcessRunner::new();
        let env = EnvBindings::new()
            .plain("SHIPYARD_PLAIN", "visible")
            .secret("SHIPYARD_SECRET", SecureSecret::new("hidden".to_string()));
        let out = runner
            .run(&sh("echo \"$SHIPYARD_PLAIN:$SHIPYARD_SECRET\""), &env)
            .await
            .unwrap();
        assert_eq!(out.trim(), "visible:hidden");
    }

    #[tokio::test]
    async fn test_run_failure_reports_first_stderr_line() {
        let runner = ProcessRunner::new();
        let err = runner
            .run(
                &sh("echo '' >&2; echo 'bad token' >&2; echo more >&2; exit 3"),
                &EnvBindings::new(),
            )
            .await
            .unwrap_err();
        match err {
            ExecError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "bad token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_empty_argv() {
        let runner = ProcessRunner::new();
        let err = runner.run(&[], &EnvBindings::new()).await.unwrap_err();
        assert!(matches!(err, ExecError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let runner = ProcessRunner::new();
        let argv = vec!["/nonexistent/shipyard-test-binary".to_string()];
        let err = runner.run(&argv, &EnvBindings::new()).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn test_env_bindings_replace_same_name() {
        let mut env = EnvBindings::new().plain("A", "1").plain("B", "2");
        env.set("A", EnvValue::Plain("3".to_string()));
        assert_eq!(env.len(), 2);
        assert_eq!(env.get("A").map(EnvValue::expose), Some("3"));
        let names: Vec<_> = env.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_env_bindings_debug_redacts_secrets() {
        let env = EnvBindings::new().secret("TOKEN", SecureSecret::new("s3cr3t".to_string()));
        let debug = format!("{env:?}");
        assert!(debug.contains("TOKEN"));
        assert!(!debug.contains("s3cr3t"));
        assert!(env.get("TOKEN").is_some_and(EnvValue::is_secret));
    }

    #[test]
    fn test_failed_display_without_code() {
        let err = ExecError::Failed {
            program: "op".to_string(),
            code: None,
            stderr: "interrupted".to_string(),
        };
        assert_eq!(err.to_string(), "'op' failed (killed): interrupted");
    }

    #[test]
    fn test_backend_display() {
        let err = ExecError::Backend {
            program: "/replicated".to_string(),
            backend: "dagger",
            message: "engine unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "'/replicated' failed in dagger: engine unavailable"
        );
    }
}
