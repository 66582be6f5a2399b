//! Subprocess execution
//!
//! Every external command (npm, gem, bower, grunt) is described by an
//! [`Invocation`] and executed through a [`CommandRunner`]. The search path
//! is explicit per invocation instead of mutated process-wide.

use crate::error::{NodepackError, NodepackResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Max number of output lines to include in failure messages.
const ERROR_TAIL_LINES: usize = 50;

/// Indentation applied to subprocess output in the build log
const INDENT: &str = "       ";

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
    /// Directories searched before the inherited `PATH`
    pub path_prepend: Vec<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: BTreeMap::new(),
            path_prepend: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn path_prepend(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.path_prepend.extend(dirs);
        self
    }

    /// Human-readable command line for logs and errors
    pub fn display(&self) -> String {
        let program = Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone());
        std::iter::once(program)
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `PATH` value for the child: prepended dirs, then the inherited path
    pub fn search_path(&self) -> Option<OsString> {
        if self.path_prepend.is_empty() {
            return None;
        }
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs = self
            .path_prepend
            .iter()
            .cloned()
            .chain(std::env::split_paths(&inherited));
        std::env::join_paths(dirs).ok()
    }

    /// Locate the program in the prepended dirs, else leave it to the OS
    pub fn resolve_program(&self) -> PathBuf {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.to_path_buf();
        }
        self.path_prepend
            .iter()
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| program.to_path_buf())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes invocations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and return the captured output
    async fn run(&self, invocation: &Invocation) -> NodepackResult<CommandOutput>;

    /// Run and fail on a non-zero exit
    async fn run_checked(&self, invocation: &Invocation) -> NodepackResult<CommandOutput> {
        let output = self.run(invocation).await?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(NodepackError::CommandExit {
                command: invocation.display(),
                code: output.code.unwrap_or(-1),
                output: indent(&error_output(&output.stdout, &output.stderr)),
            })
        }
    }
}

/// Runs commands on the host with `tokio::process`
#[derive(Debug, Clone)]
pub struct SystemRunner {
    /// Echo output lines to the build log as they arrive
    echo: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self { echo: true }
    }

    /// A runner that only captures output
    pub fn quiet() -> Self {
        Self { echo: false }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> NodepackResult<CommandOutput> {
        debug!("Executing: {}", invocation.display());

        let mut command = Command::new(invocation.resolve_program());
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = invocation.search_path() {
            command.env("PATH", path);
        }

        let mut child = command
            .spawn()
            .map_err(|e| NodepackError::command_failed(invocation.display(), e))?;

        let echo = self.echo;
        let (stdout, stderr) = stream_child_output(&mut child, &move |line: &str| {
            if echo {
                println!("{}{}", INDENT, line);
            }
        })
        .await;

        let status = child
            .wait()
            .await
            .map_err(|e| NodepackError::command_failed(invocation.display(), e))?;

        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Stream stdout and stderr of a child, calling `on_line` for each line.
///
/// Returns the collected (stdout, stderr) text.
async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_line: &(dyn Fn(&str) + Send + Sync),
) -> (String, String) {
    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (String::new(), String::new());
    };

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            line = stdout_reader.next_line(), if !stdout_done => match line {
                Ok(Some(line)) => {
                    on_line(&line);
                    stdout_lines.push(line);
                }
                _ => stdout_done = true,
            },
            line = stderr_reader.next_line(), if !stderr_done => match line {
                Ok(Some(line)) => {
                    on_line(&line);
                    stderr_lines.push(line);
                }
                _ => stderr_done = true,
            },
        }
    }

    (stdout_lines.join("\n"), stderr_lines.join("\n"))
}

/// The useful tail of a failed command's output
pub fn error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Indent every line for the build log
pub fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", INDENT, line))
        .collect::<Vec<_>>()
        .join("\n")
}
