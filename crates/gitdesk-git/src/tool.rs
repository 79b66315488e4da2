//! Running the external `git` executable.
//!
//! Network operations shell out to git so that the user's transports,
//! credential helpers and SSH setup apply unchanged. Each invocation runs
//! exactly once; the runner only adds cancellation and output capture.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Locator for the external git executable.
#[derive(Debug, Clone)]
pub struct GitTool {
    program: PathBuf,
}

impl Default for GitTool {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitTool {
    /// Use `program`, either a bare name looked up on `PATH` or an explicit path.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The configured program name or path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Resolve the executable through the standard OS lookup.
    ///
    /// # Errors
    /// Returns [`Error::ToolUnavailable`] if the program cannot be found.
    pub fn resolve(&self) -> Result<PathBuf> {
        which::which(&self.program)
            .map_err(|e| Error::ToolUnavailable(format!("{}: {e}", self.program.display())))
    }

    /// Version reported by `git --version`, e.g. `2.43.0`.
    ///
    /// # Errors
    /// Returns [`Error::ToolUnavailable`] if git is missing or does not run.
    pub fn version(&self) -> Result<String> {
        let cwd = std::env::temp_dir();
        match self
            .invocation(&cwd)
            .arg("--version")
            .run(&CancelToken::new())?
        {
            Completion::Finished(output) if output.success => Ok(parse_version(&output.stdout)),
            Completion::Finished(output) => Err(Error::ToolUnavailable(output.stderr)),
            Completion::Cancelled => Err(Error::Cancelled),
        }
    }

    /// Start building an invocation that runs in `cwd`.
    pub(crate) fn invocation(&self, cwd: impl Into<PathBuf>) -> Invocation<'_> {
        Invocation {
            tool: self,
            cwd: cwd.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }
}

/// One run of the external tool.
pub(crate) struct Invocation<'a> {
    tool: &'a GitTool,
    cwd: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

/// How a run ended.
#[derive(Debug)]
pub(crate) enum Completion {
    Finished(ToolOutput),
    Cancelled,
}

/// Captured result of a finished run.
#[derive(Debug, Default)]
pub(crate) struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Both streams, for pattern classification.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stderr, self.stdout)
    }
}

impl Invocation<'_> {
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Spawn the process and wait for it, polling `cancel` while it runs.
    pub fn run(self, cancel: &CancelToken) -> Result<Completion> {
        let program = self.tool.resolve()?;
        tracing::debug!(
            program = %program.display(),
            args = ?self.args,
            cwd = %self.cwd.display(),
            "spawning git"
        );

        let mut child = Command::new(&program)
            .args(&self.args)
            .envs(self.envs)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&program, &e))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if cancel.is_cancelled() {
                // The child may already have exited; either way it is gone afterwards.
                let _ = child.kill();
                let _ = child.wait();
                tracing::info!(args = ?self.args, "git process cancelled");
                return Ok(Completion::Cancelled);
            }
            match child.try_wait()? {
                Some(status) => break status,
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let output = ToolOutput {
            success: status.success(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        };
        tracing::debug!(success = output.success, stderr = %output.stderr.trim(), "git finished");
        Ok(Completion::Finished(output))
    }
}

fn spawn_error(program: &Path, err: &std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::ToolUnavailable(format!("{}: {err}", program.display()))
    } else {
        Error::Unknown(format!("failed to start {}: {err}", program.display()))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn parse_version(stdout: &str) -> String {
    let line = stdout.trim();
    line.strip_prefix("git version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(line)
        .to_string()
}

/// Map failure output of the external tool onto an error kind.
///
/// Patterns are checked in order; the first match wins. `MergeConflict`
/// comes back without paths, callers read those from the index.
pub(crate) fn classify_failure(output: &str) -> Error {
    const REJECTED: &[&str] = &["[rejected]", "non-fast-forward", "fetch first", "rejected"];
    const AUTH: &[&str] = &[
        "authentication failed",
        "permission denied",
        "could not read username",
        "could not read password",
        "terminal prompts disabled",
        "invalid username or password",
        "requested url returned error: 401",
        "requested url returned error: 403",
    ];
    const NETWORK: &[&str] = &[
        "could not resolve host",
        "connection refused",
        "connection timed out",
        "operation timed out",
        "network is unreachable",
        "unable to access",
        "could not read from remote repository",
        "connection reset",
        "the remote end hung up",
        "does not appear to be a git repository",
    ];
    const DIRTY: &[&str] = &[
        "would be overwritten",
        "commit your changes or stash them",
        "unmerged files",
    ];
    const IDENTITY: &[&str] = &["please tell me who you are", "unable to auto-detect email"];

    let lower = output.to_lowercase();
    let hit = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));
    let message = summarize(output);

    if hit(REJECTED) {
        Error::Rejected(message)
    } else if hit(AUTH) {
        Error::AuthError(message)
    } else if hit(NETWORK) {
        Error::NetworkError(message)
    } else if lower.contains("conflict") {
        Error::MergeConflict { paths: Vec::new() }
    } else if hit(DIRTY) {
        Error::DirtyWorkingTree { paths: Vec::new() }
    } else if hit(IDENTITY) {
        Error::MissingIdentity
    } else {
        Error::Unknown(message)
    }
}

/// The most telling lines of tool output (`fatal:`/`error:` first).
fn summarize(output: &str) -> String {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let important: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| l.starts_with("fatal:") || l.starts_with("error:") || l.starts_with('!'))
        .collect();

    if important.is_empty() {
        lines.join("\n")
    } else {
        important.join("\n")
    }
}
