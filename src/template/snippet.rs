//! Executable snippets.
//!
//! A snippet is anything that turns an engine handle and a parameter map into
//! text. Closures implement [`Snippet`] directly; file-backed snippets are
//! scripts run as child processes.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::debug;

use super::engine::{Engine, RenderError};
use super::tag::Params;

/// Prefix of the environment variables a script snippet receives.
pub const ENV_PREFIX: &str = "SNIPPET_";

#[derive(Error, Debug)]
pub enum SnippetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{} exited with {status}: {stderr}", path.display())]
    Script {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Render(#[from] Box<RenderError>),
}

impl From<RenderError> for SnippetError {
    fn from(e: RenderError) -> Self {
        Self::Render(Box::new(e))
    }
}

/// A named executable unit.
///
/// The engine handle lets a snippet read placeholders or render further
/// templates; whatever it returns is re-scanned by the caller's loop.
pub trait Snippet: Send + Sync {
    fn execute(&self, engine: &mut Engine, params: &Params) -> Result<String, SnippetError>;
}

impl<F> Snippet for F
where
    F: Fn(&mut Engine, &Params) -> Result<String, SnippetError> + Send + Sync,
{
    fn execute(&self, engine: &mut Engine, params: &Params) -> Result<String, SnippetError> {
        self(engine, params)
    }
}

/// Pins a closure to the snippet signature so its argument types can be
/// inferred at the call site.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&mut Engine, &Params) -> Result<String, SnippetError> + Send + Sync,
{
    f
}

/// Runs an executable file. Each parameter `name` is exported as
/// `SNIPPET_NAME`; stdout is the snippet's output.
#[derive(Debug, Clone)]
pub struct ScriptSnippet {
    path: PathBuf,
}

impl ScriptSnippet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Snippet for ScriptSnippet {
    fn execute(&self, _engine: &mut Engine, params: &Params) -> Result<String, SnippetError> {
        debug!(script = %self.path.display(), params = params.len(), "running snippet");

        let mut command = Command::new(&self.path);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (name, value) in params.iter() {
            command.env(env_name(name), value);
        }

        let output = command.output()?;
        if !output.status.success() {
            return Err(SnippetError::Script {
                path: self.path.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn env_name(param: &str) -> String {
    format!("{ENV_PREFIX}{}", param.to_ascii_uppercase())
}
