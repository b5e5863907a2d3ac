use std::{
    io::Read,
    path::Path,
    process::{Command, ExitStatus, Stdio},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use super::ShaderFile;
use crate::toolchain::Toolchain;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("could not find `{program}`, is it installed and in PATH?")]
    ToolMissing { program: String },

    #[error("could not run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not wait for the dependency scanner")]
    Wait(#[source] std::io::Error),

    #[error("dependency scanner exited with {status}: {stderr}")]
    Status { status: ExitStatus, stderr: String },

    #[error("dependency scanner reported errors: {stderr}")]
    Stderr { stderr: String },

    #[error("dependency scanner did not finish within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("dependency scanner output is not valid UTF-8")]
    Encoding(#[source] std::string::FromUtf8Error),

    #[error("expected a rule for `{expected}`, found {found:?}")]
    UnexpectedTarget { expected: String, found: String },
}

/// Rule stub listing the files an artifact depends on, without a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFragment {
    text: String,
}

impl DependencyFragment {
    /// Accepts scanner output only if it is a rule for the shader's artifact.
    pub fn parse(text: String, shader: &ShaderFile) -> Result<Self, ScanError> {
        let target = text.split_once(':').map(|(target, _)| target.trim());
        if target != Some(shader.artifact()) {
            return Err(ScanError::UnexpectedTarget {
                expected: shader.artifact().to_owned(),
                found: text.lines().next().unwrap_or_default().to_owned(),
            });
        }

        Ok(DependencyFragment { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Produces the dependency fragment of a single shader.
pub trait DependencyScanner {
    /// `shader` is named relative to `dir`.
    fn scan(&self, dir: &Path, shader: &ShaderFile) -> Result<DependencyFragment, ScanError>;
}

/// Runs the compiler's dependency-list mode (`-M`) as a subprocess.
pub struct ExternalScanner {
    toolchain: Toolchain,
    leading_args: Vec<String>,
}

impl ExternalScanner {
    pub fn new(toolchain: Toolchain) -> Self {
        ExternalScanner {
            toolchain,
            leading_args: Vec::new(),
        }
    }

    /// Arguments passed before the scan flags, for compilers started through a launcher.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, dir: &Path, shader: &ShaderFile) -> Command {
        let mut command = Command::new(&self.toolchain.compiler);
        command
            .args(&self.leading_args)
            .arg("-M")
            .args(shader.stage_flags(&self.toolchain));

        if shader.stage().is_hlsl() {
            command.arg("-MT").arg(shader.artifact());
        }

        command
            .arg(shader.name())
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl DependencyScanner for ExternalScanner {
    fn scan(&self, dir: &Path, shader: &ShaderFile) -> Result<DependencyFragment, ScanError> {
        debug!(shader = shader.name(), "scanning dependencies");

        let output = run(
            self.command(dir, shader),
            &self.toolchain.compiler,
            self.toolchain.scan_timeout,
        )?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        if !output.status.success() {
            return Err(ScanError::Status {
                status: output.status,
                stderr,
            });
        }
        if !stderr.is_empty() {
            return Err(ScanError::Stderr { stderr });
        }

        let text = String::from_utf8(output.stdout).map_err(ScanError::Encoding)?;
        DependencyFragment::parse(text, shader)
    }
}

struct Output {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Runs `command` to completion, killing it once `timeout` has passed.
fn run(mut command: Command, program: &str, timeout: Duration) -> Result<Output, ScanError> {
    let mut child = command.spawn().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScanError::ToolMissing {
                program: program.to_owned(),
            }
        } else {
            ScanError::Spawn {
                program: program.to_owned(),
                source,
            }
        }
    })?;

    // drain both pipes while waiting so the child never blocks on a full buffer
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ScanError::Timeout { timeout });
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(error) => {
                let _ = child.kill();
                return Err(ScanError::Wait(error));
            }
        }
    };

    Ok(Output {
        status,
        stdout: join(stdout).map_err(ScanError::Wait)?,
        stderr: join(stderr).map_err(ScanError::Wait)?,
    })
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn join(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> std::io::Result<Vec<u8>> {
    handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("pipe reader panicked")))
}
