//! Compile-and-run boundary.
//!
//! [`Toolchain`] is the only way the session touches the outside world, so
//! tests can swap in a fake. [`ProcessToolchain`] is the real thing: it writes
//! the program into a work directory, runs the external compiler, then runs
//! the produced binary, capturing output from both without inheriting the
//! terminal.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{BuildError, Stage};

/// Compiler used when configuration doesn't name one.
pub const DEFAULT_COMPILER: &str = "g++";

/// File name of the generated program inside the work directory.
pub const SOURCE_FILE_NAME: &str = "repl.cpp";

/// File name of the compiled program inside the work directory.
pub const BINARY_FILE_NAME: &str = if cfg!(target_os = "windows") {
    "a.exe"
} else {
    "a.out"
};

pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Minimum wait for the pipe readers once the child has exited, so output
/// written right before a deadline exit is still collected.
const READER_GRACE: Duration = Duration::from_millis(50);

/// Builds a complete program and runs it.
pub trait Toolchain {
    /// Compile and execute `source`, returning everything the program wrote
    /// to standard output.
    fn build(&mut self, source: &str) -> Result<String, BuildError>;
}

/// A [`Toolchain`] backed by an external compiler process.
#[derive(Debug, Clone)]
pub struct ProcessToolchain {
    compiler: String,
    flags: Vec<String>,
    source_path: PathBuf,
    binary_path: PathBuf,
    compile_timeout: Duration,
    run_timeout: Duration,
}

impl ProcessToolchain {
    /// Use `work_dir` for the generated source and binary, with the default
    /// compiler and timeouts.
    pub fn new(work_dir: &Path) -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            flags: Vec::new(),
            source_path: work_dir.join(SOURCE_FILE_NAME),
            binary_path: work_dir.join(BINARY_FILE_NAME),
            compile_timeout: DEFAULT_COMPILE_TIMEOUT,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    /// Extra compiler arguments, placed before the source path.
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_timeouts(mut self, compile: Duration, run: Duration) -> Self {
        self.compile_timeout = compile;
        self.run_timeout = run;
        self
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn write_source(&self, source: &str) -> Result<(), BuildError> {
        if let Some(dir) = self.source_path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                BuildError::io(format!("cannot create work directory {}", dir.display()), e)
            })?;
        }
        fs::write(&self.source_path, source).map_err(|e| {
            BuildError::io(format!("cannot write {}", self.source_path.display()), e)
        })
    }

    fn compile(&self) -> Result<(), BuildError> {
        let mut cmd = Command::new(&self.compiler);
        cmd.args(&self.flags)
            .arg(&self.source_path)
            .arg("-o")
            .arg(&self.binary_path);

        let started = Instant::now();
        let out = run_captured(
            &mut cmd,
            Stage::Compile,
            self.compile_timeout,
            &format!("cannot invoke compiler `{}`", self.compiler),
        )?;
        tracing::debug!(
            compiler = %self.compiler,
            code = ?out.status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compile finished"
        );

        if !out.status.success() {
            return Err(BuildError::Compile {
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            });
        }
        Ok(())
    }

    fn execute(&self) -> Result<String, BuildError> {
        let mut cmd = Command::new(&self.binary_path);

        let started = Instant::now();
        let out = run_captured(
            &mut cmd,
            Stage::Execute,
            self.run_timeout,
            &format!("cannot execute {}", self.binary_path.display()),
        )?;
        tracing::debug!(
            binary = %self.binary_path.display(),
            code = ?out.status.code(),
            stdout_bytes = out.stdout.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "execution finished"
        );

        if !out.status.success() {
            let mut stderr = String::from_utf8_lossy(&out.stderr).into_owned();
            #[cfg(unix)]
            if let Some(signal) = std::os::unix::process::ExitStatusExt::signal(&out.status) {
                stderr.push_str(&format!("terminated by signal {signal}\n"));
            }
            return Err(BuildError::Exec {
                code: out.status.code(),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl Toolchain for ProcessToolchain {
    fn build(&mut self, source: &str) -> Result<String, BuildError> {
        self.write_source(source)?;
        tracing::debug!(path = %self.source_path.display(), bytes = source.len(), "wrote source");
        self.compile()?;
        self.execute()
    }
}

struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Spawn `cmd` detached from the terminal and wait at most `limit` for it.
///
/// The limit covers the pipes as well as the process: anything the child
/// left running with our stdout or stderr still open counts against it.
fn run_captured(
    cmd: &mut Command,
    stage: Stage,
    limit: Duration,
    spawn_context: &str,
) -> Result<Captured, BuildError> {
    let started = Instant::now();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BuildError::io(spawn_context, e))?;

    // Drain both pipes while waiting so a chatty child can't fill them and stall.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match child.wait_timeout(limit) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!(%stage, ?limit, "killed child after timeout");
            return Err(BuildError::Timeout { stage, limit });
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BuildError::io(format!("waiting for {stage}"), e));
        }
    };

    let deadline = started + limit;
    Ok(Captured {
        status,
        stdout: collect(&stdout, stage, limit, deadline)?,
        stderr: collect(&stderr, stage, limit, deadline)?,
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        // The receiver is gone when the read outlived the deadline.
        let _ = tx.send(result);
    });
    rx
}

fn collect(
    rx: &Receiver<io::Result<Vec<u8>>>,
    stage: Stage,
    limit: Duration,
    deadline: Instant,
) -> Result<Vec<u8>, BuildError> {
    let context = format!("reading {stage} output");
    let wait = deadline
        .saturating_duration_since(Instant::now())
        .max(READER_GRACE);
    match rx.recv_timeout(wait) {
        Ok(result) => result.map_err(|e| BuildError::io(context, e)),
        Err(RecvTimeoutError::Timeout) => {
            tracing::debug!(%stage, ?limit, "output pipe held open past the deadline");
            Err(BuildError::Timeout { stage, limit })
        }
        Err(RecvTimeoutError::Disconnected) => Err(BuildError::io(
            context,
            io::Error::other("output reader exited without a result"),
        )),
    }
}

/// Extension trait for `std::process::Child` to support timeouts.
trait ChildExt {
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            match self.try_wait()? {
                Some(status) => return Ok(Some(status)),
                None => {
                    if start.elapsed() >= timeout {
                        return Ok(None);
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }
}
