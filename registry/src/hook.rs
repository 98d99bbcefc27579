use std::io::{stderr, Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result};

use crate::Package;

/// Result of running a package hook.
pub struct HookOutput {
    pub status: ExitStatus,
    /// Everything the hook wrote to stderr.
    pub stderr: String,
}

impl HookOutput {
    /// Last non-empty line of stderr, for error messages.
    pub fn last_error_line(&self) -> Option<&str> {
        self.stderr.lines().rev().find(|line| !line.trim().is_empty())
    }
}

/// Run `cmd` with `sh -c` in the package's directory.
/// Stdout is forwarded to our stderr when `echo` is set; stderr is always captured
/// and also forwarded when `echo` is set.
pub fn run_hook(package: &Package, cmd: &str, echo: bool) -> Result<HookOutput> {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(cmd)
        .env("VTPKG_IDENTIFIER", &package.identifier)
        .env("VTPKG_CODEPATH", &package.codepath)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &package.dir {
        command.current_dir(dir);
    }

    log::debug!(
        "running hook for {} in {}: {cmd}",
        package.identifier,
        package.dir.as_deref().unwrap_or(Path::new(".")).display(),
    );

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning hook for package '{}'", package.identifier))?;

    let child_out = child.stdout.take().context("attaching to hook stdout")?;
    let child_err = child.stderr.take().context("attaching to hook stderr")?;

    let thread_out = thread::spawn(move || communicate(child_out, echo));
    let thread_err = thread::spawn(move || communicate(child_err, echo));

    // a panicked reader thread only loses output; the exit status still counts.
    let _ = thread_out.join();
    let captured_err = thread_err.join().unwrap_or_else(|_| Ok(Vec::new()));

    let status = child.wait().context("waiting on hook process")?;
    log::debug!("hook for {} finished with {status}", package.identifier);

    Ok(HookOutput {
        status,
        stderr: String::from_utf8_lossy(&captured_err?).into_owned(),
    })
}

fn communicate<R: Read>(mut stream: R, echo: bool) -> std::io::Result<Vec<u8>> {
    let mut captured = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        captured.extend_from_slice(buf);
        if echo {
            stderr().write_all(buf)?;
        }
    }

    Ok(captured)
}
