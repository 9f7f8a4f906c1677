use std::fs::File;
use std::io::{stderr, stdout, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};
use colored::Colorize;

use super::Error;
use crate::fs::Fs;

/// Run a subprocess, storing stdout and stderr in the given `log_dir`
/// while also forwarding them to our own stdout and stderr.
/// Returns whether the process exited successfully.
/// Based on:
/// <https://stackoverflow.com/questions/66060139/how-to-tee-stdout-stderr-from-a-subprocess-in-rust>
pub fn run_cmd(cmd: &mut Command, log_dir: &Path, fs: &Fs, verbose: bool) -> Result<bool> {
    if verbose {
        eprintln!("{}", "Creating stdout and stderr files...".magenta());
    }

    let (out_file, err_file) = make_log_files(fs, log_dir)?;

    if verbose {
        eprintln!("{}", "Running command...".magenta());
    }
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| {
            format!(
                "failed to execute child process {:?} {:?}",
                cmd.get_program(),
                cmd.get_args().collect::<Vec<_>>(),
            )
        })?;

    let child_out = child.stdout.take().ok_or(Error::NoChildStream("stdout"))?;
    let child_err = child.stderr.take().ok_or(Error::NoChildStream("stderr"))?;

    let thread_out = thread::spawn(move || communicate(child_out, out_file, stdout()));
    let thread_err = thread::spawn(move || communicate(child_err, err_file, stderr()));

    thread_out
        .join()
        .map_err(|_| Error::ForwardingThread("stdout"))?
        .context("communicating with child stdout")?;
    thread_err
        .join()
        .map_err(|_| Error::ForwardingThread("stderr"))?
        .context("communicating with child stderr")?;

    let status = child.wait().context("waiting on child process")?;

    if verbose {
        eprintln!("\n{} with {status}.", "Process finished".green());
    }
    Ok(status.success())
}

fn communicate<R: Read, W: Write>(
    mut stream: R,
    mut file: File,
    mut output: W,
) -> std::io::Result<()> {
    let mut buf = [0u8; 1024];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        file.write_all(buf)?;
        output.write_all(buf)?;
    }

    Ok(())
}

fn make_log_files(fs: &Fs, log_dir: &Path) -> Result<(File, File)> {
    let mut pathbuf = PathBuf::new();
    let out_file = fs
        .create_file(fs.submit_stdout(log_dir, &mut pathbuf))
        .context("creating submit.out file")?;

    let err_file = fs
        .create_file(fs.submit_stderr(log_dir, &mut pathbuf))
        .context("creating submit.err file")?;

    Ok((out_file, err_file))
}
