// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal as _, Stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::Local;
use env_logger::{Builder, Env, Target};

/// Logs to `log_scd41_YYYYMMDD.txt` in `log_dir`, and to stdout as well when
/// running in the foreground. The filter comes from `RUST_LOG`, default `info`.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    let path = log_dir.join(format!("log_scd41_{}.txt", Local::now().format("%Y%m%d")));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let target: Box<dyn Write + Send> = if io::stdout().is_terminal() {
        Box::new(Tee {
            file,
            stdout: io::stdout(),
        })
    } else {
        Box::new(file)
    };

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(target))
        .try_init()
        .context("failed to install logger")?;

    Ok(path)
}

struct Tee {
    file: File,
    stdout: Stdout,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.stdout.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.stdout.flush()
    }
}
