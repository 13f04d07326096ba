// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
pub struct Args {
    /// i2c-dev character device the sensor is attached to
    #[arg(long, env = "SCD41_I2C_BUS", default_value = "/dev/i2c-3")]
    pub i2c_bus: String,

    #[arg(long, default_value = "0x62", value_parser = parse_address)]
    pub address: u16,

    /// Directory of the dated log file
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,

    /// Held by every subcommand while it drives the sensor
    #[arg(long, default_value = "/tmp/scd41.lock")]
    pub lock_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run scheduled measurement sessions until interrupted
    Run(RunArgs),

    /// Forced recalibration against a known CO2 concentration
    Calibrate {
        /// Reference concentration in ppm
        #[arg(long)]
        target: u16,
    },

    /// Take one single-shot measurement and print it
    SingleShot {
        #[arg(long, default_value_t = 0x1000)]
        device: i32,
    },
}

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Records the database refused are appended here
    #[arg(long, default_value = "scd41_fallback.csv")]
    pub fallback_file: PathBuf,

    #[arg(long, default_value_t = 0x1000)]
    pub device: i32,

    /// Sessions end on this grid
    #[arg(long, default_value_t = 5)]
    pub interval_minutes: i64,

    /// How long before each grid boundary a session starts
    #[arg(long, default_value_t = 130)]
    pub lead_seconds: i64,

    /// Length of the poll/read cycle of one session
    #[arg(long, default_value_t = 120)]
    pub term_seconds: u64,

    /// Store every reading instead of only the last one of a session
    #[arg(long)]
    pub every_reading: bool,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid I2C address {s}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_accepts_hex_and_decimal() {
        assert_eq!(parse_address("0x62"), Ok(0x62));
        assert_eq!(parse_address("98"), Ok(98));
        assert!(parse_address("0xZZ").is_err());
    }

    #[test]
    fn run_defaults() {
        let args = Args::parse_from(["scd41-logger", "run", "--database-url", "postgres://x"]);
        assert_eq!(args.address, 0x62);
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.device, 0x1000);
        assert_eq!(run.term_seconds, 120);
        assert!(!run.every_reading);
    }

    #[test]
    fn lock_file_is_global() {
        let args = Args::parse_from([
            "scd41-logger",
            "--lock-file",
            "/run/scd41.lock",
            "calibrate",
            "--target",
            "428",
        ]);
        assert_eq!(args.lock_file, PathBuf::from("/run/scd41.lock"));
        assert!(matches!(args.command, Command::Calibrate { target: 428 }));

        let args = Args::parse_from(["scd41-logger", "single-shot"]);
        assert_eq!(args.lock_file, PathBuf::from("/tmp/scd41.lock"));
    }
}
