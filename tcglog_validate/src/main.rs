/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Decodes the platform's measured boot event log, validates it, and prints the findings.

mod config;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use log::{info, warn, LevelFilter};
use tcg_common::{AlgorithmId, Digest, PcrBanks, PcrSource, TcgLogError};
use tcg_eventlog::{validate_log, EventLog};
use crate::config::{Settings, ToolConfig};

#[derive(Parser)]
#[clap(author, version, about = "Validate a TCG measured boot event log", long_about = None)]
struct Cli {
    /// Event log file [default: /sys/kernel/security/tpm0/binary_bios_measurements]
    #[clap(short, long)]
    log: Option<PathBuf>,

    /// JSON file with the live PCR values
    #[clap(long)]
    pcrs: Option<PathBuf>,

    /// Check the specified PCR. Can be specified multiple times
    #[clap(long = "pcr", value_parser = clap::value_parser!(u32).range(0..=31))]
    pcr: Vec<u32>,

    /// YAML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Print debug output
    #[clap(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn no_live_values(index: u32, algorithm: AlgorithmId) -> Result<Digest, TcgLogError> {
    Err(TcgLogError::PcrValueError(format!("No live value for PCR{} in bank {}", index, algorithm)))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let file_config = match &cli.config {
        Some(path) => ToolConfig::from_file(path)?,
        None => ToolConfig::default(),
    };
    let mut settings = Settings::resolve(file_config, cli.log, cli.pcrs, cli.pcr);

    let banks = match &settings.pcr_values_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read PCR values {}", path.display()))?;
            Some(PcrBanks::from_json_str(&json)?)
        }
        None => {
            warn!("No live PCR values supplied, skipping log consistency checks");
            settings.options.pcr_selection.clear();
            None
        }
    };
    let source: &dyn PcrSource = match &banks {
        Some(banks) => banks,
        None => &no_live_values,
    };

    let mut log = EventLog::from_file(&settings.log_path)
        .with_context(|| format!("Failed to open log file {}", settings.log_path.display()))?;
    info!("Validating {} against PCRs {:?}", settings.log_path.display(), settings.options.pcr_selection);

    match validate_log(&mut log, source, &settings.options) {
        Ok(result) => {
            print!("{}", report::render(&result)?);
            Ok(())
        }
        Err(partial) => {
            print!("{}", report::render(&partial.result)?);
            Err(anyhow::Error::new(partial.error).context("Failed to validate log file"))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
