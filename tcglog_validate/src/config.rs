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

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Context;
use tcg_eventlog::LogValidateOptions;

/// Event log exposed by the kernel for the first TPM
pub const DEFAULT_LOG_PATH: &str = "/sys/kernel/security/tpm0/binary_bios_measurements";

/// Settings read from the optional YAML file
///
/// ```yaml
/// log_path: /sys/kernel/security/tpm0/binary_bios_measurements
/// pcr_values_path: /etc/tcglog/pcrs.json
/// validate:
///   pcr_selection: [0, 1, 2, 3, 4, 5, 6, 7]
/// ```
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    pub log_path: Option<PathBuf>,
    pub pcr_values_path: Option<PathBuf>,
    pub validate: Option<LogValidateOptions>,
}

impl ToolConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Effective settings after command line flags are applied over the file
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_path: PathBuf,
    pub pcr_values_path: Option<PathBuf>,
    pub options: LogValidateOptions,
}

impl Settings {
    pub fn resolve(
        config: ToolConfig,
        log_path: Option<PathBuf>,
        pcr_values_path: Option<PathBuf>,
        pcrs: Vec<u32>,
    ) -> Self {
        let mut options = config.validate.unwrap_or_default();
        if !pcrs.is_empty() {
            options.pcr_selection = pcrs;
        }
        Self {
            log_path: log_path
                .or(config.log_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            pcr_values_path: pcr_values_path.or(config.pcr_values_path),
            options,
        }
    }
}
