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

//! Live PCR values.
//!
//! The replay engine never talks to a TPM itself. It asks a `PcrSource` for the current value of a
//! PCR in one bank. `PcrBanks` is the JSON backed source used by the command line tool; any closure
//! `Fn(u32, AlgorithmId) -> Result<Digest, TcgLogError>` is a source as well.
//!
//! # Examples
//! ```
//! use tcg_common::{AlgorithmId, PcrBanks, PcrSource};
//! use serde_json::json;
//!
//! let json_value = json!({
//!     "hash_alg": "sha256",
//!     "pcr_values": [
//!         {
//!             "pcr_index": 0,
//!             "pcr_value": "9d7504bb0d32f62d43310f38df37cdd5e42bdb83dd0c0592fd9b1c3b16770c35"
//!         }
//!     ]
//! });
//! let banks = PcrBanks::from_json(&json_value).unwrap();
//! assert!(banks.pcr_value(0, AlgorithmId::Sha256).is_ok());
//! ```
use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use crate::error::TcgLogError;
use crate::structure::{AlgorithmId, Digest};

/// Upper bound for accepted PCR value documents
const MAX_PCR_JSON_SIZE: usize = 5 * 1024 * 1024;

/// Valid PCR index range (0-31)
const PCR_INDEX_MIN: u32 = 0;
const PCR_INDEX_MAX: u32 = 31;

/// Supplies the platform's current value of a PCR in one bank
pub trait PcrSource {
    fn pcr_value(&self, index: u32, algorithm: AlgorithmId) -> Result<Digest, TcgLogError>;
}

impl<F> PcrSource for F
where
    F: Fn(u32, AlgorithmId) -> Result<Digest, TcgLogError>,
{
    fn pcr_value(&self, index: u32, algorithm: AlgorithmId) -> Result<Digest, TcgLogError> {
        self(index, algorithm)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcrValueEntry {
    pub pcr_index: u32,
    pub pcr_value: String,
}

/// PCR values of a single bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcrValues {
    pub hash_alg: String,
    pub pcr_values: Vec<PcrValueEntry>,
}

impl PcrValues {
    pub fn new(algorithm: AlgorithmId) -> Self {
        Self {
            hash_alg: algorithm.to_string(),
            pcr_values: vec![],
        }
    }

    /// Adds or replaces the value of one PCR
    pub fn set_pcr_value(&mut self, index: u32, value: &Digest) {
        match self.pcr_values.iter_mut().find(|e| e.pcr_index == index) {
            Some(entry) => entry.pcr_value = value.to_hex(),
            None => self.pcr_values.push(PcrValueEntry { pcr_index: index, pcr_value: value.to_hex() }),
        }
    }

    /// Get the PCR value for a specific index
    ///
    /// # Returns
    ///
    /// * `Option<&str>` - PCR value as a hex string, or `None` if not found
    pub fn get_pcr_value(&self, index: u32) -> Option<&str> {
        self.pcr_values.iter()
            .find(|entry| entry.pcr_index == index)
            .map(|entry| entry.pcr_value.as_str())
    }

    pub fn get_pcr_indices(&self) -> Vec<u32> {
        self.pcr_values.iter()
            .map(|entry| entry.pcr_index)
            .collect()
    }

    /// The bank's hash algorithm
    ///
    /// # Errors
    ///
    /// * `TcgLogError::UnsupportedAlgorithm` - If `hash_alg` is not one of sha1, sha256, sha384, sha512
    pub fn algorithm(&self) -> Result<AlgorithmId, TcgLogError> {
        AlgorithmId::from_str(&self.hash_alg)
    }

    /// Decoded value of one PCR
    ///
    /// # Errors
    ///
    /// * `TcgLogError::PcrValueError` - If the PCR is absent or its value is not valid hex
    pub fn get_pcr_digest(&self, index: u32) -> Result<Digest, TcgLogError> {
        let value = self.get_pcr_value(index)
            .ok_or_else(|| TcgLogError::PcrValueError(
                format!("PCR value not found: PCR{} in bank {}", index, self.hash_alg)
            ))?;
        Digest::from_hex(value)
    }
}

/// PCR values of every bank on the platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PcrBanks {
    pub banks: Vec<PcrValues>,
}

impl PcrBanks {
    /// Create a PcrBanks instance from JSON
    ///
    /// Accepts either `{"banks": [<bank>, ...]}` or a single `<bank>` object, where a bank is
    /// `{"hash_alg": "sha256", "pcr_values": [{"pcr_index": 0, "pcr_value": "<hex>"}]}`.
    /// Every bank is checked with [`validate_pcr_values`].
    ///
    /// # Errors
    ///
    /// * `TcgLogError::PcrValueError` - If the JSON is invalid, too large or fails validation
    pub fn from_json(json: &Value) -> Result<Self, TcgLogError> {
        if json.to_string().len() > MAX_PCR_JSON_SIZE {
            return Err(TcgLogError::PcrValueError("PCR values exceed 5MB limit".to_string()));
        }

        let banks: PcrBanks = if json.get("banks").is_some() {
            serde_json::from_value(json.clone())
                .map_err(|e| TcgLogError::PcrValueError(format!("Failed to parse PCR banks: {}", e)))?
        } else {
            let bank: PcrValues = serde_json::from_value(json.clone())
                .map_err(|e| TcgLogError::PcrValueError(format!("Failed to parse PCR values: {}", e)))?;
            PcrBanks { banks: vec![bank] }
        };

        let mut seen_algorithms = HashSet::new();
        for bank in &banks.banks {
            validate_pcr_values(bank)?;
            if !seen_algorithms.insert(bank.algorithm()?) {
                return Err(TcgLogError::PcrValueError(format!("Duplicate PCR bank: {}", bank.hash_alg)));
            }
        }

        Ok(banks)
    }

    pub fn from_json_str(json: &str) -> Result<Self, TcgLogError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| TcgLogError::PcrValueError(format!("Invalid PCR values JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub fn bank(&self, algorithm: AlgorithmId) -> Option<&PcrValues> {
        self.banks.iter().find(|bank| bank.algorithm().map_or(false, |alg| alg == algorithm))
    }

    /// Returns the bank for `algorithm`, creating an empty one if needed
    pub fn bank_mut(&mut self, algorithm: AlgorithmId) -> &mut PcrValues {
        let position = self.banks.iter()
            .position(|bank| bank.algorithm().map_or(false, |alg| alg == algorithm));
        match position {
            Some(position) => &mut self.banks[position],
            None => {
                self.banks.push(PcrValues::new(algorithm));
                let last = self.banks.len() - 1;
                &mut self.banks[last]
            }
        }
    }
}

impl PcrSource for PcrBanks {
    fn pcr_value(&self, index: u32, algorithm: AlgorithmId) -> Result<Digest, TcgLogError> {
        self.bank(algorithm)
            .ok_or_else(|| TcgLogError::PcrValueError(format!("No PCR values supplied for bank {}", algorithm)))?
            .get_pcr_digest(index)
    }
}

fn is_valid_pcr_index(index: u32) -> bool {
    (PCR_INDEX_MIN..=PCR_INDEX_MAX).contains(&index)
}

fn is_valid_hex_string(hex_str: &str) -> bool {
    hex_str.len() % 2 == 0 && hex_str.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates one bank of PCR values for format correctness
///
/// This function performs validity checks only:
/// - Ensures the bank algorithm is supported
/// - Checks for duplicate PCR indices
/// - Validates PCR index range (0-31)
/// - Verifies hexadecimal format and the digest length of the bank algorithm
pub fn validate_pcr_values(bank: &PcrValues) -> Result<(), TcgLogError> {
    let algorithm = bank.algorithm()?;

    let mut seen_indices = HashSet::new();
    for pcr_value in &bank.pcr_values {
        if !seen_indices.insert(pcr_value.pcr_index) {
            return Err(TcgLogError::PcrValueError(format!(
                "Duplicate PCR index found: {}",
                pcr_value.pcr_index
            )));
        }
    }

    for (idx, pcr_value) in bank.pcr_values.iter().enumerate() {
        if !is_valid_pcr_index(pcr_value.pcr_index) {
            return Err(TcgLogError::PcrValueError(format!(
                "Invalid PCR index at position {}: {}. Valid range: {}-{}",
                idx, pcr_value.pcr_index, PCR_INDEX_MIN, PCR_INDEX_MAX
            )));
        }

        if !is_valid_hex_string(&pcr_value.pcr_value) {
            return Err(TcgLogError::PcrValueError(format!(
                "Invalid hex format for PCR value at position {} (index {}): '{}'",
                idx, pcr_value.pcr_index, pcr_value.pcr_value
            )));
        }

        if pcr_value.pcr_value.len() != algorithm.digest_size() as usize * 2 {
            return Err(TcgLogError::PcrValueError(format!(
                "Invalid {} PCR value length at position {} (index {}): {} hex digits",
                algorithm, idx, pcr_value.pcr_index, pcr_value.pcr_value.len()
            )));
        }
    }

    Ok(())
}
