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

#![allow(dead_code)]

use tcg_common::{AlgorithmId, CryptoVerifier, Digest, PcrBanks, TcgLogError};
use tcg_eventlog::{EventType, SPEC_ID_EVENT_SIGNATURE_03, STARTUP_LOCALITY_SIGNATURE};
use uuid::Uuid;

/// Payload of a Spec ID Event03 header declaring `banks` as (algorithm id, digest size)
pub fn spec_id_event_data(banks: &[(u16, u16)]) -> Vec<u8> {
    let mut data = SPEC_ID_EVENT_SIGNATURE_03.to_vec();
    data.extend_from_slice(&0u32.to_le_bytes()); // platform class
    data.extend_from_slice(&[0, 2, 0, 2]); // family minor, major, errata, uintn size
    data.extend_from_slice(&(banks.len() as u32).to_le_bytes());
    for (algorithm_id, digest_size) in banks {
        data.extend_from_slice(&algorithm_id.to_le_bytes());
        data.extend_from_slice(&digest_size.to_le_bytes());
    }
    data.push(0); // vendor info size
    data
}

pub fn startup_locality_data(locality: u8) -> Vec<u8> {
    let mut data = STARTUP_LOCALITY_SIGNATURE.to_vec();
    data.push(locality);
    data
}

/// TCG_PCClientPCREventStruct
pub fn legacy_record(pcr: u32, event_type: EventType, digest: &[u8], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(&event_type.value().to_le_bytes());
    out.extend_from_slice(digest);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

/// TCG_PCR_EVENT2 with raw (algorithm id, digest) entries
pub fn agile_record(pcr: u32, event_type: EventType, digests: &[(u16, Vec<u8>)], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&pcr.to_le_bytes());
    out.extend_from_slice(&event_type.value().to_le_bytes());
    out.extend_from_slice(&(digests.len() as u32).to_le_bytes());
    for (algorithm_id, digest) in digests {
        out.extend_from_slice(&algorithm_id.to_le_bytes());
        out.extend_from_slice(digest);
    }
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

/// UEFI_VARIABLE_DATA
pub fn uefi_variable_data(guid: Uuid, name: &str, value: &[u8]) -> Vec<u8> {
    let units: Vec<u16> = name.encode_utf16().collect();
    let mut out = guid.to_bytes_le().to_vec();
    out.extend_from_slice(&(units.len() as u64).to_le_bytes());
    out.extend_from_slice(&(value.len() as u64).to_le_bytes());
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(value);
    out
}

pub fn hash(algorithm: AlgorithmId, data: &[u8]) -> Digest {
    CryptoVerifier::hash(algorithm, data).unwrap()
}

pub fn extend(algorithm: AlgorithmId, current: &Digest, digest: &Digest) -> Digest {
    CryptoVerifier::extend(algorithm, current.as_bytes(), digest.as_bytes()).unwrap()
}

/// Builds a synthetic event log record by record
pub struct LogBuilder {
    banks: Option<Vec<AlgorithmId>>,
    bytes: Vec<u8>,
}

impl LogBuilder {
    /// A TCG 1.2 log
    pub fn legacy() -> Self {
        Self { banks: None, bytes: vec![] }
    }

    /// A crypto-agile log with a Spec ID Event03 header declaring `banks`
    pub fn crypto_agile(banks: &[AlgorithmId]) -> Self {
        let declared: Vec<(u16, u16)> = banks.iter()
            .map(|alg| (alg.as_u16(), alg.digest_size()))
            .collect();
        let header = legacy_record(0, EventType::EV_NO_ACTION, &[0u8; 20], &spec_id_event_data(&declared));
        Self { banks: Some(banks.to_vec()), bytes: header }
    }

    fn banks(&self) -> Vec<AlgorithmId> {
        self.banks.clone().unwrap_or_else(|| vec![AlgorithmId::Sha1])
    }

    /// Appends an event whose digests are `digest_of(algorithm)` for every bank
    pub fn event_with<F>(mut self, pcr: u32, event_type: EventType, data: &[u8], digest_of: F) -> Self
    where
        F: Fn(AlgorithmId) -> Digest,
    {
        let record = match &self.banks {
            None => legacy_record(pcr, event_type, digest_of(AlgorithmId::Sha1).as_bytes(), data),
            Some(banks) => {
                let digests: Vec<(u16, Vec<u8>)> = banks.iter()
                    .map(|alg| (alg.as_u16(), digest_of(*alg).into_bytes()))
                    .collect();
                agile_record(pcr, event_type, &digests, data)
            }
        };
        self.bytes.extend(record);
        self
    }

    /// Appends an event whose digests are the hash of `measured`
    pub fn event_measuring(self, pcr: u32, event_type: EventType, data: &[u8], measured: &[u8]) -> Self {
        self.event_with(pcr, event_type, data, |alg| hash(alg, measured))
    }

    /// Appends an event whose digests are the hash of its own data
    pub fn event(self, pcr: u32, event_type: EventType, data: &[u8]) -> Self {
        self.event_measuring(pcr, event_type, data, data)
    }

    /// Appends an event with all-zero digests
    pub fn no_action(self, pcr: u32, data: &[u8]) -> Self {
        self.event_with(pcr, EventType::EV_NO_ACTION, data, Digest::zero)
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// Banks every appended event records a digest for
    pub fn algorithms(&self) -> Vec<AlgorithmId> {
        self.banks()
    }
}

/// A live PCR source that never has a value
pub fn no_pcr_values(index: u32, algorithm: AlgorithmId) -> Result<Digest, TcgLogError> {
    Err(TcgLogError::PcrValueError(format!("No value for PCR{} in bank {}", index, algorithm)))
}

/// Live PCR values given as (PCR index, bank, value)
pub fn pcr_banks(values: &[(u32, AlgorithmId, Digest)]) -> PcrBanks {
    let mut banks = PcrBanks::default();
    for (index, algorithm, value) in values {
        banks.bank_mut(*algorithm).set_pcr_value(*index, value);
    }
    banks
}
