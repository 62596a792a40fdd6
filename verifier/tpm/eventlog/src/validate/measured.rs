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

//! Measured data analysis
//!
//! For event types whose digest is a plain hash of (part of) the event data, the recorded
//! digests are recomputed and any difference is explained by a known firmware quirk where
//! possible:
//! - EV_EFI_VARIABLE_BOOT measuring the whole UEFI_VARIABLE_DATA structure
//! - trailing padding that was hashed along with the payload
//! - EV_EFI_VARIABLE_AUTHORITY leaving the final byte of its data unmeasured
//!
//! Digests that no computation explains are reported as unexpected.

use log::warn;
use tcg_common::{AlgorithmId, CryptoVerifier, Digest, TcgLogError};
use crate::event::model::{Event, EventType, UefiGptData, UefiVariableData};

/// What the event data means for digest recomputation
#[derive(Debug, Clone)]
pub(crate) struct MeasuredLayout {
    /// Bytes the PC Client firmware profile defines as hashed
    nominal: Vec<u8>,
    /// Length of the semantically meaningful prefix of the event data
    meaningful_len: usize,
    /// The decoded variable, for EFI variable events
    variable: Option<UefiVariableData>,
}

/// A departure from nominal measurement found in one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MeasuredFinding {
    /// EV_EFI_VARIABLE_BOOT digest covers the whole structure
    VariableBootFullStructure,
    /// Bytes after the meaningful prefix were hashed as well
    ExcessMeasuredData(Vec<u8>),
    /// The final byte of an EV_EFI_VARIABLE_AUTHORITY event was not hashed
    UnmeasuredByte { byte: u8, variable: UefiVariableData },
    /// No known computation yields the recorded digest
    UnexpectedDigest { algorithm: AlgorithmId, expected: Digest },
}

/// Event types checked by recomputing their digest from the event data
pub fn is_measured_from_data(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::EV_ACTION
            | EventType::EV_EFI_ACTION
            | EventType::EV_OMIT_BOOT_DEVICE_EVENTS
            | EventType::EV_EFI_VARIABLE_DRIVER_CONFIG
            | EventType::EV_EFI_VARIABLE_BOOT
            | EventType::EV_EFI_VARIABLE_BOOT2
            | EventType::EV_EFI_VARIABLE_AUTHORITY
            | EventType::EV_EFI_GPT_EVENT
            | EventType::EV_EFI_GPT_EVENT2
    )
}

/// Works out the nominally measured bytes of an event
///
/// Returns `Ok(None)` for event types that are not measured from their data.
pub(crate) fn measured_layout(event: &Event) -> Result<Option<MeasuredLayout>, TcgLogError> {
    let data = &event.data;
    let layout = match event.event_type {
        // Action strings: anything after the first NUL is padding
        EventType::EV_ACTION | EventType::EV_EFI_ACTION | EventType::EV_OMIT_BOOT_DEVICE_EVENTS => {
            let meaningful_len = data.iter().position(|b| *b == 0).unwrap_or(data.len());
            MeasuredLayout {
                nominal: data[..meaningful_len].to_vec(),
                meaningful_len,
                variable: None,
            }
        }
        EventType::EV_EFI_VARIABLE_BOOT => {
            let variable = UefiVariableData::decode(data)?;
            MeasuredLayout {
                nominal: variable.variable_data.clone(),
                meaningful_len: variable.measured_len(),
                variable: Some(variable),
            }
        }
        // DRIVER_CONFIG, BOOT2 and AUTHORITY measure the structure itself
        event_type if event_type.is_efi_variable() => {
            let variable = UefiVariableData::decode(data)?;
            let meaningful_len = variable.measured_len();
            MeasuredLayout {
                nominal: data[..meaningful_len].to_vec(),
                meaningful_len,
                variable: Some(variable),
            }
        }
        EventType::EV_EFI_GPT_EVENT | EventType::EV_EFI_GPT_EVENT2 => {
            let gpt = UefiGptData::decode(data)?;
            let meaningful_len = gpt.measured_len()
                .filter(|len| *len <= data.len())
                .ok_or_else(|| TcgLogError::InvalidLog("GPT partition entries exceed event data".to_string()))?;
            MeasuredLayout {
                nominal: data[..meaningful_len].to_vec(),
                meaningful_len,
                variable: None,
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(layout))
}

fn unmeasured_trailing_byte(event_type: EventType, trailing: &[u8]) -> Option<u8> {
    match trailing {
        [byte] if event_type == EventType::EV_EFI_VARIABLE_AUTHORITY => Some(*byte),
        _ => None,
    }
}

/// Recomputes every recognized digest of `event` and explains mismatches
///
/// Excess data and unmeasured byte findings appear at most once per event.
pub(crate) fn analyze_event(event: &Event) -> Result<Vec<MeasuredFinding>, TcgLogError> {
    let layout = match measured_layout(event) {
        Ok(Some(layout)) => layout,
        Ok(None) => return Ok(vec![]),
        Err(e) => {
            warn!("Cannot decode data of {}, digests not checked: {}", event, e);
            return Ok(vec![]);
        }
    };

    let data = &event.data;
    let trailing = &data[layout.meaningful_len..];
    let mut findings = Vec::new();

    for (algorithm, digest) in &event.digests {
        let algorithm = *algorithm;
        let expected = CryptoVerifier::hash(algorithm, &layout.nominal)?;
        let finding = if expected == *digest {
            // One byte past the structure that the digest leaves out
            match (&layout.variable, unmeasured_trailing_byte(event.event_type, trailing)) {
                (Some(variable), Some(byte)) => MeasuredFinding::UnmeasuredByte { byte, variable: variable.clone() },
                _ => continue,
            }
        } else if event.event_type == EventType::EV_EFI_VARIABLE_BOOT
            && CryptoVerifier::digest_matches(algorithm, &data[..layout.meaningful_len], digest)?
        {
            MeasuredFinding::VariableBootFullStructure
        } else if !trailing.is_empty() && CryptoVerifier::digest_matches(algorithm, data, digest)? {
            MeasuredFinding::ExcessMeasuredData(trailing.to_vec())
        } else if let (EventType::EV_EFI_VARIABLE_AUTHORITY, Some(variable), Some((last, measured))) =
            (event.event_type, &layout.variable, data.split_last())
        {
            if CryptoVerifier::digest_matches(algorithm, measured, digest)? {
                MeasuredFinding::UnmeasuredByte { byte: *last, variable: variable.clone() }
            } else {
                MeasuredFinding::UnexpectedDigest { algorithm, expected }
            }
        } else {
            MeasuredFinding::UnexpectedDigest { algorithm, expected }
        };

        let repeated = matches!(finding, MeasuredFinding::ExcessMeasuredData(_) | MeasuredFinding::UnmeasuredByte { .. })
            && findings.iter().any(|f| std::mem::discriminant(f) == std::mem::discriminant(&finding));
        if !repeated {
            findings.push(finding);
        }
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcg_common::DigestMap;

    fn event(event_type: EventType, data: Vec<u8>, measured: &[u8]) -> Event {
        let mut digests = DigestMap::new();
        for algorithm in [AlgorithmId::Sha1, AlgorithmId::Sha256] {
            digests.insert(algorithm, CryptoVerifier::hash(algorithm, measured).unwrap());
        }
        Event { index: 0, pcr_index: 4, event_type, digests, data }
    }

    #[test]
    fn action_string_measured_without_terminator() {
        let e = event(EventType::EV_EFI_ACTION, b"Calling EFI Application\0".to_vec(), b"Calling EFI Application");
        assert!(analyze_event(&e).unwrap().is_empty());
    }

    #[test]
    fn action_string_with_hashed_padding_reported_once() {
        let data = b"Exit Boot Services\0\0".to_vec();
        let e = event(EventType::EV_EFI_ACTION, data.clone(), &data);
        assert_eq!(
            analyze_event(&e).unwrap(),
            vec![MeasuredFinding::ExcessMeasuredData(vec![0, 0])]
        );
    }

    #[test]
    fn unrelated_event_types_are_not_checked() {
        let e = event(EventType::EV_EFI_BOOT_SERVICES_APPLICATION, b"image".to_vec(), b"other");
        assert!(analyze_event(&e).unwrap().is_empty());
    }

    #[test]
    fn authority_byte_after_structure_left_unmeasured() {
        let mut data = vec![0u8; UefiVariableData::HEADER_SIZE];
        data[16] = 1; // one UTF-16 unit of name
        data[24] = 3; // three bytes of value
        data.extend_from_slice(&[b'd', 0, 0xaa, 0xbb, 0xcc]);
        let structure = data.clone();
        data.push(0x5a);

        let e = event(EventType::EV_EFI_VARIABLE_AUTHORITY, data, &structure);
        let findings = analyze_event(&e).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(matches!(findings[0], MeasuredFinding::UnmeasuredByte { byte: 0x5a, .. }));

        // Only authority events report a trailing byte outside the digest
        let mut e = e;
        e.event_type = EventType::EV_EFI_VARIABLE_DRIVER_CONFIG;
        assert!(analyze_event(&e).unwrap().is_empty());
    }

    #[test]
    fn undecodable_variable_is_skipped() {
        let e = event(EventType::EV_EFI_VARIABLE_DRIVER_CONFIG, vec![1, 2, 3], b"x");
        assert!(analyze_event(&e).unwrap().is_empty());
    }
}
