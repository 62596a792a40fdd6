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

//! Event log validation
//!
//! Validation makes one pass over a log. Every event is checked against the conformance
//! rules, its digests are recomputed where the event data describes what was measured, and
//! it is folded into the PCR replay. When the log has been read to its end, the replayed
//! values of the selected PCRs are compared with the live values.
//!
//! Findings never stop the pass. A decode error does, and the findings collected up to that
//! point are returned with it.

pub mod conformance;
pub mod measured;
pub mod replay;

use std::io::{Read, Seek};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tcg_common::{AlgorithmId, Digest, PcrSource, TcgLogError};
use crate::event::log::EventLog;
use crate::event::model::{Event, Format, UefiVariableData};
use conformance::{conformance_errors, ConformanceError};
use measured::{analyze_event, MeasuredFinding};
use replay::{LogConsistencyError, PcrReplay};

/// PCRs compared when no selection is given
pub const DEFAULT_PCR_SELECTION: [u32; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

fn default_pcr_selection() -> Vec<u32> {
    DEFAULT_PCR_SELECTION.to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogValidateOptions {
    /// PCRs whose live values are compared with the replayed log
    #[serde(default = "default_pcr_selection")]
    pub pcr_selection: Vec<u32>,
}

impl Default for LogValidateOptions {
    fn default() -> Self {
        Self { pcr_selection: default_pcr_selection() }
    }
}

/// Trailing event data that was hashed along with the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcessMeasuredData {
    pub event: Event,
    pub excess_bytes: Vec<u8>,
}

/// EV_EFI_VARIABLE_AUTHORITY event whose last byte was not hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmeasuredByteEvent {
    pub event: Event,
    pub unmeasured_byte: u8,
    pub variable: UefiVariableData,
}

/// A recorded digest that no known computation explains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnexpectedDigestValue {
    pub event: Event,
    pub algorithm: AlgorithmId,
    pub expected: Digest,
}

impl UnexpectedDigestValue {
    /// The digest the log actually records
    pub fn recorded(&self) -> Option<&Digest> {
        self.event.digests.get(&self.algorithm)
    }
}

/// A conformance rule violation other than a digest mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventViolation {
    pub event: Event,
    pub error: ConformanceError,
}

/// Findings of one validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogValidateResult {
    pub format: Format,
    pub algorithms: Vec<AlgorithmId>,
    pub event_count: u32,
    pub efi_variable_boot_quirk: bool,
    pub events_with_excess_measured_data: Vec<ExcessMeasuredData>,
    pub efi_variable_authority_events_with_unmeasured_byte: Vec<UnmeasuredByteEvent>,
    pub unexpected_digest_values: Vec<UnexpectedDigestValue>,
    pub log_consistency_errors: Vec<LogConsistencyError>,
    pub event_violations: Vec<EventViolation>,
}

impl LogValidateResult {
    fn new(format: Format, algorithms: &[AlgorithmId]) -> Self {
        Self {
            format,
            algorithms: algorithms.to_vec(),
            event_count: 0,
            efi_variable_boot_quirk: false,
            events_with_excess_measured_data: vec![],
            efi_variable_authority_events_with_unmeasured_byte: vec![],
            unexpected_digest_values: vec![],
            log_consistency_errors: vec![],
            event_violations: vec![],
        }
    }

    /// True when the pass produced no finding at all
    pub fn is_clean(&self) -> bool {
        !self.efi_variable_boot_quirk
            && self.events_with_excess_measured_data.is_empty()
            && self.efi_variable_authority_events_with_unmeasured_byte.is_empty()
            && self.unexpected_digest_values.is_empty()
            && self.log_consistency_errors.is_empty()
            && self.event_violations.is_empty()
    }
}

/// A validation pass stopped by a fatal error
///
/// `result` holds every finding made before the error.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PartialValidation {
    pub result: LogValidateResult,
    #[source]
    pub error: TcgLogError,
}

/// Per-event validation state
///
/// Feed events in log order with [`LogValidator::process_event`], then call
/// [`LogValidator::finish`] to compare against live PCR values.
pub struct LogValidator {
    result: LogValidateResult,
    replay: PcrReplay,
}

impl LogValidator {
    pub fn new(format: Format, algorithms: &[AlgorithmId]) -> Self {
        Self {
            result: LogValidateResult::new(format, algorithms),
            replay: PcrReplay::new(algorithms),
        }
    }

    /// Findings so far
    pub fn result(&self) -> &LogValidateResult {
        &self.result
    }

    pub fn replay(&self) -> &PcrReplay {
        &self.replay
    }

    /// Checks one event and folds it into the replay
    ///
    /// # Errors
    ///
    /// Only hashing failures are returned; rule violations become findings.
    pub fn process_event(&mut self, event: &Event) -> Result<(), TcgLogError> {
        self.result.event_count += 1;

        for error in conformance_errors(event, self.result.format) {
            match error {
                ConformanceError::UnexpectedDigestValue { algorithm, expected, .. } => {
                    warn!("{}: unexpected {} digest", event, algorithm);
                    self.result.unexpected_digest_values.push(UnexpectedDigestValue {
                        event: event.clone(),
                        algorithm,
                        expected,
                    });
                }
                error => {
                    warn!("{}: {}", event, error);
                    self.result.event_violations.push(EventViolation { event: event.clone(), error });
                }
            }
        }

        for finding in analyze_event(event)? {
            self.record_finding(event, finding);
        }

        self.replay.extend_event(event)
    }

    fn record_finding(&mut self, event: &Event, finding: MeasuredFinding) {
        match finding {
            MeasuredFinding::VariableBootFullStructure => {
                if !self.result.efi_variable_boot_quirk {
                    warn!("{} measures the entire UEFI_VARIABLE_DATA structure", event);
                }
                self.result.efi_variable_boot_quirk = true;
            }
            MeasuredFinding::ExcessMeasuredData(excess_bytes) => {
                warn!("{} has {} bytes of measured padding", event, excess_bytes.len());
                self.result.events_with_excess_measured_data.push(ExcessMeasuredData {
                    event: event.clone(),
                    excess_bytes,
                });
            }
            MeasuredFinding::UnmeasuredByte { byte, variable } => {
                warn!("{} has an unmeasured trailing byte 0x{:02x}", event, byte);
                self.result.efi_variable_authority_events_with_unmeasured_byte.push(UnmeasuredByteEvent {
                    event: event.clone(),
                    unmeasured_byte: byte,
                    variable,
                });
            }
            MeasuredFinding::UnexpectedDigest { algorithm, expected } => {
                warn!("{}: unexpected {} digest", event, algorithm);
                self.result.unexpected_digest_values.push(UnexpectedDigestValue {
                    event: event.clone(),
                    algorithm,
                    expected,
                });
            }
        }
    }

    /// Compares the replayed values of the selected PCRs with the live values
    pub fn finish(mut self, pcrs: &[u32], source: &dyn PcrSource) -> Result<LogValidateResult, PartialValidation> {
        match self.replay.compare(pcrs, source) {
            Ok(errors) => {
                self.result.log_consistency_errors = errors;
                Ok(self.result)
            }
            Err(error) => Err(PartialValidation { result: self.result, error }),
        }
    }

    /// Gives up on the pass, keeping what was found so far
    pub fn abort(self, error: TcgLogError) -> PartialValidation {
        PartialValidation { result: self.result, error }
    }
}

/// Validates every remaining event of `log`
///
/// # Errors
///
/// Returns a `PartialValidation` when the log cannot be decoded to its end or a live PCR
/// value cannot be obtained. Consistency is not compared when decoding failed.
pub fn validate_log<R: Read + Seek>(
    log: &mut EventLog<R>,
    source: &dyn PcrSource,
    options: &LogValidateOptions,
) -> Result<LogValidateResult, PartialValidation> {
    let mut validator = LogValidator::new(log.format(), log.algorithms());

    loop {
        let event = match log.next_event() {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(error) => return Err(validator.abort(error)),
        };
        if let Err(error) = validator.process_event(&event) {
            return Err(validator.abort(error));
        }
    }

    debug!(
        "Validated {} events, startup locality {}",
        validator.result().event_count,
        validator.replay().locality()
    );
    validator.finish(&options.pcr_selection, source)
}
