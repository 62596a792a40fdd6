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

//! Per-event conformance rules
//!
//! Each rule looks at one event and the log format only. Event types without a rule always
//! conform.

use thiserror::Error;
use tcg_common::{AlgorithmId, CryptoVerifier, Digest};
use crate::event::model::{
    EvSeparatorEvent, Event, EventType, Format, SeparatorKind, SEPARATOR_ERROR_VALUE,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConformanceError {
    #[error("Unexpected {event_type} event type measured to PCR index {pcr_index}")]
    UnexpectedEventType {
        event_type: EventType,
        pcr_index: u32,
    },

    #[error("Unexpected digest value for event type {event_type} (alg: {algorithm}, expected: {expected}, got: {digest})")]
    UnexpectedDigestValue {
        event_type: EventType,
        algorithm: AlgorithmId,
        digest: Digest,
        expected: Digest,
    },

    #[error("Invalid data for event type {event_type}")]
    InvalidEventData {
        event_type: EventType,
    },

    #[error("Failed to compute digest for event type {event_type}: {message}")]
    DigestComputation {
        event_type: EventType,
        message: String,
    },
}

fn unexpected_event_type(event: &Event) -> ConformanceError {
    ConformanceError::UnexpectedEventType {
        event_type: event.event_type,
        pcr_index: event.pcr_index,
    }
}

/// Bytes a separator's digests must be computed over
fn separator_measured_bytes(event: &Event, separator: &EvSeparatorEvent) -> Vec<u8> {
    match separator.kind {
        SeparatorKind::Normal => event.data.clone(),
        SeparatorKind::Error => SEPARATOR_ERROR_VALUE.to_le_bytes().to_vec(),
    }
}

fn check_separator(event: &Event, errors: &mut Vec<ConformanceError>) {
    let separator = match EvSeparatorEvent::decode(&event.data) {
        Ok(separator) => separator,
        Err(_) => {
            errors.push(ConformanceError::InvalidEventData { event_type: event.event_type });
            return;
        }
    };

    let measured = separator_measured_bytes(event, &separator);
    for (algorithm, digest) in &event.digests {
        match CryptoVerifier::hash(*algorithm, &measured) {
            Ok(expected) if expected == *digest => {}
            Ok(expected) => errors.push(ConformanceError::UnexpectedDigestValue {
                event_type: event.event_type,
                algorithm: *algorithm,
                digest: digest.clone(),
                expected,
            }),
            Err(e) => errors.push(ConformanceError::DigestComputation {
                event_type: event.event_type,
                message: e.to_string(),
            }),
        }
    }
}

/// Every rule violation of one event, in rule order
///
/// Digest findings are reported per bank.
pub fn conformance_errors(event: &Event, format: Format) -> Vec<ConformanceError> {
    let mut errors = Vec::new();

    match event.event_type {
        EventType::EV_POST_CODE => {
            if event.pcr_index != 0 {
                errors.push(unexpected_event_type(event));
            }
        }
        EventType::EV_NO_ACTION => {
            if event.pcr_index != 0 && event.pcr_index != 6 {
                errors.push(unexpected_event_type(event));
            }
            for (algorithm, digest) in &event.digests {
                if !digest.is_zero() {
                    errors.push(ConformanceError::UnexpectedDigestValue {
                        event_type: event.event_type,
                        algorithm: *algorithm,
                        digest: digest.clone(),
                        expected: Digest::zero(*algorithm),
                    });
                }
            }
        }
        EventType::EV_SEPARATOR => {
            if event.pcr_index > 7 {
                errors.push(unexpected_event_type(event));
            }
            check_separator(event, &mut errors);
        }
        EventType::EV_EVENT_TAG => {
            if event.pcr_index > 4 || (event.pcr_index < 4 && format == Format::CryptoAgile) {
                errors.push(unexpected_event_type(event));
            }
        }
        _ => {}
    }

    errors
}

/// Checks one event, returning its first rule violation
pub fn check_event(event: &Event, format: Format) -> Result<(), ConformanceError> {
    match conformance_errors(event, format).into_iter().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
