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

use tcg_common::{AlgorithmId, Digest, DigestMap};
use tcg_eventlog::{check_event, conformance_errors, ConformanceError, Event, EventType, Format};

mod utils;
use utils::hash;

fn event_measuring(pcr_index: u32, event_type: EventType, data: &[u8], measured: &[u8]) -> Event {
    let mut digests = DigestMap::new();
    for algorithm in [AlgorithmId::Sha1, AlgorithmId::Sha256] {
        digests.insert(algorithm, hash(algorithm, measured));
    }
    Event { index: 3, pcr_index, event_type, digests, data: data.to_vec() }
}

fn event(pcr_index: u32, event_type: EventType, data: &[u8]) -> Event {
    event_measuring(pcr_index, event_type, data, data)
}

fn no_action(pcr_index: u32) -> Event {
    let mut digests = DigestMap::new();
    digests.insert(AlgorithmId::Sha1, Digest::zero(AlgorithmId::Sha1));
    digests.insert(AlgorithmId::Sha256, Digest::zero(AlgorithmId::Sha256));
    Event { index: 0, pcr_index, event_type: EventType::EV_NO_ACTION, digests, data: b"vendor".to_vec() }
}

#[test]
fn test_post_code_pcr() {
    // Test Objective: Verify EV_POST_CODE is only accepted in PCR 0
    // Expected Result: PCR 0 conforms, PCR 1 is an unexpected event type
    assert!(check_event(&event(0, EventType::EV_POST_CODE, b"code"), Format::Legacy).is_ok());
    assert_eq!(
        check_event(&event(1, EventType::EV_POST_CODE, b"code"), Format::Legacy),
        Err(ConformanceError::UnexpectedEventType { event_type: EventType::EV_POST_CODE, pcr_index: 1 })
    );
}

#[test]
fn test_no_action_rules() {
    // Test Objective: Verify EV_NO_ACTION PCR placement and zero digest rules
    // Expected Result: PCR 0 and 6 conform, PCR 3 and non-zero digests are reported
    assert!(check_event(&no_action(0), Format::CryptoAgile).is_ok());
    assert!(check_event(&no_action(6), Format::CryptoAgile).is_ok());
    assert!(matches!(
        check_event(&no_action(3), Format::CryptoAgile),
        Err(ConformanceError::UnexpectedEventType { pcr_index: 3, .. })
    ));

    let nonzero = event(0, EventType::EV_NO_ACTION, b"vendor");
    let errors = conformance_errors(&nonzero, Format::CryptoAgile);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, ConformanceError::UnexpectedDigestValue { .. })));
    match &errors[0] {
        ConformanceError::UnexpectedDigestValue { algorithm, expected, digest, .. } => {
            assert_eq!(*algorithm, AlgorithmId::Sha1);
            assert!(expected.is_zero());
            assert_eq!(*digest, hash(AlgorithmId::Sha1, b"vendor"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_separator_normal_values() {
    // Test Objective: Verify normal separators measure their own payload
    // Expected Result: 0x00000000 and 0xFFFFFFFF payloads conform in PCRs 0-7
    for pcr in 0..=7 {
        assert!(check_event(&event(pcr, EventType::EV_SEPARATOR, &[0, 0, 0, 0]), Format::Legacy).is_ok());
    }
    assert!(check_event(&event(7, EventType::EV_SEPARATOR, &[0xff; 4]), Format::CryptoAgile).is_ok());
}

#[test]
fn test_separator_error_value() {
    // Test Objective: Verify error separators are measured as the value 1
    // Expected Result: Error payload measured as 01000000 conforms, measured as itself does not
    let measured_one = event_measuring(4, EventType::EV_SEPARATOR, b"firmware error", &1u32.to_le_bytes());
    assert!(check_event(&measured_one, Format::CryptoAgile).is_ok());

    let measured_payload = event(4, EventType::EV_SEPARATOR, b"firmware error");
    let errors = conformance_errors(&measured_payload, Format::CryptoAgile);
    assert_eq!(errors.len(), 2);
    match &errors[1] {
        ConformanceError::UnexpectedDigestValue { algorithm, expected, .. } => {
            assert_eq!(*algorithm, AlgorithmId::Sha256);
            assert_eq!(*expected, hash(AlgorithmId::Sha256, &[1, 0, 0, 0]));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_separator_placement_and_data() {
    // Test Objective: Verify separators outside PCR 0-7 and empty separator payloads are reported
    // Expected Result: UnexpectedEventType for PCR 8, InvalidEventData for an empty payload
    assert!(matches!(
        check_event(&event(8, EventType::EV_SEPARATOR, &[0, 0, 0, 0]), Format::Legacy),
        Err(ConformanceError::UnexpectedEventType { pcr_index: 8, .. })
    ));
    assert_eq!(
        check_event(&event(0, EventType::EV_SEPARATOR, &[]), Format::Legacy),
        Err(ConformanceError::InvalidEventData { event_type: EventType::EV_SEPARATOR })
    );
}

#[test]
fn test_event_tag_depends_on_format() {
    // Test Objective: Verify EV_EVENT_TAG placement rules for both formats
    // Expected Result: PCR 0-4 allowed for legacy logs, only PCR 4 for crypto-agile logs, never above 4
    for pcr in 0..=4 {
        assert!(check_event(&event(pcr, EventType::EV_EVENT_TAG, b"tag"), Format::Legacy).is_ok());
    }
    assert!(check_event(&event(4, EventType::EV_EVENT_TAG, b"tag"), Format::CryptoAgile).is_ok());
    assert!(check_event(&event(2, EventType::EV_EVENT_TAG, b"tag"), Format::CryptoAgile).is_err());
    assert!(check_event(&event(5, EventType::EV_EVENT_TAG, b"tag"), Format::Legacy).is_err());
    assert!(check_event(&event(5, EventType::EV_EVENT_TAG, b"tag"), Format::CryptoAgile).is_err());
}

#[test]
fn test_other_event_types_always_conform() {
    // Test Objective: Verify event types without rules are not checked
    // Expected Result: No errors regardless of PCR or digest
    let e = event_measuring(17, EventType::EV_EFI_BOOT_SERVICES_APPLICATION, b"image", b"something else");
    assert!(conformance_errors(&e, Format::CryptoAgile).is_empty());
    let unknown = event(9, EventType(0x1234), b"?");
    assert!(check_event(&unknown, Format::Legacy).is_ok());
}

#[test]
fn test_error_messages() {
    // Test Objective: Verify conformance error display strings
    // Expected Result: Messages name the event type and PCR
    let error = ConformanceError::UnexpectedEventType { event_type: EventType::EV_POST_CODE, pcr_index: 2 };
    assert_eq!(error.to_string(), "Unexpected EV_POST_CODE event type measured to PCR index 2");
    let error = ConformanceError::InvalidEventData { event_type: EventType::EV_SEPARATOR };
    assert_eq!(error.to_string(), "Invalid data for event type EV_SEPARATOR");
}
