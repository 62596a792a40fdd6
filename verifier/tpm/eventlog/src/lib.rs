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

mod event;
mod validate;

pub use event::byte_reader::{ByteReader, ByteParseable, UEFI_GUID_SIZE};
pub use event::model::{
    EventType, Event, Format, AlgorithmSize,
    EfiSpecIdEvent, StartupLocalityEvent, EvNoActionEvent,
    EvSeparatorEvent, SeparatorKind, UefiVariableData, UefiGptData,
    MAX_PCR_INDEX, NO_ACTION_EVENT_SIGNATURE_SIZE, SPEC_ID_EVENT_MIN_SIZE, SPEC_ID_EVENT_ALGORITHMS_OFFSET,
    SPEC_ID_EVENT_SIGNATURE_03, STARTUP_LOCALITY_SIGNATURE,
    SEPARATOR_NORMAL_VALUE, SEPARATOR_ALT_NORMAL_VALUE, SEPARATOR_ERROR_VALUE,
    UEFI_PARTITION_HEADER_SIZE,
};
pub use event::stream::{RecordDecoder, LegacyDecoder, CryptoAgileDecoder, EventDecoder};
pub use event::log::{EventLog, parse_spec_id_event};
pub use validate::conformance::{ConformanceError, conformance_errors, check_event};
pub use validate::measured::is_measured_from_data;
pub use validate::replay::{PcrReplay, LogConsistencyError};
pub use validate::{
    validate_log, LogValidator, LogValidateOptions, LogValidateResult, PartialValidation,
    ExcessMeasuredData, UnmeasuredByteEvent, UnexpectedDigestValue, EventViolation,
    DEFAULT_PCR_SELECTION,
};
