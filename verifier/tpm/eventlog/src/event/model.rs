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

//! Event Type Definitions
//!
//! This module defines the event types, records and payload structures of TCG event logs.
//! Includes the event type codes, the decoded event record, the log format and the structures
//! carried by the event payloads the validator needs to understand.

use std::fmt;
use tcg_common::{AlgorithmId, DigestMap};
use uuid::Uuid;

/// Highest PCR index an event may target
pub const MAX_PCR_INDEX: u32 = 31;

pub const NO_ACTION_EVENT_SIGNATURE_SIZE: usize = 16;

/// Minimum size of a TCG_EfiSpecIDEvent payload with an empty algorithm list
pub const SPEC_ID_EVENT_MIN_SIZE: usize = 29;

/// Offset of `numberOfAlgorithms` inside TCG_EfiSpecIDEvent
pub const SPEC_ID_EVENT_ALGORITHMS_OFFSET: usize = 24;

/// Spec id event signature 03
pub const SPEC_ID_EVENT_SIGNATURE_03: &[u8] = &[
    0x53, 0x70, 0x65, 0x63, 0x20,  // "Spec "
    0x49, 0x44, 0x20,              // "ID "
    0x45, 0x76, 0x65, 0x6E, 0x74,  // "Event"
    0x30, 0x33,                    // "03"
    0x00                           // Null terminator
];

/// Byte representation of startup locality identifier
pub const STARTUP_LOCALITY_SIGNATURE: &[u8] = &[
    0x53, 0x74, 0x61, 0x72, 0x74, 0x75, 0x70,           // "Startup"
    0x4C, 0x6F, 0x63, 0x61, 0x6C, 0x69, 0x74, 0x79,     // "Locality"
    0x00                                                // Null terminator
];

/// EV_NO_ACTION event data, identified by its leading signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvNoActionEvent {
    SpecIdEvent(EfiSpecIdEvent),
    StartupLocality(StartupLocalityEvent),
    Unknown(Vec<u8>),
}

/// Separator payload values
pub const SEPARATOR_NORMAL_VALUE: u32 = 0x00000000;
pub const SEPARATOR_ALT_NORMAL_VALUE: u32 = 0xFFFFFFFF;
pub const SEPARATOR_ERROR_VALUE: u32 = 0x00000001;

/// TCG event type code
///
/// Kept as the raw on-disk value so that codes defined after this crate was written still
/// round-trip and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventType(pub u32);

impl EventType {
    pub const EV_PREBOOT_CERT: EventType = EventType(0x00000000);
    pub const EV_POST_CODE: EventType = EventType(0x00000001);
    pub const EV_UNUSED: EventType = EventType(0x00000002);
    pub const EV_NO_ACTION: EventType = EventType(0x00000003);
    pub const EV_SEPARATOR: EventType = EventType(0x00000004);
    pub const EV_ACTION: EventType = EventType(0x00000005);
    pub const EV_EVENT_TAG: EventType = EventType(0x00000006);
    pub const EV_S_CRTM_CONTENTS: EventType = EventType(0x00000007);
    pub const EV_S_CRTM_VERSION: EventType = EventType(0x00000008);
    pub const EV_CPU_MICROCODE: EventType = EventType(0x00000009);
    pub const EV_PLATFORM_CONFIG_FLAGS: EventType = EventType(0x0000000A);
    pub const EV_TABLE_OF_DEVICES: EventType = EventType(0x0000000B);
    pub const EV_COMPACT_HASH: EventType = EventType(0x0000000C);
    pub const EV_IPL: EventType = EventType(0x0000000D);
    pub const EV_IPL_PARTITION_DATA: EventType = EventType(0x0000000E);
    pub const EV_NONHOST_CODE: EventType = EventType(0x0000000F);
    pub const EV_NONHOST_CONFIG: EventType = EventType(0x00000010);
    pub const EV_NONHOST_INFO: EventType = EventType(0x00000011);
    pub const EV_OMIT_BOOT_DEVICE_EVENTS: EventType = EventType(0x00000012);
    pub const EV_POST_CODE2: EventType = EventType(0x00000013);

    // EFI specific event types
    pub const EV_EFI_EVENT_BASE: EventType = EventType(0x80000000);
    pub const EV_EFI_VARIABLE_DRIVER_CONFIG: EventType = EventType(0x80000001);
    pub const EV_EFI_VARIABLE_BOOT: EventType = EventType(0x80000002);
    pub const EV_EFI_BOOT_SERVICES_APPLICATION: EventType = EventType(0x80000003);
    pub const EV_EFI_BOOT_SERVICES_DRIVER: EventType = EventType(0x80000004);
    pub const EV_EFI_RUNTIME_SERVICES_DRIVER: EventType = EventType(0x80000005);
    pub const EV_EFI_GPT_EVENT: EventType = EventType(0x80000006);
    pub const EV_EFI_ACTION: EventType = EventType(0x80000007);
    pub const EV_EFI_PLATFORM_FIRMWARE_BLOB: EventType = EventType(0x80000008);
    pub const EV_EFI_HANDOFF_TABLES: EventType = EventType(0x80000009);
    pub const EV_EFI_PLATFORM_FIRMWARE_BLOB2: EventType = EventType(0x8000000A);
    pub const EV_EFI_HANDOFF_TABLES2: EventType = EventType(0x8000000B);
    pub const EV_EFI_VARIABLE_BOOT2: EventType = EventType(0x8000000C);
    pub const EV_EFI_GPT_EVENT2: EventType = EventType(0x8000000D);
    pub const EV_EFI_HCRTM_EVENT: EventType = EventType(0x80000010);

    pub const EV_EFI_VARIABLE_AUTHORITY: EventType = EventType(0x800000E0);
    pub const EV_EFI_SPDM_FIRMWARE_BLOB: EventType = EventType(0x800000E1);
    pub const EV_EFI_SPDM_FIRMWARE_CONFIG: EventType = EventType(0x800000E2);
    pub const EV_EFI_SPDM_DEVICE_POLICY: EventType = EventType(0x800000E3);
    pub const EV_EFI_SPDM_DEVICE_AUTHORITY: EventType = EventType(0x800000E4);

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Label of a defined event type, `None` for codes this crate does not know
    pub fn label(&self) -> Option<&'static str> {
        let label = match *self {
            Self::EV_PREBOOT_CERT => "EV_PREBOOT_CERT",
            Self::EV_POST_CODE => "EV_POST_CODE",
            Self::EV_UNUSED => "EV_UNUSED",
            Self::EV_NO_ACTION => "EV_NO_ACTION",
            Self::EV_SEPARATOR => "EV_SEPARATOR",
            Self::EV_ACTION => "EV_ACTION",
            Self::EV_EVENT_TAG => "EV_EVENT_TAG",
            Self::EV_S_CRTM_CONTENTS => "EV_S_CRTM_CONTENTS",
            Self::EV_S_CRTM_VERSION => "EV_S_CRTM_VERSION",
            Self::EV_CPU_MICROCODE => "EV_CPU_MICROCODE",
            Self::EV_PLATFORM_CONFIG_FLAGS => "EV_PLATFORM_CONFIG_FLAGS",
            Self::EV_TABLE_OF_DEVICES => "EV_TABLE_OF_DEVICES",
            Self::EV_COMPACT_HASH => "EV_COMPACT_HASH",
            Self::EV_IPL => "EV_IPL",
            Self::EV_IPL_PARTITION_DATA => "EV_IPL_PARTITION_DATA",
            Self::EV_NONHOST_CODE => "EV_NONHOST_CODE",
            Self::EV_NONHOST_CONFIG => "EV_NONHOST_CONFIG",
            Self::EV_NONHOST_INFO => "EV_NONHOST_INFO",
            Self::EV_OMIT_BOOT_DEVICE_EVENTS => "EV_OMIT_BOOT_DEVICE_EVENTS",
            Self::EV_POST_CODE2 => "EV_POST_CODE2",
            Self::EV_EFI_EVENT_BASE => "EV_EFI_EVENT_BASE",
            Self::EV_EFI_VARIABLE_DRIVER_CONFIG => "EV_EFI_VARIABLE_DRIVER_CONFIG",
            Self::EV_EFI_VARIABLE_BOOT => "EV_EFI_VARIABLE_BOOT",
            Self::EV_EFI_BOOT_SERVICES_APPLICATION => "EV_EFI_BOOT_SERVICES_APPLICATION",
            Self::EV_EFI_BOOT_SERVICES_DRIVER => "EV_EFI_BOOT_SERVICES_DRIVER",
            Self::EV_EFI_RUNTIME_SERVICES_DRIVER => "EV_EFI_RUNTIME_SERVICES_DRIVER",
            Self::EV_EFI_GPT_EVENT => "EV_EFI_GPT_EVENT",
            Self::EV_EFI_ACTION => "EV_EFI_ACTION",
            Self::EV_EFI_PLATFORM_FIRMWARE_BLOB => "EV_EFI_PLATFORM_FIRMWARE_BLOB",
            Self::EV_EFI_HANDOFF_TABLES => "EV_EFI_HANDOFF_TABLES",
            Self::EV_EFI_PLATFORM_FIRMWARE_BLOB2 => "EV_EFI_PLATFORM_FIRMWARE_BLOB2",
            Self::EV_EFI_HANDOFF_TABLES2 => "EV_EFI_HANDOFF_TABLES2",
            Self::EV_EFI_VARIABLE_BOOT2 => "EV_EFI_VARIABLE_BOOT2",
            Self::EV_EFI_GPT_EVENT2 => "EV_EFI_GPT_EVENT2",
            Self::EV_EFI_HCRTM_EVENT => "EV_EFI_HCRTM_EVENT",
            Self::EV_EFI_VARIABLE_AUTHORITY => "EV_EFI_VARIABLE_AUTHORITY",
            Self::EV_EFI_SPDM_FIRMWARE_BLOB => "EV_EFI_SPDM_FIRMWARE_BLOB",
            Self::EV_EFI_SPDM_FIRMWARE_CONFIG => "EV_EFI_SPDM_FIRMWARE_CONFIG",
            Self::EV_EFI_SPDM_DEVICE_POLICY => "EV_EFI_SPDM_DEVICE_POLICY",
            Self::EV_EFI_SPDM_DEVICE_AUTHORITY => "EV_EFI_SPDM_DEVICE_AUTHORITY",
            _ => return None,
        };
        Some(label)
    }

    /// EFI variable events, whose payload is a UEFI_VARIABLE_DATA structure
    pub fn is_efi_variable(&self) -> bool {
        matches!(
            *self,
            Self::EV_EFI_VARIABLE_DRIVER_CONFIG
                | Self::EV_EFI_VARIABLE_BOOT
                | Self::EV_EFI_VARIABLE_BOOT2
                | Self::EV_EFI_VARIABLE_AUTHORITY
        )
    }
}

impl From<u32> for EventType {
    fn from(value: u32) -> Self {
        EventType(value)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}", label),
            None => write!(f, "{:08x}", self.0),
        }
    }
}

/// Wire encoding of a log, fixed once the log is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// TCG_PCClientPCREventStruct records, SHA-1 only
    Legacy,
    /// TCG_PCR_EVENT2 records, one digest per declared bank
    CryptoAgile,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Legacy => write!(f, "TCG 1.2"),
            Format::CryptoAgile => write!(f, "TCG 2.0 (crypto-agile)"),
        }
    }
}

/// One measured record of the log
///
/// `index` is the zero-based position of the record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub index: u32,
    pub pcr_index: u32,
    pub event_type: EventType,
    pub digests: DigestMap,
    pub data: Vec<u8>,
}

impl Event {
    pub fn digest(&self, algorithm: AlgorithmId) -> Option<&tcg_common::Digest> {
        self.digests.get(&algorithm)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event {} in PCR {} (type: {})", self.index, self.pcr_index, self.event_type)
    }
}

/// TCG_EfiSpecIdEventAlgorithmSize
///
/// `algorithm_id` stays raw because a header may declare banks this crate cannot hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmSize {
    pub algorithm_id: u16,
    pub digest_size: u16,
}

impl AlgorithmSize {
    pub fn new(algorithm_id: u16, digest_size: u16) -> Self {
        Self { algorithm_id, digest_size }
    }

    pub fn algorithm(&self) -> Option<AlgorithmId> {
        AlgorithmId::from_u16(self.algorithm_id)
    }
}

/// Specification ID Event Data ("Spec ID Event03")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EfiSpecIdEvent {
    pub platform_class: u32,
    pub family_minor: u8,
    pub family_major: u8,
    pub spec_errata: u8,
    pub uintn_size: u8,
    pub digest_sizes: Vec<AlgorithmSize>,
    pub vendor_info: Vec<u8>,
}

/// Startup Locality Event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupLocalityEvent {
    pub locality: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorKind {
    /// Payload is 0x00000000 or 0xFFFFFFFF and was measured as is
    Normal,
    /// Firmware error, measured as the 4-byte value 0x00000001
    Error,
}

/// Separator Event Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvSeparatorEvent {
    pub kind: SeparatorKind,
}

/// UEFI_VARIABLE_DATA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UefiVariableData {
    pub variable_name: Uuid,
    pub unicode_name: String,
    pub variable_data: Vec<u8>,
}

impl UefiVariableData {
    /// Size of the GUID and the two length fields
    pub const HEADER_SIZE: usize = 32;
}

/// Size of UEFI_PARTITION_TABLE_HEADER as measured
pub const UEFI_PARTITION_HEADER_SIZE: usize = 92;

/// Measured extent of UEFI_GPT_DATA
///
/// The event data is the partition table header, a 64-bit partition count and then
/// `partition_count` entries of `entry_size` bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UefiGptData {
    pub entry_size: u32,
    pub partition_count: u64,
}
