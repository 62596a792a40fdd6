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

//! Event Data Parsing Module
//!
//! This module implements parsing for the event payloads the validator has to understand:
//! - EV_NO_ACTION events (Spec ID Event03 header, StartupLocality)
//! - Separator events
//! - UEFI_VARIABLE_DATA carried by the EFI variable events
//! - The measured extent of UEFI_GPT_DATA
//!
//! Every other payload is kept as raw bytes on the event.

use std::io::Cursor;
use tcg_common::TcgLogError;
use crate::event::byte_reader::{ByteReader, ByteParseable};
use crate::event::model::{
    AlgorithmSize, EfiSpecIdEvent, EvNoActionEvent, EvSeparatorEvent, SeparatorKind,
    StartupLocalityEvent, UefiGptData, UefiVariableData,
    NO_ACTION_EVENT_SIGNATURE_SIZE, SPEC_ID_EVENT_SIGNATURE_03, STARTUP_LOCALITY_SIGNATURE,
    SEPARATOR_NORMAL_VALUE, SEPARATOR_ALT_NORMAL_VALUE, UEFI_PARTITION_HEADER_SIZE,
};

/// Offset of SizeOfPartitionEntry inside UEFI_PARTITION_TABLE_HEADER
const PARTITION_ENTRY_SIZE_OFFSET: usize = 84;

// Upper bound on declared banks; the header is read before any bank is trusted
const MAX_SPEC_ID_ALGORITHMS: u32 = 64;

impl ByteParseable for EfiSpecIdEvent {
    /// Parses the body of a Spec ID Event03 header, starting right after the signature
    ///
    /// A missing vendor info block is accepted as empty.
    fn parse_from(parser: &mut ByteReader<Cursor<&[u8]>>) -> Result<Self, TcgLogError> {
        let platform_class = parser.read_u32()?;
        let family_minor = parser.read_u8()?;
        let family_major = parser.read_u8()?;
        let spec_errata = parser.read_u8()?;
        let uintn_size = parser.read_u8()?;

        let algorithm_count = parser.read_u32()?;
        if algorithm_count > MAX_SPEC_ID_ALGORITHMS {
            return Err(TcgLogError::InvalidLog(format!("Invalid algorithm count: {}", algorithm_count)));
        }

        let mut digest_sizes = Vec::with_capacity(algorithm_count as usize);
        for _ in 0..algorithm_count {
            let algorithm_id = parser.read_u16()?;
            let digest_size = parser.read_u16()?;
            digest_sizes.push(AlgorithmSize::new(algorithm_id, digest_size));
        }

        let vendor_info = if parser.is_end() {
            vec![]
        } else {
            let vendor_info_size = parser.read_u8()?;
            parser.read_bytes(vendor_info_size as usize)?
        };

        Ok(EfiSpecIdEvent {
            platform_class,
            family_minor,
            family_major,
            spec_errata,
            uintn_size,
            digest_sizes,
            vendor_info,
        })
    }
}

impl ByteParseable for StartupLocalityEvent {
    fn parse_from(parser: &mut ByteReader<Cursor<&[u8]>>) -> Result<Self, TcgLogError> {
        let locality = parser.read_u8()?;
        Ok(StartupLocalityEvent { locality })
    }
}

impl ByteParseable for EvNoActionEvent {
    /// Parses no action event
    ///
    /// Parses into different no action event types based on signature
    fn parse_from(parser: &mut ByteReader<Cursor<&[u8]>>) -> Result<Self, TcgLogError> {
        if parser.remaining() < NO_ACTION_EVENT_SIGNATURE_SIZE as u64 {
            let unknown_data = parser.read_bytes(parser.remaining() as usize)?;
            return Ok(EvNoActionEvent::Unknown(unknown_data));
        }

        let start = parser.offset();
        let signature = parser.read_bytes(NO_ACTION_EVENT_SIGNATURE_SIZE)?;
        if signature == SPEC_ID_EVENT_SIGNATURE_03 {
            Ok(EvNoActionEvent::SpecIdEvent(EfiSpecIdEvent::parse_from(parser)?))
        } else if signature == STARTUP_LOCALITY_SIGNATURE {
            Ok(EvNoActionEvent::StartupLocality(StartupLocalityEvent::parse_from(parser)?))
        } else {
            parser.set_position(start as u64)?;
            let unknown_data = parser.read_bytes(parser.remaining() as usize)?;
            Ok(EvNoActionEvent::Unknown(unknown_data))
        }
    }
}

impl EvNoActionEvent {
    pub fn decode(data: &[u8]) -> Result<Self, TcgLogError> {
        Self::parse_from(&mut ByteReader::from_slice(data))
    }
}

impl EvSeparatorEvent {
    /// Classifies a separator payload
    ///
    /// Four bytes holding 0x00000000 or 0xFFFFFFFF is a normal separator. Any other
    /// non-empty payload carries firmware error information.
    ///
    /// # Errors
    ///
    /// * `TcgLogError::InvalidLog` - If the payload is empty
    pub fn decode(data: &[u8]) -> Result<Self, TcgLogError> {
        if data.is_empty() {
            return Err(TcgLogError::InvalidLog("Empty separator event data".to_string()));
        }

        let kind = match <[u8; 4]>::try_from(data) {
            Ok(raw) => match u32::from_le_bytes(raw) {
                SEPARATOR_NORMAL_VALUE | SEPARATOR_ALT_NORMAL_VALUE => SeparatorKind::Normal,
                _ => SeparatorKind::Error,
            },
            Err(_) => SeparatorKind::Error,
        };
        Ok(EvSeparatorEvent { kind })
    }
}

impl ByteParseable for UefiVariableData {
    fn parse_from(parser: &mut ByteReader<Cursor<&[u8]>>) -> Result<Self, TcgLogError> {
        let variable_name = parser.read_guid()?;
        let unicode_name_length = parser.read_u64()?;
        let variable_data_length = parser.read_u64()?;

        let name_len = usize::try_from(unicode_name_length)
            .map_err(|_| TcgLogError::InvalidLog(format!("Invalid variable name length: {}", unicode_name_length)))?;
        let data_len = usize::try_from(variable_data_length)
            .map_err(|_| TcgLogError::InvalidLog(format!("Invalid variable data length: {}", variable_data_length)))?;

        let unicode_name = parser.read_utf16(name_len)?;
        let variable_data = parser.read_bytes(data_len)?;

        Ok(UefiVariableData {
            variable_name,
            unicode_name,
            variable_data,
        })
    }
}

impl UefiVariableData {
    pub fn decode(data: &[u8]) -> Result<Self, TcgLogError> {
        Self::parse_from(&mut ByteReader::from_slice(data))
    }

    /// Number of UTF-16 code units in the variable name
    pub fn name_length(&self) -> usize {
        self.unicode_name.encode_utf16().count()
    }

    /// Length of the structure as laid out in the event data
    pub fn measured_len(&self) -> usize {
        Self::HEADER_SIZE + self.name_length() * 2 + self.variable_data.len()
    }

    /// Serializes the structure the way firmware measures it
    pub fn encode_measured_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.measured_len());
        out.extend_from_slice(&self.variable_name.to_bytes_le());
        out.extend_from_slice(&(self.name_length() as u64).to_le_bytes());
        out.extend_from_slice(&(self.variable_data.len() as u64).to_le_bytes());
        for unit in self.unicode_name.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&self.variable_data);
        out
    }
}

impl ByteParseable for UefiGptData {
    fn parse_from(parser: &mut ByteReader<Cursor<&[u8]>>) -> Result<Self, TcgLogError> {
        parser.read_bytes(PARTITION_ENTRY_SIZE_OFFSET)?;
        let entry_size = parser.read_u32()?;
        parser.set_position(UEFI_PARTITION_HEADER_SIZE as u64)?;
        let partition_count = parser.read_u64()?;
        Ok(UefiGptData { entry_size, partition_count })
    }
}

impl UefiGptData {
    pub fn decode(data: &[u8]) -> Result<Self, TcgLogError> {
        if data.len() < UEFI_PARTITION_HEADER_SIZE {
            return Err(TcgLogError::InvalidLog("GPT event data shorter than partition table header".to_string()));
        }
        Self::parse_from(&mut ByteReader::from_slice(data))
    }

    /// Number of leading event data bytes covered by the header, count and partition entries
    pub fn measured_len(&self) -> Option<usize> {
        let entries = self.partition_count.checked_mul(self.entry_size as u64)?;
        let total = entries.checked_add((UEFI_PARTITION_HEADER_SIZE + 8) as u64)?;
        usize::try_from(total).ok()
    }
}
