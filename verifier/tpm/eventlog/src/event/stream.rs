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

//! Record decoders
//!
//! One decoder per wire encoding. `LegacyDecoder` reads TCG_PCClientPCREventStruct records and
//! `CryptoAgileDecoder` reads TCG_PCR_EVENT2 records. Both sit behind `RecordDecoder`, and the
//! log handle owns exactly one of them through `EventDecoder`.

use std::io::{Read, Seek};
use log::debug;
use tcg_common::{AlgorithmId, Digest, DigestMap, TcgLogError, SHA1_DIGEST_SIZE};
use crate::event::byte_reader::ByteReader;
use crate::event::model::{AlgorithmSize, Event, EventType, Format, MAX_PCR_INDEX};

/// Reads one record at a time from a positioned byte source
pub trait RecordDecoder {
    /// Decodes the record at the reader's position
    ///
    /// # Returns
    /// * `Ok(None)` - The source ended before any byte of a new record
    /// * `Ok(Some(event))` - A complete record
    ///
    /// # Errors
    /// * `TcgLogError::UnexpectedEof` - A record began but the source ended before it was complete
    /// * `TcgLogError::InvalidPcrIndex` - The record targets a PCR above 31
    /// * Any structural error of the encoding
    fn read_next_event<R: Read + Seek>(
        &mut self,
        reader: &mut ByteReader<R>,
        index: u32,
    ) -> Result<Option<Event>, TcgLogError>;
}

/// Reads the PCR index field, `None` at a clean end of stream
fn read_pcr_index<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Option<u32>, TcgLogError> {
    match reader.read_record_start()? {
        Some(pcr_index) if pcr_index > MAX_PCR_INDEX => Err(TcgLogError::InvalidPcrIndex(pcr_index)),
        other => Ok(other),
    }
}

fn read_event_data<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Vec<u8>, TcgLogError> {
    let event_size = reader.read_u32()?;
    reader.read_bytes(event_size as usize)
}

/// TCG 1.2 records: a single SHA-1 digest per event
#[derive(Debug, Default, Clone)]
pub struct LegacyDecoder;

impl RecordDecoder for LegacyDecoder {
    fn read_next_event<R: Read + Seek>(
        &mut self,
        reader: &mut ByteReader<R>,
        index: u32,
    ) -> Result<Option<Event>, TcgLogError> {
        let pcr_index = match read_pcr_index(reader)? {
            Some(pcr_index) => pcr_index,
            None => return Ok(None),
        };
        let event_type = EventType(reader.read_u32()?);
        let digest = reader.read_bytes(SHA1_DIGEST_SIZE as usize)?;
        let data = read_event_data(reader)?;

        let mut digests = DigestMap::new();
        digests.insert(AlgorithmId::Sha1, Digest::new(digest));

        Ok(Some(Event { index, pcr_index, event_type, digests, data }))
    }
}

/// TCG 2.0 records
///
/// The first record of a crypto-agile log uses the legacy layout. Digest sizes come from
/// the banks declared in the Spec ID Event03 header.
#[derive(Debug, Clone)]
pub struct CryptoAgileDecoder {
    algorithm_sizes: Vec<AlgorithmSize>,
    read_first_event: bool,
}

impl CryptoAgileDecoder {
    pub fn new(algorithm_sizes: Vec<AlgorithmSize>) -> Self {
        Self { algorithm_sizes, read_first_event: false }
    }

    fn digest_size(&self, algorithm_id: u16) -> Option<u16> {
        self.algorithm_sizes.iter()
            .find(|entry| entry.algorithm_id == algorithm_id)
            .map(|entry| entry.digest_size)
    }

    fn read_digests<R: Read + Seek>(&self, reader: &mut ByteReader<R>) -> Result<DigestMap, TcgLogError> {
        let digest_count = reader.read_u32()?;
        let mut seen = Vec::with_capacity(self.algorithm_sizes.len());
        let mut digests = DigestMap::new();

        for _ in 0..digest_count {
            let algorithm_id = reader.read_u16()?;
            let digest_size = self.digest_size(algorithm_id)
                .ok_or(TcgLogError::UnknownLogAlgorithm(algorithm_id))?;
            if seen.contains(&algorithm_id) {
                return Err(TcgLogError::InvalidLog(format!(
                    "Duplicate digest for algorithm '{:04x}'", algorithm_id
                )));
            }
            seen.push(algorithm_id);

            let digest = reader.read_bytes(digest_size as usize)?;
            match AlgorithmId::from_u16(algorithm_id) {
                Some(algorithm) => {
                    digests.insert(algorithm, Digest::new(digest));
                }
                None => debug!("Skipping digest for unrecognized algorithm {:04x}", algorithm_id),
            }
        }

        if let Some(missing) = self.algorithm_sizes.iter().find(|entry| !seen.contains(&entry.algorithm_id)) {
            return Err(TcgLogError::MissingLogAlgorithm(missing.algorithm_id));
        }

        Ok(digests)
    }
}

impl RecordDecoder for CryptoAgileDecoder {
    fn read_next_event<R: Read + Seek>(
        &mut self,
        reader: &mut ByteReader<R>,
        index: u32,
    ) -> Result<Option<Event>, TcgLogError> {
        if !self.read_first_event {
            self.read_first_event = true;
            return LegacyDecoder.read_next_event(reader, index);
        }

        let pcr_index = match read_pcr_index(reader)? {
            Some(pcr_index) => pcr_index,
            None => return Ok(None),
        };
        let event_type = EventType(reader.read_u32()?);
        let digests = self.read_digests(reader)?;
        let data = read_event_data(reader)?;

        Ok(Some(Event { index, pcr_index, event_type, digests, data }))
    }
}

/// The decoder selected for a log at open time
#[derive(Debug, Clone)]
pub enum EventDecoder {
    Legacy(LegacyDecoder),
    CryptoAgile(CryptoAgileDecoder),
}

impl EventDecoder {
    pub fn for_format(format: Format, algorithm_sizes: &[AlgorithmSize]) -> Self {
        match format {
            Format::Legacy => EventDecoder::Legacy(LegacyDecoder),
            Format::CryptoAgile => EventDecoder::CryptoAgile(CryptoAgileDecoder::new(algorithm_sizes.to_vec())),
        }
    }
}

impl RecordDecoder for EventDecoder {
    fn read_next_event<R: Read + Seek>(
        &mut self,
        reader: &mut ByteReader<R>,
        index: u32,
    ) -> Result<Option<Event>, TcgLogError> {
        match self {
            EventDecoder::Legacy(decoder) => decoder.read_next_event(reader, index),
            EventDecoder::CryptoAgile(decoder) => decoder.read_next_event(reader, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_record(pcr: u32, event_type: u32, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&pcr.to_le_bytes());
        out.extend_from_slice(&event_type.to_le_bytes());
        out.extend_from_slice(&[0x11; 20]);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn legacy_decoder_reads_records_until_clean_end() {
        let mut bytes = legacy_record(0, 1, b"abc");
        bytes.extend(legacy_record(7, 4, &[0, 0, 0, 0]));
        let mut reader = ByteReader::from_slice(&bytes);
        let mut decoder = LegacyDecoder;

        let first = decoder.read_next_event(&mut reader, 0).unwrap().unwrap();
        assert_eq!(first.pcr_index, 0);
        assert_eq!(first.event_type, EventType::EV_POST_CODE);
        assert_eq!(first.data, b"abc");
        assert_eq!(first.digests[&AlgorithmId::Sha1].len(), 20);

        let second = decoder.read_next_event(&mut reader, 1).unwrap().unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.event_type, EventType::EV_SEPARATOR);

        assert!(decoder.read_next_event(&mut reader, 2).unwrap().is_none());
    }

    #[test]
    fn pcr_index_is_checked_before_the_rest_of_the_record() {
        let bytes = legacy_record(32, 1, b"abc");
        let mut reader = ByteReader::from_slice(&bytes);
        let result = LegacyDecoder.read_next_event(&mut reader, 0);
        assert!(matches!(result, Err(TcgLogError::InvalidPcrIndex(32))));
        assert_eq!(reader.offset(), 4);
    }

    #[test]
    fn truncated_record_is_unexpected_eof() {
        let bytes = legacy_record(0, 1, b"abcdef");
        let mut reader = ByteReader::from_slice(&bytes[..bytes.len() - 2]);
        let result = LegacyDecoder.read_next_event(&mut reader, 0);
        assert!(matches!(result, Err(TcgLogError::UnexpectedEof)));
    }
}
