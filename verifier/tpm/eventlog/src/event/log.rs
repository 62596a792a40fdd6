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

//! Event Log Handle
//!
//! `EventLog` is an opened, positioned TCG event log. Opening it detects the wire encoding
//! from the first record and, for crypto-agile logs, reads the algorithm banks declared in
//! the Spec ID Event03 header. Events are then pulled one at a time in on-disk order.
//!
//! A log can be opened from any `Read + Seek` source, from bytes, from a base64 string or
//! from a file:
//!
//! ```no_run
//! use tcg_eventlog::EventLog;
//!
//! let mut log = EventLog::from_file("/sys/kernel/security/tpm0/binary_bios_measurements").unwrap();
//! println!("{} log with banks {:?}", log.format(), log.algorithms());
//! while let Some(event) = log.next_event().unwrap() {
//!     println!("{}", event);
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::{debug, info, warn};
use tcg_common::{known_digest_size, AlgorithmId, TcgLogError};
use crate::event::byte_reader::ByteReader;
use crate::event::model::{
    AlgorithmSize, EfiSpecIdEvent, EvNoActionEvent, Event, EventType, Format,
    SPEC_ID_EVENT_MIN_SIZE, SPEC_ID_EVENT_SIGNATURE_03,
};
use crate::event::stream::{EventDecoder, LegacyDecoder, RecordDecoder};

/// An opened TCG event log
pub struct EventLog<R> {
    reader: ByteReader<R>,
    decoder: EventDecoder,
    format: Format,
    spec_id: Option<EfiSpecIdEvent>,
    algorithm_sizes: Vec<AlgorithmSize>,
    algorithms: Vec<AlgorithmId>,
    next_index: u32,
    failed: bool,
}

/// Returns the Spec ID Event03 header carried by a first record, if it is one
///
/// The record must target PCR 0, be of type EV_NO_ACTION, carry an all-zero digest and start
/// with the "Spec ID Event03" signature. A signature followed by a header that ends early is
/// treated as no header.
///
/// # Errors
///
/// * `TcgLogError::InvalidLog` - If the header is complete but malformed, such as declaring too many algorithms
pub fn parse_spec_id_event(event: &Event) -> Result<Option<EfiSpecIdEvent>, TcgLogError> {
    if event.pcr_index != 0
        || event.event_type != EventType::EV_NO_ACTION
        || !event.digests.values().all(|digest| digest.is_zero())
        || event.data.len() < SPEC_ID_EVENT_MIN_SIZE
        || !event.data.starts_with(SPEC_ID_EVENT_SIGNATURE_03)
    {
        return Ok(None);
    }

    match EvNoActionEvent::decode(&event.data) {
        Ok(EvNoActionEvent::SpecIdEvent(spec_id)) => Ok(Some(spec_id)),
        Ok(_) => Ok(None),
        Err(e) if e.is_unexpected_eof() => {
            warn!("First event carries a Spec ID Event03 signature but the header is truncated");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Checks every recognized algorithm in the header against the digest catalog
fn check_algorithm_sizes(algorithm_sizes: &[AlgorithmSize]) -> Result<(), TcgLogError> {
    for entry in algorithm_sizes {
        if let Some(expected) = known_digest_size(entry.algorithm_id) {
            if expected != entry.digest_size {
                return Err(TcgLogError::DigestSizeMismatch {
                    algorithm: entry.algorithm_id,
                    size: entry.digest_size,
                    expected,
                });
            }
        }
    }
    Ok(())
}

impl<R: Read + Seek> EventLog<R> {
    /// Opens a log whose first record starts at the source's current position
    ///
    /// # Errors
    ///
    /// * `TcgLogError::UnexpectedEof` - If the source holds no complete first record
    /// * `TcgLogError::DigestSizeMismatch` - If the header declares a wrong size for a recognized algorithm
    /// * `TcgLogError::InvalidLog` - If the header declares more algorithms than a log can carry
    /// * Any structural error in the first record
    pub fn new(source: R) -> Result<Self, TcgLogError> {
        let mut reader = ByteReader::new(source);
        let start = reader.position()?;

        let first = LegacyDecoder.read_next_event(&mut reader, 0)?
            .ok_or(TcgLogError::UnexpectedEof)?;
        reader.set_position(start)?;

        let spec_id = parse_spec_id_event(&first)?;
        let (format, algorithm_sizes) = match &spec_id {
            Some(spec_id) => {
                check_algorithm_sizes(&spec_id.digest_sizes)?;
                (Format::CryptoAgile, spec_id.digest_sizes.clone())
            }
            None => (
                Format::Legacy,
                vec![AlgorithmSize::new(AlgorithmId::Sha1.as_u16(), AlgorithmId::Sha1.digest_size())],
            ),
        };

        let algorithms: Vec<AlgorithmId> = algorithm_sizes.iter()
            .filter_map(AlgorithmSize::algorithm)
            .collect();
        info!("Opened {} event log, algorithms: {:?}", format, algorithms);

        Ok(Self {
            reader,
            decoder: EventDecoder::for_format(format, &algorithm_sizes),
            format,
            spec_id,
            algorithm_sizes,
            algorithms,
            next_index: 0,
            failed: false,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Recognized algorithm banks, in header order
    pub fn algorithms(&self) -> &[AlgorithmId] {
        &self.algorithms
    }

    /// Every bank the log declares, including algorithms this crate cannot hash
    pub fn algorithm_sizes(&self) -> &[AlgorithmSize] {
        &self.algorithm_sizes
    }

    pub fn spec_id_event(&self) -> Option<&EfiSpecIdEvent> {
        self.spec_id.as_ref()
    }

    pub fn has_algorithm(&self, algorithm: AlgorithmId) -> bool {
        self.algorithms.contains(&algorithm)
    }

    /// Reads the next event
    ///
    /// Returns `Ok(None)` once the log ends between records. After an error the position of
    /// the log is undefined and every later call fails.
    pub fn next_event(&mut self) -> Result<Option<Event>, TcgLogError> {
        if self.failed {
            return Err(TcgLogError::InvalidLog("Event log is unusable after an earlier decode error".to_string()));
        }

        match self.decoder.read_next_event(&mut self.reader, self.next_index) {
            Ok(Some(event)) => {
                debug!("Decoded {}", event);
                self.next_index += 1;
                Ok(Some(event))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl EventLog<Cursor<Vec<u8>>> {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, TcgLogError> {
        Self::new(Cursor::new(data))
    }

    /// Opens a base64 encoded log
    pub fn from_base64(encoded: &str) -> Result<Self, TcgLogError> {
        let data = BASE64.decode(encoded.trim().as_bytes())
            .map_err(|e| TcgLogError::InvalidLog(format!("Failed to decode event log: {}", e)))?;
        Self::from_bytes(data)
    }
}

impl EventLog<BufReader<File>> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TcgLogError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

/// Iterates over the remaining events, stopping after the first error
impl<R: Read + Seek> Iterator for EventLog<R> {
    type Item = Result<Event, TcgLogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_event().transpose()
    }
}
