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

//! Byte Reader Module
//!
//! This module provides tools for reading little-endian binary data from a seekable byte source.
//! It is used both for the on-disk event records and for the event payloads that the validator
//! decodes.
//!
//! The module contains two main components:
//! - `ByteReader`: A positioned reader providing methods for reading fixed width little-endian fields
//! - `ByteParseable`: A parseable trait; types implementing this trait can be parsed directly from a payload
//!
//! Every multi-byte field is decoded as little-endian regardless of the host byte order.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use tcg_common::TcgLogError;
use uuid::Uuid;

/// UEFI GUID size
pub const UEFI_GUID_SIZE: usize = 16;

/// Binary data reading helper structure
///
/// Wraps any `Read + Seek` source. Short reads are reported as `TcgLogError::UnexpectedEof`.
pub struct ByteReader<R> {
    inner: R,
}

/// Trait for event payload types that can be parsed from an in-memory byte slice
pub trait ByteParseable: Sized {
    /// Parse an instance of the current type from a byte reader
    ///
    /// # Errors
    ///
    /// Returns a TcgLogError when the payload contains insufficient data or is incorrectly formatted
    fn parse_from(parser: &mut ByteReader<Cursor<&[u8]>>) -> Result<Self, TcgLogError>;
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Get the current position (byte offset)
    pub fn position(&mut self) -> Result<u64, TcgLogError> {
        Ok(self.inner.stream_position()?)
    }

    /// Set position (byte offset from the start of the source)
    pub fn set_position(&mut self, pos: u64) -> Result<(), TcgLogError> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Read the first field of a record
    ///
    /// # Returns
    /// * `Ok(None)` - The source ended before any byte of the field was read
    /// * `Ok(Some(value))` - The little-endian u32 value
    ///
    /// # Errors
    /// * `TcgLogError::UnexpectedEof` - When only part of the field was available
    pub fn read_record_start(&mut self) -> Result<Option<u32>, TcgLogError> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            4 => Ok(Some(u32::from_le_bytes(buf))),
            _ => Err(TcgLogError::UnexpectedEof),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, TcgLogError> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16, TcgLogError> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32, TcgLogError> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64, TcgLogError> {
        Ok(self.inner.read_u64::<LittleEndian>()?)
    }

    /// Read bytes of specified length
    ///
    /// The buffer grows with the data actually read, so a corrupt length cannot force a large allocation.
    ///
    /// # Errors
    /// * `TcgLogError::UnexpectedEof` - When the source ends before `length` bytes were read
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, TcgLogError> {
        let mut buffer = Vec::new();
        (&mut self.inner).take(length as u64).read_to_end(&mut buffer)?;
        if buffer.len() != length {
            return Err(TcgLogError::UnexpectedEof);
        }
        Ok(buffer)
    }

    /// Read a GUID in the EFI mixed-endian layout
    pub fn read_guid(&mut self) -> Result<Uuid, TcgLogError> {
        let mut guid_bytes = [0u8; UEFI_GUID_SIZE];
        self.inner.read_exact(&mut guid_bytes)?;
        Ok(Uuid::from_bytes_le(guid_bytes))
    }

    /// Read `length` UTF-16LE code units
    ///
    /// Unpaired surrogates are replaced with U+FFFD. Trailing NUL characters are not stripped.
    pub fn read_utf16(&mut self, length: usize) -> Result<String, TcgLogError> {
        let raw = self.read_bytes(length.checked_mul(2).ok_or(TcgLogError::UnexpectedEof)?)?;
        let units: Vec<u16> = raw.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

impl<'a> ByteReader<Cursor<&'a [u8]>> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(Cursor::new(data))
    }

    /// Number of unread bytes remaining
    pub fn remaining(&self) -> u64 {
        let total = self.inner.get_ref().len() as u64;
        total.saturating_sub(self.inner.position())
    }

    pub fn is_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Offset of the cursor inside the payload
    pub fn offset(&self) -> usize {
        self.inner.position() as usize
    }
}
