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

//! Error type shared by the event log decoder, the validator and the PCR value sources.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TcgLogError {
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// A record began but the source ended before it was complete
    #[error("Unexpected end of event log data")]
    UnexpectedEof,

    #[error("Error whilst parsing event log: {0}")]
    InvalidLog(String),

    #[error("Error whilst parsing event log: Invalid PCR index '{0}'")]
    InvalidPcrIndex(u32),

    #[error("Error whilst parsing event log: Entry for algorithm '{0:04x}' not found in log header")]
    UnknownLogAlgorithm(u16),

    #[error("Error whilst parsing event log: Event has no digest for algorithm '{0:04x}' declared in log header")]
    MissingLogAlgorithm(u16),

    #[error(
        "Digest size in log header for algorithm '{algorithm:04x}' doesn't match expected size \
         (size: {size}, expected {expected})"
    )]
    DigestSizeMismatch {
        algorithm: u16,
        size: u16,
        expected: u16,
    },

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("PCR value error: {0}")]
    PcrValueError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl TcgLogError {
    /// Returns true for errors that mean the log ended in the middle of a record
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, TcgLogError::UnexpectedEof)
    }
}

impl From<io::Error> for TcgLogError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => TcgLogError::UnexpectedEof,
            _ => TcgLogError::Io(e),
        }
    }
}
