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

//! Digest algorithm catalog and digest value types
//!
//! `AlgorithmId` only covers the TPM2_ALG_ID values this crate can hash. Any other identifier
//! found in a log is kept as a raw `u16` by the decoder and never interpreted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use crate::error::TcgLogError;

pub const SHA1_DIGEST_SIZE: u16 = 20;
pub const SHA256_DIGEST_SIZE: u16 = 32;
pub const SHA384_DIGEST_SIZE: u16 = 48;
pub const SHA512_DIGEST_SIZE: u16 = 64;

/// Hash algorithm identifier (TPM2_ALG_ID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum AlgorithmId {
    Sha1 = 0x0004,
    Sha256 = 0x000B,
    Sha384 = 0x000C,
    Sha512 = 0x000D,
}

impl AlgorithmId {
    /// Looks up a raw TPM2_ALG_ID, returns `None` for algorithms outside the catalog
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::all().into_iter().find(|alg| alg.as_u16() == value)
    }

    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Fixed digest length in bytes
    pub fn digest_size(&self) -> u16 {
        match self {
            AlgorithmId::Sha1 => SHA1_DIGEST_SIZE,
            AlgorithmId::Sha256 => SHA256_DIGEST_SIZE,
            AlgorithmId::Sha384 => SHA384_DIGEST_SIZE,
            AlgorithmId::Sha512 => SHA512_DIGEST_SIZE,
        }
    }

    /// Every algorithm in the catalog, in identifier order
    pub fn all() -> [AlgorithmId; 4] {
        [AlgorithmId::Sha1, AlgorithmId::Sha256, AlgorithmId::Sha384, AlgorithmId::Sha512]
    }
}

/// Digest length for a raw algorithm identifier, `None` when the algorithm is unrecognized
pub fn known_digest_size(algorithm_id: u16) -> Option<u16> {
    AlgorithmId::from_u16(algorithm_id).map(|alg| alg.digest_size())
}

impl TryFrom<u16> for AlgorithmId {
    type Error = TcgLogError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        AlgorithmId::from_u16(value)
            .ok_or_else(|| TcgLogError::UnsupportedAlgorithm(format!("0x{:04x}", value)))
    }
}

impl FromStr for AlgorithmId {
    type Err = TcgLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" => Ok(AlgorithmId::Sha1),
            "sha256" => Ok(AlgorithmId::Sha256),
            "sha384" => Ok(AlgorithmId::Sha384),
            "sha512" => Ok(AlgorithmId::Sha512),
            _ => Err(TcgLogError::UnsupportedAlgorithm(format!("Unrecognized algorithm \"{}\"", s))),
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmId::Sha1 => write!(f, "sha1"),
            AlgorithmId::Sha256 => write!(f, "sha256"),
            AlgorithmId::Sha384 => write!(f, "sha384"),
            AlgorithmId::Sha512 => write!(f, "sha512"),
        }
    }
}

/// A digest value. Its length is set by the algorithm that produced it.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: Vec<u8>) -> Self {
        Digest(bytes)
    }

    /// All-zero digest of the given algorithm's length (the PCR reset value)
    pub fn zero(algorithm: AlgorithmId) -> Self {
        Digest(vec![0u8; algorithm.digest_size() as usize])
    }

    pub fn from_hex(value: &str) -> Result<Self, TcgLogError> {
        hex::decode(value)
            .map(Digest)
            .map_err(|e| TcgLogError::PcrValueError(format!("Invalid hex digest '{}': {}", value, e)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Digest(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<[u8]> for Digest {
    fn eq(&self, other: &[u8]) -> bool {
        self.0.as_slice() == other
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Digests recorded for one event, one entry per recognized bank
pub type DigestMap = BTreeMap<AlgorithmId, Digest>;
