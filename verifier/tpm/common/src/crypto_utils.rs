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

//! Hash helpers
//!
//! This module provides helper functions for:
//! - Converting algorithm IDs to OpenSSL message digests
//! - Hashing event data with a bank's algorithm
//! - The PCR extend operation
use openssl::hash::{Hasher, MessageDigest};
use crate::error::TcgLogError;
use crate::structure::{AlgorithmId, Digest};

pub struct CryptoVerifier;

impl CryptoVerifier {
    pub fn algorithm_to_message_digest(alg: AlgorithmId) -> MessageDigest {
        match alg {
            AlgorithmId::Sha1 => MessageDigest::sha1(),
            AlgorithmId::Sha256 => MessageDigest::sha256(),
            AlgorithmId::Sha384 => MessageDigest::sha384(),
            AlgorithmId::Sha512 => MessageDigest::sha512(),
        }
    }

    /// Hash `data` with the given algorithm
    pub fn hash(alg: AlgorithmId, data: &[u8]) -> Result<Digest, TcgLogError> {
        let digest = openssl::hash::hash(Self::algorithm_to_message_digest(alg), data)
            .map_err(|e| TcgLogError::InternalError(format!("Failed to compute {} digest: {}", alg, e)))?;
        Ok(Digest::new(digest.to_vec()))
    }

    /// PCR extend: `hash(current || input)`
    pub fn extend(alg: AlgorithmId, current: &[u8], input: &[u8]) -> Result<Digest, TcgLogError> {
        let mut hasher = Hasher::new(Self::algorithm_to_message_digest(alg))
            .map_err(|e| TcgLogError::InternalError(format!("Failed to create hasher: {}", e)))?;

        hasher.update(current)
            .map_err(|e| TcgLogError::InternalError(format!("Failed to update hash with current value: {}", e)))?;

        hasher.update(input)
            .map_err(|e| TcgLogError::InternalError(format!("Failed to update hash with log value: {}", e)))?;

        let value = hasher.finish()
            .map_err(|e| TcgLogError::InternalError(format!("Failed to finalize hash: {}", e)))?;

        Ok(Digest::new(value.to_vec()))
    }

    /// Returns true when `digest` is the hash of `data` under `alg`
    pub fn digest_matches(alg: AlgorithmId, data: &[u8], digest: &Digest) -> Result<bool, TcgLogError> {
        Ok(Self::hash(alg, data)? == *digest)
    }
}
