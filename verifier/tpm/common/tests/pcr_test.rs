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

use serde_json::json;
use tcg_common::{
    validate_pcr_values, AlgorithmId, Digest, PcrBanks, PcrSource, PcrValueEntry, PcrValues, TcgLogError,
};

const SHA256_PCR0: &str = "9d7504bb0d32f62d43310f38df37cdd5e42bdb83dd0c0592fd9b1c3b16770c35";
const SHA1_PCR0: &str = "b2a83b0ebf2f8374299a5b2bdfc31ea955ad7236";

fn bank(hash_alg: &str, values: &[(u32, &str)]) -> PcrValues {
    PcrValues {
        hash_alg: hash_alg.to_string(),
        pcr_values: values.iter()
            .map(|(index, value)| PcrValueEntry { pcr_index: *index, pcr_value: value.to_string() })
            .collect(),
    }
}

// Test Objective: Verify parsing a single bank document
// Expected Result: The bank is available through PcrSource
#[test]
fn test_single_bank_from_json() {
    let value = json!({
        "hash_alg": "sha256",
        "pcr_values": [{ "pcr_index": 0, "pcr_value": SHA256_PCR0 }]
    });
    let banks = PcrBanks::from_json(&value).unwrap();
    assert_eq!(banks.banks.len(), 1);
    assert_eq!(
        banks.pcr_value(0, AlgorithmId::Sha256).unwrap(),
        Digest::from_hex(SHA256_PCR0).unwrap()
    );
    assert!(matches!(banks.pcr_value(1, AlgorithmId::Sha256), Err(TcgLogError::PcrValueError(_))));
    assert!(matches!(banks.pcr_value(0, AlgorithmId::Sha1), Err(TcgLogError::PcrValueError(_))));
}

// Test Objective: Verify parsing a multi-bank document
// Expected Result: Each bank answers for its own algorithm
#[test]
fn test_multiple_banks_from_json_str() {
    let json = format!(
        r#"{{"banks": [
            {{"hash_alg": "sha1", "pcr_values": [{{"pcr_index": 0, "pcr_value": "{}"}}]}},
            {{"hash_alg": "sha256", "pcr_values": [{{"pcr_index": 0, "pcr_value": "{}"}}]}}
        ]}}"#,
        SHA1_PCR0, SHA256_PCR0
    );
    let banks = PcrBanks::from_json_str(&json).unwrap();
    assert_eq!(banks.pcr_value(0, AlgorithmId::Sha1).unwrap().to_hex(), SHA1_PCR0);
    assert_eq!(banks.pcr_value(0, AlgorithmId::Sha256).unwrap().to_hex(), SHA256_PCR0);
    assert!(banks.bank(AlgorithmId::Sha384).is_none());
}

// Test Objective: Verify duplicate banks are rejected
// Expected Result: PcrValueError
#[test]
fn test_duplicate_bank_rejected() {
    let value = json!({ "banks": [
        { "hash_alg": "sha256", "pcr_values": [] },
        { "hash_alg": "SHA256", "pcr_values": [] }
    ]});
    assert!(matches!(PcrBanks::from_json(&value), Err(TcgLogError::PcrValueError(_))));
}

// Test Objective: Verify malformed documents are rejected
// Expected Result: PcrValueError for invalid JSON and for missing fields
#[test]
fn test_invalid_json_rejected() {
    assert!(matches!(PcrBanks::from_json_str("{"), Err(TcgLogError::PcrValueError(_))));
    assert!(matches!(PcrBanks::from_json(&json!({ "hash_alg": "sha256" })), Err(TcgLogError::PcrValueError(_))));
}

// Test Objective: Verify per-bank validation rules
// Expected Result: Unsupported algorithm, duplicate index, out of range index, bad hex and wrong length all fail
#[test]
fn test_validate_pcr_values() {
    assert!(validate_pcr_values(&bank("sha256", &[(0, SHA256_PCR0), (23, SHA256_PCR0)])).is_ok());

    assert!(matches!(
        validate_pcr_values(&bank("md5", &[])),
        Err(TcgLogError::UnsupportedAlgorithm(_))
    ));
    assert!(validate_pcr_values(&bank("sha256", &[(1, SHA256_PCR0), (1, SHA256_PCR0)])).is_err());
    assert!(validate_pcr_values(&bank("sha256", &[(32, SHA256_PCR0)])).is_err());
    assert!(validate_pcr_values(&bank("sha256", &[(0, "zz")])).is_err());
    assert!(validate_pcr_values(&bank("sha256", &[(0, SHA1_PCR0)])).is_err());
}

// Test Objective: Verify building banks programmatically
// Expected Result: set_pcr_value replaces existing entries and bank_mut creates missing banks once
#[test]
fn test_bank_mut_and_set_pcr_value() {
    let mut banks = PcrBanks::default();
    let first = Digest::new(vec![1; 20]);
    let second = Digest::new(vec![2; 20]);
    banks.bank_mut(AlgorithmId::Sha1).set_pcr_value(7, &first);
    banks.bank_mut(AlgorithmId::Sha1).set_pcr_value(7, &second);

    assert_eq!(banks.banks.len(), 1);
    assert_eq!(banks.bank(AlgorithmId::Sha1).unwrap().get_pcr_indices(), vec![7]);
    assert_eq!(banks.pcr_value(7, AlgorithmId::Sha1).unwrap(), second);
    assert!(validate_pcr_values(banks.bank(AlgorithmId::Sha1).unwrap()).is_ok());
}
