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

//! PCR replay
//!
//! `PcrReplay` folds the recorded digests of every event into one running value per
//! (PCR index, bank) and compares the result with the platform's live PCR values.

use std::collections::BTreeMap;
use log::debug;
use tcg_common::{AlgorithmId, CryptoVerifier, Digest, PcrSource, TcgLogError};
use crate::event::model::{EvNoActionEvent, Event, EventType};

/// A bank whose live value differs from the value computed from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConsistencyError {
    pub index: u32,
    pub algorithm: AlgorithmId,
    /// Live PCR value
    pub pcr_digest: Digest,
    /// Value computed from the log
    pub expected_pcr_digest: Digest,
}

/// Running PCR values computed from a log
///
/// Not synchronized; one accumulator serves one event stream.
#[derive(Debug, Clone)]
pub struct PcrReplay {
    algorithms: Vec<AlgorithmId>,
    values: BTreeMap<(u32, AlgorithmId), Digest>,
    locality: u8,
}

impl PcrReplay {
    /// Creates an accumulator for the given banks
    pub fn new(algorithms: &[AlgorithmId]) -> Self {
        Self {
            algorithms: algorithms.to_vec(),
            values: BTreeMap::new(),
            locality: 0,
        }
    }

    pub fn algorithms(&self) -> &[AlgorithmId] {
        &self.algorithms
    }

    /// Startup locality recorded in the log, 0 when none was seen
    pub fn locality(&self) -> u8 {
        self.locality
    }

    /// Reset value of a PCR for the current locality
    fn initial_value(&self, index: u32, algorithm: AlgorithmId) -> Digest {
        let mut value = Digest::zero(algorithm).into_bytes();
        if index == 0 {
            if let Some(last) = value.last_mut() {
                *last = self.locality;
            }
        }
        Digest::new(value)
    }

    fn is_extended(&self, index: u32) -> bool {
        self.values.keys().any(|(pcr, _)| *pcr == index)
    }

    /// Current value of one bank of one PCR
    pub fn value(&self, index: u32, algorithm: AlgorithmId) -> Digest {
        self.values.get(&(index, algorithm))
            .cloned()
            .unwrap_or_else(|| self.initial_value(index, algorithm))
    }

    /// Extends a single bank: `new = hash(old || digest)`
    pub fn extend(&mut self, index: u32, algorithm: AlgorithmId, digest: &Digest) -> Result<(), TcgLogError> {
        let current = self.value(index, algorithm);
        let next = CryptoVerifier::extend(algorithm, current.as_bytes(), digest.as_bytes())?;
        debug!("PCR{} {} extended to {}", index, algorithm, next);
        self.values.insert((index, algorithm), next);
        Ok(())
    }

    /// Folds one event into the running values
    ///
    /// EV_NO_ACTION events are never extended. A StartupLocality event in PCR 0 sets the
    /// reset value of PCR 0 as long as PCR 0 has not been extended yet.
    pub fn extend_event(&mut self, event: &Event) -> Result<(), TcgLogError> {
        if event.event_type == EventType::EV_NO_ACTION {
            if event.pcr_index == 0 && !self.is_extended(0) {
                if let Ok(EvNoActionEvent::StartupLocality(startup)) = EvNoActionEvent::decode(&event.data) {
                    debug!("Startup locality {}", startup.locality);
                    self.locality = startup.locality;
                }
            }
            return Ok(());
        }

        let recorded: Vec<(AlgorithmId, &Digest)> = self.algorithms.iter()
            .filter_map(|algorithm| event.digests.get(algorithm).map(|digest| (*algorithm, digest)))
            .collect();
        for (algorithm, digest) in recorded {
            self.extend(event.pcr_index, algorithm, digest)?;
        }
        Ok(())
    }

    /// Compares every selected PCR in every bank against the live values
    ///
    /// # Errors
    ///
    /// Returns the source's error when a live value cannot be obtained.
    pub fn compare(&self, pcrs: &[u32], source: &dyn PcrSource) -> Result<Vec<LogConsistencyError>, TcgLogError> {
        let mut errors = Vec::new();
        for &index in pcrs {
            for &algorithm in &self.algorithms {
                let expected = self.value(index, algorithm);
                let actual = source.pcr_value(index, algorithm)?;
                if actual != expected {
                    errors.push(LogConsistencyError {
                        index,
                        algorithm,
                        pcr_digest: actual,
                        expected_pcr_digest: expected,
                    });
                }
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcg_common::DigestMap;

    #[test]
    fn unextended_pcr_is_zero() {
        let replay = PcrReplay::new(&[AlgorithmId::Sha256]);
        assert_eq!(replay.value(3, AlgorithmId::Sha256), Digest::zero(AlgorithmId::Sha256));
    }

    #[test]
    fn startup_locality_sets_pcr0_reset_value() {
        let mut data = crate::event::model::STARTUP_LOCALITY_SIGNATURE.to_vec();
        data.push(3);
        let mut digests = DigestMap::new();
        digests.insert(AlgorithmId::Sha1, Digest::zero(AlgorithmId::Sha1));
        let event = Event { index: 1, pcr_index: 0, event_type: EventType::EV_NO_ACTION, digests, data };

        let mut replay = PcrReplay::new(&[AlgorithmId::Sha1]);
        assert_eq!(replay.locality(), 0);
        replay.extend_event(&event).unwrap();
        assert_eq!(replay.locality(), 3);

        let mut expected = vec![0u8; 20];
        expected[19] = 3;
        assert_eq!(replay.value(0, AlgorithmId::Sha1), Digest::new(expected));
        assert_eq!(replay.value(1, AlgorithmId::Sha1), Digest::zero(AlgorithmId::Sha1));
    }
}
