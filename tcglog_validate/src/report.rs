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

use std::fmt::{self, Write};
use tcg_eventlog::LogValidateResult;

/// Renders the findings in the sections printed by the tool
pub fn render(result: &LogValidateResult) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, result).map(|_| out)
}

fn write_report(out: &mut String, result: &LogValidateResult) -> fmt::Result {
    let algorithms: Vec<String> = result.algorithms.iter().map(|alg| alg.to_string()).collect();
    writeln!(out, "Log format: {}, banks: {}, events: {}\n", result.format, algorithms.join(", "), result.event_count)?;

    writeln!(out, "*** QUIRKS ***")?;
    if result.efi_variable_boot_quirk {
        writeln!(out, "EV_EFI_VARIABLE_BOOT events measure entire UEFI_VARIABLE_DATA structure rather \
            than just the variable contents")?;
    }
    if !result.events_with_excess_measured_data.is_empty() {
        writeln!(out, "The following events have padding at the end of their event data that was hashed \
            and measured:")?;
        for v in &result.events_with_excess_measured_data {
            writeln!(out, "- {}: {} ({} bytes)", v.event, hex::encode(&v.excess_bytes), v.excess_bytes.len())?;
        }
    }
    if !result.efi_variable_authority_events_with_unmeasured_byte.is_empty() {
        writeln!(out, "The following events have one extra byte at the end of their event data that \
            was not hashed and measured:")?;
        for e in &result.efi_variable_authority_events_with_unmeasured_byte {
            writeln!(out, "- Event {} in PCR {} [ VariableName: {}, UnicodeName: \"{}\" ] (byte: 0x{:x})",
                e.event.index, e.event.pcr_index, e.variable.variable_name, e.variable.unicode_name,
                e.unmeasured_byte)?;
        }
    }
    writeln!(out, "*** END QUIRKS ***\n")?;

    writeln!(out, "*** UNEXPECTED EVENT DIGESTS ***")?;
    for v in &result.unexpected_digest_values {
        let got = v.recorded().map(|d| d.to_hex()).unwrap_or_default();
        writeln!(out, "Event {} in PCR {} (type: {}, alg: {}) - expected: {}, got: {}",
            v.event.index, v.event.pcr_index, v.event.event_type, v.algorithm, v.expected, got)?;
    }
    writeln!(out, "*** END UNEXPECTED EVENT DIGESTS ***\n")?;

    writeln!(out, "*** EVENT CONFORMANCE ***")?;
    for v in &result.event_violations {
        writeln!(out, "{}: {}", v.event, v.error)?;
    }
    writeln!(out, "*** END EVENT CONFORMANCE ***\n")?;

    writeln!(out, "*** LOG CONSISTENCY ERRORS ***")?;
    for v in &result.log_consistency_errors {
        writeln!(out, "PCR {}, bank {} - actual PCR value: {}, expected PCR value from event log: {}",
            v.index, v.algorithm, v.pcr_digest, v.expected_pcr_digest)?;
    }
    writeln!(out, "*** END LOG CONSISTENCY ERRORS ***")
}
