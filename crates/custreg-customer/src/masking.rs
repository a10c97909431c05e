// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PII masking for responses, error messages and logs.

/// Mask a PAN as the first three characters, five stars and the last character.
///
/// Anything shorter than four characters yields `INVALID_PAN`.
pub fn mask_pan(pan: &str) -> String {
    let chars: Vec<char> = pan.chars().collect();
    if chars.len() < 4 {
        return "INVALID_PAN".to_string();
    }
    let head: String = chars[..3].iter().collect();
    format!("{head}*****{}", chars[chars.len() - 1])
}

/// Mask an Aadhaar number down to its last four digits.
pub fn mask_aadhaar(aadhaar: &str) -> String {
    let chars: Vec<char> = aadhaar.chars().collect();
    if chars.len() < 4 {
        return "INVALID_AADHAAR".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("********{tail}")
}
