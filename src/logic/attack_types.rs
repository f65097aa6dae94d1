//! Attack Types - label catalogue of the trained classifier
//!
//! The label encoder used at training time produced these ids. Names are
//! kept byte-for-byte, including the double space in the web attack
//! classes, so clients can match on them.

use std::collections::BTreeMap;

/// Number of classes the model was trained on
pub const CLASS_COUNT: usize = 15;

/// Label id → attack type name, in label order
pub const ATTACK_TYPES: [&str; CLASS_COUNT] = [
    "BENIGN",                    // 0
    "Bot",                       // 1
    "DDoS",                      // 2
    "DoS GoldenEye",             // 3
    "DoS Hulk",                  // 4
    "DoS Slowhttptest",          // 5
    "DoS Slowloris",             // 6
    "FTP-Patator",               // 7
    "Heartbleed",                // 8
    "Infiltration",              // 9
    "PortScan",                  // 10
    "SSH-Patator",               // 11
    "Web Attack  Brute Force",   // 12
    "Web Attack  SQL Injection", // 13
    "Web Attack  XSS",           // 14
];

/// Name reported for labels outside the catalogue
pub const UNKNOWN: &str = "Unknown";

/// Get attack type name by label
pub fn name(label: usize) -> &'static str {
    ATTACK_TYPES.get(label).copied().unwrap_or(UNKNOWN)
}

/// Full catalogue, ordered by label.
///
/// Serializes as a JSON object keyed by the stringified label id.
pub fn catalogue() -> BTreeMap<usize, &'static str> {
    ATTACK_TYPES.iter().copied().enumerate().collect()
}
