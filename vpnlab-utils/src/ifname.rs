//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

// Size of the kernel interface name buffer, including the trailing NUL.
pub const IFNAMSIZ: usize = 16;

/// Returns whether `name` can be used as a Linux network device name.
///
/// The same rules are applied to network namespace names, since in VRF-lite
/// mode a VRF is a network device.
pub fn is_valid(name: &str) -> bool {
    !name.is_empty()
        && name.len() < IFNAMSIZ
        && name != "."
        && name != ".."
        && !name.chars().any(|c| c == '/' || c == ':' || c.is_whitespace())
}

#[cfg(test)]
mod test_ifname {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid("lo"));
        assert!(is_valid("r1-eth4"));
        assert!(is_valid("r4-cust2"));
        assert!(is_valid("abcdefghijklmno"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid(""));
        assert!(!is_valid(".."));
        assert!(!is_valid("abcdefghijklmnop"));
        assert!(!is_valid("r1 eth0"));
        assert!(!is_valid("r1/eth0"));
        assert!(!is_valid("eth0:1"));
    }
}
