//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Deserializer};

use crate::gate::VersionGate;
use crate::vrf::VrfMode;

// Settings shared by the fixture hooks and the version gate. Built once and
// never mutated afterwards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureConfig {
    pub vrf_mode: VrfMode,
    // Minimum kernel release required by gated tests. An empty string turns
    // the kernel release check off.
    #[serde(deserialize_with = "deserialize_min_kernel")]
    pub min_kernel: Option<String>,
}

// ===== impl FixtureConfig =====

impl FixtureConfig {
    // Returns a version gate for `version` using the configured minimum
    // kernel release.
    pub fn gate(&self, version: &str) -> VersionGate {
        VersionGate::new(version).kernel(self.min_kernel.as_deref())
    }
}

impl Default for FixtureConfig {
    fn default() -> FixtureConfig {
        FixtureConfig {
            vrf_mode: VrfMode::Netns,
            min_kernel: Some(VersionGate::DFLT_KERNEL.to_owned()),
        }
    }
}

// ===== helper functions =====

fn deserialize_min_kernel<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let min_kernel = String::deserialize(deserializer)?;
    let min_kernel = min_kernel.trim();
    Ok((!min_kernel.is_empty()).then(|| min_kernel.to_owned()))
}
