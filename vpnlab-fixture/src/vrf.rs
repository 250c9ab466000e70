//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::command::{Command, RuleSelector};
use crate::error::Error;

// How VRF isolation is emulated on the routers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VrfMode {
    // One network namespace per VRF.
    #[default]
    Netns,
    // One VRF master device per VRF, bound to a routing table.
    VrfLite,
}

// Customer VRF instantiated on a PE router.
#[derive(Clone, Debug, new)]
pub struct VrfPlan {
    pub router: String,
    pub vrf: String,
    // Routing table (VRF-lite mode only).
    pub table: u32,
    // Interfaces that get MPLS input enabled before the VRF is created.
    pub mpls_ifnames: Vec<String>,
    // Interface moved into the VRF.
    pub attach_ifname: String,
}

// ===== impl VrfMode =====

impl std::fmt::Display for VrfMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VrfMode::Netns => write!(f, "netns"),
            VrfMode::VrfLite => write!(f, "vrf-lite"),
        }
    }
}

// ===== impl VrfPlan =====

impl VrfPlan {
    // MPLS has to be enabled while the interfaces are still visible from the
    // default namespace, so these commands always come first.
    pub fn mpls_commands(&self) -> Result<Vec<Command>, Error> {
        let mut cmds = self
            .mpls_ifnames
            .iter()
            .map(|ifname| Command::mpls_input(ifname))
            .collect::<Result<Vec<_>, _>>()?;
        if !self.mpls_ifnames.contains(&self.attach_ifname) {
            cmds.push(Command::mpls_input(&self.attach_ifname)?);
        }
        Ok(cmds)
    }

    pub fn vrf_commands(&self, mode: VrfMode) -> Result<Vec<Command>, Error> {
        let vrf = &self.vrf;
        let ifname = &self.attach_ifname;
        let cmds = match mode {
            VrfMode::Netns => vec![
                Command::netns_add(vrf)?,
                Command::link_set_netns(ifname, vrf)?,
                Command::netns_exec_if_up(vrf, ifname)?,
            ],
            VrfMode::VrfLite => vec![
                Command::vrf_add(vrf, self.table)?,
                Command::rule_add(RuleSelector::Oif, vrf, self.table)?,
                Command::rule_add(RuleSelector::Iif, vrf, self.table)?,
                Command::link_up(vrf)?,
                Command::link_set_master(ifname, vrf)?,
            ],
        };
        Ok(cmds)
    }

    pub fn setup_commands(&self, mode: VrfMode) -> Result<Vec<Command>, Error> {
        let mut cmds = self.mpls_commands()?;
        cmds.extend(self.vrf_commands(mode)?);
        Ok(cmds)
    }

    pub fn teardown_commands(
        &self,
        mode: VrfMode,
    ) -> Result<Vec<Command>, Error> {
        let vrf = &self.vrf;
        let ifname = &self.attach_ifname;
        let cmds = match mode {
            VrfMode::Netns => vec![
                Command::netns_exec_restore(vrf, ifname)?,
                Command::netns_del(vrf)?,
            ],
            VrfMode::VrfLite => vec![
                Command::link_set_nomaster(ifname)?,
                Command::rule_del(RuleSelector::Oif, vrf, self.table)?,
                Command::rule_del(RuleSelector::Iif, vrf, self.table)?,
                Command::link_del(vrf)?,
            ],
        };
        Ok(cmds)
    }
}
