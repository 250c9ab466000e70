//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};
use vpnlab_utils::ifname;

use crate::error::Error;

// Shell command issued to an emulated host.
//
// Every name embedded in a command is validated on construction, so the
// rendered command line never needs quoting.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Command {
    // Diagnostics.
    PackageInfo(PackageQuery),

    // MPLS.
    MplsInput { ifname: String },

    // Network namespaces.
    NetnsAdd { name: String },
    NetnsDel { name: String },
    NetnsDelIfExists { name: String },
    NetnsExecIfUp { netns: String, ifname: String },
    NetnsExecRestore { netns: String, ifname: String },

    // VRF-lite.
    VrfAdd { name: String, table: u32 },
    RuleAdd { selector: RuleSelector, vrf: String, table: u32 },
    RuleDel { selector: RuleSelector, vrf: String, table: u32 },

    // Links.
    LinkUp { ifname: String },
    LinkDel { ifname: String },
    LinkSetNetns { ifname: String, netns: String },
    LinkSetMaster { ifname: String, master: String },
    LinkSetNoMaster { ifname: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PackageQuery {
    AptPolicy(String),
    YumInfo(String),
}

// Policy routing rule selector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum RuleSelector {
    Oif,
    Iif,
}

// Interface moved out of the default context by a command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Attachment<'a> {
    pub ifname: &'a str,
    pub target: AttachTarget<'a>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttachTarget<'a> {
    Netns(&'a str),
    Master(&'a str),
}

// ===== impl Command =====

impl Command {
    pub fn mpls_input(ifname: &str) -> Result<Command, Error> {
        Ok(Command::MplsInput {
            ifname: validate(ifname)?,
        })
    }

    pub fn netns_add(name: &str) -> Result<Command, Error> {
        Ok(Command::NetnsAdd {
            name: validate(name)?,
        })
    }

    pub fn netns_del(name: &str) -> Result<Command, Error> {
        Ok(Command::NetnsDel {
            name: validate(name)?,
        })
    }

    pub fn netns_del_if_exists(name: &str) -> Result<Command, Error> {
        Ok(Command::NetnsDelIfExists {
            name: validate(name)?,
        })
    }

    pub fn netns_exec_if_up(netns: &str, ifname: &str) -> Result<Command, Error> {
        Ok(Command::NetnsExecIfUp {
            netns: validate(netns)?,
            ifname: validate(ifname)?,
        })
    }

    pub fn netns_exec_restore(
        netns: &str,
        ifname: &str,
    ) -> Result<Command, Error> {
        Ok(Command::NetnsExecRestore {
            netns: validate(netns)?,
            ifname: validate(ifname)?,
        })
    }

    pub fn vrf_add(name: &str, table: u32) -> Result<Command, Error> {
        Ok(Command::VrfAdd {
            name: validate(name)?,
            table,
        })
    }

    pub fn rule_add(
        selector: RuleSelector,
        vrf: &str,
        table: u32,
    ) -> Result<Command, Error> {
        Ok(Command::RuleAdd {
            selector,
            vrf: validate(vrf)?,
            table,
        })
    }

    pub fn rule_del(
        selector: RuleSelector,
        vrf: &str,
        table: u32,
    ) -> Result<Command, Error> {
        Ok(Command::RuleDel {
            selector,
            vrf: validate(vrf)?,
            table,
        })
    }

    pub fn link_up(ifname: &str) -> Result<Command, Error> {
        Ok(Command::LinkUp {
            ifname: validate(ifname)?,
        })
    }

    pub fn link_del(ifname: &str) -> Result<Command, Error> {
        Ok(Command::LinkDel {
            ifname: validate(ifname)?,
        })
    }

    pub fn link_set_netns(ifname: &str, netns: &str) -> Result<Command, Error> {
        Ok(Command::LinkSetNetns {
            ifname: validate(ifname)?,
            netns: validate(netns)?,
        })
    }

    pub fn link_set_master(
        ifname: &str,
        master: &str,
    ) -> Result<Command, Error> {
        Ok(Command::LinkSetMaster {
            ifname: validate(ifname)?,
            master: validate(master)?,
        })
    }

    pub fn link_set_nomaster(ifname: &str) -> Result<Command, Error> {
        Ok(Command::LinkSetNoMaster {
            ifname: validate(ifname)?,
        })
    }

    // Returns the interface on which this command enables MPLS input.
    pub fn mpls_enabled(&self) -> Option<&str> {
        match self {
            Command::MplsInput { ifname } => Some(ifname),
            _ => None,
        }
    }

    // Returns the interface this command moves into a VRF or namespace.
    pub fn attachment(&self) -> Option<Attachment<'_>> {
        match self {
            Command::LinkSetNetns { ifname, netns } => Some(Attachment {
                ifname,
                target: AttachTarget::Netns(netns),
            }),
            Command::LinkSetMaster { ifname, master } => Some(Attachment {
                ifname,
                target: AttachTarget::Master(master),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::PackageInfo(query) => write!(f, "{query}"),
            Command::MplsInput { ifname } => {
                write!(f, "echo 1 > /proc/sys/net/mpls/conf/{ifname}/input")
            }
            Command::NetnsAdd { name } => write!(f, "ip netns add {name}"),
            Command::NetnsDel { name } => write!(f, "ip netns delete {name}"),
            Command::NetnsDelIfExists { name } => write!(
                f,
                "if [ -e /var/run/netns/{name} ] ; then ip netns del {name} ; fi"
            ),
            Command::NetnsExecIfUp { netns, ifname } => {
                write!(f, "ip netns exec {netns} ifconfig {ifname} up")
            }
            Command::NetnsExecRestore { netns, ifname } => {
                write!(f, "ip netns exec {netns} ip link set {ifname} netns 1")
            }
            Command::VrfAdd { name, table } => {
                write!(f, "ip link add {name} type vrf table {table}")
            }
            Command::RuleAdd {
                selector,
                vrf,
                table,
            } => write!(f, "ip ru add {selector} {vrf} table {table}"),
            Command::RuleDel {
                selector,
                vrf,
                table,
            } => write!(f, "ip ru del {selector} {vrf} table {table}"),
            Command::LinkUp { ifname } => {
                write!(f, "ip link set dev {ifname} up")
            }
            Command::LinkDel { ifname } => write!(f, "ip link del {ifname}"),
            Command::LinkSetNetns { ifname, netns } => {
                write!(f, "ip link set dev {ifname} netns {netns}")
            }
            Command::LinkSetMaster { ifname, master } => {
                write!(f, "ip link set dev {ifname} master {master}")
            }
            Command::LinkSetNoMaster { ifname } => {
                write!(f, "ip link set dev {ifname} nomaster")
            }
        }
    }
}

// ===== impl PackageQuery =====

impl std::fmt::Display for PackageQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageQuery::AptPolicy(package) => {
                write!(f, "apt-cache policy {package}")
            }
            PackageQuery::YumInfo(package) => write!(f, "yum info {package}"),
        }
    }
}

// ===== impl RuleSelector =====

impl std::fmt::Display for RuleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSelector::Oif => write!(f, "oif"),
            RuleSelector::Iif => write!(f, "iif"),
        }
    }
}

// ===== helper functions =====

fn validate(name: &str) -> Result<String, Error> {
    if !ifname::is_valid(name) {
        return Err(Error::InvalidName(name.to_owned()));
    }
    Ok(name.to_owned())
}
