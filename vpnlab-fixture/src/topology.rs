//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};
use vpnlab_utils::ifname;

use crate::error::Error;

/// Topology construction interface of the emulation framework.
///
/// Fixtures only declare nodes and links through this trait. Instantiating
/// them (namespaces, veth pairs, bridges) is left to the framework.
pub trait Topogen {
    // Whether the host supports MPLS forwarding.
    fn has_mpls(&self) -> bool;

    fn add_router(&mut self, name: &str) -> Result<(), Error>;

    fn add_switch(&mut self, name: &str) -> Result<(), Error>;

    // Adds a point-to-point link between two routers.
    fn add_link(
        &mut self,
        node1: &str,
        node2: &str,
        ifname1: &str,
        ifname2: &str,
    ) -> Result<(), Error>;

    // Connects a router to a switch. When `ifname` is `None`, the next free
    // `{router}-eth{n}` name is allocated. Returns the router-side interface
    // name.
    fn add_switch_link(
        &mut self,
        switch: &str,
        router: &str,
        ifname: Option<&str>,
    ) -> Result<String, Error>;
}

// Declared topology, as handed over to the emulation framework.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Topology {
    pub routers: Vec<Router>,
    pub switches: Vec<Switch>,
    pub links: Vec<Link>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Router {
    pub name: String,
    // Interfaces in declaration order.
    pub interfaces: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Switch {
    pub name: String,
    pub ports: Vec<Port>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Port {
    pub node: String,
    pub ifname: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Link {
    pub a: Port,
    pub b: Port,
}

// Topogen implementation that records declarations into a `Topology`.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    has_mpls: bool,
    topology: Topology,
}

// ===== impl Topology =====

impl Topology {
    pub fn router(&self, name: &str) -> Option<&Router> {
        self.routers.iter().find(|router| router.name == name)
    }

    pub fn switch(&self, name: &str) -> Option<&Switch> {
        self.switches.iter().find(|switch| switch.name == name)
    }

    pub fn router_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.routers.iter().map(|router| router.name.as_str())
    }

    fn router_mut(&mut self, name: &str) -> Result<&mut Router, Error> {
        self.routers
            .iter_mut()
            .find(|router| router.name == name)
            .ok_or_else(|| Error::UnknownNode(name.to_owned()))
    }

    fn contains_node(&self, name: &str) -> bool {
        self.router(name).is_some() || self.switch(name).is_some()
    }
}

// ===== impl Router =====

impl Router {
    fn add_interface(&mut self, ifname: &str) -> Result<(), Error> {
        if !ifname::is_valid(ifname) {
            return Err(Error::InvalidName(ifname.to_owned()));
        }
        if self.interfaces.iter().any(|iface| iface == ifname) {
            return Err(Error::DuplicateInterface(
                self.name.clone(),
                ifname.to_owned(),
            ));
        }
        self.interfaces.push(ifname.to_owned());
        Ok(())
    }

    fn next_ifname(&self) -> String {
        format!("{}-eth{}", self.name, self.interfaces.len())
    }
}

// ===== impl TopologyBuilder =====

impl TopologyBuilder {
    pub fn new(has_mpls: bool) -> TopologyBuilder {
        TopologyBuilder {
            has_mpls,
            topology: Default::default(),
        }
    }

    pub fn build(self) -> Topology {
        self.topology
    }

    fn check_new_node(&self, name: &str) -> Result<(), Error> {
        if !ifname::is_valid(name) {
            return Err(Error::InvalidName(name.to_owned()));
        }
        if self.topology.contains_node(name) {
            return Err(Error::DuplicateNode(name.to_owned()));
        }
        Ok(())
    }
}

impl Topogen for TopologyBuilder {
    fn has_mpls(&self) -> bool {
        self.has_mpls
    }

    fn add_router(&mut self, name: &str) -> Result<(), Error> {
        self.check_new_node(name)?;
        self.topology.routers.push(Router {
            name: name.to_owned(),
            interfaces: Vec::new(),
        });
        Ok(())
    }

    fn add_switch(&mut self, name: &str) -> Result<(), Error> {
        self.check_new_node(name)?;
        self.topology.switches.push(Switch {
            name: name.to_owned(),
            ports: Vec::new(),
        });
        Ok(())
    }

    fn add_link(
        &mut self,
        node1: &str,
        node2: &str,
        ifname1: &str,
        ifname2: &str,
    ) -> Result<(), Error> {
        // Check both ends before touching either router.
        for node in [node1, node2] {
            if self.topology.router(node).is_none() {
                return Err(Error::UnknownNode(node.to_owned()));
            }
        }

        self.topology.router_mut(node1)?.add_interface(ifname1)?;
        if let Err(error) =
            self.topology.router_mut(node2)?.add_interface(ifname2)
        {
            self.topology.router_mut(node1)?.interfaces.pop();
            return Err(error);
        }

        self.topology.links.push(Link {
            a: Port {
                node: node1.to_owned(),
                ifname: ifname1.to_owned(),
            },
            b: Port {
                node: node2.to_owned(),
                ifname: ifname2.to_owned(),
            },
        });
        Ok(())
    }

    fn add_switch_link(
        &mut self,
        switch: &str,
        router: &str,
        ifname: Option<&str>,
    ) -> Result<String, Error> {
        if self.topology.switch(switch).is_none() {
            return Err(Error::UnknownSwitch(switch.to_owned()));
        }

        let router = self.topology.router_mut(router)?;
        let ifname = match ifname {
            Some(ifname) => ifname.to_owned(),
            None => router.next_ifname(),
        };
        router.add_interface(&ifname)?;
        let port = Port {
            node: router.name.clone(),
            ifname: ifname.clone(),
        };

        if let Some(switch) = self
            .topology
            .switches
            .iter_mut()
            .find(|sw| sw.name == switch)
        {
            switch.ports.push(port);
        }
        Ok(ifname)
    }
}
