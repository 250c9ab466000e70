//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use vpnlab_fixture::Error;
use vpnlab_fixture::config::FixtureConfig;
use vpnlab_fixture::fixtures::{Fixture, L3vpn, OspfVrf};
use vpnlab_fixture::topology::{Port, Topogen, Topology, TopologyBuilder};

//
// Helper functions.
//

fn build(fixture: &dyn Fixture, has_mpls: bool) -> Topology {
    let mut tgen = TopologyBuilder::new(has_mpls);
    fixture.build_topo(&mut tgen).unwrap();
    tgen.build()
}

fn interfaces<'a>(topology: &'a Topology, router: &str) -> Vec<&'a str> {
    topology
        .router(router)
        .unwrap()
        .interfaces
        .iter()
        .map(String::as_str)
        .collect()
}

fn ports(topology: &Topology, switch: &str) -> Vec<(String, String)> {
    topology
        .switch(switch)
        .unwrap()
        .ports
        .iter()
        .map(|port| (port.node.clone(), port.ifname.clone()))
        .collect()
}

fn port(node: &str, ifname: &str) -> (String, String) {
    (node.to_owned(), ifname.to_owned())
}

//
// Tests.
//

#[test]
fn l3vpn_without_mpls() {
    let fixture = L3vpn::new(FixtureConfig::default());
    let topology = build(&fixture, false);

    assert_eq!(topology.router_names().collect::<Vec<_>>(), ["r1"]);
    assert!(topology.switches.is_empty());
    assert!(topology.links.is_empty());
    assert!(interfaces(&topology, "r1").is_empty());
}

#[test]
fn l3vpn_with_mpls() {
    let fixture = L3vpn::new(FixtureConfig::default());
    let topology = build(&fixture, true);

    assert_eq!(
        topology.router_names().collect::<Vec<_>>(),
        ["r1", "r2", "r3", "r4", "ce1", "ce2", "ce3", "ce4"]
    );
    assert_eq!(
        topology
            .switches
            .iter()
            .map(|switch| switch.name.as_str())
            .collect::<Vec<_>>(),
        ["sw0", "sw1", "sw2"]
    );

    // CE/PE links.
    assert_eq!(topology.links.len(), 4);
    let link = &topology.links[3];
    assert_eq!(
        link.a,
        Port {
            node: "ce4".to_owned(),
            ifname: "ce4-eth0".to_owned(),
        }
    );
    assert_eq!(
        link.b,
        Port {
            node: "r4".to_owned(),
            ifname: "r4-eth5".to_owned(),
        }
    );

    // Provider core.
    assert_eq!(
        ports(&topology, "sw0"),
        [port("r1", "r1-eth0"), port("r2", "r2-eth0")]
    );
    assert_eq!(
        ports(&topology, "sw1"),
        [
            port("r2", "r2-eth1"),
            port("r3", "r3-eth0"),
            port("r4", "r4-eth0")
        ]
    );
    assert_eq!(
        ports(&topology, "sw2"),
        [port("r2", "r2-eth2"), port("r3", "r3-eth1")]
    );

    assert_eq!(interfaces(&topology, "r1"), ["r1-eth4", "r1-eth0"]);
    assert_eq!(
        interfaces(&topology, "r2"),
        ["r2-eth0", "r2-eth1", "r2-eth2"]
    );
    assert_eq!(
        interfaces(&topology, "r4"),
        ["r4-eth4", "r4-eth5", "r4-eth0"]
    );
    assert_eq!(interfaces(&topology, "ce2"), ["ce2-eth0"]);
}

#[test]
fn l3vpn_json() {
    let fixture = L3vpn::new(FixtureConfig::default());
    let topology = build(&fixture, true);

    let value = serde_json::to_value(&topology).unwrap();
    assert_eq!(value["routers"][4]["name"], "ce1");
    assert_eq!(value["switches"][1]["ports"][2]["ifname"], "r4-eth0");
    assert_eq!(value["links"][0]["b"]["ifname"], "r1-eth4");

    let decoded: Topology = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, topology);
}

#[test]
fn ospf_vrf_auto_ifnames() {
    let fixture = OspfVrf::new(FixtureConfig::default());

    // MPLS plays no role in this topology.
    for has_mpls in [false, true] {
        let topology = build(&fixture, has_mpls);

        assert_eq!(
            topology.router_names().collect::<Vec<_>>(),
            ["r1", "r2", "r3"]
        );
        assert_eq!(interfaces(&topology, "r1"), ["r1-eth0", "r1-eth1"]);
        assert_eq!(interfaces(&topology, "r2"), ["r2-eth0", "r2-eth1"]);
        assert_eq!(interfaces(&topology, "r3"), ["r3-eth0", "r3-eth1"]);
        assert_eq!(ports(&topology, "s1"), [port("r1", "r1-eth0")]);
        assert_eq!(
            ports(&topology, "s3"),
            [
                port("r1", "r1-eth1"),
                port("r2", "r2-eth1"),
                port("r3", "r3-eth0")
            ]
        );
        assert_eq!(ports(&topology, "s4"), [port("r3", "r3-eth1")]);
        assert!(topology.links.is_empty());
    }
}

#[test]
fn duplicate_nodes() {
    let mut tgen = TopologyBuilder::new(true);
    tgen.add_router("r1").unwrap();

    assert!(matches!(
        tgen.add_router("r1"),
        Err(Error::DuplicateNode(name)) if name == "r1"
    ));
    assert!(matches!(tgen.add_switch("r1"), Err(Error::DuplicateNode(_))));
    assert!(matches!(tgen.add_router(""), Err(Error::InvalidName(_))));
}

#[test]
fn unknown_nodes() {
    let mut tgen = TopologyBuilder::new(true);
    tgen.add_router("r1").unwrap();
    tgen.add_switch("sw0").unwrap();

    assert!(matches!(
        tgen.add_link("r1", "r9", "r1-eth0", "r9-eth0"),
        Err(Error::UnknownNode(name)) if name == "r9"
    ));
    assert!(matches!(
        tgen.add_switch_link("sw9", "r1", None),
        Err(Error::UnknownSwitch(_))
    ));
    assert!(matches!(
        tgen.add_switch_link("sw0", "r9", None),
        Err(Error::UnknownNode(_))
    ));

    // Failed declarations leave no trace.
    let topology = tgen.build();
    assert!(topology.links.is_empty());
    assert!(topology.router("r1").unwrap().interfaces.is_empty());
    assert!(topology.switch("sw0").unwrap().ports.is_empty());
}

#[test]
fn duplicate_interfaces() {
    let mut tgen = TopologyBuilder::new(true);
    tgen.add_router("r1").unwrap();
    tgen.add_router("r2").unwrap();
    tgen.add_switch("sw0").unwrap();
    tgen.add_switch_link("sw0", "r2", None).unwrap();

    // The r2 side clashes, so r1-eth0 must not be allocated either.
    assert!(matches!(
        tgen.add_link("r1", "r2", "r1-eth0", "r2-eth0"),
        Err(Error::DuplicateInterface(node, ifname))
            if node == "r2" && ifname == "r2-eth0"
    ));
    assert_eq!(tgen.add_switch_link("sw0", "r1", None).unwrap(), "r1-eth0");
    assert!(matches!(
        tgen.add_switch_link("sw0", "r1", Some("r1-eth0")),
        Err(Error::DuplicateInterface(..))
    ));
    assert!(matches!(
        tgen.add_switch_link("sw0", "r1", Some("r1-a-very-long-name")),
        Err(Error::InvalidName(_))
    ));

    let topology = tgen.build();
    assert_eq!(topology.router("r1").unwrap().interfaces, ["r1-eth0"]);
}
