//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use maplit::btreemap;
use regex::Regex;
use vpnlab_fixture::command::Command;
use vpnlab_fixture::runner::{CmdRunner, CmdTally};
use vpnlab_fixture::test::setup;
use vpnlab_fixture::test::stub::StubLab;
use vpnlab_fixture::ExecError;

fn lab() -> StubLab {
    let outputs = btreemap! {
        "ip -V" => "ip utility, iproute2-5.15.0, libbpf 0.5.0\n",
        "cat /proc/sys/net/mpls/platform_labels" => "  100000  ",
        "ip netns add r1-cust1" => "Cannot create namespace file",
    };
    outputs
        .into_iter()
        .fold(StubLab::new(true), |lab, (cmd, output)| {
            lab.with_output("r1", cmd, output)
        })
}

#[tokio::test]
async fn pattern_match() {
    setup();
    let lab = lab();
    let runner = CmdRunner::new(&lab);
    let pattern = Regex::new("iproute2-[0-9]+").unwrap();

    let outcome = runner.run("r1", "ip -V", Some(&pattern)).await.unwrap();
    assert_eq!(outcome.matched, Some(true));
    assert_eq!(outcome.output, "ip utility, iproute2-5.15.0, libbpf 0.5.0");

    let outcome = runner
        .run("r1", "cat /proc/sys/net/mpls/platform_labels", Some(&pattern))
        .await
        .unwrap();
    assert_eq!(outcome.matched, Some(false));
    assert_eq!(outcome.output, "100000");
}

#[tokio::test]
async fn no_output() {
    setup();
    let lab = lab();
    let runner = CmdRunner::new(&lab);
    let pattern = Regex::new(".*").unwrap();

    // The pattern is never evaluated against empty output.
    let outcome = runner
        .run("r1", "ip link set dev r1-eth4 up", Some(&pattern))
        .await
        .unwrap();
    assert!(!outcome.has_output());
    assert_eq!(outcome.matched, None);
}

#[tokio::test]
async fn tally() {
    setup();
    let lab = lab();
    let runner = CmdRunner::new(&lab);
    let pattern = Regex::new("iproute2").unwrap();

    let mut outcomes = vec![];
    for (cmd, pattern) in [
        ("ip -V", Some(&pattern)),
        ("cat /proc/sys/net/mpls/platform_labels", Some(&pattern)),
        ("ip netns add r1-cust1", None),
        ("ip link set dev r1-eth4 up", None),
        ("ip link set dev r1-eth0 up", Some(&pattern)),
    ] {
        outcomes.push(runner.run("r1", cmd, pattern).await.unwrap());
    }

    assert_eq!(
        outcomes.iter().collect::<CmdTally>(),
        CmdTally {
            matched: 1,
            nomatch: 1,
            output: 3,
            none: 3,
        }
    );
}

#[tokio::test]
async fn typed_command() {
    setup();
    let lab = lab();
    let runner = CmdRunner::new(&lab);

    let cmd = Command::netns_add("r1-cust1").unwrap();
    let outcome = runner.run_cmd("r1", &cmd).await.unwrap();
    assert_eq!(outcome.command, "ip netns add r1-cust1");
    assert!(outcome.has_output());
    assert_eq!(outcome.matched, None);
    assert_eq!(lab.executed(), [("r1".to_owned(), outcome.command)]);
}

#[tokio::test]
async fn exec_failure() {
    setup();
    let lab = StubLab::new(true).with_failure("r3", "ip netns add r3-cust1");
    let runner = CmdRunner::new(&lab);

    let error = runner
        .run("r3", "ip netns add r3-cust1", None)
        .await
        .unwrap_err();
    assert!(matches!(error, ExecError::SpawnError(ref host, _) if host == "r3"));
    assert_eq!(error.to_string(), "failed to run command on r3");
}
