//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;

use std::path::Path;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use config::{Config, LoggingFileRotation, LoggingFmtStyle};
use nix::unistd::Uid;
use pickledb::{PickleDb, PickleDbDumpPolicy, SerializationMethod};
use regex::Regex;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;
use vpnlab_fixture::fixtures::{self, Fixture, InitStatus};
use vpnlab_fixture::gate::GateDecision;
use vpnlab_fixture::netns::NetnsLab;
use vpnlab_fixture::runner::CmdRunner;
use vpnlab_fixture::topology::TopologyBuilder;
use vpnlab_utils::sysctl;
use vpnlab_utils::version::CmpOp;

// Exit code telling test harnesses that the test was skipped.
const EXIT_SKIP: i32 = 77;

fn init_tracing(config: &config::Logging) {
    // Enable logging to journald.
    let journald = config.journald.enabled.then(|| {
        tracing_journald::layer().unwrap_or_else(|error| {
            eprintln!("couldn't connect to journald: {error}");
            std::process::exit(1);
        })
    });

    // Enable logging to a file.
    let file = config.file.enabled.then(|| {
        let file_appender = match config.file.rotation {
            LoggingFileRotation::Never => {
                rolling::never(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Hourly => {
                rolling::hourly(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Daily => {
                rolling::daily(&config.file.dir, &config.file.name)
            }
        };

        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(false)
            .with_thread_ids(config.file.fmt.show_thread_id)
            .with_file(config.file.fmt.show_source)
            .with_line_number(config.file.fmt.show_source)
            .with_ansi(config.file.fmt.colors);
        let layer = match config.file.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    // Enable logging to stderr.
    let stderr = config.stderr.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(config.stderr.fmt.show_thread_id)
            .with_file(config.stderr.fmt.show_source)
            .with_line_number(config.stderr.fmt.show_source)
            .with_ansi(config.stderr.fmt.colors);
        let layer = match config.stderr.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vpnlab=debug"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(journald)
        .with(file)
        .with(stderr)
        .init();
}

fn init_db<P: AsRef<Path>>(
    path: P,
) -> Result<PickleDb, pickledb::error::Error> {
    let dump_policy = PickleDbDumpPolicy::AutoDump;
    let serialization_method = SerializationMethod::Bin;
    match path.as_ref().exists() {
        true => PickleDb::load(path, dump_policy, serialization_method),
        false => Ok(PickleDb::new(path, dump_policy, serialization_method)),
    }
}

fn open_db(config: &Config) -> PickleDb {
    let path = Path::new(&config.database_path);
    if let Some(dir) = path.parent()
        && let Err(error) = std::fs::create_dir_all(dir)
    {
        warn!(dir = %dir.display(), %error, "failed to create database directory");
    }

    match init_db(path) {
        Ok(db) => db,
        Err(error) => {
            error!(%error, "failed to initialize non-volatile storage");
            std::process::exit(1);
        }
    }
}

fn need_root() {
    if !Uid::effective().is_root() {
        eprintln!("need privileged user");
        std::process::exit(1);
    }
}

fn build_version() -> String {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    match rustc_tools_util::get_version_info!().commit_hash {
        Some(hash) => format!("{VERSION} ({hash})"),
        None => VERSION.to_owned(),
    }
}

fn fixture_arg() -> Arg<'static, 'static> {
    Arg::with_name("fixture")
        .required(true)
        .possible_values(&fixtures::NAMES)
        .help("Fixture name.")
}

fn fixture(matches: &ArgMatches<'_>, config: &Config) -> Box<dyn Fixture> {
    let name = matches.value_of("fixture").unwrap_or_default();
    match fixtures::by_name(name, &config.fixture) {
        Some(fixture) => fixture,
        None => {
            eprintln!("unknown fixture: {name}");
            std::process::exit(1);
        }
    }
}

// Initialization status stored by the last `setup` run.
fn stored_status(db: &PickleDb, fixture: &str) -> InitStatus {
    db.get::<InitStatus>(fixture)
        .unwrap_or_else(|| InitStatus::Failed {
            reason: "fixture not set up".to_owned(),
        })
}

// ===== subcommands =====

fn cmd_topology(matches: &ArgMatches<'_>, config: &Config) -> i32 {
    let fixture = fixture(matches, config);
    let mut tgen = TopologyBuilder::new(sysctl::mpls_available());
    if let Err(error) = fixture.build_topo(&mut tgen) {
        error.log();
        return 1;
    }

    match serde_json::to_string_pretty(&tgen.build()) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(error) => {
            error!(%error, "failed to encode topology");
            1
        }
    }
}

async fn cmd_setup(matches: &ArgMatches<'_>, config: &Config) -> i32 {
    let fixture = fixture(matches, config);
    let lab = NetnsLab::new(&config.netns_prefix);

    let report = fixture.pre_router_start(&lab).await;
    fixture.post_router_start(&lab).await;

    let mut db = open_db(config);
    if let Err(error) = db.set(fixture.name(), &report.status) {
        error!(%error, "failed to store initialization status");
    }

    println!("{}", report.status);
    match report.status.is_success() {
        true => 0,
        false => 1,
    }
}

async fn cmd_teardown(matches: &ArgMatches<'_>, config: &Config) -> i32 {
    let fixture = fixture(matches, config);
    let lab = NetnsLab::new(&config.netns_prefix);

    let mut db = open_db(config);
    if let Err(error) = db.rem(fixture.name()) {
        error!(%error, "failed to remove initialization status");
    }

    match fixture.teardown(&lab).await {
        Ok(tally) => {
            info!(output = tally.output, "teardown complete");
            0
        }
        Err(error) => {
            error.log();
            1
        }
    }
}

async fn cmd_check(matches: &ArgMatches<'_>, config: &Config) -> i32 {
    let fixture = fixture(matches, config);
    let lab = NetnsLab::new(&config.netns_prefix);

    let op = match matches.value_of("op").unwrap_or("<").parse::<CmpOp>() {
        Ok(op) => op,
        Err(error) => {
            eprintln!("{error}");
            return 1;
        }
    };
    let version = matches.value_of("VERSION").unwrap_or_default();
    let mut gate = config
        .fixture
        .gate(version)
        .op(op)
        .cli(matches.is_present("cli"));
    if let Some(router) = matches.value_of("router") {
        gate = gate.router(router);
    }
    if matches.is_present("no-kernel") {
        gate = gate.kernel(None);
    } else if let Some(kernel) = matches.value_of("kernel") {
        gate = gate.kernel(Some(kernel));
    }

    let db = open_db(config);
    let status = stored_status(&db, fixture.name());
    let decision = gate.check(&lab, &status).await;
    println!("{decision}");
    match decision {
        GateDecision::Proceed => 0,
        GateDecision::Skip(_) => EXIT_SKIP,
    }
}

async fn cmd_exec(matches: &ArgMatches<'_>, config: &Config) -> i32 {
    let lab = NetnsLab::new(&config.netns_prefix);
    let runner = CmdRunner::new(&lab);

    let pattern = match matches.value_of("match").map(Regex::new).transpose() {
        Ok(pattern) => pattern,
        Err(error) => {
            eprintln!("invalid pattern: {error}");
            return 1;
        }
    };
    let host = matches.value_of("host").unwrap_or_default();
    let command = matches.value_of("command").unwrap_or_default();

    match runner.run(host, command, pattern.as_ref()).await {
        Ok(outcome) => {
            if outcome.has_output() {
                println!("{}", outcome.output);
            }
            match outcome.matched {
                Some(false) => 1,
                _ => 0,
            }
        }
        Err(error) => {
            error.log();
            1
        }
    }
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("vpnlab")
        .about("MPLS L3VPN / VRF lab fixtures")
        .version(build_version().as_str())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .subcommand(
            SubCommand::with_name("topology")
                .about("Print the fixture topology as JSON")
                .arg(fixture_arg()),
        )
        .subcommand(
            SubCommand::with_name("setup")
                .about("Run the fixture start hooks")
                .arg(fixture_arg()),
        )
        .subcommand(
            SubCommand::with_name("teardown")
                .about("Undo the fixture configuration")
                .arg(fixture_arg()),
        )
        .subcommand(
            SubCommand::with_name("check")
                .about("Decide whether a gated test can run")
                .arg(fixture_arg())
                .arg(
                    Arg::with_name("VERSION")
                        .required(true)
                        .help("Routing software version to compare against."),
                )
                .arg(
                    Arg::with_name("op")
                        .long("op")
                        .value_name("op")
                        .possible_values(&["<", "<=", "=", "==", ">=", ">"])
                        .help("Skip when the router version compares so."),
                )
                .arg(
                    Arg::with_name("router")
                        .long("router")
                        .value_name("name")
                        .help("Router whose version is checked."),
                )
                .arg(
                    Arg::with_name("kernel")
                        .long("kernel")
                        .value_name("release")
                        .conflicts_with("no-kernel")
                        .help("Minimum kernel release."),
                )
                .arg(
                    Arg::with_name("no-kernel")
                        .long("no-kernel")
                        .help("Skip the kernel release check."),
                )
                .arg(
                    Arg::with_name("cli")
                        .long("cli")
                        .help("Open a debug shell after the checks."),
                ),
        )
        .subcommand(
            SubCommand::with_name("exec")
                .about("Run a command on an emulated host")
                .arg(Arg::with_name("host").required(true))
                .arg(Arg::with_name("command").required(true))
                .arg(
                    Arg::with_name("match")
                        .long("match")
                        .value_name("pattern")
                        .help("Pattern the output is expected to match."),
                ),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    // Initialize tracing.
    init_tracing(&config.logging);

    let (name, Some(sub_matches)) = matches.subcommand() else {
        std::process::exit(1);
    };

    // Everything but topology declaration touches the host network.
    if name != "topology" {
        need_root();
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(%error, "failed to create async runtime");
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(async {
        match name {
            "topology" => cmd_topology(sub_matches, &config),
            "setup" => cmd_setup(sub_matches, &config).await,
            "teardown" => cmd_teardown(sub_matches, &config).await,
            "check" => cmd_check(sub_matches, &config).await,
            "exec" => cmd_exec(sub_matches, &config).await,
            _ => 1,
        }
    });

    std::process::exit(code);
}
