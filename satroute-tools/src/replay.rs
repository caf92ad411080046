//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

mod config;

use std::net::Ipv4Addr;
use std::rc::Rc;

use clap::{App, Arg};
use config::{Config, LoggingFmtStyle};
use satroute_ospf::error::Error;
use satroute_ospf::lsdb::AddressTable;
use satroute_ospf::packet::LsUpdate;
use satroute_ospf::packet::lsa::{Lsa, LsaBody};
use satroute_ospf::route::TopologyChange;
use satroute_ospf::router::Router;
use satroute_ospf::tasks::TimerEvent;
use satroute_utils::sim::{EventQueue, SimTime};
use satroute_utils::southbound::SharedRoutingTable;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

// Single line of a record file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordMsg {
    // Simulated time (in milliseconds) at which the event is delivered.
    time_ms: u64,
    event: RecordEvent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RecordEvent {
    Interfaces(AddressTable),
    LsUpdate(LsUpdate),
    Originate(LsaBody),
    TopologyChange(TopologyChange),
}

fn init_tracing(config: &config::Logging) {
    // Enable logging to stderr. Stdout is reserved for the routing table.
    let stderr = config.stderr.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(config.stderr.show_source)
            .with_line_number(config.stderr.show_source)
            .with_ansi(config.stderr.colors);
        let layer = match config.stderr.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("satroute=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr)
        .init();
}

fn start_router(
    config: &Config,
    queue: &Rc<EventQueue<TimerEvent>>,
    table: &SharedRoutingTable,
) -> Router {
    let flood = |lsas: &[Lsa], src: Ipv4Addr, dst: Ipv4Addr| {
        for lsa in lsas {
            let key = lsa.hdr.key();
            info!(%src, %dst, %key, age = %lsa.hdr.age, "flooding LSA");
        }
    };
    let calc_time = |node_id: u32, timestamp: SimTime, duration_ns: f64| {
        debug!(%node_id, %timestamp, %duration_ns, "route calculation");
    };

    Router::new(
        config.router_id,
        config.lsdb.clone(),
        config.route.clone(),
        queue.clone(),
        Box::new(flood),
        Box::new(table.clone()),
        Box::new(calc_time),
    )
}

// Fires every timer due at or before `deadline`.
fn run_timers(
    router: &mut Router,
    queue: &EventQueue<TimerEvent>,
    deadline: SimTime,
) {
    while let Some((_, event)) = queue.pop_until(deadline) {
        router.process_timer(event);
    }
}

// Fires timers until no computed table is waiting to be installed.
fn run_pending_tables(router: &mut Router, queue: &EventQueue<TimerEvent>) {
    while router.route_builder().pending_count() > 0 {
        let Some((_, event)) = queue.pop() else {
            break;
        };
        router.process_timer(event);
    }
}

fn process_event(
    router: &mut Router,
    event: RecordEvent,
) -> Result<(), Error> {
    match event {
        RecordEvent::Interfaces(addresses) => {
            router.reset_interfaces(addresses)
        }
        RecordEvent::LsUpdate(pkt) => router.process_update(pkt),
        RecordEvent::Originate(body) => {
            let lsa = router.originate(body)?;
            let key = lsa.hdr.key();
            info!(%key, seq_no = %lsa.hdr.seq_no, "originated LSA");
            Ok(())
        }
        RecordEvent::TopologyChange(change) => {
            router.topology_changed(change)
        }
    }
}

fn replay(
    config: &Config,
    filename: &str,
    until: Option<SimTime>,
) -> Result<SharedRoutingTable, String> {
    let queue = Rc::new(EventQueue::new());
    let table = SharedRoutingTable::default();
    let mut router = start_router(config, &queue, &table);

    // Push events from the record file.
    let record = std::fs::read_to_string(filename)
        .map_err(|error| format!("unable to read record file: {error}"))?;
    let mut last_time = SimTime::ZERO;
    for (idx, line) in record.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let msg: RecordMsg = serde_json::from_str(line).map_err(|error| {
            format!("failed to parse record (line {}): {error}", idx + 1)
        })?;

        let time = SimTime::from_millis(msg.time_ms);
        run_timers(&mut router, &queue, time);
        last_time = time;

        if let Err(error) = process_event(&mut router, msg.event) {
            error.log();
            return Err(format!("replay aborted (line {})", idx + 1));
        }
    }

    // Let pending timers fire. By default, run until every computed table
    // is installed.
    match until {
        Some(until) => run_timers(&mut router, &queue, until),
        None => {
            run_timers(&mut router, &queue, last_time);
            run_pending_tables(&mut router, &queue);
        }
    }

    Ok(table)
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Replay routing events")
        .about("Replay routing events from a record file")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .arg(
            Arg::with_name("until")
                .long("until")
                .value_name("MILLISECONDS")
                .help("Simulated time up to which timers are run"),
        )
        .arg(
            Arg::with_name("FILENAME")
                .help("Record file path")
                .required(true)
                .index(1),
        )
        .get_matches();
    let until = match matches.value_of("until").map(str::parse::<u64>) {
        Some(Ok(until)) => Some(SimTime::from_millis(until)),
        Some(Err(error)) => {
            eprintln!("Invalid simulated time: {error}");
            std::process::exit(1);
        }
        None => None,
    };
    let Some(filename) = matches.value_of("FILENAME") else {
        eprintln!("Missing record file");
        std::process::exit(1);
    };

    // Read configuration file.
    let config = Config::load(matches.value_of("config"));

    // Initialize tracing.
    init_tracing(&config.logging);

    // Replay events.
    let table = match replay(&config, filename, until) {
        Ok(table) => table,
        Err(error) => {
            error!(%error, "failed to replay events");
            std::process::exit(1);
        }
    };

    // Dump the resulting routing table.
    match serde_json::to_string_pretty(&table.entries()) {
        Ok(output) => println!("{output}"),
        Err(error) => {
            error!(%error, "failed to serialize routing table");
            std::process::exit(1);
        }
    }
}

// ===== unit tests =====
