//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::path::{Path, PathBuf};

use satroute_ospf::config::PrecomputedCfg;
use satroute_ospf::precomputed::{
    ChangeKey, PrecomputedRoute, PrecomputedTable,
};

use super::*;

const TIME_0: &str = "\
# Routes at time 0
0
1,0,0,1,1
1,2,2,2,1
1,3,2,2,1
0,2,1,1,1
";

const GROUND_3_ON_0: &str = "\
20
1,0,0,1,1
1,2,2,2,1
1,3,0,1,1
";

const GROUND_3_ON_1: &str = "\
15
1,3,2,2,1
";

//
// Helper functions.
//

// Creates an empty directory holding the precomputed tables of a test.
fn base_path(test_name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "satroute-precomputed-{}-{}",
        std::process::id(),
        test_name
    ));
    let _ = std::fs::remove_dir_all(&path);
    std::fs::create_dir_all(&path).unwrap();
    path
}

fn write_table(base_path: &Path, change: ChangeKey, content: &str) {
    let path = change.file_path(base_path, 1);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn precomputed_router(base_path: &Path) -> TestRouter {
    let mut test = test_router(RouteCfg {
        satellite_count: 3,
        ground_station_count: 1,
        precomputed: Some(PrecomputedCfg {
            base_path: base_path.to_owned(),
        }),
        ..Default::default()
    });
    test.router.reset_interfaces(line_addresses()).unwrap();
    test
}

// Line topology with ground station 3 attached to satellite 2.
fn ground_topology() -> LsUpdate {
    let mut update = line_topology();
    update.lsas[2] = router_lsa(
        2,
        1,
        0,
        &[(1, ip4!("10.0.12.2")), (3, ip4!("10.0.23.2"))],
    );
    update
        .lsas
        .push(router_lsa(3, 1, 0, &[(2, ip4!("10.0.23.3"))]));
    update
}

//
// Tests.
//

#[test]
fn test_change_key_file_path() {
    let base = Path::new("/srv/sim");
    assert_eq!(
        ChangeKey::Initial.file_path(base, 7),
        Path::new("/srv/sim/config_topology/network_state/time_0/node_7.txt")
    );
    assert_eq!(
        ChangeKey::Attachment {
            ground: 12,
            satellite: 3
        }
        .file_path(base, 7),
        Path::new("/srv/sim/config_topology/network_state/12,3/node_7.txt")
    );
}

#[test]
fn test_parse() {
    let table =
        PrecomputedTable::parse(Path::new("node_1.txt"), TIME_0, 1).unwrap();
    assert_eq!(table.time_step, 0);
    assert_eq!(
        table.routes,
        vec![
            PrecomputedRoute::new(1, 0, 0, 1, 1),
            PrecomputedRoute::new(1, 2, 2, 2, 1),
            PrecomputedRoute::new(1, 3, 2, 2, 1),
        ]
    );
}

#[test]
fn test_parse_errors() {
    let path = Path::new("node_1.txt");

    // Row with a missing field.
    let error = PrecomputedTable::parse(path, "# header\n0\n1,2,2,2\n", 1)
        .unwrap_err();
    assert!(matches!(error, Error::PrecomputedRouteParse(_, 3, _)));

    // Non-numeric field.
    let error =
        PrecomputedTable::parse(path, "0\n1,2,x,2,1\n", 1).unwrap_err();
    assert!(matches!(error, Error::PrecomputedRouteParse(_, 2, _)));

    // Invalid time step.
    let error = PrecomputedTable::parse(path, "1,2,2,2,1\n", 1).unwrap_err();
    assert!(matches!(error, Error::PrecomputedRouteParse(_, 1, _)));

    // Missing time step.
    let error = PrecomputedTable::parse(path, "# empty\n\n", 1).unwrap_err();
    assert!(matches!(error, Error::PrecomputedRouteParse(_, 0, _)));
}

#[test]
fn test_initial_table() {
    let base = base_path("initial");
    write_table(&base, ChangeKey::Initial, TIME_0);

    let mut test = precomputed_router(&base);
    test.router.process_update(ground_topology()).unwrap();

    // Row 0,2 belongs to another router and is ignored.
    assert_eq!(
        test.table.entries(),
        vec![
            route_via_0(ip4!("10.0.10.0")),
            route_via_2(ip4!("10.0.12.2")),
            route_via_2(ip4!("10.0.23.2")),
            route_via_2(ip4!("10.0.23.3")),
        ]
    );
    // No SPF run took place.
    assert!(test.calc_times.borrow().is_empty());
}

#[test]
fn test_unknown_destination_skipped() {
    let base = base_path("unknown-destination");
    write_table(&base, ChangeKey::Initial, TIME_0);

    // Ground station 3 didn't originate its LSA yet.
    let mut test = precomputed_router(&base);
    test.router.process_update(line_topology()).unwrap();

    assert_eq!(
        test.table.entries(),
        vec![
            route_via_0(ip4!("10.0.10.0")),
            route_via_2(ip4!("10.0.12.2")),
        ]
    );
}

#[test]
fn test_attachment_change() {
    let base = base_path("attachment-change");
    write_table(&base, ChangeKey::Initial, TIME_0);
    let change = ChangeKey::Attachment {
        ground: 3,
        satellite: 0,
    };
    write_table(&base, change, GROUND_3_ON_0);

    let mut test = precomputed_router(&base);
    test.router.process_update(ground_topology()).unwrap();
    assert_eq!(
        test.table.lookup(ip4!("10.0.23.3")),
        Some(route_via_2(ip4!("10.0.23.3")))
    );

    test.router
        .topology_changed(TopologyChange::new(3, 0))
        .unwrap();
    assert_eq!(
        test.table.lookup(ip4!("10.0.23.3")),
        Some(route_via_0(ip4!("10.0.23.3")))
    );
    assert_eq!(test.table.len(), 4);
}

#[test]
fn test_older_time_step_ignored() {
    let base = base_path("older-time-step");
    write_table(&base, ChangeKey::Initial, TIME_0);
    let change = ChangeKey::Attachment {
        ground: 3,
        satellite: 0,
    };
    write_table(&base, change, GROUND_3_ON_0);
    let change = ChangeKey::Attachment {
        ground: 3,
        satellite: 1,
    };
    write_table(&base, change, GROUND_3_ON_1);

    let mut test = precomputed_router(&base);
    test.router.process_update(ground_topology()).unwrap();
    test.router
        .topology_changed(TopologyChange::new(3, 0))
        .unwrap();

    // Time step 15 is older than the installed table (20).
    test.router
        .topology_changed(TopologyChange::new(3, 1))
        .unwrap();
    assert_eq!(
        test.table.lookup(ip4!("10.0.23.3")),
        Some(route_via_0(ip4!("10.0.23.3")))
    );
    assert_eq!(test.table.len(), 4);
}

#[test]
fn test_missing_file() {
    let base = base_path("missing-file");

    let mut test = precomputed_router(&base);
    let error = test.router.process_update(ground_topology()).unwrap_err();
    assert!(matches!(error, Error::PrecomputedRouteIo(..)));
    assert!(test.table.is_empty());
}

#[test]
fn test_missing_nexthop_addr() {
    let base = base_path("missing-nexthop");
    write_table(&base, ChangeKey::Initial, "0\n1,2,5,3,1\n");

    let mut test = precomputed_router(&base);
    let error = test.router.process_update(ground_topology()).unwrap_err();
    assert!(matches!(error, Error::NexthopAddrNotFound(..)));
}

#[test]
fn test_attachment_change_from_lsdb() {
    let base = base_path("attachment-change-lsdb");
    write_table(&base, ChangeKey::Initial, TIME_0);
    let change = ChangeKey::Attachment {
        ground: 3,
        satellite: 0,
    };
    write_table(&base, change, GROUND_3_ON_0);

    let mut test = precomputed_router(&base);
    test.router.process_update(ground_topology()).unwrap();

    // Ground station 3 moves from satellite 2 to satellite 0.
    let update = LsUpdate {
        lsas: vec![router_lsa(3, 2, 0, &[(0, ip4!("10.0.30.3"))])],
    };
    test.router.process_update(update).unwrap();
    assert_eq!(
        test.table.lookup(ip4!("10.0.30.3")),
        Some(route_via_0(ip4!("10.0.30.3")))
    );
    assert_eq!(test.table.lookup(ip4!("10.0.23.3")), None);
    assert_eq!(test.table.len(), 4);
}

#[test]
fn test_signalled_attachment_confirmed() {
    let base = base_path("signalled-attachment-confirmed");
    write_table(&base, ChangeKey::Initial, TIME_0);
    let change = ChangeKey::Attachment {
        ground: 3,
        satellite: 0,
    };
    write_table(&base, change, GROUND_3_ON_0);

    let mut test = precomputed_router(&base);
    test.router.process_update(ground_topology()).unwrap();
    test.router
        .topology_changed(TopologyChange::new(3, 0))
        .unwrap();
    assert_eq!(
        test.table.lookup(ip4!("10.0.23.3")),
        Some(route_via_0(ip4!("10.0.23.3")))
    );

    // Unrelated LSDB updates received before the confirmation don't revert
    // the attachment.
    let update = LsUpdate {
        lsas: vec![router_lsa(
            0,
            2,
            0,
            &[(1, ip4!("10.0.10.0")), (4, ip4!("10.0.40.0"))],
        )],
    };
    test.router.process_update(update).unwrap();

    // The LSA confirming the change doesn't load the table again.
    std::fs::remove_file(change.file_path(&base, 1)).unwrap();
    let update = LsUpdate {
        lsas: vec![router_lsa(3, 2, 0, &[(0, ip4!("10.0.30.3"))])],
    };
    test.router.process_update(update).unwrap();
    assert_eq!(
        test.table.lookup(ip4!("10.0.23.3")),
        Some(route_via_0(ip4!("10.0.23.3")))
    );
    assert_eq!(test.table.len(), 4);
}
