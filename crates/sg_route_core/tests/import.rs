mod common;

use chrono::Duration;
use rusqlite::Connection;

use sg_route_core::db::import::{
    ImportMode, ImportStats, import_carparks_csv, import_incidents_csv, import_roadworks_csv,
};
use sg_route_core::db::{SqliteStore, migrate, status};
use sg_route_core::parking::ParkingProximityResolver;
use sg_route_core::signals::TrafficSignalExtractor;

use common::{FakeGeocoder, memory_store, now};

const INCIDENTS: &str = "\
Type,Latitude,Longitude,Message,Timestamp
Accident,1.3316,103.8453,(05/03)08:10 Accident on PIE (towards Changi) after Adam Rd Exit.,2024-03-05 08:15:07.123456
Vehicle breakdown,1.3016,103.9121,(05/03)08:20 Vehicle breakdown on ECP (towards City).,
Accident,,,,2024-03-05 08:15:07
";

const ROADWORKS: &str = "\
EventID,StartDate,EndDate,SvcDept,RoadName,Other
RW0001,2024-03-01,2024-03-20,LTA,ADAM ROAD,Lane closure
RW0002,2024-03-20,2024-03-01,LTA,NICOLL HIGHWAY,Bad range
RW0003,not a date,2024-03-01,LTA,ORCHARD ROAD,
";

const CARPARKS: &str = "\
CarParkID,Area,Development,Location,AvailableLots,LotType,Agency,Timestamp
1,Marina,Suntec City,1.29375 103.85718,450,C,LTA,2024-03-05 08:20:00
2,Marina,Marina Square,1.29115 103.85728,200,C,LTA,2024-03-05 08:20:00
3,Marina,Broken,somewhere,20,C,LTA,2024-03-05 08:20:00
4,Marina,Negative,1.29 103.85,-5,C,LTA,2024-03-05 08:20:00
";

#[test]
fn imports_snapshots_and_skips_bad_rows() {
    let mut store = memory_store();
    let imported_at = now() - Duration::minutes(2);

    let con = store.connection_mut();
    let inc = import_incidents_csv(con, INCIDENTS.as_bytes(), imported_at, ImportMode::Append).unwrap();
    assert_eq!(inc, ImportStats { inserted: 2, skipped: 1 });

    let rw = import_roadworks_csv(con, ROADWORKS.as_bytes(), imported_at, ImportMode::Append).unwrap();
    assert_eq!(rw, ImportStats { inserted: 1, skipped: 2 });

    let cp = import_carparks_csv(con, CARPARKS.as_bytes(), imported_at, ImportMode::Append).unwrap();
    assert_eq!(cp, ImportStats { inserted: 2, skipped: 2 });

    // Fractional seconds are truncated; a blank timestamp becomes the import time.
    let stamps: Vec<String> = con
        .prepare("SELECT timestamp FROM trafficincidents ORDER BY timestamp")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(stamps, vec!["2024-03-05 08:15:07", "2024-03-05 08:28:00"]);

    let st = status::inspect(con).unwrap();
    assert_eq!(st.schema_version.as_deref(), Some("2"));
    let rows: Vec<(&str, i64)> = st.feeds.iter().map(|f| (f.table, f.rows)).collect();
    assert_eq!(rows, vec![("trafficincidents", 2), ("roadworks", 1), ("carpark", 2)]);
}

#[test]
fn imported_data_feeds_the_engine() {
    let mut store = memory_store();
    let imported_at = now() - Duration::minutes(2);
    {
        let con = store.connection_mut();
        import_incidents_csv(con, INCIDENTS.as_bytes(), imported_at, ImportMode::Append).unwrap();
        import_roadworks_csv(con, ROADWORKS.as_bytes(), imported_at, ImportMode::Append).unwrap();
        import_carparks_csv(con, CARPARKS.as_bytes(), imported_at, ImportMode::Append).unwrap();
    }

    let extractor = TrafficSignalExtractor::new(&store, Duration::hours(1));
    let signals = extractor.extract(&["PIE", "ECP", "Adam Road"], now()).unwrap();
    assert_eq!(signals.get("PIE").map(|s| s.incidents), Some(1));
    assert_eq!(signals.get("ECP").map(|s| s.breakdowns), Some(1));
    assert_eq!(signals.get("Adam Road").map(|s| s.roadworks), Some(1));

    let geocoder = FakeGeocoder::default().with("Marina Square", &[(1.2911, 103.8572)]);
    let resolver = ParkingProximityResolver::new(&store, &geocoder, Duration::hours(2), 3);
    let cps = resolver.resolve("Marina Square", now()).unwrap();
    let names: Vec<&str> = cps.iter().map(|c| c.development()).collect();
    assert_eq!(names, vec!["Marina Square", "Suntec City"]);
}

#[test]
fn replace_mode_clears_previous_rows() {
    let mut store = memory_store();
    let con = store.connection_mut();

    import_carparks_csv(con, CARPARKS.as_bytes(), now(), ImportMode::Append).unwrap();
    import_carparks_csv(con, CARPARKS.as_bytes(), now(), ImportMode::Append).unwrap();
    import_carparks_csv(con, CARPARKS.as_bytes(), now(), ImportMode::Replace).unwrap();

    let n: i64 = con.query_row("SELECT COUNT(*) FROM carpark", [], |r| r.get(0)).unwrap();
    assert_eq!(n, 2);
}

#[test]
fn migration_upgrades_a_v1_database() {
    let mut con = Connection::open_in_memory().unwrap();
    migrate::create_meta(&con).unwrap();
    con.execute_batch(
        r#"
        CREATE TABLE trafficincidents (type TEXT NOT NULL, latitude REAL, longitude REAL, message TEXT NOT NULL);
        INSERT INTO trafficincidents VALUES ('Accident', 1.3, 103.8, '(05/03)08:10 Accident on PIE.');
        INSERT INTO meta(key, value) VALUES ('schema_version', '1');
        "#,
    )
    .unwrap();

    migrate::run(&mut con).unwrap();

    assert_eq!(migrate::meta_get(&con, "schema_version").unwrap().as_deref(), Some("2"));
    let kept: i64 = con
        .query_row("SELECT COUNT(*) FROM trafficincidents WHERE timestamp IS NULL", [], |r| r.get(0))
        .unwrap();
    assert_eq!(kept, 1);
}

#[test]
fn file_store_is_migrated_and_waits_on_locks() {
    let path = std::env::temp_dir().join(format!("sg_route_open_{}.sqlite", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let store = SqliteStore::open(&path).unwrap();
    let con = store.connection();
    assert_eq!(migrate::meta_get(con, "schema_version").unwrap().as_deref(), Some("2"));
    let timeout_ms: i64 = con.query_row("PRAGMA busy_timeout", [], |r| r.get(0)).unwrap();
    assert_eq!(timeout_ms, 5000);

    drop(store);
    let _ = std::fs::remove_file(&path);
}
