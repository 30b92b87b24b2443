#![allow(dead_code)]

use emberlink_remote::testing::ScriptedDriver;
use emberlink_remote::{ConnectParams, ConnectionCache, ConnectionKey};

pub const DB_PATH: &str = "db.local:/srv/employee.fdb";

pub fn key(server: &str) -> ConnectionKey {
    ConnectionKey::new(server, "alice")
}

pub fn params() -> ConnectParams {
    ConnectParams::new(DB_PATH)
}

/// Cache over a scripted driver plus a handle to the driver's log.
pub fn cache() -> (ConnectionCache<ScriptedDriver>, ScriptedDriver) {
    let driver = ScriptedDriver::new();
    (ConnectionCache::new(driver.clone()), driver)
}

pub fn depth(cache: &ConnectionCache<ScriptedDriver>, key: &ConnectionKey) -> u32 {
    cache.entry(key).map(|e| e.xact_depth()).unwrap_or(0)
}
