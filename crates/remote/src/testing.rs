//! In-memory driver for exercising the cache and coordinator without a
//! remote server.
//!
//! Every command a connection receives is appended to a shared log as the
//! text it would have sent, with `BEGIN`, `COMMIT`, `ROLLBACK`, `CONNECT
//! <db_path>` and `CLOSE` standing in for the driver primitives.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::driver::{
    ConnectParams, ConnectionStatus, DriverError, RemoteConnection, RemoteDriver, RemoteRow,
};

#[derive(Debug)]
struct Script {
    log: Vec<String>,
    failing: Vec<String>,
    refuse_connections: bool,
    next_id: u64,
    /// Connections with an id below this report `ConnectionStatus::Bad`
    broken_below: u64,
    rows: Vec<RemoteRow>,
    server_version: i32,
}

#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                log: Vec::new(),
                failing: Vec::new(),
                refuse_connections: false,
                next_id: 0,
                broken_below: 0,
                rows: Vec::new(),
                server_version: 30000,
            })),
        }
    }

    pub fn with_server_version(self, version: i32) -> Self {
        self.lock().server_version = version;
        self
    }

    /// Make every later occurrence of `command` fail.
    pub fn fail_on(&self, command: impl Into<String>) {
        self.lock().failing.push(command.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    /// Mark every connection opened so far as broken.
    pub fn break_connections(&self) {
        let mut script = self.lock();
        script.broken_below = script.next_id;
    }

    /// Rows returned by every subsequent query.
    pub fn set_rows(&self, rows: Vec<RemoteRow>) {
        self.lock().rows = rows;
    }

    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().log)
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteDriver for ScriptedDriver {
    type Connection = ScriptedConnection;

    fn connect(&self, params: &ConnectParams) -> Result<ScriptedConnection, DriverError> {
        let mut script = self.lock();
        script.log.push(format!("CONNECT {}", params.db_path));
        if script.refuse_connections {
            return Err(DriverError::Connect(format!(
                "unable to complete network request to \"{}\"",
                params.db_path
            )));
        }
        let id = script.next_id;
        script.next_id += 1;
        Ok(ScriptedConnection {
            id,
            params: params.clone(),
            server_version: script.server_version,
            script: Arc::clone(&self.script),
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct ScriptedConnection {
    id: u64,
    params: ConnectParams,
    server_version: i32,
    script: Arc<Mutex<Script>>,
    closed: bool,
}

impl ScriptedConnection {
    fn run(&mut self, command: &str) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.log.push(command.to_string());
        if script.failing.iter().any(|f| f == command) {
            return Err(DriverError::Remote(format!("scripted failure: {}", command)));
        }
        Ok(())
    }
}

impl RemoteConnection for ScriptedConnection {
    fn status(&self) -> ConnectionStatus {
        let script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed || self.id < script.broken_below {
            ConnectionStatus::Bad
        } else {
            ConnectionStatus::Ok
        }
    }

    fn params(&self) -> &ConnectParams {
        &self.params
    }

    fn server_version(&self) -> i32 {
        self.server_version
    }

    fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.run(sql).map(|_| 0)
    }

    fn query(&mut self, sql: &str) -> Result<Vec<RemoteRow>, DriverError> {
        self.run(sql)?;
        let script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(script.rows.clone())
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        self.run("BEGIN")
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.run("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.run("ROLLBACK")
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
            script.log.push("CLOSE".to_string());
        }
    }
}
