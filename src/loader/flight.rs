//! In-flight load tracking.
//!
//! At most one flight exists per (fetch path, memo key). Late callers for the
//! same subject attach to the shared future of the running flight instead of
//! starting another fetch. A resource read of a class script, or two library
//! aliases of one file, get flights of their own.

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::LoadError;
use crate::registry::Export;

pub(crate) type FlightResult = Result<Export, LoadError>;

/// Handle to a running flight; every clone resolves to the same result.
pub(crate) type Flight = Shared<BoxFuture<'static, FlightResult>>;

tokio::task_local! {
    /// Flights that (transitively) requested the current one.
    pub(crate) static LOAD_CHAIN: Vec<FlightKey>;
}

/// Identity of a flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FlightKey {
    pub path: String,
    pub key: String,
}

impl FlightKey {
    pub(crate) fn new(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Outcome of [`FlightTable::join`].
pub(crate) enum Joined {
    Ready(Export),
    Attached(Flight),
    Started(Flight),
}

/// Flight key → running flight.
pub(crate) struct FlightTable {
    flights: Mutex<HashMap<FlightKey, Flight>>,
}

impl FlightTable {
    pub(crate) fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Attach to the flight for `key`, or start one with `start`.
    ///
    /// `ready` is checked under the table lock before starting: a flight that
    /// just finished has already written its value, so a late caller picks it
    /// up instead of fetching again.
    pub(crate) fn join<R, F>(&self, key: &FlightKey, ready: R, start: F) -> Joined
    where
        R: FnOnce() -> Option<Export>,
        F: FnOnce() -> Flight,
    {
        let mut flights = self.flights.lock();
        if let Some(flight) = flights.get(key) {
            return Joined::Attached(flight.clone());
        }
        if let Some(value) = ready() {
            return Joined::Ready(value);
        }
        let flight = start();
        flights.insert(key.clone(), flight.clone());
        Joined::Started(flight)
    }

    pub(crate) fn contains(&self, key: &FlightKey) -> bool {
        self.flights.lock().contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.flights.lock().len()
    }

    fn finish(&self, key: &FlightKey) {
        self.flights.lock().remove(key);
    }
}

/// Removes the flight entry when the flight task ends, including by panic.
pub(crate) struct FlightGuard {
    table: Arc<FlightTable>,
    key: FlightKey,
}

impl FlightGuard {
    pub(crate) fn new(table: Arc<FlightTable>, key: FlightKey) -> Self {
        Self { table, key }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.table.finish(&self.key);
    }
}
