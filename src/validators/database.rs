//! Database block and connection-pool validators
//!
//! A health response may carry a `database` object:
//!
//! ```text
//! {
//!   "status": "healthy",
//!   "database": {
//!     "status": "healthy",
//!     "message": "Database connection is healthy",
//!     "stats": { "max_open_connections": 25, "open_connections": 3, ... }
//!   },
//!   "timestamp": "2024-01-31T12:34:56Z"
//! }
//! ```

use serde_json::{Map, Value};

use super::response::{json_object, json_type_name, render};
use crate::common::{Error, Result};
use crate::http::ResponseHandle;

/// Database status reported by a healthy pool
pub const HEALTHY: &str = "healthy";

/// Every statistic a `database.stats` block must carry
pub const POOL_STAT_FIELDS: [&str; 8] = [
    "max_open_connections",
    "open_connections",
    "in_use",
    "idle",
    "wait_count",
    "wait_duration",
    "max_idle_closed",
    "max_lifetime_closed",
];

/// Statistics describing current pool utilization
pub const USAGE_FIELDS: [&str; 3] = ["open_connections", "in_use", "idle"];

/// Connection-pool statistics as observed in a response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub max_open_connections: f64,
    pub open_connections: f64,
    pub in_use: f64,
    pub idle: f64,
    pub wait_count: f64,
    pub wait_duration: f64,
    pub max_idle_closed: f64,
    pub max_lifetime_closed: f64,
}

impl PoolStats {
    /// Read all eight statistics, failing on the first missing or
    /// non-numeric field
    pub fn from_json(stats: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            max_open_connections: number_field(stats, "max_open_connections")?,
            open_connections: number_field(stats, "open_connections")?,
            in_use: number_field(stats, "in_use")?,
            idle: number_field(stats, "idle")?,
            wait_count: number_field(stats, "wait_count")?,
            wait_duration: number_field(stats, "wait_duration")?,
            max_idle_closed: number_field(stats, "max_idle_closed")?,
            max_lifetime_closed: number_field(stats, "max_lifetime_closed")?,
        })
    }

    /// `open == in_use + idle` and every counter is non-negative
    pub fn check_consistent(&self) -> Result<()> {
        if self.open_connections != self.in_use + self.idle {
            return Err(Error::assertion(format!(
                "Open connections ({}) should equal in_use ({}) + idle ({})",
                self.open_connections, self.in_use, self.idle
            )));
        }

        for (field, value) in [
            ("open_connections", self.open_connections),
            ("in_use", self.in_use),
            ("idle", self.idle),
            ("wait_count", self.wait_count),
            ("max_idle_closed", self.max_idle_closed),
            ("max_lifetime_closed", self.max_lifetime_closed),
        ] {
            if value < 0.0 {
                return Err(Error::assertion(format!(
                    "{} should be non-negative, got {}",
                    field, value
                )));
            }
        }

        if self.wait_duration < 0.0 {
            return Err(Error::assertion(format!(
                "Wait duration should be non-negative, got {}",
                self.wait_duration
            )));
        }
        Ok(())
    }
}

/// The `database` object of a response body
pub fn database_block(response: &ResponseHandle) -> Result<&Map<String, Value>> {
    let body = json_object(response)?;
    let database = body
        .get("database")
        .ok_or_else(|| Error::assertion("Response does not contain 'database' field"))?;
    database.as_object().ok_or_else(|| {
        Error::assertion(format!(
            "Database field should be an object, got {}",
            json_type_name(database)
        ))
    })
}

/// The `database.stats` object of a response body
pub fn stats_block(response: &ResponseHandle) -> Result<&Map<String, Value>> {
    let database = database_block(response)?;
    let stats = database
        .get("stats")
        .ok_or_else(|| Error::assertion("Database info does not contain 'stats' field"))?;
    stats.as_object().ok_or_else(|| {
        Error::assertion(format!(
            "Stats field should be an object, got {}",
            json_type_name(stats)
        ))
    })
}

/// `database` carries a `status` and a string `message`
pub fn database_info(response: &ResponseHandle) -> Result<()> {
    let database = database_block(response)?;
    if !database.contains_key("status") {
        return Err(Error::assertion(
            "Database info does not contain 'status' field",
        ));
    }
    match database.get("message") {
        None => Err(Error::assertion(
            "Database info does not contain 'message' field",
        )),
        Some(Value::String(_)) => Ok(()),
        Some(other) => Err(Error::assertion(format!(
            "Database message should be a string, got {}",
            json_type_name(other)
        ))),
    }
}

/// [`database_info`] plus a `database.stats` object holding all eight
/// numeric statistics
pub fn database_info_with_stats(response: &ResponseHandle) -> Result<()> {
    database_info(response)?;
    connection_stats_shape(response).map(|_| ())
}

/// `database.status` equals `expected`
pub fn database_status(response: &ResponseHandle, expected: &str) -> Result<()> {
    let database = database_block(response)?;
    let actual = database
        .get("status")
        .ok_or_else(|| Error::assertion("Database info does not contain 'status' field"))?;
    if actual.as_str() != Some(expected) {
        return Err(Error::assertion(format!(
            "Expected database status to be '{}', got {}",
            expected,
            render(actual)
        )));
    }
    Ok(())
}

/// `database.stats` holds all eight statistics, each numeric
pub fn connection_stats_shape(response: &ResponseHandle) -> Result<PoolStats> {
    PoolStats::from_json(stats_block(response)?)
}

/// Statistics are present and internally consistent
pub fn connection_stats_valid(response: &ResponseHandle) -> Result<()> {
    connection_stats_shape(response)?.check_consistent()
}

/// Statistics are complete, consistent, and within pool capacity
pub fn connection_stats_within_capacity(response: &ResponseHandle) -> Result<()> {
    let stats = connection_stats_shape(response)?;
    stats.check_consistent()?;
    check_capacity(stats.max_open_connections, stats.open_connections)
}

/// Database reports healthy and the pool is within capacity
pub fn pool_healthy(response: &ResponseHandle) -> Result<()> {
    database_status(response, HEALTHY)?;
    let stats = stats_block(response)?;
    let max_open = number_field(stats, "max_open_connections")?;
    let open = number_field(stats, "open_connections")?;
    check_capacity(max_open, open)
}

/// `max_open > 0` and `open <= max_open`
pub fn check_capacity(max_open: f64, open: f64) -> Result<()> {
    if max_open <= 0.0 {
        return Err(Error::assertion(format!(
            "Max open connections should be greater than 0, got {}",
            max_open
        )));
    }
    if open > max_open {
        return Err(Error::assertion(format!(
            "Open connections ({}) should not exceed max open connections ({})",
            open, max_open
        )));
    }
    Ok(())
}

/// `max_open_connections` is present, numeric, and positive
pub fn max_open_connections(response: &ResponseHandle) -> Result<()> {
    let stats = stats_block(response)?;
    let max_open = number_field(stats, "max_open_connections")?;
    if max_open <= 0.0 {
        return Err(Error::assertion(format!(
            "max_open_connections should be greater than 0, got {}",
            max_open
        )));
    }
    Ok(())
}

/// Current usage metrics are present, numeric, and non-negative
pub fn usage_metrics(response: &ResponseHandle) -> Result<()> {
    let stats = stats_block(response)?;
    for field in USAGE_FIELDS {
        let value = number_field(stats, field)?;
        if value < 0.0 {
            return Err(Error::assertion(format!(
                "{} should be non-negative, got {}",
                field, value
            )));
        }
    }
    Ok(())
}

fn number_field(stats: &Map<String, Value>, field: &str) -> Result<f64> {
    let value = stats
        .get(field)
        .ok_or_else(|| Error::assertion(format!("Stats does not contain '{}' field", field)))?;
    value.as_f64().ok_or_else(|| {
        Error::assertion(format!(
            "Stat '{}' should be a number, got {}",
            field,
            json_type_name(value)
        ))
    })
}
