//! Configuration for claim tracking.

use std::sync::Arc;
use std::time::Duration;

use dra_assume_cache::DEFAULT_EVENT_CAPACITY;
use thiserror::Error;

use crate::ledger::{InFlightLedger, LeasedLedger, ShardedLedger};

/// Errors from loading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Claim tracking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Lease after which an in-flight allocation that was never cleared is
    /// dropped. `None` keeps entries until they are removed explicitly.
    pub ledger_lease: Option<Duration>,

    /// Buffered change events per cache subscriber.
    pub cache_event_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ledger_lease: None,
            cache_event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `DRA_LEDGER_LEASE_SECS`: ledger lease in seconds; unset or `0`
    ///   disables expiry
    /// - `DRA_CACHE_EVENT_CAPACITY`: change channel capacity
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ledger_lease = match parse_u64(&lookup, "DRA_LEDGER_LEASE_SECS")? {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let cache_event_capacity = match parse_u64(&lookup, "DRA_CACHE_EVENT_CAPACITY")? {
            None => defaults.cache_event_capacity,
            Some(0) => {
                return Err(ConfigError::Invalid {
                    var: "DRA_CACHE_EVENT_CAPACITY",
                    value: "0".to_string(),
                    reason: "must be at least 1",
                })
            }
            Some(n) => usize::try_from(n).map_err(|_| ConfigError::Invalid {
                var: "DRA_CACHE_EVENT_CAPACITY",
                value: n.to_string(),
                reason: "too large",
            })?,
        };

        Ok(Self {
            ledger_lease,
            cache_event_capacity,
        })
    }

    /// Build the ledger this configuration asks for.
    pub fn build_ledger(&self) -> Arc<dyn InFlightLedger> {
        match self.ledger_lease {
            Some(lease) => Arc::new(LeasedLedger::new(lease)),
            None => Arc::new(ShardedLedger::new()),
        }
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: "expected a non-negative integer",
        })
}
