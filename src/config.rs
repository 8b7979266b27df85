//! Engine configuration, read from the environment by the binary.

use std::env;

use crate::error::ConfigError;
use crate::settlement::SettlementPlanner;
use crate::types::Amount;

const MINOR_DIGITS_VAR: &str = "SPLITLEDGER_MINOR_DIGITS";
const TOLERANCE_VAR: &str = "SPLITLEDGER_TOLERANCE";

const DEFAULT_MINOR_DIGITS: u32 = 2;
const MAX_MINOR_DIGITS: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Number of fractional digits of the currency (2 for cents).
    pub minor_digits: u32,
    /// Balances within this many minor units of zero are considered settled.
    pub tolerance: Amount,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            minor_digits: DEFAULT_MINOR_DIGITS,
            tolerance: 0,
        }
    }
}

impl LedgerConfig {
    /// Build the configuration from `SPLITLEDGER_MINOR_DIGITS` and
    /// `SPLITLEDGER_TOLERANCE`, using the defaults for unset variables.
    pub fn from_env() -> Result<LedgerConfig, ConfigError> {
        LedgerConfig::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<LedgerConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(value) = lookup(MINOR_DIGITS_VAR) {
            config.minor_digits = match value.trim().parse::<u32>() {
                Ok(digits) if digits <= MAX_MINOR_DIGITS => digits,
                _ => {
                    return Err(ConfigError::invalid_value(
                        MINOR_DIGITS_VAR,
                        value,
                        "expected an integer between 0 and 6",
                    ))
                }
            };
        }

        if let Some(value) = lookup(TOLERANCE_VAR) {
            config.tolerance = match value.trim().parse::<Amount>() {
                Ok(tolerance) if tolerance >= 0 => tolerance,
                _ => {
                    return Err(ConfigError::invalid_value(
                        TOLERANCE_VAR,
                        value,
                        "expected a non-negative number of minor units",
                    ))
                }
            };
        }

        Ok(config)
    }

    pub fn planner(&self) -> SettlementPlanner {
        SettlementPlanner::with_tolerance(self.tolerance)
    }
}
