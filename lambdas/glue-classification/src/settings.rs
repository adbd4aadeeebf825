use std::{env, time::Duration};

use domain::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseDelivery {
    /// PUT the response to the event's ResponseURL
    Callback,
    /// Only return the response; the orchestration framework delivers it
    Return,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settings {
    pub delivery: ResponseDelivery,
    /// Shared by every catalog call of one invocation
    pub catalog_budget: Duration,
    pub delivery_timeout: Duration,
}

/// Hard limit the orchestrator gives the function.
const FUNCTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 20;
const DELIVERY_TIMEOUT_SECS: u64 = 5;

impl Settings {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let delivery = match lookup("RESPONSE_DELIVERY").as_deref() {
            None | Some("callback") => ResponseDelivery::Callback,
            Some("return") => ResponseDelivery::Return,
            Some(other) => {
                return Err(Error::configuration(format!(
                    "RESPONSE_DELIVERY must be callback or return, got {}",
                    other
                )))
            }
        };

        let timeout_secs = match lookup("CATALOG_TIMEOUT_SECS") {
            None => DEFAULT_CATALOG_TIMEOUT_SECS,
            Some(value) => value.parse().map_err(|_| {
                Error::configuration(format!("CATALOG_TIMEOUT_SECS is not a number: {}", value))
            })?,
        };
        let max_secs = FUNCTION_TIMEOUT_SECS - DELIVERY_TIMEOUT_SECS - 1;
        if timeout_secs == 0 || timeout_secs > max_secs {
            return Err(Error::configuration(format!(
                "CATALOG_TIMEOUT_SECS must be between 1 and {}",
                max_secs
            )));
        }

        Ok(Settings {
            delivery,
            catalog_budget: Duration::from_secs(timeout_secs),
            delivery_timeout: Duration::from_secs(DELIVERY_TIMEOUT_SECS),
        })
    }
}
