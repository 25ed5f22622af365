//! Retry policy passed through to services.
//!
//! Commands bind and validate the policy but never act on it; services read
//! the effective values through the accessor methods.

use std::str::FromStr;
use std::time::Duration;

use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};
use crate::options::{
    self, RETRY_DELAY, RETRY_MAX_DELAY, RETRY_MAX_RETRIES, RETRY_MODE, RETRY_NETWORK_TIMEOUT,
};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(800);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(100);

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    /// Same delay before every attempt.
    Fixed,
    /// Delay doubles per attempt, capped at the maximum delay.
    #[default]
    Exponential,
}

impl RetryMode {
    pub const NAMES: &'static [&'static str] = &["fixed", "exponential"];
}

impl FromStr for RetryMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(RetryMode::Fixed),
            "exponential" => Ok(RetryMode::Exponential),
            _ => Err(AppError::InvalidOption(format!("unknown retry mode '{s}'"))),
        }
    }
}

/// Retry knobs supplied on the command line. Unset fields use the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicyOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RetryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_timeout_seconds: Option<f64>,
}

impl RetryPolicyOptions {
    /// Binds the retry flags. Returns `None` when none of them was given.
    ///
    /// # Errors
    /// Returns `AppError::InvalidOption` for an unknown retry mode.
    pub fn bind(matches: &ArgMatches) -> AppResult<Option<Self>> {
        let number = |name: &str| matches.try_get_one::<f64>(name).ok().flatten().copied();

        let policy = Self {
            max_retries: matches
                .try_get_one::<u32>(RETRY_MAX_RETRIES.name)
                .ok()
                .flatten()
                .copied(),
            delay_seconds: number(RETRY_DELAY.name),
            max_delay_seconds: number(RETRY_MAX_DELAY.name),
            mode: options::string_value(matches, &RETRY_MODE)
                .map(|mode| mode.parse())
                .transpose()?,
            network_timeout_seconds: number(RETRY_NETWORK_TIMEOUT.name),
        };

        Ok((policy != Self::default()).then_some(policy))
    }

    /// Checks that every supplied duration is a finite, non-negative number.
    ///
    /// # Errors
    /// Returns `AppError::InvalidOption` naming the offending flag.
    pub fn validate(&self) -> AppResult<()> {
        let checks = [
            (RETRY_DELAY, self.delay_seconds),
            (RETRY_MAX_DELAY, self.max_delay_seconds),
            (RETRY_NETWORK_TIMEOUT, self.network_timeout_seconds),
        ];

        for (option, value) in checks {
            if let Some(seconds) = value {
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(AppError::InvalidOption(format!(
                        "{} must be a non-negative number of seconds",
                        option.flag()
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn mode(&self) -> RetryMode {
        self.mode.unwrap_or_default()
    }

    pub fn delay(&self) -> Duration {
        seconds_or(self.delay_seconds, DEFAULT_DELAY)
    }

    pub fn max_delay(&self) -> Duration {
        seconds_or(self.max_delay_seconds, DEFAULT_MAX_DELAY)
    }

    pub fn network_timeout(&self) -> Duration {
        seconds_or(self.network_timeout_seconds, DEFAULT_NETWORK_TIMEOUT)
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.mode() {
            RetryMode::Fixed => self.delay(),
            RetryMode::Exponential => self
                .delay()
                .checked_mul(2u32.saturating_pow(attempt))
                .unwrap_or(Duration::MAX)
                .min(self.max_delay()),
        }
    }
}

fn seconds_or(seconds: Option<f64>, default: Duration) -> Duration {
    seconds
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .unwrap_or(default)
}
