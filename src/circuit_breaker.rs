use failsafe::backoff::{self, Exponential};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::{Config, StateMachine};
use std::time::Duration;

/// Circuit breaker guarding the upstream product source.
pub type LookupCircuitBreaker = StateMachine<ConsecutiveFailures<Exponential>, ()>;

/// Consecutive upstream outages before the circuit opens.
pub const FAILURE_THRESHOLD: u32 = 5;

/// Creates the circuit breaker wrapped around product lookups.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// While OPEN, lookups fail immediately as unavailable instead of waiting out
/// the HTTP timeout. Only outages count as failures; a product that does not
/// exist is a successful call.
pub fn create_lookup_circuit_breaker() -> LookupCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(FAILURE_THRESHOLD, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
