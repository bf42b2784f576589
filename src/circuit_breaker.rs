use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Circuit breaker guarding a single source adapter.
pub type SourceCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Consecutive faults (errors or timeouts) that open the breaker.
pub const FAILURE_THRESHOLD: u32 = 5;

/// Creates the breaker placed in front of every source adapter.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive faults trigger the OPEN state.
/// - **Backoff**: exponential from 10s to 60s before a trial call is let through.
///
/// While OPEN, the coordinator reports the source as `unavailable` without
/// calling it. Plain unavailability (no data for this company) is not a fault
/// and never trips the breaker.
pub fn create_source_circuit_breaker() -> SourceCircuitBreaker {
    let backoff_strategy = backoff::exponential(Duration::from_secs(10), Duration::from_secs(60));

    let failure_policy = failure_policy::consecutive_failures(FAILURE_THRESHOLD, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
