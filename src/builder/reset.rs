// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Environment reset: remove every deployed service and wait until the
//! environment reports none left.

use crate::constants::reset::{
    CONNECTION_RETRY_BUDGET_SECS, DRAIN_POLL_INTERVAL_SECS, DRAIN_TIMEOUT_SECS,
    RETRY_INTERVAL_SECS,
};
use crate::error::{BuilderError, ClientError, Result};
use crate::juju::client::{ClusterClient, EnvironmentHandle};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, instrument};

/// Time allowed for each phase of a reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetBudget {
    /// How long to keep retrying the reset command itself
    pub connection_retry: Duration,
    /// How long to wait for services to disappear afterwards
    pub drain_timeout: Duration,
}

impl Default for ResetBudget {
    fn default() -> Self {
        Self {
            connection_retry: Duration::from_secs(CONNECTION_RETRY_BUDGET_SECS),
            drain_timeout: Duration::from_secs(DRAIN_TIMEOUT_SECS),
        }
    }
}

/// Bookkeeping for one phase of a reset
#[derive(Debug)]
struct ResetAttempt {
    started: Instant,
    retries: u32,
    reconnects: u32,
    last_error: Option<ClientError>,
}

impl ResetAttempt {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            retries: 0,
            reconnects: 0,
            last_error: None,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn exceeded(&self, budget: Duration) -> bool {
        self.elapsed() > budget
    }
}

/// Owns the cluster client and brings its environment back to a clean state.
pub struct EnvironmentResetter<C> {
    client: C,
}

impl<C: ClusterClient> EnvironmentResetter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Reset the environment, terminating its machines, and wait for all services to be removed.
    #[instrument(skip(self, handle, budget), fields(environment = %handle))]
    pub async fn reset(&mut self, handle: &EnvironmentHandle, budget: &ResetBudget) -> Result<()> {
        self.issue_reset(budget.connection_retry).await?;
        self.await_drain(budget.drain_timeout).await
    }

    async fn issue_reset(&mut self, budget: Duration) -> Result<()> {
        let mut attempt = ResetAttempt::start();

        loop {
            let err = match self.client.reset(true).await {
                Ok(()) => {
                    debug!(
                        "Environment reset accepted after {} retries and {} reconnects",
                        attempt.retries, attempt.reconnects
                    );
                    return Ok(());
                }
                Err(err) => err,
            };

            let err = if err.is_stale_connection() {
                debug!("Connection closed, reconnecting...");
                match self.client.connect().await {
                    Ok(()) => {
                        attempt.reconnects += 1;
                        attempt.last_error = Some(err);
                        if attempt.exceeded(budget) {
                            return Err(timeout_error(budget, attempt));
                        }
                        continue;
                    }
                    Err(connect_err) => connect_err,
                }
            } else {
                err
            };

            // Unrecognised faults are retried too, until the budget runs out
            error!("Failed to reset environment: {}", err);
            attempt.last_error = Some(err);
            if attempt.exceeded(budget) {
                return Err(timeout_error(budget, attempt));
            }

            sleep(Duration::from_secs(RETRY_INTERVAL_SECS)).await;
            attempt.retries += 1;
            debug!("Retrying environment reset...");
        }
    }

    async fn await_drain(&mut self, budget: Duration) -> Result<()> {
        info!("Waiting for services to be removed...");
        let attempt = ResetAttempt::start();
        let mut remaining = Vec::new();

        loop {
            let status = match self.client.status().await {
                Ok(status) => status,
                Err(err) if err.is_stale_connection() => {
                    debug!("Connection closed while polling status, reconnecting...");
                    self.client.connect().await?;
                    if attempt.exceeded(budget) {
                        return Err(BuilderError::DrainTimeout {
                            timeout: budget,
                            remaining,
                        });
                    }
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if status.is_drained() {
                info!(
                    "All services removed after {} seconds",
                    attempt.elapsed().as_secs()
                );
                return Ok(());
            }

            remaining = status.service_names();
            if attempt.exceeded(budget) {
                return Err(BuilderError::DrainTimeout {
                    timeout: budget,
                    remaining,
                });
            }

            debug!("Remaining services: {}", remaining.join(", "));
            sleep(Duration::from_secs(DRAIN_POLL_INTERVAL_SECS)).await;
        }
    }
}

fn timeout_error(budget: Duration, attempt: ResetAttempt) -> BuilderError {
    BuilderError::ConnectionTimeout {
        timeout: budget,
        last_error: attempt.last_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{snapshot, stale, ScriptedClient};

    fn handle() -> EnvironmentHandle {
        EnvironmentHandle::new("test")
    }

    fn budget(connection_retry: u64, drain_timeout: u64) -> ResetBudget {
        ResetBudget {
            connection_retry: Duration::from_secs(connection_retry),
            drain_timeout: Duration::from_secs(drain_timeout),
        }
    }

    #[test]
    fn test_default_budget() {
        let budget = ResetBudget::default();
        assert_eq!(budget.connection_retry, Duration::from_secs(60));
        assert_eq!(budget.drain_timeout, Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_connections_reconnect_without_sleeping() {
        let client = ScriptedClient::new()
            .on_reset(Err(stale()))
            .on_reset(Err(stale()))
            .on_reset(Err(stale()))
            .on_reset(Ok(()));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        resetter.reset(&handle(), &ResetBudget::default()).await.unwrap();

        assert_eq!(client.connects(), 3);
        assert_eq!(client.resets(), 4);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_reset_polls_status_at_once() {
        let client = ScriptedClient::new().on_status(Ok(snapshot(&[])));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        resetter.reset(&handle(), &ResetBudget::default()).await.unwrap();

        assert_eq!(client.resets(), 1);
        assert_eq!(client.status_calls(), 1);
        assert_eq!(client.connects(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_twice_then_drains_after_one_poll() {
        let client = ScriptedClient::new()
            .on_reset(Err(stale()))
            .on_reset(Err(stale()))
            .on_reset(Ok(()))
            .on_status(Ok(snapshot(&["serviceA"])))
            .on_status(Ok(snapshot(&[])));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        resetter.reset(&handle(), &ResetBudget::default()).await.unwrap();

        assert_eq!(client.connects(), 2);
        assert_eq!(client.status_calls(), 2);
        assert_eq!(start.elapsed().as_secs(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_stale_times_out() {
        let client = ScriptedClient::new()
            .on_reset(Err(stale()))
            .with_connect_latency(Duration::from_millis(500));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        let err = resetter.reset(&handle(), &budget(5, 600)).await.unwrap_err();

        assert!(start.elapsed() >= Duration::from_secs(5));
        match err {
            BuilderError::ConnectionTimeout {
                timeout,
                last_error,
            } => {
                assert_eq!(timeout, Duration::from_secs(5));
                assert_eq!(last_error, Some(stale()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_faults_retry_until_budget() {
        let client =
            ScriptedClient::new().on_reset(Err(ClientError::Other("api unavailable".to_string())));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        let err = resetter.reset(&handle(), &budget(5, 600)).await.unwrap_err();

        assert!(matches!(err, BuilderError::ConnectionTimeout { .. }));
        assert!(start.elapsed() >= Duration::from_secs(5));
        // one attempt per second, plus the attempt that crossed the budget
        assert_eq!(client.resets(), 7);
        assert_eq!(client.connects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_fault_then_success_sleeps_once() {
        let client = ScriptedClient::new()
            .on_reset(Err(ClientError::Timeout("destroy-service".to_string())))
            .on_reset(Ok(()));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        resetter.reset(&handle(), &ResetBudget::default()).await.unwrap();

        assert_eq!(client.resets(), 2);
        assert_eq!(start.elapsed().as_secs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reconnect_is_retried_after_sleep() {
        let client = ScriptedClient::new()
            .on_reset(Err(stale()))
            .on_reset(Ok(()))
            .on_connect(Err(ClientError::Other("dial tcp: refused".to_string())));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        resetter.reset(&handle(), &ResetBudget::default()).await.unwrap();

        assert_eq!(client.connects(), 1);
        assert_eq!(client.resets(), 2);
        assert_eq!(start.elapsed().as_secs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_timeout_lists_remaining_services() {
        let client = ScriptedClient::new().on_status(Ok(snapshot(&["mysql", "wordpress"])));
        let mut resetter = EnvironmentResetter::new(client.clone());
        let start = Instant::now();

        let err = resetter.reset(&handle(), &budget(60, 10)).await.unwrap_err();

        assert!(start.elapsed() > Duration::from_secs(10));
        match err {
            BuilderError::DrainTimeout { timeout, remaining } => {
                assert_eq!(timeout, Duration::from_secs(10));
                assert_eq!(remaining, vec!["mysql", "wordpress"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_status_reconnects_and_polls_again() {
        let client = ScriptedClient::new()
            .on_status(Err(stale()))
            .on_status(Ok(snapshot(&[])));
        let mut resetter = EnvironmentResetter::new(client.clone());

        resetter.reset(&handle(), &ResetBudget::default()).await.unwrap();

        assert_eq!(client.connects(), 1);
        assert_eq!(client.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_propagates() {
        let client = ScriptedClient::new()
            .on_status(Err(ClientError::InvalidStatus("garbage".to_string())));
        let mut resetter = EnvironmentResetter::new(client.clone());

        let err = resetter
            .reset(&handle(), &ResetBudget::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BuilderError::Client(ClientError::InvalidStatus(_))
        ));
    }
}
