//! Debounced, cached wrapper around an expensive verification lookup.
//!
//! A burst of `check` calls for one subject collapses into a single remote
//! lookup that fires once the calls have been quiet for the debounce window.
//! Every caller of the burst awaits the same shared future. Successful
//! answers are cached for the freshness window, and no new lookup starts
//! within the minimum interval after the previous one finished.
//!
//! Lookup failures never reach the caller: they resolve to `false` and are
//! not cached.

use crate::domain::model::VerificationEntry;
use crate::domain::ports::VerificationSource;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTimings {
    /// Quiet period before a scheduled lookup fires.
    pub debounce: Duration,
    /// Minimum gap between the end of one lookup and the start of the next.
    pub min_interval: Duration,
    /// How long a successful answer is served from cache.
    pub freshness: Duration,
}

impl Default for CheckTimings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_interval: Duration::from_secs(2),
            freshness: Duration::from_secs(30),
        }
    }
}

/// `None` means the check was cancelled before it fired.
type SharedCheck = Shared<BoxFuture<'static, Option<bool>>>;

struct Slot {
    generation: u64,
    deadline: Instant,
    fired: bool,
    cancel: Arc<Notify>,
    outcome: SharedCheck,
    task: JoinHandle<()>,
}

impl Slot {
    fn abort(self) {
        self.cancel.notify_one();
        self.task.abort();
    }
}

struct CachedAnswer {
    entry: VerificationEntry,
    fetched_at: Instant,
}

#[derive(Default)]
struct CheckState {
    cache: Option<CachedAnswer>,
    last_known: Option<(String, bool)>,
    last_completed: Option<Instant>,
    slots: HashMap<String, Slot>,
    next_generation: u64,
    remote_calls: u64,
    disposed: bool,
}

impl CheckState {
    fn fresh(&self, subject: &str, now: Instant, freshness: Duration) -> Option<&VerificationEntry> {
        self.cache
            .as_ref()
            .filter(|c| c.entry.subject == subject && now.duration_since(c.fetched_at) < freshness)
            .map(|c| &c.entry)
    }

    fn last_known_for(&self, subject: &str) -> bool {
        matches!(&self.last_known, Some((s, true)) if s == subject)
    }

    /// Drops scheduled lookups that have not fired yet.
    fn cancel_pending(&mut self) {
        let pending: Vec<String> = self
            .slots
            .iter()
            .filter(|(_, slot)| !slot.fired)
            .map(|(subject, _)| subject.clone())
            .collect();
        for subject in pending {
            if let Some(slot) = self.slots.remove(&subject) {
                tracing::debug!("Superseded pending verification for {}", subject);
                slot.abort();
            }
        }
    }
}

fn lock(state: &Mutex<CheckState>) -> MutexGuard<'_, CheckState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct DebouncedCheck<V: VerificationSource + 'static> {
    source: Arc<V>,
    timings: CheckTimings,
    state: Arc<Mutex<CheckState>>,
}

impl<V: VerificationSource + 'static> DebouncedCheck<V> {
    pub fn new(source: V) -> Self {
        Self::with_timings(source, CheckTimings::default())
    }

    pub fn with_timings(source: V, timings: CheckTimings) -> Self {
        Self {
            source: Arc::new(source),
            timings,
            state: Arc::new(Mutex::new(CheckState::default())),
        }
    }

    pub fn timings(&self) -> CheckTimings {
        self.timings
    }

    /// Answers whether `subject` is verified. Never fails; unknown or
    /// errored lookups read as `false`.
    pub async fn check(&self, subject: &str) -> bool {
        let pending = {
            let mut state = lock(&self.state);
            let now = Instant::now();

            if let Some(entry) = state.fresh(subject, now, self.timings.freshness) {
                tracing::debug!("Verification cache hit for {}", subject);
                return entry.verified;
            }

            if state.disposed {
                return state.last_known_for(subject);
            }

            let joined = state.slots.get_mut(subject).map(|slot| {
                if !slot.fired {
                    slot.deadline = now + self.timings.debounce;
                }
                slot.outcome.clone()
            });
            let rate_limited = state
                .last_completed
                .is_some_and(|done| now.duration_since(done) < self.timings.min_interval);

            match joined {
                Some(outcome) => outcome,
                None if rate_limited => {
                    tracing::debug!(
                        "Verification for {} rate limited, using last known result",
                        subject
                    );
                    return state.last_known_for(subject);
                }
                None => {
                    state.cancel_pending();
                    self.schedule(&mut state, subject, now)
                }
            }
        };

        match pending.await {
            Some(verified) => verified,
            None => lock(&self.state).last_known_for(subject),
        }
    }

    fn schedule(&self, state: &mut CheckState, subject: &str, now: Instant) -> SharedCheck {
        state.next_generation += 1;
        let generation = state.next_generation;
        let cancel = Arc::new(Notify::new());

        let outcome = run_check(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            subject.to_string(),
            generation,
            Arc::clone(&cancel),
        )
        .boxed()
        .shared();
        let task = tokio::spawn(outcome.clone().map(|_| ()));

        state.slots.insert(
            subject.to_string(),
            Slot {
                generation,
                deadline: now + self.timings.debounce,
                fired: false,
                cancel,
                outcome: outcome.clone(),
                task,
            },
        );
        outcome
    }

    /// Fresh cache entry for `subject`, if any.
    pub fn cached(&self, subject: &str) -> Option<VerificationEntry> {
        lock(&self.state)
            .fresh(subject, Instant::now(), self.timings.freshness)
            .cloned()
    }

    pub fn invalidate(&self) {
        let mut state = lock(&self.state);
        state.cache = None;
        state.last_known = None;
    }

    /// Number of remote lookups started so far.
    pub fn remote_calls(&self) -> u64 {
        lock(&self.state).remote_calls
    }

    /// Cancels scheduled lookups and stops the background tasks driving
    /// them. Later `check` calls only answer from cache or the last known
    /// result.
    pub fn dispose(&self) {
        let mut state = lock(&self.state);
        state.disposed = true;
        for (_, slot) in state.slots.drain() {
            slot.abort();
        }
    }
}

impl<V: VerificationSource + 'static> Drop for DebouncedCheck<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn run_check<V: VerificationSource + 'static>(
    source: Arc<V>,
    state: Arc<Mutex<CheckState>>,
    subject: String,
    generation: u64,
    cancel: Arc<Notify>,
) -> Option<bool> {
    loop {
        let deadline = {
            let mut guard = lock(&state);
            let guard = &mut *guard;
            let slot = guard
                .slots
                .get_mut(&subject)
                .filter(|slot| slot.generation == generation)?;
            if Instant::now() >= slot.deadline {
                slot.fired = true;
                guard.remote_calls += 1;
                break;
            }
            slot.deadline
        };

        tokio::select! {
            _ = cancel.notified() => return None,
            _ = tokio::time::sleep_until(deadline) => {}
        }
    }

    tracing::debug!("Checking verification for {}", subject);
    let result = source.is_verified(&subject).await;

    let mut guard = lock(&state);
    guard.last_completed = Some(Instant::now());
    if guard
        .slots
        .get(&subject)
        .is_some_and(|slot| slot.generation == generation)
    {
        guard.slots.remove(&subject);
    }

    let verified = match result {
        Ok(verified) => {
            guard.cache = Some(CachedAnswer {
                entry: VerificationEntry {
                    subject: subject.clone(),
                    verified,
                    checked_at: Utc::now(),
                },
                fetched_at: Instant::now(),
            });
            verified
        }
        Err(e) => {
            tracing::warn!("Verification lookup for {} failed: {}", subject, e);
            false
        }
    };
    guard.last_known = Some((subject, verified));
    Some(verified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{ProgressError, Result};
    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeSource {
        /// `None` makes every lookup fail.
        answer: Option<bool>,
        latency: Duration,
        seen: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn answering(answer: bool) -> Self {
            Self {
                answer: Some(answer),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl VerificationSource for FakeSource {
        async fn is_verified(&self, subject: &str) -> Result<bool> {
            self.seen.lock().unwrap().push(subject.to_string());
            tokio::time::sleep(self.latency).await;
            self.answer.ok_or_else(|| ProgressError::SubjectNotFound {
                subject: subject.to_string(),
            })
        }
    }

    fn seen(checker: &DebouncedCheck<FakeSource>) -> Vec<String> {
        checker.source.seen.lock().unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_shares_one_remote_call() {
        let checker = DebouncedCheck::new(FakeSource::answering(true));

        let (a, b, c) = tokio::join!(
            checker.check("user-1"),
            checker.check("user-1"),
            checker.check("user-1")
        );

        assert!(a && b && c);
        assert_eq!(checker.remote_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_restarts_quiet_period() {
        let checker = Arc::new(DebouncedCheck::new(FakeSource::answering(true)));
        let start = Instant::now();

        let first = tokio::spawn({
            let checker = Arc::clone(&checker);
            async move { checker.check("user-1").await }
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        let second = tokio::spawn({
            let checker = Arc::clone(&checker);
            async move { checker.check("user-1").await }
        });
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(checker.check("user-1").await);
        assert!(first.await.unwrap());
        assert!(second.await.unwrap());
        assert_eq!(checker.remote_calls(), 1);
        assert!(start.elapsed() >= Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_within_window_uses_cache() {
        let checker = DebouncedCheck::new(FakeSource::answering(true));

        assert!(checker.check("user-1").await);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(checker.check("user-1").await);

        assert_eq!(checker.remote_calls(), 1);
        assert!(checker.cached("user-1").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cache_triggers_exactly_one_call() {
        let checker = DebouncedCheck::new(FakeSource::answering(true));

        assert!(checker.check("user-1").await);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(checker.cached("user-1").is_none());

        assert!(checker.check("user-1").await);
        assert_eq!(checker.remote_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_fail_closed_and_are_not_cached() {
        let checker = DebouncedCheck::new(FakeSource::failing());

        assert!(!checker.check("user-1").await);
        assert!(checker.cached("user-1").is_none());

        // Inside the minimum interval: no retry.
        assert!(!checker.check("user-1").await);
        assert_eq!(checker.remote_calls(), 1);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!checker.check("user-1").await);
        assert_eq!(checker.remote_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_applies_across_subjects() {
        let checker = DebouncedCheck::new(FakeSource::answering(true));

        assert!(checker.check("user-1").await);
        assert!(!checker.check("user-2").await);
        assert_eq!(seen(&checker), vec!["user-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_subject_cancels_pending_check() {
        let checker = Arc::new(DebouncedCheck::new(FakeSource::answering(true)));

        let superseded = tokio::spawn({
            let checker = Arc::clone(&checker);
            async move { checker.check("user-1").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(checker.check("user-2").await);
        assert!(!superseded.await.unwrap());
        assert_eq!(seen(&checker), vec!["user-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callers_join_in_flight_lookup() {
        let checker = Arc::new(DebouncedCheck::new(FakeSource {
            answer: Some(true),
            latency: Duration::from_secs(1),
            ..Default::default()
        }));

        let early = tokio::spawn({
            let checker = Arc::clone(&checker);
            async move { checker.check("user-1").await }
        });
        // Past the debounce window, while the lookup is still running.
        tokio::time::sleep(Duration::from_millis(800)).await;

        assert!(checker.check("user-1").await);
        assert!(early.await.unwrap());
        assert_eq!(checker.remote_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_scheduled_check() {
        let checker = Arc::new(DebouncedCheck::new(FakeSource::answering(true)));

        let waiting = tokio::spawn({
            let checker = Arc::clone(&checker);
            async move { checker.check("user-1").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        checker.dispose();

        assert!(!waiting.await.unwrap());
        assert_eq!(checker.remote_calls(), 0);
        assert!(!checker.check("user-1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_new_lookup() {
        let checker = DebouncedCheck::new(FakeSource::answering(true));

        assert!(checker.check("user-1").await);
        checker.invalidate();
        tokio::time::advance(Duration::from_secs(3)).await;

        assert!(checker.check("user-1").await);
        assert_eq!(checker.remote_calls(), 2);
    }
}
