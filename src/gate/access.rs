//! Access Gate
//!
//! Decides whether a login may be attempted, locks all logins after a
//! failed one, and lifts the lock after the cooldown or on operator request.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::cache::{CachePath, PathCache};
use crate::config::Config;
use crate::gate::{JailState, JailTransition, LoginPacer};
use crate::notify::{Notification, Notifier};

// == Access Gate ==
/// Login throttle backed by the `jail_state` entry of the cache.
pub struct AccessGate {
    notifier: Arc<dyn Notifier>,
    /// Where notifications are addressed
    target: String,
    /// How long a lock holds
    cooldown: chrono::Duration,
    pacer: LoginPacer,
    /// Domains with a confirmed session for this run
    logged_in: HashSet<String>,
}

impl AccessGate {
    /// Creates a gate with the pacing and cooldown from `config`.
    pub fn new(notifier: Arc<dyn Notifier>, config: &Config) -> Self {
        Self::with_settings(
            notifier,
            config.notify_target.clone(),
            config.jail_cooldown(),
            config.login_pause(),
        )
    }

    pub fn with_settings(
        notifier: Arc<dyn Notifier>,
        target: impl Into<String>,
        cooldown: chrono::Duration,
        login_pause: Duration,
    ) -> Self {
        Self {
            notifier,
            target: target.into(),
            cooldown,
            pacer: LoginPacer::new(login_pause),
            logged_in: HashSet::new(),
        }
    }

    // == Check Access ==
    /// Returns true while logins for `domain` are refused.
    ///
    /// See [`AccessGate::check_access_at`].
    pub fn check_access(&mut self, cache: &mut PathCache, domain: &str, release: bool) -> bool {
        self.check_access_at(cache, domain, release, Local::now().naive_local())
    }

    /// Returns true while logins for `domain` are refused at `now`.
    ///
    /// A domain already logged in this run is never refused. A held lock is
    /// lifted when the cooldown has passed or `release` is set; the lifted
    /// state is persisted and the operator notified.
    pub fn check_access_at(
        &mut self,
        cache: &mut PathCache,
        domain: &str,
        release: bool,
        now: NaiveDateTime,
    ) -> bool {
        if self.is_logged_in(domain) {
            debug!("{} already logged in, skipping jail check", domain);
            return false;
        }

        debug!("Checking jail status");
        let state = self.state_at(cache, now);
        match state.evaluate(now, release, self.cooldown) {
            JailTransition::Open => false,
            JailTransition::Released => {
                info!("Releasing from login jail");
                persist(cache, &JailState::unlocked(now));
                self.send(Notification::new("Out of login jail.", &self.target));
                false
            }
            JailTransition::StillLocked => {
                info!("Still in login jail since {}", state.since);
                persist(cache, &state);
                true
            }
        }
    }

    // == Record Outcomes ==
    /// Locks all logins after a failed attempt on `domain`.
    pub fn record_failure(&mut self, cache: &mut PathCache, domain: &str, screenshot: Option<Vec<u8>>) {
        self.record_failure_at(cache, domain, screenshot, Local::now().naive_local());
    }

    pub fn record_failure_at(
        &mut self,
        cache: &mut PathCache,
        domain: &str,
        screenshot: Option<Vec<u8>>,
        now: NaiveDateTime,
    ) {
        warn!("There was an error logging in to {}.", domain);
        persist(cache, &JailState::locked(now));
        self.send(
            Notification::new(format!("Error logging in to {}.", domain), &self.target)
                .with_image(screenshot),
        );
    }

    /// Marks `domain` as logged in for the rest of the run.
    pub fn record_success(&mut self, domain: &str) {
        debug!("Logged in to {}", domain);
        self.logged_in.insert(domain.to_string());
    }

    pub fn is_logged_in(&self, domain: &str) -> bool {
        self.logged_in.contains(domain)
    }

    /// Pause to take before the next login attempt of this run.
    pub fn next_pause(&mut self) -> Duration {
        self.pacer.next_pause()
    }

    /// Current jail state as stored in the cache.
    pub fn state_at(&self, cache: &mut PathCache, now: NaiveDateTime) -> JailState {
        JailState::from_value(cache.get(&CachePath::jail_state()).ok(), now)
    }

    fn send(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(&notification) {
            warn!("Could not send notification: {}", err);
        }
    }
}

fn persist(cache: &mut PathCache, state: &JailState) {
    // `save` already logs the failure; the in-memory state stays updated.
    if let Err(err) = cache.set(state.to_value(), &CachePath::jail_state(), true) {
        debug!("Jail state not persisted: {}", err);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn gate(notifier: &RecordingNotifier) -> AccessGate {
        AccessGate::with_settings(
            Arc::new(notifier.clone()),
            "phone",
            ChronoDuration::days(1),
            Duration::from_secs(60),
        )
    }

    fn jailed_since(cache: &mut PathCache, since: NaiveDateTime) {
        cache
            .set(JailState::locked(since).to_value(), &CachePath::jail_state(), false)
            .unwrap();
    }

    fn stored(cache: &mut PathCache) -> serde_json::Value {
        cache.get(&CachePath::jail_state()).unwrap().clone()
    }

    #[test]
    fn test_unlocked_is_open() {
        let notifier = RecordingNotifier::default();
        let mut cache = PathCache::ephemeral();
        assert!(!gate(&notifier).check_access_at(&mut cache, "a.org", false, now()));
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_lock_older_than_a_day_is_released() {
        let notifier = RecordingNotifier::default();
        let mut cache = PathCache::ephemeral();
        jailed_since(&mut cache, now() - ChronoDuration::days(2));

        let locked = gate(&notifier).check_access_at(&mut cache, "a.org", false, now());

        assert!(!locked);
        assert_eq!(stored(&mut cache), json!([false, "2024-03-10 09:30:00"]));
        assert_eq!(notifier.messages(), vec!["Out of login jail."]);
    }

    #[test]
    fn test_recent_lock_holds() {
        let notifier = RecordingNotifier::default();
        let mut cache = PathCache::ephemeral();
        let since = now() - ChronoDuration::hours(1);
        jailed_since(&mut cache, since);
        let before = stored(&mut cache);

        let locked = gate(&notifier).check_access_at(&mut cache, "a.org", false, now());

        assert!(locked);
        assert_eq!(stored(&mut cache), before);
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_release_overrides_cooldown() {
        let notifier = RecordingNotifier::default();
        let mut cache = PathCache::ephemeral();
        jailed_since(&mut cache, now() - ChronoDuration::minutes(5));

        assert!(!gate(&notifier).check_access_at(&mut cache, "a.org", true, now()));
        assert_eq!(stored(&mut cache)[0], json!(false));
    }

    #[test]
    fn test_logged_in_domain_bypasses_lock() {
        let notifier = RecordingNotifier::default();
        let mut cache = PathCache::ephemeral();
        jailed_since(&mut cache, now() - ChronoDuration::hours(1));
        let mut gate = gate(&notifier);

        gate.record_success("a.org");

        assert!(!gate.check_access_at(&mut cache, "a.org", false, now()));
        assert!(gate.check_access_at(&mut cache, "b.org", false, now()));
        assert_eq!(stored(&mut cache)[0], json!(true));
    }

    #[test]
    fn test_record_failure_locks_and_notifies() {
        let notifier = RecordingNotifier::default();
        let mut cache = PathCache::ephemeral();
        let mut gate = gate(&notifier);

        gate.record_failure_at(&mut cache, "a.org", Some(vec![0x89, 0x50]), now());

        assert_eq!(stored(&mut cache), json!([true, "2024-03-10 09:30:00"]));
        let sent = notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, "Error logging in to a.org.");
        assert_eq!(sent[0].target, "phone");
        assert_eq!(sent[0].image, Some(vec![0x89, 0x50]));
        assert!(gate.check_access_at(&mut cache, "a.org", false, now()));
    }

    #[test]
    fn test_failing_notifier_does_not_abort() {
        let notifier = RecordingNotifier::failing();
        let mut cache = PathCache::ephemeral();
        jailed_since(&mut cache, now() - ChronoDuration::days(3));

        assert!(!gate(&notifier).check_access_at(&mut cache, "a.org", false, now()));
        assert_eq!(stored(&mut cache)[0], json!(false));
    }

    #[test]
    fn test_pacing_is_linear() {
        let notifier = RecordingNotifier::default();
        let mut gate = gate(&notifier);
        assert_eq!(gate.next_pause(), Duration::ZERO);
        assert_eq!(gate.next_pause(), Duration::from_secs(60));
        assert_eq!(gate.next_pause(), Duration::from_secs(120));
    }
}
