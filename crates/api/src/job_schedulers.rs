use planner_domain::{CalendarEvent, EventReminderMessage, ID};
use planner_infra::{IEventRepo, INotifier, ISys, IUserRepo, PlannerContext};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{interval_at, timeout, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Resolves where the reminders of a `User` should be delivered
#[async_trait::async_trait]
pub trait IRecipientLookup: Send + Sync {
    async fn find_recipient(&self, user_id: &ID) -> Option<String>;
}

/// Delivers reminders to the email address the `User` signed in with
pub struct UserRecipientLookup {
    users: Arc<dyn IUserRepo>,
}

impl UserRecipientLookup {
    pub fn new(users: Arc<dyn IUserRepo>) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl IRecipientLookup for UserRecipientLookup {
    async fn find_recipient(&self, user_id: &ID) -> Option<String> {
        self.users
            .find(user_id)
            .await
            .map(|user| user.email)
            .filter(|email| !email.trim().is_empty())
    }
}

pub struct ReminderSweeperConfig {
    pub recipient_lookup: Arc<dyn IRecipientLookup>,
    /// Signs every reminder
    pub sender_identity: String,
    /// Events starting within this duration from now are reminded about
    pub window: Duration,
    pub tick_interval: Duration,
    /// Upper bound for delivering a single reminder
    pub dispatch_timeout: Duration,
}

impl ReminderSweeperConfig {
    pub fn from_context(ctx: &PlannerContext) -> Self {
        let reminders = &ctx.config.reminders;
        Self {
            recipient_lookup: Arc::new(UserRecipientLookup::new(ctx.repos.users.clone())),
            sender_identity: reminders.sender.clone(),
            window: Duration::from_millis(reminders.window_millis.max(0) as u64),
            tick_interval: Duration::from_secs(reminders.tick_interval_secs),
            dispatch_timeout: Duration::from_secs(reminders.dispatch_timeout_secs),
        }
    }
}

/// Outcome of a single sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Events with reminders enabled
    pub candidates: usize,
    /// Candidates starting within the window and not yet reminded about
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Error, Debug)]
enum ReminderError {
    #[error("No recipient found for user: {0}")]
    UnknownRecipient(ID),
    #[error("Dispatch failed: {0:?}")]
    Dispatch(anyhow::Error),
    #[error("Dispatch did not complete within {0:?}")]
    Timeout(Duration),
}

/// Periodically looks for events that are about to start and sends exactly
/// one reminder for each of them
pub struct ReminderSweeper {
    events: Arc<dyn IEventRepo>,
    notifier: Arc<dyn INotifier>,
    sys: Arc<dyn ISys>,
    config: ReminderSweeperConfig,
    sweeping: AtomicBool,
}

struct SweepingGuard<'a>(&'a AtomicBool);

impl Drop for SweepingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReminderSweeper {
    pub fn new(
        events: Arc<dyn IEventRepo>,
        notifier: Arc<dyn INotifier>,
        sys: Arc<dyn ISys>,
        mut config: ReminderSweeperConfig,
    ) -> Self {
        if config.tick_interval < MIN_TICK_INTERVAL {
            warn!(
                "Reminder tick interval {:?} is too short, using {:?}",
                config.tick_interval, MIN_TICK_INTERVAL
            );
            config.tick_interval = MIN_TICK_INTERVAL;
        }
        Self {
            events,
            notifier,
            sys,
            config,
            sweeping: AtomicBool::new(false),
        }
    }

    pub fn from_context(ctx: &PlannerContext) -> Self {
        Self::new(
            ctx.repos.events.clone(),
            ctx.notifier.clone(),
            ctx.sys.clone(),
            ReminderSweeperConfig::from_context(ctx),
        )
    }

    /// Sends reminders for every event that is due.
    ///
    /// Returns `None` without doing anything if another sweep is still running.
    #[tracing::instrument(name = "Reminder sweep", skip(self))]
    pub async fn sweep(&self) -> Option<SweepReport> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Previous reminder sweep is still running, skipping");
            return None;
        }
        let _guard = SweepingGuard(&self.sweeping);

        Some(self.run_sweep().await)
    }

    async fn run_sweep(&self) -> SweepReport {
        let now = self.sys.get_timestamp_millis();
        let window = self.config.window.as_millis() as i64;

        let events = match self.events.find_reminder_enabled().await {
            Ok(events) => events,
            Err(e) => {
                error!("Unable to fetch events with reminders: {:?}", e);
                return SweepReport::default();
            }
        };

        let mut report = SweepReport {
            candidates: events.len(),
            ..Default::default()
        };
        for event in events.iter().filter(|e| e.is_reminder_due(now, window)) {
            report.due += 1;
            match self.remind(event, now).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    error!("Unable to send reminder for event {}: {}", event.id, e);
                }
            }
        }

        report
    }

    async fn remind(&self, event: &CalendarEvent, now: i64) -> Result<(), ReminderError> {
        let recipient = self
            .config
            .recipient_lookup
            .find_recipient(&event.user_id)
            .await
            .ok_or_else(|| ReminderError::UnknownRecipient(event.user_id.clone()))?;

        let msg = EventReminderMessage::new(event, recipient, &self.config.sender_identity);
        let dispatch = self
            .notifier
            .send_notification(&msg.recipient, &msg.subject, &msg.body);
        match timeout(self.config.dispatch_timeout, dispatch).await {
            Ok(Ok(())) => (),
            Ok(Err(e)) => return Err(ReminderError::Dispatch(e)),
            Err(_) => return Err(ReminderError::Timeout(self.config.dispatch_timeout)),
        }

        // The reminder is out at this point, so a failure to mark it only risks a duplicate
        match self
            .events
            .mark_reminder_sent(&event.id, event.start_ts, now)
            .await
        {
            Ok(true) => (),
            Ok(false) => info!(
                "Event {} was moved or deleted while its reminder was sent",
                event.id
            ),
            Err(e) => error!(
                "Unable to mark reminder of event {} as sent: {:?}",
                event.id, e
            ),
        }

        Ok(())
    }

    fn start_delay(&self) -> Duration {
        let tick = self.config.tick_interval;
        if tick.as_secs() > 0 && tick.as_secs() % 60 == 0 && tick.subsec_nanos() == 0 {
            let now = self.sys.get_timestamp_millis().max(0) as usize;
            Duration::from_secs(get_start_delay(now, 0) as u64)
        } else {
            Duration::ZERO
        }
    }

    /// Runs sweeps on the configured tick interval until the returned handle is stopped
    pub fn start(self: Arc<Self>) -> ReminderSweeperHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { self.run(token).await });

        ReminderSweeperHandle { cancel, handle }
    }

    async fn run(&self, cancel: CancellationToken) {
        let start = Instant::now() + self.start_delay();
        let mut ticks = interval_at(start, self.config.tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Reminder sweeper started with tick interval: {:?}",
            self.config.tick_interval
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticks.tick() => {
                    if let Some(report) = self.sweep().await {
                        if report.due > 0 {
                            info!("Reminder sweep finished: {:?}", report);
                        }
                    }
                }
            }
        }

        info!("Reminder sweeper stopped");
    }
}

/// Handle to a running `ReminderSweeper`
pub struct ReminderSweeperHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ReminderSweeperHandle {
    /// Stops scheduling new sweeps and waits for an in-flight sweep to finish
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!("Reminder sweeper task failed: {:?}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_domain::User;
    use planner_infra::{FakeSys, InMemoryNotifier, Repos, SentNotification};
    use std::sync::{atomic::AtomicUsize, Mutex};

    const MINUTE: i64 = 1000 * 60;
    const NOW: i64 = 1613862000000;

    #[test]
    fn start_delay_works() {
        assert_eq!(get_start_delay(50 * 1000, 5), 5);
        assert_eq!(get_start_delay(50 * 1000, 10), 60);
        assert_eq!(get_start_delay(50 * 1000, 15), 55);
        assert_eq!(get_start_delay(60 * 1000, 60), 60);
        assert_eq!(get_start_delay(60 * 1000, 10), 50);
        assert_eq!(get_start_delay(59 * 1000, 0), 1);
        assert_eq!(get_start_delay(59 * 1000, 1), 60);
    }

    /// Fails for `failing` recipients and never answers for `hanging` ones
    struct FlakyNotifier {
        failing: Vec<String>,
        hanging: Vec<String>,
        delivered: Mutex<Vec<String>>,
    }

    impl FlakyNotifier {
        fn new(failing: &[&str], hanging: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                hanging: hanging.iter().map(|s| s.to_string()).collect(),
                delivered: Mutex::new(Vec::new()),
            }
        }

        fn delivered(&self) -> Vec<String> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl INotifier for FlakyNotifier {
        async fn send_notification(
            &self,
            recipient: &str,
            _subject: &str,
            _body: &str,
        ) -> anyhow::Result<()> {
            if self.failing.iter().any(|r| r == recipient) {
                anyhow::bail!("mailbox of {} is full", recipient);
            }
            if self.hanging.iter().any(|r| r == recipient) {
                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
            }
            self.delivered.lock().unwrap().push(recipient.to_string());
            Ok(())
        }
    }

    /// Event store whose first `failures` reads of reminder enabled events fail
    struct UnreliableEventRepo {
        inner: Arc<dyn IEventRepo>,
        failures: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl IEventRepo for UnreliableEventRepo {
        async fn insert(&self, e: &CalendarEvent) -> anyhow::Result<()> {
            self.inner.insert(e).await
        }
        async fn save(&self, e: &CalendarEvent) -> anyhow::Result<()> {
            self.inner.save(e).await
        }
        async fn find(&self, event_id: &ID) -> Option<CalendarEvent> {
            self.inner.find(event_id).await
        }
        async fn find_by_user(&self, user_id: &ID) -> anyhow::Result<Vec<CalendarEvent>> {
            self.inner.find_by_user(user_id).await
        }
        async fn find_reminder_enabled(&self) -> anyhow::Result<Vec<CalendarEvent>> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                anyhow::bail!("connection reset");
            }
            self.inner.find_reminder_enabled().await
        }
        async fn mark_reminder_sent(
            &self,
            event_id: &ID,
            start_ts: i64,
            sent_at: i64,
        ) -> anyhow::Result<bool> {
            self.inner.mark_reminder_sent(event_id, start_ts, sent_at).await
        }
        async fn delete(&self, event_id: &ID) -> Option<CalendarEvent> {
            self.inner.delete(event_id).await
        }
    }

    struct TestContext {
        repos: Repos,
        sys: Arc<FakeSys>,
    }

    impl TestContext {
        fn new() -> Self {
            Self {
                repos: Repos::create_inmemory(),
                sys: Arc::new(FakeSys::new(NOW)),
            }
        }

        async fn user(&self, email: &str) -> User {
            let user = User::new(email, email.into(), None, NOW);
            self.repos.users.insert(&user).await.unwrap();
            user
        }

        async fn event(&self, user: &User, starts_in: i64, reminder: bool) -> CalendarEvent {
            let event = CalendarEvent::new(
                user.id.clone(),
                "Standup".into(),
                "".into(),
                NOW + starts_in,
                reminder,
                NOW,
            );
            self.repos.events.insert(&event).await.unwrap();
            event
        }

        fn sweeper(&self, notifier: Arc<dyn INotifier>) -> ReminderSweeper {
            self.sweeper_with_tick(notifier, Duration::from_secs(60))
        }

        fn sweeper_with_tick(
            &self,
            notifier: Arc<dyn INotifier>,
            tick_interval: Duration,
        ) -> ReminderSweeper {
            self.sweeper_with_events(self.repos.events.clone(), notifier, tick_interval)
        }

        fn sweeper_with_events(
            &self,
            events: Arc<dyn IEventRepo>,
            notifier: Arc<dyn INotifier>,
            tick_interval: Duration,
        ) -> ReminderSweeper {
            ReminderSweeper::new(
                events,
                notifier,
                self.sys.clone(),
                ReminderSweeperConfig {
                    recipient_lookup: Arc::new(UserRecipientLookup::new(
                        self.repos.users.clone(),
                    )),
                    sender_identity: "Planner".into(),
                    window: Duration::from_secs(20 * 60),
                    tick_interval,
                    dispatch_timeout: Duration::from_millis(100),
                },
            )
        }
    }

    #[actix_web::test]
    async fn reminds_about_event_starting_within_window() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        let event = ctx.event(&user, 15 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());

        let report = ctx.sweeper(notifier.clone()).sweep().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                candidates: 1,
                due: 1,
                sent: 1,
                failed: 0
            }
        );
        let msg = EventReminderMessage::new(&event, "jane@example.com".into(), "Planner");
        assert_eq!(
            notifier.sent(),
            vec![SentNotification {
                recipient: msg.recipient,
                subject: msg.subject,
                body: msg.body,
            }]
        );
        assert_eq!(
            ctx.repos.events.find(&event.id).await.unwrap().reminder_sent_at,
            Some(NOW)
        );
    }

    #[actix_web::test]
    async fn ignores_events_outside_window() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        ctx.event(&user, 25 * MINUTE, true).await;
        ctx.event(&user, -5 * MINUTE, true).await;
        ctx.event(&user, 0, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());

        let report = ctx.sweeper(notifier.clone()).sweep().await.unwrap();

        assert_eq!(report.candidates, 3);
        assert_eq!(report.due, 0);
        assert!(notifier.sent().is_empty());
    }

    #[actix_web::test]
    async fn ignores_events_without_reminder() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        for starts_in in [-5 * MINUTE, MINUTE, 15 * MINUTE, 20 * MINUTE, 25 * MINUTE] {
            ctx.event(&user, starts_in, false).await;
        }
        let notifier = Arc::new(InMemoryNotifier::new());

        let report = ctx.sweeper(notifier.clone()).sweep().await.unwrap();

        assert_eq!(report, SweepReport::default());
        assert!(notifier.sent().is_empty());
    }

    #[actix_web::test]
    async fn reminds_only_once() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        ctx.event(&user, 19 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());
        let sweeper = ctx.sweeper(notifier.clone());

        sweeper.sweep().await.unwrap();
        ctx.sys.advance(MINUTE);
        let report = sweeper.sweep().await.unwrap();

        assert_eq!(report.due, 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[actix_web::test]
    async fn reminds_again_after_event_is_moved() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        let event = ctx.event(&user, 10 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());
        let sweeper = ctx.sweeper(notifier.clone());

        sweeper.sweep().await.unwrap();
        let mut moved = ctx.repos.events.find(&event.id).await.unwrap();
        moved.set_start_ts(NOW + 15 * MINUTE);
        ctx.repos.events.save(&moved).await.unwrap();
        sweeper.sweep().await.unwrap();

        assert_eq!(notifier.sent().len(), 2);
    }

    #[actix_web::test]
    async fn edit_of_stale_event_does_not_cause_second_reminder() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        let event = ctx.event(&user, 15 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());
        let sweeper = ctx.sweeper(notifier.clone());

        // Read for an edit before the sweep marks the reminder as sent
        let mut edited = ctx.repos.events.find(&event.id).await.unwrap();
        sweeper.sweep().await.unwrap();
        edited.description = "Bring insurance card".into();
        ctx.repos.events.save(&edited).await.unwrap();

        ctx.sys.advance(MINUTE);
        let report = sweeper.sweep().await.unwrap();

        assert_eq!(report.due, 0);
        assert_eq!(notifier.sent().len(), 1);
        let stored = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(stored.description, "Bring insurance card");
        assert_eq!(stored.reminder_sent_at, Some(NOW));
    }

    #[actix_web::test]
    async fn failed_read_aborts_sweep_until_next_tick() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        let event = ctx.event(&user, 15 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());
        let events = Arc::new(UnreliableEventRepo {
            inner: ctx.repos.events.clone(),
            failures: AtomicUsize::new(1),
        });
        let sweeper = ctx.sweeper_with_events(events, notifier.clone(), Duration::from_secs(60));

        let report = sweeper.sweep().await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(notifier.sent().is_empty());

        let report = sweeper.sweep().await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(
            ctx.repos.events.find(&event.id).await.unwrap().reminder_sent_at,
            Some(NOW)
        );
    }

    #[actix_web::test]
    async fn failed_dispatch_does_not_stop_sweep() {
        let ctx = TestContext::new();
        let a = ctx.user("a@example.com").await;
        let b = ctx.user("b@example.com").await;
        let event_a = ctx.event(&a, 10 * MINUTE, true).await;
        let event_b = ctx.event(&b, 12 * MINUTE, true).await;
        let notifier = Arc::new(FlakyNotifier::new(&["a@example.com"], &[]));

        let report = ctx.sweeper(notifier.clone()).sweep().await.unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(notifier.delivered(), vec!["b@example.com".to_string()]);
        // The failed reminder is retried by a later sweep
        assert_eq!(
            ctx.repos.events.find(&event_a.id).await.unwrap().reminder_sent_at,
            None
        );
        assert!(ctx
            .repos
            .events
            .find(&event_b.id)
            .await
            .unwrap()
            .reminder_sent_at
            .is_some());
    }

    #[actix_web::test]
    async fn hanging_dispatch_times_out() {
        let ctx = TestContext::new();
        let a = ctx.user("a@example.com").await;
        let b = ctx.user("b@example.com").await;
        ctx.event(&a, 10 * MINUTE, true).await;
        ctx.event(&b, 12 * MINUTE, true).await;
        let notifier = Arc::new(FlakyNotifier::new(&[], &["a@example.com"]));

        let report = ctx.sweeper(notifier.clone()).sweep().await.unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(notifier.delivered(), vec!["b@example.com".to_string()]);
    }

    #[actix_web::test]
    async fn skips_events_of_unknown_users() {
        let ctx = TestContext::new();
        let ghost = User::new("ghost", "ghost@example.com".into(), None, NOW);
        ctx.event(&ghost, 10 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());

        let report = ctx.sweeper(notifier.clone()).sweep().await.unwrap();

        assert_eq!(report.failed, 1);
        assert!(notifier.sent().is_empty());
    }

    #[actix_web::test]
    async fn sweeps_do_not_overlap() {
        let ctx = TestContext::new();
        let user = ctx.user("slow@example.com").await;
        ctx.event(&user, 10 * MINUTE, true).await;
        let notifier = Arc::new(FlakyNotifier::new(&[], &["slow@example.com"]));
        let sweeper = ctx.sweeper(notifier);

        let (first, second) = tokio::join!(sweeper.sweep(), sweeper.sweep());

        assert!(first.is_some());
        assert!(second.is_none());
        // The guard is released once the sweep is done
        assert!(sweeper.sweep().await.is_some());
    }

    #[actix_web::test]
    async fn runs_until_stopped() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        ctx.event(&user, 15 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());
        let sweeper = Arc::new(ctx.sweeper_with_tick(notifier.clone(), Duration::from_millis(10)));

        let handle = sweeper.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());
        handle.stop().await;

        assert_eq!(notifier.sent().len(), 1);
        ctx.repos
            .events
            .insert(&CalendarEvent::new(
                user.id.clone(),
                "After stop".into(),
                "".into(),
                NOW + MINUTE,
                true,
                NOW,
            ))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.sent().len(), 1);
    }

    #[actix_web::test]
    async fn zero_tick_interval_is_clamped() {
        let ctx = TestContext::new();
        let user = ctx.user("jane@example.com").await;
        ctx.event(&user, 15 * MINUTE, true).await;
        let notifier = Arc::new(InMemoryNotifier::new());
        let sweeper = Arc::new(ctx.sweeper_with_tick(notifier.clone(), Duration::ZERO));
        assert_eq!(sweeper.config.tick_interval, MIN_TICK_INTERVAL);

        let handle = sweeper.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop().await;

        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn aligns_whole_minute_ticks_to_the_minute() {
        let ctx = TestContext::new();
        ctx.sys.set(59 * 1000);
        let notifier = Arc::new(InMemoryNotifier::new());

        let minutely = ctx.sweeper_with_tick(notifier.clone(), Duration::from_secs(60));
        assert_eq!(minutely.start_delay(), Duration::from_secs(1));

        let frequent = ctx.sweeper_with_tick(notifier, Duration::from_secs(15));
        assert_eq!(frequent.start_delay(), Duration::ZERO);
    }
}
