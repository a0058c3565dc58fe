use crate::reminder::ReminderStatus;
use crate::shared::entity::{Entity, ID};

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: ID,
    /// The `User` owning this event. Set at creation and never changed.
    pub user_id: ID,
    pub title: String,
    pub description: String,
    pub start_ts: i64,
    pub reminder_enabled: bool,
    /// Timestamp of the reminder dispatched for the current `start_ts`.
    /// `None` until a reminder has been sent.
    pub reminder_sent_at: Option<i64>,
    pub created: i64,
    pub updated: i64,
}

impl Entity for CalendarEvent {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl CalendarEvent {
    pub fn new(
        user_id: ID,
        title: String,
        description: String,
        start_ts: i64,
        reminder_enabled: bool,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            user_id,
            title,
            description,
            start_ts,
            reminder_enabled,
            reminder_sent_at: None,
            created: now,
            updated: now,
        }
    }

    pub fn is_valid_title(title: &str) -> bool {
        !title.trim().is_empty()
    }

    /// Moving the event re-arms its reminder
    pub fn set_start_ts(&mut self, start_ts: i64) {
        if self.start_ts != start_ts {
            self.start_ts = start_ts;
            self.reminder_sent_at = None;
        }
    }

    pub fn set_reminder_enabled(&mut self, enabled: bool) {
        if enabled && !self.reminder_enabled {
            self.reminder_sent_at = None;
        }
        self.reminder_enabled = enabled;
    }

    /// Reminder marker to store when this event replaces `stored`. A marker on the
    /// stored event is kept unless the event was moved or its reminder re-enabled.
    pub fn reminder_sent_at_over(&self, stored: &CalendarEvent) -> Option<i64> {
        let rearmed = self.start_ts != stored.start_ts
            || (self.reminder_enabled && !stored.reminder_enabled);
        if rearmed {
            self.reminder_sent_at
        } else {
            stored.reminder_sent_at.or(self.reminder_sent_at)
        }
    }

    pub fn millis_to_start(&self, now: i64) -> i64 {
        self.start_ts - now
    }

    /// Where this event currently is in its reminder lifecycle given a
    /// reminder `window` in millis
    pub fn reminder_status(&self, now: i64, window: i64) -> ReminderStatus {
        if !self.reminder_enabled {
            return ReminderStatus::Disabled;
        }
        if self.reminder_sent_at.is_some() {
            return ReminderStatus::Notified;
        }
        let delta = self.millis_to_start(now);
        if delta <= 0 {
            ReminderStatus::Expired
        } else if delta <= window {
            ReminderStatus::Due
        } else {
            ReminderStatus::Pending
        }
    }

    pub fn is_reminder_due(&self, now: i64, window: i64) -> bool {
        self.reminder_status(now, window) == ReminderStatus::Due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 1000 * 60;
    const WINDOW: i64 = 20 * MINUTE;
    const NOW: i64 = 1613862000000;

    fn event_starting_in(millis: i64) -> CalendarEvent {
        CalendarEvent::new(
            ID::default(),
            "Standup".into(),
            "".into(),
            NOW + millis,
            true,
            NOW,
        )
    }

    #[test]
    fn event_inside_window_is_due() {
        let e = event_starting_in(15 * MINUTE);
        assert_eq!(e.reminder_status(NOW, WINDOW), ReminderStatus::Due);
        assert!(e.is_reminder_due(NOW, WINDOW));
    }

    #[test]
    fn window_upper_bound_is_inclusive() {
        let e = event_starting_in(WINDOW);
        assert!(e.is_reminder_due(NOW, WINDOW));
        let e = event_starting_in(WINDOW + 1);
        assert_eq!(e.reminder_status(NOW, WINDOW), ReminderStatus::Pending);
    }

    #[test]
    fn started_events_are_expired() {
        assert_eq!(
            event_starting_in(0).reminder_status(NOW, WINDOW),
            ReminderStatus::Expired
        );
        assert_eq!(
            event_starting_in(-5 * MINUTE).reminder_status(NOW, WINDOW),
            ReminderStatus::Expired
        );
    }

    #[test]
    fn disabled_reminder_is_never_due() {
        let mut e = event_starting_in(15 * MINUTE);
        e.set_reminder_enabled(false);
        assert_eq!(e.reminder_status(NOW, WINDOW), ReminderStatus::Disabled);
    }

    #[test]
    fn notified_event_is_not_due_again() {
        let mut e = event_starting_in(15 * MINUTE);
        e.reminder_sent_at = Some(NOW);
        assert_eq!(
            e.reminder_status(NOW + MINUTE, WINDOW),
            ReminderStatus::Notified
        );
    }

    #[test]
    fn rescheduling_rearms_reminder() {
        let mut e = event_starting_in(15 * MINUTE);
        e.reminder_sent_at = Some(NOW);

        e.set_start_ts(e.start_ts);
        assert!(e.reminder_sent_at.is_some());

        e.set_start_ts(NOW + 10 * MINUTE);
        assert!(e.reminder_sent_at.is_none());
        assert!(e.is_reminder_due(NOW, WINDOW));
    }

    #[test]
    fn reenabling_reminder_rearms_it() {
        let mut e = event_starting_in(15 * MINUTE);
        e.reminder_sent_at = Some(NOW);
        e.set_reminder_enabled(true);
        assert!(e.reminder_sent_at.is_some());

        e.set_reminder_enabled(false);
        e.set_reminder_enabled(true);
        assert!(e.reminder_sent_at.is_none());
    }

    #[test]
    fn title_validation() {
        assert!(CalendarEvent::is_valid_title("Dentist"));
        assert!(!CalendarEvent::is_valid_title(""));
        assert!(!CalendarEvent::is_valid_title("   "));
    }

    #[test]
    fn stored_marker_survives_stale_edit() {
        let mut stored = event_starting_in(10 * MINUTE);
        let mut stale = stored.clone();
        stored.reminder_sent_at = Some(NOW);

        stale.description = "Room 4".into();
        assert_eq!(stale.reminder_sent_at_over(&stored), Some(NOW));

        stale.set_reminder_enabled(false);
        assert_eq!(stale.reminder_sent_at_over(&stored), Some(NOW));
    }

    #[test]
    fn stored_marker_is_dropped_when_rearmed() {
        let mut stored = event_starting_in(10 * MINUTE);
        stored.reminder_sent_at = Some(NOW);

        let mut moved = stored.clone();
        moved.set_start_ts(NOW + 15 * MINUTE);
        assert_eq!(moved.reminder_sent_at_over(&stored), None);

        stored.reminder_enabled = false;
        let mut reenabled = stored.clone();
        reenabled.set_reminder_enabled(true);
        assert_eq!(reenabled.reminder_sent_at_over(&stored), None);
    }
}
