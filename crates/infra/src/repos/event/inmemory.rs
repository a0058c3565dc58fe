use super::IEventRepo;
use crate::repos::shared::inmemory_repo::*;
use planner_domain::{CalendarEvent, ID};

pub struct InMemoryEventRepo {
    calendar_events: std::sync::Mutex<Vec<CalendarEvent>>,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            calendar_events: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn insert(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        insert(e, &self.calendar_events);
        Ok(())
    }

    async fn save(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        update_many(
            &self.calendar_events,
            |stored| stored.id == e.id,
            |stored| {
                let reminder_sent_at = e.reminder_sent_at_over(stored);
                *stored = e.clone();
                stored.reminder_sent_at = reminder_sent_at;
            },
        );
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<CalendarEvent> {
        find(event_id, &self.calendar_events)
    }

    async fn find_by_user(&self, user_id: &ID) -> anyhow::Result<Vec<CalendarEvent>> {
        let mut events = find_by(&self.calendar_events, |e| e.user_id == *user_id);
        events.sort_by_key(|e| e.start_ts);
        Ok(events)
    }

    async fn find_reminder_enabled(&self) -> anyhow::Result<Vec<CalendarEvent>> {
        Ok(find_by(&self.calendar_events, |e| e.reminder_enabled))
    }

    async fn mark_reminder_sent(
        &self,
        event_id: &ID,
        start_ts: i64,
        sent_at: i64,
    ) -> anyhow::Result<bool> {
        let updated = update_many(
            &self.calendar_events,
            |e| e.id == *event_id && e.start_ts == start_ts,
            |e| e.reminder_sent_at = Some(sent_at),
        );
        Ok(updated > 0)
    }

    async fn delete(&self, event_id: &ID) -> Option<CalendarEvent> {
        delete(event_id, &self.calendar_events)
    }
}
