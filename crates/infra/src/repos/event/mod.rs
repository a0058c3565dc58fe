mod inmemory;
mod postgres;

pub use inmemory::InMemoryEventRepo;
use planner_domain::{CalendarEvent, ID};
pub use postgres::PostgresEventRepo;

#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    async fn insert(&self, e: &CalendarEvent) -> anyhow::Result<()>;
    /// Stores the event. A reminder already marked as sent stays marked unless
    /// the event moved or its reminder was re-enabled.
    async fn save(&self, e: &CalendarEvent) -> anyhow::Result<()>;
    async fn find(&self, event_id: &ID) -> Option<CalendarEvent>;
    /// All events owned by the `User`, ordered by start
    async fn find_by_user(&self, user_id: &ID) -> anyhow::Result<Vec<CalendarEvent>>;
    /// All events with reminders enabled, regardless of when they start
    async fn find_reminder_enabled(&self) -> anyhow::Result<Vec<CalendarEvent>>;
    /// Marks the reminder of the event as sent. Nothing is marked if the event
    /// no longer starts at `start_ts`, and `false` is returned.
    async fn mark_reminder_sent(
        &self,
        event_id: &ID,
        start_ts: i64,
        sent_at: i64,
    ) -> anyhow::Result<bool>;
    async fn delete(&self, event_id: &ID) -> Option<CalendarEvent>;
}
