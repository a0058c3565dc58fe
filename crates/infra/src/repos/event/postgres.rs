use super::IEventRepo;
use planner_domain::{CalendarEvent, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    user_uid: Uuid,
    title: String,
    description: String,
    start_ts: i64,
    reminder_enabled: bool,
    reminder_sent_at: Option<i64>,
    created: i64,
    updated: i64,
}

impl From<EventRaw> for CalendarEvent {
    fn from(e: EventRaw) -> Self {
        Self {
            id: e.event_uid.into(),
            user_id: e.user_uid.into(),
            title: e.title,
            description: e.description,
            start_ts: e.start_ts,
            reminder_enabled: e.reminder_enabled,
            reminder_sent_at: e.reminder_sent_at,
            created: e.created,
            updated: e.updated,
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO calendar_events(
                event_uid,
                user_uid,
                title,
                description,
                start_ts,
                reminder_enabled,
                reminder_sent_at,
                created,
                updated
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(e.user_id.inner_ref())
        .bind(&e.title)
        .bind(&e.description)
        .bind(e.start_ts)
        .bind(e.reminder_enabled)
        .bind(e.reminder_sent_at)
        .bind(e.created)
        .bind(e.updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, e: &CalendarEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE calendar_events SET
                title = $2,
                description = $3,
                start_ts = $4,
                reminder_enabled = $5,
                reminder_sent_at = CASE
                    WHEN start_ts = $4 AND (reminder_enabled OR NOT $5)
                        THEN COALESCE(reminder_sent_at, $6)
                    ELSE $6
                END,
                updated = $7
            WHERE event_uid = $1
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(&e.title)
        .bind(&e.description)
        .bind(e.start_ts)
        .bind(e.reminder_enabled)
        .bind(e.reminder_sent_at)
        .bind(e.updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<CalendarEvent> {
        let res = sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await;

        match res {
            Ok(event) => event.map(|e| e.into()),
            Err(e) => {
                error!("Unable to find calendar event {}: {:?}", event_id, e);
                None
            }
        }
    }

    async fn find_by_user(&self, user_id: &ID) -> anyhow::Result<Vec<CalendarEvent>> {
        let events = sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.user_uid = $1
            ORDER BY e.start_ts
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        Ok(events.into_iter().map(|e| e.into()).collect())
    }

    async fn find_reminder_enabled(&self) -> anyhow::Result<Vec<CalendarEvent>> {
        let events = sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM calendar_events AS e
            WHERE e.reminder_enabled
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events.into_iter().map(|e| e.into()).collect())
    }

    async fn mark_reminder_sent(
        &self,
        event_id: &ID,
        start_ts: i64,
        sent_at: i64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE calendar_events SET
                reminder_sent_at = $3
            WHERE event_uid = $1 AND start_ts = $2
            "#,
        )
        .bind(event_id.inner_ref())
        .bind(start_ts)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, event_id: &ID) -> Option<CalendarEvent> {
        let res = sqlx::query_as::<_, EventRaw>(
            r#"
            DELETE FROM calendar_events AS e
            WHERE e.event_uid = $1
            RETURNING *
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await;

        match res {
            Ok(event) => event.map(|e| e.into()),
            Err(e) => {
                error!("Unable to delete calendar event {}: {:?}", event_id, e);
                None
            }
        }
    }
}
