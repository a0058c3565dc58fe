use crate::date::format_timestamp;
use crate::event::CalendarEvent;

pub const REMINDER_SUBJECT: &str = "Upcoming Event Reminder";

/// Reminder lifecycle of a `CalendarEvent` for its current `start_ts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    /// The owner has not asked for a reminder
    Disabled,
    /// The event starts later than the reminder window
    Pending,
    /// The event starts within the reminder window and nobody has been notified yet
    Due,
    /// A reminder has been dispatched
    Notified,
    /// The event started before a reminder could be sent
    Expired,
}

/// The notification sent to the owner of a `CalendarEvent` shortly before it starts
#[derive(Debug, Clone, PartialEq)]
pub struct EventReminderMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl EventReminderMessage {
    /// `sender` signs the message
    pub fn new(event: &CalendarEvent, recipient: String, sender: &str) -> Self {
        let start = format_timestamp(event.start_ts);
        let mut body = format!("Reminder: You have an event scheduled for {}.", start);
        let title = event.title.trim();
        if !title.is_empty() {
            body.push_str("\n\n");
            body.push_str(title);
        }
        if !sender.is_empty() {
            body.push_str("\n\n-- \n");
            body.push_str(sender);
        }

        Self {
            recipient,
            subject: REMINDER_SUBJECT.into(),
            body,
        }
    }
}
