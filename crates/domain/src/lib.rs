mod date;
mod event;
mod reminder;
mod session;
mod shared;
mod user;

pub use date::format_timestamp;
pub use event::CalendarEvent;
pub use reminder::{EventReminderMessage, ReminderStatus, REMINDER_SUBJECT};
pub use session::{decode_session_token, encode_session_token, SessionClaims};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use user::User;
