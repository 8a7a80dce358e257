pub mod events;
pub mod greeting;
pub mod message;
pub mod time;

pub use events::{SessionEvent, ToastLevel};
pub use greeting::{Greeting, GreetingStatus};
pub use message::{ContentType, Message, MessageId, MessageStatus, Role};
pub use time::{format_display, format_server_timestamp, now_display, DISPLAY_FORMAT};
