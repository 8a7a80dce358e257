pub mod assembler;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod followup;
pub mod greetings;
mod guard;
pub mod ids;
pub mod paginator;
pub mod reveal;
pub mod store;

pub use assembler::StreamAssembler;
pub use config::SessionConfig;
pub use controller::{
    MessageView, SendOrigin, SendOutcome, SessionController, SessionIdentity, SessionSnapshot,
};
pub use debounce::QueryDebouncer;
pub use followup::{extract_follow_ups, option_payload, FollowUp};
pub use greetings::{GreetingFetch, GreetingSearch};
pub use paginator::{HistoryCursor, HistoryPaginator, PageOutcome};
pub use reveal::{RevealFrames, RevealPolicy};
pub use store::MessageStore;
