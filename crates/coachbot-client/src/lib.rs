pub mod buffer_utils;
pub mod config;
pub mod error;
pub mod http;
pub mod streaming;
pub mod traits;

pub use buffer_utils::{parse_sse_stream, CircularLineBuffer, SseLineParser};
pub use config::BackendConfig;
pub use error::{ClientError, Result};
pub use http::HttpBackend;
pub use streaming::{ChatFrameParser, EventStream, StreamEvent};
pub use traits::{
    ChatBackend, ChatRequest, GreetingPage, GreetingQuery, HistoryQuery, SortOrder,
};
