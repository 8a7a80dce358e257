mod client;
mod responses;

pub use client::HttpBackend;
