mod client;
mod message;

pub use client::*;
pub use message::*;
