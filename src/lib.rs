//! WhatsApp assistant bot: command routing, anti-ban rate limiting, and
//! AI completion failover over an external bridge transport.

pub mod bot;
pub mod config;
pub mod server;
