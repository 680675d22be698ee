//! Bot core - rate limiting, command routing, AI failover, transport boundary.

pub mod engine;
pub mod fun;
pub mod gateway;
pub mod memory;
pub mod message;
pub mod providers;
pub mod ratelimit;
pub mod registry;
pub mod util;

pub use engine::BotEngine;
pub use gateway::{BridgeClient, Gateway, Presence};
pub use message::{BridgeEvent, InboundMessage};
