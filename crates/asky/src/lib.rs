//! asky library
//!
//! Core components of the asky chat relay: the broadcast hub and its HTTP
//! surface, the relay client with the command dispatcher, and the
//! completion service adapter behind the bot.

pub mod api;
pub mod client;
pub mod completion;
pub mod ws;
