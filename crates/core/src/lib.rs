#![warn(clippy::all, missing_docs)]

//! Core domain logic for the updown terminal client.
//!
//! This crate hosts configuration handling, the HTTP service clients,
//! the synthetic market feed, the round state machine, the subscription
//! gate, and the background synchronisation used by the terminal UI.

pub mod api;
pub mod config;
pub mod game;
pub mod models;
pub mod sync;

pub use api::{ApiClient, ApiError};
pub use config::{AppConfig, Identity};
pub use game::{
    Direction, MarketFeed, Outcome, ResolvedRound, Round, RoundEngine, Series, SubscriptionGate,
    WalkGenerator,
};
pub use models::Channel;
pub use sync::{Bootstrap, Settlement, SyncEvent};
