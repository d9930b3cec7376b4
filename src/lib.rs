//! DogePlus operator console core.
//!
//! Headless model of the emergency-dispatch assessment board: the board store,
//! escalation resolution, coordinated card moves confirmed by the dispatch
//! backend, and live updates merged from the push channel.

pub mod assessment;
pub mod board;
pub mod config;
pub mod coordinator;
pub mod escalation;
pub mod events;
pub mod levels;
pub mod live;
pub mod notify;
pub mod remote;
pub mod session;
pub mod tasks;
