//! Per-game event fan-out.
//!
//! A [`Publisher`] delivers every published event to every subscriber. Each
//! subscriber is a [`ConcurrentQueue`]: an adapter that never blocks the
//! producer, buffering without bound on the subscriber's behalf, so a slow
//! or dead consumer can never back-pressure the game instance.

mod publisher;
mod queue;

pub use publisher::Publisher;
pub use queue::ConcurrentQueue;
