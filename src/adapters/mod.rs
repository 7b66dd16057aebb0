// Adapters layer: concrete implementations for external systems (storage, Discord REST, clock).

pub mod discord_rest;
pub mod sqlite;

use crate::domain::ports::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
