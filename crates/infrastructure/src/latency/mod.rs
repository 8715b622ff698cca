//! Latency store backends.

mod memory;
mod sqlite;

pub use memory::InMemoryLatencyStore;
pub use sqlite::SqliteLatencyStore;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
