//! Store metrics collection.
//!
//! Provides functions for recording store-related metrics.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Backend label for the in-memory store.
pub const MEMORY_BACKEND: &str = "memory";

/// Backend label for the PostgreSQL store.
pub const POSTGRES_BACKEND: &str = "postgres";

/// Record how long a store operation took.
pub fn record_operation_duration(backend: &'static str, operation: &'static str, secs: f64) {
    histogram!(
        "store_operation_duration_seconds",
        "backend" => backend,
        "operation" => operation
    )
    .record(secs);
}

/// Record database connection pool metrics.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a store operation and records it on [`StoreTimer::record`].
///
/// ```ignore
/// let timer = StoreTimer::new(POSTGRES_BACKEND, "find_member");
/// let result = sqlx::query_as::<_, MemberEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct StoreTimer {
    backend: &'static str,
    operation: &'static str,
    start: Instant,
}

impl StoreTimer {
    pub fn new(backend: &'static str, operation: &'static str) -> Self {
        Self {
            backend,
            operation,
            start: Instant::now(),
        }
    }

    pub fn postgres(operation: &'static str) -> Self {
        Self::new(POSTGRES_BACKEND, operation)
    }

    pub fn memory(operation: &'static str) -> Self {
        Self::new(MEMORY_BACKEND, operation)
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let secs = self.start.elapsed().as_secs_f64();
        record_operation_duration(self.backend, self.operation, secs);
    }
}
