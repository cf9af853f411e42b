//! Engine wiring over a chosen store backend.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::StoreBackend;
use crate::lifecycle::{AssignmentLifecycle, ShiftLifecycle};
use crate::store::{
    AssignmentStore, InMemoryAssignmentStore, InMemoryShiftStore, PostgresAssignmentStore,
    PostgresShiftStore, ShiftStore,
};

pub type DynShiftStore = Arc<dyn ShiftStore>;
pub type DynAssignmentStore = Arc<dyn AssignmentStore>;

/// Both engines, sharing one pair of stores.
#[derive(Clone)]
pub struct Services {
    pub shifts: ShiftLifecycle<DynShiftStore>,
    pub assignments: AssignmentLifecycle<DynShiftStore, DynAssignmentStore>,
}

impl Services {
    pub fn new(shift_store: DynShiftStore, assignment_store: DynAssignmentStore) -> Self {
        Self {
            shifts: ShiftLifecycle::new(shift_store.clone()),
            assignments: AssignmentLifecycle::new(shift_store, assignment_store),
        }
    }

    /// Dev/test wiring: fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryShiftStore::new()),
            Arc::new(InMemoryAssignmentStore::new()),
        )
    }
}

/// Build the engines for `backend`, connecting to Postgres when asked to.
pub async fn build_services(backend: &StoreBackend) -> anyhow::Result<Services> {
    match backend {
        StoreBackend::InMemory => {
            info!(backend = "in_memory", "using in-memory stores");
            Ok(Services::in_memory())
        }
        StoreBackend::Postgres(config) => {
            let pool = config
                .connect()
                .await
                .context("failed to connect to Postgres")?;
            info!(
                backend = "postgres",
                max_connections = config.max_connections,
                "connected to Postgres"
            );
            Ok(Services::new(
                Arc::new(PostgresShiftStore::new(pool.clone())),
                Arc::new(PostgresAssignmentStore::new(pool)),
            ))
        }
    }
}
