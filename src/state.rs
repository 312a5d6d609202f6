use crate::session::Dashboard;
use crate::source::JsonFileSource;
use crate::sync::{InsertNotice, SyncOutcome};
use crate::ui::DashboardView;
use std::sync::Arc;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

pub type Session = Dashboard<DashboardView>;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub source: Arc<JsonFileSource>,
}

impl AppState {
    pub fn new(session: Session, source: Arc<JsonFileSource>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            source,
        }
    }

    pub async fn view(&self) -> DashboardView {
        self.session.lock().await.renderer().clone()
    }

    /// Refetches without holding the session lock while the read is in flight.
    pub async fn refresh(&self) -> SyncOutcome {
        let pending = self.session.lock().await.begin_refresh();
        let fetched = pending.run().await;
        self.session.lock().await.finish_refresh(fetched)
    }
}

/// Refreshes the session once per insert notice until the stream closes.
pub fn spawn_insert_listener(
    state: AppState,
    mut inserts: broadcast::Receiver<InsertNotice>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match inserts.recv().await {
                Ok(InsertNotice) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // one refetch covers every missed insert
                    warn!(missed, "insert notices lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            state.refresh().await;
        }
        info!("insert stream closed");
    })
}
