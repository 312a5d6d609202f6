pub mod aggregate;
pub mod app;
pub mod config;
pub mod controller;
pub mod date_key;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod render;
pub mod selection;
pub mod session;
pub mod source;
pub mod state;
pub mod sync;
pub mod ui;

pub use aggregate::aggregate;
pub use app::router;
pub use config::DashboardConfig;
pub use controller::{SelectionController, SelectorEvent};
pub use date_key::DateKey;
pub use selection::{EnabledRange, SelectionStore};
pub use session::{Dashboard, SessionOptions};
pub use state::{spawn_insert_listener, AppState};
pub use sync::{DataSource, InsertNotice, SyncConfig, SyncEngine, SyncOutcome};
