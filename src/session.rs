use crate::controller::{SelectionController, SelectorEvent};
use crate::date_key::DateKey;
use crate::models::{Record, SelectionState};
use crate::render::{Mutation, RenderPipeline, Renderer, Snapshot, Status};
use crate::sync::{DataSource, Fetched, InsertNotice, PendingFetch, SyncConfig, SyncEngine, SyncOutcome};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Sentinel brands that never take part in display.
    pub excluded_brands: BTreeSet<String>,
    /// Most recent enabled days selected once the first load succeeds.
    pub initial_days: usize,
}

/// One interactive session: selection, record cache and render step.
///
/// Selector events and sync results both funnel through `publish`, which
/// re-aggregates synchronously and hands the result to the renderer.
pub struct Dashboard<R> {
    controller: SelectionController,
    sync: SyncEngine,
    pipeline: RenderPipeline<R>,
    options: SessionOptions,
    seeded: bool,
}

impl<R: Renderer> Dashboard<R> {
    pub fn new(
        source: Arc<dyn DataSource>,
        config: SyncConfig,
        options: SessionOptions,
        renderer: R,
    ) -> Self {
        let sync = SyncEngine::new(source, config);
        let controller = SelectionController::new(sync.enabled(), sync.window_end());
        Self {
            controller,
            sync,
            pipeline: RenderPipeline::new(renderer),
            options,
            seeded: false,
        }
    }

    pub fn renderer(&self) -> &R {
        self.pipeline.renderer()
    }

    pub fn renders(&self) -> u64 {
        self.pipeline.renders()
    }

    pub fn selection(&self) -> SelectionState {
        self.controller.store().state()
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn records(&self) -> &[Record] {
        self.sync.records()
    }

    /// Newest day a record may carry and still become selectable.
    pub fn horizon(&self) -> DateKey {
        self.sync.horizon()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InsertNotice> {
        self.sync.subscribe()
    }

    /// Returns `true` if the event changed the selection and a render happened.
    pub fn handle(&mut self, event: SelectorEvent) -> bool {
        if !self.controller.handle(event) {
            return false;
        }
        self.publish(Mutation::Selection);
        true
    }

    pub fn begin_refresh(&mut self) -> PendingFetch {
        self.sync.begin_fetch()
    }

    pub fn finish_refresh(&mut self, fetched: Fetched) -> SyncOutcome {
        let outcome = self.sync.apply(fetched);
        match &outcome {
            SyncOutcome::Loaded { .. } => {
                self.controller
                    .set_bounds(self.sync.enabled(), self.sync.window_end());
                // an empty load has nothing to select yet; seed on the first one with data
                if !self.seeded && !self.sync.enabled().is_empty() {
                    self.seeded = true;
                    self.controller
                        .store_mut()
                        .select_latest(self.options.initial_days);
                    info!(
                        selected = self.controller.store().active_dates().len(),
                        "initial selection applied"
                    );
                }
                self.publish(Mutation::Records);
            }
            SyncOutcome::Failed(message) => self.publish(Mutation::FetchFailed(message.clone())),
        }
        outcome
    }

    /// Initial load.
    pub async fn load(&mut self) -> SyncOutcome {
        let fetched = self.begin_refresh().run().await;
        self.finish_refresh(fetched)
    }

    /// Full refetch after an upstream insert, then re-aggregation of the
    /// current selection against the new cache.
    pub async fn on_remote_insert(&mut self) -> SyncOutcome {
        self.load().await
    }

    fn publish(&mut self, mutation: Mutation) {
        let active = self.controller.store().active_dates();
        let cells = self.controller.cells();
        let status = Status {
            error: self.sync.last_error().map(str::to_string),
            empty_selection: active.is_empty(),
            last_updated: self
                .sync
                .last_updated()
                .map(|at| at.format("%H:%M").to_string()),
        };
        self.pipeline.on_mutation(
            &mutation,
            Snapshot {
                records: self.sync.records(),
                active: &active,
                excluded: &self.options.excluded_brands,
                cells: &cells,
                status,
            },
        );
    }
}
