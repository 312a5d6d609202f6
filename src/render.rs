use crate::aggregate::aggregate;
use crate::date_key::DateKey;
use crate::models::{Aggregation, DayCell, Record};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Presentation sinks. Implementations must not feed back into the session.
pub trait Renderer {
    fn render_table(&mut self, view: &Aggregation);
    fn render_chart(&mut self, view: &Aggregation);
    fn render_selector(&mut self, cells: &[DayCell]);
    /// Called last on every render, and alone when a fetch fails.
    fn render_status(&mut self, status: &Status);
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Status {
    /// Set while the most recent fetch failed.
    pub error: Option<String>,
    pub empty_selection: bool,
    pub last_updated: Option<String>,
}

/// What changed since the last render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Selection,
    Records,
    FetchFailed(String),
}

/// Everything the render step reads, borrowed from the session.
pub struct Snapshot<'a> {
    pub records: &'a [Record],
    pub active: &'a BTreeSet<DateKey>,
    pub excluded: &'a BTreeSet<String>,
    pub cells: &'a [DayCell],
    pub status: Status,
}

/// Sole subscriber of session mutations: aggregates and drives the renderer.
#[derive(Debug)]
pub struct RenderPipeline<R> {
    renderer: R,
    renders: u64,
}

impl<R: Renderer> RenderPipeline<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            renders: 0,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn on_mutation(&mut self, mutation: &Mutation, snapshot: Snapshot<'_>) {
        if let Mutation::FetchFailed(message) = mutation {
            // the cached records are unchanged, only the status line moves
            debug!(%message, "rendering fetch failure");
            self.renderer.render_status(&snapshot.status);
            return;
        }

        let view = aggregate(snapshot.records, snapshot.active, snapshot.excluded);
        self.renders += 1;
        debug!(
            ?mutation,
            dates = view.dates.len(),
            brands = view.brands.len(),
            render = self.renders,
            "recomputed pivot"
        );
        self.renderer.render_table(&view);
        self.renderer.render_chart(&view);
        self.renderer.render_selector(snapshot.cells);
        self.renderer.render_status(&snapshot.status);
    }
}
