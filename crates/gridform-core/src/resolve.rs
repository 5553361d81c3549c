//! Dominant-value resolution for superposed cells

use crate::record::{Observation, SuperposedCell};
use crate::value::Value;

/// Host-side view information handed to a [`ValueResolver`].
///
/// The engine never interprets it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewContext {
    /// Identifier of the view the record is displayed in
    pub view: Option<String>,
    /// Observation contexts the view prefers, most preferred first
    pub preferred_contexts: Vec<String>,
}

impl ViewContext {
    /// Context for a named view
    pub fn for_view<S: Into<String>>(view: S) -> Self {
        Self {
            view: Some(view.into()),
            preferred_contexts: Vec::new(),
        }
    }
}

/// Picks the single scalar a formula sees for a superposed cell
pub trait ValueResolver {
    /// Resolve `cell` to its dominant value under `view`
    fn resolve(&self, cell: &SuperposedCell, view: &ViewContext) -> Value;
}

impl<F> ValueResolver for F
where
    F: Fn(&SuperposedCell, &ViewContext) -> Value,
{
    fn resolve(&self, cell: &SuperposedCell, view: &ViewContext) -> Value {
        self(cell, view)
    }
}

/// Default strategy: the observation with the latest timestamp wins.
///
/// Ties (and observations without timestamps) go to the earliest declared observation.
/// Untimestamped observations lose against any timestamped one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostRecentObservation;

impl ValueResolver for MostRecentObservation {
    fn resolve(&self, cell: &SuperposedCell, _view: &ViewContext) -> Value {
        let mut best: Option<&Observation> = None;
        for obs in cell.observations() {
            match best {
                Some(current) if obs.timestamp <= current.timestamp => {}
                _ => best = Some(obs),
            }
        }
        best.map(|obs| obs.value.clone()).unwrap_or_default()
    }
}
