//! Edge highlighting derived from a trace and its cursor.

use crate::definition::{State, Symbol};
use crate::trace::Configuration;
use serde::{Deserialize, Serialize};

/// A drawn transition arrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: State,
    pub symbol: Symbol,
    pub to: State,
}

impl Edge {
    pub fn new(from: impl Into<State>, symbol: impl Into<Symbol>, to: impl Into<State>) -> Self {
        Self {
            from: from.into(),
            symbol: symbol.into(),
            to: to.into(),
        }
    }
}

/// Returns the edge taken by step `k` (`1 <= k < trace.len()`).
pub fn edge_at(trace: &[Configuration], k: usize) -> Option<Edge> {
    if k == 0 {
        return None;
    }
    let prev = trace.get(k - 1)?;
    let curr = trace.get(k)?;
    let symbol = curr.via.clone()?;

    Some(Edge {
        from: prev.state.clone(),
        symbol,
        to: curr.state.clone(),
    })
}

/// Returns the single active edge for the frame at `cursor`: the transition
/// consumed by the step that produced the configuration under the cursor.
pub fn active_edge(trace: &[Configuration], cursor: usize) -> Option<Edge> {
    edge_at(trace, cursor)
}

/// Returns true if `edge` is the active edge at `cursor`.
pub fn is_edge_active(trace: &[Configuration], cursor: usize, edge: &Edge) -> bool {
    active_edge(trace, cursor).as_ref() == Some(edge)
}

/// Every distinct edge taken in steps `1..=cursor`, in first-use order.
pub fn traversed_edges(trace: &[Configuration], cursor: usize) -> Vec<Edge> {
    let last = cursor.min(trace.len().saturating_sub(1));
    let mut edges: Vec<Edge> = Vec::new();
    for k in 1..=last {
        if let Some(edge) = edge_at(trace, k) {
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }
    edges
}
