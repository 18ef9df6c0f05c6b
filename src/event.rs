//! Per-pair event table: at most one pending transition per unordered
//! particle pair, dispatched in deterministic time/pair order.

use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventKind {
    Empty,
    InTransition,
    Binding,
    Bound2Bound,
    Transition2Transition,
    Unbinding,
}

#[derive(Clone, Copy, Debug)]
pub struct Event {
    pub pair: (usize, usize),
    pub time: f64,
    pub start_state: u32,
    pub end_state: u32,
    pub kind: EventKind,
}

impl Event {
    fn empty(pair: (usize, usize)) -> Self {
        Self {
            pair,
            time: f64::INFINITY,
            start_state: 0,
            end_state: 0,
            kind: EventKind::Empty,
        }
    }
}

fn canonical(i: usize, j: usize) -> (usize, usize) {
    if i < j {
        (i, j)
    } else {
        (j, i)
    }
}

/// Holds the single scheduled event (if any) for each unordered pair.
/// Times are stored relative to the simulation clock; `advance` decrements
/// them all by one step's worth.
#[derive(Default)]
pub struct EventManager {
    events: BTreeMap<(usize, usize), Event>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored event for `(i,j)`, or the sentinel empty event.
    pub fn get_event(&self, i: usize, j: usize) -> Event {
        let pair = canonical(i, j);
        self.events.get(&pair).copied().unwrap_or(Event::empty(pair))
    }

    /// Inserts an event, superseding any existing one for the same pair.
    pub fn add_event(
        &mut self,
        time: f64,
        i: usize,
        j: usize,
        start_state: u32,
        end_state: u32,
        kind: EventKind,
    ) {
        let pair = canonical(i, j);
        self.events.insert(
            pair,
            Event {
                pair,
                time,
                start_state,
                end_state,
                kind,
            },
        );
    }

    pub fn remove_event(&mut self, i: usize, j: usize) {
        self.events.remove(&canonical(i, j));
    }

    /// Decrements every scheduled time by `dt`.
    pub fn advance(&mut self, dt: f64) {
        for event in self.events.values_mut() {
            event.time -= dt;
        }
    }

    /// Events with `time <= 0`, in firing order: time ascending, ties
    /// broken by pair lexicographic order.
    pub fn next_ready(&self) -> Vec<Event> {
        let mut ready: Vec<Event> = self
            .events
            .values()
            .filter(|e| e.time <= 0.0)
            .copied()
            .collect();
        ready.sort_by(|a, b| {
            a.time
                .partial_cmp(&b.time)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.pair.cmp(&b.pair))
        });
        ready
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
