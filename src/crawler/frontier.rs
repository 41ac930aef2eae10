//! Frontier and visited bookkeeping for the crawl
//!
//! This module handles:
//! - The FIFO queue of airport codes waiting to be fetched
//! - Per-code lifecycle state (`CodeState`), which doubles as the dedup set
//! - Global concurrency limiting via a semaphore
//!
//! The frontier is owned by the coordinator task and only mutated there.

use crate::graph::AirportCode;
use crate::state::CodeState;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A code handed out for fetching, with the concurrency permit it holds
///
/// The permit must stay alive for as long as the fetch runs.
pub struct Dispatch {
    pub code: AirportCode,
    pub permit: OwnedSemaphorePermit,
}

/// Frontier manages the queue of codes to fetch and their states
pub struct Frontier {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// Codes in the Queued state, in discovery order
    queue: VecDeque<AirportCode>,

    /// State of every code ever seen; absent means Unseen
    states: HashMap<AirportCode, CodeState>,

    in_flight: usize,
    done: usize,
    abandoned: usize,
}

impl Frontier {
    /// Creates an empty frontier allowing `max_in_flight` concurrent fetches
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
            queue: VecDeque::new(),
            states: HashMap::new(),
            in_flight: 0,
            done: 0,
            abandoned: 0,
        }
    }

    /// Queues a code unless it has been seen before
    ///
    /// # Returns
    ///
    /// * `true` - The code was Unseen and is now Queued
    /// * `false` - The code is already Queued, InFlight, Done or Abandoned
    pub fn enqueue(&mut self, code: AirportCode) -> bool {
        if self.states.contains_key(&code) {
            return false;
        }
        self.states.insert(code.clone(), CodeState::Queued);
        self.queue.push_back(code);
        true
    }

    /// Takes the next queued code if a concurrency permit is free
    ///
    /// # Returns
    ///
    /// * `Some(Dispatch)` - The code is now InFlight
    /// * `None` - Nothing is queued, or the concurrency limit is reached
    pub fn next_dispatch(&mut self) -> Option<Dispatch> {
        if self.queue.is_empty() {
            return None;
        }

        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        let code = self.queue.pop_front()?;

        if self.transition(&code, CodeState::InFlight) {
            self.in_flight += 1;
        }
        tracing::trace!(%code, in_flight = self.in_flight, "Dispatching airport");

        Some(Dispatch { code, permit })
    }

    /// Marks an in-flight code as fetched and merged
    pub fn complete(&mut self, code: &AirportCode) -> bool {
        let moved = self.transition(code, CodeState::Done);
        if moved {
            self.in_flight -= 1;
            self.done += 1;
        }
        moved
    }

    /// Marks an in-flight code as dropped without data
    pub fn abandon(&mut self, code: &AirportCode) -> bool {
        let moved = self.transition(code, CodeState::Abandoned);
        if moved {
            self.in_flight -= 1;
            self.abandoned += 1;
        }
        moved
    }

    fn transition(&mut self, code: &AirportCode, next: CodeState) -> bool {
        match self.states.get_mut(code) {
            Some(state) if state.can_transition_to(next) => {
                *state = next;
                true
            }
            Some(state) => {
                tracing::warn!(%code, from = %state, to = %next, "Ignoring invalid state transition");
                false
            }
            None => {
                tracing::warn!(%code, to = %next, "Ignoring transition for unknown code");
                false
            }
        }
    }

    pub fn state(&self, code: &AirportCode) -> Option<CodeState> {
        self.states.get(code).copied()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight
    }

    pub fn done_len(&self) -> usize {
        self.done
    }

    pub fn abandoned_len(&self) -> usize {
        self.abandoned
    }

    /// Number of codes whose fetch has concluded (Done or Abandoned)
    pub fn visited_len(&self) -> usize {
        self.done + self.abandoned
    }

    /// Number of codes ever seen
    pub fn seen_len(&self) -> usize {
        self.states.len()
    }

    /// True when no code is Queued or InFlight
    pub fn is_settled(&self) -> bool {
        !self.states.values().any(CodeState::is_active)
    }

    /// Codes that ended Abandoned
    pub fn abandoned_codes(&self) -> impl Iterator<Item = &AirportCode> {
        self.states
            .iter()
            .filter(|(_, state)| **state == CodeState::Abandoned)
            .map(|(code, _)| code)
    }
}
