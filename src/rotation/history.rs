//! Bounded recency history for one rotation pool.

use std::collections::VecDeque;

/// Most-recent-last window of selected names.
///
/// Recording a name already in the window moves it to the newest slot, so a
/// name never occupies two slots. Once full, the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct RotationHistory {
    window: usize,
    entries: VecDeque<String>,
}

impl RotationHistory {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            entries: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a name, returning the entry evicted to make room, if any.
    pub fn record(&mut self, name: &str) -> Option<String> {
        if let Some(pos) = self.entries.iter().position(|e| e == name) {
            self.entries.remove(pos);
        }
        self.entries.push_back(name.to_string());
        if self.entries.len() > self.window {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Distance from the newest slot: 0 for the most recent entry.
    pub fn age_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().rev().position(|e| e == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e == name)
    }

    /// Entries newest first.
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(String::as_str)
    }
}
