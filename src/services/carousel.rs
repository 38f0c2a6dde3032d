//! Slide carousel state
//!
//! Used for the featured strip on the home page. Navigation wraps
//! around in both directions; the autoplay tick only moves when there is
//! something to move to.

use serde::Serialize;
use std::time::Duration;

/// Delay between automatic slide changes
pub const AUTOPLAY_INTERVAL: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Serialize)]
pub struct Carousel<T> {
    items: Vec<T>,
    current: usize,
    autoplay: bool,
}

impl<T> Carousel<T> {
    pub fn new(items: Vec<T>, autoplay: bool) -> Self {
        Self {
            items,
            current: 0,
            autoplay,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.current)
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    /// Index `next()` would move to
    pub fn next_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.current + 1) % self.items.len()
        }
    }

    /// Index `prev()` would move to
    pub fn prev_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.current + self.items.len() - 1) % self.items.len()
        }
    }

    pub fn next(&mut self) {
        self.current = self.next_index();
    }

    pub fn prev(&mut self) {
        self.current = self.prev_index();
    }

    /// Jump to a slide; out-of-range indexes are ignored
    pub fn go_to(&mut self, index: usize) {
        if index < self.items.len() {
            self.current = index;
        }
    }

    /// Autoplay step; returns whether the slide changed
    pub fn tick(&mut self) -> bool {
        if self.autoplay && self.items.len() > 1 {
            self.next();
            true
        } else {
            false
        }
    }
}
