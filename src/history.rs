// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Linear undo/redo history of immutable snapshots.
//!
//! The same type backs both the workspace-level history (whole item lists)
//! and the per-item annotation history (layer lists). The two are separate
//! values with separate cursors and never share state.

/// Snapshot stack with a cursor pointing at the current state.
///
/// Committing after an undo discards the redo tail. Undo at the first entry
/// and redo at the last entry are no-ops.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T: Clone> {
    stack: Vec<T>,
    cursor: usize,
    /// Maximum number of undo steps kept (0 keeps everything)
    limit: usize,
}

impl<T: Clone> History<T> {
    pub fn new(initial: T) -> Self {
        Self::with_limit(initial, 0)
    }

    pub fn with_limit(initial: T, limit: usize) -> Self {
        Self {
            stack: vec![initial],
            cursor: 0,
            limit,
        }
    }

    /// Append a snapshot after the cursor, dropping any redo entries.
    pub fn commit(&mut self, value: T) {
        self.stack.truncate(self.cursor + 1);
        self.stack.push(value);
        if self.limit > 0 && self.stack.len() > self.limit + 1 {
            let overflow = self.stack.len() - (self.limit + 1);
            self.stack.drain(..overflow);
        }
        self.cursor = self.stack.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.stack[self.cursor].clone())
    }

    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.stack[self.cursor].clone())
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> &T {
        &self.stack[self.cursor]
    }

    /// Drop every entry and start over from `value`.
    pub fn reset(&mut self, value: T) {
        self.stack.clear();
        self.stack.push(value);
        self.cursor = 0;
    }

    /// All stored snapshots, oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = &T> {
        self.stack.iter()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::History;

    #[test]
    fn test_undo_redo_flow() {
        let mut history = History::new(vec![1]);
        history.commit(vec![1, 2]);
        history.commit(vec![1, 2, 3]);

        assert_eq!(history.undo(), Some(vec![1, 2]));
        assert_eq!(history.undo(), Some(vec![1]));
        assert_eq!(history.undo(), None);

        assert_eq!(history.redo(), Some(vec![1, 2]));
        history.commit(vec![9]);
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), &vec![9]);
    }

    #[test]
    fn test_undo_n_then_redo_n_restores_latest() {
        let mut history = History::new(0);
        for value in 1..=5 {
            history.commit(value);
        }
        for _ in 0..5 {
            history.undo();
        }
        assert_eq!(history.current(), &0);
        let mut last = None;
        for _ in 0..5 {
            last = history.redo();
        }
        assert_eq!(last, Some(5));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_limit_drops_oldest_entries() {
        let mut history = History::with_limit(0, 2);
        history.commit(1);
        history.commit(2);
        history.commit(3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Some(2));
        assert_eq!(history.undo(), Some(1));
        assert_eq!(history.undo(), None);
    }
}
