use std::collections::VecDeque;

use super::capture::EventSource;
use super::types::RawInput;

/// Scripted `EventSource` for tests and simulations.
///
/// Events pushed with `push` are delivered on the next drain. Batches queued
/// with `then` are delivered one per drain, after anything pushed.
#[derive(Debug, Default, Clone)]
pub struct ScriptedEvents {
    pending: Vec<RawInput>,
    batches: VecDeque<Vec<RawInput>>,
}

impl ScriptedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RawInput) {
        self.pending.push(event);
    }

    /// Queues a batch for a later drain. An empty batch makes one drain idle.
    pub fn then(mut self, batch: impl IntoIterator<Item = RawInput>) -> Self {
        self.batches.push_back(batch.into_iter().collect());
        self
    }

    /// Events still waiting to be drained.
    pub fn remaining(&self) -> usize {
        self.pending.len() + self.batches.iter().map(Vec::len).sum::<usize>()
    }
}

impl EventSource for ScriptedEvents {
    fn drain(&mut self, out: &mut Vec<RawInput>) {
        out.append(&mut self.pending);
        if let Some(batch) = self.batches.pop_front() {
            out.extend(batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    #[test]
    fn batches_are_delivered_one_per_drain() {
        let mut src = ScriptedEvents::new()
            .then([])
            .then([RawInput::key_down(Key::A), RawInput::key_up(Key::A)]);
        src.push(RawInput::CloseRequested);

        let mut out = Vec::new();
        src.drain(&mut out);
        assert_eq!(out, vec![RawInput::CloseRequested]);

        out.clear();
        src.drain(&mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(src.remaining(), 0);

        out.clear();
        src.drain(&mut out);
        assert!(out.is_empty());
    }
}
