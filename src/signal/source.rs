use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::signal::ScopeError;

/// Something that can hand over already-buffered text lines without blocking.
pub trait LineSource {
    /// `Ok(None)` when nothing is buffered right now.
    fn next_line(&mut self) -> Result<Option<String>, ScopeError>;
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<String>,
}

impl ManualSource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            queue: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.queue.push_back(line.into());
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl LineSource for ManualSource {
    fn next_line(&mut self) -> Result<Option<String>, ScopeError> {
        Ok(self.queue.pop_front())
    }
}

/// Receiving end of the bounded queue filled by the transport thread.
pub struct QueueSource {
    rx: Receiver<String>,
}

impl QueueSource {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }
}

impl LineSource for QueueSource {
    fn next_line(&mut self) -> Result<Option<String>, ScopeError> {
        match self.rx.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ScopeError::Transport(
                "transport thread has stopped".into(),
            )),
        }
    }
}
