//! Browser history capability.

use tracing::debug;
use vitrine_core::error::VitrineResult;
use vitrine_core::location::Location;

pub trait History {
    /// Current location.
    fn location(&self) -> &Location;

    /// Add an entry for `target` (resolved against the current location).
    fn push_state(&mut self, target: &str);

    /// Rewrite the current entry without adding to the back stack.
    fn replace_state(&mut self, target: &str);
}

/// In-memory history stack with back/forward support.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Location>,
    index: usize,
    pushes: usize,
    replaces: usize,
}

impl MemoryHistory {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            pushes: 0,
            replaces: 0,
        }
    }

    pub fn open(href: &str) -> VitrineResult<Self> {
        Ok(Self::new(Location::parse(href)?))
    }

    /// Step back one entry. Returns `false` at the start of the stack.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_count(&self) -> usize {
        self.pushes
    }

    pub fn replace_count(&self) -> usize {
        self.replaces
    }

    fn resolve(&self, target: &str) -> Option<Location> {
        match self.location().join(target) {
            Ok(next) => Some(next),
            Err(e) => {
                debug!(url = %target, error = %e, "Ignoring unresolvable history target");
                None
            }
        }
    }
}

impl History for MemoryHistory {
    fn location(&self) -> &Location {
        &self.entries[self.index]
    }

    fn push_state(&mut self, target: &str) {
        let Some(next) = self.resolve(target) else {
            return;
        };
        self.entries.truncate(self.index + 1);
        self.entries.push(next);
        self.index += 1;
        self.pushes += 1;
    }

    fn replace_state(&mut self, target: &str) {
        let Some(next) = self.resolve(target) else {
            return;
        };
        self.entries[self.index] = next;
        self.replaces += 1;
    }
}
