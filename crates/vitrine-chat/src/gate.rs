//! Mutual exclusion between chat persists and polls.

use std::sync::Mutex;

use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Persisting,
    Polling,
}

/// At most one persist or poll runs at a time.
///
/// A persist waits for the gate; a poll only takes it when it is free and
/// otherwise skips its tick. The phase returns to [`SyncPhase::Idle`] when the
/// [`GateGuard`] drops.
#[derive(Debug, Default)]
pub struct SyncGate {
    permit: AsyncMutex<()>,
    phase: Mutex<SyncPhase>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_phase(&self, phase: SyncPhase) {
        *self.phase.lock().unwrap_or_else(|p| p.into_inner()) = phase;
    }

    /// Enter [`SyncPhase::Persisting`], waiting out any poll or earlier persist.
    pub async fn begin_persist(&self) -> GateGuard<'_> {
        let permit = self.permit.lock().await;
        self.set_phase(SyncPhase::Persisting);
        GateGuard { gate: self, _permit: permit }
    }

    /// Enter [`SyncPhase::Polling`] if the gate is free.
    pub fn try_begin_poll(&self) -> Option<GateGuard<'_>> {
        let permit = self.permit.try_lock().ok()?;
        self.set_phase(SyncPhase::Polling);
        Some(GateGuard { gate: self, _permit: permit })
    }
}

pub struct GateGuard<'a> {
    gate: &'a SyncGate,
    _permit: AsyncMutexGuard<'a, ()>,
}

impl GateGuard<'_> {
    pub fn phase(&self) -> SyncPhase {
        self.gate.phase()
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.set_phase(SyncPhase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn poll_skips_while_persisting() {
        let gate = SyncGate::new();
        let persist = gate.begin_persist().await;
        assert_eq!(gate.phase(), SyncPhase::Persisting);
        assert!(gate.try_begin_poll().is_none());

        drop(persist);
        assert_eq!(gate.phase(), SyncPhase::Idle);

        let poll = gate.try_begin_poll().unwrap();
        assert_eq!(poll.phase(), SyncPhase::Polling);
        assert!(gate.try_begin_poll().is_none());
    }
}
