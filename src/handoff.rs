//! Control thread -> audio thread handoff of rebuilt reverb state
//!
//! Two lock-free SPSC ring buffers:
//! - `outgoing`: freshly built states, pushed by the controller
//! - `retired`: states the engine has replaced, pushed back so that their
//!   buffers are freed on the control thread instead of the audio thread
//!
//! ```text
//!  controller ──Box<ReverbState>──▶ engine
//!  controller ◀──Box<ReverbState>── engine (retired)
//! ```

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::engine::ReverbState;
use crate::error::{ReverbError, ReverbResult};

/// Rebuilds that may be in flight before the controller reports `HandoffFull`
pub const HANDOFF_CAPACITY: usize = 4;

/// Control-thread end
pub struct StateSender {
    outgoing: HeapProd<Box<ReverbState>>,
    returned: HeapCons<Box<ReverbState>>,
}

/// Audio-thread end
pub struct StateReceiver {
    incoming: HeapCons<Box<ReverbState>>,
    retired: HeapProd<Box<ReverbState>>,
}

/// Create a connected sender/receiver pair
pub fn state_channel(capacity: usize) -> (StateSender, StateReceiver) {
    let capacity = capacity.max(1);
    let (outgoing, incoming) = HeapRb::<Box<ReverbState>>::new(capacity).split();
    // One extra slot so the engine can always retire what it replaces
    let (retired, returned) = HeapRb::<Box<ReverbState>>::new(capacity + 1).split();

    (
        StateSender { outgoing, returned },
        StateReceiver { incoming, retired },
    )
}

impl StateSender {
    /// Queue a state for the engine. Never blocks.
    pub fn send(&mut self, state: Box<ReverbState>) -> ReverbResult<()> {
        self.collect_retired();
        self.outgoing
            .try_push(state)
            .map_err(|_| ReverbError::HandoffFull)
    }

    /// Free states the engine has handed back; returns how many were freed
    pub fn collect_retired(&mut self) -> usize {
        let mut freed = 0;
        while let Some(state) = self.returned.try_pop() {
            drop(state);
            freed += 1;
        }
        freed
    }

    /// States sent but not yet picked up by the engine
    pub fn pending(&self) -> usize {
        self.outgoing.occupied_len()
    }
}

impl StateReceiver {
    /// Next queued state, if any
    pub fn receive(&mut self) -> Option<Box<ReverbState>> {
        self.incoming.try_pop()
    }

    /// Hand a replaced state back to the control thread
    pub fn retire(&mut self, state: Box<ReverbState>) {
        // Only fails when the controller has stopped collecting; the state is
        // then dropped here
        let _ = self.retired.try_push(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartitionPadding;
    use crate::filter_bank::FilterBankBuilder;
    use crate::impulse::ImpulseResponse;

    fn state(generation: u64) -> Box<ReverbState> {
        let bank = FilterBankBuilder::new(16, PartitionPadding::Exact)
            .build(&ImpulseResponse::unit("unit", 44100))
            .unwrap();
        Box::new(ReverbState::new(bank, generation))
    }

    #[test]
    fn test_states_arrive_in_order() {
        let (mut sender, mut receiver) = state_channel(4);
        sender.send(state(1)).unwrap();
        sender.send(state(2)).unwrap();
        assert_eq!(sender.pending(), 2);

        assert_eq!(receiver.receive().unwrap().generation(), 1);
        assert_eq!(receiver.receive().unwrap().generation(), 2);
        assert!(receiver.receive().is_none());
    }

    #[test]
    fn test_full_queue_reports_handoff_full() {
        let (mut sender, _receiver) = state_channel(2);
        sender.send(state(1)).unwrap();
        sender.send(state(2)).unwrap();
        assert!(matches!(sender.send(state(3)), Err(ReverbError::HandoffFull)));
    }

    #[test]
    fn test_retired_states_return_to_sender() {
        let (mut sender, mut receiver) = state_channel(2);
        receiver.retire(state(7));
        receiver.retire(state(8));
        assert_eq!(sender.collect_retired(), 2);
        assert_eq!(sender.collect_retired(), 0);
    }
}
