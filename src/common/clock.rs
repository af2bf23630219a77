//! Lamport logical clock
//!
//! One clock per node. Rules:
//! - local event: `c <- c + 1`
//! - send event: `c <- c + 1`, the new value travels with the message
//! - receive event: `c <- max(c, received) + 1`
//!
//! The clock only orders a node's own events for diagnostics; nothing
//! else in the cluster gates on it.

use crate::common::NodeId;

#[derive(Debug, Clone)]
pub struct LamportClock {
    owner: NodeId,
    counter: u64,
}

impl LamportClock {
    pub fn new(owner: NodeId) -> Self {
        Self { owner, counter: 0 }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Local event
    pub fn tick(&mut self) -> u64 {
        self.counter += 1;
        tracing::trace!(node = self.owner, counter = self.counter, "local tick");
        self.counter
    }

    /// Send event; the returned value is attached to the outgoing message
    pub fn send_event(&mut self) -> u64 {
        self.counter += 1;
        tracing::debug!(node = self.owner, counter = self.counter, "send");
        self.counter
    }

    /// Receive event carrying the sender's counter
    pub fn receive_event(&mut self, received: u64) -> u64 {
        self.counter = self.counter.max(received) + 1;
        tracing::debug!(
            node = self.owner,
            received,
            counter = self.counter,
            "receive"
        );
        self.counter
    }

    /// Current value, no side effect
    pub fn now(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_and_send_increment() {
        let mut clock = LamportClock::new(1);
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.send_event(), 2);
        assert_eq!(clock.now(), 2);
        assert_eq!(clock.owner(), 1);
    }

    #[test]
    fn test_receive_jumps_past_remote() {
        let mut clock = LamportClock::new(1);
        clock.tick();
        assert_eq!(clock.receive_event(10), 11);
        // a stale stamp still advances the local counter
        assert_eq!(clock.receive_event(3), 12);
    }

    #[test]
    fn test_counter_never_decreases() {
        let mut clock = LamportClock::new(4);
        let mut previous = clock.now();
        for step in 0..200u64 {
            let value = match step % 3 {
                0 => clock.tick(),
                1 => clock.send_event(),
                _ => {
                    let before = clock.now();
                    let received = (step * 7) % 50;
                    let value = clock.receive_event(received);
                    assert!(value > before.max(received));
                    value
                }
            };
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_now_is_read_only() {
        let mut clock = LamportClock::new(2);
        clock.send_event();
        let a = clock.now();
        let b = clock.now();
        assert_eq!(a, b);
    }
}
