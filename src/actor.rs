use crossbeam_channel::{SendError, unbounded};
use tracing::Span;

pub mod broadcast;
pub mod reactor;

/// Sending half of an event channel. Each event travels with the span that
/// was current when it was sent.
pub struct Sender<Event>(crossbeam_channel::Sender<(Span, Event)>);
pub type Receiver<Event> = crossbeam_channel::Receiver<(Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = unbounded();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    pub fn send(&self, event: Event) {
        // A closed channel only means nobody is listening anymore.
        _ = self.try_send(event)
    }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> std::fmt::Debug for Sender<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender").field("pending", &self.0.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (tx, rx) = channel();
        tx.send(1);
        tx.clone().send(2);
        let got: Vec<i32> = rx.try_iter().map(|(_, e)| e).collect();
        assert_eq!(got, vec![1, 2]);
    }

    #[test]
    fn send_after_receiver_dropped_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.send("late");
        assert!(tx.try_send("late").is_err());
    }
}
