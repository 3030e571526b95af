//! Signal dispatcher for the EnOcean integration
//!
//! The Dispatcher connects entities with the radio transport. Telegrams
//! travel on two signals:
//! - `ReceiveMessage`: telegrams received by the dongle, consumed by entities
//! - `SendMessage`: telegrams emitted by entities, consumed by the transport
//!
//! A separate stream carries integration events (state changes, button
//! presses) for the host.

use dashmap::DashMap;
use enocean_core::events::IntegrationEvent;
use enocean_core::Telegram;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default channel capacity for signal subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// The signals telegrams are dispatched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Telegram received from a device
    ReceiveMessage,
    /// Telegram to be transmitted to a device
    SendMessage,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::ReceiveMessage => "enocean.receive_message",
            Signal::SendMessage => "enocean.send_message",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound seam used by entities to hand telegrams to the transport
pub trait TelegramSender: Send + Sync {
    fn send_telegram(&self, telegram: Telegram);
}

/// The dispatcher for telegrams and integration events
pub struct Dispatcher {
    /// Map of signals to their broadcast senders
    signals: DashMap<Signal, broadcast::Sender<Telegram>>,
    /// Sender for integration events
    events: broadcast::Sender<IntegrationEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new dispatcher with specified channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            signals: DashMap::new(),
            events,
            capacity,
        }
    }

    fn sender(&self, signal: Signal) -> broadcast::Sender<Telegram> {
        self.signals
            .entry(signal)
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel(self.capacity);
                tx
            })
            .clone()
    }

    /// Subscribe to telegrams on a signal
    pub fn subscribe(&self, signal: Signal) -> broadcast::Receiver<Telegram> {
        trace!(signal = %signal, "Subscribing to signal");
        self.sender(signal).subscribe()
    }

    /// Dispatch a telegram to all subscribers of a signal
    pub fn dispatch(&self, signal: Signal, telegram: Telegram) {
        debug!(
            signal = %signal,
            sender = %telegram.sender,
            destination = %telegram.destination,
            "Dispatching telegram"
        );

        if let Some(sender) = self.signals.get(&signal) {
            // Send errors just mean no active receivers
            if sender.send(telegram).is_err() {
                trace!(signal = %signal, "No receivers for telegram");
            }
        }
    }

    /// Deliver a telegram received by the dongle
    pub fn receive_message(&self, telegram: Telegram) {
        self.dispatch(Signal::ReceiveMessage, telegram);
    }

    /// Hand a telegram to the transport
    pub fn send_message(&self, telegram: Telegram) {
        self.dispatch(Signal::SendMessage, telegram);
    }

    /// Subscribe to integration events
    pub fn subscribe_events(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.events.subscribe()
    }

    /// Fire an integration event
    pub fn fire(&self, event: IntegrationEvent) {
        debug!(event_type = event.event_type(), "Firing event");
        let _ = self.events.send(event);
    }

    /// Get the number of signals with at least one subscription
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramSender for Dispatcher {
    fn send_telegram(&self, telegram: Telegram) {
        self.send_message(telegram);
    }
}

/// Thread-safe wrapper for Dispatcher
pub type SharedDispatcher = Arc<Dispatcher>;

#[cfg(test)]
mod tests {
    use super::*;
    use enocean_core::events::ButtonPressedData;
    use enocean_core::{EnOceanId, Rorg};

    fn telegram(byte: u8) -> Telegram {
        Telegram::new(Rorg::Rps, vec![byte], EnOceanId::new([0, 0, 0, 1]))
    }

    #[tokio::test]
    async fn test_subscribe_and_dispatch() {
        let dispatcher = Dispatcher::new();
        let mut rx = dispatcher.subscribe(Signal::ReceiveMessage);

        dispatcher.receive_message(telegram(0x10));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.payload, vec![0x10]);
    }

    #[tokio::test]
    async fn test_no_cross_signal_pollution() {
        let dispatcher = Dispatcher::new();
        let mut rx_receive = dispatcher.subscribe(Signal::ReceiveMessage);
        let mut rx_send = dispatcher.subscribe(Signal::SendMessage);

        dispatcher.send_telegram(telegram(0x30));

        let sent = rx_send.recv().await.unwrap();
        assert_eq!(sent.payload, vec![0x30]);
        assert!(rx_receive.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let dispatcher = Dispatcher::new();
        let mut rx1 = dispatcher.subscribe(Signal::SendMessage);
        let mut rx2 = dispatcher.subscribe(Signal::SendMessage);

        dispatcher.send_message(telegram(0x01));

        assert_eq!(rx1.recv().await.unwrap().payload, vec![0x01]);
        assert_eq!(rx2.recv().await.unwrap().payload, vec![0x01]);
        assert_eq!(dispatcher.signal_count(), 1);
    }

    #[test]
    fn test_dispatch_without_subscribers_is_silent() {
        let dispatcher = Dispatcher::new();
        dispatcher.send_message(telegram(0x01));
        dispatcher.fire(IntegrationEvent::ButtonPressed(ButtonPressedData {
            id: EnOceanId::new([0, 0, 0, 1]),
            pushed: Some(true),
            which: Some(0),
            onoff: Some(1),
        }));
        assert_eq!(dispatcher.signal_count(), 0);
    }

    #[test]
    fn test_events_are_delivered() {
        let dispatcher = Dispatcher::new();
        let mut rx = dispatcher.subscribe_events();

        let data = ButtonPressedData {
            id: EnOceanId::new([0, 0x2D, 0xCF, 0x45]),
            pushed: Some(false),
            which: Some(1),
            onoff: Some(0),
        };
        dispatcher.fire(IntegrationEvent::ButtonPressed(data.clone()));

        let event = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(event, IntegrationEvent::ButtonPressed(data));
        assert_eq!(event.event_type(), "button_pressed");
    }
}
