// vizboard_app/src/binding.rs

use crate::error::DashboardError;
use crate::timers::{TimerId, TimerQueue};
use crate::transport::{Delivery, FeedTransport, Inbox, SubscribeOptions, SubscriptionId};
use tracing::debug;
use vizboard_core::messages::{FeedMessage, MessageType};
use vizboard_core::types::Millis;

/// One widget's hold on one feed.
///
/// At most one subscription is live at any time: binding to a new topic
/// always drops the old subscription first. Deliveries that arrive tagged
/// with any other subscription are stale and are discarded.
///
/// With a throttle configured, a message arriving sooner than the interval
/// after the last accepted one is held back, replacing any message already
/// held, and released by a timer when the interval has passed.
#[derive(Debug)]
pub struct FeedBinding {
    message_type: MessageType,
    throttle_ms: Option<u64>,
    topic: String,
    subscription: Option<SubscriptionId>,
    last_accepted: Option<Millis>,
    held: Option<FeedMessage>,
    release_timer: Option<TimerId>,
}

impl FeedBinding {
    pub fn new(message_type: MessageType, throttle_ms: Option<u64>) -> Self {
        Self {
            message_type,
            throttle_ms,
            topic: String::new(),
            subscription: None,
            last_accepted: None,
            held: None,
            release_timer: None,
        }
    }

    /// Sets the topic to bind to later, without subscribing.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn is_bound(&self) -> bool {
        self.subscription.is_some()
    }

    /// Points the binding at `topic`. The previous subscription (if any) is
    /// dropped first. An empty topic leaves the binding idle. Returns
    /// whether a subscription is now live.
    pub fn bind<T: FeedTransport, P>(
        &mut self,
        transport: &mut T,
        timers: &mut TimerQueue<P>,
        topic: &str,
        inbox: &Inbox,
    ) -> Result<bool, DashboardError> {
        self.teardown(transport, timers);
        self.topic = topic.to_string();
        if topic.is_empty() {
            debug!(message_type = %self.message_type, "No topic chosen; binding stays idle");
            return Ok(false);
        }
        let options = SubscribeOptions {
            throttle_ms: self.throttle_ms,
        };
        let id = transport.subscribe(topic, self.message_type, options, inbox.clone())?;
        debug!(topic, subscription = %id, "Feed bound");
        self.subscription = Some(id);
        Ok(true)
    }

    /// Re-subscribes to the current topic.
    pub fn reconnect<T: FeedTransport, P>(
        &mut self,
        transport: &mut T,
        timers: &mut TimerQueue<P>,
        inbox: &Inbox,
    ) -> Result<bool, DashboardError> {
        let topic = self.topic.clone();
        self.bind(transport, timers, &topic, inbox)
    }

    /// Drops the live subscription and anything held back for it.
    pub fn teardown<T: FeedTransport, P>(&mut self, transport: &mut T, timers: &mut TimerQueue<P>) {
        if let Some(id) = self.subscription.take() {
            transport.unsubscribe(id);
            debug!(topic = %self.topic, subscription = %id, "Feed unbound");
        }
        if let Some(timer) = self.release_timer.take() {
            timers.cancel(timer);
        }
        self.held = None;
        self.last_accepted = None;
    }

    /// Decides what to do with an inbound delivery at time `now`. Returns
    /// the message if it should be applied immediately. A throttled message
    /// is held, and a release timer built by `on_release` is scheduled if
    /// none is pending.
    pub fn admit<P>(
        &mut self,
        delivery: Delivery,
        now: Millis,
        timers: &mut TimerQueue<P>,
        on_release: impl FnOnce(SubscriptionId) -> P,
    ) -> Option<FeedMessage> {
        if Some(delivery.subscription) != self.subscription {
            debug!(
                topic = %delivery.topic,
                subscription = %delivery.subscription,
                "Dropping stale delivery"
            );
            return None;
        }
        if delivery.message.message_type() != self.message_type {
            debug!(topic = %delivery.topic, "Dropping delivery of the wrong type");
            return None;
        }

        match (self.throttle_ms, self.last_accepted) {
            (Some(interval), Some(last)) if now.saturating_sub(last) < interval => {
                debug!(topic = %delivery.topic, "Delivery throttled; holding latest");
                self.held = Some(delivery.message);
                if self.release_timer.is_none() {
                    let timer = timers.schedule(last + interval, on_release(delivery.subscription));
                    self.release_timer = Some(timer);
                }
                None
            }
            _ => {
                self.last_accepted = Some(now);
                Some(delivery.message)
            }
        }
    }

    /// Releases the held message when its timer fires. A timer belonging to
    /// an earlier subscription releases nothing.
    pub fn release(&mut self, subscription: SubscriptionId, now: Millis) -> Option<FeedMessage> {
        if Some(subscription) != self.subscription {
            return None;
        }
        self.release_timer = None;
        let message = self.held.take()?;
        self.last_accepted = Some(now);
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{new_inbox, LoopbackTransport};
    use vizboard_core::messages::{MarkerArray, OccupancyGrid};

    fn grid(width: u32) -> FeedMessage {
        let mut g = OccupancyGrid::default();
        g.info.width = width;
        FeedMessage::OccupancyGrid(g)
    }

    fn next(inbox: &Inbox) -> Delivery {
        inbox.borrow_mut().pop_front().unwrap()
    }

    #[test]
    fn empty_topic_leaves_binding_idle() {
        let mut transport = LoopbackTransport::new();
        let mut timers = TimerQueue::<()>::new();
        let mut binding = FeedBinding::new(MessageType::MarkerArray, None);
        assert!(!binding.bind(&mut transport, &mut timers, "", &new_inbox()).unwrap());
        assert!(!binding.is_bound());
    }

    #[test]
    fn rebinding_never_double_subscribes() {
        let mut transport = LoopbackTransport::new();
        let mut timers = TimerQueue::<()>::new();
        let inbox = new_inbox();
        let mut binding = FeedBinding::new(MessageType::MarkerArray, None);

        binding.bind(&mut transport, &mut timers, "/a", &inbox).unwrap();
        binding.bind(&mut transport, &mut timers, "/a", &inbox).unwrap();
        binding.bind(&mut transport, &mut timers, "/b", &inbox).unwrap();
        assert_eq!(transport.subscriber_count("/a"), 0);
        assert_eq!(transport.subscriber_count("/b"), 1);
    }

    #[test]
    fn queued_delivery_from_replaced_subscription_is_stale() {
        let mut transport = LoopbackTransport::new();
        let mut timers = TimerQueue::<()>::new();
        let inbox = new_inbox();
        let mut binding = FeedBinding::new(MessageType::MarkerArray, None);

        binding.bind(&mut transport, &mut timers, "/a", &inbox).unwrap();
        transport
            .publish("/a", FeedMessage::MarkerArray(MarkerArray::default()), false)
            .unwrap();
        binding.bind(&mut transport, &mut timers, "/b", &inbox).unwrap();

        let in_flight = next(&inbox);
        assert!(binding.admit(in_flight, 0, &mut timers, |_| ()).is_none());
    }

    #[test]
    fn throttled_message_is_held_and_released_by_timer() {
        let mut transport = LoopbackTransport::new();
        let mut timers = TimerQueue::new();
        let inbox = new_inbox();
        let mut binding = FeedBinding::new(MessageType::OccupancyGrid, Some(2000));
        binding.bind(&mut transport, &mut timers, "/map", &inbox).unwrap();

        for w in 1..=3 {
            transport.publish("/map", grid(w), false).unwrap();
        }
        assert_eq!(binding.admit(next(&inbox), 100, &mut timers, |s| s), Some(grid(1)));
        assert_eq!(binding.admit(next(&inbox), 500, &mut timers, |s| s), None);
        assert_eq!(binding.admit(next(&inbox), 900, &mut timers, |s| s), None);

        // One timer, due when the interval since the first accept elapses.
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(2099), None);
        let (_, sub) = timers.pop_due(2100).unwrap();
        assert_eq!(binding.release(sub, 2100), Some(grid(3)));
        assert_eq!(binding.release(sub, 2100), None);
    }

    #[test]
    fn teardown_cancels_the_release_timer() {
        let mut transport = LoopbackTransport::new();
        let mut timers = TimerQueue::new();
        let inbox = new_inbox();
        let mut binding = FeedBinding::new(MessageType::OccupancyGrid, Some(2000));
        binding.bind(&mut transport, &mut timers, "/map", &inbox).unwrap();
        transport.publish("/map", grid(1), false).unwrap();
        transport.publish("/map", grid(2), false).unwrap();
        binding.admit(next(&inbox), 0, &mut timers, |s| s);
        binding.admit(next(&inbox), 10, &mut timers, |s| s);
        assert_eq!(timers.len(), 1);

        binding.bind(&mut transport, &mut timers, "/other", &inbox).unwrap();
        assert!(timers.is_empty());
    }
}
