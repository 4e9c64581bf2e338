// vizboard_app/src/transport.rs

//! The feed-transport seam and an in-process implementation of it.

use crate::error::DashboardError;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};
use vizboard_core::messages::{FeedMessage, MessageType};

// =========================================================================
// == Transport Vocabulary ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Minimum interval between deliveries, if any.
    pub throttle_ms: Option<u64>,
}

/// One inbound message, tagged with the subscription it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub subscription: SubscriptionId,
    pub topic: String,
    pub message: FeedMessage,
}

/// Where a transport pushes deliveries. The dashboard drains it in arrival
/// order on its own thread of control.
pub type Inbox = Rc<RefCell<VecDeque<Delivery>>>;

pub fn new_inbox() -> Inbox {
    Rc::new(RefCell::new(VecDeque::new()))
}

/// Request body shared by the map save and load services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFileRequest {
    pub file_path: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReply {
    pub success: bool,
    pub message: String,
}

// =========================================================================
// == The Transport Contract ==
// =========================================================================

/// The contract for anything that can carry feeds to and from the robot.
///
/// Only discovery and service calls are asynchronous. Subscribing,
/// unsubscribing and publishing complete immediately; deliveries are pushed
/// into the `Inbox` given at subscribe time.
#[allow(async_fn_in_trait)]
pub trait FeedTransport {
    /// Names of the feeds currently carrying `message_type`.
    async fn list_available(&self, message_type: MessageType) -> Result<Vec<String>, DashboardError>;

    fn subscribe(
        &mut self,
        topic: &str,
        message_type: MessageType,
        options: SubscribeOptions,
        inbox: Inbox,
    ) -> Result<SubscriptionId, DashboardError>;

    /// Stops deliveries for `id`. Returns false if it was not live.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    fn publish(&mut self, topic: &str, message: FeedMessage, latched: bool) -> Result<(), DashboardError>;

    async fn call_service(
        &mut self,
        service: &str,
        request: MapFileRequest,
    ) -> Result<ServiceReply, DashboardError>;
}

// =========================================================================
// == In-Process Loopback ==
// =========================================================================

pub type ServiceHandler = Box<dyn FnMut(&MapFileRequest) -> Result<ServiceReply, String>>;

#[derive(Debug)]
struct TopicEntry {
    message_type: MessageType,
    latched: Option<FeedMessage>,
}

#[derive(Debug)]
struct Subscriber {
    topic: String,
    options: SubscribeOptions,
    inbox: Inbox,
}

/// A transport whose "network" is a map of named topics in memory. Used by
/// the replay tool and the tests.
///
/// Publishing delivers synchronously to every live subscriber, in
/// subscription order. Latched messages are replayed to later subscribers.
#[derive(Default)]
pub struct LoopbackTransport {
    next_id: u64,
    topics: BTreeMap<String, TopicEntry>,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
    services: BTreeMap<String, ServiceHandler>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a topic and its type without publishing on it.
    pub fn advertise(&mut self, topic: &str, message_type: MessageType) -> Result<(), DashboardError> {
        match self.topics.get(topic) {
            Some(entry) if entry.message_type != message_type => Err(DashboardError::TopicTypeMismatch {
                topic: topic.to_string(),
                expected: message_type.to_string(),
                actual: entry.message_type.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                debug!(topic, %message_type, "Advertised topic");
                self.topics.insert(
                    topic.to_string(),
                    TopicEntry {
                        message_type,
                        latched: None,
                    },
                );
                Ok(())
            }
        }
    }

    pub fn register_service<F>(&mut self, name: &str, handler: F)
    where
        F: FnMut(&MapFileRequest) -> Result<ServiceReply, String> + 'static,
    {
        self.services.insert(name.to_string(), Box::new(handler));
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.values().filter(|s| s.topic == topic).count()
    }

    pub fn subscription_options(&self, id: SubscriptionId) -> Option<SubscribeOptions> {
        self.subscribers.get(&id).map(|s| s.options)
    }

    /// The latched message currently held on `topic`, if any.
    pub fn latched(&self, topic: &str) -> Option<&FeedMessage> {
        self.topics.get(topic)?.latched.as_ref()
    }
}

impl FeedTransport for LoopbackTransport {
    async fn list_available(&self, message_type: MessageType) -> Result<Vec<String>, DashboardError> {
        Ok(self
            .topics
            .iter()
            .filter(|(_, entry)| entry.message_type == message_type)
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn subscribe(
        &mut self,
        topic: &str,
        message_type: MessageType,
        options: SubscribeOptions,
        inbox: Inbox,
    ) -> Result<SubscriptionId, DashboardError> {
        self.advertise(topic, message_type)?;
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        if let Some(latched) = self.topics.get(topic).and_then(|e| e.latched.clone()) {
            inbox.borrow_mut().push_back(Delivery {
                subscription: id,
                topic: topic.to_string(),
                message: latched,
            });
        }
        self.subscribers.insert(
            id,
            Subscriber {
                topic: topic.to_string(),
                options,
                inbox,
            },
        );
        debug!(topic, subscription = %id, "Subscribed");
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(subscription = %id, "Unsubscribed");
        }
        removed
    }

    fn publish(&mut self, topic: &str, message: FeedMessage, latched: bool) -> Result<(), DashboardError> {
        self.advertise(topic, message.message_type())?;
        for (id, sub) in self.subscribers.iter().filter(|(_, s)| s.topic == topic) {
            sub.inbox.borrow_mut().push_back(Delivery {
                subscription: *id,
                topic: topic.to_string(),
                message: message.clone(),
            });
        }
        if latched {
            if let Some(entry) = self.topics.get_mut(topic) {
                entry.latched = Some(message);
            }
        }
        Ok(())
    }

    async fn call_service(
        &mut self,
        service: &str,
        request: MapFileRequest,
    ) -> Result<ServiceReply, DashboardError> {
        let handler = self
            .services
            .get_mut(service)
            .ok_or_else(|| DashboardError::ServiceUnavailable(service.to_string()))?;
        let reply = handler(&request).map_err(|message| DashboardError::ServiceFailed {
            service: service.to_string(),
            message,
        })?;
        info!(service, success = reply.success, "Service replied: {}", reply.message);
        Ok(reply)
    }
}
