// vizboard_app/src/dashboard.rs

//! The single-threaded event loop that owns every widget.
//!
//! All work happens in discrete steps driven from outside: queued events
//! (frame tree, view, pointer, icon), inbound deliveries and due timers.
//! Nothing blocks. Each step mutates widget state first and only then
//! re-renders the widgets it touched, so a render always sees a fully
//! applied update.

use crate::binding::FeedBinding;
use crate::config::DashboardConfig;
use crate::discovery::{discover, TopicChoices};
use crate::error::{DashboardError, UserNotice};
use crate::input::{IconAction, IconPress, PointerEvent};
use crate::map_service;
use crate::settings::SettingsStore;
use crate::tf::TfTree;
use crate::timers::TimerQueue;
use crate::transport::{new_inbox, Delivery, FeedTransport, Inbox, SubscriptionId};
use crate::view::PanZoomView;
use crate::widgets::{build_widget, RobotModelChange, Widget};
use nalgebra::{Isometry3, Point2};
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use vizboard_core::frames::{FrameResolver, PanControl};
use vizboard_core::messages::FeedMessage;
use vizboard_core::render::{CommandRecorder, DrawCommand};
use vizboard_core::types::{FrameId, Millis, Stamp};
use vizboard_core::waypoints::EditorEffect;

// =========================================================================
// == Events ==
// =========================================================================

/// Something the dashboard must react to, queued until the next `pump`.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// A transform or the fixed frame changed.
    FrameTreeChanged,
    /// The view was panned or zoomed.
    ViewChanged,
    Resize { width: f64, height: f64 },
    Pointer(PointerEvent),
    Icon { widget: String, action: IconAction },
}

/// Payloads of the dashboard's scheduled actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A throttled feed may deliver its held message.
    ReleaseHeld { widget: usize, subscription: SubscriptionId },
    /// A widget icon has been held long enough.
    LongPress { widget: usize },
}

/// Requests for UI the dashboard does not draw itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    OpenSettings(String),
    RefreshTopics(String),
}

struct WidgetSlot {
    widget: Box<dyn Widget>,
    canvas: CommandRecorder,
    icon: IconPress,
    dirty: bool,
}

// =========================================================================
// == The Dashboard ==
// =========================================================================

pub struct Dashboard<T: FeedTransport> {
    transport: T,
    inbox: Inbox,
    tf: TfTree,
    view: PanZoomView,
    settings: SettingsStore,
    timers: TimerQueue<TimerEvent>,
    now: Millis,
    slots: Vec<WidgetSlot>,
    events: VecDeque<DashboardEvent>,
    requests: VecDeque<UiRequest>,
    save_map_service: String,
    load_map_service: String,
}

impl<T: FeedTransport> Dashboard<T> {
    /// Builds every configured widget, letting persisted settings override
    /// configured defaults. Nothing is subscribed until `connect_all`.
    pub fn new(config: &DashboardConfig, transport: T, settings: SettingsStore) -> Result<Self, DashboardError> {
        let view = PanZoomView::from_config(&config.view);
        let slots = config
            .widgets
            .iter()
            .map(|cfg| {
                Ok(WidgetSlot {
                    widget: build_widget(cfg, &settings)?,
                    canvas: CommandRecorder::new(view.width(), view.height()),
                    icon: IconPress::default(),
                    dirty: true,
                })
            })
            .collect::<Result<Vec<_>, DashboardError>>()?;
        info!(widgets = slots.len(), "Dashboard built");

        Ok(Self {
            transport,
            inbox: new_inbox(),
            tf: TfTree::from_config(&config.dashboard.fixed_frame, &config.frames),
            view,
            settings,
            timers: TimerQueue::new(),
            now: 0,
            slots,
            events: VecDeque::new(),
            requests: VecDeque::new(),
            save_map_service: config.dashboard.save_map_service.clone(),
            load_map_service: config.dashboard.load_map_service.clone(),
        })
    }

    // --- Accessors ---

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn tf(&self) -> &TfTree {
        &self.tf
    }

    pub fn view(&self) -> &PanZoomView {
        &self.view
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn widget_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.widget.id())
    }

    pub fn widget(&self, id: &str) -> Option<&dyn Widget> {
        self.slots.iter().find(|s| s.widget.id() == id).map(|s| s.widget.as_ref())
    }

    /// The draw commands of the widget's last render.
    pub fn commands(&self, id: &str) -> Option<&[DrawCommand]> {
        self.slots.iter().find(|s| s.widget.id() == id).map(|s| s.canvas.commands())
    }

    pub fn take_requests(&mut self) -> Vec<UiRequest> {
        self.requests.drain(..).collect()
    }

    fn index_of(&self, id: &str) -> Result<usize, DashboardError> {
        self.slots
            .iter()
            .position(|s| s.widget.id() == id)
            .ok_or_else(|| DashboardError::UnknownWidget(id.to_string()))
    }

    // --- Feed Lifecycle ---

    /// Binds every feed widget to its current topic. A widget that fails to
    /// bind is logged and skipped.
    pub fn connect_all(&mut self) {
        for index in 0..self.slots.len() {
            if let Err(e) = self.reconnect(index) {
                warn!(
                    widget = self.slots[index].widget.id(),
                    topic = %self.slots[index].widget.topic(),
                    error = %e,
                    "Failed to bind feed"
                );
            }
        }
    }

    /// Switches a widget to `topic`. Feed widgets forget what they had
    /// accumulated and rebind; the waypoints widget just retargets its path.
    /// The choice is persisted either way, an empty topic included.
    pub fn select_topic(&mut self, id: &str, topic: &str) -> Result<(), DashboardError> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        if let Some(waypoints) = slot.widget.as_waypoints_mut() {
            waypoints.set_topic(topic);
        } else if slot.widget.binding().is_some() {
            slot.widget.clear_state();
            slot.dirty = true;
            if let Some(binding) = slot.widget.binding_mut() {
                binding.bind(&mut self.transport, &mut self.timers, topic, &self.inbox)?;
            }
        }
        self.persist(index)
    }

    /// Re-subscribes a feed widget to the topic it already has. Persists
    /// only when a subscription came up.
    fn reconnect(&mut self, index: usize) -> Result<(), DashboardError> {
        let Some(binding) = self.slots[index].widget.binding_mut() else {
            return Ok(());
        };
        if binding.reconnect(&mut self.transport, &mut self.timers, &self.inbox)? {
            self.persist(index)?;
        }
        Ok(())
    }

    /// Asks the transport which feeds could serve this widget. A widget
    /// without a topic adopts the first choice.
    pub async fn refresh_topics(&mut self, id: &str) -> Result<TopicChoices, DashboardError> {
        let index = self.index_of(id)?;
        let Some(message_type) = self.slots[index].widget.feed_type() else {
            return Ok(TopicChoices::default());
        };
        let current = self.slots[index].widget.topic().to_string();
        let choices = discover(&self.transport, message_type, &current).await?;
        debug!(widget = id, options = choices.options.len(), "Topics discovered");

        if current.is_empty() && !choices.selected.is_empty() {
            self.select_topic(id, &choices.selected)?;
        } else if !current.is_empty() {
            let bound = self.slots[index].widget.binding().map(FeedBinding::is_bound);
            if bound == Some(false) {
                self.reconnect(index)?;
            }
        }
        Ok(choices)
    }

    // --- Collaborator Changes ---

    pub fn post(&mut self, event: DashboardEvent) {
        self.events.push_back(event);
    }

    pub fn set_transform(&mut self, child: FrameId, parent: FrameId, pose: Isometry3<f64>) {
        self.tf.set_transform(child, parent, pose);
        self.post(DashboardEvent::FrameTreeChanged);
    }

    pub fn set_fixed_frame(&mut self, fixed: FrameId) {
        self.tf.set_fixed_frame(fixed);
        self.post(DashboardEvent::FrameTreeChanged);
    }

    pub fn set_view(&mut self, center: Option<Point2<f64>>, pixels_per_meter: Option<f64>) {
        if let Some(center) = center {
            self.view.set_center(center);
        }
        if let Some(ppm) = pixels_per_meter {
            self.view.set_zoom(ppm);
        }
        self.post(DashboardEvent::ViewChanged);
    }

    pub fn set_map_opacity(&mut self, id: &str, opacity: f64) -> Result<(), DashboardError> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        let map = slot.widget.as_map_mut().ok_or_else(|| DashboardError::WrongWidgetKind {
            widget: id.to_string(),
            expected: "map",
        })?;
        if !map.set_opacity(opacity) {
            return Err(DashboardError::InvalidSetting {
                widget: id.to_string(),
                setting: "opacity",
            });
        }
        slot.dirty = true;
        self.persist(index)
    }

    pub fn set_pose_scale(&mut self, id: &str, scale: f64) -> Result<(), DashboardError> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        let poses = slot
            .widget
            .as_pose_array_mut()
            .ok_or_else(|| DashboardError::WrongWidgetKind {
                widget: id.to_string(),
                expected: "pose array",
            })?;
        if !poses.set_scale(scale) {
            return Err(DashboardError::InvalidSetting {
                widget: id.to_string(),
                setting: "scale",
            });
        }
        slot.dirty = true;
        self.persist(index)
    }

    /// Applies a partial robot model edit and persists the whole entry.
    pub fn set_robot_model(&mut self, id: &str, change: RobotModelChange) -> Result<(), DashboardError> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        let robot = slot.widget.as_robot_mut().ok_or_else(|| DashboardError::WrongWidgetKind {
            widget: id.to_string(),
            expected: "robot model",
        })?;
        robot.update(change).map_err(|setting| DashboardError::InvalidSetting {
            widget: id.to_string(),
            setting,
        })?;
        slot.dirty = true;
        self.persist(index)
    }

    // --- Outbound ---

    /// Publishes the widget's path, latched: its points on `start`, an
    /// empty path on `stop`.
    pub fn send_waypoints(&mut self, id: &str, start: bool) -> Result<(), DashboardError> {
        let index = self.index_of(id)?;
        let frame = self.tf.fixed_frame().clone();
        let stamp = Stamp::from_millis(self.now);
        let waypoints = self.slots[index]
            .widget
            .as_waypoints_mut()
            .ok_or_else(|| DashboardError::WrongWidgetKind {
                widget: id.to_string(),
                expected: "waypoints",
            })?;
        let topic = waypoints.topic().to_string();
        if topic.is_empty() {
            return Err(DashboardError::NoTopic(id.to_string()));
        }
        let path = waypoints.next_path(start, &frame, stamp);
        info!(widget = id, topic = %topic, poses = path.poses.len(), "Publishing path");
        self.transport.publish(&topic, FeedMessage::Path(path), true)
    }

    pub async fn save_map(&mut self, id: &str, path: &str) -> Result<UserNotice, DashboardError> {
        let topic = self.map_topic(id)?;
        let service = self.save_map_service.clone();
        Ok(map_service::save_map(&mut self.transport, &service, path, &topic).await)
    }

    /// Asks the map server to load `path` and publish it on `topic`, or on
    /// the map widget's own topic when none is given.
    pub async fn load_map(
        &mut self,
        id: &str,
        path: &str,
        topic: Option<&str>,
    ) -> Result<UserNotice, DashboardError> {
        let own = self.map_topic(id)?;
        let topic = topic.filter(|t| !t.is_empty()).map_or(own, str::to_string);
        let service = self.load_map_service.clone();
        Ok(map_service::load_map(&mut self.transport, &service, path, &topic).await)
    }

    fn map_topic(&mut self, id: &str) -> Result<String, DashboardError> {
        let index = self.index_of(id)?;
        let map = self.slots[index]
            .widget
            .as_map_mut()
            .ok_or_else(|| DashboardError::WrongWidgetKind {
                widget: id.to_string(),
                expected: "map",
            })?;
        Ok(map.topic().to_string())
    }

    // --- The Loop ---

    /// Moves the clock to `now` (never backwards), fires every timer that
    /// has come due in order, then pumps.
    pub fn advance_to(&mut self, now: Millis) {
        self.now = self.now.max(now);
        while let Some((_, event)) = self.timers.pop_due(self.now) {
            self.on_timer(event);
        }
        self.pump();
    }

    /// Handles queued events, then drains deliveries in arrival order, then
    /// re-renders every widget whose state or inputs changed.
    pub fn pump(&mut self) {
        while let Some(event) = self.events.pop_front() {
            self.on_event(event);
        }
        loop {
            let Some(delivery) = self.inbox.borrow_mut().pop_front() else {
                break;
            };
            self.on_delivery(delivery);
        }
        self.render_dirty();
    }

    fn on_event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::FrameTreeChanged | DashboardEvent::ViewChanged => self.mark_all_dirty(),
            DashboardEvent::Resize { width, height } => {
                self.view.resize(width, height);
                for slot in &mut self.slots {
                    slot.canvas.resize(width, height);
                }
                self.mark_all_dirty();
            }
            DashboardEvent::Pointer(pointer) => self.on_pointer(&pointer),
            DashboardEvent::Icon { widget, action } => {
                if let Err(e) = self.on_icon(&widget, action) {
                    warn!(widget = %widget, error = %e, "Icon event failed");
                }
            }
        }
    }

    /// Active waypoint editors see the pointer first; then the view pans
    /// if panning is still enabled.
    fn on_pointer(&mut self, pointer: &PointerEvent) {
        for index in 0..self.slots.len() {
            let Some(waypoints) = self.slots[index].widget.as_waypoints_mut() else {
                continue;
            };
            if !waypoints.is_active() {
                continue;
            }
            let outcome = waypoints.handle_pointer(pointer, &self.view);
            self.apply_effects(index, &outcome.effects);
        }
        if self.view.handle_pointer(pointer) {
            self.mark_all_dirty();
        }
    }

    fn on_icon(&mut self, id: &str, action: IconAction) -> Result<(), DashboardError> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        match action {
            IconAction::Press => slot
                .icon
                .press(self.now, &mut self.timers, TimerEvent::LongPress { widget: index }),
            IconAction::Release | IconAction::Leave | IconAction::Cancel => slot.icon.disarm(&mut self.timers),
            IconAction::Click => {
                if !slot.icon.click() {
                    debug!(widget = id, "Click ended a long press; ignored");
                    return Ok(());
                }
                if let Some(waypoints) = slot.widget.as_waypoints_mut() {
                    let effects = waypoints.toggle_active();
                    self.apply_effects(index, &effects);
                } else {
                    self.open_settings(index);
                }
            }
        }
        Ok(())
    }

    fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::ReleaseHeld { widget, subscription } => {
                let now = self.now;
                let released = self.slots[widget]
                    .widget
                    .binding_mut()
                    .and_then(|binding| binding.release(subscription, now));
                if let Some(message) = released {
                    self.apply(widget, message);
                }
            }
            TimerEvent::LongPress { widget } => {
                self.slots[widget].icon.fired();
                self.open_settings(widget);
            }
        }
    }

    fn open_settings(&mut self, index: usize) {
        let widget = &self.slots[index].widget;
        let id = widget.id().to_string();
        if widget.feed_type().is_some() {
            self.requests.push_back(UiRequest::RefreshTopics(id.clone()));
        }
        self.requests.push_back(UiRequest::OpenSettings(id));
    }

    fn on_delivery(&mut self, delivery: Delivery) {
        let owner = self.slots.iter().position(|s| {
            s.widget.binding().and_then(FeedBinding::subscription) == Some(delivery.subscription)
        });
        let Some(index) = owner else {
            debug!(
                topic = %delivery.topic,
                subscription = %delivery.subscription,
                "Dropping delivery for a replaced subscription"
            );
            return;
        };
        let now = self.now;
        let Some(binding) = self.slots[index].widget.binding_mut() else {
            return;
        };
        let admitted = binding.admit(delivery, now, &mut self.timers, |subscription| TimerEvent::ReleaseHeld {
            widget: index,
            subscription,
        });
        if let Some(message) = admitted {
            self.apply(index, message);
        }
    }

    fn apply(&mut self, index: usize, message: FeedMessage) {
        let slot = &mut self.slots[index];
        match slot.widget.apply(message, &self.tf) {
            Ok(()) => slot.dirty = true,
            Err(e) => warn!(widget = slot.widget.id(), error = %e, "Failed to apply message"),
        }
    }

    fn apply_effects(&mut self, index: usize, effects: &[EditorEffect]) {
        for effect in effects {
            match *effect {
                EditorEffect::SetPanning(enabled) => self.view.set_panning_enabled(enabled),
                EditorEffect::Redraw => self.slots[index].dirty = true,
                EditorEffect::Persist => {
                    if let Err(e) = self.persist(index) {
                        warn!(widget = self.slots[index].widget.id(), error = %e, "Failed to persist settings");
                    }
                }
            }
        }
    }

    fn persist(&mut self, index: usize) -> Result<(), DashboardError> {
        let widget = &self.slots[index].widget;
        let entry = widget.settings()?;
        self.settings.put(widget.id(), &entry)?;
        info!(widget = widget.id(), "Widget settings persisted");
        Ok(())
    }

    fn mark_all_dirty(&mut self) {
        for slot in &mut self.slots {
            slot.dirty = true;
        }
    }

    fn render_dirty(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.dirty) {
            slot.widget.render(&mut slot.canvas, &self.tf, &self.view);
            slot.dirty = false;
        }
    }
}
