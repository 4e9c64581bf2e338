// vizboard_app/src/discovery.rs

use crate::error::DashboardError;
use crate::transport::FeedTransport;
use vizboard_core::messages::MessageType;

/// The choice list shown in a widget's settings, plus the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicChoices {
    pub options: Vec<String>,
    pub selected: String,
}

impl TopicChoices {
    /// Builds the choice list from the feeds currently available.
    ///
    /// With no topic configured, the first available one is selected (or
    /// none, if the list is empty). A configured topic that is not currently
    /// available is kept and offered as an extra, manually-entered option.
    pub fn resolve(available: Vec<String>, configured: &str) -> Self {
        let mut options = available;
        let selected = if configured.is_empty() {
            options.first().cloned().unwrap_or_default()
        } else {
            if !options.iter().any(|t| t == configured) {
                options.push(configured.to_string());
            }
            configured.to_string()
        };
        Self { options, selected }
    }
}

/// Asks the transport for feeds of `message_type` and resolves the choice
/// list against the `configured` topic.
pub async fn discover<T: FeedTransport>(
    transport: &T,
    message_type: MessageType,
    configured: &str,
) -> Result<TopicChoices, DashboardError> {
    let available = transport.list_available(message_type).await?;
    Ok(TopicChoices::resolve(available, configured))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackTransport;
    use pollster::block_on;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unconfigured_picks_first_available() {
        let c = TopicChoices::resolve(names(&["/a", "/b"]), "");
        assert_eq!(c.selected, "/a");
        assert_eq!(c.options, names(&["/a", "/b"]));

        let none = TopicChoices::resolve(Vec::new(), "");
        assert_eq!(none.selected, "");
    }

    #[test]
    fn vanished_topic_is_kept_as_manual_option() {
        let c = TopicChoices::resolve(names(&["/a"]), "/gone");
        assert_eq!(c.selected, "/gone");
        assert_eq!(c.options, names(&["/a", "/gone"]));
    }

    #[test]
    fn present_topic_is_not_duplicated() {
        let c = TopicChoices::resolve(names(&["/a", "/b"]), "/b");
        assert_eq!(c.options.len(), 2);
        assert_eq!(c.selected, "/b");
    }

    #[test]
    fn discovery_filters_by_type() {
        let mut t = LoopbackTransport::new();
        t.advertise("/map", MessageType::OccupancyGrid).unwrap();
        t.advertise("/markers", MessageType::MarkerArray).unwrap();
        let c = block_on(discover(&t, MessageType::OccupancyGrid, "")).unwrap();
        assert_eq!(c.options, names(&["/map"]));
        assert_eq!(c.selected, "/map");
    }
}
