//! Change notifications from the aggregator.

use crate::domain::SearchResponse;
use tokio::sync::mpsc;

/// Receives aggregator state changes.
///
/// The aggregator keeps only a weak reference, so the owner of the observer
/// decides its lifetime.
pub trait SearchObserver: Send + Sync {
    /// The query text changed and all accumulated pages were dropped
    fn on_query_changed(&self);

    /// A page was fetched and decoded; `response` is that page alone
    fn on_data_updated(&self, response: &SearchResponse);
}

/// Notification as delivered over a channel
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    QueryChanged,
    DataUpdated(Box<SearchResponse>),
}

/// Forwards notifications onto a channel so they are handled on whichever
/// task drains the receiver.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SearchEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SearchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SearchEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("search event receiver dropped");
        }
    }
}

impl SearchObserver for ChannelObserver {
    fn on_query_changed(&self) {
        self.send(SearchEvent::QueryChanged);
    }

    fn on_data_updated(&self, response: &SearchResponse) {
        self.send(SearchEvent::DataUpdated(Box::new(response.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Collection;

    #[tokio::test]
    async fn test_channel_observer_preserves_order() {
        let (observer, mut rx) = ChannelObserver::new();
        let response = SearchResponse {
            collection: Collection::new("http://images-api.nasa.gov/search?q=x&page=1"),
        };

        observer.on_query_changed();
        observer.on_data_updated(&response);

        assert_eq!(rx.recv().await, Some(SearchEvent::QueryChanged));
        assert_eq!(
            rx.recv().await,
            Some(SearchEvent::DataUpdated(Box::new(response)))
        );
    }

    #[test]
    fn test_channel_observer_tolerates_closed_receiver() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.on_query_changed();
    }
}
