use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::models::{ChangeEvent, FeedTable};

pub type ChangeSender = broadcast::Sender<ChangeEvent>;
pub type ChangeReceiver = broadcast::Receiver<ChangeEvent>;

const CHANNEL_CAPACITY: usize = 256;

/// Per-table change-event fan-out, optionally narrowed by a column equality
/// predicate. Receivers are plain broadcast handles: dropping one on
/// disconnect unsubscribes it, and a slow consumer only lags its own channel.
pub struct RealtimeHub {
    channels: Arc<RwLock<HashMap<ChannelKey, ChangeSender>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChannelKey {
    table: FeedTable,
    filter: Option<(String, String)>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to a table's change stream, optionally filtered by a single
    /// `column=value` equality predicate.
    pub async fn subscribe(
        &self,
        table: FeedTable,
        filter: Option<(String, String)>,
    ) -> ChangeReceiver {
        let key = ChannelKey { table, filter };
        let mut channels = self.channels.write().await;

        match channels.get(&key) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
                debug!("Opened change channel for {:?}", key);
                channels.insert(key, sender);
                receiver
            }
        }
    }

    /// Fan one change event out to the table channel and every filtered
    /// channel whose predicate matches. Channels with no live receivers are
    /// swept on the way through.
    pub async fn publish(&self, event: ChangeEvent) {
        let mut channels = self.channels.write().await;

        channels.retain(|key, sender| {
            if key.table != event.table {
                return sender.receiver_count() > 0;
            }

            let matches = match &key.filter {
                Some((column, value)) => event.matches(column, value),
                None => true,
            };

            if matches {
                // A send error only means every receiver is gone
                let _ = sender.send(event.clone());
            }

            sender.receiver_count() > 0
        });
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
