use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::rocket::Rocket;
use crate::domain::values::Channel;
use crate::storage::event_log::{EventLog, EventLogError};

/// Resolves channels to live rocket aggregates.
///
/// The first access for a channel rehydrates the aggregate from the event
/// log; later accesses hit the cache. Cache entries are whole-value
/// snapshots replaced on every save. The sequencer's lock is the sole
/// writer for any given channel, so readers only ever see a fully applied
/// state.
pub struct RocketStore {
    log: Arc<dyn EventLog>,
    cache: RwLock<HashMap<String, Rocket>>,
}

impl RocketStore {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self {
            log,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The aggregate for `channel`, rebuilt from history on first access.
    pub async fn get_by_channel(&self, channel: &Channel) -> Result<Rocket, EventLogError> {
        if let Some(rocket) = self.cache.read().await.get(channel.as_str()) {
            return Ok(rocket.clone());
        }

        let mut rocket = Rocket::new(channel.clone());
        let history = self.log.events_for_channel(channel).await?;
        if !history.is_empty() {
            rocket.load_from_history(&history);
        }

        self.cache
            .write()
            .await
            .insert(channel.as_str().to_string(), rocket.clone());

        Ok(rocket)
    }

    /// Appends the rocket's uncommitted events to the log in order, then
    /// marks them committed and refreshes the cache entry.
    ///
    /// If an append fails midway, already-appended events stay in the log
    /// and the uncommitted list is left untouched; the caller surfaces the
    /// failure.
    pub async fn save(&self, rocket: &mut Rocket) -> Result<(), EventLogError> {
        debug!(
            channel = %rocket.channel(),
            events = rocket.uncommitted_events().len(),
            "saving rocket"
        );

        for event in rocket.uncommitted_events() {
            self.log.append(event.clone()).await?;
        }
        rocket.take_uncommitted();

        self.cache
            .write()
            .await
            .insert(rocket.channel().as_str().to_string(), rocket.clone());

        Ok(())
    }

    /// Every rocket known to the event log.
    pub async fn all(&self) -> Result<Vec<Rocket>, EventLogError> {
        let mut rockets = Vec::new();
        for channel in self.log.channels().await? {
            let Ok(channel) = Channel::new(channel) else {
                continue;
            };
            rockets.push(self.get_by_channel(&channel).await?);
        }
        Ok(rockets)
    }
}
