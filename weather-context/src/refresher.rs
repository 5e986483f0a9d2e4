//! Background task keeping the weather summary fresh.

use std::sync::Arc;
use std::time::Duration;

use ai_llm_service::CompletionClient;
use chat_history::ConversationHistory;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::WeatherPublisher;
use crate::errors::WeatherError;
use crate::source::WeatherSource;

const SUMMARY_DIRECTIVE: &str = "You turn raw weather measurements into a short description for other assistants. \
Reply with one or two plain sentences about the current local weather. No lists, no advice.";

pub struct WeatherRefresher {
    source: Arc<dyn WeatherSource>,
    completion: Arc<dyn CompletionClient>,
    publisher: WeatherPublisher,
    every: Duration,
}

impl WeatherRefresher {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        completion: Arc<dyn CompletionClient>,
        publisher: WeatherPublisher,
        every: Duration,
    ) -> Self {
        Self {
            source,
            completion,
            publisher,
            every,
        }
    }

    /// Fetches, summarises and publishes once.
    ///
    /// On error nothing is published and the previous summary stays cached.
    pub async fn refresh_once(&self) -> Result<Arc<str>, WeatherError> {
        let raw = self.source.fetch_current().await?;

        let mut history = ConversationHistory::create(SUMMARY_DIRECTIVE, std::iter::empty());
        history.append_user_prompt(raw)?;
        let summary = self.completion.invoke(history.messages()).await?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(WeatherError::EmptySummary);
        }
        let summary: Arc<str> = Arc::from(summary);
        self.publisher.publish(Arc::clone(&summary));
        Ok(summary)
    }

    /// Runs [`Self::refresh_once`] immediately and then every `every`, until
    /// `shutdown` changes or its sender is dropped. An in-flight refresh is
    /// abandoned on shutdown.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(every_secs = self.every.as_secs(), "weather refresher started");

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = interval.tick() => {
                        // The summary call has no timeout of its own.
                        let refreshed = tokio::select! {
                            result = self.refresh_once() => Some(result),
                            _ = shutdown.changed() => None,
                        };
                        match refreshed {
                            Some(Ok(summary)) => debug!(summary = %summary, "weather summary refreshed"),
                            Some(Err(e)) => warn!(error = %e, "weather refresh failed; keeping previous summary"),
                            None => {
                                info!("weather refresh interrupted by shutdown");
                                break;
                            }
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            info!("weather refresher stopped");
        })
    }
}
