//! Latest weather summary, shared between one writer and many readers.

use std::sync::Arc;

use tokio::sync::watch;

/// Prefix of the ambient system message built from the cached summary.
pub const AMBIENT_PREFIX: &str = "Current local weather: ";

/// Write half, owned by the refresher task.
#[derive(Debug)]
pub struct WeatherPublisher {
    tx: watch::Sender<Option<Arc<str>>>,
}

impl WeatherPublisher {
    /// Replaces the cached summary. Readers see it on their next borrow.
    pub fn publish(&self, summary: Arc<str>) {
        self.tx.send_replace(Some(summary));
    }
}

/// Read half, cloned into every handler.
#[derive(Debug, Clone)]
pub struct WeatherCache {
    rx: watch::Receiver<Option<Arc<str>>>,
}

impl WeatherCache {
    /// Creates an empty cache and its single publisher.
    pub fn channel() -> (WeatherPublisher, WeatherCache) {
        let (tx, rx) = watch::channel(None);
        (WeatherPublisher { tx }, WeatherCache { rx })
    }

    /// A cache that always holds `summary`.
    pub fn fixed(summary: impl Into<Arc<str>>) -> Self {
        let (_tx, rx) = watch::channel(Some(summary.into()));
        Self { rx }
    }

    /// Snapshot of the latest summary, if a refresh has succeeded yet.
    pub fn current(&self) -> Option<Arc<str>> {
        self.rx.borrow().clone()
    }

    /// The ambient system directive to inject, if any.
    pub fn ambient_directive(&self) -> Option<String> {
        self.current()
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("{AMBIENT_PREFIX}{s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_latest_publish() {
        let (publisher, cache) = WeatherCache::channel();
        let reader = cache.clone();
        assert_eq!(cache.current(), None);
        assert_eq!(cache.ambient_directive(), None);

        publisher.publish(Arc::from("Sunny."));
        publisher.publish(Arc::from("Light rain."));

        assert_eq!(reader.current().as_deref(), Some("Light rain."));
        assert_eq!(
            reader.ambient_directive().as_deref(),
            Some("Current local weather: Light rain.")
        );
    }

    #[test]
    fn fixed_cache_outlives_its_sender() {
        let cache = WeatherCache::fixed("Foggy.");
        assert_eq!(cache.current().as_deref(), Some("Foggy."));
    }
}
