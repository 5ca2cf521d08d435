use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    subscriber::DefaultGuard,
};
use tracing_subscriber::{
    EnvFilter,
    layer::{Context, Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// Installs a global fmt subscriber writing through the test harness.
///
/// Honours `RUST_LOG`, defaults to `warn`. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// One captured `tracing` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl RecordedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Captures events emitted on the current thread while its guard is alive.
///
/// Pair with `#[tokio::test]` (current-thread runtime) so spawned tasks are
/// recorded too.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self { Self::default() }

    pub fn layer(&self) -> RecordingLayer {
        RecordingLayer {
            events: Arc::clone(&self.events),
        }
    }

    /// Makes the recorder the thread-local default subscriber.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(
            tracing_subscriber::registry().with(self.layer()),
        )
    }

    pub fn events(&self) -> Vec<RecordedEvent> { self.lock().clone() }

    /// Events whose target starts with `prefix` (a crate or module path).
    pub fn events_for(&self, prefix: &str) -> Vec<RecordedEvent> {
        self.lock()
            .iter()
            .filter(|event| event.target.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) { self.lock().clear(); }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct RecordingLayer {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl<S: Subscriber> Layer<S> for RecordingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let recorded = RecordedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        };

        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(recorded);
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
        else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
        else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}
