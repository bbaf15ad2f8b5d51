//! Observability Hooks
//!
//! Narrow logger and tracer interfaces a cache reports through. Both are
//! optional; the defaults forward to `tracing`.

use std::fmt;
use std::sync::Arc;

use tracing::span::EnteredSpan;

/// Receives error-level messages, such as snapshot encoding failures.
pub trait CacheLogger: Send + Sync {
    fn error(&self, message: &str);
}

/// Opens a span around each cache operation.
pub trait CacheTracer: Send + Sync {
    fn start_span(&self, name: &'static str, attributes: &[String]) -> Box<dyn CacheSpan>;
}

/// An open span; [`CacheSpan::end`] closes it.
pub trait CacheSpan {
    fn end(self: Box<Self>);
}

// == Tracing Defaults ==
/// Logger that emits `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl CacheLogger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Tracer that enters a `tracing` span for the duration of each operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

struct TracingSpan(EnteredSpan);

impl CacheSpan for TracingSpan {
    fn end(self: Box<Self>) {
        drop(self.0);
    }
}

impl CacheTracer for TracingTracer {
    fn start_span(&self, name: &'static str, attributes: &[String]) -> Box<dyn CacheSpan> {
        let span = tracing::info_span!("cache", op = name, peers = ?attributes);
        Box::new(TracingSpan(span.entered()))
    }
}

// == Hooks ==
/// The hooks a cache was configured with.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    logger: Option<Arc<dyn CacheLogger>>,
    tracer: Option<Arc<dyn CacheTracer>>,
    attributes: Vec<String>,
}

impl Hooks {
    pub(crate) fn new(
        logger: Option<Arc<dyn CacheLogger>>,
        tracer: Option<Arc<dyn CacheTracer>>,
        attributes: Vec<String>,
    ) -> Self {
        Self {
            logger,
            tracer,
            attributes,
        }
    }

    /// Runs `op` inside a span named `name` when a tracer is configured.
    pub(crate) fn traced<T>(&self, name: &'static str, op: impl FnOnce() -> T) -> T {
        match &self.tracer {
            Some(tracer) => {
                let span = tracer.start_span(name, &self.attributes);
                let out = op();
                span.end();
                out
            }
            None => op(),
        }
    }

    /// Reports a failure to the configured logger, or to `tracing`.
    pub(crate) fn log_error(&self, message: &str) {
        match &self.logger {
            Some(logger) => logger.error(message),
            None => tracing::error!("{message}"),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("logger", &self.logger.is_some())
            .field("tracer", &self.tracer.is_some())
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    struct RecordedSpan {
        name: &'static str,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl CacheSpan for RecordedSpan {
        fn end(self: Box<Self>) {
            self.events.lock().push(format!("end {}", self.name));
        }
    }

    impl CacheTracer for Recorder {
        fn start_span(&self, name: &'static str, attributes: &[String]) -> Box<dyn CacheSpan> {
            self.events
                .lock()
                .push(format!("start {name} {}", attributes.join(",")));
            Box::new(RecordedSpan {
                name,
                events: Arc::clone(&self.events),
            })
        }
    }

    impl CacheLogger for Recorder {
        fn error(&self, message: &str) {
            self.events.lock().push(format!("error {message}"));
        }
    }

    #[test]
    fn test_traced_brackets_operation() {
        let recorder = Arc::new(Recorder::default());
        let events = Arc::clone(&recorder.events);
        let hooks = Hooks::new(
            None,
            Some(recorder as Arc<dyn CacheTracer>),
            vec!["cache-a".to_string()],
        );

        let out = hooks.traced("get", || {
            events.lock().push("op".to_string());
            7
        });

        assert_eq!(out, 7);
        assert_eq!(
            *events.lock(),
            vec!["start get cache-a", "op", "end get"]
        );
    }

    #[test]
    fn test_log_error_uses_configured_logger() {
        let recorder = Arc::new(Recorder::default());
        let events = Arc::clone(&recorder.events);
        let hooks = Hooks::new(Some(recorder as Arc<dyn CacheLogger>), None, Vec::new());

        hooks.log_error("save failed");

        assert_eq!(*events.lock(), vec!["error save failed"]);
    }

    #[test]
    fn test_default_hooks_run_without_collaborators() {
        let hooks = Hooks::default();
        assert_eq!(hooks.traced("noop", || 1), 1);
        hooks.log_error("goes to tracing");

        let span = TracingTracer.start_span("set", &[]);
        span.end();
        TracingLogger.error("also tracing");
    }
}
