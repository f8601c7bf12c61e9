use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("folio.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("folio.client.request_errors");
pub(crate) static CLIENT_UNSUPPORTED_STREAMS: Counter =
    Counter::new("folio.client.unsupported_streams");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("folio.stream.chunks");
pub(crate) static STREAM_BYTES: Counter = Counter::new("folio.stream.bytes");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("folio.stream.errors");
pub(crate) static STREAM_CANCELLED: Counter = Counter::new("folio.stream.cancelled");
pub(crate) static STREAM_TIMEOUTS: Counter = Counter::new("folio.stream.timeouts");
pub(crate) static STREAM_DURATION: Moments = Moments::new("folio.stream.duration_seconds");

pub(crate) static SESSION_SUBMISSIONS: Counter = Counter::new("folio.session.submissions");
pub(crate) static SESSION_IGNORED: Counter = Counter::new("folio.session.ignored");
pub(crate) static SESSION_FAILURES: Counter = Counter::new("folio.session.failures");

pub(crate) static THEME_TOGGLES: Counter = Counter::new("folio.theme.toggles");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_UNSUPPORTED_STREAMS);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_CANCELLED);
    collector.register_counter(&STREAM_TIMEOUTS);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSION_SUBMISSIONS);
    collector.register_counter(&SESSION_IGNORED);
    collector.register_counter(&SESSION_FAILURES);

    collector.register_counter(&THEME_TOGGLES);
}
