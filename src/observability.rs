use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("streamchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("streamchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("streamchat.client.request_duration_seconds");

pub(crate) static STREAM_LINES: Counter = Counter::new("streamchat.stream.lines");
pub(crate) static STREAM_BYTES: Counter = Counter::new("streamchat.stream.bytes");
pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("streamchat.stream.fragments");
pub(crate) static STREAM_SKIPPED_EVENTS: Counter =
    Counter::new("streamchat.stream.skipped_events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("streamchat.stream.errors");

pub(crate) static CHAT_TURNS: Counter = Counter::new("streamchat.chat.turns");
pub(crate) static CHAT_ROLLBACKS: Counter = Counter::new("streamchat.chat.rollbacks");
pub(crate) static CHAT_TURN_DURATION: Moments =
    Moments::new("streamchat.chat.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_LINES);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_SKIPPED_EVENTS);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_ROLLBACKS);
    collector.register_moments(&CHAT_TURN_DURATION);
}
