//! Bridge from `tracing` spans to Micromegas thread-local spans.
//!
//! Bevy (with the `trace` feature) emits `tracing` spans for every schedule
//! run and every system execution. [`MicromegasBridgeLayer`] listens for
//! spans whose metadata name is in its allow-list and forwards them as
//! Micromegas named-scope events, labelled by their `name` field when they
//! carry one. Everything else is ignored.

use micromegas_tracing::dispatch::{on_begin_named_scope, on_end_named_scope};
use micromegas_tracing::intern_string::intern_string;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

// All bridged spans share a single static source location.
micromegas_tracing::static_span_location!(BRIDGE_LOCATION);

/// Span names bridged by [`MicromegasBridgeLayer::default`].
pub const DEFAULT_BRIDGED_SPANS: &[&str] = &["schedule"];

/// Interned label stored in a bridged span's extensions.
struct BridgedSpan {
    name: &'static str,
}

/// Pulls the `name` field out of a span's attributes.
#[derive(Default)]
struct NameVisitor {
    name: Option<String>,
}

impl Visit for NameVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "name" {
            self.name = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "name" && self.name.is_none() {
            self.name = Some(format!("{:?}", value));
        }
    }
}

/// Forwards allow-listed `tracing` spans into Micromegas.
pub struct MicromegasBridgeLayer {
    span_names: Vec<&'static str>,
}

impl Default for MicromegasBridgeLayer {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGED_SPANS)
    }
}

impl MicromegasBridgeLayer {
    pub fn new(span_names: &[&'static str]) -> Self {
        Self {
            span_names: span_names.to_vec(),
        }
    }

    fn bridges(&self, span_name: &str) -> bool {
        self.span_names.contains(&span_name)
    }
}

impl<S> Layer<S> for MicromegasBridgeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let span_name = attrs.metadata().name();
        if !self.bridges(span_name) {
            return;
        }

        let mut visitor = NameVisitor::default();
        attrs.record(&mut visitor);
        let label = visitor.name.unwrap_or_else(|| span_name.to_string());

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(BridgedSpan {
                name: intern_string(&label),
            });
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(data) = span.extensions().get::<BridgedSpan>() {
            on_begin_named_scope(&BRIDGE_LOCATION, data.name);
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(data) = span.extensions().get::<BridgedSpan>() {
            on_end_named_scope(&BRIDGE_LOCATION, data.name);
        }
    }
}
