//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Render every event as one JSON line on stdout
//! - Configure log level at startup (idempotent re-initialization)
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Field precedence: correlation < span fields < event fields < canonical
//! - A field that cannot be encoded degrades to a string, the line is kept
//! - Re-initialization swaps the writer and filter in place, it never stacks
//!   a second output

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{span, Event, Subscriber};
use tracing_subscriber::filter::{Directive, EnvFilter};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, Layered, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::reload;

use crate::config::LoggingConfig;
use crate::observability::record::LogEvent;
use crate::observability::tracing::Tracer;

/// The subscriber built by [`subscriber`] and installed by [`init`].
pub type JsonSubscriber = Layered<JsonLogLayer, Layered<reload::Layer<EnvFilter, Registry>, Registry>>;

static INSTALLED: Mutex<Option<LogHandle>> = Mutex::new(None);

/// Errors raised while setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),

    #[error("invalid log filter '{directive}': {source}")]
    InvalidFilter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("failed to reload log filter: {0}")]
    Reload(#[from] reload::Error),

    #[error("a different global subscriber is already installed")]
    ForeignSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Parse a level name. Accepts `warning` for WARN and `critical`/`fatal` for
/// ERROR, case-insensitively.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" | "critical" | "fatal" => Some(LevelFilter::ERROR),
        "off" | "none" => Some(LevelFilter::OFF),
        _ => None,
    }
}

thread_local! {
    /// Set while a [`Structured`] value is being formatted on this thread.
    static STRUCTURED_FORMATTED: Cell<bool> = const { Cell::new(false) };
}

/// A value rendered as JSON text, embedded by [`JsonLogLayer`] as nested JSON.
///
/// Only values built by [`structured`] are embedded. Any other field keeps
/// its text as a JSON string, whatever that text looks like.
#[derive(Clone)]
pub struct Structured {
    text: String,
    is_json: bool,
}

impl fmt::Display for Structured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_json {
            STRUCTURED_FORMATTED.with(|flag| flag.set(true));
        }
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Structured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Render a value as a JSON log field.
///
/// Values that fail to serialize yield a placeholder string instead of an
/// error.
pub fn structured<T: Serialize + ?Sized>(value: &T) -> Structured {
    match serde_json::to_string(value) {
        Ok(text) => Structured {
            text,
            is_json: true,
        },
        Err(err) => Structured {
            text: format!("<unserializable: {err}>"),
            is_json: false,
        },
    }
}

/// Live settings read by [`JsonLogLayer`] on every event.
struct LogSettings {
    logger_name: String,
    writer: BoxMakeWriter,
    correlation: Option<Arc<dyn Tracer>>,
}

impl LogSettings {
    fn new(config: &LoggingConfig, writer: BoxMakeWriter, tracer: Option<Arc<dyn Tracer>>) -> Self {
        Self {
            logger_name: config.logger_name.clone(),
            writer,
            correlation: tracer.filter(|_| config.inject_trace_context),
        }
    }
}

/// Handle to a built subscriber, used to apply a new configuration to it.
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    settings: Arc<ArcSwap<LogSettings>>,
}

impl LogHandle {
    /// Replace the level filter, writer, logger name and tracer.
    ///
    /// The previous writer stops receiving events as soon as this returns.
    pub fn reconfigure<W>(
        &self,
        config: &LoggingConfig,
        writer: W,
        tracer: Option<Arc<dyn Tracer>>,
    ) -> Result<(), LoggingError>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = build_filter(config)?;
        self.filter.reload(filter)?;
        self.settings.store(Arc::new(LogSettings::new(
            config,
            BoxMakeWriter::new(writer),
            tracer,
        )));
        Ok(())
    }

    /// Logger name currently written on every line.
    pub fn logger_name(&self) -> String {
        self.settings.load().logger_name.clone()
    }
}

/// Build the JSON subscriber without installing it.
pub fn subscriber<W>(
    config: &LoggingConfig,
    writer: W,
    tracer: Option<Arc<dyn Tracer>>,
) -> Result<(JsonSubscriber, LogHandle), LoggingError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, filter_handle) = reload::Layer::new(build_filter(config)?);
    let settings = Arc::new(ArcSwap::from_pointee(LogSettings::new(
        config,
        BoxMakeWriter::new(writer),
        tracer,
    )));

    let subscriber = Registry::default().with(filter).with(JsonLogLayer {
        settings: Arc::clone(&settings),
    });

    Ok((
        subscriber,
        LogHandle {
            filter: filter_handle,
            settings,
        },
    ))
}

/// Install JSON logging to stdout as the process-wide subscriber.
pub fn init(
    config: &LoggingConfig,
    tracer: Option<Arc<dyn Tracer>>,
) -> Result<LogHandle, LoggingError> {
    init_with_writer(config, std::io::stdout, tracer)
}

/// Install JSON logging to `writer` as the process-wide subscriber.
///
/// Calling this again reconfigures the installed subscriber rather than
/// adding a second one, so each event is still written exactly once.
pub fn init_with_writer<W>(
    config: &LoggingConfig,
    writer: W,
    tracer: Option<Arc<dyn Tracer>>,
) -> Result<LogHandle, LoggingError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(handle) = installed.as_ref() {
        handle.reconfigure(config, writer, tracer)?;
        return Ok(handle.clone());
    }

    let (subscriber, handle) = subscriber(config, writer, tracer)?;
    tracing::subscriber::set_global_default(subscriber)?;
    *installed = Some(handle.clone());

    Ok(handle)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let level =
        parse_level(&config.level).ok_or_else(|| LoggingError::UnknownLevel(config.level.clone()))?;

    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("");

    for (target, target_level) in &config.filters {
        let target_level = parse_level(target_level)
            .ok_or_else(|| LoggingError::UnknownLevel(target_level.clone()))?;
        filter = filter.add_directive(filter_directive(target, target_level)?);
    }

    Ok(filter)
}

/// Parse the `target=level` directive for one per-target filter.
pub fn filter_directive(target: &str, level: LevelFilter) -> Result<Directive, LoggingError> {
    let directive = format!("{target}={level}");
    directive
        .parse::<Directive>()
        .map_err(|source| LoggingError::InvalidFilter { directive, source })
}

/// Fields recorded on a span, kept in the span's extensions.
#[derive(Debug, Default)]
struct SpanFields(BTreeMap<String, Value>);

/// `tracing_subscriber` layer that writes each event as one JSON line.
///
/// Writes happen on the calling thread and are flushed immediately, so the
/// line is visible to a log collector as soon as the macro returns.
pub struct JsonLogLayer {
    settings: Arc<ArcSwap<LogSettings>>,
}

impl<S> Layer<S> for JsonLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.fields));
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(fields) => fields.0.extend(visitor.fields),
            None => extensions.insert(SpanFields(visitor.fields)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let settings = self.settings.load();
        let mut fields = BTreeMap::new();

        if let Some(tracer) = &settings.correlation {
            let correlation = tracer.log_correlation_fields();
            for (key, value) in correlation.fields() {
                fields.insert(key.to_string(), Value::String(value.to_string()));
            }
        }

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(span_fields) = extensions.get::<SpanFields>() {
                    fields.extend(span_fields.0.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        fields.extend(visitor.fields);

        let meta = event.metadata();
        let record = LogEvent {
            timestamp: Utc::now(),
            level: meta.level().to_string(),
            logger: settings.logger_name.clone(),
            target: meta.target().to_string(),
            file: meta.file().map(str::to_string),
            line: meta.line(),
            message: visitor.message.unwrap_or_default(),
            fields,
        };

        let line = record.to_json_line();
        let mut writer = settings.writer.make_writer();
        if let Err(err) = writer.write_all(line.as_bytes()).and_then(|()| writer.flush()) {
            eprintln!("failed to write log line: {err}");
        }
    }
}

/// Collects `tracing` fields as JSON values.
#[derive(Default)]
struct FieldVisitor {
    fields: BTreeMap<String, Value>,
    message: Option<String>,
}

impl FieldVisitor {
    fn insert_text(&mut self, field: &Field, text: String) {
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.fields.insert(field.name().to_string(), Value::String(text));
        }
    }
}

/// Format `value`, reporting whether a [`Structured`] value wrote the text.
fn format_debug(value: &dyn fmt::Debug) -> (String, bool) {
    STRUCTURED_FORMATTED.with(|flag| flag.set(false));
    let text = format!("{value:?}");
    (text, STRUCTURED_FORMATTED.with(|flag| flag.replace(false)))
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert_text(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON form.
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.fields.insert(field.name().to_string(), value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let (text, is_structured) = format_debug(value);
        if is_structured && field.name() != "message" {
            if let Ok(nested) = serde_json::from_str::<Value>(&text) {
                self.fields.insert(field.name().to_string(), nested);
                return;
            }
        }
        self.insert_text(field, text);
    }
}
