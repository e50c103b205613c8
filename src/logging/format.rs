use serde::Deserialize;

/// Custom time stamp format for logging, using
/// [chrono strftime](https://docs.rs/chrono/latest/chrono/format/strftime/index.html) syntax.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct TimestampFormat(pub(crate) String);

/// The default format is "%Y-%m-%d %H:%M:%S".
impl Default for TimestampFormat {
    fn default() -> Self {
        Self("%Y-%m-%d %H:%M:%S".to_string())
    }
}

/// Defines the format to be used for logging, including target and timestamp.
///
/// # Fields:
/// - `target`: whether the target of the trace event is included in the formatted output.
/// - `timestamp`: the format of the timestamp prefixing every line.
#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
pub struct LoggingFormat {
    #[serde(default)]
    pub(crate) target: bool,
    #[serde(default)]
    pub(crate) timestamp: TimestampFormat,
}
