/// In-dashboard log console
///
/// The dashboard shows recent log lines in a small console under the tabs:
/// the newest message on top, at most `max_messages` kept, each coloured by
/// level. `ConsoleLog` implements `log::Log`, so once installed every
/// `info!`/`warn!`/`error!` from the crate lands in it.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::{ConsoleLog, ConsoleOptions};
///
/// let console = ConsoleLog::new(ConsoleOptions { max_messages: 2, ..Default::default() });
/// console.log_message("loaded 120 bonds", Some("whitesmoke"));
/// console.log_message("no mapping for 'NR'", Some("yellow"));
/// console.log_message("query failed", None);
///
/// assert_eq!(console.len(), 2);
/// assert_eq!(console.messages()[0].text, "query failed");
/// ```

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Console size, level threshold and level colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleOptions {
    pub max_messages: usize,
    pub level: LevelFilter,
    pub info_color: String,
    pub warn_color: String,
    pub error_color: String,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        ConsoleOptions {
            max_messages: 20,
            level: LevelFilter::Info,
            info_color: "whitesmoke".to_string(),
            warn_color: "yellow".to_string(),
            error_color: "crimson".to_string(),
        }
    }
}

impl ConsoleOptions {
    /// Default colour for a level; debug and trace lines are uncoloured.
    pub fn color_for(&self, level: Level) -> Option<&str> {
        match level {
            Level::Error => Some(&self.error_color),
            Level::Warn => Some(&self.warn_color),
            Level::Info => Some(&self.info_color),
            Level::Debug | Level::Trace => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleMessage {
    pub text: String,
    pub color: Option<String>,
}

impl ConsoleMessage {
    fn to_html(&self) -> String {
        let text = escape_html(&self.text);
        match &self.color {
            Some(color) => format!("<font color=\"{}\">{}</font>", escape_html(color), text),
            None => text,
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Bounded, newest-first message buffer.
pub struct ConsoleLog {
    options: ConsoleOptions,
    messages: Mutex<VecDeque<ConsoleMessage>>,
}

impl ConsoleLog {
    pub fn new(options: ConsoleOptions) -> Self {
        let capacity = options.max_messages;
        ConsoleLog {
            options,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn options(&self) -> &ConsoleOptions {
        &self.options
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<ConsoleMessage>> {
        self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a message on top, dropping the oldest beyond `max_messages`.
    pub fn log_message(&self, text: impl Into<String>, color: Option<&str>) {
        if self.options.max_messages == 0 {
            return;
        }

        let mut queue = self.queue();
        queue.push_front(ConsoleMessage {
            text: text.into(),
            color: color.map(String::from),
        });
        queue.truncate(self.options.max_messages);
    }

    /// Messages, newest first.
    pub fn messages(&self) -> Vec<ConsoleMessage> {
        self.queue().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    pub fn clear(&self) {
        self.queue().clear();
    }

    /// Messages as an HTML fragment, one line each.
    pub fn render_html(&self) -> String {
        let lines: Vec<String> = self.queue().iter().map(ConsoleMessage::to_html).collect();
        format!("<div style=\"margin: 3px;\">{}</div>", lines.join("<br>"))
    }

    /// Install as the global logger.
    pub fn install(self) -> Result<&'static ConsoleLog, SetLoggerError> {
        let level = self.options.level;
        let console: &'static ConsoleLog = Box::leak(Box::new(self));
        log::set_logger(console)?;
        log::set_max_level(level);
        Ok(console)
    }
}

impl Log for ConsoleLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.options.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = self.options.color_for(record.level()).map(String::from);
        self.log_message(record.args().to_string(), color.as_deref());
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_bounded() {
        let console = ConsoleLog::new(ConsoleOptions { max_messages: 3, ..Default::default() });
        for i in 0..5 {
            console.log_message(format!("message {}", i), None);
        }

        let texts: Vec<String> = console.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["message 4", "message 3", "message 2"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let console = ConsoleLog::new(ConsoleOptions { max_messages: 0, ..Default::default() });
        console.log_message("dropped", None);
        assert!(console.is_empty());
    }

    #[test]
    fn test_render_html() {
        let console = ConsoleLog::new(ConsoleOptions::default());
        console.log_message("first", None);
        console.log_message("spread < 0", Some("yellow"));

        assert_eq!(
            console.render_html(),
            "<div style=\"margin: 3px;\"><font color=\"yellow\">spread &lt; 0</font><br>first</div>"
        );

        console.clear();
        assert_eq!(console.render_html(), "<div style=\"margin: 3px;\"></div>");
    }

    #[test]
    fn test_log_records_use_level_colors() {
        let console = ConsoleLog::new(ConsoleOptions::default());

        console.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("2 unmapped ratings"))
                .build(),
        );
        console.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("filtered"))
                .build(),
        );
        console.log(
            &Record::builder()
                .level(Level::Error)
                .args(format_args!("load failed"))
                .build(),
        );

        let messages = console.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].color.as_deref(), Some("crimson"));
        assert_eq!(messages[1].text, "2 unmapped ratings");
        assert_eq!(messages[1].color.as_deref(), Some("yellow"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ConsoleOptions =
            serde_json::from_str(r#"{"max_messages": 5, "level": "WARN"}"#).unwrap();
        assert_eq!(options.max_messages, 5);
        assert_eq!(options.level, LevelFilter::Warn);
        assert_eq!(options.info_color, "whitesmoke");
    }
}
