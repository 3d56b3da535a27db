//! Transient notification sink.

use log::{info, warn};

/// Single `notify(text, is_error)` surface; rendering is the host's concern.
pub trait Notifier {
    fn notify(&mut self, text: &str, is_error: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Keeps notices in memory until the host takes them.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    notices: Vec<Notice>,
}

impl BufferedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.as_slice()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&mut self, text: &str, is_error: bool) {
        self.notices.push(Notice {
            text: text.to_string(),
            is_error,
        });
    }
}

/// Writes notices to the log; used by the CLI.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, text: &str, is_error: bool) {
        if is_error {
            warn!("event=notify module=desktop status=error text={text:?}");
        } else {
            info!("event=notify module=desktop status=ok text={text:?}");
        }
    }
}
