use crate::app::layout::Layout;
use crate::error::GlueError;
use std::cell::RefCell;
use std::rc::Rc;

/// The page the loader draws its feedback into
pub trait PageView {
    fn show_status(&self, message: &str) -> Result<(), String>;
    fn apply_layout(&self, layout: Layout) -> Result<(), String>;
}

/// Single-sink status line. Last write wins; every message is also logged.
///
/// Reporting never fails: a view that cannot display the message only costs a
/// log line, so the caller always gets its feedback channel back.
pub struct StatusReporter {
    view: Rc<dyn PageView>,
    last: RefCell<String>,
}

impl StatusReporter {
    pub fn new(view: Rc<dyn PageView>) -> Self {
        Self {
            view,
            last: RefCell::new(String::new()),
        }
    }

    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.show(message);
    }

    pub fn report_error(&self, context: &str, err: &GlueError) {
        if err.is_cancelled() {
            log::debug!("{context}: {err}");
            return;
        }
        let message = format!("{context}: {err}");
        log::error!("{message}");
        self.show(message);
    }

    pub fn last(&self) -> String {
        self.last.borrow().clone()
    }

    fn show(&self, message: String) {
        if let Err(e) = self.view.show_status(&message) {
            log::warn!("status line unavailable ({e}), message was: {message}");
        }
        *self.last.borrow_mut() = message;
    }
}
