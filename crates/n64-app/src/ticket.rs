use crate::error::GlueError;
use std::cell::Cell;
use std::rc::Rc;

/// Issues load tickets. Only the most recently issued ticket is current, so a
/// new load supersedes every pending one.
#[derive(Clone, Default)]
pub struct LoadTickets {
    current: Rc<Cell<u64>>,
}

impl LoadTickets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> LoadTicket {
        let id = self.current.get() + 1;
        self.current.set(id);
        LoadTicket {
            id,
            current: Rc::clone(&self.current),
        }
    }
}

/// Cancellation token of one load pipeline
#[derive(Clone)]
pub struct LoadTicket {
    id: u64,
    current: Rc<Cell<u64>>,
}

impl LoadTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.get() == self.id
    }

    pub fn check(&self) -> Result<(), GlueError> {
        if self.is_current() {
            Ok(())
        } else {
            log::debug!("load #{} superseded by #{}", self.id, self.current.get());
            Err(GlueError::Cancelled)
        }
    }
}
