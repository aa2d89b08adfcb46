use anyhow::Result;
use async_trait::async_trait;

use super::Reply;
use crate::ui::{buttons::button_ids, format};

/// Button presses on one paginated message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageCollector: Send {
    /// Custom id of the next press, or `None` once the inactivity timeout
    /// elapsed.
    async fn next_press(&mut self) -> Option<String>;

    /// Replaces the paginated message in answer to the last press.
    async fn update(&mut self, reply: Reply) -> Result<()>;

    /// Sends an ephemeral notice to whoever pressed last.
    async fn notify(&mut self, reply: Reply) -> Result<()>;

    /// Removes the paginated message.
    async fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Previous,
    Next,
}

impl PageAction {
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            button_ids::PREVIOUS_PAGE => Some(Self::Previous),
            button_ids::NEXT_PAGE => Some(Self::Next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStep {
    pub page: usize,
    /// The press tried to move past the first or last page.
    pub at_boundary: bool,
}

/// Page cursor that always stays within `0..total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePaginator {
    page: usize,
    total_pages: usize,
}

impl QueuePaginator {
    pub fn new(item_count: usize) -> Self {
        Self {
            page: 0,
            total_pages: format::total_pages(item_count, format::TRACKS_PER_PAGE),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        self.page + 1 >= self.total_pages
    }

    /// Recomputes the page count after the queue changed, clamping the cursor.
    pub fn resize(&mut self, item_count: usize) {
        self.total_pages = format::total_pages(item_count, format::TRACKS_PER_PAGE);
        self.page = self.page.min(self.total_pages - 1);
    }

    pub fn apply(&mut self, action: PageAction) -> PageStep {
        let at_boundary = match action {
            PageAction::Previous => self.is_first(),
            PageAction::Next => self.is_last(),
        };

        if !at_boundary {
            self.page = match action {
                PageAction::Previous => self.page - 1,
                PageAction::Next => self.page + 1,
            };
        }

        PageStep {
            page: self.page,
            at_boundary,
        }
    }
}
