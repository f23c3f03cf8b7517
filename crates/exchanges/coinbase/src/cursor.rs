/// Position within a backward scan of a product's trade history.
///
/// `Open { after: None }` is the newest page. The scan only moves toward
/// older trades; once exhausted it never reopens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeCursor {
    product_id: String,
    state: CursorState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    Open { after: Option<String> },
    Exhausted,
}

impl TradeCursor {
    pub fn open(product_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            state: CursorState::Open { after: None },
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn has_more(&self) -> bool {
        matches!(self.state, CursorState::Open { .. })
    }

    /// Cursor value to send with the next request.
    pub fn after(&self) -> Option<&str> {
        match &self.state {
            CursorState::Open { after } => after.as_deref(),
            CursorState::Exhausted => None,
        }
    }

    /// Record a successfully fetched page. A missing `next_after` or an
    /// empty page ends the scan.
    pub fn advance(&mut self, next_after: Option<String>, page_len: usize) {
        self.state = match next_after {
            Some(after) if page_len > 0 => CursorState::Open { after: Some(after) },
            _ => CursorState::Exhausted,
        };
    }
}
