//! Page identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a data page of a table.
///
/// Page ids are sequence numbers handed out by the owning table. A page's id
/// never changes while the page lives, and an id is never reused after the
/// page is deleted, so a stale file on disk can never be mistaken for a live
/// page. Physical order of pages is kept by the table's page list, not by id.
///
/// # Example
/// ```
/// use gridtabledb::PageId;
///
/// let page_id = PageId::new(42);
/// assert_eq!(page_id.0, 42);
/// assert_eq!(page_id.next(), PageId::new(43));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PageId(pub u32);

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// The id that follows this one in the table's page sequence.
    #[inline]
    pub fn next(&self) -> Self {
        PageId(self.0 + 1)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(1) < PageId::new(2));
        assert!(PageId::new(5) > PageId::new(3));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
    }

    #[test]
    fn test_page_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&PageId::new(7)).unwrap(), "7");
    }
}
