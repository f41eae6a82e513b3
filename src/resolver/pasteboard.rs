//! PasteboardProvider trait — system pasteboard read/write abstraction.
//!
//! The pasteboard is modelled the way the OS stores it: an ordered list
//! of items, each holding one or more typed representations of the same
//! content. Snapshot and restore work at this granularity so nothing is
//! lost or invented across a save/act/restore cycle.

use super::ResolverError;

/// One typed representation of a pasteboard item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    /// Uniform type identifier, e.g. `public.utf8-plain-text`.
    pub kind: String,
    pub data: Vec<u8>,
}

/// One pasteboard item with all of its representations, in the order
/// the pasteboard reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteboardItem {
    pub representations: Vec<Representation>,
}

impl PasteboardItem {
    /// Single plain-text item.
    pub fn text(text: &str) -> Self {
        Self {
            representations: vec![Representation {
                kind: PLAIN_TEXT.to_string(),
                data: text.as_bytes().to_vec(),
            }],
        }
    }
}

/// Plain UTF-8 text type identifier.
pub const PLAIN_TEXT: &str = "public.utf8-plain-text";

/// Reads and writes the system pasteboard.
///
/// `Send + Sync` because the clipboard manager drives it from async
/// task contexts.
pub trait PasteboardProvider: Send + Sync {
    /// Monotonic counter bumped by the OS on every pasteboard write.
    fn change_count(&self) -> Result<i64, ResolverError>;

    /// Every item with every representation.
    ///
    /// Fails if any representation cannot be read; a partial read is
    /// never returned.
    fn read_items(&self) -> Result<Vec<PasteboardItem>, ResolverError>;

    /// Clear the pasteboard and write exactly `items`. An empty slice
    /// leaves the pasteboard empty.
    fn replace_items(&self, items: &[PasteboardItem]) -> Result<(), ResolverError>;

    /// Current plain-text content, if any.
    fn read_string(&self) -> Result<Option<String>, ResolverError>;
}
