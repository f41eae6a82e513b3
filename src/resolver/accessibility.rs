//! AccessibilityProvider trait — cross-process UI element access.
//!
//! Element handles are opaque references into another process. Nothing
//! about them is assumed: every attribute read, parameterized query and
//! action can fail on its own, so each accessor returns a `Result`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Attribute names used by the acquisition pipeline.
pub mod attr {
    pub const FOCUSED_UI_ELEMENT: &str = "AXFocusedUIElement";
    pub const SELECTED_TEXT: &str = "AXSelectedText";
    pub const SELECTED_TEXT_MARKER_RANGE: &str = "AXSelectedTextMarkerRange";
    pub const STRING_FOR_TEXT_MARKER_RANGE: &str = "AXStringForTextMarkerRange";
    pub const MENU_BAR: &str = "AXMenuBar";
    pub const CHILDREN: &str = "AXChildren";
    pub const TITLE: &str = "AXTitle";
    pub const ENABLED: &str = "AXEnabled";
}

/// The synthetic "press" action.
pub const PRESS_ACTION: &str = "AXPress";

/// Shared handle to an element in another process.
pub type ElementRef = Arc<dyn AxElement>;

/// Failure of a single accessibility round-trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AxError {
    #[error("attribute {0} is not supported by the element")]
    AttributeUnsupported(String),
    #[error("attribute {0} has no value")]
    NoValue(String),
    #[error("action {0} is not supported by the element")]
    ActionUnsupported(String),
    #[error("accessibility API is disabled for this process")]
    ApiDisabled,
    #[error("target application could not complete the request")]
    CannotComplete,
    #[error("element is no longer valid")]
    InvalidElement,
    #[error("accessibility error {0}")]
    Other(i32),
}

/// A value returned by an attribute query.
#[derive(Debug, Clone)]
pub enum AxValue {
    String(String),
    /// Rich text, already flattened to its plain characters.
    AttributedString(String),
    Bool(bool),
    Number(f64),
    Element(ElementRef),
    Elements(Vec<ElementRef>),
    /// Opaque text-marker range, only meaningful as a parameter to
    /// another query on the same element.
    MarkerRange(MarkerRange),
    /// A payload type the adapter does not model; carries its type name.
    Other(String),
}

impl AxValue {
    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            AxValue::String(_) => "String",
            AxValue::AttributedString(_) => "AttributedString",
            AxValue::Bool(_) => "Bool",
            AxValue::Number(_) => "Number",
            AxValue::Element(_) => "Element",
            AxValue::Elements(_) => "Elements",
            AxValue::MarkerRange(_) => "MarkerRange",
            AxValue::Other(name) => name,
        }
    }

    /// Plain text of a string or rich-text value.
    pub fn into_text(self) -> Option<String> {
        match self {
            AxValue::String(s) | AxValue::AttributedString(s) => Some(s),
            _ => None,
        }
    }
}

/// Opaque marker-range token produced by an adapter.
#[derive(Clone)]
pub struct MarkerRange(Arc<dyn Any + Send + Sync>);

impl MarkerRange {
    pub fn new<T: Any + Send + Sync>(token: T) -> Self {
        Self(Arc::new(token))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for MarkerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MarkerRange(..)")
    }
}

/// A UI element owned by another process.
///
/// `Send + Sync` because every call is executed on the blocking pool
/// under a timeout, never on the thread that dispatches input events.
pub trait AxElement: Send + Sync + fmt::Debug {
    /// Read a named attribute.
    fn attribute(&self, name: &str) -> Result<AxValue, AxError>;

    /// Read a parameterized attribute.
    fn parameterized_attribute(&self, name: &str, parameter: &AxValue)
    -> Result<AxValue, AxError>;

    /// Perform a named action (e.g. [`PRESS_ACTION`]).
    fn perform_action(&self, action: &str) -> Result<(), AxError>;
}

/// The frontmost application and its root element.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: String,
    pub bundle_id: Option<String>,
    pub pid: i32,
    pub element: ElementRef,
}

/// Entry point into the accessibility API.
pub trait AccessibilityProvider: Send + Sync {
    /// Whether this process holds accessibility trust.
    fn is_trusted(&self) -> bool;

    /// The application currently in front, if any.
    fn frontmost_application(&self) -> Option<Application>;
}

/// Read an attribute and require it to be an element.
pub fn element_attribute(element: &dyn AxElement, name: &str) -> Result<ElementRef, AxError> {
    match element.attribute(name)? {
        AxValue::Element(e) => Ok(e),
        _ => Err(AxError::NoValue(name.to_string())),
    }
}

/// Read the children of an element; absent children read as empty.
pub fn children(element: &dyn AxElement) -> Vec<ElementRef> {
    match element.attribute(attr::CHILDREN) {
        Ok(AxValue::Elements(children)) => children,
        _ => Vec::new(),
    }
}

/// An accessibility round-trip exceeded its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("accessibility call exceeded {0:?}")]
pub struct AxTimeout(pub Duration);

/// Run a blocking accessibility round-trip on the blocking pool, bounded
/// by `limit`.
///
/// On expiry the call keeps running on its pool thread but its result is
/// discarded.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, AxTimeout>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join)) => std::panic::resume_unwind(join.into_panic()),
        Err(_) => Err(AxTimeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_text_flattens_rich_text() {
        assert_eq!(
            AxValue::AttributedString("bold".into()).into_text().as_deref(),
            Some("bold")
        );
        assert_eq!(AxValue::String("plain".into()).into_text().as_deref(), Some("plain"));
        assert!(AxValue::Bool(true).into_text().is_none());
    }

    #[test]
    fn type_name_reports_foreign_types() {
        assert_eq!(AxValue::Other("AXValueRef".into()).type_name(), "AXValueRef");
        assert_eq!(AxValue::Number(1.0).type_name(), "Number");
    }

    #[test]
    fn marker_range_downcasts_to_token() {
        let range = MarkerRange::new(42u64);
        assert_eq!(range.downcast_ref::<u64>(), Some(&42));
        assert!(range.downcast_ref::<String>().is_none());
    }

    #[tokio::test]
    async fn bounded_returns_value_in_time() {
        let value = bounded(Duration::from_secs(1), || 7).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn bounded_times_out_on_hung_call() {
        let limit = Duration::from_millis(20);
        let err = bounded(limit, || std::thread::sleep(Duration::from_millis(300)))
            .await
            .unwrap_err();
        assert_eq!(err, AxTimeout(limit));
    }
}
