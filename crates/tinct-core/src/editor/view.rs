//! The view side of the editor: anything that displays a channel.

use super::channel::{Channel, ChannelRange, ViewValue};

/// Identifies a bound view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

/// A widget bound to one editor channel.
///
/// Views only receive values; user edits go back through
/// [`Editor::notify_view_changed`](super::Editor::notify_view_changed).
pub trait ColorView {
    /// Called once when the view is bound.
    fn configure(&mut self, _channel: Channel, _range: Option<ChannelRange>) {}

    /// Show a new value.
    ///
    /// A widget that reports programmatic updates as user edits returns that
    /// edit here; the editor discards it.
    fn update(&mut self, value: &ViewValue) -> Option<ViewValue>;
}

impl<F> ColorView for F
where
    F: FnMut(&ViewValue) -> Option<ViewValue>,
{
    fn update(&mut self, value: &ViewValue) -> Option<ViewValue> {
        self(value)
    }
}

/// A numeric entry: the state behind a spin box or slider.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericEntry {
    value: f64,
    range: ChannelRange,
}

impl Default for NumericEntry {
    fn default() -> Self {
        Self { value: 0.0, range: ChannelRange::new(0.0, 255.0, false) }
    }
}

impl NumericEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_range(&mut self, lower: f64, upper: f64, wrap: bool) {
        self.range = ChannelRange::new(lower, upper, wrap);
        self.value = self.range.fit(self.value);
    }

    pub fn range(&self) -> ChannelRange {
        self.range
    }

    /// Store a value, wrapping or clamping it into range.
    pub fn set_value(&mut self, value: f64) {
        self.value = self.range.fit(value);
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The value as a view edit.
    pub fn as_edit(&self) -> ViewValue {
        ViewValue::Number(self.value)
    }
}

impl ColorView for NumericEntry {
    fn configure(&mut self, _channel: Channel, range: Option<ChannelRange>) {
        if let Some(range) = range {
            self.set_range(range.lower, range.upper, range.wrap);
        }
    }

    fn update(&mut self, value: &ViewValue) -> Option<ViewValue> {
        if let ViewValue::Number(x) = value {
            self.set_value(*x);
        }
        None
    }
}
