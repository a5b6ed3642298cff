//! The slice of a page's DOM the search controller needs.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::BindError;

/// A single simple selector: `#id`, `.class` or a tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
    Tag(String),
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Selector, BindError> {
        let s = selector.trim();
        let valid_name = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        let parsed = if let Some(id) = s.strip_prefix('#') {
            valid_name(id).then(|| Selector::Id(id.to_string()))
        } else if let Some(class) = s.strip_prefix('.') {
            valid_name(class).then(|| Selector::Class(class.to_string()))
        } else {
            valid_name(s).then(|| Selector::Tag(s.to_ascii_lowercase()))
        };
        parsed.ok_or_else(|| BindError::InvalidSelector(selector.to_string()))
    }

    /// Whether an element with this tag name and attribute lookup matches.
    pub fn matches<'a>(&self, tag: &str, attr: impl Fn(&str) -> Option<&'a str>) -> bool {
        match self {
            Selector::Id(id) => attr("id") == Some(id.as_str()),
            Selector::Class(class) => attr("class")
                .map(|v| v.split_ascii_whitespace().any(|c| c == class))
                .unwrap_or(false),
            Selector::Tag(name) => tag.eq_ignore_ascii_case(name),
        }
    }
}

/// A form submission as seen by listeners.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: Cell<bool>,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the navigation the page would otherwise perform.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

pub type SubmitListener = Rc<dyn Fn(&SubmitEvent)>;

/// DOM capability injected into the controller.
///
/// All methods take `&self`: implementations live behind an `Rc` and mutate
/// through interior mutability, like a browser document shared by callbacks on
/// one event loop.
pub trait Dom {
    type Element: Clone + 'static;

    /// First element in document order matching `selector`.
    fn query(&self, selector: &Selector) -> Option<Self::Element>;

    /// Current value of the text input named `name` inside `form`.
    fn field_value(&self, form: &Self::Element, name: &str) -> Option<String>;

    fn add_submit_listener(&self, form: &Self::Element, listener: SubmitListener);

    fn clear_children(&self, element: &Self::Element);

    /// Appends a new `<tag class="class">` to `parent` whose children are parsed from `inner_html`.
    fn append_element(
        &self,
        parent: &Self::Element,
        tag: &str,
        class: &str,
        inner_html: &str,
    ) -> Self::Element;

    /// Replaces the children of `element` with a single text node.
    fn set_text(&self, element: &Self::Element, text: &str);
}
