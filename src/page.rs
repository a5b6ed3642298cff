//! A help page held as an html5ever/rcdom tree, with just enough of a browser
//! around it (submit dispatch, navigation) to host the search controller.

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, QualName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use crate::dom::{Dom, Selector, SubmitEvent, SubmitListener};
use crate::error::{BindError, PageError};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
const BUNDLED_PAGE: &str = include_str!("../static/help.html");

pub struct HelpPage {
    dom: RcDom,
    listeners: RefCell<Vec<(Handle, SubmitListener)>>,
    navigations: Cell<usize>,
}

impl HelpPage {
    pub fn parse(html: &str) -> HelpPage {
        HelpPage {
            dom: Self::get_dom(html),
            listeners: RefCell::new(Vec::new()),
            navigations: Cell::new(0),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<HelpPage, PageError> {
        let html = std::fs::read_to_string(path)?;
        Ok(Self::parse(&html))
    }

    /// The help page shipped with the crate: `#searchForm` with input `q`,
    /// a `.js-hits` entries target and an `.answer` text target.
    pub fn bundled() -> HelpPage {
        Self::parse(BUNDLED_PAGE)
    }

    fn get_dom(html: &str) -> RcDom {
        parse_document(RcDom::default(), Default::default()).one(html)
    }

    /// Convenience over [`Dom::query`] taking selector text.
    pub fn select(&self, selector: &str) -> Result<Option<Handle>, BindError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query(&selector))
    }

    // =========================================================================
    // Host side: what the user and the browser do to the page
    // =========================================================================

    /// Types `value` into the input named `name` inside `form`. Returns false
    /// when the form has no such input.
    pub fn set_field_value(&self, form: &Handle, name: &str, value: &str) -> bool {
        let Some(input) = find_input(form, name) else {
            return false;
        };
        if let NodeData::Element { attrs, .. } = &input.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|a| &*a.name.local == "value") {
                Some(attr) => attr.value = StrTendril::from(value),
                None => attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from("value")),
                    value: StrTendril::from(value),
                }),
            }
        }
        true
    }

    /// Fires a submit event at `form`. Listeners run in registration order; if
    /// none of them prevents the default, the page counts a navigation.
    pub fn submit(&self, form: &Handle) -> SubmitEvent {
        let event = SubmitEvent::new();
        let listeners: Vec<SubmitListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(target, _)| Rc::ptr_eq(target, form))
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&event);
        }

        if !event.default_prevented() {
            tracing::debug!("submit was not intercepted; page navigates away");
            self.navigations.set(self.navigations.get() + 1);
        }
        event
    }

    /// Number of submits that would have left the page.
    pub fn navigations(&self) -> usize {
        self.navigations.get()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn inner_html(&self, element: &Handle) -> String {
        serialize_node(element, TraversalScope::ChildrenOnly(None))
    }

    /// The whole document, as markup.
    pub fn to_html(&self) -> String {
        serialize_node(&self.dom.document, TraversalScope::ChildrenOnly(None))
    }

    pub fn text_content(&self, element: &Handle) -> String {
        let mut out = String::new();
        collect_text(element, &mut out);
        out
    }

    pub fn element_children(&self, element: &Handle) -> Vec<Handle> {
        element
            .children
            .borrow()
            .iter()
            .filter(|c| matches!(c.data, NodeData::Element { .. }))
            .cloned()
            .collect()
    }

    pub fn attr(&self, element: &Handle, name: &str) -> Option<String> {
        attr_value(element, name)
    }

    pub fn tag_name(&self, element: &Handle) -> Option<String> {
        match &element.data {
            NodeData::Element { name, .. } => Some(name.local.to_string()),
            _ => None,
        }
    }
}

impl Dom for HelpPage {
    type Element = Handle;

    fn query(&self, selector: &Selector) -> Option<Handle> {
        find_first(&self.dom.document, &|node| element_matches(node, selector))
    }

    fn field_value(&self, form: &Handle, name: &str) -> Option<String> {
        find_input(form, name).map(|input| attr_value(&input, "value").unwrap_or_default())
    }

    fn add_submit_listener(&self, form: &Handle, listener: SubmitListener) {
        self.listeners.borrow_mut().push((form.clone(), listener));
    }

    fn clear_children(&self, element: &Handle) {
        let children = std::mem::take(&mut *element.children.borrow_mut());
        for child in &children {
            child.parent.set(None);
        }
    }

    fn append_element(&self, parent: &Handle, tag: &str, class: &str, inner_html: &str) -> Handle {
        let element = markup5ever_rcdom::Node::new(NodeData::Element {
            name: QualName::new(None, Namespace::from(HTML_NS), LocalName::from(tag)),
            attrs: RefCell::new(vec![Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from("class")),
                value: StrTendril::from(class),
            }]),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: false,
        });
        for child in parse_body_children(inner_html) {
            append_child(&element, child);
        }
        append_child(parent, element.clone());
        element
    }

    fn set_text(&self, element: &Handle, text: &str) {
        self.clear_children(element);
        if text.is_empty() {
            return;
        }
        let node = markup5ever_rcdom::Node::new(NodeData::Text {
            contents: RefCell::new(StrTendril::from(text)),
        });
        append_child(element, node);
    }
}

/// Parses `html` as body content and detaches the resulting nodes.
fn parse_body_children(html: &str) -> Vec<Handle> {
    let dom = HelpPage::get_dom(html);
    let Some(body) = find_first(&dom.document, &|node| is_element(node, "body")) else {
        return Vec::new();
    };
    // Taken out before `dom` drops: rcdom tears down whatever is still attached.
    let children = std::mem::take(&mut *body.children.borrow_mut());
    for child in &children {
        child.parent.set(None);
    }
    children
}

fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

fn find_first(handle: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if pred(child) {
            return Some(child.clone());
        }
        if let Some(found) = find_first(child, pred) {
            return Some(found);
        }
    }
    None
}

fn find_input(form: &Handle, name: &str) -> Option<Handle> {
    find_first(form, &|node| {
        is_element(node, "input") && attr_value(node, "name").as_deref() == Some(name)
    })
}

fn is_element(node: &Handle, tag: &str) -> bool {
    matches!(&node.data, NodeData::Element { name, .. } if &*name.local == tag)
}

fn element_matches(node: &Handle, selector: &Selector) -> bool {
    let NodeData::Element { name, attrs, .. } = &node.data else {
        return false;
    };
    let attrs = attrs.borrow();
    selector.matches(&name.local, |attr| {
        attrs
            .iter()
            .find(|a| &*a.name.local == attr)
            .map(|a| &*a.value)
    })
}

fn attr_value(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn collect_text(handle: &Handle, out: &mut String) {
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => collect_text(child, out),
            _ => {}
        }
    }
}

fn serialize_node(handle: &Handle, scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    if let Err(e) = serialize(&mut bytes, &SerializableHandle::from(handle.clone()), opts) {
        tracing::warn!("failed to serialize node: {e}");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Help</title></head>
<body>
  <form id="searchForm" action="/search">
    <input type="text" name="q" value="  preset ">
    <button type="submit">Ask</button>
  </form>
  <div class="js-hits results"><p>old</p></div>
</body></html>"#;

    #[test]
    fn test_query_by_id_and_class() {
        let page = HelpPage::parse(PAGE);
        let form = page.select("#searchForm").unwrap().unwrap();
        assert_eq!(page.tag_name(&form).as_deref(), Some("form"));
        let hits = page.select(".js-hits").unwrap().unwrap();
        assert_eq!(page.tag_name(&hits).as_deref(), Some("div"));
        assert!(page.select("#nope").unwrap().is_none());
        assert!(page.select("div > p").is_err());
    }

    #[test]
    fn test_field_value_roundtrip_through_attribute() {
        let page = HelpPage::parse(PAGE);
        let form = page.select("#searchForm").unwrap().unwrap();
        assert_eq!(page.field_value(&form, "q").as_deref(), Some("  preset "));
        assert!(page.set_field_value(&form, "q", "how do I reset"));
        assert_eq!(page.field_value(&form, "q").as_deref(), Some("how do I reset"));
        assert!(!page.set_field_value(&form, "missing", "x"));
        assert_eq!(page.field_value(&form, "missing"), None);
    }

    #[test]
    fn test_input_without_value_reads_empty() {
        let page = HelpPage::parse(r#"<form id="f"><input name="q"></form>"#);
        let form = page.select("#f").unwrap().unwrap();
        assert_eq!(page.field_value(&form, "q").as_deref(), Some(""));
    }

    #[test]
    fn test_clear_and_append() {
        let page = HelpPage::parse(PAGE);
        let hits = page.select(".js-hits").unwrap().unwrap();
        page.clear_children(&hits);
        assert!(page.element_children(&hits).is_empty());

        let p = page.append_element(&hits, "p", "answer", "<strong>bold</strong> text");
        assert_eq!(page.element_children(&hits).len(), 1);
        assert_eq!(page.attr(&p, "class").as_deref(), Some("answer"));
        assert_eq!(
            page.inner_html(&hits),
            r#"<p class="answer"><strong>bold</strong> text</p>"#
        );
    }

    #[test]
    fn test_append_keeps_block_content_nested() {
        let page = HelpPage::parse(PAGE);
        let hits = page.select(".js-hits").unwrap().unwrap();
        page.clear_children(&hits);
        page.append_element(&hits, "p", "answer", "<p>first</p><p>second</p>");
        let children = page.element_children(&hits);
        assert_eq!(children.len(), 1);
        assert_eq!(page.element_children(&children[0]).len(), 2);
    }

    #[test]
    fn test_set_text_is_not_markup() {
        let page = HelpPage::parse(PAGE);
        let hits = page.select(".js-hits").unwrap().unwrap();
        page.set_text(&hits, "<b>Hello</b> & bye");
        assert_eq!(page.text_content(&hits), "<b>Hello</b> & bye");
        assert!(page.element_children(&hits).is_empty());
        assert_eq!(page.inner_html(&hits), "&lt;b&gt;Hello&lt;/b&gt; &amp; bye");
    }

    #[test]
    fn test_to_html_reflects_mutations() {
        let page = HelpPage::parse(PAGE);
        let hits = page.select(".js-hits").unwrap().unwrap();
        page.set_text(&hits, "fresh");
        let html = page.to_html();
        assert!(html.contains(r#"<div class="js-hits results">fresh</div>"#));
        assert!(!html.contains("<p>old</p>"));
    }

    #[test]
    fn test_submit_without_listener_navigates() {
        let page = HelpPage::parse(PAGE);
        let form = page.select("#searchForm").unwrap().unwrap();
        let event = page.submit(&form);
        assert!(!event.default_prevented());
        assert_eq!(page.navigations(), 1);
    }

    #[test]
    fn test_listeners_run_in_order_and_can_prevent_navigation() {
        let page = HelpPage::parse(PAGE);
        let form = page.select("#searchForm").unwrap().unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));

        let c = calls.clone();
        page.add_submit_listener(&form, Rc::new(move |_: &SubmitEvent| c.borrow_mut().push("first")));
        let c = calls.clone();
        page.add_submit_listener(
            &form,
            Rc::new(move |event: &SubmitEvent| {
                event.prevent_default();
                c.borrow_mut().push("second");
            }),
        );

        page.submit(&form);
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
        assert_eq!(page.navigations(), 0);
    }

    #[test]
    fn test_bundled_page_has_controller_hooks() {
        let page = HelpPage::bundled();
        let form = page.select("#searchForm").unwrap().unwrap();
        assert!(page.field_value(&form, "q").is_some());
        assert!(page.select(".js-hits").unwrap().is_some());
        assert!(page.select(".answer").unwrap().is_some());
    }
}
