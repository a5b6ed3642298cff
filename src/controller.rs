//! The search form controller: intercept submit, query the endpoint, render
//! the answer into the page.
//!
//! Everything here runs on one thread. Requests are spawned with
//! [`tokio::task::spawn_local`], so submissions must be dispatched from inside
//! a [`tokio::task::LocalSet`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::Notify;
use tracing::debug;

use crate::client::SearchClient;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::dom::{Dom, Selector, SubmitEvent, SubmitListener};
use crate::error::{BindError, SearchError};
use crate::markup::{CommonMark, MarkupRenderer};
use crate::models::{EntriesResponse, RenderMode, SearchResponse};

/// Class set on every rendered entry paragraph.
pub const ANSWER_CLASS: &str = "answer";

/// Name of the text input holding the query.
pub const QUERY_FIELD: &str = "q";

pub struct SearchFormController<D: Dom, C: SearchClient> {
    inner: Rc<Inner<D, C>>,
}

struct Inner<D: Dom, C: SearchClient> {
    dom: Rc<D>,
    client: C,
    mode: RenderMode,
    markup: RefCell<Box<dyn MarkupRenderer>>,
    diagnostics: RefCell<Box<dyn Diagnostics>>,
    in_flight: Cell<usize>,
    idle: Notify,
}

impl<D, C> SearchFormController<D, C>
where
    D: Dom + 'static,
    C: SearchClient + 'static,
{
    pub fn new(dom: Rc<D>, client: C, mode: RenderMode) -> Self {
        Self {
            inner: Rc::new(Inner {
                dom,
                client,
                mode,
                markup: RefCell::new(Box::new(CommonMark)),
                diagnostics: RefCell::new(Box::new(TracingDiagnostics)),
                in_flight: Cell::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Replaces the markdown converter used in [`RenderMode::Entries`].
    pub fn with_markup(self, markup: impl MarkupRenderer + 'static) -> Self {
        *self.inner.markup.borrow_mut() = Box::new(markup);
        self
    }

    /// Replaces where request failures are reported.
    pub fn with_diagnostics(self, diagnostics: impl Diagnostics + 'static) -> Self {
        *self.inner.diagnostics.borrow_mut() = Box::new(diagnostics);
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.inner.mode
    }

    /// Registers the submit handler on the form matched by `form_selector`,
    /// rendering into the element matched by `target_selector`.
    ///
    /// Each call registers another handler: binding the same form twice sends
    /// two requests per submit.
    pub fn bind(&self, form_selector: &str, target_selector: &str) -> Result<(), BindError> {
        let form = self.resolve("form", form_selector)?;
        let target = self.resolve("render target", target_selector)?;

        // The page keeps the handler (and with it the controller) for its
        // whole lifetime, like a browser does.
        let inner = Rc::clone(&self.inner);
        let bound_form = form.clone();
        let listener: SubmitListener = Rc::new(move |event: &SubmitEvent| {
            Inner::handle_submit(&inner, event, &bound_form, &target);
        });
        self.inner.dom.add_submit_listener(&form, listener);

        debug!(form = form_selector, target = target_selector, mode = %self.inner.mode, "search form bound");
        Ok(())
    }

    fn resolve(&self, role: &'static str, selector: &str) -> Result<D::Element, BindError> {
        let parsed = Selector::parse(selector)?;
        self.inner
            .dom
            .query(&parsed)
            .ok_or_else(|| BindError::ElementNotFound {
                role,
                selector: selector.to_string(),
            })
    }

    /// Handles one submission of `form`, rendering into `target`.
    pub fn handle_submit(&self, event: &SubmitEvent, form: &D::Element, target: &D::Element) {
        Inner::handle_submit(&self.inner, event, form, target);
    }

    pub fn on_request_success(&self, target: &D::Element, response: SearchResponse) {
        self.inner.on_request_success(target, response);
    }

    pub fn on_request_failure(&self, error: &SearchError) {
        self.inner.on_request_failure(error);
    }

    /// Number of requests issued and not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.get()
    }

    /// Resolves once no request is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.in_flight.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl<D, C> Inner<D, C>
where
    D: Dom + 'static,
    C: SearchClient + 'static,
{
    fn handle_submit(this: &Rc<Self>, event: &SubmitEvent, form: &D::Element, target: &D::Element) {
        event.prevent_default();

        let query = this.dom.field_value(form, QUERY_FIELD).unwrap_or_default();
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        debug!(query = %query, "submitting search");
        this.in_flight.set(this.in_flight.get() + 1);

        let this = Rc::clone(this);
        let target = target.clone();
        let query = query.to_string();
        tokio::task::spawn_local(async move {
            match this.fetch(&query).await {
                Ok(response) => this.on_request_success(&target, response),
                Err(e) => this.on_request_failure(&e),
            }
            this.request_resolved();
        });
    }

    async fn fetch(&self, query: &str) -> Result<SearchResponse, SearchError> {
        match self.mode {
            RenderMode::Entries => self
                .client
                .search::<EntriesResponse>(query)
                .await
                .map(SearchResponse::Entries),
            RenderMode::PlainText => self.client.search(query).await.map(SearchResponse::Text),
        }
    }

    fn on_request_success(&self, target: &D::Element, response: SearchResponse) {
        match response {
            SearchResponse::Entries(response) => {
                self.dom.clear_children(target);
                let markup = self.markup.borrow();
                for entry in &response.entries {
                    let html = markup.to_html(&entry.answer);
                    self.dom.append_element(target, "p", ANSWER_CLASS, &html);
                }
                debug!(entries = response.entries.len(), "rendered search entries");
            }
            SearchResponse::Text(response) => {
                self.dom.set_text(target, &response.text);
                debug!("rendered search text");
            }
        }
    }

    fn on_request_failure(&self, error: &SearchError) {
        self.diagnostics.borrow().error(&format!("Error: {error}"));
    }

    fn request_resolved(&self) {
        let remaining = self.in_flight.get().saturating_sub(1);
        self.in_flight.set(remaining);
        if remaining == 0 {
            self.idle.notify_waiters();
        }
    }
}
