pub mod client;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod markup;
pub mod models;
pub mod page;

pub use client::{HttpSearchClient, SearchClient};
pub use controller::SearchFormController;
pub use error::{BindError, PageError, SearchError};
pub use models::RenderMode;
pub use page::HelpPage;
