use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use html2text::from_read;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use nlhelp::config::CONFIG;
use nlhelp::controller::QUERY_FIELD;
use nlhelp::{HelpPage, HttpSearchClient, RenderMode, SearchFormController};

/// Load a help page, bind the search form, submit queries and print what the
/// page ends up showing.
#[derive(Debug, Parser)]
#[command(name = "nlhelp", version)]
struct Cli {
    /// HTML help page to load (defaults to the bundled page)
    #[arg(long)]
    page: Option<PathBuf>,

    /// Search endpoint, e.g. http://localhost:8080/search
    #[arg(long)]
    search_url: Option<String>,

    /// How responses are rendered: entries or text
    #[arg(long)]
    mode: Option<RenderMode>,

    /// Selector of the search form
    #[arg(long)]
    form: Option<String>,

    /// Selector of the render target
    #[arg(long)]
    target: Option<String>,

    /// Print the render target as wrapped plain text instead of HTML
    #[arg(long)]
    text: bool,

    /// Queries to submit, one submit each, back to back
    #[arg(required = true)]
    queries: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    // The page and controller are single-threaded; keep them on one local set.
    let local = LocalSet::new();
    local.run_until(run(cli)).await
}

async fn run(cli: Cli) -> Result<()> {
    let mode = match cli.mode {
        Some(mode) => mode,
        None => CONFIG.render_mode.clone().map_err(|e| anyhow!(e))?,
    };
    let search_url = cli.search_url.as_deref().unwrap_or(&CONFIG.search_url);
    let form_selector = cli.form.as_deref().unwrap_or(&CONFIG.form_selector);
    let target_selector = cli
        .target
        .clone()
        .unwrap_or_else(|| CONFIG.target_selector_for(mode));

    let page_path = cli.page.clone().or_else(|| CONFIG.page_path.clone().map(PathBuf::from));
    let page = match &page_path {
        Some(path) => HelpPage::load(path)
            .with_context(|| format!("loading help page {}", path.display()))?,
        None => HelpPage::bundled(),
    };
    let page = Rc::new(page);

    let client = HttpSearchClient::parse(search_url)?;
    let controller = SearchFormController::new(page.clone(), client, mode);
    controller
        .bind(form_selector, &target_selector)
        .context("binding search form")?;

    let form = page
        .select(form_selector)?
        .ok_or_else(|| anyhow!("form {form_selector} disappeared"))?;
    let target = page
        .select(&target_selector)?
        .ok_or_else(|| anyhow!("render target {target_selector} disappeared"))?;

    for query in &cli.queries {
        if !page.set_field_value(&form, QUERY_FIELD, query) {
            return Err(anyhow!("form {form_selector} has no input named {QUERY_FIELD}"));
        }
        page.submit(&form);
    }
    tracing::info!(in_flight = controller.in_flight(), "waiting for search responses");
    controller.wait_idle().await;

    let html = page.inner_html(&target);
    if cli.text {
        print!("{}", from_read(html.as_bytes(), 80)?);
    } else {
        println!("{html}");
    }
    Ok(())
}
