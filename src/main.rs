use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_files_panel::models::DownloadJobStatus;
use user_files_panel::services::{
    ApiClient, PageItem, PageView, PanelApi, PollerState, ProgressSink, UserListModel,
};
use user_files_panel::{Config, Panel};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,user_files_panel=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");

    let api = Arc::new(ApiClient::new(config.api.clone()));

    match command {
        "list" => {
            let page: u32 = match args.get(1) {
                Some(raw) => raw.parse()?,
                None => 1,
            };
            let list = UserListModel::new(api, config.panel.per_page);
            if let Err(err) = list.load_page(page).await {
                bail!("{err}");
            }
            if let Some(view) = list.page_view() {
                print_page(&view);
            }
        }
        "download" => {
            let Some(raw) = args.get(1) else {
                bail!("usage: user-files-panel download <user_id>");
            };
            let user_id: i64 = raw.parse()?;
            let result = api.download_user_files(user_id).await?;
            println!("user {user_id}: {} file(s) -> {}", result.files_downloaded, result.path);
            if result.document_success {
                println!("  document files downloaded");
            }
            if result.address_success {
                println!("  address files downloaded");
            }
            if let Some(errors) = &result.errors {
                for error in errors {
                    println!("  partial failure: {error}");
                }
            }
        }
        "paths" => {
            let user_ids = args[1..]
                .iter()
                .map(|raw| raw.parse::<i64>())
                .collect::<Result<Vec<_>, _>>()?;
            if user_ids.is_empty() {
                bail!("usage: user-files-panel paths <user_id>...");
            }
            let entries = api.download_all_selected(&user_ids).await;
            for entry in &entries {
                println!("user {}: {}", entry.user_id, entry.path);
            }
            if entries.len() < user_ids.len() {
                println!("({} of {} users resolved)", entries.len(), user_ids.len());
            }
        }
        "start" => {
            api.start_download_job().await?;
            println!("bulk download started");
        }
        "stop" => {
            api.stop_download_job().await?;
            println!("bulk download stopped");
        }
        "status" => {
            let status = api.fetch_download_progress().await?;
            print_progress(&status);
        }
        "stats" => {
            let stats = api.fetch_download_stats().await?;
            println!(
                "users: {}  fully: {}  partially: {}  pending: {}  remaining: {}  ({:.1}%)",
                stats.total_users,
                stats.fully_downloaded,
                stats.partially_downloaded,
                stats.not_downloaded,
                stats.remaining,
                stats.progress_percent
            );
        }
        "watch" => {
            watch(&config).await?;
        }
        other => {
            bail!(
                "unknown command '{other}' (expected list | download | paths | start | stop | status | stats | watch)"
            );
        }
    }

    Ok(())
}

/// Follow a running bulk download until it reaches a terminal state,
/// printing each progress snapshot.
async fn watch(config: &Config) -> Result<()> {
    let panel = Panel::build(config, Arc::new(ConsoleSink));
    panel.init().await?;

    if panel.poller().state() != PollerState::Running {
        println!("no bulk download running");
        panel.shutdown();
        return Ok(());
    }

    while panel.poller().state() == PollerState::Running {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    panel.shutdown();
    Ok(())
}

/// Progress sink that narrates to stdout.
struct ConsoleSink;

#[async_trait::async_trait]
impl ProgressSink for ConsoleSink {
    fn progress_updated(&self, status: &DownloadJobStatus) {
        print_progress(status);
    }

    fn controls_changed(&self, start_enabled: bool, _stop_enabled: bool) {
        if start_enabled {
            println!("job is no longer running");
        }
    }

    async fn refresh_users(&self) {}

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}

fn print_progress(status: &DownloadJobStatus) {
    println!(
        "[{}] {} - {}/{} users ({} ok, {} failed, {} skipped), {} file(s), {}",
        status.status,
        status.percent_label(),
        status.processed_users,
        status.total_users,
        status.successful_users,
        status.failed_users,
        status.skipped_users,
        status.successful_files,
        status.human_duration()
    );
}

fn print_page(view: &PageView) {
    println!(
        "page {}/{} - {} users total, {} per page, sorted {}",
        view.page, view.total_pages, view.total, view.per_page, view.sort_order
    );
    println!(
        "{:>3} {:>10} {:>12} {:>9} {:>9} {:>9} {:>9}",
        "sel", "user_id", "citizenship", "doc_link", "document", "addr_link", "address"
    );
    for row in &view.rows {
        println!(
            "{:>3} {:>10} {:>12} {:>9} {:>9} {:>9} {:>9}",
            if row.selected { "[x]" } else { "[ ]" },
            row.user.user_id,
            row.user.citizenship_label(),
            if row.user.has_document_files() { "yes" } else { "-" },
            row.user.document,
            if row.user.has_address_files() { "yes" } else { "-" },
            row.user.address
        );
    }
    println!("{}", render_strip(view));
}

fn render_strip(view: &PageView) -> String {
    let strip = &view.pagination;
    let mut out = String::new();
    out.push_str(if strip.prev_enabled { "<< " } else { "   " });
    for item in &strip.items {
        match item {
            PageItem::Page { number, active: true } => out.push_str(&format!("[{number}] ")),
            PageItem::Page { number, active: false } => out.push_str(&format!("{number} ")),
            PageItem::Ellipsis => out.push_str("... "),
        }
    }
    out.push_str(if strip.next_enabled { ">>" } else { "  " });
    out
}
