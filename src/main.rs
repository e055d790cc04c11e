use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, WriteLogger};

use pdfmount::panic_handler::initialize_panic_handler;
use pdfmount::pdf::{self, ContainerSize, RenderPolicy};
use pdfmount::settings;

/// How long to wait for a page render before giving up
const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "pdfmount", version, about = "Mount a PDF: print its table of contents or render a page")]
struct Cli {
    /// PDF document to open
    file: PathBuf,

    /// Print the table of contents as an indented list
    #[arg(long)]
    toc: bool,

    /// Print the table of contents as a JSON link tree
    #[arg(long, conflicts_with = "toc")]
    toc_json: bool,

    /// Render this page (1-based)
    #[arg(long, requires = "out")]
    page: Option<u32>,

    /// PNG file the rendered page is written to
    #[arg(long, requires = "page")]
    out: Option<PathBuf>,

    /// Container width in pixels (overrides settings)
    #[arg(long)]
    width: Option<u32>,

    /// Container height in pixels (overrides settings)
    #[arg(long)]
    height: Option<u32>,

    /// Render every queued page request instead of only the newest
    #[arg(long)]
    queue: bool,

    /// Log file path
    #[arg(long, default_value = "pdfmount.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    settings::load_settings();

    WriteLogger::init(
        settings::get_log_level().to_filter(),
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {:?}", cli.log_file))?,
    )?;
    initialize_panic_handler();

    info!("Starting pdfmount on {:?}", cli.file);

    let res = run(&cli);
    if let Err(err) = &res {
        error!("Application error: {err:?}");
    }

    info!("Shutting down pdfmount");
    res
}

fn run(cli: &Cli) -> Result<()> {
    let (default_width, default_height) = settings::get_container_size();
    let container = ContainerSize::new(
        cli.width.unwrap_or(default_width),
        cli.height.unwrap_or(default_height),
    );
    let policy = if cli.queue {
        RenderPolicy::Queue
    } else {
        settings::get_render_policy()
    };

    let mount = pdf::mount(container, &cli.file, policy)?;

    if cli.toc_json {
        println!("{}", serde_json::to_string_pretty(mount.toc())?);
    } else if cli.toc || cli.page.is_none() {
        for entry in pdf::flatten_toc(mount.toc()) {
            let page = entry
                .page
                .map_or_else(|| "-".to_string(), |p| (p + 1).to_string());
            println!("{}{}  {}", "  ".repeat(entry.level), entry.title, page);
        }
    }

    if let (Some(page), Some(out)) = (cli.page, &cli.out) {
        mount.request_page(page);
        match mount.completions().recv_timeout(RENDER_TIMEOUT) {
            Ok(done) if done == page => {}
            Ok(other) => bail!("Render worker completed page {other} instead of {page}"),
            Err(_) => bail!("Page {page} was not rendered, see {:?}", cli.log_file),
        }

        let surface = mount.surface();
        let surface = surface
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        surface.write_png(out)?;
        println!(
            "Rendered page {page} at {}x{} to {}",
            surface.width(),
            surface.height(),
            out.display()
        );
    }

    Ok(())
}
