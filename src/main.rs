mod app;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workflow_canvas::config::CanvasConfig;
use workflow_canvas::svg::render_svg;
use workflow_canvas::workflow::{demo_workflow, load_workflow};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Workflow snapshot (JSON) to open; a generated demo workflow otherwise.
    #[arg(long)]
    workflow: Option<PathBuf>,

    /// Canvas constants (JSON); missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the placement fallback.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 1.0)]
    ui_scale: f32,

    /// Write the workflow as SVG to this path and exit without opening a window.
    #[arg(long)]
    export_svg: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => CanvasConfig::load(path)?,
        None => CanvasConfig::default(),
    };

    if let Some(target) = &args.export_svg {
        let workflow = match &args.workflow {
            Some(path) => load_workflow(path)?,
            None => demo_workflow(),
        };
        fs::write(target, render_svg(&config, &workflow))
            .with_context(|| format!("failed to write svg to {}", target.display()))?;
        info!(path = %target.display(), "svg exported");
        return Ok(());
    }

    info!(?config, workflow = ?args.workflow, "starting viewer");

    let launch = app::Launch {
        workflow_path: args.workflow,
        config,
        seed: args.seed,
        ui_scale: args.ui_scale,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 840.0]),
        ..Default::default()
    };

    eframe::run_native(
        "workflow-canvas",
        options,
        Box::new(move |cc| Ok(Box::new(app::WorkflowCanvasApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
