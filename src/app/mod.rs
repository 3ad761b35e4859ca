use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Rect};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use workflow_canvas::config::CanvasConfig;
use workflow_canvas::geometry::{ConnectorCuller, CoordinateSpace, VirtualBendpoints};
use workflow_canvas::interaction::DragController;
use workflow_canvas::workflow::{ObjectId, Workflow, demo_workflow, load_workflow};

use self::commands::LocalCommands;

mod canvas;
mod commands;
mod render_utils;
mod ui;

/// Start-up options resolved from the command line.
pub struct Launch {
    pub workflow_path: Option<PathBuf>,
    pub config: CanvasConfig,
    pub seed: u64,
    pub ui_scale: f32,
}

pub struct WorkflowCanvasApp {
    launch: Launch,
    state: AppState,
    reload_rx: Option<Receiver<Result<Workflow, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Workflow, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    workflow: Workflow,
    config: CanvasConfig,
    space: CoordinateSpace,
    canvas_rect: Rect,
    drag: DragController,
    commands: LocalCommands,
    culler: ConnectorCuller,
    selection: HashSet<ObjectId>,
    marquee: Option<Marquee>,
    insertion: Option<BendpointInsertion>,
    rng: StdRng,
    frame: u64,
    fit_pending: bool,
    show_grid: bool,
    status: Option<String>,
    next_node_number: usize,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
    visible_node_count: usize,
    visible_connector_count: usize,
}

/// Rectangle selection in progress, both corners in canvas units.
#[derive(Clone, Copy, Debug)]
struct Marquee {
    start: Pos2,
    current: Pos2,
}

/// Bendpoint being dropped onto a connection; it becomes real on release.
#[derive(Clone, Debug)]
struct BendpointInsertion {
    connection: String,
    index: usize,
    candidates: VirtualBendpoints,
}

impl WorkflowCanvasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: Launch) -> Self {
        let state = Self::start_load(&launch);
        Self {
            launch,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<Result<Workflow, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_workflow(&path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(launch: &Launch) -> AppState {
        match &launch.workflow_path {
            Some(path) => AppState::Loading {
                rx: Self::spawn_load(path.clone()),
            },
            None => AppState::Ready(Box::new(Self::view_model(launch, demo_workflow()))),
        }
    }

    fn view_model(launch: &Launch, workflow: Workflow) -> ViewModel {
        info!(
            nodes = workflow.nodes().len(),
            connections = workflow.connections().len(),
            "workflow ready"
        );
        ViewModel::new(
            workflow,
            launch.config,
            launch.ui_scale,
            StdRng::seed_from_u64(launch.seed),
        )
    }
}

impl eframe::App for WorkflowCanvasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(workflow) => {
                            AppState::Ready(Box::new(Self::view_model(&self.launch, workflow)))
                        }
                        Err(error) => {
                            warn!(%error, "failed to load workflow");
                            AppState::Error(error)
                        }
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading workflow...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load workflow");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.launch));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let can_reload = self.launch.workflow_path.is_some();
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, can_reload && !is_reloading);

                if reload_requested
                    && self.reload_rx.is_none()
                    && let Some(path) = &self.launch.workflow_path
                {
                    self.reload_rx = Some(Self::spawn_load(path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(workflow)) => {
                            transition =
                                Some(AppState::Ready(Box::new(Self::view_model(&self.launch, workflow))));
                        }
                        Ok(Err(error)) => {
                            warn!(%error, "reload failed, keeping current workflow");
                            model.status = Some(format!("reload failed: {error}"));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
