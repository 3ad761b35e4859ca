use std::collections::{HashSet, VecDeque};

use eframe::egui::{self, Align, Context, Layout, Rect, Ui};
use rand::rngs::StdRng;
use workflow_canvas::config::CanvasConfig;
use workflow_canvas::geometry::{ConnectorCuller, CoordinateSpace};
use workflow_canvas::interaction::DragController;
use workflow_canvas::workflow::Workflow;

use super::super::ViewModel;
use super::super::commands::LocalCommands;

impl ViewModel {
    pub(in crate::app) fn new(workflow: Workflow, config: CanvasConfig, ui_scale: f32, rng: StdRng) -> Self {
        let space = CoordinateSpace::default()
            .with_zoom_limits(config.min_zoom, config.max_zoom)
            .with_ui_scale(ui_scale);

        Self {
            workflow,
            config,
            space,
            canvas_rect: Rect::NOTHING,
            drag: DragController::new(config),
            commands: LocalCommands::default(),
            culler: ConnectorCuller::new(),
            selection: HashSet::new(),
            marquee: None,
            insertion: None,
            rng,
            frame: 0,
            fit_pending: true,
            show_grid: true,
            status: None,
            next_node_number: 0,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
            visible_node_count: 0,
            visible_connector_count: 0,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, can_reload: bool) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("workflow-canvas");
                    ui.separator();
                    ui.label(format!("nodes: {}", self.workflow.nodes().len()));
                    ui.label(format!("connections: {}", self.workflow.connections().len()));
                    ui.label(format!("zoom: {:.0}%", self.space.zoom() * 100.0));
                    ui.label(format!("selected: {}", self.selection.len()));
                    let reload_button = ui.add_enabled(can_reload, egui::Button::new("Reload workflow"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Fit to content").clicked() {
                        self.fit_pending = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_canvas_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Edit");
        ui.add_space(4.0);
        if ui.button("Add node").clicked() {
            self.add_node_in_view();
        }
        let has_selection = !self.selection.is_empty();
        if ui
            .add_enabled(has_selection, egui::Button::new("Duplicate selection"))
            .clicked()
        {
            self.duplicate_selection();
        }
        if ui
            .add_enabled(has_selection, egui::Button::new("Clear selection"))
            .clicked()
        {
            self.selection.clear();
        }

        ui.separator();
        ui.heading("Workflow");
        ui.checkbox(&mut self.workflow.writable, "Writable");
        ui.checkbox(&mut self.workflow.move_locked, "Lock moves");
        ui.checkbox(&mut self.commands.fail_next_commit, "Fail next commit");
        ui.label(format!("committed moves: {}", self.commands.committed));

        ui.separator();
        ui.heading("View");
        ui.checkbox(&mut self.show_grid, "Show grid");
        ui.label(format!("grid: {} units", self.config.grid_size));

        ui.separator();
        ui.label("Drag nodes, annotations, bendpoints or port bars to move them.");
        ui.label("Drag a ring on a selected node's connector to add a bendpoint.");
        ui.label("Alt: move without grid snapping");
        ui.label("Shift: add to selection");
        ui.label("Esc: cancel the current drag");
        ui.label("Right or middle drag: pan, scroll: zoom");
    }
}
