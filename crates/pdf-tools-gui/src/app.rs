use eframe::egui;
use pdf_async_runtime::{
    AppEvent, BoardEvent, BoardSettings, EventBus, Notice, PdfCommand, PdfUpdate, Subscription,
};
use pdf_merge::{PageRenderer, PreferenceStore, Theme};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::logger::AppLogger;
use crate::views::{BoardView, PreviewView, Toasts, show_activity};

#[derive(Clone)]
struct ProgressState {
    operation: String,
    current: usize,
    total: usize,
}

/// Listens on the bus for completed merges to show in the status bar
struct StatusLine {
    events: Subscription,
    last_merge: Option<(PathBuf, usize)>,
}

impl StatusLine {
    fn poll(&mut self) {
        while let Some(event) = self.events.try_recv() {
            if let AppEvent::MergeCompleted { path, page_count } = event {
                self.last_merge = Some((path, page_count));
            }
        }
    }
}

pub struct MergeBoardApp {
    settings: BoardSettings,
    preferences: Box<dyn PreferenceStore>,

    // Async infrastructure
    command_tx: mpsc::UnboundedSender<PdfCommand>,
    update_rx: mpsc::UnboundedReceiver<PdfUpdate>,
    bus: EventBus,

    board: BoardView,
    preview: Option<PreviewView>,
    toasts: Toasts,
    status: StatusLine,
    progress: Option<ProgressState>,
    logger: AppLogger,

    _tokio_handle: tokio::runtime::Handle,
}

impl MergeBoardApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        tokio_handle: tokio::runtime::Handle,
        renderer: Arc<dyn PageRenderer>,
        preferences: Box<dyn PreferenceStore>,
        logger: AppLogger,
    ) -> Self {
        let settings = match preferences.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => BoardSettings::default(),
            Err(e) => {
                log::warn!("Ignoring saved preferences: {e}");
                BoardSettings::default()
            }
        };
        apply_theme(&cc.egui_ctx, settings.theme);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (worker_tx, mut worker_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        tokio_handle.spawn(crate::worker::worker_task(
            command_rx,
            worker_tx,
            renderer,
            settings.clone(),
        ));

        // Wake the UI for updates that arrive while it is idle
        let repaint_ctx = cc.egui_ctx.clone();
        tokio_handle.spawn(async move {
            while let Some(update) = worker_rx.recv().await {
                if update_tx.send(update).is_err() {
                    break;
                }
                repaint_ctx.request_repaint();
            }
        });

        let bus = EventBus::default();
        let board = BoardView::new(bus.subscribe());
        let status = StatusLine {
            events: bus.subscribe(),
            last_merge: None,
        };

        Self {
            settings,
            preferences,
            command_tx,
            update_rx,
            bus,
            board,
            preview: None,
            toasts: Toasts::default(),
            status,
            progress: None,
            logger,
            _tokio_handle: tokio_handle,
        }
    }

    fn publish(&self, event: AppEvent) {
        if let Err(e) = self.bus.publish(event) {
            log::debug!("Event not delivered: {e}");
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.settings.theme = self.settings.theme.toggled();
        apply_theme(ctx, self.settings.theme);
        if let Err(e) = self.preferences.save(&self.settings) {
            log::warn!("Failed to save preferences: {e}");
            self.toasts
                .push(Notice::warning("Theme could not be saved for next time"));
        }
        let _ = self.command_tx.send(PdfCommand::SettingsChanged {
            settings: self.settings.clone(),
        });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let paths: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !paths.is_empty() {
            self.publish(AppEvent::FilesUploaded(paths));
        }
    }

    fn handle_update(&mut self, ctx: &egui::Context, update: PdfUpdate) {
        match update {
            PdfUpdate::Progress {
                operation,
                current,
                total,
            } => {
                self.board.set_merging(true);
                self.progress = Some(ProgressState {
                    operation,
                    current,
                    total,
                });
                ctx.request_repaint();
            }
            PdfUpdate::Board(BoardEvent::Notice(notice)) => self.toasts.push(notice),
            PdfUpdate::Board(event) => self.board.apply(ctx, event),
            PdfUpdate::MergeComplete { path, page_count } => {
                self.progress = None;
                self.board.set_merging(false);
                self.publish(AppEvent::MergeCompleted { path, page_count });
            }
            PdfUpdate::MergeFailed => {
                self.progress = None;
                self.board.set_merging(false);
            }
            PdfUpdate::PreviewOpened {
                session_id,
                id,
                mode,
                name,
            } => {
                let preview = PreviewView::new(session_id, id, mode, name);
                // The pointer may have left before the worker answered
                if mode == pdf_async_runtime::PreviewMode::Hover
                    && self.board.hover_target() != Some(id)
                {
                    let _ = self.command_tx.send(PdfCommand::PreviewClose { session_id });
                }
                self.preview = Some(preview);
            }
            PdfUpdate::PreviewPageRendered {
                session_id,
                page_index,
                rendered,
                total,
                width,
                height,
                rgba_data,
            } => {
                if let Some(preview) = &mut self.preview
                    && preview.session_id() == session_id
                {
                    preview.add_page(ctx, page_index, rendered, total, width, height, &rgba_data);
                }
            }
            PdfUpdate::PreviewClosed { session_id } => {
                if self
                    .preview
                    .as_ref()
                    .is_some_and(|preview| preview.session_id() == session_id)
                {
                    self.preview = None;
                }
            }
            PdfUpdate::Error { message } => {
                self.progress = None;
                self.board.set_merging(false);
                self.toasts.push(Notice::error(message));
            }
        }
    }
}

fn apply_theme(ctx: &egui::Context, theme: Theme) {
    ctx.set_theme(match theme {
        Theme::Light => egui::Theme::Light,
        Theme::Dark => egui::Theme::Dark,
    });
}

impl eframe::App for MergeBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        while let Ok(update) = self.update_rx.try_recv() {
            self.handle_update(ctx, update);
        }
        self.status.poll();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("PDF Merge");
                ui.separator();

                if ui.button("📂 Upload...").clicked()
                    && let Some(paths) = rfd::FileDialog::new()
                        .add_filter("PDF", &["pdf"])
                        .pick_files()
                {
                    self.publish(AppEvent::FilesUploaded(paths));
                }
                if ui
                    .add_enabled(self.board.can_merge(), egui::Button::new("📎 Merge"))
                    .clicked()
                {
                    self.publish(AppEvent::MergeRequested);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = match self.settings.theme {
                        Theme::Light => "🌙 Dark",
                        Theme::Dark => "☀ Light",
                    };
                    if ui.button(label).clicked() {
                        self.toggle_theme(ui.ctx());
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            if let Some(progress) = &self.progress {
                ui.label(&progress.operation);
                ui.add(
                    egui::ProgressBar::new(progress.current as f32 / progress.total.max(1) as f32)
                        .show_percentage(),
                );
                ctx.request_repaint();
            } else if let Some((path, page_count)) = &self.status.last_merge {
                ui.label(format!(
                    "Last merge: {} ({} pages)",
                    path.display(),
                    page_count
                ));
            }
            show_activity(ui, &self.logger);
        });

        let open_preview = self.preview.as_ref().map(PreviewView::as_open);
        egui::CentralPanel::default().show(ctx, |ui| {
            self.board.show(ui, &self.command_tx, open_preview);
        });

        if ctx.input(|i| !i.raw.hovered_files.is_empty()) {
            egui::Area::new(egui::Id::new("drop-hint"))
                .order(egui::Order::Foreground)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.heading("Drop PDFs to add them");
                    });
                });
        }

        if let Some(preview) = &self.preview
            && preview.show(ctx)
        {
            let _ = self.command_tx.send(PdfCommand::PreviewClose {
                session_id: preview.session_id(),
            });
        }

        self.toasts.show(ctx);
    }
}
