use eframe::egui;
use pdf_async_runtime::{
    AppEvent, BoardEvent, Direction, ItemId, ItemSummary, PdfCommand, PreviewMode, Subscription,
    ThumbnailState,
};
use std::collections::HashMap;
use tokio::sync::mpsc;

const THUMBNAIL_HEIGHT: f32 = 96.0;

enum ThumbnailSlot {
    Loading,
    Ready(egui::TextureHandle),
    Failed(String),
}

struct ThumbnailEntry {
    slot: ThumbnailSlot,
    page_count: Option<usize>,
}

/// The preview currently on screen, as far as the board needs to know
#[derive(Clone, Copy)]
pub struct OpenPreview {
    pub session_id: u64,
    pub item: ItemId,
    pub mode: PreviewMode,
}

/// UI mirror of the worker's board: item order, thumbnails and row interaction
pub struct BoardView {
    items: Vec<ItemSummary>,
    thumbnails: HashMap<ItemId, ThumbnailEntry>,
    selected: Option<ItemId>,
    hover_target: Option<ItemId>,
    last_reorder: Option<(ItemId, ItemId)>,
    merging: bool,
    events: Subscription,
}

impl BoardView {
    pub fn new(events: Subscription) -> Self {
        Self {
            items: Vec::new(),
            thumbnails: HashMap::new(),
            selected: None,
            hover_target: None,
            last_reorder: None,
            merging: false,
            events,
        }
    }

    /// Item whose preview button the pointer is over
    pub fn hover_target(&self) -> Option<ItemId> {
        self.hover_target
    }

    /// False while empty or while a merge is running
    pub fn can_merge(&self) -> bool {
        !self.items.is_empty() && !self.merging
    }

    pub fn set_merging(&mut self, merging: bool) {
        self.merging = merging;
    }

    pub fn apply(&mut self, ctx: &egui::Context, event: BoardEvent) {
        match event {
            BoardEvent::ItemsChanged(items) => {
                self.thumbnails
                    .retain(|id, _| items.iter().any(|item| item.id == *id));
                if self
                    .selected
                    .is_some_and(|id| !items.iter().any(|item| item.id == id))
                {
                    self.selected = None;
                }
                self.items = items;
            }
            BoardEvent::ThumbnailChanged {
                id,
                state,
                page_count,
            } => {
                let slot = match state {
                    ThumbnailState::Pending | ThumbnailState::Loading => ThumbnailSlot::Loading,
                    ThumbnailState::Ready(image) => {
                        let size = [image.width() as usize, image.height() as usize];
                        let color_image =
                            egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                        ThumbnailSlot::Ready(ctx.load_texture(
                            format!("thumbnail-{}", id.0),
                            color_image,
                            egui::TextureOptions::LINEAR,
                        ))
                    }
                    ThumbnailState::Failed(message) => ThumbnailSlot::Failed(message),
                };
                let entry = self.thumbnails.entry(id).or_insert(ThumbnailEntry {
                    slot: ThumbnailSlot::Loading,
                    page_count: None,
                });
                entry.slot = slot;
                if page_count.is_some() {
                    entry.page_count = page_count;
                }
            }
            BoardEvent::Notice(_) => {}
        }
    }

    fn pick_files(command_tx: &mpsc::UnboundedSender<PdfCommand>) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .pick_files()
        {
            let _ = command_tx.send(PdfCommand::BoardAddFiles { paths });
        }
    }

    fn request_merge(&mut self, command_tx: &mpsc::UnboundedSender<PdfCommand>) {
        if !self.can_merge() {
            return;
        }
        if let Some(output_path) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_file_name(pdf_merge::MERGED_FILE_NAME)
            .save_file()
        {
            self.merging = command_tx
                .send(PdfCommand::BoardMerge { output_path })
                .is_ok();
        }
    }

    fn handle_app_events(&mut self, command_tx: &mpsc::UnboundedSender<PdfCommand>) {
        while let Some(event) = self.events.try_recv() {
            match event {
                AppEvent::FilesUploaded(paths) => {
                    let _ = command_tx.send(PdfCommand::BoardAddFiles { paths });
                }
                AppEvent::MergeRequested => self.request_merge(command_tx),
                AppEvent::MergeCompleted { .. } => {}
            }
        }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        command_tx: &mpsc::UnboundedSender<PdfCommand>,
        preview: Option<OpenPreview>,
    ) {
        self.handle_app_events(command_tx);

        if !egui::DragAndDrop::has_any_payload(ui.ctx()) {
            self.last_reorder = None;
        }

        ui.horizontal(|ui| {
            if ui.button("➕ Add files...").clicked() {
                Self::pick_files(command_tx);
            }
            if ui
                .add_enabled(!self.items.is_empty(), egui::Button::new("🗑 Clear"))
                .clicked()
            {
                let _ = command_tx.send(PdfCommand::BoardClear);
            }

            ui.separator();

            if ui
                .add_enabled(self.can_merge(), egui::Button::new("📎 Merge"))
                .on_disabled_hover_text("Add at least one PDF to merge")
                .clicked()
            {
                self.request_merge(command_tx);
            }

            ui.label(match self.items.len() {
                0 => String::new(),
                1 => "1 file".to_string(),
                n => format!("{n} files"),
            });
        });

        ui.separator();

        if self.items.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.heading("No files yet");
                ui.label("Drop PDF files here or use \"Add files...\"");
            });
            return;
        }

        self.handle_keyboard(ui, command_tx);

        let viewport_width = ui.ctx().screen_rect().width();
        let items = self.items.clone();
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (index, item) in items.iter().enumerate() {
                self.show_row(
                    ui,
                    index,
                    items.len(),
                    item,
                    command_tx,
                    preview,
                    viewport_width,
                );
            }
        });
    }

    fn handle_keyboard(&mut self, ui: &egui::Ui, command_tx: &mpsc::UnboundedSender<PdfCommand>) {
        let Some(id) = self.selected else {
            return;
        };
        let direction = ui.input_mut(|i| {
            if i.consume_key(egui::Modifiers::ALT, egui::Key::ArrowUp) {
                Some(Direction::Up)
            } else if i.consume_key(egui::Modifiers::ALT, egui::Key::ArrowDown) {
                Some(Direction::Down)
            } else {
                None
            }
        });
        if let Some(direction) = direction {
            let _ = command_tx.send(PdfCommand::BoardMove { id, direction });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn show_row(
        &mut self,
        ui: &mut egui::Ui,
        index: usize,
        count: usize,
        item: &ItemSummary,
        command_tx: &mpsc::UnboundedSender<PdfCommand>,
        preview: Option<OpenPreview>,
        viewport_width: f32,
    ) {
        let id = item.id;
        let selected = self.selected == Some(id);

        let mut frame = egui::Frame::group(ui.style());
        if selected {
            frame = frame.stroke(ui.visuals().selection.stroke);
        }

        let row = frame.show(ui, |ui| {
            ui.horizontal(|ui| {
                let handle_id = egui::Id::new(("board-row", id.0));
                ui.dnd_drag_source(handle_id, id, |ui| {
                    ui.label(egui::RichText::new("☰").size(18.0))
                        .on_hover_text("Drag to reorder");
                });

                self.show_thumbnail(ui, id, command_tx);

                ui.vertical(|ui| {
                    ui.strong(&item.name);
                    let pages = self
                        .thumbnails
                        .get(&id)
                        .and_then(|entry| entry.page_count)
                        .map(|n| match n {
                            1 => " · 1 page".to_string(),
                            n => format!(" · {n} pages"),
                        })
                        .unwrap_or_default();
                    ui.weak(format!("{}{}", format_size(item.size), pages));
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("🗑").on_hover_text("Remove").clicked() {
                        let _ = command_tx.send(PdfCommand::BoardRemove { id });
                    }
                    if ui
                        .add_enabled(index + 1 < count, egui::Button::new("⬇"))
                        .on_hover_text("Move down (Alt+↓)")
                        .clicked()
                    {
                        let _ = command_tx.send(PdfCommand::BoardMove {
                            id,
                            direction: Direction::Down,
                        });
                    }
                    if ui
                        .add_enabled(index > 0, egui::Button::new("⬆"))
                        .on_hover_text("Move up (Alt+↑)")
                        .clicked()
                    {
                        let _ = command_tx.send(PdfCommand::BoardMove {
                            id,
                            direction: Direction::Up,
                        });
                    }

                    let eye = ui.button("👁").on_hover_text("Click to pin preview");
                    self.handle_preview_button(&eye, id, command_tx, preview, viewport_width);
                });
            });
        });

        let response = row.response.interact(egui::Sense::click());
        if response.clicked() {
            self.selected = Some(id);
        }

        if let Some(dragged) = response.dnd_hover_payload::<ItemId>() {
            let pair = (*dragged, id);
            if *dragged != id && self.last_reorder != Some(pair) {
                self.last_reorder = Some(pair);
                self.selected = Some(*dragged);
                let _ = command_tx.send(PdfCommand::BoardReorder {
                    dragged: *dragged,
                    target: id,
                });
            }
        }
    }

    fn show_thumbnail(
        &self,
        ui: &mut egui::Ui,
        id: ItemId,
        command_tx: &mpsc::UnboundedSender<PdfCommand>,
    ) {
        let slot = self.thumbnails.get(&id).map(|entry| &entry.slot);
        let size = egui::vec2(THUMBNAIL_HEIGHT * 0.75, THUMBNAIL_HEIGHT);

        match slot {
            Some(ThumbnailSlot::Ready(texture)) => {
                ui.add(egui::Image::new((texture.id(), texture.size_vec2())).fit_to_exact_size(size));
            }
            Some(ThumbnailSlot::Failed(message)) => {
                ui.allocate_ui(size, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.colored_label(ui.visuals().error_fg_color, "⚠")
                            .on_hover_text(message);
                        if ui.small_button("Retry").clicked() {
                            let _ = command_tx.send(PdfCommand::BoardRetryThumbnail { id });
                        }
                    });
                });
            }
            Some(ThumbnailSlot::Loading) | None => {
                ui.allocate_ui(size, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.spinner();
                    });
                });
            }
        }
    }

    fn handle_preview_button(
        &mut self,
        response: &egui::Response,
        id: ItemId,
        command_tx: &mpsc::UnboundedSender<PdfCommand>,
        preview: Option<OpenPreview>,
        viewport_width: f32,
    ) {
        if response.clicked() {
            let _ = command_tx.send(PdfCommand::PreviewOpen {
                id,
                mode: PreviewMode::Pinned,
                viewport_width,
            });
            return;
        }

        if response.hovered() {
            if self.hover_target != Some(id) {
                self.hover_target = Some(id);
                let pinned_open = preview.is_some_and(|p| p.mode == PreviewMode::Pinned);
                if !pinned_open {
                    let _ = command_tx.send(PdfCommand::PreviewOpen {
                        id,
                        mode: PreviewMode::Hover,
                        viewport_width,
                    });
                }
            }
        } else if self.hover_target == Some(id) {
            self.hover_target = None;
            if let Some(open) = preview
                && open.item == id
                && open.mode == PreviewMode::Hover
            {
                let _ = command_tx.send(PdfCommand::PreviewClose {
                    session_id: open.session_id,
                });
            }
        }
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let bytes = bytes as f64;
    if bytes >= MIB {
        format!("{:.1} MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.0} KB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}
