use eframe::egui;
use pdf_async_runtime::{ItemId, PreviewMode};

use super::board::OpenPreview;

/// Pages received so far for the open preview session
pub struct PreviewView {
    session_id: u64,
    item: ItemId,
    mode: PreviewMode,
    name: String,
    pages: Vec<egui::TextureHandle>,
    rendered: usize,
    total: usize,
}

impl PreviewView {
    pub fn new(session_id: u64, item: ItemId, mode: PreviewMode, name: String) -> Self {
        Self {
            session_id,
            item,
            mode,
            name,
            pages: Vec::new(),
            rendered: 0,
            total: 0,
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn as_open(&self) -> OpenPreview {
        OpenPreview {
            session_id: self.session_id,
            item: self.item,
            mode: self.mode,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_page(
        &mut self,
        ctx: &egui::Context,
        page_index: usize,
        rendered: usize,
        total: usize,
        width: usize,
        height: usize,
        rgba_data: &[u8],
    ) {
        let color_image = egui::ColorImage::from_rgba_unmultiplied([width, height], rgba_data);
        let texture = ctx.load_texture(
            format!("preview-{}-{}", self.session_id, page_index),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        self.pages.push(texture);
        self.rendered = rendered;
        self.total = total;
    }

    fn status(&self) -> String {
        if self.total == 0 {
            "Rendering...".to_string()
        } else if self.rendered < self.total {
            format!("Rendering page {} of {}", self.rendered + 1, self.total)
        } else if self.total == 1 {
            "1 page".to_string()
        } else {
            format!("{} pages", self.total)
        }
    }

    fn show_pages(&self, ui: &mut egui::Ui, max_height: f32) {
        egui::ScrollArea::vertical()
            .max_height(max_height)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for texture in &self.pages {
                    ui.add(
                        egui::Image::new((texture.id(), texture.size_vec2()))
                            .max_width(ui.available_width()),
                    );
                    ui.add_space(8.0);
                }
                if self.rendered < self.total || self.total == 0 {
                    ui.spinner();
                }
            });
    }

    /// Draw the overlay. Returns true when the user asked to close it.
    pub fn show(&self, ctx: &egui::Context) -> bool {
        let screen = ctx.screen_rect();
        let page_width = self
            .pages
            .first()
            .map(|texture| texture.size_vec2().x)
            .unwrap_or(screen.width() * 0.4);

        match self.mode {
            PreviewMode::Pinned => {
                let response = egui::Modal::new(egui::Id::new("preview-modal")).show(ctx, |ui| {
                    ui.set_width(page_width.min(screen.width() * 0.9));
                    let mut close = false;
                    ui.horizontal(|ui| {
                        ui.strong(&self.name);
                        ui.weak(self.status());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            close = ui.button("✕").on_hover_text("Close (Esc)").clicked();
                        });
                    });
                    ui.separator();
                    self.show_pages(ui, screen.height() * 0.8);
                    close
                });
                response.inner || response.should_close()
            }
            PreviewMode::Hover => {
                egui::Area::new(egui::Id::new("hover-preview"))
                    .order(egui::Order::Tooltip)
                    .anchor(egui::Align2::RIGHT_TOP, [-16.0, 48.0])
                    .interactable(false)
                    .show(ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.set_width(page_width.min(screen.width() * 0.5));
                            ui.horizontal(|ui| {
                                ui.strong(&self.name);
                                ui.weak(self.status());
                            });
                            self.show_pages(ui, screen.height() * 0.7);
                        });
                    });
                false
            }
        }
    }
}
