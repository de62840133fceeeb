use eframe::egui;
use pdf_async_runtime::{Notice, NoticeLevel};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const TOAST_LIFETIME: Duration = Duration::from_secs(4);
const MAX_TOASTS: usize = 5;

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

/// Transient notices stacked in the bottom-right corner
#[derive(Default)]
pub struct Toasts {
    entries: VecDeque<Toast>,
}

impl Toasts {
    pub fn push(&mut self, notice: Notice) {
        if self.entries.len() == MAX_TOASTS {
            self.entries.pop_front();
        }
        self.entries.push_back(Toast {
            notice,
            shown_at: Instant::now(),
        });
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.entries
            .retain(|toast| now.duration_since(toast.shown_at) < TOAST_LIFETIME);
        let Some(oldest) = self.entries.front() else {
            return;
        };
        ctx.request_repaint_after(TOAST_LIFETIME.saturating_sub(now.duration_since(oldest.shown_at)));

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toasts"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -40.0])
            .show(ctx, |ui| {
                for (index, toast) in self.entries.iter().enumerate() {
                    let color = level_color(ui.visuals(), toast.notice.level);
                    let response = egui::Frame::popup(ui.style())
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.colored_label(color, &toast.notice.message);
                        })
                        .response
                        .interact(egui::Sense::click())
                        .on_hover_text("Click to dismiss");
                    if response.clicked() {
                        dismissed = Some(index);
                    }
                }
            });

        if let Some(index) = dismissed {
            self.entries.remove(index);
        }
    }
}

fn level_color(visuals: &egui::Visuals, level: NoticeLevel) -> egui::Color32 {
    match level {
        NoticeLevel::Info => visuals.text_color(),
        NoticeLevel::Success => egui::Color32::from_rgb(60, 160, 80),
        NoticeLevel::Warning => visuals.warn_fg_color,
        NoticeLevel::Error => visuals.error_fg_color,
    }
}
