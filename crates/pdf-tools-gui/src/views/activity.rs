use eframe::egui;
use log::Level;

use crate::logger::AppLogger;

/// Collapsible log of recent activity, newest last
pub fn show_activity(ui: &mut egui::Ui, logger: &AppLogger) {
    egui::CollapsingHeader::new(format!("Activity ({})", logger.len()))
        .id_salt("activity-panel")
        .show(ui, |ui| {
            if ui.small_button("Clear").clicked() {
                logger.clear();
            }
            egui::ScrollArea::vertical()
                .max_height(160.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for entry in logger.entries() {
                        let color = match entry.level {
                            Level::Error => ui.visuals().error_fg_color,
                            Level::Warn => ui.visuals().warn_fg_color,
                            _ => ui.visuals().weak_text_color(),
                        };
                        ui.horizontal(|ui| {
                            ui.monospace(entry.timestamp.format("%H:%M:%S").to_string());
                            ui.colored_label(color, entry.level.as_str());
                            ui.label(&entry.message);
                        });
                    }
                });
        });
}
