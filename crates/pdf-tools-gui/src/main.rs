#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;
use pdf_merge::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};

mod app;
mod handlers;
mod logger;
mod renderer;
mod views;
mod worker;

const MAX_LOG_ENTRIES: usize = 500;

fn preference_store() -> Box<dyn PreferenceStore> {
    match directories::ProjectDirs::from("", "", "pdf-merge-board") {
        Some(dirs) => Box::new(JsonPreferenceStore::new(
            dirs.config_dir().join("settings.json"),
        )),
        None => {
            log::warn!("No config directory available, preferences will not persist");
            Box::new(MemoryPreferenceStore::default())
        }
    }
}

fn main() -> eframe::Result<()> {
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let logger = logger::AppLogger::new(MAX_LOG_ENTRIES).with_level(level);
    let logger = match logger.clone().init() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Logger already installed: {e}");
            logger
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    let _guard = runtime.enter();

    let renderer = renderer::create_renderer();
    let preferences = preference_store();
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 720.0])
            .with_title("PDF Merge")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Merge",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::MergeBoardApp::new(
                cc,
                handle,
                renderer,
                preferences,
                logger,
            )))
        }),
    )
}
