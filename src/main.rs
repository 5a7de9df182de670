// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod engine;
mod gui;
mod serial;
mod signal;
mod simulator;
mod types;
use anyhow::{anyhow, Result};
use eframe::egui;

use crate::config::ScopeConfig;

// 入口函数：可选的第一个参数为 JSON 配置文件路径
fn main() -> Result<()> {
    env_logger::init();
    let config = match std::env::args().nth(1) {
        Some(path) => ScopeConfig::load(&path)?,
        None => ScopeConfig::default(),
    };
    log::info!("starting with {config:?}");
    let app = gui::ScopeApp::new(config)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([2000.0, 900.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("Dual-Screen Oscilloscope"),
        ..Default::default()
    };
    eframe::run_native("dual-scope", options, Box::new(move |_cc| Box::new(app)))
        .map_err(|err| anyhow!("failed to start the UI: {err}"))
}
