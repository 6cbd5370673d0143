#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use clap::Parser;
use eframe::egui;
use egui_server_board::app::ServerBoard;
use egui_server_board::config::{Args, Settings};
use log::{error, info};
use tr::{tr, tr_init};

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::from_args(Args::parse()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };
    info!(
        "Showing {} servers, {} ms per step",
        settings.servers.len(),
        settings.step_delay.as_millis()
    );

    tr_init!("./locales");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(tr!("Server board"))
            .with_inner_size([1200.0, 720.0])
            .with_resizable(true),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "egui_server_board",
        options,
        Box::new(move |cc| Ok(Box::new(ServerBoard::new(cc, settings)))),
    )
}
