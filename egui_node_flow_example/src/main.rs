#![forbid(unsafe_code)]
#![cfg_attr(not(debug_assertions), deny(warnings))] // Forbid warnings in release builds
#![warn(clippy::all, rust_2018_idioms)]

use eframe::egui::Visuals;

fn main() -> eframe::Result<()> {
    env_logger::init();
    eframe::run_native(
        "egui_node_flow example",
        eframe::NativeOptions::default(),
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Ok(Box::new(egui_node_flow_example::NodeFlowExample::new(cc)))
        }),
    )
}
