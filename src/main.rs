mod app;

use std::path::PathBuf;

use thermal_tonemap::pipeline::ToneMapStrategy;

/// Usage: thermal_tonemap [IMAGE] [MODE]
/// MODE is n (normalize, default), h (equalize), c (CLAHE) or b (color balance).
fn main() -> eframe::Result {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let initial_path = args.next().map(PathBuf::from);
    let strategy = args
        .next()
        .map_or(ToneMapStrategy::Normalize, |code| ToneMapStrategy::from_code(&code));

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Thermal Tonemap"),
        ..Default::default()
    };

    eframe::run_native(
        "Thermal Tonemap",
        options,
        Box::new(move |cc| Ok(Box::new(app::ThermalViewerApp::new(cc, initial_path, strategy)))),
    )
}
