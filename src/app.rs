use eframe::egui;
use std::path::PathBuf;

use thermal_tonemap::image_io;
use thermal_tonemap::overlay::{AnnotationSpec, CursorSample};
use thermal_tonemap::pipeline::{self, ToneMapParams, ToneMapStrategy};
use thermal_tonemap::synthetic::{self, SceneParams};
use thermal_tonemap::tonemap::{SampleGrid16, TileGrid};

pub struct ThermalViewerApp {
    grid: Option<SampleGrid16>,
    source_name: Option<String>,
    preview_texture: Option<egui::TextureHandle>,
    preview_width: usize,
    preview_height: usize,
    params: ToneMapParams,
    tile_grid_text: String,
    scene: SceneParams,
    /// Image-pixel position of the pointer, updated before each render.
    cursor: Option<(u32, u32)>,
    reading: Option<CursorSample>,
    annotation: Option<AnnotationSpec>,
    needs_render: bool,
    render_time_ms: f64,
    status: Option<String>,
}

impl ThermalViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        initial_path: Option<PathBuf>,
        strategy: ToneMapStrategy,
    ) -> Self {
        let params = ToneMapParams {
            strategy,
            ..Default::default()
        };
        let mut app = Self {
            grid: None,
            source_name: None,
            preview_texture: None,
            preview_width: 0,
            preview_height: 0,
            tile_grid_text: params.tile_grid.to_string(),
            params,
            scene: SceneParams::default(),
            cursor: None,
            reading: None,
            annotation: None,
            needs_render: false,
            render_time_ms: 0.0,
            status: None,
        };
        if let Some(path) = initial_path {
            app.load_path(path);
        }
        app
    }

    fn open_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Radiometric images", &["tiff", "tif", "png", "pgm"])
            .pick_file()
        {
            self.load_path(path);
        }
    }

    fn load_path(&mut self, path: PathBuf) {
        let start = web_time::Instant::now();
        match image_io::load_radiometric(&path) {
            Ok(grid) => {
                log::info!(
                    "loaded {} ({}x{}) in {:.1}ms",
                    path.display(),
                    grid.width(),
                    grid.height(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                self.set_grid(grid, path.display().to_string());
            }
            Err(e) => {
                log::warn!("could not load {}: {e}", path.display());
                self.status = Some(format!("Error loading image: {e}"));
            }
        }
    }

    fn load_synthetic(&mut self) {
        let grid = synthetic::synthetic_scene(640, 512, &self.scene);
        self.scene.seed = self.scene.seed.wrapping_add(1);
        self.set_grid(grid, "synthetic scene".to_string());
    }

    fn set_grid(&mut self, grid: SampleGrid16, name: String) {
        self.grid = Some(grid);
        self.source_name = Some(name);
        self.cursor = None;
        self.reading = None;
        self.annotation = None;
        self.status = None;
        self.needs_render = true;
    }

    fn save_result(&mut self) {
        let Some(grid) = &self.grid else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .add_filter("TIFF", &["tiff", "tif"])
            .save_file()
        {
            let result = pipeline::render_frame(grid, &self.params)
                .and_then(|frame| image_io::save_frame(&frame, &path));
            if let Err(e) = result {
                log::warn!("could not save {}: {e}", path.display());
                self.status = Some(format!("Error saving image: {e}"));
            }
        }
    }

    /// Re-tone-map the whole frame for the current cursor. Runs on every
    /// cursor move; nothing from the previous frame is reused.
    fn render(&mut self, ctx: &egui::Context) {
        let Some(grid) = &self.grid else {
            return;
        };
        let start = web_time::Instant::now();
        match pipeline::render_annotated(grid, &self.params, self.cursor) {
            Ok(out) => {
                self.render_time_ms = start.elapsed().as_secs_f64() * 1000.0;
                self.preview_width = out.frame.width() as usize;
                self.preview_height = out.frame.height() as usize;
                self.reading = out.cursor;
                self.annotation = out.annotation;
                self.status = None;

                let color_image = egui::ColorImage::from_rgb(
                    [self.preview_width, self.preview_height],
                    out.frame.as_raw(),
                );
                self.preview_texture = Some(ctx.load_texture(
                    "preview",
                    color_image,
                    egui::TextureOptions::NEAREST,
                ));
            }
            Err(e) => {
                log::warn!("{} failed: {e}", self.params.strategy.name());
                self.status = Some(e.to_string());
            }
        }
    }
}

impl eframe::App for ThermalViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image").clicked() {
                    self.open_image();
                }
                if ui.button("Synthetic Scene").clicked() {
                    self.load_synthetic();
                }
                if ui.button("Save Frame").clicked() {
                    self.save_result();
                }
                ui.separator();

                if let Some(name) = &self.source_name {
                    ui.label(format!(
                        "{name} | {}x{} | {:.0}ms",
                        self.preview_width, self.preview_height, self.render_time_ms
                    ));
                }
                if let Some(reading) = &self.reading {
                    ui.separator();
                    ui.label(format!(
                        "({}, {}) raw {} | {:.2} °C",
                        reading.x, reading.y, reading.sample, reading.celsius
                    ));
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, status);
                }
            });
        });

        egui::SidePanel::left("controls")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let mut changed = false;
                    changed |= ui_strategy(ui, &mut self.params);
                    changed |= ui_clahe(ui, &mut self.params, &mut self.tile_grid_text, &mut self.status);
                    changed |= ui_color_balance(ui, &mut self.params);
                    ui_scene(ui, &mut self.scene);
                    if changed {
                        self.needs_render = true;
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(tex) = &self.preview_texture else {
                ui.centered_and_justified(|ui| {
                    ui.label("Open a 16-bit radiometric image or generate a synthetic scene");
                });
                return;
            };
            let mut moved_to = None;
            egui::ScrollArea::both().show(ui, |ui| {
                let available = ui.available_size();
                let img_w = self.preview_width as f32;
                let img_h = self.preview_height as f32;
                let scale = f32::min(available.x / img_w, available.y / img_h).max(0.1);
                let display_size = egui::vec2(img_w * scale, img_h * scale);
                let response = ui.add(
                    egui::Image::new(egui::load::SizedTexture::new(tex.id(), display_size))
                        .sense(egui::Sense::hover()),
                );

                if let Some(pos) = response.hover_pos() {
                    let local = (pos - response.rect.min) / scale;
                    let x = (local.x.max(0.0) as u32).min(self.preview_width.saturating_sub(1) as u32);
                    let y = (local.y.max(0.0) as u32).min(self.preview_height.saturating_sub(1) as u32);
                    if self.cursor != Some((x, y)) {
                        moved_to = Some((x, y));
                    }
                }

                if let Some(spec) = &self.annotation {
                    let [r, g, b] = spec.color.0;
                    let anchor = response.rect.min
                        + egui::vec2(spec.label_pos.0 as f32, spec.label_pos.1 as f32) * scale;
                    ui.painter().text(
                        anchor,
                        egui::Align2::LEFT_TOP,
                        &spec.label,
                        egui::FontId::proportional(13.0),
                        egui::Color32::from_rgb(r, g, b),
                    );
                }
            });
            if let Some(cursor) = moved_to {
                self.cursor = Some(cursor);
                self.needs_render = true;
            }
        });

        if self.needs_render && self.grid.is_some() {
            self.render(ctx);
            self.needs_render = false;
            ctx.request_repaint();
        }
    }
}

// --- UI Section Builders ---

fn ui_strategy(ui: &mut egui::Ui, params: &mut ToneMapParams) -> bool {
    let mut changed = false;
    egui::CollapsingHeader::new("Tone Mapping")
        .default_open(true)
        .show(ui, |ui| {
            egui::ComboBox::from_label("Strategy")
                .selected_text(params.strategy.name())
                .show_ui(ui, |ui| {
                    for &strategy in ToneMapStrategy::ALL {
                        changed |= ui
                            .selectable_value(&mut params.strategy, strategy, strategy.name())
                            .changed();
                    }
                });
        });
    changed
}

fn ui_clahe(
    ui: &mut egui::Ui,
    params: &mut ToneMapParams,
    tile_grid_text: &mut String,
    status: &mut Option<String>,
) -> bool {
    let mut changed = false;
    egui::CollapsingHeader::new("CLAHE")
        .default_open(params.strategy == ToneMapStrategy::Adaptive)
        .show(ui, |ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut params.clip_limit, 0.1..=40.0)
                        .logarithmic(true)
                        .text("Clip Limit"),
                )
                .changed();
            ui.horizontal(|ui| {
                ui.label("Tile Grid");
                if ui.text_edit_singleline(tile_grid_text).lost_focus() {
                    match tile_grid_text.parse::<TileGrid>() {
                        Ok(grid) => {
                            changed |= grid != params.tile_grid;
                            params.tile_grid = grid;
                        }
                        Err(e) => {
                            *status = Some(e.to_string());
                            *tile_grid_text = params.tile_grid.to_string();
                        }
                    }
                }
            });
        });
    changed
}

fn ui_color_balance(ui: &mut egui::Ui, params: &mut ToneMapParams) -> bool {
    let mut changed = false;
    egui::CollapsingHeader::new("Color Balance")
        .default_open(params.strategy == ToneMapStrategy::ColorBalance)
        .show(ui, |ui| {
            changed |= ui
                .add(egui::Slider::new(&mut params.percent, 0.0..=20.0).text("Clip %"))
                .changed();
        });
    changed
}

fn ui_scene(ui: &mut egui::Ui, scene: &mut SceneParams) {
    egui::CollapsingHeader::new("Synthetic Scene")
        .default_open(false)
        .show(ui, |ui| {
            ui.add(egui::Slider::new(&mut scene.ambient_celsius, -20.0..=40.0).text("Ambient (°C)"));
            ui.add(egui::Slider::new(&mut scene.gradient_celsius, -10.0..=10.0).text("Gradient (°C)"));
            let mut count = scene.hotspot_count as i32;
            ui.add(egui::Slider::new(&mut count, 0..=12).text("Hotspots"));
            scene.hotspot_count = count as usize;
            ui.add(egui::Slider::new(&mut scene.hotspot_peak_celsius, 0.0..=200.0).text("Peak (°C)"));
            ui.add(
                egui::Slider::new(&mut scene.noise_sigma, 0.0..=2.0)
                    .text("Noise (°C)"),
            );
        });
}
