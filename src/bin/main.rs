use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flurry::render::Shape;
use flurry::{Clock, Preset, Rgba, Scene, SimulationConfig, StartupError, Surface, SystemClock};

#[derive(Parser, Debug)]
#[command(about = "Real-time particle flurry")]
struct Args {
    /// Built-in scenario, used when no file is given
    #[arg(short, long, value_enum, default_value_t = Preset::Flurry)]
    preset: Preset,

    /// Scenario YAML; bare names are looked up under scenarios/
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Overrides the scenario's seed
    #[arg(long)]
    seed: Option<u64>,
}

fn color(rgba: Rgba) -> egui::Rgba {
    let [r, g, b, a] = rgba.0;
    egui::Rgba::from_rgba_unmultiplied(r, g, b, a)
}

/// Paints into the central panel, scaling world pixels to fit the panel.
/// egui presents the whole UI at the end of the update, so `present` only
/// marks the frame as finished.
struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    scale: f32,
    presented: bool,
}

impl PainterSurface<'_> {
    fn at(&self, center: [f32; 2]) -> egui::Pos2 {
        self.origin + egui::vec2(center[0], center[1]) * self.scale
    }
}

impl Surface for PainterSurface<'_> {
    fn clear(&mut self, background: Rgba) {
        self.painter.rect_filled(self.painter.clip_rect(), 0.0, color(background));
    }

    fn draw_filled(&mut self, shape: Shape, fill: Rgba) {
        match shape {
            Shape::Square { center, size } => {
                let side = (size * self.scale).max(1.0);
                let rect = egui::Rect::from_center_size(self.at(center), egui::vec2(side, side));
                self.painter.rect_filled(rect, 0.0, color(fill));
            }
            Shape::Disc { center, radius } => {
                self.painter
                    .circle_filled(self.at(center), radius * self.scale, color(fill));
            }
        }
    }

    fn present(&mut self) {
        self.presented = true;
    }
}

struct FlurryApp {
    config: SimulationConfig,
    preset: Preset,
    scene: Scene,
    clock: SystemClock,
    last_frame: f64,
    frame_time: f64,
}

impl FlurryApp {
    fn new(config: SimulationConfig, preset: Preset, scene: Scene) -> Self {
        Self {
            config,
            preset,
            scene,
            clock: SystemClock::new(),
            last_frame: 0.0,
            frame_time: 0.0,
        }
    }

    fn restart(&mut self, config: SimulationConfig) {
        match Scene::from_config(&config) {
            Ok(scene) => {
                info!(preset = ?self.preset, "restarting scene");
                self.scene = scene;
                self.config = config;
                self.clock = SystemClock::new();
                self.last_frame = 0.0;
            }
            Err(err) => tracing::error!(%err, "scene rejected"),
        }
    }

    fn render_ui_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(format!("FPS: {:.1}", 1.0 / self.frame_time.max(1e-6)));
        ui.label(format!("Frame Time: {:.3}ms", self.frame_time * 1000.0));
        ui.label(format!("Attractors: {}", self.scene.attractor_count()));
        ui.label(format!("Live: {}", self.scene.live()));
        ui.label(format!("Visible: {}", self.scene.visible()));

        let before = self.preset;
        egui::ComboBox::from_label("Preset")
            .selected_text(format!("{:?}", self.preset))
            .show_ui(ui, |ui| {
                for preset in Preset::value_variants() {
                    ui.selectable_value(&mut self.preset, *preset, format!("{:?}", preset));
                }
            });
        if self.preset != before {
            self.restart(SimulationConfig::preset(self.preset));
        }

        if ui.button("Restart").clicked() {
            self.restart(self.config.clone());
        }
    }
}

impl eframe::App for FlurryApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let now = self.clock.now_seconds();
        self.frame_time = now - self.last_frame;
        self.last_frame = now;

        self.scene.advance(now);

        egui::SidePanel::left("Control Panel").show(ctx, |ui| {
            self.render_ui_panel(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, _response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                let painter = ui.painter_at(rect);
                let scale = (rect.width() / self.config.window.width)
                    .min(rect.height() / self.config.window.height);
                let mut surface = PainterSurface {
                    painter: &painter,
                    origin: rect.min,
                    scale,
                    presented: false,
                };
                self.scene.snapshot().draw(&mut surface);
                debug_assert!(surface.presented);
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            info!(frames = self.scene.frames(), "quit requested");
            frame.close();
        }

        ctx.request_repaint();
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config =
        SimulationConfig::load(args.file.as_deref(), args.preset).map_err(StartupError::from)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    // Reject a bad scenario before any window exists.
    let scene = Scene::from_config(&config).map_err(StartupError::from)?;

    let size = egui::vec2(config.window.width + 180.0, config.window.height);
    eframe::run_native(
        "Flurry",
        eframe::NativeOptions {
            renderer: eframe::Renderer::Wgpu,
            initial_window_size: Some(size),
            vsync: true,
            ..Default::default()
        },
        Box::new(move |_cc| Box::new(FlurryApp::new(config, args.preset, scene))),
    )
    .map_err(|err| StartupError::Surface(format!("{err:?}")))?;

    Ok(())
}
