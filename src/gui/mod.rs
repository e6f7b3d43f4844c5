//! Desktop form with a debounced live preview

use crate::config::{MicroQrConfig, Theme};
use crate::error::Result;
use crate::preview::{PipelinePreview, PreviewController, PreviewEvent, PreviewParams, preview_text};
use crate::qr::{ErrorCorrection, MicroVersion, TextStyle};
use crate::render::{Artifact, MAX_BORDER, OutputFormat, RenderPipeline, RenderSpec, Sizing};
use eframe::egui::{self, Align2, ColorImage, RichText, TextureHandle, TextureOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

const TITLE: &str = "Micro QR Code Generator";

/// Open the form and block until the window is closed.
pub fn run(config: MicroQrConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITLE)
            .with_inner_size([config.gui.window_width, config.gui.window_height])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(MicroQrApp::new(cc, config)))),
    )
}

/// eframe application state
pub struct MicroQrApp {
    controller: PreviewController<PipelinePreview>,
    form: PreviewParams,
    max_preview: u32,
    save_path: String,
    texture: Option<TextureHandle>,
    notice: Option<String>,
    alert: Option<String>,
}

impl MicroQrApp {
    /// Build the form from configuration
    pub fn new(cc: &eframe::CreationContext<'_>, config: MicroQrConfig) -> Self {
        apply_look(&cc.egui_ctx, &config);

        let ink = match config.ui.theme {
            Theme::Light => TextStyle::DarkInk,
            Theme::Dark => TextStyle::LightInk,
        };
        let preview = PipelinePreview::new(RenderPipeline::from_config(&config), config.gui.max_preview_size)
            .with_text_style(ink);
        let controller = PreviewController::with_delay(
            preview,
            Duration::from_millis(config.gui.preview_debounce_ms),
        );

        let form = PreviewParams {
            data: String::new(),
            format: config.gui.preview_format,
            size: config.gui.preview_size,
            border: config.gui.preview_border,
            version: None,
            error_correction: None,
        };

        Self {
            controller,
            save_path: format!("microqr.{}", form.format.extension()),
            form,
            max_preview: config.gui.max_preview_size,
            texture: None,
            notice: None,
            alert: None,
        }
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: PreviewEvent) {
        self.notice = None;
        match event {
            PreviewEvent::NeedsInput => self.texture = None,
            PreviewEvent::Rendered { .. } => {
                self.texture = self.controller.session().last_image().and_then(|rendered| {
                    match &rendered.artifact {
                        Artifact::Raster(image) => {
                            let size = [image.width() as usize, image.height() as usize];
                            Some(ctx.load_texture(
                                "microqr-preview",
                                ColorImage::from_gray(size, image.as_raw()),
                                TextureOptions::NEAREST,
                            ))
                        }
                        _ => None,
                    }
                });
            }
            PreviewEvent::Failed { message, .. } => self.alert = Some(message),
        }
    }

    fn params_changed(&mut self, ctx: &egui::Context) {
        if let Some(event) = self.controller.on_parameter_changed(self.form.clone(), Instant::now()) {
            self.handle_event(ctx, event);
        }
    }

    fn generate(&mut self, ctx: &egui::Context) {
        self.controller.on_parameter_changed(self.form.clone(), Instant::now());
        if let Some(event) = self.controller.refresh_now() {
            self.handle_event(ctx, event);
        }
    }

    fn save(&mut self) {
        if self.form.data().is_empty() {
            self.notice = Some("Please enter data".to_string());
            return;
        }
        let path = PathBuf::from(self.save_path.trim());
        if path.as_os_str().is_empty() {
            self.notice = Some("Choose a file to save to".to_string());
            return;
        }

        let mut spec = RenderSpec::new(self.form.format, Sizing::Pixels(self.form.size), self.form.border);
        spec.text_style = TextStyle::DarkInk;
        let pipeline = self.controller.renderer().pipeline();

        let result = pipeline
            .render(&self.form.encode_request(), &spec)
            .and_then(|rendered| Ok(rendered.artifact.write_to(&path)?));

        self.notice = Some(save_outcome(&path, result, &mut self.alert));
    }

    fn status_line(&self) -> String {
        self.notice
            .clone()
            .unwrap_or_else(|| self.controller.session().status().message())
    }

    fn form_ui(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.label("Data:");
        changed |= ui
            .add(egui::TextEdit::singleline(&mut self.form.data).desired_width(f32::INFINITY))
            .changed();
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Version:");
            let selected = self.form.version.map_or("Auto".to_string(), |v| v.to_string());
            egui::ComboBox::from_id_salt("microqr-version")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    changed |= ui.selectable_value(&mut self.form.version, None, "Auto").changed();
                    for version in MicroVersion::ALL {
                        changed |= ui
                            .selectable_value(&mut self.form.version, Some(version), version.to_string())
                            .changed();
                    }
                });

            ui.add_space(18.0);
            ui.label("ECC:");
            let selected = self.form.error_correction.map_or("Auto".to_string(), |l| l.to_string());
            egui::ComboBox::from_id_salt("microqr-ecc")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut self.form.error_correction, None, "Auto")
                        .changed();
                    for level in ErrorCorrection::ALL {
                        changed |= ui
                            .selectable_value(&mut self.form.error_correction, Some(level), level.to_string())
                            .changed();
                    }
                });
        });
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Format:");
            for format in [OutputFormat::Png, OutputFormat::Svg, OutputFormat::Text] {
                if ui.radio_value(&mut self.form.format, format, format.label()).changed() {
                    changed = true;
                    self.save_path = with_extension(&self.save_path, format);
                }
            }

            ui.add_space(18.0);
            ui.label("Size (px):");
            changed |= ui
                .add(egui::DragValue::new(&mut self.form.size).range(1..=4096))
                .changed();

            ui.add_space(18.0);
            ui.label("Border:");
            changed |= ui
                .add(egui::DragValue::new(&mut self.form.border).range(0..=MAX_BORDER))
                .changed();
        });

        changed
    }

    fn preview_ui(&self, ui: &mut egui::Ui) {
        let side = self.max_preview as f32;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_size(egui::vec2(ui.available_width(), side));
            ui.centered_and_justified(|ui| {
                if let Some(texture) = &self.texture {
                    ui.image((texture.id(), texture.size_vec2()));
                } else if let Some(text) = self.controller.session().last_image().and_then(preview_text) {
                    ui.label(RichText::new(text).monospace());
                }
            });
        });
    }
}

impl eframe::App for MicroQrApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(event) = self.controller.poll(Instant::now()) {
            self.handle_event(ctx, event);
        }

        egui::TopBottomPanel::bottom("microqr-status").show(ctx, |ui| {
            ui.label(self.status_line());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| ui.heading(TITLE));
            ui.add_space(12.0);

            if self.form_ui(ui) {
                self.params_changed(ctx);
            }
            ui.add_space(8.0);

            if ui.add_sized([ui.available_width(), 28.0], egui::Button::new("Generate")).clicked() {
                self.generate(ctx);
            }
            ui.horizontal(|ui| {
                ui.label("Save as:");
                ui.add(egui::TextEdit::singleline(&mut self.save_path).desired_width(360.0));
                if ui.button("Save").clicked() {
                    self.save();
                }
            });
            ui.add_space(12.0);

            self.preview_ui(ui);
        });

        if let Some(message) = self.alert.clone() {
            egui::Window::new("Micro QR generation failed")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        self.alert = None;
                    }
                });
        }

        if let Some(deadline) = self.controller.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}

fn apply_look(ctx: &egui::Context, config: &MicroQrConfig) {
    ctx.set_visuals(match config.ui.theme {
        Theme::Light => egui::Visuals::light(),
        Theme::Dark => egui::Visuals::dark(),
    });

    let mut style = (*ctx.style()).clone();
    for (text_style, font) in style.text_styles.iter_mut() {
        match text_style {
            egui::TextStyle::Heading => font.size = config.ui.font_size * 1.6,
            egui::TextStyle::Small => font.size = config.ui.font_size * 0.8,
            _ => font.size = config.ui.font_size,
        }
    }
    ctx.set_style(style);
}

/// Status line for a save; failures also raise the modal alert.
fn save_outcome(path: &Path, result: Result<()>, alert: &mut Option<String>) -> String {
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Saved from form");
            format!("Saved: {}", path.display())
        }
        Err(err) => {
            tracing::warn!(kind = err.kind(), "Save failed: {err}");
            *alert = Some(err.to_string());
            format!("Error saving: {err}")
        }
    }
}

/// Swap the extension of the save path to match a newly chosen format.
fn with_extension(path: &str, format: OutputFormat) -> String {
    let mut path = PathBuf::from(path);
    if path.as_os_str().is_empty() {
        return path.display().to_string();
    }
    path.set_extension(format.extension());
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};

    #[test]
    fn test_save_path_follows_format() {
        assert_eq!(with_extension("out/code.png", OutputFormat::Svg), "out/code.svg");
        assert_eq!(with_extension("code", OutputFormat::Text), "code.txt");
        assert_eq!(with_extension("", OutputFormat::Png), "");
    }

    #[test]
    fn test_failed_save_raises_alert() {
        let mut alert = None;
        let path = Path::new("out/code.png");

        let status = save_outcome(path, Ok(()), &mut alert);
        assert!(status.starts_with("Saved:"));
        assert!(alert.is_none());

        let err: Error = ConfigError::Invalid("disk full".into()).into();
        let status = save_outcome(path, Err(err), &mut alert);
        assert!(status.starts_with("Error saving:"));
        assert_eq!(alert.as_deref(), Some("Configuration error: disk full"));
    }
}
