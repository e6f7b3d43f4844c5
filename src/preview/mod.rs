//! Debounced live preview
//!
//! [`PreviewController`] owns the preview session of one form. Hosts report
//! every parameter change and then poll the controller from their event loop;
//! a burst of changes inside the debounce window collapses into a single
//! render that always uses the most recent parameters.

pub mod driver;

use crate::error::Result;
use crate::qr::{EncodeRequest, ErrorCorrection, MicroVersion, TextStyle};
use crate::render::{Artifact, OutputFormat, RenderPipeline, RenderSpec, Rendered, Sizing};
use std::time::Duration;
use tokio::time::Instant;

/// Default quiet period before a refresh fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(120);

/// Parameters bound to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewParams {
    /// Text to encode
    pub data: String,
    /// Selected output format
    pub format: OutputFormat,
    /// Requested edge length in pixels
    pub size: u32,
    /// Quiet zone in modules
    pub border: u32,
    /// Forced version, `None` for automatic
    pub version: Option<MicroVersion>,
    /// Forced level, `None` to start at L and boost
    pub error_correction: Option<ErrorCorrection>,
}

impl PreviewParams {
    /// Trimmed data; empty means there is nothing to preview
    pub fn data(&self) -> &str {
        self.data.trim()
    }

    /// Encode request derived from the form
    pub fn encode_request(&self) -> EncodeRequest {
        let mut request = EncodeRequest::new(self.data())
            .with_error_correction(self.error_correction.unwrap_or_default())
            .with_boost(self.error_correction.is_none());
        request.version = self.version;
        request
    }
}

/// Produces the preview for a set of parameters
pub trait PreviewRenderer {
    /// Render one preview
    fn render_preview(&mut self, params: &PreviewParams) -> Result<Rendered>;
}

/// [`RenderPipeline`] as a preview renderer, capping the preview edge length
#[derive(Debug, Clone)]
pub struct PipelinePreview {
    pipeline: RenderPipeline,
    max_size: u32,
    text_style: TextStyle,
}

impl PipelinePreview {
    /// Wrap a pipeline; previews never exceed `max_size` pixels
    pub fn new(pipeline: RenderPipeline, max_size: u32) -> Self {
        Self {
            pipeline,
            max_size: max_size.max(1),
            text_style: TextStyle::default(),
        }
    }

    /// Ink choice for text previews
    pub fn with_text_style(mut self, style: TextStyle) -> Self {
        self.text_style = style;
        self
    }

    /// The wrapped pipeline, for full-size saves
    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }
}

impl PreviewRenderer for PipelinePreview {
    fn render_preview(&mut self, params: &PreviewParams) -> Result<Rendered> {
        let size = params.size.min(self.max_size);
        let mut spec = RenderSpec::new(params.format, Sizing::Pixels(size), params.border);
        spec.text_style = self.text_style;
        self.pipeline.render(&params.encode_request(), &spec)
    }
}

/// What the form should show after a controller step
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    /// Data is empty; the preview was cleared
    NeedsInput,
    /// A new preview replaced the previous one
    Rendered {
        /// Designator of the new symbol
        designator: String,
    },
    /// The render failed; the previous preview is kept
    Failed {
        /// User-facing message
        message: String,
        /// Error classification
        kind: &'static str,
    },
}

/// Status line state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewStatus {
    /// Nothing requested yet
    #[default]
    Ready,
    /// Data is empty
    NeedsInput,
    /// A refresh is scheduled
    Pending,
    /// Last refresh succeeded
    Generated(String),
    /// Last refresh failed
    Failed(String),
}

impl PreviewStatus {
    /// Text for the status line
    pub fn message(&self) -> String {
        match self {
            Self::Ready => "Ready".to_string(),
            Self::NeedsInput => "Please enter data".to_string(),
            Self::Pending => "Updating preview...".to_string(),
            Self::Generated(designator) => format!("Micro QR generated: {designator}"),
            Self::Failed(message) => format!("Error: {message}"),
        }
    }
}

/// Mutable state of one form's preview
#[derive(Debug, Default)]
pub struct PreviewSession {
    last_params: Option<PreviewParams>,
    pending_until: Option<Instant>,
    last_image: Option<Rendered>,
    status: PreviewStatus,
}

impl PreviewSession {
    /// Latest parameters reported by the form
    pub fn last_params(&self) -> Option<&PreviewParams> {
        self.last_params.as_ref()
    }

    /// Whether a refresh is scheduled
    pub fn is_pending(&self) -> bool {
        self.pending_until.is_some()
    }

    /// Most recent successful preview
    pub fn last_image(&self) -> Option<&Rendered> {
        self.last_image.as_ref()
    }

    /// Current status
    pub fn status(&self) -> &PreviewStatus {
        &self.status
    }
}

/// Debounces parameter changes into preview renders
#[derive(Debug)]
pub struct PreviewController<R> {
    renderer: R,
    session: PreviewSession,
    delay: Duration,
}

impl<R: PreviewRenderer> PreviewController<R> {
    /// Controller with the default debounce delay
    pub fn new(renderer: R) -> Self {
        Self::with_delay(renderer, DEFAULT_DEBOUNCE)
    }

    /// Controller with a custom debounce delay
    pub fn with_delay(renderer: R, delay: Duration) -> Self {
        Self {
            renderer,
            session: PreviewSession::default(),
            delay,
        }
    }

    /// Session state, for drawing the form
    pub fn session(&self) -> &PreviewSession {
        &self.session
    }

    /// The renderer in use
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the renderer
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// When the scheduled refresh is due, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.pending_until
    }

    /// Record a change to any bound parameter.
    ///
    /// Empty data clears the preview at once and cancels a scheduled refresh.
    /// Otherwise a refresh is scheduled unless one already is.
    pub fn on_parameter_changed(&mut self, params: PreviewParams, now: Instant) -> Option<PreviewEvent> {
        if params.data().is_empty() {
            self.session.last_params = Some(params);
            self.session.pending_until = None;
            self.session.last_image = None;
            self.session.status = PreviewStatus::NeedsInput;
            return Some(PreviewEvent::NeedsInput);
        }

        self.session.last_params = Some(params);
        if self.session.pending_until.is_none() {
            self.session.pending_until = Some(now + self.delay);
            self.session.status = PreviewStatus::Pending;
            tracing::trace!(delay_ms = self.delay.as_millis() as u64, "Preview refresh scheduled");
        }
        None
    }

    /// Fire the scheduled refresh once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<PreviewEvent> {
        match self.session.pending_until {
            Some(deadline) if now >= deadline => {
                self.session.pending_until = None;
                self.refresh()
            }
            _ => None,
        }
    }

    /// Render immediately with the latest parameters, dropping any scheduled refresh.
    pub fn refresh_now(&mut self) -> Option<PreviewEvent> {
        self.session.pending_until = None;
        match self.session.last_params.as_ref() {
            Some(params) if params.data().is_empty() => {
                self.session.last_image = None;
                self.session.status = PreviewStatus::NeedsInput;
                Some(PreviewEvent::NeedsInput)
            }
            _ => self.refresh(),
        }
    }

    fn refresh(&mut self) -> Option<PreviewEvent> {
        let params = self.session.last_params.clone()?;

        match self.renderer.render_preview(&params) {
            Ok(rendered) => {
                let designator = rendered.designator.clone();
                tracing::debug!(%designator, format = params.format.label(), "Preview refreshed");
                self.session.last_image = Some(rendered);
                self.session.status = PreviewStatus::Generated(designator.clone());
                Some(PreviewEvent::Rendered { designator })
            }
            Err(err) => {
                tracing::warn!(kind = err.kind(), "Preview render failed: {err}");
                let message = err.to_string();
                self.session.status = PreviewStatus::Failed(message.clone());
                Some(PreviewEvent::Failed {
                    message,
                    kind: err.kind(),
                })
            }
        }
    }
}

/// Text shown in the preview pane for non-raster formats
pub fn preview_text(rendered: &Rendered) -> Option<&str> {
    match &rendered.artifact {
        Artifact::Raster(_) => None,
        Artifact::Vector(_) => Some("SVG generated; save the file to view it"),
        Artifact::Text(text) => Some(text),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{EncodeError, Error};

    /// Records every render request; fails when the data is "fail"
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRenderer {
        pub(crate) calls: Vec<PreviewParams>,
    }

    impl PreviewRenderer for RecordingRenderer {
        fn render_preview(&mut self, params: &PreviewParams) -> Result<Rendered> {
            self.calls.push(params.clone());
            if params.data() == "fail" {
                return Err(Error::Encode(EncodeError::DataTooLong("too long".into())));
            }
            Ok(Rendered {
                designator: format!("M2-L:{}", params.data()),
                scale: None,
                artifact: Artifact::Text(params.data().to_string()),
            })
        }
    }

    pub(crate) fn params(data: &str) -> PreviewParams {
        PreviewParams {
            data: data.to_string(),
            format: OutputFormat::Png,
            size: 240,
            border: 1,
            version: None,
            error_correction: None,
        }
    }

    fn controller() -> PreviewController<RecordingRenderer> {
        PreviewController::with_delay(RecordingRenderer::default(), Duration::from_millis(100))
    }

    #[test]
    fn test_burst_collapses_into_one_render_with_latest_params() {
        let mut controller = controller();
        let start = Instant::now();

        for (i, data) in ["H", "HE", "HEL", "HELL", "HELLO"].into_iter().enumerate() {
            let at = start + Duration::from_millis(20 * i as u64);
            assert_eq!(controller.on_parameter_changed(params(data), at), None);
            assert_eq!(controller.poll(at), None);
        }

        assert_eq!(controller.next_deadline(), Some(start + Duration::from_millis(100)));
        let event = controller.poll(start + Duration::from_millis(100));
        assert_eq!(
            event,
            Some(PreviewEvent::Rendered {
                designator: "M2-L:HELLO".to_string()
            })
        );
        assert_eq!(controller.renderer().calls, vec![params("HELLO")]);
        assert!(!controller.session().is_pending());
    }

    #[test]
    fn test_change_after_refresh_schedules_again() {
        let mut controller = controller();
        let start = Instant::now();

        controller.on_parameter_changed(params("A"), start);
        controller.poll(start + Duration::from_millis(100));
        controller.on_parameter_changed(params("AB"), start + Duration::from_millis(150));
        assert_eq!(
            controller.next_deadline(),
            Some(start + Duration::from_millis(250))
        );
        controller.poll(start + Duration::from_millis(250));
        assert_eq!(controller.renderer().calls.len(), 2);
    }

    #[test]
    fn test_empty_data_clears_without_rendering() {
        let mut controller = controller();
        let start = Instant::now();

        controller.on_parameter_changed(params("A"), start);
        controller.poll(start + Duration::from_millis(100));
        assert!(controller.session().last_image().is_some());

        controller.on_parameter_changed(params("B"), start + Duration::from_millis(110));
        let event = controller.on_parameter_changed(params("   "), start + Duration::from_millis(120));
        assert_eq!(event, Some(PreviewEvent::NeedsInput));
        assert!(controller.session().last_image().is_none());
        assert!(!controller.session().is_pending());
        assert_eq!(controller.poll(start + Duration::from_secs(1)), None);
        assert_eq!(controller.renderer().calls.len(), 1);
        assert_eq!(controller.session().status().message(), "Please enter data");
    }

    #[test]
    fn test_failure_keeps_previous_preview() {
        let mut controller = controller();
        let start = Instant::now();

        controller.on_parameter_changed(params("ok"), start);
        controller.poll(start + Duration::from_millis(100));

        controller.on_parameter_changed(params("fail"), start + Duration::from_millis(200));
        let event = controller.poll(start + Duration::from_millis(300)).unwrap();
        assert!(matches!(event, PreviewEvent::Failed { kind: "data_too_long", .. }));
        assert_eq!(
            controller.session().last_image().map(|r| r.designator.as_str()),
            Some("M2-L:ok")
        );
        assert!(matches!(controller.session().status(), PreviewStatus::Failed(_)));
    }

    #[test]
    fn test_refresh_now_skips_the_wait() {
        let mut controller = controller();
        let start = Instant::now();

        controller.on_parameter_changed(params("NOW"), start);
        let event = controller.refresh_now();
        assert!(matches!(event, Some(PreviewEvent::Rendered { .. })));
        assert_eq!(controller.poll(start + Duration::from_secs(1)), None);
        assert_eq!(controller.renderer().calls.len(), 1);
    }

    #[test]
    fn test_preview_text_per_format() {
        let rendered = |artifact| Rendered {
            designator: "M1".to_string(),
            scale: None,
            artifact,
        };
        assert_eq!(preview_text(&rendered(Artifact::Text("██".into()))), Some("██"));
        assert!(preview_text(&rendered(Artifact::Vector("<svg/>".into()))).unwrap().contains("SVG"));
        assert_eq!(preview_text(&rendered(Artifact::Raster(image::GrayImage::new(1, 1)))), None);
    }

    #[test]
    fn test_pipeline_preview_caps_size_and_boosts_auto_level() {
        let mut preview = PipelinePreview::new(RenderPipeline::new("qrcodes"), 100);
        let mut p = params("HI");
        p.size = 1000;
        p.border = 0;
        let rendered = preview.render_preview(&p).unwrap();
        assert_eq!(rendered.designator, "M2-M");
        // floor(100 / 13) = 7 pixels per module
        assert_eq!(rendered.scale, Some(7));
    }
}
