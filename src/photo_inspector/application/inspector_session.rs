use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::domain::color::Readout;
use crate::domain::error::DomainError;
use crate::domain::histogram::{
    HistogramEngine, HistogramRenderer, LuminosityHistogram, DEFAULT_SAMPLE_STRIDE,
};
use crate::domain::pixel_source::SharedPixelSource;
use crate::domain::pointer::PointerListener;
use crate::domain::position::{DisplayRect, PointerPosition};
use crate::domain::sampler::ColorSampler;
use crate::domain::settings::{SettingKey, SettingsStore};

/// Runtime flag plus the preference that survives navigation and restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolState {
    pub active: bool,
    pub persistent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectorState {
    pub eyedropper: ToolState,
    pub histogram: ToolState,
    pub current_luminosity: Option<u8>,
    pub histogram_data: Option<LuminosityHistogram>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectorOptions {
    pub sample_stride: u32,
    pub histogram_width: u32,
    pub histogram_height: u32,
}

impl Default for InspectorOptions {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            histogram_width: 256,
            histogram_height: 100,
        }
    }
}

/// Owns the eyedropper and histogram tools of one viewer.
///
/// Every failure inside is logged and turned into "nothing changed"; none of
/// the public operations return errors. In-memory state is authoritative:
/// settings are written on toggle and read only by `restore_persisted`.
pub struct PixelInspectorSession<S: SettingsStore> {
    settings: Arc<S>,
    // トレイトオブジェクトとして保持
    renderer: Arc<dyn HistogramRenderer + Send + Sync>,
    pointer_listener: Box<dyn PointerListener>,
    sampler: ColorSampler,
    engine: HistogramEngine,
    options: InspectorOptions,
    state: InspectorState,
    viewer_open: bool,
    image: Option<SharedPixelSource>,
    readout: Option<Readout>,
    histogram_render: Option<RgbaImage>,
}

impl<S: SettingsStore> PixelInspectorSession<S> {
    pub fn new(
        settings: Arc<S>,
        renderer: Arc<dyn HistogramRenderer + Send + Sync>,
        pointer_listener: Box<dyn PointerListener>,
        options: InspectorOptions,
    ) -> Self {
        Self {
            settings,
            renderer,
            pointer_listener,
            sampler: ColorSampler::new(),
            engine: HistogramEngine::new(options.sample_stride),
            options,
            state: InspectorState::default(),
            viewer_open: false,
            image: None,
            readout: None,
            histogram_render: None,
        }
    }

    /// Loads both persistent flags. Read failures count as `false`.
    pub async fn restore_persisted(&mut self) {
        self.state.eyedropper.persistent = self.read_flag(SettingKey::EyedropperActive).await;
        self.state.histogram.persistent = self.read_flag(SettingKey::HistogramActive).await;
        info!(
            eyedropper = self.state.eyedropper.persistent,
            histogram = self.state.histogram.persistent,
            "restored inspector preferences"
        );
    }

    pub fn state(&self) -> &InspectorState {
        &self.state
    }

    pub fn is_viewer_open(&self) -> bool {
        self.viewer_open
    }

    pub fn current_readout(&self) -> Option<&Readout> {
        self.readout.as_ref()
    }

    pub fn current_histogram_render(&self) -> Option<&RgbaImage> {
        self.histogram_render.as_ref()
    }

    pub fn on_viewer_opened(&mut self) {
        self.viewer_open = true;
        if self.state.eyedropper.persistent {
            self.activate_eyedropper();
        }
        if self.state.histogram.persistent {
            self.activate_histogram();
        }
    }

    /// Forces both tools off regardless of their persistent flags and drops
    /// the histogram and the image binding.
    pub fn on_viewer_closed(&mut self) {
        self.deactivate_histogram();
        self.deactivate_eyedropper();
        self.viewer_open = false;
        self.image = None;
    }

    /// Called once the image has finished decoding.
    pub fn on_image_displayed(&mut self, image: SharedPixelSource) {
        if !self.viewer_open {
            debug!("image displayed while the viewer is closed, ignoring");
            return;
        }
        self.image = Some(image);
        if self.state.histogram.active {
            self.generate_histogram();
        }
    }

    /// The image now on screen could not be decoded. The readout and the
    /// histogram keep showing the last good values, but nothing is sampled
    /// until the next image arrives.
    pub fn on_image_failed(&mut self) {
        if self.image.take().is_some() {
            debug!("image binding dropped after decode failure");
        }
    }

    /// Returns whether the readout changed.
    pub fn on_pointer_move(&mut self, pointer: PointerPosition, display: DisplayRect) -> bool {
        if !self.state.eyedropper.active {
            return false;
        }
        let Some(image) = self.image.as_ref() else {
            return false;
        };
        let Some((x, y)) = display.to_raster(pointer, image.width(), image.height()) else {
            return false;
        };

        let sample = match self.sampler.sample(image.as_ref(), x, y) {
            Ok(sample) => sample,
            Err(DomainError::SampleOutOfBounds { .. }) => return false,
            Err(e) => {
                warn!("eyedropper read failed: {}", e);
                return false;
            }
        };

        self.state.current_luminosity = Some(sample.luminosity);
        self.readout = Some(Readout::from(sample));
        // マーカーはカーソルに追従するので毎回再描画する
        self.redraw_histogram();
        true
    }

    /// Flips the eyedropper and persists the new preference. While the viewer
    /// is closed only the preference flips; the tool comes up on next open.
    pub async fn toggle_inspector(&mut self) -> bool {
        let enable = if self.viewer_open {
            !self.state.eyedropper.active
        } else {
            !self.state.eyedropper.persistent
        };

        if self.viewer_open {
            if enable {
                self.activate_eyedropper();
            } else {
                self.deactivate_eyedropper();
            }
        }
        self.state.eyedropper.persistent = enable;
        self.write_flag(SettingKey::EyedropperActive, enable).await;
        info!(active = enable, "eyedropper toggled");
        enable
    }

    /// Same contract as `toggle_inspector`, for the histogram.
    pub async fn toggle_histogram(&mut self) -> bool {
        let enable = if self.viewer_open {
            !self.state.histogram.active
        } else {
            !self.state.histogram.persistent
        };

        if self.viewer_open {
            if enable {
                self.activate_histogram();
            } else {
                self.deactivate_histogram();
            }
        }
        self.state.histogram.persistent = enable;
        self.write_flag(SettingKey::HistogramActive, enable).await;
        info!(active = enable, "histogram toggled");
        enable
    }

    fn activate_eyedropper(&mut self) {
        if self.state.eyedropper.active {
            return;
        }
        self.state.eyedropper.active = true;
        self.pointer_listener.attach();
    }

    fn deactivate_eyedropper(&mut self) {
        if !self.state.eyedropper.active {
            return;
        }
        self.state.eyedropper.active = false;
        self.pointer_listener.detach();
        self.state.current_luminosity = None;
        self.readout = None;
        self.redraw_histogram();
    }

    fn activate_histogram(&mut self) {
        if self.state.histogram.active {
            return;
        }
        self.state.histogram.active = true;
        if self.image.is_some() {
            self.generate_histogram();
        }
    }

    fn deactivate_histogram(&mut self) {
        self.state.histogram.active = false;
        self.state.histogram_data = None;
        self.histogram_render = None;
    }

    fn generate_histogram(&mut self) {
        let Some(image) = self.image.clone() else {
            return;
        };
        match self.engine.compute(image.as_ref()) {
            Ok(histogram) => {
                debug!(
                    width = image.width(),
                    height = image.height(),
                    samples = histogram.total(),
                    "histogram computed"
                );
                self.state.histogram_data = Some(histogram);
                self.redraw_histogram();
            }
            // 以前のヒストグラムはそのまま残す
            Err(e) => warn!("histogram unavailable: {}", e),
        }
    }

    fn redraw_histogram(&mut self) {
        if !self.state.histogram.active {
            return;
        }
        if let Some(histogram) = &self.state.histogram_data {
            self.histogram_render = Some(self.renderer.render(
                histogram,
                self.state.current_luminosity,
                self.options.histogram_width,
                self.options.histogram_height,
            ));
        }
    }

    async fn read_flag(&self, key: SettingKey) -> bool {
        match self.settings.get_flag(key, false).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {} from settings: {}", key.as_str(), e);
                false
            }
        }
    }

    async fn write_flag(&self, key: SettingKey, value: bool) {
        if let Err(e) = self.settings.set_flag(key, value).await {
            warn!("Failed to save {} to settings: {}", key.as_str(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::Rgb;
    use crate::domain::pixel_source::{PixelGrid, PixelSource};
    use crate::domain::pointer::MockPointerListener;
    use crate::infrastructure::error::InfrastructureError;
    use crate::infrastructure::histogram_renderer::DefaultHistogramRenderer;
    use crate::infrastructure::settings_store::MemorySettingsStore;
    use serde_json::Value;
    use std::future::Future;
    use std::sync::Mutex;

    // 手動モック: 渡されたハイライト位置を記録する
    #[derive(Clone, Default)]
    struct RecordingRenderer {
        highlights: Arc<Mutex<Vec<Option<u8>>>>,
    }

    impl RecordingRenderer {
        fn highlights(&self) -> Vec<Option<u8>> {
            self.highlights.lock().unwrap().clone()
        }
    }

    impl HistogramRenderer for RecordingRenderer {
        fn render(
            &self,
            _histogram: &LuminosityHistogram,
            highlight: Option<u8>,
            canvas_width: u32,
            canvas_height: u32,
        ) -> RgbaImage {
            self.highlights.lock().unwrap().push(highlight);
            RgbaImage::new(canvas_width, canvas_height)
        }
    }

    struct FailingSettingsStore;

    impl SettingsStore for FailingSettingsStore {
        fn load(
            &self,
            _key: SettingKey,
        ) -> impl Future<Output = Result<Option<Value>, InfrastructureError>> + Send {
            async { Err(InfrastructureError::StoreUnavailable("store offline".to_string())) }
        }

        fn store(
            &self,
            _key: SettingKey,
            _value: Value,
        ) -> impl Future<Output = Result<(), InfrastructureError>> + Send {
            async { Err(InfrastructureError::StoreUnavailable("store offline".to_string())) }
        }

        fn remove(
            &self,
            _key: SettingKey,
        ) -> impl Future<Output = Result<(), InfrastructureError>> + Send {
            async { Err(InfrastructureError::StoreUnavailable("store offline".to_string())) }
        }
    }

    struct TaintedSource;

    impl PixelSource for TaintedSource {
        fn width(&self) -> u32 {
            4
        }

        fn height(&self) -> u32 {
            4
        }

        fn read_pixel(&self, _x: u32, _y: u32) -> Result<Rgb, DomainError> {
            Err(DomainError::CanvasRead("tainted".to_string()))
        }
    }

    fn quiet_listener() -> Box<MockPointerListener> {
        let mut listener = MockPointerListener::new();
        listener.expect_attach().return_const(());
        listener.expect_detach().return_const(());
        Box::new(listener)
    }

    fn session_with<S: SettingsStore>(
        settings: Arc<S>,
        renderer: Arc<dyn HistogramRenderer + Send + Sync>,
        listener: Box<dyn PointerListener>,
    ) -> PixelInspectorSession<S> {
        PixelInspectorSession::new(settings, renderer, listener, InspectorOptions::default())
    }

    fn full_view(width: f64, height: f64) -> DisplayRect {
        DisplayRect::new(0.0, 0.0, width, height)
    }

    #[tokio::test]
    async fn test_viewer_open_restores_persisted_tools() {
        let settings = Arc::new(
            MemorySettingsStore::new()
                .with_flag(SettingKey::EyedropperActive, true)
                .with_flag(SettingKey::HistogramActive, true),
        );
        let mut listener = MockPointerListener::new();
        listener.expect_attach().times(1).return_const(());
        listener.expect_detach().times(0);

        let mut session = session_with(
            settings,
            Arc::new(DefaultHistogramRenderer::new()),
            Box::new(listener),
        );
        session.restore_persisted().await;
        session.on_viewer_opened();

        assert!(session.state().eyedropper.active);
        assert!(session.state().histogram.active);
        // 画像のデコード前はヒストグラムなし
        assert!(session.current_histogram_render().is_none());

        session.on_image_displayed(Arc::new(PixelGrid::solid(8, 8, Rgb::new(255, 0, 0))));
        let histogram = session.state().histogram_data.as_ref().unwrap();
        assert_eq!(histogram.get(54), 16);
        assert_eq!(histogram.total(), 16);
        assert!(session.current_histogram_render().is_some());
    }

    #[tokio::test]
    async fn test_viewer_open_without_persisted_flags_stays_inactive() {
        let mut listener = MockPointerListener::new();
        listener.expect_attach().times(0);
        let mut session = session_with(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(RecordingRenderer::default()),
            Box::new(listener),
        );
        session.restore_persisted().await;
        session.on_viewer_opened();
        session.on_image_displayed(Arc::new(PixelGrid::solid(2, 2, Rgb::new(1, 1, 1))));

        assert_eq!(session.state().eyedropper, ToolState::default());
        assert_eq!(session.state().histogram, ToolState::default());
        assert!(session.state().histogram_data.is_none());
        assert!(!session.on_pointer_move(PointerPosition::new(0.5, 0.5), full_view(2.0, 2.0)));
        assert!(session.current_readout().is_none());
    }

    #[tokio::test]
    async fn test_single_pixel_image_out_of_bounds_keeps_readout() {
        let mut session = session_with(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(RecordingRenderer::default()),
            quiet_listener(),
        );
        session.on_viewer_opened();
        session.on_image_displayed(Arc::new(PixelGrid::solid(1, 1, Rgb::new(0, 0, 255))));
        assert!(session.toggle_inspector().await);

        assert!(session.on_pointer_move(PointerPosition::new(0.5, 0.5), full_view(1.0, 1.0)));
        let before = session.current_readout().cloned().unwrap();
        assert_eq!(before.hex, "#0000FF");
        assert_eq!(before.luminosity, 18);

        // (1, 1) にマップされる
        assert!(!session.on_pointer_move(PointerPosition::new(1.0, 1.0), full_view(1.0, 1.0)));
        assert_eq!(session.current_readout(), Some(&before));
        assert_eq!(session.state().current_luminosity, Some(18));
    }

    #[tokio::test]
    async fn test_empty_raster_renders_blank_histogram() {
        let mut session = session_with(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(DefaultHistogramRenderer::new()),
            quiet_listener(),
        );
        session.on_viewer_opened();
        session.on_image_displayed(Arc::new(PixelGrid::solid(0, 0, Rgb::default())));
        assert!(session.toggle_histogram().await);

        let histogram = session.state().histogram_data.as_ref().unwrap();
        assert_eq!(histogram, &LuminosityHistogram::default());
        let render = session.current_histogram_render().unwrap();
        assert_eq!(render.dimensions(), (256, 100));
        assert!(render.pixels().all(|p| p.0[3] == 0));
    }

    #[tokio::test]
    async fn test_histogram_toggle_is_persisted_across_close_and_reopen() {
        let settings =
            Arc::new(MemorySettingsStore::new().with_flag(SettingKey::HistogramActive, false));
        let mut session = session_with(
            settings.clone(),
            Arc::new(RecordingRenderer::default()),
            quiet_listener(),
        );
        session.restore_persisted().await;
        session.on_viewer_opened();
        assert!(!session.state().histogram.active);

        assert!(session.toggle_histogram().await);
        assert_eq!(settings.writes(), vec![(SettingKey::HistogramActive, Value::Bool(true))]);

        session.on_viewer_closed();
        assert!(!session.state().histogram.active);
        assert!(session.state().histogram.persistent);
        assert!(session.state().histogram_data.is_none());

        session.on_viewer_opened();
        assert!(session.state().histogram.active);

        // 新しいセッション (アプリ再起動) でも復元される
        let mut restarted = session_with(
            settings.clone(),
            Arc::new(RecordingRenderer::default()),
            quiet_listener(),
        );
        restarted.restore_persisted().await;
        restarted.on_viewer_opened();
        assert!(restarted.state().histogram.active);

        // オフにして閉じると、次は非アクティブで開く
        assert!(!session.toggle_histogram().await);
        session.on_viewer_closed();
        session.on_viewer_opened();
        assert!(!session.state().histogram.active);
        assert_eq!(
            settings.writes().last(),
            Some(&(SettingKey::HistogramActive, Value::Bool(false))),
        );
    }

    #[tokio::test]
    async fn test_pointer_moves_update_readout_and_marker() {
        let renderer = RecordingRenderer::default();
        let mut session = session_with(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(renderer.clone()),
            quiet_listener(),
        );
        session.on_viewer_opened();
        let grid = PixelGrid::from_fn(3, 1, |x, _| match x {
            0 => Rgb::new(255, 0, 0),
            1 => Rgb::new(0, 255, 0),
            _ => Rgb::new(255, 255, 255),
        });
        session.on_image_displayed(Arc::new(grid));
        session.toggle_histogram().await;
        session.toggle_inspector().await;
        assert_eq!(renderer.highlights(), vec![None]);

        // 表示は 2 倍に拡大されている
        let view = DisplayRect::new(10.0, 20.0, 6.0, 2.0);
        let mut readouts = Vec::new();
        for pointer_x in [11.0, 13.5, 15.9] {
            assert!(session.on_pointer_move(PointerPosition::new(pointer_x, 21.0), view));
            readouts.push(session.current_readout().cloned().unwrap());
        }

        let lums: Vec<_> = readouts.iter().map(|r| r.luminosity).collect();
        assert_eq!(lums, vec![54, 182, 255]);
        assert_eq!(readouts[1].hex, "#00FF00");
        assert_eq!(renderer.highlights(), vec![None, Some(54), Some(182), Some(255)]);
        assert_eq!(session.state().current_luminosity, Some(255));
    }

    #[tokio::test]
    async fn test_eyedropper_off_redraws_histogram_without_marker() {
        let renderer = RecordingRenderer::default();
        let mut listener = MockPointerListener::new();
        listener.expect_attach().times(1).return_const(());
        listener.expect_detach().times(1).return_const(());
        let mut session = session_with(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(renderer.clone()),
            Box::new(listener),
        );
        session.on_viewer_opened();
        session.on_image_displayed(Arc::new(PixelGrid::solid(2, 2, Rgb::new(0, 255, 0))));
        session.toggle_histogram().await;
        session.toggle_inspector().await;
        session.on_pointer_move(PointerPosition::new(0.0, 0.0), full_view(2.0, 2.0));

        assert!(!session.toggle_inspector().await);
        assert_eq!(renderer.highlights().last(), Some(&None));
        assert!(session.current_readout().is_none());
        assert_eq!(session.state().current_luminosity, None);
        assert!(session.state().histogram_data.is_some());
        assert!(!session.on_pointer_move(PointerPosition::new(1.0, 1.0), full_view(2.0, 2.0)));
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let settings = Arc::new(MemorySettingsStore::new());
        let mut session = session_with(
            settings.clone(),
            Arc::new(RecordingRenderer::default()),
            quiet_listener(),
        );
        session.on_viewer_opened();
        session.on_image_displayed(Arc::new(PixelGrid::solid(2, 2, Rgb::new(9, 9, 9))));
        let before = session.state().clone();

        session.toggle_inspector().await;
        session.toggle_inspector().await;
        session.toggle_histogram().await;
        session.toggle_histogram().await;

        assert_eq!(session.state(), &before);
        assert_eq!(
            settings.writes(),
            vec![
                (SettingKey::EyedropperActive, Value::Bool(true)),
                (SettingKey::EyedropperActive, Value::Bool(false)),
                (SettingKey::HistogramActive, Value::Bool(true)),
                (SettingKey::HistogramActive, Value::Bool(false)),
            ]
        );
    }

    #[tokio::test]
    async fn test_viewer_close_forces_tools_off() {
        let mut listener = MockPointerListener::new();
        listener.expect_attach().times(2).return_const(());
        listener.expect_detach().times(1).return_const(());
        let settings =
            Arc::new(MemorySettingsStore::new().with_flag(SettingKey::EyedropperActive, true));
        let mut session = session_with(
            settings.clone(),
            Arc::new(RecordingRenderer::default()),
            Box::new(listener),
        );
        session.restore_persisted().await;
        session.on_viewer_opened();
        session.on_image_displayed(Arc::new(PixelGrid::solid(1, 1, Rgb::new(1, 2, 3))));
        session.on_pointer_move(PointerPosition::new(0.0, 0.0), full_view(1.0, 1.0));

        session.on_viewer_closed();
        assert!(!session.is_viewer_open());
        assert!(!session.state().eyedropper.active);
        assert!(session.state().eyedropper.persistent);
        assert!(session.current_readout().is_none());
        assert!(settings.writes().is_empty());

        // 閉じている間は画像もポインタも無視
        session.on_image_displayed(Arc::new(PixelGrid::solid(1, 1, Rgb::new(1, 2, 3))));
        assert!(!session.on_pointer_move(PointerPosition::new(0.0, 0.0), full_view(1.0, 1.0)));

        session.on_viewer_opened();
        assert!(session.state().eyedropper.active);
    }

    #[tokio::test]
    async fn test_toggle_while_closed_only_flips_preference() {
        let mut listener = MockPointerListener::new();
        listener.expect_attach().times(0);
        let settings = Arc::new(MemorySettingsStore::new());
        let mut session = session_with(
            settings.clone(),
            Arc::new(RecordingRenderer::default()),
            Box::new(listener),
        );

        assert!(session.toggle_inspector().await);
        assert_eq!(session.state().eyedropper, ToolState { active: false, persistent: true });
        assert!(!session.toggle_inspector().await);
        assert_eq!(session.state().eyedropper, ToolState::default());
        assert_eq!(settings.writes().len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_image_keeps_previous_histogram() {
        let mut session = session_with(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(RecordingRenderer::default()),
            quiet_listener(),
        );
        session.on_viewer_opened();
        session.toggle_histogram().await;
        session.on_image_displayed(Arc::new(PixelGrid::solid(4, 4, Rgb::new(255, 255, 255))));
        let previous = session.state().histogram_data.clone();
        assert_eq!(previous.as_ref().map(|h| h.get(255)), Some(4));

        session.on_image_displayed(Arc::new(TaintedSource));
        assert_eq!(session.state().histogram_data, previous);

        // 読めない画像ではスポイトも更新しない
        session.toggle_inspector().await;
        assert!(!session.on_pointer_move(PointerPosition::new(1.0, 1.0), full_view(4.0, 4.0)));
        assert!(session.current_readout().is_none());
    }

    #[tokio::test]
    async fn test_navigation_recomputes_histogram() {
        let mut session = session_with(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(RecordingRenderer::default()),
            quiet_listener(),
        );
        session.on_viewer_opened();
        session.toggle_histogram().await;

        session.on_image_displayed(Arc::new(PixelGrid::solid(4, 4, Rgb::new(0, 0, 0))));
        assert_eq!(session.state().histogram_data.as_ref().unwrap().get(0), 4);

        session.on_image_displayed(Arc::new(PixelGrid::solid(4, 4, Rgb::new(255, 255, 255))));
        let histogram = session.state().histogram_data.as_ref().unwrap();
        assert_eq!(histogram.get(0), 0);
        assert_eq!(histogram.get(255), 4);
    }

    #[tokio::test]
    async fn test_settings_failures_do_not_block_toggles() {
        let mut session = session_with(
            Arc::new(FailingSettingsStore),
            Arc::new(RecordingRenderer::default()),
            quiet_listener(),
        );
        session.restore_persisted().await;
        assert_eq!(session.state(), &InspectorState::default());

        session.on_viewer_opened();
        assert!(session.toggle_histogram().await);
        assert!(session.state().histogram.active);
        assert!(session.state().histogram.persistent);
    }
}
