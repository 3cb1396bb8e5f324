use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::{header::HeaderName, StatusCode},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use super::file_lister::LocalFileLister;
use super::histogram_renderer::{to_png_data_url, DefaultHistogramRenderer};
use super::pointer_listener::SharedPointerListener;
use super::raster::RasterDecoder;
use super::settings_store::JsonFileSettingsStore;
use crate::application::error::ApplicationError;
use crate::application::inspector_session::{InspectorOptions, PixelInspectorSession};
use crate::application::viewer_service::{GalleryService, ViewerService};
use crate::domain::color::Readout;
use crate::domain::gallery::{ImageEntry, Photographer};
use crate::domain::position::{DisplayRect, PointerPosition};
use crate::domain::settings::{SettingKey, SettingsStore};

pub type Viewer = ViewerService<LocalFileLister, RasterDecoder, JsonFileSettingsStore>;

pub struct AppState {
    pub gallery: GalleryService<LocalFileLister>,
    pub viewer: Mutex<Viewer>,
    pub settings: Arc<JsonFileSettingsStore>,
    // attach/detach の状態を /api/viewer/status で返すための観測用クローン
    pub pointer: SharedPointerListener,
}

impl AppState {
    /// Wires the adapters together and restores the persisted tool flags.
    pub async fn build(settings: Arc<JsonFileSettingsStore>, options: InspectorOptions) -> Self {
        let lister = Arc::new(LocalFileLister::new());
        let pointer = SharedPointerListener::new();
        let mut session = PixelInspectorSession::new(
            Arc::clone(&settings),
            Arc::new(DefaultHistogramRenderer::new()),
            Box::new(pointer.clone()),
            options,
        );
        session.restore_persisted().await;

        Self {
            gallery: GalleryService::new(Arc::clone(&lister)),
            viewer: Mutex::new(ViewerService::new(lister, RasterDecoder::new(), session)),
            settings,
            pointer,
        }
    }
}

pub fn router(state: Arc<AppState>, frontend_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(vec![HeaderName::from_static("content-type")]);

    Router::new()
        .route(
            "/api/folder",
            get(get_folder_handler).put(put_folder_handler).delete(clear_folder_handler),
        )
        .route("/api/photographers", get(photographers_handler))
        .route("/api/images", get(images_handler))
        .route("/api/viewer/open", post(open_viewer_handler))
        .route("/api/viewer/next", post(next_image_handler))
        .route("/api/viewer/previous", post(previous_image_handler))
        .route("/api/viewer/close", post(close_viewer_handler))
        .route("/api/viewer/pointer", post(pointer_move_handler))
        .route("/api/viewer/status", get(viewer_status_handler))
        .route("/api/inspector/toggle", post(toggle_inspector_handler))
        .route("/api/inspector/readout", get(readout_handler))
        .route("/api/histogram/toggle", post(toggle_histogram_handler))
        .route("/api/histogram", get(histogram_handler))
        .route(
            "/api/settings/show-hex",
            get(get_show_hex_handler).put(put_show_hex_handler),
        )
        .fallback_service(ServeDir::new(frontend_dir))
        .layer(cors)
        .with_state(state)
}

// リクエスト/レスポンス DTO

#[derive(Deserialize, Serialize, Debug)]
pub struct FolderBody {
    pub folder: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RootQuery {
    pub root: String,
}

#[derive(Deserialize, Debug)]
pub struct FolderQuery {
    pub folder: String,
}

#[derive(Deserialize, Debug)]
pub struct OpenViewerParams {
    pub folder: PathBuf,
    #[serde(default)]
    pub index: usize,
}

#[derive(Deserialize, Debug)]
pub struct PointerMoveParams {
    pub x: f64,
    pub y: f64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Debug)]
pub struct PointerMoveResponse {
    pub changed: bool,
    pub readout: Option<Readout>,
}

#[derive(Serialize, Debug)]
pub struct ToggleResponse {
    pub active: bool,
}

#[derive(Serialize, Debug)]
pub struct HistogramResponse {
    pub image: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ShowHexBody {
    #[serde(rename = "showHex")]
    pub show_hex: bool,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ViewerStatus {
    pub open: bool,
    pub listening: bool,
    pub inspector: bool,
    pub histogram: bool,
}

pub async fn get_folder_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FolderBody>, ApplicationError> {
    let folder = state.settings.get_text(SettingKey::SelectedFolder).await?;
    Ok(Json(FolderBody { folder }))
}

pub async fn put_folder_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FolderBody>,
) -> Result<Json<FolderBody>, ApplicationError> {
    match &body.folder {
        Some(folder) => {
            state
                .settings
                .store(SettingKey::SelectedFolder, Value::String(folder.clone()))
                .await?;
            info!("Selected gallery folder {}", folder);
        }
        None => state.settings.remove(SettingKey::SelectedFolder).await?,
    }
    Ok(Json(body))
}

pub async fn clear_folder_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApplicationError> {
    state.settings.remove(SettingKey::SelectedFolder).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn photographers_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RootQuery>,
) -> Json<Vec<Photographer>> {
    Json(state.gallery.photographers(Path::new(&params.root)).await)
}

pub async fn images_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FolderQuery>,
) -> Json<Vec<ImageEntry>> {
    Json(state.gallery.images(Path::new(&params.folder)).await)
}

pub async fn open_viewer_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<OpenViewerParams>,
) -> Result<Json<ImageEntry>, ApplicationError> {
    let mut viewer = state.viewer.lock().await;
    let entry = viewer.open(&params.folder, params.index).await?;
    Ok(Json(entry))
}

pub async fn next_image_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImageEntry>, ApplicationError> {
    let mut viewer = state.viewer.lock().await;
    Ok(Json(viewer.next().await?))
}

pub async fn previous_image_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImageEntry>, ApplicationError> {
    let mut viewer = state.viewer.lock().await;
    Ok(Json(viewer.previous().await?))
}

pub async fn close_viewer_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.viewer.lock().await.close();
    StatusCode::NO_CONTENT
}

pub async fn pointer_move_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<PointerMoveParams>,
) -> Result<Json<PointerMoveResponse>, ApplicationError> {
    let display = DisplayRect::checked(params.left, params.top, params.width, params.height)?;
    let mut viewer = state.viewer.lock().await;
    let session = viewer.session_mut();
    let changed = session.on_pointer_move(PointerPosition::new(params.x, params.y), display);
    Ok(Json(PointerMoveResponse {
        changed,
        readout: session.current_readout().cloned(),
    }))
}

pub async fn viewer_status_handler(State(state): State<Arc<AppState>>) -> Json<ViewerStatus> {
    let viewer = state.viewer.lock().await;
    let inspector = viewer.session().state();
    Json(ViewerStatus {
        open: viewer.is_open(),
        listening: state.pointer.is_attached(),
        inspector: inspector.eyedropper.active,
        histogram: inspector.histogram.active,
    })
}

pub async fn toggle_inspector_handler(State(state): State<Arc<AppState>>) -> Json<ToggleResponse> {
    let mut viewer = state.viewer.lock().await;
    let active = viewer.session_mut().toggle_inspector().await;
    Json(ToggleResponse { active })
}

pub async fn toggle_histogram_handler(State(state): State<Arc<AppState>>) -> Json<ToggleResponse> {
    let mut viewer = state.viewer.lock().await;
    let active = viewer.session_mut().toggle_histogram().await;
    Json(ToggleResponse { active })
}

pub async fn readout_handler(State(state): State<Arc<AppState>>) -> Json<Option<Readout>> {
    let viewer = state.viewer.lock().await;
    Json(viewer.session().current_readout().cloned())
}

pub async fn histogram_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<HistogramResponse>>, ApplicationError> {
    let viewer = state.viewer.lock().await;
    let response = match viewer.session().current_histogram_render() {
        Some(render) => Some(HistogramResponse {
            image: to_png_data_url(render)?,
        }),
        None => None,
    };
    Ok(Json(response))
}

pub async fn get_show_hex_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShowHexBody>, ApplicationError> {
    let show_hex = state.settings.get_flag(SettingKey::ShowHex, false).await?;
    Ok(Json(ShowHexBody { show_hex }))
}

pub async fn put_show_hex_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ShowHexBody>,
) -> Result<Json<ShowHexBody>, ApplicationError> {
    state.settings.set_flag(SettingKey::ShowHex, body.show_hex).await?;
    Ok(Json(body))
}
