// HttpJobService against an in-process mock of the /api/v1 surface
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use videosmith::{
    models::{JobRequest, JobStatus, PreviewSubtitleRequest},
    preview::preview_request,
    ClientError, HttpJobService, JobService,
};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Default)]
struct Mock {
    jobs: Vec<Value>,
    created: Vec<Value>,
    canceled: Vec<String>,
    page_requests: Vec<(usize, usize)>,
    deleted_all: bool,
    /// canned pages served instead of slicing `jobs`, with the total reported alongside
    canned_pages: Option<(Vec<Vec<Value>>, usize)>,
}

type Shared = Arc<Mutex<Mock>>;

#[derive(Deserialize)]
struct PageQuery {
    page: usize,
    limit: usize,
}

#[derive(Deserialize)]
struct VoiceQuery {
    provider: String,
}

fn job_json(id: &str, status: &str, minute: u32) -> Value {
    let progress = if status == "success" { 100 } else { 10 };
    json!({
        "id": id,
        "status": status,
        "progress": progress,
        "created_at": format!("2024-05-01T10:{:02}:00Z", minute),
        "updated_at": format!("2024-05-01T10:{:02}:30Z", minute),
        "error_message": "",
        "result_url": "",
        "request": {
            "script": format!("script {}", id),
            "materials": [{"type": "image", "source": "url", "path": "https://picsum.photos/720/1280",
                           "duration_sec": 3, "mute": false, "volume": 1, "effect": "zoom_in"}],
            "tts": {"provider": "free", "voice": "en-US-AriaNeural", "locale": "en-US", "speed": 1, "pitch": 0},
            "video": {"resolution": "1080x1920", "fps": 30, "background": "000000",
                      "blur_background": false, "transition": ""},
            "bgm": {"source": "preset", "path": "default.mp3", "volume": 0.2},
            "subtitle_style": {"font": "Noto Sans TC", "size": 36, "color": "FFFFFF", "y_offset": 40,
                               "outline_width": 0.1, "outline_color": "000000", "max_line_width": 24}
        }
    })
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

async fn list_jobs(State(mock): State<Shared>, Query(q): Query<PageQuery>) -> Json<Value> {
    let mut mock = mock.lock().unwrap();
    mock.page_requests.push((q.page, q.limit));
    if let Some((pages, total)) = &mock.canned_pages {
        let data = pages.get(q.page - 1).cloned().unwrap_or_default();
        return Json(json!({ "page": q.page, "limit": q.limit, "total": total, "data": data }));
    }
    let start = (q.page - 1) * q.limit;
    let data: Vec<Value> = mock.jobs.iter().skip(start).take(q.limit).cloned().collect();
    Json(json!({ "page": q.page, "limit": q.limit, "total": mock.jobs.len(), "data": data }))
}

async fn create_job(State(mock): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["script"].as_str().unwrap_or("").is_empty() {
        return error(StatusCode::BAD_REQUEST, "script is required").into_response();
    }
    let mut mock = mock.lock().unwrap();
    mock.created.push(body);
    let id = format!("new-{}", mock.created.len());
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

async fn delete_all(State(mock): State<Shared>) -> Json<Value> {
    let mut mock = mock.lock().unwrap();
    mock.jobs.clear();
    mock.deleted_all = true;
    Json(json!({ "status": "deleted" }))
}

async fn cancel_job(State(mock): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    mock.lock().unwrap().canceled.push(id);
    Json(json!({ "status": "canceled" }))
}

async fn delete_job(State(mock): State<Shared>, Path(id): Path<String>) -> impl IntoResponse {
    let mut mock = mock.lock().unwrap();
    let before = mock.jobs.len();
    mock.jobs.retain(|j| j["id"] != id.as_str());
    if mock.jobs.len() == before {
        return error(StatusCode::NOT_FOUND, "job not found").into_response();
    }
    Json(json!({ "status": "deleted" })).into_response()
}

async fn job_result(Path(id): Path<String>) -> impl IntoResponse {
    if id == "busy" {
        return error(StatusCode::BAD_REQUEST, "job not completed").into_response();
    }
    format!("mp4 bytes for {}", id).into_response()
}

async fn bgm() -> Json<Value> {
    Json(json!({ "data": ["calm.mp3", "epic.mp3"] }))
}

async fn fonts() -> Json<Value> {
    Json(json!({ "data": [{"name": "Noto Sans TC"}, {"name": "Roboto"}] }))
}

async fn voices(Query(q): Query<VoiceQuery>) -> Json<Value> {
    if q.provider == "none" {
        return Json(json!({ "data": null }));
    }
    Json(json!({ "data": [
        {"name": format!("{}-voice", q.provider), "display_name": "Aria", "locale": "en-US"}
    ] }))
}

async fn preview(Json(body): Json<Value>) -> impl IntoResponse {
    let mut png = PNG_MAGIC.to_vec();
    png.extend_from_slice(body["text"].as_str().unwrap_or("").as_bytes());
    png.extend_from_slice(body["resolution"].as_str().unwrap_or("").as_bytes());
    png
}

async fn upload(body: Bytes) -> impl IntoResponse {
    let text = String::from_utf8_lossy(&body);
    if !text.contains("name=\"file\"") || !text.contains("filename=\"clip.mp4\"") {
        return error(StatusCode::BAD_REQUEST, "file is required").into_response();
    }
    Json(json!({ "path": "/srv/uploads/clip.mp4", "url": "/uploads/clip.mp4" })).into_response()
}

async fn spawn_mock(mock: Shared, page_limit: usize) -> HttpJobService {
    let api = Router::new()
        .route("/jobs", get(list_jobs).post(create_job).delete(delete_all))
        .route("/jobs/:id", axum::routing::delete(delete_job))
        .route("/jobs/:id/cancel", post(cancel_job))
        .route("/jobs/:id/result", get(job_result))
        .route("/presets/bgm", get(bgm))
        .route("/fonts", get(fonts))
        .route("/tts/voices", get(voices))
        .route("/preview/subtitle", post(preview))
        .route("/upload", post(upload))
        .with_state(mock);
    let app = Router::new().nest("/api/v1", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpJobService::with_client(
        reqwest::Client::new(),
        &format!("http://{}/api/v1", addr),
        page_limit,
    )
    .unwrap()
}

fn seeded(n: u32) -> Shared {
    let mock = Mock {
        jobs: (0..n)
            .map(|i| job_json(&format!("job-{}", i), if i % 2 == 0 { "success" } else { "running" }, i))
            .collect(),
        ..Mock::default()
    };
    Arc::new(Mutex::new(mock))
}

#[tokio::test]
async fn test_list_jobs_walks_every_page() {
    let mock = seeded(5);
    let service = spawn_mock(mock.clone(), 2).await;

    let jobs = service.list_jobs().await.unwrap();
    let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["job-0", "job-1", "job-2", "job-3", "job-4"]);
    assert_eq!(jobs[0].status, JobStatus::Success);
    assert_eq!(jobs[1].status, JobStatus::Running);
    assert_eq!(jobs[0].error(), None);

    assert_eq!(mock.lock().unwrap().page_requests, vec![(1, 2), (2, 2), (3, 2)]);
}

#[tokio::test]
async fn test_list_jobs_stops_on_exact_fill() {
    let mock = seeded(4);
    let service = spawn_mock(mock.clone(), 2).await;

    assert_eq!(service.list_jobs().await.unwrap().len(), 4);
    assert_eq!(mock.lock().unwrap().page_requests.len(), 2);
}

#[tokio::test]
async fn test_list_jobs_drops_jobs_repeated_across_pages() {
    let (a, b, c) = (
        job_json("a", "success", 1),
        job_json("b", "running", 2),
        job_json("c", "pending", 3),
    );
    let mock = Arc::new(Mutex::new(Mock {
        canned_pages: Some((vec![vec![a, b.clone()], vec![b, c]], 4)),
        ..Mock::default()
    }));
    let service = spawn_mock(mock.clone(), 2).await;

    let jobs = service.list_jobs().await.unwrap();
    let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(jobs[1].status, JobStatus::Running);

    // the total counts what was served, so the walk still ends after page 2
    assert_eq!(mock.lock().unwrap().page_requests, vec![(1, 2), (2, 2)]);
}

#[tokio::test]
async fn test_create_sends_request_and_surfaces_error_detail() {
    let mock = seeded(0);
    let service = spawn_mock(mock.clone(), 100).await;

    let mut request = JobRequest::default();
    request.script = "Hello".into();
    request.tts.voice = "en-US-AriaNeural".into();
    let id = service.create_job(&request).await.unwrap();
    assert_eq!(id, "new-1");

    let sent = mock.lock().unwrap().created[0].clone();
    assert_eq!(sent["materials"][0]["type"], "image");
    assert_eq!(sent["video"]["resolution"], "1080x1920");
    assert_eq!(sent["bgm"]["source"], "preset");

    let err = service.create_job(&JobRequest::default()).await.unwrap_err();
    match &err {
        ClientError::Http { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "script is required");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        err.user_message("Failed to create job"),
        "Failed to create job: script is required"
    );
}

#[tokio::test]
async fn test_job_mutations() {
    let mock = seeded(3);
    let service = spawn_mock(mock.clone(), 100).await;

    service.cancel_job("job-1").await.unwrap();
    service.delete_job("job-2").await.unwrap();
    let err = service.delete_job("job-2").await.unwrap_err();
    assert_eq!(err.detail(), Some("job not found"));

    assert_eq!(mock.lock().unwrap().canceled, vec!["job-1".to_string()]);
    assert_eq!(service.list_jobs().await.unwrap().len(), 2);

    service.delete_all_jobs().await.unwrap();
    assert!(mock.lock().unwrap().deleted_all);
    assert!(service.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_download_result() {
    let service = spawn_mock(seeded(0), 100).await;

    let bytes = service.download_result("job-0").await.unwrap();
    assert_eq!(bytes, b"mp4 bytes for job-0");

    let err = service.download_result("busy").await.unwrap_err();
    assert_eq!(err.detail(), Some("job not completed"));
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let service = spawn_mock(seeded(0), 100).await;

    assert_eq!(service.list_bgm_presets().await.unwrap(), vec!["calm.mp3", "epic.mp3"]);

    let fonts = service.list_fonts().await.unwrap();
    assert_eq!(fonts.len(), 2);
    assert_eq!(fonts[1].name, "Roboto");

    let voices = service.list_voices("azure_v1").await.unwrap();
    assert_eq!(voices[0].name, "azure_v1-voice");
    assert_eq!(voices[0].label(), "Aria (en-US)");

    // a null data field is an empty catalog
    assert!(service.list_voices("none").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_preview_and_upload() {
    let service = spawn_mock(seeded(0), 100).await;

    let mut draft = JobRequest::default();
    draft.script = "字幕測試".into();
    let request: PreviewSubtitleRequest = preview_request(&draft);
    let png = service.preview_subtitle(&request).await.unwrap();
    assert!(png.starts_with(PNG_MAGIC));
    assert!(png.ends_with("字幕測試1080x1920".as_bytes()));

    let uploaded = service
        .upload_file("clip.mp4", b"fake video".to_vec())
        .await
        .unwrap();
    assert_eq!(uploaded.path, "/srv/uploads/clip.mp4");
    assert_eq!(uploaded.url, "/uploads/clip.mp4");
}
