// scripted in-memory job service for engine tests
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    error::{ClientError, Result},
    models::{Font, Job, JobRequest, JobStatus, PreviewSubtitleRequest, UploadResult, Voice},
    services::JobService,
};

#[derive(Default)]
pub struct FakeState {
    pub jobs: Vec<Job>,
    pub calls: Vec<String>,
    pub created: Vec<JobRequest>,
    pub previews: Vec<PreviewSubtitleRequest>,
    pub voices: HashMap<String, Vec<Voice>>,
    pub bgm: Vec<String>,
    pub fonts: Vec<Font>,
    pub preview_png: Vec<u8>,
    /// delay applied to successive list calls; the snapshot is taken before sleeping
    pub list_delays: VecDeque<Duration>,
    pub preview_delays: VecDeque<Duration>,
    pub fail_list: bool,
    pub fail_create: Option<String>,
    pub fail_mutations: bool,
    pub fail_upload: bool,
    pub next_id: u32,
}

#[derive(Default)]
pub struct FakeJobService {
    pub state: Mutex<FakeState>,
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn job(id: &str, status: JobStatus, created_secs: i64) -> Job {
    Job {
        id: id.to_string(),
        status,
        progress: if status == JobStatus::Success { 100 } else { 0 },
        created_at: at(created_secs),
        updated_at: None,
        error_message: None,
        request: JobRequest {
            script: format!("script for {}", id),
            ..JobRequest::default()
        },
    }
}

fn rejected(message: &str) -> ClientError {
    ClientError::Http {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeJobService {
    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        let service = Self::default();
        service.state.lock().unwrap().jobs = jobs;
        service
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl JobService for FakeJobService {
    async fn create_job(&self, request: &JobRequest) -> Result<String> {
        self.record("create".into());
        let id = {
            let mut state = self.state.lock().unwrap();
            if let Some(message) = state.fail_create.clone() {
                return Err(rejected(&message));
            }
            state.next_id += 1;
            let id = format!("job-{}", state.next_id);
            let created_secs = 1_000 + state.next_id as i64;
            state.jobs.push(Job {
                request: request.clone(),
                ..job(&id, JobStatus::Pending, created_secs)
            });
            state.created.push(request.clone());
            id
        };
        Ok(id)
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.record("list".into());
        let (snapshot, delay, fail) = {
            let mut state = self.state.lock().unwrap();
            (state.jobs.clone(), state.list_delays.pop_front(), state.fail_list)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(rejected("list unavailable"));
        }
        Ok(snapshot)
    }

    async fn cancel_job(&self, id: &str) -> Result<()> {
        self.record(format!("cancel:{}", id));
        let mut state = self.state.lock().unwrap();
        if state.fail_mutations {
            return Err(rejected("cancel refused"));
        }
        match state.jobs.iter_mut().find(|j| j.id == id) {
            Some(job) => {
                job.status = JobStatus::Canceled;
                job.progress = 0;
                Ok(())
            }
            None => Err(ClientError::Http { status: 404, message: "not found".into() }),
        }
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        self.record(format!("delete:{}", id));
        let mut state = self.state.lock().unwrap();
        if state.fail_mutations {
            return Err(rejected("delete refused"));
        }
        state.jobs.retain(|j| j.id != id);
        Ok(())
    }

    async fn delete_all_jobs(&self) -> Result<()> {
        self.record("delete_all".into());
        let mut state = self.state.lock().unwrap();
        if state.fail_mutations {
            return Err(rejected("delete refused"));
        }
        state.jobs.clear();
        Ok(())
    }

    async fn download_result(&self, id: &str) -> Result<Vec<u8>> {
        self.record(format!("download:{}", id));
        Ok(format!("mp4:{}", id).into_bytes())
    }

    async fn list_bgm_presets(&self) -> Result<Vec<String>> {
        self.record("bgm".into());
        Ok(self.state.lock().unwrap().bgm.clone())
    }

    async fn list_fonts(&self) -> Result<Vec<Font>> {
        self.record("fonts".into());
        Ok(self.state.lock().unwrap().fonts.clone())
    }

    async fn list_voices(&self, provider: &str) -> Result<Vec<Voice>> {
        self.record(format!("voices:{}", provider));
        let state = self.state.lock().unwrap();
        Ok(state.voices.get(provider).cloned().unwrap_or_default())
    }

    async fn preview_subtitle(&self, request: &PreviewSubtitleRequest) -> Result<Vec<u8>> {
        self.record("preview".into());
        let (delay, png) = {
            let mut state = self.state.lock().unwrap();
            state.previews.push(request.clone());
            (state.preview_delays.pop_front(), state.preview_png.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if png.is_empty() {
            return Err(rejected("preview renderer offline"));
        }
        let mut tagged = png;
        tagged.extend_from_slice(request.text.as_bytes());
        Ok(tagged)
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResult> {
        self.record(format!("upload:{}", file_name));
        if self.state.lock().unwrap().fail_upload {
            return Err(rejected("disk full"));
        }
        Ok(UploadResult {
            path: format!("/tmp/upload_{}_{}", bytes.len(), file_name),
            url: String::new(),
        })
    }
}
