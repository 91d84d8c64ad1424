// client for the job-processing service rest surface (/api/v1)
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::{
    config::Config,
    error::{ClientError, Result},
    models::{Font, Job, JobRequest, PreviewSubtitleRequest, UploadResult, Voice},
};

/// safety net for a service that keeps reporting a larger total than it serves
const MAX_LIST_PAGES: usize = 1000;

/// The remote job service as seen by the engine.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Submit a job, returning its server-assigned id.
    async fn create_job(&self, request: &JobRequest) -> Result<String>;

    /// The full job collection, in service order.
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn cancel_job(&self, id: &str) -> Result<()>;

    async fn delete_job(&self, id: &str) -> Result<()>;

    async fn delete_all_jobs(&self) -> Result<()>;

    /// Rendered video bytes; the service refuses unless the job succeeded.
    async fn download_result(&self, id: &str) -> Result<Vec<u8>>;

    async fn list_bgm_presets(&self) -> Result<Vec<String>>;

    async fn list_fonts(&self) -> Result<Vec<Font>>;

    async fn list_voices(&self, provider: &str) -> Result<Vec<Voice>>;

    /// PNG bytes of a subtitle rendered over the given background.
    async fn preview_subtitle(&self, request: &PreviewSubtitleRequest) -> Result<Vec<u8>>;

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResult>;
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct JobPage {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    data: Option<Vec<Job>>,
}

#[derive(Debug, Deserialize)]
struct CreatedJob {
    id: String,
}

#[derive(Debug, Clone)]
pub struct HttpJobService {
    http: Client,
    base: String,
    list_page_limit: usize,
}

impl HttpJobService {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(http, &config.api_url, config.list_page_limit)
    }

    pub fn with_client(http: Client, api_url: &str, list_page_limit: usize) -> Result<Self> {
        let parsed = Url::parse(api_url)?;
        Ok(Self {
            http,
            base: parsed.as_str().trim_end_matches('/').to_string(),
            list_page_limit: list_page_limit.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ClientError::from_response(response).await)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = check(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_data<T: DeserializeOwned + Default>(response: Response) -> Result<T> {
    let envelope: DataEnvelope<T> = read_json(response).await?;
    Ok(envelope.data.unwrap_or_default())
}

#[async_trait]
impl JobService for HttpJobService {
    async fn create_job(&self, request: &JobRequest) -> Result<String> {
        let response = self.http.post(self.url("/jobs")).json(request).send().await?;
        let created: CreatedJob = read_json(response).await?;
        debug!("Created job {}", created.id);
        Ok(created.id)
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = Vec::new();
        let mut seen = HashSet::new();
        let mut fetched = 0;

        // pages are cut from an unordered store, so a job can show up twice
        for page in 1..=MAX_LIST_PAGES {
            let response = self
                .http
                .get(self.url("/jobs"))
                .query(&[("page", page), ("limit", self.list_page_limit)])
                .send()
                .await?;
            let body: JobPage = read_json(response).await?;
            let batch = body.data.unwrap_or_default();
            let short_page = batch.len() < self.list_page_limit;
            let received = batch.len();
            fetched += received;
            let before = jobs.len();
            jobs.extend(batch.into_iter().filter(|job| seen.insert(job.id.clone())));
            let kept = jobs.len() - before;
            if kept < received {
                debug!("Dropped {} repeated job(s) on page {}", received - kept, page);
            }

            if short_page || fetched >= body.total {
                break;
            }
        }

        Ok(jobs)
    }

    async fn cancel_job(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/jobs/{}/cancel", id)))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/jobs/{}", id)))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_all_jobs(&self) -> Result<()> {
        let response = self.http.delete(self.url("/jobs")).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn download_result(&self, id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.url(&format!("/jobs/{}/result", id)))
            .send()
            .await?;
        Ok(check(response).await?.bytes().await?.to_vec())
    }

    async fn list_bgm_presets(&self) -> Result<Vec<String>> {
        let response = self.http.get(self.url("/presets/bgm")).send().await?;
        read_data(response).await
    }

    async fn list_fonts(&self) -> Result<Vec<Font>> {
        let response = self.http.get(self.url("/fonts")).send().await?;
        read_data(response).await
    }

    async fn list_voices(&self, provider: &str) -> Result<Vec<Voice>> {
        let response = self
            .http
            .get(self.url("/tts/voices"))
            .query(&[("provider", provider)])
            .send()
            .await?;
        read_data(response).await
    }

    async fn preview_subtitle(&self, request: &PreviewSubtitleRequest) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(self.url("/preview/subtitle"))
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.bytes().await?.to_vec())
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResult> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let response = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }
}
