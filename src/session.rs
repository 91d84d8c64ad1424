//! One view's worth of engine state, driven by `Action` values.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    confirm::{ConfirmationGate, ConfirmationRequest},
    error::{ClientError, Result},
    materials::{infer_kind, MaterialField},
    models::{BgmSource, Job, JobRequest, UploadResult},
    notifications::{NotificationQueue, Toast},
    pagination::PaginationView,
    preview::{AudioBackend, AudioState, MediaPreviewSession, PreviewImage},
    request::{DraftEdit, MaterialEdit, RequestModel, ValidationIssue},
    selector::{FilterableSelector, SelectOption, SelectorInput},
    services::JobService,
    sync::{JobSynchronizer, StatusSummary},
};

/// BGM preset the service resolves to a random track.
pub const RANDOM_BGM: &str = "random";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorId {
    Font,
    Voice,
    Bgm,
}

/// Destructive work parked behind the confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteAll,
}

/// Every user interaction the engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Edit(DraftEdit),
    Material(MaterialEdit),
    Select(SelectorId, SelectorInput),
    ResetDraft,
    Submit,
    Refresh,
    Cancel(String),
    Delete(String),
    RequestDeleteAll,
    Confirm,
    DismissConfirm,
    Duplicate(String),
    CopyIntoDraft(String),
    Download { id: String, dest: PathBuf },
    UploadMaterial { index: usize, file: PathBuf },
    UploadBgm(PathBuf),
    GeneratePreview,
    ToggleAudio(String),
    AudioEnded(String),
    GoToPage(usize),
    DismissToast(Uuid),
}

/// The job table as it should be rendered right now.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPage {
    pub page: usize,
    pub total_pages: usize,
    pub jobs: Vec<Job>,
    pub summary: StatusSummary,
}

fn bgm_options(presets: Vec<String>) -> Vec<SelectOption<String>> {
    let mut options = vec![SelectOption::new("Random", RANDOM_BGM.to_string())];
    options.extend(
        presets
            .into_iter()
            .filter(|name| name != RANDOM_BGM)
            .map(SelectOption::text),
    );
    options
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct Session {
    service: Arc<dyn JobService>,
    request: RequestModel,
    fonts: FilterableSelector<String>,
    voices: FilterableSelector<String>,
    bgm: FilterableSelector<String>,
    notifications: NotificationQueue,
    confirm: ConfirmationGate<PendingAction>,
    sync: JobSynchronizer,
    pages: PaginationView,
    media: MediaPreviewSession,
    /// provider the voice list was loaded for
    voices_provider: Option<String>,
}

impl Session {
    pub fn new(service: Arc<dyn JobService>, config: &Config, audio: Box<dyn AudioBackend>) -> Self {
        let timings = config.timings();
        let notifications = NotificationQueue::new(timings.toast_ttl);
        let sync = JobSynchronizer::new(
            service.clone(),
            notifications.clone(),
            config.job_ordering,
            timings.poll_interval,
        );

        Self {
            service,
            request: RequestModel::default(),
            fonts: FilterableSelector::new(Vec::new(), true),
            voices: FilterableSelector::new(Vec::new(), true),
            bgm: FilterableSelector::new(bgm_options(Vec::new()), true),
            notifications,
            confirm: ConfirmationGate::new(),
            sync,
            pages: PaginationView::new(config.page_size),
            media: MediaPreviewSession::new(audio),
            voices_provider: None,
        }
    }

    /// Begin polling and load the font, voice and BGM catalogs.
    pub async fn start(&mut self) {
        self.sync.start().await;
        self.load_catalog().await;
    }

    pub async fn stop(&mut self) {
        self.sync.stop().await;
    }

    /// Tear the view down: no more polling, no preview file, no audio.
    pub async fn dispose(&mut self) {
        self.sync.stop().await;
        self.media.dispose();
        self.confirm.cancel();
        self.notifications.clear().await;
        info!("Session disposed");
    }

    pub async fn load_catalog(&mut self) {
        match self.service.list_fonts().await {
            Ok(fonts) => {
                debug!("Loaded {} font(s)", fonts.len());
                self.fonts
                    .set_options(fonts.into_iter().map(|f| SelectOption::text(f.name)).collect());
            }
            Err(e) => warn!("Failed to load fonts: {}", e),
        }

        match self.service.list_bgm_presets().await {
            Ok(presets) => {
                debug!("Loaded {} BGM preset(s)", presets.len());
                self.bgm.set_options(bgm_options(presets));
            }
            Err(e) => warn!("Failed to load BGM presets: {}", e),
        }

        self.reload_voices().await;
    }

    async fn reload_voices(&mut self) {
        let provider = self.request.draft().tts.provider.clone();
        match self.service.list_voices(&provider).await {
            Ok(voices) => {
                debug!("Loaded {} voice(s) for {}", voices.len(), provider);
                self.voices.set_options(
                    voices
                        .into_iter()
                        .map(|v| SelectOption::new(v.label(), v.name))
                        .collect(),
                );
                self.voices_provider = Some(provider);
            }
            Err(e) => warn!("Failed to load voices for {}: {}", provider, e),
        }
    }

    async fn sync_voices_with_provider(&mut self) {
        if self.voices_provider.as_deref() != Some(self.request.draft().tts.provider.as_str()) {
            self.reload_voices().await;
        }
    }

    /// Apply one user interaction. Failures are reported as toasts and logged,
    /// never returned.
    pub async fn dispatch(&mut self, action: Action) {
        debug!("Dispatch {:?}", action);
        match action {
            Action::Edit(edit) => {
                let provider_edit = matches!(edit, DraftEdit::TtsProvider(_));
                self.request.edit(edit);
                if provider_edit {
                    self.sync_voices_with_provider().await;
                }
            }
            Action::Material(edit) => {
                if !self.request.edit_material(edit) {
                    debug!("Material edit had no effect");
                }
            }
            Action::Select(id, input) => self.select(id, input),
            Action::ResetDraft => {
                self.request.reset();
                self.sync_voices_with_provider().await;
            }
            Action::Submit => {
                let _ = self.submit().await;
            }
            Action::Refresh => {
                self.sync.refresh().await;
            }
            Action::Cancel(id) => {
                let _ = self.sync.cancel(&id).await;
            }
            Action::Delete(id) => {
                let _ = self.sync.delete(&id).await;
            }
            Action::RequestDeleteAll => self.request_delete_all(),
            Action::Confirm => self.confirm().await,
            Action::DismissConfirm => {
                self.confirm.cancel();
            }
            Action::Duplicate(id) => {
                let _ = self.duplicate(&id).await;
            }
            Action::CopyIntoDraft(id) => {
                let _ = self.copy_into_draft(&id).await;
            }
            Action::Download { id, dest } => {
                let _ = self.sync.download(&id, &dest).await;
            }
            Action::UploadMaterial { index, file } => {
                let _ = self.upload_material(index, &file).await;
            }
            Action::UploadBgm(file) => {
                let _ = self.upload_bgm(&file).await;
            }
            Action::GeneratePreview => {
                let _ = self.generate_preview().await;
            }
            Action::ToggleAudio(track_id) => {
                let _ = self.toggle_audio(&track_id).await;
            }
            Action::AudioEnded(track_id) => self.media.audio.handle_ended(&track_id),
            Action::GoToPage(page) => {
                let total = self.sync.jobs().await.len();
                if !self.pages.go_to(page, total) {
                    debug!("Page {} out of range", page);
                }
            }
            Action::DismissToast(id) => {
                self.notifications.dismiss(id).await;
            }
        }
    }

    fn selector_mut(&mut self, id: SelectorId) -> &mut FilterableSelector<String> {
        match id {
            SelectorId::Font => &mut self.fonts,
            SelectorId::Voice => &mut self.voices,
            SelectorId::Bgm => &mut self.bgm,
        }
    }

    fn select(&mut self, id: SelectorId, input: SelectorInput) {
        // a press outside one dropdown is outside the others too
        if let SelectorInput::PointerDown { inside: false } = input {
            for other in [SelectorId::Font, SelectorId::Voice, SelectorId::Bgm] {
                self.selector_mut(other).pointer_down(false);
            }
            return;
        }

        let Some(value) = self.selector_mut(id).handle(input) else {
            return;
        };
        let edit = match id {
            SelectorId::Font => DraftEdit::SubtitleFont(value),
            SelectorId::Voice => DraftEdit::TtsVoice(value),
            SelectorId::Bgm => DraftEdit::BgmPath(value),
        };
        self.request.edit(edit);
    }

    /// Submit the current draft. Invalid drafts never reach the service.
    pub async fn submit(&mut self) -> Result<String> {
        let issues = self.request.issues();
        if !issues.is_empty() {
            debug!("Submit refused: {:?}", issues);
            return Err(ClientError::InvalidDraft(issues));
        }
        let draft = self.request.snapshot();
        self.sync.create(&draft).await
    }

    pub fn request_delete_all(&mut self) {
        if self
            .confirm
            .request("Delete all jobs and their videos?", PendingAction::DeleteAll)
            .is_some()
        {
            debug!("Replaced an open confirmation");
        }
    }

    pub async fn confirm(&mut self) {
        match self.confirm.confirm() {
            Some(PendingAction::DeleteAll) => {
                let _ = self.sync.delete_all().await;
            }
            None => debug!("Nothing to confirm"),
        }
    }

    async fn find_job(&self, id: &str) -> Result<Job> {
        match self.sync.job(id).await {
            Some(job) => Ok(job),
            None => {
                let err = ClientError::UnknownJob { id: id.to_string() };
                self.notifications.error(err.to_string()).await;
                Err(err)
            }
        }
    }

    pub async fn duplicate(&mut self, id: &str) -> Result<String> {
        let job = self.find_job(id).await?;
        self.sync.duplicate(&job).await
    }

    /// Load a past job's request into the draft. Purely local; the job record
    /// is never touched.
    pub async fn copy_into_draft(&mut self, id: &str) -> Result<()> {
        let job = self.find_job(id).await?;
        self.request.replace(&job.request);
        self.sync_voices_with_provider().await;
        self.notifications.success("Copied into draft").await;
        Ok(())
    }

    pub async fn upload_material(&mut self, index: usize, file: &Path) -> Result<()> {
        let name = file_name(file);
        if let Some(kind) = infer_kind(&name) {
            self.request
                .edit_material(MaterialEdit::Update(index, MaterialField::Kind(kind)));
        }

        let result = self.upload(file, &name).await?;
        if !self.request.apply_upload(index, &result) {
            debug!("Material {} is gone, dropping upload {}", index, result.path);
        }
        Ok(())
    }

    pub async fn upload_bgm(&mut self, file: &Path) -> Result<()> {
        let name = file_name(file);
        let result = self.upload(file, &name).await?;
        self.request.edit(DraftEdit::BgmSource(BgmSource::Upload));
        self.request.edit(DraftEdit::BgmPath(result.path));
        Ok(())
    }

    async fn upload(&self, file: &Path, name: &str) -> Result<UploadResult> {
        let outcome = match tokio::fs::read(file).await {
            Ok(bytes) => self.service.upload_file(name, bytes).await,
            Err(e) => Err(e.into()),
        };
        match &outcome {
            Ok(result) => {
                info!("Uploaded {} to {}", name, result.path);
                self.notifications.success("File uploaded").await;
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", file.display(), e);
                self.notifications.error(e.user_message("Upload failed")).await;
            }
        }
        outcome
    }

    /// Render the subtitle preview for the current draft. Returns whether the
    /// result was installed.
    pub async fn generate_preview(&mut self) -> Result<bool> {
        let (seq, request) = self.media.image.begin(self.request.draft());
        let outcome = match self.service.preview_subtitle(&request).await {
            Ok(bytes) => self.media.image.install(seq, &bytes),
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            warn!("Preview failed: {}", e);
            self.notifications.error(e.user_message("Preview failed")).await;
        }
        outcome
    }

    pub async fn toggle_audio(&mut self, track_id: &str) -> Result<AudioState> {
        let outcome = self.media.audio.toggle(track_id);
        if let Err(e) = &outcome {
            warn!("Audio preview of {} failed: {}", track_id, e);
            self.notifications
                .error(e.user_message("Cannot play preview"))
                .await;
        }
        outcome
    }

    pub fn draft(&self) -> &JobRequest {
        self.request.draft()
    }

    pub fn draft_snapshot(&self) -> Arc<JobRequest> {
        self.request.snapshot()
    }

    pub fn is_valid(&self) -> bool {
        self.request.is_valid()
    }

    pub fn issues(&self) -> Vec<ValidationIssue> {
        self.request.issues()
    }

    pub fn selector(&self, id: SelectorId) -> &FilterableSelector<String> {
        match id {
            SelectorId::Font => &self.fonts,
            SelectorId::Voice => &self.voices,
            SelectorId::Bgm => &self.bgm,
        }
    }

    pub fn confirmation(&self) -> Option<&ConfirmationRequest<PendingAction>> {
        self.confirm.current()
    }

    pub async fn toasts(&self) -> Vec<Toast> {
        self.notifications.snapshot().await
    }

    pub fn preview_image(&self) -> Option<&PreviewImage> {
        self.media.image.current()
    }

    pub fn playing_track(&self) -> Option<&str> {
        self.media.audio.playing_track()
    }

    pub fn synchronizer(&self) -> &JobSynchronizer {
        &self.sync
    }

    /// The current page of jobs. A page emptied by deletions falls back to the
    /// last page that still exists.
    pub async fn job_page(&mut self) -> JobPage {
        let jobs = self.sync.jobs().await;
        self.pages.reconcile(jobs.len());
        JobPage {
            page: self.pages.page(),
            total_pages: self.pages.total_pages(jobs.len()),
            jobs: self.pages.window(jobs.as_slice()).to_vec(),
            summary: StatusSummary::from_jobs(&jobs),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // the poll loop holds its own handle to the synchronizer
        self.sync.abandon();
    }
}
