//! The draft job request and its derived validity.

use std::sync::Arc;

use crate::materials::{self, Direction, MaterialField};
use crate::models::{
    BgmSource, JobRequest, Material, Resolution, Transition, UploadResult,
};

/// One reason the draft cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyScript,
    NoMaterials,
    MaterialPath(usize),
    MaterialDuration(usize),
    MissingVoice,
    MissingBgmPath,
}

impl ValidationIssue {
    pub fn describe(&self) -> String {
        match self {
            ValidationIssue::EmptyScript => "script is empty".into(),
            ValidationIssue::NoMaterials => "at least one material is required".into(),
            ValidationIssue::MaterialPath(i) => format!("material {} has no path", i + 1),
            ValidationIssue::MaterialDuration(i) => {
                format!("material {} needs a duration above zero", i + 1)
            }
            ValidationIssue::MissingVoice => "no voice selected".into(),
            ValidationIssue::MissingBgmPath => "background music has no path".into(),
        }
    }
}

/// Every rule the draft currently breaks, in field order.
pub fn validation_issues(draft: &JobRequest) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if draft.script.trim().is_empty() {
        issues.push(ValidationIssue::EmptyScript);
    }
    if draft.materials.is_empty() {
        issues.push(ValidationIssue::NoMaterials);
    }
    for (i, material) in draft.materials.iter().enumerate() {
        if material.path.trim().is_empty() {
            issues.push(ValidationIssue::MaterialPath(i));
        }
        // NaN fails this too
        if !(material.duration_sec > 0.0) {
            issues.push(ValidationIssue::MaterialDuration(i));
        }
    }
    if draft.tts.voice.is_empty() {
        issues.push(ValidationIssue::MissingVoice);
    }
    if draft.bgm.source != BgmSource::None && draft.bgm.path.trim().is_empty() {
        issues.push(ValidationIssue::MissingBgmPath);
    }

    issues
}

pub fn is_valid(draft: &JobRequest) -> bool {
    validation_issues(draft).is_empty()
}

/// `#ff00aa` / `ff00aa` -> `FF00AA`
pub fn normalize_color(input: &str) -> String {
    input.trim().trim_start_matches('#').to_ascii_uppercase()
}

/// Field-level edits to the non-material parts of the draft.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Script(String),
    TtsProvider(String),
    TtsVoice(String),
    TtsLocale(String),
    TtsSpeed(f64),
    TtsPitch(f64),
    Resolution(Resolution),
    Fps(u32),
    Transition(Transition),
    Background(String),
    BlurBackground(bool),
    BgmSource(BgmSource),
    BgmPath(String),
    BgmVolume(f64),
    SubtitleFont(String),
    SubtitleSize(u32),
    SubtitleColor(String),
    SubtitleYOffset(i32),
    SubtitleMaxLineWidth(u32),
    OutlineWidth(f64),
    OutlineColor(String),
}

impl DraftEdit {
    fn apply(self, draft: &mut JobRequest) {
        match self {
            DraftEdit::Script(script) => draft.script = script,
            DraftEdit::TtsProvider(provider) => {
                // voices belong to a provider
                if draft.tts.provider != provider {
                    draft.tts.voice.clear();
                }
                draft.tts.provider = provider;
            }
            DraftEdit::TtsVoice(voice) => draft.tts.voice = voice,
            DraftEdit::TtsLocale(locale) => draft.tts.locale = locale,
            DraftEdit::TtsSpeed(speed) => draft.tts.speed = speed,
            DraftEdit::TtsPitch(pitch) => draft.tts.pitch = pitch,
            DraftEdit::Resolution(resolution) => draft.video.resolution = resolution,
            DraftEdit::Fps(fps) => draft.video.fps = fps,
            DraftEdit::Transition(transition) => draft.video.transition = transition,
            DraftEdit::Background(color) => draft.video.background = normalize_color(&color),
            DraftEdit::BlurBackground(blur) => draft.video.blur_background = blur,
            DraftEdit::BgmSource(source) => draft.bgm.source = source,
            DraftEdit::BgmPath(path) => draft.bgm.path = path,
            DraftEdit::BgmVolume(volume) => draft.bgm.volume = volume.clamp(0.0, 1.0),
            DraftEdit::SubtitleFont(font) => draft.subtitle_style.font = font,
            DraftEdit::SubtitleSize(size) => draft.subtitle_style.size = size,
            DraftEdit::SubtitleColor(color) => draft.subtitle_style.color = normalize_color(&color),
            DraftEdit::SubtitleYOffset(offset) => draft.subtitle_style.y_offset = offset,
            DraftEdit::SubtitleMaxLineWidth(width) => draft.subtitle_style.max_line_width = width,
            DraftEdit::OutlineWidth(width) => draft.subtitle_style.outline_width = width,
            DraftEdit::OutlineColor(color) => {
                draft.subtitle_style.outline_color = normalize_color(&color)
            }
        }
    }
}

/// Edits to the ordered material list.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialEdit {
    Add,
    Remove(usize),
    Update(usize, MaterialField),
    Move(usize, Direction),
    /// trim the path when its input loses focus
    CommitPath(usize),
}

/// Owner of the draft. Every change swaps in a new `Arc`, so a snapshot taken
/// earlier never sees later edits.
#[derive(Debug, Clone)]
pub struct RequestModel {
    draft: Arc<JobRequest>,
    revision: u64,
}

impl Default for RequestModel {
    fn default() -> Self {
        Self::new(JobRequest::default())
    }
}

impl RequestModel {
    pub fn new(draft: JobRequest) -> Self {
        Self {
            draft: Arc::new(draft),
            revision: 0,
        }
    }

    pub fn draft(&self) -> &JobRequest {
        &self.draft
    }

    pub fn snapshot(&self) -> Arc<JobRequest> {
        Arc::clone(&self.draft)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_valid(&self) -> bool {
        is_valid(&self.draft)
    }

    pub fn issues(&self) -> Vec<ValidationIssue> {
        validation_issues(&self.draft)
    }

    fn install(&mut self, next: JobRequest) {
        self.draft = Arc::new(next);
        self.revision += 1;
    }

    pub fn edit(&mut self, edit: DraftEdit) {
        let mut next = (*self.draft).clone();
        edit.apply(&mut next);
        self.install(next);
    }

    /// Apply a material edit. Returns false when it targeted a slot that does
    /// not exist (or a move past the ends) and nothing changed.
    pub fn edit_material(&mut self, edit: MaterialEdit) -> bool {
        let current = &self.draft.materials;
        let next = match edit {
            MaterialEdit::Add => Some(materials::add(current)),
            MaterialEdit::Remove(i) if i < current.len() => Some(materials::remove(current, i)),
            MaterialEdit::Remove(_) => None,
            MaterialEdit::Update(i, field) => materials::update(current, i, field),
            MaterialEdit::Move(i, direction) => materials::move_item(current, i, direction),
            MaterialEdit::CommitPath(i) => current.get(i).and_then(|m| {
                let trimmed = m.path.trim();
                (trimmed != m.path)
                    .then(|| materials::update(current, i, MaterialField::Path(trimmed.to_string())))
                    .flatten()
            }),
        };
        self.replace_materials(next)
    }

    pub fn apply_upload(&mut self, index: usize, upload: &UploadResult) -> bool {
        let next = materials::apply_upload(&self.draft.materials, index, upload);
        self.replace_materials(next)
    }

    fn replace_materials(&mut self, next: Option<Vec<Material>>) -> bool {
        match next {
            Some(materials) => {
                let mut draft = (*self.draft).clone();
                draft.materials = materials;
                self.install(draft);
                true
            }
            None => false,
        }
    }

    /// Overwrite the whole draft with a deep copy of `request`.
    pub fn replace(&mut self, request: &JobRequest) {
        self.install(request.clone());
    }

    pub fn reset(&mut self) {
        self.install(JobRequest::default());
    }
}
