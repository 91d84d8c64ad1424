//! Subtitle preview images and the single background-music preview player.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{JobRequest, PreviewSubtitleRequest};

const PREVIEW_TEXT_CHARS: usize = 8;
pub const PREVIEW_PLACEHOLDER: &str = "預覽文字";

/// Text rendered in the subtitle preview: the script's first line, cut to a
/// few characters.
pub fn preview_text(script: &str) -> String {
    let first_line = script.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return PREVIEW_PLACEHOLDER.to_string();
    }
    first_line.chars().take(PREVIEW_TEXT_CHARS).collect()
}

pub fn preview_request(draft: &JobRequest) -> PreviewSubtitleRequest {
    PreviewSubtitleRequest {
        text: preview_text(&draft.script),
        style: draft.subtitle_style.clone(),
        background: draft.video.background.clone(),
        resolution: draft.video.resolution,
    }
}

/// A rendered preview held in a temp file. Dropping it deletes the file.
#[derive(Debug)]
pub struct PreviewImage {
    path: TempPath,
    seq: u64,
    len: usize,
}

impl PreviewImage {
    fn write(bytes: &[u8], seq: u64, dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("videosmith-preview-").suffix(".png");
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            path: file.into_temp_path(),
            seq,
            len: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Holds at most one preview image. Requests are sequence-tagged and only the
/// most recently issued one may install its result.
#[derive(Debug, Default)]
pub struct ImagePreview {
    current: Option<PreviewImage>,
    issued: u64,
    /// where preview files go; the system temp dir when unset
    dir: Option<PathBuf>,
}

impl ImagePreview {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Tag a new render request.
    pub fn begin(&mut self, draft: &JobRequest) -> (u64, PreviewSubtitleRequest) {
        self.issued += 1;
        (self.issued, preview_request(draft))
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued
    }

    /// Install the rendered bytes for `seq`. The previous image is released
    /// as soon as the new one replaces it; a failed write leaves it in place.
    /// Results from superseded requests are discarded; returns whether the
    /// image was installed.
    pub fn install(&mut self, seq: u64, bytes: &[u8]) -> Result<bool> {
        if !self.is_latest(seq) {
            debug!("Dropping preview #{} (latest is #{})", seq, self.issued);
            return Ok(false);
        }
        let image = PreviewImage::write(bytes, seq, self.dir.as_deref())?;
        debug!("Preview #{} installed at {}", seq, image.path().display());
        if let Some(old) = self.current.replace(image) {
            debug!("Releasing preview #{}", old.seq);
        }
        Ok(true)
    }

    pub fn current(&self) -> Option<&PreviewImage> {
        self.current.as_ref()
    }

    pub fn release(&mut self) {
        if let Some(old) = self.current.take() {
            debug!("Releasing preview #{}", old.seq);
        }
    }
}

/// A playing (or paused) audio source created by the host.
pub trait AudioHandle: Send {
    fn play(&mut self);
    fn pause(&mut self);
    /// Stop playback and free the underlying source.
    fn teardown(&mut self);
}

/// Creates audio handles; implemented by whatever host renders the UI.
pub trait AudioBackend: Send {
    fn open(&mut self, track_id: &str) -> Result<Box<dyn AudioHandle>>;
}

/// Backend for hosts without audio output.
#[derive(Debug, Default)]
pub struct NullAudioBackend;

struct NullHandle;

impl AudioHandle for NullHandle {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn teardown(&mut self) {}
}

impl AudioBackend for NullAudioBackend {
    fn open(&mut self, track_id: &str) -> Result<Box<dyn AudioHandle>> {
        debug!("No audio output, ignoring preview of {}", track_id);
        Ok(Box::new(NullHandle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Playing,
    Paused,
}

struct ActiveTrack {
    track_id: String,
    handle: Box<dyn AudioHandle>,
    playing: bool,
}

/// At most one audio handle, keyed by track identity.
pub struct AudioPreview {
    backend: Box<dyn AudioBackend>,
    active: Option<ActiveTrack>,
}

impl AudioPreview {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            active: None,
        }
    }

    /// Same track pauses or resumes in place; any other track replaces the
    /// handle and starts playing.
    pub fn toggle(&mut self, track_id: &str) -> Result<AudioState> {
        if let Some(active) = self.active.as_mut().filter(|a| a.track_id == track_id) {
            if active.playing {
                active.handle.pause();
            } else {
                active.handle.play();
            }
            active.playing = !active.playing;
            return Ok(if active.playing {
                AudioState::Playing
            } else {
                AudioState::Paused
            });
        }

        self.dispose();
        let mut handle = self.backend.open(track_id)?;
        handle.play();
        info!("Audio preview: {}", track_id);
        self.active = Some(ActiveTrack {
            track_id: track_id.to_string(),
            handle,
            playing: true,
        });
        Ok(AudioState::Playing)
    }

    /// Playback reached the end of `track_id`.
    pub fn handle_ended(&mut self, track_id: &str) {
        if let Some(active) = self.active.as_mut().filter(|a| a.track_id == track_id) {
            active.playing = false;
        }
    }

    pub fn playing_track(&self) -> Option<&str> {
        self.active
            .as_ref()
            .filter(|a| a.playing)
            .map(|a| a.track_id.as_str())
    }

    pub fn is_playing(&self, track_id: &str) -> bool {
        self.playing_track() == Some(track_id)
    }

    pub fn dispose(&mut self) {
        if let Some(mut active) = self.active.take() {
            debug!("Tearing down audio for {}", active.track_id);
            active.handle.teardown();
        }
    }
}

impl Drop for AudioPreview {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Preview image plus audio player for one view.
pub struct MediaPreviewSession {
    pub image: ImagePreview,
    pub audio: AudioPreview,
}

impl MediaPreviewSession {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            image: ImagePreview::default(),
            audio: AudioPreview::new(backend),
        }
    }

    pub fn dispose(&mut self) {
        self.image.release();
        self.audio.dispose();
    }
}
