use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /jobs`; also echoed back by the service on every job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub tts: TtsSettings,
    #[serde(default)]
    pub video: VideoSettings,
    #[serde(default)]
    pub bgm: BgmSettings,
    #[serde(default)]
    pub subtitle_style: SubtitleStyle,
}

impl Default for JobRequest {
    fn default() -> Self {
        Self {
            script: String::new(),
            materials: vec![Material {
                path: "https://picsum.photos/720/1280".into(),
                ..Material::default()
            }],
            tts: TtsSettings::default(),
            video: VideoSettings::default(),
            bgm: BgmSettings::default(),
            subtitle_style: SubtitleStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Image,
    Video,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialSource {
    #[default]
    Url,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "type", default)]
    pub kind: MaterialKind,
    #[serde(default)]
    pub source: MaterialSource,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub duration_sec: f64,
    /// video only
    #[serde(default)]
    pub mute: bool,
    /// video only, 0..1, ignored while muted
    #[serde(default)]
    pub volume: f64,
    /// image only; free-form camera motion name, empty for none
    #[serde(default)]
    pub effect: String,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Image,
            source: MaterialSource::Url,
            path: String::new(),
            duration_sec: 3.0,
            mute: false,
            volume: 1.0,
            effect: String::new(),
        }
    }
}

/// Which per-material controls a host should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialControls {
    pub mute: bool,
    pub volume: bool,
    pub effect: bool,
    pub upload: bool,
}

impl Material {
    pub fn controls(&self) -> MaterialControls {
        let is_video = self.kind == MaterialKind::Video;
        MaterialControls {
            mute: is_video,
            volume: is_video && !self.mute,
            effect: !is_video,
            upload: self.source == MaterialSource::Upload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub provider: String,
    pub voice: String,
    pub locale: String,
    pub speed: f64,
    pub pitch: f64,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            provider: "free".into(),
            voice: String::new(),
            locale: "en-US".into(),
            speed: 1.0,
            pitch: 0.0,
        }
    }
}

/// Output frame size, serialized as `"{width}x{height}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const PORTRAIT_1080: Resolution = Resolution { width: 1080, height: 1920 };
    pub const PORTRAIT_720: Resolution = Resolution { width: 720, height: 1280 };
    pub const SQUARE_1080: Resolution = Resolution { width: 1080, height: 1080 };
    pub const LANDSCAPE_1080: Resolution = Resolution { width: 1920, height: 1080 };

    pub const PRESETS: [Resolution; 4] = [
        Self::PORTRAIT_1080,
        Self::PORTRAIT_720,
        Self::SQUARE_1080,
        Self::LANDSCAPE_1080,
    ];
}

impl Default for Resolution {
    fn default() -> Self {
        Self::PORTRAIT_1080
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        // the service fills in 1080x1920 for an empty value
        if value.trim().is_empty() {
            return Ok(Resolution::default());
        }
        let (w, h) = value
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid resolution: {}", value))?;
        let width = w.parse().map_err(|_| format!("invalid resolution: {}", value))?;
        let height = h.parse().map_err(|_| format!("invalid resolution: {}", value))?;
        Ok(Resolution { width, height })
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// xfade transition between consecutive materials. The service hands the
/// name straight to ffmpeg, so any other xfade name round-trips as `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    #[serde(alias = "")]
    None,
    Fade,
    Dissolve,
    WipeLeft,
    WipeRight,
    SlideLeft,
    SlideRight,
    CircleOpen,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub resolution: Resolution,
    pub fps: u32,
    pub transition: Transition,
    /// hex colour without `#`
    pub background: String,
    pub blur_background: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            fps: 30,
            transition: Transition::None,
            background: "000000".into(),
            blur_background: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BgmSource {
    #[default]
    Preset,
    Url,
    Upload,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BgmSettings {
    pub source: BgmSource,
    pub path: String,
    pub volume: f64,
}

impl Default for BgmSettings {
    fn default() -> Self {
        Self {
            source: BgmSource::Preset,
            path: "default.mp3".into(),
            volume: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font: String,
    pub size: u32,
    /// hex colour without `#`
    pub color: String,
    pub y_offset: i32,
    pub max_line_width: u32,
    pub outline_width: f64,
    pub outline_color: String,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: "Noto Sans TC".into(),
            size: 36,
            color: "FFFFFF".into(),
            y_offset: 40,
            max_line_width: 24,
            outline_width: 0.1,
            outline_color: "000000".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed | JobStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A job record as last reported by the service. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub request: JobRequest,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_download(&self) -> bool {
        self.status == JobStatus::Success
    }

    /// Path of the rendered video relative to the API base.
    pub fn result_path(&self) -> String {
        format!("/jobs/{}/result", self.id)
    }

    /// The service reports "no error" as an empty string.
    pub fn error(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .filter(|msg| !msg.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub locale: String,
}

impl Voice {
    pub fn label(&self) -> String {
        let name = if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        };
        if self.locale.is_empty() {
            name.clone()
        } else {
            format!("{} ({})", name, self.locale)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub path: String,
    #[serde(default)]
    pub url: String,
}

/// Body of `POST /preview/subtitle`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSubtitleRequest {
    pub text: String,
    pub style: SubtitleStyle,
    pub background: String,
    pub resolution: Resolution,
}
