//! Ordered editing of the draft's material list.
//!
//! Materials have positional identity: moving one swaps two slots and nothing
//! else travels with it.

use std::path::Path;

use crate::models::{Material, MaterialKind, MaterialSource, UploadResult};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }

    fn target(self, index: usize, len: usize) -> Option<usize> {
        let target = index.checked_add_signed(self.offset())?;
        (index < len && target < len).then_some(target)
    }
}

/// One field of one material, carrying its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialField {
    Kind(MaterialKind),
    Source(MaterialSource),
    Path(String),
    DurationSec(f64),
    Mute(bool),
    Volume(f64),
    Effect(String),
}

impl MaterialField {
    fn apply(self, material: &mut Material) {
        match self {
            MaterialField::Kind(kind) => material.kind = kind,
            MaterialField::Source(source) => material.source = source,
            MaterialField::Path(path) => material.path = path,
            MaterialField::DurationSec(secs) => material.duration_sec = secs,
            MaterialField::Mute(mute) => material.mute = mute,
            MaterialField::Volume(volume) => material.volume = volume.clamp(0.0, 1.0),
            MaterialField::Effect(effect) => material.effect = effect,
        }
    }
}

/// Append a default-valued material.
pub fn add(materials: &[Material]) -> Vec<Material> {
    let mut next = materials.to_vec();
    next.push(Material::default());
    next
}

/// Drop the material at `index`; out-of-range indices leave the list as is.
pub fn remove(materials: &[Material], index: usize) -> Vec<Material> {
    let mut next = materials.to_vec();
    if index < next.len() {
        next.remove(index);
    }
    next
}

/// Replace one field of one material. Returns `None` when `index` no longer
/// exists, e.g. an upload finishing after its row was removed.
pub fn update(materials: &[Material], index: usize, field: MaterialField) -> Option<Vec<Material>> {
    let mut item = materials.get(index)?.clone();
    field.apply(&mut item);
    let mut next = materials.to_vec();
    next[index] = item;
    Some(next)
}

/// Swap `index` with its neighbour in `direction`. Moves past either end are
/// no-ops and return `None`.
pub fn move_item(materials: &[Material], index: usize, direction: Direction) -> Option<Vec<Material>> {
    let target = direction.target(index, materials.len())?;
    let mut next = materials.to_vec();
    next.swap(index, target);
    Some(next)
}

/// Whether the move affordance for `index` should be enabled.
pub fn can_move(index: usize, direction: Direction, len: usize) -> bool {
    direction.target(index, len).is_some()
}

/// Material type implied by a file name's extension.
pub fn infer_kind(file_name: &str) -> Option<MaterialKind> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MaterialKind::Video)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MaterialKind::Image)
    } else {
        None
    }
}

/// Point a material at a freshly uploaded artifact.
pub fn apply_upload(materials: &[Material], index: usize, upload: &UploadResult) -> Option<Vec<Material>> {
    let next = update(materials, index, MaterialField::Source(MaterialSource::Upload))?;
    update(&next, index, MaterialField::Path(upload.path.clone()))
}
