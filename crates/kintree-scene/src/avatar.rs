//! Avatar visuals: photo when available, colored initials disc otherwise.
//!
//! A node with a photo URL starts out [`Avatar::Pending`]; the embedder
//! performs the actual load and reports back. Failure is recovered locally
//! by falling back to initials and never propagates.

use unicode_segmentation::UnicodeSegmentation;

/// Opaque token for a decoded image owned by the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Why an avatar image failed to load. Only informational; the scene
/// recovers by showing initials regardless of the cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    NotFound,
    Decode(String),
    Network(String),
}

/// Visual state of one node's avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    /// Photo URL known, load not yet resolved.
    Pending { url: String },
    /// Photo loaded and ready to draw.
    Loaded { handle: ImageHandle },
    /// Initials disc: first grapheme of the name, uppercased, on a color
    /// derived deterministically from the seed.
    Initials { glyph: String, color_seed: u32 },
}

impl Avatar {
    /// Initial avatar state for a member: pending when a photo URL exists,
    /// initials immediately otherwise (no load is ever attempted).
    #[must_use]
    pub fn for_member(name: &str, photo_url: Option<&str>) -> Self {
        match photo_url {
            Some(url) if !url.trim().is_empty() => Self::Pending {
                url: url.to_string(),
            },
            _ => Self::initials_for(name),
        }
    }

    /// Initials fallback for a name. Empty names get a placeholder glyph.
    #[must_use]
    pub fn initials_for(name: &str) -> Self {
        let glyph = name
            .graphemes(true)
            .next()
            .map(|g| g.to_uppercase())
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| "?".to_string());
        Self::Initials {
            color_seed: color_seed(name),
            glyph,
        }
    }

    /// Whether a load is still outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// FNV-1a over the name; stable across runs so a member keeps its disc
/// color between renders.
fn color_seed(name: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
