//! Sprite frame records
//!
//! A [`SpriteFrame`] is the renderable unit derived from one region of a
//! packed image: which texture it samples, where in that texture, and how to
//! restore the untrimmed size at draw time. Building one is a pure function of
//! the region and the raw image dimensions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Type tag written into persisted sprite frame artifacts
pub const SPRITE_FRAME_TYPE: &str = "SpriteFrame";

/// Pixel rectangle inside a packed image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Check that the rect lies inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        // u64 so that huge offsets cannot wrap
        (self.x as u64 + self.width as u64) <= width as u64
            && (self.y as u64 + self.height as u64) <= height as u64
    }
}

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Nine-slice insets, in pixels of the untrimmed sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Borders {
    pub border_top: u32,
    pub border_bottom: u32,
    pub border_left: u32,
    pub border_right: u32,
}

/// Geometry of one sprite inside a packed image, as produced by a decoder
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpriteRegion {
    /// Trimmed sprite area in the packed image, in unrotated orientation
    pub rect: Rect,
    /// Offset of the trimmed area's center from the original center (y up)
    pub offset: (f32, f32),
    /// Size before trimming
    pub original_size: Size,
    /// Stored rotated 90° clockwise in the packed image
    pub rotated: bool,
}

impl SpriteRegion {
    /// Region covering a whole untrimmed image
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            rect: Rect::new(0, 0, width, height),
            offset: (0.0, 0.0),
            original_size: Size::new(width, height),
            rotated: false,
        }
    }

    /// Area actually occupied in the packed image
    ///
    /// Rotated sprites are stored with width and height swapped.
    pub fn footprint(&self) -> Rect {
        if self.rotated {
            Rect::new(self.rect.x, self.rect.y, self.rect.height, self.rect.width)
        } else {
            self.rect
        }
    }
}

/// Error building a sprite frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// The region's footprint extends past the raw image
    RegionOutOfBounds {
        name: String,
        footprint: Rect,
        raw_width: u32,
        raw_height: u32,
    },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::RegionOutOfBounds {
                name,
                footprint,
                raw_width,
                raw_height,
            } => write!(
                f,
                "sprite '{}' region {}x{} at ({}, {}) exceeds raw image {}x{}",
                name, footprint.width, footprint.height, footprint.x, footprint.y, raw_width, raw_height
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// A renderable sprite cut from a packed image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteFrame {
    /// Sprite name (key inside its atlas)
    pub name: String,
    /// Uuid of the raw texture the frame samples, if registered
    pub texture: Option<Uuid>,
    /// Trimmed area in the texture, unrotated orientation
    pub rect: Rect,
    pub offset_x: f32,
    pub offset_y: f32,
    /// Untrimmed size
    pub original_size: Size,
    pub rotated: bool,
    /// Raw texture dimensions the rect was validated against
    pub raw_width: u32,
    pub raw_height: u32,
    #[serde(flatten)]
    pub borders: Borders,
}

impl SpriteFrame {
    /// Serialize into a library artifact carrying a `__type__` tag
    pub fn to_artifact(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert("__type__".to_string(), Value::from(SPRITE_FRAME_TYPE));
        }
        Ok(value)
    }

    /// Read a frame back from a library artifact
    pub fn from_artifact(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Build a sprite frame from a region of a `raw_width` x `raw_height` image
pub fn create_sprite_frame(
    name: &str,
    region: &SpriteRegion,
    borders: Borders,
    texture: Option<Uuid>,
    raw_width: u32,
    raw_height: u32,
) -> Result<SpriteFrame, FrameError> {
    let footprint = region.footprint();
    if !footprint.fits_within(raw_width, raw_height) {
        return Err(FrameError::RegionOutOfBounds {
            name: name.to_string(),
            footprint,
            raw_width,
            raw_height,
        });
    }

    Ok(SpriteFrame {
        name: name.to_string(),
        texture,
        rect: region.rect,
        offset_x: region.offset.0,
        offset_y: region.offset.1,
        original_size: region.original_size,
        rotated: region.rotated,
        raw_width,
        raw_height,
        borders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sprite_frame() {
        let region = SpriteRegion {
            rect: Rect::new(10, 20, 30, 40),
            offset: (1.0, -2.0),
            original_size: Size::new(32, 48),
            rotated: false,
        };
        let texture = Uuid::new_v4();
        let frame = create_sprite_frame("hero", &region, Borders::default(), Some(texture), 64, 64)
            .unwrap();

        assert_eq!(frame.name, "hero");
        assert_eq!(frame.texture, Some(texture));
        assert_eq!(frame.rect, Rect::new(10, 20, 30, 40));
        assert_eq!(frame.offset_x, 1.0);
        assert_eq!(frame.offset_y, -2.0);
        assert_eq!(frame.original_size, Size::new(32, 48));
    }

    #[test]
    fn test_region_out_of_bounds() {
        let region = SpriteRegion {
            rect: Rect::new(40, 0, 30, 10),
            ..SpriteRegion::full(30, 10)
        };
        let result = create_sprite_frame("wide", &region, Borders::default(), None, 64, 64);
        assert!(matches!(result, Err(FrameError::RegionOutOfBounds { .. })));
    }

    #[test]
    fn test_rotated_footprint_is_swapped() {
        // 10x60 sprite stored rotated occupies 60x10 in the packed image
        let region = SpriteRegion {
            rect: Rect::new(0, 0, 10, 60),
            rotated: true,
            ..SpriteRegion::full(10, 60)
        };
        assert!(create_sprite_frame("tall", &region, Borders::default(), None, 64, 16).is_ok());
        assert!(create_sprite_frame("tall", &region, Borders::default(), None, 16, 64).is_err());
    }

    #[test]
    fn test_artifact_is_tagged() {
        let frame = create_sprite_frame(
            "button",
            &SpriteRegion::full(16, 16),
            Borders {
                border_top: 4,
                border_bottom: 4,
                border_left: 3,
                border_right: 3,
            },
            None,
            16,
            16,
        )
        .unwrap();

        let artifact = frame.to_artifact().unwrap();
        assert_eq!(artifact["__type__"], SPRITE_FRAME_TYPE);
        assert_eq!(artifact["borderLeft"], 3);
        assert_eq!(artifact["originalSize"]["width"], 16);

        let restored = SpriteFrame::from_artifact(artifact).unwrap();
        assert_eq!(restored, frame);
    }
}
