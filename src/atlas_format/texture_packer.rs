//! TexturePacker JSON ("hash" and "array" layouts)

use serde::Deserialize;
use std::path::PathBuf;

use super::{FormatError, ParsedAtlas, ParsedFrame};
use crate::sprite_frame::{Rect, Size, SpriteRegion};

pub const FORMAT_HASH: &str = "texture-packer-hash";
pub const FORMAT_ARRAY: &str = "texture-packer-array";

#[derive(Debug, Clone, Copy, Deserialize)]
struct FrameData {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SizeData {
    w: u32,
    h: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Frame {
    #[serde(default)]
    filename: Option<String>,
    frame: FrameData,
    #[serde(default)]
    rotated: bool,
    #[serde(default)]
    trimmed: bool,
    #[serde(default)]
    sprite_source_size: Option<FrameData>,
    #[serde(default)]
    source_size: Option<SizeData>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    image: String,
    size: SizeData,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Frames {
    Array(Vec<Frame>),
    // Vec of pairs keeps the file order of an object
    Hash(#[serde(with = "ordered_map")] Vec<(String, Frame)>),
}

#[derive(Debug, Deserialize)]
struct Sheet {
    frames: Option<Frames>,
    meta: Option<Meta>,
}

pub(super) fn parse(bytes: &[u8]) -> Result<ParsedAtlas, FormatError> {
    let sheet: Sheet = serde_json::from_slice(bytes)?;

    let meta = sheet
        .meta
        .ok_or_else(|| FormatError::Unrecognized("missing 'meta' section".to_string()))?;
    let frames = sheet
        .frames
        .ok_or_else(|| FormatError::Unrecognized("missing 'frames' section".to_string()))?;

    let (format, frames) = match frames {
        Frames::Hash(entries) => (
            FORMAT_HASH,
            entries
                .into_iter()
                .map(|(name, frame)| ParsedFrame {
                    name,
                    region: region_of(&frame),
                })
                .collect(),
        ),
        Frames::Array(entries) => {
            let mut parsed = Vec::with_capacity(entries.len());
            for (index, frame) in entries.into_iter().enumerate() {
                let name = frame.filename.clone().ok_or_else(|| {
                    FormatError::Invalid(format!("frame {} has no filename", index))
                })?;
                parsed.push(ParsedFrame {
                    name,
                    region: region_of(&frame),
                });
            }
            (FORMAT_ARRAY, parsed)
        }
    };

    Ok(ParsedAtlas {
        format: format.to_string(),
        size: Size::new(meta.size.w, meta.size.h),
        image: PathBuf::from(meta.image),
        frames,
    })
}

fn region_of(frame: &Frame) -> SpriteRegion {
    let rect = Rect::new(frame.frame.x, frame.frame.y, frame.frame.w, frame.frame.h);
    let source = frame.source_size.unwrap_or(SizeData {
        w: frame.frame.w,
        h: frame.frame.h,
    });
    let trimmed_area = match frame.sprite_source_size {
        Some(sss) if frame.trimmed => sss,
        _ => FrameData {
            x: 0,
            y: 0,
            w: source.w,
            h: source.h,
        },
    };

    // Center of the trimmed area relative to the original center, y up
    let offset_x = trimmed_area.x as f32 + trimmed_area.w as f32 / 2.0 - source.w as f32 / 2.0;
    let offset_y = source.h as f32 / 2.0 - (trimmed_area.y as f32 + trimmed_area.h as f32 / 2.0);

    SpriteRegion {
        rect,
        offset: (offset_x, offset_y),
        original_size: Size::new(source.w, source.h),
        rotated: frame.rotated,
    }
}

mod ordered_map {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct PairsVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for PairsVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of frame name to frame")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry()? {
                    pairs.push((key, value));
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_layout() {
        let json = r#"{
            "frames": [
                {
                    "filename": "coin_0",
                    "frame": { "x": 2, "y": 2, "w": 10, "h": 6 },
                    "rotated": true,
                    "trimmed": true,
                    "spriteSourceSize": { "x": 3, "y": 5, "w": 10, "h": 6 },
                    "sourceSize": { "w": 16, "h": 16 }
                }
            ],
            "meta": { "image": "coins.png", "size": { "w": 16, "h": 16 } }
        }"#;

        let atlas = parse(json.as_bytes()).unwrap();
        assert_eq!(atlas.format, FORMAT_ARRAY);
        assert_eq!(atlas.image, PathBuf::from("coins.png"));

        let region = atlas.frames[0].region;
        assert!(region.rotated);
        assert_eq!(region.footprint(), Rect::new(2, 2, 6, 10));
        // x: 3 + 5 - 8 = 0, y: 8 - (5 + 3) = 0
        assert_eq!(region.offset, (0.0, 0.0));
    }

    #[test]
    fn test_untrimmed_frame_without_source_size() {
        let json = r#"{
            "frames": { "dot": { "frame": { "x": 0, "y": 0, "w": 2, "h": 2 } } },
            "meta": { "image": "dot.png", "size": { "w": 2, "h": 2 } }
        }"#;
        let atlas = parse(json.as_bytes()).unwrap();
        let region = atlas.frames[0].region;
        assert_eq!(region.original_size, Size::new(2, 2));
        assert_eq!(region.offset, (0.0, 0.0));
    }

    #[test]
    fn test_trim_offset() {
        let json = r#"{
            "frames": { "arrow": {
                "frame": { "x": 0, "y": 0, "w": 4, "h": 4 },
                "trimmed": true,
                "spriteSourceSize": { "x": 12, "y": 0, "w": 4, "h": 4 },
                "sourceSize": { "w": 16, "h": 16 }
            } },
            "meta": { "image": "ui.png", "size": { "w": 4, "h": 4 } }
        }"#;
        let atlas = parse(json.as_bytes()).unwrap();
        // Trimmed center (14, 2) vs original center (8, 8): right and up
        assert_eq!(atlas.frames[0].region.offset, (6.0, 6.0));
    }

    #[test]
    fn test_array_frame_without_filename() {
        let json = r#"{
            "frames": [ { "frame": { "x": 0, "y": 0, "w": 1, "h": 1 } } ],
            "meta": { "image": "a.png", "size": { "w": 1, "h": 1 } }
        }"#;
        assert!(matches!(parse(json.as_bytes()), Err(FormatError::Invalid(_))));
    }

    #[test]
    fn test_not_an_atlas() {
        assert!(matches!(
            parse(br#"{ "name": "hero" }"#),
            Err(FormatError::Unrecognized(_))
        ));
        assert!(matches!(parse(b"not json"), Err(FormatError::Json(_))));
    }
}
