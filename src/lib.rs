//! spritepack - sprite atlas import pipeline
//!
//! Turns a packed sprite atlas (TexturePacker JSON plus its image) into
//! library artifacts: a copy of the atlas description under the atlas uuid
//! and one sprite frame per packed sprite under that sprite's own uuid.

pub mod assetdb;
pub mod atlas_format;
pub mod config;
pub mod meta;
pub mod sprite_frame;
pub mod texture;
