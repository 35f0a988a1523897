//! Asset store — resolves asset paths for `image` and `get_texture_size`.
//!
//! A terminal host has no pixel decoding, so assets are described by a JSON
//! manifest mapping each path the client may name to a cell-art stand-in:
//! dimensions plus the glyph/color used to composite it onto the canvas.
//!
//! The store always resolves: an unknown path gets a placeholder asset
//! registered on first reference (and a single stderr note). Leaving a
//! `get_texture_size` unanswered would deadlock the turn-based protocol.

use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::{Color, NamedColor};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Asset {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_glyph")]
    pub glyph: char,
    #[serde(default = "default_color")]
    pub color: Color,
}

fn default_glyph() -> char {
    '▒'
}

fn default_color() -> Color {
    Color::WHITE
}

const PLACEHOLDER: Asset = Asset {
    width: 8,
    height: 4,
    glyph: '?',
    color: Color::Named(NamedColor::Magenta),
};

#[derive(Debug, Deserialize)]
struct Manifest {
    assets: HashMap<String, Asset>,
}

pub struct AssetStore {
    assets: HashMap<String, Asset>,
}

impl AssetStore {
    pub fn empty() -> Self {
        AssetStore {
            assets: HashMap::new(),
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        let json =
            fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse {path}"))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)?;
        Ok(AssetStore {
            assets: manifest.assets,
        })
    }

    /// Resolve a path, registering a placeholder on first sight of an
    /// unlisted asset so repeat lookups stay identical.
    pub fn resolve(&mut self, path: &str) -> &Asset {
        self.assets.entry(path.to_owned()).or_insert_with(|| {
            eprintln!("Unknown asset {path:?}, using placeholder");
            PLACEHOLDER
        })
    }

    /// Native dimensions of an asset, for the `get_texture_size` reply.
    pub fn texture_size(&mut self, path: &str) -> (u32, u32) {
        let asset = self.resolve(path);
        (asset.width, asset.height)
    }
}
