//! Map and tile types.
//!
//! A map file holds the whole grid on its first line as a nested list of
//! quoted category codes, row-major, first row at the top:
//!
//! ```text
//! [['S', 'P', 'S'], ['S', 'P', 'R'], ['S', 'P', 'S']]
//! ```
//!
//! Internally every coordinate is Cartesian with the origin at the bottom
//! left, so file row `r` becomes `y = height - 1 - r`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::game::path::extract_path;

/// A coordinate on the map (bottom-origin Cartesian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row, counted from the bottom).
    pub y: i32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another coordinate.
    #[must_use]
    pub fn distance_squared(self, other: Coord) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// Category of a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Lane cell that debris travel along.
    Path,
    /// Open cell where towers may be built.
    Space,
    /// Blocked cell.
    Asteroid,
}

impl TileType {
    /// Classify a map-file category code by its first character.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.chars().next() {
            Some('P') => TileType::Path,
            Some('R') => TileType::Asteroid,
            _ => TileType::Space,
        }
    }
}

/// The immutable match map: tile grid plus the extracted lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    /// Map name (file stem).
    name: String,
    /// Width of the map in tiles.
    width: i32,
    /// Height of the map in tiles.
    height: i32,
    /// Tiles stored row-major by Cartesian `y`, then `x`.
    tiles: Vec<TileType>,
    /// Ordered lane from entry to exit.
    path: Arc<[Coord]>,
}

impl Map {
    /// Load a map from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or the grid is malformed.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let contents = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map_or_else(|| "map".to_string(), |s| s.to_string_lossy().to_string());
        let line = contents.lines().next().unwrap_or_default();
        Self::parse(&name, line)
    }

    /// Parse the single-line grid encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a rectangular nested list of
    /// quoted codes, or if the lane cannot be extracted.
    pub fn parse(name: &str, line: &str) -> Result<Self, MapError> {
        let normalized = line.trim().replace('\'', "\"");
        let codes: Vec<Vec<String>> =
            serde_json::from_str(&normalized).map_err(|e| MapError::Malformed(e.to_string()))?;
        let rows: Vec<Vec<TileType>> = codes
            .iter()
            .map(|row| row.iter().map(|code| TileType::from_code(code)).collect())
            .collect();
        Self::from_rows(name, &rows)
    }

    /// Build a map from rows of `P`/`S`/`R` characters, top row first.
    ///
    /// # Errors
    ///
    /// Same as [`Map::parse`].
    pub fn from_ascii(name: &str, rows: &[&str]) -> Result<Self, MapError> {
        let rows: Vec<Vec<TileType>> = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|c| TileType::from_code(c.encode_utf8(&mut [0; 4])))
                    .collect()
            })
            .collect();
        Self::from_rows(name, &rows)
    }

    /// Build a map from file-ordered rows (top row first).
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is empty or ragged, or if the lane is
    /// missing, branching or disconnected.
    pub fn from_rows(name: &str, rows: &[Vec<TileType>]) -> Result<Self, MapError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(MapError::Empty);
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(MapError::Ragged {
                row,
                expected,
                found: r.len(),
            });
        }

        let path = extract_path(rows)?;

        let height = rows.len();
        let width = expected;
        let mut tiles = vec![TileType::Space; width * height];
        for (r, row) in rows.iter().enumerate() {
            let y = height - 1 - r;
            for (x, &tile) in row.iter().enumerate() {
                tiles[y * width + x] = tile;
            }
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        Ok(Self {
            name: name.to_string(),
            width: width as i32,
            height: height as i32,
            tiles,
            path: path.into(),
        })
    }

    /// Map name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the width of the map.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Get the height of the map.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// The ordered lane, entry first.
    #[must_use]
    pub fn path(&self) -> &[Coord] {
        &self.path
    }

    /// First cell of the lane. A constructed map always has one.
    #[must_use]
    pub fn entry(&self) -> Coord {
        self.path[0]
    }

    /// Number of cells in the lane.
    #[must_use]
    pub fn path_length(&self) -> usize {
        self.path.len()
    }

    /// Check if a coordinate is within the map bounds.
    #[must_use]
    pub const fn is_in_bounds(&self, x: i32, y: i32) -> bool {
        0 <= x && x < self.width && 0 <= y && y < self.height
    }

    /// Tile at the given coordinate, `None` when out of bounds.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> Option<TileType> {
        if !self.is_in_bounds(x, y) {
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        let idx = (y * self.width + x) as usize;
        self.tiles.get(idx).copied()
    }

    /// True if the cell is in bounds and open space.
    #[must_use]
    pub fn is_space(&self, x: i32, y: i32) -> bool {
        self.tile(x, y) == Some(TileType::Space)
    }

    /// True if the cell is in bounds and part of the lane.
    #[must_use]
    pub fn is_path(&self, x: i32, y: i32) -> bool {
        self.tile(x, y) == Some(TileType::Path)
    }

    /// True if the cell is in bounds and an asteroid.
    #[must_use]
    pub fn is_asteroid(&self, x: i32, y: i32) -> bool {
        self.tile(x, y) == Some(TileType::Asteroid)
    }

    /// Iterate over all coordinates and tiles.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, TileType)> + '_ {
        let width = self.width.max(1);
        self.tiles.iter().enumerate().map(move |(idx, &tile)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let idx = idx as i32;
            (Coord::new(idx % width, idx / width), tile)
        })
    }
}
