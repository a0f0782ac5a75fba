//! Map tokens
//!
//! A rectangular array of single-character tokens as handed over by a map
//! loader. Text row 0 is the top of the map, so row `r` becomes `y = height - 1 - r`.

use super::error::MapDecodeError;
use super::types::{Cell, Direction};

pub const OBSTACLE_TOKEN: char = '#';
pub const DESTINATION_TOKEN: char = 'D';
/// Traffic light that starts red
pub const LIGHT_RED_TOKEN: char = 'S';
/// Traffic light that starts green
pub const LIGHT_GREEN_TOKEN: char = 's';

/// Decoded meaning of a single map character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Road(Direction),
    Light { starts_green: bool },
    Obstacle,
    Destination,
}

impl Token {
    pub fn decode(cell: Cell, token: char) -> Result<Token, MapDecodeError> {
        let decoded = match token {
            '^' => Token::Road(Direction::Up),
            'v' => Token::Road(Direction::Down),
            '<' => Token::Road(Direction::Left),
            '>' => Token::Road(Direction::Right),
            LIGHT_RED_TOKEN => Token::Light {
                starts_green: false,
            },
            LIGHT_GREEN_TOKEN => Token::Light { starts_green: true },
            OBSTACLE_TOKEN => Token::Obstacle,
            DESTINATION_TOKEN => Token::Destination,
            other => return Err(MapDecodeError::UnknownToken { cell, token: other }),
        };
        Ok(decoded)
    }

    /// Roads and lights can be driven through; destinations only entered
    pub fn is_drivable(self) -> bool {
        matches!(self, Token::Road(_) | Token::Light { .. })
    }
}

/// Rectangular token grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTokens {
    width: i32,
    height: i32,
    /// Indexed `[y][x]`, bottom row first
    rows: Vec<Vec<char>>,
}

impl MapTokens {
    /// Parse map text. Line terminators are stripped, the width is the longest
    /// row and shorter rows are padded with obstacles.
    pub fn parse(text: &str) -> Result<Self, MapDecodeError> {
        let rows: Vec<Vec<char>> = text
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().collect())
            .collect();
        Self::from_rows(rows)
    }

    /// Build from rows given top row first
    pub fn from_rows(mut rows: Vec<Vec<char>>) -> Result<Self, MapDecodeError> {
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return Err(MapDecodeError::EmptyMap);
        }

        for row in &mut rows {
            row.resize(width, OBSTACLE_TOKEN);
        }
        rows.reverse();

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            rows,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// Raw character at a cell, `None` outside the map
    pub fn char_at(&self, cell: Cell) -> Option<char> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some(self.rows[cell.y as usize][cell.x as usize])
    }

    /// Decoded token at a cell, `Ok(None)` outside the map
    pub fn token_at(&self, cell: Cell) -> Result<Option<Token>, MapDecodeError> {
        self.char_at(cell)
            .map(|token| Token::decode(cell, token))
            .transpose()
    }

    /// Every cell in text order: top row first, left to right
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height)
            .rev()
            .flat_map(move |y| (0..self.width).map(move |x| Cell::new(x, y)))
    }

    /// Every cell with its decoded token, failing on the first unknown one
    pub fn decoded(&self) -> Result<Vec<(Cell, Token)>, MapDecodeError> {
        self.cells()
            .map(|cell| {
                let token = self.rows[cell.y as usize][cell.x as usize];
                Token::decode(cell, token).map(|token| (cell, token))
            })
            .collect()
    }
}
