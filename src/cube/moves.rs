use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::face::{Axis, Face};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoveError {
    #[error("empty move")]
    Empty,
    #[error("unknown face or rotation in move `{0}`")]
    UnknownTurn(String),
    #[error("invalid turn amount in move `{0}`")]
    InvalidAmount(String),
    #[error("invalid layer depth in move `{0}`")]
    InvalidDepth(String),
}

/// What a move rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    /// The outer layers of one face.
    Face(Face),
    /// The whole cube.
    Rotation(Axis),
}

impl Turn {
    pub fn axis(self) -> Axis {
        match self {
            Turn::Face(face) => face.axis(),
            Turn::Rotation(axis) => axis,
        }
    }

    /// Right-handed quarter turns about the positive axis for one
    /// clockwise quarter turn of this move.
    pub(crate) fn handedness(self) -> i32 {
        match self {
            Turn::Face(face) => -face.sign(),
            // x follows R, y follows U, z follows F
            Turn::Rotation(_) => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub turn: Turn,
    /// Clockwise quarter turns, `1..=3`.
    pub quarter_turns: u8,
    /// Layers turned counting from the face, `>= 1`. Ignored by rotations.
    pub depth: usize,
}

impl Move {
    pub fn face(face: Face, quarter_turns: u8) -> Self {
        Self::wide(face, quarter_turns, 1)
    }

    pub fn wide(face: Face, quarter_turns: u8, depth: usize) -> Self {
        Self {
            turn: Turn::Face(face),
            quarter_turns: quarter_turns.clamp(1, 3),
            depth: depth.max(1),
        }
    }

    pub fn rotation(axis: Axis, quarter_turns: u8) -> Self {
        Self {
            turn: Turn::Rotation(axis),
            quarter_turns: quarter_turns.clamp(1, 3),
            depth: 1,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            quarter_turns: 4 - self.quarter_turns.clamp(1, 3),
            ..*self
        }
    }

    /// Signed right-handed quarter turns about the positive move axis.
    pub fn signed_quarters(&self) -> i32 {
        let q = if self.quarter_turns == 3 { -1 } else { self.quarter_turns as i32 };
        q * self.turn.handedness()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.quarter_turns {
            2 => "2",
            3 => "'",
            _ => "",
        };
        match self.turn {
            Turn::Rotation(axis) => write!(f, "{}{}", axis.letter(), suffix),
            Turn::Face(face) => match self.depth {
                1 => write!(f, "{}{}", face, suffix),
                2 => write!(f, "{}w{}", face, suffix),
                depth => write!(f, "{}{}w{}", depth, face, suffix),
            },
        }
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParseMoveError::Empty);
        }

        let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
        let rest = &token[digits.len()..];

        let mut chars = rest.chars();
        let letter = chars
            .next()
            .ok_or_else(|| ParseMoveError::UnknownTurn(token.to_string()))?;
        let mut rest = chars.as_str();

        let (turn, mut wide) = match letter {
            'x' => (Turn::Rotation(Axis::X), false),
            'y' => (Turn::Rotation(Axis::Y), false),
            'z' => (Turn::Rotation(Axis::Z), false),
            c => match Face::from_char(c.to_ascii_uppercase()) {
                Some(face) => (Turn::Face(face), c.is_ascii_lowercase()),
                None => return Err(ParseMoveError::UnknownTurn(token.to_string())),
            },
        };

        if let Some(stripped) = rest.strip_prefix('w') {
            if matches!(turn, Turn::Rotation(_)) {
                return Err(ParseMoveError::UnknownTurn(token.to_string()));
            }
            wide = true;
            rest = stripped;
        }

        let quarter_turns = match rest {
            "" => 1,
            "'" | "3" => 3,
            "2" | "2'" => 2,
            "1" => 1,
            _ => return Err(ParseMoveError::InvalidAmount(token.to_string())),
        };

        let depth = if digits.is_empty() {
            if wide { 2 } else { 1 }
        } else {
            if matches!(turn, Turn::Rotation(_)) {
                return Err(ParseMoveError::InvalidDepth(token.to_string()));
            }
            match digits.parse::<usize>() {
                Ok(d) if d >= 1 => d,
                _ => return Err(ParseMoveError::InvalidDepth(token.to_string())),
            }
        };

        Ok(Move {
            turn,
            quarter_turns,
            depth,
        })
    }
}

pub fn parse_sequence(text: &str) -> Result<Vec<Move>, ParseMoveError> {
    text.split_whitespace().map(str::parse).collect()
}

pub fn format_sequence(moves: &[Move]) -> String {
    moves
        .iter()
        .map(Move::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn invert_sequence(moves: &[Move]) -> Vec<Move> {
    moves.iter().rev().map(Move::inverse).collect()
}
