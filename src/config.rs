use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::cube::{parse_sequence, Move, ParseMoveError, MAX_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// In-process cube model.
    Builtin,
    /// Dynamic library exporting createCube/makeMove/getVertexData.
    Native,
}

/// Interactive Rubik's Cube viewer.
#[derive(Debug, Clone, Parser)]
#[command(name = "rubik-cube", version)]
pub struct Config {
    /// Edge length of the cube.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..=MAX_SIZE as u64))]
    size: u64,

    /// Seed for scrambles; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of random moves applied at startup.
    #[arg(long, default_value_t = 0)]
    pub scramble: usize,

    /// Moves applied at startup, e.g. "R U R' U'".
    #[arg(long)]
    pub moves: Option<String>,

    /// Duration of one quarter turn in milliseconds.
    #[arg(long = "turn-ms", default_value_t = 200)]
    pub turn_ms: u64,

    #[arg(long, value_enum, default_value_t = BackendKind::Builtin)]
    pub backend: BackendKind,

    /// Path of the native cube library.
    #[arg(long)]
    pub library: Option<PathBuf>,

    #[arg(long, default_value_t = 960, value_parser = clap::value_parser!(u32).range(64..))]
    pub width: u32,

    #[arg(long, default_value_t = 540, value_parser = clap::value_parser!(u32).range(64..))]
    pub height: u32,
}

impl Config {
    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn initial_moves(&self) -> Result<Vec<Move>, ParseMoveError> {
        match &self.moves {
            Some(text) => parse_sequence(text),
            None => Ok(Vec::new()),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
