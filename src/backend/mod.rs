//! Cube state providers.
//!
//! The viewer only needs something it can send moves to and pull a
//! triangle list from each frame. The built-in backend does everything
//! in-process; the native one forwards to a dynamic library.

mod builtin;
#[cfg(feature = "native")]
mod native;

pub use builtin::BuiltinBackend;
#[cfg(feature = "native")]
pub use native::NativeBackend;

use std::time::Duration;

use thiserror::Error;

use crate::config::{BackendKind, Config};
use crate::cube::{CubeError, Move};
use crate::entities::Vertex;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Cube(#[from] CubeError),
    #[error("native backend support was not compiled in (enable the `native` feature)")]
    NativeUnavailable,
    #[cfg(feature = "native")]
    #[error("failed to load cube library {path}")]
    Load {
        path: String,
        #[source]
        source: libloading::Error,
    },
    #[cfg(feature = "native")]
    #[error("cube library has no symbol `{name}`")]
    MissingSymbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[cfg(feature = "native")]
    #[error("cube library returned a null cube handle")]
    NullHandle,
    #[cfg(feature = "native")]
    #[error("cube library rejected move {mv} (code {code})")]
    Rejected { mv: String, code: i32 },
}

pub trait CubeBackend {
    fn name(&self) -> &'static str;

    fn size(&self) -> usize;

    /// Schedules a move. It is validated now and shown animated.
    fn queue(&mut self, mv: Move) -> Result<(), BackendError>;

    /// Applies moves straight away, skipping the animation.
    fn apply_now(&mut self, moves: &[Move]) -> Result<(), BackendError>;

    fn update(&mut self, dt: Duration);

    /// Triangle list for the current frame.
    fn vertices(&mut self) -> Vec<Vertex>;

    fn reset(&mut self);

    fn undo(&mut self) -> Option<Move>;

    /// Applies a random scramble at once and returns it.
    fn scramble(&mut self, length: usize, seed: u64) -> Result<Vec<Move>, BackendError>;

    fn facelets(&self) -> String;

    fn is_solved(&self) -> bool;

    fn history(&self) -> Vec<Move>;

    fn is_idle(&self) -> bool;
}

/// Builds the backend asked for on the command line. A native backend
/// that fails to load falls back to the built-in one.
pub fn open(config: &Config, seed: u64) -> Result<Box<dyn CubeBackend>, BackendError> {
    let turn_duration = Duration::from_millis(config.turn_ms);

    if config.backend == BackendKind::Native {
        match open_native(config, seed) {
            Ok(backend) => return Ok(backend),
            Err(err) => log::warn!("native backend unavailable, using built-in cube: {}", err),
        }
    }

    Ok(Box::new(BuiltinBackend::new(config.size(), turn_duration)?))
}

#[cfg(feature = "native")]
fn open_native(config: &Config, seed: u64) -> Result<Box<dyn CubeBackend>, BackendError> {
    let path = config
        .library
        .clone()
        .unwrap_or_else(|| libloading::library_filename("Rubik").into());
    let backend = NativeBackend::load(&path, config.size(), seed)?;
    log::info!("loaded native cube library {}", path.display());
    Ok(Box::new(backend))
}

#[cfg(not(feature = "native"))]
fn open_native(_config: &Config, _seed: u64) -> Result<Box<dyn CubeBackend>, BackendError> {
    Err(BackendError::NativeUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn opens_builtin_by_default() {
        let config = Config::parse_from(["rubik-cube", "--size", "4"]);
        let backend = open(&config, 1).unwrap();
        assert_eq!(backend.name(), "builtin");
        assert_eq!(backend.size(), 4);
    }

    #[cfg(not(feature = "native"))]
    #[test]
    fn native_request_falls_back() {
        let config = Config::parse_from(["rubik-cube", "--backend", "native"]);
        let backend = open(&config, 1).unwrap();
        assert_eq!(backend.name(), "builtin");
    }

    #[cfg(feature = "native")]
    #[test]
    fn missing_library_falls_back() {
        let config = Config::parse_from([
            "rubik-cube",
            "--backend",
            "native",
            "--library",
            "/nonexistent/libRubik.so",
        ]);
        let backend = open(&config, 1).unwrap();
        assert_eq!(backend.name(), "builtin");
    }

    #[test]
    fn bad_size_is_an_error() {
        let err = BuiltinBackend::new(11, Duration::ZERO).err().unwrap();
        assert!(matches!(err, BackendError::Cube(CubeError::InvalidSize(11))));
    }
}
