use std::time::Duration;

use super::{BackendError, CubeBackend};
use crate::cube::{scramble, Animator, Cube, Move};
use crate::entities::{CubeMesh, Vertex};

/// In-process cube: state machine, turn animation and mesh.
pub struct BuiltinBackend {
    cube: Cube,
    animator: Animator,
}

impl BuiltinBackend {
    pub fn new(size: usize, turn_duration: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            cube: Cube::new(size)?,
            animator: Animator::new(turn_duration),
        })
    }

}

impl CubeBackend for BuiltinBackend {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn size(&self) -> usize {
        self.cube.size()
    }

    fn queue(&mut self, mv: Move) -> Result<(), BackendError> {
        self.cube.layer_members(&mv)?;
        self.animator.push(mv);
        Ok(())
    }

    fn apply_now(&mut self, moves: &[Move]) -> Result<(), BackendError> {
        self.animator.finish_all(&mut self.cube);
        self.cube.apply_sequence(moves)?;
        Ok(())
    }

    fn update(&mut self, dt: Duration) {
        self.animator.update(&mut self.cube, dt);
    }

    fn vertices(&mut self) -> Vec<Vertex> {
        let frame = self.animator.current();
        CubeMesh::build(&self.cube, frame.as_ref()).into_vertices()
    }

    fn reset(&mut self) {
        self.animator.clear();
        self.cube.reset();
    }

    fn undo(&mut self) -> Option<Move> {
        self.animator.finish_all(&mut self.cube);
        self.cube.undo()
    }

    fn scramble(&mut self, length: usize, seed: u64) -> Result<Vec<Move>, BackendError> {
        let moves = scramble(self.cube.size(), length, seed);
        self.apply_now(&moves)?;
        Ok(moves)
    }

    fn facelets(&self) -> String {
        self.cube.facelets()
    }

    fn is_solved(&self) -> bool {
        self.cube.is_solved()
    }

    fn history(&self) -> Vec<Move> {
        self.cube.history().to_vec()
    }

    fn is_idle(&self) -> bool {
        self.animator.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{parse_sequence, Face};
    use crate::entities::vertex_capacity;

    fn backend() -> BuiltinBackend {
        BuiltinBackend::new(3, Duration::from_millis(100)).unwrap()
    }

    #[test]
    fn queued_moves_land_after_update() {
        let mut backend = backend();
        backend.queue(Move::face(Face::R, 1)).unwrap();
        assert!(backend.is_solved());
        assert!(!backend.is_idle());

        backend.update(Duration::from_millis(100));
        assert!(backend.is_idle());
        assert!(!backend.is_solved());
        assert_eq!(backend.history(), vec![Move::face(Face::R, 1)]);
    }

    #[test]
    fn rejects_too_deep_moves_up_front() {
        let mut backend = backend();
        let err = backend.queue(Move::wide(Face::U, 1, 4)).unwrap_err();
        assert!(matches!(err, BackendError::Cube(_)));
        assert!(backend.is_idle());
    }

    #[test]
    fn undo_finishes_animation_first() {
        let mut backend = backend();
        backend.queue(Move::face(Face::F, 1)).unwrap();
        backend.queue(Move::face(Face::U, 1)).unwrap();
        backend.update(Duration::from_millis(30));

        assert_eq!(backend.undo(), Some(Move::face(Face::U, 1)));
        assert_eq!(backend.history(), vec![Move::face(Face::F, 1)]);
        assert_eq!(backend.undo(), Some(Move::face(Face::F, 1)));
        assert!(backend.is_solved());
    }

    #[test]
    fn scramble_then_reset() {
        let mut backend = backend();
        let moves = backend.scramble(20, 99).unwrap();
        assert_eq!(moves.len(), 20);
        assert_eq!(backend.history(), moves);
        assert!(!backend.is_solved());

        backend.reset();
        assert!(backend.is_solved());
        assert!(backend.history().is_empty());
    }

    #[test]
    fn vertices_have_fixed_count_while_turning() {
        let mut backend = backend();
        for mv in parse_sequence("R U2 x").unwrap() {
            backend.queue(mv).unwrap();
        }
        for _ in 0..20 {
            backend.update(Duration::from_millis(25));
            assert_eq!(backend.vertices().len(), vertex_capacity(3));
        }
    }

    #[test]
    fn apply_now_skips_animation() {
        let mut backend = backend();
        backend.apply_now(&parse_sequence("R U R' U'").unwrap()).unwrap();
        assert!(backend.is_idle());
        assert_eq!(backend.history().len(), 4);
        assert_eq!(backend.facelets().len(), 54);
    }
}
