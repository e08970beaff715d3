use thiserror::Error;

use super::face::{dot, Face};
use super::moves::{Move, Turn};

/// Largest supported edge length.
pub const MAX_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CubeError {
    #[error("cube size must be between 1 and 10, got {0}")]
    InvalidSize(usize),
    #[error("move {mv} turns {depth} layers but the cube only has {size}")]
    InvalidDepth { mv: String, depth: usize, size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sticker {
    /// Face this sticker belongs to when solved, i.e. its colour.
    pub colour: Face,
    pub normal: [i32; 3],
}

/// One cubie. Positions use doubled coordinates so every centre is an
/// integer: each component lies in `-(n-1)..=(n-1)` in steps of two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub position: [i32; 3],
    pub stickers: Vec<Sticker>,
}

impl Piece {
    fn rotate(&mut self, mv: &Move) {
        let axis = mv.turn.axis();
        let turns = mv.signed_quarters();
        self.position = axis.quarter_turn(self.position, turns);
        for sticker in &mut self.stickers {
            sticker.normal = axis.quarter_turn(sticker.normal, turns);
        }
    }

    pub fn sticker_facing(&self, normal: [i32; 3]) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.normal == normal)
    }
}

#[derive(Debug, Clone)]
pub struct Cube {
    size: usize,
    pieces: Vec<Piece>,
    history: Vec<Move>,
}

impl Cube {
    pub fn new(size: usize) -> Result<Self, CubeError> {
        if size == 0 || size > MAX_SIZE {
            return Err(CubeError::InvalidSize(size));
        }

        Ok(Self {
            size,
            pieces: solved_pieces(size),
            history: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Indices of the pieces `mv` turns.
    pub fn layer_members(&self, mv: &Move) -> Result<Vec<usize>, CubeError> {
        self.check(mv)?;
        Ok(self
            .pieces
            .iter()
            .enumerate()
            .filter(|(_, piece)| in_layer(self.size, piece.position, mv))
            .map(|(i, _)| i)
            .collect())
    }

    pub fn apply(&mut self, mv: Move) -> Result<(), CubeError> {
        self.turn(&mv)?;
        self.history.push(mv);
        Ok(())
    }

    pub fn apply_sequence(&mut self, moves: &[Move]) -> Result<(), CubeError> {
        for mv in moves {
            self.apply(*mv)?;
        }
        Ok(())
    }

    /// Reverts the last move and returns it.
    pub fn undo(&mut self) -> Option<Move> {
        let mv = self.history.pop()?;
        self.turn(&mv.inverse()).ok()?;
        Some(mv)
    }

    pub fn reset(&mut self) {
        self.pieces = solved_pieces(self.size);
        self.history.clear();
    }

    /// Every outward direction shows a single colour. Whole-cube
    /// rotations do not unsolve a cube.
    pub fn is_solved(&self) -> bool {
        Face::ALL.iter().all(|face| {
            let normal = face.normal();
            let mut colours = self
                .pieces
                .iter()
                .filter_map(|piece| piece.sticker_facing(normal))
                .map(|sticker| sticker.colour);
            match colours.next() {
                Some(first) => colours.all(|c| c == first),
                None => true,
            }
        })
    }

    /// Facelet string in `URFDLB` face order, each face row by row.
    pub fn facelets(&self) -> String {
        let n = self.size as i32;
        let mut out = String::with_capacity(6 * self.size * self.size);

        for face in Face::ALL {
            let normal = face.normal();
            let (right, down) = face.frame();
            let mut grid = vec!['?'; self.size * self.size];

            for piece in &self.pieces {
                if let Some(sticker) = piece.sticker_facing(normal) {
                    let col = (dot(piece.position, right) + n - 1) / 2;
                    let row = (dot(piece.position, down) + n - 1) / 2;
                    grid[(row * n + col) as usize] = sticker.colour.letter();
                }
            }
            out.extend(grid);
        }

        out
    }

    fn check(&self, mv: &Move) -> Result<(), CubeError> {
        if let Turn::Face(_) = mv.turn {
            if mv.depth == 0 || mv.depth > self.size {
                return Err(CubeError::InvalidDepth {
                    mv: mv.to_string(),
                    depth: mv.depth,
                    size: self.size,
                });
            }
        }
        Ok(())
    }

    fn turn(&mut self, mv: &Move) -> Result<(), CubeError> {
        self.check(mv)?;
        let size = self.size;
        for piece in &mut self.pieces {
            if in_layer(size, piece.position, mv) {
                piece.rotate(mv);
            }
        }
        log::debug!("turned {}", mv);
        Ok(())
    }
}

/// Layers are counted from the turned face, the outermost being 0.
fn in_layer(size: usize, position: [i32; 3], mv: &Move) -> bool {
    match mv.turn {
        Turn::Rotation(_) => true,
        Turn::Face(face) => {
            let coord = position[face.axis().index()];
            let layer = ((size as i32 - 1) - face.sign() * coord) / 2;
            (layer as usize) < mv.depth
        }
    }
}

fn solved_pieces(size: usize) -> Vec<Piece> {
    let edge = size as i32 - 1;
    let coords: Vec<i32> = (0..size as i32).map(|i| 2 * i - edge).collect();
    let mut pieces = Vec::new();

    for &x in &coords {
        for &y in &coords {
            for &z in &coords {
                let position = [x, y, z];
                let stickers: Vec<Sticker> = Face::ALL
                    .iter()
                    .filter(|face| position[face.axis().index()] * face.sign() == edge)
                    .map(|&face| Sticker {
                        colour: face,
                        normal: face.normal(),
                    })
                    .collect();

                if !stickers.is_empty() {
                    pieces.push(Piece { position, stickers });
                }
            }
        }
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::moves::parse_sequence;
    use crate::cube::face::Axis;

    fn solved_string(n: usize) -> String {
        Face::ALL
            .iter()
            .flat_map(|f| std::iter::repeat(f.letter()).take(n * n))
            .collect()
    }

    fn run(cube: &mut Cube, alg: &str) {
        cube.apply_sequence(&parse_sequence(alg).unwrap()).unwrap();
    }

    #[test]
    fn solved_cube_has_surface_pieces_only() {
        for n in 1..=MAX_SIZE {
            let cube = Cube::new(n).unwrap();
            let inner = n.saturating_sub(2);
            assert_eq!(cube.pieces().len(), n.pow(3) - inner.pow(3), "size {}", n);
            let stickers: usize = cube.pieces().iter().map(|p| p.stickers.len()).sum();
            assert_eq!(stickers, 6 * n * n);
            assert!(cube.is_solved());
            assert_eq!(cube.facelets(), solved_string(n));
        }
    }

    #[test]
    fn rejects_bad_sizes_and_depths() {
        assert_eq!(Cube::new(0).unwrap_err(), CubeError::InvalidSize(0));
        assert!(Cube::new(MAX_SIZE + 1).is_err());

        let mut cube = Cube::new(3).unwrap();
        let err = cube.apply("4Rw".parse().unwrap()).unwrap_err();
        assert!(matches!(err, CubeError::InvalidDepth { depth: 4, size: 3, .. }));
        assert!(cube.history().is_empty());
    }

    #[test]
    fn u_turn_cycles_top_rows() {
        let mut cube = Cube::new(3).unwrap();
        run(&mut cube, "U");
        assert_eq!(
            cube.facelets(),
            "UUUUUUUUU\
             BBBRRRRRR\
             RRRFFFFFF\
             DDDDDDDDD\
             FFFLLLLLL\
             LLLBBBBBB"
        );
    }

    #[test]
    fn r_turn_cycles_right_columns() {
        let mut cube = Cube::new(3).unwrap();
        run(&mut cube, "R");
        assert_eq!(
            cube.facelets(),
            "UUFUUFUUF\
             RRRRRRRRR\
             FFDFFDFFD\
             DDBDDBDDB\
             LLLLLLLLL\
             UBBUBBUBB"
        );
    }

    #[test]
    fn f_turn_cycles_around_front() {
        let mut cube = Cube::new(3).unwrap();
        run(&mut cube, "F");
        assert_eq!(
            cube.facelets(),
            "UUUUUULLL\
             URRURRURR\
             FFFFFFFFF\
             RRRDDDDDD\
             LLDLLDLLD\
             BBBBBBBBB"
        );
    }

    #[test]
    fn quarter_turn_has_order_four() {
        for alg in ["R", "U", "F", "D", "L", "B", "Rw", "x", "y", "z"] {
            let mut cube = Cube::new(3).unwrap();
            for _ in 0..4 {
                run(&mut cube, alg);
            }
            assert_eq!(cube.facelets(), solved_string(3), "{}", alg);
        }
    }

    #[test]
    fn sexy_move_has_order_six() {
        let mut cube = Cube::new(3).unwrap();
        for i in 0..6 {
            run(&mut cube, "R U R' U'");
            assert_eq!(cube.is_solved(), i == 5);
        }
    }

    #[test]
    fn even_cubes_obey_the_same_identities() {
        for n in [2, 4] {
            let mut cube = Cube::new(n).unwrap();
            for _ in 0..4 {
                run(&mut cube, "R");
            }
            assert!(cube.is_solved());
            run(&mut cube, "R U2 F' Rw D");
            assert!(!cube.is_solved());
            run(&mut cube, "D' Rw' F U2 R'");
            assert_eq!(cube.facelets(), solved_string(n));
            run(&mut cube, "Rw U2 Rw'");
            assert!(!cube.is_solved());
            run(&mut cube, "Rw U2 Rw'");
            assert!(cube.is_solved());
        }
    }

    #[test]
    fn rotations_keep_cube_solved() {
        let mut cube = Cube::new(3).unwrap();
        run(&mut cube, "x y' z2");
        assert!(cube.is_solved());
        assert_ne!(cube.facelets(), solved_string(3));
    }

    #[test]
    fn rotation_equals_all_layers() {
        let mut a = Cube::new(4).unwrap();
        let mut b = Cube::new(4).unwrap();
        a.apply(Move::rotation(Axis::X, 1)).unwrap();
        b.apply(Move::wide(Face::R, 1, 4)).unwrap();
        assert_eq!(a.facelets(), b.facelets());

        let mut c = Cube::new(4).unwrap();
        c.apply(Move::wide(Face::L, 3, 4)).unwrap();
        assert_eq!(a.facelets(), c.facelets());
    }

    #[test]
    fn wide_moves_turn_requested_layers() {
        let cube = Cube::new(5).unwrap();
        // layer sizes on a 5x5: outer 25 pieces, inner slices 16
        assert_eq!(cube.layer_members(&Move::face(Face::U, 1)).unwrap().len(), 25);
        assert_eq!(cube.layer_members(&Move::wide(Face::U, 1, 2)).unwrap().len(), 41);
        assert_eq!(cube.layer_members(&Move::wide(Face::U, 1, 5)).unwrap().len(), 98);
        assert_eq!(cube.layer_members(&Move::rotation(Axis::Y, 1)).unwrap().len(), 98);
    }

    #[test]
    fn undo_and_reset_restore_state() {
        let mut cube = Cube::new(3).unwrap();
        run(&mut cube, "R U F' L2");
        assert_eq!(cube.history().len(), 4);

        assert_eq!(cube.undo(), Some("L2".parse().unwrap()));
        assert_eq!(cube.undo(), Some("F'".parse().unwrap()));
        run(&mut cube, "U' R'");
        assert_eq!(cube.history().len(), 4);
        assert_eq!(cube.facelets(), solved_string(3));

        run(&mut cube, "B D");
        cube.reset();
        assert!(cube.is_solved());
        assert!(cube.history().is_empty());
        assert_eq!(cube.undo(), None);
    }

    #[test]
    fn move_then_inverse_is_identity() {
        let alg = parse_sequence("R U2 Fw' x D L' 2B z2").unwrap();
        let mut cube = Cube::new(4).unwrap();
        cube.apply_sequence(&alg).unwrap();
        cube.apply_sequence(&crate::cube::moves::invert_sequence(&alg)).unwrap();
        assert_eq!(cube.facelets(), solved_string(4));
    }
}
