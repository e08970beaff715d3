use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::face::Face;
use super::moves::Move;

/// Random face turns, reproducible for a given seed. Consecutive moves
/// never share an axis so nothing cancels or merges.
pub fn scramble(size: usize, length: usize, seed: u64) -> Vec<Move> {
    let mut rng = StdRng::seed_from_u64(seed);
    let max_depth = (size / 2).max(1);
    let mut moves: Vec<Move> = Vec::with_capacity(length);

    while moves.len() < length {
        let face = Face::ALL[rng.gen_range(0..Face::ALL.len())];
        if let Some(last) = moves.last() {
            if last.turn.axis() == face.axis() {
                continue;
            }
        }

        let quarter_turns = rng.gen_range(1..=3);
        let depth = rng.gen_range(1..=max_depth);
        moves.push(Move::wide(face, quarter_turns, depth));
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::Cube;

    #[test]
    fn same_seed_same_scramble() {
        assert_eq!(scramble(3, 25, 7), scramble(3, 25, 7));
        assert_ne!(scramble(3, 25, 7), scramble(3, 25, 8));
        assert!(scramble(3, 0, 7).is_empty());
    }

    #[test]
    fn never_repeats_an_axis() {
        let moves = scramble(3, 200, 42);
        assert_eq!(moves.len(), 200);
        for pair in moves.windows(2) {
            assert_ne!(pair[0].turn.axis(), pair[1].turn.axis());
        }
    }

    #[test]
    fn depths_fit_the_cube() {
        for size in 1..=6 {
            let mut cube = Cube::new(size).unwrap();
            let moves = scramble(size, 50, size as u64);
            assert!(moves.iter().all(|m| m.depth <= (size / 2).max(1)));
            cube.apply_sequence(&moves).unwrap();
        }
    }

    #[test]
    fn scrambles_a_three_by_three() {
        let mut cube = Cube::new(3).unwrap();
        cube.apply_sequence(&scramble(3, 25, 1)).unwrap();
        assert!(!cube.is_solved());
    }
}
