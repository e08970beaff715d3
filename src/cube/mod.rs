mod animation;
mod face;
mod moves;
mod scramble;
mod state;

pub use animation::{Animator, TurnFrame, DEFAULT_TURN_DURATION};
pub use face::{Axis, Face};
pub use moves::{format_sequence, invert_sequence, parse_sequence, Move, ParseMoveError, Turn};
pub use scramble::scramble;
pub use state::{Cube, CubeError, Piece, Sticker, MAX_SIZE};
