use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use super::face::Axis;
use super::moves::Move;
use super::state::Cube;

/// Ten steps of twenty milliseconds per quarter turn.
pub const DEFAULT_TURN_DURATION: Duration = Duration::from_millis(200);

/// Snapshot of the move being animated.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnFrame {
    pub mv: Move,
    pub axis: Axis,
    /// Right-handed angle about the positive axis, in radians.
    pub angle: f32,
    /// Indices into `Cube::pieces` that are turning.
    pub pieces: Vec<usize>,
}

#[derive(Debug)]
struct InFlight {
    mv: Move,
    pieces: Vec<usize>,
    elapsed: f32,
    duration: f32,
}

impl InFlight {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Plays queued moves one after another, committing each to the cube
/// once its turn has finished.
#[derive(Debug)]
pub struct Animator {
    turn_duration: Duration,
    queue: VecDeque<Move>,
    current: Option<InFlight>,
}

impl Animator {
    pub fn new(turn_duration: Duration) -> Self {
        Self {
            turn_duration,
            queue: VecDeque::new(),
            current: None,
        }
    }

    pub fn push(&mut self, mv: Move) {
        self.queue.push_back(mv);
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
    }

    /// Advances the animation by `dt`, committing finished moves.
    /// Returns how many moves were committed.
    pub fn update(&mut self, cube: &mut Cube, dt: Duration) -> usize {
        let mut budget = dt.as_secs_f32();
        let mut committed = 0;

        loop {
            if self.current.is_none() && !self.start_next(cube) {
                break;
            }
            let Some(flight) = self.current.as_mut() else {
                break;
            };

            let remaining = flight.duration - flight.elapsed;
            if budget < remaining {
                flight.elapsed += budget;
                break;
            }

            budget -= remaining.max(0.0);
            let mv = flight.mv;
            self.current = None;
            match cube.apply(mv) {
                Ok(()) => committed += 1,
                Err(err) => log::warn!("dropping move {}: {}", mv, err),
            }
        }

        committed
    }

    /// Applies every pending move at once.
    pub fn finish_all(&mut self, cube: &mut Cube) -> usize {
        let mut moves: Vec<Move> = self.current.take().map(|f| f.mv).into_iter().collect();
        moves.extend(self.queue.drain(..));

        moves
            .into_iter()
            .filter(|mv| match cube.apply(*mv) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("dropping move {}: {}", mv, err);
                    false
                }
            })
            .count()
    }

    pub fn current(&self) -> Option<TurnFrame> {
        self.current.as_ref().map(|flight| TurnFrame {
            mv: flight.mv,
            axis: flight.mv.turn.axis(),
            angle: smoothstep(flight.progress()) * FRAC_PI_2 * flight.mv.signed_quarters() as f32,
            pieces: flight.pieces.clone(),
        })
    }

    fn start_next(&mut self, cube: &Cube) -> bool {
        while let Some(mv) = self.queue.pop_front() {
            match cube.layer_members(&mv) {
                Ok(pieces) => {
                    let mut duration = self.turn_duration.as_secs_f32();
                    if mv.quarter_turns == 2 {
                        duration *= 1.5;
                    }
                    self.current = Some(InFlight {
                        mv,
                        pieces,
                        elapsed: 0.0,
                        duration,
                    });
                    return true;
                }
                Err(err) => log::warn!("dropping move {}: {}", mv, err),
            }
        }
        false
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_DURATION)
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}
