use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    /// Rotates `v` by `turns` right-handed quarter turns about this axis.
    /// Negative counts turn the other way.
    pub fn quarter_turn(self, v: [i32; 3], turns: i32) -> [i32; 3] {
        let [x, y, z] = v;
        let once = |[x, y, z]: [i32; 3]| match self {
            Axis::X => [x, -z, y],
            Axis::Y => [z, y, -x],
            Axis::Z => [-y, x, z],
        };

        match turns.rem_euclid(4) {
            0 => [x, y, z],
            1 => once(v),
            2 => once(once(v)),
            _ => once(once(once(v))),
        }
    }
}

/// The six faces, declared in the `URFDLB` order used for facelet strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    U,
    R,
    F,
    D,
    L,
    B,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::U, Face::R, Face::F, Face::D, Face::L, Face::B];

    pub fn axis(self) -> Axis {
        match self {
            Face::R | Face::L => Axis::X,
            Face::U | Face::D => Axis::Y,
            Face::F | Face::B => Axis::Z,
        }
    }

    /// `1` when the face looks down the positive half of its axis.
    pub fn sign(self) -> i32 {
        match self {
            Face::R | Face::U | Face::F => 1,
            Face::L | Face::D | Face::B => -1,
        }
    }

    pub fn normal(self) -> [i32; 3] {
        let mut n = [0; 3];
        n[self.axis().index()] = self.sign();
        n
    }

    pub fn letter(self) -> char {
        match self {
            Face::U => 'U',
            Face::R => 'R',
            Face::F => 'F',
            Face::D => 'D',
            Face::L => 'L',
            Face::B => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Face> {
        match c {
            'U' => Some(Face::U),
            'R' => Some(Face::R),
            'F' => Some(Face::F),
            'D' => Some(Face::D),
            'L' => Some(Face::L),
            'B' => Some(Face::B),
            _ => None,
        }
    }

    /// Sticker colour of this face on a solved cube (Western scheme).
    pub fn colour(self) -> [f32; 3] {
        match self {
            Face::U => [1.0, 1.0, 1.0],
            Face::D => [1.0, 0.85, 0.0],
            Face::F => [0.0, 0.62, 0.28],
            Face::B => [0.0, 0.27, 0.68],
            Face::R => [0.72, 0.07, 0.2],
            Face::L => [1.0, 0.35, 0.0],
        }
    }

    /// Screen-right and screen-down directions when looking straight at the face.
    /// `U` is seen from above with `F` at the bottom, `D` from below with `F` at the top.
    pub(crate) fn frame(self) -> ([i32; 3], [i32; 3]) {
        match self {
            Face::U => ([1, 0, 0], [0, 0, 1]),
            Face::D => ([1, 0, 0], [0, 0, -1]),
            Face::F => ([1, 0, 0], [0, -1, 0]),
            Face::B => ([-1, 0, 0], [0, -1, 0]),
            Face::R => ([0, 0, -1], [0, -1, 0]),
            Face::L => ([0, 0, 1], [0, -1, 0]),
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

pub(crate) fn dot(a: [i32; 3], b: [i32; 3]) -> i32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turns_follow_right_hand_rule() {
        assert_eq!(Axis::X.quarter_turn([0, 1, 0], 1), [0, 0, 1]);
        assert_eq!(Axis::Y.quarter_turn([0, 0, 1], 1), [1, 0, 0]);
        assert_eq!(Axis::Z.quarter_turn([1, 0, 0], 1), [0, 1, 0]);
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let v = [3, -1, 2];
        for axis in Axis::ALL {
            assert_eq!(axis.quarter_turn(v, 4), v);
            assert_eq!(axis.quarter_turn(axis.quarter_turn(v, 1), -1), v);
            assert_eq!(axis.quarter_turn(v, 3), axis.quarter_turn(v, -1));
        }
    }

    #[test]
    fn frames_are_right_handed_towards_viewer() {
        // right x down points into the face, i.e. against its normal
        for face in Face::ALL {
            let (r, d) = face.frame();
            let cross = [
                r[1] * d[2] - r[2] * d[1],
                r[2] * d[0] - r[0] * d[2],
                r[0] * d[1] - r[1] * d[0],
            ];
            let n = face.normal();
            assert_eq!(cross, [-n[0], -n[1], -n[2]], "{}", face);
        }
    }

    #[test]
    fn normals_round_trip() {
        for face in Face::ALL {
            assert_eq!(Face::from_char(face.letter()), Some(face));
            let n = face.normal();
            assert_eq!(n[face.axis().index()], face.sign());
            assert_eq!(n.iter().map(|c| c.abs()).sum::<i32>(), 1);
        }
    }
}
