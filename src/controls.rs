use winit::event::{ElementState, KeyboardInput, ModifiersState, VirtualKeyCode, WindowEvent};

use crate::cube::{Axis, Face, Move};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Turn(Move),
    Scramble,
    Reset,
    Undo,
    PrintState,
    Quit,
}

/// Turns key presses into cube commands.
///
/// Face keys turn that face clockwise, or counter-clockwise with `Shift`.
/// A digit pressed first sets how many layers the next face turn takes.
#[derive(Debug, Default)]
pub struct Controls {
    modifiers: ModifiersState,
    depth: Option<usize>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Option<Command> {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = *modifiers;
                None
            }
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } => self.key_pressed(*key, self.modifiers),
            _ => None,
        }
    }

    pub fn key_pressed(&mut self, key: VirtualKeyCode, modifiers: ModifiersState) -> Option<Command> {
        let quarter_turns = if modifiers.shift() { 3 } else { 1 };

        if modifiers.ctrl() {
            return match key {
                VirtualKeyCode::Z => Some(Command::Undo),
                _ => None,
            };
        }

        if let Some(face) = face_for(key) {
            let depth = self.depth.take().unwrap_or(1);
            return Some(Command::Turn(Move::wide(face, quarter_turns, depth)));
        }

        if let Some(axis) = axis_for(key) {
            self.depth = None;
            return Some(Command::Turn(Move::rotation(axis, quarter_turns)));
        }

        if let Some(depth) = digit_for(key) {
            self.depth = Some(depth);
            return None;
        }

        match key {
            VirtualKeyCode::Space => Some(Command::Scramble),
            VirtualKeyCode::Back => Some(Command::Reset),
            VirtualKeyCode::P => Some(Command::PrintState),
            VirtualKeyCode::Escape => Some(Command::Quit),
            _ => None,
        }
    }
}

fn face_for(key: VirtualKeyCode) -> Option<Face> {
    match key {
        VirtualKeyCode::U => Some(Face::U),
        VirtualKeyCode::R => Some(Face::R),
        VirtualKeyCode::F => Some(Face::F),
        VirtualKeyCode::D => Some(Face::D),
        VirtualKeyCode::L => Some(Face::L),
        VirtualKeyCode::B => Some(Face::B),
        _ => None,
    }
}

fn axis_for(key: VirtualKeyCode) -> Option<Axis> {
    match key {
        VirtualKeyCode::X => Some(Axis::X),
        VirtualKeyCode::Y => Some(Axis::Y),
        VirtualKeyCode::Z => Some(Axis::Z),
        _ => None,
    }
}

fn digit_for(key: VirtualKeyCode) -> Option<usize> {
    match key {
        VirtualKeyCode::Key1 | VirtualKeyCode::Numpad1 => Some(1),
        VirtualKeyCode::Key2 | VirtualKeyCode::Numpad2 => Some(2),
        VirtualKeyCode::Key3 | VirtualKeyCode::Numpad3 => Some(3),
        VirtualKeyCode::Key4 | VirtualKeyCode::Numpad4 => Some(4),
        VirtualKeyCode::Key5 | VirtualKeyCode::Numpad5 => Some(5),
        VirtualKeyCode::Key6 | VirtualKeyCode::Numpad6 => Some(6),
        VirtualKeyCode::Key7 | VirtualKeyCode::Numpad7 => Some(7),
        VirtualKeyCode::Key8 | VirtualKeyCode::Numpad8 => Some(8),
        VirtualKeyCode::Key9 | VirtualKeyCode::Numpad9 => Some(9),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(controls: &mut Controls, key: VirtualKeyCode) -> Option<Command> {
        controls.key_pressed(key, ModifiersState::empty())
    }

    #[test]
    fn face_keys_turn_clockwise() {
        let mut controls = Controls::new();
        assert_eq!(
            press(&mut controls, VirtualKeyCode::R),
            Some(Command::Turn(Move::face(Face::R, 1)))
        );
        assert_eq!(
            press(&mut controls, VirtualKeyCode::B),
            Some(Command::Turn(Move::face(Face::B, 1)))
        );
    }

    #[test]
    fn shift_inverts() {
        let mut controls = Controls::new();
        assert_eq!(
            controls.key_pressed(VirtualKeyCode::U, ModifiersState::SHIFT),
            Some(Command::Turn(Move::face(Face::U, 3)))
        );
        assert_eq!(
            controls.key_pressed(VirtualKeyCode::Y, ModifiersState::SHIFT),
            Some(Command::Turn(Move::rotation(Axis::Y, 3)))
        );
    }

    #[test]
    fn digit_sets_depth_once() {
        let mut controls = Controls::new();
        assert_eq!(press(&mut controls, VirtualKeyCode::Key3), None);
        assert_eq!(
            press(&mut controls, VirtualKeyCode::L),
            Some(Command::Turn(Move::wide(Face::L, 1, 3)))
        );
        assert_eq!(
            press(&mut controls, VirtualKeyCode::L),
            Some(Command::Turn(Move::face(Face::L, 1)))
        );
    }

    #[test]
    fn rotations_discard_pending_depth() {
        let mut controls = Controls::new();
        press(&mut controls, VirtualKeyCode::Key2);
        assert_eq!(
            press(&mut controls, VirtualKeyCode::X),
            Some(Command::Turn(Move::rotation(Axis::X, 1)))
        );
        assert_eq!(
            press(&mut controls, VirtualKeyCode::R),
            Some(Command::Turn(Move::face(Face::R, 1)))
        );
    }

    #[test]
    fn ctrl_z_undoes_instead_of_rotating() {
        let mut controls = Controls::new();
        assert_eq!(
            controls.key_pressed(VirtualKeyCode::Z, ModifiersState::CTRL),
            Some(Command::Undo)
        );
        assert_eq!(controls.key_pressed(VirtualKeyCode::R, ModifiersState::CTRL), None);
    }

    #[test]
    fn other_commands() {
        let mut controls = Controls::new();
        assert_eq!(press(&mut controls, VirtualKeyCode::Space), Some(Command::Scramble));
        assert_eq!(press(&mut controls, VirtualKeyCode::Back), Some(Command::Reset));
        assert_eq!(press(&mut controls, VirtualKeyCode::P), Some(Command::PrintState));
        assert_eq!(press(&mut controls, VirtualKeyCode::Escape), Some(Command::Quit));
        assert_eq!(press(&mut controls, VirtualKeyCode::Q), None);
    }

    #[test]
    fn tracks_modifier_changes() {
        let mut controls = Controls::new();
        assert_eq!(
            controls.handle_window_event(&WindowEvent::ModifiersChanged(ModifiersState::SHIFT)),
            None
        );
        assert_eq!(controls.modifiers, ModifiersState::SHIFT);
    }
}
