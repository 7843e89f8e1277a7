/// Keyboard channel: keys map onto the same transitions as pointer gestures
use crate::gesture::Gesture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Close,
    ToggleHold,
}

impl From<ViewerKey> for Command {
    fn from(key: ViewerKey) -> Self {
        match key {
            ViewerKey::Escape => Command::Close,
            ViewerKey::ArrowRight => Command::Next,
            ViewerKey::ArrowLeft => Command::Previous,
            ViewerKey::Space => Command::ToggleHold,
        }
    }
}

/// Navigation command for a released gesture. `Hold` carries none.
pub fn gesture_command(gesture: Gesture) -> Option<Command> {
    match gesture {
        Gesture::TapRight | Gesture::SwipeLeft => Some(Command::Next),
        Gesture::TapLeft | Gesture::SwipeRight => Some(Command::Previous),
        Gesture::SwipeDown => Some(Command::Close),
        Gesture::Hold => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match_gestures() {
        assert_eq!(Command::from(ViewerKey::ArrowRight), gesture_command(Gesture::TapRight).unwrap());
        assert_eq!(Command::from(ViewerKey::ArrowRight), gesture_command(Gesture::SwipeLeft).unwrap());
        assert_eq!(Command::from(ViewerKey::ArrowLeft), gesture_command(Gesture::TapLeft).unwrap());
        assert_eq!(Command::from(ViewerKey::ArrowLeft), gesture_command(Gesture::SwipeRight).unwrap());
        assert_eq!(Command::from(ViewerKey::Escape), gesture_command(Gesture::SwipeDown).unwrap());
        assert_eq!(gesture_command(Gesture::Hold), None);
    }
}
