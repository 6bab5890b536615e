//! Scripted input
//!
//! Headless replacement for an OS event queue: events are scheduled against
//! a frame counter and handed out as the frames are polled.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// Window close request.
    Quit,
    /// Escape key released.
    Escape,
    /// Pause key released.
    TogglePause,
}

impl InputEvent {
    /// Parse the scene-file spelling of an event.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "quit" => Some(Self::Quit),
            "escape" => Some(Self::Escape),
            "pause" | "toggle_pause" => Some(Self::TogglePause),
            _ => None,
        }
    }
}

/// One event due on a given frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedInput {
    pub frame: u64,
    pub event: InputEvent,
}

#[derive(Debug, Default)]
pub struct InputScript {
    pending: VecDeque<ScriptedInput>,
    frame: u64,
}

gantry_core::define_service!(InputScript);

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: impl IntoIterator<Item = ScriptedInput>) -> Self {
        let mut script = Self::new();
        for scripted in events {
            script.push(scripted.frame, scripted.event);
        }
        script
    }

    /// Schedule `event` for `frame`, after any events already due then.
    pub fn push(&mut self, frame: u64, event: InputEvent) {
        let position = self
            .pending
            .iter()
            .position(|scripted| scripted.frame > frame)
            .unwrap_or(self.pending.len());
        self.pending.insert(position, ScriptedInput { frame, event });
    }

    /// Events due on the current frame, then advance to the next frame.
    pub fn poll(&mut self) -> Vec<InputEvent> {
        let mut due = Vec::new();
        while let Some(scripted) = self.pending.front() {
            if scripted.frame > self.frame {
                break;
            }
            if let Some(scripted) = self.pending.pop_front() {
                due.push(scripted.event);
            }
        }
        self.frame += 1;
        due
    }

    /// Frames polled so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_delivered_on_their_frame() {
        let mut script = InputScript::new();
        script.push(2, InputEvent::Quit);
        script.push(0, InputEvent::TogglePause);
        script.push(2, InputEvent::Escape);

        assert_eq!(script.poll(), vec![InputEvent::TogglePause]);
        assert!(script.poll().is_empty());
        assert_eq!(script.poll(), vec![InputEvent::Quit, InputEvent::Escape]);
        assert!(script.is_empty());
        assert_eq!(script.frame(), 3);
    }

    #[test]
    fn late_events_are_delivered_on_next_poll() {
        let mut script = InputScript::new();
        script.poll();
        script.poll();
        script.push(0, InputEvent::Escape);
        assert_eq!(script.poll(), vec![InputEvent::Escape]);
    }

    #[test]
    fn parses_scene_spellings() {
        assert_eq!(InputEvent::parse("pause"), Some(InputEvent::TogglePause));
        assert_eq!(InputEvent::parse("quit"), Some(InputEvent::Quit));
        assert_eq!(InputEvent::parse("jump"), None);
    }

    #[test]
    fn deserializes_from_json() {
        let scripted: ScriptedInput =
            serde_json::from_str(r#"{ "frame": 4, "event": "toggle_pause" }"#).unwrap();
        assert_eq!(
            scripted,
            ScriptedInput {
                frame: 4,
                event: InputEvent::TogglePause
            }
        );
    }
}
