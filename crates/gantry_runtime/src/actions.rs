//! Once-per-sweep service-actions.

use gantry_core::Manager;
use gantry_services::{InputEvent, InputScript, Stopwatch, Viewport};
use tracing::{debug, info};

/// Drain this frame's input. Quit and Escape stop the loop, pause toggles
/// the simulation clock. Also stops the loop once `max_sweeps` frames have
/// been polled.
pub fn handle_input(
    (manager, stopwatch, input): &mut (Manager, Stopwatch, InputScript),
    max_sweeps: Option<u64>,
) {
    let mut exit = false;

    for event in input.poll() {
        match event {
            InputEvent::Quit | InputEvent::Escape => exit = true,
            InputEvent::TogglePause => {
                let running = stopwatch.toggle();
                debug!(running, "simulation clock toggled");
            }
        }
    }

    if max_sweeps.is_some_and(|limit| input.frame() >= limit) {
        exit = true;
    }

    if exit && manager.request_stop() {
        info!(frame = input.frame(), "stop requested");
    }
}

/// Present the previous draw frame, then try to start the next one.
pub fn present_frame((viewport,): &mut (Viewport,)) {
    if viewport.on_draw_frame() {
        viewport.commit();
    }
    viewport.acquire_draw_frame();
}

/// Restart the physics clock once it has run for `reset_after_ms`.
pub fn reset_delta_timer((stopwatch,): &mut (Stopwatch,), reset_after_ms: u64) {
    if stopwatch.milliseconds() >= reset_after_ms {
        stopwatch.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::registry;
    use gantry_core::World;
    use gantry_services::Color;
    use glam::UVec2;

    fn manager() -> (World, Manager) {
        let world = World::new(registry().unwrap());
        let manager = world.manager();
        (world, manager)
    }

    #[test]
    fn escape_requests_stop() {
        let (world, manager) = manager();
        let mut input = InputScript::new();
        input.push(1, InputEvent::Escape);
        let mut services = (manager, Stopwatch::new(), input);

        handle_input(&mut services, None);
        assert!(!world.stop_signal().is_requested());

        handle_input(&mut services, None);
        assert!(world.stop_signal().is_requested());
    }

    #[test]
    fn pause_toggles_the_clock() {
        let (world, manager) = manager();
        let input = InputScript::from_events([gantry_services::ScriptedInput {
            frame: 0,
            event: InputEvent::TogglePause,
        }]);
        let mut services = (manager, Stopwatch::new(), input);

        handle_input(&mut services, None);
        assert!(!services.1.is_active());
        assert!(!world.stop_signal().is_requested());
    }

    #[test]
    fn sweep_limit_requests_stop() {
        let (world, manager) = manager();
        let mut services = (manager, Stopwatch::new(), InputScript::new());

        handle_input(&mut services, Some(2));
        assert!(!world.stop_signal().is_requested());
        handle_input(&mut services, Some(2));
        assert!(world.stop_signal().is_requested());
    }

    #[test]
    fn present_commits_only_acquired_frames() {
        let mut services = (Viewport::new(UVec2::new(8, 8), 60, Color::default()),);

        present_frame(&mut services);
        assert!(services.0.on_draw_frame());
        assert_eq!(services.0.frames_presented(), 0);

        present_frame(&mut services);
        assert_eq!(services.0.frames_presented(), 1);
    }

    #[test]
    fn timer_is_left_alone_below_threshold() {
        let mut services = (Stopwatch::new(),);
        reset_delta_timer(&mut services, u64::MAX);
        assert!(services.0.is_active());

        services.0.toggle();
        reset_delta_timer(&mut services, 0);
        assert_eq!(services.0.milliseconds(), 0);
    }
}
