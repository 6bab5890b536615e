//! Background sweep loop
//!
//! A [`Scheduler`] owns a [`World`] and runs its sweep loop either on the
//! calling thread or on one dedicated worker thread. While dispatched, the
//! world is moved onto the worker: the caller can only request a stop or wait
//! for the loop to finish, which keeps the world single-writer without locks.

use crate::ecs::{StopSignal, World, WorldError};
use std::io;
use std::mem;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{info, warn};

const WORKER_NAME: &str = "gantry-sweep";

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("the sweep loop is already running")]
    AlreadyRunning,

    #[error("the sweep loop was never dispatched")]
    NotRunning,

    #[error("the world is owned by the sweep worker until it stops")]
    Dispatched,

    #[error("the sweep worker panicked")]
    WorkerPanicked,

    #[error("the world was lost to a failed sweep worker")]
    WorldLost,

    #[error("failed to spawn the sweep worker: {0}")]
    Spawn(#[from] io::Error),

    #[error(transparent)]
    World(#[from] WorldError),
}

type WorkerResult = (Box<World>, Result<u64, WorldError>);

enum State {
    Idle(Box<World>),
    Dispatched(JoinHandle<WorkerResult>),
    Lost,
}

/// Runs a world's sweep loop synchronously or on a background thread.
pub struct Scheduler {
    state: State,
    stop: StopSignal,
}

impl Scheduler {
    pub fn new(world: World) -> Self {
        let stop = world.stop_signal();
        Self {
            state: State::Idle(Box::new(world)),
            stop,
        }
    }

    /// Move the world onto a worker thread that sweeps until a stop is
    /// requested.
    pub fn dispatch(&mut self) -> Result<(), SchedulerError> {
        let mut world = match mem::replace(&mut self.state, State::Lost) {
            State::Idle(world) => world,
            State::Dispatched(handle) => {
                self.state = State::Dispatched(handle);
                return Err(SchedulerError::AlreadyRunning);
            }
            State::Lost => return Err(SchedulerError::WorldLost),
        };

        // Cleared here rather than on the worker so that a stop requested
        // right after dispatch returns is never lost.
        self.stop.reset();

        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                let result = world.run_until_stopped();
                (world, result)
            })?;

        info!(worker = WORKER_NAME, "sweep loop dispatched");
        self.state = State::Dispatched(handle);
        Ok(())
    }

    /// Wait for the dispatched loop to stop and take the world back.
    ///
    /// Returns the number of sweeps the worker performed.
    pub fn await_stop(&mut self) -> Result<u64, SchedulerError> {
        let handle = match mem::replace(&mut self.state, State::Lost) {
            State::Dispatched(handle) => handle,
            State::Idle(world) => {
                self.state = State::Idle(world);
                return Err(SchedulerError::NotRunning);
            }
            State::Lost => return Err(SchedulerError::WorldLost),
        };

        match handle.join() {
            Ok((world, result)) => {
                self.state = State::Idle(world);
                let sweeps = result?;
                info!(sweeps, "sweep loop stopped");
                Ok(sweeps)
            }
            Err(_) => {
                warn!("sweep worker panicked; world lost");
                Err(SchedulerError::WorkerPanicked)
            }
        }
    }

    /// Ask the dispatched loop to stop after its current sweep.
    ///
    /// Returns false if nothing is running or a stop was already requested.
    pub fn request_stop(&self) -> bool {
        match self.state {
            State::Dispatched(_) => self.stop.request(),
            _ => false,
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self.state, State::Dispatched(_))
    }

    /// Run the loop on the calling thread until a stop is requested.
    pub fn run(&mut self) -> Result<u64, SchedulerError> {
        match &mut self.state {
            State::Idle(world) => Ok(world.run()?),
            State::Dispatched(_) => Err(SchedulerError::AlreadyRunning),
            State::Lost => Err(SchedulerError::WorldLost),
        }
    }

    pub fn world(&self) -> Result<&World, SchedulerError> {
        match &self.state {
            State::Idle(world) => Ok(&**world),
            State::Dispatched(_) => Err(SchedulerError::Dispatched),
            State::Lost => Err(SchedulerError::WorldLost),
        }
    }

    pub fn world_mut(&mut self) -> Result<&mut World, SchedulerError> {
        match &mut self.state {
            State::Idle(world) => Ok(&mut **world),
            State::Dispatched(_) => Err(SchedulerError::Dispatched),
            State::Lost => Err(SchedulerError::WorldLost),
        }
    }

    /// Stop any running loop and hand the world back.
    pub fn into_world(mut self) -> Result<World, SchedulerError> {
        if self.is_dispatched() {
            self.stop.request();
            self.await_stop()?;
        }
        match mem::replace(&mut self.state, State::Lost) {
            State::Idle(world) => Ok(*world),
            _ => Err(SchedulerError::WorldLost),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let State::Dispatched(handle) = mem::replace(&mut self.state, State::Lost) {
            self.stop.request();
            if handle.join().is_err() {
                warn!("sweep worker panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Manager, Registry};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Ticks(u64);
    crate::define_component!(Ticks);

    fn world() -> World {
        let registry = Registry::builder().component::<Ticks>().build().unwrap();
        let mut world = World::new(registry);
        crate::spawn!(world, Ticks(0)).unwrap();
        world
    }

    #[test]
    fn await_before_dispatch_is_not_running() {
        let mut scheduler = Scheduler::new(world());
        assert!(matches!(
            scheduler.await_stop(),
            Err(SchedulerError::NotRunning)
        ));
        assert!(!scheduler.request_stop());
        assert!(scheduler.world().is_ok());
    }

    #[test]
    fn dispatch_runs_until_stop_is_requested() {
        let mut world = world();
        let (started, wait_started) = mpsc::channel();
        let counted = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&counted);

        world
            .add_system(move |(ticks,): &mut (Ticks,), _: &mut ()| {
                ticks.0 += 1;
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    let _ = started.send(());
                }
            })
            .unwrap();

        let mut scheduler = Scheduler::new(world);
        scheduler.dispatch().unwrap();
        assert!(scheduler.is_dispatched());
        assert!(matches!(
            scheduler.dispatch(),
            Err(SchedulerError::AlreadyRunning)
        ));
        assert!(matches!(scheduler.world(), Err(SchedulerError::Dispatched)));
        assert!(matches!(scheduler.run(), Err(SchedulerError::AlreadyRunning)));

        wait_started
            .recv_timeout(Duration::from_secs(5))
            .expect("worker never swept");
        assert!(scheduler.request_stop());
        assert!(!scheduler.request_stop());

        let sweeps = scheduler.await_stop().unwrap();
        assert!(sweeps >= 1);
        assert_eq!(sweeps, counted.load(Ordering::SeqCst));

        let world = scheduler.world().unwrap();
        assert_eq!(world.sweep_count(), sweeps);
        let entity = world.entity_ids().next().unwrap();
        assert_eq!(world.component::<Ticks>(entity), Ok(Some(&Ticks(sweeps))));
    }

    #[test]
    fn worker_can_stop_itself() {
        let mut world = world();
        world
            .add_system(|(ticks,): &mut (Ticks,), (manager,): &mut (Manager,)| {
                ticks.0 += 1;
                if ticks.0 == 10 {
                    manager.request_stop();
                }
            })
            .unwrap();

        let mut scheduler = Scheduler::new(world);
        scheduler.dispatch().unwrap();
        assert_eq!(scheduler.await_stop().unwrap(), 10);
        assert!(!scheduler.is_dispatched());
    }

    #[test]
    fn sweep_error_on_worker_is_reported() {
        let mut world = world();
        let system = world.add_raw_system(crate::ecs::RawSystem::new("broken"));

        let mut scheduler = Scheduler::new(world);
        scheduler.dispatch().unwrap();
        assert!(matches!(
            scheduler.await_stop(),
            Err(SchedulerError::World(WorldError::IllInformedSystem(id))) if id == system
        ));
        assert!(scheduler.world().is_ok());
    }

    #[test]
    fn synchronous_run_through_scheduler() {
        let mut world = world();
        world
            .add_service_action(|(manager,): &mut (Manager,)| {
                manager.request_stop();
            })
            .unwrap();

        let mut scheduler = Scheduler::new(world);
        assert_eq!(scheduler.run().unwrap(), 1);
        assert_eq!(scheduler.world_mut().unwrap().sweep_count(), 1);
    }

    #[test]
    fn into_world_stops_a_running_loop() {
        let mut scheduler = Scheduler::new(world());
        scheduler.dispatch().unwrap();
        let world = scheduler.into_world().unwrap();
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn drop_joins_a_running_worker() {
        let mut scheduler = Scheduler::new(world());
        scheduler.dispatch().unwrap();
        drop(scheduler);
    }
}
