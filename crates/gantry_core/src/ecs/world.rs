// world.rs - ECS World: entity rows, service slots, registrations, sweep loop

use crate::ecs::{
    Component, ComponentSet, ConfigError, EntityBuilder, EntityId, EntityRow, Manager,
    RawServiceAction, RawSystem, Registry, Service, ServiceActionId, ServiceSet, ServiceSlots,
    StopSignal, SystemId, SystemRegistry, TypeKey,
};
use gantry_metrics::SweepTimer;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// Sweeps kept in the rolling timing window.
const TIMING_WINDOW: usize = 120;

/// A system or service-action, for errors shared by both.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    System(SystemId),
    ServiceAction(ServiceActionId),
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::System(id) => write!(f, "{id}"),
            Registration::ServiceAction(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("{0} does not exist")]
    UnknownSystem(SystemId),

    #[error("{0} does not exist")]
    UnknownServiceAction(ServiceActionId),

    #[error("entity {entity} already has component `{ty}`")]
    ComponentAlreadyInstalled { entity: EntityId, ty: TypeKey },

    #[error("entity {entity} has no component `{ty}` to uninstall")]
    ComponentAlreadyUninstalled { entity: EntityId, ty: TypeKey },

    #[error("service `{ty}` is already installed")]
    ServiceAlreadyInstalled { ty: TypeKey },

    #[error("service `{ty}` is not installed")]
    ServiceAlreadyUninstalled { ty: TypeKey },

    #[error("{system} cannot consume entity {entity}")]
    CannotConsumeEntity { system: SystemId, entity: EntityId },

    #[error("services required by {0} are not all installed")]
    CannotConsumeServices(Registration),

    #[error("{0} was registered without an invoker or predicate")]
    IllInformedSystem(SystemId),

    #[error("{0} was registered without an invoker or predicate")]
    IllInformedServiceAction(ServiceActionId),
}

/// Entities, services and the callbacks that run over them.
///
/// Every mutation goes through `&mut self`; a running sweep holds the world
/// exclusively, so callbacks can never add or remove anything mid-sweep.
pub struct World {
    registry: Registry,
    entities: BTreeMap<EntityId, EntityRow>,
    next_entity_id: u64,
    services: ServiceSlots,
    systems: SystemRegistry<SystemId, RawSystem>,
    actions: SystemRegistry<ServiceActionId, RawServiceAction>,
    stop: StopSignal,
    sweeps: u64,
    timer: SweepTimer,
}

impl World {
    /// Create an empty world over a validated registry.
    ///
    /// Only the manager service is installed.
    pub fn new(registry: Registry) -> Self {
        let stop = StopSignal::new();
        let services = ServiceSlots::new(registry.service_slot_count(), Manager::new(stop.clone()));
        debug!(
            components = registry.component_count(),
            services = registry.services().len(),
            "world created"
        );

        Self {
            registry,
            entities: BTreeMap::new(),
            next_entity_id: 0,
            services,
            systems: SystemRegistry::new(),
            actions: SystemRegistry::new(),
            stop,
            sweeps: 0,
            timer: SweepTimer::new(TIMING_WINDOW),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create an entity holding exactly the builder's components.
    pub fn add_entity(&mut self, builder: EntityBuilder) -> Result<EntityId, WorldError> {
        let keys: Vec<TypeKey> = builder.keys().collect();
        let slots = self.registry.resolve_components(&keys)?;

        let mut row = EntityRow::empty(self.registry.component_count());
        for (slot, (_, value)) in slots.into_iter().zip(builder.into_components()) {
            row.insert_boxed(slot, value);
        }

        let id = EntityId::from_raw(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities.insert(id, row);
        debug!(entity = %id, components = keys.len(), "entity added");
        Ok(id)
    }

    pub fn remove_entity(&mut self, entity: EntityId) -> Result<(), WorldError> {
        self.entities
            .remove(&entity)
            .map(|_| debug!(entity = %entity, "entity removed"))
            .ok_or(WorldError::UnknownEntity(entity))
    }

    pub fn install_component<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
    ) -> Result<(), WorldError> {
        let slot = self.registry.component_index(T::key())?;
        let row = self.row_mut(entity)?;
        if !row.insert(slot, value) {
            return Err(WorldError::ComponentAlreadyInstalled {
                entity,
                ty: T::key(),
            });
        }
        trace!(entity = %entity, component = %T::key(), "component installed");
        Ok(())
    }

    pub fn uninstall_component<T: Component>(&mut self, entity: EntityId) -> Result<(), WorldError> {
        let slot = self.registry.component_index(T::key())?;
        let row = self.row_mut(entity)?;
        if !row.remove(slot) {
            return Err(WorldError::ComponentAlreadyUninstalled {
                entity,
                ty: T::key(),
            });
        }
        trace!(entity = %entity, component = %T::key(), "component uninstalled");
        Ok(())
    }

    pub fn has_component<T: Component>(&self, entity: EntityId) -> Result<bool, WorldError> {
        let slot = self.registry.component_index(T::key())?;
        Ok(self.row(entity)?.is_occupied(slot))
    }

    pub fn component<T: Component>(&self, entity: EntityId) -> Result<Option<&T>, WorldError> {
        let slot = self.registry.component_index(T::key())?;
        Ok(self.row(entity)?.get::<T>(slot))
    }

    pub fn component_mut<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> Result<Option<&mut T>, WorldError> {
        let slot = self.registry.component_index(T::key())?;
        Ok(self.row_mut(entity)?.get_mut::<T>(slot))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entity ids in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn row(&self, entity: EntityId) -> Result<&EntityRow, WorldError> {
        self.entities
            .get(&entity)
            .ok_or(WorldError::UnknownEntity(entity))
    }

    fn row_mut(&mut self, entity: EntityId) -> Result<&mut EntityRow, WorldError> {
        self.entities
            .get_mut(&entity)
            .ok_or(WorldError::UnknownEntity(entity))
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    /// Move a service instance into its slot.
    pub fn install_service<T: Service>(&mut self, value: T) -> Result<(), WorldError> {
        let ty = T::key();
        let slot = self.registry.service_index(ty)?;
        self.services
            .put(slot, value)
            .map_err(|_| WorldError::ServiceAlreadyInstalled { ty })?;
        debug!(service = %ty, slot = %slot, "service installed");
        Ok(())
    }

    /// Move a service instance out of its slot.
    pub fn uninstall_service<T: Service>(&mut self) -> Result<T, WorldError> {
        let ty = T::key();
        let slot = self.registry.service_index(ty)?;
        let value = self
            .services
            .take::<T>(slot)
            .ok_or(WorldError::ServiceAlreadyUninstalled { ty })?;
        debug!(service = %ty, slot = %slot, "service uninstalled");
        Ok(value)
    }

    pub fn has_service<T: Service>(&self) -> bool {
        self.registry
            .service_index(T::key())
            .is_ok_and(|slot| self.services.is_occupied(slot))
    }

    pub fn service<T: Service>(&self) -> Option<&T> {
        let slot = self.registry.service_index(T::key()).ok()?;
        self.services.get::<T>(slot)
    }

    pub fn service_mut<T: Service>(&mut self) -> Option<&mut T> {
        let slot = self.registry.service_index(T::key()).ok()?;
        self.services.get_mut::<T>(slot)
    }

    /// Handle to the manager service of this world.
    pub fn manager(&self) -> Manager {
        Manager::new(self.stop.clone())
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Register a per-entity callback over components `C` and services `S`.
    ///
    /// The callback runs for every entity holding all of `C` during each
    /// sweep in which all of `S` are installed.
    pub fn add_system<C, S, F>(&mut self, f: F) -> Result<SystemId, WorldError>
    where
        C: ComponentSet,
        S: ServiceSet,
        F: FnMut(&mut C, &mut S) + Send + 'static,
    {
        let component_slots = self.registry.resolve_components(&C::keys())?;
        let service_slots = self.registry.resolve_services(&S::keys())?;
        Ok(self.add_raw_system(RawSystem::typed::<C, S, F>(
            component_slots,
            service_slots,
            f,
        )))
    }

    /// Register a system from hand-supplied parts.
    ///
    /// Parts left unset are reported as [`WorldError::IllInformedSystem`]
    /// when the system is used.
    pub fn add_raw_system(&mut self, system: RawSystem) -> SystemId {
        let well_formed = system.is_well_formed();
        let name = system.name().to_owned();
        let id = self.systems.register(system);
        debug!(system = %id, name = %name, well_formed, "system added");
        id
    }

    pub fn remove_system(&mut self, system: SystemId) -> Result<(), WorldError> {
        self.systems
            .remove(system)
            .map(|_| debug!(system = %system, "system removed"))
            .ok_or(WorldError::UnknownSystem(system))
    }

    /// Whether `system` would run for `entity` right now.
    pub fn can_consume_entity(
        &self,
        system: SystemId,
        entity: EntityId,
    ) -> Result<bool, WorldError> {
        let registered = self
            .systems
            .get(system)
            .ok_or(WorldError::UnknownSystem(system))?;
        let row = self.row(entity)?;
        let (components, services) = registered
            .predicates()
            .ok_or(WorldError::IllInformedSystem(system))?;
        Ok(services(&self.services) && components(row))
    }

    /// Run `system` once for `entity`, outside of a sweep.
    pub fn consume_entity(&mut self, system: SystemId, entity: EntityId) -> Result<(), WorldError> {
        let registered = self
            .systems
            .get_mut(system)
            .ok_or(WorldError::UnknownSystem(system))?;
        let row = self
            .entities
            .get_mut(&entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        let (invoker, components, services) = registered
            .parts_mut()
            .ok_or(WorldError::IllInformedSystem(system))?;

        if !services(&self.services) {
            return Err(WorldError::CannotConsumeServices(Registration::System(
                system,
            )));
        }
        if !components(row) {
            return Err(WorldError::CannotConsumeEntity { system, entity });
        }
        invoker(row, &mut self.services);
        Ok(())
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn system_ids(&self) -> impl Iterator<Item = SystemId> + '_ {
        self.systems.handles()
    }

    // ------------------------------------------------------------------
    // Service-actions
    // ------------------------------------------------------------------

    /// Register a once-per-sweep callback over services `S`.
    pub fn add_service_action<S, F>(&mut self, f: F) -> Result<ServiceActionId, WorldError>
    where
        S: ServiceSet,
        F: FnMut(&mut S) + Send + 'static,
    {
        let service_slots = self.registry.resolve_services(&S::keys())?;
        Ok(self.add_raw_service_action(RawServiceAction::typed::<S, F>(service_slots, f)))
    }

    pub fn add_raw_service_action(&mut self, action: RawServiceAction) -> ServiceActionId {
        let well_formed = action.is_well_formed();
        let name = action.name().to_owned();
        let id = self.actions.register(action);
        debug!(action = %id, name = %name, well_formed, "service-action added");
        id
    }

    pub fn remove_service_action(&mut self, action: ServiceActionId) -> Result<(), WorldError> {
        self.actions
            .remove(action)
            .map(|_| debug!(action = %action, "service-action removed"))
            .ok_or(WorldError::UnknownServiceAction(action))
    }

    pub fn can_run_service_action(&self, action: ServiceActionId) -> Result<bool, WorldError> {
        let predicate = self
            .actions
            .get(action)
            .ok_or(WorldError::UnknownServiceAction(action))?
            .predicate()
            .ok_or(WorldError::IllInformedServiceAction(action))?;
        Ok(predicate(&self.services))
    }

    /// Run `action` once, outside of a sweep.
    pub fn run_service_action(&mut self, action: ServiceActionId) -> Result<(), WorldError> {
        let (invoker, predicate) = self
            .actions
            .get_mut(action)
            .ok_or(WorldError::UnknownServiceAction(action))?
            .parts_mut()
            .ok_or(WorldError::IllInformedServiceAction(action))?;

        if !predicate(&self.services) {
            return Err(WorldError::CannotConsumeServices(
                Registration::ServiceAction(action),
            ));
        }
        invoker(&mut self.services);
        Ok(())
    }

    pub fn service_action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn service_action_ids(&self) -> impl Iterator<Item = ServiceActionId> + '_ {
        self.actions.handles()
    }

    // ------------------------------------------------------------------
    // Sweep loop
    // ------------------------------------------------------------------

    /// One pass: every runnable service-action, then every system over every
    /// matching entity, each in ascending id order.
    pub fn sweep(&mut self) -> Result<(), WorldError> {
        self.timer.begin();

        for (id, action) in self.actions.iter_mut() {
            let (invoker, predicate) = action
                .parts_mut()
                .ok_or(WorldError::IllInformedServiceAction(id))?;
            if predicate(&self.services) {
                invoker(&mut self.services);
            }
        }

        for (id, system) in self.systems.iter_mut() {
            let (invoker, components, services) = system
                .parts_mut()
                .ok_or(WorldError::IllInformedSystem(id))?;
            if !services(&self.services) {
                continue;
            }
            for row in self.entities.values_mut() {
                if components(row) {
                    invoker(row, &mut self.services);
                }
            }
        }

        self.timer.end();
        self.sweeps += 1;
        trace!(sweep = self.sweeps, "sweep complete");
        Ok(())
    }

    /// Sweeps performed over the lifetime of this world.
    pub fn sweep_count(&self) -> u64 {
        self.sweeps
    }

    /// Rolling sweeps per second (0 without the `metrics` feature).
    pub fn sweep_rate(&self) -> f64 {
        self.timer.sweeps_per_second()
    }

    /// Rolling (min, max) sweep duration in milliseconds.
    pub fn sweep_time_range_ms(&self) -> (f64, f64) {
        self.timer.sweep_time_range_ms()
    }

    /// Sweep until a stop is requested. Returns the number of sweeps run.
    ///
    /// Any earlier stop request is discarded first, so a stopped world can
    /// be run again.
    pub fn run(&mut self) -> Result<u64, WorldError> {
        self.stop.reset();
        self.run_until_stopped()
    }

    pub(crate) fn run_until_stopped(&mut self) -> Result<u64, WorldError> {
        let mut performed = 0;
        while !self.stop.is_requested() {
            self.sweep()?;
            performed += 1;
        }
        debug!(sweeps = performed, "sweep loop stopped");
        Ok(performed)
    }

    /// Ask the loop to stop after the current sweep.
    pub fn request_stop(&self) -> bool {
        self.stop.request()
    }

    /// Shared stop flag of this world.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("systems", &self.systems.len())
            .field("service_actions", &self.actions.len())
            .field("services", &self.services)
            .field("sweeps", &self.sweeps)
            .finish()
    }
}
