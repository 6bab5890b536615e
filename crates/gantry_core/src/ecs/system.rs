//! System and service-action registrations
//!
//! A registration is stored type-erased as three parts: an invoker, a
//! component predicate over an entity row and a service predicate over the
//! service slots. Typed registrations derive all three from their parameter
//! tuples; raw registrations supply them by hand and may leave parts unset.
//! A registration with an unset part is ill-informed and errors when used.

use crate::ecs::{ComponentSet, EntityRow, ServiceSet, ServiceSlots, SlotIndex};
use std::any::type_name;
use std::fmt;

pub type EntityInvoker = Box<dyn FnMut(&mut EntityRow, &mut ServiceSlots) + Send>;
pub type ActionInvoker = Box<dyn FnMut(&mut ServiceSlots) + Send>;
pub type RowPredicate = Box<dyn Fn(&EntityRow) -> bool + Send>;
pub type ServicePredicate = Box<dyn Fn(&ServiceSlots) -> bool + Send>;

/// Per-entity callback plus the predicates that gate it.
pub struct RawSystem {
    name: String,
    invoker: Option<EntityInvoker>,
    component_predicate: Option<RowPredicate>,
    service_predicate: Option<ServicePredicate>,
}

impl RawSystem {
    /// Start a registration with no parts set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invoker: None,
            component_predicate: None,
            service_predicate: None,
        }
    }

    pub fn with_invoker<F>(mut self, invoker: F) -> Self
    where
        F: FnMut(&mut EntityRow, &mut ServiceSlots) + Send + 'static,
    {
        self.invoker = Some(Box::new(invoker));
        self
    }

    pub fn with_component_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&EntityRow) -> bool + Send + 'static,
    {
        self.component_predicate = Some(Box::new(predicate));
        self
    }

    pub fn with_service_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ServiceSlots) -> bool + Send + 'static,
    {
        self.service_predicate = Some(Box::new(predicate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether all three parts are set.
    pub fn is_well_formed(&self) -> bool {
        self.invoker.is_some()
            && self.component_predicate.is_some()
            && self.service_predicate.is_some()
    }

    /// Build a registration from typed parameter tuples whose slots are
    /// already resolved.
    pub(crate) fn typed<C, S, F>(
        component_slots: Vec<SlotIndex>,
        service_slots: Vec<SlotIndex>,
        mut f: F,
    ) -> Self
    where
        C: ComponentSet,
        S: ServiceSet,
        F: FnMut(&mut C, &mut S) + Send + 'static,
    {
        let row_slots = component_slots.clone();
        let held_slots = service_slots.clone();

        Self::new(type_name::<F>())
            .with_invoker(move |row: &mut EntityRow, services: &mut ServiceSlots| {
                let Some(mut components) = C::read(row, &component_slots) else {
                    return;
                };
                let Some(mut held) = S::take(services, &service_slots) else {
                    return;
                };
                f(&mut components, &mut held);
                held.restore(services, &service_slots);
                components.write(row, &component_slots);
            })
            .with_component_predicate(move |row: &EntityRow| row.occupies_all(&row_slots))
            .with_service_predicate(move |services: &ServiceSlots| {
                services.occupies_all(&held_slots)
            })
    }

    pub(crate) fn predicates(&self) -> Option<(&RowPredicate, &ServicePredicate)> {
        self.invoker.as_ref()?;
        Some((
            self.component_predicate.as_ref()?,
            self.service_predicate.as_ref()?,
        ))
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> Option<(&mut EntityInvoker, &RowPredicate, &ServicePredicate)> {
        match (
            &mut self.invoker,
            &self.component_predicate,
            &self.service_predicate,
        ) {
            (Some(invoker), Some(components), Some(services)) => {
                Some((invoker, components, services))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for RawSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSystem")
            .field("name", &self.name)
            .field("well_formed", &self.is_well_formed())
            .finish()
    }
}

/// Once-per-sweep callback over services only.
pub struct RawServiceAction {
    name: String,
    invoker: Option<ActionInvoker>,
    service_predicate: Option<ServicePredicate>,
}

impl RawServiceAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invoker: None,
            service_predicate: None,
        }
    }

    pub fn with_invoker<F>(mut self, invoker: F) -> Self
    where
        F: FnMut(&mut ServiceSlots) + Send + 'static,
    {
        self.invoker = Some(Box::new(invoker));
        self
    }

    pub fn with_service_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ServiceSlots) -> bool + Send + 'static,
    {
        self.service_predicate = Some(Box::new(predicate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_well_formed(&self) -> bool {
        self.invoker.is_some() && self.service_predicate.is_some()
    }

    pub(crate) fn typed<S, F>(service_slots: Vec<SlotIndex>, mut f: F) -> Self
    where
        S: ServiceSet,
        F: FnMut(&mut S) + Send + 'static,
    {
        let held_slots = service_slots.clone();

        Self::new(type_name::<F>())
            .with_invoker(move |services: &mut ServiceSlots| {
                let Some(mut held) = S::take(services, &service_slots) else {
                    return;
                };
                f(&mut held);
                held.restore(services, &service_slots);
            })
            .with_service_predicate(move |services: &ServiceSlots| {
                services.occupies_all(&held_slots)
            })
    }

    pub(crate) fn predicate(&self) -> Option<&ServicePredicate> {
        self.invoker.as_ref()?;
        self.service_predicate.as_ref()
    }

    pub(crate) fn parts_mut(&mut self) -> Option<(&mut ActionInvoker, &ServicePredicate)> {
        match (&mut self.invoker, &self.service_predicate) {
            (Some(invoker), Some(services)) => Some((invoker, services)),
            _ => None,
        }
    }
}

impl fmt::Debug for RawServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawServiceAction")
            .field("name", &self.name)
            .field("well_formed", &self.is_well_formed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_system_is_ill_informed_until_complete() {
        let partial = RawSystem::new("partial").with_invoker(|_, _| {});
        assert!(!partial.is_well_formed());

        let mut complete = partial
            .with_component_predicate(|_| true)
            .with_service_predicate(|_| true);
        assert!(complete.is_well_formed());
        assert!(complete.parts_mut().is_some());
        assert_eq!(complete.name(), "partial");
    }

    #[test]
    fn raw_action_without_predicate_has_no_parts() {
        let mut action = RawServiceAction::new("tick").with_invoker(|_| {});
        assert!(!action.is_well_formed());
        assert!(action.parts_mut().is_none());
    }
}
