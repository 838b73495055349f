//! Peripheral base contract
//!
//! Every driver embeds a [`PinOwner`]: the handle that holds its claim in the
//! [`Registry`], tracks liveness and fans out destroy notifications. The
//! [`Peripheral`] trait exposes that handle's capabilities on the driver
//! itself; kind-specific traits in the driver modules extend it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::error::HalError;
use crate::log::hal_debug;
use crate::pin::PinSet;
use crate::registry::Registry;

/// Kind tag of a claimed hardware function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralKind {
    /// Digital input pin
    DigitalInput,
    /// Digital output pin
    DigitalOutput,
    /// Hardware PWM output
    Pwm,
    /// I2C bus master
    I2c,
    /// On-board status LED
    Led,
    /// UART
    Serial,
}

impl core::fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::DigitalInput => "digital input",
            Self::DigitalOutput => "digital output",
            Self::Pwm => "pwm",
            Self::I2c => "i2c",
            Self::Led => "led",
            Self::Serial => "serial",
        };
        f.write_str(name)
    }
}

/// Registry-assigned identity of one peripheral instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralId(pub(crate) u32);

impl PeripheralId {
    /// Raw id value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload delivered to destroy listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyedEvent {
    /// Peripheral that was torn down
    pub id: PeripheralId,
    /// Its kind
    pub kind: PeripheralKind,
    /// Pins it released
    pub pins: PinSet,
}

/// Destroy listener; called at most once.
pub type DestroyListener = Box<dyn FnOnce(&DestroyedEvent)>;

struct ClaimState {
    id: PeripheralId,
    kind: PeripheralKind,
    pins: PinSet,
    alive: Cell<bool>,
    listeners: RefCell<Vec<DestroyListener>>,
}

/// Read-only shared view of a claim, as stored in the registry.
#[derive(Clone)]
pub struct PeripheralRef(Rc<ClaimState>);

impl PeripheralRef {
    pub(crate) fn new(id: PeripheralId, kind: PeripheralKind, pins: PinSet) -> Self {
        Self(Rc::new(ClaimState {
            id,
            kind,
            pins,
            alive: Cell::new(true),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// Identity of the peripheral.
    #[must_use]
    pub fn id(&self) -> PeripheralId {
        self.0.id
    }

    /// Kind of the peripheral.
    #[must_use]
    pub fn kind(&self) -> PeripheralKind {
        self.0.kind
    }

    /// Pins the peripheral occupies.
    #[must_use]
    pub fn pins(&self) -> &PinSet {
        &self.0.pins
    }

    /// `true` until the peripheral is destroyed.
    #[must_use]
    pub fn alive(&self) -> bool {
        self.0.alive.get()
    }

    /// `true` if both refer to the same peripheral instance.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl core::fmt::Debug for PeripheralRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeripheralRef")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("pins", &self.0.pins)
            .field("alive", &self.0.alive.get())
            .finish()
    }
}

/// Pin ownership handle composed into every driver.
///
/// Created only through [`PinOwner::claim`], so a `PinOwner` always starts
/// alive with all of its pins registered. Dropping a live owner destroys it.
pub struct PinOwner {
    claim: PeripheralRef,
    registry: Rc<Registry>,
}

impl PinOwner {
    /// Claim `pins` for a new peripheral of `kind`.
    ///
    /// # Errors
    ///
    /// Fails with [`HalError::PinConflict`] if any pin is owned by another
    /// live peripheral (nothing is claimed in that case), or with
    /// [`HalError::NotInitialized`] before platform bring-up.
    pub fn claim(
        registry: &Rc<Registry>,
        kind: PeripheralKind,
        pins: PinSet,
    ) -> Result<Self, HalError> {
        let claim = PeripheralRef::new(registry.next_id(), kind, pins);
        registry.acquire_all(claim.pins(), &claim)?;
        Ok(Self {
            claim,
            registry: Rc::clone(registry),
        })
    }

    /// Shared view of this claim.
    #[must_use]
    pub fn handle(&self) -> &PeripheralRef {
        &self.claim
    }

    /// Registry holding the claim.
    #[must_use]
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// `true` until destroyed.
    #[must_use]
    pub fn alive(&self) -> bool {
        self.claim.alive()
    }

    /// Occupied pins.
    #[must_use]
    pub fn pins(&self) -> &PinSet {
        self.claim.pins()
    }

    /// Kind tag.
    #[must_use]
    pub fn kind(&self) -> PeripheralKind {
        self.claim.kind()
    }

    /// Identity.
    #[must_use]
    pub fn id(&self) -> PeripheralId {
        self.claim.id()
    }

    /// Fail with [`HalError::PeripheralDestroyed`] once destroyed.
    pub fn validate_alive(&self) -> Result<(), HalError> {
        if self.claim.alive() {
            Ok(())
        } else {
            Err(HalError::PeripheralDestroyed)
        }
    }

    /// Release every pin, mark the claim dead and notify listeners.
    ///
    /// A second call fails with [`HalError::PeripheralDestroyed`] and does
    /// nothing else.
    pub fn destroy(&self) -> Result<(), HalError> {
        self.validate_alive()?;
        for pin in self.claim.pins().iter() {
            self.registry.release_owned(pin, &self.claim);
        }
        self.claim.0.alive.set(false);
        hal_debug!("destroyed {} peripheral {}", self.claim.kind(), self.claim.id().get());

        let listeners = core::mem::take(&mut *self.claim.0.listeners.borrow_mut());
        if !listeners.is_empty() {
            let event = DestroyedEvent {
                id: self.claim.id(),
                kind: self.claim.kind(),
                pins: self.claim.pins().clone(),
            };
            for listener in listeners {
                listener(&event);
            }
        }
        Ok(())
    }

    /// Register a listener for this peripheral's teardown.
    ///
    /// # Errors
    ///
    /// Fails with [`HalError::PeripheralDestroyed`] if the peripheral is
    /// already dead, since the event has been delivered.
    pub fn on_destroyed<F>(&self, listener: F) -> Result<(), HalError>
    where
        F: FnOnce(&DestroyedEvent) + 'static,
    {
        self.validate_alive()?;
        self.claim.0.listeners.borrow_mut().push(Box::new(listener));
        Ok(())
    }
}

impl Drop for PinOwner {
    fn drop(&mut self) {
        if self.claim.alive() {
            // Result is PeripheralDestroyed only, ruled out by the check above.
            let _ = self.destroy();
        }
    }
}

impl core::fmt::Debug for PinOwner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("PinOwner").field(&self.claim).finish()
    }
}

/// Capabilities shared by every peripheral.
pub trait Peripheral {
    /// Ownership handle embedded in the driver.
    fn owner(&self) -> &PinOwner;

    /// `true` from construction until `destroy`.
    fn alive(&self) -> bool {
        self.owner().alive()
    }

    /// Pins occupied for the whole lifetime of the peripheral.
    fn pins(&self) -> &PinSet {
        self.owner().pins()
    }

    /// Kind tag.
    fn kind(&self) -> PeripheralKind {
        self.owner().kind()
    }

    /// Registry-assigned identity.
    fn id(&self) -> PeripheralId {
        self.owner().id()
    }

    /// Guard used at the top of every operation.
    ///
    /// # Errors
    ///
    /// [`HalError::PeripheralDestroyed`] once the peripheral is dead.
    fn validate_alive(&self) -> Result<(), HalError> {
        self.owner().validate_alive()
    }

    /// Tear the peripheral down and free its pins.
    ///
    /// Drivers with hardware to quiesce override this and call
    /// [`PinOwner::destroy`] last.
    ///
    /// # Errors
    ///
    /// [`HalError::PeripheralDestroyed`] if already destroyed.
    fn destroy(&mut self) -> Result<(), HalError> {
        self.owner().destroy()
    }

    /// Subscribe to this peripheral's `destroyed` event.
    ///
    /// # Errors
    ///
    /// [`HalError::PeripheralDestroyed`] if already destroyed.
    fn on_destroyed<F>(&self, listener: F) -> Result<(), HalError>
    where
        Self: Sized,
        F: FnOnce(&DestroyedEvent) + 'static,
    {
        self.owner().on_destroyed(listener)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::pin::PinId;

    fn ready_registry() -> Rc<Registry> {
        let registry = Rc::new(Registry::new());
        registry.mark_ready();
        registry
    }

    #[test]
    fn claim_registers_every_pin() {
        let registry = ready_registry();
        let owner = PinOwner::claim(
            &registry,
            PeripheralKind::Serial,
            PinSet::pair(PinId::new(14), PinId::new(15)),
        )
        .unwrap();

        assert!(owner.alive());
        for pin in [14, 15] {
            let found = registry.lookup(PinId::new(pin)).unwrap();
            assert!(found.is_same(owner.handle()));
        }
    }

    #[test]
    fn destroy_releases_and_is_not_repeatable() {
        let registry = ready_registry();
        let owner = PinOwner::claim(
            &registry,
            PeripheralKind::Led,
            PinSet::single(PinId::new(47)),
        )
        .unwrap();

        owner.destroy().unwrap();
        assert!(!owner.alive());
        assert!(registry.is_empty());
        assert_eq!(owner.destroy(), Err(HalError::PeripheralDestroyed));
        assert_eq!(owner.validate_alive(), Err(HalError::PeripheralDestroyed));
        assert_eq!(owner.validate_alive(), Err(HalError::PeripheralDestroyed));
    }

    #[test]
    fn listeners_fire_once_with_released_pins() {
        let registry = ready_registry();
        let owner = PinOwner::claim(
            &registry,
            PeripheralKind::Pwm,
            PinSet::single(PinId::new(18)),
        )
        .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        owner
            .on_destroyed(move |event| sink.borrow_mut().push(event.clone()))
            .unwrap();

        owner.destroy().unwrap();
        let _ = owner.destroy();

        let events = seen.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, PeripheralKind::Pwm);
        assert_eq!(events[0].pins.as_slice(), &[PinId::new(18)]);
        assert_eq!(
            owner.on_destroyed(|_| {}),
            Err(HalError::PeripheralDestroyed)
        );
    }

    #[test]
    fn dropping_a_live_owner_frees_its_pins() {
        let registry = ready_registry();
        {
            let _owner = PinOwner::claim(
                &registry,
                PeripheralKind::DigitalOutput,
                PinSet::single(PinId::new(17)),
            )
            .unwrap();
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.lookup(PinId::new(17)).is_none());
    }

    #[test]
    fn kind_names_are_lowercase() {
        assert_eq!(alloc::format!("{}", PeripheralKind::DigitalInput), "digital input");
        assert_eq!(alloc::format!("{}", PeripheralKind::Serial), "serial");
    }
}
