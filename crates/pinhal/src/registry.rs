//! Pin ownership registry
//!
//! Maps every claimed [`PinId`] to the live peripheral holding it. All
//! mutation happens inside a blocking critical section so a multi-pin
//! claim is observed either whole or not at all.

use alloc::collections::BTreeMap;
use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::error::HalError;
use crate::log::{hal_debug, hal_trace, hal_warn};
use crate::peripheral::{PeripheralId, PeripheralRef};
use crate::pin::{PinId, PinSet};
use crate::platform::Platform;

/// Platform bring-up progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitState {
    /// `init` has not been called
    Uninitialized,
    /// `init` is awaiting the platform
    Initializing,
    /// Platform is up; pins may be acquired
    Ready,
    /// Last `init` failed; calling it again retries
    Failed,
}

struct State {
    owners: BTreeMap<PinId, PeripheralRef>,
    init: InitState,
}

/// Registry of active peripherals, keyed by pin.
///
/// One registry per board. Shared between the board and every
/// [`PinOwner`](crate::peripheral::PinOwner) through an `Rc`.
pub struct Registry {
    state: Mutex<NoopRawMutex, RefCell<State>>,
    next_id: Cell<u32>,
}

impl Registry {
    /// Empty, uninitialized registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                owners: BTreeMap::new(),
                init: InitState::Uninitialized,
            })),
            next_id: Cell::new(0),
        }
    }

    /// Bring the platform up once.
    ///
    /// After success further calls return `Ok(())` without touching the
    /// platform. A failed bring-up may be retried.
    ///
    /// # Errors
    ///
    /// [`HalError::InitInProgress`] while another call is still awaiting the
    /// platform; otherwise whatever the platform reports.
    pub async fn init<P: Platform + ?Sized>(&self, platform: &P) -> Result<(), HalError> {
        let proceed = self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            match state.init {
                InitState::Ready => Ok(false),
                InitState::Initializing => Err(HalError::InitInProgress),
                InitState::Uninitialized | InitState::Failed => {
                    state.init = InitState::Initializing;
                    Ok(true)
                }
            }
        })?;
        if !proceed {
            return Ok(());
        }

        hal_debug!("platform init started");
        let mut guard = InitGuard {
            registry: self,
            outcome: InitState::Failed,
        };
        let result = platform.init().await;
        if result.is_ok() {
            hal_debug!("platform init complete");
            guard.outcome = InitState::Ready;
        } else {
            hal_warn!("platform init failed");
        }
        drop(guard);
        result
    }

    /// Current bring-up state.
    #[must_use]
    pub fn init_state(&self) -> InitState {
        self.state.lock(|cell| cell.borrow().init)
    }

    /// `true` once `init` has succeeded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.init_state() == InitState::Ready
    }

    #[cfg(test)]
    pub(crate) fn mark_ready(&self) {
        self.state.lock(|cell| cell.borrow_mut().init = InitState::Ready);
    }

    pub(crate) fn next_id(&self) -> PeripheralId {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        PeripheralId(id)
    }

    /// Claim a single pin of `peripheral`'s set.
    ///
    /// # Errors
    ///
    /// See [`Registry::acquire_all`].
    pub fn acquire(&self, pin: PinId, peripheral: &PeripheralRef) -> Result<(), HalError> {
        self.acquire_all(&PinSet::single(pin), peripheral)
    }

    /// Claim every pin in `pins` for `peripheral`, or none of them.
    ///
    /// `pins` must be a subset of the peripheral's own pin set so that its
    /// `destroy` releases everything it holds. Pins the peripheral already
    /// owns are re-claimed silently.
    ///
    /// # Errors
    ///
    /// - [`HalError::NotInitialized`] before a successful `init`
    /// - [`HalError::PeripheralDestroyed`] for a dead peripheral
    /// - [`HalError::InvalidPinSet`] for pins outside the peripheral's set
    /// - [`HalError::PinConflict`] naming the first pin held by another
    ///   live peripheral
    pub fn acquire_all(&self, pins: &PinSet, peripheral: &PeripheralRef) -> Result<(), HalError> {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            if state.init != InitState::Ready {
                return Err(HalError::NotInitialized);
            }
            if !peripheral.alive() {
                return Err(HalError::PeripheralDestroyed);
            }
            if pins.iter().any(|pin| !peripheral.pins().contains(pin)) {
                return Err(HalError::InvalidPinSet);
            }

            for pin in pins.iter() {
                if let Some(owner) = state.owners.get(&pin) {
                    if owner.alive() && !owner.is_same(peripheral) {
                        hal_warn!(
                            "pin {} already held by {} peripheral {}",
                            pin.get(),
                            owner.kind(),
                            owner.id().get()
                        );
                        return Err(HalError::PinConflict {
                            pin,
                            owner: owner.kind(),
                        });
                    }
                }
            }

            for pin in pins.iter() {
                state.owners.insert(pin, peripheral.clone());
            }
            hal_debug!(
                "{} peripheral {} acquired {} pin(s)",
                peripheral.kind(),
                peripheral.id().get(),
                pins.len()
            );
            Ok(())
        })
    }

    /// Drop whatever claim exists on `pin`. No-op if unclaimed.
    pub fn release(&self, pin: PinId) {
        let removed = self
            .state
            .lock(|cell| cell.borrow_mut().owners.remove(&pin));
        if removed.is_some() {
            hal_trace!("pin {} released", pin.get());
        }
    }

    /// Release `pin` only if `peripheral` still holds it.
    pub(crate) fn release_owned(&self, pin: PinId, peripheral: &PeripheralRef) {
        let removed = self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            match state.owners.get(&pin) {
                Some(owner) if owner.is_same(peripheral) => state.owners.remove(&pin),
                _ => None,
            }
        });
        if removed.is_some() {
            hal_trace!("pin {} released", pin.get());
        }
    }

    /// Peripheral currently holding `pin`.
    #[must_use]
    pub fn lookup(&self, pin: PinId) -> Option<PeripheralRef> {
        self.state.lock(|cell| cell.borrow().owners.get(&pin).cloned())
    }

    /// Snapshot of every claimed pin.
    #[must_use]
    pub fn active_peripherals(&self) -> BTreeMap<PinId, PeripheralRef> {
        self.state.lock(|cell| cell.borrow().owners.clone())
    }

    /// Number of claimed pins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock(|cell| cell.borrow().owners.len())
    }

    /// `true` when no pin is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Settles the init state when `Registry::init` completes or its future is
/// dropped mid-flight. A dropped bring-up counts as failed so it can be
/// retried.
struct InitGuard<'a> {
    registry: &'a Registry,
    outcome: InitState,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome;
        self.registry
            .state
            .lock(|cell| cell.borrow_mut().init = outcome);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
