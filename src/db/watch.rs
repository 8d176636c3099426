use super::expr::{ExprError, evaluate};
use crate::proc::SimProc;
use std::fmt;
use thiserror::Error;

//===========================================================================//

/// The fixed number of watchpoint slots.
pub const NUM_WATCHPOINTS: usize = 32;

//===========================================================================//

/// An error from a watchpoint pool operation.
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum WatchError {
    /// Every slot is already in use.
    #[error("all {} watchpoints are in use", NUM_WATCHPOINTS)]
    PoolExhausted,
    /// There is no active watchpoint with this number.
    #[error("no watchpoint number {0}")]
    NotActive(u32),
}

//===========================================================================//

/// The stable number of a watchpoint slot.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct WatchId(u8);

impl WatchId {
    /// Returns the ID with the given number, if it names a slot.
    pub fn new(number: u32) -> Option<WatchId> {
        if (number as usize) < NUM_WATCHPOINTS {
            Some(WatchId(number as u8))
        } else {
            None
        }
    }

    /// Returns the slot number.
    pub fn number(self) -> u32 {
        u32::from(self.0)
    }

    fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

//===========================================================================//

/// Which of the two pool lists a slot currently belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Membership {
    /// Available for allocation.
    Free,
    /// Watching an expression.
    Active,
}

/// A single watchpoint slot.
#[derive(Clone, Debug)]
pub struct Watchpoint {
    id: WatchId,
    expression: String,
    last_value: u32,
    membership: Membership,
    next: Option<u8>,
}

impl Watchpoint {
    /// Returns this slot's stable ID.
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Returns the watched expression (empty for a free slot).
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the value the expression had at the last change check.
    pub fn last_value(&self) -> u32 {
        self.last_value
    }

    /// Returns which list this slot is on.
    pub fn membership(&self) -> Membership {
        self.membership
    }
}

//===========================================================================//

/// A watchpoint whose value differed at a change check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WatchChange {
    /// The watchpoint that changed.
    pub id: WatchId,
    /// Its expression.
    pub expression: String,
    /// The previously recorded value.
    pub old_value: u32,
    /// The value just evaluated, now recorded.
    pub new_value: u32,
}

/// A watchpoint whose expression could not be evaluated at a change check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WatchFailure {
    /// The watchpoint that was skipped.
    pub id: WatchId,
    /// Its expression.
    pub expression: String,
    /// Why evaluation failed.
    pub error: ExprError,
}

/// The result of one pass of [`WatchPool::check_all`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WatchReport {
    /// Watchpoints whose value changed.
    pub changes: Vec<WatchChange>,
    /// Watchpoints skipped because evaluation failed.
    pub failures: Vec<WatchFailure>,
}

impl WatchReport {
    /// Returns true if any watched value changed.
    pub fn any_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// One row of [`WatchPool::list_all`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WatchListing {
    /// The watchpoint.
    pub id: WatchId,
    /// Its expression.
    pub expression: String,
    /// Its current value, freshly evaluated.
    pub value: Result<u32, ExprError>,
}

//===========================================================================//

/// A fixed pool of watchpoint slots.  Every slot is on exactly one of two
/// singly-linked lists, threaded through the slots by index: the free list
/// and the active list.  Both lists push and pop at the head.
pub struct WatchPool {
    slots: Vec<Watchpoint>,
    free_head: Option<u8>,
    active_head: Option<u8>,
}

impl WatchPool {
    /// Returns a pool with every slot free, in ascending order.
    pub fn new() -> WatchPool {
        let slots = (0..NUM_WATCHPOINTS)
            .map(|index| Watchpoint {
                id: WatchId(index as u8),
                expression: String::new(),
                last_value: 0,
                membership: Membership::Free,
                next: if index + 1 < NUM_WATCHPOINTS {
                    Some(index as u8 + 1)
                } else {
                    None
                },
            })
            .collect();
        WatchPool { slots, free_head: Some(0), active_head: None }
    }

    /// Moves a free slot to the active list, watching `expression` with
    /// `initial` as its last known value.
    pub fn allocate(
        &mut self,
        expression: String,
        initial: u32,
    ) -> Result<WatchId, WatchError> {
        let index = self.free_head.ok_or(WatchError::PoolExhausted)?;
        let slot = &mut self.slots[usize::from(index)];
        self.free_head = slot.next;
        slot.expression = expression;
        slot.last_value = initial;
        slot.membership = Membership::Active;
        slot.next = self.active_head;
        self.active_head = Some(index);
        Ok(slot.id)
    }

    /// Moves an active slot back to the free list.
    pub fn release(&mut self, number: u32) -> Result<(), WatchError> {
        let mut prev: Option<u8> = None;
        let mut cursor = self.active_head;
        while let Some(index) = cursor {
            let next = self.slots[usize::from(index)].next;
            if self.slots[usize::from(index)].id.number() == number {
                match prev {
                    Some(prev) => self.slots[usize::from(prev)].next = next,
                    None => self.active_head = next,
                }
                let slot = &mut self.slots[usize::from(index)];
                slot.expression.clear();
                slot.last_value = 0;
                slot.membership = Membership::Free;
                slot.next = self.free_head;
                self.free_head = Some(index);
                return Ok(());
            }
            prev = cursor;
            cursor = next;
        }
        Err(WatchError::NotActive(number))
    }

    /// Returns the active watchpoint with the given ID, if there is one.
    pub fn find(&self, id: WatchId) -> Option<&Watchpoint> {
        self.active().find(|slot| slot.id == id)
    }

    /// Iterates over the active watchpoints, most recently allocated first.
    pub fn active(&self) -> impl Iterator<Item = &Watchpoint> {
        let mut cursor = self.active_head;
        std::iter::from_fn(move || {
            let slot = &self.slots[usize::from(cursor?)];
            cursor = slot.next;
            Some(slot)
        })
    }

    /// Returns the number of active watchpoints.
    pub fn num_active(&self) -> usize {
        self.active().count()
    }

    /// Returns the slot with the given ID, whichever list it is on.
    pub fn slot(&self, id: WatchId) -> &Watchpoint {
        &self.slots[id.index()]
    }

    /// Re-evaluates every active watchpoint, recording and reporting each
    /// value that differs from the last one seen.  Watchpoints whose
    /// expression cannot be evaluated are skipped and left untouched.
    pub fn check_all(&mut self, proc: &dyn SimProc) -> WatchReport {
        let mut report = WatchReport::default();
        let mut cursor = self.active_head;
        while let Some(index) = cursor {
            let slot = &mut self.slots[usize::from(index)];
            cursor = slot.next;
            match evaluate(&slot.expression, proc) {
                Ok(value) if value != slot.last_value => {
                    report.changes.push(WatchChange {
                        id: slot.id,
                        expression: slot.expression.clone(),
                        old_value: slot.last_value,
                        new_value: value,
                    });
                    slot.last_value = value;
                }
                Ok(_) => {}
                Err(error) => {
                    log::warn!(
                        "skipping watchpoint {} ({}): {}",
                        slot.id,
                        slot.expression,
                        error
                    );
                    report.failures.push(WatchFailure {
                        id: slot.id,
                        expression: slot.expression.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Evaluates every active watchpoint without recording anything.
    pub fn list_all(&self, proc: &dyn SimProc) -> Vec<WatchListing> {
        self.active()
            .map(|slot| WatchListing {
                id: slot.id,
                expression: slot.expression.clone(),
                value: evaluate(&slot.expression, proc),
            })
            .collect()
    }
}

impl Default for WatchPool {
    fn default() -> WatchPool {
        WatchPool::new()
    }
}

//===========================================================================//


//===========================================================================//
