//! Variable slots: allocation of definition ids and offsets, cached values.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mfvars_wire::FLOAT_SIZE;

use crate::error::{ClientError, Result};

/// Cached value of a remote variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SimValue {
    /// No usable sample yet.
    #[default]
    Unknown,
    /// The remote side reported a real zero.
    ConfirmedZero,
    /// Any other reported value.
    Value(f32),
}

impl SimValue {
    /// Classify an accepted sample.
    pub fn from_sample(value: f32) -> Self {
        if value == 0.0 {
            SimValue::ConfirmedZero
        } else {
            SimValue::Value(value)
        }
    }

    /// The numeric reading, or `None` while unknown.
    pub fn as_f32(self) -> Option<f32> {
        match self {
            SimValue::Unknown => None,
            SimValue::ConfirmedZero => Some(0.0),
            SimValue::Value(value) => Some(value),
        }
    }

    /// Returns true once a reading is available.
    pub fn is_known(self) -> bool {
        !matches!(self, SimValue::Unknown)
    }
}

impl fmt::Display for SimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimValue::Unknown => f.write_str("unknown"),
            SimValue::ConfirmedZero => f.write_str("0"),
            SimValue::Value(value) => write!(f, "{value}"),
        }
    }
}

/// Identity and cached state of one remote variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSlot {
    /// Variable expression exactly as requested.
    pub name: String,
    /// Definition id; assigned once, never reused.
    pub id: u32,
    /// Byte offset inside the variables area.
    pub offset: u32,
    /// Cached value.
    pub value: SimValue,
    /// Set by the first notification, even a suppressed one.
    pub ready: bool,
}

/// Result of [`VariableStore::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub id: u32,
    pub offset: u32,
    /// True when the slot was created by this call.
    pub is_new: bool,
}

/// What a sample did to its slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Initial zero treated as uninitialized memory; only readiness was set.
    Suppressed,
    /// The sample became the slot value.
    Stored(SimValue),
}

/// Mapping from variable name to slot.
///
/// Offsets are handed out densely in allocation order and restart at zero after
/// [`clear`](Self::clear). Definition ids keep counting up across clears so a
/// late notification for a cleared slot can never land on a new one.
#[derive(Debug)]
pub struct VariableStore {
    capacity: usize,
    next_id: u32,
    next_offset: u32,
    by_name: HashMap<String, u32>,
    slots: HashMap<u32, VariableSlot>,
}

impl VariableStore {
    /// Create an empty store handing out ids from `base_id` with room for
    /// `capacity` slots.
    pub fn new(base_id: u32, capacity: usize) -> Self {
        Self {
            capacity,
            next_id: base_id,
            next_offset: 0,
            by_name: HashMap::new(),
            slots: HashMap::new(),
        }
    }

    /// Resolve a name to its slot, creating the slot on first reference.
    pub fn allocate(&mut self, name: &str) -> Result<Allocation> {
        if let Some(slot) = self.by_name.get(name).and_then(|id| self.slots.get(id)) {
            return Ok(Allocation {
                id: slot.id,
                offset: slot.offset,
                is_new: false,
            });
        }

        let index = self.next_offset as usize / FLOAT_SIZE;
        if index >= self.capacity {
            return Err(ClientError::CapacityExceeded {
                requested: index + 1,
                capacity: self.capacity,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let offset = self.next_offset;
        self.next_offset += FLOAT_SIZE as u32;
        self.by_name.insert(name.to_string(), id);
        self.slots.insert(
            id,
            VariableSlot {
                name: name.to_string(),
                id,
                offset,
                value: SimValue::Unknown,
                ready: false,
            },
        );

        Ok(Allocation {
            id,
            offset,
            is_new: true,
        })
    }

    /// Slot for a variable name.
    pub fn lookup(&self, name: &str) -> Option<&VariableSlot> {
        self.by_name.get(name).and_then(|id| self.slots.get(id))
    }

    /// Slot for a definition id.
    pub fn slot(&self, id: u32) -> Option<&VariableSlot> {
        self.slots.get(&id)
    }

    /// Returns true if a live slot owns the definition id.
    pub fn contains(&self, id: u32) -> bool {
        self.slots.contains_key(&id)
    }

    /// Apply a decoded sample. Returns `None` for ids without a live slot.
    ///
    /// A first sample of exactly zero only marks the slot ready; every later
    /// sample, zero included, is stored.
    pub fn record_sample(&mut self, id: u32, value: f32) -> Option<SampleOutcome> {
        let slot = self.slots.get_mut(&id)?;
        if !slot.ready && value == 0.0 {
            slot.ready = true;
            return Some(SampleOutcome::Suppressed);
        }
        slot.ready = true;
        slot.value = SimValue::from_sample(value);
        Some(SampleOutcome::Stored(slot.value))
    }

    /// Promote a ready slot that never reported past its initial zero.
    pub fn confirm_zero(&mut self, id: u32) -> SimValue {
        match self.slots.get_mut(&id) {
            Some(slot) if slot.ready && !slot.value.is_known() => {
                slot.value = SimValue::ConfirmedZero;
                slot.value
            }
            Some(slot) => slot.value,
            None => SimValue::Unknown,
        }
    }

    /// Take back a slot whose setup did not complete.
    ///
    /// The id is retired. The offset is handed out again when the slot was
    /// the most recent allocation.
    pub fn discard(&mut self, id: u32) -> Option<VariableSlot> {
        let slot = self.slots.remove(&id)?;
        self.by_name.remove(&slot.name);
        if slot.offset + FLOAT_SIZE as u32 == self.next_offset {
            self.next_offset = slot.offset;
        }
        Some(slot)
    }

    /// Drop every slot at once. The id sequence continues.
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.slots.clear();
        self.next_offset = 0;
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Snapshot of the live slots in offset order.
    pub fn snapshot(&self) -> Vec<VariableSlot> {
        let mut slots: Vec<VariableSlot> = self.slots.values().cloned().collect();
        slots.sort_by_key(|slot| slot.offset);
        slots
    }
}

pub(crate) fn lock(store: &Mutex<VariableStore>) -> MutexGuard<'_, VariableStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
