//! The ten named storage slots of the machine and the store holding their values.

use std::fmt::{Display, Formatter};
use std::ops::Index;

use num_enum::IntoPrimitive;
use strum::IntoEnumIterator;
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// The contents of a slot. Arithmetic on values wraps on overflow.
pub type Value = i64;

pub const SLOT_COUNT: usize = 10;

/**
  Slot identifiers. Slots are named by the first ten upper-case letters, and the text form of a
  slot is exactly its letter. The discriminant doubles as the index into the `SlotStore`, so the
  order of the variants is significant.
*/
#[derive(
  StrumDisplay, EnumString, EnumIter, IntoStaticStr, IntoPrimitive,
  Clone,        Copy,       Eq,       PartialEq,     Ord, PartialOrd, Debug, Hash
)]
#[repr(u8)]
pub enum Slot {
  A,
  B,
  C,
  D,
  E,
  F,
  G,
  H,
  I,
  J,
}

impl Slot {
  /// Converts the slot to an index into the `SlotStore`.
  pub fn idx(&self) -> usize {
    Into::<u8>::into(*self) as usize
  }
}


/**
  Holds the value of every slot. A slot is empty until it is first written, and emptiness is a
  distinct state from holding zero. Slots are only ever overwritten, never cleared, except by
  resetting the whole store when a new program is loaded.
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SlotStore {
  values: [Option<Value>; SLOT_COUNT]
}

impl SlotStore {

  pub fn new() -> SlotStore {
    SlotStore {
      values: [None; SLOT_COUNT]
    }
  }

  pub fn get(&self, slot: Slot) -> Option<Value> {
    self.values[slot.idx()]
  }

  pub fn set(&mut self, slot: Slot, value: Value) {
    self.values[slot.idx()] = Some(value);
  }

  pub fn is_empty(&self, slot: Slot) -> bool {
    self.values[slot.idx()].is_none()
  }

  /// Empties every slot.
  pub fn clear(&mut self) {
    self.values = [None; SLOT_COUNT];
  }

  /// Iterates over all ten slots in order, empty or not.
  pub fn iter(&self) -> impl Iterator<Item = (Slot, Option<Value>)> + '_ {
    Slot::iter().zip(self.values.iter().copied())
  }

}

impl Index<Slot> for SlotStore {
  type Output = Option<Value>;

  fn index(&self, slot: Slot) -> &Option<Value> {
    &self.values[slot.idx()]
  }
}

/// Displays the contents of a single slot, which may be empty.
pub struct SlotContents(pub Option<Value>);

impl Display for SlotContents {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.0 {
      Some(value) => write!(f, "{}", value),
      None        => write!(f, "empty")
    }
  }
}
