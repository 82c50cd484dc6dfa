/*!
  The instruction registry. The set of operations is fixed: each operation has a name, which is
  its text form in assembly, and an ordered list of typed parameters. The semantics of each
  operation live in `Machine::evaluate`, which matches exhaustively on `Operation`.

  | Op  | Params                           | Semantics                                  |
  |-----|----------------------------------|--------------------------------------------|
  | ADD | slot1: slot, slot2: slot         | slot2 += slot1                             |
  | SUB | slot1: slot, slot2: slot         | slot2 -= slot1                             |
  | STR | number: number, slot: slot       | slot := number                             |
  | BNE | slot1: slot, slot2: slot, label  | if slot1 != slot2, jump to label           |
*/

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// The kinds of argument an operation can take.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum ArgType {
  #[strum(serialize = "number")]
  Number,
  #[strum(serialize = "slot")]
  Slot,
  #[strum(serialize = "label")]
  Label,
}

/// A named, typed parameter of an operation.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct Param {
  pub name : &'static str,
  pub kind : ArgType,
}

static TWO_SLOT_PARAMS: [Param; 2] = [
  Param{ name: "slot1", kind: ArgType::Slot },
  Param{ name: "slot2", kind: ArgType::Slot },
];

static STORE_PARAMS: [Param; 2] = [
  Param{ name: "number", kind: ArgType::Number },
  Param{ name: "slot",   kind: ArgType::Slot   },
];

static BRANCH_PARAMS: [Param; 3] = [
  Param{ name: "slot1", kind: ArgType::Slot  },
  Param{ name: "slot2", kind: ArgType::Slot  },
  Param{ name: "label", kind: ArgType::Label },
];

/// Opcodes of the machine. The text form is case-sensitive.
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter,
  Clone,        Copy,          Eq,         PartialEq, Debug, Hash
)]
pub enum Operation {
  #[strum(serialize = "ADD")]
  Add,   // ADD slot1 slot2
  #[strum(serialize = "SUB")]
  Sub,   // SUB slot1 slot2
  #[strum(serialize = "STR")]
  Str,   // STR number slot
  #[strum(serialize = "BNE")]
  Bne,   // BNE slot1 slot2 label
}

impl Operation {

  pub fn params(&self) -> &'static [Param] {
    match self {
      Operation::Add | Operation::Sub => &TWO_SLOT_PARAMS,
      Operation::Str                  => &STORE_PARAMS,
      Operation::Bne                  => &BRANCH_PARAMS,
    }
  }

  pub fn arity(&self) -> usize {
    self.params().len()
  }

  /// Whether the operation may set the program counter to something other than `pc + 1`.
  pub fn is_branch(&self) -> bool {
    self.params().iter().any(|p| p.kind == ArgType::Label)
  }

}
