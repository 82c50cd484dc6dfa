/*!
  An interpreter for tinyAsm, a toy assembly language with four operations (`ADD`, `SUB`, `STR`,
  `BNE`) over ten integer slots named `A` through `J`.

  Interpretation has two stages. `parse` turns source text into a `Program`, an instruction
  sequence plus a label table, rejecting the whole text at the first bad line. A `Machine` then
  executes a `Program` one instruction at a time:

  ```rust
  use tinyasm::{Machine, Slot};

  let mut machine = Machine::new();
  machine.load("STR 0 A\nSTR 3 B\nSTR 1 C\n>loop\nADD C A\nBNE A B loop").unwrap();
  machine.run().unwrap();
  assert_eq!(machine.slot(Slot::A), Some(3));
  ```

  With the `trace_computation` feature enabled, the machine prints each instruction it executes
  followed by a table of its state.
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
mod labeltable;
mod machine;
mod program;
mod slot;

pub use bytecode::{
  ArgType, ArgumentError, Instruction, Operation, Param, ParseError, ParseErrorKind,
  COMMENT_CHAR, LABEL_CHAR
};
pub use labeltable::LabelTable;
pub use machine::{ExecError, Machine, State};
pub use program::Program;
pub use slot::{Slot, SlotContents, SlotStore, Value, SLOT_COUNT};

/// Parses assembly text into a program. See `bytecode::parse_assembly`.
pub fn parse(text: &str) -> Result<Program, ParseError> {
  bytecode::parse_assembly(text)
}
