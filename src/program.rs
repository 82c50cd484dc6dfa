//! A `Program` is everything the parser produces: the instruction sequence and its label table.

use std::fmt::{Display, Formatter};

use crate::bytecode::{Instruction, LABEL_CHAR};
use crate::labeltable::LabelTable;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
  instructions : Vec<Instruction>,
  labels       : LabelTable
}

impl Program {

  /// Every label must refer to an index no greater than `instructions.len()`.
  pub(crate) fn new(instructions: Vec<Instruction>, labels: LabelTable) -> Program {
    Program{ instructions, labels }
  }

  pub fn instructions(&self) -> &[Instruction] {
    &self.instructions
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  pub fn get(&self, index: usize) -> Option<&Instruction> {
    self.instructions.get(index)
  }

  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

}

/**
  Writes the program back out as source text: each label on its own line before the instruction
  it refers to, followed by the instructions one per line. Comments and the original spacing are
  not preserved, but the text parses back to an equal `Program`.
*/
impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    // Labels may point one past the last instruction.
    for index in 0..=self.instructions.len() {
      for label in self.labels.labels_at(index) {
        writeln!(f, "{}{}", LABEL_CHAR, label)?;
      }
      if let Some(instruction) = self.instructions.get(index) {
        writeln!(f, "{}", instruction)?;
      }
    }
    Ok(())
  }
}
