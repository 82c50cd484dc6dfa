//! A parsed instruction is an operation together with its raw argument tokens.

use std::fmt::{Display, Formatter};

use string_cache::DefaultAtom;

use crate::bytecode::{Operation, Param};

/**
  Arguments are kept as the (interned) tokens that appeared in the source. They are checked for
  syntax when the instruction is parsed but are only converted to slots, numbers, and label
  targets when the instruction is executed, so that execution errors can name the operand.
*/
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Instruction {
  operation : Operation,
  args      : Vec<DefaultAtom>
}

impl Instruction {

  pub(crate) fn new(operation: Operation, args: Vec<DefaultAtom>) -> Instruction {
    Instruction{ operation, args }
  }

  pub fn operation(&self) -> Operation {
    self.operation
  }

  pub fn args(&self) -> &[DefaultAtom] {
    &self.args
  }

  /// The token at the given position, if there is one.
  pub fn arg(&self, position: usize) -> Option<&str> {
    self.args.get(position).map(|atom| &**atom)
  }

  /// Pairs each token with the parameter it was given for.
  pub fn operands(&self) -> impl Iterator<Item = (&'static Param, &str)> + '_ {
    self.operation
        .params()
        .iter()
        .zip(self.args.iter().map(|atom| &**atom))
  }

}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.operation)?;
    for arg in self.args.iter() {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}
