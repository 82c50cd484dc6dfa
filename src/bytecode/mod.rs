/*!
  The textual instruction set. `operation` holds the registry of opcodes and their signatures,
  `typecheck` validates argument tokens against a signature, and `assembly` turns source text
  into a `Program` using both.
*/

mod assembly;
mod instruction;
mod operation;
mod typecheck;

pub use assembly::{parse_assembly, ParseError, ParseErrorKind};
pub use instruction::Instruction;
pub use operation::{ArgType, Operation, Param};
pub use typecheck::{
  check_argument, check_label, check_number, check_slot,
  ArgumentError, COMMENT_CHAR, LABEL_CHAR
};
