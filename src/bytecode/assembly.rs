/*!
  The human readable textual form of a program is called assembly. Assembly is line oriented:

  ```text
  STR 10 B      # store 10 in slot B
  >loop         # the label `loop` refers to the next instruction
  ADD C A
  BNE A B loop
  ```

  Everything from the comment character to the end of a line is ignored, as is surrounding
  whitespace, and blank lines are skipped. A line starting with the label character declares a
  label. Any other line is an operation name followed by whitespace separated arguments. Labels
  are recorded as they are declared and are only looked up when a branch executes, so branches
  may refer to labels declared later in the program.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use string_cache::DefaultAtom;
use nom::{
  IResult,
  bytes::complete::{take_till1, take_while1},
  combinator::all_consuming,
  multi::separated_list
};

use crate::bytecode::{
  check_argument, check_label,
  ArgumentError, Instruction, Operation, COMMENT_CHAR, LABEL_CHAR
};
use crate::labeltable::LabelTable;
use crate::program::Program;

/// The ways a single line of assembly can be wrong.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
  NotAnOperation(String),
  WrongArity{
    operation : Operation,
    args      : Vec<String>
  },
  BadArgument{
    operation : Operation,
    param     : &'static str,
    error     : ArgumentError
  },
  BadLabel(ArgumentError),
}

impl Display for ParseErrorKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      ParseErrorKind::NotAnOperation(name) => {
        write!(f, "{} is not an operation.", name)
      }

      ParseErrorKind::WrongArity{operation, args} => {
        write!(f,
          "{} requires {} arguments but was given {}: ({})",
          operation, operation.arity(), args.len(), args.join(", ")
        )
      }

      ParseErrorKind::BadArgument{operation, param, error} => {
        write!(f, "argument `{}` of {}: {}", param, operation, error)
      }

      ParseErrorKind::BadLabel(error) => {
        write!(f, "bad label declaration: {}", error)
      }

    }
  }
}

/// A parse failure, attributed to the line it occurred on as it appeared in the source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
  /// Counts from 1.
  pub line : usize,
  pub text : String,
  pub kind : ParseErrorKind
}

impl Display for ParseError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Error on line {} (\"{}\"): {}", self.line, self.text, self.kind)
  }
}

impl std::error::Error for ParseError {}


/// Splits a line into its whitespace separated tokens. Whitespace means the same thing here as
/// it does to `str::trim`.
fn tokens(line: &str) -> IResult<&str, Vec<&str>> {
  all_consuming(
    separated_list(take_while1(char::is_whitespace), take_till1(char::is_whitespace))
  )(line)
}

/// Removes the comment, if any, and surrounding whitespace.
fn strip_line(line: &str) -> &str {
  let code = match line.find(COMMENT_CHAR) {
    Some(idx) => &line[..idx],
    None      => line
  };
  code.trim()
}

/// Parses a stripped, nonempty line that is not a label declaration.
fn parse_instruction(line: &str) -> Result<Instruction, ParseErrorKind> {
  let words = match tokens(line) {
    Ok((_rest, words)) => words,
    Err(_e)            => return Err(ParseErrorKind::NotAnOperation(line.to_string()))
  };
  let (name, args) = match words.split_first() {
    Some(split) => split,
    None        => return Err(ParseErrorKind::NotAnOperation(line.to_string()))
  };

  let operation = match Operation::from_str(name) {
    Ok(operation) => operation,
    Err(_e)       => return Err(ParseErrorKind::NotAnOperation(name.to_string()))
  };

  if args.len() != operation.arity() {
    return Err(ParseErrorKind::WrongArity {
      operation,
      args: args.iter().map(|a| a.to_string()).collect()
    });
  }

  // Positional order, stopping at the first bad argument.
  for (param, arg) in operation.params().iter().zip(args.iter()) {
    check_argument(arg, param.kind).map_err(|error| {
      ParseErrorKind::BadArgument{ operation, param: param.name, error }
    })?;
  }

  Ok(Instruction::new(
    operation,
    args.iter().map(|a| DefaultAtom::from(*a)).collect()
  ))
}

/**
  Parses an entire program. Parsing stops at the first bad line, and nothing parsed before it is
  kept. The returned error carries the line exactly as it appeared, comment and all.
*/
pub fn parse_assembly(text: &str) -> Result<Program, ParseError> {
  let mut instructions: Vec<Instruction> = Vec::new();
  let mut labels = LabelTable::new();

  for (idx, raw_line) in text.lines().enumerate() {
    let line = strip_line(raw_line);
    if line.is_empty() {
      continue;
    }

    let result =
      match line.strip_prefix(LABEL_CHAR) {

        Some(label) => {
          let label = label.trim();
          match check_label(label) {

            Ok(()) => {
              let _previous = labels.insert(DefaultAtom::from(label), instructions.len());
              #[cfg(feature = "trace_computation")]
                {
                  if let Some(previous) = _previous {
                    println!(
                      "Label {} on line {} replaces its declaration at instruction {}.",
                      label, idx + 1, previous
                    );
                  }
                }
              Ok(())
            }

            Err(error) => Err(ParseErrorKind::BadLabel(error))

          }
        }

        None => {
          parse_instruction(line).map(|instruction| instructions.push(instruction))
        }

      }; // end match on label prefix

    if let Err(kind) = result {
      return Err(ParseError{
        line: idx + 1,
        text: raw_line.to_string(),
        kind
      });
    }
  }

  Ok(Program::new(instructions, labels))
}
