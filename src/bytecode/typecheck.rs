/*!
  Validation of a single textual argument against the type its parameter declares. The checker
  only reports what is wrong with the token; the parser attaches the line it came from.

  * `number`: an optional sign followed by decimal digits, within the range of `Value`.
  * `slot`:   exactly one of the letters `A` through `J`.
  * `label`:  any text without whitespace, the comment character, or the label character.
              The empty label is legal; a bare label declaration line declares it.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::{
  IResult,
  character::complete::{digit1, one_of},
  combinator::{all_consuming, opt, recognize},
  sequence::pair
};

use crate::bytecode::ArgType;
use crate::slot::{Slot, Value};

/// Starts a comment that runs to the end of the line.
pub const COMMENT_CHAR: char = '#';
/// Starts a label declaration line.
pub const LABEL_CHAR: char = '>';

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ArgumentError {
  NotANumber(String),
  NumberOutOfRange(String),
  NotASlot(String),
  ReservedCharacter{
    label    : String,
    reserved : char
  },
}

impl Display for ArgumentError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      ArgumentError::NotANumber(token) => {
        write!(f, "`{}` is not an integer.", token)
      }

      ArgumentError::NumberOutOfRange(token) => {
        write!(
          f, "`{}` is outside the range {} to {}.",
          token, Value::MIN, Value::MAX
        )
      }

      ArgumentError::NotASlot(token) => {
        write!(f, "`{}` is not a slot. Slots are the single letters A through J.", token)
      }

      ArgumentError::ReservedCharacter {label, reserved} => {
        match reserved.is_whitespace() {
          true  => write!(f, "label `{}` may not contain whitespace.", label),
          false => write!(f, "label `{}` may not contain `{}`.", label, reserved)
        }
      }

    }
  }
}

impl std::error::Error for ArgumentError {}


/// Recognizes an optionally signed run of decimal digits.
fn integer_literal(input: &str) -> IResult<&str, &str> {
  recognize(pair(opt(one_of("+-")), digit1))(input)
}

pub fn check_argument(token: &str, kind: ArgType) -> Result<(), ArgumentError> {
  match kind {
    ArgType::Number => check_number(token),
    ArgType::Slot   => check_slot(token),
    ArgType::Label  => check_label(token),
  }
}

pub fn check_number(token: &str) -> Result<(), ArgumentError> {
  if all_consuming(integer_literal)(token).is_err() {
    return Err(ArgumentError::NotANumber(token.to_string()));
  }
  // The syntax is right, so the only way left to fail is overflow.
  match token.parse::<Value>() {
    Ok(_)  => Ok(()),
    Err(_) => Err(ArgumentError::NumberOutOfRange(token.to_string()))
  }
}

pub fn check_slot(token: &str) -> Result<(), ArgumentError> {
  match Slot::from_str(token) {
    Ok(_)  => Ok(()),
    Err(_) => Err(ArgumentError::NotASlot(token.to_string()))
  }
}

pub fn check_label(token: &str) -> Result<(), ArgumentError> {
  let reserved =
    token.chars()
         .find(|c| c.is_whitespace() || *c == COMMENT_CHAR || *c == LABEL_CHAR);
  match reserved {
    Some(reserved) => Err(ArgumentError::ReservedCharacter {
      label: token.to_string(),
      reserved
    }),
    None           => Ok(())
  }
}
