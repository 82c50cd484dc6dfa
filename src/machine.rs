//! The execution engine. A `Machine` owns one loaded program together with the slot store and
//! program counter it mutates, and executes the program one instruction at a time.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use prettytable::{format as TableFormat, Table};
use string_cache::DefaultAtom;
use strum_macros::Display as StrumDisplay;

use crate::bytecode::{parse_assembly, Instruction, Operation, ParseError, Param, LABEL_CHAR};
use crate::labeltable::LabelTable;
use crate::program::Program;
use crate::slot::{Slot, SlotContents, SlotStore, Value};

/**
  The lifecycle of a machine:

    ```text
    Idle --load--> Ready --step*--> Complete
                     │
                     └--failed step--> Halted
    ```

  Loading an empty program goes straight to `Complete`. A failed `load` always returns the
  machine to `Idle`.
*/
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum State {
  /// No program is loaded.
  Idle,
  /// The next step will execute the instruction at `pc`.
  Ready,
  /// The last step failed and left `pc` on the offending instruction.
  Halted,
  /// `pc` is one past the last instruction.
  Complete,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExecError {
  /// An operand names a slot that has never been written.
  EmptySlot{
    operand : &'static str,
    slot    : Slot
  },
  /// A branch names a label that was never declared.
  UndefinedLabel{
    label: DefaultAtom
  },
  /// The operand token cannot be coerced to its declared type. Parsed programs never have these.
  MalformedOperand{
    operation : Operation,
    operand   : &'static str,
    token     : String
  },
  NoProgram,
  Finished,
}

impl Display for ExecError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      ExecError::EmptySlot{operand, slot} => {
        write!(f, "{}: slot {} is empty.", operand, slot)
      }

      ExecError::UndefinedLabel{label} => {
        write!(f, "label: `{}` is not defined.", label)
      }

      ExecError::MalformedOperand{operation, operand, token} => {
        write!(f, "{} of {}: `{}` cannot be used here.", operand, operation, token)
      }

      ExecError::NoProgram => {
        write!(f, "No program is loaded.")
      }

      ExecError::Finished => {
        write!(f, "The program has already run to completion.")
      }

    }
  }
}

impl std::error::Error for ExecError {}


/// What a single instruction does to the machine. Applied only once the whole instruction has
/// been evaluated without error.
struct Effect {
  write   : Option<(Slot, Value)>,
  next_pc : usize
}


pub struct Machine {
  program : Program,
  slots   : SlotStore,
  pc      : usize, // Program Counter
  loaded  : bool,
  error   : Option<ExecError>,
}

impl Machine {

  // region Display methods

  fn make_table<T> (
      titles    : (&str, &str),
      rows      : &[(String, T)],
      highlight : Option<usize>
    ) -> Table
    where T: Display
  {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->titles.0, ubl->titles.1]);

    for (i, (name, contents)) in rows.iter().enumerate() {
      match highlight == Some(i) {

        true  => {
          table.add_row(row![r->format!("* --> {}", name), format!("{}", contents)]);
        }

        false => {
          table.add_row(row![r->name, format!("{}", contents)]);
        }

      } // end match on highlight
    } // end for
    table
  }

  // endregion

  // region Session management

  /// A machine with no program loaded.
  pub fn new() -> Machine {
    Machine {
      program :  Program::default(),
      slots   :  SlotStore::new(),
      pc      :  0,
      loaded  :  false,
      error   :  None,
    }
  }

  /// A machine ready to run an already parsed program from the beginning.
  pub fn with_program(program: Program) -> Machine {
    Machine {
      program,
      slots   :  SlotStore::new(),
      pc      :  0,
      loaded  :  true,
      error   :  None,
    }
  }

  /**
    Parses `text` and starts a fresh session for it: every slot is emptied and `pc` is reset to
    zero. If parsing fails the previous program is discarded as well and the machine is left
    `Idle`.
  */
  pub fn load(&mut self, text: &str) -> Result<(), ParseError> {
    match parse_assembly(text) {

      Ok(program) => {
        *self = Machine::with_program(program);
        #[cfg(feature = "trace_computation")]
          println!("Loaded {} instructions.\n{}", self.program.len(), self);
        Ok(())
      }

      Err(e) => {
        *self = Machine::new();
        #[cfg(feature = "trace_computation")] println!("{}", e);
        Err(e)
      }

    }
  }

  // endregion

  // region Queries

  pub fn state(&self) -> State {
    if !self.loaded {
      State::Idle
    } else if self.pc >= self.program.len() {
      State::Complete
    } else if self.error.is_some() {
      State::Halted
    } else {
      State::Ready
    }
  }

  pub fn pc(&self) -> usize {
    self.pc
  }

  pub fn slots(&self) -> &SlotStore {
    &self.slots
  }

  pub fn slot(&self, slot: Slot) -> Option<Value> {
    self.slots.get(slot)
  }

  pub fn program(&self) -> &Program {
    &self.program
  }

  pub fn instructions(&self) -> &[Instruction] {
    self.program.instructions()
  }

  pub fn labels(&self) -> &LabelTable {
    self.program.labels()
  }

  /// The instruction the next step will execute.
  pub fn current_instruction(&self) -> Option<&Instruction> {
    self.program.get(self.pc)
  }

  /// The error from the most recent step, if that step failed.
  pub fn last_error(&self) -> Option<&ExecError> {
    self.error.as_ref()
  }

  // endregion

  // region Execution

  /**
    Executes the instruction at `pc`. On success `pc` has moved to the next instruction to
    execute, which for a taken branch is the label's target. On failure neither `pc` nor any
    slot has changed, and the machine is `Halted`. Stepping a halted machine executes the same
    instruction again, which fails the same way, since nothing outside the program can change
    the machine's state.
  */
  pub fn step(&mut self) -> Result<(), ExecError> {
    match self.state() {
      State::Idle     => return Err(ExecError::NoProgram),
      State::Complete => return Err(ExecError::Finished),
      _               => {}
    }

    let result = match self.program.get(self.pc) {
      Some(instruction) => {
        #[cfg(feature = "trace_computation")] println!("{:>4}: {}", self.pc, instruction);
        self.evaluate(instruction)
      }
      // Unreachable given the state check above.
      None => Err(ExecError::Finished)
    };

    match result {

      Ok(effect) => {
        if let Some((slot, value)) = effect.write {
          self.slots.set(slot, value);
        }
        self.pc    = effect.next_pc;
        self.error = None;
        #[cfg(feature = "trace_computation")] println!("{}", self);
        Ok(())
      }

      Err(e) => {
        #[cfg(feature = "trace_computation")] println!("Error at instruction {}: {}", self.pc, e);
        self.error = Some(e.clone());
        Err(e)
      }

    }
  }

  /// Steps until the program completes or a step fails.
  pub fn run(&mut self) -> Result<(), ExecError> {
    while self.state() != State::Complete {
      self.step()?;
    }
    Ok(())
  }

  /// Computes the effect of `instruction` without changing the machine.
  fn evaluate(&self, instruction: &Instruction) -> Result<Effect, ExecError> {
    let next = self.pc + 1;

    match instruction.operation() {

      Operation::Add => {
        let addend = self.read_slot(instruction, 0)?;
        let (slot, value) = self.target_slot(instruction, 1)?;
        Ok(Effect{ write: Some((slot, value.wrapping_add(addend))), next_pc: next })
      }

      Operation::Sub => {
        let subtrahend = self.read_slot(instruction, 0)?;
        let (slot, value) = self.target_slot(instruction, 1)?;
        Ok(Effect{ write: Some((slot, value.wrapping_sub(subtrahend))), next_pc: next })
      }

      Operation::Str => {
        let number = self.read_number(instruction, 0)?;
        let slot   = self.coerce_slot(instruction, 1)?;
        Ok(Effect{ write: Some((slot, number)), next_pc: next })
      }

      Operation::Bne => {
        let left   = self.read_slot(instruction, 0)?;
        let right  = self.read_slot(instruction, 1)?;
        let target = self.resolve_label(instruction, 2)?;
        let next_pc = match left == right {
          true  => next,
          false => target
        };
        Ok(Effect{ write: None, next_pc })
      }

    } // end match on operation
  }

  // endregion

  // region Operand coercion

  /// The parameter at `position` and the token given for it.
  fn operand<'i>(instruction: &'i Instruction, position: usize)
    -> Result<(&'static Param, &'i str), ExecError>
  {
    let operation = instruction.operation();
    match (operation.params().get(position), instruction.arg(position)) {
      (Some(param), Some(token)) => Ok((param, token)),
      (param, token)             => Err(ExecError::MalformedOperand {
        operation,
        operand : param.map_or("operand", |p| p.name),
        token   : token.unwrap_or("").to_string()
      })
    }
  }

  fn coerce_slot(&self, instruction: &Instruction, position: usize) -> Result<Slot, ExecError> {
    let (param, token) = Machine::operand(instruction, position)?;
    Slot::from_str(token).map_err(|_| ExecError::MalformedOperand {
      operation : instruction.operation(),
      operand   : param.name,
      token     : token.to_string()
    })
  }

  /// Reads a slot that must already hold a value.
  fn read_slot(&self, instruction: &Instruction, position: usize) -> Result<Value, ExecError> {
    let (param, _token) = Machine::operand(instruction, position)?;
    let slot = self.coerce_slot(instruction, position)?;
    self.slots.get(slot).ok_or(ExecError::EmptySlot{ operand: param.name, slot })
  }

  /// A slot that is both read and written, along with its current value.
  fn target_slot(&self, instruction: &Instruction, position: usize)
    -> Result<(Slot, Value), ExecError>
  {
    let value = self.read_slot(instruction, position)?;
    let slot  = self.coerce_slot(instruction, position)?;
    Ok((slot, value))
  }

  fn read_number(&self, instruction: &Instruction, position: usize) -> Result<Value, ExecError> {
    let (param, token) = Machine::operand(instruction, position)?;
    token.parse::<Value>().map_err(|_| ExecError::MalformedOperand {
      operation : instruction.operation(),
      operand   : param.name,
      token     : token.to_string()
    })
  }

  fn resolve_label(&self, instruction: &Instruction, position: usize) -> Result<usize, ExecError> {
    let (_param, token) = Machine::operand(instruction, position)?;
    // A target past the end would leave `pc` outside the program.
    match self.program.labels().get(token) {
      Some(target) if target <= self.program.len() => Ok(target),
      _ => Err(ExecError::UndefinedLabel{ label: DefaultAtom::from(token) })
    }
  }

  // endregion

}

impl Default for Machine {
  fn default() -> Machine {
    Machine::new()
  }
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let slot_rows: Vec<(String, SlotContents)> =
      self.slots
          .iter()
          .map(|(slot, value)| (format!("{} =", slot), SlotContents(value)))
          .collect();

    let code_rows: Vec<(String, String)> =
      self.program
          .instructions()
          .iter()
          .enumerate()
          .map(|(i, instruction)| {
            let labels: Vec<String> =
              self.program
                  .labels()
                  .labels_at(i)
                  .iter()
                  .map(|label| label.to_string())
                  .collect();
            let name = match labels.is_empty() {
              true  => format!("{}", i),
              false => format!("{}{} {}", LABEL_CHAR, labels.join(" "), i)
            };
            (name, instruction.to_string())
          })
          .collect();

    let slot_table = Machine::make_table(("Slot", "Contents"), &slot_rows, None);
    let code_table = Machine::make_table(("Address", "Instruction"), &code_rows, Some(self.pc));

    let mut combined_table = table!([slot_table, code_table]);

    combined_table.set_titles(row![ub->"Slots", ub->"Code"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let status = match &self.error {
      Some(e) => format!("{}: {}", self.state(), e),
      None    => format!("{}", self.state())
    };

    write!(f, "State: {}\tpc = {}\n{}", status, self.pc, combined_table)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  const COUNTING_LOOP: &str = "STR 0 A\nSTR 10 B\nSTR 1 C\n>loop\nADD C A\nBNE A B loop\n";

  fn loaded(text: &str) -> Machine {
    let mut machine = Machine::new();
    machine.load(text).unwrap();
    machine
  }

  #[test]
  fn counting_loop_runs_to_completion(){
    let mut machine = loaded(COUNTING_LOOP);
    assert_eq!(machine.state(), State::Ready);

    assert_eq!(machine.run(), Ok(()));

    assert_eq!(machine.slot(Slot::A), Some(10));
    assert_eq!(machine.slot(Slot::B), Some(10));
    assert_eq!(machine.slot(Slot::C), Some(1));
    assert_eq!(machine.slot(Slot::D), None);
    assert_eq!(machine.pc(), 5);
    assert_eq!(machine.state(), State::Complete);
  }

  #[test]
  fn stepping_moves_pc(){
    let mut machine = loaded(COUNTING_LOOP);
    let mut pcs = vec![machine.pc()];
    for _ in 0..6 {
      machine.step().unwrap();
      pcs.push(machine.pc());
    }
    // The first pass through the loop branches back.
    assert_eq!(pcs, vec![0, 1, 2, 3, 4, 3, 4]);
    assert_eq!(machine.slot(Slot::A), Some(2));
  }

  #[test]
  fn add_from_empty_slot(){
    let mut machine = loaded("ADD A B");

    let error = machine.step().unwrap_err();

    assert_eq!(error, ExecError::EmptySlot{ operand: "slot1", slot: Slot::A });
    assert!(error.to_string().contains("slot A is empty"));
    assert_eq!(machine.pc(), 0);
    assert_eq!(machine.state(), State::Halted);
    assert_eq!(machine.last_error(), Some(&error));
  }

  #[test]
  fn add_to_empty_slot(){
    let mut machine = loaded("STR 1 A\nADD A B");
    machine.step().unwrap();

    let error = machine.step().unwrap_err();

    assert_eq!(error, ExecError::EmptySlot{ operand: "slot2", slot: Slot::B });
    assert_eq!(machine.pc(), 1);
    assert_eq!(machine.slot(Slot::B), None);
  }

  #[test]
  fn halted_machine_fails_again(){
    let mut machine = loaded("SUB C D");
    let first = machine.step().unwrap_err();
    let second = machine.step().unwrap_err();

    assert_eq!(first, second);
    assert_eq!(machine.pc(), 0);
    assert_eq!(machine.run(), Err(first));
  }

  #[test]
  fn arithmetic(){
    let mut machine = loaded("STR 3 A\nSTR 10 B\nSUB A B\nSTR -2 C\nADD C A\nADD A A");
    machine.run().unwrap();

    assert_eq!(machine.slot(Slot::B), Some(7));
    assert_eq!(machine.slot(Slot::C), Some(-2));
    assert_eq!(machine.slot(Slot::A), Some(2));
  }

  #[test]
  fn arithmetic_wraps(){
    let mut machine = loaded("STR 9223372036854775807 A\nSTR 1 B\nADD B A\nSTR 5 C\nSUB C A");
    machine.run().unwrap();

    // MAX + 1 wraps to MIN, and MIN - 5 wraps back around to MAX - 4.
    assert_eq!(machine.slot(Slot::A), Some(Value::MAX - 4));
  }

  #[test]
  fn store_overwrites(){
    let mut machine = loaded("STR 1 E\nSTR 0 E");
    machine.step().unwrap();
    assert_eq!(machine.slot(Slot::E), Some(1));
    machine.step().unwrap();
    assert_eq!(machine.slot(Slot::E), Some(0));
  }

  #[test]
  fn branch_to_undefined_label(){
    let mut machine = loaded("STR 1 A\nSTR 2 B\nBNE A B nowhere");

    let error = machine.run().unwrap_err();

    assert_eq!(error, ExecError::UndefinedLabel{ label: DefaultAtom::from("nowhere") });
    assert!(error.to_string().contains("nowhere"));
    assert_eq!(machine.pc(), 2);
    assert_eq!(machine.state(), State::Halted);
  }

  #[test]
  fn branch_not_taken_falls_through(){
    let mut machine = loaded("STR 4 A\nSTR 4 B\nBNE A B end\nSTR 1 C\n>end");
    machine.run().unwrap();

    assert_eq!(machine.slot(Slot::C), Some(1));
    assert_eq!(machine.pc(), 4);
  }

  #[test]
  fn branch_not_taken_still_checks_label(){
    let mut machine = loaded("STR 4 A\nSTR 4 B\nBNE A B nowhere\nSTR 1 C");
    machine.step().unwrap();
    machine.step().unwrap();

    assert_eq!(
      machine.step(),
      Err(ExecError::UndefinedLabel{ label: DefaultAtom::from("nowhere") })
    );
    assert_eq!(machine.pc(), 2);
    assert_eq!(machine.state(), State::Halted);
  }

  #[test]
  fn branch_target_past_end_is_rejected(){
    let mut labels = LabelTable::new();
    labels.insert(DefaultAtom::from("far"), 7);
    let branch = Instruction::new(
      Operation::Bne,
      vec![DefaultAtom::from("A"), DefaultAtom::from("B"), DefaultAtom::from("far")]
    );
    let one = Instruction::new(Operation::Str, vec![DefaultAtom::from("1"), DefaultAtom::from("A")]);
    let two = Instruction::new(Operation::Str, vec![DefaultAtom::from("2"), DefaultAtom::from("B")]);
    let mut machine = Machine::with_program(Program::new(vec![one, two, branch], labels));
    machine.step().unwrap();
    machine.step().unwrap();

    assert_eq!(
      machine.step(),
      Err(ExecError::UndefinedLabel{ label: DefaultAtom::from("far") })
    );
    assert_eq!(machine.pc(), 2);
    assert_eq!(machine.state(), State::Halted);
  }

  #[test]
  fn malformed_operands(){
    fn atoms(tokens: &[&str]) -> Vec<DefaultAtom> {
      tokens.iter().map(|t| DefaultAtom::from(*t)).collect()
    }
    let program = Program::new(
      vec![
        Instruction::new(Operation::Str, atoms(&["5", "A"])),
        Instruction::new(Operation::Str, atoms(&["ten", "A"])),
        Instruction::new(Operation::Str, atoms(&["1", "K"])),
        Instruction::new(Operation::Add, atoms(&["A"])),
      ],
      LabelTable::new()
    );
    let mut machine = Machine::with_program(program);
    machine.step().unwrap();

    assert_eq!(
      machine.step(),
      Err(ExecError::MalformedOperand{ operation: Operation::Str, operand: "number", token: "ten".to_string() })
    );
    assert_eq!(machine.pc(), 1);

    // Skip past each bad instruction by hand.
    machine.pc = 2;
    assert_eq!(
      machine.step(),
      Err(ExecError::MalformedOperand{ operation: Operation::Str, operand: "slot", token: "K".to_string() })
    );

    machine.pc = 3;
    let error = machine.step().unwrap_err();
    assert_eq!(
      error,
      ExecError::MalformedOperand{ operation: Operation::Add, operand: "slot2", token: "".to_string() }
    );
    assert_eq!(error.to_string(), "slot2 of ADD: `` cannot be used here.");
    assert_eq!(machine.slot(Slot::A), Some(5));
  }

  #[test]
  fn branch_needs_both_slots(){
    let mut machine = loaded("STR 4 A\nBNE A B end\n>end");
    machine.step().unwrap();

    assert_eq!(
      machine.step(),
      Err(ExecError::EmptySlot{ operand: "slot2", slot: Slot::B })
    );
  }

  #[test]
  fn forward_reference(){
    let text = "STR 1 A\nSTR 2 B\nBNE A B skip\nSTR 99 C\n>skip\nSTR 7 D";
    let mut machine = loaded(text);
    machine.run().unwrap();

    assert_eq!(machine.slot(Slot::C), None);
    assert_eq!(machine.slot(Slot::D), Some(7));
    assert_eq!(machine.pc(), 5);
  }

  #[test]
  fn branch_to_trailing_label_completes(){
    let mut machine = loaded("STR 1 A\nSTR 2 B\nBNE A B done\nSTR 3 C\n>done");
    machine.run().unwrap();

    assert_eq!(machine.state(), State::Complete);
    assert_eq!(machine.slot(Slot::C), None);
  }

  #[test]
  fn empty_program_is_complete(){
    let mut machine = loaded("# nothing\n");

    assert_eq!(machine.state(), State::Complete);
    assert_eq!(machine.run(), Ok(()));
    assert_eq!(machine.step(), Err(ExecError::Finished));
  }

  #[test]
  fn idle_machine(){
    let mut machine = Machine::new();

    assert_eq!(machine.state(), State::Idle);
    assert_eq!(machine.step(), Err(ExecError::NoProgram));
    assert_eq!(machine.run(), Err(ExecError::NoProgram));
    assert_eq!(machine.current_instruction(), None);
  }

  #[test]
  fn no_steps_after_completion(){
    let mut machine = loaded("STR 1 A");
    machine.run().unwrap();

    assert_eq!(machine.step(), Err(ExecError::Finished));
    assert_eq!(machine.pc(), 1);
  }

  #[test]
  fn failed_load_leaves_machine_idle(){
    let mut machine = loaded("STR 1 A");
    machine.run().unwrap();

    let error = machine.load("STR 1 A\nFOO").unwrap_err();

    assert_eq!(error.line, 2);
    assert_eq!(machine.state(), State::Idle);
    assert!(machine.instructions().is_empty());
    assert_eq!(machine.slot(Slot::A), None);
  }

  #[test]
  fn load_resets_session(){
    let mut machine = loaded("STR 5 A\nADD A B");
    let _ = machine.run();
    assert_eq!(machine.state(), State::Halted);

    machine.load("STR 6 B").unwrap();

    assert_eq!(machine.state(), State::Ready);
    assert_eq!(machine.pc(), 0);
    assert_eq!(machine.slot(Slot::A), None);
    assert_eq!(machine.last_error(), None);
    assert_eq!(machine.current_instruction().map(|i| i.to_string()), Some("STR 6 B".to_string()));
  }

  #[test]
  fn queries(){
    let machine = Machine::with_program(crate::parse(COUNTING_LOOP).unwrap());

    assert_eq!(machine.instructions().len(), 5);
    assert_eq!(machine.labels().get("loop"), Some(3));
    assert_eq!(machine.program().len(), 5);
    assert_eq!(machine.slots().iter().count(), 10);
    assert!(machine.slots().iter().all(|(_, value)| value.is_none()));
  }

  #[test]
  fn display_marks_pc(){
    let mut machine = loaded(COUNTING_LOOP);
    machine.step().unwrap();

    let text = machine.to_string();

    assert!(text.starts_with("State: Ready\tpc = 1"));
    assert!(text.contains("* --> "));
    assert!(text.contains("BNE A B loop"));
    assert!(text.contains("empty"));
  }

}
