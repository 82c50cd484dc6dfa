use std::env;
use std::fs;
use std::process;

use tinyasm::Machine;

/// Run when no source file is given. Counts slot A up to slot B.
const SAMPLE_PROGRAM: &str = "\
STR 0 A      # counter
STR 10 B     # limit
STR 1 C      # increment
>loop
ADD C A
BNE A B loop
";

fn main() {

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let args: Vec<String> = env::args().collect();

  let text = match args.get(1) {

    Some(path) => {
      match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e)   => {
          eprintln!("Error: cannot read '{}': {}", path, e);
          process::exit(1);
        }
      }
    }

    None => {
      println!("Usage: tinyasm <file>\nNo file given, running the sample program:\n{}", SAMPLE_PROGRAM);
      SAMPLE_PROGRAM.to_string()
    }

  };

  let mut machine = Machine::new();
  if let Err(e) = machine.load(&text) {
    eprintln!("{}", e);
    process::exit(1);
  }

  match machine.run() {
    Ok(()) => {
      println!("{}", machine);
    }
    Err(e) => {
      eprintln!("Runtime error at instruction {}: {}", machine.pc(), e);
      println!("{}", machine);
      process::exit(1);
    }
  }

}
