use std::collections::HashMap;

use string_cache::DefaultAtom;

/**
  A label table maps label names to the index in the instruction sequence of the instruction
  following the label's declaration. A label declared after the last instruction maps to the
  length of the sequence, so branching to it ends the program.

  Several labels may name the same index, and redeclaring a label replaces its earlier mapping.
  The table is really just a convenience wrapper around a HashMap.
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelTable {
  table: HashMap<DefaultAtom, usize>
}

impl LabelTable {

  pub fn new() -> LabelTable {
    LabelTable{
      table: HashMap::new()
    }
  }

  /// Maps `label` to `index`, returning the index it previously mapped to, if any.
  pub fn insert(&mut self, label: DefaultAtom, index: usize) -> Option<usize> {
    self.table.insert(label, index)
  }

  pub fn get(&self, label: &str) -> Option<usize> {
    self.table.get(&DefaultAtom::from(label)).copied()
  }

  pub fn contains(&self, label: &str) -> bool {
    self.table.contains_key(&DefaultAtom::from(label))
  }

  /// The labels that refer to `index`, sorted by name.
  pub fn labels_at(&self, index: usize) -> Vec<&DefaultAtom> {
    let mut labels: Vec<&DefaultAtom> =
      self.table
          .iter()
          .filter_map(|(label, i)| if *i == index { Some(label) } else { None })
          .collect();
    labels.sort_by(|a, b| (***a).cmp(&***b));
    labels
  }

  pub fn iter(&self) -> impl Iterator<Item = (&DefaultAtom, usize)> + '_ {
    self.table.iter().map(|(label, index)| (label, *index))
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

}
