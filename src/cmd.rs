mod check;
mod gen;

use clap::{App, ArgMatches};
use std::collections::BTreeMap;

use projgen::ctx::{Context, Generators, Solution};

/// Everything a command needs, built once the manifest is loaded.
pub struct Session<'a> {
  pub args:       &'a ArgMatches<'a>,
  pub ctx:        &'a Context<'a>,
  pub generators: &'a Generators,
  pub solutions:  &'a [Solution]
}

pub trait Command {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b>;

  /// Returns the number of failures.
  fn run(&self, session: &Session) -> usize;
}

pub type Commands = BTreeMap<&'static str, Box<dyn Command>>;

pub fn init() -> Commands {
  let mut commands = Commands::new();
  commands.insert("check", Box::new(check::Check));
  commands.insert("gen",   Box::new(gen::Gen));
  commands
}
