mod cmd;

use clap::{App, Arg, SubCommand};
use std::fmt::Display;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use projgen::ctx::Context;
use projgen::manifest::{self, Env};
use projgen::uid::IdGenerator;
use projgen::{gen, platform};

fn main() {
  // Initialize.
  let commands   = cmd::init();
  let platforms  = platform::init();
  let mut generators = gen::init();

  // Parse the environment variables.
  let mut env: Env = envy::prefixed("PROJGEN_").from_env()
    .check(|| "Failed to parse environment variables");

  // Parse the command line.
  let generator_names: Vec<&str> = generators.keys().cloned().collect();
  let args = App::new(env!("CARGO_PKG_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .author(env!("CARGO_PKG_AUTHORS"))
    .about(env!("CARGO_PKG_DESCRIPTION"))
    .arg(Arg::with_name("MANIFEST")
         .help("Manifest describing the projects and solutions")
         .default_value("projgen.toml"))
    .arg(Arg::with_name("build")
         .short("b")
         .long("build")
         .value_name("FOLDER")
         .help("Where to store the generated project files")
         .takes_value(true))
    .arg(Arg::with_name("generator")
         .short("g")
         .long("generator")
         .value_name("NAME")
         .help("Only runs the given generators")
         .takes_value(true)
         .multiple(true)
         .possible_values(&generator_names))
    .arg(Arg::with_name("v")
         .short("v")
         .multiple(true)
         .help("Verbosity level"))
    .subcommands(commands.iter().map(|(name, cmd)| {
      cmd.init(SubCommand::with_name(name))
    }))
    .get_matches();

  init_logging(args.occurrences_of("v"));

  let manifest_path = PathBuf::from(args.value_of("MANIFEST").unwrap_or("projgen.toml"))
    .canonicalize()
    .check(|| "Failed to locate the manifest");

  if let Some(dir) = args.value_of("build") {
    let cwd = std::env::current_dir().check(|| "Failed to read the current directory");
    env.build_dir = Some(cwd.join(dir));
  }

  if let Some(names) = args.values_of("generator") {
    let names: Vec<&str> = names.collect();
    generators.retain(|name, _| names.contains(name));
  }

  // Load the manifest.
  let manifest = manifest::load(&manifest_path, &platforms, &env)
    .check(|| format!("Failed to load the manifest ({})", manifest_path.display()));

  (!manifest.projects.is_empty()).check(|| "No projects in manifest");

  let ids     = IdGenerator::new();
  let masters = gen::fastbuild::master_index(&manifest.projects, &manifest.solutions);
  let ctx = Context {
    ids:       &ids,
    platforms: &platforms,
    projects:  &manifest.projects,
    masters:   &masters
  };
  let session = cmd::Session {
    args:       &args,
    ctx:        &ctx,
    generators: &generators,
    solutions:  &manifest.solutions
  };

  // Execute the requested command.
  let cmd_name = args.subcommand_name().unwrap_or("gen");
  let failures = commands[cmd_name].run(&session);
  debug!(command = cmd_name, ids = ids.len(), "done");

  (failures == 0).check(|| format!("{} failure(s), see the log above", failures));
}

fn init_logging(verbosity: u64) {
  let level = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace"
  };
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(["projgen=", level].concat()));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

trait Check {
  type R;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display;
}

impl Check for bool {
  type R = ();
  fn check<F, S>(self, msg: F) where F: FnOnce() -> S, S: Display {
    if !self {
      fatal(msg());
    }
  }
}

impl<T, E> Check for Result<T, E> where E: Display {
  type R = T;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display {
    match self {
      Ok (v) => v,
      Err(e) => fatal(format!("{}: {}", msg(), e))
    }
  }
}

fn fatal<S: Display>(msg: S) -> ! {
  eprintln!("{}", msg);
  std::process::exit(1)
}
