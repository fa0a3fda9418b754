use clap::{App, Arg};
use std::path::Path;
use tracing::info;

use projgen::gen::generate_all;
use projgen::output;

use crate::cmd::{Command, Session};
use crate::Check;

pub struct Gen;

impl Command for Gen {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Generates the project files")
      .arg(Arg::with_name("jobs")
           .short("j")
           .long("jobs")
           .value_name("N")
           .help("Number of worker threads, defaults to the available parallelism")
           .takes_value(true))
      .arg(Arg::with_name("report")
           .long("report")
           .value_name("FILE")
           .help("Writes the generated and skipped files as JSON")
           .takes_value(true))
  }

  fn run(&self, s: &Session) -> usize {
    let args = s.args.subcommand_matches("gen").unwrap_or(s.args);
    let jobs = match args.value_of("jobs") {
      Some(n) => n.parse::<usize>().check(|| format!("Invalid job count ({})", n)),
      None    => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    };

    let batch = generate_all(s.ctx, s.generators, s.solutions, jobs);

    if let Some(path) = args.value_of("report") {
      let json = serde_json::to_string_pretty(&batch.report).check(|| "Failed to serialize the report");
      output::write_if_changed(Path::new(path), &json).check(|| format!("Failed to write the report ({})", path));
      info!(path, "report written");
    }

    batch.failures
  }
}

// NOTE: Projects are spread over scoped threads, solutions are generated
//       afterwards on the calling thread since they only reference projects.
