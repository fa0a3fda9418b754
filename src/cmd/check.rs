use clap::App;
use tracing::{error, info};

use projgen::platform;

use crate::cmd::{Command, Session};

pub struct Check;

impl Command for Check {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Checks whether every configuration resolves, without writing anything")
  }

  fn run(&self, s: &Session) -> usize {
    let mut failures = 0;
    for project in s.ctx.projects {
      for conf in &project.configurations {
        let key = conf.key(&project.name);
        let strategy = s.ctx.platform(conf.platform);

        if !strategy.supports_architecture(conf.architecture) {
          error!(configuration = %key, architecture = ?conf.architecture, "unsupported architecture");
          failures += 1;
          continue;
        }

        if !s.generators.values().any(|g| g.supports_platform(conf.platform)) {
          error!(configuration = %key, "no generator for this platform");
          failures += 1;
          continue;
        }

        if let Err(e) = platform::resolve(strategy, project, conf) {
          error!(configuration = %key, "{}", e);
          failures += 1;
        }
      }
    }
    info!(projects = s.ctx.projects.len(), failures, "check done");
    failures
  }
}
