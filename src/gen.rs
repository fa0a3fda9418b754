pub mod fastbuild;
pub mod vs;
pub mod workspace;
pub mod xcode;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{error, info};

use crate::ctx::{Context, GenerationReport, Generators, Solution};
use crate::error::Result;

pub fn init() -> Generators {
  let mut generators = Generators::new();
  generators.insert("fastbuild", Box::new(fastbuild::FastBuild));
  generators.insert("vs",        Box::new(vs::VisualStudio));
  generators.insert("xcode",     Box::new(xcode::XCode));
  generators
}

/// Outcome of generating every project and solution of a manifest.
#[derive(Debug, Default)]
pub struct Batch {
  pub report:   GenerationReport,
  pub failures: usize
}

impl Batch {
  fn check(&mut self, generator: &str, item: &str, result: Result<()>) {
    if let Err(e) = result {
      error!(generator, item, "{}", e);
      self.failures += 1;
    }
  }

  fn append(&mut self, other: Batch) {
    self.report.append(other.report);
    self.failures += other.failures;
  }
}

/// Runs every generator over every project on `jobs` worker threads, then over
/// every solution. A failure is logged and the batch moves on.
pub fn generate_all(ctx: &Context, generators: &Generators, solutions: &[Solution], jobs: usize) -> Batch {
  let next    = AtomicUsize::new(0);
  let workers = jobs.max(1).min(ctx.projects.len().max(1));
  let mut batch = Batch::default();

  thread::scope(|s| {
    let next = &next;
    let handles: Vec<_> = (0..workers).map(|_| s.spawn(move || {
      let mut b = Batch::default();
      while let Some(project) = ctx.projects.get(next.fetch_add(1, Ordering::Relaxed)) {
        for (name, g) in generators {
          let result = g.generate_project(ctx, project, &mut b.report);
          b.check(name, &project.name, result);
        }
      }
      b
    })).collect();

    for h in handles {
      match h.join() {
        Ok(b)  => batch.append(b),
        Err(_) => batch.failures += 1
      }
    }
  });

  for solution in solutions {
    for (name, g) in generators {
      let result = g.generate_solution(ctx, solution, &mut batch.report);
      batch.check(name, &solution.name, result);
    }
  }

  batch.report.generated.sort();
  batch.report.skipped.sort();
  info!(generated = batch.report.generated.len(), skipped = batch.report.skipped.len(),
        failures = batch.failures, "generation done");
  batch
}
