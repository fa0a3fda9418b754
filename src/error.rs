use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort the generation of a single file.
#[derive(Debug, Error)]
pub enum Error {
  /// A template token had no binding in scope. Always a template/graph mismatch.
  #[error("unresolved token [{token}] at template line {line} (in scope: {})", available.join(", "))]
  Template {
    token:     String,
    line:      usize,
    available: Vec<String>,
    template:  String
  },

  #[error("project '{project}', configuration '{configuration}': {reason}")]
  Unsupported {
    project:       String,
    configuration: String,
    reason:        String
  },

  #[error("could not find {name} (searched: {})", display_paths(searched))]
  MissingResource {
    name:     String,
    searched: Vec<PathBuf>
  },

  #[error("{}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error
  },

  #[error("failed to read manifest {}: {source}", path.display())]
  Manifest {
    path:   PathBuf,
    #[source]
    source: toml::de::Error
  },

  #[error("invalid file pattern '{pattern}': {reason}")]
  Glob {
    pattern: String,
    reason:  String
  },

  #[error("manifest requires projgen {expected} but this is {current}")]
  Version {
    expected: semver::Version,
    current:  semver::Version
  }
}

impl Error {
  pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
    Error::Io { path: path.into(), source }
  }

  pub fn unsupported<P, C, R>(project: P, configuration: C, reason: R) -> Self where
    P: Into<String>, C: Into<String>, R: Into<String>
  {
    Error::Unsupported {
      project:       project.into(),
      configuration: configuration.into(),
      reason:        reason.into()
    }
  }
}

fn display_paths(paths: &[PathBuf]) -> String {
  paths.iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_resource_names_searched_paths() {
    let e = Error::MissingResource {
      name:     "precompiled header source 'pch.cpp'".to_string(),
      searched: vec![PathBuf::from("/src"), PathBuf::from("/src/include")]
    };
    assert_eq!(e.to_string(),
               "could not find precompiled header source 'pch.cpp' (searched: /src, /src/include)");
  }

  #[test]
  fn template_error_lists_scope() {
    let e = Error::Template {
      token:     "item.uid".to_string(),
      line:      3,
      available: vec!["item".to_string(), "project".to_string()],
      template:  String::new()
    };
    assert_eq!(e.to_string(), "unresolved token [item.uid] at template line 3 (in scope: item, project)");
  }
}
