//! Loads the TOML manifest describing projects and solutions.
//!
//! ```toml
//! min_version = "0.1.0"
//!
//! [[project]]
//! name  = "hello"
//! files = ["src/**/*.cpp", "src/**/*.h"]
//!
//! [[project.configuration]]
//! name     = ["Debug", "Release"]
//! target   = "hello"
//! platform = ["macos", "windows"]
//! output   = "app"
//!
//! [[solution]]
//! name     = "hello"
//! projects = [{ project = "hello" }]
//! ```
//!
//! Paths in the manifest are relative to the manifest's directory, output
//! directories to the build directory.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::ctx::{Architecture, BuildStep, Configuration, CopyStep, Dependency, OutputType, Platforms,
                 PlatformType, Project, Settings, Solution, SolutionProject, XcodeSettings};
use crate::error::{Error, Result};

/// Defaults taken from the environment, `PROJGEN_` prefixed.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Env {
  pub build_dir:  Option<PathBuf>,
  pub xcode_team: Option<String>
}

#[derive(Debug)]
pub struct Manifest {
  pub projects:  Vec<Project>,
  pub solutions: Vec<Solution>
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
  #[serde(default)]
  min_version: String,

  #[serde(default, rename = "project")]
  projects: Vec<ProjectInfo>,

  #[serde(default, rename = "solution")]
  solutions: Vec<SolutionInfo>
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectInfo {
  name: String,

  #[serde(default)]
  source_root: Option<PathBuf>,
  #[serde(default)]
  output_dir:  Option<PathBuf>,

  #[serde(default)]
  files:            Vec<String>,
  #[serde(default)]
  resources:        Vec<String>,
  #[serde(default)]
  resource_folders: Vec<PathBuf>,

  #[serde(default)]
  fastbuild_all: bool,

  #[serde(default)]
  settings: Settings,
  #[serde(default)]
  xcode:    XcodeSettings,

  #[serde(default, rename = "configuration")]
  configurations: Vec<ConfigurationInfo>
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
  One(T),
  Many(Vec<T>)
}

impl<T: Clone> OneOrMany<T> {
  fn to_vec(&self) -> Vec<T> {
    match self {
      OneOrMany::One(x)   => vec![x.clone()],
      OneOrMany::Many(xs) => xs.clone()
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigurationInfo {
  name:     OneOrMany<String>,
  target:   String,
  platform: OneOrMany<PlatformType>,
  output:   OutputType,

  #[serde(default)]
  architecture: Option<Architecture>,
  #[serde(default)]
  fastbuild:    bool,

  #[serde(default)]
  settings: Settings,
  #[serde(default)]
  xcode:    XcodeSettings,

  #[serde(default)]
  target_dir:       Option<PathBuf>,
  #[serde(default)]
  intermediate_dir: Option<PathBuf>,

  #[serde(default)]
  dependencies:  Vec<String>,
  #[serde(default)]
  pre_build:     Vec<BuildStep>,
  #[serde(default)]
  post_build:    Vec<BuildStep>,
  #[serde(default)]
  copy_files:    Vec<CopyStep>,
  #[serde(default)]
  build_exclude: Vec<PathBuf>,

  #[serde(default)]
  options: BTreeMap<String, String>
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SolutionInfo {
  name: String,

  #[serde(default)]
  output_dir: Option<PathBuf>,

  projects: Vec<SolutionProject>,

  #[serde(default)]
  master_bff: bool
}

/// Reads and expands the manifest at `path`.
pub fn load(path: &Path, platforms: &Platforms, env: &Env) -> Result<Manifest> {
  let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
  parse(&text, path, platforms, env)
}

/// Expands a manifest read from `path`.
pub fn parse(text: &str, path: &Path, platforms: &Platforms, env: &Env) -> Result<Manifest> {
  let file: ManifestFile = toml::from_str(text)
    .map_err(|source| Error::Manifest { path: path.to_path_buf(), source })?;

  check_version(&file.min_version, path)?;

  let root      = clean(path.parent().unwrap_or_else(|| Path::new(".")));
  let build_dir = match &env.build_dir {
    Some(dir) => clean(&root.join(dir)),
    None      => root.clone()
  };

  let mut projects: Vec<Project> = Vec::with_capacity(file.projects.len());
  for info in &file.projects {
    if projects.iter().any(|p| p.name == info.name) {
      warn!(project = %info.name, "duplicate project, skipped");
      continue;
    }
    projects.push(project(info, &root, &build_dir, platforms, env)?);
  }

  let solutions = file.solutions.into_iter()
    .map(|s| Solution {
      name:       s.name,
      output_dir: output_dir(&build_dir, &s.output_dir),
      projects:   s.projects,
      master_bff: s.master_bff
    })
    .collect();

  debug!(path = %path.display(), projects = projects.len(), "manifest loaded");
  Ok(Manifest { projects, solutions })
}

fn check_version(min_version: &str, path: &Path) -> Result<()> {
  if min_version.is_empty() {
    return Ok(());
  }

  let expected = semver::Version::parse(min_version).map_err(|e| Error::Manifest {
    path:   path.to_path_buf(),
    source: serde::de::Error::custom(format!("invalid min_version '{}': {}", min_version, e))
  })?;
  let current = semver::Version::parse(env!("CARGO_PKG_VERSION")).map_err(|e| Error::Manifest {
    path:   path.to_path_buf(),
    source: serde::de::Error::custom(e.to_string())
  })?;

  match expected > current {
    true  => Err(Error::Version { expected, current }),
    false => Ok(())
  }
}

/// Resolves `.` and `..` components without touching the file system.
fn clean(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for c in path.components() {
    match c {
      Component::CurDir    => {},
      Component::ParentDir => match out.components().next_back() {
        Some(Component::Normal(_)) => { out.pop(); },
        _                          => out.push(".."),
      },
      _ => out.push(c.as_os_str())
    }
  }
  out
}

fn output_dir(build_dir: &Path, dir: &Option<PathBuf>) -> PathBuf {
  match dir {
    Some(d) => clean(&build_dir.join(d)),
    None    => build_dir.to_path_buf()
  }
}

/// Expands glob patterns relative to `dir` into sorted absolute paths.
fn expand(dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for pattern in patterns {
    let full = dir.join(pattern);
    let glob_error = |reason: String| Error::Glob { pattern: pattern.clone(), reason };

    let full = full.to_str().ok_or_else(|| glob_error("not valid UTF-8".to_string()))?;
    let mut matched = 0;
    for entry in glob::glob(full).map_err(|e| glob_error(e.to_string()))? {
      let path = entry.map_err(|e| glob_error(e.to_string()))?;
      if path.is_file() {
        files.push(clean(&path));
        matched += 1;
      }
    }
    if matched == 0 {
      warn!(pattern = %pattern, dir = %dir.display(), "pattern matched no file");
    }
  }
  files.sort();
  files.dedup();
  Ok(files)
}

fn base_settings(name: &str) -> Settings {
  Settings::defaults().into_iter()
    .find(|(n, _)| *n == name)
    .map(|(_, s)| s)
    .unwrap_or_default()
}

fn project(info: &ProjectInfo, root: &Path, build_dir: &Path, platforms: &Platforms, env: &Env) -> Result<Project> {
  let source_root = match &info.source_root {
    Some(dir) => clean(&root.join(dir)),
    None      => root.to_path_buf()
  };

  let mut p = Project::new(info.name.as_str(), source_root, output_dir(build_dir, &info.output_dir));
  p.files            = expand(&p.source_root, &info.files)?;
  p.resources        = expand(&p.source_root, &info.resources)?;
  p.resource_folders = info.resource_folders.iter().map(|d| clean(&p.source_root.join(d))).collect();
  p.fastbuild_all    = info.fastbuild_all;

  let team = XcodeSettings { development_team: env.xcode_team.clone(), ..Default::default() };
  let xcode = info.xcode.merge(&team);

  for c in &info.configurations {
    for platform in c.platform.to_vec() {
      for name in c.name.to_vec() {
        let mut conf = Configuration::new(name.as_str(), c.target.as_str(), platform, c.output);
        conf.architecture = c.architecture
          .unwrap_or_else(|| platforms[platform as usize].default_architecture());
        conf.fastbuild = c.fastbuild;

        conf.settings = c.settings.merge(&info.settings.merge(&base_settings(&name)));
        conf.xcode    = c.xcode.merge(&xcode);

        if let Some(dir) = &c.target_dir {
          conf.target_dir = dir.clone();
        }
        if let Some(dir) = &c.intermediate_dir {
          conf.intermediate_dir = dir.clone();
        }

        conf.dependencies  = c.dependencies.iter().map(|d| Dependency::parse(d)).collect();
        conf.pre_build     = c.pre_build.clone();
        conf.post_build    = c.post_build.clone();
        conf.copy_files    = c.copy_files.clone();
        conf.build_exclude = c.build_exclude.iter().map(|f| clean(&p.source_root.join(f))).collect();
        conf.options       = c.options.clone();

        if p.configurations.iter().any(|x| x.key(&p.name) == conf.key(&p.name)) {
          warn!(configuration = %conf.key(&p.name), "duplicate configuration, skipped");
          continue;
        }
        p.configurations.push(conf);
      }
    }
  }

  if p.configurations.is_empty() {
    warn!(project = %p.name, "project has no configuration");
  }
  Ok(p)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::Optimize;
  use crate::platform;
  use std::fs;

  const MANIFEST: &str = r#"
    [[project]]
    name        = "hello"
    files       = ["src/*.cpp", "src/*.h", "src/*.cpp"]
    resources   = ["res/*.png"]

    [project.settings]
    defines = ["HELLO"]

    [project.xcode]
    bundle_identifier = "com.example.hello"

    [[project.configuration]]
    name          = ["Debug", "Release"]
    target        = "hello"
    platform      = ["macos", "windows"]
    output        = "app"
    dependencies  = ["core", "engine/render"]
    build_exclude = ["src/win32.cpp"]

    [project.configuration.settings]
    defines = ["APP"]

    [[project.configuration]]
    name     = "Debug"
    target   = "hello"
    platform = "macos"
    output   = "exe"

    [[solution]]
    name       = "hello"
    output_dir = "sln"
    projects   = [{ project = "hello", folder = "apps" }]
    master_bff = true
  "#;

  fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join("res")).unwrap();
    for f in &["src/main.cpp", "src/win32.cpp", "src/hello.h", "src/notes.txt", "res/icon.png"] {
      fs::write(dir.path().join(f), "").unwrap();
    }
    dir
  }

  #[test]
  fn expands_projects_and_configurations() {
    let dir  = setup();
    let root = clean(dir.path());
    let env  = Env { build_dir: Some(PathBuf::from("build")), xcode_team: Some("TEAM".to_string()) };
    let m    = parse(MANIFEST, &root.join("projgen.toml"), &platform::init(), &env).unwrap();

    assert_eq!(m.projects.len(), 1);
    let p = &m.projects[0];
    assert_eq!(p.output_dir, root.join("build"));
    assert_eq!(p.files, vec![root.join("src/hello.h"), root.join("src/main.cpp"), root.join("src/win32.cpp")]);
    assert_eq!(p.resources, vec![root.join("res/icon.png")]);

    let keys: Vec<String> = p.configurations.iter().map(|c| c.key("p")).collect();
    assert_eq!(keys, vec!["p/hello/Debug/macOS", "p/hello/Release/macOS",
                          "p/hello/Debug/Windows", "p/hello/Release/Windows"]);

    let release = &p.configurations[1];
    assert_eq!(release.settings.optimize, Some(Optimize::Full));
    assert_eq!(release.settings.defines, vec!["NDEBUG", "HELLO", "APP"]);
    assert_eq!(release.xcode.development_team.as_deref(), Some("TEAM"));
    assert_eq!(release.xcode.bundle_identifier.as_deref(), Some("com.example.hello"));
    assert_eq!(release.architecture, platform::init()[PlatformType::MacOS as usize].default_architecture());
    assert_eq!(release.dependencies[1], Dependency::parse("engine/render"));
    assert!(release.is_excluded(&root.join("src/win32.cpp")));

    let sln = &m.solutions[0];
    assert_eq!(sln.output_dir, root.join("build/sln"));
    assert_eq!(sln.projects[0].folder, "apps");
    assert!(sln.master_bff);
  }

  #[test]
  fn rejects_newer_min_version() {
    let dir  = setup();
    let path = dir.path().join("projgen.toml");
    let text = ["min_version = \"99.0.0\"\n", MANIFEST].concat();
    match parse(&text, &path, &platform::init(), &Env::default()) {
      Err(Error::Version { expected, .. }) => assert_eq!(expected.major, 99),
      other                                => panic!("unexpected {:?}", other.map(|_| ()))
    }

    assert!(matches!(parse("min_version = \"x\"", &path, &platform::init(), &Env::default()),
                     Err(Error::Manifest { .. })));
  }

  #[test]
  fn rejects_unknown_fields() {
    let text = "[[project]]\nname = \"a\"\nunknown = 1\n";
    let res  = parse(text, Path::new("/work/projgen.toml"), &platform::init(), &Env::default());
    assert!(matches!(res, Err(Error::Manifest { .. })));
  }

  #[test]
  fn cleans_paths() {
    assert_eq!(clean(Path::new("/work/./a/../b")), PathBuf::from("/work/b"));
    assert_eq!(clean(Path::new("../a")), PathBuf::from("../a"));
  }
}
