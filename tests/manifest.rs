use std::fs;
use std::path::Path;

use projgen::ctx::Context;
use projgen::gen::{self, fastbuild::master_index};
use projgen::manifest::{self, Env};
use projgen::platform;
use projgen::uid::IdGenerator;

const MANIFEST: &str = r#"
min_version = "0.1.0"

[[project]]
name  = "hello"
files = ["src/*.cpp", "src/*.h"]

[[project.configuration]]
name     = ["Debug", "Release"]
target   = "hello"
platform = ["macos", "windows"]
output   = "exe"

[[project]]
name  = "tool"
files = ["tool/*.cpp"]

[[project.configuration]]
name      = "Debug"
target    = "tool"
platform  = "linux"
output    = "exe"
fastbuild = true

[[solution]]
name       = "game"
master_bff = true
projects   = [{ project = "hello", folder = "apps" }, { project = "tool", folder = "tools" }]
"#;

fn write(dir: &Path, path: &str, content: &str) {
  let path = dir.join(path);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

#[test]
fn generates_every_file_once() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "projgen.toml", MANIFEST);
  write(dir.path(), "src/main.cpp", "int main() {}\n");
  write(dir.path(), "src/hello.h", "");
  write(dir.path(), "tool/tool.cpp", "int main() {}\n");

  let platforms = platform::init();
  let env       = Env { build_dir: Some("build".into()), xcode_team: None };
  let m         = manifest::load(&dir.path().join("projgen.toml"), &platforms, &env).unwrap();

  let ids        = IdGenerator::new();
  let masters    = master_index(&m.projects, &m.solutions);
  let generators = gen::init();
  let ctx = Context { ids: &ids, platforms: &platforms, projects: &m.projects, masters: &masters };

  let first = gen::generate_all(&ctx, &generators, &m.solutions, 2);
  assert_eq!(first.failures, 0);

  let build = dir.path().join("build");
  for f in &["hello.xcodeproj/project.pbxproj", "hello.vcxproj", "tool.vcxproj", "tool.bff",
             "game.sln", "game.bff", "game.xcworkspace/contents.xcworkspacedata"] {
    assert!(first.report.generated.contains(&build.join(f)), "{} not generated", f);
  }
  assert!(!build.join("hello.bff").exists());
  assert!(!build.join("tool.xcodeproj").exists());

  let sln = fs::read_to_string(build.join("game.sln")).unwrap();
  assert!(sln.contains("\"apps\", \"apps\""));
  assert!(sln.contains("\"tool\", \"tool.vcxproj\""));

  let vcxproj = fs::read_to_string(build.join("tool.vcxproj")).unwrap();
  assert!(vcxproj.contains("FBuild -config \"game.bff\" tool_Debug_Linux"));

  let master = fs::read_to_string(build.join("game.bff")).unwrap();
  assert!(master.contains("#include \"tool.bff\""));
  assert!(master.contains("{ 'tool_Debug_Linux' }"));

  let second = gen::generate_all(&ctx, &generators, &m.solutions, 1);
  assert_eq!(second.failures, 0);
  assert!(second.report.generated.is_empty());
  assert_eq!(second.report.skipped, first.report.generated);
}
