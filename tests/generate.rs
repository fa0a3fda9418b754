use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

use projgen::ctx::{Configuration, Context, Dependency, GenerationReport, Generator, MasterBffIndex, OutputType,
                   PlatformType, Project};
use projgen::gen::xcode::XCode;
use projgen::platform;
use projgen::uid::IdGenerator;

fn project(name: &str, output_dir: &Path, files: &[&str]) -> Project {
  let root = Path::new("/work").join(name);
  let mut p = Project::new(name, root.clone(), output_dir.to_path_buf());
  p.files = files.iter().map(|f| root.join(f)).collect();
  p
}

fn generate(projects: &[Project]) -> GenerationReport {
  let ids       = IdGenerator::new();
  let platforms = platform::init();
  let masters   = MasterBffIndex::new();
  let ctx = Context { ids: &ids, platforms: &platforms, projects, masters: &masters };

  let mut report = GenerationReport::default();
  for p in projects {
    XCode.generate_project(&ctx, p, &mut report).unwrap();
  }
  report
}

fn pbxproj(p: &Project) -> PathBuf {
  p.xcodeproj_path().join("project.pbxproj")
}

#[test]
fn minimal_project() {
  let dir = tempfile::tempdir().unwrap();
  let mut p = project("hello", dir.path(), &["main.cpp"]);
  p.configurations = vec![Configuration::new("Debug", "hello", PlatformType::MacOS, OutputType::Exe)];
  let projects = [p];

  let report = generate(&projects);
  assert!(report.generated.contains(&pbxproj(&projects[0])));
  assert!(report.skipped.is_empty());

  let text = fs::read_to_string(pbxproj(&projects[0])).unwrap();
  assert_eq!(text.matches("isa = PBXBuildFile;").count(), 1);
  assert_eq!(text.matches("isa = PBXNativeTarget;").count(), 1);
  assert!(text.contains("productType = \"com.apple.product-type.tool\";"));
  assert!(text.contains("/* main.cpp in Sources */"));
  assert!(!text.contains("REMOVE_LINE_TAG"));
  assert!(!text.contains("\n\n\n"));

  // Regenerating writes nothing and yields the same text.
  let again = generate(&projects);
  assert!(again.generated.is_empty());
  assert_eq!(again.skipped.len(), report.generated.len());
  assert_eq!(fs::read_to_string(pbxproj(&projects[0])).unwrap().lines().count(), text.lines().count());
}

#[test]
fn local_dependency_wiring() {
  let dir = tempfile::tempdir().unwrap();
  let mut p = project("game", dir.path(), &["main.cpp", "core.cpp"]);

  let mut app = Configuration::new("Debug", "app", PlatformType::MacOS, OutputType::App);
  app.dependencies = vec![Dependency::parse("core"), Dependency::parse("missing")];
  p.configurations = vec![app, Configuration::new("Debug", "core", PlatformType::MacOS, OutputType::Lib)];
  let projects = [p];

  generate(&projects);
  let text = fs::read_to_string(pbxproj(&projects[0])).unwrap();

  let ids  = IdGenerator::new();
  let core = ids.stable_id("PBXNativeTarget", "game/core");
  assert!(text.contains(&["\t\t\ttarget = ", core.as_str(), " /* core */;\n"].concat()));
  assert_eq!(text.matches("isa = PBXTargetDependency;").count(), 1);
  assert!(text.contains("/* libcore.a in Frameworks */"));
}

#[test]
fn identical_models_render_identically() {
  let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
  let make = |dir: &Path| {
    let mut p = project("hello", dir, &["src/a.cpp", "src/b.cpp", "src/inc/a.h", "res/icon.png"]);
    p.configurations = vec![
      Configuration::new("Debug",   "hello", PlatformType::IOS, OutputType::App),
      Configuration::new("Release", "hello", PlatformType::IOS, OutputType::App)
    ];
    p
  };
  let (pa, pb) = ([make(a.path())], [make(b.path())]);

  generate(&pa);
  generate(&pb);
  assert_eq!(fs::read_to_string(pbxproj(&pa[0])).unwrap(), fs::read_to_string(pbxproj(&pb[0])).unwrap());
}
