//! Solution folder trees, shared by the Xcode workspace and Visual Studio
//! solution generators, and the Xcode workspace itself.
//!
//! Each solution entry names a project and an optional logical folder such as
//! "libs/core". Folders are created on demand, once per distinct prefix, and
//! projects are rendered depth-first with folders sorted by name.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::ctx::{relative_to, Context, GenerationReport, OutputType, Project, Solution};
use crate::error::Result;
use crate::output;
use crate::resolver::{xml_escape, Resolver};
use crate::uid::IdGenerator;

pub const XCWORKSPACE_CONTENTS: &str = "contents.xcworkspacedata";

const XCWORKSPACE_HEADER: &str = concat!(
  "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
  "<Workspace\n",
  "   version = \"1.0\">\n");

const XCWORKSPACE_GROUP_BEGIN: &str = concat!(
  "[indent]<Group\n",
  "[indent]   location = \"container:\"\n",
  "[indent]   name = \"[folder]\">\n");

const XCWORKSPACE_GROUP_END: &str = "[indent]</Group>\n";

const XCWORKSPACE_FILE_REF: &str = concat!(
  "[indent]<FileRef\n",
  "[indent]   location = \"group:[path]\">\n",
  "[indent]</FileRef>\n");

const XCWORKSPACE_FOOTER: &str = "</Workspace>\n";

pub type FolderId = usize;

#[derive(Debug)]
pub struct Folder<'a> {
  pub name:     String,
  /// Full logical path, "/" separated. Empty for the root.
  pub path:     String,
  pub guid:     String,
  pub parent:   Option<FolderId>,
  pub folders:  Vec<FolderId>,
  pub projects: Vec<&'a Project>
}

#[derive(Debug)]
pub struct FolderTree<'a> {
  folders: Vec<Folder<'a>>,
  prefixes: BTreeMap<String, FolderId>
}

/// Events of a depth-first walk.
pub enum Visit<'t, 'a> {
  Enter(&'t Folder<'a>, usize),
  Leave(&'t Folder<'a>, usize),
  Project(&'a Project, Option<&'t Folder<'a>>, usize)
}

pub const ROOT: FolderId = 0;

fn split_folder(folder: &str) -> Vec<&str> {
  folder.split(|c| c == '/' || c == '\\').filter(|s| !s.is_empty()).collect()
}

impl<'a> FolderTree<'a> {
  pub fn new() -> Self {
    let root = Folder {
      name:     String::new(),
      path:     String::new(),
      guid:     String::new(),
      parent:   None,
      folders:  Vec::new(),
      projects: Vec::new()
    };
    FolderTree { folders: vec![root], prefixes: BTreeMap::new() }
  }

  /// Builds the tree of a solution's projects matching `filter`, sorted.
  pub fn of_solution<F>(ctx: &Context<'a>, solution: &Solution, filter: F) -> Self where
    F: Fn(&Project) -> bool
  {
    let mut tree = FolderTree::new();
    for entry in &solution.projects {
      match ctx.find_project(&entry.project) {
        Some(p) if filter(p) => tree.add(ctx.ids, p, &entry.folder),
        Some(_)              => {},
        None                 => {
          warn!(solution = %solution.name, project = %entry.project, "unknown project, skipped");
        }
      }
    }
    tree.sort();
    tree
  }

  pub fn get(&self, id: FolderId) -> &Folder<'a> {
    &self.folders[id]
  }

  /// Folders in creation order, the root excluded.
  pub fn folders(&self) -> impl Iterator<Item = &Folder<'a>> {
    self.folders.iter().skip(1)
  }

  pub fn is_empty(&self) -> bool {
    self.folders.iter().all(|f| f.projects.is_empty())
  }

  /// Returns the folder for a logical path, creating it and its ancestors.
  pub fn folder(&mut self, ids: &IdGenerator, folder: &str) -> FolderId {
    let mut parent = ROOT;
    let mut path   = String::new();
    for segment in split_folder(folder) {
      if !path.is_empty() {
        path.push('/');
      }
      path.push_str(segment);

      parent = match self.prefixes.get(&path) {
        Some(&id) => id,
        None      => {
          let id = self.folders.len();
          self.folders.push(Folder {
            name:     segment.to_string(),
            path:     path.clone(),
            guid:     ids.guid(&["folder/", path.as_str()].concat()),
            parent:   Some(parent),
            folders:  Vec::new(),
            projects: Vec::new()
          });
          self.folders[parent].folders.push(id);
          self.prefixes.insert(path.clone(), id);
          id
        }
      };
    }
    parent
  }

  pub fn add(&mut self, ids: &IdGenerator, project: &'a Project, folder: &str) {
    let id = self.folder(ids, folder);
    if !self.folders[id].projects.iter().any(|p| p.name == project.name) {
      self.folders[id].projects.push(project);
    }
  }

  /// Sorts sub-folders by name, ignoring case, then by guid. Projects sort by
  /// name, ignoring case.
  pub fn sort(&mut self) {
    for i in 0..self.folders.len() {
      let mut children = std::mem::take(&mut self.folders[i].folders);
      children.sort_by(|&a, &b| {
        let (a, b) = (&self.folders[a], &self.folders[b]);
        a.name.to_lowercase().cmp(&b.name.to_lowercase())
          .then_with(|| a.guid.cmp(&b.guid))
      });
      self.folders[i].folders = children;

      self.folders[i].projects.sort_by(|a, b| {
        a.name.to_lowercase().cmp(&b.name.to_lowercase())
          .then_with(|| a.name.cmp(&b.name))
      });
    }
  }

  /// Moves the first project matching `pred` at the root to the front.
  pub fn promote_first<F>(&mut self, pred: F) where F: Fn(&Project) -> bool {
    let root = &mut self.folders[ROOT].projects;
    if let Some(i) = root.iter().position(|p| pred(p)) {
      let p = root.remove(i);
      root.insert(0, p);
    }
  }

  /// Walks the tree depth-first: sub-folders first, then projects.
  pub fn walk<F>(&self, mut f: F) -> Result<()> where F: FnMut(Visit<'_, 'a>) -> Result<()> {
    self.walk_folder(ROOT, 0, &mut f)
  }

  fn walk_folder<F>(&self, id: FolderId, depth: usize, f: &mut F) -> Result<()> where
    F: FnMut(Visit<'_, 'a>) -> Result<()>
  {
    let folder = &self.folders[id];
    for &child in &folder.folders {
      f(Visit::Enter(&self.folders[child], depth))?;
      self.walk_folder(child, depth + 1, f)?;
      f(Visit::Leave(&self.folders[child], depth))?;
    }
    let parent = match id {
      ROOT => None,
      _    => Some(folder)
    };
    for &p in &folder.projects {
      f(Visit::Project(p, parent, depth))?;
    }
    Ok(())
  }
}

fn indent(depth: usize) -> String {
  "   ".repeat(depth + 1)
}

fn is_xcode_project(p: &Project) -> bool {
  p.configurations.iter().any(|c| c.platform.is_apple())
}

fn is_xcode_executable(p: &Project) -> bool {
  match p.configurations.iter().find(|c| c.platform.is_apple()) {
    Some(c) => c.output == OutputType::Exe || c.output == OutputType::App,
    None    => false
  }
}

pub fn xcworkspace_path(solution: &Solution) -> PathBuf {
  solution.output_dir.join([solution.name.as_str(), ".xcworkspace"].concat()).join(XCWORKSPACE_CONTENTS)
}

pub fn render_xcworkspace(tree: &FolderTree, output_dir: &std::path::Path) -> Result<String> {
  let resolver = Resolver::new();
  let mut out  = resolver.resolve(XCWORKSPACE_HEADER)?;

  tree.walk(|visit| {
    let text = match visit {
      Visit::Enter(folder, depth) => {
        let _indent = resolver.declare("indent", indent(depth));
        let _folder = resolver.declare("folder", xml_escape(&folder.name));
        resolver.resolve(XCWORKSPACE_GROUP_BEGIN)?
      },
      Visit::Leave(_, depth) => {
        let _indent = resolver.declare("indent", indent(depth));
        resolver.resolve(XCWORKSPACE_GROUP_END)?
      },
      Visit::Project(project, _, depth) => {
        let _indent = resolver.declare("indent", indent(depth));
        let _path   = resolver.declare("path", xml_escape(&relative_to(&project.xcodeproj_path(), output_dir)));
        resolver.resolve(XCWORKSPACE_FILE_REF)?
      }
    };
    out.push_str(&text);
    Ok(())
  })?;

  out.push_str(&resolver.resolve(XCWORKSPACE_FOOTER)?);
  Ok(out)
}

/// Writes `<solution>.xcworkspace`, or removes it once no Xcode project is left.
pub fn generate_xcworkspace(ctx: &Context, solution: &Solution, report: &mut GenerationReport) -> Result<()> {
  let path     = xcworkspace_path(solution);
  let mut tree = FolderTree::of_solution(ctx, solution, is_xcode_project);

  if tree.is_empty() {
    let removed = output::remove_stale(&path)?;
    debug!(solution = %solution.name, removed, "no xcode project in workspace");
    if removed {
      report.record(path, true);
    }
    return Ok(());
  }

  tree.promote_first(is_xcode_executable);
  output::emit(report, &path, &render_xcworkspace(&tree, &solution.output_dir)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{Configuration, MasterBffIndex, PlatformType, SolutionProject};
  use crate::platform;
  use pretty_assertions::assert_eq;
  use std::path::Path;

  fn project(name: &str, output: OutputType) -> Project {
    let mut p = Project::new(name, Path::new("/work").join(name), PathBuf::from("/work/build"));
    p.configurations = vec![Configuration::new("Debug", name, PlatformType::MacOS, output)];
    p
  }

  #[test]
  fn folders_share_prefixes() {
    let ids = IdGenerator::new();
    let (a, b, c) = (project("a", OutputType::Lib), project("b", OutputType::Lib), project("c", OutputType::Lib));

    let mut tree = FolderTree::new();
    tree.add(&ids, &a, "libs/Core");
    tree.add(&ids, &b, "libs\\core");
    tree.add(&ids, &c, "libs");
    tree.add(&ids, &c, "libs");
    tree.sort();

    let names: Vec<&str> = tree.folders().map(|f| f.path.as_str()).collect();
    assert_eq!(names, vec!["libs", "libs/Core", "libs/core"]);
    assert_eq!(tree.get(1).projects.len(), 1);
    assert_eq!(tree.get(1).folders.len(), 2);
    assert_eq!(tree.get(2).guid, ids.guid("folder/libs/Core"));
  }

  #[test]
  fn renders_groups_depth_first() {
    let ids  = IdGenerator::new();
    let lib  = project("core", OutputType::Lib);
    let app  = project("game", OutputType::App);
    let tool = project("tool", OutputType::Lib);

    let mut tree = FolderTree::new();
    tree.add(&ids, &tool, "");
    tree.add(&ids, &lib,  "libs");
    tree.add(&ids, &app,  "");
    tree.sort();
    tree.promote_first(is_xcode_executable);

    let text = render_xcworkspace(&tree, Path::new("/work/build")).unwrap();
    assert_eq!(text, concat!(
      "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
      "<Workspace\n",
      "   version = \"1.0\">\n",
      "   <Group\n",
      "      location = \"container:\"\n",
      "      name = \"libs\">\n",
      "      <FileRef\n",
      "         location = \"group:core.xcodeproj\">\n",
      "      </FileRef>\n",
      "   </Group>\n",
      "   <FileRef\n",
      "      location = \"group:game.xcodeproj\">\n",
      "   </FileRef>\n",
      "   <FileRef\n",
      "      location = \"group:tool.xcodeproj\">\n",
      "   </FileRef>\n",
      "</Workspace>\n"));
  }

  #[test]
  fn projects_sort_by_name() {
    let ids   = IdGenerator::new();
    let zeta  = project("zeta",  OutputType::Lib);
    let alpha = project("Alpha", OutputType::Lib);
    let beta  = project("beta",  OutputType::Lib);

    let mut tree = FolderTree::new();
    tree.add(&ids, &zeta,  "R&D");
    tree.add(&ids, &beta,  "R&D");
    tree.add(&ids, &alpha, "R&D");
    tree.sort();

    let names: Vec<&str> = tree.get(1).projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "beta", "zeta"]);

    let text = render_xcworkspace(&tree, Path::new("/work/build")).unwrap();
    assert!(text.contains("      name = \"R&amp;D\">\n"));
    let (a, z) = (text.find("Alpha.xcodeproj").unwrap(), text.find("zeta.xcodeproj").unwrap());
    assert!(a < z);
  }

  #[test]
  fn empty_workspace_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let mut win = Project::new("win", dir.path().join("win"), dir.path().to_path_buf());
    win.configurations = vec![Configuration::new("Debug", "win", PlatformType::Windows, OutputType::Exe)];
    let projects = [win];

    let solution = Solution {
      name:       "game".to_string(),
      output_dir: dir.path().to_path_buf(),
      projects:   vec![SolutionProject { project: "win".to_string(), folder: String::new() }],
      master_bff: false
    };

    let ids       = IdGenerator::new();
    let platforms = platform::init();
    let masters   = MasterBffIndex::new();
    let ctx = Context { ids: &ids, platforms: &platforms, projects: &projects, masters: &masters };

    let mut report = GenerationReport::default();
    generate_xcworkspace(&ctx, &solution, &mut report).unwrap();
    assert!(report.generated.is_empty());
    assert!(report.skipped.is_empty());

    let path = xcworkspace_path(&solution);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "stale").unwrap();
    generate_xcworkspace(&ctx, &solution, &mut report).unwrap();
    assert_eq!(report.generated, vec![path.clone()]);
    assert!(!path.exists());
  }
}
