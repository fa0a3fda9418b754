//! Projection of file paths onto the PBXGroup hierarchy.
//!
//! Files are inserted by full path under one of the tree roots. Intermediate
//! folders become groups; the last path segment, or the first segment carrying
//! one of the folder-as-file extensions, becomes a file reference.

use crate::gen::xcode::graph::{Category, FileType, FsEntry, Graph, NodeId, NodeKind, SourceTree};

/// Folders which Xcode treats as a single file.
const FOLDER_FILES: &[&str] = &["bundle", "xcassets", "framework"];

pub struct FileTree {
  pub main_group: NodeId,
  roots:          Vec<NodeId>
}

impl FileTree {
  pub fn new(graph: &mut Graph, project_name: &str) -> Self {
    let entry = FsEntry::new("", project_name, "", SourceTree::Group);
    let (main_group, _) = graph.insert(Category::PBXGroup, "", NodeKind::Group(entry));
    FileTree { main_group, roots: Vec::new() }
  }

  /// Declares a root group for files under `full_path`, appended to the main
  /// group's children.
  pub fn add_root(&mut self, graph: &mut Graph, full_path: &str, name: &str,
                  source_tree: SourceTree) -> NodeId
  {
    let full_path = normalize(full_path);
    let path      = match source_tree {
      SourceTree::Group | SourceTree::Absolute => full_path.clone(),
      _                                        => String::new()
    };
    let entry     = FsEntry::new(&full_path, name, path, source_tree);
    let (id, created) = graph.insert(Category::PBXGroup, full_path.as_str(), NodeKind::Group(entry));
    if created {
      self.attach(graph, self.main_group, id, None);
      self.roots.push(id);
    }
    id
  }

  /// Declares a virtual group under the main group, such as "Products".
  pub fn add_group(&mut self, graph: &mut Graph, name: &str) -> NodeId {
    let identifier = ["<", name, ">"].concat();
    let entry      = FsEntry::new(&identifier, name, "", SourceTree::Group);
    let (id, created) = graph.insert(Category::PBXGroup, identifier.as_str(), NodeKind::Group(entry));
    if created {
      self.attach(graph, self.main_group, id, None);
    }
    id
  }

  /// Attaches a detached node under `parent`, at `index` or last.
  pub fn attach(&self, graph: &mut Graph, parent: NodeId, child: NodeId, index: Option<usize>) {
    if let Some(e) = graph.fs_mut(child) {
      e.parent = Some(parent);
    }
    if let Some(e) = graph.fs_mut(parent) {
      if !e.children.contains(&child) {
        match index {
          Some(i) => e.children.insert(i.min(e.children.len()), child),
          None    => e.children.push(child)
        }
      }
    }
  }

  /// Returns the file node and whether it was already part of the tree.
  pub fn insert(&mut self, graph: &mut Graph, full_path: &str, build: bool,
                source: bool) -> (NodeId, bool)
  {
    let full_path = normalize(full_path);
    let root = match self.find_root(graph, &full_path) {
      Some(root) => root,
      None       => self.add_implicit_root(graph, &full_path)
    };

    let root_path = graph.get(root).fs().map(|e| e.full_path.clone()).unwrap_or_default();
    let relative  = full_path[root_path.len()..].trim_start_matches('/');

    let mut parent   = root;
    let mut cur_path = root_path;
    let mut segments = relative.split('/').filter(|s| !s.is_empty()).peekable();
    while let Some(segment) = segments.next() {
      if !cur_path.is_empty() && !cur_path.ends_with('/') {
        cur_path.push('/');
      }
      cur_path.push_str(segment);

      let leaf = segments.peek().is_none() || is_folder_file(segment);
      if let Some(existing) = self.child_named(graph, parent, segment) {
        match leaf {
          true  => return (existing, true),
          false => {
            parent = existing;
            continue;
          }
        }
      }

      let mut entry = FsEntry::new(&cur_path, segment, segment, SourceTree::Group);
      let (category, kind) = match leaf {
        true  => {
          entry.build  = build;
          entry.source = source;
          (Category::PBXFileReference, NodeKind::File(entry, file_type(segment)))
        },
        false => (Category::PBXGroup, NodeKind::Group(entry))
      };

      let (id, _) = graph.insert(category, cur_path.as_str(), kind);
      self.attach(graph, parent, id, None);
      if leaf {
        return (id, false);
      }
      parent = id;
    }

    // The path named a root itself.
    (parent, true)
  }

  /// Removes a node, then every ancestor left empty up to the tree root.
  pub fn remove(&mut self, graph: &mut Graph, node: NodeId) {
    let mut node = node;
    loop {
      let parent = graph.get(node).fs().and_then(|e| e.parent);
      graph.remove(node);
      self.roots.retain(|&r| r != node);

      let parent = match parent {
        Some(p) => p,
        None    => break
      };
      let empty = match graph.fs_mut(parent) {
        Some(e) => {
          e.children.retain(|&c| c != node);
          e.children.is_empty()
        },
        None => false
      };
      if !empty || parent == self.main_group || self.roots.contains(&parent) {
        break;
      }
      node = parent;
    }
  }

  /// Removes every empty group but the main group.
  pub fn prune_empty(&mut self, graph: &mut Graph) {
    loop {
      let empty: Vec<NodeId> = graph.instances(Category::PBXGroup).into_iter()
        .filter(|&g| g != self.main_group)
        .filter(|&g| graph.get(g).fs().map_or(false, |e| e.children.is_empty()))
        .collect();

      if empty.is_empty() {
        break;
      }

      for g in empty {
        if let Some(parent) = graph.get(g).fs().and_then(|e| e.parent) {
          if let Some(e) = graph.fs_mut(parent) {
            e.children.retain(|&c| c != g);
          }
        }
        self.roots.retain(|&r| r != g);
        graph.remove(g);
      }
    }
  }

  /// Pre-order traversal from the main group.
  pub fn walk(&self, graph: &Graph) -> Vec<NodeId> {
    subtree(graph, self.main_group)
  }

  fn find_root(&self, graph: &Graph, path: &str) -> Option<NodeId> {
    let path = path.to_ascii_lowercase();
    self.roots.iter()
      .filter_map(|&r| graph.get(r).fs().map(|e| (r, e.full_path.to_ascii_lowercase())))
      .filter(|(_, root)| {
        !root.is_empty() && path.starts_with(root.as_str()) &&
          (path.len() == root.len() || root.ends_with('/') || path.as_bytes()[root.len()] == b'/')
      })
      .max_by_key(|(_, root)| root.len())
      .map(|(r, _)| r)
  }

  fn add_implicit_root(&mut self, graph: &mut Graph, path: &str) -> NodeId {
    let dir   = match path.rfind('/') {
      Some(0) => "/",
      Some(i) => &path[..i],
      None    => return self.main_group
    };
    let name  = dir.rsplit('/').find(|s| !s.is_empty()).unwrap_or(dir);
    let entry = FsEntry::new(dir, name, dir, SourceTree::Absolute);
    let (id, _) = graph.insert(Category::PBXGroup, dir, NodeKind::Group(entry));
    self.attach(graph, self.main_group, id, Some(0));
    self.roots.push(id);
    id
  }

  fn child_named(&self, graph: &Graph, parent: NodeId, name: &str) -> Option<NodeId> {
    graph.get(parent).fs()?.children.iter()
      .find(|&&c| graph.get(c).fs().map_or(false, |e| e.name == name))
      .cloned()
  }
}

/// Pre-order traversal from any node.
pub fn subtree(graph: &Graph, node: NodeId) -> Vec<NodeId> {
  let mut order = Vec::new();
  walk_from(graph, node, &mut order);
  order
}

fn walk_from(graph: &Graph, node: NodeId, order: &mut Vec<NodeId>) {
  if graph.is_removed(node) {
    return;
  }
  order.push(node);
  if let Some(e) = graph.get(node).fs() {
    for &c in &e.children {
      walk_from(graph, c, order);
    }
  }
}

pub fn normalize(path: &str) -> String {
  let path = path.replace('\\', "/");
  match path.len() > 1 && path.ends_with('/') {
    true  => path.trim_end_matches('/').to_string(),
    false => path
  }
}

fn extension(name: &str) -> &str {
  match name.rfind('.') {
    Some(i) if i > 0 => &name[i + 1..],
    _                => ""
  }
}

fn is_folder_file(segment: &str) -> bool {
  FOLDER_FILES.contains(&extension(segment).to_lowercase().as_str())
}

pub fn is_source_file(name: &str) -> bool {
  match extension(name).to_lowercase().as_str() {
    "c" | "cc" | "cpp" | "cxx" | "m" | "mm" | "s" | "swift" => true,
    _                                                       => false
  }
}

pub fn is_header_file(name: &str) -> bool {
  match extension(name).to_lowercase().as_str() {
    "h" | "hh" | "hpp" | "hxx" | "inl" => true,
    _                                 => false
  }
}

pub fn file_type(name: &str) -> FileType {
  let (name, explicit) = match extension(name).to_lowercase().as_str() {
    ""                  => ("\"compiled.mach-o.executable\"", true),
    "c"                 => ("sourcecode.c.c", false),
    "cc" | "cpp" | "cxx" => ("sourcecode.cpp.cpp", false),
    "h" | "hh" | "hpp" | "hxx" | "inl" => ("sourcecode.c.h", false),
    "s"                 => ("sourcecode.asm", false),
    "m"                 => ("sourcecode.c.objc", false),
    "mm"                => ("sourcecode.cpp.objcpp", false),
    "swift"             => ("sourcecode.swift", false),
    "xcodeproj"         => ("\"wrapper.pb-project\"", false),
    "framework"         => ("wrapper.framework", false),
    "bundle"            => ("\"wrapper.plug-in\"", false),
    "xcassets"          => ("folder.assetcatalog", false),
    "app"               => ("wrapper.application", true),
    "xctest"            => ("wrapper.cfbundle", true),
    "dylib"             => ("\"compiled.mach-o.dylib\"", true),
    "a"                 => ("archive.ar", true),
    "plist"             => ("text.plist.xml", false),
    "entitlements"      => ("text.plist.entitlements", false),
    "strings"           => ("text.plist.strings", false),
    "storyboard"        => ("file.storyboard", false),
    "xib"               => ("file.xib", false),
    "txt"               => ("text", false),
    "json"              => ("text.json", false),
    "xml"               => ("text.xml", false),
    "png"               => ("image.png", false),
    "jpg" | "jpeg"      => ("image.jpeg", false),
    "metal"             => ("sourcecode.metal", false),
    _                   => ("\"?\"", false)
  };
  FileType { name, explicit }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::uid::IdGenerator;

  fn children(graph: &Graph, id: NodeId) -> Vec<String> {
    graph.get(id).fs().unwrap().children.iter()
      .map(|&c| graph.get(c).fs().unwrap().name.clone())
      .collect()
  }

  #[test]
  fn insert_is_idempotent() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let mut tree = FileTree::new(&mut g, "hello");
    tree.add_root(&mut g, "/work/hello", "hello", SourceTree::Group);

    let (a, present_a) = tree.insert(&mut g, "/work/hello/src/main.cpp", true, true);
    let (b, present_b) = tree.insert(&mut g, "/work/hello/src/main.cpp", true, true);
    assert!(!present_a && present_b);
    assert_eq!(a, b);
    assert_eq!(g.instances(Category::PBXFileReference).len(), 1);
  }

  #[test]
  fn siblings_share_folders() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let mut tree = FileTree::new(&mut g, "hello");
    let root = tree.add_root(&mut g, "/work/hello", "hello", SourceTree::Group);

    tree.insert(&mut g, "/work/hello/src/a.cpp", true, true);
    tree.insert(&mut g, "/WORK/Hello/src/b.cpp", true, true);

    assert_eq!(children(&g, root), vec!["src"]);
    let src = g.find(Category::PBXGroup, "/work/hello/src").unwrap();
    assert_eq!(children(&g, src), vec!["a.cpp", "b.cpp"]);
  }

  #[test]
  fn unmatched_paths_get_a_root_first_in_the_main_group() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let mut tree = FileTree::new(&mut g, "hello");
    tree.add_root(&mut g, "/work/hello", "hello", SourceTree::Group);
    tree.insert(&mut g, "/opt/sdk/include/sdk.h", false, false);

    assert_eq!(children(&g, tree.main_group), vec!["include", "hello"]);
    let (_, present) = tree.insert(&mut g, "/opt/sdk/include/other.h", false, false);
    assert!(!present);
    assert_eq!(children(&g, tree.main_group).len(), 2);
  }

  #[test]
  fn folder_files_are_leaves() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let mut tree = FileTree::new(&mut g, "hello");
    tree.add_root(&mut g, "/work", "work", SourceTree::Group);
    let (id, _) = tree.insert(&mut g, "/work/data/Assets.xcassets/icon.png", false, false);
    let node = g.get(id);
    assert_eq!(node.category, Category::PBXFileReference);
    assert_eq!(node.identifier, "/work/data/Assets.xcassets");
  }

  #[test]
  fn remove_prunes_empty_parents() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let mut tree = FileTree::new(&mut g, "hello");
    let root = tree.add_root(&mut g, "/work", "work", SourceTree::Group);
    let (a, _) = tree.insert(&mut g, "/work/src/deep/a.cpp", true, true);
    tree.insert(&mut g, "/work/src/b.cpp", true, true);

    tree.remove(&mut g, a);
    assert!(g.find(Category::PBXGroup, "/work/src/deep").is_none());
    let src = g.find(Category::PBXGroup, "/work/src").unwrap();
    assert_eq!(children(&g, src), vec!["b.cpp"]);
    assert_eq!(children(&g, root), vec!["src"]);
  }

  #[test]
  fn prune_keeps_non_empty_ancestors() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let mut tree = FileTree::new(&mut g, "hello");
    let root = tree.add_root(&mut g, "/work", "work", SourceTree::Group);
    tree.add_group(&mut g, "Frameworks");
    tree.insert(&mut g, "/work/a/b/c/file.h", false, false);
    let (leaf, _) = g.insert(Category::PBXGroup, "/work/a/empty",
                             NodeKind::Group(FsEntry::new("/work/a/empty", "empty", "empty",
                                                          SourceTree::Group)));
    let a = g.find(Category::PBXGroup, "/work/a").unwrap();
    tree.attach(&mut g, a, leaf, None);

    tree.prune_empty(&mut g);
    assert!(g.is_removed(leaf));
    assert!(g.find(Category::PBXGroup, "<Frameworks>").is_none());
    assert_eq!(children(&g, a), vec!["b"]);
    assert_eq!(children(&g, tree.main_group), vec!["work"]);
    assert_eq!(children(&g, root), vec!["a"]);
  }

  #[test]
  fn walk_is_pre_order() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let mut tree = FileTree::new(&mut g, "hello");
    tree.add_root(&mut g, "/w", "w", SourceTree::Group);
    tree.insert(&mut g, "/w/x/1.c", true, true);
    tree.insert(&mut g, "/w/2.c", true, true);
    let names: Vec<String> = tree.walk(&g).into_iter()
      .map(|n| g.get(n).fs().unwrap().name.clone())
      .collect();
    assert_eq!(names, vec!["hello", "w", "x", "1.c", "2.c"]);
  }

  #[test]
  fn file_types() {
    assert_eq!(file_type("main.cpp").name, "sourcecode.cpp.cpp");
    assert_eq!(file_type("libcore.a"), FileType { name: "archive.ar", explicit: true });
    assert_eq!(file_type("hello").name, "\"compiled.mach-o.executable\"");
    assert_eq!(file_type("notes.weird").name, "\"?\"");
    assert!(is_source_file("x.MM"));
    assert!(is_header_file("x.hpp"));
  }
}
