//! The object graph of a single project.pbxproj file.
//!
//! Every object is a [`Node`] stored in a [`Graph`] arena and referenced by
//! [`NodeId`]. A node is unique by its category and identifier: inserting a
//! second node with the same key returns the existing one. The object id
//! written to the file is derived from that same key.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use crate::uid::IdGenerator;

/// Object sections, in the order Xcode writes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
  PBXBuildFile,
  PBXContainerItemProxy,
  PBXCopyFilesBuildPhase,
  PBXFileReference,
  PBXFrameworksBuildPhase,
  PBXGroup,
  PBXHeadersBuildPhase,
  PBXLegacyTarget,
  PBXNativeTarget,
  PBXProject,
  PBXReferenceProxy,
  PBXResourcesBuildPhase,
  PBXShellScriptBuildPhase,
  PBXSourcesBuildPhase,
  PBXTargetDependency,
  XCBuildConfigurationNativeTarget,
  XCBuildConfigurationLegacyTarget,
  XCBuildConfigurationUnitTestTarget,
  XCBuildConfigurationProject,
  XCConfigurationList
}

impl Category {
  pub const ALL: [Category; 20] = [
    Category::PBXBuildFile,
    Category::PBXContainerItemProxy,
    Category::PBXCopyFilesBuildPhase,
    Category::PBXFileReference,
    Category::PBXFrameworksBuildPhase,
    Category::PBXGroup,
    Category::PBXHeadersBuildPhase,
    Category::PBXLegacyTarget,
    Category::PBXNativeTarget,
    Category::PBXProject,
    Category::PBXReferenceProxy,
    Category::PBXResourcesBuildPhase,
    Category::PBXShellScriptBuildPhase,
    Category::PBXSourcesBuildPhase,
    Category::PBXTargetDependency,
    Category::XCBuildConfigurationNativeTarget,
    Category::XCBuildConfigurationLegacyTarget,
    Category::XCBuildConfigurationUnitTestTarget,
    Category::XCBuildConfigurationProject,
    Category::XCConfigurationList
  ];

  /// Part of the key hashed into object ids.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PBXBuildFile                       => "PBXBuildFile",
      Self::PBXContainerItemProxy              => "PBXContainerItemProxy",
      Self::PBXCopyFilesBuildPhase             => "PBXCopyFilesBuildPhase",
      Self::PBXFileReference                   => "PBXFileReference",
      Self::PBXFrameworksBuildPhase            => "PBXFrameworksBuildPhase",
      Self::PBXGroup                           => "PBXGroup",
      Self::PBXHeadersBuildPhase               => "PBXHeadersBuildPhase",
      Self::PBXLegacyTarget                    => "PBXLegacyTarget",
      Self::PBXNativeTarget                    => "PBXNativeTarget",
      Self::PBXProject                         => "PBXProject",
      Self::PBXReferenceProxy                  => "PBXReferenceProxy",
      Self::PBXResourcesBuildPhase             => "PBXResourcesBuildPhase",
      Self::PBXShellScriptBuildPhase           => "PBXShellScriptBuildPhase",
      Self::PBXSourcesBuildPhase               => "PBXSourcesBuildPhase",
      Self::PBXTargetDependency                => "PBXTargetDependency",
      Self::XCBuildConfigurationNativeTarget   => "XCBuildConfiguration_NativeTarget",
      Self::XCBuildConfigurationLegacyTarget   => "XCBuildConfiguration_LegacyTarget",
      Self::XCBuildConfigurationUnitTestTarget => "XCBuildConfiguration_UnitTestTarget",
      Self::XCBuildConfigurationProject        => "XCBuildConfiguration_Project",
      Self::XCConfigurationList                => "XCConfigurationList"
    }
  }

  /// The `isa` of the objects, also naming the section they're written in.
  pub fn isa(self) -> &'static str {
    match self {
      Self::XCBuildConfigurationNativeTarget   |
      Self::XCBuildConfigurationLegacyTarget   |
      Self::XCBuildConfigurationUnitTestTarget |
      Self::XCBuildConfigurationProject        => "XCBuildConfiguration",
      _                                        => self.as_str()
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceTree {
  Group,
  Absolute,
  SourceRoot,
  BuiltProducts,
  Sdk,
  DeveloperDir
}

impl SourceTree {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Group         => "\"<group>\"",
      Self::Absolute      => "\"<absolute>\"",
      Self::SourceRoot    => "SOURCE_ROOT",
      Self::BuiltProducts => "BUILT_PRODUCTS_DIR",
      Self::Sdk           => "SDKROOT",
      Self::DeveloperDir  => "DEVELOPER_DIR"
    }
  }
}

/// Fields shared by every node living in the group tree.
#[derive(Clone, Debug)]
pub struct FsEntry {
  pub full_path:   String,
  pub name:        String,
  pub path:        String,
  pub source_tree: SourceTree,
  pub parent:      Option<NodeId>,
  pub children:    Vec<NodeId>,
  pub build:       bool,
  pub source:      bool
}

impl FsEntry {
  pub fn new<N, P>(full_path: &str, name: N, path: P, source_tree: SourceTree) -> Self where
    N: Into<String>, P: Into<String>
  {
    FsEntry {
      full_path:   full_path.to_string(),
      name:        name.into(),
      path:        path.into(),
      source_tree,
      parent:      None,
      children:    Vec::new(),
      build:       false,
      source:      false
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FileType {
  pub name:     &'static str,
  /// Products are declared with `explicitFileType` and kept out of the index.
  pub explicit: bool
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhaseKind {
  Sources,
  Frameworks,
  Resources,
  Headers,
  CopyFiles   { name: String, dst_path: String, dst_subfolder_spec: u8 },
  ShellScript { name: String, script: String }
}

impl PhaseKind {
  pub fn category(&self) -> Category {
    match self {
      Self::Sources           => Category::PBXSourcesBuildPhase,
      Self::Frameworks        => Category::PBXFrameworksBuildPhase,
      Self::Resources         => Category::PBXResourcesBuildPhase,
      Self::Headers           => Category::PBXHeadersBuildPhase,
      Self::CopyFiles   { .. } => Category::PBXCopyFilesBuildPhase,
      Self::ShellScript { .. } => Category::PBXShellScriptBuildPhase
    }
  }

  pub fn name(&self) -> &str {
    match self {
      Self::Sources                  => "Sources",
      Self::Frameworks               => "Frameworks",
      Self::Resources                => "Resources",
      Self::Headers                  => "Headers",
      Self::CopyFiles   { name, .. } |
      Self::ShellScript { name, .. } => name
    }
  }
}

#[derive(Clone, Debug)]
pub struct Phase {
  pub kind:            PhaseKind,
  pub files:           Vec<NodeId>,
  pub deployment_only: bool
}

#[derive(Clone, Debug)]
pub struct BuildFile {
  pub file:     NodeId,
  pub phase:    String,
  pub settings: Option<String>
}

#[derive(Clone, Debug)]
pub struct ContainerProxy {
  pub portal:      NodeId,
  /// 1 for a target, 2 for a product reference.
  pub proxy_type:  u8,
  pub remote:      String,
  pub remote_info: String
}

#[derive(Clone, Debug)]
pub struct TargetDependency {
  pub name:   String,
  pub target: Option<NodeId>,
  pub proxy:  NodeId
}

#[derive(Clone, Debug)]
pub struct ReferenceProxy {
  pub file_type: &'static str,
  pub proxy:     NodeId
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegacyBuild {
  pub tool:        String,
  pub arguments:   String,
  pub working_dir: String
}

#[derive(Clone, Debug)]
pub struct Target {
  pub name:         String,
  pub product_type: &'static str,
  pub product:      NodeId,
  pub config_list:  NodeId,
  pub install_path: String,
  pub phases:       Vec<NodeId>,
  pub dependencies: Vec<NodeId>,
  /// The application hosting a unit test bundle.
  pub test_host:    Option<NodeId>,
  /// Set for targets built by an external tool. `None` inside marks a legacy
  /// target with no way to build it.
  pub legacy:       Option<Option<LegacyBuild>>
}

#[derive(Clone, Debug)]
pub struct BuildConfiguration {
  pub name:             String,
  pub product_name:     String,
  pub install_path:     String,
  pub intermediate_dir: String,
  pub test_host:        String,
  pub options:          BTreeMap<String, String>
}

#[derive(Clone, Debug)]
pub struct ConfigurationList {
  pub owner_isa:      &'static str,
  pub owner_name:     String,
  pub configurations: Vec<NodeId>
}

#[derive(Clone, Debug)]
pub struct ProjectReference {
  pub products_group: NodeId,
  pub project_file:   NodeId
}

#[derive(Clone, Debug)]
pub struct ProjectMain {
  pub name:               String,
  pub config_list:        NodeId,
  pub main_group:         NodeId,
  pub products_group:     NodeId,
  pub targets:            Vec<NodeId>,
  pub project_references: Vec<ProjectReference>,
  pub development_team:   String,
  pub provisioning_style: String,
  pub icloud:             bool
}

#[derive(Clone, Debug)]
pub enum NodeKind {
  File(FsEntry, FileType),
  Group(FsEntry),
  ReferenceProxy(FsEntry, ReferenceProxy),
  BuildFile(BuildFile),
  Phase(Phase),
  ContainerProxy(ContainerProxy),
  TargetDependency(TargetDependency),
  Target(Target),
  Configuration(BuildConfiguration),
  ConfigurationList(ConfigurationList),
  Project(ProjectMain)
}

#[derive(Clone, Debug)]
pub struct Node {
  pub category:   Category,
  pub identifier: String,
  pub uid:        String,
  pub kind:       NodeKind,
  removed:        bool
}

impl Node {
  pub fn fs(&self) -> Option<&FsEntry> {
    match &self.kind {
      NodeKind::File(e, _) | NodeKind::Group(e) | NodeKind::ReferenceProxy(e, _) => Some(e),
      _                                                                         => None
    }
  }

  fn fs_mut(&mut self) -> Option<&mut FsEntry> {
    match &mut self.kind {
      NodeKind::File(e, _) | NodeKind::Group(e) | NodeKind::ReferenceProxy(e, _) => Some(e),
      _                                                                         => None
    }
  }

  /// Short description written next to the id in comments.
  pub fn comment(&self, graph: &Graph) -> String {
    match &self.kind {
      NodeKind::File(e, _) | NodeKind::Group(e) | NodeKind::ReferenceProxy(e, _) => e.name.clone(),
      NodeKind::BuildFile(b) => {
        let name = graph.get(b.file).fs().map(|e| e.name.as_str()).unwrap_or_default();
        [name, " in ", b.phase.as_str()].concat()
      },
      NodeKind::Phase(p)             => p.kind.name().to_string(),
      NodeKind::ContainerProxy(_)    => "PBXContainerItemProxy".to_string(),
      NodeKind::TargetDependency(_)  => "PBXTargetDependency".to_string(),
      NodeKind::Target(t)            => t.name.clone(),
      NodeKind::Configuration(c)     => c.name.clone(),
      NodeKind::ConfigurationList(l) => {
        ["Build configuration list for ", l.owner_isa, " \"", l.owner_name.as_str(), "\""].concat()
      },
      NodeKind::Project(_)           => "Project object".to_string()
    }
  }
}

impl PartialEq for Node {
  fn eq(&self, other: &Self) -> bool {
    self.category == other.category && self.identifier == other.identifier
  }
}

impl Eq for Node {}

impl Hash for Node {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.category.hash(state);
    self.identifier.hash(state);
  }
}

impl PartialOrd for Node {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Node {
  fn cmp(&self, other: &Self) -> Ordering {
    self.category.cmp(&other.category)
      .then_with(|| self.identifier.cmp(&other.identifier))
  }
}

pub struct Graph<'a> {
  ids:   &'a IdGenerator,
  nodes: Vec<Node>,
  index: HashMap<(Category, String), NodeId>
}

impl<'a> Graph<'a> {
  pub fn new(ids: &'a IdGenerator) -> Self {
    Graph { ids, nodes: Vec::new(), index: HashMap::new() }
  }

  /// Returns the node's id and whether it was created by this call.
  pub fn insert<S: Into<String>>(&mut self, category: Category, identifier: S,
                                 kind: NodeKind) -> (NodeId, bool)
  {
    let identifier = identifier.into();
    let key = (category, identifier);
    if let Some(&id) = self.index.get(&key) {
      return (id, false);
    }

    let id  = NodeId(self.nodes.len());
    let uid = self.stable_id(category, &key.1);
    self.nodes.push(Node { category, identifier: key.1.clone(), uid, kind, removed: false });
    self.index.insert(key, id);
    (id, true)
  }

  /// The id a node with this key has, in this project or any other.
  pub fn stable_id(&self, category: Category, identifier: &str) -> String {
    self.ids.stable_id(category.as_str(), identifier)
  }

  pub fn find(&self, category: Category, identifier: &str) -> Option<NodeId> {
    self.index.get(&(category, identifier.to_string())).cloned()
  }

  pub fn get(&self, id: NodeId) -> &Node {
    &self.nodes[id.0]
  }

  pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.0]
  }

  pub fn uid(&self, id: NodeId) -> &str {
    &self.nodes[id.0].uid
  }

  pub fn fs_mut(&mut self, id: NodeId) -> Option<&mut FsEntry> {
    self.nodes[id.0].fs_mut()
  }

  /// Detaches the node from the graph. Its id stays valid but it is no
  /// longer rendered.
  pub fn remove(&mut self, id: NodeId) {
    let node = &mut self.nodes[id.0];
    if !node.removed {
      node.removed = true;
      self.index.remove(&(node.category, node.identifier.clone()));
    }
  }

  pub fn is_removed(&self, id: NodeId) -> bool {
    self.nodes[id.0].removed
  }

  /// Live nodes of a category, in insertion order.
  pub fn instances(&self, category: Category) -> Vec<NodeId> {
    self.nodes.iter().enumerate()
      .filter(|(_, n)| n.category == category && !n.removed)
      .map(|(i, _)| NodeId(i))
      .collect()
  }

  pub fn len(&self) -> usize {
    self.nodes.iter().filter(|n| !n.removed).count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn phase_mut(&mut self, id: NodeId) -> Option<&mut Phase> {
    match &mut self.nodes[id.0].kind {
      NodeKind::Phase(p) => Some(p),
      _                  => None
    }
  }

  pub fn target_mut(&mut self, id: NodeId) -> Option<&mut Target> {
    match &mut self.nodes[id.0].kind {
      NodeKind::Target(t) => Some(t),
      _                   => None
    }
  }

  pub fn config_list_mut(&mut self, id: NodeId) -> Option<&mut ConfigurationList> {
    match &mut self.nodes[id.0].kind {
      NodeKind::ConfigurationList(l) => Some(l),
      _                              => None
    }
  }

  pub fn project_mut(&mut self, id: NodeId) -> Option<&mut ProjectMain> {
    match &mut self.nodes[id.0].kind {
      NodeKind::Project(p) => Some(p),
      _                    => None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn group(path: &str) -> NodeKind {
    NodeKind::Group(FsEntry::new(path, path, path, SourceTree::Group))
  }

  #[test]
  fn nodes_are_unique_by_key() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let (a, created_a) = g.insert(Category::PBXGroup, "/src", group("/src"));
    let (b, created_b) = g.insert(Category::PBXGroup, "/src", group("/other"));
    let (c, _)         = g.insert(Category::PBXFileReference, "/src", group("/src"));
    assert!(created_a && !created_b);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(g.uid(a), g.uid(c));
    assert_eq!(g.get(b).fs().unwrap().name, "/src");
    assert_eq!(g.uid(a), ids.stable_id("PBXGroup", "/src"));
  }

  #[test]
  fn removed_nodes_are_not_instances() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let (a, _) = g.insert(Category::PBXGroup, "a", group("a"));
    let (b, _) = g.insert(Category::PBXGroup, "b", group("b"));
    g.remove(a);
    assert_eq!(g.instances(Category::PBXGroup), vec![b]);
    assert!(g.find(Category::PBXGroup, "a").is_none());
    assert_eq!(g.len(), 1);
  }

  #[test]
  fn node_ordering_uses_the_key() {
    let ids = IdGenerator::new();
    let mut g = Graph::new(&ids);
    let (a, _) = g.insert(Category::PBXGroup, "b", group("b"));
    let (b, _) = g.insert(Category::PBXFileReference, "z", group("z"));
    let (c, _) = g.insert(Category::PBXGroup, "a", group("a"));
    let mut nodes = vec![g.get(a), g.get(b), g.get(c)];
    nodes.sort();
    let keys: Vec<&str> = nodes.iter().map(|n| n.identifier.as_str()).collect();
    assert_eq!(keys, vec!["z", "a", "b"]);
  }
}
