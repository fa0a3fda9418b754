//! Renders a [`Graph`] as a project.pbxproj file.
//!
//! Sections follow the fixed category order. Within a section, objects living
//! in the group tree are written in tree order so related files stay together;
//! every other object is written by ascending id, which is how Xcode itself
//! sorts them when saving.

use std::collections::HashSet;

use crate::error::Result;
use crate::gen::xcode::graph::{Category, FileType, FsEntry, Graph, NodeId, NodeKind, PhaseKind};
use crate::gen::xcode::templates::*;
use crate::gen::xcode::tree::{subtree, FileTree};
use crate::resolver::{quote, remove_tagged_lines, Properties, Resolver, Value, REMOVE_LINE_TAG};

/// Exposes a node's fields to the templates.
pub struct NodeRef<'g> {
  graph: &'g Graph<'g>,
  id:    NodeId
}

impl<'g> NodeRef<'g> {
  pub fn new(graph: &'g Graph<'g>, id: NodeId) -> Self {
    NodeRef { graph, id }
  }

  fn object(&self, id: NodeId) -> Option<Value<'g>> {
    Some(Value::object(NodeRef::new(self.graph, id)))
  }
}

fn tag<'a>() -> Option<Value<'a>> {
  Some(Value::from(REMOVE_LINE_TAG))
}

fn quoted(s: &str) -> Option<Value<'_>> {
  Some(Value::from(quote(s, false)))
}

fn quoted_or_tag(s: &str) -> Option<Value<'_>> {
  match s.is_empty() {
    true  => tag(),
    false => quoted(s)
  }
}

fn bool_value<'a>(b: bool) -> Option<Value<'a>> {
  Some(Value::from(match b { true => "1", false => "0" }))
}

/// A shell script as a property list string.
fn script_literal(script: &str) -> String {
  let escaped = script.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
  ["\"", escaped.as_str(), "\""].concat()
}

fn fs_property<'g>(e: &'g FsEntry, name: &str) -> Option<Value<'g>> {
  match name {
    "name"         => Some(Value::from(&e.name)),
    "path"         => quoted_or_tag(&e.path),
    "display_name" => match e.name.is_empty() || e.name == e.path {
      true  => tag(),
      false => quoted(&e.name)
    },
    "source_tree"  => Some(Value::from(e.source_tree.as_str())),
    _              => None
  }
}

fn file_property<'a>(t: &FileType, name: &str) -> Option<Value<'a>> {
  match (name, t.explicit) {
    ("explicit_file_type",   true)  => Some(Value::from(t.name)),
    ("explicit_file_type",   false) => tag(),
    ("last_known_file_type", true)  => tag(),
    ("last_known_file_type", false) => Some(Value::from(t.name)),
    ("include_in_index",     true)  => Some(Value::from("0")),
    ("include_in_index",     false) => tag(),
    _                               => None
  }
}

impl<'g> Properties<'g> for NodeRef<'g> {
  fn property(&self, name: &str) -> Option<Value<'g>> {
    let graph = self.graph;
    let node  = graph.get(self.id);
    match name {
      "uid"        => return Some(Value::from(&node.uid)),
      "identifier" => return Some(Value::from(&node.identifier)),
      "comment"    => return Some(Value::from(node.comment(graph))),
      "isa"        => return Some(Value::from(node.category.isa())),
      _            => {}
    }

    match &node.kind {
      NodeKind::File(e, t) => fs_property(e, name).or_else(|| file_property(t, name)),

      NodeKind::Group(e) => fs_property(e, name),

      NodeKind::ReferenceProxy(e, r) => match name {
        "file_type" => Some(Value::from(r.file_type)),
        "proxy"     => self.object(r.proxy),
        _           => fs_property(e, name)
      },

      NodeKind::BuildFile(b) => match name {
        "file"     => self.object(b.file),
        "phase"    => Some(Value::from(&b.phase)),
        "settings" => Some(Value::from(b.settings.as_deref().unwrap_or(""))),
        _          => None
      },

      NodeKind::Phase(p) => match (name, &p.kind) {
        ("build_action_mask", _) => Some(Value::from("2147483647")),
        ("run_only", _)          => bool_value(p.deployment_only),
        ("name", kind)           => quoted(kind.name()),
        ("dst_path", PhaseKind::CopyFiles { dst_path, .. }) => {
          Some(Value::from(quote(dst_path, true)))
        },
        ("dst_subfolder_spec", PhaseKind::CopyFiles { dst_subfolder_spec, .. }) => {
          Some(Value::from(dst_subfolder_spec.to_string()))
        },
        ("script", PhaseKind::ShellScript { script, .. }) => Some(Value::from(script_literal(script))),
        _ => None
      },

      NodeKind::ContainerProxy(c) => match name {
        "portal"      => self.object(c.portal),
        "proxy_type"  => Some(Value::from(c.proxy_type.to_string())),
        "remote"      => Some(Value::from(&c.remote)),
        "remote_info" => Some(Value::from(quote(&c.remote_info, true))),
        _             => None
      },

      NodeKind::TargetDependency(d) => match (name, d.target) {
        ("name", None)        => quoted(&d.name),
        ("name", Some(_))     => tag(),
        ("target", None)      => tag(),
        ("target", Some(t))   => {
          let target = graph.get(t);
          Some(Value::from([target.uid.as_str(), " /* ", target.comment(graph).as_str(), " */"].concat()))
        },
        ("proxy", _)          => self.object(d.proxy),
        _                     => None
      },

      NodeKind::Target(t) => {
        let legacy = t.legacy.as_ref().and_then(|l| l.as_ref());
        match name {
          "name"              => quoted(&t.name),
          "product"           => self.object(t.product),
          "product_type"      => Some(Value::from(quote(t.product_type, true))),
          "config_list"       => self.object(t.config_list),
          "install_path"      => quoted_or_tag(&t.install_path),
          "buildable_name"    => graph.get(t.product).fs().map(|e| Value::from(&e.name)),
          "test_host"         => match t.test_host {
            Some(h) => Some(Value::from(graph.uid(h))),
            None    => tag()
          },
          "build_tool"        => legacy.map_or_else(tag, |l| quoted(&l.tool)),
          "build_arguments"   => legacy.map_or_else(tag, |l| quoted(&l.arguments)),
          "build_working_dir" => legacy.map_or_else(tag, |l| quoted(&l.working_dir)),
          _                   => None
        }
      },

      NodeKind::Configuration(c) => match name {
        "name"             => quoted(&c.name),
        "product_name"     => quoted(&c.product_name),
        "install_path"     => quoted_or_tag(&c.install_path),
        "intermediate_dir" => quoted_or_tag(&c.intermediate_dir),
        "test_host"        => match c.test_host.is_empty() {
          true  => tag(),
          false => Some(Value::from(quote(&c.test_host, true)))
        },
        "options"          => Some(Value::Map(&c.options)),
        _                  => None
      },

      NodeKind::ConfigurationList(l) => match name {
        "default_name" => match l.configurations.first().map(|&c| &graph.get(c).kind) {
          Some(NodeKind::Configuration(c)) => quoted(&c.name),
          _                                => tag()
        },
        _ => None
      },

      NodeKind::Project(p) => match name {
        "name"               => quoted(&p.name),
        "config_list"        => self.object(p.config_list),
        "main_group"         => self.object(p.main_group),
        "products_group"     => self.object(p.products_group),
        "development_team"   => quoted_or_tag(&p.development_team),
        "provisioning_style" => quoted_or_tag(&p.provisioning_style),
        _                    => None
      }
    }
  }
}

/// Renders a list of child references for one node.
type Fragment = for<'a, 'b> fn(&'a Graph<'b>, NodeId) -> Result<String>;

const CONTAINER_FRAGMENTS: &[(&str, Fragment)] = &[("children", children)];

const TARGET_FRAGMENTS: &[(&str, Fragment)] = &[
  ("phases",       phases),
  ("dependencies", dependencies)
];

const PROJECT_FRAGMENTS: &[(&str, Fragment)] = &[
  ("targets",            targets),
  ("project_references", project_references),
  ("target_attributes",  target_attributes)
];

fn fragments(category: Category) -> &'static [(&'static str, Fragment)] {
  match category {
    Category::PBXGroup                |
    Category::PBXCopyFilesBuildPhase  |
    Category::PBXFrameworksBuildPhase |
    Category::PBXHeadersBuildPhase    |
    Category::PBXResourcesBuildPhase  |
    Category::PBXSourcesBuildPhase    |
    Category::XCConfigurationList     => CONTAINER_FRAGMENTS,
    Category::PBXNativeTarget         |
    Category::PBXLegacyTarget         => TARGET_FRAGMENTS,
    Category::PBXProject              => PROJECT_FRAGMENTS,
    _                                 => &[]
  }
}

fn sub_items(graph: &Graph, ids: &[NodeId]) -> Result<String> {
  let resolver = Resolver::new();
  let mut out  = String::new();
  for &id in ids.iter().filter(|&&id| !graph.is_removed(id)) {
    let _item = resolver.declare("item", Value::object(NodeRef::new(graph, id)));
    out.push_str(&resolver.resolve(SUB_ITEM)?);
  }
  Ok(out)
}

fn children(graph: &Graph, id: NodeId) -> Result<String> {
  match &graph.get(id).kind {
    NodeKind::Group(e)             => sub_items(graph, &e.children),
    NodeKind::Phase(p)             => sub_items(graph, &p.files),
    NodeKind::ConfigurationList(l) => sub_items(graph, &l.configurations),
    _                              => Ok(String::new())
  }
}

fn phases(graph: &Graph, id: NodeId) -> Result<String> {
  match &graph.get(id).kind {
    NodeKind::Target(t) => sub_items(graph, &t.phases),
    _                   => Ok(String::new())
  }
}

fn dependencies(graph: &Graph, id: NodeId) -> Result<String> {
  match &graph.get(id).kind {
    NodeKind::Target(t) => sub_items(graph, &t.dependencies),
    _                   => Ok(String::new())
  }
}

fn targets(graph: &Graph, id: NodeId) -> Result<String> {
  match &graph.get(id).kind {
    NodeKind::Project(p) => sub_items(graph, &p.targets),
    _                    => Ok(String::new())
  }
}

fn project_references(graph: &Graph, id: NodeId) -> Result<String> {
  let project = match &graph.get(id).kind {
    NodeKind::Project(p) => p,
    _                    => return Ok(String::new())
  };

  let resolver = Resolver::new();
  let mut out  = String::new();
  for r in &project.project_references {
    let (group, file) = (r.products_group, r.project_file);
    let _item = resolver.declare("item", Value::object(move |name: &str| match name {
      "products_group" => Some(Value::object(NodeRef::new(graph, group))),
      "project_file"   => Some(Value::object(NodeRef::new(graph, file))),
      _                => None
    }));
    out.push_str(&resolver.resolve(PROJECT_REFERENCE)?);
  }
  Ok(out)
}

fn target_attributes(graph: &Graph, id: NodeId) -> Result<String> {
  let project = match &graph.get(id).kind {
    NodeKind::Project(p) => p,
    _                    => return Ok(String::new())
  };

  let template = match project.icloud {
    true  => [TARGET_ATTRIBUTES_BEGIN, TARGET_ATTRIBUTES_ICLOUD, TARGET_ATTRIBUTES_END].concat(),
    false => [TARGET_ATTRIBUTES_BEGIN, TARGET_ATTRIBUTES_END].concat()
  };

  let resolver = Resolver::new();
  let _project = resolver.declare("project", Value::object(NodeRef::new(graph, id)));
  let mut out  = String::new();
  for &target in project.targets.iter().filter(|&&t| !graph.is_removed(t)) {
    let _item = resolver.declare("item", Value::object(NodeRef::new(graph, target)));
    out.push_str(&resolver.resolve(&template)?);
  }
  Ok(out)
}

/// Categories sharing an `isa` are written as a single section.
fn sections() -> Vec<(&'static str, Vec<Category>)> {
  let mut sections: Vec<(&'static str, Vec<Category>)> = Vec::new();
  for &c in Category::ALL.iter() {
    match sections.last_mut() {
      Some((isa, categories)) if *isa == c.isa() => categories.push(c),
      _                                          => sections.push((c.isa(), vec![c]))
    }
  }
  sections
}

fn is_tree_category(c: Category) -> bool {
  match c {
    Category::PBXFileReference | Category::PBXGroup | Category::PBXReferenceProxy => true,
    _                                                                           => false
  }
}

fn ordered(graph: &Graph, structural: &[NodeId], categories: &[Category]) -> Vec<NodeId> {
  let mut instances: Vec<NodeId> = categories.iter().flat_map(|&c| graph.instances(c)).collect();
  instances.sort_by(|&a, &b| graph.uid(a).cmp(graph.uid(b)));

  if !categories.iter().any(|&c| is_tree_category(c)) {
    return instances;
  }

  let mut visited = HashSet::new();
  let mut order   = Vec::new();
  let mut visit   = |n: NodeId| {
    if categories.contains(&graph.get(n).category) && visited.insert(n) {
      order.push(n);
    }
  };

  for &n in structural {
    visit(n);
  }

  // Objects detached from the main group, such as the products of referenced projects.
  for n in instances {
    for m in subtree(graph, n) {
      visit(m);
    }
  }

  order
}

fn render_object(graph: &Graph, id: NodeId) -> Result<String> {
  let category  = graph.get(id).category;
  let fragments = fragments(category).iter()
    .map(|&(name, render)| render(graph, id).map(|text| (name, text)))
    .collect::<Result<Vec<_>>>()?;

  let resolver = Resolver::new();
  let _item    = resolver.declare("item", Value::object(NodeRef::new(graph, id)));
  let mut scopes = Vec::with_capacity(fragments.len());
  for (name, text) in fragments {
    scopes.push(resolver.declare(name, text));
  }

  let text = resolver.resolve(object_template(category));
  while let Some(scope) = scopes.pop() {
    drop(scope);
  }
  text
}

/// Prunes empty groups, then renders the whole file.
pub fn render(graph: &mut Graph, tree: &mut FileTree, root: NodeId) -> Result<String> {
  tree.prune_empty(graph);
  let graph: &Graph = graph;
  let structural    = tree.walk(graph);

  let resolver = Resolver::new();
  let mut out  = {
    let _version = resolver.declare("object_version", OBJECT_VERSION);
    resolver.resolve(HEADER)?
  };

  for (isa, categories) in sections() {
    let nodes = ordered(graph, &structural, &categories);
    if nodes.is_empty() {
      continue;
    }

    let _section = resolver.declare("section", isa);
    out.push_str(&resolver.resolve(SECTION_BEGIN)?);
    for id in nodes {
      out.push_str(&render_object(graph, id)?);
    }
    out.push_str(&resolver.resolve(SECTION_END)?);
  }

  let _root = resolver.declare("root", Value::object(NodeRef::new(graph, root)));
  out.push_str(&resolver.resolve(FOOTER)?);
  Ok(remove_tagged_lines(&out))
}
