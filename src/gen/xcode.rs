//! Project generator for Xcode.
//!
//! Xcode uses the NeXTSTEP property list format. The entire project is stored
//! in a single file named "project.pbxproj", short for Project Builder Xcode
//! Project. This file lives in a folder named after the project with the
//! "xcodeproj" extension.
//!
//! This property list format provides the following data types:
//! - Number:     42
//! - String:     "contents"
//! - Array:      ( element, ... )
//! - Dictionary: { key = value; ... }
//!
//! Comments have the form /* contents */. Xcode doesn't need them but writes
//! them anyway; generating them too keeps diffs small when a generated project
//! is later saved from Xcode.
//!
//! The project.pbxproj file contains a single root element holding a dictionary
//! of every object describing the project. Every object is identified by a
//! 96-bit hexadecimal string and has an "isa" property determining its type.
//! Objects are grouped by type, with comments as delimiters between sections:
//!
//! ```text
//! /* Begin <SECTION-NAME> section */
//! <OBJECT-ID> /* <OBJECT-NAME> */ = <OBJECT-PROPERTIES-DICTIONARY>;
//! ...
//! /* End <SECTION-NAME> section */
//! ```
//!
//! Object ids are derived from the object's category and a stable identifier
//! (see `uid`), which lets a project compute the ids of objects living in
//! another project it depends on without reading it.
//!
//! The types written here:
//! - PBXProject                    The root object describing the project.
//! - PBXLegacyTarget               A target produced using an external build tool.
//! - PBXNativeTarget               A target producing a native application or library.
//! - PBXTargetDependency           A target to PBXContainerItemProxy dependency.
//! - PBXContainerItemProxy         A reference to an object of this or another project.
//! - PBXReferenceProxy             A product of another project.
//! - PBXBuildFile                  A file reference used in a build phase.
//! - PBXFileReference              An external file referenced by the project.
//! - PBXGroup                      Container for file references and groups.
//! - PBX*BuildPhase                Describes a step in the build process.
//! - XCBuildConfiguration          Compiler, linker and target settings.
//! - XCConfigurationList           A list of XCBuildConfiguration objects.
//!
//! References:
//! - https://en.wikipedia.org/wiki/Property_list
//! - http://monoobjc.net/xcode-project-file-format.html

pub mod graph;
pub mod templates;
pub mod tree;
pub mod writer;

use std::path::PathBuf;
use tracing::{debug, warn};

use crate::ctx::{relative_to, Configuration, Context, CopyDestination, CopyStep, GenerationReport,
                 Generator, OutputType, PlatformType, Project, ResolvedOptions, Solution};
use crate::error::{Error, Result};
use crate::gen::workspace;
use crate::output;
use crate::platform;
use crate::resolver::{remove_tagged_lines, xml_escape, Resolver, Value};

use graph::{BuildConfiguration, BuildFile, Category, ConfigurationList, ContainerProxy, FileType,
            FsEntry, Graph, LegacyBuild, NodeId, NodeKind, Phase, PhaseKind, ProjectMain,
            ProjectReference, ReferenceProxy, SourceTree, Target, TargetDependency};
use templates::{SCHEME, SCHEME_BUILDABLE_REFERENCE, SCHEME_TESTABLE};
use tree::{file_type, is_header_file, is_source_file, normalize, FileTree};

const FASTBUILD_TOOL: &str = "FBuild";

const EMBED_FRAMEWORK_SETTINGS: &str = "settings = {ATTRIBUTES = (CodeSignOnCopy, RemoveHeadersOnCopy, ); }; ";

pub struct XCode;

impl Generator for XCode {
  fn supports_platform(&self, p: PlatformType) -> bool {
    p.is_apple()
  }

  fn generate_project(&self, ctx: &Context, project: &Project, report: &mut GenerationReport) -> Result<()> {
    let confs = project.configurations_for(|c| self.supports_platform(c.platform));
    if confs.is_empty() {
      return Ok(());
    }

    let mut x = XcodeContext::new(ctx, project);
    x.prepare(&confs)?;

    let dir = project.xcodeproj_path();
    output::emit(report, &dir.join("project.pbxproj"), &x.render()?)?;

    if let Some(scheme) = x.scheme()? {
      let path = dir.join("xcshareddata").join("xcschemes")
        .join([project.name.as_str(), ".xcscheme"].concat());
      output::emit(report, &path, &scheme)?;
    }

    debug!(project = %project.name, objects = x.graph.len(), "xcode project");
    Ok(())
  }

  fn generate_solution(&self, ctx: &Context, solution: &Solution, report: &mut GenerationReport) -> Result<()> {
    workspace::generate_xcworkspace(ctx, solution, report)
  }
}

/// A target being built, with its configurations in declaration order. The
/// first configuration is the target's default.
struct TargetInfo<'a> {
  name:        String,
  identifier:  String,
  id:          NodeId,
  product:     NodeId,
  output:      OutputType,
  frameworks:  Option<NodeId>,
  confs:       Vec<&'a Configuration>,
  conf_nodes:  Vec<NodeId>,
  options:     Vec<ResolvedOptions>
}

/// Everything needed while generating the files of a single project.
struct XcodeContext<'a> {
  ctx:        &'a Context<'a>,
  project:    &'a Project,
  graph:      Graph<'a>,
  tree:       FileTree,
  root:       NodeId,
  products:   NodeId,
  frameworks: NodeId,
  projects:   NodeId,
  targets:    Vec<TargetInfo<'a>>
}

fn product_file_name(target: &str, output: OutputType) -> Option<String> {
  match output {
    OutputType::Exe        => Some(target.to_string()),
    OutputType::App        => Some([target, ".app"].concat()),
    OutputType::Lib        => Some(["lib", target, ".a"].concat()),
    OutputType::Dll        => Some(["lib", target, ".dylib"].concat()),
    OutputType::Bundle     => Some([target, ".bundle"].concat()),
    OutputType::TestBundle => Some([target, ".xctest"].concat()),
    OutputType::Framework  => Some([target, ".framework"].concat()),
    OutputType::None       => None
  }
}

fn product_type(output: OutputType) -> &'static str {
  match output {
    OutputType::Exe        => "com.apple.product-type.tool",
    OutputType::App        => "com.apple.product-type.application",
    OutputType::Lib        => "com.apple.product-type.library.static",
    OutputType::Dll        => "com.apple.product-type.library.dynamic",
    OutputType::Bundle     => "com.apple.product-type.bundle",
    OutputType::TestBundle => "com.apple.product-type.bundle.unit-test",
    OutputType::Framework  => "com.apple.product-type.framework",
    OutputType::None       => ""
  }
}

fn install_path(output: OutputType) -> &'static str {
  match output {
    OutputType::Exe                         => "/usr/local/bin",
    OutputType::App                         => "$(HOME)/Applications",
    OutputType::Dll | OutputType::Framework => "@rpath",
    _                                       => ""
  }
}

fn is_linkable(output: OutputType) -> bool {
  match output {
    OutputType::Lib | OutputType::Dll | OutputType::Framework => true,
    _                                                         => false
  }
}

fn is_bundled(output: OutputType) -> bool {
  match output {
    OutputType::App | OutputType::Bundle | OutputType::TestBundle | OutputType::Framework => true,
    _                                                                                     => false
  }
}

fn test_host_path(app: &str, platform: PlatformType) -> String {
  match platform {
    PlatformType::MacOS => format!("$(BUILT_PRODUCTS_DIR)/{0}.app/Contents/MacOS/{0}", app),
    _                   => format!("$(BUILT_PRODUCTS_DIR)/{0}.app/{0}", app)
  }
}

/// Groups configurations by target, keeping declaration order.
fn group_by_target<'a>(confs: &[&'a Configuration]) -> Vec<(String, Vec<&'a Configuration>)> {
  let mut groups: Vec<(String, Vec<&'a Configuration>)> = Vec::new();
  for &conf in confs {
    match groups.iter_mut().find(|(t, _)| *t == conf.target) {
      Some((_, list)) => list.push(conf),
      None            => groups.push((conf.target.clone(), vec![conf]))
    }
  }
  groups
}

impl<'a> XcodeContext<'a> {
  fn new(ctx: &'a Context<'a>, project: &'a Project) -> Self {
    let mut graph = Graph::new(ctx.ids);
    let mut tree  = FileTree::new(&mut graph, &project.name);

    tree.add_root(&mut graph, &project.source_root.to_string_lossy(), &project.name, SourceTree::Absolute);
    let frameworks = tree.add_group(&mut graph, "Frameworks");
    let projects   = tree.add_group(&mut graph, "Projects");
    let products   = tree.add_group(&mut graph, "Products");

    let (config_list, _) = graph.insert(Category::XCConfigurationList, project.name.as_str(),
                                        NodeKind::ConfigurationList(ConfigurationList {
                                          owner_isa:      "PBXProject",
                                          owner_name:     project.name.clone(),
                                          configurations: Vec::new()
                                        }));

    let (root, _) = graph.insert(Category::PBXProject, project.name.as_str(),
                                 NodeKind::Project(ProjectMain {
                                   name:               project.name.clone(),
                                   config_list,
                                   main_group:         tree.main_group,
                                   products_group:     products,
                                   targets:            Vec::new(),
                                   project_references: Vec::new(),
                                   development_team:   String::new(),
                                   provisioning_style: String::new(),
                                   icloud:             false
                                 }));

    XcodeContext {
      ctx,
      project,
      graph,
      tree,
      root,
      products,
      frameworks,
      projects,
      targets: Vec::new()
    }
  }

  fn prepare(&mut self, confs: &[&'a Configuration]) -> Result<()> {
    let files     = self.add_files(confs);
    let resources = self.add_resources();

    for (name, target_confs) in group_by_target(confs) {
      self.add_target(name, target_confs, &files, &resources)?;
    }

    for i in 0..self.targets.len() {
      self.add_dependencies(i)?;
    }
    self.add_test_hosts();

    // Files nothing builds.
    for (node, path) in &files {
      if confs.iter().all(|c| c.is_excluded(path)) {
        self.tree.remove(&mut self.graph, *node);
      }
    }

    self.add_project_configurations(confs)
  }

  fn add_files(&mut self, confs: &[&Configuration]) -> Vec<(NodeId, PathBuf)> {
    let mut files = Vec::with_capacity(self.project.files.len());
    for path in &self.project.files {
      let name     = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
      let excluded = confs.iter().all(|c| c.is_excluded(path));
      let (node, _) = self.tree.insert(&mut self.graph, &path.to_string_lossy(), !excluded,
                                       is_source_file(&name));
      files.push((node, path.clone()));
    }
    files
  }

  fn add_resources(&mut self) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    for path in &self.project.resources {
      let (node, _) = self.tree.insert(&mut self.graph, &path.to_string_lossy(), true, false);
      nodes.push(node);
    }
    for path in &self.project.resource_folders {
      let (node, _) = self.tree.insert(&mut self.graph, &path.to_string_lossy(), true, false);
      if let NodeKind::File(_, t) = &mut self.graph.get_mut(node).kind {
        *t = FileType { name: "folder", explicit: false };
      }
      nodes.push(node);
    }
    nodes
  }

  fn add_phase(&mut self, target: &str, key: &str, kind: PhaseKind) -> NodeId {
    let category = kind.category();
    let (id, _)  = self.graph.insert(category, [target, "/", key].concat(),
                                     NodeKind::Phase(Phase { kind, files: Vec::new(), deployment_only: false }));
    id
  }

  fn add_build_file(&mut self, phase: NodeId, file: NodeId, settings: Option<&str>) {
    let phase_node = self.graph.get(phase);
    let phase_name = match &phase_node.kind {
      NodeKind::Phase(p) => p.kind.name().to_string(),
      _                  => return
    };
    let identifier = [phase_node.identifier.as_str(), "/", self.graph.get(file).identifier.as_str()].concat();

    let (id, created) = self.graph.insert(Category::PBXBuildFile, identifier, NodeKind::BuildFile(BuildFile {
      file,
      phase:    phase_name,
      settings: settings.map(String::from)
    }));
    if created {
      if let Some(p) = self.graph.phase_mut(phase) {
        p.files.push(id);
      }
    }
  }

  fn add_script_phase(&mut self, target: &str, stage: &str, index: usize,
                      step: &crate::ctx::BuildStep) -> NodeId
  {
    let key = format!("{}/{}/{}", stage, index, step.name);
    self.add_phase(target, &key, PhaseKind::ShellScript {
      name:   step.name.clone(),
      script: step.script.clone()
    })
  }

  fn add_copy_phase(&mut self, target: &str, step: &CopyStep) -> NodeId {
    let phase = self.add_phase(target, &["copy/", step.name.as_str()].concat(), PhaseKind::CopyFiles {
      name:               step.name.clone(),
      dst_path:           step.path.clone(),
      dst_subfolder_spec: step.destination.folder_spec()
    });

    let settings = match step.destination {
      CopyDestination::Frameworks => Some(EMBED_FRAMEWORK_SETTINGS),
      _                           => None
    };
    for file in &step.files {
      let full = self.project.source_root.join(file);
      let (node, _) = self.tree.insert(&mut self.graph, &full.to_string_lossy(), true, false);
      self.add_build_file(phase, node, settings);
    }
    phase
  }

  fn add_framework(&mut self, phase: NodeId, identifier: &str, path: &str, source_tree: SourceTree) {
    let name  = path.rsplit('/').next().unwrap_or(path).to_string();
    let entry = FsEntry::new(identifier, name.as_str(), path, source_tree);
    let (id, _) = self.graph.insert(Category::PBXFileReference, identifier,
                                    NodeKind::File(entry, file_type(&name)));
    self.tree.attach(&mut self.graph, self.frameworks, id, None);
    self.add_build_file(phase, id, None);
  }

  fn add_frameworks(&mut self, phase: NodeId, conf: &Configuration) {
    let with_ext = |f: &String| match f.ends_with(".framework") {
      true  => f.clone(),
      false => [f.as_str(), ".framework"].concat()
    };

    for f in &conf.xcode.system_frameworks {
      let path = ["System/Library/Frameworks/", with_ext(f).as_str()].concat();
      self.add_framework(phase, &["<sdk>/", path.as_str()].concat(), &path, SourceTree::Sdk);
    }
    for f in &conf.xcode.developer_frameworks {
      let path = ["Library/Frameworks/", with_ext(f).as_str()].concat();
      self.add_framework(phase, &["<developer>/", path.as_str()].concat(), &path, SourceTree::DeveloperDir);
    }
    if conf.output == OutputType::TestBundle && !conf.xcode.developer_frameworks.iter().any(|f| f.starts_with("XCTest")) {
      let path = "Library/Frameworks/XCTest.framework";
      self.add_framework(phase, &["<developer>/", path].concat(), path, SourceTree::DeveloperDir);
    }
    for f in &conf.xcode.user_frameworks {
      let full = normalize(&self.project.source_root.join(f).to_string_lossy());
      self.add_framework(phase, &full, &full, SourceTree::Absolute);
    }
  }

  /// The external build of a target, through the master bff including it.
  fn legacy_build(&self, confs: &[&Configuration]) -> Result<Option<LegacyBuild>> {
    let mut master: Option<&PathBuf> = None;
    for conf in confs {
      let key = conf.key(&self.project.name);
      match self.ctx.masters.get(&key).map(Vec::as_slice) {
        None | Some([]) => {
          warn!(configuration = %key, "not included by any master bff, its Xcode target won't build");
        },
        Some([m])      => {
          master.get_or_insert(m);
        },
        Some(all)      => {
          return Err(Error::unsupported(&self.project.name, conf.name.as_str(),
                                        format!("included by {} master bff files", all.len())));
        }
      }
    }

    let output_dir = &self.project.output_dir;
    Ok(master.map(|m| LegacyBuild {
      tool:        FASTBUILD_TOOL.to_string(),
      arguments:   format!("-config {} $(FASTBUILD_TARGET)", relative_to(m, output_dir)),
      working_dir: normalize(&output_dir.to_string_lossy())
    }))
  }

  fn add_target(&mut self, name: String, confs: Vec<&'a Configuration>, files: &[(NodeId, PathBuf)],
                resources: &[NodeId]) -> Result<()>
  {
    let default    = confs[0];
    let output     = default.output;
    let legacy     = default.fastbuild;
    let identifier = [self.project.name.as_str(), "/", name.as_str()].concat();

    let product_name = match (product_file_name(&name, output), legacy) {
      (Some(p), _)    => p,
      (None, true)    => name.clone(),
      (None, false)   => {
        return Err(Error::unsupported(&self.project.name, default.name.as_str(),
                                      format!("target '{}' has no output, Xcode can't build it", name)));
      }
    };

    let mut options = Vec::with_capacity(confs.len());
    for conf in &confs {
      let platform = self.ctx.platform(conf.platform);
      if !platform.supports_architecture(conf.architecture) {
        return Err(Error::unsupported(&self.project.name, conf.name.as_str(),
                                      format!("{} doesn't support {:?}", conf.platform.to_str(), conf.architecture)));
      }
      options.push(platform::resolve(platform, self.project, conf)?);
    }

    // Product
    let product_key = [identifier.as_str(), "/", product_name.as_str()].concat();
    let entry       = FsEntry::new(&product_key, product_name.as_str(), product_name.as_str(),
                                   SourceTree::BuiltProducts);
    let kind        = NodeKind::File(entry, FileType { explicit: true, ..file_type(&product_name) });
    let (product, _) = self.graph.insert(Category::PBXFileReference, product_key.as_str(), kind);
    self.tree.attach(&mut self.graph, self.products, product, None);

    // Configurations
    let (target_category, owner_isa, conf_category) = match (legacy, output) {
      (true, _)                     => (Category::PBXLegacyTarget, "PBXLegacyTarget",
                                        Category::XCBuildConfigurationLegacyTarget),
      (false, OutputType::TestBundle) => (Category::PBXNativeTarget, "PBXNativeTarget",
                                        Category::XCBuildConfigurationUnitTestTarget),
      (false, _)                    => (Category::PBXNativeTarget, "PBXNativeTarget",
                                        Category::XCBuildConfigurationNativeTarget)
    };

    let mut conf_nodes = Vec::with_capacity(confs.len());
    for (conf, resolved) in confs.iter().zip(&options) {
      let key = [identifier.as_str(), "/", conf.name.as_str(), "/", conf.platform.to_str()].concat();
      let (c, _) = self.graph.insert(conf_category, key, NodeKind::Configuration(BuildConfiguration {
        name:             conf.name.clone(),
        product_name:     conf.target.clone(),
        install_path:     install_path(output).to_string(),
        intermediate_dir: relative_to(&conf.intermediate_dir, &self.project.output_dir),
        test_host:        String::new(),
        options:          resolved.options.clone()
      }));
      conf_nodes.push(c);
    }

    let (config_list, _) = self.graph.insert(Category::XCConfigurationList, identifier.as_str(),
                                             NodeKind::ConfigurationList(ConfigurationList {
                                               owner_isa,
                                               owner_name:     name.clone(),
                                               configurations: conf_nodes.clone()
                                             }));

    // Phases
    let mut phases     = Vec::new();
    let mut frameworks = None;
    let legacy_build   = match legacy {
      true  => Some(self.legacy_build(&confs)?),
      false => None
    };

    if !legacy {
      for (i, step) in default.pre_build.iter().enumerate() {
        phases.push(self.add_script_phase(&identifier, "pre", i, step));
      }

      let headers  = self.add_phase(&identifier, "Headers",    PhaseKind::Headers);
      let bundled  = self.add_phase(&identifier, "Resources",  PhaseKind::Resources);
      let sources  = self.add_phase(&identifier, "Sources",    PhaseKind::Sources);
      let fw_phase = self.add_phase(&identifier, "Frameworks", PhaseKind::Frameworks);
      phases.extend_from_slice(&[headers, bundled, sources, fw_phase]);
      frameworks = Some(fw_phase);

      for (node, path) in files {
        if confs.iter().all(|c| c.is_excluded(path)) {
          continue;
        }
        let name = self.graph.get(*node).fs().map(|e| e.name.clone()).unwrap_or_default();
        if is_source_file(&name) {
          self.add_build_file(sources, *node, None);
        }
        else if is_header_file(&name) {
          self.add_build_file(headers, *node, None);
        }
      }

      if is_bundled(output) {
        for &node in resources {
          self.add_build_file(bundled, node, None);
        }
      }

      self.add_frameworks(fw_phase, default);

      for step in &default.copy_files {
        phases.push(self.add_copy_phase(&identifier, step));
      }
      for (i, step) in default.post_build.iter().enumerate() {
        phases.push(self.add_script_phase(&identifier, "post", i, step));
      }
    }

    let (id, _) = self.graph.insert(target_category, identifier.as_str(), NodeKind::Target(Target {
      name:         name.clone(),
      product_type: product_type(output),
      product,
      config_list,
      install_path: install_path(output).to_string(),
      phases,
      dependencies: Vec::new(),
      test_host:    None,
      legacy:       legacy_build
    }));
    if let Some(p) = self.graph.project_mut(self.root) {
      p.targets.push(id);
    }

    self.targets.push(TargetInfo {
      name,
      identifier,
      id,
      product,
      output,
      frameworks,
      confs,
      conf_nodes,
      options
    });
    Ok(())
  }

  fn push_dependency(&mut self, target: NodeId, dependency: NodeId) {
    if let Some(t) = self.graph.target_mut(target) {
      if !t.dependencies.contains(&dependency) {
        t.dependencies.push(dependency);
      }
    }
  }

  /// A dependency on another target of this project.
  fn add_local_dependency(&mut self, index: usize, other: usize) {
    let (t, o) = (&self.targets[index], &self.targets[other]);
    let (target, identifier, output, frameworks) = (t.id, t.identifier.clone(), t.output, t.frameworks);
    let (other_id, other_name, other_output, other_product) = (o.id, o.name.clone(), o.output, o.product);

    let remote     = self.graph.uid(other_id).to_string();
    let (proxy, _) = self.graph.insert(Category::PBXContainerItemProxy,
                                       [identifier.as_str(), "/", other_name.as_str()].concat(),
                                       NodeKind::ContainerProxy(ContainerProxy {
                                         portal:      self.root,
                                         proxy_type:  1,
                                         remote,
                                         remote_info: other_name.clone()
                                       }));
    let (dep, _) = self.graph.insert(Category::PBXTargetDependency,
                                     [identifier.as_str(), "/", other_name.as_str()].concat(),
                                     NodeKind::TargetDependency(TargetDependency {
                                       name:   other_name,
                                       target: Some(other_id),
                                       proxy
                                     }));
    self.push_dependency(target, dep);

    if let Some(phase) = frameworks {
      if output.is_linked() && is_linkable(other_output) {
        self.add_build_file(phase, other_product, None);
      }
    }
  }

  /// A dependency on a target of another project, referenced through its
  /// project file. The other project's object ids are derived the same way as
  /// ours, so they are computed here rather than read back.
  fn add_remote_dependency(&mut self, index: usize, other: &'a Project, remote: &'a Configuration) {
    let t = &self.targets[index];
    let (target, identifier, output, frameworks) = (t.id, t.identifier.clone(), t.output, t.frameworks);

    // Project file, in the "Projects" group.
    let xcodeproj = other.xcodeproj_path();
    let file_key  = normalize(&xcodeproj.to_string_lossy());
    let file_name = [other.name.as_str(), ".xcodeproj"].concat();
    let entry     = FsEntry::new(&file_key, file_name.as_str(),
                                 relative_to(&xcodeproj, &self.project.output_dir), SourceTree::Group);
    let (project_file, _) = self.graph.insert(Category::PBXFileReference, file_key.as_str(),
                                              NodeKind::File(entry, file_type(&file_name)));
    self.tree.attach(&mut self.graph, self.projects, project_file, None);

    // Target
    let remote_key      = [other.name.as_str(), "/", remote.target.as_str()].concat();
    let remote_category = match remote.fastbuild {
      true  => Category::PBXLegacyTarget,
      false => Category::PBXNativeTarget
    };
    let remote_id  = self.graph.stable_id(remote_category, &remote_key);
    let (proxy, _) = self.graph.insert(Category::PBXContainerItemProxy,
                                       [identifier.as_str(), "/", remote_key.as_str()].concat(),
                                       NodeKind::ContainerProxy(ContainerProxy {
                                         portal:      project_file,
                                         proxy_type:  1,
                                         remote:      remote_id,
                                         remote_info: remote.target.clone()
                                       }));
    let (dep, _) = self.graph.insert(Category::PBXTargetDependency,
                                     [identifier.as_str(), "/", remote_key.as_str()].concat(),
                                     NodeKind::TargetDependency(TargetDependency {
                                       name:   remote.target.clone(),
                                       target: None,
                                       proxy
                                     }));
    self.push_dependency(target, dep);

    // Product, in a "Products" group of the project reference.
    let product_name = match product_file_name(&remote.target, remote.output) {
      Some(p) => p,
      None    => return
    };
    let product_key = [remote_key.as_str(), "/", product_name.as_str()].concat();
    let product_id  = self.graph.stable_id(Category::PBXFileReference, &product_key);
    let (product_proxy, _) = self.graph.insert(Category::PBXContainerItemProxy,
                                               [product_key.as_str(), "/product"].concat(),
                                               NodeKind::ContainerProxy(ContainerProxy {
                                                 portal:      project_file,
                                                 proxy_type:  2,
                                                 remote:      product_id,
                                                 remote_info: remote.target.clone()
                                               }));

    let entry = FsEntry::new(&product_key, product_name.as_str(), product_name.as_str(),
                             SourceTree::BuiltProducts);
    let (reference, _) = self.graph.insert(Category::PBXReferenceProxy, product_key.as_str(),
                                           NodeKind::ReferenceProxy(entry, ReferenceProxy {
                                             file_type: file_type(&product_name).name,
                                             proxy:     product_proxy
                                           }));

    let group_key = ["<products>/", file_key.as_str()].concat();
    let entry     = FsEntry::new(&group_key, "Products", "", SourceTree::Group);
    let (group, created) = self.graph.insert(Category::PBXGroup, group_key.as_str(), NodeKind::Group(entry));
    self.tree.attach(&mut self.graph, group, reference, None);
    if created {
      if let Some(p) = self.graph.project_mut(self.root) {
        p.project_references.push(ProjectReference { products_group: group, project_file });
      }
    }

    if let Some(phase) = frameworks {
      if output.is_linked() && is_linkable(remote.output) {
        self.add_build_file(phase, reference, None);
      }
    }
  }

  fn add_dependencies(&mut self, index: usize) -> Result<()> {
    let t    = &self.targets[index];
    let deps = t.confs[0].dependencies.clone();
    let name = t.name.clone();

    let this = self.project;
    for dep in deps {
      let project = dep.project.as_deref().unwrap_or(this.name.as_str());
      if project == this.name {
        match self.targets.iter().position(|t| t.name == dep.target) {
          Some(other) if other != index => self.add_local_dependency(index, other),
          Some(_)                       => {},
          None                          => {
            warn!(project = %self.project.name, target = %name, dependency = %dep.target,
                  "dependency on an unknown target, skipped");
          }
        }
        continue;
      }

      let other = match self.ctx.find_project(project) {
        Some(p) => p,
        None    => {
          warn!(project = %self.project.name, target = %name, dependency = %project,
                "dependency on an unknown project, skipped");
          continue;
        }
      };
      let remote = other.configurations.iter()
        .find(|c| c.target == dep.target && c.platform.is_apple());
      match remote {
        Some(remote) => self.add_remote_dependency(index, other, remote),
        None         => {
          warn!(project = %self.project.name, target = %name, dependency = %dep.target,
                "dependency has no Xcode target, skipped");
        }
      }
    }
    Ok(())
  }

  /// Unit test bundles are hosted by the project's application.
  fn add_test_hosts(&mut self) {
    let app = match self.targets.iter().find(|t| t.output == OutputType::App) {
      Some(t) => (t.id, t.name.clone()),
      None    => return
    };

    let tests: Vec<usize> = (0..self.targets.len())
      .filter(|&i| self.targets[i].output == OutputType::TestBundle)
      .collect();

    for i in tests {
      let (target, identifier) = (self.targets[i].id, self.targets[i].identifier.clone());
      let remote     = self.graph.uid(app.0).to_string();
      let (proxy, _) = self.graph.insert(Category::PBXContainerItemProxy, [identifier.as_str(), "/host"].concat(),
                                         NodeKind::ContainerProxy(ContainerProxy {
                                           portal:      self.root,
                                           proxy_type:  1,
                                           remote,
                                           remote_info: app.1.clone()
                                         }));
      let (dep, _) = self.graph.insert(Category::PBXTargetDependency, [identifier.as_str(), "/host"].concat(),
                                       NodeKind::TargetDependency(TargetDependency {
                                         name:   app.1.clone(),
                                         target: Some(app.0),
                                         proxy
                                       }));
      self.push_dependency(target, dep);
      if let Some(t) = self.graph.target_mut(target) {
        t.test_host = Some(app.0);
      }

      let hosts: Vec<(NodeId, String)> = self.targets[i].conf_nodes.iter()
        .zip(&self.targets[i].confs)
        .map(|(&n, c)| (n, test_host_path(&app.1, c.platform)))
        .collect();
      for (node, host) in hosts {
        if let NodeKind::Configuration(c) = &mut self.graph.get_mut(node).kind {
          c.test_host = host;
        }
      }
    }
  }

  /// One project level configuration per optimization name.
  fn add_project_configurations(&mut self, confs: &[&Configuration]) -> Result<()> {
    let mut nodes = Vec::new();
    let mut seen  = Vec::new();
    for conf in confs {
      if seen.contains(&conf.name) {
        continue;
      }
      seen.push(conf.name.clone());

      let options = platform::resolve(self.ctx.platform(conf.platform), self.project, conf)?;
      let key     = [self.project.name.as_str(), "/", conf.name.as_str()].concat();
      let (c, _)  = self.graph.insert(Category::XCBuildConfigurationProject, key,
                                      NodeKind::Configuration(BuildConfiguration {
                                        name:             conf.name.clone(),
                                        product_name:     self.project.name.clone(),
                                        install_path:     String::new(),
                                        intermediate_dir: String::new(),
                                        test_host:        String::new(),
                                        options:          options.options
                                      }));
      nodes.push(c);
    }

    let config_list = match &self.graph.get(self.root).kind {
      NodeKind::Project(p) => p.config_list,
      _                    => return Ok(())
    };
    if let Some(l) = self.graph.config_list_mut(config_list) {
      l.configurations = nodes;
    }

    let first = &confs[0].xcode;
    if let Some(p) = self.graph.project_mut(self.root) {
      p.development_team   = first.development_team.clone().unwrap_or_default();
      p.provisioning_style = first.provisioning_style.clone().unwrap_or_default();
      p.icloud             = first.icloud == Some(true);
    }
    Ok(())
  }

  fn render(&mut self) -> Result<String> {
    writer::render(&mut self.graph, &mut self.tree, self.root)
  }

  fn buildable_reference(&self, resolver: &Resolver, target: &TargetInfo, indent: &str) -> Result<String> {
    let uid     = self.graph.uid(target.id).to_string();
    let product = self.graph.get(target.product).fs().map(|e| xml_escape(&e.name)).unwrap_or_default();
    let name    = xml_escape(&target.name);

    let _indent = resolver.declare("indent", indent.to_string());
    let _target = resolver.declare("target", Value::object(move |p: &str| match p {
      "uid"            => Some(Value::from(uid.clone())),
      "buildable_name" => Some(Value::from(product.clone())),
      "name"           => Some(Value::from(name.clone())),
      _                => None
    }));
    resolver.resolve(SCHEME_BUILDABLE_REFERENCE)
  }

  /// The shared scheme, built around the first target which isn't a test.
  fn scheme(&self) -> Result<Option<String>> {
    let default = match self.targets.iter().find(|t| t.output != OutputType::TestBundle) {
      Some(t) => t,
      None    => return Ok(None)
    };

    let resolver = Resolver::new();
    let _file    = resolver.declare("project_file", xml_escape(&[self.project.name.as_str(), ".xcodeproj"].concat()));

    let mut testables = String::new();
    for t in self.targets.iter().filter(|t| t.output == OutputType::TestBundle) {
      let reference  = self.buildable_reference(&resolver, t, "            ")?;
      let _reference = resolver.declare("reference", reference);
      testables.push_str(&resolver.resolve(SCHEME_TESTABLE)?);
    }

    let entry    = self.buildable_reference(&resolver, default, "            ")?;
    let runnable = self.buildable_reference(&resolver, default, "         ")?;
    let macro_   = self.buildable_reference(&resolver, default, "         ")?;

    let _entry     = resolver.declare("entry_reference", entry);
    let _testables = resolver.declare("testables", testables);
    let _macro     = resolver.declare("macro_reference", macro_);
    let _runnable  = resolver.declare("runnable_reference", runnable);
    let _conf      = resolver.declare("optimization", xml_escape(&default.confs[0].name));
    let _options   = resolver.declare("options", &default.options[0].options);

    Ok(Some(remove_tagged_lines(&resolver.resolve(SCHEME)?)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{Dependency, MasterBffIndex, Platforms, Settings};
  use crate::uid::IdGenerator;
  use std::path::Path;

  fn conf(name: &str, target: &str, output: OutputType) -> Configuration {
    let mut c = Configuration::new(name, target, PlatformType::MacOS, output);
    c.settings = match name {
      "Debug" => Settings::debug(),
      _       => Settings::release()
    };
    c
  }

  fn project(name: &str) -> Project {
    let root = Path::new("/work").join(name);
    let mut p = Project::new(name, root.clone(), root.join("build"));
    p.files = vec![root.join("src/main.cpp"), root.join("src/main.h"), root.join("src/win32.cpp")];
    p
  }

  fn generate(ctx: &Context, p: &Project) -> (String, Option<String>) {
    let confs: Vec<&Configuration> = p.configurations.iter().collect();
    let mut x = XcodeContext::new(ctx, p);
    x.prepare(&confs).unwrap();
    let text = x.render().unwrap();
    (text, x.scheme().unwrap())
  }

  fn with_context<F>(projects: &[Project], masters: &MasterBffIndex, f: F) where F: FnOnce(&Context) {
    let ids       = IdGenerator::new();
    let platforms: Platforms = platform::init();
    let ctx = Context { ids: &ids, platforms: &platforms, projects, masters };
    f(&ctx)
  }

  #[test]
  fn app_with_test_bundle() {
    let mut p = project("hello");
    p.configurations = vec![
      conf("Debug",   "hello",       OutputType::App),
      conf("Release", "hello",       OutputType::App),
      conf("Debug",   "hello_tests", OutputType::TestBundle)
    ];
    for c in &mut p.configurations {
      c.build_exclude = vec![Path::new("/work/hello/src/win32.cpp").to_path_buf()];
    }

    with_context(&[], &MasterBffIndex::new(), |ctx| {
      let (text, scheme) = generate(ctx, &p);
      assert!(text.contains("productType = \"com.apple.product-type.application\";"));
      assert!(text.contains("productType = \"com.apple.product-type.bundle.unit-test\";"));
      assert!(text.contains("/* main.cpp in Sources */"));
      assert!(text.contains("/* main.h in Headers */"));
      assert!(!text.contains("win32.cpp"));
      assert!(text.contains("TEST_HOST = \"$(BUILT_PRODUCTS_DIR)/hello.app/Contents/MacOS/hello\";"));
      assert!(text.contains("/* XCTest.framework in Frameworks */"));
      assert!(text.contains("\t\t\t\tTestTargetID = "));
      assert!(!text.contains("REMOVE_LINE_TAG"));

      let scheme = scheme.unwrap();
      assert!(scheme.contains("BlueprintName = \"hello\""));
      assert!(scheme.contains("BuildableName = \"hello_tests.xctest\""));
      assert!(scheme.contains("buildConfiguration = \"Debug\""));
      assert!(scheme.contains("ReferencedContainer = \"container:hello.xcodeproj\""));
    });
  }

  #[test]
  fn cross_project_ids_match() {
    let mut core = project("core");
    core.configurations = vec![conf("Debug", "core", OutputType::Lib)];

    let mut app = project("app");
    let mut c = conf("Debug", "app", OutputType::Exe);
    c.dependencies = vec![Dependency::parse("core/core")];
    app.configurations = vec![c];

    let projects = vec![core, app];
    with_context(&projects, &MasterBffIndex::new(), |ctx| {
      let ids = ctx.ids;
      let (core_text, _) = generate(ctx, &projects[0]);
      let (app_text,  _) = generate(ctx, &projects[1]);

      let target  = ids.stable_id("PBXNativeTarget", "core/core");
      let product = ids.stable_id("PBXFileReference", "core/core/libcore.a");
      assert!(core_text.contains(&[target.as_str(), " /* core */ = {"].concat()));
      assert!(core_text.contains(&[product.as_str(), " /* libcore.a */ = {"].concat()));
      assert!(app_text.contains(&["remoteGlobalIDString = ", target.as_str(), ";"].concat()));
      assert!(app_text.contains(&["remoteGlobalIDString = ", product.as_str(), ";"].concat()));
      assert!(app_text.contains("/* libcore.a in Frameworks */"));
      assert!(app_text.contains("ProjectRef = "));
    });
  }

  #[test]
  fn unknown_dependencies_are_skipped() {
    let mut p = project("hello");
    let mut c = conf("Debug", "hello", OutputType::Exe);
    c.dependencies = vec![Dependency::parse("missing"), Dependency::parse("nowhere/core")];
    p.configurations = vec![c];

    with_context(&[], &MasterBffIndex::new(), |ctx| {
      let (text, _) = generate(ctx, &p);
      assert!(!text.contains("PBXTargetDependency section"));
    });
  }

  #[test]
  fn legacy_target_without_master_bff() {
    let mut p = project("hello");
    let mut c = conf("Debug", "hello", OutputType::Exe);
    c.fastbuild = true;
    p.configurations = vec![c];

    with_context(&[], &MasterBffIndex::new(), |ctx| {
      let (text, _) = generate(ctx, &p);
      assert!(text.contains("isa = PBXLegacyTarget;"));
      assert!(!text.contains("buildToolPath"));
      assert!(text.contains("FASTBUILD_TARGET = hello_Debug_macOS;"));
    });
  }

  #[test]
  fn legacy_target_with_master_bff() {
    let mut p = project("hello");
    let mut c = conf("Debug", "hello", OutputType::Exe);
    c.fastbuild = true;
    let key = c.key("hello");
    p.configurations = vec![c];

    let mut masters = MasterBffIndex::new();
    masters.insert(key.clone(), vec![PathBuf::from("/work/hello/build/all.bff")]);
    with_context(&[], &masters, |ctx| {
      let (text, _) = generate(ctx, &p);
      assert!(text.contains("buildToolPath = FBuild;"));
      assert!(text.contains("buildArgumentsString = \"-config all.bff $(FASTBUILD_TARGET)\";"));
    });

    masters.insert(key, vec![PathBuf::from("/a.bff"), PathBuf::from("/b.bff")]);
    with_context(&[], &masters, |ctx| {
      let confs: Vec<&Configuration> = p.configurations.iter().collect();
      let mut x = XcodeContext::new(ctx, &p);
      assert!(matches!(x.prepare(&confs), Err(Error::Unsupported { .. })));
    });
  }

  #[test]
  fn scheme_escapes_names() {
    let mut p = project("R&D");
    p.configurations = vec![conf("Debug", "tools&more", OutputType::Exe)];
    with_context(&[], &MasterBffIndex::new(), |ctx| {
      let scheme = generate(ctx, &p).1.unwrap();
      assert!(scheme.contains("BlueprintName = \"tools&amp;more\""));
      assert!(scheme.contains("ReferencedContainer = \"container:R&amp;D.xcodeproj\""));
      assert!(!scheme.contains("R&D"));
    });
  }

  #[test]
  fn output_none_is_unsupported() {
    let mut p = project("hello");
    p.configurations = vec![conf("Debug", "hello", OutputType::None)];
    with_context(&[], &MasterBffIndex::new(), |ctx| {
      let confs: Vec<&Configuration> = p.configurations.iter().collect();
      let mut x = XcodeContext::new(ctx, &p);
      assert!(matches!(x.prepare(&confs), Err(Error::Unsupported { .. })));
    });
  }
}
