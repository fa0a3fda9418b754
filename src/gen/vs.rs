//! Project generator for Visual Studio.
//!
//! Writes one `.vcxproj` per project covering its Windows, Android and Linux
//! configurations, and one `.sln` per solution. Both formats use CRLF line
//! endings; templates are written with `\n` and converted last.
//!
//! Per-platform fragments of the project file come from the platform strategy
//! and reference the configuration's options as `[options.Key]`.
//!
//! References:
//! - https://docs.microsoft.com/en-us/visualstudio/msbuild/msbuild-project-file-schema-reference
//! - https://docs.microsoft.com/en-us/visualstudio/extensibility/internals/solution-dot-sln-file

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::ctx::{relative_to, BuildStep, Configuration, Context, GenerationReport, Generator, OutputType,
                 PlatformType, Project, ResolvedOptions, Solution};
use crate::error::{Error, Result};
use crate::gen::workspace::{FolderTree, Visit};
use crate::output;
use crate::platform;
use crate::resolver::{remove_tagged_lines, xml_escape, Resolver, Value, REMOVE_LINE_TAG};

pub struct VisualStudio;

impl Generator for VisualStudio {
  fn supports_platform(&self, p: PlatformType) -> bool {
    match p {
      PlatformType::Windows => true,
      PlatformType::Android => true,
      PlatformType::Linux   => true,
      PlatformType::MacOS   => false,
      PlatformType::IOS     => false,
      PlatformType::TVOS    => false,
      PlatformType::WatchOS => false
    }
  }

  fn generate_project(&self, ctx: &Context, project: &Project, report: &mut GenerationReport) -> Result<()> {
    let confs = vs_configurations(ctx, project)?;
    if confs.is_empty() {
      return Ok(());
    }

    let text = write_vcxproj(ctx, &TOOLS, project, &confs)?;
    output::emit(report, &project.vcxproj_path(), &to_crlf(&text))?;
    debug!(project = %project.name, configurations = confs.len(), "vcxproj");
    Ok(())
  }

  fn generate_solution(&self, ctx: &Context, solution: &Solution, report: &mut GenerationReport) -> Result<()> {
    let tree = FolderTree::of_solution(ctx, solution, |p| {
      p.configurations.iter().any(|c| self.supports_platform(c.platform))
    });
    let path = solution.output_dir.join([solution.name.as_str(), ".sln"].concat());
    if tree.is_empty() {
      return Ok(());
    }

    let text = write_sln(ctx, &TOOLS, solution, &tree)?;
    output::emit(report, &path, &to_crlf(&text))
  }
}

/// The Visual Studio release the files target.
struct Tools {
  version_major: &'static str,
  version_full:  &'static str,
  xmlns:         &'static str
}

const TOOLS: Tools = Tools {
  version_major: "16",
  version_full:  "16.0.28729.10",
  xmlns:         "http://schemas.microsoft.com/developer/msbuild/2003"
};

const CXX_PROJECT_KIND: &str = "8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942";
const FOLDER_KIND:      &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

const FASTBUILD_TOOL: &str = "FBuild";

const VCXPROJ_HEADER: &str = concat!(
  "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
  "<Project DefaultTargets=\"Build\" ToolsVersion=\"[tools.version].0\" xmlns=\"[tools.xmlns]\">\n",
  "  <ItemGroup Label=\"ProjectConfigurations\">\n");

const VCXPROJ_PROJECT_CONFIGURATION: &str = concat!(
  "    <ProjectConfiguration Include=\"[conf.name]|[conf.platform]\">\n",
  "      <Configuration>[conf.name]</Configuration>\n",
  "      <Platform>[conf.platform]</Platform>\n",
  "    </ProjectConfiguration>\n");

const VCXPROJ_GLOBALS: &str = concat!(
  "  </ItemGroup>\n",
  "  <PropertyGroup Label=\"Globals\">\n",
  "    <ProjectGuid>{[guid]}</ProjectGuid>\n",
  "    <RootNamespace>[project_name]</RootNamespace>\n",
  "[fragment]",
  "  </PropertyGroup>\n",
  "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.Default.props\" />\n");

const VCXPROJ_CONFIGURATION: &str = concat!(
  "  <PropertyGroup Condition=\"[conf.condition]\" Label=\"Configuration\">\n",
  "    <ConfigurationType>[conf.type]</ConfigurationType>\n",
  "[fragment]",
  "  </PropertyGroup>\n");

const VCXPROJ_PROPS: &str = concat!(
  "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.props\" />\n",
  "  <ImportGroup Label=\"ExtensionSettings\" />\n",
  "  <ImportGroup Label=\"Shared\" />\n",
  "  <PropertyGroup Label=\"UserMacros\" />\n");

const VCXPROJ_OUTPUT: &str = concat!(
  "  <PropertyGroup Condition=\"[conf.condition]\">\n",
  "    <OutDir>[conf.out_dir]\\</OutDir>\n",
  "    <IntDir>[conf.int_dir]\\</IntDir>\n",
  "    <TargetName>[conf.target]</TargetName>\n",
  "    <LinkIncremental>[options.LinkIncremental]</LinkIncremental>\n",
  "    <NMakeBuildCommandLine>[nmake.build]</NMakeBuildCommandLine>\n",
  "    <NMakeReBuildCommandLine>[nmake.rebuild]</NMakeReBuildCommandLine>\n",
  "    <NMakeCleanCommandLine>[nmake.clean]</NMakeCleanCommandLine>\n",
  "    <NMakeOutput>[nmake.output]</NMakeOutput>\n",
  "  </PropertyGroup>\n");

const VCXPROJ_ITEM_DEFINITION: &str = concat!(
  "  <ItemDefinitionGroup Condition=\"[conf.condition]\">\n",
  "[fragment]",
  "[events]",
  "  </ItemDefinitionGroup>\n");

const VCXPROJ_BUILD_EVENT: &str = concat!(
  "    <[event]>\n",
  "      <Command>[command]</Command>\n",
  "    </[event]>\n");

const VCXPROJ_FOOTER: &str = concat!(
  "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.targets\" />\n",
  "  <ImportGroup Label=\"ExtensionTargets\" />\n",
  "</Project>\n");

const SLN_HEADER: &str = concat!(
  "\u{feff}\n",
  "Microsoft Visual Studio Solution File, Format Version 12.00\n",
  "# Visual Studio Version [tools.version]\n",
  "VisualStudioVersion = [tools.version_full]\n",
  "MinimumVisualStudioVersion = 10.0.40219.1\n");

const SLN_PROJECT: &str = concat!(
  "Project(\"{[kind]}\") = \"[name]\", \"[path]\", \"{[guid]}\"\n",
  "EndProject\n");

/// A configuration as Visual Studio sees it.
struct VsConf<'a> {
  conf:     &'a Configuration,
  /// Configuration name, prefixed by the target when a project has several.
  name:     String,
  platform: &'static str,
  options:  ResolvedOptions
}

impl VsConf<'_> {
  fn key(&self) -> String {
    [self.name.as_str(), "|", self.platform].concat()
  }

  fn condition(&self) -> String {
    ["'$(Configuration)|$(Platform)'=='", self.key().as_str(), "'"].concat()
  }
}

fn to_crlf(text: &str) -> String {
  text.replace('\n', "\r\n")
}

/// Relative path with Windows separators.
fn windows_path(path: &Path, base: &Path) -> String {
  relative_to(path, base).replace('/', "\\")
}

fn configuration_type(project: &Project, conf: &Configuration) -> Result<&'static str> {
  if conf.fastbuild {
    return Ok("Makefile");
  }
  match conf.output {
    OutputType::Exe | OutputType::App => Ok("Application"),
    OutputType::Lib                   => Ok("StaticLibrary"),
    OutputType::Dll                   => Ok("DynamicLibrary"),
    OutputType::None                  => Ok("Utility"),
    other                             => {
      Err(Error::unsupported(&project.name, conf.name.as_str(),
                             format!("{:?} outputs can't be built by Visual Studio", other)))
    }
  }
}

fn is_compiled_file(path: &Path) -> bool {
  match path.extension().and_then(|e| e.to_str()) {
    Some(e) => ["c", "cc", "cpp", "cxx"].contains(&e.to_ascii_lowercase().as_str()),
    None    => false
  }
}

fn is_include_file(path: &Path) -> bool {
  match path.extension().and_then(|e| e.to_str()) {
    Some(e) => ["h", "hh", "hpp", "hxx", "inl"].contains(&e.to_ascii_lowercase().as_str()),
    None    => false
  }
}

/// The project's configurations Visual Studio can build, with resolved options.
fn vs_configurations<'a>(ctx: &Context, project: &'a Project) -> Result<Vec<VsConf<'a>>> {
  let confs = project.configurations_for(|c| VisualStudio.supports_platform(c.platform));

  let prefixed = confs.iter().any(|c| c.target != confs[0].target);

  let mut result: Vec<VsConf> = Vec::with_capacity(confs.len());
  for conf in confs {
    let strategy    = ctx.platform(conf.platform);
    let vs_platform = match strategy.vcxproj_platform(conf.architecture) {
      Some(name) if strategy.supports_architecture(conf.architecture) => name,
      _ => {
        return Err(Error::unsupported(&project.name, conf.name.as_str(),
                                      format!("{} doesn't support {:?}", conf.platform.to_str(), conf.architecture)));
      }
    };

    let name = match prefixed {
      true  => [conf.target.as_str(), "_", conf.name.as_str()].concat(),
      false => conf.name.clone()
    };
    let vs = VsConf {
      conf,
      name,
      platform: vs_platform,
      options:  platform::resolve(strategy, project, conf)?
    };
    if result.iter().any(|c| c.key() == vs.key()) {
      return Err(Error::unsupported(&project.name, conf.name.as_str(),
                                    format!("more than one configuration maps to '{}'", vs.key())));
    }
    result.push(vs);
  }
  Ok(result)
}

/// The master bff building a configuration, if any.
fn master_bff<'c>(ctx: &'c Context, project: &Project, conf: &Configuration) -> Result<Option<&'c PathBuf>> {
  let key = conf.key(&project.name);
  match ctx.masters.get(&key).map(Vec::as_slice) {
    None | Some([]) => {
      warn!(configuration = %key, "not included by any master bff, its Visual Studio build does nothing");
      Ok(None)
    },
    Some([m]) => Ok(Some(m)),
    Some(all) => {
      Err(Error::unsupported(&project.name, conf.name.as_str(),
                             format!("included by {} master bff files", all.len())))
    }
  }
}

fn build_events(resolver: &Resolver, steps: &[BuildStep], event: &str) -> Result<String> {
  if steps.is_empty() {
    return Ok(String::new());
  }
  let command: Vec<String> = steps.iter().map(|s| xml_escape(&s.script)).collect();
  let _event   = resolver.declare("event", event.to_string());
  let _command = resolver.declare("command", command.join("\n"));
  resolver.resolve(VCXPROJ_BUILD_EVENT)
}

/// The `conf` object of the per-configuration templates.
fn conf_value<'a>(project: &Project, vs: &VsConf) -> Result<Value<'a>> {
  let conf      = vs.conf;
  let name      = vs.name.clone();
  let platform  = vs.platform;
  let condition = vs.condition();
  let type_     = configuration_type(project, conf)?;
  let out_dir   = windows_path(&project.output_dir.join(&conf.target_dir), &project.output_dir);
  let int_dir   = windows_path(&project.output_dir.join(&conf.intermediate_dir), &project.output_dir);
  let target    = conf.target.clone();

  Ok(Value::object(move |p: &str| match p {
    "name"      => Some(Value::from(name.clone())),
    "platform"  => Some(Value::from(platform)),
    "condition" => Some(Value::from(condition.clone())),
    "type"      => Some(Value::from(type_)),
    "out_dir"   => Some(Value::from(out_dir.clone())),
    "int_dir"   => Some(Value::from(int_dir.clone())),
    "target"    => Some(Value::from(target.clone())),
    _           => None
  }))
}

/// The `nmake` object: FastBuild command lines of makefile configurations.
fn nmake_value<'a>(ctx: &Context, project: &Project, conf: &Configuration) -> Result<Value<'a>> {
  let master = match conf.fastbuild {
    true  => master_bff(ctx, project, conf)?,
    false => None
  };
  let command = |extra: &str| match master {
    Some(m) => {
      let alias = match project.fastbuild_all {
        true  => "All".to_string(),
        false => conf.bff_alias()
      };
      format!("{} -config \"{}\" {}{}", FASTBUILD_TOOL, windows_path(m, &project.output_dir), alias, extra)
    },
    None => REMOVE_LINE_TAG.to_string()
  };
  let output = match (master, platform::output_file_name(conf)) {
    (Some(_), Some(file)) => windows_path(&project.output_dir.join(&conf.target_dir).join(file), &project.output_dir),
    _                     => REMOVE_LINE_TAG.to_string()
  };
  let (build, rebuild) = (command(""), command(" -clean"));

  Ok(Value::object(move |p: &str| match p {
    "build"   => Some(Value::from(build.clone())),
    "rebuild" => Some(Value::from(rebuild.clone())),
    "clean"   => Some(Value::from(rebuild.clone())),
    "output"  => Some(Value::from(output.clone())),
    _         => None
  }))
}

/// The `Configuration` property group, written before the props import.
fn write_configuration<'a>(ctx: &Context, resolver: &Resolver<'a>, project: &Project, vs: &'a VsConf,
                           out: &mut String) -> Result<()>
{
  let _conf    = resolver.declare("conf", conf_value(project, vs)?);
  let _options = resolver.declare("options", &vs.options.options);

  let fragment  = resolver.resolve(ctx.platform(vs.conf.platform).vcxproj_configuration())?;
  let _fragment = resolver.declare("fragment", fragment);
  out.push_str(&resolver.resolve(VCXPROJ_CONFIGURATION)?);
  Ok(())
}

/// Output directories and item definitions, written after the props import.
fn write_definitions<'a>(ctx: &Context, resolver: &Resolver<'a>, project: &Project, vs: &'a VsConf,
                         out: &mut String) -> Result<()>
{
  let conf     = vs.conf;
  let _conf    = resolver.declare("conf", conf_value(project, vs)?);
  let _options = resolver.declare("options", &vs.options.options);
  {
    let _nmake = resolver.declare("nmake", nmake_value(ctx, project, conf)?);
    out.push_str(&resolver.resolve(VCXPROJ_OUTPUT)?);
  }

  let fragment  = resolver.resolve(ctx.platform(conf.platform).vcxproj_item_definitions())?;
  let events    = [build_events(resolver, &conf.pre_build,  "PreBuildEvent")?,
                   build_events(resolver, &conf.post_build, "PostBuildEvent")?].concat();
  let _fragment = resolver.declare("fragment", fragment);
  let _events   = resolver.declare("events", events);
  out.push_str(&resolver.resolve(VCXPROJ_ITEM_DEFINITION)?);
  Ok(())
}

fn write_files(project: &Project, confs: &[VsConf], out: &mut String) -> Result<()> {
  let mut pch_sources = Vec::with_capacity(confs.len());
  for vs in confs {
    pch_sources.push(platform::find_precompiled_source(project, vs.conf)?);
  }

  let compiled: Vec<&PathBuf> = project.files.iter().filter(|f| is_compiled_file(f)).collect();
  if !compiled.is_empty() {
    out.push_str("  <ItemGroup>\n");
    for file in compiled {
      let include = xml_escape(&windows_path(file, &project.output_dir));
      let mut conditions = String::new();
      for (vs, pch) in confs.iter().zip(&pch_sources) {
        if vs.conf.is_excluded(file) {
          conditions.push_str(&format!("      <ExcludedFromBuild Condition=\"{}\">true</ExcludedFromBuild>\n",
                                       vs.condition()));
        }
        else if pch.as_ref() == Some(file) {
          conditions.push_str(&format!("      <PrecompiledHeader Condition=\"{}\">Create</PrecompiledHeader>\n",
                                       vs.condition()));
        }
      }
      match conditions.is_empty() {
        true  => out.push_str(&format!("    <ClCompile Include=\"{}\" />\n", include)),
        false => {
          out.push_str(&format!("    <ClCompile Include=\"{}\">\n", include));
          out.push_str(&conditions);
          out.push_str("    </ClCompile>\n");
        }
      }
    }
    out.push_str("  </ItemGroup>\n");
  }

  let includes: Vec<&PathBuf> = project.files.iter().filter(|f| is_include_file(f)).collect();
  if !includes.is_empty() {
    out.push_str("  <ItemGroup>\n");
    for file in includes {
      out.push_str(&format!("    <ClInclude Include=\"{}\" />\n", xml_escape(&windows_path(file, &project.output_dir))));
    }
    out.push_str("  </ItemGroup>\n");
  }
  Ok(())
}

/// Other projects of the manifest this project depends on.
fn referenced_projects<'a>(ctx: &Context<'a>, project: &Project, confs: &[VsConf]) -> Vec<&'a Project> {
  let mut refs: Vec<&'a Project> = Vec::new();
  for vs in confs {
    for dep in &vs.conf.dependencies {
      let name = match &dep.project {
        Some(name) if *name != project.name => name,
        _                                   => continue
      };
      match ctx.find_project(name) {
        Some(p) if refs.iter().any(|r| r.name == p.name) => {},
        Some(p) if p.configurations.iter().any(|c| VisualStudio.supports_platform(c.platform)) => refs.push(p),
        Some(_) => {
          warn!(project = %project.name, dependency = %name, "dependency has no Visual Studio project, skipped");
        },
        None => {
          warn!(project = %project.name, dependency = %name, "dependency on an unknown project, skipped");
        }
      }
    }
  }
  refs
}

pub fn project_guid(ctx: &Context, project: &Project) -> String {
  ctx.ids.guid(&["vcxproj/", project.name.as_str()].concat())
}

fn write_vcxproj(ctx: &Context, tools: &Tools, project: &Project, confs: &[VsConf]) -> Result<String> {
  let resolver = Resolver::new();
  let version  = tools.version_major;
  let xmlns    = tools.xmlns;
  let _tools   = resolver.declare("tools", Value::object(move |p: &str| match p {
    "version" => Some(Value::from(version)),
    "xmlns"   => Some(Value::from(xmlns)),
    _         => None
  }));

  let mut out = resolver.resolve(VCXPROJ_HEADER)?;
  for vs in confs {
    let name     = vs.name.clone();
    let platform = vs.platform;
    let _conf    = resolver.declare("conf", Value::object(move |p: &str| match p {
      "name"     => Some(Value::from(name.clone())),
      "platform" => Some(Value::from(platform)),
      _          => None
    }));
    out.push_str(&resolver.resolve(VCXPROJ_PROJECT_CONFIGURATION)?);
  }

  {
    let globals   = ctx.platform(confs[0].conf.platform).vcxproj_globals();
    let _guid     = resolver.declare("guid", project_guid(ctx, project));
    let _name     = resolver.declare("project_name", project.name.as_str());
    let _fragment = resolver.declare("fragment", globals);
    out.push_str(&resolver.resolve(VCXPROJ_GLOBALS)?);
  }

  for vs in confs {
    write_configuration(ctx, &resolver, project, vs, &mut out)?;
  }
  out.push_str(&resolver.resolve(VCXPROJ_PROPS)?);
  for vs in confs {
    write_definitions(ctx, &resolver, project, vs, &mut out)?;
  }

  write_files(project, confs, &mut out)?;

  let refs = referenced_projects(ctx, project, confs);
  if !refs.is_empty() {
    out.push_str("  <ItemGroup>\n");
    for other in refs {
      out.push_str(&format!("    <ProjectReference Include=\"{}\">\n",
                            xml_escape(&windows_path(&other.vcxproj_path(), &project.output_dir))));
      out.push_str(&format!("      <Project>{{{}}}</Project>\n", project_guid(ctx, other)));
      out.push_str("    </ProjectReference>\n");
    }
    out.push_str("  </ItemGroup>\n");
  }

  out.push_str(&resolver.resolve(VCXPROJ_FOOTER)?);
  Ok(remove_tagged_lines(&out))
}

fn write_sln(ctx: &Context, tools: &Tools, solution: &Solution, tree: &FolderTree) -> Result<String> {
  let all: Vec<&str> = solution.projects.iter()
    .filter_map(|e| ctx.find_project(&e.project))
    .filter(|p| p.fastbuild_all)
    .map(|p| p.name.as_str())
    .collect();
  if all.len() > 1 {
    return Err(Error::unsupported(&solution.name, "",
                                  format!("more than one FastBuild all project: {}", all.join(", "))));
  }

  let resolver = Resolver::new();
  let version  = tools.version_major;
  let full     = tools.version_full;
  let _tools   = resolver.declare("tools", Value::object(move |p: &str| match p {
    "version"      => Some(Value::from(version)),
    "version_full" => Some(Value::from(full)),
    _              => None
  }));
  let mut out = resolver.resolve(SLN_HEADER)?;

  let mut projects: Vec<(&Project, String, Vec<VsConf>)> = Vec::new();
  let mut nested:   Vec<(String, String)> = Vec::new();
  tree.walk(|visit| {
    let (kind, name, path, guid, parent) = match visit {
      Visit::Enter(folder, _) => {
        let parent = folder.parent.map(|p| tree.get(p).guid.clone()).filter(|g| !g.is_empty());
        (FOLDER_KIND, folder.name.clone(), folder.name.clone(), folder.guid.clone(), parent)
      },
      Visit::Leave(..) => return Ok(()),
      Visit::Project(project, folder, _) => {
        let guid = project_guid(ctx, project);
        projects.push((project, guid.clone(), vs_configurations(ctx, project)?));
        (CXX_PROJECT_KIND, project.name.clone(),
         windows_path(&project.vcxproj_path(), &solution.output_dir), guid, folder.map(|f| f.guid.clone()))
      }
    };
    if let Some(parent) = parent {
      nested.push((guid.clone(), parent));
    }

    let _kind = resolver.declare("kind", kind);
    let _name = resolver.declare("name", name);
    let _path = resolver.declare("path", path);
    let _guid = resolver.declare("guid", guid);
    out.push_str(&resolver.resolve(SLN_PROJECT)?);
    Ok(())
  })?;

  let mut solution_confs: Vec<String> = Vec::new();
  for (_, _, confs) in &projects {
    for vs in confs {
      if !solution_confs.contains(&vs.key()) {
        solution_confs.push(vs.key());
      }
    }
  }

  out.push_str("Global\n");
  out.push_str("\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\n");
  for key in &solution_confs {
    out.push_str(&format!("\t\t{0} = {0}\n", key));
  }
  out.push_str("\tEndGlobalSection\n");

  // With an "all" project, FastBuild builds every other FastBuild configuration.
  let has_all = !all.is_empty();
  out.push_str("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n");
  for (project, guid, confs) in &projects {
    for vs in confs {
      let key = vs.key();
      out.push_str(&format!("\t\t{{{0}}}.{1}.ActiveCfg = {1}\n", guid, key));
      if !(has_all && vs.conf.fastbuild && !project.fastbuild_all) {
        out.push_str(&format!("\t\t{{{0}}}.{1}.Build.0 = {1}\n", guid, key));
      }
    }
  }
  out.push_str("\tEndGlobalSection\n");

  out.push_str("\tGlobalSection(SolutionProperties) = preSolution\n");
  out.push_str("\t\tHideSolutionNode = FALSE\n");
  out.push_str("\tEndGlobalSection\n");

  if !nested.is_empty() {
    out.push_str("\tGlobalSection(NestedProjects) = preSolution\n");
    for (child, parent) in &nested {
      out.push_str(&format!("\t\t{{{}}} = {{{}}}\n", child, parent));
    }
    out.push_str("\tEndGlobalSection\n");
  }

  out.push_str("\tGlobalSection(ExtensibilityGlobals) = postSolution\n");
  out.push_str(&format!("\t\tSolutionGuid = {{{}}}\n", ctx.ids.guid(&["sln/", solution.name.as_str()].concat())));
  out.push_str("\tEndGlobalSection\n");
  out.push_str("EndGlobal\n");
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{Dependency, MasterBffIndex, Settings, SolutionProject};
  use crate::uid::IdGenerator;
  use std::path::Path;

  fn project(name: &str) -> Project {
    let root = Path::new("/work").join(name);
    let mut p = Project::new(name, root.clone(), PathBuf::from("/work/build"));
    p.files = vec![root.join("src/main.cpp"), root.join("src/main.h"), root.join("src/posix.cpp")];
    p
  }

  fn conf(name: &str, target: &str, platform: PlatformType, output: OutputType) -> Configuration {
    let mut c = Configuration::new(name, target, platform, output);
    c.settings = match name {
      "Debug" => Settings::debug(),
      _       => Settings::release()
    };
    c
  }

  fn with_context<F>(projects: &[Project], masters: &MasterBffIndex, f: F) where F: FnOnce(&Context) {
    let ids       = IdGenerator::new();
    let platforms = platform::init();
    let ctx = Context { ids: &ids, platforms: &platforms, projects, masters };
    f(&ctx)
  }

  fn vcxproj(ctx: &Context, p: &Project) -> String {
    let confs = vs_configurations(ctx, p).unwrap();
    write_vcxproj(ctx, &TOOLS, p, &confs).unwrap()
  }

  #[test]
  fn windows_project() {
    let mut p = project("hello");
    let mut debug = conf("Debug", "hello", PlatformType::Windows, OutputType::Exe);
    debug.build_exclude = vec![PathBuf::from("/work/hello/src/posix.cpp")];
    debug.post_build    = vec![BuildStep { name: "copy".to_string(), script: "copy a b && echo <done>".to_string() }];
    p.configurations = vec![debug, conf("Release", "hello", PlatformType::Windows, OutputType::Exe)];

    with_context(&[], &MasterBffIndex::new(), |ctx| {
      let text = vcxproj(ctx, &p);
      assert!(text.contains("<ProjectConfiguration Include=\"Debug|x64\">"));
      assert!(text.contains(&format!("<ProjectGuid>{{{}}}</ProjectGuid>", ctx.ids.guid("vcxproj/hello"))));
      assert!(text.contains("<ConfigurationType>Application</ConfigurationType>"));
      assert!(text.contains("<PlatformToolset>v142</PlatformToolset>"));
      assert!(text.contains("<OutDir>bin\\Debug\\</OutDir>"));
      assert!(text.contains("<Optimization>Disabled</Optimization>"));
      assert!(text.contains("<ClCompile Include=\"..\\hello\\src\\main.cpp\" />"));
      assert!(text.contains(concat!(
        "    <ClCompile Include=\"..\\hello\\src\\posix.cpp\">\n",
        "      <ExcludedFromBuild Condition=\"'$(Configuration)|$(Platform)'=='Debug|x64'\">true</ExcludedFromBuild>\n",
        "    </ClCompile>\n")));
      assert!(text.contains("<ClInclude Include=\"..\\hello\\src\\main.h\" />"));
      assert!(text.contains("<Command>copy a b &amp;&amp; echo &lt;done&gt;</Command>"));
      assert!(!text.contains("NMake"));
      assert!(!text.contains(REMOVE_LINE_TAG));

      // Configuration groups come before the props import.
      let configuration = text.find("Label=\"Configuration\"").unwrap();
      let props         = text.find("Microsoft.Cpp.props").unwrap();
      let outdir        = text.find("<OutDir>").unwrap();
      assert!(configuration < props && props < outdir);
    });
  }

  #[test]
  fn fastbuild_makefile_project() {
    let mut p = project("hello");
    let mut c = conf("Debug", "hello", PlatformType::Linux, OutputType::Exe);
    c.fastbuild = true;
    let key = c.key("hello");
    p.configurations = vec![c];

    let mut masters = MasterBffIndex::new();
    masters.insert(key, vec![PathBuf::from("/work/build/all.bff")]);
    with_context(&[], &masters, |ctx| {
      let text = vcxproj(ctx, &p);
      assert!(text.contains("<ConfigurationType>Makefile</ConfigurationType>"));
      assert!(text.contains("<NMakeBuildCommandLine>FBuild -config \"all.bff\" hello_Debug_Linux</NMakeBuildCommandLine>"));
      assert!(text.contains("<NMakeOutput>bin\\Debug\\hello</NMakeOutput>"));
    });
  }

  #[test]
  fn project_references() {
    let mut core = project("core");
    core.configurations = vec![conf("Debug", "core", PlatformType::Windows, OutputType::Lib)];
    let mut app = project("app");
    let mut c = conf("Debug", "app", PlatformType::Windows, OutputType::Exe);
    c.dependencies = vec![Dependency::parse("core/core"), Dependency::parse("missing/x")];
    app.configurations = vec![c];

    let projects = vec![core, app];
    with_context(&projects, &MasterBffIndex::new(), |ctx| {
      let text = vcxproj(ctx, &projects[1]);
      assert!(text.contains("<ProjectReference Include=\"core.vcxproj\">"));
      assert!(text.contains(&format!("<Project>{{{}}}</Project>", ctx.ids.guid("vcxproj/core"))));
    });
  }

  #[test]
  fn apple_outputs_are_unsupported() {
    let mut p = project("hello");
    p.configurations = vec![conf("Debug", "hello", PlatformType::Windows, OutputType::Framework)];
    with_context(&[], &MasterBffIndex::new(), |ctx| {
      let confs = vs_configurations(ctx, &p).unwrap();
      let result = write_vcxproj(ctx, &TOOLS, &p, &confs);
      assert!(matches!(result, Err(Error::Unsupported { .. })));
    });
  }

  #[test]
  fn solution_folders() {
    let mut core = project("core");
    core.configurations = vec![conf("Debug", "core", PlatformType::Windows, OutputType::Lib)];
    let mut app = project("app");
    app.configurations = vec![conf("Debug", "app", PlatformType::Windows, OutputType::Exe),
                              conf("Release", "app", PlatformType::Windows, OutputType::Exe)];
    let projects = vec![core, app];

    let solution = Solution {
      name:       "game".to_string(),
      output_dir: PathBuf::from("/work/build"),
      projects:   vec![SolutionProject { project: "core".to_string(), folder: "libs".to_string() },
                       SolutionProject { project: "app".to_string(),  folder: String::new() }],
      master_bff: false
    };

    with_context(&projects, &MasterBffIndex::new(), |ctx| {
      let tree = FolderTree::of_solution(ctx, &solution, |_| true);
      let text = write_sln(ctx, &TOOLS, &solution, &tree).unwrap();

      let folder = ctx.ids.guid("folder/libs");
      let core   = ctx.ids.guid("vcxproj/core");
      assert!(text.contains(&format!("Project(\"{{{}}}\") = \"libs\", \"libs\", \"{{{}}}\"", FOLDER_KIND, folder)));
      assert!(text.contains(&format!("\"core\", \"core.vcxproj\", \"{{{}}}\"", core)));
      assert!(text.contains(&format!("\t\t{{{}}} = {{{}}}\n", core, folder)));
      assert!(text.contains("\t\tDebug|x64 = Debug|x64\n\t\tRelease|x64 = Release|x64\n"));
      assert!(text.contains(&format!("{{{}}}.Debug|x64.Build.0 = Debug|x64", core)));
    });
  }

  #[test]
  fn single_fastbuild_all_project() {
    let mut a = project("all_a");
    a.fastbuild_all = true;
    let mut b = project("all_b");
    b.fastbuild_all = true;
    let projects = vec![a, b];

    let solution = Solution {
      name:       "game".to_string(),
      output_dir: PathBuf::from("/work/build"),
      projects:   vec![SolutionProject { project: "all_a".to_string(), folder: String::new() },
                       SolutionProject { project: "all_b".to_string(), folder: String::new() }],
      master_bff: true
    };
    with_context(&projects, &MasterBffIndex::new(), |ctx| {
      let tree = FolderTree::of_solution(ctx, &solution, |_| true);
      let result = write_sln(ctx, &TOOLS, &solution, &tree);
      assert!(matches!(result, Err(Error::Unsupported { .. })));
    });
  }
}
