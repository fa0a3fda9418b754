//! FastBuild generator.
//!
//! Each project with FastBuild configurations gets a `<project>.bff` file.
//! For every such configuration it declares an object list compiling the
//! sources, then the library, executable or DLL linking them, then an alias
//! named after the configuration. A solution's master bff declares the
//! compilers, includes the project files and gathers every alias under `All`.
//!
//! Relative paths are relative to the project's output directory, the working
//! directory FBuild is started from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::ctx::{relative_to, BffCompiler, Configuration, Context, GenerationReport, Generator,
                 MasterBffIndex, OutputType, PlatformType, Project, Solution};
use crate::error::{Error, Result};
use crate::output;
use crate::platform;
use crate::resolver::{remove_tagged_lines, Resolver, Value, REMOVE_LINE_TAG};

const BFF_HEADER: &str = concat!(
  "// FastBuild configurations of [project].\n",
  "// Included by [masters].\n");

const BFF_PLATFORM_BEGIN: &str = concat!(
  "\n",
  "#if [compiler.define]\n");

const BFF_PLATFORM_END: &str = "#endif // [compiler.define]\n";

const BFF_OBJECT_LIST: &str = concat!(
  "//------------------------------------------------------------------------------\n",
  "ObjectList('[conf.alias]_objects')\n",
  "{\n",
  "    .Compiler               = '[compiler.name]'\n",
  "    .CompilerOptions        = '[cmdline.CompileIO]'\n",
  "                            + ' [cmdline.Target]'\n",
  "                            + ' [cmdline.CompilerOptions]'\n",
  "                            + ' [conf.extra]'\n",
  "                            + ' [cmdline.Defines]'\n",
  "                            + ' [cmdline.IncludePaths]'\n",
  "                            + ' [cmdline.PchOptions]'\n",
  "    .CompilerInputFiles     = [conf.sources]\n",
  "    .CompilerOutputPath     = '[cmdline.IntermediateDirectory]/'\n",
  "    .PCHInputFile           = '[pch.input]'\n",
  "    .PCHOutputFile          = '[pch.output]'\n",
  "    .PCHOptions             = '[pch.options]'\n",
  "}\n");

const BFF_LIBRARY: &str = concat!(
  "//------------------------------------------------------------------------------\n",
  "Library('[conf.alias]_output')\n",
  "{\n",
  "    .Compiler               = '[compiler.name]'\n",
  "    .CompilerOptions        = '[cmdline.CompileIO]'\n",
  "    .CompilerOutputPath     = '[cmdline.IntermediateDirectory]/'\n",
  "    .Librarian              = '[compiler.librarian]'\n",
  "    .LibrarianOptions       = '[cmdline.LibrarianOptions]'\n",
  "    .LibrarianOutput        = '[conf.output]'\n",
  "    .LibrarianAdditionalInputs = [conf.objects]\n",
  "    .PreBuildDependencies   = [conf.prebuild]\n",
  "}\n");

const BFF_LINK: &str = concat!(
  "//------------------------------------------------------------------------------\n",
  "[conf.section]('[conf.alias]_output')\n",
  "{\n",
  "    .Linker                 = '[compiler.linker]'\n",
  "    .LinkerOptions          = '[cmdline.LinkIO]'\n",
  "                            + ' [cmdline.Target]'\n",
  "                            + ' [conf.extra]'\n",
  "                            + ' [cmdline.LinkerOptions]'\n",
  "    .LinkerOutput           = '[conf.output]'\n",
  "    .Libraries              = [conf.libraries]\n",
  "    .PreBuildDependencies   = [conf.prebuild]\n",
  "}\n");

const BFF_ALIAS: &str = concat!(
  "//------------------------------------------------------------------------------\n",
  "Alias('[conf.alias]')\n",
  "{\n",
  "    .Targets                = [conf.targets]\n",
  "}\n");

const MASTER_HEADER: &str = concat!(
  "// Master FastBuild file of [solution].\n",
  "\n",
  "//==============================================================================\n",
  "// Global Settings\n",
  "//==============================================================================\n",
  "Settings\n",
  "{\n",
  "#if __WINDOWS__\n",
  "    #import TMP\n",
  "    #import TEMP\n",
  "    #import SystemRoot\n",
  "    .Environment            = { 'TMP=$TMP$', 'TEMP=$TEMP$', 'SystemRoot=$SystemRoot$' }\n",
  "#endif\n",
  "#if __OSX__\n",
  "    #import TMPDIR\n",
  "    .Environment            = { 'TMPDIR=$TMPDIR$' }\n",
  "#endif\n",
  "}\n");

const MASTER_COMPILER: &str = concat!(
  "\n",
  "//------------------------------------------------------------------------------\n",
  "#define [compiler.define]\n",
  "Compiler('[compiler.name]')\n",
  "{\n",
  "    .ExecutableRootPath     = '[compiler.root]'\n",
  "    .Executable             = '[compiler.executable]'\n",
  "    .CompilerFamily         = '[compiler.family]'\n",
  "}\n");

const MASTER_PROJECTS: &str = concat!(
  "\n",
  "//==============================================================================\n",
  "// Projects\n",
  "//==============================================================================\n");

const MASTER_INCLUDE: &str = "#include \"[path]\"\n";

const MASTER_ALL: &str = concat!(
  "\n",
  "//==============================================================================\n",
  "Alias('All')\n",
  "{\n",
  "    .Targets                = [targets]\n",
  "}\n");

/// Command-line keys every strategy provides. Any other key is an extra
/// option applied to both compiling and linking.
const CMDLINE_KEYS: [&str; 11] = [
  "CompilerOptions", "Defines", "IncludePaths", "LinkerOptions", "LibrarianOptions", "PchOptions",
  "Target", "CompileIO", "LinkIO", "IntermediateDirectory", "OutputDirectory"
];

const ROOT_PATH_VAR: &str = "$ExecutableRootPath$";

pub struct FastBuild;

impl Generator for FastBuild {
  fn supports_platform(&self, _p: PlatformType) -> bool {
    true
  }

  fn generate_project(&self, ctx: &Context, project: &Project, report: &mut GenerationReport) -> Result<()> {
    if project.fastbuild_all {
      return Ok(());
    }

    let confs = bff_configurations(ctx, project)?;
    if confs.is_empty() {
      return Ok(());
    }

    output::emit(report, &project.bff_path(), &write_project_bff(ctx, project, &confs)?)?;
    debug!(project = %project.name, configurations = confs.len(), "fastbuild project");
    Ok(())
  }

  fn generate_solution(&self, ctx: &Context, solution: &Solution, report: &mut GenerationReport) -> Result<()> {
    if !solution.master_bff {
      return Ok(());
    }

    let path    = solution.master_bff_path();
    let members = master_members(ctx, solution);
    if members.is_empty() {
      let removed = output::remove_stale(&path)?;
      debug!(solution = %solution.name, removed, "no fastbuild project in solution");
      if removed {
        report.record(path, true);
      }
      return Ok(());
    }

    output::emit(report, &path, &write_master_bff(ctx, solution, &members)?)
  }
}

/// Maps every FastBuild configuration to the master bff files including it.
pub fn master_index(projects: &[Project], solutions: &[Solution]) -> MasterBffIndex {
  let mut index = MasterBffIndex::new();
  for solution in solutions.iter().filter(|s| s.master_bff) {
    let path = solution.master_bff_path();
    for entry in &solution.projects {
      let project = match projects.iter().find(|p| p.name == entry.project) {
        Some(p) => p,
        None    => continue
      };
      for conf in project.configurations.iter().filter(|c| c.fastbuild) {
        let masters = index.entry(conf.key(&project.name)).or_insert_with(Vec::new);
        if !masters.contains(&path) {
          masters.push(path.clone());
        }
      }
    }
  }
  index
}

/// A FastBuild configuration with everything its sections need.
struct BffConf<'a> {
  conf:     &'a Configuration,
  compiler: BffCompiler,
  cmdline:  BTreeMap<String, String>,
  sources:  Vec<String>
}

fn is_compiled_file(path: &Path, platform: PlatformType) -> bool {
  match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
    Some("c") | Some("cc") | Some("cpp") | Some("cxx") => true,
    Some("m") | Some("mm")                             => platform.is_apple(),
    _                                                  => false
  }
}

/// Escapes a value for a single quoted bff string.
fn escape(s: &str) -> String {
  s.replace('^', "^^").replace('\'', "^'")
}

fn is_set(s: &str) -> bool {
  !s.is_empty() && s != REMOVE_LINE_TAG
}

fn bff_list(items: &[String]) -> String {
  match items {
    []     => REMOVE_LINE_TAG.to_string(),
    [item] => ["{ '", escape(item).as_str(), "' }"].concat(),
    _      => {
      let mut s = String::from("{\n");
      for item in items {
        s.push_str("                                  '");
        s.push_str(&escape(item));
        s.push_str("',\n");
      }
      s.push_str("                              }");
      s
    }
  }
}

fn link_section(output: OutputType) -> Option<&'static str> {
  match output {
    OutputType::None                        => None,
    OutputType::Lib                         => Some("Library"),
    OutputType::Dll | OutputType::Framework => Some("DLL"),
    _                                       => Some("Executable")
  }
}

fn is_linkable(output: OutputType) -> bool {
  match output {
    OutputType::Lib | OutputType::Dll | OutputType::Framework => true,
    _                                                         => false
  }
}

/// The project's FastBuild configurations, in declaration order.
fn bff_configurations<'a>(ctx: &Context, project: &'a Project) -> Result<Vec<BffConf<'a>>> {
  let mut confs = Vec::new();
  for conf in project.configurations.iter().filter(|c| c.fastbuild) {
    let strategy = ctx.platform(conf.platform);
    let compiler = match strategy.bff_compiler() {
      Some(c) => c,
      None    => return Err(Error::unsupported(&project.name, conf.name.as_str(),
                                               "platform has no FastBuild compiler"))
    };

    let sources: Vec<String> = project.files.iter()
      .filter(|f| is_compiled_file(f, conf.platform) && !conf.is_excluded(f))
      .map(|f| relative_to(f, &project.output_dir))
      .collect();

    if sources.is_empty() && conf.output == OutputType::Lib {
      return Err(Error::unsupported(&project.name, conf.name.as_str(), "static library without source files"));
    }

    let options = platform::resolve(strategy, project, conf)?;
    confs.push(BffConf { conf, compiler, cmdline: options.cmdline, sources });
  }
  Ok(confs)
}

/// Joins the strategy's extra command-line options.
fn extra_options(cmdline: &BTreeMap<String, String>) -> String {
  let extra: Vec<&str> = cmdline.iter()
    .filter(|(k, v)| !CMDLINE_KEYS.contains(&k.as_str()) && is_set(v))
    .map(|(_, v)| v.as_str())
    .collect();
  match extra.is_empty() {
    true  => REMOVE_LINE_TAG.to_string(),
    false => extra.join(" ")
  }
}

fn cmdline_get<'c>(cmdline: &'c BTreeMap<String, String>, key: &str) -> &'c str {
  cmdline.get(key).map(String::as_str).unwrap_or("")
}

/// The `pch` object. Every property is the removal tag without a precompiled header.
fn pch_value<'a>(project: &Project, bff: &BffConf, extra: &str) -> Result<Value<'a>> {
  let conf   = bff.conf;
  let header = match &conf.settings.precompiled_header {
    Some(h) if !bff.sources.is_empty() => h,
    _                                  => return Ok(Value::object(|_: &str| Some(Value::from(REMOVE_LINE_TAG))))
  };

  let (input, create) = match bff.compiler.family {
    "msvc" => match platform::find_precompiled_source(project, conf)? {
      Some(source) => (relative_to(&source, &project.output_dir),
                       format!("\"%1\" /Fo\"%3\" /c /Yc\"{}\" /Fp\"%2\"", header)),
      None         => return Err(Error::unsupported(&project.name, conf.name.as_str(),
                                                    "precompiled header without precompiled source"))
    },
    _      => (relative_to(&project.source_root.join(header), &project.output_dir),
               "-x c++-header -c \"%1\" -o \"%2\"".to_string())
  };

  let output = [relative_to(&conf.intermediate_dir, &project.output_dir).as_str(), "/",
                conf.target.as_str(), ".pch"].concat();

  let options: Vec<&str> = [create.as_str(),
                            cmdline_get(&bff.cmdline, "Target"),
                            cmdline_get(&bff.cmdline, "CompilerOptions"),
                            extra,
                            cmdline_get(&bff.cmdline, "Defines"),
                            cmdline_get(&bff.cmdline, "IncludePaths")]
    .iter().cloned().filter(|s| is_set(s)).collect();
  let options = escape(&options.join(" "));
  let (input, output) = (escape(&input), escape(&output));

  Ok(Value::object(move |p: &str| match p {
    "input"   => Some(Value::from(input.clone())),
    "output"  => Some(Value::from(output.clone())),
    "options" => Some(Value::from(options.clone())),
    _         => None
  }))
}

fn compiler_value<'a>(compiler: BffCompiler) -> Value<'a> {
  let tool = move |path: &str| escape(&path.replace(ROOT_PATH_VAR, compiler.root));
  let (librarian, linker) = (tool(compiler.librarian), tool(compiler.linker));

  Value::object(move |p: &str| match p {
    "name"       => Some(Value::from(compiler.name)),
    "family"     => Some(Value::from(compiler.family)),
    "define"     => Some(Value::from(compiler.define)),
    "root"       => Some(Value::from(escape(compiler.root))),
    "executable" => Some(Value::from(escape(compiler.executable))),
    "librarian"  => Some(Value::from(librarian.clone())),
    "linker"     => Some(Value::from(linker.clone())),
    _            => None
  })
}

/// Aliases of the configuration's dependencies: the ones linked, then the ones
/// only built before it.
fn dependencies(ctx: &Context, project: &Project, conf: &Configuration) -> (Vec<String>, Vec<String>) {
  let mut linked   = Vec::new();
  let mut prebuild = Vec::new();

  for dep in &conf.dependencies {
    let owner = match &dep.project {
      None       => Some(project),
      Some(name) => ctx.find_project(name)
    };
    let found = owner.and_then(|p| p.configurations.iter().find(|c| {
      c.fastbuild && c.target == dep.target && c.name == conf.name && c.platform == conf.platform
    }));

    match found {
      Some(d) if is_linkable(d.output) && conf.output.is_linked() => {
        linked.push([d.bff_alias().as_str(), "_output"].concat())
      },
      Some(d) => prebuild.push(d.bff_alias()),
      None    => {
        warn!(project = %project.name, configuration = %conf.key(&project.name), dependency = %dep.target,
              "dependency has no matching FastBuild configuration, skipped");
      }
    }
  }
  (linked, prebuild)
}

fn write_configuration(ctx: &Context, project: &Project, bff: &BffConf, out: &mut String) -> Result<()> {
  let conf    = bff.conf;
  let alias   = conf.bff_alias();
  let objects = [alias.as_str(), "_objects"].concat();
  let output  = [alias.as_str(), "_output"].concat();

  let (mut linked, prebuild) = dependencies(ctx, project, conf);
  let has_objects = !bff.sources.is_empty();
  if has_objects {
    linked.insert(0, objects.clone());
  }

  let section = link_section(conf.output);
  if section.is_some() && conf.output != OutputType::Lib && linked.is_empty() {
    return Err(Error::unsupported(&project.name, conf.name.as_str(), "nothing to link"));
  }

  let targets = match (section, has_objects) {
    (Some(_), _)     => vec![output],
    (None,    true)  => vec![objects.clone()],
    (None,    false) => prebuild.clone()
  };
  if targets.is_empty() {
    warn!(project = %project.name, configuration = %conf.key(&project.name), "nothing to build, skipped");
    return Ok(());
  }

  let extra    = extra_options(&bff.cmdline);
  let file     = match platform::output_file_name(conf) {
    Some(f) => [cmdline_get(&bff.cmdline, "OutputDirectory"), "/", f.as_str()].concat(),
    None    => REMOVE_LINE_TAG.to_string()
  };
  let cmdline: BTreeMap<String, String> = bff.cmdline.iter().map(|(k, v)| (k.clone(), escape(v))).collect();
  let values   = [
    ("alias",     alias.clone()),
    ("section",   section.unwrap_or(REMOVE_LINE_TAG).to_string()),
    ("extra",     escape(&extra)),
    ("sources",   bff_list(&bff.sources)),
    ("output",    escape(&file)),
    ("objects",   bff_list(&[objects])),
    ("libraries", bff_list(&linked)),
    ("prebuild",  bff_list(&prebuild)),
    ("targets",   bff_list(&targets))
  ];
  let values: BTreeMap<String, String> = values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
  let pch = pch_value(project, bff, &extra)?;

  let resolver  = Resolver::new();
  let _cmdline  = resolver.declare("cmdline", &cmdline);
  let _conf     = resolver.declare("conf", &values);
  let _compiler = resolver.declare("compiler", compiler_value(bff.compiler));
  let _pch      = resolver.declare("pch", pch);

  out.push_str(&resolver.resolve(BFF_PLATFORM_BEGIN)?);
  if has_objects {
    out.push_str(&resolver.resolve(BFF_OBJECT_LIST)?);
  }
  match conf.output {
    OutputType::Lib  => out.push_str(&resolver.resolve(BFF_LIBRARY)?),
    OutputType::None => {},
    _                => out.push_str(&resolver.resolve(BFF_LINK)?)
  }
  out.push_str(&resolver.resolve(BFF_ALIAS)?);
  out.push_str(&resolver.resolve(BFF_PLATFORM_END)?);
  Ok(())
}

fn write_project_bff(ctx: &Context, project: &Project, confs: &[BffConf]) -> Result<String> {
  let mut masters: Vec<String> = Vec::new();
  for bff in confs {
    for m in ctx.masters.get(&bff.conf.key(&project.name)).into_iter().flatten() {
      let m = relative_to(m, &project.output_dir);
      if !masters.contains(&m) {
        masters.push(m);
      }
    }
  }
  if masters.is_empty() {
    warn!(project = %project.name, "not included by any master bff");
  }

  let mut out = {
    let resolver = Resolver::new();
    let _project = resolver.declare("project", project.name.as_str());
    let _masters = resolver.declare("masters", match masters.is_empty() {
      true  => REMOVE_LINE_TAG.to_string(),
      false => masters.join(", ")
    });
    resolver.resolve(BFF_HEADER)?
  };

  for bff in confs {
    write_configuration(ctx, project, bff, &mut out)?;
  }
  Ok(remove_tagged_lines(&out))
}

/// Projects of a solution with a bff of their own, in solution order.
fn master_members<'a>(ctx: &Context<'a>, solution: &Solution) -> Vec<&'a Project> {
  let mut members: Vec<&Project> = Vec::new();
  for entry in &solution.projects {
    match ctx.find_project(&entry.project) {
      Some(p) if p.fastbuild_all || !p.configurations.iter().any(|c| c.fastbuild) => {},
      Some(p) if members.iter().any(|m| m.name == p.name) => {},
      Some(p) => members.push(p),
      None    => warn!(solution = %solution.name, project = %entry.project, "unknown project, skipped")
    }
  }
  members
}

fn write_master_bff(ctx: &Context, solution: &Solution, members: &[&Project]) -> Result<String> {
  let mut compilers: Vec<BffCompiler> = Vec::new();
  let mut aliases:   Vec<String>      = Vec::new();
  let mut includes:  Vec<PathBuf>     = Vec::new();

  for project in members {
    for bff in bff_configurations(ctx, project)? {
      if !compilers.iter().any(|c| c.name == bff.compiler.name) {
        compilers.push(bff.compiler);
      }
      aliases.push(bff.conf.bff_alias());
    }
    includes.push(project.bff_path());
  }

  let resolver  = Resolver::new();
  let _solution = resolver.declare("solution", solution.name.as_str());
  let mut out   = resolver.resolve(MASTER_HEADER)?;

  for compiler in compilers {
    let _compiler = resolver.declare("compiler", compiler_value(compiler));
    out.push_str(&resolver.resolve(MASTER_COMPILER)?);
  }

  out.push_str(&resolver.resolve(MASTER_PROJECTS)?);
  for path in &includes {
    let _path = resolver.declare("path", relative_to(path, &solution.output_dir));
    out.push_str(&resolver.resolve(MASTER_INCLUDE)?);
  }

  let _targets = resolver.declare("targets", bff_list(&aliases));
  out.push_str(&resolver.resolve(MASTER_ALL)?);
  Ok(remove_tagged_lines(&out))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{Dependency, SolutionProject};
  use crate::uid::IdGenerator;
  use pretty_assertions::assert_eq;

  fn project(name: &str, files: &[&str], confs: Vec<Configuration>) -> Project {
    let mut p = Project::new(name, PathBuf::from("/work").join(name), PathBuf::from("/work/build"));
    p.files = files.iter().map(|f| p.source_root.join(f)).collect();
    p.configurations = confs;
    p
  }

  fn conf(target: &str, platform: PlatformType, output: OutputType) -> Configuration {
    let mut c = Configuration::new("Debug", target, platform, output);
    c.fastbuild = true;
    c
  }

  fn solution(names: &[&str]) -> Solution {
    Solution {
      name:       "game".to_string(),
      output_dir: PathBuf::from("/work/build"),
      projects:   names.iter().map(|n| SolutionProject { project: n.to_string(), folder: String::new() }).collect(),
      master_bff: true
    }
  }

  fn with_context<F>(projects: &[Project], solutions: &[Solution], f: F) where F: FnOnce(&Context) {
    let ids       = IdGenerator::new();
    let platforms = platform::init();
    let masters   = master_index(projects, solutions);
    let ctx = Context { ids: &ids, platforms: &platforms, projects, masters: &masters };
    f(&ctx)
  }

  fn project_bff(ctx: &Context, p: &Project) -> String {
    let confs = bff_configurations(ctx, p).unwrap();
    write_project_bff(ctx, p, &confs).unwrap()
  }

  #[test]
  fn index_maps_configurations_to_masters() {
    let mut vs = conf("app", PlatformType::Windows, OutputType::Exe);
    vs.fastbuild = false;
    let p = project("app", &["main.cpp"], vec![conf("app", PlatformType::Linux, OutputType::Exe), vs]);

    let mut other = solution(&["app"]);
    other.name = "tools".to_string();
    let mut plain = solution(&["app"]);
    plain.master_bff = false;

    let index = master_index(&[p], &[solution(&["app", "app"]), other, plain]);
    assert_eq!(index.len(), 1);
    assert_eq!(index["app/app/Debug/Linux"], vec![PathBuf::from("/work/build/game.bff"),
                                                  PathBuf::from("/work/build/tools.bff")]);
  }

  #[test]
  fn executable_linking_a_library() {
    let mut exe = conf("app", PlatformType::Linux, OutputType::Exe);
    exe.dependencies = vec![Dependency::parse("core/core")];
    let app  = project("app", &["main.cpp", "app.h", "ios.mm"], vec![exe]);
    let core = project("core", &["core.cpp"], vec![conf("core", PlatformType::Linux, OutputType::Lib)]);
    let projects = [app, core];

    with_context(&projects, &[solution(&["app", "core"])], |ctx| {
      let text = project_bff(ctx, &projects[0]);
      assert!(text.starts_with("// FastBuild configurations of app.\n// Included by game.bff.\n"));
      assert!(text.contains("#if LINUX\n"));
      assert!(text.contains("ObjectList('app_Debug_Linux_objects')\n"));
      assert!(text.contains("    .CompilerInputFiles     = { '../app/main.cpp' }\n"));
      assert!(text.contains("    .CompilerOutputPath     = 'obj/Debug/'\n"));
      assert!(text.contains("Executable('app_Debug_Linux_output')\n"));
      assert!(text.contains("    .LinkerOutput           = 'bin/Debug/app'\n"));
      assert!(text.contains("    .Libraries              = {\n"));
      assert!(text.contains("'app_Debug_Linux_objects',\n"));
      assert!(text.contains("'core_Debug_Linux_output',\n"));
      assert!(text.contains("Alias('app_Debug_Linux')\n"));
      assert!(!text.contains("PCH"));
      assert!(!text.contains("PreBuildDependencies"));
      assert!(!text.contains(REMOVE_LINE_TAG));

      let text = project_bff(ctx, &projects[1]);
      assert!(text.contains("Library('core_Debug_Linux_output')\n"));
      assert!(text.contains("    .LibrarianOutput        = 'bin/Debug/libcore.a'\n"));
      assert!(text.contains("    .LibrarianAdditionalInputs = { 'core_Debug_Linux_objects' }\n"));
    });
  }

  #[test]
  fn precompiled_header_with_clang() {
    let mut c = conf("app", PlatformType::Linux, OutputType::Exe);
    c.settings.precompiled_header = Some("pch.h".to_string());
    let p = project("app", &["main.cpp"], vec![c]);

    with_context(&[], &[], |ctx| {
      let text = project_bff(ctx, &p);
      assert!(text.contains("    .PCHInputFile           = '../app/pch.h'\n"));
      assert!(text.contains("    .PCHOutputFile          = 'obj/Debug/app.pch'\n"));
      assert!(text.contains("    .PCHOptions             = '-x c++-header -c \"%1\" -o \"%2\""));
      assert!(text.contains("+ ' -include-pch \"$PCHOutputFile$\" -include \"../app/pch.h\"'\n"));
      assert!(!text.contains("Included by"));
    });
  }

  #[test]
  fn missing_dependencies_are_skipped() {
    let mut exe = conf("app", PlatformType::Linux, OutputType::Exe);
    exe.dependencies = vec![Dependency::parse("missing/lib"), Dependency::parse("tool")];
    let mut tool = conf("tool", PlatformType::Linux, OutputType::Exe);
    tool.dependencies.clear();
    let p = project("app", &["main.cpp", "tool.cpp"], vec![exe, tool]);

    with_context(&[], &[], |ctx| {
      let text = project_bff(ctx, &p);
      assert!(text.contains("    .Libraries              = { 'app_Debug_Linux_objects' }\n"));
      assert!(text.contains("    .PreBuildDependencies   = { 'tool_Debug_Linux' }\n"));
    });
  }

  #[test]
  fn unsupported_configurations() {
    let lib = project("core", &["core.h"], vec![conf("core", PlatformType::Linux, OutputType::Lib)]);
    let exe = project("app", &[], vec![conf("app", PlatformType::Linux, OutputType::Exe)]);

    with_context(&[], &[], |ctx| {
      assert!(matches!(bff_configurations(ctx, &lib), Err(Error::Unsupported { .. })));

      let confs = bff_configurations(ctx, &exe).unwrap();
      assert!(matches!(write_project_bff(ctx, &exe, &confs), Err(Error::Unsupported { .. })));
    });
  }

  #[test]
  fn master_bff() {
    let mut all = project("all", &[], vec![conf("all", PlatformType::Windows, OutputType::None)]);
    all.fastbuild_all = true;
    let projects = [
      project("app",  &["main.cpp"], vec![conf("app", PlatformType::Windows, OutputType::Exe),
                                          conf("app", PlatformType::Linux,   OutputType::Exe)]),
      project("core", &["core.cpp"], vec![conf("core", PlatformType::Windows, OutputType::Lib)]),
      all
    ];
    let sln = solution(&["app", "core", "all", "unknown"]);

    with_context(&projects, &[sln.clone()], |ctx| {
      let text = write_master_bff(ctx, &sln, &master_members(ctx, &sln)).unwrap();
      assert!(text.starts_with("// Master FastBuild file of game.\n"));
      assert!(text.contains("#define WIN32\nCompiler('MSVC')\n"));
      assert!(text.contains("    .Executable             = '$ExecutableRootPath$/cl.exe'\n"));
      assert!(text.contains("#define LINUX\nCompiler('Clang-Linux')\n"));
      assert!(text.contains("#include \"app.bff\"\n#include \"core.bff\"\n\n"));
      assert!(!text.contains("all.bff"));
      assert!(text.contains(concat!(
        "Alias('All')\n",
        "{\n",
        "    .Targets                = {\n",
        "                                  'app_Debug_Windows',\n",
        "                                  'app_Debug_Linux',\n",
        "                                  'core_Debug_Windows',\n",
        "                              }\n",
        "}\n")));
    });
  }

  #[test]
  fn escapes_quotes() {
    assert_eq!(escape("-DNAME='x'"), "-DNAME=^'x^'");
    assert_eq!(bff_list(&["a'b".to_string()]), "{ 'a^'b' }");
    assert_eq!(bff_list(&[]), REMOVE_LINE_TAG);
  }
}
