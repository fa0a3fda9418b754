mod android;
mod apple;
mod ios;
mod linux;
mod macos;
mod tvos;
mod watchos;
mod windows;

use std::path::PathBuf;

use crate::ctx::{relative_to, CXXStandard, Configuration, Optimize, OutputType, Platform, PlatformType, Platforms,
                 Project, ResolvedOptions};
use crate::error::{Error, Result};
use crate::resolver::REMOVE_LINE_TAG;

pub fn init() -> Platforms {
  let platforms: Platforms = vec!(
    Box::new(windows::Windows),
    Box::new(linux::Linux),
    Box::new(macos::MacOS),
    Box::new(ios::IOS),
    Box::new(tvos::TVOS),
    Box::new(watchos::WatchOS),
    Box::new(android::Android)
  );

  for (i, p) in platforms.iter().enumerate() {
    let t = p.get_platform_type();
    assert!(t as usize == i, "Platform type mismatch for {:?}: got {} but expected {}",
            t, t as usize, i);
  }

  platforms
}

/// The platform's options with the configuration's raw overrides layered on top.
pub fn resolve(platform: &dyn Platform, project: &Project, conf: &Configuration) -> Result<ResolvedOptions> {
  let mut options = platform.resolve_options(project, conf)?;
  for (k, v) in &conf.options {
    options.set(k, v.as_str());
  }
  Ok(options)
}

/// Locates the source file compiling the precompiled header, looking in the
/// source root then in every include directory.
pub fn find_precompiled_source(project: &Project, conf: &Configuration) -> Result<Option<PathBuf>> {
  let source = match &conf.settings.precompiled_source {
    Some(s) => s,
    None    => return Ok(None)
  };

  let mut searched = vec![project.source_root.clone()];
  searched.extend(conf.settings.include_dirs.iter().map(|d| project.source_root.join(d)));

  match searched.iter().map(|dir| dir.join(source)).find(|p| p.is_file()) {
    Some(p) => Ok(Some(p)),
    None    => Err(Error::MissingResource {
      name: format!("precompiled header source '{}' of {}", source, conf.key(&project.name)),
      searched
    })
  }
}

/// The file a configuration links, `None` when it produces nothing linkable.
pub fn output_file_name(conf: &Configuration) -> Option<String> {
  let t = conf.target.as_str();
  let name = match (conf.platform, conf.output) {
    (_, OutputType::None)                    => return None,
    (PlatformType::Windows, OutputType::Lib) => [t, ".lib"].concat(),
    (PlatformType::Windows, OutputType::Dll) => [t, ".dll"].concat(),
    (PlatformType::Windows, _)               => [t, ".exe"].concat(),
    (p, OutputType::Dll) if p.is_apple()     => ["lib", t, ".dylib"].concat(),
    (_, OutputType::Lib)                     => ["lib", t, ".a"].concat(),
    (_, OutputType::Dll)                     => ["lib", t, ".so"].concat(),
    _                                        => t.to_string()
  };
  Some(name)
}

pub(crate) fn is_debug(conf: &Configuration) -> bool {
  conf.settings.optimize.unwrap_or(Optimize::None) == Optimize::None
}

/// Include or library directories, relative to the project's output directory.
pub(crate) fn project_dirs(project: &Project, dirs: &[String]) -> Vec<String> {
  dirs.iter()
    .map(|d| relative_to(&project.source_root.join(d), &project.output_dir))
    .collect()
}

pub(crate) fn yes_no(b: Option<bool>) -> &'static str {
  match b {
    Some(true)  => "YES",
    Some(false) => "NO",
    None        => REMOVE_LINE_TAG
  }
}

pub(crate) fn flag<'a>(b: Option<bool>, on: &'a str, off: &'a str) -> Option<&'a str> {
  b.map(|b| match b { true => on, false => off })
}

fn quote_arg(s: &str) -> String {
  ["\"", s, "\""].concat()
}

/// Command lines shared by every clang based platform.
pub(crate) fn clang_cmdline(options: &mut ResolvedOptions, project: &Project, conf: &Configuration) {
  let s = &conf.settings;
  let mut compiler: Vec<String> = Vec::new();

  compiler.push(match s.optimize {
    None | Some(Optimize::None) => "-O0",
    Some(Optimize::Size)        => "-Os",
    Some(Optimize::Speed)       => "-O2",
    Some(Optimize::Full)        => "-O3"
  }.to_string());

  if let Some(std) = s.cxx_standard {
    compiler.push(format!("-std=c++{:02}", std as u8));
  }
  compiler.extend(flag(s.enable_exceptions, "-fexceptions", "-fno-exceptions").map(String::from));
  compiler.extend(flag(s.enable_rtti, "-frtti", "-fno-rtti").map(String::from));
  compiler.extend(flag(s.omit_frame_pointer, "-fomit-frame-pointer", "-fno-omit-frame-pointer")
                    .map(String::from));
  match s.warning_level {
    Some(0)           => compiler.push("-w".to_string()),
    Some(1) | Some(2) => compiler.push("-Wall".to_string()),
    Some(_)           => compiler.push("-Wall -Wextra".to_string()),
    None              => {}
  }
  if s.warning_as_error == Some(true) {
    compiler.push("-Werror".to_string());
  }
  compiler.extend(s.compiler_options.iter().cloned());

  let defines: Vec<String> = s.defines.iter().map(|d| ["-D", quote_arg(d).as_str()].concat()).collect();
  let includes: Vec<String> = project_dirs(project, &s.include_dirs).iter()
    .map(|d| ["-I", quote_arg(d).as_str()].concat())
    .collect();

  let mut linker: Vec<String> = project_dirs(project, &s.lib_dirs).iter()
    .map(|d| ["-L", quote_arg(d).as_str()].concat())
    .collect();
  linker.extend(s.libs.iter().map(|l| ["-l", l.as_str()].concat()));
  linker.extend(s.linker_options.iter().cloned());

  options.set_cmdline("CompilerOptions", compiler.join(" "));
  options.set_cmdline("Defines",         defines.join(" "));
  options.set_cmdline("IncludePaths",    includes.join(" "));
  options.set_cmdline("LinkerOptions",   linker.join(" "));
  options.set_cmdline("LibrarianOptions", "rcs \"%2\" \"%1\"");
  options.set_cmdline("PchOptions", match &s.precompiled_header {
    Some(h) => format!("-include-pch \"$PCHOutputFile$\" -include {}",
                       quote_arg(&relative_to(&project.source_root.join(h), &project.output_dir))),
    None    => REMOVE_LINE_TAG.to_string()
  });
  options.set_cmdline("Target",           REMOVE_LINE_TAG);
  options.set_cmdline("CompileIO",        "-c \"%1\" -o \"%2\"");
  options.set_cmdline("LinkIO",           "\"%1\" -o \"%2\"");
  options.set_cmdline("IntermediateDirectory", relative_to(&conf.intermediate_dir, &project.output_dir));
  options.set_cmdline("OutputDirectory",       relative_to(&conf.target_dir, &project.output_dir));
}

/// Item definitions of the clang based MSBuild toolsets.
pub(crate) const CLANG_ITEM_DEFINITIONS: &str = concat!(
  "    <ClCompile>\n",
  "      <Optimization>[options.Optimization]</Optimization>\n",
  "      <WarningLevel>[options.WarningLevel]</WarningLevel>\n",
  "      <TreatWarningAsError>[options.TreatWarningAsError]</TreatWarningAsError>\n",
  "      <PreprocessorDefinitions>[options.PreprocessorDefinitions]</PreprocessorDefinitions>\n",
  "      <AdditionalIncludeDirectories>[options.AdditionalIncludeDirectories]</AdditionalIncludeDirectories>\n",
  "      <ExceptionHandling>[options.ExceptionHandling]</ExceptionHandling>\n",
  "      <RuntimeTypeInfo>[options.RuntimeTypeInfo]</RuntimeTypeInfo>\n",
  "      <CppLanguageStandard>[options.LanguageStandard]</CppLanguageStandard>\n",
  "      <PrecompiledHeader>[options.PrecompiledHeader]</PrecompiledHeader>\n",
  "      <PrecompiledHeaderFile>[options.PrecompiledHeaderFile]</PrecompiledHeaderFile>\n",
  "      <AdditionalOptions>[options.AdditionalOptions]</AdditionalOptions>\n",
  "    </ClCompile>\n",
  "    <Link>\n",
  "      <AdditionalLibraryDirectories>[options.AdditionalLibraryDirectories]</AdditionalLibraryDirectories>\n",
  "      <LibraryDependencies>[options.AdditionalDependencies]</LibraryDependencies>\n",
  "      <AdditionalOptions>[options.LinkerAdditionalOptions]</AdditionalOptions>\n",
  "    </Link>\n"
);

fn joined_or_tag(items: &[String], sep: &str) -> String {
  match items.is_empty() {
    true  => REMOVE_LINE_TAG.to_string(),
    false => items.join(sep)
  }
}

/// MSBuild options shared by every Visual Studio toolset.
pub(crate) fn msbuild_options(o: &mut ResolvedOptions, project: &Project, conf: &Configuration) {
  let s = &conf.settings;

  o.set("UseDebugLibraries", match is_debug(conf) { true => "true", false => "false" });
  o.set("TreatWarningAsError", flag(s.warning_as_error, "true", "false").unwrap_or(REMOVE_LINE_TAG));
  o.set("RuntimeTypeInfo",     flag(s.enable_rtti, "true", "false").unwrap_or(REMOVE_LINE_TAG));
  o.set("LinkIncremental",     flag(s.link_incremental, "true", "false").unwrap_or(REMOVE_LINE_TAG));

  o.set("PreprocessorDefinitions",      msbuild_list(&s.defines, "%(PreprocessorDefinitions)"));
  o.set("AdditionalIncludeDirectories", msbuild_list(&project_dirs(project, &s.include_dirs),
                                                     "%(AdditionalIncludeDirectories)"));
  o.set("AdditionalLibraryDirectories", msbuild_list(&project_dirs(project, &s.lib_dirs),
                                                     "%(AdditionalLibraryDirectories)"));
  o.set("AdditionalOptions",       joined_or_tag(&s.compiler_options, " "));
  o.set("LinkerAdditionalOptions", joined_or_tag(&s.linker_options, " "));

  match &s.precompiled_header {
    Some(h) => {
      o.set("PrecompiledHeader",     "Use");
      o.set("PrecompiledHeaderFile", h.as_str());
    },
    None    => {
      o.set("PrecompiledHeader",     "NotUsing");
      o.set("PrecompiledHeaderFile", REMOVE_LINE_TAG);
    }
  }
}

/// Clang toolset options of the Android and Linux Visual Studio extensions.
pub(crate) fn clang_msbuild_options(o: &mut ResolvedOptions, project: &Project, conf: &Configuration) {
  let s = &conf.settings;
  msbuild_options(o, project, conf);

  o.set("Optimization", match s.optimize {
    None | Some(Optimize::None) => "Disabled",
    Some(Optimize::Size)        => "MinSize",
    Some(Optimize::Speed)       => "MaxSpeed",
    Some(Optimize::Full)        => "Full"
  });
  o.set("WarningLevel", match s.warning_level {
    Some(0) => "TurnOffAllWarnings",
    Some(_) => "EnableAllWarnings",
    None    => REMOVE_LINE_TAG
  });
  o.set("ExceptionHandling", flag(s.enable_exceptions, "Enabled", "Disabled").unwrap_or(REMOVE_LINE_TAG));
  o.set("LanguageStandard", match s.cxx_standard {
    Some(CXXStandard::CXX03) => "c++98",
    Some(CXXStandard::CXX11) => "c++11",
    Some(CXXStandard::CXX14) => "c++1y",
    Some(CXXStandard::CXX17) => "c++1z",
    Some(CXXStandard::CXX20) => "c++2a",
    None                     => REMOVE_LINE_TAG
  });
  o.set("AdditionalDependencies", msbuild_list(&s.libs, "%(LibraryDependencies)"));
}

/// Preprocessor definitions in MSBuild list form.
pub(crate) fn msbuild_list(items: &[String], inherit: &str) -> String {
  let mut list = items.join(";");
  if !list.is_empty() {
    list.push(';');
  }
  list.push_str(inherit);
  list
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{OutputType, PlatformType, Settings};
  use std::fs;

  fn project(root: &std::path::Path) -> Project {
    Project::new("hello", root.to_path_buf(), root.join("build"))
  }

  #[test]
  fn registry_is_indexed_by_platform_type() {
    let platforms = init();
    assert_eq!(platforms.len(), 7);
    assert_eq!(platforms[PlatformType::WatchOS as usize].get_platform_type(), PlatformType::WatchOS);
  }

  #[test]
  fn precompiled_source_is_searched_in_include_dirs() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("include")).unwrap();
    fs::write(dir.path().join("include/pch.cpp"), "").unwrap();

    let p = project(dir.path());
    let mut conf = Configuration::new("Debug", "hello", PlatformType::Linux, OutputType::Exe);
    assert_eq!(find_precompiled_source(&p, &conf).unwrap(), None);

    conf.settings.precompiled_source = Some("pch.cpp".to_string());
    conf.settings.include_dirs       = vec!["include".to_string()];
    assert_eq!(find_precompiled_source(&p, &conf).unwrap(), Some(dir.path().join("include/pch.cpp")));

    conf.settings.precompiled_source = Some("missing.cpp".to_string());
    match find_precompiled_source(&p, &conf) {
      Err(Error::MissingResource { searched, .. }) => {
        assert_eq!(searched, vec![dir.path().to_path_buf(), dir.path().join("include")]);
      },
      other => panic!("expected a missing resource, got {:?}", other)
    }
  }

  #[test]
  fn overrides_are_layered_last() {
    let dir = tempfile::tempdir().unwrap();
    let p = project(dir.path());
    let mut conf = Configuration::new("Debug", "hello", PlatformType::MacOS, OutputType::Exe);
    conf.options.insert("SDKRoot".to_string(), "macosx10.15".to_string());
    let platforms = init();
    let options = resolve(&*platforms[PlatformType::MacOS as usize], &p, &conf).unwrap();
    assert_eq!(options.get("SDKRoot"), Some("macosx10.15"));
  }

  #[test]
  fn clang_command_lines() {
    let p = Project::new("hello", "/work".into(), "/work/build".into());
    let mut conf = Configuration::new("Release", "hello", PlatformType::Linux, OutputType::Exe);
    conf.settings = Settings {
      cxx_standard: Some(CXXStandard::CXX17),
      include_dirs: vec!["include".to_string()],
      libs:         vec!["m".to_string()],
      ..Settings::release()
    };

    let mut options = ResolvedOptions::default();
    clang_cmdline(&mut options, &p, &conf);
    assert_eq!(options.cmdline["CompilerOptions"],
               "-O3 -std=c++17 -fomit-frame-pointer -Wall -Wextra -Werror");
    assert_eq!(options.cmdline["Defines"], "-D\"NDEBUG\"");
    assert_eq!(options.cmdline["IncludePaths"], "-I\"../include\"");
    assert_eq!(options.cmdline["LinkerOptions"], "-lm");
    assert_eq!(options.cmdline["PchOptions"], REMOVE_LINE_TAG);
  }

  #[test]
  fn output_file_names() {
    let name = |platform, output| {
      output_file_name(&Configuration::new("Debug", "core", platform, output))
    };
    assert_eq!(name(PlatformType::Windows, OutputType::Lib).as_deref(), Some("core.lib"));
    assert_eq!(name(PlatformType::Windows, OutputType::App).as_deref(), Some("core.exe"));
    assert_eq!(name(PlatformType::Android, OutputType::Dll).as_deref(), Some("libcore.so"));
    assert_eq!(name(PlatformType::MacOS,   OutputType::Dll).as_deref(), Some("libcore.dylib"));
    assert_eq!(name(PlatformType::Linux,   OutputType::Exe).as_deref(), Some("core"));
    assert_eq!(name(PlatformType::Linux,   OutputType::None), None);
  }

  #[test]
  fn msbuild_lists() {
    assert_eq!(msbuild_list(&[], "%(PreprocessorDefinitions)"), "%(PreprocessorDefinitions)");
    assert_eq!(msbuild_list(&["A".to_string(), "B=1".to_string()], "%(X)"), "A;B=1;%(X)");
  }
}
