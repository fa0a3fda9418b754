use crate::ctx::{self, relative_to, Architecture, BffCompiler, CXXStandard, Configuration, Optimize,
                 OutputType, PlatformType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::{find_precompiled_source, flag, msbuild_list, msbuild_options, project_dirs};
use crate::resolver::REMOVE_LINE_TAG;

pub struct Windows;

const GLOBALS: &str = concat!(
  "    <Keyword>Win32Proj</Keyword>\n",
  "    <WindowsTargetPlatformVersion>10.0</WindowsTargetPlatformVersion>\n"
);

const CONFIGURATION: &str = concat!(
  "    <UseDebugLibraries>[options.UseDebugLibraries]</UseDebugLibraries>\n",
  "    <PlatformToolset>[options.PlatformToolset]</PlatformToolset>\n",
  "    <CharacterSet>[options.CharacterSet]</CharacterSet>\n"
);

const ITEM_DEFINITIONS: &str = concat!(
  "    <ClCompile>\n",
  "      <WarningLevel>[options.WarningLevel]</WarningLevel>\n",
  "      <TreatWarningAsError>[options.TreatWarningAsError]</TreatWarningAsError>\n",
  "      <Optimization>[options.Optimization]</Optimization>\n",
  "      <PreprocessorDefinitions>[options.PreprocessorDefinitions]</PreprocessorDefinitions>\n",
  "      <AdditionalIncludeDirectories>[options.AdditionalIncludeDirectories]</AdditionalIncludeDirectories>\n",
  "      <ExceptionHandling>[options.ExceptionHandling]</ExceptionHandling>\n",
  "      <RuntimeTypeInfo>[options.RuntimeTypeInfo]</RuntimeTypeInfo>\n",
  "      <LanguageStandard>[options.LanguageStandard]</LanguageStandard>\n",
  "      <PrecompiledHeader>[options.PrecompiledHeader]</PrecompiledHeader>\n",
  "      <PrecompiledHeaderFile>[options.PrecompiledHeaderFile]</PrecompiledHeaderFile>\n",
  "      <AdditionalOptions>[options.AdditionalOptions]</AdditionalOptions>\n",
  "    </ClCompile>\n",
  "    <Link>\n",
  "      <SubSystem>[options.SubSystem]</SubSystem>\n",
  "      <GenerateDebugInformation>[options.GenerateDebugInformation]</GenerateDebugInformation>\n",
  "      <AdditionalLibraryDirectories>[options.AdditionalLibraryDirectories]</AdditionalLibraryDirectories>\n",
  "      <AdditionalDependencies>[options.AdditionalDependencies]</AdditionalDependencies>\n",
  "      <AdditionalOptions>[options.LinkerAdditionalOptions]</AdditionalOptions>\n",
  "    </Link>\n"
);

const COMPILER: BffCompiler = BffCompiler {
  name:       "MSVC",
  family:     "msvc",
  root:       "C:/Program Files (x86)/Microsoft Visual Studio/2019/BuildTools/VC/Tools/MSVC/14.29.30133/bin/Hostx64/x64",
  executable: "$ExecutableRootPath$/cl.exe",
  librarian:  "$ExecutableRootPath$/lib.exe",
  linker:     "$ExecutableRootPath$/link.exe",
  define:     "WIN32"
};

fn library_name(lib: &str) -> String {
  match lib.contains('.') {
    true  => lib.to_string(),
    false => [lib, ".lib"].concat()
  }
}

fn msvc_cmdline(o: &mut ResolvedOptions, project: &Project, conf: &Configuration) {
  let s = &conf.settings;
  let mut compiler: Vec<&str> = vec!["/nologo"];

  compiler.push(match s.optimize {
    None | Some(Optimize::None) => "/Od",
    Some(Optimize::Size)        => "/O1",
    Some(Optimize::Speed)       => "/O2",
    Some(Optimize::Full)        => "/Ox"
  });
  compiler.extend(match s.cxx_standard {
    Some(CXXStandard::CXX14) => Some("/std:c++14"),
    Some(CXXStandard::CXX17) => Some("/std:c++17"),
    Some(CXXStandard::CXX20) => Some("/std:c++latest"),
    _                        => None
  });
  compiler.extend(flag(s.enable_exceptions, "/EHsc", "/EHs-c-"));
  compiler.extend(flag(s.enable_rtti, "/GR", "/GR-"));
  compiler.extend(flag(s.omit_frame_pointer, "/Oy", "/Oy-"));
  compiler.extend(match s.warning_level {
    Some(0) => Some("/W0"),
    Some(1) => Some("/W1"),
    Some(2) => Some("/W2"),
    Some(3) => Some("/W3"),
    Some(_) => Some("/W4"),
    None    => None
  });
  if s.warning_as_error == Some(true) {
    compiler.push("/WX");
  }
  compiler.extend(s.compiler_options.iter().map(String::as_str));

  let defines: Vec<String> = s.defines.iter().map(|d| format!("/D\"{}\"", d)).collect();
  let includes: Vec<String> = project_dirs(project, &s.include_dirs).iter()
    .map(|d| format!("/I\"{}\"", d))
    .collect();

  let mut linker: Vec<String> = vec!["/NOLOGO".to_string()];
  linker.extend(project_dirs(project, &s.lib_dirs).iter().map(|d| format!("/LIBPATH:\"{}\"", d)));
  linker.extend(s.libs.iter().map(|l| library_name(l)));
  linker.extend(s.linker_options.iter().cloned());
  if conf.output == OutputType::Dll {
    linker.push("/DLL".to_string());
  }

  o.set_cmdline("CompilerOptions",  compiler.join(" "));
  o.set_cmdline("Defines",          defines.join(" "));
  o.set_cmdline("IncludePaths",     includes.join(" "));
  o.set_cmdline("LinkerOptions",    linker.join(" "));
  o.set_cmdline("LibrarianOptions", "/NOLOGO /OUT:\"%2\" \"%1\"");
  o.set_cmdline("PchOptions", match &s.precompiled_header {
    Some(h) => format!("/Yu\"{}\" /Fp\"$PCHOutputFile$\"", h),
    None    => REMOVE_LINE_TAG.to_string()
  });
  o.set_cmdline("Target",           REMOVE_LINE_TAG);
  o.set_cmdline("CompileIO",        "/c \"%1\" /Fo\"%2\"");
  o.set_cmdline("LinkIO",           "\"%1\" /OUT:\"%2\"");
  o.set_cmdline("IntermediateDirectory", relative_to(&conf.intermediate_dir, &project.output_dir));
  o.set_cmdline("OutputDirectory",       relative_to(&conf.target_dir, &project.output_dir));
}

impl ctx::Platform for Windows {
  fn get_platform_type(&self) -> PlatformType {
    PlatformType::Windows
  }

  fn supports_architecture(&self, a: Architecture) -> bool {
    match a {
      Architecture::ARM   => false,
      Architecture::ARM64 => true,
      Architecture::X86   => true,
      Architecture::X64   => true
    }
  }

  fn resolve_options(&self, project: &Project, conf: &Configuration) -> Result<ResolvedOptions> {
    find_precompiled_source(project, conf)?;

    let s = &conf.settings;
    let mut o = ResolvedOptions::default();
    msbuild_options(&mut o, project, conf);

    o.set("PlatformToolset", "v142");
    o.set("CharacterSet",    "Unicode");
    o.set("WarningLevel", match s.warning_level {
      Some(0) => "TurnOffAllWarnings",
      Some(1) => "Level1",
      Some(2) => "Level2",
      Some(3) => "Level3",
      Some(_) => "Level4",
      None    => REMOVE_LINE_TAG
    });
    o.set("Optimization", match s.optimize {
      None | Some(Optimize::None) => "Disabled",
      Some(Optimize::Size)        => "MinSpace",
      Some(Optimize::Speed)       => "MaxSpeed",
      Some(Optimize::Full)        => "Full"
    });
    o.set("ExceptionHandling", flag(s.enable_exceptions, "Sync", "false").unwrap_or(REMOVE_LINE_TAG));
    o.set("LanguageStandard", match s.cxx_standard {
      Some(CXXStandard::CXX14) => "stdcpp14",
      Some(CXXStandard::CXX17) => "stdcpp17",
      Some(CXXStandard::CXX20) => "stdcpplatest",
      _                        => REMOVE_LINE_TAG
    });

    let libs: Vec<String> = s.libs.iter().map(|l| library_name(l)).collect();
    o.set("AdditionalDependencies", msbuild_list(&libs, "%(AdditionalDependencies)"));
    o.set("SubSystem", match conf.output {
      OutputType::App => "Windows",
      _               => "Console"
    });
    o.set("GenerateDebugInformation", "true");

    msvc_cmdline(&mut o, project, conf);
    Ok(o)
  }

  fn vcxproj_platform(&self, a: Architecture) -> Option<&'static str> {
    match a {
      Architecture::X86   => Some("Win32"),
      Architecture::X64   => Some("x64"),
      Architecture::ARM   => Some("ARM"),
      Architecture::ARM64 => Some("ARM64")
    }
  }

  fn vcxproj_globals(&self) -> &'static str {
    GLOBALS
  }

  fn vcxproj_configuration(&self) -> &'static str {
    CONFIGURATION
  }

  fn vcxproj_item_definitions(&self) -> &'static str {
    ITEM_DEFINITIONS
  }

  fn bff_compiler(&self) -> Option<BffCompiler> {
    Some(COMPILER)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{Platform, Settings};

  #[test]
  fn release_options() {
    let p = Project::new("hello", "/work".into(), "/work/build".into());
    let mut conf = Configuration::new("Release", "hello", PlatformType::Windows, OutputType::App);
    conf.settings = Settings {
      cxx_standard: Some(CXXStandard::CXX17),
      libs:         vec!["user32".to_string(), "d3d11.lib".to_string()],
      ..Settings::release()
    };

    let o = Windows.resolve_options(&p, &conf).unwrap();
    assert_eq!(o.get("Optimization"), Some("Full"));
    assert_eq!(o.get("UseDebugLibraries"), Some("false"));
    assert_eq!(o.get("LanguageStandard"), Some("stdcpp17"));
    assert_eq!(o.get("PreprocessorDefinitions"), Some("NDEBUG;%(PreprocessorDefinitions)"));
    assert_eq!(o.get("AdditionalDependencies"), Some("user32.lib;d3d11.lib;%(AdditionalDependencies)"));
    assert_eq!(o.get("SubSystem"), Some("Windows"));
    assert_eq!(o.get("PrecompiledHeader"), Some("NotUsing"));
    assert_eq!(o.cmdline["CompilerOptions"], "/nologo /Ox /std:c++17 /Oy /W3 /WX");
    assert_eq!(o.cmdline["Defines"], "/D\"NDEBUG\"");
  }
}
