use crate::ctx::{self, Architecture, BffCompiler, Configuration, PlatformType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::{clang_cmdline, clang_msbuild_options, find_precompiled_source, CLANG_ITEM_DEFINITIONS};

pub struct Linux;

const GLOBALS: &str = concat!(
  "    <Keyword>Linux</Keyword>\n",
  "    <ApplicationType>Linux</ApplicationType>\n",
  "    <ApplicationTypeRevision>1.0</ApplicationTypeRevision>\n",
  "    <TargetLinuxPlatform>Generic</TargetLinuxPlatform>\n",
  "    <LinuxProjectType>{D51BCBC9-82E9-4017-911E-C93873C4EA2B}</LinuxProjectType>\n"
);

const CONFIGURATION: &str = concat!(
  "    <UseDebugLibraries>[options.UseDebugLibraries]</UseDebugLibraries>\n",
  "    <PlatformToolset>[options.PlatformToolset]</PlatformToolset>\n"
);

const COMPILER: BffCompiler = BffCompiler {
  name:       "Clang-Linux",
  family:     "clang",
  root:       "/usr/bin",
  executable: "$ExecutableRootPath$/clang++",
  librarian:  "$ExecutableRootPath$/ar",
  linker:     "$ExecutableRootPath$/clang++",
  define:     "LINUX"
};

impl ctx::Platform for Linux {
  fn get_platform_type(&self) -> PlatformType {
    PlatformType::Linux
  }

  fn supports_architecture(&self, a: Architecture) -> bool {
    match a {
      Architecture::ARM   => true,
      Architecture::ARM64 => true,
      Architecture::X86   => true,
      Architecture::X64   => true
    }
  }

  fn resolve_options(&self, project: &Project, conf: &Configuration) -> Result<ResolvedOptions> {
    find_precompiled_source(project, conf)?;

    let mut o = ResolvedOptions::default();
    clang_msbuild_options(&mut o, project, conf);
    o.set("PlatformToolset", "Remote_Clang_1_0");

    clang_cmdline(&mut o, project, conf);
    Ok(o)
  }

  fn vcxproj_platform(&self, a: Architecture) -> Option<&'static str> {
    match a {
      Architecture::X86   => Some("x86"),
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
    CLANG_ITEM_DEFINITIONS
  }

  fn bff_compiler(&self) -> Option<BffCompiler> {
    Some(COMPILER)
  }
}
