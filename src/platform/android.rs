use crate::ctx::{self, Architecture, BffCompiler, Configuration, PlatformType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::{clang_cmdline, clang_msbuild_options, find_precompiled_source, CLANG_ITEM_DEFINITIONS};

pub struct Android;

/// Used when the configuration doesn't name an API level.
const DEFAULT_API_LEVEL: u8 = 21;

const GLOBALS: &str = concat!(
  "    <Keyword>Android</Keyword>\n",
  "    <ApplicationType>Android</ApplicationType>\n",
  "    <ApplicationTypeRevision>3.0</ApplicationTypeRevision>\n"
);

const CONFIGURATION: &str = concat!(
  "    <UseDebugLibraries>[options.UseDebugLibraries]</UseDebugLibraries>\n",
  "    <PlatformToolset>[options.PlatformToolset]</PlatformToolset>\n",
  "    <AndroidAPILevel>[options.AndroidAPILevel]</AndroidAPILevel>\n",
  "    <UseOfStl>[options.UseOfStl]</UseOfStl>\n"
);

const COMPILER: BffCompiler = BffCompiler {
  name:       "Clang-Android",
  family:     "clang",
  root:       "/opt/android-ndk/toolchains/llvm/prebuilt/linux-x86_64/bin",
  executable: "$ExecutableRootPath$/clang++",
  librarian:  "$ExecutableRootPath$/llvm-ar",
  linker:     "$ExecutableRootPath$/clang++",
  define:     "ANDROID"
};

impl ctx::Platform for Android {
  fn get_platform_type(&self) -> PlatformType {
    PlatformType::Android
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

    let level = conf.settings.android_target_api_level.unwrap_or(DEFAULT_API_LEVEL);
    let mut o = ResolvedOptions::default();
    clang_msbuild_options(&mut o, project, conf);
    o.set("PlatformToolset", "Clang_5_0");
    o.set("AndroidAPILevel", format!("android-{}", level));
    o.set("UseOfStl",        "c++_static");

    clang_cmdline(&mut o, project, conf);
    o.set_cmdline("Target", format!("--target={}-linux-android{}", match conf.architecture {
      Architecture::ARM   => "armv7a",
      Architecture::ARM64 => "aarch64",
      Architecture::X86   => "i686",
      Architecture::X64   => "x86_64"
    }, level));
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

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{OutputType, Platform, Settings};

  #[test]
  fn api_level_and_target() {
    let p = Project::new("hello", "/work".into(), "/work/build".into());
    let mut conf = Configuration::new("Debug", "hello", PlatformType::Android, OutputType::Dll);
    conf.architecture = Architecture::ARM64;
    conf.settings = Settings {
      android_target_api_level: Some(24),
      libs:                     vec!["log".to_string()],
      ..Settings::debug()
    };

    let o = Android.resolve_options(&p, &conf).unwrap();
    assert_eq!(o.get("AndroidAPILevel"), Some("android-24"));
    assert_eq!(o.get("Optimization"), Some("Disabled"));
    assert_eq!(o.get("WarningLevel"), Some("EnableAllWarnings"));
    assert_eq!(o.get("AdditionalDependencies"), Some("log;%(LibraryDependencies)"));
    assert_eq!(o.cmdline["Target"], "--target=aarch64-linux-android24");
  }
}
