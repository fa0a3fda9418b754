//! Options shared by the Apple platforms. Each platform only differs by its
//! SDK and the devices it targets.

use crate::ctx::{relative_to, BffCompiler, CStandard, CXXStandard, Configuration, Optimize,
                 OutputType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::{clang_cmdline, find_precompiled_source, is_debug, project_dirs, yes_no};
use crate::resolver::{format_list, quote, REMOVE_LINE_TAG};

const LIST_INDENT: &str = "\t\t\t\t";

pub struct Sdk {
  pub root:             &'static str,
  pub path:             &'static str,
  pub deployment_key:   &'static str,
  pub device_family:    &'static str,
  pub default_identity: &'static str,
  /// Whether code is signed for a device, as opposed to the host.
  pub device:           bool,
  pub bitcode:          bool
}

pub const COMPILER: BffCompiler = BffCompiler {
  name:       "Clang-Apple",
  family:     "clang",
  root:       "/Applications/Xcode.app/Contents/Developer/Toolchains/XcodeDefault.xctoolchain/usr/bin",
  executable: "$ExecutableRootPath$/clang++",
  librarian:  "$ExecutableRootPath$/ar",
  linker:     "$ExecutableRootPath$/clang++",
  define:     "APPLE"
};

fn optional(value: &Option<String>) -> String {
  match value {
    Some(v) => quote(v, false).into_owned(),
    None    => REMOVE_LINE_TAG.to_string()
  }
}

fn optional_path(project: &Project, value: &Option<String>) -> String {
  match value {
    Some(v) => quote(&relative_to(&project.source_root.join(v), &project.output_dir), false).into_owned(),
    None    => REMOVE_LINE_TAG.to_string()
  }
}

pub fn resolve_options(sdk: &Sdk, project: &Project, conf: &Configuration) -> Result<ResolvedOptions> {
  find_precompiled_source(project, conf)?;

  let s     = &conf.settings;
  let x     = &conf.xcode;
  let debug = is_debug(conf);
  let yes   = |b: bool| yes_no(Some(b));

  let mut o = ResolvedOptions::default();

  // Project
  o.set("Archs",                       conf.architecture.to_str());
  o.set("ClangEnableModules",          "YES");
  o.set("StripDebugSymbolsDuringCopy", yes(!debug));
  o.set("DebugInformationFormat",      match debug {
    true  => "dwarf",
    false => "\"dwarf-with-dsym\""
  });
  o.set("EnableTestability",           yes(debug));
  o.set("GenerateDebuggingSymbols",    "YES");
  o.set("DeploymentTargetKey",         sdk.deployment_key);
  o.set("DeploymentTarget",            optional(&x.deployment_target));
  o.set("OnlyActiveArch",              yes(debug));
  o.set("SDKRoot",                     sdk.root);
  o.set("TargetedDeviceFamily",        match sdk.device_family.is_empty() {
    true  => REMOVE_LINE_TAG.to_string(),
    false => quote(sdk.device_family, true).into_owned()
  });
  o.set("ValidateProduct",             yes(!debug));

  // Language
  o.set("CppStandard", match s.cxx_standard {
    Some(CXXStandard::CXX03) => "\"c++03\"",
    Some(CXXStandard::CXX11) => "\"c++11\"",
    Some(CXXStandard::CXX14) => "\"c++14\"",
    Some(CXXStandard::CXX17) => "\"c++17\"",
    Some(CXXStandard::CXX20) => "\"c++20\"",
    None                     => REMOVE_LINE_TAG
  });
  o.set("CStandard", match s.c_standard {
    Some(CStandard::C89) => "c89",
    Some(CStandard::C99) => "c99",
    Some(CStandard::C11) => "c11",
    Some(CStandard::C17) => "c17",
    None                 => REMOVE_LINE_TAG
  });
  o.set("LibraryStandard",            "\"libc++\"");
  o.set("AutomaticReferenceCounting", "NO");
  o.set("CppExceptionHandling",       yes_no(s.enable_exceptions));
  o.set("RuntimeTypeInfo",            yes_no(s.enable_rtti));

  // Compiler
  o.set("OptimizationLevel", match s.optimize {
    Some(Optimize::None)  => "0",
    Some(Optimize::Size)  => "s",
    Some(Optimize::Speed) => "2",
    Some(Optimize::Full)  => "3",
    None                  => REMOVE_LINE_TAG
  });
  o.set("UsePrecompiledHeader",    yes_no(s.precompiled_header.as_ref().map(|_| true)));
  o.set("PrecompiledHeader",       optional_path(project, &s.precompiled_header));
  o.set("PreprocessorDefinitions", format_list(&s.defines, LIST_INDENT, false));
  o.set("TreatWarningsAsErrors",   yes_no(s.warning_as_error));
  o.set("WarnUnusedVariable",      yes_no(s.warning_level.map(|l| l >= 3)));
  o.set("IncludePaths",            format_list(&project_dirs(project, &s.include_dirs), LIST_INDENT, false));
  o.set("CompilerOptions",         format_list(&s.compiler_options, LIST_INDENT, false));

  // Linker
  let mut linker = s.linker_options.clone();
  linker.extend(s.libs.iter().map(|l| ["-l", l.as_str()].concat()));
  o.set("LibraryPaths",   format_list(&project_dirs(project, &s.lib_dirs), LIST_INDENT, false));
  o.set("LinkerOptions",  format_list(&linker, LIST_INDENT, false));
  o.set("FrameworkPaths", format_list(&project_dirs(project, &x.framework_paths), LIST_INDENT, false));
  o.set("DeadStripping",  yes(!debug));
  o.set("MachOType", match conf.output {
    OutputType::Lib    => "staticlib",
    OutputType::Dll    => "mh_dylib",
    OutputType::Bundle => "mh_bundle",
    _                  => REMOVE_LINE_TAG
  });
  o.set("ExecutablePrefix", match conf.output {
    OutputType::Lib | OutputType::Dll => "lib",
    _                                 => REMOVE_LINE_TAG
  });
  o.set("SkipInstall", match conf.output {
    OutputType::Lib | OutputType::Dll | OutputType::Framework => "YES",
    _                                                        => "NO"
  });
  o.set("StripInstalledProduct", yes(!debug));
  o.set("EnableBitcode",         yes(sdk.bitcode));
  o.set("BuildDirectory",        quote(&relative_to(&conf.target_dir, &project.output_dir), false));

  // Signing and bundle
  let identity = match &x.code_sign_identity {
    Some(id) => quote(id, true).into_owned(),
    None     => quote(sdk.default_identity, true).into_owned()
  };
  o.set("DeviceCodeSigningIdentity", match sdk.device {
    true  => identity.clone(),
    false => REMOVE_LINE_TAG.to_string()
  });
  o.set("CodeSigningIdentity",     identity);
  o.set("CodeSignStyle",           x.provisioning_style.as_deref().unwrap_or("Automatic"));
  o.set("CodeSignEntitlements",    optional_path(project, &x.entitlements));
  o.set("DevelopmentTeam",         optional(&x.development_team));
  o.set("ProvisioningProfile",     optional(&x.provisioning_profile));
  o.set("ProductBundleIdentifier", optional(&x.bundle_identifier));
  o.set("InfoPListFile",           optional_path(project, &x.info_plist));

  // Legacy targets and schemes
  o.set("FastBuildTarget", conf.bff_alias());
  o.set("EnableGpuFrameCaptureMode", match x.gpu_frame_capture.as_deref() {
    Some("auto") | Some("auto_enabled") => "0",
    Some("metal")                       => "1",
    Some("opengl")                      => "2",
    Some("disabled")                    => "3",
    _                                   => REMOVE_LINE_TAG
  });

  clang_cmdline(&mut o, project, conf);
  o.set_cmdline("SDKRoot", ["-isysroot \"", sdk.path, "\""].concat());
  o.set_cmdline("DeploymentTarget", match &x.deployment_target {
    Some(v) => ["-m", sdk.root, "-version-min=", v.as_str()].concat(),
    None    => REMOVE_LINE_TAG.to_string()
  });
  Ok(o)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ctx::{PlatformType, Settings};

  const SDK: Sdk = Sdk {
    root:             "iphoneos",
    path:             "/sdk/iPhoneOS.sdk",
    deployment_key:   "IPHONEOS_DEPLOYMENT_TARGET",
    device_family:    "1,2",
    default_identity: "iPhone Developer",
    device:           true,
    bitcode:          false
  };

  #[test]
  fn debug_options() {
    let p = Project::new("hello", "/work".into(), "/work/build".into());
    let mut conf = Configuration::new("Debug", "hello", PlatformType::IOS, OutputType::Lib);
    conf.settings = Settings {
      include_dirs: vec!["include".to_string(), "extern/include".to_string()],
      ..Settings::debug()
    };
    conf.xcode.deployment_target = Some("12.0".to_string());

    let o = resolve_options(&SDK, &p, &conf).unwrap();
    assert_eq!(o.get("OptimizationLevel"), Some("0"));
    assert_eq!(o.get("PreprocessorDefinitions"), Some("DEBUG=1"));
    assert_eq!(o.get("IncludePaths"),
               Some("(\n\t\t\t\t\t../include,\n\t\t\t\t\t../extern/include,\n\t\t\t\t)"));
    assert_eq!(o.get("MachOType"), Some("staticlib"));
    assert_eq!(o.get("TargetedDeviceFamily"), Some("\"1,2\""));
    assert_eq!(o.get("DeploymentTarget"), Some("12.0"));
    assert_eq!(o.get("DeviceCodeSigningIdentity"), Some("\"iPhone Developer\""));
    assert_eq!(o.get("PrecompiledHeader"), Some(REMOVE_LINE_TAG));
    assert_eq!(o.get("FastBuildTarget"), Some("hello_Debug_iOS"));
    assert_eq!(o.cmdline["DeploymentTarget"], "-miphoneos-version-min=12.0");
  }
}
