use serde::{Deserialize, Serialize};
use serde_repr::Deserialize_repr;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::uid::IdGenerator;

/// Produces option tables for the configurations of one platform.
pub trait Platform: Sync {
  fn get_platform_type(&self) -> PlatformType;

  fn supports_architecture(&self, a: Architecture) -> bool;

  fn default_architecture(&self) -> Architecture {
    self.get_platform_type().default_architecture()
  }

  /// Options consumed by the templates as `[options.Key]` and `[cmdline.Key]`.
  /// Every key a template references must be present; options which don't
  /// apply are set to `REMOVE_LINE_TAG`.
  fn resolve_options(&self, project: &Project, conf: &Configuration) -> Result<ResolvedOptions>;

  /// MSBuild platform name, `None` when the platform has no Visual Studio support.
  fn vcxproj_platform(&self, _a: Architecture) -> Option<&'static str> {
    None
  }

  /// Extra `Globals` properties.
  fn vcxproj_globals(&self) -> &'static str {
    ""
  }

  /// The body of the per-configuration `Configuration` property group.
  fn vcxproj_configuration(&self) -> &'static str {
    ""
  }

  /// The body of the per-configuration `ItemDefinitionGroup`.
  fn vcxproj_item_definitions(&self) -> &'static str {
    ""
  }

  fn bff_compiler(&self) -> Option<BffCompiler> {
    None
  }
}

pub trait Generator: Sync {
  fn supports_platform(&self, p: PlatformType) -> bool;

  fn generate_project(&self, _ctx: &Context, _project: &Project,
                      _report: &mut GenerationReport) -> Result<()>
  {
    Ok(())
  }

  fn generate_solution(&self, _ctx: &Context, _solution: &Solution,
                       _report: &mut GenerationReport) -> Result<()>
  {
    Ok(())
  }
}

pub type Generators = BTreeMap<&'static str, Box<dyn Generator>>;
pub type Platforms  = Vec<Box<dyn Platform>>;

/// Configuration key to the master .bff files including it.
pub type MasterBffIndex = BTreeMap<String, Vec<PathBuf>>;

/// Everything shared by the generation passes of one run.
pub struct Context<'a> {
  pub ids:       &'a IdGenerator,
  pub platforms: &'a Platforms,
  pub projects:  &'a [Project],
  pub masters:   &'a MasterBffIndex
}

impl<'a> Context<'a> {
  pub fn platform(&self, t: PlatformType) -> &'a dyn Platform {
    &*self.platforms[t as usize]
  }

  pub fn find_project(&self, name: &str) -> Option<&'a Project> {
    self.projects.iter().find(|p| p.name == name)
  }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GenerationReport {
  pub generated: Vec<PathBuf>,
  pub skipped:   Vec<PathBuf>
}

impl GenerationReport {
  pub fn record(&mut self, path: PathBuf, written: bool) {
    match written {
      true  => self.generated.push(path),
      false => self.skipped.push(path)
    }
  }

  pub fn append(&mut self, mut other: GenerationReport) {
    self.generated.append(&mut other.generated);
    self.skipped.append(&mut other.skipped);
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedOptions {
  pub options: BTreeMap<String, String>,
  pub cmdline: BTreeMap<String, String>
}

impl ResolvedOptions {
  pub fn set<V: Into<String>>(&mut self, key: &str, value: V) {
    self.options.insert(key.to_string(), value.into());
  }

  pub fn set_cmdline<V: Into<String>>(&mut self, key: &str, value: V) {
    self.cmdline.insert(key.to_string(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.options.get(key).map(String::as_str)
  }
}

/// How a platform's compiler is declared in the master .bff file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BffCompiler {
  pub name:       &'static str,
  pub family:     &'static str,
  pub root:       &'static str,
  pub executable: &'static str,
  pub librarian:  &'static str,
  pub linker:     &'static str,
  pub define:     &'static str
}

#[derive(Clone, Debug)]
pub struct Project {
  pub name:        String,
  pub source_root: PathBuf,
  pub output_dir:  PathBuf,

  /// Absolute paths of every source and header file.
  pub files:            Vec<PathBuf>,
  pub resources:        Vec<PathBuf>,
  pub resource_folders: Vec<PathBuf>,

  /// Whether this is the solution-wide "build everything" FastBuild project.
  pub fastbuild_all: bool,

  pub configurations: Vec<Configuration>
}

impl Project {
  pub fn new<S: Into<String>>(name: S, source_root: PathBuf, output_dir: PathBuf) -> Self {
    Project {
      name: name.into(),
      source_root,
      output_dir,
      files:            Vec::new(),
      resources:        Vec::new(),
      resource_folders: Vec::new(),
      fastbuild_all:    false,
      configurations:   Vec::new()
    }
  }

  pub fn xcodeproj_path(&self) -> PathBuf {
    self.output_dir.join([self.name.as_str(), ".xcodeproj"].concat())
  }

  pub fn vcxproj_path(&self) -> PathBuf {
    self.output_dir.join([self.name.as_str(), ".vcxproj"].concat())
  }

  pub fn bff_path(&self) -> PathBuf {
    self.output_dir.join([self.name.as_str(), ".bff"].concat())
  }

  /// Configurations of this project matching `filter`, in declaration order.
  pub fn configurations_for<F>(&self, filter: F) -> Vec<&Configuration> where
    F: Fn(&Configuration) -> bool
  {
    self.configurations.iter().filter(|c| filter(c)).collect()
  }
}

#[derive(Clone, Debug)]
pub struct Configuration {
  /// The optimization name, "Debug" or "Release" for instance.
  pub name:         String,
  pub target:       String,
  pub platform:     PlatformType,
  pub architecture: Architecture,
  pub output:       OutputType,
  pub fastbuild:    bool,

  pub settings: Settings,
  pub xcode:    XcodeSettings,

  pub target_dir:       PathBuf,
  pub intermediate_dir: PathBuf,

  pub dependencies:  Vec<Dependency>,
  pub pre_build:     Vec<BuildStep>,
  pub post_build:    Vec<BuildStep>,
  pub copy_files:    Vec<CopyStep>,
  pub build_exclude: Vec<PathBuf>,

  /// Raw overrides applied over the platform's options.
  pub options: BTreeMap<String, String>
}

impl Configuration {
  pub fn new<N, T>(name: N, target: T, platform: PlatformType, output: OutputType) -> Self where
    N: Into<String>, T: Into<String>
  {
    let name = name.into();
    Configuration {
      target_dir:       PathBuf::from("bin").join(&name),
      intermediate_dir: PathBuf::from("obj").join(&name),
      name,
      target:           target.into(),
      platform,
      architecture:     platform.default_architecture(),
      output,
      fastbuild:        false,
      settings:         Settings::default(),
      xcode:            XcodeSettings::default(),
      dependencies:     Vec::new(),
      pre_build:        Vec::new(),
      post_build:       Vec::new(),
      copy_files:       Vec::new(),
      build_exclude:    Vec::new(),
      options:          BTreeMap::new()
    }
  }

  /// Identifies this configuration across generators.
  pub fn key(&self, project: &str) -> String {
    [project, "/", self.target.as_str(), "/", self.name.as_str(), "/", self.platform.to_str()].concat()
  }

  /// The FastBuild alias building this configuration.
  pub fn bff_alias(&self) -> String {
    [self.target.as_str(), "_", self.name.as_str(), "_", self.platform.to_str()].concat()
  }

  pub fn is_excluded(&self, path: &Path) -> bool {
    self.build_exclude.iter().any(|x| x == path)
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dependency {
  /// `None` for a target of the same project.
  pub project: Option<String>,
  pub target:  String
}

impl Dependency {
  /// Parses "target" or "project/target".
  pub fn parse(s: &str) -> Self {
    match s.find('/') {
      None    => Dependency { project: None, target: s.to_string() },
      Some(i) => Dependency {
        project: Some(s[..i].to_string()),
        target:  s[i + 1..].to_string()
      }
    }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildStep {
  pub name:   String,
  pub script: String
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CopyStep {
  pub name: String,

  #[serde(default)]
  pub destination: CopyDestination,

  #[serde(default)]
  pub path: String,

  pub files: Vec<PathBuf>
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CopyDestination {
  AbsolutePath,
  Wrapper,
  Executables,
  Resources,
  Frameworks,
  SharedFrameworks,
  SharedSupport,
  PlugIns,
  ProductsDirectory
}

impl CopyDestination {
  /// Xcode's `dstSubfolderSpec` value.
  pub fn folder_spec(self) -> u8 {
    match self {
      Self::AbsolutePath      =>  0,
      Self::Wrapper           =>  1,
      Self::Executables       =>  6,
      Self::Resources         =>  7,
      Self::Frameworks        => 10,
      Self::SharedFrameworks  => 11,
      Self::SharedSupport     => 12,
      Self::PlugIns           => 13,
      Self::ProductsDirectory => 16
    }
  }
}

impl Default for CopyDestination {
  fn default() -> Self { CopyDestination::ProductsDirectory }
}

#[derive(Clone, Debug)]
pub struct Solution {
  pub name:       String,
  pub output_dir: PathBuf,
  pub projects:   Vec<SolutionProject>,

  /// Generate `<name>.bff` aggregating the FastBuild projects.
  pub master_bff: bool
}

impl Solution {
  pub fn master_bff_path(&self) -> PathBuf {
    self.output_dir.join([self.name.as_str(), ".bff"].concat())
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SolutionProject {
  pub project: String,

  /// Logical folder, "/" or "\" separated.
  #[serde(default)]
  pub folder: String
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Architecture {
  #[serde(alias = "x86")]   X86   = 0,
  #[serde(alias = "x64")]   X64   = 1,
  #[serde(alias = "arm")]   ARM   = 2,
  #[serde(alias = "arm64")] ARM64 = 3
}

impl Architecture {
  pub fn to_str(self) -> &'static str {
    match self {
      Self::X86   => "x86",
      Self::X64   => "x86_64",
      Self::ARM   => "armv7",
      Self::ARM64 => "arm64"
    }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PlatformType {
  #[serde(alias = "windows")] Windows = 0,
  #[serde(alias = "linux")]   Linux   = 1,
  #[serde(alias = "macos")]   MacOS   = 2,
  #[serde(alias = "ios")]     IOS     = 3,
  #[serde(alias = "tvos")]    TVOS    = 4,
  #[serde(alias = "watchos")] WatchOS = 5,
  #[serde(alias = "android")] Android = 6
}

impl PlatformType {
  pub fn to_str(self) -> &'static str {
    match self {
      Self::Windows => "Windows",
      Self::Linux   => "Linux",
      Self::MacOS   => "macOS",
      Self::IOS     => "iOS",
      Self::TVOS    => "tvOS",
      Self::WatchOS => "watchOS",
      Self::Android => "Android"
    }
  }

  pub fn is_apple(self) -> bool {
    match self {
      Self::MacOS | Self::IOS | Self::TVOS | Self::WatchOS => true,
      Self::Windows | Self::Linux | Self::Android         => false
    }
  }

  /// Architecture of configurations that don't name one.
  pub fn default_architecture(self) -> Architecture {
    match self {
      Self::Windows | Self::Linux | Self::MacOS              => Architecture::X64,
      Self::IOS | Self::TVOS | Self::WatchOS | Self::Android => Architecture::ARM64
    }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
  /// A command-line application.
  #[serde(alias = "console")]
  Exe,
  /// A windowed application, an .app bundle on Apple platforms.
  #[serde(alias = "application")]
  App,
  /// A static library, generates a *.lib or *.a file.
  #[serde(alias = "static_library")]
  Lib,
  /// A dynamic library, generates a *.dll, *.so or *.dylib file.
  #[serde(alias = "shared_library")]
  Dll,
  Bundle,
  /// A unit test bundle hosted by the project's application.
  TestBundle,
  Framework,
  /// Doesn't produce anything. Used to contain files or run custom commands.
  None
}

impl OutputType {
  pub fn is_linked(self) -> bool {
    match self {
      Self::Exe | Self::App | Self::TestBundle | Self::Dll | Self::Bundle | Self::Framework => true,
      Self::Lib | Self::None => false
    }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Optimize {
  None,
  Size,
  Speed,
  Full
}

#[derive(Clone, Copy, Debug, Deserialize_repr, PartialEq)]
#[repr(u8)]
pub enum CStandard {
  C89 = 89,
  C99 = 99,
  C11 = 11,
  C17 = 17
}

#[derive(Clone, Copy, Debug, Deserialize_repr, PartialEq)]
#[repr(u8)]
pub enum CXXStandard {
  CXX03 =  3,
  CXX11 = 11,
  CXX14 = 14,
  CXX17 = 17,
  CXX20 = 20
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
  // Compiler
  pub include_dirs:     Vec<String>,
  pub warning_level:    Option<u8>,
  pub warning_as_error: Option<bool>,
  pub compiler_options: Vec<String>,

  // Optimizations
  pub optimize:           Option<Optimize>,
  pub omit_frame_pointer: Option<bool>,

  // Preprocessor
  pub defines: Vec<String>,

  // Language
  pub enable_exceptions: Option<bool>,
  pub enable_rtti:       Option<bool>,
  pub c_standard:        Option<CStandard>,
  pub cxx_standard:      Option<CXXStandard>,

  // PCH
  pub precompiled_header: Option<String>,
  pub precompiled_source: Option<String>,

  // Linker
  pub link_incremental: Option<bool>,
  pub lib_dirs:         Vec<String>,
  pub libs:             Vec<String>,
  pub linker_options:   Vec<String>,

  // Platform specific
  pub android_target_api_level: Option<u8>
}

impl Settings {
  pub fn debug() -> Self {
    Settings {
      warning_level:      Some(3),
      warning_as_error:   Some(false),
      optimize:           Some(Optimize::None),
      omit_frame_pointer: Some(false),
      link_incremental:   Some(true),
      defines:            vec!["DEBUG=1".to_string()],
      ..Default::default()
    }
  }

  pub fn release() -> Self {
    Settings {
      warning_level:      Some(3),
      warning_as_error:   Some(true),
      optimize:           Some(Optimize::Full),
      omit_frame_pointer: Some(true),
      link_incremental:   Some(false),
      defines:            vec!["NDEBUG".to_string()],
      ..Default::default()
    }
  }

  /// The built-in optimization profiles.
  pub fn defaults() -> Vec<(&'static str, Settings)> {
    vec![("Debug", Self::debug()), ("Release", Self::release())]
  }

  /// Layers `self` over `base`: scalars from `self` win, lists concatenate.
  pub fn merge(&self, base: &Self) -> Self {
    Settings {
      include_dirs:     merge_vecs(&base.include_dirs, &self.include_dirs),
      warning_level:    self.warning_level.or(base.warning_level),
      warning_as_error: self.warning_as_error.or(base.warning_as_error),
      compiler_options: merge_vecs(&base.compiler_options, &self.compiler_options),

      optimize:           self.optimize.or(base.optimize),
      omit_frame_pointer: self.omit_frame_pointer.or(base.omit_frame_pointer),

      defines: merge_vecs(&base.defines, &self.defines),

      enable_exceptions: self.enable_exceptions.or(base.enable_exceptions),
      enable_rtti:       self.enable_rtti.or(base.enable_rtti),
      c_standard:        self.c_standard.or(base.c_standard),
      cxx_standard:      self.cxx_standard.or(base.cxx_standard),

      precompiled_header: self.precompiled_header.clone().or_else(|| base.precompiled_header.clone()),
      precompiled_source: self.precompiled_source.clone().or_else(|| base.precompiled_source.clone()),

      link_incremental: self.link_incremental.or(base.link_incremental),
      lib_dirs:         merge_vecs(&base.lib_dirs, &self.lib_dirs),
      libs:             merge_vecs(&base.libs, &self.libs),
      linker_options:   merge_vecs(&base.linker_options, &self.linker_options),

      android_target_api_level: self.android_target_api_level.or(base.android_target_api_level)
    }
  }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct XcodeSettings {
  pub development_team:     Option<String>,
  pub code_sign_identity:   Option<String>,
  pub provisioning_style:   Option<String>,
  pub provisioning_profile: Option<String>,
  pub bundle_identifier:    Option<String>,
  pub info_plist:           Option<String>,
  pub entitlements:         Option<String>,
  pub deployment_target:    Option<String>,
  pub icloud:               Option<bool>,
  pub gpu_frame_capture:    Option<String>,

  pub system_frameworks:    Vec<String>,
  pub user_frameworks:      Vec<String>,
  pub developer_frameworks: Vec<String>,
  pub framework_paths:      Vec<String>
}

impl XcodeSettings {
  pub fn merge(&self, base: &Self) -> Self {
    let pick = |a: &Option<String>, b: &Option<String>| a.clone().or_else(|| b.clone());
    XcodeSettings {
      development_team:     pick(&self.development_team,     &base.development_team),
      code_sign_identity:   pick(&self.code_sign_identity,   &base.code_sign_identity),
      provisioning_style:   pick(&self.provisioning_style,   &base.provisioning_style),
      provisioning_profile: pick(&self.provisioning_profile, &base.provisioning_profile),
      bundle_identifier:    pick(&self.bundle_identifier,    &base.bundle_identifier),
      info_plist:           pick(&self.info_plist,           &base.info_plist),
      entitlements:         pick(&self.entitlements,         &base.entitlements),
      deployment_target:    pick(&self.deployment_target,    &base.deployment_target),
      icloud:               self.icloud.or(base.icloud),
      gpu_frame_capture:    pick(&self.gpu_frame_capture,    &base.gpu_frame_capture),

      system_frameworks:    merge_vecs(&base.system_frameworks,    &self.system_frameworks),
      user_frameworks:      merge_vecs(&base.user_frameworks,      &self.user_frameworks),
      developer_frameworks: merge_vecs(&base.developer_frameworks, &self.developer_frameworks),
      framework_paths:      merge_vecs(&base.framework_paths,      &self.framework_paths)
    }
  }
}

/// `path` relative to `base` with '/' separators. Relative paths are returned as is.
pub fn relative_to(path: &Path, base: &Path) -> String {
  let rel = match path.is_absolute() {
    true  => pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf()),
    false => path.to_path_buf()
  };
  match rel.as_os_str().is_empty() {
    true  => ".".to_string(),
    false => rel.to_string_lossy().replace('\\', "/")
  }
}

fn merge_vecs(a: &[String], b: &[String]) -> Vec<String> {
  let mut v = a.to_vec();
  for x in b {
    if !v.contains(x) {
      v.push(x.clone());
    }
  }
  v
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn settings_merge_layers_over_base() {
    let base = Settings::debug();
    let over = Settings {
      optimize: Some(Optimize::Size),
      defines:  vec!["FOO".to_string(), "DEBUG=1".to_string()],
      ..Default::default()
    };
    let merged = over.merge(&base);
    assert_eq!(merged.optimize, Some(Optimize::Size));
    assert_eq!(merged.warning_level, Some(3));
    assert_eq!(merged.defines, vec!["DEBUG=1".to_string(), "FOO".to_string()]);
  }

  #[test]
  fn dependency_parsing() {
    assert_eq!(Dependency::parse("core"), Dependency { project: None, target: "core".to_string() });
    assert_eq!(Dependency::parse("engine/core"), Dependency {
      project: Some("engine".to_string()),
      target:  "core".to_string()
    });
  }

  #[test]
  fn relative_paths() {
    assert_eq!(relative_to(Path::new("/work/src/a.cpp"), Path::new("/work/build")), "../src/a.cpp");
    assert_eq!(relative_to(Path::new("/work/build"), Path::new("/work/build")), ".");
    assert_eq!(relative_to(Path::new("bin/Debug"), Path::new("/work/build")), "bin/Debug");
  }

  #[test]
  fn configuration_keys() {
    let c = Configuration::new("Debug", "hello", PlatformType::MacOS, OutputType::Exe);
    assert_eq!(c.key("proj"), "proj/hello/Debug/macOS");
    assert_eq!(c.bff_alias(), "hello_Debug_macOS");
  }

  #[test]
  fn default_architecture_follows_platform() {
    let ios = Configuration::new("Debug", "hello", PlatformType::IOS, OutputType::App);
    assert_eq!(ios.architecture, Architecture::ARM64);

    let platforms = crate::platform::init();
    for p in platforms.iter() {
      let conf = Configuration::new("Debug", "a", p.get_platform_type(), OutputType::Exe);
      assert!(p.supports_architecture(conf.architecture), "{:?}", conf.platform);
    }
  }
}
