use crate::ctx::{self, Architecture, BffCompiler, Configuration, PlatformType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::apple;

pub struct TVOS;

const SDK: apple::Sdk = apple::Sdk {
  root:             "appletvos",
  path:             "/Applications/Xcode.app/Contents/Developer/Platforms/AppleTVOS.platform/Developer/SDKs/AppleTVOS.sdk",
  deployment_key:   "TVOS_DEPLOYMENT_TARGET",
  device_family:    "3",
  default_identity: "iPhone Developer",
  device:           true,
  bitcode:          true
};

impl ctx::Platform for TVOS {
  fn get_platform_type(&self) -> PlatformType {
    PlatformType::TVOS
  }

  fn supports_architecture(&self, a: Architecture) -> bool {
    match a {
      Architecture::ARM   => false,
      Architecture::ARM64 => true,
      Architecture::X86   => false,
      Architecture::X64   => false
    }
  }

  fn resolve_options(&self, project: &Project, conf: &Configuration) -> Result<ResolvedOptions> {
    apple::resolve_options(&SDK, project, conf)
  }

  fn bff_compiler(&self) -> Option<BffCompiler> {
    Some(apple::COMPILER)
  }
}
