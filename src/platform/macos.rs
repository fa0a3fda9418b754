use crate::ctx::{self, Architecture, BffCompiler, Configuration, PlatformType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::apple;

pub struct MacOS;

const SDK: apple::Sdk = apple::Sdk {
  root:             "macosx",
  path:             "/Applications/Xcode.app/Contents/Developer/Platforms/MacOSX.platform/Developer/SDKs/MacOSX.sdk",
  deployment_key:   "MACOSX_DEPLOYMENT_TARGET",
  device_family:    "",
  default_identity: "-",
  device:           false,
  bitcode:          false
};

impl ctx::Platform for MacOS {
  fn get_platform_type(&self) -> PlatformType {
    PlatformType::MacOS
  }

  fn supports_architecture(&self, a: Architecture) -> bool {
    match a {
      Architecture::ARM   => false,
      Architecture::ARM64 => true,
      Architecture::X86   => false,
      Architecture::X64   => true
    }
  }

  fn resolve_options(&self, project: &Project, conf: &Configuration) -> Result<ResolvedOptions> {
    apple::resolve_options(&SDK, project, conf)
  }

  fn bff_compiler(&self) -> Option<BffCompiler> {
    Some(apple::COMPILER)
  }
}
