use crate::ctx::{self, Architecture, BffCompiler, Configuration, PlatformType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::apple;

pub struct WatchOS;

const SDK: apple::Sdk = apple::Sdk {
  root:             "watchos",
  path:             "/Applications/Xcode.app/Contents/Developer/Platforms/WatchOS.platform/Developer/SDKs/WatchOS.sdk",
  deployment_key:   "WATCHOS_DEPLOYMENT_TARGET",
  device_family:    "4",
  default_identity: "iPhone Developer",
  device:           true,
  bitcode:          true
};

impl ctx::Platform for WatchOS {
  fn get_platform_type(&self) -> PlatformType {
    PlatformType::WatchOS
  }

  fn supports_architecture(&self, a: Architecture) -> bool {
    match a {
      Architecture::ARM   => true,
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
