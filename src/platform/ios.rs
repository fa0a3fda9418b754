use crate::ctx::{self, Architecture, BffCompiler, Configuration, PlatformType, Project, ResolvedOptions};
use crate::error::Result;
use crate::platform::apple;

pub struct IOS;

const SDK: apple::Sdk = apple::Sdk {
  root:             "iphoneos",
  path:             "/Applications/Xcode.app/Contents/Developer/Platforms/iPhoneOS.platform/Developer/SDKs/iPhoneOS.sdk",
  deployment_key:   "IPHONEOS_DEPLOYMENT_TARGET",
  device_family:    "1,2",
  default_identity: "iPhone Developer",
  device:           true,
  bitcode:          false
};

impl ctx::Platform for IOS {
  fn get_platform_type(&self) -> PlatformType {
    PlatformType::IOS
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
