//! Text templates for the Xcode files.
//!
//! Objects are bound as `item`. Lists of child references are rendered
//! separately and bound as `children`, `phases`, `dependencies`, `targets`,
//! `project_references` and `target_attributes`; those fragments end with a
//! newline, or are empty.

use crate::gen::xcode::graph::Category;

pub const OBJECT_VERSION: &str = "50";

pub const HEADER: &str = concat!(
  "// !$*UTF8*$!\n",
  "{\n",
  "\tarchiveVersion = 1;\n",
  "\tclasses = {\n",
  "\t};\n",
  "\tobjectVersion = [object_version];\n",
  "\tobjects = {\n");

pub const FOOTER: &str = concat!(
  "\t};\n",
  "\trootObject = [root.uid] /* Project object */;\n",
  "}\n");

pub const SECTION_BEGIN: &str = "\n/* Begin [section] section */\n";
pub const SECTION_END:   &str = "/* End [section] section */\n";

/// A reference inside a list of children.
pub const SUB_ITEM: &str = "\t\t\t\t[item.uid] /* [item.comment] */,\n";

pub const PROJECT_REFERENCE: &str = concat!(
  "\t\t\t\t{\n",
  "\t\t\t\t\tProductGroup = [item.products_group.uid] /* Products */;\n",
  "\t\t\t\t\tProjectRef = [item.project_file.uid] /* [item.project_file.name] */;\n",
  "\t\t\t\t},\n");

pub const TARGET_ATTRIBUTES_BEGIN: &str = concat!(
  "\t\t\t\t\t[item.uid] = {\n",
  "\t\t\t\t\t\tCreatedOnToolsVersion = 9.3;\n",
  "\t\t\t\t\t\tDevelopmentTeam = [project.development_team];\n",
  "\t\t\t\t\t\tProvisioningStyle = [project.provisioning_style];\n",
  "\t\t\t\t\t\tTestTargetID = [item.test_host];\n");

pub const TARGET_ATTRIBUTES_ICLOUD: &str = concat!(
  "\t\t\t\t\t\tSystemCapabilities = {\n",
  "\t\t\t\t\t\t\tcom.apple.iCloud = {\n",
  "\t\t\t\t\t\t\t\tenabled = 1;\n",
  "\t\t\t\t\t\t\t};\n",
  "\t\t\t\t\t\t};\n");

pub const TARGET_ATTRIBUTES_END: &str = "\t\t\t\t\t};\n";

const BUILD_FILE: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {isa = PBXBuildFile; ",
  "fileRef = [item.file.uid] /* [item.file.name] */; [item.settings]};\n");

const CONTAINER_ITEM_PROXY: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXContainerItemProxy;\n",
  "\t\t\tcontainerPortal = [item.portal.uid] /* [item.portal.comment] */;\n",
  "\t\t\tproxyType = [item.proxy_type];\n",
  "\t\t\tremoteGlobalIDString = [item.remote];\n",
  "\t\t\tremoteInfo = [item.remote_info];\n",
  "\t\t};\n");

const COPY_FILES_BUILD_PHASE: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXCopyFilesBuildPhase;\n",
  "\t\t\tbuildActionMask = [item.build_action_mask];\n",
  "\t\t\tdstPath = [item.dst_path];\n",
  "\t\t\tdstSubfolderSpec = [item.dst_subfolder_spec];\n",
  "\t\t\tfiles = (\n",
  "[children]",
  "\t\t\t);\n",
  "\t\t\tname = [item.name];\n",
  "\t\t\trunOnlyForDeploymentPostprocessing = [item.run_only];\n",
  "\t\t};\n");

const FILE_REFERENCE: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXFileReference;\n",
  "\t\t\texplicitFileType = [item.explicit_file_type];\n",
  "\t\t\tincludeInIndex = [item.include_in_index];\n",
  "\t\t\tlastKnownFileType = [item.last_known_file_type];\n",
  "\t\t\tname = [item.display_name];\n",
  "\t\t\tpath = [item.path];\n",
  "\t\t\tsourceTree = [item.source_tree];\n",
  "\t\t};\n");

/// Sources, frameworks, headers and resources phases.
const BUILD_PHASE: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = [item.isa];\n",
  "\t\t\tbuildActionMask = [item.build_action_mask];\n",
  "\t\t\tfiles = (\n",
  "[children]",
  "\t\t\t);\n",
  "\t\t\trunOnlyForDeploymentPostprocessing = [item.run_only];\n",
  "\t\t};\n");

const GROUP: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXGroup;\n",
  "\t\t\tchildren = (\n",
  "[children]",
  "\t\t\t);\n",
  "\t\t\tname = [item.display_name];\n",
  "\t\t\tpath = [item.path];\n",
  "\t\t\tsourceTree = [item.source_tree];\n",
  "\t\t};\n");

const LEGACY_TARGET: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXLegacyTarget;\n",
  "\t\t\tbuildArgumentsString = [item.build_arguments];\n",
  "\t\t\tbuildConfigurationList = [item.config_list.uid] /* [item.config_list.comment] */;\n",
  "\t\t\tbuildPhases = (\n",
  "[phases]",
  "\t\t\t);\n",
  "\t\t\tbuildToolPath = [item.build_tool];\n",
  "\t\t\tbuildWorkingDirectory = [item.build_working_dir];\n",
  "\t\t\tdependencies = (\n",
  "[dependencies]",
  "\t\t\t);\n",
  "\t\t\tname = [item.name];\n",
  "\t\t\tpassBuildSettingsInEnvironment = 1;\n",
  "\t\t\tproductName = [item.name];\n",
  "\t\t};\n");

const NATIVE_TARGET: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXNativeTarget;\n",
  "\t\t\tbuildConfigurationList = [item.config_list.uid] /* [item.config_list.comment] */;\n",
  "\t\t\tbuildPhases = (\n",
  "[phases]",
  "\t\t\t);\n",
  "\t\t\tbuildRules = (\n",
  "\t\t\t);\n",
  "\t\t\tdependencies = (\n",
  "[dependencies]",
  "\t\t\t);\n",
  "\t\t\tname = [item.name];\n",
  "\t\t\tproductName = [item.name];\n",
  "\t\t\tproductReference = [item.product.uid] /* [item.product.name] */;\n",
  "\t\t\tproductType = [item.product_type];\n",
  "\t\t};\n");

const PROJECT: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXProject;\n",
  "\t\t\tattributes = {\n",
  "\t\t\t\tLastUpgradeCheck = 1000;\n",
  "\t\t\t\tTargetAttributes = {\n",
  "[target_attributes]",
  "\t\t\t\t};\n",
  "\t\t\t};\n",
  "\t\t\tbuildConfigurationList = [item.config_list.uid] /* [item.config_list.comment] */;\n",
  "\t\t\tcompatibilityVersion = \"Xcode 9.3\";\n",
  "\t\t\tdevelopmentRegion = en;\n",
  "\t\t\thasScannedForEncodings = 0;\n",
  "\t\t\tknownRegions = (\n",
  "\t\t\t\ten,\n",
  "\t\t\t\tBase,\n",
  "\t\t\t);\n",
  "\t\t\tmainGroup = [item.main_group.uid];\n",
  "\t\t\tproductRefGroup = [item.products_group.uid] /* [item.products_group.comment] */;\n",
  "\t\t\tprojectDirPath = \"\";\n",
  "\t\t\tprojectReferences = (\n",
  "[project_references]",
  "\t\t\t);\n",
  "\t\t\tprojectRoot = \"\";\n",
  "\t\t\ttargets = (\n",
  "[targets]",
  "\t\t\t);\n",
  "\t\t};\n");

const REFERENCE_PROXY: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXReferenceProxy;\n",
  "\t\t\tfileType = [item.file_type];\n",
  "\t\t\tpath = [item.path];\n",
  "\t\t\tremoteRef = [item.proxy.uid] /* [item.proxy.comment] */;\n",
  "\t\t\tsourceTree = [item.source_tree];\n",
  "\t\t};\n");

const SHELL_SCRIPT_BUILD_PHASE: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXShellScriptBuildPhase;\n",
  "\t\t\tbuildActionMask = [item.build_action_mask];\n",
  "\t\t\tfiles = (\n",
  "\t\t\t);\n",
  "\t\t\tinputPaths = (\n",
  "\t\t\t);\n",
  "\t\t\tname = [item.name];\n",
  "\t\t\toutputPaths = (\n",
  "\t\t\t);\n",
  "\t\t\trunOnlyForDeploymentPostprocessing = [item.run_only];\n",
  "\t\t\tshellPath = /bin/sh;\n",
  "\t\t\tshellScript = [item.script];\n",
  "\t\t};\n");

const TARGET_DEPENDENCY: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = PBXTargetDependency;\n",
  "\t\t\tname = [item.name];\n",
  "\t\t\ttarget = [item.target];\n",
  "\t\t\ttargetProxy = [item.proxy.uid] /* [item.proxy.comment] */;\n",
  "\t\t};\n");

macro_rules! configuration_begin {
  () => {
    concat!(
      "\t\t[item.uid] /* [item.comment] */ = {\n",
      "\t\t\tisa = XCBuildConfiguration;\n",
      "\t\t\tbuildSettings = {\n")
  };
}

macro_rules! configuration_end {
  () => {
    concat!(
      "\t\t\t};\n",
      "\t\t\tname = [item.name];\n",
      "\t\t};\n")
  };
}

macro_rules! target_settings {
  () => {
    concat!(
      "\t\t\t\tCLANG_CXX_LANGUAGE_STANDARD = [item.options.CppStandard];\n",
      "\t\t\t\tCLANG_CXX_LIBRARY = [item.options.LibraryStandard];\n",
      "\t\t\t\tCLANG_ENABLE_OBJC_ARC = [item.options.AutomaticReferenceCounting];\n",
      "\t\t\t\tCODE_SIGN_ENTITLEMENTS = [item.options.CodeSignEntitlements];\n",
      "\t\t\t\tCODE_SIGN_IDENTITY = [item.options.CodeSigningIdentity];\n",
      "\t\t\t\t\"CODE_SIGN_IDENTITY[sdk=iphoneos*]\" = [item.options.DeviceCodeSigningIdentity];\n",
      "\t\t\t\tCODE_SIGN_STYLE = [item.options.CodeSignStyle];\n",
      "\t\t\t\tCONFIGURATION_BUILD_DIR = [item.options.BuildDirectory];\n",
      "\t\t\t\tCONFIGURATION_TEMP_DIR = [item.intermediate_dir];\n",
      "\t\t\t\tDEAD_CODE_STRIPPING = [item.options.DeadStripping];\n",
      "\t\t\t\tDEVELOPMENT_TEAM = [item.options.DevelopmentTeam];\n",
      "\t\t\t\tENABLE_BITCODE = [item.options.EnableBitcode];\n",
      "\t\t\t\tEXECUTABLE_PREFIX = [item.options.ExecutablePrefix];\n",
      "\t\t\t\tFRAMEWORK_SEARCH_PATHS = [item.options.FrameworkPaths];\n",
      "\t\t\t\tGCC_C_LANGUAGE_STANDARD = [item.options.CStandard];\n",
      "\t\t\t\tGCC_ENABLE_CPP_EXCEPTIONS = [item.options.CppExceptionHandling];\n",
      "\t\t\t\tGCC_ENABLE_CPP_RTTI = [item.options.RuntimeTypeInfo];\n",
      "\t\t\t\tGCC_OPTIMIZATION_LEVEL = [item.options.OptimizationLevel];\n",
      "\t\t\t\tGCC_PRECOMPILE_PREFIX_HEADER = [item.options.UsePrecompiledHeader];\n",
      "\t\t\t\tGCC_PREFIX_HEADER = [item.options.PrecompiledHeader];\n",
      "\t\t\t\tGCC_PREPROCESSOR_DEFINITIONS = [item.options.PreprocessorDefinitions];\n",
      "\t\t\t\tGCC_TREAT_WARNINGS_AS_ERRORS = [item.options.TreatWarningsAsErrors];\n",
      "\t\t\t\tGCC_WARN_ABOUT_RETURN_TYPE = YES_ERROR;\n",
      "\t\t\t\tGCC_WARN_UNUSED_VARIABLE = [item.options.WarnUnusedVariable];\n",
      "\t\t\t\tHEADER_SEARCH_PATHS = [item.options.IncludePaths];\n",
      "\t\t\t\tINFOPLIST_FILE = [item.options.InfoPListFile];\n",
      "\t\t\t\tINSTALL_PATH = [item.install_path];\n",
      "\t\t\t\tLIBRARY_SEARCH_PATHS = [item.options.LibraryPaths];\n",
      "\t\t\t\tMACH_O_TYPE = [item.options.MachOType];\n",
      "\t\t\t\tOTHER_CPLUSPLUSFLAGS = [item.options.CompilerOptions];\n",
      "\t\t\t\tOTHER_LDFLAGS = [item.options.LinkerOptions];\n",
      "\t\t\t\tPRODUCT_BUNDLE_IDENTIFIER = [item.options.ProductBundleIdentifier];\n",
      "\t\t\t\tPRODUCT_NAME = [item.product_name];\n",
      "\t\t\t\tPROVISIONING_PROFILE_SPECIFIER = [item.options.ProvisioningProfile];\n",
      "\t\t\t\tSKIP_INSTALL = [item.options.SkipInstall];\n",
      "\t\t\t\tSTRIP_INSTALLED_PRODUCT = [item.options.StripInstalledProduct];\n")
  };
}

const CONFIGURATION_NATIVE_TARGET: &str = concat!(
  configuration_begin!(),
  target_settings!(),
  configuration_end!());

const CONFIGURATION_UNIT_TEST_TARGET: &str = concat!(
  configuration_begin!(),
  "\t\t\t\tBUNDLE_LOADER = \"$(TEST_HOST)\";\n",
  target_settings!(),
  "\t\t\t\tTEST_HOST = [item.test_host];\n",
  configuration_end!());

const CONFIGURATION_LEGACY_TARGET: &str = concat!(
  configuration_begin!(),
  "\t\t\t\tCONFIGURATION_BUILD_DIR = [item.options.BuildDirectory];\n",
  "\t\t\t\tCONFIGURATION_TEMP_DIR = [item.intermediate_dir];\n",
  "\t\t\t\tDEBUGGING_SYMBOLS = YES;\n",
  "\t\t\t\tFASTBUILD_TARGET = [item.options.FastBuildTarget];\n",
  "\t\t\t\tGCC_GENERATE_DEBUGGING_SYMBOLS = YES;\n",
  "\t\t\t\tGCC_OPTIMIZATION_LEVEL = [item.options.OptimizationLevel];\n",
  "\t\t\t\tOTHER_CFLAGS = \"\";\n",
  "\t\t\t\tOTHER_LDFLAGS = \"\";\n",
  "\t\t\t\tPRODUCT_NAME = [item.product_name];\n",
  configuration_end!());

const CONFIGURATION_PROJECT: &str = concat!(
  configuration_begin!(),
  "\t\t\t\tALWAYS_SEARCH_USER_PATHS = NO;\n",
  "\t\t\t\tARCHS = [item.options.Archs];\n",
  "\t\t\t\tCLANG_ENABLE_MODULES = [item.options.ClangEnableModules];\n",
  "\t\t\t\tCLANG_WARN_BOOL_CONVERSION = YES;\n",
  "\t\t\t\tCLANG_WARN_EMPTY_BODY = YES;\n",
  "\t\t\t\tCLANG_WARN_INFINITE_RECURSION = YES;\n",
  "\t\t\t\tCOPY_PHASE_STRIP = [item.options.StripDebugSymbolsDuringCopy];\n",
  "\t\t\t\tDEBUG_INFORMATION_FORMAT = [item.options.DebugInformationFormat];\n",
  "\t\t\t\tENABLE_STRICT_OBJC_MSGSEND = YES;\n",
  "\t\t\t\tENABLE_TESTABILITY = [item.options.EnableTestability];\n",
  "\t\t\t\tGCC_GENERATE_DEBUGGING_SYMBOLS = [item.options.GenerateDebuggingSymbols];\n",
  "\t\t\t\tGCC_NO_COMMON_BLOCKS = YES;\n",
  "\t\t\t\t[item.options.DeploymentTargetKey] = [item.options.DeploymentTarget];\n",
  "\t\t\t\tONLY_ACTIVE_ARCH = [item.options.OnlyActiveArch];\n",
  "\t\t\t\tSDKROOT = [item.options.SDKRoot];\n",
  "\t\t\t\tTARGETED_DEVICE_FAMILY = [item.options.TargetedDeviceFamily];\n",
  "\t\t\t\tVALIDATE_PRODUCT = [item.options.ValidateProduct];\n",
  configuration_end!());

const CONFIGURATION_LIST: &str = concat!(
  "\t\t[item.uid] /* [item.comment] */ = {\n",
  "\t\t\tisa = XCConfigurationList;\n",
  "\t\t\tbuildConfigurations = (\n",
  "[children]",
  "\t\t\t);\n",
  "\t\t\tdefaultConfigurationIsVisible = 0;\n",
  "\t\t\tdefaultConfigurationName = [item.default_name];\n",
  "\t\t};\n");

pub fn object_template(category: Category) -> &'static str {
  match category {
    Category::PBXBuildFile                       => BUILD_FILE,
    Category::PBXContainerItemProxy              => CONTAINER_ITEM_PROXY,
    Category::PBXCopyFilesBuildPhase             => COPY_FILES_BUILD_PHASE,
    Category::PBXFileReference                   => FILE_REFERENCE,
    Category::PBXFrameworksBuildPhase            |
    Category::PBXHeadersBuildPhase               |
    Category::PBXResourcesBuildPhase             |
    Category::PBXSourcesBuildPhase               => BUILD_PHASE,
    Category::PBXGroup                           => GROUP,
    Category::PBXLegacyTarget                    => LEGACY_TARGET,
    Category::PBXNativeTarget                    => NATIVE_TARGET,
    Category::PBXProject                         => PROJECT,
    Category::PBXReferenceProxy                  => REFERENCE_PROXY,
    Category::PBXShellScriptBuildPhase           => SHELL_SCRIPT_BUILD_PHASE,
    Category::PBXTargetDependency                => TARGET_DEPENDENCY,
    Category::XCBuildConfigurationNativeTarget   => CONFIGURATION_NATIVE_TARGET,
    Category::XCBuildConfigurationLegacyTarget   => CONFIGURATION_LEGACY_TARGET,
    Category::XCBuildConfigurationUnitTestTarget => CONFIGURATION_UNIT_TEST_TARGET,
    Category::XCBuildConfigurationProject        => CONFIGURATION_PROJECT,
    Category::XCConfigurationList                => CONFIGURATION_LIST
  }
}

pub const SCHEME: &str = concat!(
  "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
  "<Scheme\n",
  "   LastUpgradeVersion = \"1000\"\n",
  "   version = \"1.3\">\n",
  "   <BuildAction\n",
  "      parallelizeBuildables = \"YES\"\n",
  "      buildImplicitDependencies = \"YES\">\n",
  "      <BuildActionEntries>\n",
  "         <BuildActionEntry\n",
  "            buildForTesting = \"YES\"\n",
  "            buildForRunning = \"YES\"\n",
  "            buildForProfiling = \"YES\"\n",
  "            buildForArchiving = \"YES\"\n",
  "            buildForAnalyzing = \"YES\">\n",
  "[entry_reference]",
  "         </BuildActionEntry>\n",
  "      </BuildActionEntries>\n",
  "   </BuildAction>\n",
  "   <TestAction\n",
  "      buildConfiguration = \"[optimization]\"\n",
  "      selectedDebuggerIdentifier = \"Xcode.DebuggerFoundation.Debugger.LLDB\"\n",
  "      selectedLauncherIdentifier = \"Xcode.DebuggerFoundation.Launcher.LLDB\"\n",
  "      shouldUseLaunchSchemeArgsEnv = \"YES\">\n",
  "      <Testables>\n",
  "[testables]",
  "      </Testables>\n",
  "      <MacroExpansion>\n",
  "[macro_reference]",
  "      </MacroExpansion>\n",
  "      <AdditionalOptions>\n",
  "      </AdditionalOptions>\n",
  "   </TestAction>\n",
  "   <LaunchAction\n",
  "      buildConfiguration = \"[optimization]\"\n",
  "      selectedDebuggerIdentifier = \"Xcode.DebuggerFoundation.Debugger.LLDB\"\n",
  "      selectedLauncherIdentifier = \"Xcode.DebuggerFoundation.Launcher.LLDB\"\n",
  "      launchStyle = \"0\"\n",
  "      useCustomWorkingDirectory = \"NO\"\n",
  "      ignoresPersistentStateOnLaunch = \"NO\"\n",
  "      debugDocumentVersioning = \"YES\"\n",
  "      enableGPUFrameCaptureMode = \"[options.EnableGpuFrameCaptureMode]\"\n",
  "      debugServiceExtension = \"internal\"\n",
  "      allowLocationSimulation = \"YES\">\n",
  "      <BuildableProductRunnable\n",
  "         runnableDebuggingMode = \"0\">\n",
  "[runnable_reference]",
  "      </BuildableProductRunnable>\n",
  "      <AdditionalOptions>\n",
  "      </AdditionalOptions>\n",
  "   </LaunchAction>\n",
  "   <ProfileAction\n",
  "      buildConfiguration = \"[optimization]\"\n",
  "      shouldUseLaunchSchemeArgsEnv = \"YES\"\n",
  "      savedToolIdentifier = \"\"\n",
  "      useCustomWorkingDirectory = \"NO\"\n",
  "      debugDocumentVersioning = \"YES\">\n",
  "      <BuildableProductRunnable\n",
  "         runnableDebuggingMode = \"0\">\n",
  "[runnable_reference]",
  "      </BuildableProductRunnable>\n",
  "   </ProfileAction>\n",
  "   <AnalyzeAction\n",
  "      buildConfiguration = \"[optimization]\">\n",
  "   </AnalyzeAction>\n",
  "   <ArchiveAction\n",
  "      buildConfiguration = \"[optimization]\"\n",
  "      revealArchiveInOrganizer = \"YES\">\n",
  "   </ArchiveAction>\n",
  "</Scheme>\n");

/// `target` is the scheme target, `indent` prefixes every line.
pub const SCHEME_BUILDABLE_REFERENCE: &str = concat!(
  "[indent]<BuildableReference\n",
  "[indent]   BuildableIdentifier = \"primary\"\n",
  "[indent]   BlueprintIdentifier = \"[target.uid]\"\n",
  "[indent]   BuildableName = \"[target.buildable_name]\"\n",
  "[indent]   BlueprintName = \"[target.name]\"\n",
  "[indent]   ReferencedContainer = \"container:[project_file]\">\n",
  "[indent]</BuildableReference>\n");

pub const SCHEME_TESTABLE: &str = concat!(
  "         <TestableReference\n",
  "            skipped = \"NO\">\n",
  "[reference]",
  "         </TestableReference>\n");
