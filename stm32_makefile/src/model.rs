use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_OPTIMIZATION: &str = "-Og";

/// 工具链路径，空字符串等同于未设置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arm_toolchain_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openocd_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_path: Option<String>,
}

impl Tools {
    pub fn arm_toolchain_path(&self) -> Option<&str> {
        non_empty(&self.arm_toolchain_path)
    }

    pub fn openocd_path(&self) -> Option<&str> {
        non_empty(&self.openocd_path)
    }

    pub fn make_path(&self) -> Option<&str> {
        non_empty(&self.make_path)
    }

    pub fn is_empty(&self) -> bool {
        self.arm_toolchain_path().is_none()
            && self.openocd_path().is_none()
            && self.make_path().is_none()
    }

    /// Paths set in `other` win.
    pub fn merge(&mut self, other: Tools) {
        let Tools {
            arm_toolchain_path,
            openocd_path,
            make_path,
        } = other;
        if non_empty(&arm_toolchain_path).is_some() {
            self.arm_toolchain_path = arm_toolchain_path;
        }
        if non_empty(&openocd_path).is_some() {
            self.openocd_path = openocd_path;
        }
        if non_empty(&make_path).is_some() {
            self.make_path = make_path;
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// An extra Makefile target spliced verbatim into the generated output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMakefileRule {
    pub command: String,
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
}

/// Structured description of a firmware build, the generator's input.
///
/// `cpu`, `fpu` and `float_abi` are stored without their `-m...=` prefix.
/// An empty `optimization` renders as [`DEFAULT_OPTIMIZATION`].
/// File and definition groups are sets so rendering is sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MakeInfo {
    pub target: String,
    pub cpu: String,
    pub fpu: String,
    pub float_abi: String,
    pub target_mcu: String,
    pub ldscript: String,
    pub optimization: String,

    pub c_sources: BTreeSet<String>,
    pub cxx_sources: BTreeSet<String>,
    pub asm_sources: BTreeSet<String>,
    pub c_includes: BTreeSet<String>,
    pub libs: BTreeSet<String>,
    pub libdir: BTreeSet<String>,

    pub c_defs: BTreeSet<String>,
    pub cxx_defs: BTreeSet<String>,
    pub as_defs: BTreeSet<String>,

    pub c_flags: Vec<String>,
    pub cxx_flags: Vec<String>,
    pub assembly_flags: Vec<String>,
    pub ld_flags: Vec<String>,

    pub tools: Tools,
    pub custom_makefile_rules: Vec<CustomMakefileRule>,
}

impl MakeInfo {
    /// Layers `other` on top of `self`.
    ///
    /// Non-empty scalars override, sets are unioned, flag sequences and
    /// custom rules are appended in order.
    pub fn merge(&mut self, other: MakeInfo) {
        override_if_set(&mut self.target, other.target);
        override_if_set(&mut self.cpu, other.cpu);
        override_if_set(&mut self.fpu, other.fpu);
        override_if_set(&mut self.float_abi, other.float_abi);
        override_if_set(&mut self.target_mcu, other.target_mcu);
        override_if_set(&mut self.ldscript, other.ldscript);
        override_if_set(&mut self.optimization, other.optimization);

        self.c_sources.extend(other.c_sources);
        self.cxx_sources.extend(other.cxx_sources);
        self.asm_sources.extend(other.asm_sources);
        self.c_includes.extend(other.c_includes);
        self.libs.extend(other.libs);
        self.libdir.extend(other.libdir);
        self.c_defs.extend(other.c_defs);
        self.cxx_defs.extend(other.cxx_defs);
        self.as_defs.extend(other.as_defs);

        self.c_flags.extend(other.c_flags);
        self.cxx_flags.extend(other.cxx_flags);
        self.assembly_flags.extend(other.assembly_flags);
        self.ld_flags.extend(other.ld_flags);

        self.tools.merge(other.tools);
        self.custom_makefile_rules.extend(other.custom_makefile_rules);
    }

    /// Adds classified scan results to the source groups.
    pub fn add_build_files(&mut self, files: BuildFiles) {
        self.c_sources.extend(files.c_sources);
        self.cxx_sources.extend(files.cxx_sources);
        self.asm_sources.extend(files.assembly_sources);
        self.libdir.extend(files.library_directories);
    }
}

fn override_if_set(slot: &mut String, value: String) {
    if !value.trim().is_empty() {
        *slot = value;
    }
}

/// Fields recovered from an existing Makefile.
///
/// Scalars are empty when not found. Tokens are already stripped of their
/// compiler-flag prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedMakefileInfo {
    pub target: String,
    pub cpu: String,
    pub fpu: String,
    pub float_abi: String,
    pub mcu: String,
    pub ldscript: String,
    pub target_mcu: String,
    pub optimization: String,
    pub prefix: String,
    pub c_sources: Vec<String>,
    pub cxx_sources: Vec<String>,
    pub asm_sources: Vec<String>,
    pub c_defs: Vec<String>,
    pub cxx_defs: Vec<String>,
    pub as_defs: Vec<String>,
    pub c_includes: Vec<String>,
    pub libs: Vec<String>,
    pub libdir: Vec<String>,
}

impl ExtractedMakefileInfo {
    /// True when nothing structural was recovered: no target and no sources.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
            && self.c_sources.is_empty()
            && self.cxx_sources.is_empty()
            && self.asm_sources.is_empty()
    }
}

impl From<ExtractedMakefileInfo> for MakeInfo {
    fn from(info: ExtractedMakefileInfo) -> Self {
        MakeInfo {
            target: info.target,
            cpu: info.cpu,
            fpu: info.fpu,
            float_abi: info.float_abi,
            target_mcu: info.target_mcu,
            ldscript: info.ldscript,
            c_sources: info.c_sources.into_iter().collect(),
            cxx_sources: info.cxx_sources.into_iter().collect(),
            asm_sources: info.asm_sources.into_iter().collect(),
            c_includes: info.c_includes.into_iter().collect(),
            libs: info.libs.into_iter().collect(),
            libdir: info.libdir.into_iter().collect(),
            c_defs: info.c_defs.into_iter().collect(),
            cxx_defs: info.cxx_defs.into_iter().collect(),
            as_defs: info.as_defs.into_iter().collect(),
            optimization: info.optimization,
            ..MakeInfo::default()
        }
    }
}

/// Raw file paths bucketed by role. Headers are not bucketed, see
/// [`include_directories`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFiles {
    pub c_sources: Vec<String>,
    pub cxx_sources: Vec<String>,
    pub assembly_sources: Vec<String>,
    pub library_directories: Vec<String>,
}

impl BuildFiles {
    pub fn classify<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut build_files = BuildFiles::default();
        for file in files {
            let file = file.as_ref();
            // 只收录生成的 Makefile 有模式规则的扩展名，区分大小写
            match extension(file) {
                Some("c") => build_files.c_sources.push(file.to_string()),
                Some("cpp" | "cc" | "cxx" | "c++") => build_files.cxx_sources.push(file.to_string()),
                Some("s" | "S" | "asm") => build_files.assembly_sources.push(file.to_string()),
                Some("a") => build_files.library_directories.push(parent_dir(file)),
                _ => {}
            }
        }
        for bucket in [
            &mut build_files.c_sources,
            &mut build_files.cxx_sources,
            &mut build_files.assembly_sources,
            &mut build_files.library_directories,
        ] {
            bucket.sort();
            bucket.dedup();
        }
        build_files
    }
}

/// Unique, sorted parent directories of every header in `files`.
pub fn include_directories<I, S>(files: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let dirs: BTreeSet<String> = files
        .into_iter()
        .filter(|f| matches!(extension(f.as_ref()), Some("h" | "hpp" | "hh" | "hxx")))
        .map(|f| parent_dir(f.as_ref()))
        .collect();
    dirs.into_iter().collect()
}

fn extension(file: &str) -> Option<&str> {
    Path::new(file).extension().and_then(|e| e.to_str())
}

fn parent_dir(file: &str) -> String {
    match Path::new(file).parent().and_then(|p| p.to_str()) {
        Some("") | None => ".".to_string(),
        Some(dir) => dir.replace('\\', "/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_buckets_by_extension() {
        let files = BuildFiles::classify([
            "Core/Src/main.c",
            "Core/Src/app.cpp",
            "Core/Src/main.c",
            "startup_stm32h743xx.s",
            "Drivers/crc.S",
            "Middlewares/lib/libfoo.a",
            "Core/Inc/main.h",
            "README.md",
        ]);
        assert_eq!(files.c_sources, vec!["Core/Src/main.c"]);
        assert_eq!(files.cxx_sources, vec!["Core/Src/app.cpp"]);
        assert_eq!(files.assembly_sources, vec!["Drivers/crc.S", "startup_stm32h743xx.s"]);
        assert_eq!(files.library_directories, vec!["Middlewares/lib"]);
    }

    #[test]
    fn test_classify_matches_extensions_exactly() {
        let files = BuildFiles::classify([
            "App/a.c++",
            "App/b.asm",
            "App/upper.C",
            "App/upper.CPP",
            "App/upper.ASM",
            "Core/main.c",
        ]);
        assert_eq!(files.c_sources, vec!["Core/main.c"]);
        assert_eq!(files.cxx_sources, vec!["App/a.c++"]);
        assert_eq!(files.assembly_sources, vec!["App/b.asm"]);
    }

    #[test]
    fn test_include_directories_from_headers() {
        let dirs = include_directories([
            "Core/Inc/main.h",
            "Core/Inc/gpio.h",
            "Drivers/CMSIS/Include/core_cm7.h",
            "Core/Src/main.c",
            "top.hpp",
        ]);
        assert_eq!(dirs, vec![".", "Core/Inc", "Drivers/CMSIS/Include"]);
    }

    #[test]
    fn test_merge_layers_fields() {
        let mut base = MakeInfo {
            target: "blinky".to_string(),
            c_sources: ["a.c".to_string()].into(),
            c_flags: vec!["-Wextra".to_string()],
            ..MakeInfo::default()
        };
        base.merge(MakeInfo {
            cpu: "cortex-m4".to_string(),
            c_sources: ["b.c".to_string(), "a.c".to_string()].into(),
            c_flags: vec!["-Wextra".to_string()],
            tools: Tools {
                arm_toolchain_path: Some("/opt/gcc/bin".to_string()),
                ..Tools::default()
            },
            ..MakeInfo::default()
        });

        assert_eq!(base.target, "blinky");
        assert_eq!(base.cpu, "cortex-m4");
        assert_eq!(base.optimization, "");
        assert_eq!(base.c_sources.len(), 2);
        assert_eq!(base.c_flags, vec!["-Wextra", "-Wextra"]);
        assert_eq!(base.tools.arm_toolchain_path(), Some("/opt/gcc/bin"));
    }

    #[test]
    fn test_merge_tools_takes_every_set_path() {
        let mut tools = Tools {
            arm_toolchain_path: Some("/opt/old/bin".to_string()),
            make_path: Some("/usr/bin/make".to_string()),
            ..Tools::default()
        };
        tools.merge(Tools {
            arm_toolchain_path: Some("/opt/gcc/bin".to_string()),
            openocd_path: Some("/usr/bin/openocd".to_string()),
            make_path: None,
        });
        assert_eq!(tools.arm_toolchain_path(), Some("/opt/gcc/bin"));
        assert_eq!(tools.openocd_path(), Some("/usr/bin/openocd"));
        assert_eq!(tools.make_path(), Some("/usr/bin/make"));
    }

    #[test]
    fn test_empty_tool_path_does_not_override() {
        let mut tools = Tools {
            openocd_path: Some("/usr/bin/openocd".to_string()),
            ..Tools::default()
        };
        tools.merge(Tools {
            openocd_path: Some("  ".to_string()),
            ..Tools::default()
        });
        assert_eq!(tools.openocd_path(), Some("/usr/bin/openocd"));
        assert!(!tools.is_empty());
    }

    #[test]
    fn test_extracted_info_into_make_info() {
        let extracted = ExtractedMakefileInfo {
            target: "h7".to_string(),
            c_defs: vec!["USE_HAL_DRIVER".to_string(), "USE_HAL_DRIVER".to_string()],
            ..ExtractedMakefileInfo::default()
        };
        assert!(!extracted.is_empty());
        let info = MakeInfo::from(extracted);
        assert_eq!(info.c_defs.len(), 1);
        assert!(info.optimization.is_empty());
    }
}
