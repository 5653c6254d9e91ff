use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stm32_makefile::{FamilyRule, MakeInfo, TargetFamilyTable};

pub const CONFIG_FILE_NAME: &str = "stm32-make.toml";
pub const DEFAULT_CUBEMX_MAKEFILE: &str = "Makefile";
pub const DEFAULT_OUTPUT: &str = "STM32Make.make";

/// Extra `pattern` → `target` rule for target family inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFamily {
    pub pattern: String,
    pub target: String,
}

/// `stm32-make.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// CubeMX 生成的 Makefile，作为基础配置；空字符串表示不读取
    pub cubemx_makefile: String,
    pub output: String,
    /// 源文件 glob
    pub source_files: Vec<String>,
    pub openocd_interface: String,
    pub target_families: Vec<TargetFamily>,
    pub build: MakeInfo,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            cubemx_makefile: DEFAULT_CUBEMX_MAKEFILE.to_string(),
            output: DEFAULT_OUTPUT.to_string(),
            source_files: Vec::new(),
            openocd_interface: crate::openocd::DEFAULT_INTERFACE.to_string(),
            target_families: Vec::new(),
            build: MakeInfo::default(),
        }
    }
}

impl ProjectConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid project configuration")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize project configuration")
    }

    /// CubeMX Makefile to layer under `[build]`, if any.
    pub fn cubemx_makefile(&self) -> Option<&str> {
        Some(self.cubemx_makefile.trim()).filter(|path| !path.is_empty())
    }

    /// Built-in family rules with the configured ones in front, in file order.
    pub fn family_table(&self) -> Result<TargetFamilyTable> {
        let mut table = TargetFamilyTable::default();
        for family in self.target_families.iter().rev() {
            let rule = FamilyRule::new(&family.pattern, &family.target)
                .with_context(|| format!("Invalid target family pattern {}", family.pattern))?;
            table.prepend(rule);
        }
        Ok(table)
    }
}
