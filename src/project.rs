use crate::config::ProjectConfig;
use crate::env_file::{read_tool_overrides, render_env_file};
use crate::openocd::{OPENOCD_CONFIG_FILE, read_openocd_target, render_openocd_config};
use crate::workspace::Workspace;
use anyhow::{Context, Result, bail};
use serde::Serialize;
use stm32_makefile::{
    BuildFiles, ENVIRONMENT_FILE_NAME, ExtractedMakefileInfo, MakeInfo, TargetFamilyTable,
    extract_makefile_info_with, generate_makefile, include_directories,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    #[serde(flatten)]
    pub files: BuildFiles,
    pub include_directories: Vec<String>,
}

/// Reads and extracts a Makefile, failing when nothing usable is in it.
pub fn load_makefile_info<W: Workspace + ?Sized>(
    ws: &W,
    path: &str,
    families: &TargetFamilyTable,
) -> Result<ExtractedMakefileInfo> {
    let text = ws
        .read_text(path)?
        .with_context(|| format!("No Makefile found at {path}"))?;
    let info = extract_makefile_info_with(&text, families);
    if info.is_empty() {
        bail!("No usable Makefile found at {path}");
    }
    Ok(info)
}

/// Classifies every file matched by `patterns`.
pub fn scan_build_files<W: Workspace + ?Sized>(ws: &W, patterns: &[String]) -> Result<ScanReport> {
    let mut files = Vec::new();
    for pattern in patterns {
        let matched = ws.glob_files(pattern)?;
        debug!("{} files match {}", matched.len(), pattern);
        files.extend(matched);
    }
    Ok(ScanReport {
        include_directories: include_directories(&files),
        files: BuildFiles::classify(&files),
    })
}

/// Layers CubeMX settings, scanned files, the `[build]` table and the
/// environment file into one build description. A still unknown target MCU
/// comes from an existing `openocd.cfg`, then from the C source names.
pub fn build_make_info<W: Workspace + ?Sized>(ws: &W, config: &ProjectConfig) -> Result<MakeInfo> {
    let families = config.family_table()?;
    let mut make_info = MakeInfo::default();

    if let Some(path) = config.cubemx_makefile() {
        match ws.read_text(path)? {
            Some(text) => {
                let extracted = extract_makefile_info_with(&text, &families);
                if extracted.is_empty() {
                    warn!("{} has no usable settings, ignoring it", path);
                } else {
                    info!("Loaded settings from {}", path);
                    make_info.merge(extracted.into());
                }
            }
            None => debug!("No CubeMX Makefile at {}", path),
        }
    }

    if !config.source_files.is_empty() {
        let report = scan_build_files(ws, &config.source_files)?;
        make_info.c_includes.extend(report.include_directories);
        make_info.add_build_files(report.files);
    }

    make_info.merge(config.build.clone());

    if let Some(env) = ws.read_text(ENVIRONMENT_FILE_NAME)? {
        debug!("Applying toolchain overrides from {}", ENVIRONMENT_FILE_NAME);
        make_info.tools.merge(read_tool_overrides(&env));
    }

    if make_info.target_mcu.is_empty() {
        if let Some(target) = ws
            .read_text(OPENOCD_CONFIG_FILE)?
            .and_then(|cfg| read_openocd_target(&cfg))
        {
            debug!("Target MCU {} taken from {}", target, OPENOCD_CONFIG_FILE);
            make_info.target_mcu = target;
        }
    }

    if make_info.target_mcu.is_empty() {
        match families.infer(&make_info.c_sources) {
            Some(family) => make_info.target_mcu = family,
            None => warn!("Could not infer the target MCU from the C sources"),
        }
    }

    Ok(make_info)
}

/// Writes `content` unless the file already holds it. Files with other
/// content are replaced only when `force` is set or `confirm` agrees.
pub fn write_file<W, F>(
    ws: &W,
    path: &str,
    content: &str,
    force: bool,
    confirm: &mut F,
) -> Result<WriteOutcome>
where
    W: Workspace + ?Sized,
    F: FnMut(&str) -> Result<bool>,
{
    match ws.read_text(path)? {
        Some(existing) if existing == content => {
            debug!("{} is up to date", path);
            return Ok(WriteOutcome::Unchanged);
        }
        Some(_) if !force && !confirm(path)? => {
            warn!("Skip existing {}", path);
            return Ok(WriteOutcome::Skipped);
        }
        _ => {}
    }
    ws.write_text(path, content)?;
    info!("Generated {}", path);
    Ok(WriteOutcome::Written)
}

/// Writes the Makefile, `openocd.cfg` and, when missing, the environment file.
pub fn write_project_files<W, F>(
    ws: &W,
    make_info: &MakeInfo,
    config: &ProjectConfig,
    force: bool,
    confirm: &mut F,
) -> Result<Vec<(String, WriteOutcome)>>
where
    W: Workspace + ?Sized,
    F: FnMut(&str) -> Result<bool>,
{
    let mut outcomes = Vec::new();

    let makefile = generate_makefile(make_info);
    let outcome = write_file(ws, &config.output, &makefile, force, confirm)?;
    outcomes.push((config.output.clone(), outcome));

    if make_info.target_mcu.is_empty() {
        warn!("No target MCU, {} is not generated", OPENOCD_CONFIG_FILE);
    } else {
        let openocd = render_openocd_config(&config.openocd_interface, &make_info.target_mcu)?;
        let outcome = write_file(ws, OPENOCD_CONFIG_FILE, &openocd, force, confirm)?;
        outcomes.push((OPENOCD_CONFIG_FILE.to_string(), outcome));
    }

    if !make_info.tools.is_empty() && ws.read_text(ENVIRONMENT_FILE_NAME)?.is_none() {
        ws.write_text(ENVIRONMENT_FILE_NAME, &render_env_file(&make_info.tools))?;
        info!("Generated {}", ENVIRONMENT_FILE_NAME);
        outcomes.push((ENVIRONMENT_FILE_NAME.to_string(), WriteOutcome::Written));
    }

    Ok(outcomes)
}

/// Config whose `[build]` table holds everything extracted from a Makefile.
pub fn migrate_config(extracted: ExtractedMakefileInfo) -> ProjectConfig {
    ProjectConfig {
        cubemx_makefile: String::new(),
        build: extracted.into(),
        ..ProjectConfig::default()
    }
}
