use crate::contexts::OpenOcdContext;
use crate::render::render;
use crate::templates::OPENOCD_CFG;
use anyhow::Result;

pub const OPENOCD_CONFIG_FILE: &str = "openocd.cfg";
pub const DEFAULT_INTERFACE: &str = "stlink";

pub fn render_openocd_config(interface: &str, target_mcu: &str) -> Result<String> {
    let interface = match interface.trim() {
        "" => DEFAULT_INTERFACE,
        other => other,
    };
    render(
        OPENOCD_CFG,
        &OpenOcdContext {
            interface,
            target: target_mcu.trim(),
        },
    )
}

/// Target family named by a `source [find target/<family>.cfg]` line.
pub fn read_openocd_target(config: &str) -> Option<String> {
    config
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .find_map(|line| {
            let rest = line.split("target/").nth(1)?;
            let target = rest.split(".cfg").next()?.trim();
            (!target.is_empty()).then(|| target.to_string())
        })
}
