//! Machine-local toolchain paths kept next to the generated Makefile.

use stm32_makefile::{Tools, extract_single_line};

pub const ARM_GCC_PATH_KEY: &str = "ARM_GCC_PATH";
pub const OPENOCD_KEY: &str = "OPENOCD";
pub const MAKE_PATH_KEY: &str = "MAKE_PATH";

fn value(key: &str, text: &str) -> Option<String> {
    extract_single_line(key, text).filter(|v| !v.is_empty())
}

/// Tool paths set in an environment file; unset keys stay `None`.
pub fn read_tool_overrides(text: &str) -> Tools {
    Tools {
        arm_toolchain_path: value(ARM_GCC_PATH_KEY, text),
        openocd_path: value(OPENOCD_KEY, text),
        make_path: value(MAKE_PATH_KEY, text),
    }
}

pub fn render_env_file(tools: &Tools) -> String {
    let mut out = String::from("# Toolchain locations for this machine, included by the generated Makefile\n");
    for (key, path) in [
        (ARM_GCC_PATH_KEY, tools.arm_toolchain_path()),
        (OPENOCD_KEY, tools.openocd_path()),
        (MAKE_PATH_KEY, tools.make_path()),
    ] {
        if let Some(path) = path {
            out.push_str(&format!("{key} = {path}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_tool_overrides() {
        let text = indoc! {"
            # local paths
            ARM_GCC_PATH = /opt/gcc-arm-none-eabi/bin
            OPENOCD =
        "};
        let tools = read_tool_overrides(text);
        assert_eq!(tools.arm_toolchain_path(), Some("/opt/gcc-arm-none-eabi/bin"));
        assert_eq!(tools.openocd_path, None);
        assert_eq!(tools.make_path, None);
    }

    #[test]
    fn test_render_then_read() {
        let tools = Tools {
            arm_toolchain_path: Some("C:/arm/bin".to_string()),
            openocd_path: None,
            make_path: Some("/usr/bin/make".to_string()),
        };
        let text = render_env_file(&tools);
        assert!(!text.contains(OPENOCD_KEY));
        assert_eq!(read_tool_overrides(&text), tools);
    }

    #[test]
    fn test_make_path_key_leaves_builtin_make_alone() {
        let text = indoc! {"
            MAKE = /should/not/be/read
            MAKE_PATH = /usr/local/bin/gmake
        "};
        assert_eq!(read_tool_overrides(text).make_path(), Some("/usr/local/bin/gmake"));
        let rendered = render_env_file(&read_tool_overrides(text));
        assert_eq!(rendered.lines().last(), Some("MAKE_PATH = /usr/local/bin/gmake"));
        assert_eq!(read_tool_overrides("MAKE = /usr/bin/make\n").make_path, None);
    }
}
