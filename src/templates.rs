pub const OPENOCD_CFG: &str = include_str!("templates/openocd.cfg.tmpl");
