use anyhow::Result;
use serde::Serialize;
use tinytemplate::TinyTemplate;

pub fn render<T: Serialize>(template: &str, ctx: &T) -> Result<String> {
    let mut tt = TinyTemplate::new();
    // 输出的是配置文件，不做 HTML 转义
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("tpl", template)?;
    Ok(tt.render("tpl", ctx)?)
}
