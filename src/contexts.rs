use serde::Serialize;

#[derive(Serialize)]
pub struct OpenOcdContext<'a> {
    pub interface: &'a str,
    pub target: &'a str,
}
