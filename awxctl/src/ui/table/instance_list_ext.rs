use kube::{ResourceExt, api::DynamicObject};

pub trait InstanceListExt {
    /// Renders NAME, VERSION and ADMIN columns of `AWX` objects, the latter
    /// two as reported by the operator in `.status`.
    fn render_table(&self) -> String;
}

impl InstanceListExt for [DynamicObject] {
    fn render_table(&self) -> String {
        super::render(&["NAME", "VERSION", "ADMIN"], self.iter().map(instance_column))
    }
}

fn instance_column(instance: &DynamicObject) -> [String; 3] {
    let status = |key: &str| {
        instance.data["status"][key].as_str().map_or_else(|| "<pending>".to_string(), ToString::to_string)
    };
    [instance.name_any(), status("version"), status("adminUserName")]
}
