//! Table rendering for `awxctl status`.

mod instance_list_ext;
mod pod_list_ext;
mod service_list_ext;

pub use self::{
    instance_list_ext::InstanceListExt, pod_list_ext::PodListExt,
    service_list_ext::ServiceListExt,
};

/// Borderless table in the style of `kubectl get`.
fn render<R>(header: &[&str], rows: R) -> String
where
    R: IntoIterator,
    R::Item: Into<comfy_table::Row>,
{
    comfy_table::Table::new()
        .load_preset(comfy_table::presets::NOTHING)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .set_header(header.to_vec())
        .add_rows(rows)
        .to_string()
}
