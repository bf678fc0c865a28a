use crate::config::RemedyConfig;
use crate::order::{BuildItem, ModifyItem, Order};

fn push_field(out: &mut String, label: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("{label}:\t {value}\n"));
}

/// Render the approval preamble; the order link is only included when an
/// ordering portal is configured.
fn append_preamble(out: &mut String, order: &Order, config: &RemedyConfig, action: &str) {
    out.push_str(&format!(
        "Once this work order is \"In Progress\" and the funding process has been marked \
         \"Success\", the server {action} will proceed.\n"
    ));
    if let Some(href) = config.order_href(&order.id) {
        out.push_str("-OR-\n");
        out.push_str("View, Edit, Approve or Deny the order here:\n");
        out.push_str(&format!("{href}\n"));
    }
    out.push('\n');
}

/// Description text for a new server build.
pub fn build_description(order: &Order, item: &BuildItem, config: &RemedyConfig) -> String {
    let server = &item.server;
    let mut out = String::new();
    append_preamble(&mut out, order, config, "build");

    push_field(&mut out, "Server Name", &server.hostname);
    push_field(&mut out, "Quantity", server.quantity);
    push_field(&mut out, "Requester", &order.owner);
    push_field(
        &mut out,
        "On Behalf of",
        order.on_behalf_of.as_deref().unwrap_or(""),
    );
    push_field(&mut out, "Group", order.group.display_path());
    push_field(&mut out, "Quoted Total Cost", &item.quoted_total_cost);
    push_field(&mut out, "Project #", &server.cost_center);
    push_field(&mut out, "Funding Source", &server.funding_source);

    out.push_str("\n--HARDWARE--\n");
    if let Some(blade) = config.blade_share_cost {
        push_field(
            &mut out,
            "Share of Blade Cost",
            format!("${:.2}", blade * f64::from(server.quantity)),
        );
    }
    push_field(&mut out, "OS", &server.os_build);
    let cost = &item.hardware_cost;
    push_field(
        &mut out,
        "CPU Cores",
        format!("{} (${:.2})", server.cpu_count, cost.cpu),
    );
    push_field(
        &mut out,
        "Memory GB",
        format!("{} (${:.2})", server.mem_gb, cost.mem),
    );
    push_field(
        &mut out,
        "Disk 1 GB",
        format!("{} (${:.2} all disks included)", server.disk_gb, cost.disk),
    );

    let env = &item.environment;
    let cap = &item.capacity;
    out.push('\n');
    push_field(
        &mut out,
        "Environment",
        format!("{} / {}", env.name, env.cluster),
    );
    push_field(&mut out, "Datastore", &env.datastore);
    out.push_str("Environment Available Capacity:\n");
    push_field(&mut out, "\tCPU", cap.cpu_available);
    push_field(&mut out, "\tMemory GB", cap.mem_available);
    push_field(&mut out, "\tDisk GB", cap.disk_available);
    push_field(&mut out, "\tVM Count", cap.vm_count);

    let attrs = &server.attributes;
    out.push_str("\n--ATTRIBUTES--\n");
    push_field(&mut out, "Tech Doc URL", &attrs.technical_doc_url);
    push_field(&mut out, "Application", &attrs.application);
    push_field(&mut out, "App Vendor", &attrs.app_vendor);
    push_field(&mut out, "Environment", &attrs.environment);
    push_field(&mut out, "Contact(s)", &attrs.contacts);
    push_field(&mut out, "Description", &attrs.description);
    push_field(&mut out, "Patch Group", &attrs.patch_group);
    push_field(&mut out, "AD OU", &attrs.organizational_unit);
    push_field(&mut out, "FDA 510(k)", &attrs.fda_510k);

    out
}

/// Description text for a modification of existing servers. Each requested
/// change gets its own `item: change` line under `--MODIFICATION--`.
pub fn modify_description(order: &Order, item: &ModifyItem, config: &RemedyConfig) -> String {
    let mut out = String::new();
    append_preamble(&mut out, order, config, "modification");

    push_field(&mut out, "Server Name", &item.hostname);
    push_field(&mut out, "Quantity", item.server_count);
    push_field(&mut out, "Requester", &order.owner);
    push_field(&mut out, "Group", order.group.display_path());
    push_field(&mut out, "Total Quoted Cost", &item.rate_display);
    push_field(&mut out, "Funding Source", &item.funding_source);

    out.push_str("\n--MODIFICATION--\n");
    for change in &item.changes {
        out.push_str(&format!("{}: {}\n", change.item, change.change));
    }
    out
}
