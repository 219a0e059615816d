//! Pod listing commands

use anyhow::Result;
use chrono::Local;
use tabled::Tabled;

use crate::client::{ApiClient, Pod, PodFilters, PodsView};
use crate::output::{
    color_status, dim_missing, pair, print_info, print_json, print_table, print_warning,
    OutputFormat,
};

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Data Center")]
    data_center: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod_name: String,
    #[tabled(rename = "Application")]
    application: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Type")]
    deployment_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU Req/Lim")]
    cpu: String,
    #[tabled(rename = "Mem Req/Lim")]
    memory: String,
    #[tabled(rename = "Usage CPU/Mem")]
    usage: String,
    #[tabled(rename = "Node")]
    node: String,
}

impl From<&Pod> for PodRow {
    fn from(pod: &Pod) -> Self {
        Self {
            data_center: dim_missing(&pod.data_center),
            namespace: pod.namespace.clone(),
            pod_name: pod.pod_name.clone(),
            application: dim_missing(&pod.application_name),
            version: dim_missing(&pod.application_version),
            deployment_type: pod.deployment_type.clone(),
            status: color_status(&pod.pod_status),
            cpu: pair(&pod.cpu_request, &pod.cpu_limit),
            memory: pair(&pod.memory_request, &pod.memory_limit),
            usage: pair(&pod.cpu_usage, &pod.memory_usage),
            node: dim_missing(&pod.node_name),
        }
    }
}

#[derive(Tabled)]
struct ChoiceRow {
    #[tabled(rename = "Filter")]
    filter: &'static str,
    #[tabled(rename = "Values")]
    values: String,
}

/// List pods from the current snapshot
pub async fn list_pods(client: &ApiClient, filters: PodFilters, format: OutputFormat) -> Result<()> {
    let view = client.pods(&filters).await?;

    if view.generation == 0 {
        print_warning("No snapshot has been published yet; try `podinv refresh`");
    }

    let rows: Vec<PodRow> = view.pods.iter().map(PodRow::from).collect();
    print_table(&rows, &view.pods, format);

    if matches!(format, OutputFormat::Table) && view.generation > 0 {
        print_info(&summary(&view));
    }

    Ok(())
}

/// Show the values each filter can take
pub async fn show_filters(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let view = client.pods(&PodFilters::default()).await?;
    let choices = &view.filter_choices;

    match format {
        OutputFormat::Json => print_json(choices),
        OutputFormat::Table => {
            let rows = vec![
                ChoiceRow {
                    filter: "Data centers",
                    values: choices.data_centers.join(", "),
                },
                ChoiceRow {
                    filter: "Namespaces",
                    values: choices.namespaces.join(", "),
                },
                ChoiceRow {
                    filter: "Pod statuses",
                    values: choices.pod_statuses.join(", "),
                },
            ];
            print_table(&rows, choices, format);
        }
    }

    Ok(())
}

fn summary(view: &PodsView) -> String {
    let published = view
        .published_at
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{} of {} pods (snapshot #{}, published {})",
        view.pods.len(),
        view.total,
        view.generation,
        published
    )
}
