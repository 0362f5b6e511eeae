use chrono::DateTime;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::models::{Container, Host, Image, Package};

/// One CSV row, keyed by a unique (registry, repo, image, cluster,
/// namespace, host, CVE) combination. The container list is not stored
/// here: it is still being accumulated while rows are materialized, so
/// each row keeps its group key and the final list is resolved at write
/// time.
#[derive(Clone, Debug, Default)]
pub struct CsvRow {
    pub registry: String,
    pub repository: String,
    pub tag: String,
    pub image_id: String,
    pub distro: String,
    pub hostname: String,
    pub cve: String,
    pub compliance_id: String,
    pub image_type: String,
    pub severity: String,
    pub packages: String,
    pub package_version: String,
    pub package_license: String,
    pub cvss: String,
    pub fix_status: String,
    pub fix_date: String,
    pub description: String,
    pub cause: String,
    pub published: String,
    pub discovered: String,
    pub clusters: String,
    pub namespaces: String,
    pub vuln_link: String,
    pub package_path: String,

    /// Key into [`Report::container_groups`]
    pub group_key: String,
}

/// Result of one pass over the container inventory
#[derive(Debug, Default)]
pub struct Report {
    pub rows: Vec<CsvRow>,
    /// (registry + repo + image + hostname + namespace) -> comma-terminated
    /// accumulation of container display names sharing that key
    pub container_groups: HashMap<String, String>,
}

/// O(1) lookups over the fetched inventories
pub struct Indexes<'a> {
    pub hosts_by_id: HashMap<&'a str, &'a Host>,
    pub hosts_by_name: HashMap<&'a str, &'a Host>,
    pub images_by_id: HashMap<&'a str, &'a Image>,
}

impl<'a> Indexes<'a> {
    pub fn build(hosts: &'a [Host], images: &'a [Image]) -> Self {
        let mut hosts_by_id = HashMap::new();
        let mut hosts_by_name = HashMap::new();
        for host in hosts {
            hosts_by_id.insert(host.id.as_str(), host);
            hosts_by_name.insert(host.hostname.as_str(), host);
        }

        let mut images_by_id = HashMap::new();
        for image in images {
            images_by_id.insert(image.id.as_str(), image);
        }

        Self {
            hosts_by_id,
            hosts_by_name,
            images_by_id,
        }
    }
}

/// Join hosts, images, and containers into CSV rows, one per unique
/// (registry, repo, image, cluster, namespace, host, CVE) combination.
///
/// Containers are processed in arrival order. A container without an
/// image id, or whose image is absent from the index (filtered out by the
/// base-image query or stale), contributes nothing.
pub fn build_report(
    hosts: &[Host],
    images: &[Image],
    containers: &[Container],
    include_id: bool,
) -> Report {
    let indexes = Indexes::build(hosts, images);
    info!(
        "Indexed {} hosts and {} deployed images",
        indexes.hosts_by_id.len(),
        indexes.images_by_id.len()
    );

    let mut container_groups: HashMap<String, String> = HashMap::new();
    let mut seen_lines: HashSet<String> = HashSet::new();
    let mut rows: Vec<CsvRow> = Vec::new();

    for container in containers {
        let Some(image_id) = container.info.image_id.as_deref() else {
            debug!(
                container = %container.info.name,
                "Container record has no image id, skipping"
            );
            continue;
        };
        let hostname = container.hostname.as_str();
        let cluster = container.info.cluster.clone().unwrap_or_default();
        let namespace = container.info.namespace.clone().unwrap_or_default();

        if !indexes.hosts_by_name.contains_key(hostname) {
            debug!(hostname, "Container hostname not in host inventory");
        }

        let Some(image) = indexes.images_by_id.get(image_id) else {
            debug!(image_id, "Image not in index, skipping container");
            continue;
        };

        let registry = image.repo_tag.registry.as_str();
        let repo = image.repo_tag.repo.as_str();
        let tag = image.repo_tag.tag.as_str();

        // name+version -> package, for license/path backfill. Last write
        // wins on duplicate keys within an image.
        let mut package_lookup: HashMap<String, &Package> = HashMap::new();
        for group in &image.packages {
            for pkg in &group.pkgs {
                if let (Some(name), Some(version)) = (&pkg.name, &pkg.version) {
                    package_lookup.insert(format!("{}{}", name, version), pkg);
                }
            }
        }

        if image.vulnerabilities.is_empty() {
            continue;
        }

        for vuln in &image.vulnerabilities {
            let cve = vuln.cve.as_str();
            let line_id = format!(
                "{}{}{}{}{}{}{}",
                registry, repo, image_id, cluster, namespace, hostname, cve
            );
            let group_key = format!(
                "{}{}{}{}{}",
                registry, repo, image_id, hostname, namespace
            );

            // Accumulate this container into its group. The membership
            // check is substring-based on the formatted name, so a name
            // that is a substring of an already-listed name is treated
            // as a duplicate.
            let name = display_name(container, include_id);
            let group = container_groups.entry(group_key.clone()).or_default();
            if !group.contains(name.as_str()) {
                group.push_str(&name);
                group.push(',');
            }

            if seen_lines.contains(&line_id) {
                continue;
            }
            seen_lines.insert(line_id);

            let package_key = format!(
                "{}{}",
                vuln.package_name.as_deref().unwrap_or_default(),
                vuln.package_version.as_deref().unwrap_or_default()
            );
            let (package_path, package_license) = match package_lookup.get(&package_key) {
                Some(pkg) => (pkg.path.clone(), pkg.license.clone()),
                None => (String::new(), String::new()),
            };

            rows.push(CsvRow {
                registry: registry.to_string(),
                repository: repo.to_string(),
                tag: tag.to_string(),
                image_id: image_id.to_string(),
                distro: image.distro.clone(),
                hostname: hostname.to_string(),
                cve: cve.to_string(),
                compliance_id: if vuln.templates.is_empty() {
                    "null".to_string()
                } else {
                    vuln.templates.join(";")
                },
                image_type: image.image_type.clone(),
                severity: or_null(&vuln.severity),
                packages: or_null(&vuln.package_name),
                package_version: or_null(&vuln.package_version),
                package_license,
                cvss: vuln
                    .cvss
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "null".to_string()),
                fix_status: or_null(&vuln.status),
                fix_date: epoch_or_empty(vuln.fix_date),
                description: strip_csv_breaking(vuln.description.as_deref().unwrap_or("null")),
                cause: strip_csv_breaking(vuln.cause.as_deref().unwrap_or("null")),
                published: epoch_or_empty(vuln.published),
                discovered: epoch_or_empty(vuln.discovered),
                clusters: cluster.clone(),
                namespaces: namespace.clone(),
                vuln_link: or_null(&vuln.link),
                package_path,
                group_key,
            });
        }
    }

    Report {
        rows,
        container_groups,
    }
}

/// Container display name for the Containers column: `name`, or
/// `name(id)` when id inclusion is requested
fn display_name(container: &Container, include_id: bool) -> String {
    if include_id {
        format!("{}({})", container.info.name, container.id)
    } else {
        container.info.name.clone()
    }
}

/// Epoch seconds to `YYYY-MM-DD HH:MM:SS` UTC; zero (console has no
/// value) becomes an empty string
pub fn epoch_or_empty(secs: i64) -> String {
    if secs == 0 {
        return String::new();
    }
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Replace embedded double and single quotes with a pipe so the field
/// survives the fixed quoting applied at serialization time
pub fn strip_csv_breaking(original: &str) -> String {
    original.replace(['"', '\''], "|")
}

fn or_null(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "null".to_string())
}
