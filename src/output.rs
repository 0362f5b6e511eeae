use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::report::{CsvRow, Report};

/// Fixed header. Several columns are deliberately emitted as placeholder
/// strings; the console report this replaces never populated them either.
pub const CSV_HEADER: &str = "Registry,Repository,Tag,Id,Distro,Hosts,Layer,CVE ID,Compliance ID,Type,Severity,Packages,Source Package,Package Version,Package License,CVSS,Fix Status,Fix Date,Grace Days,Risk Factors,Vulnerability Tags,Description,Cause,\"Containers[Name(ID),Name(ID)...]\",Custom Labels,Published,Discovered,Binaries,Clusters,Namespaces,Collections,Digest,Vulnerability Link,Apps,Package Path";

const LAYER: &str = "TODO_LAYER";
const SOURCE_PACKAGE: &str = "TODO_SOURCE_PACKAGE";
const GRACE_DAYS: &str = "TODO_GRACEPERIODDAYS";
const RISK_FACTORS: &str = "TODO_RISK_FACTORS";
const VULN_TAGS: &str = "TODO_TAGS";
const CUSTOM_LABELS: &str = "TODO_CUSTOM_LABELS";
const BINARIES: &str = "TODO_BINARIES";
const COLLECTIONS: &str = "TODO_COLLECTIONS";
const DIGEST: &str = "TODO_DIGEST";
const APPS: &str = "TODO_APPS";

/// Serialize one row. Only Description, Cause, and the container list are
/// quoted; their embedded quotes were already rewritten to pipes when the
/// row was materialized, so no further escaping happens here.
pub fn csv_line(row: &CsvRow, containers: &str) -> String {
    let description = format!("\"{}\"", row.description);
    let cause = format!("\"{}\"", row.cause);
    let containers = format!("\"{}\"", containers);

    [
        row.registry.as_str(),
        row.repository.as_str(),
        row.tag.as_str(),
        row.image_id.as_str(),
        row.distro.as_str(),
        row.hostname.as_str(),
        LAYER,
        row.cve.as_str(),
        row.compliance_id.as_str(),
        row.image_type.as_str(),
        row.severity.as_str(),
        row.packages.as_str(),
        SOURCE_PACKAGE,
        row.package_version.as_str(),
        row.package_license.as_str(),
        row.cvss.as_str(),
        row.fix_status.as_str(),
        row.fix_date.as_str(),
        GRACE_DAYS,
        RISK_FACTORS,
        VULN_TAGS,
        description.as_str(),
        cause.as_str(),
        containers.as_str(),
        CUSTOM_LABELS,
        row.published.as_str(),
        row.discovered.as_str(),
        BINARIES,
        row.clusters.as_str(),
        row.namespaces.as_str(),
        COLLECTIONS,
        DIGEST,
        row.vuln_link.as_str(),
        APPS,
        row.package_path.as_str(),
    ]
    .join(",")
}

/// Write the header and all rows to `path`. Each row resolves its final
/// container list from the group accumulation here, after the full pass
/// over containers has completed, and drops the trailing comma.
pub fn write_csv<P: AsRef<Path>>(path: P, report: &Report) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", CSV_HEADER).context("Failed to write CSV header")?;

    for row in &report.rows {
        let containers = report
            .container_groups
            .get(&row.group_key)
            .map(String::as_str)
            .unwrap_or_default();
        let containers = containers.strip_suffix(',').unwrap_or(containers);
        writeln!(out, "{}", csv_line(row, containers)).context("Failed to write CSV row")?;
    }

    out.flush().context("Failed to flush output file")?;
    info!("Wrote {} rows to {}", report.rows.len(), path.display());

    Ok(())
}
