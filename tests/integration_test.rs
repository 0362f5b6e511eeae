use tempfile::TempDir;

use container_vulns::models::{Container, Host, Image};
use container_vulns::output::{self, CSV_HEADER};
use container_vulns::report;

fn fixture_hosts() -> Vec<Host> {
    serde_json::from_str(
        r#"[
        {"_id": "h1", "hostname": "node-1"},
        {"_id": "h2", "hostname": "node-2"}
    ]"#,
    )
    .unwrap()
}

fn fixture_images() -> Vec<Image> {
    serde_json::from_str(
        r#"[
        {
            "_id": "sha256:nginx",
            "repoTag": {"registry": "docker.io", "repo": "library/nginx", "tag": "1.25"},
            "distro": "Debian 12",
            "type": "image",
            "packages": [
                {"pkgs": [
                    {"name": "openssl", "version": "3.0.1", "path": "/usr/lib/ssl", "license": "Apache-2.0"},
                    {"name": "zlib", "version": "1.2.13", "path": "/usr/lib/zlib", "license": "Zlib"}
                ]}
            ],
            "vulnerabilities": [
                {
                    "cve": "CVE-2023-0001",
                    "severity": "critical",
                    "cvss": 9.8,
                    "description": "He said \"hi\"",
                    "published": 1700000000,
                    "fixDate": 0,
                    "discovered": 1700000000,
                    "packageName": "openssl",
                    "packageVersion": "3.0.1",
                    "status": "fixed in 3.0.2",
                    "cause": "upstream",
                    "link": "https://example.com/CVE-2023-0001"
                },
                {
                    "cve": "CVE-2023-0002",
                    "severity": "low",
                    "cvss": 3.1,
                    "description": "minor issue",
                    "published": 1700000000,
                    "packageName": "zlib",
                    "packageVersion": "1.2.13"
                }
            ]
        },
        {
            "_id": "sha256:clean",
            "repoTag": {"registry": "docker.io", "repo": "library/alpine", "tag": "3.19"},
            "distro": "Alpine 3.19",
            "type": "image"
        }
    ]"#,
    )
    .unwrap()
}

fn fixture_containers() -> Vec<Container> {
    serde_json::from_str(
        r#"[
        {
            "_id": "c1",
            "hostname": "node-1",
            "info": {"name": "web-1", "imageID": "sha256:nginx", "cluster": "prod", "namespace": "default"}
        },
        {
            "_id": "c2",
            "hostname": "node-1",
            "info": {"name": "web-2", "imageID": "sha256:nginx", "cluster": "prod", "namespace": "default"}
        },
        {
            "_id": "c3",
            "hostname": "node-2",
            "info": {"name": "pause"}
        },
        {
            "_id": "c4",
            "hostname": "node-2",
            "info": {"name": "sidecar", "imageID": "sha256:clean", "cluster": "prod", "namespace": "default"}
        }
    ]"#,
    )
    .unwrap()
}

#[test]
fn test_end_to_end_report() {
    let hosts = fixture_hosts();
    let images = fixture_images();
    let containers = fixture_containers();

    let report = report::build_report(&hosts, &images, &containers, false);

    // Two CVEs on one image/host/cluster/namespace combination; the
    // second container hits the same line ids and is deduplicated. The
    // container without an image id and the vulnerability-free image
    // contribute nothing.
    assert_eq!(report.rows.len(), 2);

    let cves: Vec<&str> = report.rows.iter().map(|r| r.cve.as_str()).collect();
    assert!(cves.contains(&"CVE-2023-0001"));
    assert!(cves.contains(&"CVE-2023-0002"));

    // Both containers appear once in the shared group
    let key = &report.rows[0].group_key;
    assert_eq!(report.container_groups[key], "web-1,web-2,");

    let first = report
        .rows
        .iter()
        .find(|r| r.cve == "CVE-2023-0001")
        .unwrap();
    assert_eq!(first.description, "He said |hi|");
    assert_eq!(first.cvss, "9.8");
    assert_eq!(first.published, "2023-11-14 22:13:20");
    assert_eq!(first.discovered, "2023-11-14 22:13:20");
    assert_eq!(first.fix_date, "");
    assert_eq!(first.package_license, "Apache-2.0");
    assert_eq!(first.package_path, "/usr/lib/ssl");
    assert_eq!(first.fix_status, "fixed in 3.0.2");
    assert_eq!(first.clusters, "prod");
    assert_eq!(first.namespaces, "default");

    let second = report
        .rows
        .iter()
        .find(|r| r.cve == "CVE-2023-0002")
        .unwrap();
    assert_eq!(second.package_license, "Zlib");
    assert_eq!(second.cause, "null");
}

#[test]
fn test_end_to_end_csv_file() {
    let hosts = fixture_hosts();
    let images = fixture_images();
    let containers = fixture_containers();

    let report = report::build_report(&hosts, &images, &containers, false);

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("container_vulns.csv");
    output::write_csv(&path, &report).expect("Failed to write CSV");

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);

    for data_line in &lines[1..] {
        assert!(data_line.starts_with("docker.io,library/nginx,1.25,sha256:nginx,Debian 12,node-1,TODO_LAYER,"));
        // Trailing comma of the group accumulation is trimmed
        assert!(data_line.contains("\"web-1,web-2\""));
    }

    assert!(lines[1].contains("He said |hi|"));
    assert!(content.ends_with('\n'));
}

#[test]
fn test_include_id_changes_container_column() {
    let hosts = fixture_hosts();
    let images = fixture_images();
    let containers = fixture_containers();

    let report = report::build_report(&hosts, &images, &containers, true);
    let key = &report.rows[0].group_key;
    assert_eq!(report.container_groups[key], "web-1(c1),web-2(c2),");
}

#[test]
fn test_empty_inventories_produce_header_only_file() {
    let report = report::build_report(&[], &[], &[], false);
    assert!(report.rows.is_empty());

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("empty.csv");
    output::write_csv(&path, &report).expect("Failed to write CSV");

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, format!("{}\n", CSV_HEADER));
}
