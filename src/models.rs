use serde::Deserialize;

/// Host record from `/api/v1/hosts`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Host {
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub hostname: String,
}

/// Deployed image record from `/api/v1/images`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Image {
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default, rename = "repoTag")]
    pub repo_tag: RepoTag,
    #[serde(default)]
    pub distro: String,
    #[serde(default, rename = "type")]
    pub image_type: String,
    #[serde(default)]
    pub packages: Vec<PackageGroup>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RepoTag {
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub tag: String,
}

/// Packages are grouped by type (os, jar, python, ...) in the API response
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PackageGroup {
    #[serde(default)]
    pub pkgs: Vec<Package>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Package {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub license: String,
}

/// Vulnerability finding attached to an image. Date fields are epoch
/// seconds, zero when the console has no value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    #[serde(default)]
    pub cve: String,
    pub severity: Option<String>,
    /// Kept as a raw JSON number so the emitted column preserves the
    /// console's own rendering (`7.0` stays `7.0`, `7` stays `7`)
    pub cvss: Option<serde_json::Number>,
    pub description: Option<String>,
    #[serde(default)]
    pub published: i64,
    #[serde(default)]
    pub fix_date: i64,
    #[serde(default)]
    pub discovered: i64,
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub status: Option<String>,
    pub cause: Option<String>,
    pub link: Option<String>,
    #[serde(default)]
    pub templates: Vec<String>,
}

/// Running container record from `/api/v1/containers`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Container {
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub info: ContainerInfo,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContainerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "imageID")]
    pub image_id: Option<String>,
    pub cluster: Option<String>,
    pub namespace: Option<String>,
}
