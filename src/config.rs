use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Overrides `cluster.db_password` so the secret can stay out of the file
pub const PASSWORD_ENV: &str = "DWH_DB_PASSWORD";

pub const DEFAULT_REGION: &str = "us-west-2";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub cluster: Option<ClusterConfig>,
    pub iam_role: Option<IamRoleConfig>,
    pub s3: Option<S3Config>,
    pub local: Option<LocalConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    #[serde(default)]
    pub db_password: String,
    #[serde(default = "default_port")]
    pub db_port: u16,
    #[serde(default)]
    pub sslmode: SslMode,
}

fn default_port() -> u16 {
    5439
}

#[derive(Debug, Deserialize, Clone)]
pub struct IamRoleConfig {
    pub arn: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Local rehearsal target: a SQLite file plus local copies of the S3 data
#[derive(Debug, Deserialize, Clone)]
pub struct LocalConfig {
    pub database: PathBuf,
    pub log_data: PathBuf,
    pub log_jsonpath: PathBuf,
    pub song_data: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            if let Some(cluster) = config.cluster.as_mut() {
                cluster.db_password = password;
            }
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn cluster(&self) -> Result<&ClusterConfig> {
        let cluster = self
            .cluster
            .as_ref()
            .context("Missing [cluster] section in config")?;
        require("cluster.host", &cluster.host)?;
        require("cluster.db_name", &cluster.db_name)?;
        require("cluster.db_user", &cluster.db_user)?;
        Ok(cluster)
    }

    pub fn iam_role(&self) -> Result<&IamRoleConfig> {
        let role = self
            .iam_role
            .as_ref()
            .context("Missing [iam_role] section in config")?;
        require("iam_role.arn", &role.arn)?;
        Ok(role)
    }

    pub fn s3(&self) -> Result<&S3Config> {
        let s3 = self.s3.as_ref().context("Missing [s3] section in config")?;
        require("s3.log_data", &s3.log_data)?;
        require("s3.log_jsonpath", &s3.log_jsonpath)?;
        require("s3.song_data", &s3.song_data)?;
        require("s3.region", &s3.region)?;
        Ok(s3)
    }

    pub fn local(&self) -> Result<&LocalConfig> {
        let local = self
            .local
            .as_ref()
            .context("Missing [local] section in config (required for --target sqlite)")?;
        utf8_path("local.log_data", &local.log_data)?;
        utf8_path("local.log_jsonpath", &local.log_jsonpath)?;
        utf8_path("local.song_data", &local.song_data)?;
        Ok(local)
    }
}

/// Local data paths are rendered into COPY text, so they must be UTF-8
pub fn utf8_path<'a>(key: &str, path: &'a Path) -> Result<&'a str> {
    path.to_str()
        .with_context(|| format!("Config value {} is not valid UTF-8: {:?}", key, path))
}

fn require(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("Config value {} must not be empty", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[cluster]
host = "dwhcluster.abc123.us-west-2.redshift.amazonaws.com"
db_name = "dwh"
db_user = "dwhuser"
db_password = "Passw0rd"

[iam_role]
arn = "arn:aws:iam::123456789012:role/dwhRole"

[s3]
log_data = "s3://udacity-dend/log_data"
log_jsonpath = "s3://udacity-dend/log_json_path.json"
song_data = "s3://udacity-dend/song_data"

[local]
database = "sparkify.db"
log_data = "data/log_data"
log_jsonpath = "data/log_json_path.json"
song_data = "data/song_data"
"#;

    #[test]
    fn test_parse_full_config_with_defaults() {
        let config = Config::parse(FULL).unwrap();
        let cluster = config.cluster().unwrap();
        assert_eq!(cluster.db_port, 5439);
        assert_eq!(cluster.sslmode, SslMode::Prefer);
        assert_eq!(config.s3().unwrap().region, "us-west-2");
        assert_eq!(
            config.iam_role().unwrap().arn,
            "arn:aws:iam::123456789012:role/dwhRole"
        );
        assert_eq!(config.local().unwrap().database, PathBuf::from("sparkify.db"));
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let config = Config::parse("[iam_role]\narn = \"x\"\n").unwrap();
        let err = config.cluster().unwrap_err();
        assert!(err.to_string().contains("[cluster]"));
        assert!(config.s3().is_err());
        assert!(config.local().is_err());
    }

    #[test]
    fn test_empty_value_is_an_error() {
        let config = Config::parse("[iam_role]\narn = \"  \"\n").unwrap();
        let err = config.iam_role().unwrap_err();
        assert!(err.to_string().contains("iam_role.arn"));
    }

    #[test]
    fn test_sslmode_and_port_override() {
        let config = Config::parse(
            "[cluster]\nhost = \"h\"\ndb_name = \"d\"\ndb_user = \"u\"\ndb_port = 5440\nsslmode = \"require\"\n",
        )
        .unwrap();
        let cluster = config.cluster().unwrap();
        assert_eq!(cluster.db_port, 5440);
        assert_eq!(cluster.sslmode, SslMode::Require);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(Config::parse("[cluster\nhost =").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_local_path_is_an_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let config = Config {
            local: Some(LocalConfig {
                database: PathBuf::from("sparkify.db"),
                log_data: PathBuf::from(OsStr::from_bytes(b"data/log_\xff")),
                log_jsonpath: PathBuf::from("data/log_json_path.json"),
                song_data: PathBuf::from("data/song_data"),
            }),
            ..Default::default()
        };

        let err = config.local().unwrap_err();
        assert!(err.to_string().contains("local.log_data"));
    }
}
