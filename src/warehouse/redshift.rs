use anyhow::{Context, Result};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio::runtime::Runtime;
use tokio_postgres::config::SslMode as PgSslMode;
use tokio_postgres::{Client, SimpleQueryMessage};
use tracing::{debug, error, info};

use super::Warehouse;
use crate::catalog::Statement;
use crate::config::{ClusterConfig, SslMode};

/// Redshift cluster reached over the Postgres wire protocol.
///
/// Statements go through the simple-query protocol, so each one commits
/// as soon as it completes.
pub struct RedshiftWarehouse {
    // Declared before the runtime so it is dropped first
    client: Client,
    runtime: Runtime,
}

impl RedshiftWarehouse {
    pub fn connect(cluster: &ClusterConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let mut pg = tokio_postgres::Config::new();
        pg.host(&cluster.host)
            .port(cluster.db_port)
            .dbname(&cluster.db_name)
            .user(&cluster.db_user)
            .password(&cluster.db_password)
            .application_name(env!("CARGO_PKG_NAME"))
            .ssl_mode(match cluster.sslmode {
                SslMode::Disable => PgSslMode::Disable,
                SslMode::Prefer => PgSslMode::Prefer,
                SslMode::Require => PgSslMode::Require,
            });

        let connector = TlsConnector::new().context("Failed to initialise TLS")?;
        let tls = MakeTlsConnector::new(connector);

        info!(
            host = %cluster.host,
            port = cluster.db_port,
            db = %cluster.db_name,
            user = %cluster.db_user,
            "connecting to redshift"
        );
        let (client, connection) = runtime
            .block_on(pg.connect(tls))
            .with_context(|| {
                format!(
                    "Failed to connect to {}:{}/{}",
                    cluster.host, cluster.db_port, cluster.db_name
                )
            })?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "redshift connection error");
            }
        });

        Ok(Self { client, runtime })
    }

    fn simple_query(&self, sql: &str) -> Result<Vec<SimpleQueryMessage>> {
        Ok(self.runtime.block_on(self.client.simple_query(sql))?)
    }
}

impl Warehouse for RedshiftWarehouse {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        let messages = self.simple_query(&statement.sql())?;
        let rows: u64 = messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(n) => *n,
                _ => 0,
            })
            .sum();
        debug!(statement = %statement.name, rows, "redshift statement complete");
        Ok(rows)
    }

    fn count_rows(&mut self, table: &str) -> Result<i64> {
        let messages = self.simple_query(&format!("SELECT COUNT(*) FROM {}", table))?;
        let value = messages
            .iter()
            .find_map(|m| match m {
                SimpleQueryMessage::Row(row) => row.get(0).map(str::to_string),
                _ => None,
            })
            .with_context(|| format!("COUNT(*) on {} returned no rows", table))?;

        value
            .parse()
            .with_context(|| format!("Unexpected row count for {}: {:?}", table, value))
    }
}
