//! MySQL store over a local unix socket.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info, warn};

use super::Store;
use crate::config::Credentials;
use crate::error::StoreError;
use crate::types::{find_price, Rate, Score, SecondaryCurrency};

const SELECT_RATES: &str = "SELECT ticker, CAST(price AS DOUBLE) AS price FROM rates";

const SELECT_SCORES: &str = "\
    SELECT address, \
           COUNT(rounds) AS c, \
           CAST(COALESCE(SUM(profit_usd), 0) AS DOUBLE) AS p, \
           CAST(ROUND(COALESCE(SUM(profit_eth), 0), 2) AS DOUBLE) AS eth, \
           CAST(ROUND(COALESCE(SUM(profit_bnb), 0), 2) AS DOUBLE) AS bnb \
    FROM winners \
    GROUP BY address \
    ORDER BY c DESC, p DESC";

fn update_profit_sql(currency: SecondaryCurrency) -> &'static str {
    match currency {
        SecondaryCurrency::Eth => {
            "UPDATE winners SET profit_usd = profit_eth * ? WHERE profit_eth > 0"
        }
        SecondaryCurrency::Bnb => {
            "UPDATE winners SET profit_usd = profit_bnb * ? WHERE profit_bnb > 0"
        }
    }
}

/// Used when the currency has no rate this cycle, so no stale price survives.
fn clear_profit_sql(currency: SecondaryCurrency) -> &'static str {
    match currency {
        SecondaryCurrency::Eth => "UPDATE winners SET profit_usd = NULL WHERE profit_eth > 0",
        SecondaryCurrency::Bnb => "UPDATE winners SET profit_usd = NULL WHERE profit_bnb > 0",
    }
}

/// Store backed by a single pooled MySQL connection.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect to `database` through the unix socket at `socket`.
    pub async fn connect(
        socket: &Path,
        database: &str,
        credentials: &Credentials,
    ) -> Result<Self, StoreError> {
        let options = MySqlConnectOptions::new()
            .socket(socket)
            .username(&credentials.user)
            .password(credentials.password.expose_secret())
            .database(database);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;

        info!(socket = %socket.display(), database, "Connected to MySQL");
        Ok(Self { pool })
    }
}

fn decode_rate(row: &MySqlRow) -> Result<Rate, sqlx::Error> {
    Ok(Rate {
        ticker: row.try_get(0)?,
        price: row.try_get(1)?,
    })
}

fn decode_score(row: &MySqlRow) -> Result<Score, sqlx::Error> {
    Ok(Score {
        address: row.try_get(0)?,
        rounds: row.try_get(1)?,
        profit_usd: row.try_get(2)?,
        profit_eth: row.try_get(3)?,
        profit_bnb: row.try_get(4)?,
    })
}

#[async_trait]
impl Store for MySqlStore {
    async fn read_rates(&self) -> Result<Vec<Rate>, StoreError> {
        let rows = sqlx::query(SELECT_RATES)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::query("read rates"))?;

        let rates = rows
            .iter()
            .map(decode_rate)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::decode("rates"))?;

        debug!(count = rates.len(), "Rates read");
        Ok(rates)
    }

    async fn apply_derived_profit(&self, rates: &[Rate]) -> Result<(), StoreError> {
        for currency in SecondaryCurrency::ALL {
            let price = find_price(rates, currency.ticker());
            let query = match price {
                Some(price) => sqlx::query(update_profit_sql(currency)).bind(price),
                None => {
                    warn!(%currency, "No rate for currency, clearing its derived profit");
                    sqlx::query(clear_profit_sql(currency))
                }
            };

            let result = query
                .execute(&self.pool)
                .await
                .map_err(StoreError::query("update derived profit"))?;

            debug!(
                %currency,
                price = ?price,
                rows = result.rows_affected(),
                "Derived profit updated"
            );
        }
        Ok(())
    }

    async fn read_aggregated_scores(&self) -> Result<Vec<Score>, StoreError> {
        let rows = sqlx::query(SELECT_SCORES)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::query("read scores"))?;

        let scores = rows
            .iter()
            .map(decode_score)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::decode("winners"))?;

        debug!(count = scores.len(), "Scores read");
        Ok(scores)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
