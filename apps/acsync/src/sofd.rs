//! Staff directory client over the SOFD employee database.
//!
//! Filters select active employees only. Numeric filter values arrive as
//! configured strings and are parsed here; a non-numeric value makes that
//! one query fail, which the aggregator logs and skips.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use acsync_core::{SourceError, StaffClient, StaffEmployee, StaffFilter};

const SELECT_COLUMNS: &str =
    "SELECT staff_number, display_name, phone, account, card FROM sofd_employees";

#[derive(Debug, FromRow)]
struct EmployeeRow {
    staff_number: String,
    display_name: String,
    phone: Option<String>,
    account: Option<String>,
    card: Option<String>,
}

impl From<EmployeeRow> for StaffEmployee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            staff_number: row.staff_number,
            display_name: row.display_name,
            phone: row.phone,
            account: row.account,
            card: row.card,
        }
    }
}

/// Staff client backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct SofdStaff {
    pool: PgPool,
}

impl SofdStaff {
    /// Connect to the staff database.
    pub async fn connect(database_url: &str) -> Result<Self, SourceError> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await
            .map_err(|e| {
                SourceError::backend_with_source("failed to connect to staff database", e)
            })?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_id(filter: &StaffFilter, value: &str) -> Result<i32, SourceError> {
        value.trim().parse::<i32>().map_err(|_| {
            SourceError::query(format!("{filter}: '{value}' is not a numeric id"))
        })
    }
}

#[async_trait]
impl StaffClient for SofdStaff {
    async fn query(&self, filter: &StaffFilter) -> Result<Vec<StaffEmployee>, SourceError> {
        let rows = match filter {
            StaffFilter::JobTitleId(value) => {
                let id = Self::parse_id(filter, value)?;
                sqlx::query_as::<_, EmployeeRow>(&format!(
                    "{SELECT_COLUMNS} WHERE active AND job_title_id = $1"
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await
            }
            StaffFilter::JobTitleName(value) => {
                sqlx::query_as::<_, EmployeeRow>(&format!(
                    "{SELECT_COLUMNS} WHERE active AND job_title_name = $1"
                ))
                .bind(value)
                .fetch_all(&self.pool)
                .await
            }
            StaffFilter::OrgId(value) => {
                let id = Self::parse_id(filter, value)?;
                sqlx::query_as::<_, EmployeeRow>(&format!(
                    "{SELECT_COLUMNS} WHERE active AND organization_id = $1"
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await
            }
            StaffFilter::OrgName(value) => {
                sqlx::query_as::<_, EmployeeRow>(&format!(
                    "{SELECT_COLUMNS} WHERE active AND organization_name = $1"
                ))
                .bind(value)
                .fetch_all(&self.pool)
                .await
            }
            StaffFilter::PayClass(value) => {
                sqlx::query_as::<_, EmployeeRow>(&format!(
                    "{SELECT_COLUMNS} WHERE active AND pay_class = $1"
                ))
                .bind(value)
                .fetch_all(&self.pool)
                .await
            }
        };

        let rows = rows
            .map_err(|e| SourceError::backend_with_source(format!("staff query {filter}"), e))?;

        debug!(filter = %filter, count = rows.len(), "staff query");
        Ok(rows.into_iter().map(StaffEmployee::from).collect())
    }

    async fn find_by_number(
        &self,
        staff_number: &str,
    ) -> Result<Option<StaffEmployee>, SourceError> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "{SELECT_COLUMNS} WHERE staff_number = $1"
        ))
        .bind(staff_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SourceError::backend_with_source("staff lookup", e))?;

        Ok(row.map(StaffEmployee::from))
    }

    async fn write_card(&self, staff_number: &str, card: &str) -> Result<(), SourceError> {
        let result =
            sqlx::query("UPDATE sofd_employees SET card = $1 WHERE staff_number = $2")
                .bind(card)
                .bind(staff_number)
                .execute(&self.pool)
                .await
                .map_err(|e| SourceError::backend_with_source("staff card update", e))?;

        if result.rows_affected() == 0 {
            return Err(SourceError::backend(format!(
                "staff record '{staff_number}' disappeared before card write"
            )));
        }

        debug!(staff_number, card, "wrote card to staff record");
        Ok(())
    }
}
