//! PostgreSQL campaign store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        campaign::NewCampaign, Campaign, ClickCounts, ClickEvent, Conversion, ConversionInsert,
        NewClickEvent, NewConversion, UtmSource,
    },
};

use super::CampaignStore;

const CAMPAIGN_COLUMNS: &str = r#"
    c.id, c.campaign_name, c.link_code, c.total_clicks, c.unique_clicks, c.created_at,
    ARRAY(SELECT ip FROM campaign_ips WHERE campaign_id = c.id ORDER BY first_seen, ip) AS unique_ips
"#;

#[derive(Debug, FromRow)]
struct CampaignRow {
    id: Uuid,
    campaign_name: String,
    link_code: String,
    total_clicks: i64,
    unique_clicks: i64,
    created_at: DateTime<Utc>,
    unique_ips: Vec<String>,
}

#[derive(Debug, FromRow)]
struct SourceRow {
    id: Uuid,
    campaign_id: Uuid,
    utm_source: String,
    campaigner_name: Option<String>,
    link_code: String,
    total_clicks: i64,
    unique_clicks: i64,
    created_at: DateTime<Utc>,
    unique_ips: Vec<String>,
}

#[derive(Debug, FromRow)]
struct ConversionRow {
    id: Uuid,
    source_id: Uuid,
    client_name: String,
    client_email: String,
    client_phone: String,
    booked_at: DateTime<Utc>,
}

impl From<ConversionRow> for Conversion {
    fn from(row: ConversionRow) -> Self {
        Conversion {
            id: row.id,
            client_name: row.client_name,
            client_email: row.client_email,
            client_phone: row.client_phone,
            booked_at: row.booked_at,
        }
    }
}

#[derive(Clone)]
pub struct PgCampaignStore {
    pool: Pool<Postgres>,
}

impl PgCampaignStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load campaign rows and stitch their sources and conversions back in
    async fn assemble(&self, rows: Vec<CampaignRow>) -> AppResult<Vec<Campaign>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let sources = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT s.id, s.campaign_id, s.utm_source, s.campaigner_name, s.link_code,
                   s.total_clicks, s.unique_clicks, s.created_at,
                   ARRAY(SELECT ip FROM utm_source_ips WHERE source_id = s.id ORDER BY first_seen, ip) AS unique_ips
            FROM utm_sources s
            WHERE s.campaign_id = ANY($1)
            ORDER BY s.created_at, s.utm_source
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let conversions = sqlx::query_as::<_, ConversionRow>(
            r#"
            SELECT cv.id, cv.source_id, cv.client_name, cv.client_email, cv.client_phone, cv.booked_at
            FROM conversions cv
            JOIN utm_sources s ON s.id = cv.source_id
            WHERE s.campaign_id = ANY($1)
            ORDER BY cv.booked_at, cv.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut conversions_by_source: HashMap<Uuid, Vec<Conversion>> = HashMap::new();
        for row in conversions {
            conversions_by_source
                .entry(row.source_id)
                .or_default()
                .push(row.into());
        }

        let mut sources_by_campaign: HashMap<Uuid, Vec<UtmSource>> = HashMap::new();
        for row in sources {
            let conversions = conversions_by_source.remove(&row.id).unwrap_or_default();
            sources_by_campaign
                .entry(row.campaign_id)
                .or_default()
                .push(UtmSource {
                    id: row.id,
                    utm_source: row.utm_source,
                    campaigner_name: row.campaigner_name,
                    link_code: row.link_code,
                    total_clicks: row.total_clicks,
                    unique_clicks: row.unique_clicks,
                    unique_ips: row.unique_ips,
                    conversions,
                    created_at: row.created_at,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| Campaign {
                sources: sources_by_campaign.remove(&row.id).unwrap_or_default(),
                id: row.id,
                campaign_name: row.campaign_name,
                link_code: row.link_code,
                total_clicks: row.total_clicks,
                unique_clicks: row.unique_clicks,
                unique_ips: row.unique_ips,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Fetch at most one campaign matching `where_clause` with `$1` bound to `value`
    async fn find_one(&self, where_clause: &str, value: &str) -> AppResult<Option<Campaign>> {
        let query = format!(
            "SELECT {} FROM campaigns c WHERE {} ORDER BY c.created_at LIMIT 1",
            CAMPAIGN_COLUMNS, where_clause
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&query)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(self.assemble(rows).await?.into_iter().next())
    }
}

fn map_unique_violation(err: sqlx::Error, what: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("{} already exists", what))
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl CampaignStore for PgCampaignStore {
    async fn create_campaign(&self, campaign: NewCampaign) -> AppResult<Campaign> {
        let mut tx = self.pool.begin().await?;
        let campaign_id = Uuid::new_v4();

        sqlx::query("INSERT INTO campaigns (id, campaign_name, link_code) VALUES ($1, $2, $3)")
            .bind(campaign_id)
            .bind(&campaign.campaign_name)
            .bind(&campaign.link_code)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, &format!("Campaign {}", campaign.campaign_name)))?;

        for source in &campaign.sources {
            sqlx::query(
                r#"
                INSERT INTO utm_sources (id, campaign_id, utm_source, campaigner_name, link_code)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(campaign_id)
            .bind(&source.utm_source)
            .bind(&source.campaigner_name)
            .bind(&source.link_code)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, &format!("UTM source {}", source.utm_source)))?;
        }

        tx.commit().await?;

        self.find_one("c.id::text = $1", &campaign_id.to_string())
            .await?
            .ok_or_else(|| AppError::Internal(format!("Campaign {} vanished after insert", campaign_id)))
    }

    async fn list_campaigns(&self) -> AppResult<Vec<Campaign>> {
        let query = format!(
            "SELECT {} FROM campaigns c ORDER BY c.created_at, c.campaign_name",
            CAMPAIGN_COLUMNS
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows).await
    }

    async fn find_by_name(&self, campaign_name: &str) -> AppResult<Option<Campaign>> {
        self.find_one("c.campaign_name = $1", campaign_name).await
    }

    async fn find_by_link_code(&self, link_code: &str) -> AppResult<Option<Campaign>> {
        self.find_one("c.link_code = $1", link_code).await
    }

    async fn find_by_source(&self, utm_source: &str) -> AppResult<Option<Campaign>> {
        self.find_one(
            "c.id IN (SELECT campaign_id FROM utm_sources WHERE LOWER(utm_source) = LOWER($1))",
            utm_source,
        )
        .await
    }

    async fn record_source_click(
        &self,
        source_id: Uuid,
        event: NewClickEvent,
    ) -> AppResult<ClickCounts> {
        let mut tx = self.pool.begin().await?;

        let total: Option<i64> = sqlx::query_scalar(
            "UPDATE utm_sources SET total_clicks = total_clicks + 1 WHERE id = $1 RETURNING total_clicks",
        )
        .bind(source_id)
        .fetch_optional(&mut *tx)
        .await?;
        // dropping the transaction rolls back
        let total = total
            .ok_or_else(|| AppError::SourceNotFound(format!("UTM source {} not found", source_id)))?;

        sqlx::query("INSERT INTO utm_source_ips (source_id, ip) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(source_id)
            .bind(&event.ip)
            .execute(&mut *tx)
            .await?;

        let unique: i64 = sqlx::query_scalar(
            r#"
            UPDATE utm_sources
            SET unique_clicks = (SELECT COUNT(*) FROM utm_source_ips WHERE source_id = $1)
            WHERE id = $1
            RETURNING unique_clicks
            "#,
        )
        .bind(source_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO click_events (
                id, link_code, utm_source, campaign_name, ip, user_agent,
                screen_width, screen_height, language, timezone, clicked_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&event.link_code)
        .bind(&event.utm_source)
        .bind(&event.campaign_name)
        .bind(&event.ip)
        .bind(&event.user_agent)
        .bind(event.screen_width)
        .bind(event.screen_height)
        .bind(&event.language)
        .bind(&event.timezone)
        .bind(event.clicked_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ClickCounts { total, unique })
    }

    async fn record_campaign_click(&self, campaign_id: Uuid, ip: &str) -> AppResult<ClickCounts> {
        let mut tx = self.pool.begin().await?;

        let total: Option<i64> = sqlx::query_scalar(
            "UPDATE campaigns SET total_clicks = total_clicks + 1 WHERE id = $1 RETURNING total_clicks",
        )
        .bind(campaign_id)
        .fetch_optional(&mut *tx)
        .await?;
        let total = total
            .ok_or_else(|| AppError::CampaignNotFound(format!("Campaign {} not found", campaign_id)))?;

        sqlx::query("INSERT INTO campaign_ips (campaign_id, ip) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(campaign_id)
            .bind(ip)
            .execute(&mut *tx)
            .await?;

        let unique: i64 = sqlx::query_scalar(
            r#"
            UPDATE campaigns
            SET unique_clicks = (SELECT COUNT(*) FROM campaign_ips WHERE campaign_id = $1)
            WHERE id = $1
            RETURNING unique_clicks
            "#,
        )
        .bind(campaign_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ClickCounts { total, unique })
    }

    async fn add_conversion(
        &self,
        source_id: Uuid,
        conversion: NewConversion,
    ) -> AppResult<ConversionInsert> {
        // idx_conversions_email enforces one row per (source, lower(email))
        let row = sqlx::query_as::<_, ConversionRow>(
            r#"
            INSERT INTO conversions (id, source_id, client_name, client_email, client_phone, booked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING id, source_id, client_name, client_email, client_phone, booked_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(source_id)
        .bind(&conversion.client_name)
        .bind(&conversion.client_email)
        .bind(&conversion.client_phone)
        .bind(conversion.booked_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => ConversionInsert::Created(row.into()),
            None => ConversionInsert::AlreadyExists,
        })
    }

    async fn list_click_events(
        &self,
        campaign_name: &str,
        limit: i64,
    ) -> AppResult<Vec<ClickEvent>> {
        let rows = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT id, link_code, utm_source, campaign_name, ip, user_agent,
                   screen_width, screen_height, language, timezone, clicked_at
            FROM click_events
            WHERE campaign_name = $1
            ORDER BY clicked_at DESC
            LIMIT $2
            "#,
        )
        .bind(campaign_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
