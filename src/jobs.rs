use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    db::{DbPool, OrmConn},
    email::Mailer,
    error::AppResult,
    services::import_service,
};

/// Work the request path hands off and forgets. Job outcomes never flow
/// back into the operation that enqueued them.
#[derive(Debug)]
pub enum Job {
    OrderConfirmation { order_id: Uuid },
    CatalogImport { source_path: String },
}

#[derive(Clone)]
pub struct JobSender {
    tx: mpsc::UnboundedSender<Job>,
}

impl JobSender {
    pub fn send(&self, job: Job) {
        if let Err(err) = self.tx.send(job) {
            tracing::error!(error = %err, "job worker is gone; job dropped");
        }
    }
}

pub struct JobContext {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub mailer: Option<Mailer>,
}

/// Spawn the single worker task draining the queue. Per-job failures
/// are logged and swallowed.
pub fn start_worker(ctx: JobContext) -> JobSender {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            tracing::debug!(?job, "running background job");
            if let Err(err) = run_job(&ctx, job).await {
                tracing::error!(error = %err, "background job failed");
            }
        }
    });
    JobSender { tx }
}

async fn run_job(ctx: &JobContext, job: Job) -> AppResult<()> {
    match job {
        Job::CatalogImport { source_path } => {
            import_service::import_catalog(&ctx.orm, &source_path).await?;
        }
        Job::OrderConfirmation { order_id } => {
            send_confirmation(ctx, order_id).await?;
        }
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct ConfirmationRow {
    email: String,
    first_name: String,
    total_amount: Decimal,
}

async fn send_confirmation(ctx: &JobContext, order_id: Uuid) -> AppResult<()> {
    let row: Option<ConfirmationRow> = sqlx::query_as(
        r#"
        SELECT c.email, c.first_name, o.total_amount
        FROM orders o
        JOIN contacts c ON c.id = o.contact_id
        WHERE o.id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(&ctx.pool)
    .await?;

    let Some(row) = row else {
        tracing::warn!(%order_id, "order has no contact; confirmation skipped");
        return Ok(());
    };

    match &ctx.mailer {
        Some(mailer) => {
            mailer
                .send_order_confirmation(&row.email, &row.first_name, order_id, row.total_amount)
                .await
                .map_err(anyhow::Error::from)?;
            tracing::info!(%order_id, to = %row.email, "order confirmation sent");
        }
        None => {
            tracing::info!(%order_id, to = %row.email, "SMTP not configured; confirmation logged only");
        }
    }
    Ok(())
}
