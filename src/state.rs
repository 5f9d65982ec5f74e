use crate::db::{DbPool, OrmConn};
use crate::jobs::JobSender;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jobs: JobSender,
}
