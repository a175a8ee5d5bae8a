use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    domain::{Admin, Candidate, UserId, Vacancy, VacancyId},
    Result,
};

/// Hexagonal port for persistence.
///
/// `save_vacancy` / `save_candidate` insert when the record's id is 0 (the
/// store assigns the real id) and overwrite otherwise.
#[async_trait]
pub trait StorePort: Send + Sync {
    async fn is_admin(&self, user_id: UserId) -> Result<bool>;
    async fn admins(&self) -> Result<Vec<Admin>>;

    async fn vacancies(&self) -> Result<Vec<Vacancy>>;
    async fn vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>>;
    async fn save_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy>;
    /// Returns false when the id did not exist.
    async fn delete_vacancy(&self, id: VacancyId) -> Result<bool>;

    async fn save_candidate(&self, candidate: Candidate) -> Result<Candidate>;
    async fn candidates_by_vacancy(&self, id: VacancyId) -> Result<Vec<Candidate>>;

    /// Bootstrap seeding of the allow-list; not used by the dialog engines.
    async fn upsert_admin(&self, admin: Admin) -> Result<Admin>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<PathBuf>,
}

/// Hexagonal port for outbound email. Failures are caught per-recipient by
/// the notification dispatcher.
#[async_trait]
pub trait EmailPort: Send + Sync {
    async fn send(&self, mail: OutboundEmail) -> Result<()>;
}
