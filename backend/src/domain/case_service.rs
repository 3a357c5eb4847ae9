//! Client-facing case services.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CaseCommand, CaseFileRepository, CaseQuery, CaseRepository, ClientCaseDetail, ObjectStorage,
    QuoteRepository,
};
use crate::domain::service_support::{file_grants, map_repository_error, require_case};
use crate::domain::{
    Actor, Case, CaseDetailAccess, CaseDraft, CaseId, CaseSummary, Error, Page, PageRequest, Role,
    UserId, case_detail_access,
};

/// Case service implementing [`CaseCommand`] and [`CaseQuery`].
#[derive(Clone)]
pub struct CaseService<C, Q, F> {
    cases: Arc<C>,
    quotes: Arc<Q>,
    files: Arc<F>,
    storage: Arc<dyn ObjectStorage>,
    clock: Arc<dyn Clock>,
}

impl<C, Q, F> CaseService<C, Q, F> {
    /// Create the service.
    pub fn new(
        cases: Arc<C>,
        quotes: Arc<Q>,
        files: Arc<F>,
        storage: Arc<dyn ObjectStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cases,
            quotes,
            files,
            storage,
            clock,
        }
    }
}

#[async_trait]
impl<C, Q, F> CaseCommand for CaseService<C, Q, F>
where
    C: CaseRepository,
    Q: QuoteRepository,
    F: CaseFileRepository,
{
    async fn create_case(&self, client_id: &UserId, draft: CaseDraft) -> Result<Case, Error> {
        let case = Case::open(*client_id, draft, self.clock.utc());
        self.cases
            .create(&case)
            .await
            .map_err(map_repository_error)?;
        info!(case_id = %case.id, client_id = %client_id, "case opened");
        Ok(case)
    }
}

#[async_trait]
impl<C, Q, F> CaseQuery for CaseService<C, Q, F>
where
    C: CaseRepository,
    Q: QuoteRepository,
    F: CaseFileRepository,
{
    async fn list_client_cases(
        &self,
        client_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<CaseSummary>, Error> {
        let (items, total) = self
            .cases
            .list_for_client(client_id, page)
            .await
            .map_err(map_repository_error)?;
        Ok(Page::new(items, page, total))
    }

    async fn client_case_detail(
        &self,
        actor: &Actor,
        case_id: &CaseId,
    ) -> Result<ClientCaseDetail, Error> {
        let case = require_case(self.cases.as_ref(), case_id).await?;
        if actor.role != Role::Client
            || case_detail_access(actor, &case, None) != CaseDetailAccess::Full
        {
            return Err(Error::forbidden("you can only view your own cases"));
        }

        let quotes = self
            .quotes
            .list_for_case(case_id)
            .await
            .map_err(map_repository_error)?;
        let files = file_grants(self.files.as_ref(), self.storage.as_ref(), case_id).await?;
        Ok(ClientCaseDetail {
            case,
            quotes,
            files,
        })
    }
}
