//! Lawyer-facing marketplace service.
//!
//! Descriptions are anonymized everywhere except the detail view of the
//! lawyer whose quote was accepted on an engaged case.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    CaseFileRepository, CaseRepository, MarketplaceCaseDetail, MarketplaceQuery, ObjectStorage,
    QuoteRepository,
};
use crate::domain::service_support::{file_grants, map_repository_error, require_case};
use crate::domain::{
    Actor, Case, CaseDetailAccess, CaseId, Error, OpenCaseFilter, Page, PageRequest, anonymize,
    case_detail_access,
};

fn redacted(mut case: Case) -> Case {
    case.description = anonymize(&case.description);
    case
}

/// Marketplace service implementing [`MarketplaceQuery`].
#[derive(Clone)]
pub struct MarketplaceService<C, Q, F> {
    cases: Arc<C>,
    quotes: Arc<Q>,
    files: Arc<F>,
    storage: Arc<dyn ObjectStorage>,
}

impl<C, Q, F> MarketplaceService<C, Q, F> {
    /// Create the service.
    pub fn new(
        cases: Arc<C>,
        quotes: Arc<Q>,
        files: Arc<F>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            cases,
            quotes,
            files,
            storage,
        }
    }
}

#[async_trait]
impl<C, Q, F> MarketplaceQuery for MarketplaceService<C, Q, F>
where
    C: CaseRepository,
    Q: QuoteRepository,
    F: CaseFileRepository,
{
    async fn list_open_cases(
        &self,
        filter: OpenCaseFilter,
        page: PageRequest,
    ) -> Result<Page<Case>, Error> {
        let (items, total) = self
            .cases
            .list_open(&filter, page)
            .await
            .map_err(map_repository_error)?;
        Ok(Page::new(items, page, total).map(redacted))
    }

    async fn case_detail(
        &self,
        actor: &Actor,
        case_id: &CaseId,
    ) -> Result<MarketplaceCaseDetail, Error> {
        let case = require_case(self.cases.as_ref(), case_id).await?;
        let has_submitted = self
            .quotes
            .find_by_case_and_lawyer(case_id, &actor.user_id)
            .await
            .map_err(map_repository_error)?
            .is_some();
        let accepted = self
            .quotes
            .find_accepted_for_case(case_id)
            .await
            .map_err(map_repository_error)?;

        match case_detail_access(actor, &case, accepted.as_ref()) {
            CaseDetailAccess::Denied => Err(Error::forbidden("you may not view this case")),
            CaseDetailAccess::Redacted => Ok(MarketplaceCaseDetail {
                case: redacted(case),
                access: CaseDetailAccess::Redacted,
                has_submitted,
                files: Vec::new(),
            }),
            CaseDetailAccess::Full => {
                let files =
                    file_grants(self.files.as_ref(), self.storage.as_ref(), case_id).await?;
                Ok(MarketplaceCaseDetail {
                    case,
                    access: CaseDetailAccess::Full,
                    has_submitted,
                    files,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockCaseFileRepository, MockCaseRepository, MockObjectStorage, MockQuoteRepository,
    };
    use crate::domain::{
        CaseDraft, CaseFile, CaseFileId, CaseStatus, Quote, QuoteStatus, QuoteTerms, Role, UserId,
    };
    use chrono::Utc;

    const DESCRIPTION: &str = "Reach me on a@b.com or 555-123-4567";

    fn case(status: CaseStatus) -> Case {
        let draft = CaseDraft::new("Dispute", "civil", DESCRIPTION).expect("draft");
        let mut case = Case::open(UserId::random(), draft, Utc::now());
        case.status = status;
        case
    }

    fn accepted_quote(case: &Case, lawyer: UserId) -> Quote {
        let terms = QuoteTerms::new("500", 7, "").expect("terms");
        let mut quote = Quote::propose(case.id, lawyer, terms, Utc::now());
        quote.status = QuoteStatus::Accepted;
        quote
    }

    fn service(
        case: Case,
        own_quote: Option<Quote>,
        accepted: Option<Quote>,
    ) -> MarketplaceService<MockCaseRepository, MockQuoteRepository, MockCaseFileRepository> {
        let case_id = case.id;
        let mut cases = MockCaseRepository::new();
        cases
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(case)));
        let mut quotes = MockQuoteRepository::new();
        quotes
            .expect_find_by_case_and_lawyer()
            .return_once(move |_, _| Ok(own_quote));
        quotes
            .expect_find_accepted_for_case()
            .return_once(move |_| Ok(accepted));
        let mut files = MockCaseFileRepository::new();
        files.expect_list_for_case().returning(move |_| {
            Ok(vec![CaseFile {
                id: CaseFileId::random(),
                case_id,
                file_name: "brief.pdf".to_owned(),
                storage_path: format!("cases/{case_id}/abc_1.pdf"),
                file_size: 10,
                mime_type: "application/pdf".to_owned(),
                created_at: Utc::now(),
            }])
        });
        let mut storage = MockObjectStorage::new();
        storage
            .expect_presign_download()
            .returning(|key, _| Ok(format!("https://files.test/{key}")));
        MarketplaceService::new(
            Arc::new(cases),
            Arc::new(quotes),
            Arc::new(files),
            Arc::new(storage),
        )
    }

    #[tokio::test]
    async fn non_winning_lawyer_sees_anonymized_description() {
        let lawyer = Actor::new(UserId::random(), Role::Lawyer);
        let case = case(CaseStatus::Open);
        let case_id = case.id;

        let detail = service(case, None, None)
            .case_detail(&lawyer, &case_id)
            .await
            .expect("detail");
        assert_eq!(detail.access, CaseDetailAccess::Redacted);
        assert!(!detail.case.description.contains("a@b.com"));
        assert!(!detail.has_submitted);
        assert!(detail.files.is_empty());
    }

    #[tokio::test]
    async fn engaged_lawyer_sees_full_description_and_files() {
        let lawyer = Actor::new(UserId::random(), Role::Lawyer);
        let case = case(CaseStatus::Engaged);
        let case_id = case.id;
        let accepted = accepted_quote(&case, lawyer.user_id);

        let detail = service(case, Some(accepted.clone()), Some(accepted))
            .case_detail(&lawyer, &case_id)
            .await
            .expect("detail");
        assert_eq!(detail.access, CaseDetailAccess::Full);
        assert_eq!(detail.case.description, DESCRIPTION);
        assert!(detail.has_submitted);
        assert_eq!(detail.files.len(), 1);
    }

    #[tokio::test]
    async fn listing_redacts_every_description() {
        let open = case(CaseStatus::Open);
        let mut cases = MockCaseRepository::new();
        cases
            .expect_list_open()
            .return_once(move |_, _| Ok((vec![open], 1)));
        let service = MarketplaceService::new(
            Arc::new(cases),
            Arc::new(MockQuoteRepository::new()),
            Arc::new(MockCaseFileRepository::new()),
            Arc::new(MockObjectStorage::new()),
        );

        let page = service
            .list_open_cases(OpenCaseFilter::default(), PageRequest::default())
            .await
            .expect("listing");
        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|c| !c.description.contains('@')));
    }
}
