//! Acceptance and settlement against the in-memory store.
//!
//! Competing confirmations for one case run concurrently; exactly one must
//! win and the losers must leave no partial writes behind.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use docket::domain::ports::{
    AccountService, CaseCommand, CaseRepository, FixturePasswordHasher, FixturePaymentGateway,
    NotificationFeed, PaymentRepository, QuoteCommand, QuoteRepository, QuoteSubmission,
    RepositoryError, SettlementCommand,
};
use docket::domain::{
    AccountsService, Case, CaseDraft, CaseId, CaseService, CaseStatus, ErrorCode,
    PAYMENT_COMPLETED_EVENT, PageRequest, PaymentConfirmation, PaymentStatus, Quote, QuoteId,
    QuoteService, QuoteStatus, SettlementConfig, SettlementPorts, SettlementService, SignupDraft, User, UserId,
    payment_channel,
};
use docket::outbound::memory::InMemoryStore;
use docket::outbound::notifications::BroadcastNotificationHub;
use docket::outbound::storage::LocalObjectStorage;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tokio::sync::Mutex;

struct Harness {
    store: Arc<InMemoryStore>,
    accounts: AccountsService<InMemoryStore, FixturePasswordHasher>,
    cases: CaseService<InMemoryStore, InMemoryStore, InMemoryStore>,
    quotes: QuoteService<InMemoryStore, InMemoryStore>,
    settlement: Arc<SettlementService>,
    hub: Arc<BroadcastNotificationHub>,
    _storage_root: TempDir,
}

#[fixture]
fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(DefaultClock);
    let hub = Arc::new(BroadcastNotificationHub::default());
    let storage_root = tempfile::tempdir().expect("temp dir");
    let storage = LocalObjectStorage::open(
        storage_root.path(),
        "http://localhost:8080/files/raw",
        b"signing".to_vec(),
        clock.clone(),
    )
    .expect("object storage");
    let settlement = SettlementService::new(
        SettlementPorts {
            cases: store.clone(),
            quotes: store.clone(),
            payments: store.clone(),
            store: store.clone(),
            gateway: Arc::new(FixturePaymentGateway::default()),
            notifications: hub.clone(),
        },
        SettlementConfig::default(),
        clock.clone(),
    );
    Harness {
        accounts: AccountsService::new(
            store.clone(),
            Arc::new(FixturePasswordHasher),
            clock.clone(),
        ),
        cases: CaseService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(storage),
            clock.clone(),
        ),
        quotes: QuoteService::new(store.clone(), store.clone(), clock),
        settlement: Arc::new(settlement),
        store,
        hub,
        _storage_root: storage_root,
    }
}

impl Harness {
    async fn user(&self, email: &str, role: &str) -> User {
        self.accounts
            .signup(SignupDraft {
                email: email.to_owned(),
                password: "correct horse".to_owned(),
                name: "Test User".to_owned(),
                role: role.to_owned(),
                jurisdiction: None,
                bar_number: None,
            })
            .await
            .expect("signup")
    }

    async fn open_case(&self, client: &UserId) -> Case {
        let draft = CaseDraft::new("Lease dispute", "property", "Landlord kept deposit")
            .expect("valid draft");
        self.cases.create_case(client, draft).await.expect("case")
    }

    async fn quote(&self, case: &Case, lawyer: &UserId, amount: &str) -> Quote {
        self.quotes
            .submit_quote(QuoteSubmission {
                case_id: case.id,
                lawyer_id: *lawyer,
                amount: amount.to_owned(),
                expected_days: 10,
                note: "Fixed fee".to_owned(),
            })
            .await
            .expect("quote")
    }

    async fn case_status(&self, case: &Case) -> CaseStatus {
        CaseRepository::find_by_id(self.store.as_ref(), &case.id)
            .await
            .expect("lookup")
            .expect("case exists")
            .status
    }

    async fn quote_status(&self, quote: &Quote) -> QuoteStatus {
        QuoteRepository::find_by_id(self.store.as_ref(), &quote.id)
            .await
            .expect("lookup")
            .expect("quote exists")
            .status
    }
}

fn paid(link_id: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        paid: true,
        payment_link: Some(link_id.to_owned()),
        metadata: BTreeMap::new(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_competing_settlement_wins(harness: Harness) {
    let client = harness.user("client@example.com", "client").await;
    let first_lawyer = harness.user("first@example.com", "lawyer").await;
    let second_lawyer = harness.user("second@example.com", "lawyer").await;
    let case = harness.open_case(&client.id).await;
    let first = harness.quote(&case, &first_lawyer.id, "500.00").await;
    let second = harness.quote(&case, &second_lawyer.id, "650.00").await;

    let (first_link, second_link) = tokio::join!(
        harness.settlement.request_acceptance(&first.id, &client.id),
        harness.settlement.request_acceptance(&second.id, &client.id),
    );
    let first_link = first_link.expect("first acceptance").payment_intent_id;
    let second_link = second_link.expect("second acceptance").payment_intent_id;
    assert_ne!(first_link, second_link);
    assert_eq!(harness.case_status(&case).await, CaseStatus::Open);

    let settle = |link: String| {
        let settlement = harness.settlement.clone();
        tokio::spawn(async move { settlement.confirm_settlement(paid(&link)).await })
    };
    let (left, right) = (settle(first_link.clone()), settle(second_link.clone()));
    let outcomes = [left.await.expect("join"), right.await.expect("join")];
    let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one settlement commits");
    let loser = outcomes
        .iter()
        .find_map(|o| o.as_ref().err())
        .expect("one settlement is refused");
    assert_eq!(loser.code(), ErrorCode::Conflict);

    let winning_quote = winners[0].quote_id;
    let (accepted, rejected) = if winning_quote == first.id {
        (&first, &second)
    } else {
        (&second, &first)
    };
    assert_eq!(harness.case_status(&case).await, CaseStatus::Engaged);
    assert_eq!(harness.quote_status(accepted).await, QuoteStatus::Accepted);
    assert_eq!(harness.quote_status(rejected).await, QuoteStatus::Rejected);

    let losing_link = if winning_quote == first.id {
        &second_link
    } else {
        &first_link
    };
    let losing_payment = harness
        .store
        .find_by_link_id(losing_link)
        .await
        .expect("lookup")
        .expect("pending payment retained");
    assert_eq!(losing_payment.status, PaymentStatus::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_confirmations_settle_once(harness: Harness) {
    let client = harness.user("client@example.com", "client").await;
    let lawyer = harness.user("lawyer@example.com", "lawyer").await;
    let case = harness.open_case(&client.id).await;
    let quote = harness.quote(&case, &lawyer.id, "1234.56").await;
    let link = harness
        .settlement
        .request_acceptance(&quote.id, &client.id)
        .await
        .expect("acceptance")
        .payment_intent_id;
    let mut feed = harness.hub.subscribe();

    let (left, right) = tokio::join!(
        harness.settlement.confirm_settlement(paid(&link)),
        harness.settlement.confirm_settlement(paid(&link)),
    );
    assert_eq!(
        [left.is_ok(), right.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );

    let payment = harness
        .store
        .find_by_link_id(&link)
        .await
        .expect("lookup")
        .expect("payment");
    assert_eq!(payment.status, PaymentStatus::Succeeded);
    assert_eq!(harness.quote_status(&quote).await, QuoteStatus::Accepted);

    let notification = feed.recv().await.expect("one notification");
    assert_eq!(notification.channel, payment_channel(&link));
    assert_eq!(notification.event, PAYMENT_COMPLETED_EVENT);
    assert!(feed.try_recv().is_err(), "losing confirmation stays silent");
}

#[rstest]
#[tokio::test]
async fn acceptance_of_foreign_case_is_forbidden(harness: Harness) {
    let owner = harness.user("owner@example.com", "client").await;
    let intruder = harness.user("intruder@example.com", "client").await;
    let lawyer = harness.user("lawyer@example.com", "lawyer").await;
    let case = harness.open_case(&owner.id).await;
    let quote = harness.quote(&case, &lawyer.id, "99.99").await;

    let err = harness
        .settlement
        .request_acceptance(&quote.id, &intruder.id)
        .await
        .expect_err("only the owner may accept");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert!(
        harness
            .store
            .latest_for_quote(&quote.id)
            .await
            .expect("lookup")
            .is_none(),
        "no payment recorded"
    );
}

#[rstest]
#[tokio::test]
async fn unpaid_confirmation_changes_nothing(harness: Harness) {
    let client = harness.user("client@example.com", "client").await;
    let lawyer = harness.user("lawyer@example.com", "lawyer").await;
    let case = harness.open_case(&client.id).await;
    let quote = harness.quote(&case, &lawyer.id, "10.00").await;
    let link = harness
        .settlement
        .request_acceptance(&quote.id, &client.id)
        .await
        .expect("acceptance")
        .payment_intent_id;

    let err = harness
        .settlement
        .confirm_settlement(PaymentConfirmation {
            paid: false,
            ..paid(&link)
        })
        .await
        .expect_err("unpaid sessions do not settle");
    assert_eq!(err.code(), ErrorCode::InvalidState);
    assert_eq!(harness.case_status(&case).await, CaseStatus::Open);
    assert_eq!(harness.quote_status(&quote).await, QuoteStatus::Proposed);
}

/// Quote store that settles a pending payment link right after the next
/// `(case, lawyer)` lookup, so a revision reads an open case that is engaged
/// by the time it writes.
struct SettlesAfterLookup {
    store: Arc<InMemoryStore>,
    settlement: Arc<SettlementService>,
    pending_link: Mutex<Option<String>>,
}

#[async_trait]
impl QuoteRepository for SettlesAfterLookup {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError> {
        QuoteRepository::create(self.store.as_ref(), quote).await
    }

    async fn update_terms(&self, quote: &Quote) -> Result<bool, RepositoryError> {
        self.store.update_terms(quote).await
    }

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        QuoteRepository::find_by_id(self.store.as_ref(), id).await
    }

    async fn find_by_case_and_lawyer(
        &self,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Option<Quote>, RepositoryError> {
        let found = self.store.find_by_case_and_lawyer(case_id, lawyer_id).await?;
        let pending = self.pending_link.lock().await.take();
        if let Some(link) = pending {
            self.settlement
                .confirm_settlement(paid(&link))
                .await
                .expect("interleaved settlement commits");
        }
        Ok(found)
    }

    async fn find_accepted_for_case(
        &self,
        case_id: &CaseId,
    ) -> Result<Option<Quote>, RepositoryError> {
        self.store.find_accepted_for_case(case_id).await
    }

    async fn list_for_case(&self, case_id: &CaseId) -> Result<Vec<Quote>, RepositoryError> {
        QuoteRepository::list_for_case(self.store.as_ref(), case_id).await
    }

    async fn list_for_lawyer(
        &self,
        lawyer_id: &UserId,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Quote>, u64), RepositoryError> {
        self.store.list_for_lawyer(lawyer_id, status, page).await
    }
}

#[rstest]
#[tokio::test]
async fn revision_racing_settlement_leaves_sibling_rejected(harness: Harness) {
    let client = harness.user("client@example.com", "client").await;
    let winner = harness.user("winner@example.com", "lawyer").await;
    let sibling = harness.user("sibling@example.com", "lawyer").await;
    let case = harness.open_case(&client.id).await;
    let winning = harness.quote(&case, &winner.id, "500.00").await;
    let losing = harness.quote(&case, &sibling.id, "650.00").await;
    let link = harness
        .settlement
        .request_acceptance(&winning.id, &client.id)
        .await
        .expect("acceptance")
        .payment_intent_id;

    let racing_quotes = QuoteService::new(
        harness.store.clone(),
        Arc::new(SettlesAfterLookup {
            store: harness.store.clone(),
            settlement: harness.settlement.clone(),
            pending_link: Mutex::new(Some(link)),
        }),
        Arc::new(DefaultClock),
    );
    let err = racing_quotes
        .update_quote(QuoteSubmission {
            case_id: case.id,
            lawyer_id: sibling.id,
            amount: "400.00".to_owned(),
            expected_days: 7,
            note: "Discounted".to_owned(),
        })
        .await
        .expect_err("case engaged before the write");

    assert_eq!(err.code(), ErrorCode::InvalidState);
    assert_eq!(harness.case_status(&case).await, CaseStatus::Engaged);
    assert_eq!(harness.quote_status(&winning).await, QuoteStatus::Accepted);
    assert_eq!(harness.quote_status(&losing).await, QuoteStatus::Rejected);
}
