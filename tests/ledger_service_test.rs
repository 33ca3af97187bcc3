use chrono::{TimeZone, Utc};
use job_ledger::adapters::memory::LedgerState;
use job_ledger::core::{LedgerStore, UnitOfWork};
use job_ledger::domain::model::{Contract, ContractStatus, Job, Profile, ProfileKind};
use job_ledger::utils::validation::Validate;
use job_ledger::{
    ErrorKind, LedgerConfig, LedgerPolicy, LedgerService, MemoryStore, Money, ProfileIdResolver,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

type Service = LedgerService<MemoryStore, ProfileIdResolver<MemoryStore>>;

fn money(value: Decimal) -> Money {
    Money::from_decimal(value).unwrap()
}

fn seeded() -> (Arc<MemoryStore>, Service) {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/ledger.toml");
    let config = LedgerConfig::from_file(path).unwrap();
    config.validate().unwrap();

    let store = Arc::new(config.build_store());
    let service = LedgerService::new(
        store.clone(),
        ProfileIdResolver::new(store.clone()),
        &config.policy,
    );
    (store, service)
}

async fn balance(store: &MemoryStore, id: u64) -> Money {
    store
        .inspect(|work| Ok(work.profile(id)))
        .await
        .unwrap()
        .unwrap()
        .balance
}

fn august(day_start: u32, day_end: u32) -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    (
        Utc.with_ymd_and_hms(2020, 8, day_start, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2020, 8, day_end, 23, 59, 59).unwrap(),
    )
}

#[tokio::test]
async fn test_get_contract_visibility() {
    let (_, service) = seeded();

    let contract = service.get_contract("5", 1).await.unwrap();
    assert_eq!(contract.id, 1);
    assert_eq!(contract.client_id, 1);
    assert_eq!(contract.contractor_id, 5);

    let hidden = service.get_contract("1", 1).await.unwrap_err();
    assert_eq!(hidden.status_code(), 404);

    let unknown = service.get_contract("1000", 1).await.unwrap_err();
    assert_eq!(unknown.status_code(), 401);
}

#[tokio::test]
async fn test_list_contracts_are_owned_and_open() {
    let (_, service) = seeded();

    let ids: Vec<u64> = service
        .list_contracts("1")
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![2]);

    let contracts = service.list_contracts("6").await.unwrap();
    assert_eq!(contracts.len(), 3);
    assert!(contracts
        .iter()
        .all(|c| c.involves(6) && c.status != ContractStatus::Terminated));

    let err = service.list_contracts("nobody").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_list_unpaid_jobs_on_active_contracts() {
    let (_, service) = seeded();

    let ids: Vec<u64> = service
        .list_unpaid_jobs("2")
        .await
        .unwrap()
        .iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(ids, vec![3, 4]);

    // Job 1 is unpaid but sits on a terminated contract.
    let ids: Vec<u64> = service
        .list_unpaid_jobs("1")
        .await
        .unwrap()
        .iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn test_pay_job_is_exact_and_idempotent() {
    let (store, service) = seeded();

    let rows = service.pay_job("2", 3).await.unwrap();
    assert_eq!(serde_json::to_string(&rows).unwrap(), "1");
    assert_eq!(balance(&store, 2).await, money(dec!(29.11)));
    assert_eq!(balance(&store, 6).await, money(dec!(1416)));

    let again = service.pay_job("2", 3).await.unwrap_err();
    assert_eq!(again.status_code(), 409);
    assert_eq!(balance(&store, 2).await, money(dec!(29.11)));
    assert_eq!(balance(&store, 6).await, money(dec!(1416)));

    let unpaid: Vec<u64> = service
        .list_unpaid_jobs("2")
        .await
        .unwrap()
        .iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(unpaid, vec![4]);
}

#[tokio::test]
async fn test_pay_job_rejections() {
    let (store, service) = seeded();

    let broke = service.pay_job("4", 5).await.unwrap_err();
    assert_eq!(broke.status_code(), 403);
    assert_eq!(balance(&store, 4).await, money(dec!(1.30)));

    let not_client = service.pay_job("1", 3).await.unwrap_err();
    assert_eq!(not_client.status_code(), 403);
    assert_eq!(balance(&store, 1).await, money(dec!(1150)));

    let missing = service.pay_job("1", 999).await.unwrap_err();
    assert_eq!(missing.status_code(), 404);

    let anonymous = service.pay_job("", 2).await.unwrap_err();
    assert_eq!(anonymous.status_code(), 401);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payments_of_one_job_have_one_winner() {
    let (store, service) = seeded();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.pay_job("1", 2).await }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::Conflict);
                conflicts += 1;
            }
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(balance(&store, 1).await, money(dec!(949)));
    assert_eq!(balance(&store, 6).await, money(dec!(1415)));
}

#[tokio::test]
async fn test_deposit_bounded_by_unpaid_exposure() {
    let (store, service) = seeded();

    // Unpaid exposure of profile 4 is 200.00, so the limit is 50.00.
    let over = service.deposit("4", Some(dec!(50.01))).await.unwrap_err();
    assert_eq!(over.status_code(), 403);
    assert_eq!(balance(&store, 4).await, money(dec!(1.30)));

    service.deposit("4", Some(dec!(50))).await.unwrap();
    assert_eq!(balance(&store, 4).await, money(dec!(51.30)));

    // Exposure of profile 1 includes the unpaid job on its terminated contract: 401.00.
    service.deposit("1", Some(dec!(100.25))).await.unwrap();
    assert_eq!(balance(&store, 1).await, money(dec!(1250.25)));

    let missing = service.deposit("1", None).await.unwrap_err();
    assert_eq!(missing.status_code(), 400);
}

#[tokio::test]
async fn test_best_profession() {
    let (_, service) = seeded();

    let (start, end) = august(1, 31);
    assert_eq!(service.best_profession(start, end).await.unwrap(), "Programmer");

    // Musician and Fighter both earned 200.00 from jobs created on the 17th.
    let (start, end) = august(16, 17);
    assert_eq!(service.best_profession(start, end).await.unwrap(), "Fighter");

    let (start, end) = august(20, 30);
    let err = service.best_profession(start, end).await.unwrap_err();
    assert_eq!(err.status_code(), 404);

    let err = service.best_profession(end, start).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_best_clients() {
    let (_, service) = seeded();
    let (start, end) = august(1, 31);

    let top = service.best_clients(start, end, None).await.unwrap();
    assert_eq!(
        serde_json::to_value(&top).unwrap(),
        serde_json::json!([
            {"id": 4, "fullName": "Ash Kethcum", "paid": "2020.00"},
            {"id": 1, "fullName": "Harry Potter", "paid": "442.00"},
        ])
    );

    let ids: Vec<u64> = service
        .best_clients(start, end, Some(3))
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![4, 1, 2]);

    let (start, end) = august(14, 14);
    let only = service.best_clients(start, end, Some(5)).await.unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].id, 2);
    assert_eq!(only[0].paid, money(dec!(121)));
}

#[tokio::test]
async fn test_payment_then_deposit_scenario() {
    let created = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
    let profile = |id: u64, kind: ProfileKind, balance: Decimal| Profile {
        id,
        first_name: format!("P{}", id),
        last_name: "Test".to_string(),
        profession: Some("Programmer".to_string()),
        balance: money(balance),
        kind,
    };
    let job = |id: u64, price: Decimal| Job {
        id,
        description: String::new(),
        price: money(price),
        paid: false,
        payment_date: None,
        contract_id: 1,
        created_at: created,
    };

    let state = LedgerState::new()
        .with_profile(profile(1, ProfileKind::Client, dec!(1000.00)))
        .with_profile(profile(2, ProfileKind::Contractor, dec!(10.00)))
        .with_contract(Contract {
            id: 1,
            terms: String::new(),
            status: ContractStatus::InProgress,
            client_id: 1,
            contractor_id: 2,
        })
        .with_job(job(1, dec!(250.50)))
        .with_job(job(2, dec!(100.00)))
        .with_job(job(3, dec!(300.00)));
    let store = Arc::new(MemoryStore::new(state));
    let service = LedgerService::new(
        store.clone(),
        ProfileIdResolver::new(store.clone()),
        &LedgerPolicy::default(),
    );

    service.pay_job("1", 1).await.unwrap();
    assert_eq!(balance(&store, 1).await, money(dec!(749.50)));
    assert_eq!(balance(&store, 2).await, money(dec!(260.50)));

    let again = service.pay_job("1", 1).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Conflict);
    assert_eq!(balance(&store, 1).await, money(dec!(749.50)));
    assert_eq!(balance(&store, 2).await, money(dec!(260.50)));

    // Remaining exposure 400.00 puts the limit at exactly 100.00.
    let over = service.deposit("1", Some(dec!(100.01))).await.unwrap_err();
    assert_eq!(over.kind(), ErrorKind::Forbidden);
    service.deposit("1", Some(dec!(100.00))).await.unwrap();
    assert_eq!(balance(&store, 1).await, money(dec!(849.50)));
}

#[tokio::test]
async fn test_oversized_totals_fail_without_panicking() {
    let huge = dec!(50000000000000000000000000000);
    let created = Utc.with_ymd_and_hms(2020, 8, 10, 0, 0, 0).unwrap();
    let job = |id: u64, paid: bool| Job {
        id,
        description: String::new(),
        price: money(huge),
        paid,
        payment_date: paid.then_some(created),
        contract_id: 1,
        created_at: created,
    };

    let state = LedgerState::new()
        .with_profile(Profile {
            id: 1,
            first_name: "Big".to_string(),
            last_name: "Spender".to_string(),
            profession: None,
            balance: money(dec!(10)),
            kind: ProfileKind::Client,
        })
        .with_profile(Profile {
            id: 2,
            first_name: "Busy".to_string(),
            last_name: "Builder".to_string(),
            profession: Some("Builder".to_string()),
            balance: Money::ZERO,
            kind: ProfileKind::Contractor,
        })
        .with_contract(Contract {
            id: 1,
            terms: String::new(),
            status: ContractStatus::InProgress,
            client_id: 1,
            contractor_id: 2,
        })
        .with_job(job(1, true))
        .with_job(job(2, true))
        .with_job(job(3, false))
        .with_job(job(4, false));
    let store = Arc::new(MemoryStore::new(state));
    let service = LedgerService::new(
        store.clone(),
        ProfileIdResolver::new(store.clone()),
        &LedgerPolicy::default(),
    );
    let (start, end) = august(1, 31);

    let err = service.best_clients(start, end, None).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    let err = service.best_profession(start, end).await.unwrap_err();
    assert_eq!(err.status_code(), 500);

    let err = service.deposit("1", Some(dec!(1))).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(balance(&store, 1).await, money(dec!(10)));
}
