//! DNS-01 challenge lifecycle against in-memory test doubles

mod common;

use std::sync::Arc;

use common::{init_test, instant_config, Answer, MockRegistrar, RegistrarCall, ScriptedResolver};
use dnshook_dns::{
    ChallengeConfig, ChallengeOrchestrator, DnsError, PropagationChecker, RegistrarRecord,
    StabilityPolicy,
};

const RECORD: &str = "_acme-challenge.example.com";

fn orchestrator(
    registrar: Arc<MockRegistrar>,
    resolver: Arc<ScriptedResolver>,
    config: ChallengeConfig,
) -> ChallengeOrchestrator {
    ChallengeOrchestrator::new(registrar, PropagationChecker::new(resolver), config)
}

#[tokio::test]
async fn test_deploy_without_existing_record() {
    init_test();

    let registrar = MockRegistrar::new();
    let resolver = ScriptedResolver::new(vec![Answer::token("abc123")]);
    let orchestrator = orchestrator(registrar.clone(), resolver.clone(), instant_config());

    let outcome = orchestrator
        .deploy_challenge("example.com", "abc123")
        .await
        .expect("challenge should propagate");

    assert_eq!(outcome.record, RECORD);
    assert_eq!(outcome.removed_stale, 0);
    assert_eq!(outcome.polls, 3);
    assert_eq!(resolver.lookups(), 3);

    assert_eq!(
        registrar.calls(),
        vec![
            RegistrarCall::List,
            RegistrarCall::Add(RECORD.to_string(), "abc123".to_string()),
        ]
    );
    assert_eq!(
        registrar.records(),
        vec![RegistrarRecord::txt(RECORD, "abc123")]
    );
}

#[tokio::test]
async fn test_deploy_replaces_stale_record() {
    init_test();

    let registrar = MockRegistrar::with_records(vec![
        RegistrarRecord::txt(RECORD, "old999"),
        RegistrarRecord {
            record: "www.example.com".to_string(),
            record_type: "A".to_string(),
            value: "192.0.2.10".to_string(),
        },
    ]);
    let resolver = ScriptedResolver::new(vec![Answer::token("abc123")]);
    let orchestrator = orchestrator(registrar.clone(), resolver, instant_config());

    let outcome = orchestrator
        .deploy_challenge("example.com", "abc123")
        .await
        .expect("challenge should propagate");

    assert_eq!(outcome.removed_stale, 1);
    assert_eq!(
        registrar.mutations(),
        vec![
            RegistrarCall::Remove(RECORD.to_string(), "old999".to_string()),
            RegistrarCall::Add(RECORD.to_string(), "abc123".to_string()),
        ]
    );

    let txt: Vec<_> = registrar
        .records()
        .into_iter()
        .filter(|r| r.is_txt_for(RECORD))
        .collect();
    assert_eq!(txt, vec![RegistrarRecord::txt(RECORD, "abc123")]);
}

#[tokio::test]
async fn test_deploy_leaves_single_record_when_duplicates_exist() {
    init_test();

    let registrar = MockRegistrar::with_records(vec![
        RegistrarRecord::txt(RECORD, "old1"),
        RegistrarRecord::txt(RECORD, "old2"),
    ]);
    let resolver = ScriptedResolver::new(vec![Answer::token("abc123")]);
    let orchestrator = orchestrator(registrar.clone(), resolver, instant_config());

    orchestrator
        .deploy_challenge("example.com", "abc123")
        .await
        .unwrap();

    assert_eq!(
        registrar.records(),
        vec![RegistrarRecord::txt(RECORD, "abc123")]
    );
}

#[tokio::test]
async fn test_lookup_failures_delay_confirmation() {
    init_test();

    let registrar = MockRegistrar::new();
    let resolver = ScriptedResolver::new(vec![
        Answer::Failure,
        Answer::empty(),
        Answer::token("abc123"),
    ]);
    let orchestrator = orchestrator(registrar, resolver, instant_config());

    let outcome = orchestrator
        .deploy_challenge("example.com", "abc123")
        .await
        .unwrap();

    // two misses, then three sightings
    assert_eq!(outcome.polls, 5);
}

#[tokio::test]
async fn test_consecutive_policy_restarts_after_miss() {
    init_test();

    let registrar = MockRegistrar::new();
    let resolver = ScriptedResolver::new(vec![
        Answer::token("abc123"),
        Answer::token("abc123"),
        Answer::empty(),
        Answer::token("abc123"),
    ]);
    let orchestrator = orchestrator(registrar, resolver, instant_config());

    let outcome = orchestrator
        .deploy_challenge("example.com", "abc123")
        .await
        .unwrap();

    assert_eq!(outcome.polls, 6);
}

#[tokio::test]
async fn test_cumulative_policy_counts_every_sighting() {
    init_test();

    let registrar = MockRegistrar::new();
    let resolver = ScriptedResolver::new(vec![
        Answer::token("abc123"),
        Answer::token("abc123"),
        Answer::empty(),
        Answer::token("abc123"),
    ]);
    let config = ChallengeConfig {
        stability: StabilityPolicy::Cumulative,
        ..instant_config()
    };
    let orchestrator = orchestrator(registrar, resolver, config);

    let outcome = orchestrator
        .deploy_challenge("example.com", "abc123")
        .await
        .unwrap();

    assert_eq!(outcome.polls, 4);
}

#[tokio::test]
async fn test_sightings_do_not_leak_between_challenges() {
    init_test();

    let registrar = MockRegistrar::new();
    let resolver = ScriptedResolver::new(vec![
        Answer::token("first"),
        Answer::token("first"),
        Answer::token("first"),
        Answer::token("second"),
    ]);
    let orchestrator = orchestrator(registrar, resolver, instant_config());

    let first = orchestrator
        .deploy_challenge("a.example.com", "first")
        .await
        .unwrap();
    let second = orchestrator
        .deploy_challenge("b.example.com", "second")
        .await
        .unwrap();

    assert_eq!(first.polls, 3);
    assert_eq!(second.polls, 3);
}

#[tokio::test]
async fn test_propagation_timeout() {
    init_test();

    let registrar = MockRegistrar::new();
    let resolver = ScriptedResolver::new(vec![Answer::token("something-else")]);
    let config = ChallengeConfig {
        max_poll_attempts: Some(4),
        ..instant_config()
    };
    let orchestrator = orchestrator(registrar, resolver.clone(), config);

    let err = orchestrator
        .deploy_challenge("example.com", "abc123")
        .await
        .unwrap_err();

    match err {
        DnsError::PropagationTimeout { record, attempts } => {
            assert_eq!(record, RECORD);
            assert_eq!(attempts, 4);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(resolver.lookups(), 4);
}

#[tokio::test]
async fn test_add_failure_surfaces_before_polling() {
    init_test();

    let registrar = MockRegistrar::new();
    registrar.set_fail_add(true);
    let resolver = ScriptedResolver::new(vec![Answer::token("abc123")]);
    let orchestrator = orchestrator(registrar, resolver.clone(), instant_config());

    let result = orchestrator.deploy_challenge("example.com", "abc123").await;

    assert!(matches!(result, Err(DnsError::Api(_))));
    assert_eq!(resolver.lookups(), 0);
}

#[tokio::test]
async fn test_clean_without_record_makes_no_mutations() {
    init_test();

    let registrar = MockRegistrar::new();
    let resolver = ScriptedResolver::new(vec![]);
    let orchestrator = orchestrator(registrar.clone(), resolver, instant_config());

    let removed = orchestrator.clean_challenge("example.com").await.unwrap();

    assert_eq!(removed, 0);
    assert_eq!(registrar.calls(), vec![RegistrarCall::List]);
}

#[tokio::test]
async fn test_clean_removes_record() {
    init_test();

    let registrar = MockRegistrar::with_records(vec![RegistrarRecord::txt(RECORD, "abc123")]);
    let resolver = ScriptedResolver::new(vec![]);
    let orchestrator = orchestrator(registrar.clone(), resolver, instant_config());

    let removed = orchestrator.clean_challenge("example.com").await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(
        registrar.mutations(),
        vec![RegistrarCall::Remove(
            RECORD.to_string(),
            "abc123".to_string()
        )]
    );
    assert!(registrar.records().is_empty());
}

#[tokio::test]
async fn test_clean_is_idempotent() {
    init_test();

    let registrar = MockRegistrar::with_records(vec![RegistrarRecord::txt(RECORD, "abc123")]);
    let resolver = ScriptedResolver::new(vec![]);
    let orchestrator = orchestrator(registrar.clone(), resolver, instant_config());

    assert_eq!(orchestrator.clean_challenge("example.com").await.unwrap(), 1);
    assert_eq!(orchestrator.clean_challenge("example.com").await.unwrap(), 0);
    assert_eq!(registrar.mutations().len(), 1);
}
