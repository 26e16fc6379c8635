//! End-to-end conversation flows over a fixture catalog and an in-memory
//! records database.

use std::sync::Arc;
use std::time::Duration;

use assistant::testing::ScriptedBrain;
use assistant::{Assistant, BrainTurn};
use catalog::Catalog;
use records::{record, Database, RecordFilter, RecordType};

async fn build(
    fixture: &catalog::test_support::FixtureCatalog,
    brain: ScriptedBrain,
) -> (Assistant, Database) {
    let catalog = Catalog::new(fixture.path(), "wine_cards_wide", Duration::from_secs(5));
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let assistant = Assistant::new(Arc::new(brain), catalog, db.clone(), 200);
    (assistant, db)
}

const LIST_SQL: &str =
    "SELECT card_key, wine_name, producer, harvest_year FROM wine_cards_wide ORDER BY card_key";

#[tokio::test]
async fn test_question_runs_sql_and_seeds_context() {
    let fixture = catalog::test_support::fixture_catalog();
    let (assistant, _db) = build(&fixture, ScriptedBrain::sql(LIST_SQL)).await;

    let reply = assistant
        .handle("u1", "alice", "what wines do you have?")
        .await
        .unwrap();
    assert!(reply.contains("Found 3 wines"), "reply: {reply}");
    assert!(reply.contains("1. Мерло Резерв, Винодельня Юг, 2019"));
    assert_eq!(assistant.contexts().user_count().await, 1);
}

#[tokio::test]
async fn test_like_by_position_after_a_list() {
    let fixture = catalog::test_support::fixture_catalog();
    let (assistant, db) = build(&fixture, ScriptedBrain::sql(LIST_SQL)).await;

    assistant.handle("u1", "alice", "покажи вина").await.unwrap();
    let reply = assistant
        .handle("u1", "alice", "поставь лайк на 2")
        .await
        .unwrap();
    assert!(reply.contains("Saved a like"), "reply: {reply}");
    assert!(reply.contains("Pinot Noir Grand"));

    let rows = record::list_records(db.pool(), &RecordFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].wine_id, "2");
    assert_eq!(rows[0].record_type, RecordType::Like);
    assert_eq!(rows[0].user.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_note_flow_asks_for_text() {
    let fixture = catalog::test_support::fixture_catalog();
    let (assistant, db) = build(&fixture, ScriptedBrain::sql(LIST_SQL)).await;

    assistant.handle("u1", "bob", "show me wines").await.unwrap();

    let reply = assistant
        .handle("u1", "bob", "запиши заметку на 1")
        .await
        .unwrap();
    assert!(reply.contains("What should the note"), "reply: {reply}");

    let reply = assistant
        .handle("u1", "bob", "слишком терпкое")
        .await
        .unwrap();
    assert!(reply.contains("Saved a note"), "reply: {reply}");

    let rows = record::list_records(db.pool(), &RecordFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].wine_id, "1");
    assert_eq!(rows[0].content.as_deref(), Some("слишком терпкое"));
}

#[tokio::test]
async fn test_note_flow_can_be_cancelled() {
    let fixture = catalog::test_support::fixture_catalog();
    let (assistant, db) = build(&fixture, ScriptedBrain::sql(LIST_SQL)).await;

    assistant.handle("u1", "bob", "show me wines").await.unwrap();
    assistant
        .handle("u1", "bob", "запиши заметку на 1")
        .await
        .unwrap();
    let reply = assistant.handle("u1", "bob", "отмена").await.unwrap();
    assert!(reply.contains("dropped"), "reply: {reply}");

    let rows = record::list_records(db.pool(), &RecordFilter::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_like_by_free_text_against_catalog() {
    let fixture = catalog::test_support::fixture_catalog();
    let (assistant, db) = build(&fixture, ScriptedBrain::default()).await;

    // No context at all: the reference goes straight to catalog search.
    let reply = assistant
        .handle("u1", "alice", "I really liked the pinot")
        .await
        .unwrap();
    assert!(reply.contains("Saved a like"), "reply: {reply}");

    let rows = record::list_records(db.pool(), &RecordFilter::default())
        .await
        .unwrap();
    assert_eq!(rows[0].wine_id, "2");
}

#[tokio::test]
async fn test_ambiguous_reference_asks_and_resolves() {
    let fixture = catalog::test_support::fixture_catalog();
    let (assistant, db) = build(&fixture, ScriptedBrain::default()).await;

    // Two wines share this producer.
    let reply = assistant
        .handle("u1", "alice", "лайк винодельня юг")
        .await
        .unwrap();
    assert!(reply.contains("Which one"), "reply: {reply}");

    let reply = assistant.handle("u1", "alice", "2").await.unwrap();
    assert!(reply.contains("Saved a like"), "reply: {reply}");

    let rows = record::list_records(db.pool(), &RecordFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_gate_rejection_triggers_one_informed_reask() {
    let fixture = catalog::test_support::fixture_catalog();
    let brain = ScriptedBrain::new([
        BrainTurn::Sql("DROP TABLE wine_cards_wide".to_string()),
        BrainTurn::Answer("I can only read the catalog.".to_string()),
    ]);
    let (assistant, _db) = build(&fixture, brain).await;

    let reply = assistant
        .handle("u1", "alice", "delete everything")
        .await
        .unwrap();
    assert_eq!(reply, "I can only read the catalog.");
}

#[tokio::test]
async fn test_second_sql_failure_gives_generic_reply() {
    let fixture = catalog::test_support::fixture_catalog();
    let brain = ScriptedBrain::new([
        BrainTurn::Sql("SELECT nope FROM missing".to_string()),
        BrainTurn::Sql("SELECT still FROM missing".to_string()),
    ]);
    let (assistant, _db) = build(&fixture, brain).await;

    let reply = assistant.handle("u1", "alice", "anything").await.unwrap();
    assert!(reply.contains("could not complete"), "reply: {reply}");
}

#[tokio::test]
async fn test_plain_answer_passes_through() {
    let fixture = catalog::test_support::fixture_catalog();
    let brain = ScriptedBrain::new([BrainTurn::Answer("Try a dry red with steak.".to_string())]);
    let (assistant, _db) = build(&fixture, brain).await;

    let reply = assistant
        .handle("u1", "alice", "what goes with steak?")
        .await
        .unwrap();
    assert_eq!(reply, "Try a dry red with steak.");
}

#[tokio::test]
async fn test_my_records_listing() {
    let fixture = catalog::test_support::fixture_catalog();
    let (assistant, _db) = build(&fixture, ScriptedBrain::sql(LIST_SQL)).await;

    assistant.handle("u1", "alice", "покажи вина").await.unwrap();
    assistant
        .handle("u1", "alice", "поставь лайк на 1")
        .await
        .unwrap();

    let reply = assistant.handle("u1", "alice", "мои записи").await.unwrap();
    assert!(reply.contains("Your records (1)"), "reply: {reply}");
    assert!(reply.contains("wine 1"));

    // Another user sees nothing.
    let reply = assistant.handle("u2", "carol", "мои записи").await.unwrap();
    assert!(reply.contains("no records"), "reply: {reply}");
}
