//! The conversation flow: intents, references, and the SQL answer pipeline.

use std::sync::Arc;

use catalog::{Catalog, ExecutionError, QueryExecutor, QueryResult};
use conversation::{ContextEntry, ContextStore, PendingAction, ReferenceResolver, Resolution};
use records::{record, Database, NewRecord, RecordFilter, RecordType};
use sqlgate::{rewrite_pattern_operators, validate};
use tracing::{debug, info, warn};

use crate::brain::{Brain, BrainRequest, BrainTurn};
use crate::error::Result;
use crate::intent::{self, Intent};
use crate::reply;

/// Phrases that abandon a pending action.
const CANCEL_WORDS: &[&str] = &["cancel", "nevermind", "never mind", "отмена", "отмени", "не надо"];

/// The assistant: one instance serves all users.
pub struct Assistant {
    brain: Arc<dyn Brain>,
    catalog: Catalog,
    executor: QueryExecutor,
    records: Database,
    contexts: ContextStore,
    resolver: ReferenceResolver,
}

impl Assistant {
    /// Wire up the assistant. `row_ceiling` caps every gated query.
    pub fn new(brain: Arc<dyn Brain>, catalog: Catalog, records: Database, row_ceiling: u32) -> Self {
        let executor = catalog.executor(row_ceiling);
        let resolver = ReferenceResolver::new(catalog.clone());
        Self {
            brain,
            catalog,
            executor,
            records,
            contexts: ContextStore::default(),
            resolver,
        }
    }

    /// The per-user context store, shared with the HTTP layer for /health.
    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    /// Handle one user message.
    ///
    /// `user_key` keys the conversation context; `user` is the display name
    /// records are written under. The reply is always conversational text:
    /// gate rejections and query failures are folded into it, only
    /// infrastructure failures surface as errors.
    pub async fn handle(&self, user_key: &str, user: &str, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok("Tell me what you are looking for.".to_string());
        }

        if let Some(pending) = self.contexts.pending(user_key).await {
            return self.continue_pending(user_key, user, pending, text).await;
        }

        match intent::detect(text) {
            Intent::SaveRecord {
                record_type,
                content,
                reference,
            } => {
                self.start_record(user_key, user, record_type, content, reference)
                    .await
            }
            Intent::ListRecords { record_type } => self.list_records(user, record_type).await,
            Intent::Question => self.answer_question(user_key, text).await,
        }
    }

    /// Resume a two-turn flow: a note awaiting text, or a choice awaiting an
    /// ordinal.
    async fn continue_pending(
        &self,
        user_key: &str,
        user: &str,
        pending: PendingAction,
        text: &str,
    ) -> Result<String> {
        if is_cancel(text) {
            self.contexts.take_pending(user_key).await;
            return Ok("Okay, dropped that.".to_string());
        }

        if !pending.selected.is_empty() {
            // Wines chosen, this message is the note text.
            self.contexts.take_pending(user_key).await;
            return self
                .write_records(user, pending.record_type, Some(text.to_string()), &pending.selected)
                .await;
        }

        // Waiting for the user to say which wine.
        let context = self.contexts.get(user_key).await.unwrap_or_default();
        match self.resolver.resolve(text, &context).await? {
            Resolution::One(entry) => {
                self.contexts.take_pending(user_key).await;
                self.finish_record(user_key, user, pending, vec![entry]).await
            }
            Resolution::Several(entries) => {
                self.contexts.take_pending(user_key).await;
                self.finish_record(user_key, user, pending, entries).await
            }
            Resolution::Ambiguous(candidates) => {
                let prompt = reply::disambiguation(&candidates);
                self.contexts.set(user_key, candidates).await;
                // Pending survives the context replacement.
                Ok(prompt)
            }
            Resolution::None => Ok(
                "I still can't tell which wine you mean. Give me a position from the \
                 list or a name, or say \"cancel\"."
                    .to_string(),
            ),
        }
    }

    /// Begin a like/note flow from a fresh message.
    async fn start_record(
        &self,
        user_key: &str,
        user: &str,
        record_type: RecordType,
        content: Option<String>,
        reference: Option<String>,
    ) -> Result<String> {
        let context = self.contexts.get(user_key).await.unwrap_or_default();
        let pending = PendingAction {
            record_type,
            note_content: content,
            selected: Vec::new(),
        };

        let resolution = match reference.as_deref() {
            Some(reference) => self.resolver.resolve(reference, &context).await?,
            // No reference: a lone candidate is unambiguous, more need a choice.
            None => match context.len() {
                0 => Resolution::None,
                1 => Resolution::One(context[0].clone()),
                _ => Resolution::Ambiguous(context.clone()),
            },
        };

        match resolution {
            Resolution::One(entry) => self.finish_record(user_key, user, pending, vec![entry]).await,
            Resolution::Several(entries) => {
                self.finish_record(user_key, user, pending, entries).await
            }
            Resolution::Ambiguous(candidates) => {
                let prompt = reply::disambiguation(&candidates);
                self.contexts.set(user_key, candidates).await;
                self.contexts.set_pending(user_key, pending).await;
                Ok(prompt)
            }
            Resolution::None => {
                if reference.is_none() && context.is_empty() {
                    self.contexts.set_pending(user_key, pending).await;
                    Ok("Which wine is that for? Name it, or ask me to find it first.".to_string())
                } else {
                    Ok("I couldn't find that wine in the catalog. Try a different name.".to_string())
                }
            }
        }
    }

    /// Write the records, or park a pending action when note text is missing.
    async fn finish_record(
        &self,
        user_key: &str,
        user: &str,
        pending: PendingAction,
        entries: Vec<ContextEntry>,
    ) -> Result<String> {
        if pending.record_type == RecordType::Note && pending.note_content.is_none() {
            let labels: Vec<String> = entries.iter().map(|e| e.label.clone()).collect();
            self.contexts
                .set_pending(
                    user_key,
                    PendingAction {
                        selected: entries,
                        ..pending
                    },
                )
                .await;
            return Ok(format!(
                "What should the note on {} say?",
                labels.join("; ")
            ));
        }
        self.write_records(user, pending.record_type, pending.note_content, &entries)
            .await
    }

    async fn write_records(
        &self,
        user: &str,
        record_type: RecordType,
        content: Option<String>,
        entries: &[ContextEntry],
    ) -> Result<String> {
        let mut labels = Vec::with_capacity(entries.len());
        for entry in entries {
            let created = record::create_record(
                self.records.pool(),
                NewRecord {
                    user,
                    record_type: record_type.as_str(),
                    content: content.as_deref(),
                    wine_id: &entry.wine_id,
                },
            )
            .await?;
            info!(
                record_id = created.id,
                wine_id = %entry.wine_id,
                record_type = %record_type.as_str(),
                "Record saved from chat"
            );
            labels.push(entry.label.clone());
        }
        Ok(reply::record_saved(record_type, &labels))
    }

    async fn list_records(&self, user: &str, record_type: Option<RecordType>) -> Result<String> {
        let records = record::list_records(
            self.records.pool(),
            &RecordFilter {
                wine_id: None,
                record_type,
                user: Some(user.to_string()),
            },
        )
        .await?;
        Ok(reply::record_list(&records))
    }

    /// Ask the model, and run its SQL through the gate and executor.
    async fn answer_question(&self, user_key: &str, question: &str) -> Result<String> {
        let schema = self.catalog.schema_line().await?;

        let turn = self
            .brain
            .reply(BrainRequest {
                question,
                schema: &schema,
                failure: None,
            })
            .await?;

        let sql = match turn {
            BrainTurn::Answer(answer) => return Ok(answer),
            BrainTurn::Sql(sql) => sql,
        };

        match self.run_gated(user_key, &sql).await? {
            QueryOutcome::Reply(reply) => Ok(reply),
            QueryOutcome::Failed(description) => {
                // One informed re-ask; never a mechanical retry of the same SQL.
                let turn = self
                    .brain
                    .reply(BrainRequest {
                        question,
                        schema: &schema,
                        failure: Some(&description),
                    })
                    .await?;
                match turn {
                    BrainTurn::Answer(answer) => Ok(answer),
                    BrainTurn::Sql(sql) => match self.run_gated(user_key, &sql).await? {
                        QueryOutcome::Reply(reply) => Ok(reply),
                        QueryOutcome::Failed(_) => {
                            Ok("I could not complete that query against the catalog. \
                                Try narrowing the question."
                                .to_string())
                        }
                    },
                }
            }
        }
    }

    /// Rewrite dialect operators, gate, and execute one statement.
    async fn run_gated(&self, user_key: &str, sql: &str) -> Result<QueryOutcome> {
        let rewritten = rewrite_pattern_operators(sql);
        let statement = match validate(&rewritten, self.executor.max_rows()) {
            Ok(statement) => statement,
            Err(err) => {
                debug!(%err, sql, "Statement rejected by the gate");
                return Ok(QueryOutcome::Failed(err.to_string()));
            }
        };

        match self.executor.execute(&statement).await {
            Ok(result) => Ok(QueryOutcome::Reply(self.present(user_key, &result).await)),
            Err(err @ ExecutionError::Timeout) => {
                warn!(sql = statement.sql(), "Catalog query timed out");
                Ok(QueryOutcome::Failed(err.to_string()))
            }
            Err(ExecutionError::EngineFailure(message)) => {
                warn!(sql = statement.sql(), %message, "Catalog query failed");
                Ok(QueryOutcome::Failed(message))
            }
        }
    }

    /// Turn result rows into a reply, replacing the context when the rows
    /// identify wine cards.
    async fn present(&self, user_key: &str, result: &QueryResult) -> String {
        if result.rows.is_empty() {
            return "Nothing in the catalog matched that.".to_string();
        }
        let entries = entries_from_result(result);
        if entries.is_empty() {
            return reply::tabular(result);
        }
        let text = reply::wine_list(&entries);
        self.contexts.set(user_key, entries).await;
        text
    }
}

enum QueryOutcome {
    Reply(String),
    Failed(String),
}

fn is_cancel(text: &str) -> bool {
    let folded = sqlgate::fold_case(text.trim().trim_end_matches(['.', '!']));
    CANCEL_WORDS.iter().any(|word| folded == *word)
}

/// Map result rows onto context entries when identifying columns exist.
///
/// `card_key` or `url` keys the wine; the label is assembled from name,
/// producer and year columns when present.
fn entries_from_result(result: &QueryResult) -> Vec<ContextEntry> {
    let find = |name: &str| {
        result
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    };

    let key_col = find("card_key");
    let url_col = find("url");
    if key_col.is_none() && url_col.is_none() {
        return Vec::new();
    }
    let name_col = find("wine_name");
    let producer_col = find("producer");
    let year_col = find("harvest_year");
    let title_col = find("title");

    let mut entries = Vec::new();
    for row in &result.rows {
        let cell = |col: Option<usize>| col.and_then(|i| row.get(i)).and_then(cell_text);

        let Some(wine_id) = cell(key_col).or_else(|| cell(url_col)) else {
            continue;
        };

        let mut parts = Vec::new();
        if let Some(name) = cell(name_col) {
            parts.push(name);
        }
        if let Some(producer) = cell(producer_col) {
            parts.push(producer);
        }
        if let Some(year) = cell(year_col) {
            parts.push(year);
        }
        if parts.is_empty() {
            if let Some(title) = cell(title_col) {
                parts.push(title);
            }
        }
        let label = if parts.is_empty() {
            format!("Wine {wine_id}")
        } else {
            parts.join(", ")
        };

        entries.push(ContextEntry { wine_id, label });
    }
    entries
}

fn cell_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
