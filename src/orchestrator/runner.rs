use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::sync::watch;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::calendar::{date_key, target_date, Clock, SystemClock};
use super::client::GenerationClient;
use super::progress::{Progress, ProgressReporter};
use super::work::{work_items, WorkItem};
use crate::daily::dto::WATER_FIELD;
use crate::error::PlanError;
use crate::plan::dto::{DayPlan, DayPlanRequest, UserProfile};
use crate::store::{DocumentPath, DocumentStore};

/// The single alert shown when a run aborts.
pub const FAILURE_ALERT: &str = "Tivemos um probleminha na geração. Tente novamente.";

pub const DEFAULT_JOB_DELAY: Duration = Duration::from_millis(3000);

/// When a job's merge-write also carries `aguaConsumida: 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaterReset {
    /// Every write resets the counter, as the mobile client did.
    Always,
    /// Only the first write to a date in a run, and only if the field is missing.
    #[default]
    IfAbsent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub item: WorkItem,
    pub date_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub jobs: Vec<JobRecord>,
}

impl RunReport {
    pub fn dates(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for job in &self.jobs {
            if !out.contains(&job.date_key.as_str()) {
                out.push(&job.date_key);
            }
        }
        out
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed(RunReport),
    Aborted {
        alert: &'static str,
        error: PlanError,
        completed: u8,
    },
}

/// Drives the 14 generation jobs of a week, strictly one after another.
pub struct Orchestrator {
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    job_delay: Duration,
    water_reset: WaterReset,
    progress: ProgressReporter,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn DocumentStore>) -> Self {
        let (progress, _) = ProgressReporter::new();
        Self {
            client,
            store,
            clock: Arc::new(SystemClock),
            job_delay: DEFAULT_JOB_DELAY,
            water_reset: WaterReset::default(),
            progress,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_job_delay(mut self, delay: Duration) -> Self {
        self.job_delay = delay;
        self
    }

    pub fn with_water_reset(mut self, policy: WaterReset) -> Self {
        self.water_reset = policy;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Runs every job and turns the first failure into the user-facing abort.
    pub async fn orchestrate(&self, user_id: Uuid, profile: &UserProfile) -> Outcome {
        match self.run(user_id, profile).await {
            Ok(report) => Outcome::Completed(report),
            Err(e) => {
                let completed = self.progress.snapshot().completed;
                error!(error = %e, %user_id, completed, "plan generation aborted");
                self.progress.fail(FAILURE_ALERT);
                Outcome::Aborted {
                    alert: FAILURE_ALERT,
                    error: e,
                    completed,
                }
            }
        }
    }

    /// The job loop. The first error stops the run; earlier writes stay in place.
    #[instrument(skip(self, profile))]
    pub async fn run(&self, user_id: Uuid, profile: &UserProfile) -> Result<RunReport, PlanError> {
        info!("starting 14-job plan generation");
        self.progress.start();

        let today = self.clock.today();
        let mut touched: HashSet<String> = HashSet::new();
        let mut report = RunReport::default();

        for item in work_items() {
            let key = self.run_job(user_id, profile, item, today, &mut touched).await?;
            self.progress.job_completed(item.job_index());
            report.jobs.push(JobRecord { item, date_key: key });

            if !self.job_delay.is_zero() {
                tokio::time::sleep(self.job_delay).await;
            }
        }

        self.progress.finish();
        info!(dates = report.dates().len(), "plan generation finished");
        Ok(report)
    }

    async fn run_job(
        &self,
        user_id: Uuid,
        profile: &UserProfile,
        item: WorkItem,
        today: time::Date,
        touched: &mut HashSet<String>,
    ) -> Result<String, PlanError> {
        self.progress
            .job_started(item.day_name(), item.alternative.index());

        let request = DayPlanRequest {
            profile: profile.clone(),
            day_name: item.day_name().to_string(),
            alternative_index: item.alternative.index(),
        };
        let plan = self.client.generate(&request).await?;
        ensure_summary(&plan, &item)?;

        let key = date_key(target_date(today, item.day));
        let path = DocumentPath::daily(user_id, &key);

        let mut fields = Map::new();
        fields.insert(item.alternative.field().to_string(), plan.into_inner());

        let first_write = touched.insert(key.clone());
        if self.should_reset_water(&path, first_write).await? {
            fields.insert(WATER_FIELD.to_string(), json!(0));
        }

        self.store
            .set_merge(&path, fields)
            .await
            .map_err(|e| PlanError::PersistenceError(format!("{:#}", e)))?;

        info!(
            day = item.day_name(),
            alternative = item.alternative.index(),
            job_index = item.job_index(),
            date = %key,
            "day plan stored"
        );
        Ok(key)
    }

    async fn should_reset_water(&self, path: &DocumentPath, first_write: bool) -> Result<bool, PlanError> {
        match self.water_reset {
            WaterReset::Always => Ok(true),
            WaterReset::IfAbsent if !first_write => Ok(false),
            WaterReset::IfAbsent => {
                let existing = self
                    .store
                    .get(path)
                    .await
                    .map_err(|e| PlanError::PersistenceError(format!("{:#}", e)))?;
                Ok(existing.map_or(true, |doc| {
                    doc.get(WATER_FIELD).map_or(true, Value::is_null)
                }))
            }
        }
    }
}

fn ensure_summary(plan: &DayPlan, item: &WorkItem) -> Result<(), PlanError> {
    if plan.summary().is_none() {
        return Err(PlanError::InvalidPlanShape(format!(
            "API retornou dados inválidos para {} (Opção {})",
            item.day_name(),
            item.alternative
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::calendar::FixedClock;
    use crate::orchestrator::progress::{Phase, STATUS_DONE};
    use crate::store::{Document, MemoryDocumentStore};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::macros::date;

    /// Replies with a plan per request; can fail or drop `resumo` at a given call (1-based).
    #[derive(Default)]
    struct ScriptedClient {
        calls: Mutex<Vec<(String, u8)>>,
        started: Mutex<Vec<tokio::time::Instant>>,
        fail_at: Option<usize>,
        shapeless_at: Option<usize>,
        reply: Option<Value>,
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, request: &DayPlanRequest) -> Result<DayPlan, PlanError> {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((request.day_name.clone(), request.alternative_index));
                self.started.lock().unwrap().push(tokio::time::Instant::now());
                calls.len()
            };
            if self.fail_at == Some(n) {
                return Err(PlanError::UpstreamError("503 from model".into()));
            }
            let mut plan = match &self.reply {
                Some(reply) => reply.clone(),
                None => plan_for(&request.day_name, request.alternative_index),
            };
            if self.shapeless_at == Some(n) {
                if let Some(obj) = plan.as_object_mut() {
                    obj.remove("resumo");
                }
            }
            Ok(DayPlan(plan))
        }
    }

    impl ScriptedClient {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn plan_for(day: &str, alt: u8) -> Value {
        json!({
            "resumo": {
                "caloriasTotais": 2000 + alt as u32,
                "metaAgua": 2500,
                "objetivoPrincipal": "Perder peso"
            },
            "refeicoes": [{
                "id": format!("{}-{}-1", day.chars().take(3).collect::<String>(), alt),
                "nome": "Café da Manhã",
                "calorias": 350,
                "completed": false
            }]
        })
    }

    // 2024-06-07 is a Friday.
    const FRIDAY: time::Date = date!(2024 - 06 - 07);

    fn orchestrator(client: Arc<ScriptedClient>, store: Arc<MemoryDocumentStore>) -> Orchestrator {
        Orchestrator::new(client, store)
            .with_clock(Arc::new(FixedClock(FRIDAY)))
            .with_job_delay(Duration::ZERO)
    }

    async fn doc(store: &MemoryDocumentStore, user: Uuid, key: &str) -> Option<Document> {
        store.get(&DocumentPath::daily(user, key)).await.unwrap()
    }

    #[tokio::test]
    async fn full_run_writes_both_alternatives_for_each_day() {
        let client = Arc::new(ScriptedClient::default());
        let store = Arc::new(MemoryDocumentStore::new());
        let orch = orchestrator(client.clone(), store.clone());
        let rx = orch.subscribe();
        let user = Uuid::new_v4();

        let outcome = orch.orchestrate(user, &UserProfile::default()).await;
        let report = match outcome {
            Outcome::Completed(r) => r,
            other => panic!("expected completion, got {other:?}"),
        };

        assert_eq!(client.call_count(), 14);
        let calls = client.calls.lock().unwrap().clone();
        assert_eq!(calls[0], ("Segunda-feira".to_string(), 1));
        assert_eq!(calls[1], ("Segunda-feira".to_string(), 2));
        assert_eq!(calls[13], ("Domingo".to_string(), 2));

        assert_eq!(
            report.dates(),
            vec![
                "2024-06-03", "2024-06-04", "2024-06-05", "2024-06-06", "2024-06-07", "2024-06-08",
                "2024-06-02"
            ]
        );
        assert_eq!(store.len().await, 7);

        let monday = doc(&store, user, "2024-06-03").await.unwrap();
        assert_eq!(monday["planos.1"]["refeicoes"][0]["id"], "Seg-1-1");
        assert_eq!(monday["planos.2"]["refeicoes"][0]["id"], "Seg-2-1");
        assert_eq!(monday[WATER_FIELD], json!(0));

        let progress = rx.borrow().clone();
        assert_eq!(progress.completed, 14);
        assert_eq!(progress.percent(), 100);
        assert_eq!(progress.status, STATUS_DONE);
        assert_eq!(progress.phase, Phase::Completed);
    }

    #[tokio::test]
    async fn upstream_failure_at_job_five_keeps_earlier_writes() {
        let client = Arc::new(ScriptedClient {
            fail_at: Some(5),
            ..Default::default()
        });
        let store = Arc::new(MemoryDocumentStore::new());
        let orch = orchestrator(client.clone(), store.clone());
        let rx = orch.subscribe();
        let user = Uuid::new_v4();

        match orch.orchestrate(user, &UserProfile::default()).await {
            Outcome::Aborted {
                alert,
                error,
                completed,
            } => {
                assert_eq!(alert, FAILURE_ALERT);
                assert!(matches!(error, PlanError::UpstreamError(_)));
                assert_eq!(completed, 4);
            }
            other => panic!("expected abort, got {other:?}"),
        }

        assert_eq!(client.call_count(), 5);
        let monday = doc(&store, user, "2024-06-03").await.unwrap();
        assert!(monday.contains_key("planos.1") && monday.contains_key("planos.2"));
        let tuesday = doc(&store, user, "2024-06-04").await.unwrap();
        assert!(tuesday.contains_key("planos.1") && tuesday.contains_key("planos.2"));
        assert!(doc(&store, user, "2024-06-05").await.is_none());

        let progress = rx.borrow().clone();
        assert_eq!(progress.completed, 4);
        assert_eq!(progress.status, "Gerando Quarta-feira (Opção 1)...");
        assert_eq!(
            progress.phase,
            Phase::Failed {
                alert: FAILURE_ALERT.to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_resumo_aborts_before_writing() {
        let client = Arc::new(ScriptedClient {
            shapeless_at: Some(1),
            ..Default::default()
        });
        let store = Arc::new(MemoryDocumentStore::new());
        let orch = orchestrator(client.clone(), store.clone());

        let err = orch.run(Uuid::new_v4(), &UserProfile::default()).await.unwrap_err();
        assert!(matches!(err, PlanError::InvalidPlanShape(ref m) if m.contains("Segunda-feira (Opção 1)")));
        assert_eq!(client.call_count(), 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn rerun_starts_over_from_the_first_job() {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = Uuid::new_v4();

        let failing = Arc::new(ScriptedClient {
            fail_at: Some(3),
            ..Default::default()
        });
        let first = orchestrator(failing, store.clone());
        assert!(first.run(user, &UserProfile::default()).await.is_err());

        let client = Arc::new(ScriptedClient::default());
        let second = orchestrator(client.clone(), store.clone());
        let report = second.run(user, &UserProfile::default()).await.unwrap();

        assert_eq!(client.call_count(), 14);
        assert_eq!(client.calls.lock().unwrap()[0], ("Segunda-feira".to_string(), 1));
        assert_eq!(report.jobs.len(), 14);
        assert_eq!(store.len().await, 7);
    }

    #[tokio::test]
    async fn merge_write_round_trips_and_keeps_other_alternative() {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = Uuid::new_v4();
        let path = DocumentPath::daily(user, "2024-06-03");
        let existing = json!({ "resumo": { "caloriasTotais": 1500 }, "refeicoes": [] });
        store
            .set_merge(&path, json!({ "planos.2": existing.clone() }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let client = Arc::new(ScriptedClient {
            fail_at: Some(2),
            ..Default::default()
        });
        let orch = orchestrator(client, store.clone());
        assert!(orch.run(user, &UserProfile::default()).await.is_err());

        let monday = doc(&store, user, "2024-06-03").await.unwrap();
        assert_eq!(monday["planos.1"], plan_for("Segunda-feira", 1));
        assert_eq!(monday["planos.2"], existing);
    }

    #[tokio::test]
    async fn if_absent_keeps_logged_water() {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = Uuid::new_v4();
        let friday = DocumentPath::daily(user, "2024-06-07");
        store
            .set_merge(&friday, json!({ WATER_FIELD: 750 }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let orch = orchestrator(Arc::new(ScriptedClient::default()), store.clone());
        orch.run(user, &UserProfile::default()).await.unwrap();

        assert_eq!(doc(&store, user, "2024-06-07").await.unwrap()[WATER_FIELD], json!(750));
        assert_eq!(doc(&store, user, "2024-06-06").await.unwrap()[WATER_FIELD], json!(0));
    }

    #[tokio::test]
    async fn always_policy_resets_water() {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = Uuid::new_v4();
        let friday = DocumentPath::daily(user, "2024-06-07");
        store
            .set_merge(&friday, json!({ WATER_FIELD: 750 }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let orch = orchestrator(Arc::new(ScriptedClient::default()), store.clone())
            .with_water_reset(WaterReset::Always);
        orch.run(user, &UserProfile::default()).await.unwrap();

        assert_eq!(doc(&store, user, "2024-06-07").await.unwrap()[WATER_FIELD], json!(0));
    }

    #[tokio::test]
    async fn plans_are_stored_as_returned() {
        let reply = json!({
            "resumo": { "caloriasTotais": 1800, "dica": "beba água" },
            "refeicoes": [
                { "id": "Seg-1-1", "calorias": "350", "tempoPreparo": 15, "observacao": "sem sal" },
                { "nome": "Lanche" }
            ],
            "extra": [1, 2.5, null]
        });
        let client = Arc::new(ScriptedClient {
            reply: Some(reply.clone()),
            ..Default::default()
        });
        let store = Arc::new(MemoryDocumentStore::new());
        let user = Uuid::new_v4();
        orchestrator(client, store.clone())
            .run(user, &UserProfile::default())
            .await
            .unwrap();

        let sunday = doc(&store, user, "2024-06-02").await.unwrap();
        assert_eq!(sunday["planos.1"], reply);
        assert_eq!(sunday["planos.2"], reply);
        assert_eq!(
            serde_json::to_string(&sunday["planos.1"]).unwrap(),
            serde_json::to_string(&reply).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_jobs() {
        let client = Arc::new(ScriptedClient::default());
        let store = Arc::new(MemoryDocumentStore::new());
        let orch = Orchestrator::new(client.clone(), store)
            .with_clock(Arc::new(FixedClock(FRIDAY)));

        let begin = tokio::time::Instant::now();
        orch.run(Uuid::new_v4(), &UserProfile::default()).await.unwrap();

        let started = client.started.lock().unwrap().clone();
        assert_eq!(started.len(), 14);
        for pair in started.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_JOB_DELAY);
        }
        assert!(begin.elapsed() >= DEFAULT_JOB_DELAY * 13);
    }

    #[tokio::test]
    async fn store_failure_is_a_persistence_error() {
        struct BrokenStore;
        #[async_trait]
        impl DocumentStore for BrokenStore {
            async fn get(&self, _path: &DocumentPath) -> anyhow::Result<Option<Document>> {
                Ok(None)
            }
            async fn set_merge(&self, _path: &DocumentPath, _fields: Document) -> anyhow::Result<()> {
                anyhow::bail!("connection reset")
            }
        }

        let client = Arc::new(ScriptedClient::default());
        let orch = Orchestrator::new(client.clone(), Arc::new(BrokenStore))
            .with_clock(Arc::new(FixedClock(FRIDAY)))
            .with_job_delay(Duration::ZERO);
        let err = orch.run(Uuid::new_v4(), &UserProfile::default()).await.unwrap_err();
        assert!(matches!(err, PlanError::PersistenceError(ref m) if m.contains("connection reset")));
        assert_eq!(client.call_count(), 1);
    }
}
