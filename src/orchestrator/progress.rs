use std::fmt;

use tokio::sync::watch;

pub const TOTAL_JOBS: u8 = 14;

pub const STATUS_WAITING: &str = "Por favor, aguarde um momento";
pub const STATUS_STARTING: &str = "Iniciando o processo...";
pub const STATUS_DONE: &str = "Plano concluído!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Completed,
    Failed { alert: String },
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed { .. })
    }
}

/// Snapshot consumed by a progress UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub completed: u8,
    pub status: String,
    pub phase: Phase,
}

impl Progress {
    /// `round(100 * completed / 14)`
    pub fn percent(&self) -> u8 {
        ((self.completed as f64 / TOTAL_JOBS as f64) * 100.0).round() as u8
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>3}%] {}", self.percent(), self.status)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            completed: 0,
            status: STATUS_WAITING.to_string(),
            phase: Phase::Idle,
        }
    }
}

/// Publishes progress through a watch channel; `completed` only ever moves forward.
pub struct ProgressReporter {
    tx: watch::Sender<Progress>,
}

impl ProgressReporter {
    pub fn new() -> (Self, watch::Receiver<Progress>) {
        let (tx, rx) = watch::channel(Progress::default());
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Progress {
        self.tx.borrow().clone()
    }

    pub fn start(&self) {
        self.tx.send_modify(|p| {
            p.completed = 0;
            p.status = STATUS_STARTING.to_string();
            p.phase = Phase::Running;
        });
    }

    pub fn job_started(&self, day_name: &str, alternative: u8) {
        self.tx.send_modify(|p| {
            p.status = format!("Gerando {} (Opção {})...", day_name, alternative);
        });
    }

    pub fn job_completed(&self, job_index: u8) {
        self.tx.send_modify(|p| {
            if job_index > p.completed {
                p.completed = job_index.min(TOTAL_JOBS);
            }
        });
    }

    pub fn finish(&self) {
        self.tx.send_modify(|p| {
            p.status = STATUS_DONE.to_string();
            p.phase = Phase::Completed;
        });
    }

    pub fn fail(&self, alert: &str) {
        self.tx.send_modify(|p| {
            p.phase = Phase::Failed {
                alert: alert.to_string(),
            };
        });
    }
}

/// Hands every update to `on_update` until the run ends or the reporter is dropped.
pub async fn follow(mut rx: watch::Receiver<Progress>, mut on_update: impl FnMut(&Progress)) {
    while rx.changed().await.is_ok() {
        let progress = rx.borrow_and_update().clone();
        on_update(&progress);
        if progress.phase.is_terminal() {
            break;
        }
    }
}
