// Asynchronous job tracking.
//
// Commits and some operational commands return a job id; the tracker
// polls `show jobs id <N>` on the caller's task until the job reaches a
// terminal state. Nothing runs in the background: dropping the future
// stops the polling, and cancellation never touches the remote job.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::client::Client;
use crate::error::Error;
use crate::xml::Element;

/// Terminal and non-terminal job states as the device reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Active,
    Finished,
}

impl JobState {
    fn parse(raw: &str) -> Self {
        match raw {
            "FIN" => Self::Finished,
            "ACT" => Self::Active,
            _ => Self::Pending,
        }
    }
}

/// One server-side job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    /// The device's job type string (`Commit`, `Downld`, ...).
    pub kind: String,
    pub state: JobState,
    /// Completion percentage; 100 once finished.
    pub progress: u8,
    pub warnings: Vec<String>,
    pub details: Vec<String>,
    /// `true` when a finished job reported result OK.
    pub ok: bool,
}

impl Job {
    /// Parse a `<job>` element from a `show jobs` response.
    fn parse(elm: &Element) -> Result<Self, Error> {
        let id = elm
            .child_text("id")
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| Error::Protocol {
                message: "job record without a numeric id".into(),
            })?;
        let state = JobState::parse(elm.child_text("status").unwrap_or_default());
        // Finished jobs report a timestamp in <progress>; treat any
        // non-numeric value as completion.
        let progress = match elm.child_text("progress") {
            Some(raw) => raw.parse().unwrap_or(100),
            None => 0,
        };
        Ok(Self {
            id,
            kind: elm.child_text("type").unwrap_or_default().to_owned(),
            state,
            progress,
            warnings: lines(elm, "warnings"),
            details: lines(elm, "details"),
            ok: elm.child_text("result") == Some("OK"),
        })
    }
}

fn lines(elm: &Element, field: &str) -> Vec<String> {
    match elm.find(field) {
        Some(parent) => parent
            .children_named("line")
            .map(|l| l.text.clone())
            .filter(|l| !l.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// Poll a job until it finishes.
///
/// Progress percentages are offered to `progress` without blocking;
/// a full channel just drops the update. A triggered `cancel` token
/// stops polling promptly and returns [`Error::Cancelled`] — the
/// remote job keeps running.
///
/// A finished job with result OK yields the final record; result FAIL
/// yields [`Error::JobFailed`] carrying the first detail line (or the
/// first warning when there are no details).
pub async fn wait_for_job(
    client: &Client,
    id: u64,
    poll_interval: Duration,
    progress: Option<&mpsc::Sender<u8>>,
    cancel: Option<&CancellationToken>,
) -> Result<Job, Error> {
    let cmd = Element::new("show").child(
        Element::new("jobs").child(Element::with_text("id", id.to_string())),
    );

    loop {
        let root = client.op(&cmd, None, None).await?;
        let job_elm = root
            .find_path(&["result", "job"])
            .ok_or_else(|| Error::Protocol {
                message: format!("no job record for id {id}"),
            })?;
        let job = Job::parse(job_elm)?;

        if job.state == JobState::Finished {
            debug!(id, ok = job.ok, "job finished");
            if job.ok {
                return Ok(job);
            }
            let message = job
                .details
                .first()
                .or_else(|| job.warnings.first())
                .cloned()
                .unwrap_or_else(|| "job failed without details".to_owned());
            return Err(Error::JobFailed { id, message });
        }

        trace!(id, progress = job.progress, "job still running");
        if let Some(tx) = progress {
            // Best effort: a slow consumer must not stall polling.
            let _ = tx.try_send(job.progress);
        }

        match cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => return Err(Error::Cancelled),
                    () = tokio::time::sleep(poll_interval) => {}
                }
            }
            None => tokio::time::sleep(poll_interval).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_running_job() {
        let elm = Element::parse(
            "<job><id>42</id><type>Commit</type><status>ACT</status>\
             <result>PEND</result><progress>55</progress></job>",
        )
        .unwrap();
        let job = Job::parse(&elm).unwrap();
        assert_eq!(job.id, 42);
        assert_eq!(job.kind, "Commit");
        assert_eq!(job.state, JobState::Active);
        assert_eq!(job.progress, 55);
        assert!(!job.ok);
    }

    #[test]
    fn finished_job_with_timestamp_progress() {
        let elm = Element::parse(
            "<job><id>42</id><type>Commit</type><status>FIN</status>\
             <result>OK</result><progress>2026/08/06 10:00:00</progress></job>",
        )
        .unwrap();
        let job = Job::parse(&elm).unwrap();
        assert_eq!(job.state, JobState::Finished);
        assert_eq!(job.progress, 100);
        assert!(job.ok);
    }

    #[test]
    fn collects_warning_and_detail_lines() {
        let elm = Element::parse(
            "<job><id>7</id><status>FIN</status><result>FAIL</result>\
             <warnings><line>w1</line></warnings>\
             <details><line>d1</line><line>d2</line></details></job>",
        )
        .unwrap();
        let job = Job::parse(&elm).unwrap();
        assert_eq!(job.warnings, vec!["w1"]);
        assert_eq!(job.details, vec!["d1", "d2"]);
        assert!(!job.ok);
    }

    #[test]
    fn rejects_record_without_id() {
        let elm = Element::parse("<job><status>FIN</status></job>").unwrap();
        assert!(Job::parse(&elm).is_err());
    }
}
