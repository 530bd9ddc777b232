//! Job events and their user-facing rendering.
//!
//! Each job reports through a [`JobReporter`]: `Started` once it holds a
//! concurrency slot, any number of `Paused`/`Retrying`, then exactly one of
//! `Finished`, `Failed` or `Cancelled`. A job cancelled while still queued
//! reports only `Cancelled`. Events of one job arrive in order; events of
//! different jobs interleave freely.

use crate::Language;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Channel end jobs send their events to
pub type EventSender = UnboundedSender<LanguageEvent>;

/// What happened to a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// Concurrency slot acquired, job is running
    Started,
    /// Rate limited, sleeping before the next attempt
    Paused {
        /// Attempt that was rate limited (1-based)
        attempt: u32,
        /// Cooldown before the next attempt
        cooldown: Duration,
    },
    /// Connection failure, the whole fetch will be re-run
    Retrying {
        /// Attempt that failed (1-based)
        attempt: u32,
        /// Delay before the next attempt
        backoff: Duration,
        /// Failure description
        reason: String,
    },
    /// Publication written
    Finished {
        /// Final file path
        path: PathBuf,
        /// File size
        bytes: u64,
    },
    /// Job gave up
    Failed {
        /// Failure description
        reason: String,
    },
    /// Shutdown requested before the job finished
    Cancelled,
}

impl JobEvent {
    /// Whether the event ends the job
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::Finished { .. } | JobEvent::Failed { .. } | JobEvent::Cancelled
        )
    }
}

/// An event tagged with the job's language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEvent {
    /// Language identifier
    pub language_id: u32,
    /// Lowercased language code (e.g. "hr")
    pub language_code: String,
    /// The event
    pub event: JobEvent,
}

impl fmt::Display for LanguageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = &self.language_code;
        match &self.event {
            JobEvent::Started => write!(f, "started:   {code}"),
            JobEvent::Paused { attempt, cooldown } => write!(
                f,
                "paused:    {code} (rate limited on attempt {attempt}, waiting {:.1}s)",
                cooldown.as_secs_f64()
            ),
            JobEvent::Retrying {
                attempt,
                backoff,
                reason,
            } => write!(
                f,
                "retrying:  {code} (attempt {attempt} failed: {reason}; waiting {:.1}s)",
                backoff.as_secs_f64()
            ),
            JobEvent::Finished { path, bytes } => {
                write!(f, "finished:  {code} -> {} ({bytes} bytes)", path.display())
            }
            JobEvent::Failed { reason } => write!(f, "failed:    {code} ({reason})"),
            JobEvent::Cancelled => write!(f, "cancelled: {code}"),
        }
    }
}

/// Emits events for one language
#[derive(Debug, Clone)]
pub struct JobReporter {
    language_id: u32,
    language_code: String,
    sender: Option<EventSender>,
}

impl JobReporter {
    /// Reporter for `language`; without a sender events are dropped
    pub fn new(language: &Language, sender: Option<EventSender>) -> Self {
        Self {
            language_id: language.language_id,
            language_code: language.language_code.to_lowercase(),
            sender,
        }
    }

    /// Lowercased code of the language being reported on
    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Send one event; a closed receiver is ignored
    pub fn emit(&self, event: JobEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(LanguageEvent {
                language_id: self.language_id,
                language_code: self.language_code.clone(),
                event,
            });
        }
    }
}

/// Per-run tally of terminal events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    /// Jobs started
    pub started: usize,
    /// Rate-limit pauses
    pub paused: usize,
    /// Jobs finished
    pub finished: usize,
    /// Jobs failed
    pub failed: usize,
    /// Jobs cancelled
    pub cancelled: usize,
}

impl EventTally {
    /// Count one event
    pub fn record(&mut self, event: &JobEvent) {
        match event {
            JobEvent::Started => self.started += 1,
            JobEvent::Paused { .. } => self.paused += 1,
            JobEvent::Retrying { .. } => {}
            JobEvent::Finished { .. } => self.finished += 1,
            JobEvent::Failed { .. } => self.failed += 1,
            JobEvent::Cancelled => self.cancelled += 1,
        }
    }

    /// Jobs that reached a terminal event
    pub fn completed(&self) -> usize {
        self.finished + self.failed + self.cancelled
    }
}
