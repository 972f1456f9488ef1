use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveTime, Timelike};
use thiserror::Error;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, warn};

const SECONDS_PER_DAY: u32 = 86_400;
const NOTIFICATION_TITLE: &str = "Daily fact";
const DEFAULT_BODY: &str = "Time for a new fact!";

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("frequency per day must be at least 1")]
    ZeroFrequency,
    #[error("reminder window is empty: start hour {start} is not before end hour {end}")]
    EmptyWindow { start: u32, end: u32 },
    #[error("end hour {0} is past the end of the day")]
    HourOutOfRange(u32),
}

/// N reminders per day, evenly spaced inside `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSchedule {
    frequency_per_day: u32,
    start_hour: u32,
    end_hour: u32,
}

impl ReminderSchedule {
    pub fn new(
        frequency_per_day: u32,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Self, ScheduleError> {
        if frequency_per_day == 0 {
            return Err(ScheduleError::ZeroFrequency);
        }
        if end_hour > 24 {
            return Err(ScheduleError::HourOutOfRange(end_hour));
        }
        if start_hour >= end_hour {
            return Err(ScheduleError::EmptyWindow {
                start: start_hour,
                end: end_hour,
            });
        }
        Ok(Self {
            frequency_per_day,
            start_hour,
            end_hour,
        })
    }

    /// The firing times for one day, starting at `start_hour` and spaced
    /// `window / frequency` apart.
    pub fn firing_times(&self) -> Vec<NaiveTime> {
        let window_secs = (self.end_hour - self.start_hour) * 3_600;
        let interval_secs = window_secs / self.frequency_per_day;
        (0..self.frequency_per_day)
            .filter_map(|i| {
                let secs = self.start_hour * 3_600 + i * interval_secs;
                NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
            })
            .collect()
    }

    /// Time until the next firing, relative to `now`. Past the last
    /// firing of the day this wraps to tomorrow's first.
    pub fn next_delay_from(&self, now: NaiveTime) -> Duration {
        let now_secs = now.num_seconds_from_midnight();
        let times = self.firing_times();
        for time in &times {
            let secs = time.num_seconds_from_midnight();
            if secs > now_secs {
                return Duration::from_secs(u64::from(secs - now_secs));
            }
        }
        let first = times[0].num_seconds_from_midnight();
        Duration::from_secs(u64::from(SECONDS_PER_DAY - now_secs + first))
    }
}

/// Platform notification delivery. Delivery is best effort; failures
/// are logged by the scheduler and the cycle continues.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Fires sample-fact notifications on a [`ReminderSchedule`], cycling
/// through the sample list in order.
pub struct ReminderScheduler {
    schedule: ReminderSchedule,
    sink: Arc<dyn NotificationSink>,
    sample_facts: Arc<Vec<String>>,
    position: Arc<Mutex<usize>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new(
        schedule: ReminderSchedule,
        sink: Arc<dyn NotificationSink>,
        sample_facts: Vec<String>,
    ) -> Self {
        Self {
            schedule,
            sink,
            sample_facts: Arc::new(sample_facts),
            position: Arc::new(Mutex::new(0)),
            task: Mutex::new(None),
        }
    }

    /// Delivers the next sample fact immediately and moves the cycle
    /// forward. Returns the delivered body text.
    pub async fn fire_once(&self) -> Result<String> {
        deliver(&self.sink, &self.sample_facts, &self.position).await
    }

    /// Starts the background firing loop. A previous loop is replaced.
    pub async fn start(&self) {
        let schedule = self.schedule;
        let sink = Arc::clone(&self.sink);
        let sample_facts = Arc::clone(&self.sample_facts);
        let position = Arc::clone(&self.position);
        let task = tokio::spawn(async move {
            loop {
                let delay = schedule.next_delay_from(Local::now().time());
                debug!(seconds = delay.as_secs(), "reminders: sleeping until next firing");
                tokio::time::sleep(delay).await;
                if let Err(err) = deliver(&sink, &sample_facts, &position).await {
                    warn!("reminders: notification delivery failed: {err}");
                }
            }
        });
        let mut guard = self.task.lock().await;
        if let Some(previous) = guard.replace(task) {
            previous.abort();
        }
    }

    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }
    }
}

async fn deliver(
    sink: &Arc<dyn NotificationSink>,
    sample_facts: &Arc<Vec<String>>,
    position: &Arc<Mutex<usize>>,
) -> Result<String> {
    let body = if sample_facts.is_empty() {
        DEFAULT_BODY.to_string()
    } else {
        let mut position = position.lock().await;
        let body = sample_facts[*position % sample_facts.len()].clone();
        *position = (*position + 1) % sample_facts.len();
        body
    };
    sink.notify(NOTIFICATION_TITLE, &body).await?;
    Ok(body)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
