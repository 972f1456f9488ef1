use super::*;
use tokio::sync::Mutex;

struct RecordingSink {
    notifications: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            notifications: Mutex::new(Vec::new()),
        })
    }

    async fn bodies(&self) -> Vec<String> {
        self.notifications
            .lock()
            .await
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        self.notifications
            .lock()
            .await
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        Err(anyhow::anyhow!("notification service unavailable"))
    }
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

#[test]
fn schedule_rejects_invalid_parameters() {
    assert!(matches!(
        ReminderSchedule::new(0, 8, 20),
        Err(ScheduleError::ZeroFrequency)
    ));
    assert!(matches!(
        ReminderSchedule::new(3, 20, 8),
        Err(ScheduleError::EmptyWindow { start: 20, end: 8 })
    ));
    assert!(matches!(
        ReminderSchedule::new(3, 8, 25),
        Err(ScheduleError::HourOutOfRange(25))
    ));
}

#[test]
fn firing_times_are_evenly_spaced_across_the_window() {
    let schedule = ReminderSchedule::new(4, 8, 20).expect("schedule");
    assert_eq!(
        schedule.firing_times(),
        vec![time(8, 0), time(11, 0), time(14, 0), time(17, 0)]
    );
}

#[test]
fn single_daily_reminder_fires_at_the_window_start() {
    let schedule = ReminderSchedule::new(1, 9, 17).expect("schedule");
    assert_eq!(schedule.firing_times(), vec![time(9, 0)]);
}

#[test]
fn next_delay_targets_the_upcoming_firing() {
    let schedule = ReminderSchedule::new(4, 8, 20).expect("schedule");
    // 10:30 is between the 08:00 and 11:00 firings.
    assert_eq!(
        schedule.next_delay_from(time(10, 30)),
        Duration::from_secs(30 * 60)
    );
}

#[test]
fn next_delay_wraps_to_tomorrows_first_firing() {
    let schedule = ReminderSchedule::new(4, 8, 20).expect("schedule");
    // 22:00 is past the last firing of the day; next is 08:00 tomorrow.
    assert_eq!(
        schedule.next_delay_from(time(22, 0)),
        Duration::from_secs(10 * 3_600)
    );
}

#[tokio::test]
async fn fire_once_cycles_through_sample_facts() {
    let sink = RecordingSink::new();
    let schedule = ReminderSchedule::new(2, 8, 20).expect("schedule");
    let scheduler = ReminderScheduler::new(
        schedule,
        sink.clone(),
        vec!["first".to_string(), "second".to_string()],
    );

    scheduler.fire_once().await.expect("fire");
    scheduler.fire_once().await.expect("fire");
    scheduler.fire_once().await.expect("fire");

    assert_eq!(sink.bodies().await, ["first", "second", "first"]);
}

#[tokio::test]
async fn fire_once_with_no_samples_uses_the_default_body() {
    let sink = RecordingSink::new();
    let schedule = ReminderSchedule::new(1, 8, 9).expect("schedule");
    let scheduler = ReminderScheduler::new(schedule, sink.clone(), Vec::new());

    let body = scheduler.fire_once().await.expect("fire");
    assert_eq!(body, DEFAULT_BODY);
    assert_eq!(sink.bodies().await, [DEFAULT_BODY]);
}

#[tokio::test]
async fn fire_once_surfaces_sink_failures() {
    let schedule = ReminderSchedule::new(1, 8, 9).expect("schedule");
    let scheduler =
        ReminderScheduler::new(schedule, Arc::new(FailingSink), vec!["first".to_string()]);

    assert!(scheduler.fire_once().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn background_loop_delivers_on_schedule() {
    let sink = RecordingSink::new();
    let schedule = ReminderSchedule::new(4, 0, 24).expect("schedule");
    let scheduler =
        ReminderScheduler::new(schedule, sink.clone(), vec!["on schedule".to_string()]);

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(2 * 86_400)).await;
    scheduler.stop().await;

    assert!(!sink.bodies().await.is_empty());
    assert!(scheduler.task.lock().await.is_none());
}
