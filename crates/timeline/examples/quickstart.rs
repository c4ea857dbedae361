//! Quick Start Example
//!
//! Checks two course schedules for clashes and announces the result on a
//! topic.

use std::sync::Arc;

use timeline::prelude::*;

fn main() -> anyhow::Result<()> {
    init_tracing("timeline_notify=debug,quickstart=info")?;

    let registry = Arc::new(TopicRegistry::new());

    // 1. Listen for clashes
    let audit = registry.subscribe("schedule.clash", |payload: &Value| {
        tracing::info!(%payload, "clash recorded");
        Ok(())
    });
    let mut inbox = registry.subscribe_channel("schedule.clash");

    // 2. Build two schedules that overlap on Wednesday
    let term = Interval::new(
        "2024-09-06T00:00:00Z".parse::<DateTime<Utc>>()?,
        "2024-12-16T00:00:00Z".parse::<DateTime<Utc>>()?,
    )?;
    let late_term = Interval::new(
        "2024-09-09T00:00:00Z".parse::<DateTime<Utc>>()?,
        "2024-12-20T00:00:00Z".parse::<DateTime<Utc>>()?,
    )?;
    let morning = Interval::from_json(
        r#"{"start": "2024-09-04T11:00:00Z", "end": "2024-09-04T12:15:00Z"}"#,
    )?;
    let overlap = Interval::starting_at(morning.start() + Duration::minutes(45), Duration::hours(1))?;

    let animal_minds = Schedule::new("ANST-UA 600", TimeRange::undated(term))
        .with_meeting(TimeRange::new("Mon", morning))
        .with_meeting(TimeRange::new("Wed", morning));
    let calculus = Schedule::new("MATH-UA 121", TimeRange::undated(late_term))
        .with_meeting(TimeRange::new("Wed", overlap));

    // 3. Publish every clashing meeting pair
    for (mine, theirs) in animal_minds.conflicting_meetings(&calculus) {
        let report = registry.publish(
            "schedule.clash",
            Some(json!({
                "left": animal_minds.name,
                "right": calculus.name,
                "day": animal_minds.meetings[mine].day,
                "minutes": animal_minds.meetings[mine].duration().num_minutes(),
            })),
        );
        report.into_result()?;
    }

    registry.unsubscribe(&audit);

    while let Some(payload) = inbox.try_recv() {
        println!("clash: {}", payload);
    }

    Ok(())
}
