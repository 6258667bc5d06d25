//! Plain-text rendering of snapshots and events.

use finishit_core::{Event, FailureReason, MasteryReport, SessionSnapshot, Task, TaskStatus};

const BAR_WIDTH: usize = 20;
/// Techniques listed under the mastery report.
const TOP_TECHNIQUES: usize = 3;

/// `MM:SS`, rounding partial seconds up so a running timer never shows 00:00.
pub fn format_clock(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Fixed-width bar filled to `fraction` (clamped to 0..=1).
pub fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn status_label(task: &Task) -> &'static str {
    match (task.status, task.paused) {
        (TaskStatus::Pending, _) => "pending",
        (TaskStatus::Active, false) => "running",
        (TaskStatus::Active, true) => "paused",
        (TaskStatus::Done, _) => "done",
        (TaskStatus::Failed, _) => match task.failure {
            Some(FailureReason::Expired) => "expired",
            _ => "gave up",
        },
    }
}

pub fn task_line(index: usize, task: &Task, active: bool) -> String {
    let marker = if active { '>' } else { ' ' };
    let mut line = format!(
        "{marker}{:>3}. {:<9} {} {} {}",
        index + 1,
        status_label(task),
        format_clock(task.remaining_ms),
        bar(1.0 - task.progress()),
        task.title
    );
    if let Some(technique) = task.technique {
        line.push_str(&format!("  {}", technique.kanji()));
    }
    if let Some(note) = &task.victory_note {
        line.push_str(&format!("  \"{note}\""));
    }
    line
}

pub fn snapshot(snapshot: &SessionSnapshot, focus: bool) -> String {
    if focus {
        if let Some(task) = snapshot.active_task() {
            let index = snapshot
                .tasks
                .iter()
                .position(|t| t.id == task.id)
                .unwrap_or(0);
            return task_line(index, task, true);
        }
    }
    if snapshot.tasks.is_empty() {
        return "no tasks yet -- add one with: add <title> [-m minutes]".to_string();
    }

    let mut out: Vec<String> = snapshot
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| task_line(i, t, snapshot.active.as_ref() == Some(&t.id)))
        .collect();

    let s = &snapshot.summary;
    out.push(format!(
        "      {} complete, {} active, {} pending, {} failed  {} {:.0}%",
        s.counts.done,
        s.counts.active,
        s.counts.pending,
        s.counts.failed,
        bar(s.done_pct / 100.0),
        s.done_pct
    ));
    out.join("\n")
}

pub fn mastery(report: &MasteryReport) -> String {
    let mut out = vec![
        format!(
            "rank      {}  ({} points)",
            report.rank, report.overall.mastery_points
        ),
        match report.progress.next {
            Some(next) => format!(
                "next      {}  {} {} points to go",
                next,
                bar(report.progress.percent / 100.0),
                report.progress.points_needed
            ),
            None => "next      top of the ladder".to_string(),
        },
        format!(
            "completed {} of {} tasks ({:.0}%), {} focused",
            report.overall.completed_tasks,
            report.total_tasks,
            report.completion_rate,
            format_minutes(report.overall.total_focus_minutes)
        ),
    ];
    for (technique, stats) in report.top_techniques(TOP_TECHNIQUES) {
        out.push(format!(
            "  {} {:<18} {:>3} tasks  {:>7}  {:>4} pts  {}",
            technique.kanji(),
            technique.name(),
            stats.completed_tasks,
            format_minutes(stats.total_focus_minutes),
            stats.mastery_points,
            stats.rank().name()
        ));
    }
    out.join("\n")
}

pub fn event(event: &Event) -> String {
    match event {
        Event::TaskCreated {
            task_id,
            title,
            duration_ms,
            ..
        } => format!("created {task_id}: {title} ({})", format_clock(*duration_ms)),
        Event::TaskStarted {
            task_id,
            remaining_ms,
            ..
        } => format!("started {task_id}, {} to go", format_clock(*remaining_ms)),
        Event::TaskPaused {
            task_id,
            remaining_ms,
            ..
        } => format!("paused {task_id} at {}", format_clock(*remaining_ms)),
        Event::TaskResumed {
            task_id,
            remaining_ms,
            ..
        } => format!("resumed {task_id} at {}", format_clock(*remaining_ms)),
        Event::TaskCompleted {
            task_id,
            victory_note,
            ..
        } => match victory_note {
            Some(note) => format!("done {task_id}: \"{note}\""),
            None => format!("done {task_id}"),
        },
        Event::TaskFailed {
            task_id, reason, ..
        } => match reason {
            FailureReason::Expired => format!("time is up for {task_id}"),
            FailureReason::GaveUp => format!("gave up on {task_id}"),
        },
        Event::SessionReset { cleared, .. } => format!("session reset, {cleared} tasks cleared"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finishit_core::{BreathingTechnique, ManualClock, TaskDraft, TaskEngine};

    #[test]
    fn clock_rounds_up_partial_seconds() {
        assert_eq!(format_clock(1_500_000), "25:00");
        assert_eq!(format_clock(59_001), "01:00");
        assert_eq!(format_clock(1), "00:01");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn minutes_split_into_hours() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(125), "2h 5m");
    }

    #[test]
    fn mastery_lists_strongest_techniques_first() {
        let mut engine = TaskEngine::new(ManualClock::new());
        let drafts = [
            (BreathingTechnique::Water, 25),
            (BreathingTechnique::Flame, 50),
            (BreathingTechnique::Stone, 75),
            (BreathingTechnique::Wind, 5),
        ];
        for (technique, minutes) in drafts {
            let id = engine
                .create_task_with(TaskDraft::new("t", minutes).with_technique(technique))
                .unwrap();
            engine.complete(&id, None);
        }

        let text = mastery(&engine.snapshot().summary.mastery);
        let stone = text.find("Stone").unwrap();
        let flame = text.find("Flame").unwrap();
        let water = text.find("Water").unwrap();
        assert!(stone < flame && flame < water);
        assert!(!text.contains("Wind"));
        assert!(text.contains("(70 points)"));
    }

    #[test]
    fn bar_is_fixed_width() {
        assert_eq!(bar(0.0), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(bar(1.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
        assert_eq!(bar(2.0).len(), BAR_WIDTH + 2);
        assert_eq!(bar(0.5).matches('#').count(), BAR_WIDTH / 2);
    }
}
