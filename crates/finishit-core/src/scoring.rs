//! Mastery points and rank.
//!
//! Scoring is a pure reduction over the task list. It keeps no state and is
//! recomputed from scratch for every snapshot, so it can never drift from
//! the tasks it describes.
//!
//! ## Formula
//!
//! ```text
//! points = 10 × completed_tasks + 5 × floor(total_focus_minutes / 25)
//! ```
//!
//! Only `Done` tasks count; their committed duration (not the time actually
//! spent) feeds `total_focus_minutes`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::task::{Task, TaskStatus};
use crate::technique::BreathingTechnique;

const POINTS_PER_TASK: u64 = 10;
const POINTS_PER_BLOCK: u64 = 5;
const BLOCK_MINUTES: u64 = 25;

/// Ordered rank ladder, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Mizunoto,
    Mizunoe,
    Kanoto,
    Kanoe,
    Tsuchinoto,
    Tsuchinoe,
    Hinoto,
    Hinoe,
    Kinoto,
    Kinoe,
    Hashira,
}

impl Rank {
    pub const LADDER: [Rank; 11] = [
        Rank::Mizunoto,
        Rank::Mizunoe,
        Rank::Kanoto,
        Rank::Kanoe,
        Rank::Tsuchinoto,
        Rank::Tsuchinoe,
        Rank::Hinoto,
        Rank::Hinoe,
        Rank::Kinoto,
        Rank::Kinoe,
        Rank::Hashira,
    ];

    pub fn required_points(self) -> u64 {
        match self {
            Rank::Mizunoto => 0,
            Rank::Mizunoe => 100,
            Rank::Kanoto => 250,
            Rank::Kanoe => 500,
            Rank::Tsuchinoto => 800,
            Rank::Tsuchinoe => 1200,
            Rank::Hinoto => 1700,
            Rank::Hinoe => 2300,
            Rank::Kinoto => 3000,
            Rank::Kinoe => 4000,
            Rank::Hashira => 5000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Mizunoto => "Mizunoto",
            Rank::Mizunoe => "Mizunoe",
            Rank::Kanoto => "Kanoto",
            Rank::Kanoe => "Kanoe",
            Rank::Tsuchinoto => "Tsuchinoto",
            Rank::Tsuchinoe => "Tsuchinoe",
            Rank::Hinoto => "Hinoto",
            Rank::Hinoe => "Hinoe",
            Rank::Kinoto => "Kinoto",
            Rank::Kinoe => "Kinoe",
            Rank::Hashira => "Hashira",
        }
    }

    pub fn kanji(self) -> &'static str {
        match self {
            Rank::Mizunoto => "癸",
            Rank::Mizunoe => "壬",
            Rank::Kanoto => "辛",
            Rank::Kanoe => "庚",
            Rank::Tsuchinoto => "己",
            Rank::Tsuchinoe => "戊",
            Rank::Hinoto => "丁",
            Rank::Hinoe => "丙",
            Rank::Kinoto => "乙",
            Rank::Kinoe => "甲",
            Rank::Hashira => "柱",
        }
    }

    /// Highest rank whose threshold does not exceed `points`.
    /// Falls back to the lowest rank.
    pub fn for_points(points: u64) -> Rank {
        Self::LADDER
            .iter()
            .rev()
            .copied()
            .find(|r| points >= r.required_points())
            .unwrap_or(Rank::Mizunoto)
    }

    pub fn next(self) -> Option<Rank> {
        Self::LADDER.get(self as usize + 1).copied()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kanji(), self.name())
    }
}

/// Distance to the next rank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankProgress {
    /// `None` at the top of the ladder.
    pub next: Option<Rank>,
    pub points_needed: u64,
    /// Progress from the current threshold to the next, 0.0 ..= 100.0.
    pub percent: f64,
}

impl RankProgress {
    pub fn for_points(points: u64) -> Self {
        let current = Rank::for_points(points);
        match current.next() {
            None => Self {
                next: None,
                points_needed: 0,
                percent: 100.0,
            },
            Some(next) => {
                let floor = current.required_points();
                let span = next.required_points() - floor;
                Self {
                    next: Some(next),
                    points_needed: next.required_points() - points,
                    percent: (points - floor) as f64 / span as f64 * 100.0,
                }
            }
        }
    }
}

/// Completed-task statistics for one partition (or the whole session).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MasteryStats {
    pub completed_tasks: u64,
    pub total_focus_minutes: u64,
    pub mastery_points: u64,
}

impl MasteryStats {
    fn record(&mut self, minutes: u64) {
        self.completed_tasks += 1;
        self.total_focus_minutes += minutes;
        self.mastery_points = mastery_points(self.completed_tasks, self.total_focus_minutes);
    }

    pub fn rank(&self) -> Rank {
        Rank::for_points(self.mastery_points)
    }
}

pub fn mastery_points(completed_tasks: u64, total_focus_minutes: u64) -> u64 {
    POINTS_PER_TASK * completed_tasks + POINTS_PER_BLOCK * (total_focus_minutes / BLOCK_MINUTES)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasteryReport {
    pub overall: MasteryStats,
    pub by_technique: BTreeMap<BreathingTechnique, MasteryStats>,
    pub total_tasks: u64,
    /// Completed share of all tasks, 0.0 ..= 100.0.
    pub completion_rate: f64,
    pub rank: Rank,
    pub progress: RankProgress,
}

impl MasteryReport {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut overall = MasteryStats::default();
        let mut by_technique: BTreeMap<BreathingTechnique, MasteryStats> = BTreeMap::new();

        for task in tasks.iter().filter(|t| t.status == TaskStatus::Done) {
            let minutes = task.initial_minutes();
            overall.record(minutes);
            if let Some(technique) = task.technique {
                by_technique.entry(technique).or_default().record(minutes);
            }
        }

        let total_tasks = tasks.len() as u64;
        let completion_rate = overall.completed_tasks as f64 / total_tasks.max(1) as f64 * 100.0;

        Self {
            overall,
            by_technique,
            total_tasks,
            completion_rate,
            rank: overall.rank(),
            progress: RankProgress::for_points(overall.mastery_points),
        }
    }

    /// Techniques ordered by points, strongest first.
    pub fn top_techniques(&self, n: usize) -> Vec<(BreathingTechnique, MasteryStats)> {
        let mut ranked: Vec<_> = self.by_technique.iter().map(|(t, s)| (*t, *s)).collect();
        ranked.sort_by(|a, b| b.1.mastery_points.cmp(&a.1.mastery_points));
        ranked.truncate(n);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskDraft, TaskId};

    fn task(minutes: u32, status: TaskStatus, technique: Option<BreathingTechnique>) -> Task {
        let mut draft = TaskDraft::new("t", minutes);
        draft.technique = technique;
        let mut task = Task::from_draft(TaskId::from("t"), draft);
        task.status = status;
        task
    }

    #[test]
    fn points_formula() {
        assert_eq!(mastery_points(0, 0), 0);
        assert_eq!(mastery_points(1, 25), 15);
        assert_eq!(mastery_points(2, 49), 25);
        assert_eq!(mastery_points(4, 100), 60);
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(Rank::for_points(0), Rank::Mizunoto);
        assert_eq!(Rank::for_points(99), Rank::Mizunoto);
        assert_eq!(Rank::for_points(100), Rank::Mizunoe);
        assert_eq!(Rank::for_points(4_999), Rank::Kinoe);
        assert_eq!(Rank::for_points(1_000_000), Rank::Hashira);
    }

    #[test]
    fn ladder_is_strictly_increasing() {
        for pair in Rank::LADDER.windows(2) {
            assert!(pair[0].required_points() < pair[1].required_points());
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Rank::Hashira.next(), None);
    }

    #[test]
    fn progress_between_ranks() {
        let p = RankProgress::for_points(175);
        assert_eq!(p.next, Some(Rank::Kanoto));
        assert_eq!(p.points_needed, 75);
        assert!((p.percent - 50.0).abs() < f64::EPSILON);

        let top = RankProgress::for_points(6_000);
        assert_eq!(top.next, None);
        assert_eq!(top.percent, 100.0);
    }

    #[test]
    fn report_counts_only_done_tasks() {
        let tasks = vec![
            task(25, TaskStatus::Done, Some(BreathingTechnique::Water)),
            task(50, TaskStatus::Done, Some(BreathingTechnique::Water)),
            task(30, TaskStatus::Done, Some(BreathingTechnique::Flame)),
            task(60, TaskStatus::Failed, Some(BreathingTechnique::Flame)),
            task(10, TaskStatus::Pending, None),
        ];
        let report = MasteryReport::from_tasks(&tasks);

        assert_eq!(report.overall.completed_tasks, 3);
        assert_eq!(report.overall.total_focus_minutes, 105);
        assert_eq!(report.overall.mastery_points, 30 + 5 * 4);
        assert_eq!(report.total_tasks, 5);
        assert!((report.completion_rate - 60.0).abs() < 1e-9);

        let water = report.by_technique[&BreathingTechnique::Water];
        assert_eq!(water.completed_tasks, 2);
        assert_eq!(water.mastery_points, 20 + 15);
        let flame = report.by_technique[&BreathingTechnique::Flame];
        assert_eq!(flame.completed_tasks, 1);
        assert_eq!(flame.total_focus_minutes, 30);

        let top = report.top_techniques(1);
        assert_eq!(top[0].0, BreathingTechnique::Water);
    }

    #[test]
    fn empty_report_is_lowest_rank() {
        let report = MasteryReport::from_tasks(&[]);
        assert_eq!(report.rank, Rank::Mizunoto);
        assert_eq!(report.completion_rate, 0.0);
        assert_eq!(report.progress.points_needed, 100);
    }
}
