use chrono::{DateTime, Datelike, Days, Local, NaiveDate};

use crate::models::Entry;

/// Trailing full weeks shown in the activity overview; the grid also
/// carries the current partial week through today.
pub const WEEK_WINDOW: usize = 20;

/// One cell of the activity overview: a calendar day, its position in the
/// weekday-by-week grid, and how many sets were logged that day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityDay {
    pub date: NaiveDate,
    /// 1..=7, Sunday in row 1.
    pub row: u32,
    /// 1-based week column; the rightmost column is the current week.
    pub col: u32,
    pub set_count: u32,
}

/// Dense per-day set counts for the heatmap, plus the single-day maximum
/// the renderer needs to normalize its color scale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityGrid {
    pub days: Vec<ActivityDay>,
    pub max_count: u32,
    pub weeks: usize,
}

impl ActivityGrid {
    pub fn columns(&self) -> u32 {
        self.weeks as u32 + 1
    }

    /// Share of the single-day maximum, in 0.0..=1.0. An empty window has
    /// max 0 and every day maps to 0.0; 0/0 never reaches the renderer.
    pub fn intensity(&self, set_count: u32) -> f32 {
        if self.max_count == 0 {
            0.0
        } else {
            (set_count as f32 / self.max_count as f32).clamp(0.0, 1.0)
        }
    }
}

/// Builds the per-day grid covering the `weeks` full weeks before `now`
/// plus the current partial week: `7 * weeks + weekday(now) + 1` days.
///
/// The log is kept in timestamp order, so one pass walking days and
/// entries backward together visits each entry at most once; the whole
/// build is linear in `entries.len() + 7 * weeks`. Entries are bucketed by
/// calendar day; an entry stamped ahead of `now` (clock skew) lands on day
/// zero instead of disappearing.
pub fn build_grid(entries: &[Entry], now: DateTime<Local>, weeks: usize) -> ActivityGrid {
    let today = now.date_naive();
    let total_days = 7 * weeks + now.weekday().num_days_from_sunday() as usize + 1;

    let mut days = Vec::with_capacity(total_days);
    let mut cursor = entries.len();
    let mut max_count = 0u32;
    let mut col = weeks as u32 + 1;

    for i in 0..total_days {
        let date = today - Days::new(i as u64);

        let mut set_count = 0u32;
        while cursor > 0 && entries[cursor - 1].date.date_naive() >= date {
            set_count += 1;
            cursor -= 1;
        }
        max_count = max_count.max(set_count);

        days.push(ActivityDay {
            date,
            row: date.weekday().num_days_from_sunday() + 1,
            col,
            set_count,
        });

        // Walking backward, a Sunday closes out the column. The walk ends
        // on a Sunday, so col bottoms out at exactly zero after the last
        // cell is pushed.
        if date.weekday().num_days_from_sunday() == 0 {
            col -= 1;
        }
    }

    ActivityGrid {
        days,
        max_count,
        weeks,
    }
}
