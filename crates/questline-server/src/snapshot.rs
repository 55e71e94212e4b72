//! Periodic leaderboard snapshots.
//!
//! Every interval the `all_time` snapshot is rebuilt: one `global` board
//! from profile XP, and one `track` board per track from the XP earned on
//! that track's missions.

use std::time::Duration;

use questline_auth::now_secs;
use questline_db::queries::leaderboard::{self, SnapshotRow};
use questline_db::queries::{profiles, progress, tracks};
use questline_engine::leaderboard::rank;
use questline_types::leaderboard::LeaderboardScope;
use questline_types::{UserId, ALL_TIME_PERIOD};
use rusqlite::Connection;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::AppStateArc;

/// What one run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub global_rows: usize,
    pub tracks: usize,
    pub track_rows: usize,
}

fn rows(totals: Vec<(UserId, u64)>, max_entries: usize) -> Vec<SnapshotRow> {
    rank(totals, max_entries)
        .into_iter()
        .map(|r| SnapshotRow {
            user_id: r.user_id,
            xp_total: r.xp_total,
            position: r.position,
        })
        .collect()
}

/// Rebuild every `all_time` board in one transaction.
pub fn run_snapshot(
    conn: &mut Connection,
    max_entries: usize,
    now: u64,
) -> questline_db::Result<SnapshotSummary> {
    let tx = conn.transaction()?;
    let mut summary = SnapshotSummary::default();

    let global = rows(profiles::xp_totals(&tx)?, max_entries);
    leaderboard::replace_snapshot(&tx, LeaderboardScope::Global, None, ALL_TIME_PERIOD, &global, now)?;
    summary.global_rows = global.len();

    for track in tracks::list(&tx, false)? {
        let board = rows(progress::track_totals(&tx, track.id)?, max_entries);
        leaderboard::replace_snapshot(
            &tx,
            LeaderboardScope::Track,
            Some(track.id),
            ALL_TIME_PERIOD,
            &board,
            now,
        )?;
        summary.tracks += 1;
        summary.track_rows += board.len();
    }

    tx.commit()?;
    Ok(summary)
}

/// Spawn the snapshot loop. Returns `None` when the interval is zero.
pub fn spawn(state: AppStateArc) -> Option<JoinHandle<()>> {
    let every = state.config.leaderboard.snapshot_interval_secs;
    if every == 0 {
        info!("Leaderboard snapshots disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every));
        loop {
            ticker.tick().await;
            let max_entries = state.config.leaderboard.max_entries;
            let mut conn = state.db().await;
            match run_snapshot(&mut conn, max_entries, now_secs()) {
                Ok(summary) => debug!(
                    global = summary.global_rows,
                    tracks = summary.tracks,
                    track_rows = summary.track_rows,
                    "Leaderboard snapshot written"
                ),
                Err(e) => warn!("Leaderboard snapshot failed: {}", e),
            }
        }
    }))
}
