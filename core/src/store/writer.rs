//! Ordered, transactional writes of a generated dataset.
//!
//! Parents before children: players → teams → memberships → sessions →
//! events → purchases → assignments → DAU report. Each group commits in
//! its own transaction through one cached prepared statement.

use super::SimStore;
use crate::{
    activity::DauReport,
    clock::{format_date, format_ts, SimCalendar},
    engine::GeneratedDataset,
    error::SimResult,
    event::EventRecord,
    population::{ExperimentAssignment, PlayerRecord},
    purchases::PurchaseRecord,
    sessions::SessionRecord,
    teams::{MembershipRecord, TeamRecord},
};
use chrono::NaiveDate;
use rusqlite::params;

impl SimStore {
    /// Validate every invariant, then write all groups in order.
    /// Nothing is written if validation fails.
    pub fn write_dataset(&mut self, data: &GeneratedDataset) -> SimResult<()> {
        data.validate()?;

        self.write_players(&data.players)?;
        self.write_teams(&data.teams)?;
        self.write_memberships(&data.memberships)?;
        self.write_sessions(&data.sessions)?;
        self.write_events(&data.events)?;
        self.write_purchases(&data.purchases)?;
        self.write_assignments(&data.assignments)?;
        self.write_dau_report(data.start_date, &data.report)?;

        log::info!(
            "store: wrote {} players, {} sessions, {} events, {} purchases",
            data.players.len(),
            data.sessions.len(),
            data.events.len(),
            data.purchases.len()
        );
        Ok(())
    }

    pub fn write_players(&mut self, players: &[PlayerRecord]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO players (
                    player_id, created_at_utc, country_code, platform,
                    device_model, os_version, acquisition_channel,
                    acquisition_campaign, language_code, time_zone
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            )?;
            for p in players {
                stmt.execute(params![
                    p.player_id,
                    format_ts(&p.created_at),
                    p.country_code.as_ref(),
                    p.platform.as_ref(),
                    p.device_model.as_ref(),
                    p.os_version.as_ref(),
                    p.acquisition_channel.as_ref(),
                    p.acquisition_campaign.as_deref(),
                    p.language_code.as_ref(),
                    p.time_zone_label(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn write_teams(&mut self, teams: &[TeamRecord]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO teams (
                    team_id, created_at_utc, disbanded_at_utc, tier_level, max_members
                ) VALUES (?1,?2,?3,?4,?5)",
            )?;
            for t in teams {
                stmt.execute(params![
                    t.team_id,
                    format_ts(&t.created_at),
                    t.disbanded_at.as_ref().map(format_ts),
                    t.tier_level,
                    t.max_members,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// The partial unique index on leader rows rejects a second leader
    /// even when this is called without `write_dataset`'s validation.
    pub fn write_memberships(&mut self, memberships: &[MembershipRecord]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO team_memberships (
                    membership_id, player_id, team_id, joined_at_utc, left_at_utc, is_leader
                ) VALUES (?1,?2,?3,?4,?5,?6)",
            )?;
            for m in memberships {
                stmt.execute(params![
                    m.membership_id as i64,
                    m.player_id,
                    m.team_id,
                    format_ts(&m.joined_at),
                    m.left_at.as_ref().map(format_ts),
                    m.is_leader,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn write_sessions(&mut self, sessions: &[SessionRecord]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO sessions (
                    session_id, player_id, session_start_utc, session_end_utc,
                    duration_sec, client_version, build_number, country_code,
                    platform, entry_point, season_id
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            )?;
            for s in sessions {
                stmt.execute(params![
                    s.session_id as i64,
                    s.player_id,
                    format_ts(&s.start),
                    format_ts(&s.end),
                    s.duration_sec,
                    s.client_version,
                    s.build_number.to_string(),
                    s.country_code.as_ref(),
                    s.platform.as_ref(),
                    s.entry_point.as_ref(),
                    s.season_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn write_events(&mut self, events: &[EventRecord]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (
                    event_id, player_id, session_id, event_time_utc, event_type,
                    game_mode, match_outcome, level, match_id, soft_delta,
                    soft_currency_purchased, hard_delta, metadata_json
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
            )?;
            for e in events {
                stmt.execute(params![
                    e.event_id as i64,
                    e.player_id,
                    e.session_id.map(|s| s as i64),
                    format_ts(&e.event_time),
                    e.event_type.as_str(),
                    e.game_mode.as_deref(),
                    e.match_outcome.map(|o| o.as_str()),
                    e.level,
                    e.match_id.map(|m| m as i64),
                    e.soft_delta,
                    e.soft_currency_purchased,
                    e.hard_delta,
                    e.metadata_json(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn write_purchases(&mut self, purchases: &[PurchaseRecord]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO purchases (
                    purchase_id, player_id, session_id, purchase_time_utc,
                    product_id, product_type, currency_code, price_local,
                    price_eur, quantity, grants_soft_amount, grants_hard_amount,
                    platform, country_code
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
            )?;
            for p in purchases {
                stmt.execute(params![
                    p.purchase_id as i64,
                    p.player_id,
                    p.session_id as i64,
                    format_ts(&p.purchase_time),
                    p.product_id.as_ref(),
                    p.product_type.as_str(),
                    p.currency_code.as_ref(),
                    p.price_local,
                    p.price_eur,
                    p.quantity,
                    p.grants_soft_amount,
                    p.grants_hard_amount,
                    p.platform.as_ref(),
                    p.country_code.as_ref(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn write_assignments(&mut self, assignments: &[ExperimentAssignment]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO experiment_assignments (
                    experiment_name, player_id, variant, assigned_at_utc
                ) VALUES (?1,?2,?3,?4)",
            )?;
            for a in assignments {
                stmt.execute(params![
                    a.experiment_name.as_ref(),
                    a.player_id,
                    a.variant.as_str(),
                    format_ts(&a.assigned_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn write_dau_report(&mut self, start_date: NaiveDate, report: &DauReport) -> SimResult<()> {
        let calendar = SimCalendar::new(start_date, report.days.len() as u32);
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO dau_report (
                    day_index, day, target_dau, achieved_dau,
                    eligible_players, shortfall, within_tolerance
                ) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            )?;
            for d in &report.days {
                stmt.execute(params![
                    d.day,
                    format_date(&calendar.date_of(d.day)),
                    d.target,
                    d.achieved,
                    d.eligible,
                    d.shortfall,
                    d.within_tolerance,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
