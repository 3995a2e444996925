use super::{CitySaveRow, SimStore};
use crate::error::SimResult;
use rusqlite::{params, OptionalExtension, Row};

fn row_to_save(r: &Row<'_>) -> rusqlite::Result<CitySaveRow> {
    Ok(CitySaveRow {
        save_id: r.get(0)?,
        run_id: r.get(1)?,
        slot: r.get(2)?,
        tick: r.get::<_, i64>(3)? as u64,
        saved_at: r.get(4)?,
        state_json: r.get(5)?,
    })
}

impl SimStore {
    // ── City saves ────────────────────────────────────────────────

    pub fn insert_city_save(&self, row: &CitySaveRow) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO city_save (save_id, run_id, slot, tick, saved_at, state_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.save_id,
                row.run_id,
                row.slot,
                row.tick as i64,
                row.saved_at,
                row.state_json,
            ],
        )?;
        Ok(())
    }

    pub fn get_city_save(&self, save_id: &str) -> SimResult<Option<CitySaveRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT save_id, run_id, slot, tick, saved_at, state_json
                 FROM city_save WHERE save_id = ?1",
                params![save_id],
                row_to_save,
            )
            .optional()?;
        Ok(row)
    }

    /// Most recent save in a slot, across runs.
    pub fn latest_city_save(&self, slot: &str) -> SimResult<Option<CitySaveRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT save_id, run_id, slot, tick, saved_at, state_json
                 FROM city_save WHERE slot = ?1
                 ORDER BY rowid DESC LIMIT 1",
                params![slot],
                row_to_save,
            )
            .optional()?;
        Ok(row)
    }

    pub fn city_saves_for_run(&self, run_id: &str) -> SimResult<Vec<CitySaveRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT save_id, run_id, slot, tick, saved_at, state_json
             FROM city_save WHERE run_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], row_to_save)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
