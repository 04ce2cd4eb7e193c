//! Diesel-backed gateway over the SQLite store.

use std::collections::HashSet;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use super::diesel_models::{
    EntityRecord, FilerInfoRecord, FilingInfoRecord, FilingRecord, NewEntity, NewFilerInfo,
    NewFiling, NewFilingInfo, NewNote, NewTrade, NoteRecord, TradeRecord,
};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::gateway::{CommitSummary, Gateway};
use super::unit_of_work::UnitOfWork;
use crate::models::{Entity, Filing, FilingDetail, Record};
use crate::schema::{entities, filer_info, filing_info, filings, notes, trades};

/// Gateway implementation with compile-time checked queries.
#[derive(Clone)]
pub struct DieselGateway {
    pool: AsyncSqlitePool,
}

impl DieselGateway {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get an entity by certificate number.
    pub async fn get_entity(&self, cert_number: i64) -> Result<Option<Entity>, DieselError> {
        let mut conn = self.pool.get().await?;

        entities::table
            .find(cert_number)
            .select(EntityRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Entity::from))
    }

    /// Get a filing by disclosure id.
    pub async fn get_filing(&self, disclosure_id: i64) -> Result<Option<Filing>, DieselError> {
        let mut conn = self.pool.get().await?;

        filings::table
            .find(disclosure_id)
            .select(FilingRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Filing::from))
    }

    /// Load every stored detail record of one filing, in sequence order.
    pub async fn load_detail(&self, disclosure_id: i64) -> Result<FilingDetail, DieselError> {
        let mut conn = self.pool.get().await?;

        let filing_info = filing_info::table
            .filter(filing_info::disclosure_id.eq(disclosure_id))
            .order(filing_info::info_number.asc())
            .select(FilingInfoRecord::as_select())
            .load(&mut conn)
            .await?;
        let filer_info = filer_info::table
            .filter(filer_info::disclosure_id.eq(disclosure_id))
            .order(filer_info::info_number.asc())
            .select(FilerInfoRecord::as_select())
            .load(&mut conn)
            .await?;
        let trades = trades::table
            .filter(trades::disclosure_id.eq(disclosure_id))
            .order(trades::trade_number.asc())
            .select(TradeRecord::as_select())
            .load(&mut conn)
            .await?;
        let notes = notes::table
            .filter(notes::disclosure_id.eq(disclosure_id))
            .order(notes::note_number.asc())
            .select(NoteRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(FilingDetail {
            disclosure_id,
            filing_info: filing_info.into_iter().map(Into::into).collect(),
            filer_info: filer_info.into_iter().map(Into::into).collect(),
            trades: trades.into_iter().map(Into::into).collect(),
            notes: notes.into_iter().map(Into::into).collect(),
        })
    }
}

#[async_trait]
impl Gateway for DieselGateway {
    async fn entity_exists(&self, cert_number: i64) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        let count: i64 = entities::table
            .filter(entities::cert_number.eq(cert_number))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }

    async fn known_entity_ids(&self) -> Result<HashSet<i64>, DieselError> {
        let mut conn = self.pool.get().await?;

        let ids: Vec<i64> = entities::table
            .select(entities::cert_number)
            .load(&mut conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    async fn filing_exists(&self, disclosure_id: i64) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        let count: i64 = filings::table
            .filter(filings::disclosure_id.eq(disclosure_id))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }

    async fn known_disclosure_ids(&self) -> Result<HashSet<i64>, DieselError> {
        let mut conn = self.pool.get().await?;

        let ids: Vec<i64> = filings::table
            .select(filings::disclosure_id)
            .load(&mut conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    async fn existing_disclosure_ids(&self) -> Result<HashSet<i64>, DieselError> {
        let mut conn = self.pool.get().await?;

        let ids: Vec<i64> = filing_info::table
            .select(filing_info::disclosure_id)
            .union(filer_info::table.select(filer_info::disclosure_id))
            .load(&mut conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    async fn local_filings(&self) -> Result<Vec<(i64, String)>, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(i64, Option<String>)> = filings::table
            .select((filings::disclosure_id, filings::url))
            .order(filings::disclosure_id.asc())
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, url)| url.map(|url| (id, url)))
            .collect())
    }

    async fn commit(&self, unit: &mut UnitOfWork) -> Result<CommitSummary, DieselError> {
        if unit.is_empty() {
            return Ok(CommitSummary::default());
        }

        let records = unit.take();
        match self.write_all(&records).await {
            Ok(summary) => {
                debug!(
                    "Committed {} records ({} already stored)",
                    summary.inserted(),
                    summary.ignored
                );
                Ok(summary)
            }
            Err(e) => {
                unit.restore(records);
                Err(e)
            }
        }
    }
}

impl DieselGateway {
    async fn write_all(&self, records: &[Record]) -> Result<CommitSummary, DieselError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                let mut summary = CommitSummary::default();

                for record in records {
                    let (inserted, counter) = match record {
                        Record::Entity(r) => (
                            diesel::insert_or_ignore_into(entities::table)
                                .values(NewEntity::from(r))
                                .execute(conn)
                                .await?,
                            &mut summary.entities,
                        ),
                        Record::Filing(r) => (
                            diesel::insert_or_ignore_into(filings::table)
                                .values(NewFiling::from(r))
                                .execute(conn)
                                .await?,
                            &mut summary.filings,
                        ),
                        Record::FilingInfo(r) => (
                            diesel::insert_or_ignore_into(filing_info::table)
                                .values(NewFilingInfo::from(r))
                                .execute(conn)
                                .await?,
                            &mut summary.filing_info,
                        ),
                        Record::FilerInfo(r) => (
                            diesel::insert_or_ignore_into(filer_info::table)
                                .values(NewFilerInfo::from(r))
                                .execute(conn)
                                .await?,
                            &mut summary.filer_info,
                        ),
                        Record::Trade(r) => (
                            diesel::insert_or_ignore_into(trades::table)
                                .values(NewTrade::from(r))
                                .execute(conn)
                                .await?,
                            &mut summary.trades,
                        ),
                        Record::Note(r) => (
                            diesel::insert_or_ignore_into(notes::table)
                                .values(NewNote::from(r))
                                .execute(conn)
                                .await?,
                            &mut summary.notes,
                        ),
                    };

                    if inserted > 0 {
                        *counter += inserted;
                    } else {
                        summary.ignored += 1;
                    }
                }

                Ok(summary)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilerInfo, FilingInfo, Note, Trade};
    use crate::repository::DieselDbContext;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselGateway, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.gateway(), dir)
    }

    fn entity(cert_number: i64) -> Entity {
        Entity {
            cert_number,
            bank_name: Some("Example Bank".to_string()),
            city: Some("Dover".to_string()),
            state: Some("DE".to_string()),
        }
    }

    fn filing(disclosure_id: i64, cert_number: i64, url: Option<&str>) -> Filing {
        Filing {
            disclosure_id,
            cert_number,
            last_name: Some("Doe".to_string()),
            first_name: Some("Jane".to_string()),
            middle: None,
            form_type: Some("4".to_string()),
            filing_date: NaiveDate::from_ymd_opt(2012, 3, 15),
            url: url.map(str::to_string),
        }
    }

    fn trade(disclosure_id: i64, trade_number: i32) -> Trade {
        Trade {
            disclosure_id,
            trade_number,
            derivative: false,
            security: Some("Common Stock".to_string()),
            trade_date: NaiveDate::from_ymd_opt(2012, 3, 14),
            exec_date: None,
            code: Some("P".to_string()),
            v_flag: false,
            trade_shares: Some(1000),
            trade_acq: Some(true),
            trade_price: Some(12.5),
            shares_owned: Some(11000),
            direct_own: Some(true),
            nature_of_own: None,
            exercise_price: None,
            exercise_date: None,
            expire_date: None,
            underlying_security: None,
            underlying_shares: None,
        }
    }

    #[tokio::test]
    async fn test_commit_and_existence() {
        let (gateway, _dir) = setup_test_db().await;

        let mut unit = UnitOfWork::new();
        // Staged out of order; commit writes entities before filings.
        unit.add(filing(999, 12345, Some("http://example.test/999")));
        unit.add(entity(12345));
        let summary = gateway.commit(&mut unit).await.unwrap();

        assert_eq!(summary.entities, 1);
        assert_eq!(summary.filings, 1);
        assert!(unit.is_empty());
        assert!(unit.is_open());

        assert!(gateway.entity_exists(12345).await.unwrap());
        assert!(!gateway.entity_exists(1).await.unwrap());
        assert!(gateway.filing_exists(999).await.unwrap());
        assert_eq!(
            gateway.known_entity_ids().await.unwrap(),
            HashSet::from([12345])
        );
        assert_eq!(
            gateway.known_disclosure_ids().await.unwrap(),
            HashSet::from([999])
        );

        let stored = gateway.get_filing(999).await.unwrap().unwrap();
        assert_eq!(stored, filing(999, 12345, Some("http://example.test/999")));
        assert_eq!(gateway.get_entity(12345).await.unwrap(), Some(entity(12345)));
    }

    #[tokio::test]
    async fn test_recommit_is_ignored() {
        let (gateway, _dir) = setup_test_db().await;

        let mut unit = UnitOfWork::new();
        unit.add(entity(1));
        gateway.commit(&mut unit).await.unwrap();

        unit.add(entity(1));
        unit.add(entity(2));
        let summary = gateway.commit(&mut unit).await.unwrap();
        assert_eq!(summary.entities, 1);
        assert_eq!(summary.ignored, 1);
        assert_eq!(gateway.known_entity_ids().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_existing_disclosure_ids_is_union() {
        let (gateway, _dir) = setup_test_db().await;

        let mut unit = UnitOfWork::new();
        unit.add(entity(1));
        for id in [10, 11, 12] {
            unit.add(filing(id, 1, Some(&format!("http://example.test/{id}"))));
        }
        unit.add(FilingInfo {
            disclosure_id: 10,
            info_number: 1,
            issuer_name: Some("Example Bancorp".to_string()),
            issuer_ticker: None,
            report_date: None,
            amendment_date: None,
            exit_filing: Some(false),
        });
        unit.add(FilerInfo {
            disclosure_id: 11,
            info_number: 1,
            title: None,
            name: Some("Doe, Jane".to_string()),
            city: None,
            state: None,
            street: None,
            zip: None,
        });
        gateway.commit(&mut unit).await.unwrap();

        assert_eq!(
            gateway.existing_disclosure_ids().await.unwrap(),
            HashSet::from([10, 11])
        );
        let local = gateway.local_filings().await.unwrap();
        assert_eq!(local.len(), 3);
        assert_eq!(local[2], (12, "http://example.test/12".to_string()));
    }

    #[tokio::test]
    async fn test_local_filings_skip_missing_url() {
        let (gateway, _dir) = setup_test_db().await;

        let mut unit = UnitOfWork::new();
        unit.add(entity(1));
        unit.add(filing(20, 1, None));
        unit.add(filing(21, 1, Some("http://example.test/21")));
        gateway.commit(&mut unit).await.unwrap();

        assert_eq!(
            gateway.local_filings().await.unwrap(),
            vec![(21, "http://example.test/21".to_string())]
        );
    }

    #[tokio::test]
    async fn test_detail_round_trip() {
        let (gateway, _dir) = setup_test_db().await;

        let mut unit = UnitOfWork::new();
        unit.add(entity(1));
        unit.add(filing(30, 1, None));
        unit.add(trade(30, 2));
        unit.add(trade(30, 1));
        unit.add(Note {
            disclosure_id: 30,
            note_number: 1,
            footnote: "(1) Held by spouse.".to_string(),
        });
        let summary = gateway.commit(&mut unit).await.unwrap();
        assert_eq!(summary.trades, 2);
        assert_eq!(summary.notes, 1);
        assert_eq!(summary.inserted(), 5);

        let detail = gateway.load_detail(30).await.unwrap();
        assert_eq!(detail.trades, vec![trade(30, 1), trade(30, 2)]);
        assert_eq!(detail.notes[0].footnote, "(1) Held by spouse.");
        assert!(detail.filing_info.is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_records_staged() {
        let dir = tempdir().unwrap();
        // Schema never created, so every insert fails.
        let ctx = DieselDbContext::new(&dir.path().join("empty.db"));
        let gateway = ctx.gateway();

        let mut unit = UnitOfWork::new();
        unit.add(entity(1));
        assert!(gateway.commit(&mut unit).await.is_err());
        assert_eq!(unit.len(), 1);
    }
}
