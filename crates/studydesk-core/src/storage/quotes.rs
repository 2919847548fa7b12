use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::database::{ChangeKind, Database, Table};
use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub id: String,
    pub quote: String,
    pub author: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuote {
    pub quote: String,
    pub author: String,
    pub category: Option<String>,
}

fn quote_from_row(row: &Row<'_>) -> rusqlite::Result<DailyQuote> {
    Ok(DailyQuote {
        id: row.get(0)?,
        quote: row.get(1)?,
        author: row.get(2)?,
        category: row.get(3)?,
    })
}

impl Database {
    pub fn add_quote(&self, quote: NewQuote) -> Result<DailyQuote> {
        if quote.quote.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "quote".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        let row = DailyQuote {
            id: uuid::Uuid::new_v4().to_string(),
            quote: quote.quote,
            author: quote.author,
            category: quote.category,
        };
        self.conn().execute(
            "INSERT INTO daily_quotes (id, quote, author, category, added_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.id, row.quote, row.author, row.category, Utc::now().to_rfc3339()],
        )?;
        self.publish(Table::DailyQuotes, ChangeKind::Insert, &row.id);
        Ok(row)
    }

    /// All quotes in insertion order.
    pub fn list_quotes(&self) -> Result<Vec<DailyQuote>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, quote, author, category FROM daily_quotes ORDER BY added_at ASC, rowid ASC")?;
        let quotes = stmt
            .query_map([], quote_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(quotes)
    }

    /// The quote for `date`: rotates through the list by day of year.
    pub fn quote_of_the_day(&self, date: NaiveDate) -> Result<Option<DailyQuote>> {
        let mut quotes = self.list_quotes()?;
        if quotes.is_empty() {
            return Ok(None);
        }
        let index = date.ordinal() as usize % quotes.len();
        Ok(Some(quotes.swap_remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(db: &Database, text: &str) {
        db.add_quote(NewQuote {
            quote: text.into(),
            author: "Anon".into(),
            category: None,
        })
        .unwrap();
    }

    #[test]
    fn empty_table_has_no_quote() {
        let db = Database::open_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(db.quote_of_the_day(day).unwrap().is_none());
    }

    #[test]
    fn rotates_by_day_of_year() {
        let db = Database::open_memory().unwrap();
        add(&db, "zero");
        add(&db, "one");
        add(&db, "two");

        // Jan 1 is ordinal 1.
        let jan1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let jan3 = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(db.quote_of_the_day(jan1).unwrap().unwrap().quote, "one");
        assert_eq!(db.quote_of_the_day(jan3).unwrap().unwrap().quote, "zero");
    }
}
