use chrono::Local;
use clap::Subcommand;
use studydesk_core::storage::{DailyQuote, NewQuote};

use super::{open, CmdResult};

#[derive(Subcommand)]
pub enum QuoteAction {
    /// Show today's quote
    Today,
    /// Add a quote to the rotation
    Add {
        quote: String,
        #[arg(long, default_value = "Unknown")]
        author: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// List every quote
    List,
}

fn print_quote(q: &DailyQuote) {
    println!("\"{}\"\n    - {}", q.quote, q.author);
}

pub fn run(action: QuoteAction) -> CmdResult {
    let (_config, db) = open()?;
    match action {
        QuoteAction::Today => match db.quote_of_the_day(Local::now().date_naive())? {
            Some(q) => print_quote(&q),
            None => println!("No quotes yet. Add one with `studydesk quote add`."),
        },
        QuoteAction::Add {
            quote,
            author,
            category,
        } => {
            let q = db.add_quote(NewQuote {
                quote,
                author,
                category,
            })?;
            println!("Quote added: {}", q.id);
        }
        QuoteAction::List => {
            for q in db.list_quotes()? {
                print_quote(&q);
            }
        }
    }
    Ok(())
}
