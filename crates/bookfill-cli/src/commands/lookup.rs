//! Lookup command: find one book and show what enrichment would add.

use anyhow::{Context, Result, bail};
use bookfill_core::{DescriptionScraper, LookupResult, ScrapeResult, SearchKey};
use clap::Args;

use crate::Config;
use crate::display;
use crate::service::{self, Service};

/// Arguments for the lookup command.
#[derive(Debug, Args)]
pub struct LookupArgs {
    /// ISBN, Aladin item id, or title.
    pub key: String,

    /// Upstream service.
    #[arg(long, value_enum, default_value = "kakao")]
    pub service: Service,

    /// Treat a numeric key as an Aladin item id rather than an ISBN.
    #[arg(long)]
    pub item_id: bool,

    /// Print the fields as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the lookup command.
pub async fn execute(args: LookupArgs, config: &Config) -> Result<()> {
    let key = SearchKey::parse(&args.key).context("search key is empty")?;
    let schema = args.service.schema();
    let lookup = args.service.finder_client(config, args.item_id)?;

    let mut fields = match lookup.lookup(&key).await {
        LookupResult::Found(fields) => fields,
        LookupResult::NotFound(reason) => bail!("no match for {key}: {reason}"),
    };

    if let Some(url) = fields.get(schema.url_column).map(str::to_string) {
        let scraper = args.service.scraper(config).await?;
        if let Some(scraper) = &scraper {
            let description = match scraper.scrape(&url).await {
                ScrapeResult::Extracted(text) => Some(text),
                ScrapeResult::Unavailable(reason) => {
                    eprintln!("  (description unavailable: {reason})");
                    None
                }
            };
            fields.set(schema.description_column, description);
        }
        service::shutdown(scraper).await;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
    } else {
        print!("{}", display::render_card(&key, &fields, schema));
    }
    Ok(())
}
