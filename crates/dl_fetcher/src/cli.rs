use clap::Args;
use dl_core::Result;
use crate::ingest::Ingestor;
use crate::provider::{FetchRequest, DEFAULT_LANGUAGE};

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Country code to fetch news for (e.g. us, gb, in)
    #[arg(long)]
    pub country: String,
    /// Provider category (e.g. business, sports, technology)
    #[arg(long)]
    pub category: Option<String>,
    /// Language code passed to the provider
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,
}

impl From<FetchArgs> for FetchRequest {
    fn from(args: FetchArgs) -> Self {
        Self {
            country: args.country,
            category: args.category,
            language: Some(args.language),
        }
    }
}

pub async fn handle_command(args: FetchArgs, ingestor: &Ingestor) -> Result<()> {
    let request = FetchRequest::from(args);
    match ingestor.fetch_and_store(&request).await? {
        Some(report) => {
            println!(
                "🆕 {} new, 📝 {} updated, ⏭️ {} skipped ({} fetched from {})",
                report.inserted,
                report.updated,
                report.skipped,
                report.fetched,
                ingestor.provider_name()
            );
        }
        None => {
            println!(
                "📭 {} returned no articles for {}",
                ingestor.provider_name(),
                request.country
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        fetch: FetchArgs,
    }

    #[test]
    fn test_fetch_args_default_language() {
        let cli = TestCli::parse_from(["test", "--country", "us"]);
        let request = FetchRequest::from(cli.fetch);
        assert_eq!(request.country, "us");
        assert_eq!(request.language(), "en");
        assert_eq!(request.category(), None);
    }

    #[test]
    fn test_fetch_args_requires_country() {
        assert!(TestCli::try_parse_from(["test", "--category", "sports"]).is_err());
    }
}
