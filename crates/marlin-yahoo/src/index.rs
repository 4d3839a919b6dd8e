use marlin_core::gateway::Constituent;
use marlin_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, trace, warn};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// S&P 500 constituents, from a CSV listing
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) async fn fetch(client: &Client, url: &str) -> Result<Vec<Constituent>> {
    let time = std::time::Instant::now();
    trace!("Fetching index constituents from {url}");
    let body = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            error!("constituents fetching error: {e}\nURL: {url}");
            Error::provider(e)
        })?
        .text()
        .await
        .map_err(Error::provider)?;

    let constituents = parse(&body)?;
    debug!(
        "{} constituents fetched. Elapsed time: {} ms",
        constituents.len(),
        time.elapsed().as_millis()
    );
    Ok(constituents)
}

/// Rows without a symbol are skipped; a malformed header fails the whole listing.
pub(crate) fn parse(csv_text: &str) -> Result<Vec<Constituent>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers().map_err(Error::provider)?;
    let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
    if !(has(&["Symbol"]) && has(&["Security", "Name"]) && has(&["GICS Sector", "Sector"])) {
        error!("constituents listing has unexpected columns: {headers:?}");
        return Err(Error::InvalidParameter(format!(
            "constituents listing is missing Symbol/Security/GICS Sector columns: {headers:?}"
        )));
    }

    let mut constituents = Vec::new();
    for (line, record) in reader.deserialize::<Row>().enumerate() {
        let row = match record {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(Error::provider(e)),
            Err(e) => {
                warn!("skipping constituents row {}: {e}", line + 2);
                continue;
            }
        };
        if row.symbol.is_empty() {
            continue;
        }
        constituents.push(Constituent {
            symbol: row.symbol,
            name: row.name,
            sector: row.sector,
            sub_industry: row.sub_industry,
        });
    }
    Ok(constituents)
}

#[derive(Deserialize, Debug)]
struct Row {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Security", alias = "Name")]
    name: String,
    #[serde(rename = "GICS Sector", alias = "Sector")]
    sector: String,
    #[serde(rename = "GICS Sub-Industry", default)]
    sub_industry: String,
}
