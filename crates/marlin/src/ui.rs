use anyhow::{anyhow, Result};
use dialoguer::{theme::ColorfulTheme, FuzzySelect, Select};
use indicatif::{ProgressBar, ProgressStyle};
use marlin_core::gateway::{sectors, Constituent};

pub fn single_pb(length: u64) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [ {bar:50} ] {pos}/{len} {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#|-"),
    );
    pb
}

/// `    AAPL | Apple Inc.`, the label shown for one constituent.
pub fn ticker_label(c: &Constituent) -> String {
    format!("{:>6} | {}", c.symbol, c.name)
}

pub fn pick_ticker(index: &[Constituent]) -> Result<String> {
    if index.is_empty() {
        return Err(anyhow!("the index listing is empty; pass --ticker instead"));
    }
    let labels: Vec<String> = index.iter().map(ticker_label).collect();
    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Ticker:")
        .default(0)
        .items(&labels)
        .interact()?;
    Ok(index[selection].symbol.clone())
}

pub fn pick_sector(index: &[Constituent]) -> Result<String> {
    let sectors = sectors(index);
    if sectors.is_empty() {
        return Err(anyhow!("the index listing has no sectors; pass --sector instead"));
    }
    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Industry:")
        .default(0)
        .items(&sectors)
        .interact()?;
    Ok(sectors[selection].clone())
}

/// Index into `items` of the chosen entry.
pub fn pick<T: ToString>(prompt: &str, items: &[T], default: usize) -> Result<usize> {
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .items(items)
        .interact()?;
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_right_align_symbols() {
        let c = Constituent {
            symbol: "MMM".to_string(),
            name: "3M".to_string(),
            sector: "Industrials".to_string(),
            sub_industry: String::new(),
        };
        assert_eq!(ticker_label(&c), "   MMM | 3M");
    }

    #[test]
    fn empty_listing_cannot_be_picked_from() {
        assert!(pick_ticker(&[]).is_err());
        assert!(pick_sector(&[]).is_err());
    }
}
