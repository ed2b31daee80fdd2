//! CSV export and reload of the listing catalog.
//!
//! One header row plus one row per listing, UTF-8, RFC-4180 quoting. The
//! export overwrites any previous file at the target path.

use std::path::Path;

use csv::{Reader, Writer};

use crate::error::AppResult;
use crate::types::Listing;

/// Writes the catalog to `path`, replacing any previous export.
pub fn write_listings(path: impl AsRef<Path>, listings: &[Listing]) -> AppResult<()> {
    let mut writer = Writer::from_path(path)?;
    for listing in listings {
        writer.serialize(listing)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a previously exported catalog, one listing per row.
pub fn read_listings(path: impl AsRef<Path>) -> AppResult<Vec<Listing>> {
    let mut reader = Reader::from_path(path)?;
    let mut listings = Vec::new();
    for row in reader.deserialize() {
        listings.push(row?);
    }
    Ok(listings)
}
