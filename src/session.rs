use crate::catalog::{CatalogConfig, CatalogEntry, CatalogRegistry};
use crate::clean::clean_response;
use crate::client::CatalogService;
use crate::error::Result;
use crate::types::{CleanedRow, Coordinate, QueryRequest};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// One query run around a single coordinate.
///
/// Walks the registry in order, one catalog at a time, and accumulates the
/// cleaned row (or absent-marker) per catalog name. Any configuration,
/// service, or response error aborts the whole run; results gathered before
/// the failure stay readable.
pub struct QuerySession {
    coordinate: Coordinate,
    registry: CatalogRegistry,
    service: Box<dyn CatalogService>,
    data: HashMap<String, Option<CleanedRow>>,
}

impl QuerySession {
    pub fn new(
        coordinate: Coordinate,
        registry: CatalogRegistry,
        service: Box<dyn CatalogService>,
    ) -> Self {
        Self {
            coordinate,
            registry,
            service,
            data: HashMap::new(),
        }
    }

    /// Queries every catalog not named in `excluded`, sequentially in
    /// registry order. Entries may be excluded by descriptor file name
    /// ("gaia.ini") or bare catalog name ("gaia").
    pub async fn query(&mut self, excluded: &[String]) -> Result<()> {
        let entries: Vec<CatalogEntry> = self.registry.entries().to_vec();
        for entry in entries {
            if excluded
                .iter()
                .any(|ex| ex == &entry.file_name || ex == &entry.name)
            {
                debug!("Skipping excluded catalog {}", entry.name);
                continue;
            }
            let row = self.query_catalog(&entry).await?;
            self.data.insert(entry.name, row);
        }
        Ok(())
    }

    #[instrument(skip(self, entry), fields(catalog = %entry.name))]
    async fn query_catalog(&self, entry: &CatalogEntry) -> Result<Option<CleanedRow>> {
        let config = CatalogConfig::load(&entry.name, &entry.path)?;
        let request = QueryRequest {
            source: config.source.clone(),
            target: self.coordinate.target(),
            radius: config.radius.clone(),
            output: config.output.clone(),
            max_rows: config.max_rows.clone(),
        };

        let raw = self.service.fetch(&entry.name, &request).await?;
        let row = clean_response(&raw, &config)?;
        match &row {
            Some(fields) => info!("Cleaned row with {} field(s)", fields.len()),
            None => info!("No usable data, storing absent marker"),
        }
        Ok(row)
    }

    /// Accumulated results, keyed by catalog name. Absent-marker catalogs map
    /// to `None`.
    pub fn data(&self) -> &HashMap<String, Option<CleanedRow>> {
        &self.data
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn registry(&self) -> &CatalogRegistry {
        &self.registry
    }
}
