use crate::error::{Result, VizcatError};
use crate::types::ColumnType;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Markers always treated as non-data, on top of the descriptor's own list.
/// `#` covers the service's comment lines, `---` its header separator rows.
const BUILTIN_EXCLUDES: [&str; 2] = ["#", "---"];

/// Everything a single catalog descriptor provides: the query parameters and
/// the rules for cleaning the raw response. Immutable after load.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub name: String,
    pub source: String,
    pub radius: String,
    pub output: String,
    pub max_rows: String,
    pub excludes: Vec<String>,
    pub column_types: Vec<ColumnType>,
}

impl CatalogConfig {
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VizcatError::Config(format!(
                "Failed to read catalog descriptor '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(name, &content)
    }

    fn parse(name: &str, content: &str) -> Result<Self> {
        let sections = read_sections(content);
        let query = require_section(name, &sections, "query")?;
        let reduce = require_section(name, &sections, "reduce")?;

        let mut excludes: Vec<String> = require_key(name, reduce, "reduce", "exclude")?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        excludes.extend(BUILTIN_EXCLUDES.iter().map(|s| s.to_string()));

        let column_types = require_key(name, reduce, "reduce", "types")?
            .split_whitespace()
            .map(ColumnType::from_name)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            source: require_key(name, query, "query", "source")?.to_string(),
            radius: require_key(name, query, "query", "radius")?.to_string(),
            output: require_key(name, query, "query", "output")?.to_string(),
            max_rows: require_key(name, query, "query", "max")?.to_string(),
            excludes,
            column_types,
        })
    }
}

type Sections = HashMap<String, HashMap<String, String>>;

/// Minimal key-value section reader for the `.ini` descriptors. Supports
/// `[section]` headers, `key = value` and `key: value` pairs, and `#`/`;`
/// comment lines. Keys and values are trimmed.
fn read_sections(content: &str) -> Sections {
    let mut sections: Sections = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        let Some(section) = &current else { continue };
        if let Some(pos) = line.find(['=', ':']) {
            let key = line[..pos].trim().to_string();
            let value = line[pos + 1..].trim().to_string();
            if let Some(entries) = sections.get_mut(section) {
                entries.insert(key, value);
            }
        }
    }

    sections
}

fn require_section<'a>(
    catalog: &str,
    sections: &'a Sections,
    name: &str,
) -> Result<&'a HashMap<String, String>> {
    sections.get(name).ok_or_else(|| {
        VizcatError::Config(format!(
            "Catalog descriptor '{}' is missing the [{}] section",
            catalog, name
        ))
    })
}

fn require_key<'a>(
    catalog: &str,
    section: &'a HashMap<String, String>,
    section_name: &str,
    key: &str,
) -> Result<&'a str> {
    section.get(key).map(String::as_str).ok_or_else(|| {
        VizcatError::Config(format!(
            "Catalog descriptor '{}' is missing '{}' in [{}]",
            catalog, key, section_name
        ))
    })
}

/// One discovered descriptor file.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Catalog name, the descriptor file name with its extension stripped.
    pub name: String,
    pub file_name: String,
    pub path: PathBuf,
}

/// The set of catalog descriptors found in a configuration directory.
///
/// Discovery is a separate step so the orchestrator never touches the
/// filesystem itself; entries are ordered by file name.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    entries: Vec<CatalogEntry>,
}

impl CatalogRegistry {
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(VizcatError::Config(format!(
                "Catalog directory does not exist: {}",
                dir.display()
            )));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("ini") {
                continue;
            }
            let (Some(file_name), Some(name)) = (
                path.file_name().and_then(|s| s.to_str()).map(str::to_string),
                path.file_stem().and_then(|s| s.to_str()).map(str::to_string),
            ) else {
                continue;
            };
            entries.push(CatalogEntry {
                name,
                file_name,
                path,
            });
        }
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        debug!(
            "Discovered {} catalog descriptor(s) in {}",
            entries.len(),
            dir.display()
        );
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAIA_DESCRIPTOR: &str = "\
[query]
source = I/345/gaia2
radius = 5s
output = RA_ICRS,DE_ICRS,Gmag
max = 5

[reduce]
exclude = RA_ICRS deg
types = float float float
";

    #[test]
    fn parses_both_sections() {
        let config = CatalogConfig::parse("gaia", GAIA_DESCRIPTOR).unwrap();
        assert_eq!(config.source, "I/345/gaia2");
        assert_eq!(config.radius, "5s");
        assert_eq!(config.output, "RA_ICRS,DE_ICRS,Gmag");
        assert_eq!(config.max_rows, "5");
        assert_eq!(
            config.column_types,
            vec![ColumnType::Float, ColumnType::Float, ColumnType::Float]
        );
    }

    #[test]
    fn builtin_markers_are_always_present() {
        let config = CatalogConfig::parse("gaia", GAIA_DESCRIPTOR).unwrap();
        assert!(config.excludes.contains(&"#".to_string()));
        assert!(config.excludes.contains(&"---".to_string()));
        assert!(config.excludes.contains(&"RA_ICRS".to_string()));
        assert!(config.excludes.contains(&"deg".to_string()));
    }

    #[test]
    fn empty_exclude_value_yields_only_builtins() {
        let descriptor = "\
[query]
source = II/246/out
radius = 2s
output = RAJ2000,DEJ2000
max = 1

[reduce]
exclude =
types = float float
";
        let config = CatalogConfig::parse("twomass", descriptor).unwrap();
        assert_eq!(config.excludes, vec!["#".to_string(), "---".to_string()]);
    }

    #[test]
    fn missing_section_is_a_config_error() {
        let descriptor = "[query]\nsource = x\nradius = 1s\noutput = a\nmax = 1\n";
        let err = CatalogConfig::parse("broken", descriptor).unwrap_err();
        assert!(err.to_string().contains("[reduce]"));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let descriptor = "\
[query]
source = x
radius = 1s
max = 1

[reduce]
exclude =
types = float
";
        let err = CatalogConfig::parse("broken", descriptor).unwrap_err();
        assert!(err.to_string().contains("'output'"));
    }

    #[test]
    fn unknown_type_name_is_a_config_error() {
        let descriptor = "\
[query]
source = x
radius = 1s
output = a
max = 1

[reduce]
exclude =
types = float double
";
        assert!(CatalogConfig::parse("broken", descriptor).is_err());
    }

    #[test]
    fn comment_lines_are_ignored() {
        let descriptor = "\
# survey descriptor
[query]
; legacy key style
source: I/345/gaia2
radius = 5s
output = Gmag
max = 1

[reduce]
exclude =
types = float
";
        let config = CatalogConfig::parse("gaia", descriptor).unwrap();
        assert_eq!(config.source, "I/345/gaia2");
    }

    #[test]
    fn discover_picks_only_ini_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ukidss.ini"), GAIA_DESCRIPTOR).unwrap();
        fs::write(dir.path().join("gaia.ini"), GAIA_DESCRIPTOR).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a descriptor").unwrap();

        let registry = CatalogRegistry::discover(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["gaia", "ukidss"]);
        assert_eq!(registry.entries()[0].file_name, "gaia.ini");
    }

    #[test]
    fn discover_fails_for_missing_directory() {
        assert!(CatalogRegistry::discover("definitely/not/here").is_err());
    }
}
