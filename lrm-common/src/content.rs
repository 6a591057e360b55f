//! Reference content on disk
//!
//! ```text
//! licensing_roadmap.json          state catalog
//! states/<abbr>.md                per-state requirements write-up
//! training_roadmaps/<id>.json     training plan shown on the roadmap page
//! ```
//!
//! All of it is hand-maintained; missing files read as empty.

use chrono::NaiveDate;
use pulldown_cmark::{html, Event, Options, Parser};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::models::LicenseStatus;
use crate::status::{StatusClass, StatusContext};
use crate::store::validate_account;
use crate::Result;

/// One state in the reference catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: LicenseStatus,
    #[serde(with = "crate::time::opt_date", default)]
    pub expires_on: Option<NaiveDate>,
    #[serde(default)]
    pub last_reviewed: Option<String>,
    #[serde(default)]
    pub coverage_level: Option<String>,
    /// Board contacts, requirements and anything else the catalog carries
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateCatalog {
    #[serde(default)]
    pub states: BTreeMap<String, CatalogState>,
}

/// Catalog entry with derived display fields
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    #[serde(flatten)]
    pub state: CatalogState,
    pub status_class: StatusClass,
    pub badge_text: &'static str,
    pub days_remaining: Option<i64>,
}

impl CatalogView {
    pub fn new(ctx: &StatusContext, state: CatalogState) -> Self {
        let status_class = ctx.classify(state.status, state.expires_on);
        Self {
            days_remaining: ctx.days_remaining(state.expires_on),
            badge_text: status_class.badge_text(),
            status_class,
            state,
        }
    }
}

/// Row on the content freshness admin page
#[derive(Debug, Clone, Serialize)]
pub struct FreshnessRow {
    pub abbr: String,
    pub name: String,
    pub last_reviewed: Option<String>,
    pub coverage_level: String,
    pub status: LicenseStatus,
}

pub struct ContentLibrary {
    data_dir: PathBuf,
}

impl ContentLibrary {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn catalog(&self) -> Result<StateCatalog> {
        let path = self.data_dir.join("licensing_roadmap.json");
        let mut catalog: StateCatalog = match read_optional(&path).await? {
            Some(text) => serde_json::from_str(&text)?,
            None => StateCatalog::default(),
        };
        // Keys are postal codes; tolerate lower-case files
        catalog.states = std::mem::take(&mut catalog.states)
            .into_iter()
            .map(|(abbr, state)| (abbr.to_ascii_uppercase(), state))
            .collect();
        Ok(catalog)
    }

    /// Every catalog state with status class, badge and days remaining
    pub async fn catalog_views(&self, ctx: &StatusContext) -> Result<BTreeMap<String, CatalogView>> {
        Ok(self
            .catalog()
            .await?
            .states
            .into_iter()
            .map(|(abbr, state)| (abbr, CatalogView::new(ctx, state)))
            .collect())
    }

    pub async fn catalog_state(&self, abbr: &str) -> Result<Option<CatalogState>> {
        let code = crate::jurisdictions::normalize_code(abbr);
        Ok(self.catalog().await?.states.remove(&code))
    }

    /// Markdown write-up for a state rendered to HTML
    pub async fn state_detail_html(&self, abbr: &str) -> Result<Option<String>> {
        let code = abbr.trim().to_ascii_lowercase();
        validate_account(&code)?;
        let path = self.data_dir.join("states").join(format!("{}.md", code));
        Ok(read_optional(&path).await?.map(|md| render_markdown(&md)))
    }

    pub async fn training_roadmap(&self, roadmap_id: &str) -> Result<Option<Value>> {
        validate_account(roadmap_id)?;
        let path = self
            .data_dir
            .join("training_roadmaps")
            .join(format!("{}.json", roadmap_id));
        match read_optional(&path).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Catalog states, least recently reviewed first (never reviewed at the top)
    pub async fn admin_freshness(&self) -> Result<Vec<FreshnessRow>> {
        let mut rows: Vec<FreshnessRow> = self
            .catalog()
            .await?
            .states
            .into_iter()
            .map(|(abbr, state)| FreshnessRow {
                name: state
                    .name
                    .clone()
                    .unwrap_or_else(|| crate::jurisdictions::display_name(&abbr)),
                abbr,
                last_reviewed: state.last_reviewed,
                coverage_level: state.coverage_level.unwrap_or_else(|| "draft".to_string()),
                status: state.status,
            })
            .collect();

        rows.sort_by(|a, b| a.last_reviewed.cmp(&b.last_reviewed));
        Ok(rows)
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Markdown to HTML with tables enabled and single newlines kept as `<br />`
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn test_render_markdown_tables_and_line_breaks() {
        let html = render_markdown("# Texas\nline one\nline two\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<h1>Texas</h1>"));
        assert!(html.contains("line one<br />"));
        assert!(html.contains("<table>"));
    }

    #[tokio::test]
    async fn test_missing_content_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let lib = ContentLibrary::new(dir.path());
        assert!(lib.catalog().await.unwrap().states.is_empty());
        assert!(lib.state_detail_html("tx").await.unwrap().is_none());
        assert!(lib.training_roadmap("plan").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_catalog_views_and_freshness_order() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "licensing_roadmap.json",
            r#"{"states": {
                "TX": {"name": "Texas", "status": "licensed", "expires_on": "2025-07-01",
                       "last_reviewed": "2025-01-10", "board_phone": "555-0100"},
                "az": {"name": "Arizona", "status": "in_progress", "last_reviewed": "2024-11-02"},
                "NM": {"name": "New Mexico", "status": "not_licensed", "coverage_level": "full"}
            }}"#,
        );
        write(dir.path(), "states/tx.md", "## Requirements\n4 years experience");

        let lib = ContentLibrary::new(dir.path());
        let today = crate::time::parse_date("2025-06-01").unwrap();
        let views = lib.catalog_views(&StatusContext::new(today, 90)).await.unwrap();
        assert_eq!(views["TX"].status_class, StatusClass::DueSoon);
        assert_eq!(views["TX"].days_remaining, Some(30));
        assert_eq!(views["TX"].state.extra["board_phone"], "555-0100");
        assert_eq!(views["AZ"].badge_text, "In Progress");

        let order: Vec<String> = lib
            .admin_freshness()
            .await
            .unwrap()
            .into_iter()
            .map(|r| format!("{}:{}", r.abbr, r.coverage_level))
            .collect();
        assert_eq!(order, vec!["NM:full", "AZ:draft", "TX:draft"]);

        let html = lib.state_detail_html("TX").await.unwrap().unwrap();
        assert!(html.contains("<h2>Requirements</h2>"));
    }
}
