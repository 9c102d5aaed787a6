//! Catalog lookup tool: product, price, and inventory queries.
//!
//! Reads a delimited catalog file (comma, semicolon, tab, or whitespace
//! separated, sniffed from the header line). Without a catalog file the
//! tool serves a built-in sample catalog and its results are DEGRADED.
//!
//! A lookup tries several normalized forms of the query in turn and stops
//! at the first that matches; every attempt is reported in the payload.

use agentrail_core::decision::ToolKind;
use agentrail_core::error::ToolError;
use agentrail_core::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use regex_lite::Regex;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

const SAMPLE_CATALOG: &str = "\
sku,name,category,price,currency,stock,description
PEN456,Blue Ballpoint Pen,stationery,1.99,USD,150,Smooth-writing blue ink pen
NOTE123,Spiral Notebook,stationery,4.50,USD,80,A5 notebook with 120 ruled pages
COF001,Arabica Coffee Beans,grocery,12.99,USD,40,Whole roasted arabica beans 1kg
MUG200,Ceramic Coffee Mug,kitchen,8.99,USD,25,350ml mug dishwasher safe
LAMP77,Desk Lamp,office,24.00,USD,12,LED desk lamp with adjustable arm
BAG310,Laptop Backpack,accessories,39.95,USD,0,Water-resistant 15 inch laptop backpack
";

/// Where catalog rows come from.
#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Sample,
}

pub struct CatalogTool {
    source: Source,
}

impl CatalogTool {
    /// A catalog backed by a delimited file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    /// The built-in sample catalog (simulated mode).
    pub fn sample() -> Self {
        Self {
            source: Source::Sample,
        }
    }

    async fn load(&self) -> Result<Catalog, ToolError> {
        let text = match &self.source {
            Source::Sample => SAMPLE_CATALOG.to_string(),
            Source::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                ToolError::ExecutionFailed {
                    tool_name: "CSV".into(),
                    reason: format!("cannot read catalog {}: {e}", path.display()),
                }
            })?,
        };
        Catalog::parse(&text).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: "CSV".into(),
            reason,
        })
    }
}

#[async_trait]
impl Tool for CatalogTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Csv
    }

    fn description(&self) -> &str {
        "Look up products, prices, and stock levels in the local catalog."
    }

    fn is_simulated(&self) -> bool {
        matches!(self.source, Source::Sample)
    }

    async fn execute(
        &self,
        query: &str,
        parameters: &serde_json::Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let catalog = self.load().await?;
        let payload = catalog.lookup(query, parameters);
        debug!(query, status = %payload["status"], "Catalog lookup");

        Ok(if self.is_simulated() {
            ToolOutput::simulated(payload)
        } else {
            ToolOutput::live(payload)
        })
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────

type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Delimiter {
    Char(char),
    Whitespace,
}

#[derive(Debug, Default)]
struct Catalog {
    rows: Vec<Row>,
}

fn canonical_column(raw: &str) -> String {
    let lc = raw.trim().trim_matches('"').to_lowercase();
    match lc.as_str() {
        "id" | "sku_id" => "sku".into(),
        "product" | "item" | "title" => "name".into(),
        "stock" | "qty" => "quantity".into(),
        _ => lc,
    }
}

fn sniff(header: &str) -> Delimiter {
    if header.contains('\t') {
        return Delimiter::Char('\t');
    }
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();
    match (commas, semicolons) {
        (0, 0) => Delimiter::Whitespace,
        (c, s) if s > c => Delimiter::Char(';'),
        _ => Delimiter::Char(','),
    }
}

/// Split one line, honoring double-quoted fields for character delimiters.
fn split_line(line: &str, delimiter: Delimiter) -> Vec<String> {
    let sep = match delimiter {
        Delimiter::Whitespace => {
            return line.split_whitespace().map(str::to_string).collect();
        }
        Delimiter::Char(c) => c,
    };

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            c if c == sep && !quoted => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

impl Catalog {
    fn parse(text: &str) -> Result<Self, String> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let header = lines.next().ok_or("catalog is empty")?;
        let delimiter = sniff(header);
        let columns: Vec<String> = split_line(header, delimiter)
            .iter()
            .map(|c| canonical_column(c))
            .collect();

        if columns.len() < 2 {
            return Err(format!("catalog header has a single column: {header}"));
        }

        let rows = lines
            .map(|line| split_line(line, delimiter))
            .filter(|fields| fields.len() >= 2)
            .map(|fields| {
                columns
                    .iter()
                    .cloned()
                    .zip(fields)
                    .filter(|(_, v)| !v.is_empty())
                    .collect::<Row>()
            })
            .collect();

        Ok(Self { rows })
    }

    fn field<'a>(row: &'a Row, key: &str) -> &'a str {
        row.get(key).map(String::as_str).unwrap_or_default()
    }

    fn sku_matches(&self, sku: &str) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|r| Self::field(r, "sku").eq_ignore_ascii_case(sku))
            .collect()
    }

    fn substring_matches(&self, needle: &str) -> Vec<&Row> {
        let needle = needle.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.rows
            .iter()
            .filter(|r| {
                ["sku", "name", "description"]
                    .iter()
                    .any(|k| Self::field(r, k).to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Rows whose full name appears inside the query.
    fn names_in(&self, cleaned: &str) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|r| {
                let name = Self::field(r, "name").to_lowercase();
                !name.is_empty() && cleaned.contains(&name)
            })
            .collect()
    }

    fn lookup(&self, query: &str, parameters: &serde_json::Map<String, Value>) -> Value {
        let cleaned = clean(query);
        let mut attempts: Vec<Value> = Vec::new();

        if is_list_intent(&cleaned) {
            attempts.push(json!({"label": "list", "candidate": cleaned, "rows": self.rows.len()}));
            return json!({
                "status": "found",
                "list": true,
                "matches": self.rows.iter().map(display_row).collect::<Vec<_>>(),
                "attempts": attempts,
            });
        }

        let param = |key: &str| parameters.get(key).and_then(Value::as_str).map(str::to_string);
        let mut candidates: Vec<(&str, String)> = vec![
            ("raw", query.trim().to_string()),
            ("cleaned", cleaned.clone()),
        ];
        if let Some(sku) = param("sku").or_else(|| sku_token(&cleaned)) {
            candidates.push(("sku", sku));
        }
        if let Some(term) = param("product").or_else(|| product_term(&cleaned)) {
            candidates.push(("product", term));
        }

        for (label, candidate) in candidates {
            let rows = if label == "sku" {
                self.sku_matches(&candidate)
            } else {
                self.substring_matches(&candidate)
            };
            attempts.push(json!({"label": label, "candidate": candidate, "rows": rows.len()}));
            if !rows.is_empty() {
                return found(&rows, attempts);
            }
        }

        let named = self.names_in(&cleaned);
        attempts.push(json!({"label": "name_in_query", "candidate": cleaned, "rows": named.len()}));
        if !named.is_empty() {
            return found(&named, attempts);
        }

        json!({
            "status": "not_found",
            "query": query,
            "attempts": attempts,
        })
    }
}

fn display_row(row: &Row) -> Value {
    let mut out = serde_json::Map::new();
    for (k, v) in row {
        let value = match k.as_str() {
            "price" => number(v),
            "quantity" => v.parse::<i64>().map(Value::from).unwrap_or_else(|_| json!(v)),
            _ => json!(v),
        };
        out.insert(k.clone(), value);
    }
    Value::Object(out)
}

fn number(raw: &str) -> Value {
    let trimmed = raw.trim_start_matches(['$', '€', '£']);
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| json!(raw))
}

fn found(rows: &[&Row], attempts: Vec<Value>) -> Value {
    let first = rows[0];
    let top = display_row(first);
    json!({
        "status": "found",
        "item": top.get("name").cloned().unwrap_or(Value::Null),
        "price": top.get("price").cloned().unwrap_or(Value::Null),
        "quantity": top.get("quantity").cloned().unwrap_or(Value::Null),
        "sku": top.get("sku").cloned().unwrap_or(Value::Null),
        "currency": top.get("currency").cloned().unwrap_or(Value::Null),
        "matches": rows.iter().map(|r| display_row(r)).collect::<Vec<_>>(),
        "attempts": attempts,
    })
}

// ── Query normalization ───────────────────────────────────────────────────

/// Strip punctuation (keeping `-` and `:`) and lower-case.
fn clean(query: &str) -> String {
    let kept: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == ':')
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_list_intent(cleaned: &str) -> bool {
    Regex::new(r"\b(show|list|available)\b.*\b(products?|items?)\b")
        .is_ok_and(|re| re.is_match(cleaned))
}

fn first_capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(text)?;
    caps.get(1).map(|m| m.as_str().trim().to_string())
}

/// `sku PEN456`, `sku: pen456`, or a bare `PEN456`-shaped token.
pub fn sku_token(text: &str) -> Option<String> {
    if let Some(sku) = first_capture(r"(?i)\bsku\b[-\s:]*([a-z0-9\-]+)\b", text) {
        return Some(sku.to_uppercase());
    }
    text.split_whitespace()
        .find(|w| Regex::new(r"^[A-Za-z]{2,}\d{2,}(-[A-Za-z0-9]+)?$").is_ok_and(|re| re.is_match(w)))
        .map(str::to_uppercase)
}

/// The product named in `price of <term>` / `cost of <term>` phrasing.
pub fn product_term(text: &str) -> Option<String> {
    first_capture(
        r"(?i)\b(?:price|cost|stock)\s+(?:of|for)\s+(?:an?\s+|the\s+)?([a-z0-9][a-z0-9 \-]*?)(?:\s+and\s+then\b.*|\s+then\b.*)?$",
        text,
    )
    .filter(|t| !t.is_empty())
}
