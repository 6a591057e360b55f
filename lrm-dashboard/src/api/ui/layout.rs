//! Page shell and small HTML helpers shared by every page

use axum::response::Html;
use chrono::NaiveDate;
use lrm_common::money::Money;
use lrm_common::rollup::HolderSummary;
use lrm_common::status::StatusClass;
use lrm_common::time::format_long_date;

use crate::session::CurrentSession;

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// `path?account=...`
pub fn account_link(path: &str, account: &str) -> String {
    format!("{}?account={}", path, urlencoding::encode(account))
}

/// JSON embedded in a `<script type="application/json">` block
pub fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

pub fn badge(class: StatusClass) -> String {
    format!(
        r#"<span class="badge badge-{}">{}</span>"#,
        class.as_str(),
        class.badge_text()
    )
}

pub fn long_date(date: Option<NaiveDate>) -> String {
    format_long_date(date)
}

/// Value for a date `<input>`
pub fn input_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Escaped optional text, `-` when absent
pub fn text_or_dash(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => escape(v),
        None => "-".to_string(),
    }
}

/// Money with a class marking negatives
pub fn money_cell(amount: Money) -> String {
    if amount < Money::ZERO {
        format!(r#"<span class="negative">{}</span>"#, amount)
    } else {
        amount.to_string()
    }
}

pub fn days_text(days: Option<i64>) -> String {
    match days {
        Some(d) if d < 0 => format!("{} days overdue", -d),
        Some(0) => "Expires today".to_string(),
        Some(1) => "1 day".to_string(),
        Some(d) => format!("{} days", d),
        None => "-".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Home,
    Roadmap,
    Licenses,
    Costs,
    Settings,
    None,
}

/// Everything the page shell needs besides the body
pub struct Chrome<'a> {
    pub title: &'a str,
    pub nav: Nav,
    pub company_name: &'a str,
    /// Account key carried on navigation links
    pub account: &'a str,
    pub summary: Option<&'a HolderSummary>,
    pub session: &'a CurrentSession,
}

impl Chrome<'_> {
    fn nav_links(&self) -> String {
        let items = [
            (Nav::Home, "/", "Dashboard"),
            (Nav::Roadmap, "/licensing-roadmap", "Roadmap"),
            (Nav::Licenses, "/manage-licenses", "Licenses"),
            (Nav::Costs, "/cost-analytics", "Costs"),
            (Nav::Settings, "/settings", "Settings"),
        ];
        items
            .iter()
            .map(|(nav, path, label)| {
                format!(
                    r#"<a href="{href}" class="nav-link{active}">{label}</a>"#,
                    href = escape(&account_link(path, self.account)),
                    active = if *nav == self.nav { " active" } else { "" },
                    label = label,
                )
            })
            .collect::<Vec<_>>()
            .join("\n            ")
    }

    fn identity(&self) -> String {
        let who = match self.summary {
            Some(summary) => format!(
                r#"<div class="holder-name">{}</div><div class="holder-role">{}</div>"#,
                escape(&summary.name),
                escape(&summary.role)
            ),
            None => String::new(),
        };
        let session = match &self.session.0 {
            Some(session) => format!(
                r#"<div class="session">Signed in as {} · <a href="/logout">Log out</a></div>"#,
                escape(&session.display_name)
            ),
            None => String::new(),
        };
        format!("{}{}", who, session)
    }
}

/// Full page with header and navigation
pub fn page(chrome: &Chrome<'_>, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} · {company}</title>
    <link rel="stylesheet" href="/static/dashboard.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <div class="company">{company}</div>
                <nav>
            {nav}
                </nav>
            </div>
            <div class="header-right">
                {identity}
            </div>
        </div>
    </header>
    <main class="container">
{body}
    </main>
    <footer>lrm-dashboard v{version}</footer>
    <script src="/static/dashboard.js"></script>
</body>
</html>"#,
        title = escape(chrome.title),
        company = escape(chrome.company_name),
        nav = chrome.nav_links(),
        identity = chrome.identity(),
        body = body,
        version = env!("CARGO_PKG_VERSION"),
    ))
}

/// Page without navigation (login, errors)
pub fn bare_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/dashboard.css">
</head>
<body class="bare">
    <main class="container narrow">
{body}
    </main>
</body>
</html>"#,
        title = escape(title),
        body = body,
    )
}
