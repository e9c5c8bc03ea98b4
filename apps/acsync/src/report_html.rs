//! HTML rendering of a run report for the notification mail.

use acsync_core::{CardWrite, Identity, PushResult, RunReport, SyncFailure};

/// Minimal HTML document builder.
struct HtmlBuilder {
    body: String,
}

impl HtmlBuilder {
    fn new() -> Self {
        Self {
            body: String::new(),
        }
    }

    fn paragraph(&mut self, text: &str) {
        self.body.push_str("<p>");
        self.body.push_str(&escape(text));
        self.body.push_str("</p>\n");
    }

    fn heading(&mut self, text: &str) {
        self.body.push_str("<h2>");
        self.body.push_str(&escape(text));
        self.body.push_str("</h2>\n");
    }

    /// Table with a header row followed by data rows.
    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        self.body.push_str("<table border=\"1\">\n<tr>");
        for header in headers {
            self.body.push_str("<th>");
            self.body.push_str(&escape(header));
            self.body.push_str("</th>");
        }
        self.body.push_str("</tr>\n");
        for row in rows {
            self.body.push_str("<tr>");
            for cell in row {
                self.body.push_str("<td>");
                self.body.push_str(&escape(cell));
                self.body.push_str("</td>");
            }
            self.body.push_str("</tr>\n");
        }
        self.body.push_str("</table>\n");
    }

    /// Two-column key/value table.
    fn key_value_table(&mut self, rows: &[(String, String)]) {
        self.body.push_str("<table border=\"1\">\n");
        for (key, value) in rows {
            self.body.push_str("<tr><th align=\"left\">");
            self.body.push_str(&escape(key));
            self.body.push_str("</th><td>");
            self.body.push_str(&escape(value));
            self.body.push_str("</td></tr>\n");
        }
        self.body.push_str("</table>\n");
    }

    fn finish(self) -> String {
        format!("<html><body>\n{}</body></html>\n", self.body)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn identity_rows(identities: &[Identity]) -> Vec<Vec<String>> {
    identities
        .iter()
        .map(|identity| {
            vec![
                identity.pid.clone(),
                identity.display_name.clone(),
                identity.phone.clone().unwrap_or_default(),
                identity.card.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

fn identity_section(html: &mut HtmlBuilder, title: &str, identities: Option<&Vec<Identity>>) {
    let Some(identities) = identities else {
        return;
    };
    html.heading(title);
    html.table(
        &["User id", "Full name", "Phone", "Card"],
        &identity_rows(identities),
    );
    html.paragraph(&format!("{} user(s)", identities.len()));
}

fn failure_section(html: &mut HtmlBuilder, title: &str, failure: &SyncFailure) {
    html.heading(title);
    let mut rows = vec![
        (
            "Status code".to_string(),
            failure
                .status
                .map_or_else(|| "none".to_string(), |s| s.to_string()),
        ),
        ("Status text".to_string(), failure.description.clone()),
    ];
    for (name, value) in &failure.headers {
        rows.push((format!("Header: {name}"), value.clone()));
    }
    rows.push(("Content".to_string(), failure.body.clone()));
    html.key_value_table(&rows);
}

fn card_write_section(html: &mut HtmlBuilder, writes: &[CardWrite]) {
    if writes.is_empty() {
        return;
    }
    html.heading("Card updates");
    let rows = writes
        .iter()
        .map(|write| {
            vec![
                write.target.to_string(),
                write.key.clone(),
                write.card.clone(),
            ]
        })
        .collect::<Vec<_>>();
    html.table(&["Target", "Key", "Card"], &rows);
    html.paragraph(&format!("{} card value(s) written back", writes.len()));
}

fn configuration_section(html: &mut HtmlBuilder, report: &RunReport) {
    html.heading("Configuration");
    let policy = &report.policy;
    let fail_text = if report.fail_on_empty {
        "yes (an empty roster aborts the run before any remote call)"
    } else {
        "no (an empty roster is pushed; with removal enabled this deletes all users)"
    };
    let mut rows = vec![
        ("Group".to_string(), report.group.clone()),
        ("Fail on empty roster".to_string(), fail_text.to_string()),
        ("Host".to_string(), report.host.clone()),
        ("User name".to_string(), report.username.clone()),
        ("Mode".to_string(), policy.mode.to_string()),
        (
            "Adds new users".to_string(),
            yes_no(policy.mode.adds()),
        ),
        (
            "Removes absent users".to_string(),
            yes_no(policy.mode.removes()),
        ),
        (
            "Allows empty pid".to_string(),
            yes_no(policy.allow_empty_pid),
        ),
        (
            "Case-insensitive ids".to_string(),
            yes_no(policy.ignore_case),
        ),
        ("Max updates".to_string(), policy.max_level.to_string()),
        ("Roster size".to_string(), report.roster_size.to_string()),
    ];
    if let Some(zone) = &policy.zone_limit {
        rows.push(("Zone limit".to_string(), zone.clone()));
    }
    if let Some(regex) = &policy.ignore_regex {
        rows.push(("Ignore regex".to_string(), regex.clone()));
    }
    if !policy.ignore_list.is_empty() {
        rows.push(("Ignore list".to_string(), policy.ignore_list.join(", ")));
    }
    html.key_value_table(&rows);
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

/// Render a run report as a self-contained HTML mail body.
#[must_use]
pub fn render(report: &RunReport) -> String {
    let mut html = HtmlBuilder::new();

    if report.policy.mode.adds() || report.policy.mode.removes() {
        html.paragraph(&format!(
            "Synchronized {} user(s) to {}.",
            report.roster_size, report.host
        ));
    } else {
        html.paragraph(&format!(
            "Synchronization is DEACTIVATED (test mode). {} user(s) were evaluated against {} but nothing was changed.",
            report.roster_size, report.host
        ));
    }

    match &report.push {
        PushResult::Success(outcome) => {
            if outcome.is_no_change() {
                html.paragraph("No changes.");
            } else {
                identity_section(&mut html, "Added users", outcome.added.as_ref());
                identity_section(&mut html, "Updated users", outcome.updated.as_ref());
                identity_section(&mut html, "Deleted users", outcome.deleted.as_ref());
                identity_section(&mut html, "Ignored users", outcome.ignored.as_ref());
            }
        }
        PushResult::Failure(failure) => {
            failure_section(&mut html, "Communication error", failure);
        }
    }

    card_write_section(&mut html, &report.card_writes);
    if let Some(failure) = &report.card_query_failure {
        failure_section(&mut html, "Card query error", failure);
    }

    configuration_section(&mut html, report);
    html.finish()
}
