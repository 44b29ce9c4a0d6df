use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tera::{Context, Tera};

use crate::{report::REPORT_COLUMNS, Report, Result};

const TEMPLATE_NAME: &str = "report.html";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
  <style>{{ stylesheet | safe }}</style>
</head>
<body>
  <h1>{{ header }}</h1>
  <p class="generated">Generated {{ date }}</p>
  <table>
    <thead>
      <tr>{% for column in columns %}<th>{{ column }}</th>{% endfor %}</tr>
    </thead>
    <tbody>
    {% for row in rows %}
      <tr><td>{{ row.Bands }}</td><td>{{ row.Date }}</td><td>{{ row.Day }}</td><td>{{ row.Location }}</td><td>{{ row.Venue }}</td></tr>
    {% endfor %}
    </tbody>
  </table>
</body>
</html>
"#;

const DEFAULT_STYLESHEET: &str = "body { font-family: Georgia, serif; margin: 2em; }
h1 { font-size: 1.4em; }
.generated { color: #666; font-size: 0.8em; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #ccc; padding: 0.3em 0.6em; text-align: left; }
";

/// Per-batch values the renderer places around the table.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    /// File stem of the produced document.
    pub name: String,
    pub title: String,
    pub header: String,
    pub generated_at: DateTime<Local>,
}

impl RenderContext {
    pub fn new(name: impl Into<String>, title: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            header: header.into(),
            generated_at: Local::now(),
        }
    }
}

/// Header line describing the search area.
pub fn default_header(location: &str, radius_miles: f64) -> String {
    format!("Concerts around {location} ({radius_miles} miles)")
}

/// Output backend for assembled reports. Only invoked for non-empty reports.
pub trait Renderer: Send + Sync {
    /// Renders the report and returns the path of the written document.
    fn render(&self, report: &Report, context: &RenderContext) -> Result<PathBuf>;
}

/// Writes each report as a standalone HTML document.
#[derive(Debug)]
pub struct HtmlRenderer {
    tera: Tera,
    stylesheet: String,
    output_dir: PathBuf,
}

impl HtmlRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?;

        Ok(Self {
            tera,
            stylesheet: DEFAULT_STYLESHEET.to_string(),
            output_dir: output_dir.into(),
        })
    }

    /// Replaces the built-in template with the one stored at `path`.
    pub fn with_template(mut self, path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        self.tera.add_raw_template(TEMPLATE_NAME, &source)?;
        Ok(self)
    }

    pub fn with_stylesheet(mut self, path: &Path) -> Result<Self> {
        self.stylesheet = std::fs::read_to_string(path)?;
        Ok(self)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Renders the document body without touching the filesystem.
    pub fn render_to_string(&self, report: &Report, context: &RenderContext) -> Result<String> {
        let mut vars = Context::new();
        vars.insert("title", &context.title);
        vars.insert("header", &context.header);
        vars.insert(
            "date",
            &context.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        vars.insert("stylesheet", &self.stylesheet);
        vars.insert("columns", &REPORT_COLUMNS);
        vars.insert("rows", &report.rows);

        Ok(self.tera.render(TEMPLATE_NAME, &vars)?)
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, report: &Report, context: &RenderContext) -> Result<PathBuf> {
        let html = self.render_to_string(report, context)?;

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.html", context.name));
        std::fs::write(&path, html)?;

        tracing::info!(path = %path.display(), rows = report.len(), "wrote report");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportRow;

    fn report() -> Report {
        Report {
            rows: vec![ReportRow {
                bands: "Alpha, Beta".into(),
                date: "2024-05-01".into(),
                day: "Wednesday".into(),
                location: "Austin, TX".into(),
                venue: "Mohawk".into(),
            }],
        }
    }

    #[test]
    fn renders_rows_and_header() {
        let renderer = HtmlRenderer::new("unused").unwrap();
        let context = RenderContext::new("rock", "Concerts", default_header("Austin, TX", 500.0));
        let html = renderer.render_to_string(&report(), &context).unwrap();

        assert!(html.contains("<title>Concerts</title>"));
        assert!(html.contains("Concerts around Austin, TX (500 miles)"));
        assert!(html.contains("<td>Alpha, Beta</td>"));
        assert!(html.contains("<th>Location</th>"));
        assert!(html.contains("border-collapse"));
    }

    #[test]
    fn escapes_row_content() {
        let renderer = HtmlRenderer::new("unused").unwrap();
        let mut report = report();
        report.rows[0].bands = "<script>".into();
        let context = RenderContext::new("x", "Concerts", "header");
        let html = renderer.render_to_string(&report, &context).unwrap();
        assert!(!html.contains("<td><script></td>"));
    }

    #[test]
    fn writes_named_document_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("reports");
        let renderer = HtmlRenderer::new(&output).unwrap();
        let context = RenderContext::new("metal", "Concerts", "header");

        let path = renderer.render(&report(), &context).unwrap();
        assert_eq!(path, output.join("metal.html"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("Mohawk"));
    }

    #[test]
    fn custom_template_replaces_default() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("plain.html");
        std::fs::write(&template, "{{ header }}:{% for row in rows %}{{ row.Venue }};{% endfor %}").unwrap();

        let renderer = HtmlRenderer::new(dir.path()).unwrap().with_template(&template).unwrap();
        let context = RenderContext::new("x", "Concerts", "Shows");
        let html = renderer.render_to_string(&report(), &context).unwrap();
        assert_eq!(html, "Shows:Mohawk;");
    }
}
