//! Presentation-layer interface
//!
//! Pages are rendered elsewhere from `props.json`; this module only produces
//! the `<head>` fragment (SEO tags and analytics) and resolves job-card icons.

use serde::{Deserialize, Serialize};

use crate::assembler::SeoMetadata;
use crate::config::AnalyticsConfig;
use crate::content::html_escape;

/// Kind of work shown on a home-page card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobCategory {
    Frontend,
    Backend,
    Jamstack,
    Mobile,
}

/// A "what I do" card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub title: String,
    pub category: JobCategory,
    pub description: String,
    #[serde(alias = "tech_stack")]
    pub tech_stack: Vec<String>,
}

/// Renders head fragments with the analytics id injected at construction
#[derive(Debug, Clone)]
pub struct Presentation {
    tracking_id: Option<String>,
}

impl Presentation {
    pub fn new(analytics: &AnalyticsConfig) -> Self {
        Self {
            tracking_id: analytics
                .tracking_id
                .clone()
                .filter(|id| !id.trim().is_empty()),
        }
    }

    /// Icon used for a job category
    pub fn job_icon(category: JobCategory) -> &'static str {
        match category {
            JobCategory::Frontend => "ri-computer-line",
            JobCategory::Backend => "fa-server",
            JobCategory::Jamstack => "im-stack",
            JobCategory::Mobile => "fa-mobile-alt",
        }
    }

    /// Job cards as an HTML fragment
    pub fn render_jobs(&self, jobs: &[Job]) -> String {
        let mut html = String::new();
        for job in jobs {
            html.push_str(&format!(
                r#"<article class="card" data-category="{}"><i class="icon {}"></i><h2>{}</h2><p>{}</p><ul>"#,
                category_tag(job.category),
                Self::job_icon(job.category),
                html_escape(&job.title),
                html_escape(&job.description),
            ));
            for tech in &job.tech_stack {
                html.push_str(&format!("<li>{}</li>", html_escape(tech)));
            }
            html.push_str("</ul></article>\n");
        }
        html
    }

    /// `<head>` tags for a page
    pub fn render_head(&self, seo: &SeoMetadata) -> String {
        let mut head = String::new();
        let mut meta = |attr: &str, key: &str, value: &str| {
            head.push_str(&format!(
                "<meta {}=\"{}\" content=\"{}\" />\n",
                attr,
                key,
                html_escape(value)
            ));
        };

        meta("name", "description", &seo.description);
        meta("property", "og:type", &seo.open_graph.kind);
        meta("property", "og:url", &seo.open_graph.url);
        meta("property", "og:title", &seo.open_graph.title);
        meta("property", "og:description", &seo.open_graph.description);
        meta("property", "og:locale", &seo.open_graph.locale);
        meta("property", "og:site_name", &seo.open_graph.site_name);
        for image in &seo.open_graph.images {
            meta("property", "og:image", &image.url);
            meta("property", "og:image:width", &image.width.to_string());
            meta("property", "og:image:height", &image.height.to_string());
            meta("property", "og:image:alt", &image.alt);
        }
        meta("name", "twitter:card", &seo.twitter.card_type);
        meta("name", "twitter:site", &seo.twitter.site);
        meta("name", "twitter:creator", &seo.twitter.handle);

        let mut out = format!("<title>{}</title>\n", html_escape(&seo.title));
        out.push_str(&format!(
            "<link rel=\"canonical\" href=\"{}\" />\n",
            html_escape(&seo.canonical)
        ));
        out.push_str(&head);
        if let Some(snippet) = self.analytics_snippet() {
            out.push_str(&snippet);
        }
        out
    }

    /// gtag.js loader and page-view config; `None` without a tracking id
    pub fn analytics_snippet(&self) -> Option<String> {
        let id = html_escape(self.tracking_id.as_deref()?);
        Some(format!(
            r#"<script async src="https://www.googletagmanager.com/gtag/js?id={id}"></script>
<script id="google-tag">
  window.dataLayer = window.dataLayer || [];
  function gtag(){{dataLayer.push(arguments);}}
  gtag('js', new Date());
  gtag('config', '{id}', {{ page_path: window.location.pathname }});
</script>
"#
        ))
    }
}

fn category_tag(category: JobCategory) -> &'static str {
    match category {
        JobCategory::Frontend => "frontend",
        JobCategory::Backend => "backend",
        JobCategory::Jamstack => "jamstack",
        JobCategory::Mobile => "mobile",
    }
}
