//! HTML rendering for result pages and error pages.
//!
//! The page is three parts: a fixed header (document head, title line with
//! the keywords, feedback contact link), one fragment per ranked result, and
//! a fixed footer whose script sends the reader's rating back as a
//! `?feedback=''&value=<rating>,<sessionId>,<rank>` request.

use crate::config::ContactConfig;
use crate::error::RenderError;
use crate::models::RankedResult;

/// Fills one ranked result into the page layout.
pub trait Renderer: Send + Sync {
    fn render(&self, result: &RankedResult) -> Result<String, RenderError>;
}

/// Escapes text for use in HTML element content and quoted attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <script src="https://cdn.rawgit.com/google/code-prettify/master/loader/run_prettify.js?lang=python&amp;skin=sunburst"></script>
    <meta charset="utf-8">
    <meta http-equiv="X-UA-Compatible" content="IE=edge,chrome=1">
    <title>From the Forum Archives</title>
    <meta content='Forum Questions and Answers' name='description' />
    <meta content='width=device-width, initial-scale=1' name='viewport' />
    <link rel="stylesheet" href="/css/forumArchiveStyle.css" />
  </head>
  <body>
"#;

const PAGE_FOOTER: &str = r#"
    <script type="text/javascript">
      var feedbackForms = document.getElementsByClassName('line-item-feedback');
      for (var i = 0; i < feedbackForms.length; i++) {
          feedbackForms[i].onclick = function(event) {
              var params = "?feedback=''&value=" + encodeURIComponent(event.target.value);
              if (typeof event.target.value != 'undefined') {
                  fetch(window.location.protocol + '//' + window.location.host + window.location.pathname + params);
              }
          }
      }
    </script>
  </body>
</html>
"#;

const RATINGS: [(&str, &str); 3] = [
    ("Not", "Not helpful"),
    ("Partial", "Partially helpful"),
    ("Complete", "Answered my question"),
];

/// The built-in HTML layout.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    contact: ContactConfig,
}

impl HtmlRenderer {
    pub fn new(contact: ContactConfig) -> Self {
        Self { contact }
    }

    /// Document head plus the title line naming the keywords.
    pub fn header(&self, keywords: &[String]) -> String {
        let mut out = String::from(PAGE_HEAD);
        out.push_str(&format!(
            "    <div class=\"title\">Keyword(s): {}\n",
            html_escape(&keywords.join(","))
        ));
        out.push_str(&format!(
            "      <div class=\"feedback_email\"><a href=\"{}\">Feedback to {}</a></div>\n",
            html_escape(&self.mailto("Forum Archive Feedback", None)),
            html_escape(&self.contact.name)
        ));
        out.push_str("    </div>\n");
        out
    }

    pub fn footer(&self) -> &'static str {
        PAGE_FOOTER
    }

    /// Complete error document: a short message and a pre-addressed link for
    /// reporting it.
    pub fn error_page(&self, message: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>Forum Archive Error</title></head>
  <body>
    <p>Sadly, an error occurred at the server: {}</p>
    <p>Please <a href="{}">click this link to send email to {}</a> for debugging. Thanks!</p>
  </body>
</html>
"#,
            html_escape(message),
            html_escape(&self.mailto("Forum Server Error", Some(message))),
            html_escape(&self.contact.name)
        )
    }

    fn mailto(&self, subject: &str, body: Option<&str>) -> String {
        let mut link = format!(
            "mailto:{}?subject={}",
            urlencoding::encode(&self.contact.email),
            urlencoding::encode(subject)
        );
        if let Some(cc) = &self.contact.cc {
            link.push_str(&format!("&cc={}", urlencoding::encode(cc)));
        }
        if let Some(body) = body {
            link.push_str(&format!("&body={}", urlencoding::encode(body)));
        }
        link
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, result: &RankedResult) -> Result<String, RenderError> {
        let session = html_escape(&result.session_id);
        let uid = html_escape(&result.user_id);
        let rank = result.rank;

        let mut out = String::new();
        out.push_str(&format!("    <div class=\"line-item\" id=\"result-{}\">\n", rank));
        out.push_str(&format!(
            "      <div class=\"question\"><pre class=\"prettyprint\">{}</pre></div>\n",
            html_escape(&result.answer.question)
        ));
        out.push_str(&format!(
            "      <div class=\"answer\"><pre class=\"prettyprint\">{}</pre></div>\n",
            html_escape(&result.answer.answer)
        ));
        out.push_str("      <form class=\"line-item-feedback\">\n");
        out.push_str(&format!(
            "        <input type=\"hidden\" name=\"session_id\" value=\"{}\">\n",
            session
        ));
        out.push_str(&format!(
            "        <input type=\"hidden\" name=\"rank\" value=\"{}\">\n",
            rank
        ));
        out.push_str(&format!(
            "        <input type=\"hidden\" name=\"uid\" value=\"{}\">\n",
            uid
        ));
        for (rating, label) in RATINGS {
            out.push_str(&format!(
                "        <label><input type=\"radio\" name=\"rating-{rank}\" value=\"{rating},{session},{rank}\"> {label}</label>\n"
            ));
        }
        out.push_str("      </form>\n    </div>\n");
        Ok(out)
    }
}
