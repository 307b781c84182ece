//! Prompt construction.
//!
//! Three deterministic templates drive the whole shop:
//!
//! - **mutation**: current state + schema + instruction, answered with the full
//!   replacement state document (structured output)
//! - **fragment template**: schema + request params + layout, answered with a
//!   reusable Mustache page template
//! - **page**: state + schema + request params + fragment template, answered with
//!   the final HTML

pub mod commands;
pub mod params;
pub mod views;

use std::sync::LazyLock;

use regex::Regex;

pub use commands::Command;
pub use params::{METHOD_OVERRIDE_FIELD, RequestParams};
pub use views::{LAYOUT_PAGE, View};

/// Characters of a prompt kept in log previews.
pub const PREVIEW_LEN: usize = 137;

/// Opening fence line, e.g. "```html".
static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```.+").expect("Invalid regex"));

/// Closing fence at a line end.
static FENCE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)```$").expect("Invalid regex"));

/// Builds prompts against a fixed schema and page layout.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    schema: &'a str,
    layout: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// `schema` is the raw JSON schema text; `layout` the page layout HTML.
    #[must_use]
    pub const fn new(schema: &'a str, layout: &'a str) -> Self {
        Self { schema, layout }
    }

    /// Ask for the complete replacement state after applying `instruction`.
    #[must_use]
    pub fn mutation(&self, state_json: &str, instruction: &str) -> String {
        format!(
            "You are an ecommerce shopping system.\n\
             Read your initial state from this JSON data file:\n\
             {state_json}\n\
             Use this JSON schema for these data:\n\
             {schema}\n\
             I will give you an instruction and you give me the new contents of the JSON file without any further descriptions.\n\
             Instruction: \"{instruction}\"\n",
            schema = self.schema,
        )
    }

    /// Ask for a reusable Mustache template for one page.
    #[must_use]
    pub fn fragment_template(&self, params: &RequestParams, instructions: &str) -> String {
        format!(
            "You are the generator for Mustache web page templates of an ecommerce shopping system.\n\
             Use this JSON schema for the data that should be displayed with these templates:\n\
             {schema}\n\
             You are given these additional parameters:\n\
             {params}\n\
             When generating Mustache HTML templates you use a bootstrap design.\n\
             You add left an right margin around the page body.\n\
             You use this HTML page layout template and embed the page HTML into it:\n\
             {layout}\n\
             You put a page navigation header at the top of the page. The page title is \"MyShop\".\n\
             All tables should be bordered and have striped, hoverable rows.\n\
             All icons should be FontAwesome icons.\n\
             When generating HTML forms, you use the information in the JSON schema.\n\
             Create an Mustache HTML template output following the following specifications and only output the content of\n\
             the generated HTML template file without any further explanations:\n\
             {instructions}\n",
            schema = self.schema,
            layout = self.layout,
        )
    }

    /// Ask for the final HTML of a page, filled from the current state.
    #[must_use]
    pub fn page(
        &self,
        state_json: &str,
        params: &RequestParams,
        template: &str,
        instructions: &str,
    ) -> String {
        format!(
            "You are the generator for web pages of an ecommerce shopping system.\n\
             Read your initial state from this JSON data file:\n\
             {state_json}\n\
             Use this JSON schema for these data:\n\
             {schema}\n\
             You are given these additional parameters:\n\
             {params}\n\
             You use the JSON data to fill these HTML Mustache template to render the HTML page,\n\
             replacing all Mustache elements with the JSON data:\n\
             {template}\n\
             Calculate all Mustache formulas yourself.\n\
             When generating HTML content you use a bootstrap design.\n\
             All tables should be bordered and have striped, hoverable rows.\n\
             All icons should be FontAwesome icons.\n\
             When generating HTML forms, you use the information in the JSON schema.\n\
             Reuse all of the HTML from the HTML template.\n\
             Create an HTML output following the following specifications and only output the content of\n\
             the generated HTML file without any further explanations:\n\
             {instructions}\n",
            schema = self.schema,
        )
    }
}

/// Remove markdown code fences the model wraps around HTML.
///
/// Opening fence lines ("```html") are blanked and closing fences at a line
/// end are removed. Everything else is returned untouched.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    let opened = FENCE_OPEN_RE.replace_all(text, "");
    FENCE_CLOSE_RE.replace_all(&opened, "").into_owned()
}

/// Single-line prompt preview for logs.
#[must_use]
pub fn preview(prompt: &str) -> String {
    let flat: String = prompt
        .chars()
        .take(PREVIEW_LEN)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    format!("{flat}...")
}
