//! Page rendering
//!
//! Server-rendered HTML for the two screens of the app, using Tera.
//! Templates are compiled into the binary with rust-embed so the server
//! needs no files on disk.

use rust_embed::RustEmbed;
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

use crate::models::{GeneratedImage, ImageSize, DOWNLOAD_FILE_NAME};
use crate::services::MAX_PROMPT_CHARS;

mod error;

pub use error::PageError;

/// Page title shown in the browser tab and the header
pub const APP_TITLE: &str = "DALL-E Image Generator";

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

/// How a message box is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A message shown above the form
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Context for `login.html`
#[derive(Debug, Clone, Serialize)]
pub struct LoginPage {
    /// False when no password hash is configured; the form is hidden
    pub configured: bool,
    pub notice: Option<Notice>,
}

/// A generated image ready to embed in the page
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
    pub file_name: &'static str,
}

impl ImageView {
    /// Encode `image` as PNG and wrap it in a `data:` URI
    pub fn from_generated(image: &GeneratedImage) -> Result<Self, PageError> {
        Ok(Self {
            data_uri: image.to_data_uri()?,
            width: image.width(),
            height: image.height(),
            file_name: DOWNLOAD_FILE_NAME,
        })
    }
}

/// Context for `generator.html`
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorPage {
    /// False when no provider key is configured; the form is hidden
    pub configured: bool,
    /// Prompt as the user typed it, echoed back into the text area
    pub prompt: String,
    pub selected_size: &'static str,
    pub sizes: Vec<&'static str>,
    pub max_prompt_chars: usize,
    pub cooldown_seconds: u64,
    pub notice: Option<Notice>,
    pub image: Option<ImageView>,
}

impl GeneratorPage {
    pub fn new(configured: bool, cooldown_seconds: u64) -> Self {
        Self {
            configured,
            prompt: String::new(),
            selected_size: ImageSize::default().as_str(),
            sizes: ImageSize::ALL.iter().map(|s| s.as_str()).collect(),
            max_prompt_chars: MAX_PROMPT_CHARS,
            cooldown_seconds,
            notice: None,
            image: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>, size: ImageSize) -> Self {
        self.prompt = prompt.into();
        self.selected_size = size.as_str();
        self
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn with_image(mut self, image: ImageView) -> Self {
        self.image = Some(image);
        self
    }
}

/// Renders pages from the embedded templates
pub struct PageRenderer {
    tera: Tera,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tera.get_template_names().collect();
        f.debug_struct("PageRenderer").field("templates", &names).finish()
    }
}

impl PageRenderer {
    /// Load and compile every embedded template
    pub fn new() -> Result<Self, PageError> {
        let mut templates: Vec<(String, String)> = Vec::new();
        for name in Templates::iter() {
            let file = Templates::get(&name).ok_or_else(|| PageError::NotFound(name.to_string()))?;
            let content = String::from_utf8(file.data.into_owned())
                .map_err(|e| PageError::TemplateError(format!("{} is not UTF-8: {}", name, e)))?;
            templates.push((name.to_string(), content));
        }

        if templates.is_empty() {
            return Err(PageError::NotFound("templates/".to_string()));
        }

        let mut tera = Tera::default();
        // Adds everything before resolving `extends`, so order does not matter
        tera.add_raw_templates(templates)
            .map_err(|e| PageError::TemplateError(format!("Failed to load templates: {}", e)))?;

        tracing::debug!("Loaded {} page templates", tera.get_template_names().count());
        Ok(Self { tera })
    }

    pub fn render_login(&self, page: &LoginPage) -> Result<String, PageError> {
        self.render("login.html", page)
    }

    pub fn render_generator(&self, page: &GeneratorPage) -> Result<String, PageError> {
        self.render("generator.html", page)
    }

    fn render<T: Serialize>(&self, template: &str, page: &T) -> Result<String, PageError> {
        let mut context = TeraContext::from_serialize(page)
            .map_err(|e| PageError::TemplateError(e.to_string()))?;
        context.insert("title", APP_TITLE);

        self.tera.render(template, &context).map_err(|e| {
            // Tera puts the useful part in the source chain
            let mut message = e.to_string();
            let mut source = std::error::Error::source(&e);
            while let Some(inner) = source {
                message.push_str(": ");
                message.push_str(&inner.to_string());
                source = inner.source();
            }
            tracing::error!("Failed to render {}: {}", template, message);
            PageError::TemplateError(message)
        })
    }
}
