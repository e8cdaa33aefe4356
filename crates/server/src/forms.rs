//! Form input for creating and editing pages.

use serde::Deserialize;
use txtpages_core::{NewPage, Page, PageEdit};

/// Fields posted by the create and edit forms.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageForm {
    pub title: String,
    pub content: String,
    /// Requested slug.
    pub url: String,
    #[serde(alias = "passcode")]
    pub editcode: String,
    pub desc: String,
    pub author: String,
}

impl PageForm {
    /// Copy of the form with every field trimmed.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            url: self.url.trim().to_string(),
            editcode: self.editcode.trim().to_string(),
            desc: self.desc.trim().to_string(),
            author: self.author.trim().to_string(),
        }
    }

    /// Prefill for the edit form. The secret is left blank.
    pub fn from_page(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            content: page.content.clone(),
            url: page.slug.clone(),
            editcode: String::new(),
            desc: page.description.clone(),
            author: page.author.clone(),
        }
    }

    /// Required fields left empty, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push("title");
        }
        if self.content.is_empty() {
            missing.push("content");
        }
        missing
    }

    pub fn to_new_page(&self) -> NewPage {
        NewPage {
            title: self.title.clone(),
            content: self.content.clone(),
            slug: Some(self.url.clone()),
            secret: Some(self.editcode.clone()),
            description: self.desc.clone(),
            author: self.author.clone(),
            ..NewPage::default()
        }
    }

    pub fn to_edit(&self) -> PageEdit {
        PageEdit {
            title: self.title.clone(),
            content: self.content.clone(),
            slug: Some(self.url.clone()),
            description: self.desc.clone(),
            author: self.author.clone(),
        }
    }
}

/// Why a submitted form was sent back to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormIssue {
    Missing(Vec<&'static str>),
    SlugExists,
    WrongSecret,
    Invalid(String),
}

impl FormIssue {
    pub fn message(&self) -> String {
        match self {
            Self::Missing(fields) => format!("Missing required fields: {}", fields.join(", ")),
            Self::SlugExists => "URL already exists, enter another one".to_string(),
            Self::WrongSecret => "Incorrect edit code, please re-enter".to_string(),
            Self::Invalid(message) => message.clone(),
        }
    }
}
