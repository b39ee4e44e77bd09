//! Project manifest: framework identity, model definitions and the URL tree.
//!
//! ```toml
//! [framework]
//! name = "Django"
//! version = "4.2.7"
//! runtime = "3.11.4"
//!
//! [framework.commands]
//! auth = ["createsuperuser", "changepassword"]
//!
//! [[models]]
//! app = "blog"
//! name = "Post"
//! fields = [
//!     { name = "id", type = "AutoField" },
//!     { name = "author", type = "ForeignKey", related_model = "auth.User" },
//! ]
//!
//! [[urls]]
//! pattern = "blog/"
//! namespace = "blog"
//! children = [{ pattern = "<int:pk>/", name = "detail", view = "blog.views.detail" }]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use wick::AdapterError;

use super::{HostError, ModelCatalog, RouteTable};
use crate::types::{FieldInfo, ModelInfo, UrlInfo};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrameworkInfo {
    pub name: String,
    pub version: String,
    pub runtime: String,
    /// Built-in management commands keyed by the app that provides them.
    pub commands: BTreeMap<String, Vec<String>>,
}

impl Default for FrameworkInfo {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            version: "unknown".to_string(),
            runtime: "unknown".to_string(),
            commands: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub null: bool,
    #[serde(default)]
    pub related_model: Option<String>,
    /// Database column, when it differs from the default.
    #[serde(default)]
    pub column: Option<String>,
}

impl FieldDef {
    pub fn is_relation(&self) -> bool {
        self.related_model.is_some()
    }

    /// Relations are stored in `<name>_id` unless a column is given.
    pub fn column_name(&self) -> String {
        match &self.column {
            Some(column) => column.clone(),
            None if self.is_relation() => format!("{}_id", self.name),
            None => self.name.clone(),
        }
    }

    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name.clone(),
            field_type: self.field_type.clone(),
            max_length: self.max_length,
            nullable: self.null,
            is_relation: self.is_relation(),
            related_model: self.related_model.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDef {
    pub app: String,
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.app, self.name.to_lowercase()))
    }

    /// Find a field by its name or its column.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.column_name() == name)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            app: self.app.clone(),
            name: self.name.clone(),
            table_name: self.table_name(),
            fields: self.fields.iter().map(FieldDef::info).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlDef {
    pub pattern: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    /// Present for includes.
    #[serde(default)]
    pub children: Vec<UrlDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub framework: FrameworkInfo,
    pub models: Vec<ModelDef>,
    pub urls: Vec<UrlDef>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let content = std::fs::read_to_string(path).map_err(|source| HostError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|message| HostError::Manifest {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let manifest: Manifest = toml::from_str(content).map_err(|e| e.to_string())?;

        let mut seen = std::collections::HashSet::new();
        for model in &manifest.models {
            if !seen.insert((model.app.as_str(), model.name.as_str())) {
                return Err(format!("model {}.{} is declared twice", model.app, model.name));
            }
        }

        Ok(manifest)
    }

    /// Flatten the URL tree depth-first in declaration order.
    pub fn flatten_urls(&self) -> Vec<UrlInfo> {
        let mut out = Vec::new();
        for url in &self.urls {
            flatten(url, "", &[], None, &mut out);
        }
        out
    }
}

fn flatten(
    url: &UrlDef,
    prefix: &str,
    namespaces: &[String],
    included_from: Option<&str>,
    out: &mut Vec<UrlInfo>,
) {
    let pattern = format!("{prefix}{}", url.pattern);

    if url.children.is_empty() {
        let name = url.name.as_ref().map(|name| {
            if namespaces.is_empty() {
                name.clone()
            } else {
                format!("{}:{}", namespaces.join(":"), name)
            }
        });
        out.push(UrlInfo {
            name,
            pattern,
            view_handler: url.view.clone(),
            included_from: included_from.map(str::to_string),
        });
        return;
    }

    let mut nested = namespaces.to_vec();
    if let Some(ns) = &url.namespace {
        nested.push(ns.clone());
    }
    for child in &url.children {
        flatten(child, &pattern, &nested, Some(&pattern), out);
    }
}

impl ModelCatalog for Manifest {
    fn models(&self) -> Result<&[ModelDef], AdapterError> {
        Ok(&self.models)
    }
}

impl RouteTable for Manifest {
    fn routes(&self) -> Result<Vec<UrlInfo>, AdapterError> {
        Ok(self.flatten_urls())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[framework]
name = "Django"
version = "4.2.7"

[[models]]
app = "blog"
name = "Post"
fields = [
    { name = "id", type = "AutoField" },
    { name = "title", type = "CharField", max_length = 200 },
    { name = "author", type = "ForeignKey", related_model = "auth.User", null = true },
]

[[models]]
app = "auth"
name = "User"
table = "auth_user"

[[urls]]
pattern = ""
name = "home"
view = "core.views.home"

[[urls]]
pattern = "blog/"
namespace = "blog"
children = [
    { pattern = "", name = "index", view = "blog.views.index" },
    { pattern = "api/", namespace = "api", children = [
        { pattern = "posts/", name = "posts", view = "blog.api.posts" },
    ] },
]
"#;

    #[test]
    fn test_framework_defaults_to_unknown() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.framework.name, "Django");
        assert_eq!(manifest.framework.runtime, "unknown");
    }

    #[test]
    fn test_model_table_and_relation_column() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let post = &manifest.models[0];
        assert_eq!(post.table_name(), "blog_post");
        assert_eq!(manifest.models[1].table_name(), "auth_user");

        let author = post.field("author").unwrap();
        assert_eq!(author.column_name(), "author_id");
        assert!(author.info().is_relation);
        assert!(author.info().nullable);
        assert_eq!(post.field("author_id").unwrap().name, "author");
        assert!(post.field("missing").is_none());
    }

    #[test]
    fn test_flatten_urls() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let urls = manifest.flatten_urls();

        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0].name.as_deref(), Some("home"));
        assert_eq!(urls[0].included_from, None);

        assert_eq!(urls[1].pattern, "blog/");
        assert_eq!(urls[1].name.as_deref(), Some("blog:index"));
        assert_eq!(urls[1].included_from.as_deref(), Some("blog/"));

        assert_eq!(urls[2].pattern, "blog/api/posts/");
        assert_eq!(urls[2].name.as_deref(), Some("blog:api:posts"));
        assert_eq!(urls[2].view_handler.as_deref(), Some("blog.api.posts"));
        assert_eq!(urls[2].included_from.as_deref(), Some("blog/api/"));
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let err = Manifest::parse(
            r#"
[[models]]
app = "a"
name = "M"
[[models]]
app = "a"
name = "M"
"#,
        )
        .unwrap_err();
        assert!(err.contains("a.M"));
    }
}
