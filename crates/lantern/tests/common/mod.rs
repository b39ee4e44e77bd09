//! Fixture project built in a temp dir: settings, manifest, SQLite database,
//! log file and an app tree with migrations and commands.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use lantern::api::LanternHandler;
use lantern::build_state;
use lantern::host::HostContext;
use lanternconf::LanternConfig;
use rusqlite::Connection;
use serde_json::{Map, Value};
use tempfile::TempDir;
use wick::McpState;

pub const SETTINGS: &str = r#"{
    "DEBUG": true,
    "SECRET_KEY": "do-not-leak",
    "INSTALLED_APPS": ["django.contrib.auth", "blog"],
    "MIDDLEWARE": ["django.middleware.security.SecurityMiddleware"],
    "DATABASES": {
        "default": {"ENGINE": "django.db.backends.sqlite3", "NAME": "db.sqlite3", "PASSWORD": "pw"}
    },
    "ALLOWED_HOSTS": ["localhost", "example.com"]
}"#;

pub const MANIFEST: &str = r#"
[framework]
name = "Django"
version = "4.2.7"
runtime = "3.11.4"

[framework.commands]
auth = ["changepassword", "createsuperuser"]
core = ["migrate", "runserver"]

[[models]]
app = "auth"
name = "User"
table = "auth_user"
fields = [
    { name = "id", type = "AutoField" },
    { name = "username", type = "CharField", max_length = 150 },
]

[[models]]
app = "blog"
name = "Post"
fields = [
    { name = "id", type = "AutoField" },
    { name = "title", type = "CharField", max_length = 200 },
    { name = "published", type = "BooleanField" },
    { name = "author", type = "ForeignKey", related_model = "auth.User", null = true },
]

[[urls]]
pattern = "admin/"
name = "admin"
view = "django.contrib.admin.site.urls"

[[urls]]
pattern = "blog/"
namespace = "blog"
children = [
    { pattern = "", name = "index", view = "blog.views.index" },
    { pattern = "<int:pk>/", name = "detail", view = "blog.views.detail" },
]
"#;

pub const DATABASE: &str = r#"
CREATE TABLE auth_user (id INTEGER PRIMARY KEY, username VARCHAR(150) NOT NULL);
CREATE TABLE blog_post (
    id INTEGER PRIMARY KEY,
    title VARCHAR(200) NOT NULL,
    published BOOLEAN NOT NULL DEFAULT 0,
    author_id INTEGER REFERENCES auth_user(id)
);
CREATE INDEX blog_post_author_id ON blog_post (author_id);
CREATE TABLE django_migrations (id INTEGER PRIMARY KEY, app VARCHAR(255), name VARCHAR(255), applied DATETIME);
INSERT INTO django_migrations (app, name, applied) VALUES ('blog', '0001_initial', '2024-03-01 09:00:00');
INSERT INTO auth_user VALUES (1, 'ada'), (2, 'grace');
INSERT INTO blog_post VALUES (1, 'Hello', 1, 1), (2, 'Draft', 0, 1), (3, 'Compilers', 1, 2), (4, 'Orphan', 1, NULL);
"#;

/// 10 INFO and 3 ERROR entries; the ERRORs are `failure 1..3` in file order.
pub fn log_text() -> String {
    let mut text = String::new();
    let mut failures = 0;
    for i in 0..13 {
        if i % 4 == 1 {
            failures += 1;
            text.push_str(&format!("2024-03-01 10:00:{:02},000 ERROR failure {failures}\n", i));
            text.push_str("Traceback (most recent call last):\n  File \"views.py\", line 1\n");
        } else {
            text.push_str(&format!("2024-03-01 10:00:{:02},000 INFO request {i}\n", i));
        }
    }
    text
}

pub struct Fixture {
    pub dir: TempDir,
    pub config: LanternConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();

        write(root, "settings.json", SETTINGS);
        write(root, "lantern-manifest.toml", MANIFEST);
        write(root, "logs/app.log", &log_text());
        write(root, "blog/migrations/__init__.py", "");
        write(root, "blog/migrations/0001_initial.py", "");
        write(root, "blog/migrations/0002_post_published.py", "");
        write(root, "blog/management/commands/__init__.py", "");
        write(root, "blog/management/commands/publish.py", "");
        write(root, "blog/management/commands/migrate.py", "");

        let conn = Connection::open(root.join("db.sqlite3")).expect("create db");
        conn.execute_batch(DATABASE).expect("seed db");
        drop(conn);

        let mut config = LanternConfig::default();
        config.project.root = root.to_path_buf();
        config.project.manifest = Some("lantern-manifest.toml".into());
        config.settings.file = Some("settings.json".into());
        config.database.path = Some("db.sqlite3".into());
        config.logs.file = Some("logs/app.log".into());

        Self { dir, config }
    }

    pub fn host(&self) -> HostContext {
        HostContext::from_config(&self.config).expect("host context")
    }

    pub fn state(&self) -> Arc<McpState<LanternHandler>> {
        build_state(self.host()).expect("registry")
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, content).expect("write fixture file");
}

/// Build an argument map from a JSON object literal.
pub fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("arguments must be an object, got {other}"),
    }
}
