//! Path → (file type, risk, language, detectors) classification.

use serde::Serialize;

use super::file_type::{FileType, RiskTier};
use super::language_detect::Language;

/// Result of classifying one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub file_type: FileType,
    pub risk: RiskTier,
    pub language: Option<Language>,
    pub allowed_detectors: Vec<&'static str>,
}

impl Classification {
    pub fn is_analyzable(&self) -> bool {
        self.file_type.is_analyzable()
    }
}

/// Output of [`FileTypeClassifier::classify_batch`].
#[derive(Debug, Clone, Default)]
pub struct ClassifiedBatch {
    /// Analyzable files, in input order or risk-descending when requested.
    pub analyzable: Vec<(String, Classification)>,
    /// Files of a globally non-analyzable type.
    pub dropped: Vec<(String, FileType)>,
}

const BUILD_DIRS: &[&str] = &["dist", "build", "out", "target", ".next", ".nuxt", "obj"];
const BUILD_EXTS: &[&str] = &["map", "pyc", "pyo", "class", "o", "obj", "so", "dll", "exe", "wasm"];
const DIAGNOSTIC_EXTS: &[&str] = &["dmp", "heapsnapshot", "cpuprofile", "trace", "prof"];
const SECRET_EXTS: &[&str] = &["pem", "key", "p12", "pfx", "jks", "keystore", "crt", "cer"];
const INFRA_DIRS: &[&str] = &["terraform", "k8s", "kubernetes", "helm", "ansible", "deploy", "infra"];
const INFRA_EXTS: &[&str] = &["tf", "tfvars", "hcl"];
const MIGRATION_DIRS: &[&str] = &["migrations", "migration", "migrate"];
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "specs", "__mocks__"];
const SCHEMA_EXTS: &[&str] = &["graphql", "gql", "prisma", "proto", "avsc", "sql", "xsd"];
const CONFIG_EXTS: &[&str] = &[
    "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml", "properties", "lock",
];
const DOC_EXTS: &[&str] = &["md", "mdx", "rst", "txt", "adoc"];
const ASSET_EXTS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "bmp", "woff", "woff2", "ttf", "eot",
    "mp3", "mp4", "webm", "pdf", "zip", "gz", "css", "scss", "less",
];

/// Stateless classifier. Total: every path gets a classification, unknown
/// extensions fall back to generic source.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTypeClassifier;

impl FileTypeClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, path: &str) -> Classification {
        let lower = path.replace('\\', "/").to_ascii_lowercase();
        let (dirs, name) = match lower.rsplit_once('/') {
            Some((dir, name)) => (dir.split('/').collect::<Vec<_>>(), name.to_string()),
            None => (Vec::new(), lower.clone()),
        };
        let ext = extension(&name);
        let file_type = detect_file_type(&dirs, &name, ext);
        let language = Language::from_extension(ext);
        Classification {
            file_type,
            risk: file_type.risk(),
            language,
            allowed_detectors: file_type.detectors_for(language),
        }
    }

    /// Like [`classify`](Self::classify), restricting detectors to `requested`
    /// when given. The intersection may be empty.
    pub fn classify_with(&self, path: &str, requested: Option<&[String]>) -> Classification {
        let mut c = self.classify(path);
        if let Some(requested) = requested {
            c.allowed_detectors
                .retain(|d| requested.iter().any(|r| r == d));
        }
        c
    }

    /// Classify many paths, dropping non-analyzable ones. With `sort_by_risk`
    /// the analyzable set is ordered risk-descending; the sort is stable so
    /// equal tiers keep input order.
    pub fn classify_batch(
        &self,
        paths: &[String],
        requested: Option<&[String]>,
        sort_by_risk: bool,
    ) -> ClassifiedBatch {
        let mut batch = ClassifiedBatch::default();
        for path in paths {
            let c = self.classify_with(path, requested);
            if c.is_analyzable() {
                batch.analyzable.push((path.clone(), c));
            } else {
                batch.dropped.push((path.clone(), c.file_type));
            }
        }
        if sort_by_risk {
            batch.analyzable.sort_by(|a, b| b.1.risk.cmp(&a.1.risk));
        }
        batch
    }
}

fn extension(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some(ext),
        _ => None,
    }
}

fn in_dir(dirs: &[&str], set: &[&str]) -> bool {
    dirs.iter().any(|d| set.contains(d))
}

fn ext_in(ext: Option<&str>, set: &[&str]) -> bool {
    ext.is_some_and(|e| set.contains(&e))
}

/// Rules are checked in order; the first hit decides.
fn detect_file_type(dirs: &[&str], name: &str, ext: Option<&str>) -> FileType {
    if in_dir(dirs, BUILD_DIRS) || ext_in(ext, BUILD_EXTS) || name.contains(".min.") {
        return FileType::BuildArtifact;
    }
    if in_dir(dirs, &["coverage", ".nyc_output", "htmlcov"]) || name == "lcov.info" {
        return FileType::Coverage;
    }
    if ext == Some("log") || in_dir(dirs, &["logs"]) {
        return FileType::Log;
    }
    if ext_in(ext, DIAGNOSTIC_EXTS) || name.starts_with("hs_err_pid") {
        return FileType::Diagnostic;
    }
    if in_dir(dirs, &["reports", "report"]) || name.contains("-report.") || name.starts_with("report.") {
        return FileType::Report;
    }
    if name == ".env" || name.starts_with(".env.") || name.ends_with(".env") {
        return FileType::Env;
    }
    if ext_in(ext, SECRET_EXTS)
        || name.starts_with("id_rsa")
        || name.starts_with("id_ed25519")
        || (Language::from_extension(ext).is_none()
            && (name.contains("secret") || name.contains("credentials")))
    {
        return FileType::Secret;
    }
    if name == "dockerfile"
        || name.starts_with("docker-compose")
        || ext_in(ext, INFRA_EXTS)
        || in_dir(dirs, INFRA_DIRS)
        || dirs.windows(2).any(|w| w == [".github", "workflows"])
    {
        return FileType::Infrastructure;
    }
    if in_dir(dirs, MIGRATION_DIRS) {
        return FileType::Migration;
    }
    if in_dir(dirs, TEST_DIRS) || is_test_name(name) {
        return FileType::Test;
    }
    if ext_in(ext, SCHEMA_EXTS) || name.ends_with(".schema.json") {
        return FileType::Schema;
    }
    if ext_in(ext, CONFIG_EXTS) || (name.starts_with('.') && name.ends_with("rc")) {
        return FileType::Config;
    }
    if ext_in(ext, DOC_EXTS) || in_dir(dirs, &["docs", "doc"]) || name == "license" {
        return FileType::Documentation;
    }
    if ext_in(ext, ASSET_EXTS) {
        return FileType::Asset;
    }
    FileType::Source
}

fn is_test_name(name: &str) -> bool {
    name.contains(".test.")
        || name.contains(".spec.")
        || (name.starts_with("test_") && name.ends_with(".py"))
        || name.ends_with("_test.py")
        || name.ends_with("_test.go")
        || name.ends_with("_test.rs")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(path: &str) -> FileType {
        FileTypeClassifier::new().classify(path).file_type
    }

    #[test]
    fn classifies_common_paths() {
        assert_eq!(ty("src/app.ts"), FileType::Source);
        assert_eq!(ty("src/app.test.ts"), FileType::Test);
        assert_eq!(ty("tests/test_api.py"), FileType::Test);
        assert_eq!(ty("config/.env.production"), FileType::Env);
        assert_eq!(ty("certs/server.pem"), FileType::Secret);
        assert_eq!(ty("Dockerfile"), FileType::Infrastructure);
        assert_eq!(ty(".github/workflows/ci.yml"), FileType::Infrastructure);
        assert_eq!(ty("db/migrations/001_init.sql"), FileType::Migration);
        assert_eq!(ty("api/schema.graphql"), FileType::Schema);
        assert_eq!(ty("package.json"), FileType::Config);
        assert_eq!(ty("README.md"), FileType::Documentation);
        assert_eq!(ty("public/logo.png"), FileType::Asset);
        assert_eq!(ty("dist/bundle.js"), FileType::BuildArtifact);
        assert_eq!(ty("coverage/lcov.info"), FileType::Coverage);
        assert_eq!(ty("server.log"), FileType::Log);
    }

    #[test]
    fn unknown_extension_is_source() {
        let c = FileTypeClassifier::new().classify("weird/file.zzz");
        assert_eq!(c.file_type, FileType::Source);
        assert_eq!(c.risk, RiskTier::Medium);
        assert!(c.language.is_none());
        assert!(c.allowed_detectors.contains(&"security"));
    }

    #[test]
    fn secret_names_only_mark_non_source_files() {
        assert_eq!(ty("config/secrets.yaml"), FileType::Secret);
        assert_eq!(ty("aws/credentials"), FileType::Secret);

        let c = FileTypeClassifier::new().classify("src/secretsManager.ts");
        assert_eq!(c.file_type, FileType::Source);
        assert!(c.allowed_detectors.contains(&"typescript"));
        assert!(c.allowed_detectors.contains(&"eslint"));
        assert_eq!(ty("app/credentials_store.py"), FileType::Source);
    }

    #[test]
    fn windows_separators_are_accepted() {
        assert_eq!(ty("db\\migrations\\002.sql"), FileType::Migration);
    }

    #[test]
    fn no_extension_for_dotfile_stem() {
        assert_eq!(extension(".env"), None);
        assert_eq!(extension("a.rs"), Some("rs"));
    }
}
