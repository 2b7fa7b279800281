//! Built-in exclusions applied before any repository or caller pattern.
//!
//! Covers version control, dependency directories, build output, caches,
//! OS/IDE artifacts, and binary or generated files. Directory entries carry a
//! trailing `/` so they only match path components, not same-named files.

/// Directories that are never analyzed.
pub const BUILTIN_DIRS: &[&str] = &[
    // Version control
    ".git/",
    ".svn/",
    ".hg/",
    ".bzr/",
    // Package managers
    "node_modules/",
    ".pnpm/",
    ".yarn/",
    ".npm/",
    "bower_components/",
    "jspm_packages/",
    "vendor/",
    ".bundle/",
    // Python
    "__pycache__/",
    ".venv/",
    "venv/",
    "virtualenv/",
    ".virtualenv/",
    "site-packages/",
    ".eggs/",
    "*.egg-info/",
    ".mypy_cache/",
    ".pytest_cache/",
    ".tox/",
    // JVM / .NET
    "target/",
    ".gradle/",
    ".m2/",
    "obj/",
    ".nuget/",
    // Build output
    "dist/",
    "build/",
    "out/",
    "_build/",
    ".build/",
    // Coverage
    "coverage/",
    ".nyc_output/",
    "htmlcov/",
    // Caches
    ".cache/",
    ".parcel-cache/",
    ".next/",
    ".nuxt/",
    ".turbo/",
    ".vercel/",
    ".serverless/",
    // IDE / editor
    ".idea/",
    ".vscode/",
    ".vs/",
    ".settings/",
    "*.xcodeproj/",
    "*.xcworkspace/",
    // Logs and temp
    "logs/",
    "tmp/",
    ".tmp/",
    // Insight's own state
    ".insight/",
];

/// Files that are never analyzed.
pub const BUILTIN_FILES: &[&str] = &[
    // OS artifacts
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // Compiled
    "*.pyc",
    "*.pyo",
    "*.class",
    "*.o",
    "*.obj",
    "*.exe",
    "*.dll",
    "*.so",
    "*.dylib",
    "*.a",
    // Archives
    "*.zip",
    "*.tar",
    "*.gz",
    "*.7z",
    "*.jar",
    // Media
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.ico",
    "*.webp",
    "*.bmp",
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.eot",
    "*.mp3",
    "*.mp4",
    "*.pdf",
    // Databases
    "*.db",
    "*.sqlite",
    "*.sqlite3",
    // Lock files
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "Gemfile.lock",
    "composer.lock",
    // Generated
    "*.map",
    "*.min.js",
    "*.min.css",
    "*.log",
    "*.swp",
];

/// All built-in patterns, directories first.
pub fn builtin_patterns() -> impl Iterator<Item = &'static str> {
    BUILTIN_DIRS.iter().chain(BUILTIN_FILES.iter()).copied()
}
