//! Heuristic ordering of repository paths by how much they reveal about the architecture.

use std::cmp::Reverse;

/// Manifests, build and container definitions, top-level docs. Matched on the basename.
const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "requirements.txt",
    "pyproject.toml",
    "Gemfile",
    "composer.json",
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "README.md",
    "README.txt",
    "tsconfig.json",
    "jsconfig.json",
    "next.config.js",
    "next.config.mjs",
    "vite.config.ts",
    "webpack.config.js",
];

/// Conventional application entry points. Matched on the path suffix.
const ENTRY_POINTS: &[&str] = &[
    "src/index.ts",
    "src/main.ts",
    "src/App.tsx",
    "src/app/page.tsx",
    "main.go",
    "cmd/main.go",
    "src/main.rs",
    "src/lib.rs",
    "app.py",
    "main.py",
    "index.html",
];

/// Secondary configuration. Matched on the basename.
const SECONDARY_CONFIG: &[&str] = &[
    ".env.example",
    ".gitignore",
    "tailwind.config.ts",
    "postcss.config.js",
];

const SOURCE_ROOTS: &[&str] = &["src/", "app/", "lib/"];
const TEST_MARKERS: &[&str] = &["test", "spec"];

pub const MANIFEST_SCORE: i32 = 100;
pub const ENTRY_POINT_SCORE: i32 = 80;
pub const SECONDARY_CONFIG_SCORE: i32 = 50;
pub const SOURCE_ROOT_SCORE: i32 = 20;
pub const TEST_SCORE: i32 = -10;

/// First matching rule wins; paths matching nothing score zero.
pub fn score(path: &str) -> i32 {
    let basename = path.rsplit('/').next().unwrap_or(path);

    if MANIFEST_FILES.contains(&basename) {
        MANIFEST_SCORE
    } else if ENTRY_POINTS.iter().any(|entry| ends_with_segments(path, entry)) {
        ENTRY_POINT_SCORE
    } else if SECONDARY_CONFIG.contains(&basename) {
        SECONDARY_CONFIG_SCORE
    } else if SOURCE_ROOTS.iter().any(|root| path.starts_with(root)) {
        SOURCE_ROOT_SCORE
    } else if TEST_MARKERS.iter().any(|marker| path.contains(marker)) {
        TEST_SCORE
    } else {
        0
    }
}

/// Suffix match that only counts at a `/` boundary, so `pkg/domain.go` is not `main.go`.
fn ends_with_segments(path: &str, suffix: &str) -> bool {
    path.strip_suffix(suffix)
        .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('/'))
}

/// Every input path, highest score first. Equal scores keep their input order.
pub fn rank(paths: &[String]) -> Vec<String> {
    let mut scored: Vec<(i32, &String)> = paths.iter().map(|p| (score(p), p)).collect();
    scored.sort_by_key(|(score, _)| Reverse(*score));
    scored.into_iter().map(|(_, path)| path.clone()).collect()
}

/// The ranked prefix handed to the oracle.
pub fn top_ranked(paths: &[String], limit: usize) -> Vec<String> {
    let mut ranked = rank(paths);
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn manifests_outrank_everything() {
        let ranked = rank(&paths(&["src/utils/helper.ts", "docs/guide.md", "package.json"]));
        assert_eq!(ranked.first().map(String::as_str), Some("package.json"));
    }

    #[test]
    fn tiers_apply_in_order() {
        assert_eq!(score("web/package.json"), MANIFEST_SCORE);
        assert_eq!(score("src/main.rs"), ENTRY_POINT_SCORE);
        assert_eq!(score("services/api/cmd/main.go"), ENTRY_POINT_SCORE);
        assert_eq!(score(".gitignore"), SECONDARY_CONFIG_SCORE);
        assert_eq!(score("lib/parser.rb"), SOURCE_ROOT_SCORE);
        assert_eq!(score("tests/helper.test.ts"), TEST_SCORE);
        assert_eq!(score("docs/guide.md"), 0);
        assert_eq!(score("pkg/domain.go"), 0);
        assert_eq!(score("webapp.py"), 0);
        assert_eq!(score("src/xmain.rs"), SOURCE_ROOT_SCORE);
    }

    #[test]
    fn entry_points_match_whole_path_segments() {
        assert_eq!(score("main.go"), ENTRY_POINT_SCORE);
        assert_eq!(score("backend/app.py"), ENTRY_POINT_SCORE);

        let ranked = rank(&paths(&["pkg/domain.go", "src/handler.rs"]));
        assert_eq!(ranked, ["src/handler.rs", "pkg/domain.go"]);
    }

    #[test]
    fn tests_rank_below_source_files() {
        let ranked = rank(&paths(&["tests/helper.test.ts", "src/utils/helper.ts"]));
        assert_eq!(ranked, ["src/utils/helper.ts", "tests/helper.test.ts"]);
    }

    #[test]
    fn ranking_is_a_stable_permutation() {
        let input = paths(&[
            "docs/a.md",
            "docs/b.md",
            "Dockerfile",
            "docs/c.md",
            "spec/x_spec.rb",
            "README.md",
        ]);
        let ranked = rank(&input);

        assert_eq!(ranked.len(), input.len());
        assert_eq!(
            ranked,
            [
                "Dockerfile",
                "README.md",
                "docs/a.md",
                "docs/b.md",
                "docs/c.md",
                "spec/x_spec.rb"
            ]
        );
        assert_eq!(rank(&input), ranked);
    }

    #[test]
    fn top_ranked_truncates_after_sorting() {
        let mut input: Vec<String> = (0..150).map(|i| format!("docs/page{i}.md")).collect();
        input.push("go.mod".into());

        let top = top_ranked(&input, 100);
        assert_eq!(top.len(), 100);
        assert_eq!(top.first().map(String::as_str), Some("go.mod"));

        assert!(top_ranked(&[], 100).is_empty());
    }
}
