use marker_shuffle::builders::hooks::{HookContext, IntegrationHost, LifecycleHook};
use marker_shuffle::builders::reporter::{FileOutcome, export_report};
use marker_shuffle::core::config::{ConfigManager, ConfigProvider, MarkerShuffleConfig};
use marker_shuffle::core::engine::transform_directory;
use marker_shuffle::core::sink::MemorySink;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const COMPONENT: &str = r#"---
import Card from "./Card.astro";
---
<!-- SHUFFLE_DL_CHILDREN -->
<dl>
  <div><dt>Rust</dt><dd>systems</dd></div>
  <div><dt>Astro</dt><dd>sites</dd></div>
  <div><dt>TOML</dt><dd>config</dd></div>
  <div><dt>YAML</dt><dd>also config</dd></div>
</dl>
<script>console.log("<dl><div>not me</div></dl>");</script>
"#;

fn setup_project() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let components = root.join("src/components");
    fs::create_dir_all(&components).unwrap();
    fs::write(components.join("Stack.astro"), COMPONENT).unwrap();
    fs::write(components.join("Plain.astro"), "<p>static</p>\n").unwrap();
    (dir, root)
}

fn terms(content: &str) -> Vec<&str> {
    content
        .match_indices("<dt>")
        .map(|(i, _)| {
            let rest = &content[i + 4..];
            &rest[..rest.find("</dt>").unwrap()]
        })
        .collect()
}

#[test]
fn test_core_workflow() {
    let (_td, root) = setup_project();

    // 1. Setup Config
    let config_manager = ConfigManager::new_at(root.clone());
    assert!(config_manager.initialize().unwrap());
    let mut config = config_manager.load_config().unwrap();
    config.transform.seed = Some(2024);
    config_manager.save_config(&config).unwrap();

    // 2. Run one pass
    let sink = MemorySink::new();
    let report = transform_directory(&config.transform, config_manager.project_root(), &sink);

    // 3. Only the marked file changed
    assert_eq!(report.files.len(), 2);
    assert_eq!(
        report.outcome_of("src/components/Stack.astro"),
        Some(&FileOutcome::Shuffled {
            children: 4,
            written: true
        })
    );
    assert_eq!(
        report.outcome_of("src/components/Plain.astro"),
        Some(&FileOutcome::SkippedNoMarker)
    );
    assert_eq!(
        fs::read_to_string(root.join("src/components/Plain.astro")).unwrap(),
        "<p>static</p>\n"
    );

    // 4. The children are a permutation and the surroundings are untouched
    let after = fs::read_to_string(root.join("src/components/Stack.astro")).unwrap();
    let mut shuffled = terms(&after);
    shuffled.sort_unstable();
    assert_eq!(shuffled, vec!["Astro", "Rust", "TOML", "YAML"]);

    let head = &COMPONENT[..COMPONENT.find("<dl>").unwrap() + 4];
    let tail = &COMPONENT[COMPONENT.find("</dl>\n<script>").unwrap()..];
    assert!(after.starts_with(head));
    assert!(after.ends_with(tail));

    // 5. The marker survives, so the next build shuffles again
    let report = transform_directory(&config.transform, config_manager.project_root(), &MemorySink::new());
    assert_eq!(report.shuffled(), 1);
    assert_eq!(report.failed(), 0);
}

#[test]
fn test_dry_run_reports_without_writing() {
    let (_td, root) = setup_project();
    let mut config = MarkerShuffleConfig::default();
    config.transform.dry_run = true;

    let sink = MemorySink::new();
    let report = transform_directory(&config.transform, &root, &sink);

    assert_eq!(
        report.outcome_of("src/components/Stack.astro"),
        Some(&FileOutcome::Shuffled {
            children: 4,
            written: false
        })
    );
    assert_eq!(
        fs::read_to_string(root.join("src/components/Stack.astro")).unwrap(),
        COMPONENT
    );
}

#[test]
fn test_report_export() {
    let (_td, root) = setup_project();
    let config = MarkerShuffleConfig::default();
    let report = transform_directory(&config.transform, &root, &MemorySink::new());

    let json_path = root.join("report.json");
    export_report(&report, &json_path, "json").unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    let statuses: Vec<&str> = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["outcome"]["status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"shuffled"));
    assert!(statuses.contains(&"skipped-no-marker"));

    let yaml_path = root.join("report.yaml");
    export_report(&report, &yaml_path, "yaml").unwrap();
    assert!(fs::read_to_string(&yaml_path).unwrap().contains("skipped-no-marker"));
}

#[test]
fn test_hook_host_with_missing_components_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = MarkerShuffleConfig::default();
    let sink = MemorySink::new();

    let mut host = IntegrationHost::from_config(&config, &sink);
    host.dispatch(
        LifecycleHook::BuildSetup,
        &HookContext::new(dir.path().to_path_buf()),
    );

    assert!(sink.contains(log::Level::Info, "build:setup hook called"));
    assert!(sink.contains(log::Level::Warn, "components directory does not exist"));
    assert!(sink.records().iter().all(|(level, _)| *level != log::Level::Error));
}
