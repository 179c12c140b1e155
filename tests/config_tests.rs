use std::time::Duration;

use drainq::config::DemoConfig;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
consumers: 3
queue-capacity: 2
run-for: 10ms
"#;
    let cfg: DemoConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.consumers, 3);
    assert_eq!(cfg.queue_capacity, 2);
    assert_eq!(cfg.run_for, Duration::from_millis(10));
    // Unset fields keep their defaults.
    assert_eq!(cfg.items, 50);
    assert!(cfg.drain_on_shutdown);
}

#[test]
fn empty_mapping_yields_defaults() {
    let cfg: DemoConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.consumers, 5);
    assert_eq!(cfg.queue_capacity, 3);
    assert_eq!(cfg.items, 50);
    assert_eq!(cfg.run_for, Duration::from_millis(3));
    assert!(cfg.drain_on_shutdown);
}

#[test]
fn parse_human_readable_durations() {
    let yaml = r#"
run-for: 2s
"#;
    let cfg: DemoConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.run_for, Duration::from_secs(2));
}

#[test]
fn load_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.yaml");
    std::fs::write(
        &path,
        "consumers: 7\nqueue-capacity: 4\nitems: 80\ndrain-on-shutdown: false\n",
    )
    .unwrap();

    let cfg = DemoConfig::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.consumers, 7);
    assert_eq!(cfg.queue_capacity, 4);
    assert_eq!(cfg.items, 80);
    assert!(!cfg.drain_on_shutdown);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DemoConfig::from_yaml_file(dir.path().join("absent.yaml")).is_err());
}

#[test]
fn validated_rejects_zero_consumers() {
    let cfg = DemoConfig {
        consumers: 0,
        ..Default::default()
    };
    assert!(cfg.validated().is_err());
}

#[test]
fn validated_rejects_zero_capacity() {
    let cfg = DemoConfig {
        queue_capacity: 0,
        ..Default::default()
    };
    assert!(cfg.validated().is_err());
}

#[test]
fn validated_rejects_zero_items() {
    let cfg = DemoConfig {
        items: 0,
        ..Default::default()
    };
    assert!(cfg.validated().is_err());
}

#[test]
fn validated_accepts_defaults() {
    assert!(DemoConfig::default().validated().is_ok());
}
