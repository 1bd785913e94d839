use super::*;
use crate::discovery::TestScriptSet;
use crate::properties::parse_properties;

fn discovery_with(test_dir: PathBuf, scripts: &[&str]) -> Discovery {
    Discovery {
        test_dir,
        scripts: scripts.iter().map(|name| name.to_string()).collect::<TestScriptSet>(),
    }
}

fn setup(scripts: &[&str]) -> (tempfile::TempDir, ProjectPaths, Discovery) {
    let temp = tempfile::tempdir().expect("create temp dir");
    let test_dir = temp.path().join("src/test/jython");
    fs::create_dir_all(&test_dir).expect("create test dir");
    for script in scripts {
        fs::write(test_dir.join(script), format!("# {script}\nprint 'hi'\n")).expect("write script");
    }
    let paths = ProjectPaths::new(temp.path().to_path_buf());
    let discovery = discovery_with(test_dir, scripts);
    (temp, paths, discovery)
}

#[test]
fn writes_one_properties_file_and_copy_per_script() {
    let (temp, paths, discovery) = setup(&["a.py", "b.py"]);
    let mut properties = PropertySet::new();
    properties.set("grinder.threads", "10");

    let artifacts = materialize(&paths, &properties, &discovery).expect("materialize");

    assert_eq!(artifacts.len(), 2);
    let config_dir = temp.path().join("target/test/config");
    for (script, file) in [
        ("a.py", "grinder_agent_a.properties"),
        ("b.py", "grinder_agent_b.properties"),
    ] {
        let text = fs::read_to_string(config_dir.join(file)).expect("read generated file");
        assert!(text.starts_with(&format!("#Grinder Agent Properties for {script}\n")));
        let generated = parse_properties(&text).expect("parse generated file");
        assert_eq!(generated.get(SCRIPT_KEY), Some(script));
        assert_eq!(generated.get("grinder.threads"), Some("10"));

        let copied = fs::read(config_dir.join(script)).expect("read copied script");
        let original = fs::read(discovery.test_dir.join(script)).expect("read original");
        assert_eq!(copied, original);
    }
    assert!(properties.get(SCRIPT_KEY).is_none());
}

#[test]
fn artifacts_are_in_bijection_with_scripts() {
    let (_temp, paths, discovery) = setup(&["login.py", "browse.py", "checkout.py"]);

    let artifacts = materialize(&paths, &PropertySet::new(), &discovery).expect("materialize");

    let embedded: TestScriptSet = artifacts
        .iter()
        .map(|artifact| {
            let text = fs::read_to_string(&artifact.properties_path).expect("read");
            let parsed = parse_properties(&text).expect("parse");
            let script = parsed.get(SCRIPT_KEY).expect("script key").to_string();
            assert_eq!(script, artifact.source_script);
            script
        })
        .collect();
    assert_eq!(embedded, discovery.scripts);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let (_temp, paths, discovery) = setup(&["a.py"]);
    let mut properties = PropertySet::new();
    properties.set("grinder.jvm.classpath", "/repo/z.jar:/repo/a.jar");
    properties.set("grinder.processes", "2");

    let first = materialize(&paths, &properties, &discovery).expect("first run");
    let first_bytes = fs::read(&first[0].properties_path).expect("read first");
    fs::remove_dir_all(paths.config_dir()).expect("clear staging");
    let second = materialize(&paths, &properties, &discovery).expect("second run");
    let second_bytes = fs::read(&second[0].properties_path).expect("read second");

    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn missing_script_aborts_after_earlier_files() {
    let (temp, paths, mut discovery) = setup(&["a.py"]);
    discovery.scripts.insert("zz_missing.py".to_string());

    let err = materialize(&paths, &PropertySet::new(), &discovery).expect_err("missing script");

    match err {
        ConfigError::Materialize { scripts, .. } => {
            assert_eq!(scripts, vec!["a.py".to_string(), "zz_missing.py".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    let config_dir = temp.path().join("target/test/config");
    assert!(config_dir.join("grinder_agent_a.properties").is_file());
    assert!(config_dir.join("a.py").is_file());
}
