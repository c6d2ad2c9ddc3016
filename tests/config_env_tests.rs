//! Environment layering mutates process-wide state, so it lives in its own
//! test binary with a single test.

use route_mesh::Config;
use std::io::Write;

#[test]
fn test_environment_overrides_file_and_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[coordination]
pin_agent_id = true

[optimizer]
model = "from-file"
"#
    )
    .unwrap();

    std::env::set_var("ROUTE_MESH__COORDINATION__PIN_AGENT_ID", "false");
    std::env::set_var("ROUTE_MESH__SERVER__PORT", "9200");
    std::env::set_var("GROQ_API_KEY", "env-key");
    std::env::set_var("GROQ_MODEL", "env-model");

    let config = Config::load(file.path()).unwrap();

    assert!(!config.coordination.pin_agent_id);
    assert_eq!(config.server.port, 9200);
    assert_eq!(config.optimizer.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.optimizer.model, "env-model");
    // Untouched keys keep their defaults.
    assert_eq!(config.coordination.neighbour_threshold, 0.05);

    // An explicit key in the file wins over GROQ_API_KEY.
    let mut keyed = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(keyed, "[optimizer]\napi_key = \"file-key\"").unwrap();
    let config = Config::load(keyed.path()).unwrap();
    assert_eq!(config.optimizer.api_key.as_deref(), Some("file-key"));

    for key in [
        "ROUTE_MESH__COORDINATION__PIN_AGENT_ID",
        "ROUTE_MESH__SERVER__PORT",
        "GROQ_API_KEY",
        "GROQ_MODEL",
    ] {
        std::env::remove_var(key);
    }
}
