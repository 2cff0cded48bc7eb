//! Environment isolation for configuration tests
//!
//! Configuration loading reads XDG directories and `NORMCACHE*` variables from the
//! process environment, which is shared by every test thread.

use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes environment access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const CAPTURED: [&str; 6] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "NORMCACHE_ENV",
    "NORMCACHE__CACHE__DEFAULT_FETCH_POLICY",
    "NORMCACHE__CACHE__WRITE_TO_CACHE_ASYNCHRONOUSLY",
];

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            CAPTURED
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with XDG directories inside `test_dir`, `NORMCACHE*` overrides cleared,
/// and `vars` set. The original environment is restored afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().join("config_home");
    let test_data_home = test_dir.path().join("data");
    let test_home = test_dir.path().join("home");
    for dir in [&test_config_home, &test_data_home, &test_home] {
        std::fs::create_dir_all(dir).unwrap();
    }

    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);
    std::env::set_var("XDG_DATA_HOME", &test_data_home);
    for name in CAPTURED.iter().filter(|name| name.starts_with("NORMCACHE")) {
        std::env::remove_var(name);
    }
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    env_state.restore();

    result
}
